use std::collections::HashMap;
use std::path::Path;

use usearch::{Index, IndexOptions, MetricKind, ScalarKind};
use xxhash_rust::xxh3::xxh3_64;

use crate::error::StoreError;

/// A single k-NN hit: the chunk_id and its distance from the query vector.
#[derive(Debug, Clone)]
pub struct VectorHit {
    pub chunk_id: String,
    pub distance: f32,
}

/// HNSW vector index backed by usearch, keyed by chunk_id.
///
/// usearch keys are `u64`; chunk_id is a string, so each add/search maps
/// through `xxh3_64(chunk_id)` and keeps a reverse `u64 -> chunk_id` sidecar
/// persisted next to the index file. Configuration: cosine distance, M=32,
/// ef_construction=200, ef_search=100, matching the teacher's defaults.
pub struct VectorStore {
    index: Index,
    dimension: usize,
    key_to_id: HashMap<u64, String>,
}

impl VectorStore {
    pub fn new(dimension: usize) -> Result<Self, StoreError> {
        let index = create_index(dimension)?;
        Ok(Self {
            index,
            dimension,
            key_to_id: HashMap::new(),
        })
    }

    /// Open an existing index from disk, or create a new empty one if the
    /// file doesn't exist yet.
    pub fn open(path: &Path, dimension: usize) -> Result<Self, StoreError> {
        if !path.exists() {
            return Self::new(dimension);
        }

        let index = create_index(dimension)?;
        index
            .load(path.to_str().unwrap_or(""))
            .map_err(|e| StoreError::VectorIndexUnavailable {
                reason: format!("failed to load vector index: {e}"),
            })?;
        let loaded_dim = index.dimensions();
        if loaded_dim != dimension {
            return Err(StoreError::DimensionMismatch {
                expected: dimension,
                actual: loaded_dim,
            });
        }
        let key_to_id = load_key_map(path)?;
        Ok(Self {
            index,
            dimension,
            key_to_id,
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.key_to_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.key_to_id.is_empty()
    }

    /// Add (or replace) the vector for `chunk_id`.
    pub fn add_vector(&mut self, chunk_id: &str, vector: &[f32]) -> Result<(), StoreError> {
        if vector.len() != self.dimension {
            return Err(StoreError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        let key = xxh3_64(chunk_id.as_bytes());
        if self.index.contains(key) {
            let _ = self.index.remove(key);
        }
        if self.index.size() >= self.index.capacity() {
            let new_cap = (self.index.capacity() + 1).max(64) * 2;
            self.index
                .reserve(new_cap)
                .map_err(|e| StoreError::VectorIndexUnavailable {
                    reason: format!("reserve failed: {e}"),
                })?;
        }
        self.index
            .add(key, vector)
            .map_err(|e| StoreError::VectorIndexUnavailable {
                reason: format!("add failed: {e}"),
            })?;
        self.key_to_id.insert(key, chunk_id.to_string());
        Ok(())
    }

    /// Remove the vector for `chunk_id`. Returns whether it existed.
    pub fn remove_vector(&mut self, chunk_id: &str) -> Result<bool, StoreError> {
        let key = xxh3_64(chunk_id.as_bytes());
        if !self.index.contains(key) {
            return Ok(false);
        }
        self.index
            .remove(key)
            .map_err(|e| StoreError::VectorIndexUnavailable {
                reason: format!("remove failed: {e}"),
            })?;
        self.key_to_id.remove(&key);
        Ok(true)
    }

    /// k-nearest-neighbor search against the configured cosine metric.
    pub fn search_knn(&self, query: &[f32], k: usize) -> Result<Vec<VectorHit>, StoreError> {
        if query.len() != self.dimension {
            return Err(StoreError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        if self.index.size() == 0 {
            return Ok(Vec::new());
        }
        let matches = self
            .index
            .search(query, k)
            .map_err(|e| StoreError::VectorIndexUnavailable {
                reason: format!("search failed: {e}"),
            })?;
        Ok(matches
            .keys
            .iter()
            .zip(matches.distances.iter())
            .filter_map(|(&key, &distance)| {
                self.key_to_id.get(&key).map(|chunk_id| VectorHit {
                    chunk_id: chunk_id.clone(),
                    distance,
                })
            })
            .collect())
    }

    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.index
            .save(path.to_str().unwrap_or(""))
            .map_err(|e| StoreError::VectorIndexUnavailable {
                reason: format!("save failed: {e}"),
            })?;
        save_key_map(path, &self.key_to_id)?;
        Ok(())
    }
}

fn create_index(dimension: usize) -> Result<Index, StoreError> {
    let mut options = IndexOptions::default();
    options.dimensions = dimension;
    options.metric = MetricKind::Cos;
    options.quantization = ScalarKind::F32;
    options.connectivity = 32;
    options.expansion_add = 200;
    options.expansion_search = 100;

    Index::new(&options).map_err(|e| StoreError::VectorIndexUnavailable {
        reason: format!("failed to create index: {e}"),
    })
}

fn key_map_path(index_path: &Path) -> std::path::PathBuf {
    index_path.with_extension("keymap")
}

/// Persist the u64 -> chunk_id mapping as a flat binary file.
/// Format: `[count: u64] ([key: u64] [len: u32] [utf8 bytes: len]) * count`.
fn save_key_map(index_path: &Path, map: &HashMap<u64, String>) -> Result<(), StoreError> {
    use std::io::Write;
    let path = key_map_path(index_path);
    let mut buf = Vec::new();
    buf.extend_from_slice(&(map.len() as u64).to_le_bytes());
    for (&key, chunk_id) in map {
        buf.extend_from_slice(&key.to_le_bytes());
        let bytes = chunk_id.as_bytes();
        buf.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
        buf.extend_from_slice(bytes);
    }
    let mut f = std::fs::File::create(&path)?;
    f.write_all(&buf)?;
    Ok(())
}

fn load_key_map(index_path: &Path) -> Result<HashMap<u64, String>, StoreError> {
    let path = key_map_path(index_path);
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let data = std::fs::read(&path)?;
    if data.len() < 8 {
        return Err(StoreError::KeymapCorrupt {
            reason: "keymap file too short".to_string(),
        });
    }
    let count = u64::from_le_bytes(data[0..8].try_into().unwrap()) as usize;
    let mut map = HashMap::with_capacity(count);
    let mut offset = 8usize;
    for _ in 0..count {
        if data.len() < offset + 12 {
            return Err(StoreError::KeymapCorrupt {
                reason: "truncated entry header".to_string(),
            });
        }
        let key = u64::from_le_bytes(data[offset..offset + 8].try_into().unwrap());
        let len = u32::from_le_bytes(data[offset + 8..offset + 12].try_into().unwrap()) as usize;
        offset += 12;
        if data.len() < offset + len {
            return Err(StoreError::KeymapCorrupt {
                reason: "truncated entry body".to_string(),
            });
        }
        let chunk_id = String::from_utf8(data[offset..offset + len].to_vec()).map_err(|e| {
            StoreError::KeymapCorrupt {
                reason: e.to_string(),
            }
        })?;
        offset += len;
        map.insert(key, chunk_id);
    }
    Ok(map)
}
