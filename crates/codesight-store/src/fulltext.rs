use std::path::Path;

use rusqlite::{params, params_from_iter, Connection};

use codesight_core::Language;

use crate::error::StoreError;

/// Translate a `*`/`?` shell glob into a SQL `LIKE` pattern, escaping any
/// literal `%`/`_`/`\` in the glob first so they aren't mistaken for
/// wildcards. Pair with `LIKE ... ESCAPE '\\'`.
fn glob_to_like(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len());
    for c in glob.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '%' => out.push_str("\\%"),
            '_' => out.push_str("\\_"),
            '*' => out.push('%'),
            '?' => out.push('_'),
            other => out.push(other),
        }
    }
    out
}

/// Full chunk metadata + content, as read back from the `chunks` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkRow {
    pub chunk_id: String,
    pub file_path: String,
    pub start_line: u32,
    pub end_line: u32,
    pub scope: String,
    pub language: Language,
    pub content_hash: String,
    pub content: String,
}

/// SQLite-backed BM25 index and chunk metadata table.
///
/// The `chunks_fts` virtual table runs in external-content mode against
/// `chunks`, kept in sync by `AFTER INSERT`/`AFTER DELETE` triggers rather
/// than application code — there is no codepath that can write one table
/// without the other following.
pub struct FullTextStore {
    conn: Connection,
}

impl FullTextStore {
    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        let store = Self { conn };
        store.init_tables()?;
        Ok(store)
    }

    fn init_tables(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS chunks (
                chunk_id TEXT PRIMARY KEY,
                file_path TEXT NOT NULL,
                start_line INTEGER NOT NULL,
                end_line INTEGER NOT NULL,
                scope TEXT NOT NULL,
                language TEXT NOT NULL,
                content_hash TEXT NOT NULL,
                content TEXT NOT NULL
            );

            CREATE VIRTUAL TABLE IF NOT EXISTS chunks_fts USING fts5(
                chunk_id,
                file_path,
                scope,
                content,
                content='chunks',
                content_rowid='rowid',
                tokenize='porter unicode61'
            );

            CREATE TRIGGER IF NOT EXISTS chunks_ai AFTER INSERT ON chunks BEGIN
                INSERT INTO chunks_fts(rowid, chunk_id, file_path, scope, content)
                VALUES (new.rowid, new.chunk_id, new.file_path, new.scope, new.content);
            END;

            CREATE TRIGGER IF NOT EXISTS chunks_ad AFTER DELETE ON chunks BEGIN
                INSERT INTO chunks_fts(chunks_fts, rowid, chunk_id, file_path, scope, content)
                VALUES ('delete', old.rowid, old.chunk_id, old.file_path, old.scope, old.content);
            END;

            CREATE TABLE IF NOT EXISTS repo_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Insert or replace a chunk row. Deletes first so the `chunks_ad`
    /// trigger fires and the FTS row is cleanly rebuilt, not duplicated.
    pub fn upsert_chunk(
        &self,
        chunk_id: &str,
        file_path: &str,
        start_line: u32,
        end_line: u32,
        scope: &str,
        language: Language,
        content_hash: &str,
        content: &str,
    ) -> Result<(), StoreError> {
        self.conn.execute("DELETE FROM chunks WHERE chunk_id = ?1", params![chunk_id])?;
        self.conn.execute(
            "INSERT INTO chunks
               (chunk_id, file_path, start_line, end_line, scope, language, content_hash, content)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                chunk_id,
                file_path,
                start_line,
                end_line,
                scope,
                language.as_str(),
                content_hash,
                content
            ],
        )?;
        Ok(())
    }

    /// Delete every chunk for `file_path`. Returns the count deleted.
    pub fn delete_chunks_for_file(&self, file_path: &str) -> Result<usize, StoreError> {
        let count: usize = self.conn.query_row(
            "SELECT COUNT(*) FROM chunks WHERE file_path = ?1",
            params![file_path],
            |row| row.get(0),
        )?;
        self.conn
            .execute("DELETE FROM chunks WHERE file_path = ?1", params![file_path])?;
        Ok(count)
    }

    /// `{chunk_id: content_hash}` for every chunk currently stored for `file_path`.
    pub fn get_chunk_hashes(&self, file_path: &str) -> Result<Vec<(String, String)>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT chunk_id, content_hash FROM chunks WHERE file_path = ?1")?;
        let rows = stmt
            .query_map(params![file_path], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// BM25-ranked chunk_ids matching `query`, best match first.
    ///
    /// `file_glob`, when present, is translated to a SQL `LIKE` pattern
    /// (`*` -> `%`, `?` -> `_`, with any literal `%`/`_` in the glob escaped
    /// first) and applied via a subquery against `chunks.file_path` —
    /// mirrors the original source's `bm25_search` glob-to-`LIKE` path.
    pub fn bm25_search(&self, query: &str, top_k: usize, file_glob: Option<&str>) -> Result<Vec<String>, StoreError> {
        let rows = match file_glob {
            None => {
                let mut stmt = self.conn.prepare(
                    "SELECT chunk_id FROM chunks_fts WHERE chunks_fts MATCH ?1 ORDER BY rank LIMIT ?2",
                )?;
                stmt.query_map(params![query, top_k as i64], |row| row.get(0))?
                    .collect::<Result<Vec<_>, _>>()?
            }
            Some(glob) => {
                let like_pattern = glob_to_like(glob);
                let mut stmt = self.conn.prepare(
                    "SELECT chunk_id FROM chunks_fts
                     WHERE chunks_fts MATCH ?1
                       AND chunk_id IN (SELECT chunk_id FROM chunks WHERE file_path LIKE ?2 ESCAPE '\\')
                     ORDER BY rank LIMIT ?3",
                )?;
                stmt.query_map(params![query, like_pattern, top_k as i64], |row| row.get(0))?
                    .collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(rows)
    }

    pub fn get_chunk_by_id(&self, chunk_id: &str) -> Result<Option<ChunkRow>, StoreError> {
        let mut rows = self.get_chunks_by_ids(&[chunk_id.to_string()])?;
        Ok(rows.pop())
    }

    /// Batch metadata lookup; order is unspecified, missing ids are simply absent.
    pub fn get_chunks_by_ids(&self, chunk_ids: &[String]) -> Result<Vec<ChunkRow>, StoreError> {
        if chunk_ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; chunk_ids.len()].join(",");
        let sql = format!(
            "SELECT chunk_id, file_path, start_line, end_line, scope, language, content_hash, content
             FROM chunks WHERE chunk_id IN ({placeholders})"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(chunk_ids.iter()), |row| {
                Ok(ChunkRow {
                    chunk_id: row.get(0)?,
                    file_path: row.get(1)?,
                    start_line: row.get(2)?,
                    end_line: row.get(3)?,
                    scope: row.get(4)?,
                    language: Language::from_str_tag(&row.get::<_, String>(5)?),
                    content_hash: row.get(6)?,
                    content: row.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn chunk_count(&self) -> Result<usize, StoreError> {
        Ok(self.conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?)
    }

    pub fn file_count(&self) -> Result<usize, StoreError> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(DISTINCT file_path) FROM chunks", [], |row| row.get(0))?)
    }

    pub fn set_meta(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO repo_meta (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn get_meta(&self, key: &str) -> Result<Option<String>, StoreError> {
        let result = self
            .conn
            .query_row("SELECT value FROM repo_meta WHERE key = ?1", params![key], |row| row.get(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_tmp() -> (tempfile::TempDir, FullTextStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FullTextStore::open(&dir.path().join("metadata.db")).unwrap();
        (dir, store)
    }

    #[test]
    fn upsert_and_bm25_search_finds_content() {
        let (_dir, store) = open_tmp();
        store
            .upsert_chunk("a.py:1-2:h1", "a.py", 1, 2, "function foo", Language::Python, "h1", "def foo(): return widget_factory()")
            .unwrap();
        let hits = store.bm25_search("widget_factory", 10, None).unwrap();
        assert_eq!(hits, vec!["a.py:1-2:h1"]);
    }

    #[test]
    fn reinsert_same_chunk_id_does_not_duplicate_fts_row() {
        let (_dir, store) = open_tmp();
        store
            .upsert_chunk("a.py:1-2:h1", "a.py", 1, 2, "module-level", Language::Python, "h1", "alpha")
            .unwrap();
        store
            .upsert_chunk("a.py:1-2:h1", "a.py", 1, 2, "module-level", Language::Python, "h2", "beta")
            .unwrap();
        assert_eq!(store.chunk_count().unwrap(), 1);
        assert!(store.bm25_search("alpha", 10, None).unwrap().is_empty());
        assert_eq!(store.bm25_search("beta", 10, None).unwrap(), vec!["a.py:1-2:h1"]);
    }

    #[test]
    fn delete_chunks_for_file_removes_fts_rows_too() {
        let (_dir, store) = open_tmp();
        store
            .upsert_chunk("a.py:1-2:h1", "a.py", 1, 2, "module-level", Language::Python, "h1", "needle here")
            .unwrap();
        let deleted = store.delete_chunks_for_file("a.py").unwrap();
        assert_eq!(deleted, 1);
        assert!(store.bm25_search("needle", 10, None).unwrap().is_empty());
    }

    #[test]
    fn bm25_search_respects_file_glob() {
        let (_dir, store) = open_tmp();
        store
            .upsert_chunk("src/a.py:1-2:h1", "src/a.py", 1, 2, "module-level", Language::Python, "h1", "needle here")
            .unwrap();
        store
            .upsert_chunk("docs/b.md:1-1:h2", "docs/b.md", 1, 1, "page 1", Language::PlainText, "h2", "needle here too")
            .unwrap();

        let all = store.bm25_search("needle", 10, None).unwrap();
        assert_eq!(all.len(), 2);

        let filtered = store.bm25_search("needle", 10, Some("src/*")).unwrap();
        assert_eq!(filtered, vec!["src/a.py:1-2:h1"]);
    }

    #[test]
    fn glob_to_like_escapes_sql_wildcards() {
        assert_eq!(glob_to_like("a_b%c*d?e"), "a\\_b\\%c%d_e");
    }

    #[test]
    fn meta_roundtrip() {
        let (_dir, store) = open_tmp();
        assert_eq!(store.get_meta("embedding_model").unwrap(), None);
        store.set_meta("embedding_model", "bge-small-en-v1.5").unwrap();
        assert_eq!(store.get_meta("embedding_model").unwrap(), Some("bge-small-en-v1.5".to_string()));
    }

    #[test]
    fn get_chunk_hashes_reflects_current_rows() {
        let (_dir, store) = open_tmp();
        store
            .upsert_chunk("a.py:1-2:h1", "a.py", 1, 2, "module-level", Language::Python, "h1", "x")
            .unwrap();
        store
            .upsert_chunk("a.py:3-4:h2", "a.py", 3, 4, "module-level", Language::Python, "h2", "y")
            .unwrap();
        let mut hashes = store.get_chunk_hashes("a.py").unwrap();
        hashes.sort();
        assert_eq!(
            hashes,
            vec![
                ("a.py:1-2:h1".to_string(), "h1".to_string()),
                ("a.py:3-4:h2".to_string(), "h2".to_string()),
            ]
        );
    }
}
