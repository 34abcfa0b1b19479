/// Tunables for both the code and document chunkers.
#[derive(Debug, Clone, Copy)]
pub struct ChunkConfig {
    pub max_lines: u32,
    pub overlap_lines: u32,
    pub max_chars: usize,
    pub overlap_chars: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_lines: 200,
            overlap_lines: 50,
            max_chars: 1500,
            overlap_chars: 200,
        }
    }
}
