//! `Engine` facade tying the indexer, store, and hybrid retriever together
//! for one folder — the library surface the `codesight` binary drives.

pub mod engine;
pub mod error;

pub use engine::Engine;
pub use error::CliError;
