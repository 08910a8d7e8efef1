use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlockDbError {
    #[error("failed to read block config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid block config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("block id {id} assigned to both `{first}` and `{second}`")]
    DuplicateId {
        id: u16,
        first: String,
        second: String,
    },
    #[error("block `{0}` may not use id 0, which is reserved for air")]
    ReservedAirId(String),
}
