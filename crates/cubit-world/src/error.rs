use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorldGenError {
    #[error("failed to read worldgen config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid worldgen config: {0}")]
    Parse(#[from] toml::de::Error),
}
