//! Block types, faces and the static per-block mesh description database.
#![forbid(unsafe_code)]

pub mod config;
pub mod database;
pub mod error;
pub mod face;
pub mod types;

pub use database::BlockDatabase;
pub use error::BlockDbError;
pub use face::Face;
pub use types::{AIR, BlockMeshData, BlockType, TransparencyClass};
