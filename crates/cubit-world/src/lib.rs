//! Deterministic terrain generation for chunks.
#![forbid(unsafe_code)]

pub mod error;
pub mod generator;
pub mod worldgen;

pub use error::WorldGenError;
pub use generator::{TerrainGenerator, TerrainKind, TerrainMode};
pub use worldgen::{BiomeParams, LayerParams, WorldGenConfig, WorldGenParams};
