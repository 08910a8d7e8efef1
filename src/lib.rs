//! Headless demo host for the chunk streaming and GPU draw batching crates.
#![forbid(unsafe_code)]

pub mod app;
pub mod camera;
pub mod config;

pub use app::{AppContext, AppError, FrameReport, RunSummary};
pub use camera::{Camera, FpsCamera, OrbitCamera};
pub use config::{AppConfig, CameraKind, ConfigError};
