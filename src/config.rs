use std::fs;
use std::path::{Path, PathBuf};

use cubit_gpu::GpuConfig;
use cubit_runtime::StreamingConfig;
use cubit_world::TerrainKind;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Top-level `cubit.toml`.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub world: WorldConfig,
    pub streaming: StreamingConfig,
    pub gpu: GpuConfig,
    pub render: RenderConfig,
    pub runtime: RuntimeConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub seed: i32,
    pub mode: TerrainKind,
    pub worldgen: PathBuf,
    pub blocks: PathBuf,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 1337,
            mode: TerrainKind::Noise,
            worldgen: PathBuf::from("assets/worldgen.toml"),
            blocks: PathBuf::from("assets/blocks.toml"),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub cull_frustum: bool,
    pub min_cull_distance: f32,
    /// Non-positive disables the far limit.
    pub max_cull_distance: f32,
    pub fov_degrees: f32,
    pub aspect: f32,
    pub camera: CameraKind,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraKind {
    #[default]
    Fps,
    Orbit,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            cull_frustum: true,
            min_cull_distance: 0.0,
            max_cull_distance: 0.0,
            fov_degrees: 70.0,
            aspect: 16.0 / 9.0,
            camera: CameraKind::Fps,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Worker threads; 0 uses the available parallelism.
    pub workers: usize,
}

impl AppConfig {
    pub fn from_toml_str(src: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(src).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads a config file. Relative asset paths inside it are resolved
    /// against the file's directory.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let src = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut cfg = Self::from_toml_str(&src, path)?;
        if let Some(dir) = path.parent() {
            cfg.rebase(dir);
        }
        log::info!(target: "config", "loaded {}", path.display());
        Ok(cfg)
    }

    fn rebase(&mut self, dir: &Path) {
        for p in [&mut self.world.worldgen, &mut self.world.blocks] {
            if p.is_relative() {
                *p = dir.join(&*p);
            }
        }
    }
}
