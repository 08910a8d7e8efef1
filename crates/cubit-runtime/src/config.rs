use cubit_chunk::{LodLevel, VERTICAL_CHUNKS};
use serde::Deserialize;

/// `[streaming]` table of the app config.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StreamingConfig {
    /// Chebyshev radius, in chunk columns, kept resident around the player.
    pub load_distance: i32,
    /// Columns farther than this get LOD meshes. Defaults to `load_distance` (no LOD ring).
    pub lod_distance: Option<i32>,
    /// Downsampling factor for LOD columns: 2, 4 or 8.
    pub lod_factor: usize,
    pub vertical_chunks: i32,
    pub max_jobs_per_frame: usize,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            load_distance: 8,
            lod_distance: None,
            lod_factor: 2,
            vertical_chunks: VERTICAL_CHUNKS as i32,
            max_jobs_per_frame: 64,
        }
    }
}

impl StreamingConfig {
    pub fn effective_lod_distance(&self) -> i32 {
        self.lod_distance
            .unwrap_or(self.load_distance)
            .clamp(0, self.load_distance.max(0))
    }

    /// LOD level for the configured factor; invalid factors fall back to 2.
    pub fn lod_level(&self) -> LodLevel {
        match LodLevel::from_factor(self.lod_factor).filter(|l| l.is_lod()) {
            Some(level) => level,
            None => {
                log::warn!(
                    target: "stream",
                    "lod_factor {} is not one of 2, 4, 8; using 2",
                    self.lod_factor
                );
                LodLevel::One
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lod_distance_defaults_to_load_distance() {
        let cfg = StreamingConfig {
            load_distance: 6,
            ..Default::default()
        };
        assert_eq!(cfg.effective_lod_distance(), 6);
        let cfg = StreamingConfig {
            lod_distance: Some(20),
            ..cfg
        };
        assert_eq!(cfg.effective_lod_distance(), 6);
    }

    #[test]
    fn bad_lod_factor_falls_back() {
        let cfg = StreamingConfig {
            lod_factor: 3,
            ..Default::default()
        };
        assert_eq!(cfg.lod_level(), LodLevel::One);
        let cfg = StreamingConfig {
            lod_factor: 8,
            ..Default::default()
        };
        assert_eq!(cfg.lod_level(), LodLevel::Three);
    }
}
