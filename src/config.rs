use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::difficulty::{Banded, DecayCurve, SizeRange, StepCurve};
use crate::games::GameMode;

pub const DEFAULT_TICK_MS: u64 = 100;
pub const DEFAULT_ROUND_PAUSE_MS: u64 = 1500;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Name scores are submitted under; no name means nothing is saved remotely
    pub player: Option<String>,
    pub default_mode: GameMode,
    pub tick_ms: u64,
    /// How long a correct answer stays on screen before the next round
    pub round_pause_ms: u64,
    pub tuning: Tuning,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            player: None,
            default_mode: GameMode::Classic,
            tick_ms: DEFAULT_TICK_MS,
            round_pause_ms: DEFAULT_ROUND_PAUSE_MS,
            tuning: Tuning::default(),
        }
    }
}

/// Per-game difficulty constants. These are tuning data rather than rules:
/// the games were never balanced against each other.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Tuning {
    pub classic: ClassicTuning,
    pub reverse_sequence: ReverseSequenceTuning,
    pub palette_recall: PaletteRecallTuning,
    pub quick_reflex: QuickReflexTuning,
    pub trail_tracker: TrailTrackerTuning,
    pub freeze_frame: FreezeFrameTuning,
    pub speed_typist: SpeedTypistTuning,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassicTuning {
    pub cards: StepCurve,
    pub memory_base_ms: u64,
    pub memory_per_card_ms: u64,
    pub memory_floor_ms: u64,
}

impl Default for ClassicTuning {
    fn default() -> Self {
        Self {
            cards: StepCurve::new(4, 3, 8),
            memory_base_ms: 1500,
            memory_per_card_ms: 300,
            memory_floor_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReverseSequenceTuning {
    pub length: StepCurve,
    pub step: DecayCurve,
    pub settle_ms: u64,
}

impl Default for ReverseSequenceTuning {
    fn default() -> Self {
        Self {
            length: StepCurve::new(4, 2, 8),
            step: DecayCurve::new(800, 30, 400),
            settle_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaletteRecallTuning {
    pub size: Banded<SizeRange>,
    pub questions: Banded<usize>,
    pub required_rate: Banded<f64>,
    pub show: DecayCurve,
    pub options: usize,
    pub decoy_hue_step: u16,
}

impl Default for PaletteRecallTuning {
    fn default() -> Self {
        Self {
            size: Banded::new(
                5,
                15,
                SizeRange::exactly(6),
                SizeRange::new(8, 10),
                SizeRange::new(10, 12),
            ),
            questions: Banded::new(5, 15, 3, 4, 5),
            required_rate: Banded::new(5, 15, 0.6, 0.65, 0.7),
            show: DecayCurve::new(6000, 100, 3000),
            options: 4,
            decoy_hue_step: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuickReflexTuning {
    pub length: StepCurve,
    pub interval: DecayCurve,
    pub grace_ms: u64,
}

impl Default for QuickReflexTuning {
    fn default() -> Self {
        Self {
            length: StepCurve::new(5, 2, 12),
            interval: DecayCurve::new(1200, 50, 500),
            grace_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrailTrackerTuning {
    pub length: StepCurve,
    pub grid: StepCurve,
    pub show: DecayCurve,
    pub settle_ms: u64,
    /// Levels at or above this validate every step as it is entered
    pub step_gated_from: u32,
    pub attempts: Banded<u32>,
}

impl Default for TrailTrackerTuning {
    fn default() -> Self {
        Self {
            length: StepCurve::new(5, 3, 12),
            grid: StepCurve::new(8, 5, 12),
            show: DecayCurve::new(4000, 100, 2000),
            settle_ms: 500,
            step_gated_from: 15,
            attempts: Banded::new(25, 35, 3, 2, 1),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FreezeFrameTuning {
    pub grid: StepCurve,
    pub active: StepCurve,
    pub show: DecayCurve,
}

impl Default for FreezeFrameTuning {
    fn default() -> Self {
        Self {
            grid: StepCurve::new(4, 5, 6),
            active: StepCurve::new(3, 3, 18),
            show: DecayCurve::new(4000, 100, 2000),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpeedTypistTuning {
    /// Word list band; also selects the base time limit
    pub base_ms: Banded<u64>,
    pub per_level_ms: u64,
    pub floor_ms: u64,
}

impl Default for SpeedTypistTuning {
    fn default() -> Self {
        Self {
            base_ms: Banded::new(5, 10, 5000, 4000, 3000),
            per_level_ms: 100,
            floor_ms: 2000,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "dopamine-rush") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("dopamine_rush_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(err) => {
                warn!(path = %self.path.display(), %err, "ignoring unreadable config");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).map_err(std::io::Error::other)?;
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let store = FileConfigStore::with_path(&path);
        let mut cfg = Config {
            player: Some("ada".into()),
            default_mode: GameMode::TrailTracker,
            tick_ms: 50,
            ..Config::default()
        };
        cfg.tuning.trail_tracker.step_gated_from = 3;
        cfg.tuning.palette_recall.required_rate.hard = 0.9;
        store.save(&cfg).unwrap();
        assert_eq!(store.load(), cfg);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("absent.json"));
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "player": "grace", "default_mode": "freeze-frame" }"#).unwrap();
        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.player.as_deref(), Some("grace"));
        assert_eq!(cfg.default_mode, GameMode::FreezeFrame);
        assert_eq!(cfg.tuning, Tuning::default());
    }

    #[test]
    fn corrupt_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, b"{ not json").unwrap();
        assert_eq!(FileConfigStore::with_path(&path).load(), Config::default());
    }
}
