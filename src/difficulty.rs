use serde::{Deserialize, Serialize};

/// Running score of the current session
pub type Level = u32;

/// Coarse difficulty band a level falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Band {
    Easy,
    Medium,
    Hard,
}

/// `min(base + level / per_levels, cap)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepCurve {
    pub base: usize,
    pub per_levels: u32,
    pub cap: usize,
}

impl StepCurve {
    pub const fn new(base: usize, per_levels: u32, cap: usize) -> Self {
        Self {
            base,
            per_levels,
            cap,
        }
    }

    pub fn at(&self, level: Level) -> usize {
        let steps = level.checked_div(self.per_levels).unwrap_or(0) as usize;
        self.base.saturating_add(steps).min(self.cap).max(1)
    }
}

/// `max(floor_ms, base_ms - level * per_level_ms)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecayCurve {
    pub base_ms: u64,
    pub per_level_ms: u64,
    pub floor_ms: u64,
}

impl DecayCurve {
    pub const fn new(base_ms: u64, per_level_ms: u64, floor_ms: u64) -> Self {
        Self {
            base_ms,
            per_level_ms,
            floor_ms,
        }
    }

    pub fn at(&self, level: Level) -> u64 {
        decayed_ms(self.base_ms, self.per_level_ms, self.floor_ms, level)
    }
}

/// Presentation time for `level`, never below `floor_ms`
pub fn decayed_ms(base_ms: u64, per_level_ms: u64, floor_ms: u64, level: Level) -> u64 {
    base_ms
        .saturating_sub(per_level_ms.saturating_mul(level as u64))
        .max(floor_ms)
}

/// Three values selected by two level thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Banded<T> {
    pub easy_below: Level,
    pub medium_below: Level,
    pub easy: T,
    pub medium: T,
    pub hard: T,
}

impl<T> Banded<T> {
    pub fn new(easy_below: Level, medium_below: Level, easy: T, medium: T, hard: T) -> Self {
        Self {
            easy_below,
            medium_below,
            easy,
            medium,
            hard,
        }
    }

    pub fn band(&self, level: Level) -> Band {
        if level < self.easy_below {
            Band::Easy
        } else if level < self.medium_below {
            Band::Medium
        } else {
            Band::Hard
        }
    }

    pub fn pick(&self, level: Level) -> &T {
        match self.band(level) {
            Band::Easy => &self.easy,
            Band::Medium => &self.medium,
            Band::Hard => &self.hard,
        }
    }
}

/// Inclusive size range used by banded generators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeRange {
    pub min: usize,
    pub max: usize,
}

impl SizeRange {
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub const fn exactly(n: usize) -> Self {
        Self { min: n, max: n }
    }

    pub fn contains(&self, n: usize) -> bool {
        (self.min..=self.max).contains(&n)
    }

    pub fn sample(&self, rng: &mut dyn rand::RngCore) -> usize {
        use rand::Rng;
        let lo = self.min.max(1);
        let hi = self.max.max(lo);
        rng.gen_range(lo..=hi)
    }
}
