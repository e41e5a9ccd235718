use chrono::{DateTime, Utc};
use itertools::Itertools;
use std::collections::HashMap;

use crate::error::StoreError;
use crate::games::GameMode;
use crate::util::{mean, round_tenths};

pub const ANONYMOUS: &str = "Anonymous";
pub const RECENT_GAMES: usize = 5;

/// A signed-in player
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub user_id: String,
    pub display_name: String,
}

impl Player {
    pub fn new(user_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
        }
    }

    /// A local player identified by name alone
    pub fn named(name: &str) -> Self {
        Self::new(name.trim().to_lowercase(), name.trim())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewScore {
    pub user_id: String,
    pub score: u32,
    pub streak: u32,
    pub mode: GameMode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRecord {
    pub user_id: String,
    pub score: u32,
    pub streak: u32,
    pub mode: GameMode,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub display_name: String,
    pub score: u32,
    pub streak: u32,
    pub mode: GameMode,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProfileStats {
    pub high_score: u32,
    pub total_games: usize,
    /// Rounded to one decimal
    pub average_score: f64,
    pub total_streak: u64,
    /// Newest first
    pub recent: Vec<ScoreRecord>,
}

impl ProfileStats {
    /// Builds stats from every score of one player, newest first
    pub fn from_scores(scores: &[ScoreRecord]) -> Self {
        let values: Vec<f64> = scores.iter().map(|s| s.score as f64).collect();
        let average_score = mean(&values).map(round_tenths).unwrap_or(0.0);
        Self {
            high_score: scores.iter().map(|s| s.score).max().unwrap_or(0),
            total_games: scores.len(),
            average_score,
            total_streak: scores.iter().map(|s| s.streak as u64).sum(),
            recent: scores.iter().take(RECENT_GAMES).cloned().collect(),
        }
    }
}

pub trait ScoreRepository {
    fn submit_score(&mut self, score: &NewScore) -> Result<(), StoreError>;

    /// Best score per player and mode, highest first
    fn query_best_scores(&self, mode: Option<GameMode>) -> Result<Vec<LeaderboardEntry>, StoreError>;

    /// Creates the profile unless one already exists for the user id
    fn ensure_profile(&mut self, player: &Player) -> Result<(), StoreError>;

    /// Every score of one player, newest first
    fn scores_for(&self, user_id: &str) -> Result<Vec<ScoreRecord>, StoreError>;

    fn recent_scores(&self, user_id: &str, limit: usize) -> Result<Vec<ScoreRecord>, StoreError> {
        let mut scores = self.scores_for(user_id)?;
        scores.truncate(limit);
        Ok(scores)
    }

    fn profile_stats(&self, user_id: &str) -> Result<ProfileStats, StoreError> {
        Ok(ProfileStats::from_scores(&self.scores_for(user_id)?))
    }

    fn display_name(&self, user_id: &str) -> Result<Option<String>, StoreError>;

    fn local_high_score(&self, mode: GameMode) -> Result<u32, StoreError>;

    /// Returns true when `score` beat the stored value
    fn record_local_high_score(&mut self, mode: GameMode, score: u32) -> Result<bool, StoreError>;
}

/// Reduces entries (oldest first) to each player's best per mode, sorted by
/// score descending. Ties keep the earlier entry.
pub fn best_per_user(entries: Vec<LeaderboardEntry>) -> Vec<LeaderboardEntry> {
    let mut best: Vec<LeaderboardEntry> = Vec::new();
    let mut index: HashMap<(String, GameMode), usize> = HashMap::new();
    for entry in entries {
        let key = (entry.user_id.clone(), entry.mode);
        match index.get(&key).copied() {
            Some(i) if best[i].score >= entry.score => {}
            Some(i) => best[i] = entry,
            None => {
                index.insert(key, best.len());
                best.push(entry);
            }
        }
    }
    best.into_iter()
        .sorted_by(|a, b| b.score.cmp(&a.score).then(a.created_at.cmp(&b.created_at)))
        .collect()
}

/// In-process repository. Backs tests and runs without a database file.
#[derive(Debug, Default)]
pub struct MemoryScoreStore {
    profiles: HashMap<String, String>,
    scores: Vec<ScoreRecord>,
    high_scores: HashMap<GameMode, u32>,
    failing: bool,
}

impl MemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every write fail with [`StoreError::Unavailable`]
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }

    pub fn scores(&self) -> &[ScoreRecord] {
        &self.scores
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.failing {
            Err(StoreError::Unavailable)
        } else {
            Ok(())
        }
    }
}

impl ScoreRepository for MemoryScoreStore {
    fn submit_score(&mut self, score: &NewScore) -> Result<(), StoreError> {
        self.check_writable()?;
        self.scores.push(ScoreRecord {
            user_id: score.user_id.clone(),
            score: score.score,
            streak: score.streak,
            mode: score.mode,
            created_at: Utc::now(),
        });
        Ok(())
    }

    fn query_best_scores(&self, mode: Option<GameMode>) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let entries = self
            .scores
            .iter()
            .filter(|s| mode.map_or(true, |m| s.mode == m))
            .map(|s| LeaderboardEntry {
                user_id: s.user_id.clone(),
                display_name: self
                    .profiles
                    .get(&s.user_id)
                    .cloned()
                    .unwrap_or_else(|| ANONYMOUS.to_string()),
                score: s.score,
                streak: s.streak,
                mode: s.mode,
                created_at: s.created_at,
            })
            .collect();
        Ok(best_per_user(entries))
    }

    fn ensure_profile(&mut self, player: &Player) -> Result<(), StoreError> {
        self.check_writable()?;
        self.profiles
            .entry(player.user_id.clone())
            .or_insert_with(|| player.display_name.clone());
        Ok(())
    }

    fn scores_for(&self, user_id: &str) -> Result<Vec<ScoreRecord>, StoreError> {
        Ok(self
            .scores
            .iter()
            .rev()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect())
    }

    fn display_name(&self, user_id: &str) -> Result<Option<String>, StoreError> {
        Ok(self.profiles.get(user_id).cloned())
    }

    fn local_high_score(&self, mode: GameMode) -> Result<u32, StoreError> {
        Ok(self.high_scores.get(&mode).copied().unwrap_or(0))
    }

    fn record_local_high_score(&mut self, mode: GameMode, score: u32) -> Result<bool, StoreError> {
        self.check_writable()?;
        let best = self.high_scores.entry(mode).or_insert(0);
        if score > *best {
            *best = score;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
