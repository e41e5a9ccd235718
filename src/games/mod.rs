//! The seven mini-games.
//!
//! Every game has the same shape: `start_round` generates a challenge from the
//! level and arms the presentation timer, `tick` advances time, and `act`
//! feeds player input. A game returns a [`Verdict`] exactly once per round,
//! from whichever of those calls completes it.

pub mod classic;
pub mod freeze_frame;
pub mod palette_recall;
pub mod quick_reflex;
pub mod reverse_sequence;
pub mod speed_typist;
pub mod trail_tracker;

use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::config::Tuning;
use crate::difficulty::Level;
use crate::error::GameError;
use crate::palette::Rgb;
use crate::round::{Outcome, Round, RoundEvent, Verdict};
use crate::timer::RoundToken;

pub use classic::Classic;
pub use freeze_frame::FreezeFrame;
pub use palette_recall::PaletteRecall;
pub use quick_reflex::QuickReflex;
pub use reverse_sequence::ReverseSequence;
pub use speed_typist::SpeedTypist;
pub use trail_tracker::TrailTracker;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum GameMode {
    Classic,
    ReverseSequence,
    PaletteRecall,
    QuickReflex,
    TrailTracker,
    FreezeFrame,
    SpeedTypist,
}

impl GameMode {
    pub const ALL: [GameMode; 7] = [
        GameMode::Classic,
        GameMode::ReverseSequence,
        GameMode::PaletteRecall,
        GameMode::QuickReflex,
        GameMode::TrailTracker,
        GameMode::FreezeFrame,
        GameMode::SpeedTypist,
    ];

    pub fn title(self) -> &'static str {
        match self {
            GameMode::Classic => "Color Memory",
            GameMode::ReverseSequence => "Reverse Sequence",
            GameMode::PaletteRecall => "Palette Recall",
            GameMode::QuickReflex => "Quick Reflex",
            GameMode::TrailTracker => "Trail Tracker",
            GameMode::FreezeFrame => "Freeze Frame",
            GameMode::SpeedTypist => "Speed Typist",
        }
    }

    pub fn controls(self) -> &'static str {
        match self {
            GameMode::Classic => "1-8 pick a position",
            GameMode::ReverseSequence => "1-6 pick a color, backspace clears",
            GameMode::PaletteRecall => "1-4 pick an option",
            GameMode::QuickReflex => "space taps",
            GameMode::TrailTracker => "arrows move, space marks, backspace clears",
            GameMode::FreezeFrame => "arrows move, space toggles, enter checks, backspace clears",
            GameMode::SpeedTypist => "type the word, enter submits",
        }
    }
}

impl FromStr for GameMode {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GameMode::ALL
            .into_iter()
            .find(|mode| mode.to_string() == s)
            .ok_or_else(|| GameError::UnknownMode(s.to_string()))
    }
}

/// A discrete player input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Pick(usize),
    Cell { x: usize, y: usize },
    Toggle(usize),
    Tap,
    Key(char),
    Backspace,
    Submit,
    ClearInput,
}

pub trait MiniGame: std::fmt::Debug {
    fn mode(&self) -> GameMode;

    /// Abandons any round in flight and starts a new one at `level`
    fn start_round(&mut self, level: Level, rng: &mut dyn RngCore)
        -> Result<RoundToken, GameError>;

    fn tick(&mut self, dt_ms: u64) -> Result<Option<Verdict>, GameError>;

    /// Input outside the input phase is ignored
    fn act(&mut self, action: Action) -> Result<Option<Verdict>, GameError>;

    fn round(&self) -> &Round;

    fn reset(&mut self);

    fn board(&self) -> Board;
}

pub fn build(mode: GameMode, tuning: &Tuning) -> Result<Box<dyn MiniGame>, GameError> {
    Ok(match mode {
        GameMode::Classic => Box::new(Classic::new(tuning.classic.clone())),
        GameMode::ReverseSequence => {
            Box::new(ReverseSequence::new(tuning.reverse_sequence.clone()))
        }
        GameMode::PaletteRecall => Box::new(PaletteRecall::new(tuning.palette_recall.clone())),
        GameMode::QuickReflex => Box::new(QuickReflex::new(tuning.quick_reflex.clone())),
        GameMode::TrailTracker => Box::new(TrailTracker::new(tuning.trail_tracker.clone())),
        GameMode::FreezeFrame => Box::new(FreezeFrame::new(tuning.freeze_frame.clone())),
        GameMode::SpeedTypist => Box::new(SpeedTypist::new(tuning.speed_typist.clone())?),
    })
}

/// Tick handling shared by games whose only timed events are the
/// presentation and an optional deadline that counts as a wrong answer
pub(crate) fn tick_round(round: &mut Round, dt_ms: u64) -> Result<Option<Verdict>, GameError> {
    match round.tick(dt_ms)? {
        RoundEvent::DeadlineExpired => round.conclude(Outcome::Wrong).map(Some),
        RoundEvent::InputOpened | RoundEvent::Nothing => Ok(None),
    }
}

/// Renderer-neutral snapshot of what a game wants on screen
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Board {
    pub headline: String,
    pub rows: Vec<Vec<Glyph>>,
    /// Side length when `rows` is a square grid the player moves a cursor over
    pub grid: Option<usize>,
    pub text: Option<String>,
    pub status: Option<String>,
    pub hint: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub label: String,
    pub color: Option<Rgb>,
    pub mark: Mark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Plain,
    Highlight,
    Selected,
    Hidden,
}

impl Glyph {
    pub fn new(label: impl Into<String>, color: Option<Rgb>, mark: Mark) -> Self {
        Self {
            label: label.into(),
            color,
            mark,
        }
    }

    pub fn blank() -> Self {
        Self::new("·", None, Mark::Hidden)
    }
}

pub(crate) fn seconds(ms: u64) -> String {
    format!("{:.1}s", ms as f64 / 1000.0)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_names_roundtrip() {
        for mode in GameMode::ALL {
            assert_eq!(mode.to_string().parse::<GameMode>().unwrap(), mode);
        }
        assert_eq!(GameMode::PaletteRecall.to_string(), "palette-recall");
    }

    #[test]
    fn unknown_mode_is_an_error() {
        assert_eq!(
            "tetris".parse::<GameMode>(),
            Err(GameError::UnknownMode("tetris".into()))
        );
    }

    #[test]
    fn build_covers_every_mode() {
        let tuning = Tuning::default();
        for mode in GameMode::ALL {
            assert_eq!(build(mode, &tuning).unwrap().mode(), mode);
        }
    }

    #[test]
    fn every_game_ignores_input_before_a_round() {
        let tuning = Tuning::default();
        for mode in GameMode::ALL {
            let mut game = build(mode, &tuning).unwrap();
            for action in [
                Action::Pick(0),
                Action::Tap,
                Action::Key('a'),
                Action::Submit,
                Action::Cell { x: 0, y: 0 },
            ] {
                assert_eq!(game.act(action).unwrap(), None, "{mode}");
            }
        }
    }

    #[test]
    fn every_game_produces_one_verdict_on_timeout_or_input() {
        let tuning = Tuning::default();
        for mode in GameMode::ALL {
            let mut game = build(mode, &tuning).unwrap();
            let mut rng = testing::rng(11);
            let token = game.start_round(0, &mut rng).unwrap();
            testing::skip_presentation(game.as_mut());
            let mut verdicts = Vec::new();
            for _ in 0..2_000 {
                if let Some(v) = game.act(Action::Submit).unwrap() {
                    verdicts.push(v);
                }
                if let Some(v) = game.act(Action::Tap).unwrap() {
                    verdicts.push(v);
                }
                for i in 0..8 {
                    if let Some(v) = game.act(Action::Pick(i)).unwrap() {
                        verdicts.push(v);
                    }
                }
                if let Some(v) = game.tick(100).unwrap() {
                    verdicts.push(v);
                }
                for y in 0..4 {
                    if let Some(v) = game.act(Action::Cell { x: 0, y }).unwrap() {
                        verdicts.push(v);
                    }
                }
                if let Some(v) = game.act(Action::Key('z')).unwrap() {
                    verdicts.push(v);
                }
            }
            assert_eq!(verdicts.len(), 1, "{mode} produced {verdicts:?}");
            assert_eq!(verdicts[0].token, token);
        }
    }
}
