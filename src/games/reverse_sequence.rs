use rand::{Rng, RngCore};

use super::{tick_round, Action, Board, GameMode, Glyph, Mark, MiniGame};
use crate::compare::whole_response;
use crate::config::ReverseSequenceTuning;
use crate::difficulty::Level;
use crate::error::GameError;
use crate::palette::SIGNAL_COLORS;
use crate::round::{Outcome, Phase, Round, Verdict};
use crate::timer::{PresentationTimer, RoundToken};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    /// Indices into [`SIGNAL_COLORS`]
    pub colors: Vec<usize>,
    pub step_ms: u64,
}

impl Sequence {
    pub fn reversed(&self) -> Vec<usize> {
        self.colors.iter().rev().copied().collect()
    }
}

pub fn generate(level: Level, tuning: &ReverseSequenceTuning, rng: &mut dyn RngCore) -> Sequence {
    let length = tuning.length.at(level);
    Sequence {
        colors: (0..length)
            .map(|_| rng.gen_range(0..SIGNAL_COLORS.len()))
            .collect(),
        step_ms: tuning.step.at(level),
    }
}

#[derive(Debug)]
pub struct ReverseSequence {
    tuning: ReverseSequenceTuning,
    round: Round,
    sequence: Option<Sequence>,
    response: Vec<usize>,
}

impl ReverseSequence {
    pub fn new(tuning: ReverseSequenceTuning) -> Self {
        Self {
            tuning,
            round: Round::new(),
            sequence: None,
            response: Vec::new(),
        }
    }

    pub fn sequence(&self) -> Option<&Sequence> {
        self.sequence.as_ref()
    }

    pub fn response(&self) -> &[usize] {
        &self.response
    }
}

impl MiniGame for ReverseSequence {
    fn mode(&self) -> GameMode {
        GameMode::ReverseSequence
    }

    fn start_round(
        &mut self,
        level: Level,
        rng: &mut dyn RngCore,
    ) -> Result<RoundToken, GameError> {
        let token = self.round.begin()?;
        let sequence = generate(level, &self.tuning, rng);
        let (steps, step_ms, settle_ms) =
            (sequence.colors.len(), sequence.step_ms, self.tuning.settle_ms);
        self.sequence = Some(sequence);
        self.response.clear();
        self.round
            .present(|token| PresentationTimer::stepped(token, steps, step_ms, settle_ms));
        Ok(token)
    }

    fn tick(&mut self, dt_ms: u64) -> Result<Option<Verdict>, GameError> {
        tick_round(&mut self.round, dt_ms)
    }

    fn act(&mut self, action: Action) -> Result<Option<Verdict>, GameError> {
        if !self.round.accepts_input() {
            return Ok(None);
        }
        let Some(sequence) = &self.sequence else {
            return Ok(None);
        };
        match action {
            Action::Pick(color) if color < SIGNAL_COLORS.len() => {
                self.response.push(color);
                if self.response.len() < sequence.colors.len() {
                    return Ok(None);
                }
                let outcome = whole_response(&sequence.reversed(), &self.response);
                self.round.conclude(outcome).map(Some)
            }
            Action::ClearInput | Action::Backspace => {
                self.response.clear();
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    fn round(&self) -> &Round {
        &self.round
    }

    fn reset(&mut self) {
        self.round.reset();
        self.sequence = None;
        self.response.clear();
    }

    fn board(&self) -> Board {
        let Some(sequence) = &self.sequence else {
            return Board::default();
        };
        let colored = |idx: usize, mark: Mark| {
            let color = SIGNAL_COLORS[idx];
            Glyph::new(color.name, Some(color.rgb), mark)
        };
        match self.round.phase() {
            Phase::Showing => {
                let revealed = self
                    .round
                    .presentation()
                    .map(|t| t.revealed())
                    .unwrap_or(sequence.colors.len());
                let row = sequence
                    .colors
                    .iter()
                    .enumerate()
                    .map(|(i, &c)| {
                        if i + 1 == revealed {
                            colored(c, Mark::Highlight)
                        } else if i < revealed {
                            colored(c, Mark::Plain)
                        } else {
                            Glyph::blank()
                        }
                    })
                    .collect();
                Board {
                    headline: format!(
                        "Watch the sequence... ({}ms per color)",
                        sequence.step_ms
                    ),
                    rows: vec![row],
                    hint: "you'll need to input it in reverse".to_string(),
                    ..Board::default()
                }
            }
            phase => {
                let entered = self
                    .response
                    .iter()
                    .map(|&c| colored(c, Mark::Selected))
                    .chain(
                        std::iter::repeat_with(Glyph::blank)
                            .take(sequence.colors.len().saturating_sub(self.response.len())),
                    )
                    .collect();
                let choices = (0..SIGNAL_COLORS.len())
                    .map(|i| {
                        let color = SIGNAL_COLORS[i];
                        Glyph::new(format!("{} {}", i + 1, color.name), Some(color.rgb), Mark::Plain)
                    })
                    .collect();
                let headline = match phase.outcome() {
                    Some(Outcome::Correct) => "Correct!".to_string(),
                    Some(Outcome::Wrong) => "Wrong order!".to_string(),
                    None => "Input in REVERSE order!".to_string(),
                };
                Board {
                    headline,
                    rows: vec![entered, choices],
                    hint: GameMode::ReverseSequence.controls().to_string(),
                    ..Board::default()
                }
            }
        }
    }
}
