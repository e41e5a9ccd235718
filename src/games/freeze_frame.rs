use rand::{seq::SliceRandom, RngCore};

use super::{seconds, tick_round, Action, Board, GameMode, Glyph, Mark, MiniGame};
use crate::compare::whole_response;
use crate::config::FreezeFrameTuning;
use crate::difficulty::Level;
use crate::error::GameError;
use crate::round::{Outcome, Phase, Round, Verdict};
use crate::timer::{PresentationTimer, RoundToken};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub size: usize,
    /// Row-major, `size * size` cells
    pub active: Vec<bool>,
    pub show_ms: u64,
}

impl Pattern {
    pub fn cells(&self) -> usize {
        self.size * self.size
    }

    pub fn active_count(&self) -> usize {
        self.active.iter().filter(|&&on| on).count()
    }
}

pub fn generate(level: Level, tuning: &FreezeFrameTuning, rng: &mut dyn RngCore) -> Pattern {
    let size = tuning.grid.at(level).max(2);
    let cells = size * size;
    let count = tuning.active.at(level).min(cells / 2);
    let mut order: Vec<usize> = (0..cells).collect();
    order.shuffle(rng);
    let mut active = vec![false; cells];
    for &idx in &order[..count] {
        active[idx] = true;
    }
    Pattern {
        size,
        active,
        show_ms: tuning.show.at(level),
    }
}

#[derive(Debug)]
pub struct FreezeFrame {
    tuning: FreezeFrameTuning,
    round: Round,
    pattern: Option<Pattern>,
    selected: Vec<bool>,
}

impl FreezeFrame {
    pub fn new(tuning: FreezeFrameTuning) -> Self {
        Self {
            tuning,
            round: Round::new(),
            pattern: None,
            selected: Vec::new(),
        }
    }

    pub fn pattern(&self) -> Option<&Pattern> {
        self.pattern.as_ref()
    }

    pub fn selected(&self) -> &[bool] {
        &self.selected
    }
}

fn toggle(selected: &mut [bool], idx: usize) {
    if let Some(cell) = selected.get_mut(idx) {
        *cell = !*cell;
    }
}

impl MiniGame for FreezeFrame {
    fn mode(&self) -> GameMode {
        GameMode::FreezeFrame
    }

    fn start_round(
        &mut self,
        level: Level,
        rng: &mut dyn RngCore,
    ) -> Result<RoundToken, GameError> {
        let token = self.round.begin()?;
        let pattern = generate(level, &self.tuning, rng);
        let show_ms = pattern.show_ms;
        self.selected = vec![false; pattern.cells()];
        self.pattern = Some(pattern);
        self.round
            .present(|token| PresentationTimer::single(token, show_ms));
        Ok(token)
    }

    fn tick(&mut self, dt_ms: u64) -> Result<Option<Verdict>, GameError> {
        tick_round(&mut self.round, dt_ms)
    }

    fn act(&mut self, action: Action) -> Result<Option<Verdict>, GameError> {
        if !self.round.accepts_input() {
            return Ok(None);
        }
        let Some(pattern) = &self.pattern else {
            return Ok(None);
        };
        let size = pattern.size;
        match action {
            Action::Toggle(idx) => toggle(&mut self.selected, idx),
            Action::Cell { x, y } if x < size && y < size => toggle(&mut self.selected, y * size + x),
            Action::ClearInput | Action::Backspace => self.selected.fill(false),
            Action::Submit => {
                let outcome = whole_response(&pattern.active, &self.selected);
                return self.round.conclude(outcome).map(Some);
            }
            _ => {}
        }
        Ok(None)
    }

    fn round(&self) -> &Round {
        &self.round
    }

    fn reset(&mut self) {
        self.round.reset();
        self.pattern = None;
        self.selected.clear();
    }

    fn board(&self) -> Board {
        let Some(pattern) = &self.pattern else {
            return Board::default();
        };
        let phase = self.round.phase();
        let rows = (0..pattern.size)
            .map(|y| {
                (0..pattern.size)
                    .map(|x| {
                        let idx = y * pattern.size + x;
                        let lit = pattern.active[idx];
                        let picked = self.selected.get(idx).copied().unwrap_or(false);
                        match phase {
                            Phase::Showing if lit => Glyph::new("■", None, Mark::Highlight),
                            Phase::Input if picked => Glyph::new("■", None, Mark::Selected),
                            Phase::Evaluated(_) if lit && picked => {
                                Glyph::new("■", None, Mark::Highlight)
                            }
                            Phase::Evaluated(_) if lit => Glyph::new("□", None, Mark::Highlight),
                            Phase::Evaluated(_) if picked => Glyph::new("x", None, Mark::Selected),
                            _ => Glyph::blank(),
                        }
                    })
                    .collect()
            })
            .collect();
        let headline = match phase {
            Phase::Showing => format!("Memorize the pattern... ({})", seconds(pattern.show_ms)),
            Phase::Input => "Recreate the pattern!".to_string(),
            Phase::Evaluated(Outcome::Correct) => "Perfect recall!".to_string(),
            Phase::Evaluated(Outcome::Wrong) => "Pattern mismatch!".to_string(),
            Phase::Idle => String::new(),
        };
        let chosen = self.selected.iter().filter(|&&on| on).count();
        Board {
            headline,
            rows,
            grid: Some(pattern.size),
            status: Some(format!("{chosen}/{} cells selected", pattern.active_count())),
            hint: GameMode::FreezeFrame.controls().to_string(),
            ..Board::default()
        }
    }
}
