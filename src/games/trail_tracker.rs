use rand::{seq::SliceRandom, RngCore};

use super::{seconds, tick_round, Action, Board, GameMode, Glyph, Mark, MiniGame};
use crate::compare::{whole_response, StepGate, StepResult};
use crate::config::TrailTrackerTuning;
use crate::difficulty::Level;
use crate::error::GameError;
use crate::round::{Outcome, Phase, Round, Verdict};
use crate::timer::{PresentationTimer, RoundToken};

const DIRECTIONS: [(isize, isize); 8] = [
    (0, -1),
    (0, 1),
    (-1, 0),
    (1, 0),
    (-1, -1),
    (1, -1),
    (-1, 1),
    (1, 1),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: usize,
    pub y: usize,
}

impl Point {
    fn step(self, (dx, dy): (isize, isize), size: usize) -> Option<Point> {
        let x = self.x.checked_add_signed(dx)?;
        let y = self.y.checked_add_signed(dy)?;
        (x < size && y < size).then_some(Point { x, y })
    }

    pub fn is_adjacent(self, other: Point) -> bool {
        self != other && self.x.abs_diff(other.x) <= 1 && self.y.abs_diff(other.y) <= 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trail {
    pub points: Vec<Point>,
    pub grid: usize,
    pub show_ms: u64,
}

impl Trail {
    pub fn step_ms(&self) -> u64 {
        self.show_ms / self.points.len().max(1) as u64
    }
}

pub fn generate(level: Level, tuning: &TrailTrackerTuning, rng: &mut dyn RngCore) -> Trail {
    let length = tuning.length.at(level);
    let grid = tuning.grid.at(level).max(2);
    let mut current = Point {
        x: grid / 2,
        y: grid / 2,
    };
    let mut points = vec![current];
    while points.len() < length {
        let options: Vec<Point> = DIRECTIONS
            .iter()
            .filter_map(|&dir| current.step(dir, grid))
            .collect();
        let Some(&next) = options.choose(rng) else {
            break;
        };
        points.push(next);
        current = next;
    }
    Trail {
        points,
        grid,
        show_ms: tuning.show.at(level),
    }
}

/// How a retraced trail is checked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrailCheck {
    Whole,
    Stepped(StepGate),
}

#[derive(Debug)]
pub struct TrailTracker {
    tuning: TrailTrackerTuning,
    round: Round,
    trail: Option<Trail>,
    response: Vec<Point>,
    check: TrailCheck,
    last_miss: Option<Point>,
}

impl TrailTracker {
    pub fn new(tuning: TrailTrackerTuning) -> Self {
        Self {
            tuning,
            round: Round::new(),
            trail: None,
            response: Vec::new(),
            check: TrailCheck::Whole,
            last_miss: None,
        }
    }

    pub fn trail(&self) -> Option<&Trail> {
        self.trail.as_ref()
    }

    pub fn response(&self) -> &[Point] {
        &self.response
    }

    pub fn check(&self) -> &TrailCheck {
        &self.check
    }

    fn enter(&mut self, point: Point) -> Result<Option<Verdict>, GameError> {
        let Some(trail) = &self.trail else {
            return Ok(None);
        };
        if point.x >= trail.grid || point.y >= trail.grid {
            return Ok(None);
        }
        let expected_len = trail.points.len();
        match &mut self.check {
            TrailCheck::Whole => {
                self.response.push(point);
                if self.response.len() < expected_len {
                    return Ok(None);
                }
                let outcome = whole_response(&trail.points, &self.response);
                self.round.conclude(outcome).map(Some)
            }
            TrailCheck::Stepped(gate) => {
                let Some(expected) = trail.points.get(self.response.len()) else {
                    return Ok(None);
                };
                match gate.check(expected, &point) {
                    StepResult::Accepted => {
                        self.last_miss = None;
                        self.response.push(point);
                        if self.response.len() == expected_len {
                            self.round.conclude(Outcome::Correct).map(Some)
                        } else {
                            Ok(None)
                        }
                    }
                    StepResult::Rejected { .. } => {
                        self.last_miss = Some(point);
                        Ok(None)
                    }
                    StepResult::Exhausted => {
                        self.last_miss = Some(point);
                        self.round.conclude(Outcome::Wrong).map(Some)
                    }
                }
            }
        }
    }
}

impl MiniGame for TrailTracker {
    fn mode(&self) -> GameMode {
        GameMode::TrailTracker
    }

    fn start_round(
        &mut self,
        level: Level,
        rng: &mut dyn RngCore,
    ) -> Result<RoundToken, GameError> {
        let token = self.round.begin()?;
        let trail = generate(level, &self.tuning, rng);
        self.check = if level >= self.tuning.step_gated_from {
            TrailCheck::Stepped(StepGate::new(*self.tuning.attempts.pick(level)))
        } else {
            TrailCheck::Whole
        };
        let (steps, step_ms, settle_ms) = (trail.points.len(), trail.step_ms(), self.tuning.settle_ms);
        self.trail = Some(trail);
        self.response.clear();
        self.last_miss = None;
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
        match action {
            Action::Cell { x, y } => self.enter(Point { x, y }),
            Action::ClearInput | Action::Backspace if self.check == TrailCheck::Whole => {
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
        self.trail = None;
        self.response.clear();
        self.last_miss = None;
    }

    fn board(&self) -> Board {
        let Some(trail) = &self.trail else {
            return Board::default();
        };
        let phase = self.round.phase();
        let revealed = match phase {
            Phase::Showing => self
                .round
                .presentation()
                .map(|t| t.revealed())
                .unwrap_or(trail.points.len()),
            Phase::Evaluated(_) => trail.points.len(),
            _ => 0,
        };
        let mut rows = vec![vec![Glyph::blank(); trail.grid]; trail.grid];
        for (i, p) in trail.points.iter().take(revealed).enumerate() {
            let mark = if phase == Phase::Showing && i + 1 == revealed {
                Mark::Highlight
            } else {
                Mark::Plain
            };
            rows[p.y][p.x] = Glyph::new(format!("{}", i + 1), None, mark);
        }
        for (i, p) in self.response.iter().enumerate() {
            rows[p.y][p.x] = Glyph::new(format!("{}", i + 1), None, Mark::Selected);
        }
        if let Some(miss) = self.last_miss {
            rows[miss.y][miss.x] = Glyph::new("x", None, Mark::Highlight);
        }

        let headline = match phase {
            Phase::Showing => format!("Watch the trail... ({})", seconds(trail.show_ms)),
            Phase::Input => "Retrace the trail!".to_string(),
            Phase::Evaluated(Outcome::Correct) => "Perfect trail!".to_string(),
            Phase::Evaluated(Outcome::Wrong) => "Lost the trail!".to_string(),
            Phase::Idle => String::new(),
        };
        let status = match &self.check {
            TrailCheck::Whole => format!("{}/{} points", self.response.len(), trail.points.len()),
            TrailCheck::Stepped(gate) => format!(
                "{}/{} points, {} attempts left",
                self.response.len(),
                trail.points.len(),
                gate.attempts_left()
            ),
        };
        Board {
            headline,
            rows,
            grid: Some(trail.grid),
            status: Some(status),
            hint: GameMode::TrailTracker.controls().to_string(),
            ..Board::default()
        }
    }
}
