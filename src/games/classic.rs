use rand::{seq::SliceRandom, Rng, RngCore};

use super::{seconds, tick_round, Action, Board, GameMode, Glyph, Mark, MiniGame};
use crate::config::ClassicTuning;
use crate::difficulty::Level;
use crate::error::GameError;
use crate::palette::{NamedColor, CARD_COLORS};
use crate::round::{Outcome, Phase, Round, Verdict};
use crate::timer::{PresentationTimer, RoundToken};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Card {
    pub id: usize,
    pub color: NamedColor,
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Deal {
    /// Ordered by position
    pub cards: Vec<Card>,
    pub target: usize,
    pub memory_ms: u64,
}

impl Deal {
    pub fn target_card(&self) -> Option<&Card> {
        self.cards.iter().find(|card| card.id == self.target)
    }
}

pub fn generate(level: Level, tuning: &ClassicTuning, rng: &mut dyn RngCore) -> Deal {
    let count = tuning.cards.at(level).min(CARD_COLORS.len());
    let mut positions: Vec<usize> = (0..count).collect();
    positions.shuffle(rng);

    let mut cards: Vec<Card> = CARD_COLORS[..count]
        .iter()
        .zip(positions)
        .enumerate()
        .map(|(id, (color, position))| Card {
            id,
            color: *color,
            position,
        })
        .collect();
    cards.sort_by_key(|card| card.position);

    let memory_ms = tuning
        .memory_base_ms
        .saturating_add(tuning.memory_per_card_ms * count as u64)
        .max(tuning.memory_floor_ms);

    Deal {
        cards,
        target: rng.gen_range(0..count),
        memory_ms,
    }
}

#[derive(Debug)]
pub struct Classic {
    tuning: ClassicTuning,
    round: Round,
    deal: Option<Deal>,
    picked: Option<usize>,
}

impl Classic {
    pub fn new(tuning: ClassicTuning) -> Self {
        Self {
            tuning,
            round: Round::new(),
            deal: None,
            picked: None,
        }
    }

    pub fn deal(&self) -> Option<&Deal> {
        self.deal.as_ref()
    }
}

impl MiniGame for Classic {
    fn mode(&self) -> GameMode {
        GameMode::Classic
    }

    fn start_round(
        &mut self,
        level: Level,
        rng: &mut dyn RngCore,
    ) -> Result<RoundToken, GameError> {
        let token = self.round.begin()?;
        let deal = generate(level, &self.tuning, rng);
        let memory_ms = deal.memory_ms;
        self.deal = Some(deal);
        self.picked = None;
        self.round
            .present(|token| PresentationTimer::single(token, memory_ms));
        Ok(token)
    }

    fn tick(&mut self, dt_ms: u64) -> Result<Option<Verdict>, GameError> {
        tick_round(&mut self.round, dt_ms)
    }

    fn act(&mut self, action: Action) -> Result<Option<Verdict>, GameError> {
        if !self.round.accepts_input() {
            return Ok(None);
        }
        let Action::Pick(position) = action else {
            return Ok(None);
        };
        let Some(deal) = &self.deal else {
            return Ok(None);
        };
        let Some(card) = deal.cards.get(position) else {
            return Ok(None);
        };
        let outcome = Outcome::from_bool(card.id == deal.target);
        self.picked = Some(position);
        self.round.conclude(outcome).map(Some)
    }

    fn round(&self) -> &Round {
        &self.round
    }

    fn reset(&mut self) {
        self.round.reset();
        self.deal = None;
        self.picked = None;
    }

    fn board(&self) -> Board {
        let Some(deal) = &self.deal else {
            return Board::default();
        };
        let target_name = deal.target_card().map(|c| c.color.name).unwrap_or("?");
        let phase = self.round.phase();
        let row = deal
            .cards
            .iter()
            .map(|card| match phase {
                Phase::Input => Glyph::new(format!("{}", card.position + 1), None, Mark::Hidden),
                Phase::Evaluated(_) => {
                    let mark = if card.id == deal.target {
                        Mark::Highlight
                    } else if self.picked == Some(card.position) {
                        Mark::Selected
                    } else {
                        Mark::Plain
                    };
                    Glyph::new(card.color.name, Some(card.color.rgb), mark)
                }
                _ => Glyph::new(card.color.name, Some(card.color.rgb), Mark::Plain),
            })
            .collect();
        let headline = match phase {
            Phase::Showing => format!("Memorize the colors... ({})", seconds(deal.memory_ms)),
            Phase::Input => format!("Where was {target_name}?"),
            Phase::Evaluated(Outcome::Correct) => "Correct!".to_string(),
            Phase::Evaluated(Outcome::Wrong) => format!("Wrong! {target_name} was highlighted"),
            Phase::Idle => String::new(),
        };
        Board {
            headline,
            rows: vec![row],
            hint: GameMode::Classic.controls().to_string(),
            ..Board::default()
        }
    }
}
