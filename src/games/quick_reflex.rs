use rand::{Rng, RngCore};

use super::{seconds, Action, Board, GameMode, Glyph, Mark, MiniGame};
use crate::config::QuickReflexTuning;
use crate::difficulty::Level;
use crate::error::GameError;
use crate::palette::SIGNAL_COLORS;
use crate::round::{Outcome, Phase, Round, RoundEvent, Verdict};
use crate::timer::{PresentationTimer, RoundToken};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashSequence {
    /// Indices into [`SIGNAL_COLORS`]
    pub colors: Vec<usize>,
    pub target: usize,
    pub interval_ms: u64,
}

impl FlashSequence {
    /// Index of the flash on screen `elapsed_ms` after the first one appeared.
    /// The last flash stays up until the deadline.
    pub fn flash_at(&self, elapsed_ms: u64) -> usize {
        let step = elapsed_ms.checked_div(self.interval_ms).unwrap_or(0) as usize;
        step.min(self.colors.len().saturating_sub(1))
    }

    /// Time from the first flash until the round is given up as missed
    pub fn window_ms(&self, grace_ms: u64) -> u64 {
        let gaps = self.colors.len().saturating_sub(1) as u64;
        gaps.saturating_mul(self.interval_ms).saturating_add(grace_ms)
    }
}

pub fn generate(level: Level, tuning: &QuickReflexTuning, rng: &mut dyn RngCore) -> FlashSequence {
    let length = tuning.length.at(level);
    let colors: Vec<usize> = (0..length)
        .map(|_| rng.gen_range(0..SIGNAL_COLORS.len()))
        .collect();
    let target = colors[rng.gen_range(0..colors.len())];
    FlashSequence {
        colors,
        target,
        interval_ms: tuning.interval.at(level),
    }
}

#[derive(Debug)]
pub struct QuickReflex {
    tuning: QuickReflexTuning,
    round: Round,
    sequence: Option<FlashSequence>,
    tapped: Option<usize>,
}

impl QuickReflex {
    pub fn new(tuning: QuickReflexTuning) -> Self {
        Self {
            tuning,
            round: Round::new(),
            sequence: None,
            tapped: None,
        }
    }

    pub fn sequence(&self) -> Option<&FlashSequence> {
        self.sequence.as_ref()
    }

    /// The color currently flashing, if the flashes have started
    pub fn current_flash(&self) -> Option<usize> {
        let sequence = self.sequence.as_ref()?;
        let deadline = self.round.deadline()?;
        sequence
            .colors
            .get(sequence.flash_at(deadline.elapsed_ms()))
            .copied()
    }
}

impl MiniGame for QuickReflex {
    fn mode(&self) -> GameMode {
        GameMode::QuickReflex
    }

    fn start_round(
        &mut self,
        level: Level,
        rng: &mut dyn RngCore,
    ) -> Result<RoundToken, GameError> {
        let token = self.round.begin()?;
        let sequence = generate(level, &self.tuning, rng);
        let interval_ms = sequence.interval_ms;
        self.sequence = Some(sequence);
        self.tapped = None;
        self.round
            .present(|token| PresentationTimer::single(token, interval_ms));
        Ok(token)
    }

    fn tick(&mut self, dt_ms: u64) -> Result<Option<Verdict>, GameError> {
        match self.round.tick(dt_ms)? {
            RoundEvent::InputOpened => {
                if let Some(sequence) = &self.sequence {
                    let window = sequence.window_ms(self.tuning.grace_ms);
                    self.round.set_deadline(window);
                }
                Ok(None)
            }
            RoundEvent::DeadlineExpired => self.round.conclude(Outcome::Wrong).map(Some),
            RoundEvent::Nothing => Ok(None),
        }
    }

    fn act(&mut self, action: Action) -> Result<Option<Verdict>, GameError> {
        if !self.round.accepts_input() || action != Action::Tap {
            return Ok(None);
        }
        let (Some(sequence), Some(flash)) = (&self.sequence, self.current_flash()) else {
            return Ok(None);
        };
        let outcome = Outcome::from_bool(flash == sequence.target);
        self.tapped = Some(flash);
        self.round.conclude(outcome).map(Some)
    }

    fn round(&self) -> &Round {
        &self.round
    }

    fn reset(&mut self) {
        self.round.reset();
        self.sequence = None;
        self.tapped = None;
    }

    fn board(&self) -> Board {
        let Some(sequence) = &self.sequence else {
            return Board::default();
        };
        let target = SIGNAL_COLORS[sequence.target];
        let target_glyph = Glyph::new(
            format!("target: {}", target.name),
            Some(target.rgb),
            Mark::Highlight,
        );
        let flash_glyph = match (self.round.phase(), self.current_flash(), self.tapped) {
            (Phase::Input, Some(idx), _) | (Phase::Evaluated(_), _, Some(idx)) => {
                let color = SIGNAL_COLORS[idx];
                Glyph::new(color.name, Some(color.rgb), Mark::Plain)
            }
            _ => Glyph::blank(),
        };
        let headline = match self.round.phase() {
            Phase::Evaluated(Outcome::Correct) => "Lightning fast!".to_string(),
            Phase::Evaluated(Outcome::Wrong) if self.tapped.is_some() => {
                format!("Too hasty! That wasn't {}", target.name)
            }
            Phase::Evaluated(Outcome::Wrong) => format!("Missed {}!", target.name),
            _ => format!("Tap when you see {}!", target.name),
        };
        Board {
            headline,
            rows: vec![vec![flash_glyph], vec![target_glyph]],
            status: Some(format!(
                "{} flashes, one every {}",
                sequence.colors.len(),
                seconds(sequence.interval_ms)
            )),
            hint: GameMode::QuickReflex.controls().to_string(),
            ..Board::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::testing::{rng, skip_presentation};

    fn ready_game(level: Level, seed: u64) -> QuickReflex {
        let mut game = QuickReflex::new(QuickReflexTuning::default());
        game.start_round(level, &mut rng(seed)).unwrap();
        skip_presentation(&mut game);
        game
    }

    #[test]
    fn target_always_appears_in_the_sequence() {
        let tuning = QuickReflexTuning::default();
        let mut rng = rng(1);
        for level in 0..30 {
            let sequence = generate(level, &tuning, &mut rng);
            assert!(sequence.colors.contains(&sequence.target));
            assert!((5..=12).contains(&sequence.colors.len()));
        }
    }

    #[test]
    fn interval_shrinks_to_the_floor() {
        let tuning = QuickReflexTuning::default();
        let mut rng = rng(2);
        assert_eq!(generate(0, &tuning, &mut rng).interval_ms, 1200);
        assert_eq!(generate(4, &tuning, &mut rng).interval_ms, 1000);
        assert_eq!(generate(100, &tuning, &mut rng).interval_ms, 500);
    }

    #[test]
    fn flash_index_holds_on_the_last_color() {
        let sequence = FlashSequence {
            colors: vec![0, 1, 2],
            target: 2,
            interval_ms: 100,
        };
        assert_eq!(sequence.flash_at(0), 0);
        assert_eq!(sequence.flash_at(199), 1);
        assert_eq!(sequence.flash_at(250), 2);
        assert_eq!(sequence.flash_at(10_000), 2);
        assert_eq!(sequence.window_ms(500), 700);
    }

    #[test]
    fn tapping_on_target_is_correct() {
        let mut game = ready_game(0, 3);
        let sequence = game.sequence().unwrap().clone();
        while game.current_flash() != Some(sequence.target) {
            assert_eq!(game.tick(sequence.interval_ms).unwrap(), None);
        }
        let verdict = game.act(Action::Tap).unwrap().unwrap();
        assert_eq!(verdict.outcome, Outcome::Correct);
        assert!(!game.round().has_pending_timer());
    }

    #[test]
    fn tapping_on_another_color_is_wrong() {
        let tuning = QuickReflexTuning::default();
        // find a seed whose first flash is not the target
        let seed = (0..100)
            .find(|&s| {
                let sequence = generate(0, &tuning, &mut rng(s));
                sequence.colors[0] != sequence.target
            })
            .unwrap();
        let mut game = ready_game(0, seed);
        let verdict = game.act(Action::Tap).unwrap().unwrap();
        assert_eq!(verdict.outcome, Outcome::Wrong);
    }

    #[test]
    fn letting_the_sequence_run_out_is_wrong() {
        let mut game = ready_game(0, 4);
        let window = game
            .sequence()
            .unwrap()
            .window_ms(QuickReflexTuning::default().grace_ms);
        assert_eq!(game.tick(window - 1).unwrap(), None);
        let verdict = game.tick(1).unwrap().unwrap();
        assert_eq!(verdict.outcome, Outcome::Wrong);
        assert_eq!(game.tick(5_000).unwrap(), None);
    }

    #[test]
    fn taps_before_the_first_flash_are_ignored() {
        let mut game = QuickReflex::new(QuickReflexTuning::default());
        game.start_round(0, &mut rng(5)).unwrap();
        assert_eq!(game.act(Action::Tap).unwrap(), None);
        assert_eq!(game.current_flash(), None);
    }

    #[test]
    fn board_announces_the_target() {
        let game = ready_game(0, 6);
        let target = SIGNAL_COLORS[game.sequence().unwrap().target].name;
        assert_eq!(game.board().headline, format!("Tap when you see {target}!"));
    }
}
