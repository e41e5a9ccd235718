use rand::{seq::SliceRandom, Rng, RngCore};

use super::{seconds, tick_round, Action, Board, GameMode, Glyph, Mark, MiniGame};
use crate::compare::RateThreshold;
use crate::config::PaletteRecallTuning;
use crate::difficulty::Level;
use crate::error::GameError;
use crate::palette::Hsl;
use crate::round::{Outcome, Phase, Round, Verdict};
use crate::timer::{PresentationTimer, RoundToken};

const HUE_SPACING: u16 = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub position: usize,
    pub options: Vec<Hsl>,
    /// Index of the true color in `options`
    pub answer: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaletteChallenge {
    pub colors: Vec<Hsl>,
    pub questions: Vec<Question>,
    pub required_rate: f64,
    pub show_ms: u64,
}

pub fn generate(level: Level, tuning: &PaletteRecallTuning, rng: &mut dyn RngCore) -> PaletteChallenge {
    let size = tuning.size.pick(level).sample(rng);
    let base_hue: u16 = rng.gen_range(0..360);
    let colors: Vec<Hsl> = (0..size)
        .map(|i| {
            Hsl::new(
                base_hue + (i as u16 % 12) * HUE_SPACING,
                rng.gen_range(60..=80),
                rng.gen_range(40..=60),
            )
        })
        .collect();

    let wanted = (*tuning.questions.pick(level)).max(1);
    let mut positions: Vec<usize> = (0..size).collect();
    positions.shuffle(rng);
    let questions = positions
        .iter()
        .cycle()
        .take(wanted)
        .map(|&position| question(position, colors[position], tuning, rng))
        .collect();

    PaletteChallenge {
        colors,
        questions,
        required_rate: *tuning.required_rate.pick(level),
        show_ms: tuning.show.at(level),
    }
}

fn question(position: usize, target: Hsl, tuning: &PaletteRecallTuning, rng: &mut dyn RngCore) -> Question {
    let mut options = vec![target];
    for k in 1..tuning.options.max(2) {
        let hue_shift = (tuning.decoy_hue_step as usize * k % 360) as u16;
        let mut decoy = Hsl::new(
            target.h + hue_shift,
            jitter(target.s, rng, 20, 100),
            jitter(target.l, rng, 20, 80),
        );
        if decoy.h == target.h {
            decoy = Hsl::new(target.h + k as u16, decoy.s, decoy.l);
        }
        options.push(decoy);
    }
    options.shuffle(rng);
    let answer = options.iter().position(|o| *o == target).unwrap_or(0);
    Question {
        position,
        options,
        answer,
    }
}

fn jitter(base: u8, rng: &mut dyn RngCore, lo: i16, hi: i16) -> u8 {
    (base as i16 + rng.gen_range(-10..=10)).clamp(lo, hi) as u8
}

#[derive(Debug)]
pub struct PaletteRecall {
    tuning: PaletteRecallTuning,
    round: Round,
    challenge: Option<PaletteChallenge>,
    rule: RateThreshold,
    answers: Vec<bool>,
}

impl PaletteRecall {
    pub fn new(tuning: PaletteRecallTuning) -> Self {
        Self {
            tuning,
            round: Round::new(),
            challenge: None,
            rule: RateThreshold::new(1, 1.0),
            answers: Vec::new(),
        }
    }

    pub fn challenge(&self) -> Option<&PaletteChallenge> {
        self.challenge.as_ref()
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.challenge
            .as_ref()
            .and_then(|c| c.questions.get(self.answers.len()))
    }

    pub fn answers(&self) -> &[bool] {
        &self.answers
    }

    pub fn rule(&self) -> &RateThreshold {
        &self.rule
    }
}

impl MiniGame for PaletteRecall {
    fn mode(&self) -> GameMode {
        GameMode::PaletteRecall
    }

    fn start_round(
        &mut self,
        level: Level,
        rng: &mut dyn RngCore,
    ) -> Result<RoundToken, GameError> {
        let token = self.round.begin()?;
        let challenge = generate(level, &self.tuning, rng);
        self.rule = RateThreshold::new(challenge.questions.len(), challenge.required_rate);
        self.answers.clear();
        let show_ms = challenge.show_ms;
        self.challenge = Some(challenge);
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
        let Action::Pick(choice) = action else {
            return Ok(None);
        };
        let Some((answer, options)) = self
            .current_question()
            .map(|q| (q.answer, q.options.len()))
        else {
            return Ok(None);
        };
        if choice >= options {
            return Ok(None);
        }
        let correct = choice == answer;
        self.answers.push(correct);
        match self.rule.record(correct) {
            Some(outcome) => self.round.conclude(outcome).map(Some),
            None => Ok(None),
        }
    }

    fn round(&self) -> &Round {
        &self.round
    }

    fn reset(&mut self) {
        self.round.reset();
        self.challenge = None;
        self.answers.clear();
    }

    fn board(&self) -> Board {
        let Some(challenge) = &self.challenge else {
            return Board::default();
        };
        let strip = || -> Vec<Glyph> {
            challenge
                .colors
                .iter()
                .enumerate()
                .map(|(i, c)| Glyph::new(format!("{}", i + 1), Some(c.to_rgb()), Mark::Plain))
                .collect()
        };
        let status = Some(format!(
            "{}/{} correct, need {:.0}%",
            self.rule.correct(),
            self.rule.total(),
            self.rule.required() * 100.0
        ));
        match self.round.phase() {
            Phase::Showing => Board {
                headline: format!(
                    "Study the palette... ({})",
                    seconds(challenge.show_ms)
                ),
                rows: vec![strip()],
                hint: "remember the color at every position".to_string(),
                ..Board::default()
            },
            Phase::Input => {
                let Some(question) = self.current_question() else {
                    return Board::default();
                };
                let options = question
                    .options
                    .iter()
                    .enumerate()
                    .map(|(i, c)| Glyph::new(format!("{}", i + 1), Some(c.to_rgb()), Mark::Plain))
                    .collect();
                Board {
                    headline: format!(
                        "Which color was at position {}? ({}/{})",
                        question.position + 1,
                        self.answers.len() + 1,
                        challenge.questions.len()
                    ),
                    rows: vec![options],
                    status,
                    hint: GameMode::PaletteRecall.controls().to_string(),
                    ..Board::default()
                }
            }
            Phase::Evaluated(outcome) => Board {
                headline: match outcome {
                    Outcome::Correct => "Great eye!".to_string(),
                    Outcome::Wrong => "Not enough correct answers".to_string(),
                },
                rows: vec![strip()],
                status,
                ..Board::default()
            },
            Phase::Idle => Board::default(),
        }
    }
}
