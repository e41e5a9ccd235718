use rand::RngCore;

use super::{seconds, tick_round, Action, Board, GameMode, Glyph, Mark, MiniGame};
use crate::compare::whole_response;
use crate::config::SpeedTypistTuning;
use crate::difficulty::{decayed_ms, Band, Level};
use crate::error::GameError;
use crate::round::{Outcome, Phase, Round, Verdict};
use crate::timer::RoundToken;
use crate::util::percent;
use crate::words::WordBank;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypingWord {
    pub text: String,
    pub band: Band,
    pub limit_ms: u64,
}

pub fn generate(
    level: Level,
    tuning: &SpeedTypistTuning,
    words: &WordBank,
    rng: &mut dyn RngCore,
) -> Result<TypingWord, GameError> {
    let band = tuning.base_ms.band(level);
    let text = words
        .choose(band, rng)
        .ok_or_else(|| GameError::Content(crate::words::TYPIST_FILE.to_string()))?
        .to_string();
    let base_ms = *tuning.base_ms.pick(level);
    Ok(TypingWord {
        text,
        band,
        limit_ms: decayed_ms(base_ms, tuning.per_level_ms, tuning.floor_ms, level),
    })
}

/// Share of target characters typed correctly in place, as a rounded percent
pub fn accuracy(input: &str, target: &str) -> u32 {
    let correct = input
        .chars()
        .zip(target.chars())
        .filter(|(a, b)| a == b)
        .count();
    percent(correct, target.chars().count())
}

pub fn words_per_minute(input: &str, elapsed_ms: u64) -> u32 {
    if elapsed_ms == 0 {
        return 0;
    }
    let words = input.split_whitespace().count().max(1);
    let minutes = elapsed_ms as f64 / 60_000.0;
    (words as f64 / minutes).round() as u32
}

#[derive(Debug)]
pub struct SpeedTypist {
    tuning: SpeedTypistTuning,
    words: WordBank,
    round: Round,
    word: Option<TypingWord>,
    input: String,
    /// Deadline clock reading at the first keystroke
    typing_from_ms: Option<u64>,
    wpm: Option<u32>,
}

impl SpeedTypist {
    pub fn new(tuning: SpeedTypistTuning) -> Result<Self, GameError> {
        Ok(Self::with_words(tuning, WordBank::embedded()?))
    }

    pub fn with_words(tuning: SpeedTypistTuning, words: WordBank) -> Self {
        Self {
            tuning,
            words,
            round: Round::new(),
            word: None,
            input: String::new(),
            typing_from_ms: None,
            wpm: None,
        }
    }

    pub fn word(&self) -> Option<&TypingWord> {
        self.word.as_ref()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn accuracy(&self) -> u32 {
        self.word
            .as_ref()
            .map_or(100, |w| accuracy(&self.input, &w.text))
    }

    /// Typing speed of the last completed word
    pub fn wpm(&self) -> Option<u32> {
        self.wpm
    }

    fn clock_ms(&self) -> u64 {
        self.round.deadline().map_or(0, |d| d.elapsed_ms())
    }

    fn finish(&mut self, outcome: Outcome) -> Result<Option<Verdict>, GameError> {
        if outcome.is_correct() {
            let typed_for = self
                .clock_ms()
                .saturating_sub(self.typing_from_ms.unwrap_or(0));
            self.wpm = Some(words_per_minute(&self.input, typed_for));
        }
        self.round.conclude(outcome).map(Some)
    }
}

impl MiniGame for SpeedTypist {
    fn mode(&self) -> GameMode {
        GameMode::SpeedTypist
    }

    fn start_round(
        &mut self,
        level: Level,
        rng: &mut dyn RngCore,
    ) -> Result<RoundToken, GameError> {
        let token = self.round.begin()?;
        let word = generate(level, &self.tuning, &self.words, rng)?;
        let limit_ms = word.limit_ms;
        self.word = Some(word);
        self.input.clear();
        self.typing_from_ms = None;
        self.wpm = None;
        self.round.open_input()?;
        self.round.set_deadline(limit_ms);
        Ok(token)
    }

    fn tick(&mut self, dt_ms: u64) -> Result<Option<Verdict>, GameError> {
        tick_round(&mut self.round, dt_ms)
    }

    fn act(&mut self, action: Action) -> Result<Option<Verdict>, GameError> {
        if !self.round.accepts_input() {
            return Ok(None);
        }
        let Some(target_len) = self.word.as_ref().map(|w| w.text.chars().count()) else {
            return Ok(None);
        };
        match action {
            Action::Key(c) => {
                if self.typing_from_ms.is_none() {
                    self.typing_from_ms = Some(self.clock_ms());
                }
                self.input.push(c);
                if self.word.as_ref().is_some_and(|w| w.text == self.input) {
                    self.finish(Outcome::Correct)
                } else if self.input.chars().count() > target_len {
                    self.finish(Outcome::Wrong)
                } else {
                    Ok(None)
                }
            }
            Action::Backspace => {
                self.input.pop();
                Ok(None)
            }
            Action::ClearInput => {
                self.input.clear();
                Ok(None)
            }
            Action::Submit => {
                let outcome = self.word.as_ref().map_or(Outcome::Wrong, |w| {
                    whole_response(w.text.as_bytes(), self.input.as_bytes())
                });
                self.finish(outcome)
            }
            _ => Ok(None),
        }
    }

    fn round(&self) -> &Round {
        &self.round
    }

    fn reset(&mut self) {
        self.round.reset();
        self.word = None;
        self.input.clear();
        self.typing_from_ms = None;
        self.wpm = None;
    }

    fn board(&self) -> Board {
        let Some(word) = &self.word else {
            return Board::default();
        };
        let typed: Vec<char> = self.input.chars().collect();
        let letters = word
            .text
            .chars()
            .enumerate()
            .map(|(i, c)| {
                let mark = match typed.get(i) {
                    Some(&t) if t == c => Mark::Selected,
                    Some(_) => Mark::Highlight,
                    None => Mark::Plain,
                };
                Glyph::new(c.to_string(), None, mark)
            })
            .collect();
        let remaining = self.round.deadline().map_or(0, |d| d.remaining_ms());
        let headline = match self.round.phase() {
            Phase::Evaluated(Outcome::Correct) => match self.wpm {
                Some(wpm) => format!("Perfect! {wpm} WPM"),
                None => "Perfect!".to_string(),
            },
            Phase::Evaluated(Outcome::Wrong) => format!("The word was \"{}\"", word.text),
            _ => format!("Type the word quickly! ({} left)", seconds(remaining)),
        };
        Board {
            headline,
            rows: vec![letters],
            text: Some(self.input.clone()),
            status: Some(format!("{} · accuracy {}%", word.band, self.accuracy())),
            hint: GameMode::SpeedTypist.controls().to_string(),
            ..Board::default()
        }
    }
}
