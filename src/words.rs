use include_dir::{include_dir, Dir};
use rand::{seq::SliceRandom, RngCore};
use serde::Deserialize;
use serde_json::from_str;

use crate::difficulty::Band;
use crate::error::GameError;

static WORDS_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/words");

pub const TYPIST_FILE: &str = "typist.json";

/// Word lists for the speed typist, one per difficulty band
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct WordBank {
    pub easy: Vec<String>,
    pub medium: Vec<String>,
    pub hard: Vec<String>,
}

impl WordBank {
    pub fn embedded() -> Result<Self, GameError> {
        read_word_bank(TYPIST_FILE)
    }

    pub fn list(&self, band: Band) -> &[String] {
        match band {
            Band::Easy => &self.easy,
            Band::Medium => &self.medium,
            Band::Hard => &self.hard,
        }
    }

    /// Falls back to the easier lists when a band is empty
    pub fn choose(&self, band: Band, rng: &mut dyn RngCore) -> Option<&str> {
        [band, Band::Medium, Band::Easy]
            .into_iter()
            .find_map(|b| self.list(b).choose(&mut *rng))
            .map(String::as_str)
    }
}

fn read_word_bank(file_name: &str) -> Result<WordBank, GameError> {
    let contents = WORDS_DIR
        .get_file(file_name)
        .and_then(|file| file.contents_utf8())
        .ok_or_else(|| GameError::Content(file_name.to_string()))?;
    from_str(contents).map_err(|_| GameError::Content(file_name.to_string()))
}
