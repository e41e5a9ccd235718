use rand::{rngs::StdRng, RngCore, SeedableRng};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{GameError, StoreError};
use crate::games::{self, Action, Board, GameMode, MiniGame};
use crate::leaderboard::{NewScore, Player, ScoreRepository};
use crate::round::{Outcome, OutcomeReporter, RoundListener, Verdict};
use crate::timer::{Countdown, TimerSlot, TimerStatus};

pub const STREAK_NOTICE_FROM: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Waiting,
    Playing,
    GameOver,
}

/// Something the front end should tell the player about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Streak(u32),
    NewHighScore(u32),
    ScoreSaved(u32),
    ScoreNotSaved,
    SignInToSave,
}

/// Score keeping, driven by round outcomes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scoreboard {
    pub state: SessionState,
    pub score: u32,
    pub streak: u32,
    pub high_score: u32,
    notices: Vec<Notice>,
}

impl Scoreboard {
    pub fn new(high_score: u32) -> Self {
        Self {
            state: SessionState::Waiting,
            score: 0,
            streak: 0,
            high_score,
            notices: Vec::new(),
        }
    }

    fn restart(&mut self, state: SessionState) {
        self.state = state;
        self.score = 0;
        self.streak = 0;
    }
}

impl RoundListener for Scoreboard {
    fn on_correct(&mut self) {
        self.score += 1;
        self.streak += 1;
        if self.streak >= STREAK_NOTICE_FROM {
            self.notices.push(Notice::Streak(self.streak));
        }
    }

    fn on_wrong(&mut self) {
        self.state = SessionState::GameOver;
        if self.score > self.high_score {
            self.high_score = self.score;
            self.notices.push(Notice::NewHighScore(self.score));
        }
    }
}

pub struct Session<S: ScoreRepository> {
    mode: GameMode,
    game: Box<dyn MiniGame>,
    reporter: OutcomeReporter,
    scoreboard: Scoreboard,
    store: S,
    player: Option<Player>,
    rng: Box<dyn RngCore>,
    pause_ms: u64,
    pause: TimerSlot<Countdown>,
}

impl<S: ScoreRepository> Session<S> {
    pub fn new(
        mode: GameMode,
        config: &Config,
        store: S,
        player: Option<Player>,
    ) -> Result<Self, GameError> {
        let game = games::build(mode, &config.tuning)?;
        Ok(Self::with_game(game, config, store, player))
    }

    pub fn with_game(
        game: Box<dyn MiniGame>,
        config: &Config,
        store: S,
        player: Option<Player>,
    ) -> Self {
        let mode = game.mode();
        let high_score = store.local_high_score(mode).unwrap_or_else(|err| {
            warn!(%err, %mode, "could not read local high score");
            0
        });
        Self {
            mode,
            game,
            reporter: OutcomeReporter::new(),
            scoreboard: Scoreboard::new(high_score),
            store,
            player,
            rng: Box::new(StdRng::from_entropy()),
            pause_ms: config.round_pause_ms,
            pause: TimerSlot::new(),
        }
    }

    pub fn with_rng(mut self, rng: impl RngCore + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn state(&self) -> SessionState {
        self.scoreboard.state
    }

    pub fn score(&self) -> u32 {
        self.scoreboard.score
    }

    pub fn streak(&self) -> u32 {
        self.scoreboard.streak
    }

    pub fn high_score(&self) -> u32 {
        self.scoreboard.high_score.max(self.scoreboard.score)
    }

    pub fn player(&self) -> Option<&Player> {
        self.player.as_ref()
    }

    pub fn game(&self) -> &dyn MiniGame {
        self.game.as_ref()
    }

    pub fn board(&self) -> Board {
        self.game.board()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// True while a correct answer is on display before the next round
    pub fn is_between_rounds(&self) -> bool {
        self.pause.is_armed()
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.scoreboard.notices)
    }

    /// Starts a fresh session at level 0. Does nothing mid-session.
    pub fn start(&mut self) -> Result<(), GameError> {
        if self.state() == SessionState::Playing {
            return Ok(());
        }
        self.pause.cancel();
        self.scoreboard.restart(SessionState::Playing);
        info!(mode = %self.mode, "session started");
        self.next_round()
    }

    pub fn tick(&mut self, dt_ms: u64) -> Result<(), GameError> {
        if self.state() != SessionState::Playing {
            return Ok(());
        }
        if self.pause.is_armed() {
            if self.pause.advance(dt_ms, self.game.round().token()) == TimerStatus::Fired {
                self.next_round()?;
            }
            return Ok(());
        }
        match self.game.tick(dt_ms)? {
            Some(verdict) => self.settle(verdict),
            None => Ok(()),
        }
    }

    pub fn act(&mut self, action: Action) -> Result<(), GameError> {
        if self.state() != SessionState::Playing || self.pause.is_armed() {
            return Ok(());
        }
        match self.game.act(action)? {
            Some(verdict) => self.settle(verdict),
            None => Ok(()),
        }
    }

    /// Abandons the session and goes back to waiting. The high score stays.
    pub fn reset(&mut self) {
        self.pause.cancel();
        self.game.reset();
        self.scoreboard.restart(SessionState::Waiting);
        self.scoreboard.notices.clear();
        debug!(mode = %self.mode, "session reset");
    }

    fn next_round(&mut self) -> Result<(), GameError> {
        let level = self.scoreboard.score;
        let token = self.game.start_round(level, self.rng.as_mut())?;
        debug!(level, token = token.get(), "next round");
        Ok(())
    }

    fn settle(&mut self, verdict: Verdict) -> Result<(), GameError> {
        let current = self.game.round().token();
        if !self.reporter.report(current, verdict, &mut self.scoreboard) {
            return Ok(());
        }
        match verdict.outcome {
            Outcome::Correct if self.pause_ms == 0 => self.next_round(),
            Outcome::Correct => {
                self.pause.arm(Countdown::new(current, self.pause_ms));
                Ok(())
            }
            Outcome::Wrong => {
                self.finish();
                Ok(())
            }
        }
    }

    fn finish(&mut self) {
        let score = self.scoreboard.score;
        info!(mode = %self.mode, score, "game over");
        if let Err(err) = self.store.record_local_high_score(self.mode, score) {
            warn!(%err, "could not store local high score");
        }
        if score == 0 {
            return;
        }
        let Some(player) = self.player.clone() else {
            self.scoreboard.notices.push(Notice::SignInToSave);
            return;
        };
        let notice = match self.save(&player, score) {
            Ok(()) => Notice::ScoreSaved(score),
            Err(err) => {
                warn!(%err, user = %player.user_id, score, "score not saved");
                Notice::ScoreNotSaved
            }
        };
        self.scoreboard.notices.push(notice);
    }

    fn save(&mut self, player: &Player, score: u32) -> Result<(), StoreError> {
        self.store.ensure_profile(player)?;
        self.store.submit_score(&NewScore {
            user_id: player.user_id.clone(),
            score,
            streak: self.scoreboard.streak,
            mode: self.mode,
        })
    }
}
