use std::collections::VecDeque;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use tracing::warn;

use crate::error::GameError;
use crate::input::{self, Cursor};
use crate::leaderboard::{LeaderboardEntry, ScoreRepository};
use crate::runtime::GameEvent;
use crate::session::{Notice, Session, SessionState};
use crate::timer::RoundToken;

/// How long each queued notice stays on screen
pub const NOTICE_MS: u64 = 2500;
pub const STANDINGS_ROWS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct App<S: ScoreRepository> {
    pub session: Session<S>,
    pub cursor: Cursor,
    notices: VecDeque<Notice>,
    notice_left_ms: u64,
    standings: Option<Vec<LeaderboardEntry>>,
    seen_round: RoundToken,
}

impl<S: ScoreRepository> App<S> {
    pub fn new(session: Session<S>) -> Self {
        let seen_round = session.game().round().token();
        Self {
            session,
            cursor: Cursor::default(),
            notices: VecDeque::new(),
            notice_left_ms: 0,
            standings: None,
            seen_round,
        }
    }

    pub fn banner(&self) -> Option<&Notice> {
        self.notices.front()
    }

    /// Best scores for the current mode, loaded when a session ends
    pub fn standings(&self) -> &[LeaderboardEntry] {
        self.standings.as_deref().unwrap_or_default()
    }

    pub fn on_event(&mut self, event: GameEvent) -> Result<Flow, GameError> {
        let flow = match event {
            GameEvent::Key(key) => self.on_key(key)?,
            GameEvent::Tick(dt_ms) => {
                self.session.tick(dt_ms)?;
                self.age_banner(dt_ms);
                Flow::Continue
            }
            GameEvent::Resize => Flow::Continue,
        };
        self.after_update();
        Ok(flow)
    }

    fn on_key(&mut self, key: KeyEvent) -> Result<Flow, GameError> {
        if key.kind == KeyEventKind::Release {
            return Ok(Flow::Continue);
        }
        if input::is_quit(&key) {
            return Ok(Flow::Quit);
        }
        match self.session.state() {
            SessionState::Waiting | SessionState::GameOver => match key.code {
                KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('r') => {
                    self.notices.clear();
                    self.standings = None;
                    self.session.start()?;
                }
                KeyCode::Char('q') => return Ok(Flow::Quit),
                _ => {}
            },
            SessionState::Playing => {
                let grid = self.session.board().grid;
                let mode = self.session.mode();
                if let Some(action) = input::action_for(mode, &key, &mut self.cursor, grid) {
                    self.session.act(action)?;
                }
            }
        }
        Ok(Flow::Continue)
    }

    fn age_banner(&mut self, dt_ms: u64) {
        if self.notices.is_empty() {
            return;
        }
        self.notice_left_ms = self.notice_left_ms.saturating_sub(dt_ms);
        if self.notice_left_ms == 0 {
            self.notices.pop_front();
            self.notice_left_ms = NOTICE_MS;
        }
    }

    fn after_update(&mut self) {
        let fresh = self.session.take_notices();
        if self.notices.is_empty() && !fresh.is_empty() {
            self.notice_left_ms = NOTICE_MS;
        }
        self.notices.extend(fresh);

        let token = self.session.game().round().token();
        if token != self.seen_round {
            self.seen_round = token;
            self.cursor = self
                .session
                .board()
                .grid
                .map(Cursor::center)
                .unwrap_or_default();
        }

        if self.session.state() == SessionState::GameOver && self.standings.is_none() {
            self.load_standings();
        }
    }

    fn load_standings(&mut self) {
        match self.session.store().query_best_scores(Some(self.session.mode())) {
            Ok(mut entries) => {
                entries.truncate(STANDINGS_ROWS);
                self.standings = Some(entries);
            }
            Err(err) => {
                warn!(%err, "could not load leaderboard");
                self.standings = Some(Vec::new());
            }
        }
    }
}
