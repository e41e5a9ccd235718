use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use dopamine_rush::app::{App, Flow};
use dopamine_rush::config::Config;
use dopamine_rush::games::{Action, GameMode, Mark};
use dopamine_rush::leaderboard::{MemoryScoreStore, Player, ScoreRepository};
use dopamine_rush::round::Phase;
use dopamine_rush::runtime::{FixedTicker, GameEvent, Runner, TestEventSource};
use dopamine_rush::session::{Notice, Session, SessionState};
use dopamine_rush::store::SqliteScoreStore;
use rand::{rngs::StdRng, SeedableRng};

fn quick_config() -> Config {
    Config {
        round_pause_ms: 0,
        ..Config::default()
    }
}

fn key(code: KeyCode) -> GameEvent {
    GameEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

fn current_word<S: ScoreRepository>(app: &App<S>) -> String {
    app.session.board().rows[0]
        .iter()
        .map(|g| g.label.as_str())
        .collect()
}

// Drives the typist through the runner the way the terminal loop does,
// without a TTY.
#[test]
fn headless_typist_flow_scores_and_ends() {
    let session = Session::new(
        GameMode::SpeedTypist,
        &quick_config(),
        MemoryScoreStore::new(),
        Some(Player::named("ada")),
    )
    .unwrap()
    .with_rng(StdRng::seed_from_u64(1));
    let mut app = App::new(session);

    // a long interval so queued keys always come before the next tick
    let (tx, rx) = mpsc::channel();
    let mut runner = Runner::new(TestEventSource::new(rx), FixedTicker::new(Duration::from_secs(60)));

    tx.send(key(KeyCode::Enter)).unwrap();
    assert_eq!(app.on_event(runner.step()).unwrap(), Flow::Continue);
    assert_eq!(app.session.state(), SessionState::Playing);

    for _ in 0..2 {
        for c in current_word(&app).chars() {
            tx.send(key(KeyCode::Char(c))).unwrap();
        }
        for _ in 0..current_word(&app).chars().count() {
            let event = runner.step();
            assert!(matches!(event, GameEvent::Key(_)));
            app.on_event(event).unwrap();
        }
    }
    assert_eq!(app.session.score(), 2);
    assert_eq!(app.session.state(), SessionState::Playing);

    // nothing typed, so submitting is wrong
    tx.send(key(KeyCode::Enter)).unwrap();
    app.on_event(runner.step()).unwrap();
    assert_eq!(app.session.state(), SessionState::GameOver);
    assert_eq!(app.session.store().scores().len(), 1);
    assert_eq!(app.session.store().scores()[0].score, 2);

    tx.send(key(KeyCode::Esc)).unwrap();
    assert_eq!(app.on_event(runner.step()).unwrap(), Flow::Quit);
}

#[test]
fn headless_typist_times_out_on_ticks() {
    let session = Session::new(GameMode::SpeedTypist, &quick_config(), MemoryScoreStore::new(), None)
        .unwrap()
        .with_rng(StdRng::seed_from_u64(2));
    let mut app = App::new(session);
    app.on_event(key(KeyCode::Enter)).unwrap();

    let (_tx, rx) = mpsc::channel();
    let mut runner = Runner::new(TestEventSource::new(rx), FixedTicker::new(Duration::from_millis(1)));
    let mut elapsed = 0;
    while app.session.state() == SessionState::Playing && elapsed < 5_000 {
        // the runner reports real time, so feed the game coarser steps
        if let GameEvent::Tick(_) = runner.step() {
            app.on_event(GameEvent::Tick(250)).unwrap();
            elapsed += 250;
        }
    }
    assert_eq!(app.session.state(), SessionState::GameOver);
    assert_eq!(elapsed, 5_000);
    assert!(app.session.store().scores().is_empty());
}

#[test]
fn freeze_frame_session_persists_to_sqlite() {
    let store = SqliteScoreStore::open_in_memory().unwrap();
    let mut session = Session::new(
        GameMode::FreezeFrame,
        &quick_config(),
        store,
        Some(Player::named("Grace")),
    )
    .unwrap()
    .with_rng(StdRng::seed_from_u64(9));
    session.start().unwrap();

    for _ in 0..3 {
        let board = session.board();
        assert_eq!(session.game().round().phase(), Phase::Showing);
        let lit: Vec<(usize, usize)> = board
            .rows
            .iter()
            .enumerate()
            .flat_map(|(y, row)| {
                row.iter()
                    .enumerate()
                    .filter(|(_, g)| g.mark == Mark::Highlight)
                    .map(move |(x, _)| (x, y))
            })
            .collect();
        assert!(!lit.is_empty());

        while session.game().round().phase() == Phase::Showing {
            session.tick(100).unwrap();
        }
        for (x, y) in lit {
            session.act(Action::Cell { x, y }).unwrap();
        }
        session.act(Action::Submit).unwrap();
    }
    assert_eq!(session.score(), 3);

    while session.game().round().phase() == Phase::Showing {
        session.tick(100).unwrap();
    }
    session.act(Action::Submit).unwrap();
    assert_eq!(session.state(), SessionState::GameOver);
    assert_eq!(
        session.take_notices(),
        vec![
            Notice::Streak(3),
            Notice::NewHighScore(3),
            Notice::ScoreSaved(3)
        ]
    );

    let store = session.store();
    let board = store.query_best_scores(Some(GameMode::FreezeFrame)).unwrap();
    assert_eq!(board.len(), 1);
    assert_eq!(board[0].display_name, "Grace");
    assert_eq!(board[0].score, 3);
    assert_eq!(store.local_high_score(GameMode::FreezeFrame).unwrap(), 3);
    assert_eq!(store.profile_stats("grace").unwrap().total_games, 1);
}
