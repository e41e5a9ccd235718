use dopamine_rush::config::{Config, ConfigStore, FileConfigStore};
use dopamine_rush::games::{Action, GameMode};
use dopamine_rush::leaderboard::{Player, ScoreRepository, ANONYMOUS};
use dopamine_rush::round::Phase;
use dopamine_rush::session::{Session, SessionState};
use dopamine_rush::store::SqliteScoreStore;
use rand::{rngs::StdRng, SeedableRng};
use tempfile::tempdir;

/// Scores one quick reflex point by tapping on the target flash, then lets
/// the next sequence run out.
fn play_one_point(session: &mut Session<SqliteScoreStore>) {
    session.start().unwrap();
    let target = session.board().rows[1][0]
        .label
        .trim_start_matches("target: ")
        .to_string();
    let mut waited = 0;
    while session.score() == 0 && waited < 20_000 {
        let board = session.board();
        if session.game().round().phase() == Phase::Input && board.rows[0][0].label == target {
            session.act(Action::Tap).unwrap();
        } else {
            session.tick(10).unwrap();
            waited += 10;
        }
    }
    assert_eq!(session.score(), 1, "target {target} never flashed");

    while session.state() == SessionState::Playing {
        session.tick(100).unwrap();
    }
}

#[test]
fn high_score_and_leaderboard_survive_restarts() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("state").join("scores.db");
    let config_path = dir.path().join("config.json");

    let config = Config {
        player: Some("Lin".into()),
        default_mode: GameMode::QuickReflex,
        round_pause_ms: 0,
        ..Config::default()
    };
    FileConfigStore::with_path(&config_path).save(&config).unwrap();
    let config = FileConfigStore::with_path(&config_path).load();
    let player = config.player.as_deref().map(Player::named);

    {
        let store = SqliteScoreStore::open(&db).unwrap();
        let mut session = Session::new(config.default_mode, &config, store, player.clone())
            .unwrap()
            .with_rng(StdRng::seed_from_u64(4));
        play_one_point(&mut session);
        assert_eq!(session.state(), SessionState::GameOver);
    }

    let store = SqliteScoreStore::open(&db).unwrap();
    assert_eq!(store.local_high_score(GameMode::QuickReflex).unwrap(), 1);
    let session = Session::new(GameMode::QuickReflex, &config, store, None).unwrap();
    assert_eq!(session.high_score(), 1);

    let store = session.store();
    let entries = store.query_best_scores(None).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].display_name, "Lin");
    assert_ne!(entries[0].display_name, ANONYMOUS);
    let stats = store.profile_stats("lin").unwrap();
    assert_eq!(stats.high_score, 1);
    assert_eq!(stats.recent.len(), 1);
}
