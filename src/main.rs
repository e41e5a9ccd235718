use chrono::Utc;
use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use dopamine_rush::{
    app::{App, Flow},
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    games::GameMode,
    leaderboard::{LeaderboardEntry, Player, ProfileStats, ScoreRepository},
    runtime::{CrosstermEventSource, FixedTicker, Runner},
    session::Session,
    store::SqliteScoreStore,
    ui::age_text,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fmt::Write as _,
    fs::OpenOptions,
    io::{self, stdin},
    path::PathBuf,
    sync::Mutex,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// memory and reaction mini-games for the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Seven quick memory and reaction games that get harder with every correct answer, with a local leaderboard and player profiles."
)]
pub struct Cli {
    #[clap(subcommand)]
    command: Option<Command>,

    /// game to play (defaults to the configured mode)
    #[clap(short, long, value_enum)]
    mode: Option<GameMode>,

    /// player name scores are saved under
    #[clap(short, long, global = true)]
    player: Option<String>,

    /// config file to use instead of the default location
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// score database to use instead of the default location
    #[clap(long, global = true)]
    db: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Command {
    /// play a game (default)
    Play,
    /// show the best score per player
    Leaderboard {
        /// only show scores for this game
        #[clap(short, long, value_enum)]
        mode: Option<GameMode>,

        /// number of rows to show
        #[clap(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// show a player's stats and recent games
    Profile,
    /// list the games and their controls
    Modes,
}

impl Cli {
    fn player(&self, config: &Config) -> Option<Player> {
        self.player
            .as_deref()
            .or(config.player.as_deref())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(Player::named)
    }

    fn mode(&self, config: &Config) -> GameMode {
        self.mode.unwrap_or(config.default_mode)
    }
}

fn init_logging() -> Result<(), Box<dyn Error>> {
    let path = AppDirs::log_path().ok_or("no state directory for the log file")?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    install_subscriber(file, filter)
}

/// Installs the global fmt subscriber; fails if one is already set
fn install_subscriber<W: io::Write + Send + 'static>(
    writer: W,
    filter: EnvFilter,
) -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(writer))
        .with_ansi(false)
        .try_init()
        .map_err(|err| err as Box<dyn Error>)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if let Err(err) = init_logging() {
        eprintln!("logging disabled: {err}");
    }

    let config_store = cli
        .config
        .as_ref()
        .map_or_else(FileConfigStore::new, FileConfigStore::with_path);
    let config = config_store.load();

    let open_store = || match &cli.db {
        Some(path) => SqliteScoreStore::open(path),
        None => SqliteScoreStore::open_default(),
    };

    match cli.command.clone().unwrap_or(Command::Play) {
        Command::Play => play(&cli, &config, open_store()?),
        Command::Leaderboard { mode, limit } => {
            let mut entries = open_store()?.query_best_scores(mode)?;
            entries.truncate(limit);
            print!("{}", leaderboard_report(&entries, mode));
            Ok(())
        }
        Command::Profile => {
            let Some(player) = cli.player(&config) else {
                let mut cmd = Cli::command();
                cmd.error(ErrorKind::MissingRequiredArgument, "profile needs --player")
                    .exit();
            };
            let store = open_store()?;
            let stats = store.profile_stats(&player.user_id)?;
            let name = store
                .display_name(&player.user_id)?
                .unwrap_or(player.display_name);
            print!("{}", profile_report(&name, &stats));
            Ok(())
        }
        Command::Modes => {
            for mode in GameMode::ALL {
                println!("{:<18} {:<18} {}", mode.to_string(), mode.title(), mode.controls());
            }
            Ok(())
        }
    }
}

fn play(cli: &Cli, config: &Config, store: SqliteScoreStore) -> Result<(), Box<dyn Error>> {
    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let mode = cli.mode(config);
    let session = Session::new(mode, config, store, cli.player(config))?;
    let mut app = App::new(session);
    info!(%mode, "starting");

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app, config.tick_ms);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend, S: ScoreRepository>(
    terminal: &mut Terminal<B>,
    app: &mut App<S>,
    tick_ms: u64,
) -> Result<(), Box<dyn Error>> {
    let mut runner = Runner::new(CrosstermEventSource::new(), FixedTicker::from_millis(tick_ms));

    loop {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;
        if app.on_event(runner.step())? == Flow::Quit {
            return Ok(());
        }
    }
}

fn leaderboard_report(entries: &[LeaderboardEntry], mode: Option<GameMode>) -> String {
    let title = mode.map_or("All games", GameMode::title);
    let mut out = format!("{title}\n");
    if entries.is_empty() {
        out.push_str("  no scores yet\n");
        return out;
    }
    let now = Utc::now();
    for (rank, entry) in entries.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>3}. {:<16} {:>4}  {:<17} {}",
            rank + 1,
            entry.display_name,
            entry.score,
            entry.mode.to_string(),
            age_text(entry.created_at, now)
        );
    }
    out
}

fn profile_report(name: &str, stats: &ProfileStats) -> String {
    let mut out = format!("{name}\n");
    let _ = writeln!(out, "  high score     {}", stats.high_score);
    let _ = writeln!(out, "  games played   {}", stats.total_games);
    let _ = writeln!(out, "  average score  {:.1}", stats.average_score);
    let _ = writeln!(out, "  total streak   {}", stats.total_streak);
    if !stats.recent.is_empty() {
        out.push_str("  recent games\n");
        let now = Utc::now();
        for game in &stats.recent {
            let _ = writeln!(
                out,
                "    {:>4}  {:<17} {}",
                game.score,
                game.mode.to_string(),
                age_text(game.created_at, now)
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use dopamine_rush::leaderboard::ScoreRecord;

    #[test]
    fn test_second_subscriber_is_an_error() {
        let first = install_subscriber(io::sink(), EnvFilter::new("debug"));
        assert!(first.is_ok());
        let second = install_subscriber(io::sink(), EnvFilter::new("debug"));
        assert!(second.is_err());
    }

    #[test]
    fn test_cli_defaults_to_play() {
        let cli = Cli::parse_from(["dopamine-rush"]);
        assert_eq!(cli.command, None);
        assert_eq!(cli.mode, None);
        assert_eq!(cli.player, None);
        assert_eq!(cli.mode(&Config::default()), Config::default().default_mode);
    }

    #[test]
    fn test_cli_mode_and_player() {
        let cli = Cli::parse_from(["dopamine-rush", "-m", "freeze-frame", "-p", " Ada "]);
        assert_eq!(cli.mode, Some(GameMode::FreezeFrame));
        let player = cli.player(&Config::default()).unwrap();
        assert_eq!(player.user_id, "ada");
        assert_eq!(player.display_name, "Ada");
    }

    #[test]
    fn test_cli_player_falls_back_to_config() {
        let cli = Cli::parse_from(["dopamine-rush"]);
        let config = Config {
            player: Some("grace".into()),
            ..Config::default()
        };
        assert_eq!(cli.player(&config).unwrap().user_id, "grace");

        let blank = Cli::parse_from(["dopamine-rush", "--player", "  "]);
        assert_eq!(blank.player(&Config::default()), None);
    }

    #[test]
    fn test_cli_leaderboard_subcommand() {
        let cli = Cli::parse_from(["dopamine-rush", "leaderboard", "--mode", "speed-typist"]);
        assert_eq!(
            cli.command,
            Some(Command::Leaderboard {
                mode: Some(GameMode::SpeedTypist),
                limit: 10
            })
        );
    }

    #[test]
    fn test_cli_global_player_on_profile() {
        let cli = Cli::parse_from(["dopamine-rush", "profile", "--player", "bob"]);
        assert_eq!(cli.command, Some(Command::Profile));
        assert_eq!(cli.player.as_deref(), Some("bob"));
    }

    #[test]
    fn test_cli_rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["dopamine-rush", "--mode", "tetris"]).is_err());
    }

    #[test]
    fn test_empty_leaderboard_report() {
        assert_eq!(
            leaderboard_report(&[], Some(GameMode::Classic)),
            "Color Memory\n  no scores yet\n"
        );
    }

    #[test]
    fn test_leaderboard_report_ranks_rows() {
        let entry = LeaderboardEntry {
            user_id: "ada".into(),
            display_name: "Ada".into(),
            score: 12,
            streak: 12,
            mode: GameMode::TrailTracker,
            created_at: Utc::now(),
        };
        let report = leaderboard_report(&[entry], None);
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines[0], "All games");
        assert!(lines[1].starts_with("  1. Ada"));
        assert!(lines[1].contains("trail-tracker"));
    }

    #[test]
    fn test_profile_report() {
        let stats = ProfileStats::from_scores(&[ScoreRecord {
            user_id: "ada".into(),
            score: 4,
            streak: 4,
            mode: GameMode::QuickReflex,
            created_at: Utc::now(),
        }]);
        let report = profile_report("Ada", &stats);
        assert!(report.contains("high score     4"));
        assert!(report.contains("average score  4.0"));
        assert!(report.contains("recent games"));
    }
}
