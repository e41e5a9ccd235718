// Library surface for the binary and the integration tests.
pub mod app;
pub mod app_dirs;
pub mod compare;
pub mod config;
pub mod difficulty;
pub mod error;
pub mod games;
pub mod input;
pub mod leaderboard;
pub mod palette;
pub mod round;
pub mod runtime;
pub mod session;
pub mod store;
pub mod timer;
pub mod ui;
pub mod util;
pub mod words;
