pub mod ai;
pub mod cli;
pub mod config;
pub mod database;
pub mod dictation;
pub mod export;
pub mod gate;
pub mod listing;
pub mod logging;
pub mod models;
pub mod session;
pub mod store;
pub mod tui;
pub mod utils;

pub use config::Config;
pub use database::Database;
pub use models::{Note, NoteCategory, NoteColor};
pub use utils::Profile;
