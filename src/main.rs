use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use std::path::PathBuf;
use notepin::{Config, Database, Profile, cli::{self, Cli, Commands}, logging, utils};

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    // --dev keeps config, database and logs apart from the real ones
    let profile = if cli.dev {
        Profile::Dev
    } else {
        Profile::Prod
    };

    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load_with_profile(profile)?,
    };

    let log_dir = utils::get_data_dir(profile)
        .map(|dir| dir.join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"));
    logging::init_logging(&cli.log_level, &log_dir)?;

    let db_path = config.get_database_path();
    let db = Database::new(
        db_path.to_str()
            .ok_or_else(|| eyre!("Database path contains invalid UTF-8"))?
    )?;

    match cli.command.unwrap_or(Commands::Tui) {
        Commands::Tui => {
            let app = notepin::tui::App::new(config, db);
            notepin::tui::run_event_loop(app)?;
        }
        Commands::AddNote { title, content, category, pinned } => {
            cli::handle_add_note(title, content, category, pinned, &db)?;
        }
        Commands::List { query, category } => {
            cli::handle_list(query, category, &db);
        }
        Commands::Export { path } => {
            cli::handle_export(path, config.export_dir.as_deref(), &db)?;
        }
    }

    Ok(())
}
