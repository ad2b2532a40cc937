use clap::{Parser, Subcommand};
use std::path::PathBuf;
use thiserror::Error;

use crate::database::Database;
use crate::export::{self, ExportError};
use crate::listing::visible_notes;
use crate::models::{CategoryFilter, Note, NoteCategory};
use crate::store::{NoteStore, StoreError};
use crate::utils;

#[derive(Parser)]
#[command(name = "notepin")]
#[command(about = "Notes with categories, colors, pins and PIN-locked notes - in your terminal")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Use development mode (separate config and database)
    #[arg(long)]
    pub dev: bool,

    /// Log level written to the log file (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch interactive TUI (default if no subcommand)
    Tui,
    /// Quickly add a new note
    AddNote {
        /// Note title
        title: String,
        /// Note content
        #[arg(long)]
        content: Option<String>,
        /// Personal, Work, Ideas or To-Do
        #[arg(long, default_value = "Personal")]
        category: NoteCategory,
        /// Pin the note to the top of the list
        #[arg(long)]
        pinned: bool,
    },
    /// Print notes the way the list shows them
    List {
        /// Case-insensitive text to look for in titles and content
        #[arg(long)]
        query: Option<String>,
        /// All, Personal, Work, Ideas or To-Do
        #[arg(long, default_value = "All")]
        category: CategoryFilter,
    },
    /// Write every note to a pretty-printed JSON backup
    Export {
        /// Output file (defaults to notes_backup.json in the export directory)
        path: Option<PathBuf>,
    },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Storage error: {0}")]
    StoreError(#[from] StoreError),
    #[error("Export failed: {0}")]
    ExportError(#[from] ExportError),
}

/// Handle the add-note command
pub fn handle_add_note(
    title: String,
    content: Option<String>,
    category: NoteCategory,
    pinned: bool,
    db: &Database,
) -> Result<Note, CliError> {
    let store = NoteStore::new(db);
    let mut notes = store.load();

    let mut note = Note::new();
    note.title = title;
    note.content = content.unwrap_or_default();
    note.category = category;
    note.is_pinned = pinned;

    // Newest first, like notes created in the TUI
    notes.insert(0, note.clone());
    store.try_save(&notes)?;
    println!("Note created successfully (ID: {})", note.id);

    Ok(note)
}

/// Handle the list command; returns the printed lines
pub fn handle_list(query: Option<String>, category: CategoryFilter, db: &Database) -> Vec<String> {
    let notes = NoteStore::new(db).load();
    let visible = visible_notes(&notes, query.as_deref().unwrap_or(""), category);

    let lines: Vec<String> = visible.iter().map(format_list_line).collect();
    if lines.is_empty() {
        println!("No notes found");
    }
    for line in &lines {
        println!("{}", line);
    }
    lines
}

fn format_list_line(note: &Note) -> String {
    let pin = if note.is_pinned { "*" } else { " " };
    let lock = if note.is_locked { "[locked]" } else { "" };
    let preview = if note.is_locked {
        String::new()
    } else {
        let first_line = note.content.lines().next().unwrap_or("");
        utils::truncate_chars(first_line, 48)
    };
    format!(
        "{} {} {:<8} {}{} {}",
        pin,
        utils::format_date(note.updated_at),
        note.category.label(),
        note.display_title(),
        lock,
        preview
    )
    .trim_end()
    .to_string()
}

/// Handle the export command
pub fn handle_export(path: Option<PathBuf>, export_dir: Option<&str>, db: &Database) -> Result<PathBuf, CliError> {
    let notes = NoteStore::new(db).load();
    let path = path.unwrap_or_else(|| export::default_backup_path(export_dir));
    export::write_backup(&notes, &path)?;
    println!("Exported {} notes to {}", notes.len(), path.display());
    Ok(path)
}
