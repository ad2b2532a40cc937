//! Note and PIN persistence on top of the key-value [`Database`].
//!
//! The whole note collection is one JSON blob; every save replaces it.

use log::{error, info, warn};
use thiserror::Error;

use crate::database::{Database, DatabaseError};
use crate::models::Note;

pub const NOTES_KEY: &str = "notes_data";
pub const PIN_KEY: &str = "master_pin";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),
    #[error("Failed to serialize notes: {0}")]
    SerializeError(#[from] serde_json::Error),
}

pub struct NoteStore<'a> {
    db: &'a Database,
}

impl<'a> NoteStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Load every note. Missing or corrupt data yields an empty collection.
    pub fn load(&self) -> Vec<Note> {
        let raw = match self.db.get(NOTES_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                error!("event=notes_load module=store status=error reason=read error={}", e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<Note>>(&raw) {
            Ok(notes) => {
                info!("event=notes_load module=store status=ok count={}", notes.len());
                notes
            }
            Err(e) => {
                warn!("event=notes_load module=store status=error reason=corrupt error={}", e);
                Vec::new()
            }
        }
    }

    /// Replace the persisted collection, reporting failures to the caller.
    pub fn try_save(&self, notes: &[Note]) -> Result<(), StoreError> {
        let json = serde_json::to_string(notes)?;
        self.db.set(NOTES_KEY, &json)?;
        Ok(())
    }

    /// Best-effort save: failures are logged and the previous blob is kept.
    pub fn save(&self, notes: &[Note]) {
        if let Err(e) = self.try_save(notes) {
            error!("event=notes_save module=store status=error count={} error={}", notes.len(), e);
        }
    }
}

pub struct PinStore<'a> {
    db: &'a Database,
}

impl<'a> PinStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn get(&self) -> Option<String> {
        match self.db.get(PIN_KEY) {
            Ok(pin) => pin.filter(|p| !p.is_empty()),
            Err(e) => {
                error!("event=pin_load module=store status=error error={}", e);
                None
            }
        }
    }

    pub fn has_pin(&self) -> bool {
        self.get().is_some()
    }

    /// Store `pin`, overwriting any previous one. Plaintext, no hashing.
    pub fn set(&self, pin: &str) -> Result<(), StoreError> {
        self.db.set(PIN_KEY, pin)?;
        info!("event=pin_set module=store status=ok");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NoteCategory;

    fn sample(title: &str, updated_at: i64) -> Note {
        let mut note = Note::new();
        note.title = title.to_string();
        note.created_at = updated_at;
        note.updated_at = updated_at;
        note
    }

    #[test]
    fn load_on_empty_database_returns_nothing() {
        let db = Database::open_in_memory().unwrap();
        assert!(NoteStore::new(&db).load().is_empty());
    }

    #[test]
    fn corrupt_blob_loads_as_empty() {
        let db = Database::open_in_memory().unwrap();
        db.set(NOTES_KEY, "{not json").unwrap();
        assert!(NoteStore::new(&db).load().is_empty());
    }

    #[test]
    fn save_then_load_preserves_order_and_fields() {
        let db = Database::open_in_memory().unwrap();
        let store = NoteStore::new(&db);
        let mut first = sample("first", 10);
        first.category = NoteCategory::Work;
        first.is_pinned = true;
        let notes = vec![first, sample("second", 20)];

        store.save(&notes);
        assert_eq!(store.load(), notes);
    }

    #[test]
    fn pin_store_overwrites_and_reports_presence() {
        let db = Database::open_in_memory().unwrap();
        let pins = PinStore::new(&db);
        assert!(!pins.has_pin());
        assert_eq!(pins.get(), None);

        pins.set("1234").unwrap();
        pins.set("987654").unwrap();
        assert!(pins.has_pin());
        assert_eq!(pins.get().as_deref(), Some("987654"));
    }

    #[test]
    fn empty_stored_pin_counts_as_absent() {
        let db = Database::open_in_memory().unwrap();
        db.set(PIN_KEY, "").unwrap();
        assert!(!PinStore::new(&db).has_pin());
    }
}
