//! Editing state for one open note.
//!
//! An [`EditorSession`] owns the draft fields, the auto-save deadline, the
//! single in-flight AI request and the dictation toggle. It never touches
//! storage: saves come out of it as merged [`Note`]s for the caller to persist.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::ai::AiError;
use crate::dictation::DictationEvent;
use crate::models::{AiAction, Note, NoteCategory, NoteColor};
use crate::utils;

pub const DEFAULT_AUTOSAVE_DELAY: Duration = Duration::from_millis(1000);
pub const SUMMARY_SEPARATOR: &str = "\n\n--- AI Summary ---\n";

// Shared by every session, so a reopened note never accepts an answer
// that was requested before it was closed.
static NEXT_AI_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// User-visible outcome of an editor action that did not go through.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditorNotice {
    #[error("Set a master PIN (P on the note list) before locking notes")]
    LockRequiresPin,
    #[error("An AI action is already running")]
    AiBusy,
    #[error("Nothing to process: the note is empty")]
    NothingToProcess,
    #[error("AI action failed: {0}")]
    AiFailed(String),
    #[error("Voice typing is not supported here")]
    DictationUnsupported,
    #[error("Dictation stopped: {0}")]
    DictationFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub title: String,
    pub content: String,
    pub color: NoteColor,
    pub is_pinned: bool,
    pub is_locked: bool,
    pub category: NoteCategory,
}

impl Draft {
    fn from_note(note: &Note) -> Self {
        Self {
            title: note.title.clone(),
            content: note.content.clone(),
            color: note.color,
            is_pinned: note.is_pinned,
            is_locked: note.is_locked,
            category: note.category,
        }
    }
}

/// Restartable debounce: one pending deadline at most.
#[derive(Debug, Clone)]
pub struct AutoSave {
    delay: Duration,
    deadline: Option<Instant>,
}

impl AutoSave {
    pub fn new(delay: Duration) -> Self {
        Self { delay, deadline: None }
    }

    /// Cancel any pending deadline and schedule a new one.
    pub fn touch(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// True once when the deadline has passed; the timer is then cleared.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

/// An AI request ready to hand to a gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiRequest {
    pub id: u64,
    pub note_id: String,
    pub action: AiAction,
    pub text: String,
    pub context_title: Option<String>,
}

#[derive(Debug, Clone, Copy)]
struct PendingAi {
    id: u64,
    action: AiAction,
}

#[derive(Debug, Clone)]
pub struct EditorSession {
    original: Note,
    draft: Draft,
    autosave: AutoSave,
    last_saved_at: i64,
    ai_pending: Option<PendingAi>,
    listening: bool,
    interim: Option<String>,
    delete_pending: bool,
}

impl EditorSession {
    pub fn new(note: Note, autosave_delay: Duration) -> Self {
        Self {
            draft: Draft::from_note(&note),
            last_saved_at: note.updated_at,
            original: note,
            autosave: AutoSave::new(autosave_delay),
            ai_pending: None,
            listening: false,
            interim: None,
            delete_pending: false,
        }
    }

    pub fn note_id(&self) -> &str {
        &self.original.id
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    /// Timestamp of the most recent save, for the "Edited" footer.
    pub fn last_saved_at(&self) -> i64 {
        self.last_saved_at
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.autosave.is_pending()
    }

    // Field edits. Each one restarts the auto-save timer.

    pub fn set_title(&mut self, title: String, now: Instant) {
        self.draft.title = title;
        self.autosave.touch(now);
    }

    pub fn set_content(&mut self, content: String, now: Instant) {
        self.draft.content = content;
        self.autosave.touch(now);
    }

    pub fn set_color(&mut self, color: NoteColor, now: Instant) {
        self.draft.color = color;
        self.autosave.touch(now);
    }

    pub fn cycle_color(&mut self, now: Instant) {
        self.set_color(self.draft.color.next(), now);
    }

    pub fn set_category(&mut self, category: NoteCategory, now: Instant) {
        self.draft.category = category;
        self.autosave.touch(now);
    }

    pub fn cycle_category(&mut self, now: Instant) {
        self.set_category(self.draft.category.next(), now);
    }

    pub fn toggle_pin(&mut self, now: Instant) {
        self.draft.is_pinned = !self.draft.is_pinned;
        self.autosave.touch(now);
    }

    /// Locking needs an existing PIN; unlocking is always allowed here
    /// because the editor is only reachable after the unlock gate.
    pub fn toggle_lock(&mut self, has_pin: bool, now: Instant) -> Result<(), EditorNotice> {
        if !self.draft.is_locked && !has_pin {
            return Err(EditorNotice::LockRequiresPin);
        }
        self.draft.is_locked = !self.draft.is_locked;
        self.autosave.touch(now);
        Ok(())
    }

    /// Draft merged over the original note, stamped with a fresh `updatedAt`.
    fn merged(&mut self) -> Note {
        let stamp = utils::now_millis()
            .max(self.last_saved_at)
            .max(self.original.created_at);
        self.last_saved_at = stamp;
        Note {
            title: self.draft.title.clone(),
            content: self.draft.content.clone(),
            color: self.draft.color,
            is_pinned: self.draft.is_pinned,
            is_locked: self.draft.is_locked,
            category: self.draft.category,
            updated_at: stamp,
            ..self.original.clone()
        }
    }

    /// The save produced by the debounce timer, if it has fired.
    pub fn poll_autosave(&mut self, now: Instant) -> Option<Note> {
        self.autosave.fire_if_due(now).then(|| self.merged())
    }

    /// Save immediately, whatever the timer says, and cancel it.
    pub fn flush(&mut self) -> Note {
        self.autosave.cancel();
        self.merged()
    }

    /// Leave the editor: stop dictation and return the final save.
    pub fn close(&mut self) -> Note {
        self.listening = false;
        self.interim = None;
        self.delete_pending = false;
        self.flush()
    }

    // Delete confirmation.

    pub fn request_delete(&mut self) {
        self.delete_pending = true;
    }

    pub fn cancel_delete(&mut self) {
        self.delete_pending = false;
    }

    pub fn is_delete_pending(&self) -> bool {
        self.delete_pending
    }

    /// Id of the note to remove, only if deletion was requested first.
    pub fn confirm_delete(&mut self) -> Option<String> {
        if !self.delete_pending {
            return None;
        }
        self.delete_pending = false;
        self.autosave.cancel();
        self.listening = false;
        self.interim = None;
        Some(self.original.id.clone())
    }

    // AI actions, one at a time.

    pub fn ai_in_flight(&self) -> Option<AiAction> {
        self.ai_pending.map(|p| p.action)
    }

    /// Whether `request_id` is the request this session is waiting on.
    pub fn awaits_ai(&self, request_id: u64) -> bool {
        self.ai_pending.is_some_and(|p| p.id == request_id)
    }

    pub fn begin_ai(&mut self, action: AiAction) -> Result<AiRequest, EditorNotice> {
        if self.ai_pending.is_some() {
            return Err(EditorNotice::AiBusy);
        }
        if self.draft.content.is_empty() {
            return Err(EditorNotice::NothingToProcess);
        }
        let id = NEXT_AI_REQUEST_ID.fetch_add(1, Ordering::Relaxed);
        self.ai_pending = Some(PendingAi { id, action });
        Ok(AiRequest {
            id,
            note_id: self.original.id.clone(),
            action,
            text: self.draft.content.clone(),
            context_title: Some(self.draft.title.clone()).filter(|t| !t.is_empty()),
        })
    }

    /// Apply the gateway's answer to request `request_id`.
    ///
    /// Answers for any other request are ignored and yield `Ok(None)`.
    /// Errors leave the content untouched.
    pub fn finish_ai(
        &mut self,
        request_id: u64,
        result: Result<String, AiError>,
        now: Instant,
    ) -> Result<Option<AiAction>, EditorNotice> {
        let Some(PendingAi { action, .. }) = self.ai_pending.filter(|p| p.id == request_id) else {
            return Ok(None);
        };
        self.ai_pending = None;
        let text = result.map_err(|e| EditorNotice::AiFailed(e.to_string()))?;
        let content = match action {
            AiAction::Summarize => format!("{}{}{}", self.draft.content, SUMMARY_SEPARATOR, text),
            AiAction::FixGrammar => text,
            AiAction::Continue => format!("{} {}", self.draft.content, text),
        };
        self.set_content(content, now);
        Ok(Some(action))
    }

    // Dictation.

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn interim_transcript(&self) -> Option<&str> {
        self.interim.as_deref()
    }

    /// Turn listening on. Without a recognizer nothing changes.
    pub fn start_dictation(&mut self, recognizer_available: bool) -> Result<(), EditorNotice> {
        if !recognizer_available {
            return Err(EditorNotice::DictationUnsupported);
        }
        self.listening = true;
        self.interim = None;
        Ok(())
    }

    pub fn stop_dictation(&mut self) {
        self.listening = false;
        self.interim = None;
    }

    /// Fold one recognizer event into the draft.
    pub fn apply_dictation(&mut self, event: DictationEvent, now: Instant) -> Option<EditorNotice> {
        if !self.listening {
            return None;
        }
        match event {
            DictationEvent::Final(segment) => {
                self.interim = None;
                let content = if self.draft.content.is_empty() {
                    segment
                } else {
                    format!("{} {}", self.draft.content, segment)
                };
                self.set_content(content, now);
                None
            }
            DictationEvent::Interim(text) => {
                self.interim = Some(text);
                None
            }
            DictationEvent::Error(reason) => {
                self.stop_dictation();
                Some(EditorNotice::DictationFailed(reason))
            }
            DictationEvent::Ended => {
                self.stop_dictation();
                None
            }
        }
    }
}
