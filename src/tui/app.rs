use crate::{Config, Database};
use crate::ai::{AiError, AiGateway, GeminiGateway};
use crate::dictation::{self, DictationError, DictationEvent, SpeechRecognizer};
use crate::export;
use crate::gate::{PinPrompt, PromptOutcome};
use crate::listing;
use crate::models::{AiAction, CategoryFilter, Note};
use crate::session::EditorSession;
use crate::store::{NoteStore, PinStore};
use crate::tui::widgets::text_input::TextInput;
use log::{error, info, warn};
use ratatui::widgets::ListState;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

const STATUS_MESSAGE_TIMEOUT: Duration = Duration::from_secs(3);
pub const PIN_SET_MESSAGE: &str = "Master PIN set successfully! You can now lock your notes.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    List,
    Editor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    View,
    Search,
    Help,
    PinPrompt,
    ConfirmDelete,
    ConfirmClearAll,
    AiMenu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorField {
    Title,
    Content,
}

/// The open note: its session plus the text buffers bound to the draft.
#[derive(Debug, Clone)]
pub struct EditorState {
    pub session: EditorSession,
    pub title: TextInput,
    pub content: TextInput,
    pub field: EditorField,
}

#[derive(Debug, Clone)]
pub struct UiState {
    pub screen: Screen,
    pub mode: Mode,
    pub selected_index: usize,
    pub list_state: ListState,
    pub category: CategoryFilter,
    pub ai_menu_selection: usize,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            screen: Screen::List,
            mode: Mode::View,
            selected_index: 0,
            list_state: ListState::default(),
            category: CategoryFilter::All,
            ai_menu_selection: 0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ModalState {
    /// Note picked for deletion from the list
    pub delete_target: Option<String>,
    /// 0 = confirm, 1 = cancel
    pub selection: usize,
}

#[derive(Debug, Clone, Default)]
pub struct StatusState {
    pub message: Option<String>,
    pub message_time: Option<Instant>,
}

#[derive(Debug, Clone, Default)]
pub struct SearchState {
    pub query: String,
}

/// Result of a background AI call.
#[derive(Debug)]
pub struct AiOutcome {
    pub request_id: u64,
    pub note_id: String,
    pub action: AiAction,
    pub result: Result<String, AiError>,
}

pub struct App {
    // Core infrastructure
    pub config: Config,
    pub database: Database,

    pub notes: Vec<Note>,

    // Grouped state
    pub ui: UiState,
    pub modals: ModalState,
    pub status: StatusState,
    pub search: SearchState,
    pub pin_prompt: Option<PinPrompt>,
    pub editor: Option<EditorState>,

    // Collaborators
    ai: Arc<dyn AiGateway>,
    ai_tx: Sender<AiOutcome>,
    ai_rx: Receiver<AiOutcome>,
    recognizer: Option<Box<dyn SpeechRecognizer>>,
    dictation_rx: Option<Receiver<DictationEvent>>,
}

impl App {
    pub fn new(config: Config, database: Database) -> Self {
        let ai: Arc<dyn AiGateway> = Arc::new(GeminiGateway::new(&config.ai));
        let recognizer = dictation::recognizer_from_config(&config.dictation);
        Self::with_collaborators(config, database, ai, recognizer)
    }

    /// Build with explicit AI and speech collaborators.
    pub fn with_collaborators(
        config: Config,
        database: Database,
        ai: Arc<dyn AiGateway>,
        recognizer: Option<Box<dyn SpeechRecognizer>>,
    ) -> Self {
        let notes = NoteStore::new(&database).load();
        let (ai_tx, ai_rx) = mpsc::channel();

        let mut app = Self {
            config,
            database,
            notes,
            ui: UiState::default(),
            modals: ModalState::default(),
            status: StatusState::default(),
            search: SearchState::default(),
            pin_prompt: None,
            editor: None,
            ai,
            ai_tx,
            ai_rx,
            recognizer,
            dictation_rx: None,
        };
        app.adjust_selected_index();
        app
    }

    // ----- Note list -----

    pub fn visible_notes(&self) -> Vec<Note> {
        listing::visible_notes(&self.notes, &self.search.query, self.ui.category)
    }

    pub fn selected_note(&self) -> Option<Note> {
        self.visible_notes().into_iter().nth(self.ui.selected_index)
    }

    /// Clamp the selection to the visible list and sync the widget state.
    pub fn adjust_selected_index(&mut self) {
        let len = self.visible_notes().len();
        if len == 0 {
            self.ui.selected_index = 0;
            self.ui.list_state.select(None);
        } else {
            self.ui.selected_index = self.ui.selected_index.min(len - 1);
            self.ui.list_state.select(Some(self.ui.selected_index));
        }
    }

    pub fn move_selection_up(&mut self) {
        if self.ui.selected_index > 0 {
            self.ui.selected_index -= 1;
            self.adjust_selected_index();
        }
    }

    pub fn move_selection_down(&mut self) {
        self.ui.selected_index += 1;
        self.adjust_selected_index();
    }

    pub fn set_category(&mut self, category: CategoryFilter) {
        self.ui.category = category;
        self.ui.selected_index = 0;
        self.adjust_selected_index();
    }

    pub fn next_category(&mut self) {
        self.set_category(self.ui.category.next());
    }

    pub fn prev_category(&mut self) {
        self.set_category(self.ui.category.previous());
    }

    pub fn enter_search_mode(&mut self) {
        self.ui.mode = Mode::Search;
    }

    /// Leave search; `keep_query` decides whether the filter stays applied.
    pub fn exit_search_mode(&mut self, keep_query: bool) {
        self.ui.mode = Mode::View;
        if !keep_query {
            self.search.query.clear();
        }
        self.adjust_selected_index();
    }

    pub fn add_to_search(&mut self, ch: char) {
        self.search.query.push(ch);
        self.ui.selected_index = 0;
        self.adjust_selected_index();
    }

    pub fn remove_from_search(&mut self) {
        self.search.query.pop();
        self.ui.selected_index = 0;
        self.adjust_selected_index();
    }

    pub fn enter_help_mode(&mut self) {
        self.ui.mode = Mode::Help;
    }

    pub fn exit_help_mode(&mut self) {
        self.ui.mode = Mode::View;
    }

    // ----- Status bar -----

    pub fn set_status_message(&mut self, message: impl Into<String>) {
        self.status.message = Some(message.into());
        self.status.message_time = Some(Instant::now());
    }

    pub fn clear_status_message(&mut self) {
        self.status.message = None;
        self.status.message_time = None;
    }

    /// Clear the status message once it has been shown for 3 seconds
    pub fn check_status_message_timeout(&mut self, now: Instant) {
        if let Some(time) = self.status.message_time {
            if now.saturating_duration_since(time) >= STATUS_MESSAGE_TIMEOUT {
                self.clear_status_message();
            }
        }
    }

    // ----- Collection changes; every one persists the whole collection -----

    pub fn has_pin(&self) -> bool {
        PinStore::new(&self.database).has_pin()
    }

    fn persist(&self) {
        NoteStore::new(&self.database).save(&self.notes);
    }

    /// Prepend a fresh note and open it.
    pub fn create_note(&mut self) {
        let note = Note::new();
        info!("event=note_create module=tui status=ok id={}", note.id);
        self.notes.insert(0, note.clone());
        self.persist();
        self.open_editor(note);
    }

    /// Open the highlighted note, going through the PIN prompt when locked.
    pub fn open_selected(&mut self) {
        let Some(note) = self.selected_note() else {
            return;
        };
        if note.is_locked {
            self.pin_prompt = Some(PinPrompt::unlock(note.id));
            self.ui.mode = Mode::PinPrompt;
        } else {
            self.open_editor(note);
        }
    }

    pub fn open_editor(&mut self, note: Note) {
        let field = if note.title.is_empty() { EditorField::Title } else { EditorField::Content };
        self.editor = Some(EditorState {
            title: TextInput::single_line(&note.title),
            content: TextInput::from_string(&note.content),
            session: EditorSession::new(note, self.config.autosave_delay()),
            field,
        });
        self.ui.screen = Screen::Editor;
        self.ui.mode = Mode::View;
    }

    /// Replace the stored copy of `note` (matched by id) and persist.
    fn apply_note(&mut self, note: Note) {
        match self.notes.iter_mut().find(|n| n.id == note.id) {
            Some(slot) => {
                *slot = note;
                self.persist();
            }
            None => warn!("event=note_update module=tui status=skipped reason=missing id={}", note.id),
        }
    }

    fn delete_note(&mut self, id: &str) {
        let before = self.notes.len();
        self.notes.retain(|n| n.id != id);
        if self.notes.len() == before {
            return;
        }
        info!("event=note_delete module=tui status=ok id={}", id);
        self.persist();
        self.adjust_selected_index();
        self.set_status_message("Note deleted");
    }

    /// Arm the confirmation for the highlighted note. Locked notes stay put.
    pub fn request_delete_selected(&mut self) {
        let Some(note) = self.selected_note() else {
            return;
        };
        if note.is_locked {
            self.set_status_message("Unlock the note before deleting it");
            return;
        }
        self.modals.delete_target = Some(note.id);
        self.modals.selection = 1;
        self.ui.mode = Mode::ConfirmDelete;
    }

    /// Arm the confirmation for the note open in the editor.
    pub fn request_delete_current(&mut self) {
        if let Some(editor) = self.editor.as_mut() {
            editor.session.request_delete();
            self.modals.selection = 1;
            self.ui.mode = Mode::ConfirmDelete;
        }
    }

    pub fn confirm_delete(&mut self) {
        self.ui.mode = Mode::View;
        if self.ui.screen == Screen::Editor {
            let id = self.editor.as_mut().and_then(|e| e.session.confirm_delete());
            if let Some(id) = id {
                // Dropped without a final flush, so the note is not written back
                self.stop_recognizer();
                self.editor = None;
                self.ui.screen = Screen::List;
                self.delete_note(&id);
            }
        } else if let Some(id) = self.modals.delete_target.take() {
            self.delete_note(&id);
        }
    }

    pub fn cancel_delete(&mut self) {
        self.ui.mode = Mode::View;
        self.modals.delete_target = None;
        if let Some(editor) = self.editor.as_mut() {
            editor.session.cancel_delete();
        }
    }

    pub fn request_clear_all(&mut self) {
        if self.notes.is_empty() {
            self.set_status_message("There are no notes to clear");
            return;
        }
        self.modals.selection = 1;
        self.ui.mode = Mode::ConfirmClearAll;
    }

    pub fn confirm_clear_all(&mut self) {
        self.ui.mode = Mode::View;
        let count = self.notes.len();
        self.notes.clear();
        self.persist();
        self.adjust_selected_index();
        info!("event=notes_clear module=tui status=ok count={}", count);
        self.set_status_message(format!("Deleted {} notes", count));
    }

    pub fn cancel_clear_all(&mut self) {
        self.ui.mode = Mode::View;
    }

    pub fn export_notes(&mut self) {
        let path = export::default_backup_path(self.config.export_dir.as_deref());
        match export::write_backup(&self.notes, &path) {
            Ok(()) => {
                self.set_status_message(format!("Exported {} notes to {}", self.notes.len(), path.display()));
            }
            Err(e) => {
                error!("event=export module=tui status=error error={}", e);
                self.set_status_message(format!("Export failed: {}", e));
            }
        }
    }

    // ----- PIN prompt -----

    pub fn start_set_pin(&mut self) {
        self.pin_prompt = Some(PinPrompt::set_pin());
        self.ui.mode = Mode::PinPrompt;
    }

    pub fn pin_input(&mut self, ch: char) {
        if let Some(prompt) = self.pin_prompt.as_mut() {
            prompt.push(ch);
        }
    }

    pub fn pin_backspace(&mut self) {
        if let Some(prompt) = self.pin_prompt.as_mut() {
            prompt.pop();
        }
    }

    pub fn submit_pin(&mut self) {
        let Some(prompt) = self.pin_prompt.as_mut() else {
            return;
        };
        match prompt.submit(&PinStore::new(&self.database)) {
            Ok(PromptOutcome::Pending) => {}
            Ok(PromptOutcome::PinSaved) => {
                info!("event=pin_set module=tui status=ok");
                self.cancel_pin_prompt();
                self.set_status_message(PIN_SET_MESSAGE);
            }
            Ok(PromptOutcome::Unlocked(id)) => {
                self.cancel_pin_prompt();
                match self.notes.iter().find(|n| n.id == id).cloned() {
                    Some(note) => self.open_editor(note),
                    None => warn!("event=note_unlock module=tui status=skipped reason=missing id={}", id),
                }
            }
            Err(e) => {
                error!("event=pin_set module=tui status=error error={}", e);
                self.cancel_pin_prompt();
                self.set_status_message(format!("Failed to save PIN: {}", e));
            }
        }
    }

    pub fn cancel_pin_prompt(&mut self) {
        self.pin_prompt = None;
        self.ui.mode = Mode::View;
    }

    // ----- Editor -----

    pub fn switch_editor_field(&mut self) {
        if let Some(editor) = self.editor.as_mut() {
            editor.field = match editor.field {
                EditorField::Title => EditorField::Content,
                EditorField::Content => EditorField::Title,
            };
        }
    }

    /// Run `edit` on the focused buffer; text changes flow into the draft.
    pub fn edit_active_field(&mut self, edit: impl FnOnce(&mut TextInput), now: Instant) {
        let Some(editor) = self.editor.as_mut() else {
            return;
        };
        let input = match editor.field {
            EditorField::Title => &mut editor.title,
            EditorField::Content => &mut editor.content,
        };
        let before = input.to_text();
        edit(input);
        let after = input.to_text();
        if after == before {
            return;
        }
        match editor.field {
            EditorField::Title => editor.session.set_title(after, now),
            EditorField::Content => editor.session.set_content(after, now),
        }
    }

    pub fn toggle_pin(&mut self, now: Instant) {
        if let Some(editor) = self.editor.as_mut() {
            editor.session.toggle_pin(now);
        }
    }

    pub fn toggle_lock(&mut self, now: Instant) {
        let has_pin = self.has_pin();
        let Some(editor) = self.editor.as_mut() else {
            return;
        };
        if let Err(notice) = editor.session.toggle_lock(has_pin, now) {
            self.set_status_message(notice.to_string());
        }
    }

    pub fn cycle_color(&mut self, now: Instant) {
        if let Some(editor) = self.editor.as_mut() {
            editor.session.cycle_color(now);
        }
    }

    pub fn cycle_category(&mut self, now: Instant) {
        if let Some(editor) = self.editor.as_mut() {
            editor.session.cycle_category(now);
        }
    }

    /// Save immediately instead of waiting for the debounce.
    pub fn save_now(&mut self) {
        let saved = self.editor.as_mut().map(|e| e.session.flush());
        if let Some(note) = saved {
            self.apply_note(note);
            self.set_status_message("Saved");
        }
    }

    /// Flush the draft and go back to the list.
    pub fn close_editor(&mut self) {
        self.stop_recognizer();
        if let Some(mut editor) = self.editor.take() {
            let note = editor.session.close();
            self.apply_note(note);
        }
        self.ui.screen = Screen::List;
        self.ui.mode = Mode::View;
        self.adjust_selected_index();
    }

    /// Flush anything still open; called before the program exits.
    pub fn shutdown(&mut self) {
        if self.editor.is_some() {
            self.close_editor();
        }
    }

    // ----- AI -----

    pub fn open_ai_menu(&mut self) {
        if self.editor.is_some() {
            self.ui.ai_menu_selection = 0;
            self.ui.mode = Mode::AiMenu;
        }
    }

    pub fn close_ai_menu(&mut self) {
        self.ui.mode = Mode::View;
    }

    pub fn run_ai_action(&mut self, action: AiAction) {
        self.ui.mode = Mode::View;
        let Some(editor) = self.editor.as_mut() else {
            return;
        };
        let request = match editor.session.begin_ai(action) {
            Ok(request) => request,
            Err(notice) => {
                self.set_status_message(notice.to_string());
                return;
            }
        };

        info!(
            "event=ai_request module=tui status=start request={} action={} chars={}",
            request.id,
            action.label(),
            request.text.chars().count()
        );
        let gateway = Arc::clone(&self.ai);
        let tx = self.ai_tx.clone();
        thread::spawn(move || {
            let result = gateway.perform(&request.text, request.action, request.context_title.as_deref());
            // Receiver gone means the app is shutting down
            let _ = tx.send(AiOutcome {
                request_id: request.id,
                note_id: request.note_id,
                action: request.action,
                result,
            });
        });
    }

    fn drain_ai_results(&mut self, now: Instant) {
        while let Ok(outcome) = self.ai_rx.try_recv() {
            let Some(editor) = self
                .editor
                .as_mut()
                .filter(|e| e.session.awaits_ai(outcome.request_id))
            else {
                warn!(
                    "event=ai_result module=tui status=discarded reason=stale request={} action={} id={}",
                    outcome.request_id,
                    outcome.action.label(),
                    outcome.note_id
                );
                continue;
            };

            match editor.session.finish_ai(outcome.request_id, outcome.result, now) {
                Ok(None) => {}
                Ok(Some(_)) => {
                    editor.content = TextInput::from_string(&editor.session.draft().content);
                    info!("event=ai_result module=tui status=ok action={}", outcome.action.label());
                    self.set_status_message(format!("{} done", outcome.action.label()));
                }
                Err(notice) => {
                    warn!("event=ai_result module=tui status=error action={} error={}", outcome.action.label(), notice);
                    self.set_status_message(notice.to_string());
                }
            }
        }
    }

    // ----- Dictation -----

    pub fn dictation_available(&self) -> bool {
        self.recognizer.is_some()
    }

    pub fn toggle_dictation(&mut self) {
        let available = self.recognizer.is_some();
        let Some(editor) = self.editor.as_mut() else {
            return;
        };

        if editor.session.is_listening() {
            editor.session.stop_dictation();
            self.stop_recognizer();
            info!("event=dictation_stop module=tui status=ok reason=user");
            self.set_status_message("Dictation stopped");
            return;
        }

        if let Err(notice) = editor.session.start_dictation(available) {
            self.set_status_message(notice.to_string());
            return;
        }

        let (tx, rx) = mpsc::channel();
        let started = match self.recognizer.as_mut() {
            Some(recognizer) => recognizer.start(tx),
            None => Err(DictationError::Unsupported),
        };
        match started {
            Ok(()) => {
                self.dictation_rx = Some(rx);
                info!("event=dictation_start module=tui status=ok");
                self.set_status_message("Listening...");
            }
            Err(e) => {
                if let Some(editor) = self.editor.as_mut() {
                    editor.session.stop_dictation();
                }
                warn!("event=dictation_start module=tui status=error error={}", e);
                self.set_status_message(e.to_string());
            }
        }
    }

    fn stop_recognizer(&mut self) {
        if self.dictation_rx.take().is_some() {
            if let Some(recognizer) = self.recognizer.as_mut() {
                recognizer.stop();
            }
        }
    }

    fn drain_dictation(&mut self, now: Instant) {
        let Some(rx) = self.dictation_rx.as_ref() else {
            return;
        };
        let events: Vec<DictationEvent> = rx.try_iter().collect();

        for event in events {
            let Some(editor) = self.editor.as_mut() else {
                break;
            };
            let appends = matches!(event, DictationEvent::Final(_));
            let notice = editor.session.apply_dictation(event, now);
            if appends {
                editor.content = TextInput::from_string(&editor.session.draft().content);
            }
            if let Some(notice) = notice {
                warn!("event=dictation_error module=tui status=error error={}", notice);
                self.set_status_message(notice.to_string());
            }
        }

        let listening = self.editor.as_ref().is_some_and(|e| e.session.is_listening());
        if !listening {
            info!("event=dictation_stop module=tui status=ok reason=ended");
            self.stop_recognizer();
        }
    }

    // ----- Timers and background results -----

    /// Housekeeping run once per event-loop iteration.
    pub fn tick(&mut self, now: Instant) {
        self.check_status_message_timeout(now);
        let saved = self.editor.as_mut().and_then(|e| e.session.poll_autosave(now));
        if let Some(note) = saved {
            self.apply_note(note);
        }
        self.drain_ai_results(now);
        self.drain_dictation(now);
    }
}
