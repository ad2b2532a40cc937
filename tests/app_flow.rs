use notepin::ai::{AiError, AiGateway};
use notepin::dictation::{DictationError, DictationEvent, SpeechRecognizer};
use notepin::models::AiAction;
use notepin::session::SUMMARY_SEPARATOR;
use notepin::store::{NoteStore, PinStore};
use notepin::tui::{App, Mode, Screen};
use notepin::{Config, Database, Note};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

struct FixedAi {
    reply: String,
    delay: Duration,
}

impl FixedAi {
    fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self { reply: reply.to_string(), delay: Duration::ZERO })
    }
}

impl AiGateway for FixedAi {
    fn perform(&self, _text: &str, _action: AiAction, _title: Option<&str>) -> Result<String, AiError> {
        thread::sleep(self.delay);
        Ok(self.reply.clone())
    }
}

/// Slow grammar fixes, slower summaries.
struct StaggeredAi;

impl AiGateway for StaggeredAi {
    fn perform(&self, text: &str, action: AiAction, _title: Option<&str>) -> Result<String, AiError> {
        match action {
            AiAction::FixGrammar => {
                thread::sleep(Duration::from_millis(100));
                Ok(format!("GRAMMAR({})", text))
            }
            _ => {
                thread::sleep(Duration::from_millis(400));
                Ok("summary".to_string())
            }
        }
    }
}

/// Hands the event sender back to the test so it can play the recognizer.
#[derive(Clone, Default)]
struct ScriptedRecognizer {
    events: Arc<Mutex<Option<Sender<DictationEvent>>>>,
    stops: Arc<Mutex<usize>>,
}

impl ScriptedRecognizer {
    fn emit(&self, event: DictationEvent) {
        let guard = self.events.lock().unwrap();
        guard.as_ref().expect("recognizer started").send(event).unwrap();
    }

    fn stop_count(&self) -> usize {
        *self.stops.lock().unwrap()
    }
}

impl SpeechRecognizer for ScriptedRecognizer {
    fn start(&mut self, events: Sender<DictationEvent>) -> Result<(), DictationError> {
        *self.events.lock().unwrap() = Some(events);
        Ok(())
    }

    fn stop(&mut self) {
        *self.stops.lock().unwrap() += 1;
    }
}

fn note(title: &str, content: &str, updated_at: i64) -> Note {
    let mut note = Note::new();
    note.title = title.to_string();
    note.content = content.to_string();
    note.created_at = updated_at;
    note.updated_at = updated_at;
    note
}

fn app_with(notes: &[Note], ai: Arc<dyn AiGateway>, recognizer: Option<ScriptedRecognizer>) -> App {
    let db = Database::open_in_memory().unwrap();
    NoteStore::new(&db).try_save(notes).unwrap();
    let recognizer = recognizer.map(|r| Box::new(r) as Box<dyn SpeechRecognizer>);
    App::with_collaborators(Config::default(), db, ai, recognizer)
}

fn stored(app: &App) -> Vec<Note> {
    NoteStore::new(&app.database).load()
}

fn type_text(app: &mut App, text: &str, now: Instant) {
    for ch in text.chars() {
        app.edit_active_field(|input| input.insert_char(ch), now);
    }
}

/// Tick until `done` holds or two seconds pass.
fn tick_until(app: &mut App, done: impl Fn(&App) -> bool) {
    for _ in 0..200 {
        app.tick(Instant::now());
        if done(app) {
            return;
        }
        thread::sleep(Duration::from_millis(10));
    }
    panic!("condition not reached");
}

#[test]
fn typing_is_saved_once_the_debounce_settles() {
    let mut app = app_with(&[], FixedAi::replying(""), None);
    app.create_note();
    let id = app.editor.as_ref().unwrap().session.note_id().to_string();
    assert_eq!(stored(&app).len(), 1);

    let start = Instant::now();
    type_text(&mut app, "Shopping", start);
    app.tick(start + Duration::from_millis(500));
    assert_eq!(stored(&app)[0].title, "");

    app.tick(start + Duration::from_millis(1000));
    let notes = stored(&app);
    assert_eq!(notes[0].id, id);
    assert_eq!(notes[0].title, "Shopping");
}

#[test]
fn leaving_the_editor_saves_immediately() {
    let mut app = app_with(&[note("Todo", "", 100)], FixedAi::replying(""), None);
    app.open_selected();
    type_text(&mut app, "call mum", Instant::now());

    app.close_editor();
    assert_eq!(app.ui.screen, Screen::List);
    assert_eq!(stored(&app)[0].content, "call mum");
    assert_eq!(app.notes[0].content, "call mum");
}

#[test]
fn lock_needs_a_pin_first() {
    let mut app = app_with(&[note("Diary", "dear diary", 100)], FixedAi::replying(""), None);
    app.open_selected();
    app.toggle_lock(Instant::now());

    let editor = app.editor.as_ref().unwrap();
    assert!(!editor.session.draft().is_locked);
    assert!(app.status.message.as_deref().unwrap_or("").contains("Set a master PIN"));

    PinStore::new(&app.database).set("2468").unwrap();
    app.toggle_lock(Instant::now());
    assert!(app.editor.as_ref().unwrap().session.draft().is_locked);
}

#[test]
fn locked_note_opens_only_with_the_right_pin() {
    let mut locked = note("Secret", "the code is 42", 100);
    locked.is_locked = true;
    let mut app = app_with(&[locked], FixedAi::replying(""), None);
    PinStore::new(&app.database).set("1234").unwrap();

    app.open_selected();
    assert_eq!(app.ui.mode, Mode::PinPrompt);
    assert!(app.editor.is_none());

    "0000".chars().for_each(|c| app.pin_input(c));
    app.submit_pin();
    assert_eq!(app.ui.mode, Mode::PinPrompt);
    assert!(app.editor.is_none());
    assert_eq!(app.pin_prompt.as_ref().unwrap().error(), Some("Incorrect PIN"));

    "1234".chars().for_each(|c| app.pin_input(c));
    app.submit_pin();
    assert_eq!(app.ui.screen, Screen::Editor);
    assert_eq!(app.editor.as_ref().unwrap().session.draft().content, "the code is 42");
}

#[test]
fn setting_the_pin_from_the_list() {
    let mut app = app_with(&[], FixedAi::replying(""), None);
    assert!(!app.has_pin());

    app.start_set_pin();
    "98765".chars().for_each(|c| app.pin_input(c));
    app.submit_pin();

    assert_eq!(app.ui.mode, Mode::View);
    assert!(app.pin_prompt.is_none());
    assert_eq!(PinStore::new(&app.database).get().as_deref(), Some("98765"));
}

#[test]
fn deleting_removes_only_that_note() {
    let keep_a = note("A", "alpha", 300);
    let doomed = note("B", "beta", 200);
    let keep_c = note("C", "gamma", 100);
    let mut app = app_with(&[keep_a.clone(), doomed.clone(), keep_c.clone()], FixedAi::replying(""), None);

    app.move_selection_down();
    assert_eq!(app.selected_note().unwrap().id, doomed.id);
    app.request_delete_selected();
    assert_eq!(app.ui.mode, Mode::ConfirmDelete);
    app.confirm_delete();

    assert_eq!(stored(&app), vec![keep_a, keep_c]);
}

#[test]
fn deleting_from_the_editor_does_not_write_the_draft_back() {
    let mut app = app_with(&[note("Scratch", "", 100)], FixedAi::replying(""), None);
    app.open_selected();
    type_text(&mut app, "unsaved", Instant::now());

    app.request_delete_current();
    app.confirm_delete();

    assert!(app.editor.is_none());
    assert!(stored(&app).is_empty());
    app.tick(Instant::now() + Duration::from_secs(5));
    assert!(stored(&app).is_empty());
}

#[test]
fn clear_all_empties_the_store() {
    let mut app = app_with(&[note("A", "", 1), note("B", "", 2)], FixedAi::replying(""), None);
    app.request_clear_all();
    assert_eq!(app.ui.mode, Mode::ConfirmClearAll);
    app.confirm_clear_all();

    assert!(stored(&app).is_empty());
    assert_eq!(app.status.message.as_deref(), Some("Deleted 2 notes"));
}

#[test]
fn ai_result_lands_in_the_open_note() {
    let mut app = app_with(&[note("Pets", "i has a dog", 100)], FixedAi::replying("I have a dog."), None);
    app.open_selected();
    app.run_ai_action(AiAction::FixGrammar);
    assert_eq!(
        app.editor.as_ref().unwrap().session.ai_in_flight(),
        Some(AiAction::FixGrammar)
    );

    // A second request while the first runs is refused
    app.run_ai_action(AiAction::Summarize);
    assert_eq!(app.status.message.as_deref(), Some("An AI action is already running"));

    tick_until(&mut app, |app| {
        app.editor.as_ref().is_some_and(|e| e.session.ai_in_flight().is_none())
    });
    let editor = app.editor.as_ref().unwrap();
    assert_eq!(editor.session.draft().content, "I have a dog.");
    assert_eq!(editor.content.to_text(), "I have a dog.");
}

#[test]
fn ai_result_after_closing_is_dropped() {
    let slow = Arc::new(FixedAi { reply: "rewritten".into(), delay: Duration::from_millis(50) });
    let mut app = app_with(&[note("Keep", "original text", 100)], slow, None);
    app.open_selected();
    app.run_ai_action(AiAction::FixGrammar);
    app.close_editor();

    thread::sleep(Duration::from_millis(150));
    app.tick(Instant::now());
    assert_eq!(stored(&app)[0].content, "original text");
}

#[test]
fn answer_from_a_closed_session_does_not_touch_the_reopened_note() {
    let mut app = app_with(&[note("Essay", "old text", 100)], Arc::new(StaggeredAi), None);
    app.open_selected();
    app.run_ai_action(AiAction::FixGrammar);
    app.close_editor();

    app.open_selected();
    type_text(&mut app, " plus new work", Instant::now());
    app.run_ai_action(AiAction::Summarize);

    // The grammar fix lands while the summary is still running
    thread::sleep(Duration::from_millis(200));
    app.tick(Instant::now());
    let editor = app.editor.as_ref().unwrap();
    assert_eq!(editor.session.draft().content, "old text plus new work");
    assert_eq!(editor.session.ai_in_flight(), Some(AiAction::Summarize));

    tick_until(&mut app, |app| {
        app.editor.as_ref().is_some_and(|e| e.session.ai_in_flight().is_none())
    });
    let editor = app.editor.as_ref().unwrap();
    assert_eq!(
        editor.session.draft().content,
        format!("old text plus new work{}summary", SUMMARY_SEPARATOR)
    );
    assert_eq!(editor.content.to_text(), editor.session.draft().content);
}

#[test]
fn dictation_appends_final_segments() {
    let recognizer = ScriptedRecognizer::default();
    let mut app = app_with(&[note("Voice", "", 100)], FixedAi::replying(""), Some(recognizer.clone()));
    app.open_selected();
    app.toggle_dictation();
    assert!(app.editor.as_ref().unwrap().session.is_listening());

    recognizer.emit(DictationEvent::Final("hello".into()));
    recognizer.emit(DictationEvent::Interim("wor".into()));
    app.tick(Instant::now());
    let editor = app.editor.as_ref().unwrap();
    assert_eq!(editor.session.draft().content, "hello");
    assert_eq!(editor.session.interim_transcript(), Some("wor"));

    recognizer.emit(DictationEvent::Final("world".into()));
    recognizer.emit(DictationEvent::Ended);
    app.tick(Instant::now());
    let editor = app.editor.as_ref().unwrap();
    assert_eq!(editor.content.to_text(), "hello world");
    assert!(!editor.session.is_listening());
    assert_eq!(recognizer.stop_count(), 1);
}

#[test]
fn dictation_error_turns_listening_off() {
    let recognizer = ScriptedRecognizer::default();
    let mut app = app_with(&[note("Voice", "keep", 100)], FixedAi::replying(""), Some(recognizer.clone()));
    app.open_selected();
    app.toggle_dictation();

    recognizer.emit(DictationEvent::Error("microphone busy".into()));
    app.tick(Instant::now());

    let editor = app.editor.as_ref().unwrap();
    assert!(!editor.session.is_listening());
    assert_eq!(editor.session.draft().content, "keep");
    assert_eq!(app.status.message.as_deref(), Some("Dictation stopped: microphone busy"));
}

#[test]
fn dictation_without_a_recognizer_reports_unsupported() {
    let mut app = app_with(&[note("Voice", "", 100)], FixedAi::replying(""), None);
    app.open_selected();
    app.toggle_dictation();

    assert!(!app.editor.as_ref().unwrap().session.is_listening());
    assert_eq!(app.status.message.as_deref(), Some("Voice typing is not supported here"));
}

#[test]
fn export_writes_every_note_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let notes = vec![note("One", "1", 1), note("Two", "2", 2)];
    let db = Database::open_in_memory().unwrap();
    NoteStore::new(&db).try_save(&notes).unwrap();
    let config = Config {
        export_dir: Some(dir.path().display().to_string()),
        ..Config::default()
    };
    let mut app = App::with_collaborators(config, db, FixedAi::replying(""), None);

    app.export_notes();

    let written = std::fs::read_to_string(dir.path().join("notes_backup.json")).unwrap();
    let parsed: Vec<Note> = serde_json::from_str(&written).unwrap();
    assert_eq!(parsed, notes);
}
