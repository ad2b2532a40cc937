use notepin::ai::AiError;
use notepin::gate::{PinPrompt, PromptOutcome};
use notepin::listing;
use notepin::models::{AiAction, CategoryFilter};
use notepin::session::{EditorNotice, EditorSession, SUMMARY_SEPARATOR};
use notepin::store::{NoteStore, PinStore};
use notepin::{Database, Note, NoteCategory, NoteColor};
use std::time::{Duration, Instant};

const DELAY: Duration = Duration::from_millis(1000);

fn note(title: &str, category: NoteCategory) -> Note {
    let mut note = Note::new();
    note.title = title.to_string();
    note.category = category;
    note
}

#[test]
fn edits_inside_the_debounce_window_produce_one_save() {
    let mut original = note("Draft", NoteCategory::Personal);
    original.updated_at = original.created_at;
    let mut session = EditorSession::new(original.clone(), DELAY);
    let start = Instant::now();

    session.set_title("Plan".into(), start);
    session.set_content("first".into(), start + Duration::from_millis(300));
    session.set_color(NoteColor::Cyan, start + Duration::from_millis(600));
    session.set_content("final words".into(), start + Duration::from_millis(900));

    // Each edit pushed the deadline out, so nothing is due one second after the first
    assert!(session.poll_autosave(start + Duration::from_millis(1000)).is_none());
    assert!(session.poll_autosave(start + Duration::from_millis(1800)).is_none());

    let saved = session
        .poll_autosave(start + Duration::from_millis(1900))
        .expect("debounced save");
    assert_eq!(saved.id, original.id);
    assert_eq!(saved.title, "Plan");
    assert_eq!(saved.content, "final words");
    assert_eq!(saved.color, NoteColor::Cyan);
    assert!(saved.updated_at >= original.updated_at);
    assert_eq!(saved.created_at, original.created_at);

    // The timer is spent
    assert!(session.poll_autosave(start + Duration::from_secs(10)).is_none());
}

#[test]
fn closing_saves_before_the_timer_fires() {
    let original = note("Old", NoteCategory::Work);
    let mut session = EditorSession::new(original, DELAY);
    session.set_title("New".into(), Instant::now());
    assert!(session.has_unsaved_changes());

    let saved = session.close();
    assert_eq!(saved.title, "New");
    assert!(!session.has_unsaved_changes());
}

#[test]
fn save_of_load_round_trips() {
    let db = Database::open_in_memory().unwrap();
    let store = NoteStore::new(&db);
    let mut pinned = note("Pinned", NoteCategory::Ideas);
    pinned.is_pinned = true;
    pinned.color = NoteColor::Pink;
    let mut locked = note("Secret", NoteCategory::Personal);
    locked.is_locked = true;
    locked.content = "line one\nline two".into();
    store.try_save(&[pinned, locked]).unwrap();

    let first = store.load();
    store.try_save(&first).unwrap();
    let second = store.load();
    assert_eq!(first, second);
    assert_eq!(second.len(), 2);
}

#[test]
fn filter_by_query_and_category() {
    let milk = note("Buy milk", NoteCategory::ToDo);
    let trip = note("Trip plan", NoteCategory::Ideas);
    let notes = vec![milk.clone(), trip.clone()];

    let by_query = listing::visible_notes(&notes, "trip", CategoryFilter::All);
    assert_eq!(by_query, vec![trip]);

    let by_category = listing::visible_notes(&notes, "", CategoryFilter::Only(NoteCategory::ToDo));
    assert_eq!(by_category, vec![milk]);
}

#[test]
fn pinned_notes_come_first_then_newest() {
    let mut older = note("older", NoteCategory::Personal);
    older.updated_at = 100;
    let mut newer = note("newer", NoteCategory::Personal);
    newer.updated_at = 200;
    let mut pinned = note("pinned", NoteCategory::Personal);
    pinned.updated_at = 50;
    pinned.is_pinned = true;

    let order: Vec<String> = listing::visible_notes(&[older, newer, pinned], "", CategoryFilter::All)
        .into_iter()
        .map(|n| n.title)
        .collect();
    assert_eq!(order, vec!["pinned", "newer", "older"]);
}

#[test]
fn locking_without_a_pin_changes_nothing() {
    let mut session = EditorSession::new(note("n", NoteCategory::Personal), DELAY);
    let result = session.toggle_lock(false, Instant::now());
    assert_eq!(result, Err(EditorNotice::LockRequiresPin));
    assert!(!session.draft().is_locked);
    assert!(!session.has_unsaved_changes());
}

#[test]
fn unlock_accepts_only_the_stored_pin() {
    let db = Database::open_in_memory().unwrap();
    let pins = PinStore::new(&db);
    pins.set("1234").unwrap();

    let mut prompt = PinPrompt::unlock("note-1".into());
    "0000".chars().for_each(|c| prompt.push(c));
    assert_eq!(prompt.submit(&pins).unwrap(), PromptOutcome::Pending);
    assert_eq!(prompt.error(), Some("Incorrect PIN"));
    assert_eq!(prompt.input_len(), 0);

    "1234".chars().for_each(|c| prompt.push(c));
    assert_eq!(prompt.submit(&pins).unwrap(), PromptOutcome::Unlocked("note-1".into()));
}

#[test]
fn fix_grammar_replaces_the_content() {
    let mut original = note("Pets", NoteCategory::Personal);
    original.content = "i has a dog".into();
    let mut session = EditorSession::new(original, DELAY);

    let request = session.begin_ai(AiAction::FixGrammar).unwrap();
    session
        .finish_ai(request.id, Ok("I have a dog.".into()), Instant::now())
        .unwrap();
    assert_eq!(session.draft().content, "I have a dog.");
}

#[test]
fn summarize_appends_below_the_original() {
    let mut original = note("Meeting", NoteCategory::Work);
    original.content = "We agreed on Friday.\nBudget is fixed.".into();
    let mut session = EditorSession::new(original.clone(), DELAY);

    let request = session.begin_ai(AiAction::Summarize).unwrap();
    session
        .finish_ai(request.id, Ok("- Friday\n- Fixed budget".into()), Instant::now())
        .unwrap();

    let content = &session.draft().content;
    let (before, after) = content.split_once(SUMMARY_SEPARATOR).expect("separator");
    assert_eq!(before, original.content);
    assert_eq!(after, "- Friday\n- Fixed budget");
}

#[test]
fn failed_ai_leaves_content_untouched() {
    let mut original = note("n", NoteCategory::Personal);
    original.content = "keep me".into();
    let mut session = EditorSession::new(original, DELAY);

    let request = session.begin_ai(AiAction::Continue).unwrap();
    let result = session.finish_ai(
        request.id,
        Err(AiError::Network("timed out".into())),
        Instant::now(),
    );
    assert!(matches!(result, Err(EditorNotice::AiFailed(_))));
    assert_eq!(session.draft().content, "keep me");
    assert_eq!(session.ai_in_flight(), None);
}
