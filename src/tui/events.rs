use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, size as terminal_size};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::Terminal;
use std::io;
use std::time::{Duration, Instant};
use crate::models::AiAction;
use crate::tui::{App, Layout, Mode, Screen};
use crate::tui::error::TuiError;
use crate::utils::{parse_key_binding, ParsedKeyBinding};

const POLL_INTERVAL: Duration = Duration::from_millis(16);

/// Guard that ensures terminal state is restored even on panic
struct TerminalGuard {
    raw_mode_enabled: bool,
    alternate_screen_enabled: bool,
}

impl TerminalGuard {
    fn new() -> Result<Self, TuiError> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        Ok(Self {
            raw_mode_enabled: true,
            alternate_screen_enabled: true,
        })
    }

    /// Restore terminal state on normal exit; drop then does nothing
    fn restore(&mut self) -> Result<(), TuiError> {
        if self.raw_mode_enabled {
            disable_raw_mode()?;
            self.raw_mode_enabled = false;
        }
        if self.alternate_screen_enabled {
            execute!(io::stdout(), LeaveAlternateScreen)?;
            self.alternate_screen_enabled = false;
        }
        Ok(())
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        // Already on a cleanup path, errors are ignored
        if self.raw_mode_enabled {
            let _ = disable_raw_mode();
        }
        if self.alternate_screen_enabled {
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
        }
    }
}

pub fn run_event_loop(mut app: App) -> Result<(), TuiError> {
    // Checked before entering the alternate screen so the message stays visible
    let (width, height) = terminal_size()?;
    let min_width_with_border = Layout::MIN_WIDTH + 2;
    let min_height_with_border = Layout::MIN_HEIGHT + 2;

    if width < min_width_with_border || height < min_height_with_border {
        return Err(TuiError::RenderError(format!(
            "Terminal size too small. Current: {}x{}, Minimum required: {}x{}. Please resize your terminal window.",
            width, height, min_width_with_border, min_height_with_border
        )));
    }

    let mut guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    let result = loop {
        app.tick(Instant::now());

        let terminal_size = terminal.size()?;
        let terminal_rect = Rect::new(0, 0, terminal_size.width, terminal_size.height);
        terminal.draw(|f| {
            let layout = Layout::calculate(terminal_rect);
            crate::tui::render::render(f, &mut app, &layout);
        })?;

        // Only Press events; Windows also reports Release
        if event::poll(POLL_INTERVAL)? {
            if let Event::Key(key_event) = event::read()? {
                if key_event.kind == KeyEventKind::Press {
                    match handle_key_event(&mut app, key_event) {
                        Ok(true) => break Ok(()),
                        Ok(false) => {}
                        Err(e) => break Err(e),
                    }
                }
            }
        }
    };

    app.shutdown();
    guard.restore()?;
    result
}

/// Returns `Ok(true)` when the user asked to quit.
pub fn handle_key_event(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    match app.ui.mode {
        Mode::ConfirmDelete | Mode::ConfirmClearAll => handle_confirm_modal(app, key_event),
        Mode::PinPrompt => handle_pin_prompt(app, key_event),
        Mode::Help => handle_help_mode(app, key_event),
        Mode::AiMenu => handle_ai_menu(app, key_event),
        Mode::Search => handle_search_mode(app, key_event),
        Mode::View => match app.ui.screen {
            Screen::List => handle_list_keys(app, key_event),
            Screen::Editor => handle_editor_keys(app, key_event),
        },
    }
}

fn handle_confirm_modal(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    let clear_all = app.ui.mode == Mode::ConfirmClearAll;
    let confirm = |app: &mut App| if clear_all { app.confirm_clear_all() } else { app.confirm_delete() };
    let cancel = |app: &mut App| if clear_all { app.cancel_clear_all() } else { app.cancel_delete() };

    match key_event.code {
        KeyCode::Up | KeyCode::Down | KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::BackTab => {
            app.modals.selection = 1 - app.modals.selection.min(1);
        }
        KeyCode::Enter => {
            if app.modals.selection == 0 {
                confirm(app);
            } else {
                cancel(app);
            }
        }
        KeyCode::Char('y') => confirm(app),
        KeyCode::Esc | KeyCode::Char('n') => cancel(app),
        _ => {}
    }
    Ok(false)
}

fn handle_pin_prompt(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    match key_event.code {
        KeyCode::Char(c) => app.pin_input(c),
        KeyCode::Backspace => app.pin_backspace(),
        KeyCode::Enter => app.submit_pin(),
        KeyCode::Esc => app.cancel_pin_prompt(),
        _ => {}
    }
    Ok(false)
}

fn handle_help_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    if key_event.code == KeyCode::Esc || matches_binding(key_event, &app.config.key_bindings.help)? {
        app.exit_help_mode();
    }
    Ok(false)
}

fn handle_ai_menu(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    let count = AiAction::ALL.len();
    match key_event.code {
        KeyCode::Up => {
            app.ui.ai_menu_selection = (app.ui.ai_menu_selection + count - 1) % count;
        }
        KeyCode::Down | KeyCode::Tab => {
            app.ui.ai_menu_selection = (app.ui.ai_menu_selection + 1) % count;
        }
        KeyCode::Enter => {
            let action = AiAction::ALL[app.ui.ai_menu_selection % count];
            app.run_ai_action(action);
        }
        KeyCode::Char(c) => {
            let picked = c
                .to_digit(10)
                .and_then(|d| (d as usize).checked_sub(1))
                .and_then(|i| AiAction::ALL.get(i));
            if let Some(action) = picked {
                app.run_ai_action(*action);
            }
        }
        KeyCode::Esc => app.close_ai_menu(),
        _ => {}
    }
    Ok(false)
}

fn handle_search_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    match key_event.code {
        KeyCode::Esc => app.exit_search_mode(false),
        KeyCode::Enter => app.exit_search_mode(true),
        KeyCode::Up => app.move_selection_up(),
        KeyCode::Down => app.move_selection_down(),
        KeyCode::Backspace => app.remove_from_search(),
        KeyCode::Char(c) if !crate::utils::has_primary_modifier(key_event.modifiers) => app.add_to_search(c),
        _ => {}
    }
    Ok(false)
}

fn handle_list_keys(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    let kb = app.config.key_bindings.clone();

    if matches_binding(key_event, &kb.quit)? {
        return Ok(true);
    }
    if matches_binding(key_event, &kb.help)? {
        app.enter_help_mode();
    } else if matches_binding(key_event, &kb.list_up)? || key_event.code == KeyCode::Up {
        app.move_selection_up();
    } else if matches_binding(key_event, &kb.list_down)? || key_event.code == KeyCode::Down {
        app.move_selection_down();
    } else if matches_binding(key_event, &kb.category_left)? {
        app.prev_category();
    } else if matches_binding(key_event, &kb.category_right)? {
        app.next_category();
    } else if matches_binding(key_event, &kb.select)? {
        app.open_selected();
    } else if matches_binding(key_event, &kb.new)? {
        app.create_note();
    } else if matches_binding(key_event, &kb.delete)? {
        app.request_delete_selected();
    } else if matches_binding(key_event, &kb.search)? {
        app.enter_search_mode();
    } else if matches_binding(key_event, &kb.set_pin)? {
        app.start_set_pin();
    } else if matches_binding(key_event, &kb.export)? {
        app.export_notes();
    } else if matches_binding(key_event, &kb.clear_all)? {
        app.request_clear_all();
    } else if key_event.code == KeyCode::Esc && !app.search.query.is_empty() {
        app.exit_search_mode(false);
    }
    Ok(false)
}

fn handle_editor_keys(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    let kb = app.config.key_bindings.clone();
    let now = Instant::now();

    if matches_binding(key_event, &kb.save)? {
        app.save_now();
    } else if matches_binding(key_event, &kb.toggle_pin)? {
        app.toggle_pin(now);
    } else if matches_binding(key_event, &kb.toggle_lock)? {
        app.toggle_lock(now);
    } else if matches_binding(key_event, &kb.cycle_color)? {
        app.cycle_color(now);
    } else if matches_binding(key_event, &kb.cycle_category)? {
        app.cycle_category(now);
    } else if matches_binding(key_event, &kb.ai_menu)? {
        app.open_ai_menu();
    } else if matches_binding(key_event, &kb.dictation)? {
        app.toggle_dictation();
    } else if matches_binding(key_event, &kb.delete_note)? {
        app.request_delete_current();
    } else if matches_binding(key_event, &kb.help)? {
        app.enter_help_mode();
    } else {
        handle_text_input(app, key_event, now);
    }
    Ok(false)
}

fn handle_text_input(app: &mut App, key_event: KeyEvent, now: Instant) {
    let word_jump = crate::utils::has_primary_modifier(key_event.modifiers);
    match key_event.code {
        KeyCode::Esc => app.close_editor(),
        KeyCode::Tab | KeyCode::BackTab => app.switch_editor_field(),
        KeyCode::Enter => {
            let on_title = app.editor.as_ref().is_some_and(|e| e.field == crate::tui::EditorField::Title);
            if on_title {
                app.switch_editor_field();
            } else {
                app.edit_active_field(|input| input.insert_newline(), now);
            }
        }
        KeyCode::Backspace => app.edit_active_field(|input| input.delete_char(), now),
        KeyCode::Delete => app.edit_active_field(|input| input.delete_forward(), now),
        KeyCode::Left if word_jump => app.edit_active_field(|input| input.move_cursor_word_left(), now),
        KeyCode::Right if word_jump => app.edit_active_field(|input| input.move_cursor_word_right(), now),
        KeyCode::Left => app.edit_active_field(|input| input.move_cursor_left(), now),
        KeyCode::Right => app.edit_active_field(|input| input.move_cursor_right(), now),
        KeyCode::Up => app.edit_active_field(|input| input.move_cursor_up(), now),
        KeyCode::Down => app.edit_active_field(|input| input.move_cursor_down(), now),
        KeyCode::Home => app.edit_active_field(|input| input.move_cursor_home(), now),
        KeyCode::End => app.edit_active_field(|input| input.move_cursor_end(), now),
        KeyCode::Char(c) if !key_event.modifiers.contains(KeyModifiers::CONTROL) => {
            app.edit_active_field(|input| input.insert_char(c), now);
        }
        _ => {}
    }
}

fn matches_binding(key_event: KeyEvent, binding: &str) -> Result<bool, TuiError> {
    let parsed = parse_key_binding(binding).map_err(TuiError::KeyBindingError)?;
    Ok(matches_key_event(key_event, &parsed))
}

fn matches_key_event(key_event: KeyEvent, binding: &ParsedKeyBinding) -> bool {
    // Primary modifier: Ctrl on Windows/Linux, Ctrl or Option on macOS
    let has_primary_mod = crate::utils::has_primary_modifier(key_event.modifiers);
    if binding.requires_ctrl != has_primary_mod {
        return false;
    }
    binding.key_code == key_event.code
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{AiError, AiGateway};
    use crate::database::Database;
    use crate::Config;
    use std::sync::Arc;

    struct NoAi;

    impl AiGateway for NoAi {
        fn perform(&self, _text: &str, _action: AiAction, _title: Option<&str>) -> Result<String, AiError> {
            Err(AiError::Network("offline".into()))
        }
    }

    fn app() -> App {
        let db = Database::open_in_memory().unwrap();
        App::with_collaborators(Config::default(), db, Arc::new(NoAi), None)
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        handle_key_event(app, KeyEvent::new(code, KeyModifiers::NONE)).unwrap()
    }

    fn ctrl(app: &mut App, c: char) -> bool {
        handle_key_event(app, KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)).unwrap()
    }

    #[test]
    fn typing_in_a_new_note_reaches_the_draft() {
        let mut app = app();
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.ui.screen, Screen::Editor);

        for c in "Trip".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Enter);
        for c in "pack bags".chars() {
            press(&mut app, KeyCode::Char(c));
        }

        let editor = app.editor.as_ref().unwrap();
        assert_eq!(editor.session.draft().title, "Trip");
        assert_eq!(editor.session.draft().content, "pack bags");

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.ui.screen, Screen::List);
        assert_eq!(app.notes[0].title, "Trip");
    }

    #[test]
    fn quit_key_only_quits_from_the_list() {
        let mut app = app();
        press(&mut app, KeyCode::Char('n'));
        assert!(!press(&mut app, KeyCode::Char('q')));
        press(&mut app, KeyCode::Esc);
        assert!(press(&mut app, KeyCode::Char('q')));
    }

    #[test]
    fn locking_without_pin_shows_guidance() {
        let mut app = app();
        press(&mut app, KeyCode::Char('n'));
        ctrl(&mut app, 'l');
        assert!(!app.editor.as_ref().unwrap().session.draft().is_locked);
        assert!(app.status.message.as_deref().unwrap_or("").contains("PIN"));
    }

    #[test]
    fn dictation_without_recognizer_reports_unsupported() {
        let mut app = app();
        press(&mut app, KeyCode::Char('n'));
        ctrl(&mut app, 't');
        assert!(!app.editor.as_ref().unwrap().session.is_listening());
        assert_eq!(app.status.message.as_deref(), Some("Voice typing is not supported here"));
    }

    #[test]
    fn confirm_modal_defaults_to_cancel() {
        let mut app = app();
        press(&mut app, KeyCode::Char('n'));
        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.ui.mode, Mode::ConfirmDelete);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.notes.len(), 1);

        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Up);
        press(&mut app, KeyCode::Enter);
        assert!(app.notes.is_empty());
    }

    #[test]
    fn search_filters_while_typing() {
        let mut app = app();
        for title in ["alpha", "beta"] {
            press(&mut app, KeyCode::Char('n'));
            for c in title.chars() {
                press(&mut app, KeyCode::Char(c));
            }
            press(&mut app, KeyCode::Esc);
        }
        press(&mut app, KeyCode::Char('/'));
        for c in "ALP".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        let visible = app.visible_notes();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].title, "alpha");

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.visible_notes().len(), 2);
    }
}
