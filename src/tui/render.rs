use ratatui::Frame;
use ratatui::widgets::{Block, Borders};
use ratatui::style::Style;
use ratatui::layout::Alignment;
use crate::listing;
use crate::tui::{App, Layout, Mode, Screen};
use crate::tui::widgets::{
    ai_menu::render_ai_menu,
    category_bar::render_category_bar,
    color::parse_color,
    confirm::{render_confirm, ConfirmDialog},
    help::render_help,
    note_editor::{render_editor_toolbar, render_note_editor},
    note_list::render_note_list,
    pin_prompt::render_pin_prompt,
    status_bar::render_status_bar,
};
use crate::utils::format_key_binding_for_display as key;

pub fn render(f: &mut Frame, app: &mut App, layout: &Layout) {
    let active_theme = app.config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let bg_color = parse_color(&active_theme.bg);
    let outer_block = Block::default()
        .borders(Borders::ALL)
        .title("notepin")
        .title_alignment(Alignment::Center)
        .style(Style::default().fg(fg_color).bg(bg_color));
    f.render_widget(outer_block, f.area());

    match app.ui.screen {
        Screen::List => {
            let counts = listing::category_counts(&app.notes);
            render_category_bar(f, layout.header_area, app.ui.category, &counts, &app.config);

            let visible = app.visible_notes();
            let query = (app.ui.mode == Mode::Search || !app.search.query.is_empty())
                .then_some(app.search.query.as_str());
            render_note_list(
                f,
                layout.main_area,
                &visible,
                app.notes.len(),
                query,
                &mut app.ui.list_state,
                &app.config,
            );
        }
        Screen::Editor => {
            if let Some(editor) = app.editor.as_mut() {
                render_editor_toolbar(f, layout.header_area, editor, &app.config);
                render_note_editor(f, layout.main_area, editor, &app.config);
            }
        }
    }

    // Overlays go on top of the screen content
    match app.ui.mode {
        Mode::Help => render_help(f, f.area(), &app.config),
        Mode::AiMenu => render_ai_menu(f, f.area(), app.ui.ai_menu_selection, &app.config),
        Mode::PinPrompt => {
            if let Some(prompt) = app.pin_prompt.as_ref() {
                render_pin_prompt(f, f.area(), prompt, &app.config);
            }
        }
        Mode::ConfirmDelete => {
            let subject = delete_subject(app);
            let dialog = ConfirmDialog {
                title: "Delete Note",
                message: "Delete this note? This cannot be undone.",
                subject: &subject,
                confirm_label: "Delete",
            };
            render_confirm(f, f.area(), &dialog, app.modals.selection, &app.config);
        }
        Mode::ConfirmClearAll => {
            let subject = format!("{} notes will be removed", app.notes.len());
            let dialog = ConfirmDialog {
                title: "Clear All Notes",
                message: "Delete every note? This cannot be undone.",
                subject: &subject,
                confirm_label: "Delete all",
            };
            render_confirm(f, f.area(), &dialog, app.modals.selection, &app.config);
        }
        Mode::View | Mode::Search => {}
    }

    let key_hints = get_key_hints(app);
    render_status_bar(f, layout.status_area, app.status.message.as_ref(), &key_hints, &app.config);
}

fn delete_subject(app: &App) -> String {
    let id = match (&app.editor, &app.modals.delete_target) {
        (Some(editor), _) if app.ui.screen == Screen::Editor => editor.session.note_id().to_string(),
        (_, Some(id)) => id.clone(),
        _ => return String::new(),
    };
    app.notes
        .iter()
        .find(|n| n.id == id)
        .map(|n| n.display_title().to_string())
        .unwrap_or_default()
}

fn get_key_hints(app: &App) -> Vec<String> {
    let kb = &app.config.key_bindings;
    match app.ui.mode {
        Mode::Help => vec![format!("Esc or {}: Exit help", key(&kb.help))],
        Mode::Search => vec![
            "Enter: Keep filter".to_string(),
            "Esc: Clear search".to_string(),
            "↑/↓: Move".to_string(),
        ],
        Mode::PinPrompt => vec!["0-9: Digits".to_string(), "Enter: Confirm".to_string(), "Esc: Cancel".to_string()],
        Mode::AiMenu => vec!["↑/↓ or 1-3: Choose".to_string(), "Enter: Run".to_string(), "Esc: Close".to_string()],
        Mode::ConfirmDelete | Mode::ConfirmClearAll => {
            vec!["↑/↓: Choose".to_string(), "Enter: Confirm".to_string(), "Esc: Cancel".to_string()]
        }
        Mode::View => match app.ui.screen {
            Screen::List => vec![
                format!("{}: Quit", key(&kb.quit)),
                format!("{}: New", key(&kb.new)),
                format!("{}: Open", key(&kb.select)),
                format!("{}: Delete", key(&kb.delete)),
                format!("{}: Search", key(&kb.search)),
                format!("{}/{}: Category", key(&kb.category_left), key(&kb.category_right)),
                format!("{}: {} PIN", key(&kb.set_pin), if app.has_pin() { "Change" } else { "Set" }),
                format!("{}: Export", key(&kb.export)),
                format!("{}: Help", key(&kb.help)),
            ],
            Screen::Editor => {
                let mut hints = vec![
                    "Esc: Back".to_string(),
                    "Tab: Switch field".to_string(),
                    format!("{}: AI", key(&kb.ai_menu)),
                    format!("{}: Pin", key(&kb.toggle_pin)),
                    format!("{}: Lock", key(&kb.toggle_lock)),
                    format!("{}: Color", key(&kb.cycle_color)),
                    format!("{}: Category", key(&kb.cycle_category)),
                ];
                if app.dictation_available() {
                    hints.push(format!("{}: Dictate", key(&kb.dictation)));
                }
                hints.push(format!("{}: Delete", key(&kb.delete_note)));
                hints.push(format!("{}: Help", key(&kb.help)));
                hints
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{AiError, AiGateway};
    use crate::database::Database;
    use crate::models::{AiAction, Note};
    use crate::store::NoteStore;
    use crate::Config;
    use ratatui::backend::TestBackend;
    use ratatui::layout::Rect;
    use ratatui::Terminal;
    use std::sync::Arc;

    struct NoAi;

    impl AiGateway for NoAi {
        fn perform(&self, _text: &str, _action: AiAction, _title: Option<&str>) -> Result<String, AiError> {
            Err(AiError::Network("offline".into()))
        }
    }

    fn screen_text(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal
            .draw(|f| {
                let layout = Layout::calculate(Rect::new(0, 0, 80, 24));
                render(f, app, &layout);
            })
            .unwrap();
        terminal.backend().buffer().content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn list_and_editor_screens_render() {
        let db = Database::open_in_memory().unwrap();
        let mut note = Note::new();
        note.title = "Groceries".into();
        note.content = "milk and eggs".into();
        NoteStore::new(&db).save(&[note.clone()]);

        let mut app = App::with_collaborators(Config::default(), db, Arc::new(NoAi), None);
        let list = screen_text(&mut app);
        assert!(list.contains("Groceries"));
        assert!(list.contains("All 1"));

        app.open_editor(note);
        let editor = screen_text(&mut app);
        assert!(editor.contains("milk and eggs"));
        assert!(editor.contains("Edited"));
    }
}
