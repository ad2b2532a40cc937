use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::style::{Modifier, Style};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use crate::Config;
use crate::tui::app::{EditorField, EditorState};
use crate::tui::widgets::color::{parse_color, get_contrast_text_color, note_color};
use crate::tui::widgets::text_input::TextInput;
use crate::utils;

/// One-line summary of the draft's flags, shown above the fields.
pub fn render_editor_toolbar(f: &mut Frame, area: Rect, editor: &EditorState, config: &Config) {
    let active_theme = config.get_active_theme();
    let tab_bg = parse_color(&active_theme.tab_bg);
    let tab_fg = get_contrast_text_color(tab_bg);
    let highlight_bg = parse_color(&active_theme.highlight_bg);
    let highlight_fg = get_contrast_text_color(highlight_bg);
    let chip = Style::default().fg(tab_fg).bg(tab_bg);
    let active_chip = Style::default().fg(highlight_fg).bg(highlight_bg).add_modifier(Modifier::BOLD);

    let draft = editor.session.draft();
    let mut spans = vec![
        Span::styled(format!(" {} ", draft.category.label()), chip),
        Span::raw(" "),
    ];

    let color_style = match note_color(draft.color) {
        Some(color) => Style::default().fg(get_contrast_text_color(color)).bg(color),
        None => chip,
    };
    spans.push(Span::styled(format!(" {} ", draft.color.name()), color_style));
    spans.push(Span::raw(" "));

    if draft.is_pinned {
        spans.push(Span::styled(" ★ pinned ", active_chip));
        spans.push(Span::raw(" "));
    }
    if draft.is_locked {
        spans.push(Span::styled(" locked ", active_chip));
        spans.push(Span::raw(" "));
    }
    if let Some(action) = editor.session.ai_in_flight() {
        spans.push(Span::styled(format!(" AI: {}... ", action.label()), active_chip));
        spans.push(Span::raw(" "));
    }
    if editor.session.is_listening() {
        spans.push(Span::styled(" ● Listening ", active_chip));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Title field, content field and the "Edited" footer.
pub fn render_note_editor(f: &mut Frame, area: Rect, editor: &mut EditorState, config: &Config) {
    let active_theme = config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let bg_color = parse_color(&active_theme.bg);
    let highlight_bg = parse_color(&active_theme.highlight_bg);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(3),    // Content
            Constraint::Length(1), // Footer
        ])
        .split(area);

    let swatch = note_color(editor.session.draft().color);
    let border_style = |focused: bool| {
        if focused {
            Style::default().fg(highlight_bg)
        } else {
            Style::default().fg(swatch.unwrap_or(fg_color))
        }
    };

    let title_focused = editor.field == EditorField::Title;
    let title_block = Block::default()
        .borders(Borders::ALL)
        .title("Title")
        .border_style(border_style(title_focused));
    let title_inner = title_block.inner(chunks[0]);
    let title_placeholder = if editor.title.to_text().is_empty() && !title_focused { "Untitled" } else { "" };
    render_input(f, chunks[0], title_block, &mut editor.title, title_placeholder, Style::default().fg(fg_color).bg(bg_color));

    let content_focused = editor.field == EditorField::Content;
    let content_block = Block::default()
        .borders(Borders::ALL)
        .title("Note")
        .border_style(border_style(content_focused));
    let content_inner = content_block.inner(chunks[1]);
    render_input(f, chunks[1], content_block, &mut editor.content, "", Style::default().fg(fg_color).bg(bg_color));

    // Interim dictation text sits on the last content row until it is finalized
    if let Some(interim) = editor.session.interim_transcript() {
        if content_inner.height > 0 {
            let row = Rect::new(content_inner.x, content_inner.y + content_inner.height - 1, content_inner.width, 1);
            let text = utils::truncate_chars(&format!("… {}", interim), content_inner.width as usize);
            f.render_widget(
                Paragraph::new(text).style(Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM)),
                row,
            );
        }
    }

    let footer = format!("Edited {}", utils::format_time(editor.session.last_saved_at()));
    let footer = if editor.session.has_unsaved_changes() { format!("{} (unsaved)", footer) } else { footer };
    f.render_widget(
        Paragraph::new(footer).style(Style::default().fg(fg_color).add_modifier(Modifier::DIM)),
        chunks[2],
    );

    let (input, inner) = match editor.field {
        EditorField::Title => (&editor.title, title_inner),
        EditorField::Content => (&editor.content, content_inner),
    };
    if let Some((x, y)) = input.cursor_screen_pos(inner) {
        f.set_cursor_position((x, y));
    }
}

fn render_input(f: &mut Frame, area: Rect, block: Block<'_>, input: &mut TextInput, placeholder: &str, style: Style) {
    let inner = block.inner(area);
    input.update_scroll(inner.height as usize, inner.width as usize);

    let lines: Vec<Line> = if !placeholder.is_empty() {
        vec![Line::from(Span::styled(placeholder.to_string(), Style::default().add_modifier(Modifier::DIM)))]
    } else {
        input
            .visible_lines(inner.height as usize, inner.width as usize)
            .into_iter()
            .map(Line::from)
            .collect()
    };

    f.render_widget(Paragraph::new(lines).block(block).style(style), area);
}
