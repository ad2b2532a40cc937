use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph, StatefulWidget, Scrollbar, ScrollbarState, ScrollbarOrientation};
use ratatui::style::{Modifier, Style};
use ratatui::Frame;
use ratatui::layout::{Rect, Layout, Direction, Constraint, Alignment};
use ratatui::widgets::ListState;
use ratatui::text::{Line, Span};
use crate::models::Note;
use crate::Config;
use crate::tui::widgets::color::{parse_color, get_contrast_text_color, note_color};
use crate::utils;

const LINES_PER_NOTE: usize = 2;

/// Two-line cards: markers, title, category and date, then a content preview.
pub fn render_note_list(
    f: &mut Frame,
    area: Rect,
    notes: &[Note],
    total_count: usize,
    search_query: Option<&str>,
    list_state: &mut ListState,
    config: &Config,
) {
    let active_theme = config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let highlight_bg = parse_color(&active_theme.highlight_bg);
    let highlight_fg = if active_theme.highlight_fg.is_empty() {
        get_contrast_text_color(highlight_bg)
    } else {
        parse_color(&active_theme.highlight_fg)
    };

    let title = match search_query {
        Some(query) => format!("Search: {} ({} of {})", query, notes.len(), total_count),
        None => format!("Notes ({} of {})", notes.len(), total_count),
    };
    let block = Block::default().borders(Borders::ALL).title(title);

    if notes.is_empty() {
        let hint = if total_count == 0 {
            format!("No notes yet. Press {} to write one.", utils::format_key_binding_for_display(&config.key_bindings.new))
        } else {
            "No notes match".to_string()
        };
        let paragraph = Paragraph::new(hint)
            .block(block)
            .style(Style::default().fg(fg_color))
            .alignment(Alignment::Center);
        f.render_widget(paragraph, area);
        return;
    }

    // Split area to reserve space for scrollbar
    let list_areas = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);
    let list_area = list_areas[0];
    let scrollbar_area = list_areas[1];

    // 2 for borders, 2 for padding
    let max_width = list_area.width.saturating_sub(4) as usize;
    let items: Vec<ListItem> = notes.iter().map(|note| note_item(note, max_width)).collect();

    let list = List::new(items)
        .block(block)
        .style(Style::default().fg(fg_color))
        .highlight_style(Style::default().fg(highlight_fg).bg(highlight_bg));

    StatefulWidget::render(list, list_area, f.buffer_mut(), list_state);

    let list_inner_height = list_area.height.saturating_sub(2) as usize;
    let visible_items = list_inner_height / LINES_PER_NOTE;

    if notes.len() > visible_items && visible_items > 0 && scrollbar_area.width > 0 {
        let scrollbar_inner_area = Rect::new(
            scrollbar_area.x,
            list_area.y + 1,
            scrollbar_area.width,
            list_area.height.saturating_sub(2),
        );

        let selected_index = list_state.selected().unwrap_or(0);
        let scroll_position = selected_index.saturating_sub(visible_items - 1);
        let mut scrollbar_state = ScrollbarState::new(notes.len())
            .viewport_content_length(visible_items)
            .position(scroll_position);

        let scrollbar = Scrollbar::default()
            .orientation(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"))
            .track_symbol(Some("│"))
            .thumb_symbol("█");

        f.render_stateful_widget(scrollbar, scrollbar_inner_area, &mut scrollbar_state);
    }
}

fn note_item(note: &Note, max_width: usize) -> ListItem<'static> {
    let swatch = match note_color(note.color) {
        Some(color) => Span::styled("▌", Style::default().fg(color)),
        None => Span::raw(" "),
    };
    let pin = if note.is_pinned { "★ " } else { "" };
    let lock = if note.is_locked { "[locked] " } else { "" };
    let meta = format!("  {} · {}", note.category.label(), utils::format_date(note.updated_at));

    let title_room = max_width.saturating_sub(2 + pin.chars().count() + lock.chars().count() + meta.chars().count());
    let title = utils::truncate_chars(note.display_title(), title_room.max(4));

    let first_line = Line::from(vec![
        swatch.clone(),
        Span::raw(" "),
        Span::raw(pin),
        Span::raw(lock),
        Span::styled(title, Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(meta, Style::default().add_modifier(Modifier::DIM)),
    ]);

    let preview = if note.is_locked {
        "Content hidden".to_string()
    } else {
        let first = note.content.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
        utils::truncate_chars(first.trim(), max_width.saturating_sub(2))
    };
    let second_line = Line::from(vec![
        swatch,
        Span::raw(" "),
        Span::styled(preview, Style::default().add_modifier(Modifier::DIM)),
    ]);

    ListItem::new(vec![first_line, second_line])
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn rendered(notes: &[Note]) -> String {
        let backend = TestBackend::new(60, 10);
        let mut terminal = Terminal::new(backend).unwrap();
        let config = Config::default();
        let mut state = ListState::default();
        state.select(Some(0));
        terminal
            .draw(|f| render_note_list(f, f.area(), notes, notes.len(), None, &mut state, &config))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn locked_notes_hide_content() {
        let mut note = Note::new();
        note.title = "Bank".into();
        note.content = "account 1234".into();
        note.is_locked = true;
        let screen = rendered(&[note]);
        assert!(screen.contains("Bank"));
        assert!(screen.contains("Content hidden"));
        assert!(!screen.contains("account"));
    }

    #[test]
    fn untitled_notes_show_placeholder() {
        let mut note = Note::new();
        note.content = "groceries".into();
        let screen = rendered(&[note]);
        assert!(screen.contains("Untitled"));
        assert!(screen.contains("groceries"));
    }
}
