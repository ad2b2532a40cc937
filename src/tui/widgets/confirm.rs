use ratatui::widgets::{Block, Borders, Paragraph, Clear, Wrap};
use ratatui::style::Style;
use ratatui::Frame;
use ratatui::layout::{Rect, Alignment};
use ratatui::text::{Line, Span};
use crate::Config;
use crate::tui::widgets::color::{parse_color, get_contrast_text_color};
use crate::tui::widgets::popup_area;

pub struct ConfirmDialog<'a> {
    pub title: &'a str,
    pub message: &'a str,
    /// Name of the thing affected; may be empty
    pub subject: &'a str,
    pub confirm_label: &'a str,
}

/// Two-option confirmation dialog. Selection 0 is the destructive action.
pub fn render_confirm(f: &mut Frame, area: Rect, dialog: &ConfirmDialog<'_>, selection: usize, config: &Config) {
    let active_theme = config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let bg_color = parse_color(&active_theme.bg);
    let highlight_bg = parse_color(&active_theme.highlight_bg);
    let highlight_fg = get_contrast_text_color(highlight_bg);

    let popup_area = popup_area(area, 50, 40);
    f.render_widget(Clear, popup_area);

    let mut all_lines = vec![
        Line::from(Span::styled(dialog.message.to_string(), Style::default().fg(fg_color).bg(bg_color))),
        Line::from(""),
    ];
    if !dialog.subject.is_empty() {
        all_lines.push(Line::from(Span::styled(dialog.subject.to_string(), Style::default().fg(fg_color).bg(bg_color))));
        all_lines.push(Line::from(""));
    }

    for (index, option) in [dialog.confirm_label, "Cancel"].iter().enumerate() {
        let is_selected = index == selection;
        let prefix = if is_selected { "> " } else { "  " };
        let style = if is_selected {
            Style::default().fg(highlight_fg).bg(highlight_bg)
        } else {
            Style::default().fg(fg_color).bg(bg_color)
        };
        all_lines.push(Line::from(Span::styled(format!("{}{}", prefix, option), style)));
    }

    all_lines.push(Line::from(""));
    all_lines.push(Line::from(Span::styled(
        "Use ↑↓ to navigate, Enter to confirm, Esc to cancel",
        Style::default().fg(fg_color).bg(bg_color)
    )));

    let paragraph = Paragraph::new(all_lines)
        .block(Block::default()
            .borders(Borders::ALL)
            .title(dialog.title.to_string())
            .title_alignment(Alignment::Center)
            .style(Style::default().fg(fg_color).bg(bg_color)))
        .style(Style::default().fg(fg_color).bg(bg_color))
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Center);

    f.render_widget(paragraph, popup_area);
}
