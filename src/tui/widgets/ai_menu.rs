use ratatui::widgets::{Block, Borders, Paragraph, Clear};
use ratatui::style::Style;
use ratatui::Frame;
use ratatui::layout::{Rect, Alignment};
use ratatui::text::{Line, Span};
use crate::Config;
use crate::models::AiAction;
use crate::tui::widgets::color::{parse_color, get_contrast_text_color};
use crate::tui::widgets::fixed_popup_area;

pub fn render_ai_menu(f: &mut Frame, area: Rect, selection: usize, config: &Config) {
    let active_theme = config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let bg_color = parse_color(&active_theme.bg);
    let highlight_bg = parse_color(&active_theme.highlight_bg);
    let highlight_fg = get_contrast_text_color(highlight_bg);

    let popup_area = fixed_popup_area(area, 32, AiAction::ALL.len() as u16 + 4);
    f.render_widget(Clear, popup_area);

    let mut lines: Vec<Line> = AiAction::ALL
        .iter()
        .enumerate()
        .map(|(index, action)| {
            let is_selected = index == selection;
            let prefix = if is_selected { "> " } else { "  " };
            let style = if is_selected {
                Style::default().fg(highlight_fg).bg(highlight_bg)
            } else {
                Style::default().fg(fg_color).bg(bg_color)
            };
            Line::from(Span::styled(format!("{}{}. {}", prefix, index + 1, action.label()), style))
        })
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from("Enter: Run • Esc: Close"));

    let paragraph = Paragraph::new(lines)
        .block(Block::default()
            .borders(Borders::ALL)
            .title("AI Assistant")
            .title_alignment(Alignment::Center)
            .style(Style::default().fg(fg_color).bg(bg_color)))
        .style(Style::default().fg(fg_color).bg(bg_color));

    f.render_widget(paragraph, popup_area);
}
