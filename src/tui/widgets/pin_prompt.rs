use ratatui::widgets::{Block, Borders, Paragraph, Clear};
use ratatui::style::{Modifier, Style};
use ratatui::Frame;
use ratatui::layout::{Rect, Alignment};
use ratatui::text::{Line, Span};
use crate::Config;
use crate::gate::{PinPrompt, PinPromptMode, MAX_PIN_LEN};
use crate::tui::widgets::color::parse_color;
use crate::tui::widgets::fixed_popup_area;

/// Masked PIN entry: filled dots for typed digits, hollow ones for the rest.
pub fn render_pin_prompt(f: &mut Frame, area: Rect, prompt: &PinPrompt, config: &Config) {
    let active_theme = config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let bg_color = parse_color(&active_theme.bg);
    let highlight_bg = parse_color(&active_theme.highlight_bg);

    let popup_area = fixed_popup_area(area, 40, 9);
    f.render_widget(Clear, popup_area);

    let (title, message) = match prompt.mode {
        PinPromptMode::Set => ("Set Master PIN", "Choose a 4-6 digit PIN"),
        PinPromptMode::Unlock { .. } => ("Unlock Note", "Enter your PIN to open this note"),
    };

    let dots: String = (0..MAX_PIN_LEN)
        .map(|i| if i < prompt.input_len() { "● " } else { "○ " })
        .collect();

    let mut lines = vec![
        Line::from(Span::raw(message)),
        Line::from(""),
        Line::from(Span::styled(dots.trim_end().to_string(), Style::default().fg(highlight_bg).add_modifier(Modifier::BOLD))),
        Line::from(""),
    ];
    match prompt.error() {
        Some(error) => lines.push(Line::from(Span::styled(
            error.to_string(),
            Style::default().fg(ratatui::style::Color::Red).add_modifier(Modifier::BOLD),
        ))),
        None => lines.push(Line::from("Enter: Confirm • Esc: Cancel")),
    }

    let paragraph = Paragraph::new(lines)
        .block(Block::default()
            .borders(Borders::ALL)
            .title(title)
            .title_alignment(Alignment::Center)
            .style(Style::default().fg(fg_color).bg(bg_color)))
        .style(Style::default().fg(fg_color).bg(bg_color))
        .alignment(Alignment::Center);

    f.render_widget(paragraph, popup_area);
}
