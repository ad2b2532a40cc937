use ratatui::widgets::{Block, Borders, Paragraph, Clear, Wrap};
use ratatui::style::Style;
use ratatui::Frame;
use ratatui::layout::{Rect, Alignment};
use crate::Config;
use crate::tui::widgets::color::parse_color;
use crate::tui::widgets::popup_area;
use crate::utils::format_key_binding_for_display as key;

pub fn render_help(f: &mut Frame, area: Rect, config: &Config) {
    let active_theme = config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let bg_color = parse_color(&active_theme.bg);

    let popup_area = popup_area(area, 60, 80);
    f.render_widget(Clear, popup_area);

    let paragraph = Paragraph::new(build_help_text(config))
        .block(Block::default()
            .borders(Borders::ALL)
            .title("Help - Key Bindings")
            .title_alignment(Alignment::Center)
            .style(Style::default().fg(fg_color).bg(bg_color)))
        .style(Style::default().fg(fg_color).bg(bg_color))
        .wrap(Wrap { trim: false });

    f.render_widget(paragraph, popup_area);
}

fn build_help_text(config: &Config) -> String {
    let kb = &config.key_bindings;
    let mut text = String::new();

    text.push_str("Notes:\n");
    text.push_str(&format!("  {} / {} (or ↑/↓): Move selection\n", key(&kb.list_up), key(&kb.list_down)));
    text.push_str(&format!("  {} / {}: Switch category\n", key(&kb.category_left), key(&kb.category_right)));
    text.push_str(&format!("  {}: Open note (locked notes ask for the PIN)\n", key(&kb.select)));
    text.push_str(&format!("  {}: New note\n", key(&kb.new)));
    text.push_str(&format!("  {}: Delete note\n", key(&kb.delete)));
    text.push_str(&format!("  {}: Search titles and content\n", key(&kb.search)));
    text.push('\n');

    text.push_str("Settings:\n");
    text.push_str(&format!("  {}: Set or change the master PIN\n", key(&kb.set_pin)));
    text.push_str(&format!("  {}: Export a JSON backup\n", key(&kb.export)));
    text.push_str(&format!("  {}: Clear all notes\n", key(&kb.clear_all)));
    text.push('\n');

    text.push_str("Editor:\n");
    text.push_str("  Tab: Switch between title and note\n");
    text.push_str(&format!("  {}: Save now\n", key(&kb.save)));
    text.push_str(&format!("  {}: Pin / unpin\n", key(&kb.toggle_pin)));
    text.push_str(&format!("  {}: Lock / unlock (needs a PIN)\n", key(&kb.toggle_lock)));
    text.push_str(&format!("  {}: Next color\n", key(&kb.cycle_color)));
    text.push_str(&format!("  {}: Next category\n", key(&kb.cycle_category)));
    text.push_str(&format!("  {}: AI assistant\n", key(&kb.ai_menu)));
    text.push_str(&format!("  {}: Start / stop dictation\n", key(&kb.dictation)));
    text.push_str(&format!("  {}: Delete note\n", key(&kb.delete_note)));
    text.push_str("  Esc: Save and go back\n");
    text.push('\n');

    text.push_str("General:\n");
    text.push_str(&format!("  {}: Quit\n", key(&kb.quit)));
    text.push_str(&format!("  {}: Show/hide help\n", key(&kb.help)));

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn help_follows_configured_bindings() {
        let mut config = Config::default();
        config.key_bindings.new = "a".to_string();
        let text = build_help_text(&config);
        assert!(text.contains("  a: New note"));
    }
}
