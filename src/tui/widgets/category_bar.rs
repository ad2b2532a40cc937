use ratatui::widgets::Tabs;
use ratatui::style::{Style, Modifier};
use ratatui::text::{Line, Span};
use ratatui::Frame;
use ratatui::layout::Rect;
use crate::models::CategoryFilter;
use crate::Config;
use crate::tui::widgets::color::{parse_color, get_contrast_text_color};

/// Category filter boxes, e.g. `  All 12  ` `  Work 3  `
pub fn render_category_bar(
    f: &mut Frame,
    area: Rect,
    current: CategoryFilter,
    counts: &[(CategoryFilter, usize)],
    config: &Config,
) {
    let active_theme = config.get_active_theme();
    let highlight_bg = parse_color(&active_theme.highlight_bg);
    let fg_color = parse_color(&active_theme.fg);
    let bg_color = parse_color(&active_theme.bg);
    let tab_bg = parse_color(&active_theme.tab_bg);
    let tab_fg = get_contrast_text_color(tab_bg);

    let titles: Vec<Line> = counts
        .iter()
        .map(|(filter, count)| {
            Line::from(vec![
                Span::styled(" ", Style::default().bg(tab_bg)),
                Span::styled(format!("{} {}", filter.label(), count), Style::default().fg(tab_fg).bg(tab_bg)),
                Span::styled(" ", Style::default().bg(tab_bg)),
            ])
        })
        .collect();

    let selected = counts.iter().position(|(filter, _)| *filter == current).unwrap_or(0);
    let highlight_fg = get_contrast_text_color(highlight_bg);

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(Style::default().fg(fg_color).bg(bg_color))
        .highlight_style(
            Style::default()
                .fg(highlight_fg)
                .bg(highlight_bg)
                .add_modifier(Modifier::BOLD)
        )
        .divider(" ")
        .padding("", "");

    f.render_widget(tabs, area);
}
