use ratatui::style::Color;

use crate::models::NoteColor;

/// Parse a color string into a ratatui Color
/// Supports:
/// - Named colors: black, red, green, yellow, blue, magenta, cyan, white, gray/grey
/// - Extended named colors: darkgray, lightred, lightgreen, lightyellow, lightblue, lightmagenta, lightcyan
/// - Hex format: #RRGGBB or #RGB (short form)
/// - RGB format: rgb(255,0,0) or rgb(255, 0, 0)
/// Returns Color::White for unrecognized colors
pub fn parse_color(color_str: &str) -> Color {
    let s = color_str.trim().to_lowercase();

    match s.as_str() {
        "black" => Color::Black,
        "red" => Color::Red,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "blue" => Color::Blue,
        "magenta" => Color::Magenta,
        "cyan" => Color::Cyan,
        "white" => Color::White,
        "gray" | "grey" | "lightgray" | "lightgrey" => Color::Gray,
        "darkgray" | "darkgrey" => Color::DarkGray,
        "lightred" => Color::LightRed,
        "lightgreen" => Color::LightGreen,
        "lightyellow" => Color::LightYellow,
        "lightblue" => Color::LightBlue,
        "lightmagenta" => Color::LightMagenta,
        "lightcyan" => Color::LightCyan,
        _ => {
            if s.starts_with('#') {
                if let Some(color) = parse_hex_color(&s) {
                    return color;
                }
            } else if s.starts_with("rgb(") {
                if let Some(color) = parse_rgb_color(&s) {
                    return color;
                }
            }
            Color::White
        }
    }
}

/// Parse hex color format (#RRGGBB or #RGB)
fn parse_hex_color(s: &str) -> Option<Color> {
    let hex = s.trim_start_matches('#');

    if hex.len() == 6 {
        let r = u8::from_str_radix(hex.get(0..2)?, 16).ok()?;
        let g = u8::from_str_radix(hex.get(2..4)?, 16).ok()?;
        let b = u8::from_str_radix(hex.get(4..6)?, 16).ok()?;
        Some(Color::Rgb(r, g, b))
    } else if hex.len() == 3 {
        let r = u8::from_str_radix(hex.get(0..1)?, 16).ok()?;
        let g = u8::from_str_radix(hex.get(1..2)?, 16).ok()?;
        let b = u8::from_str_radix(hex.get(2..3)?, 16).ok()?;
        // 0xF -> 0xFF
        Some(Color::Rgb((r << 4) | r, (g << 4) | g, (b << 4) | b))
    } else {
        None
    }
}

/// Parse rgb(r,g,b)
fn parse_rgb_color(s: &str) -> Option<Color> {
    let content = s.strip_prefix("rgb(")?.strip_suffix(')')?;
    let parts: Vec<&str> = content.split(',').map(|s| s.trim()).collect();
    if parts.len() != 3 {
        return None;
    }
    let r = parts[0].parse::<u8>().ok()?;
    let g = parts[1].parse::<u8>().ok()?;
    let b = parts[2].parse::<u8>().ok()?;
    Some(Color::Rgb(r, g, b))
}

/// Format a Color back to string for display
pub fn format_color_for_display(color: &Color) -> String {
    match color {
        Color::Black => "black".to_string(),
        Color::Red => "red".to_string(),
        Color::Green => "green".to_string(),
        Color::Yellow => "yellow".to_string(),
        Color::Blue => "blue".to_string(),
        Color::Magenta => "magenta".to_string(),
        Color::Cyan => "cyan".to_string(),
        Color::White => "white".to_string(),
        Color::Gray => "gray".to_string(),
        Color::DarkGray => "darkgray".to_string(),
        Color::LightRed => "lightred".to_string(),
        Color::LightGreen => "lightgreen".to_string(),
        Color::LightYellow => "lightyellow".to_string(),
        Color::LightBlue => "lightblue".to_string(),
        Color::LightMagenta => "lightmagenta".to_string(),
        Color::LightCyan => "lightcyan".to_string(),
        Color::Rgb(r, g, b) => format!("#{:02X}{:02X}{:02X}", r, g, b),
        Color::Indexed(_) => "indexed".to_string(),
        Color::Reset => "reset".to_string(),
    }
}

/// Terminal color for a note's swatch. The default color has none.
pub fn note_color(color: NoteColor) -> Option<Color> {
    match color {
        NoteColor::Default => None,
        NoteColor::Red => Some(Color::Rgb(0xF8, 0x71, 0x71)),
        NoteColor::Orange => Some(Color::Rgb(0xFB, 0x92, 0x3C)),
        NoteColor::Yellow => Some(Color::Rgb(0xFA, 0xCC, 0x15)),
        NoteColor::Green => Some(Color::Rgb(0x4A, 0xDE, 0x80)),
        NoteColor::Cyan => Some(Color::Rgb(0x22, 0xD3, 0xEE)),
        NoteColor::Blue => Some(Color::Rgb(0x60, 0xA5, 0xFA)),
        NoteColor::Purple => Some(Color::Rgb(0xC0, 0x84, 0xFC)),
        NoteColor::Pink => Some(Color::Rgb(0xF4, 0x72, 0xB6)),
    }
}

/// Relative luminance (WCAG), 0.0 dark to 1.0 light
fn calculate_luminance(color: Color) -> f64 {
    let (r, g, b) = match color {
        Color::Rgb(r, g, b) => (r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0),
        Color::Black => (0.0, 0.0, 0.0),
        Color::White => (1.0, 1.0, 1.0),
        Color::DarkGray => (0.25, 0.25, 0.25),
        _ => (0.5, 0.5, 0.5),
    };

    let linear = |c: f64| {
        if c <= 0.03928 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };

    0.2126 * linear(r) + 0.7152 * linear(g) + 0.0722 * linear(b)
}

/// Named colors that most terminals render dark
fn is_dark_color(color: Color) -> bool {
    matches!(
        color,
        Color::Black | Color::Blue | Color::Magenta | Color::Red | Color::DarkGray
    )
}

/// Black or white text, whichever reads better on `background`
pub fn get_contrast_text_color(background: Color) -> Color {
    let dark = if matches!(background, Color::Rgb(_, _, _)) {
        calculate_luminance(background) < 0.5
    } else {
        is_dark_color(background)
    };
    if dark { Color::White } else { Color::Black }
}
