use ratatui::layout::Rect;
use std::cmp;

/// Multi-line text buffer with a cursor, used for the note title and body.
///
/// Columns are counted in chars, not bytes.
#[derive(Debug, Clone)]
pub struct TextInput {
    pub lines: Vec<String>,
    pub cursor_line: usize,
    pub cursor_col: usize,
    pub scroll_offset: usize, // first visible line
    pub scroll_col: usize,    // first visible column
    single_line: bool,
}

impl TextInput {
    /// Buffer holding `content`, cursor at the very end.
    pub fn from_string(content: &str) -> Self {
        // split keeps trailing empty lines, so text survives a round trip
        let lines: Vec<String> = content.split('\n').map(str::to_string).collect();
        let cursor_line = lines.len().saturating_sub(1);
        let cursor_col = lines.last().map(|l| l.chars().count()).unwrap_or(0);
        Self {
            lines,
            cursor_line,
            cursor_col,
            scroll_offset: 0,
            scroll_col: 0,
            single_line: false,
        }
    }

    /// Buffer that ignores newlines (titles).
    pub fn single_line(content: &str) -> Self {
        let mut input = Self::from_string(&content.replace('\n', " "));
        input.single_line = true;
        input
    }

    fn current_line_len(&self) -> usize {
        self.lines.get(self.cursor_line).map(|l| l.chars().count()).unwrap_or(0)
    }

    fn ensure_cursor_valid(&mut self) {
        if self.lines.is_empty() {
            self.lines.push(String::new());
        }
        if self.cursor_line >= self.lines.len() {
            self.cursor_line = self.lines.len() - 1;
        }
        self.cursor_col = cmp::min(self.cursor_col, self.current_line_len());
    }

    pub fn insert_char(&mut self, ch: char) {
        if ch == '\n' {
            self.insert_newline();
            return;
        }
        self.ensure_cursor_valid();
        let col = self.cursor_col;
        let line = &mut self.lines[self.cursor_line];
        let byte_idx = char_to_byte(line, col);
        line.insert(byte_idx, ch);
        self.cursor_col += 1;
    }

    pub fn insert_newline(&mut self) {
        if self.single_line {
            return;
        }
        self.ensure_cursor_valid();
        let col = self.cursor_col;
        let line = &mut self.lines[self.cursor_line];
        let byte_idx = char_to_byte(line, col);
        let remainder = line.split_off(byte_idx);
        self.lines.insert(self.cursor_line + 1, remainder);
        self.cursor_line += 1;
        self.cursor_col = 0;
    }

    /// Backspace: remove the char before the cursor, joining lines at column 0.
    pub fn delete_char(&mut self) {
        self.ensure_cursor_valid();
        if self.cursor_col > 0 {
            let col = self.cursor_col - 1;
            let line = &mut self.lines[self.cursor_line];
            let byte_idx = char_to_byte(line, col);
            line.remove(byte_idx);
            self.cursor_col = col;
        } else if self.cursor_line > 0 {
            let current = self.lines.remove(self.cursor_line);
            self.cursor_line -= 1;
            self.cursor_col = self.current_line_len();
            self.lines[self.cursor_line].push_str(&current);
        }
    }

    /// Delete key: remove the char under the cursor, joining the next line at the end.
    pub fn delete_forward(&mut self) {
        self.ensure_cursor_valid();
        if self.cursor_col < self.current_line_len() {
            let col = self.cursor_col;
            let line = &mut self.lines[self.cursor_line];
            let byte_idx = char_to_byte(line, col);
            line.remove(byte_idx);
        } else if self.cursor_line + 1 < self.lines.len() {
            let next = self.lines.remove(self.cursor_line + 1);
            self.lines[self.cursor_line].push_str(&next);
        }
    }

    pub fn move_cursor_up(&mut self) {
        if self.cursor_line > 0 {
            self.cursor_line -= 1;
            self.cursor_col = cmp::min(self.cursor_col, self.current_line_len());
        }
    }

    pub fn move_cursor_down(&mut self) {
        if self.cursor_line + 1 < self.lines.len() {
            self.cursor_line += 1;
            self.cursor_col = cmp::min(self.cursor_col, self.current_line_len());
        }
    }

    pub fn move_cursor_left(&mut self) {
        if self.cursor_col > 0 {
            self.cursor_col -= 1;
        } else if self.cursor_line > 0 {
            self.cursor_line -= 1;
            self.cursor_col = self.current_line_len();
        }
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor_col < self.current_line_len() {
            self.cursor_col += 1;
        } else if self.cursor_line + 1 < self.lines.len() {
            self.cursor_line += 1;
            self.cursor_col = 0;
        }
    }

    pub fn move_cursor_home(&mut self) {
        self.cursor_col = 0;
    }

    pub fn move_cursor_end(&mut self) {
        self.cursor_col = self.current_line_len();
    }

    pub fn move_cursor_word_left(&mut self) {
        if self.cursor_col == 0 {
            self.move_cursor_left();
            return;
        }
        let chars: Vec<char> = match self.lines.get(self.cursor_line) {
            Some(l) => l.chars().collect(),
            None => return,
        };
        let mut pos = cmp::min(self.cursor_col, chars.len());
        while pos > 0 && chars[pos - 1].is_whitespace() {
            pos -= 1;
        }
        if pos > 0 {
            // Words and punctuation runs are separate stops
            let word = is_word_char(chars[pos - 1]);
            while pos > 0 && !chars[pos - 1].is_whitespace() && is_word_char(chars[pos - 1]) == word {
                pos -= 1;
            }
        }
        self.cursor_col = pos;
    }

    pub fn move_cursor_word_right(&mut self) {
        if self.cursor_col >= self.current_line_len() {
            self.move_cursor_right();
            return;
        }
        let chars: Vec<char> = match self.lines.get(self.cursor_line) {
            Some(l) => l.chars().collect(),
            None => return,
        };
        let mut pos = self.cursor_col;
        if pos < chars.len() && !chars[pos].is_whitespace() {
            let word = is_word_char(chars[pos]);
            while pos < chars.len() && !chars[pos].is_whitespace() && is_word_char(chars[pos]) == word {
                pos += 1;
            }
        }
        while pos < chars.len() && chars[pos].is_whitespace() {
            pos += 1;
        }
        self.cursor_col = pos;
    }

    /// Lines inside the viewport, clipped to the horizontal scroll window.
    pub fn visible_lines(&self, viewport_height: usize, viewport_width: usize) -> Vec<String> {
        let start = cmp::min(self.scroll_offset, self.lines.len());
        let end = cmp::min(start + viewport_height, self.lines.len());
        self.lines[start..end]
            .iter()
            .map(|line| line.chars().skip(self.scroll_col).take(viewport_width).collect())
            .collect()
    }

    /// Keep the cursor inside a viewport of the given size.
    pub fn update_scroll(&mut self, viewport_height: usize, viewport_width: usize) {
        if viewport_height > 0 {
            if self.cursor_line < self.scroll_offset {
                self.scroll_offset = self.cursor_line;
            } else if self.cursor_line >= self.scroll_offset + viewport_height {
                self.scroll_offset = self.cursor_line + 1 - viewport_height;
            }
        }
        if viewport_width > 0 {
            if self.cursor_col < self.scroll_col {
                self.scroll_col = self.cursor_col;
            } else if self.cursor_col >= self.scroll_col + viewport_width {
                self.scroll_col = self.cursor_col + 1 - viewport_width;
            }
        }
    }

    /// Terminal position of the cursor inside `inner` (the area without borders).
    pub fn cursor_screen_pos(&self, inner: Rect) -> Option<(u16, u16)> {
        let row = self.cursor_line.checked_sub(self.scroll_offset)?;
        let col = self.cursor_col.checked_sub(self.scroll_col)?;
        if row >= inner.height as usize || col >= inner.width as usize {
            return None;
        }
        Some((inner.x + col as u16, inner.y + row as u16))
    }

    pub fn to_text(&self) -> String {
        self.lines.join("\n")
    }
}

fn char_to_byte(line: &str, col: usize) -> usize {
    line.char_indices().nth(col).map(|(i, _)| i).unwrap_or(line.len())
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}
