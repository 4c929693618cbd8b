use crate::session::{Outcome, Session};

pub struct App {
    pub session: Session,
    pub input: String,
    pub cursor_position: usize,
    pub input_scroll: usize,
    pub cursor_history: usize,
    pub should_quit: bool,
    pub show_help: bool,
    pub help_scroll: usize,
    pub list_height: usize,
    pub item_start_indices: Vec<usize>,
    pub history_scroll: usize,
    pub scroll_to_bottom: bool,
}

impl App {
    pub fn new(session: Session) -> Self {
        App {
            session,
            input: String::new(),
            cursor_position: 0,
            input_scroll: 0,
            cursor_history: 0,
            should_quit: false,
            show_help: false,
            help_scroll: 0,
            list_height: 5,
            item_start_indices: Vec::new(),
            history_scroll: 0,
            scroll_to_bottom: false,
        }
    }

    pub fn adjust_input_scroll(&mut self, visible_width: usize) {
        let total_chars = self.input.chars().count();
        let cursor_pos = self.cursor_position;

        if cursor_pos < self.input_scroll {
            self.input_scroll = cursor_pos;
        } else if cursor_pos >= self.input_scroll + visible_width {
            self.input_scroll = cursor_pos - visible_width + 1;
        }

        if self.input_scroll > total_chars.saturating_sub(visible_width) {
            self.input_scroll = total_chars.saturating_sub(visible_width);
        }
    }

    pub fn submit(&mut self) {
        match self.session.submit(&self.input) {
            Outcome::Ignored => return,
            Outcome::Quit => {
                self.should_quit = true;
                return;
            }
            Outcome::Cleared => {
                self.cursor_history = 0;
                self.history_scroll = 0;
            }
            Outcome::Help => {
                self.show_help = true;
                self.help_scroll = 0;
            }
            Outcome::Evaluated => {
                self.cursor_history = self.session.history.len().saturating_sub(1);
                self.scroll_to_bottom = true;
            }
        }
        self.clear_input();
    }

    pub fn insert_char(&mut self, c: char) {
        let byte_idx = Self::char_index_to_byte_index(&self.input, self.cursor_position);
        self.input.insert(byte_idx, c);
        self.cursor_position += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
            self.delete_at_cursor();
        }
    }

    pub fn delete_at_cursor(&mut self) {
        let byte_idx = Self::char_index_to_byte_index(&self.input, self.cursor_position);
        if let Some(c) = self.input[byte_idx..].chars().next() {
            self.input.drain(byte_idx..byte_idx + c.len_utf8());
        }
    }

    pub fn move_cursor(&mut self, direction: i32) {
        match direction {
            -1 => self.cursor_position = self.cursor_position.saturating_sub(1),
            1 => self.cursor_position = (self.cursor_position + 1).min(self.input.chars().count()),
            _ => {}
        }
    }

    pub fn move_cursor_by_words(&mut self, direction: i32) {
        let input_chars: Vec<char> = self.input.chars().collect();
        let mut pos = self.cursor_position;

        if direction < 0 {
            while pos > 0 && input_chars[pos - 1].is_whitespace() {
                pos -= 1;
            }
            while pos > 0 && !input_chars[pos - 1].is_whitespace() {
                pos -= 1;
            }
        } else {
            let len = input_chars.len();
            while pos < len && !input_chars[pos].is_whitespace() {
                pos += 1;
            }
            while pos < len && input_chars[pos].is_whitespace() {
                pos += 1;
            }
        }

        self.cursor_position = pos;
    }

    pub fn navigate_history(&mut self, direction: i32) {
        let history = &self.session.history;
        if direction < 0 && self.cursor_history > 0 {
            self.cursor_history -= 1;
        } else if direction > 0 && self.cursor_history < history.len().saturating_sub(1) {
            self.cursor_history += 1;
        }

        match history.get(self.cursor_history) {
            Some(entry) => self.input = entry.input.clone(),
            None => self.input.clear(),
        }
        self.cursor_position = self.input.chars().count();
        self.input_scroll = 0;
        self.scroll_to_bottom = false;
    }

    pub fn scroll_history(&mut self, direction: i32) {
        let history = &self.session.history;
        let step = self.list_height.saturating_sub(1);
        if direction < 0 {
            self.cursor_history = self.cursor_history.saturating_sub(step);
        } else {
            self.cursor_history = self
                .cursor_history
                .saturating_add(step)
                .min(history.len().saturating_sub(1));
        }

        if let Some(entry) = history.get(self.cursor_history) {
            self.input = entry.input.clone();
        }
        self.cursor_position = self.input.chars().count();
        self.input_scroll = 0;
        self.scroll_to_bottom = false;
    }

    pub fn clear_input(&mut self) {
        self.input.clear();
        self.cursor_position = 0;
        self.input_scroll = 0;
    }

    pub fn char_index_to_byte_index(s: &str, char_index: usize) -> usize {
        s.char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or_else(|| s.len())
    }
}
