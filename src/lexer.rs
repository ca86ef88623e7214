//! Splitting of a raw input line into words, honoring shell-style quoting.
//!
//! Rules:
//! - Outside quotes, whitespace separates words and a backslash takes the next
//!   character literally.
//! - Inside single quotes every character is literal.
//! - Inside double quotes a backslash only escapes `"` and `\`; before any other
//!   character both the backslash and the character are kept.
//!
//! The lexer never fails. An unterminated quote or a trailing backslash simply
//! ends the line, and whatever was accumulated is still emitted as a word.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexingState {
    Unquoted,
    SingleQuote,
    DoubleQuote,
}

struct LexingFSM {
    input: Vec<char>,
    pos: usize,
    state: LexingState,
    buffer: String,
    words: Vec<String>,
}

impl LexingFSM {
    fn new(line: &str) -> Self {
        LexingFSM {
            input: line.chars().collect(),
            pos: 0,
            state: LexingState::Unquoted,
            buffer: String::new(),
            words: Vec::new(),
        }
    }

    fn make_words(mut self) -> Vec<String> {
        while let Some(ch) = self.read_char() {
            match self.state {
                LexingState::Unquoted => self.handle_unquoted(ch),
                LexingState::SingleQuote => self.handle_single_quote(ch),
                LexingState::DoubleQuote => self.handle_double_quote(ch),
            }
        }

        // Unterminated quotes are tolerated.
        self.finish_word();
        self.words
    }

    fn read_char(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn handle_unquoted(&mut self, ch: char) {
        match ch {
            '\\' => {
                // A lone trailing backslash is dropped.
                if let Some(next) = self.read_char() {
                    self.buffer.push(next);
                }
            }
            '\'' => self.state = LexingState::SingleQuote,
            '"' => self.state = LexingState::DoubleQuote,
            c if c.is_whitespace() => self.finish_word(),
            c => self.buffer.push(c),
        }
    }

    fn handle_single_quote(&mut self, ch: char) {
        match ch {
            '\'' => self.state = LexingState::Unquoted,
            c => self.buffer.push(c),
        }
    }

    fn handle_double_quote(&mut self, ch: char) {
        match ch {
            '"' => self.state = LexingState::Unquoted,
            '\\' => match self.peek_char() {
                Some(next @ ('"' | '\\')) => {
                    self.read_char();
                    self.buffer.push(next);
                }
                _ => self.buffer.push('\\'),
            },
            c => self.buffer.push(c),
        }
    }

    fn finish_word(&mut self) {
        if !self.buffer.is_empty() {
            self.words.push(std::mem::take(&mut self.buffer));
        }
    }
}

/// Split `line` into decoded words.
///
/// Quote and escape characters are consumed; zero-length words are never
/// produced, so an empty or all-blank line yields an empty vector.
pub fn tokenize(line: &str) -> Vec<String> {
    LexingFSM::new(line).make_words()
}
