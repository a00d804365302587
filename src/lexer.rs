use thiserror::Error;

use crate::ast::Signal;

const PARSING_WINDOW: usize = 10;
const CONTEXT_WINDOW: usize = 50;

/// A fatal compile error, anchored to the byte where scanning failed.
///
/// Carries two excerpts of the expression around the failure: a narrow
/// `parsing` window (±10 bytes) and a wider `context` window (±50 bytes).
/// `column` is the failure offset inside the `parsing` window.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "{operation}: {message}, error found in #{column} byte of ...|{parsing}|..., bigger context ...|{context}|..."
)]
pub struct CompileError {
    pub operation: &'static str,
    pub message: String,
    pub offset: usize,
    pub column: usize,
    pub parsing: String,
    pub context: String,
}

/// Byte cursor over an expression.
///
/// Whitespace (space, tab, CR, LF) is insignificant between tokens and is
/// skipped by [`next_token`](Lexer::next_token) and the peek methods.
pub struct Lexer<'a> {
    input: &'a [u8],
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Lexer { input, position: 0 }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn set_position(&mut self, position: usize) {
        self.position = position.min(self.input.len());
    }

    fn is_whitespace(byte: u8) -> bool {
        matches!(byte, b' ' | b'\t' | b'\r' | b'\n')
    }

    fn significant_from(&self, from: usize) -> Option<usize> {
        (from..self.input.len()).find(|&i| !Self::is_whitespace(self.input[i]))
    }

    /// Moves the cursor onto the next significant byte without consuming it.
    pub fn skip_whitespace(&mut self) {
        self.position = self
            .significant_from(self.position)
            .unwrap_or(self.input.len());
    }

    /// Consumes and returns the next significant byte, or `None` at the end.
    pub fn next_token(&mut self) -> Option<u8> {
        let index = self.significant_from(self.position)?;
        self.position = index + 1;
        Some(self.input[index])
    }

    /// Steps back over the byte returned by the last `next_token`.
    pub fn unread(&mut self) {
        self.position = self.position.saturating_sub(1);
    }

    /// Returns the next significant byte without consuming it.
    pub fn peek_byte(&self) -> Option<u8> {
        self.significant_from(self.position).map(|i| self.input[i])
    }

    /// Classifies the next significant byte without consuming it.
    pub fn peek_signal(&self) -> Signal {
        Signal::of_opt(self.peek_byte())
    }

    /// Reads a run of name bytes starting exactly at the cursor.
    pub fn read_name(&mut self) -> &'a str {
        let start = self.position;
        while self.position < self.input.len()
            && Signal::of(self.input[self.position]) == Signal::Name
        {
            self.position += 1;
        }
        // name bytes are ASCII
        std::str::from_utf8(&self.input[start..self.position]).unwrap_or_default()
    }

    /// Returns the raw byte at the cursor, if any.
    pub fn current(&self) -> Option<u8> {
        self.input.get(self.position).copied()
    }

    /// Reads everything up to (not including) `delimiter` and consumes the
    /// delimiter. Returns `None` when the delimiter never appears.
    pub fn read_until(&mut self, delimiter: u8) -> Option<&'a [u8]> {
        let rest = &self.input[self.position..];
        let length = rest.iter().position(|&b| b == delimiter)?;
        self.position += length + 1;
        Some(&rest[..length])
    }

    fn window(&self, radius: usize) -> (usize, String) {
        let start = self.position.saturating_sub(radius);
        let end = (self.position + radius).min(self.input.len());
        let text = String::from_utf8_lossy(&self.input[start..end]).into_owned();
        (self.position - start, text)
    }

    /// Builds an error anchored at the current cursor position.
    pub fn error(&self, operation: &'static str, message: impl Into<String>) -> CompileError {
        let (column, parsing) = self.window(PARSING_WINDOW);
        let (_, context) = self.window(CONTEXT_WINDOW);
        CompileError {
            operation,
            message: message.into(),
            offset: self.position,
            column,
            parsing,
            context,
        }
    }

    /// An expected byte was not found.
    pub fn mismatch(&self, operation: &'static str, expected: u8, found: Option<u8>) -> CompileError {
        match found {
            Some(found) => self.error(
                operation,
                format!(
                    "expected \"{}\" character, but \"{}\" appears",
                    expected as char,
                    display_byte(found)
                ),
            ),
            None => self.error(
                operation,
                format!(
                    "expected \"{}\" character, but the expression ended",
                    expected as char
                ),
            ),
        }
    }

    /// A byte appeared where no construct can start.
    pub fn unexpected(&self, operation: &'static str, found: Option<u8>) -> CompileError {
        match found {
            Some(found) => self.error(
                operation,
                format!("unexpected character \"{}\"", display_byte(found)),
            ),
            None => self.error(operation, "unexpected end of expression"),
        }
    }
}

fn display_byte(byte: u8) -> String {
    if byte.is_ascii() {
        (byte as char).to_string()
    } else {
        format!("\\x{:02x}", byte)
    }
}

#[test]
fn test_next_token_skips_whitespace() {
    let mut lexer = Lexer::new(b" \t\r\n{ a\n}");
    assert_eq!(lexer.next_token(), Some(b'{'));
    assert_eq!(lexer.next_token(), Some(b'a'));
    assert_eq!(lexer.next_token(), Some(b'}'));
    assert_eq!(lexer.next_token(), None);
}

#[test]
fn test_peek_does_not_consume() {
    let mut lexer = Lexer::new(b"   [x]");
    assert_eq!(lexer.peek_byte(), Some(b'['));
    assert_eq!(lexer.peek_signal(), Signal::Array);
    assert_eq!(lexer.next_token(), Some(b'['));
    lexer.unread();
    assert_eq!(lexer.next_token(), Some(b'['));
}
