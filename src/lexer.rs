use crate::codec::{self, IntKind, IntegerError};
use crate::parser_error::ParseError;
use crate::token::{Token, TokenKind};

/// On-demand tokenizer for the text format.
///
/// The input is kept as lines of chars so that every token knows its
/// 1-based line and column. The lexer always holds one current token;
/// `next_token` advances, and the `consume_*` methods check the current
/// token against the type the parser expects before advancing.
pub struct Lexer {
    lines: Vec<Vec<char>>,
    /// 0-based scan position.
    line: usize,
    col: usize,
    token: Token,
    /// Position of the most recently consumed token.
    previous: Option<(usize, usize)>,
}

fn is_number_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '+' | '-')
}

impl Lexer {
    /// Creates a lexer over `text`, positioned on its first token.
    pub fn new(text: &str) -> Result<Self, ParseError> {
        Self::from_lines(text.split('\n'))
    }

    /// Creates a lexer over pre-split lines.
    ///
    /// Trailing `\n` / `\r\n` on each line are ignored, so the output of a
    /// line reader can be passed as is.
    pub fn from_lines<I, S>(lines: I) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut lines: Vec<Vec<char>> = lines
            .into_iter()
            .map(|l| {
                let l = l.as_ref();
                let l = l.strip_suffix('\n').unwrap_or(l);
                let l = l.strip_suffix('\r').unwrap_or(l);
                l.chars().collect()
            })
            .collect();
        if lines.is_empty() {
            lines.push(Vec::new());
        }

        let mut lexer = Lexer {
            lines,
            line: 0,
            col: 0,
            token: Token {
                kind: TokenKind::End,
                text: String::new(),
                line: 1,
                column: 1,
            },
            previous: None,
        };
        lexer.scan()?;
        Ok(lexer)
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn at_end(&self) -> bool {
        self.token.is_end()
    }

    /// Advances to the next token.
    pub fn next_token(&mut self) -> Result<(), ParseError> {
        self.previous = Some((self.token.line, self.token.column));
        self.scan()
    }

    /// Error positioned at the current token.
    pub fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(self.token.line, self.token.column, message)
    }

    /// Error positioned at the last consumed token.
    ///
    /// Falls back to the current token when nothing was consumed yet.
    pub fn error_previous_token(&self, message: impl Into<String>) -> ParseError {
        let (line, column) = self
            .previous
            .unwrap_or((self.token.line, self.token.column));
        ParseError::new(line, column, message)
    }

    fn skip_whitespace(&mut self) {
        while let Some(current) = self.lines.get(self.line) {
            match current.get(self.col) {
                None => {
                    if self.line + 1 == self.lines.len() {
                        return;
                    }
                    self.line += 1;
                    self.col = 0;
                }
                Some('#') => self.col = current.len(),
                Some(c) if c.is_whitespace() => self.col += 1,
                Some(_) => return,
            }
        }
    }

    fn current(&self) -> Option<char> {
        self.lines.get(self.line)?.get(self.col).copied()
    }

    fn peek(&self) -> Option<char> {
        self.lines.get(self.line)?.get(self.col + 1).copied()
    }

    fn scan(&mut self) -> Result<(), ParseError> {
        self.skip_whitespace();
        let line = self.line + 1;
        let column = self.col + 1;

        let (kind, text) = match self.current() {
            None => (TokenKind::End, String::new()),
            Some(ch) if ch.is_ascii_alphabetic() || ch == '_' => self.read_identifier(),
            Some(ch) if ch.is_ascii_digit() || ch == '-' || ch == '+' => self.read_number(),
            Some('.') if self.peek().is_some_and(|c| c.is_ascii_digit()) => self.read_number(),
            Some('"') | Some('\'') => self.read_string()?,
            Some(ch) => {
                self.col += 1;
                (TokenKind::Punctuation, ch.to_string())
            }
        };

        self.token = Token {
            kind,
            text,
            line,
            column,
        };
        Ok(())
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut text = String::new();
        while let Some(ch) = self.current() {
            if !pred(ch) {
                break;
            }
            text.push(ch);
            self.col += 1;
        }
        text
    }

    fn read_identifier(&mut self) -> (TokenKind, String) {
        let ident = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_');
        let kind = if ident.eq_ignore_ascii_case("true") || ident.eq_ignore_ascii_case("false") {
            TokenKind::Bool
        } else {
            TokenKind::Identifier
        };
        (kind, ident)
    }

    fn read_number(&mut self) -> (TokenKind, String) {
        let mut text = String::new();
        if let Some(first) = self.current() {
            text.push(first);
            self.col += 1;
        }
        text.push_str(&self.take_while(is_number_char));

        let kind = if codec::looks_like_integer(&text) {
            TokenKind::Int
        } else {
            TokenKind::Float
        };
        (kind, text)
    }

    /// Reads one or more adjacent quoted literals.
    ///
    /// Literals may be separated by whitespace, line breaks and comments, and
    /// may mix quote styles. Escapes are left untouched.
    fn read_string(&mut self) -> Result<(TokenKind, String), ParseError> {
        let mut segments = Vec::new();
        let mut raw = Vec::new();

        while let Some(quote @ ('"' | '\'')) = self.current() {
            let start_line = self.line + 1;
            let start_col = self.col + 1;
            let current = &self.lines[self.line];

            let mut i = self.col + 1;
            let closed = loop {
                match current.get(i) {
                    None => break false,
                    Some('\\') if i + 1 < current.len() => i += 2,
                    Some('\\') => break false,
                    Some(&c) if c == quote => break true,
                    Some(_) => i += 1,
                }
            };
            if !closed {
                return Err(ParseError::new(
                    start_line,
                    start_col,
                    "String missing ending quote.",
                ));
            }

            segments.push(current[self.col + 1..i].iter().collect::<String>());
            raw.push(current[self.col..=i].iter().collect::<String>());
            self.col = i + 1;
            self.skip_whitespace();
        }

        Ok((TokenKind::String(segments), raw.join(" ")))
    }

    /// Consumes `p` if it is the current token.
    pub fn try_consume(&mut self, p: &str) -> Result<bool, ParseError> {
        if self.token.is_punct(p) {
            self.next_token()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Consumes `p` or fails with `Expected "p".`
    pub fn consume(&mut self, p: &str) -> Result<(), ParseError> {
        if self.try_consume(p)? {
            Ok(())
        } else {
            Err(self.error(format!("Expected \"{}\".", p)))
        }
    }

    pub fn consume_identifier(&mut self) -> Result<String, ParseError> {
        match self.token.kind {
            TokenKind::Identifier | TokenKind::Bool => {
                let ident = self.token.text.clone();
                self.next_token()?;
                Ok(ident)
            }
            _ => Err(self.error("Expected identifier.")),
        }
    }

    fn consume_integer(&mut self, kind: IntKind) -> Result<i128, ParseError> {
        let text = &self.token.text;
        let value = match codec::parse_integer(text, kind) {
            Ok(value) => value,
            Err(IntegerError::Malformed) => {
                return Err(self.error(format!("Couldn't parse integer: {}", text)));
            }
            Err(IntegerError::OutOfRange) => {
                return Err(self.error(format!(
                    "Integer out of range for {}: {}",
                    kind.name(),
                    text
                )));
            }
        };
        self.next_token()?;
        Ok(value)
    }

    pub fn consume_int32(&mut self) -> Result<i32, ParseError> {
        Ok(self.consume_integer(IntKind::Int32)? as i32)
    }

    pub fn consume_int64(&mut self) -> Result<i64, ParseError> {
        Ok(self.consume_integer(IntKind::Int64)? as i64)
    }

    pub fn consume_uint32(&mut self) -> Result<u32, ParseError> {
        Ok(self.consume_integer(IntKind::UInt32)? as u32)
    }

    pub fn consume_uint64(&mut self) -> Result<u64, ParseError> {
        Ok(self.consume_integer(IntKind::UInt64)? as u64)
    }

    /// Consumes a float literal at double precision.
    pub fn consume_float(&mut self) -> Result<f64, ParseError> {
        match codec::parse_float(&self.token.text) {
            Some(value) => {
                self.next_token()?;
                Ok(value)
            }
            None => Err(self.error(format!("Couldn't parse float: {}", self.token.text))),
        }
    }

    /// Consumes `true`/`false`/`t`/`f` in any case, or `1`/`0`.
    pub fn consume_bool(&mut self) -> Result<bool, ParseError> {
        let text = self.token.text.as_str();
        let value = if ["true", "t"].iter().any(|s| text.eq_ignore_ascii_case(s)) || text == "1" {
            true
        } else if ["false", "f"].iter().any(|s| text.eq_ignore_ascii_case(s)) || text == "0" {
            false
        } else {
            return Err(self.error("Expected \"true\" or \"false\"."));
        };
        self.next_token()?;
        Ok(value)
    }

    /// Consumes a string token and decodes its escapes to raw bytes.
    pub fn consume_byte_string(&mut self) -> Result<Vec<u8>, ParseError> {
        let TokenKind::String(segments) = &self.token.kind else {
            return Err(self.error("Expected string."));
        };

        let mut bytes = Vec::new();
        for segment in segments {
            let decoded = codec::unescape(segment).map_err(|e| self.error(e.to_string()))?;
            bytes.extend(decoded);
        }
        self.next_token()?;
        Ok(bytes)
    }

    /// Consumes a string token whose decoded bytes must be valid UTF-8.
    pub fn consume_string(&mut self) -> Result<String, ParseError> {
        let (line, column) = (self.token.line, self.token.column);
        let bytes = self.consume_byte_string()?;
        String::from_utf8(bytes)
            .map_err(|_| ParseError::new(line, column, "String isn't valid UTF-8."))
    }
}
