use crate::lexer::Lexer;
use crate::parser_error::ParseError;
use crate::token::{Token, TokenKind};

pub struct TokenDumper {
    pub color: bool,
    pub show_debug_repr: bool, // if false, strings print decoded-looking text
}

impl Default for TokenDumper {
    fn default() -> Self {
        Self {
            color: true,
            show_debug_repr: true,
        }
    }
}

impl TokenDumper {
    // ANSI colors
    const RESET: &'static str = "\x1b[0m";
    const DIM: &'static str = "\x1b[2m";
    const GRN: &'static str = "\x1b[32m";
    const YEL: &'static str = "\x1b[33m";
    const CYN: &'static str = "\x1b[36m";
    const MAG: &'static str = "\x1b[35m";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn no_color(mut self) -> Self {
        self.color = false;
        self
    }

    pub fn pretty(mut self) -> Self {
        self.show_debug_repr = false;
        self
    }

    /// Prints every token up to and including end of input.
    pub fn dump(&self, mut lexer: Lexer) -> Result<(), ParseError> {
        loop {
            println!("{}", self.render(lexer.token()));
            if lexer.at_end() {
                return Ok(());
            }
            lexer.next_token()?;
        }
    }

    pub fn render(&self, token: &Token) -> String {
        let colr = if self.color { Self::color(token) } else { "" };
        let reset = if self.color { Self::RESET } else { "" };
        let kind = token.kind_label();

        let body = match (&token.kind, self.show_debug_repr) {
            (TokenKind::String(segments), false) => segments.join(" + "),
            (TokenKind::End, false) => "EOF".to_string(),
            _ => format!("{:?}", token.text),
        };
        format!(
            "[{:02}:{:02}] {}{:<8} {}{}",
            token.line, token.column, colr, kind, body, reset
        )
    }

    fn color(token: &Token) -> &'static str {
        match token.kind {
            TokenKind::End => Self::DIM,
            TokenKind::String(_) => Self::GRN,
            TokenKind::Int | TokenKind::Float | TokenKind::Bool => Self::CYN,
            TokenKind::Identifier => Self::YEL,
            TokenKind::Punctuation => Self::MAG,
        }
    }
}
