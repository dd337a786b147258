/// Token classes produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// `[A-Za-z_][A-Za-z0-9_]*`
    Identifier,

    /// Numeric token with integer syntax (decimal, hex or octal).
    Int,

    /// Any other numeric-looking token, including `-inf` and `1.5f`.
    Float,

    /// `true` / `false` in any letter case.
    Bool,

    /// One or more adjacent quoted literals.
    ///
    /// Each segment keeps its escapes; decoding happens when the parser knows
    /// whether the target field holds text or raw bytes.
    String(Vec<String>),

    /// A single character such as `:`, `{`, `<`, `[` or `,`.
    Punctuation,

    /// End of input.
    End,
}

/// A token and the position of its first character.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Raw source text. For strings this covers every joined segment.
    pub text: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn is_punct(&self, p: &str) -> bool {
        self.kind == TokenKind::Punctuation && self.text == p
    }

    pub fn is_end(&self) -> bool {
        self.kind == TokenKind::End
    }

    pub fn is_string(&self) -> bool {
        matches!(self.kind, TokenKind::String(_))
    }

    /// Short upper-case label used by the token dumper.
    pub fn kind_label(&self) -> &'static str {
        match self.kind {
            TokenKind::Identifier => "IDENT",
            TokenKind::Int => "INT",
            TokenKind::Float => "FLOAT",
            TokenKind::Bool => "BOOL",
            TokenKind::String(_) => "STRING",
            TokenKind::Punctuation => "PUNCT",
            TokenKind::End => "EOF",
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            TokenKind::End => write!(f, "end of input"),
            _ => write!(f, "{}", self.text),
        }
    }
}
