/// A text-format parse error with source location.
///
/// `line` and `column` are 1-based and count characters, so they match the
/// coordinates an editor shows. Errors that happen past the last token use
/// the last consumed token's position so locations are never `0:0`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{line}:{column} : {message}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(line: usize, column: usize, message: impl Into<String>) -> Self {
        ParseError {
            line,
            column,
            message: message.into(),
        }
    }
}
