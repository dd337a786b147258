//! Numeric and string codec shared by the lexer and the printer.
//!
//! Integers are range-checked per field width, floats are printed with the
//! fewest digits that read back to the same binary value, and strings are
//! escaped so every byte survives a round trip through the lexer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Integer widths that have distinct text ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntKind {
    Int32,
    Int64,
    UInt32,
    UInt64,
}

impl IntKind {
    pub fn name(self) -> &'static str {
        match self {
            IntKind::Int32 => "int32",
            IntKind::Int64 => "int64",
            IntKind::UInt32 => "uint32",
            IntKind::UInt64 => "uint64",
        }
    }

    fn bounds(self) -> (i128, i128) {
        match self {
            IntKind::Int32 => (i32::MIN as i128, i32::MAX as i128),
            IntKind::Int64 => (i64::MIN as i128, i64::MAX as i128),
            IntKind::UInt32 => (0, u32::MAX as i128),
            IntKind::UInt64 => (0, u64::MAX as i128),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegerError {
    /// Not an integer literal at all.
    Malformed,
    /// A valid literal that does not fit the requested width.
    OutOfRange,
}

/// Splits a literal into sign, radix and digit string.
///
/// Accepts `123`, `-123`, `+123`, `0x1F`, and C-style octal `017`.
fn split_integer(text: &str) -> Option<(bool, u32, &str)> {
    let (negative, rest) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };

    let (radix, digits) = if let Some(hex) = rest
        .strip_prefix("0x")
        .or_else(|| rest.strip_prefix("0X"))
    {
        (16, hex)
    } else if rest.len() > 1 && rest.starts_with('0') {
        (8, &rest[1..])
    } else {
        (10, rest)
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    Some((negative, radix, digits))
}

/// Returns true when `text` has integer syntax, regardless of range.
pub fn looks_like_integer(text: &str) -> bool {
    split_integer(text).is_some()
}

/// Parses an integer literal and checks it against `kind`'s range.
///
/// `-0` is accepted for unsigned kinds and yields 0.
pub fn parse_integer(text: &str, kind: IntKind) -> Result<i128, IntegerError> {
    let (negative, radix, digits) = split_integer(text).ok_or(IntegerError::Malformed)?;

    // Digits are already validated, so a failure here can only be overflow.
    let magnitude = u128::from_str_radix(digits, radix).map_err(|_| IntegerError::OutOfRange)?;
    if magnitude > u64::MAX as u128 + 1 {
        return Err(IntegerError::OutOfRange);
    }

    let value = if negative {
        -(magnitude as i128)
    } else {
        magnitude as i128
    };

    let (min, max) = kind.bounds();
    if value < min || value > max {
        return Err(IntegerError::OutOfRange);
    }
    Ok(value)
}

/// Parses a float literal.
///
/// Accepts decimal and exponent forms with an optional trailing `f`, plus
/// the exact spellings `inf`, `-inf` and `nan`.
pub fn parse_float(text: &str) -> Option<f64> {
    if let Some(value) = special_float(text) {
        return Some(value);
    }
    let body = text
        .strip_suffix('f')
        .or_else(|| text.strip_suffix('F'))
        .unwrap_or(text);
    if let Some(value) = special_float(body) {
        return Some(value);
    }

    // `f64::from_str` also takes "infinity" and friends; keep to plain numbers.
    let plain = body
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'));
    if !plain || !body.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    body.parse::<f64>().ok()
}

fn special_float(text: &str) -> Option<f64> {
    match text {
        "inf" => Some(f64::INFINITY),
        "-inf" => Some(f64::NEG_INFINITY),
        "nan" => Some(f64::NAN),
        _ => None,
    }
}

/// Splits Rust's `{:e}` output (`-1.23e-5`) into mantissa and exponent.
fn split_exponent(s: &str) -> (&str, i32) {
    match s.split_once('e') {
        Some((mantissa, exp)) => (mantissa, exp.parse().unwrap_or(0)),
        None => (s, 0),
    }
}

fn push_exponent(out: &mut String, exp: i32) {
    out.push('e');
    out.push(if exp < 0 { '-' } else { '+' });
    out.push_str(&format!("{:02}", exp.unsigned_abs()));
}

/// Lays out shortest round-trip digits the way `repr` style formatters do:
/// plain decimal for moderate exponents, `d.ddde+XX` otherwise.
fn layout_shortest(sci: &str) -> String {
    let (mantissa, exp) = split_exponent(sci);
    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };

    let mut out = String::from(sign);
    if !(-4..16).contains(&exp) {
        out.push_str(mantissa);
        push_exponent(&mut out, exp);
        return out;
    }

    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    if exp >= 0 {
        let int_len = exp as usize + 1;
        if digits.len() <= int_len {
            out.push_str(&digits);
            out.extend(std::iter::repeat_n('0', int_len - digits.len()));
        } else {
            out.push_str(&digits[..int_len]);
            out.push('.');
            out.push_str(&digits[int_len..]);
        }
    } else {
        out.push_str("0.");
        out.extend(std::iter::repeat_n('0', (-exp - 1) as usize));
        out.push_str(&digits);
    }
    out
}

fn format_non_finite(value: f64) -> Option<String> {
    if value.is_nan() {
        Some("nan".to_string())
    } else if value.is_infinite() {
        Some(if value > 0.0 { "inf" } else { "-inf" }.to_string())
    } else {
        None
    }
}

/// Shortest text that parses back to exactly `value` as a double.
pub fn format_double(value: f64) -> String {
    format_non_finite(value).unwrap_or_else(|| layout_shortest(&format!("{:e}", value)))
}

/// Shortest text that parses back to exactly `value` as a 32-bit float.
pub fn format_float(value: f32) -> String {
    format_non_finite(value as f64).unwrap_or_else(|| layout_shortest(&format!("{:e}", value)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FloatStyle {
    /// `%g`
    General,
    /// `%f`
    Fixed,
    /// `%e`
    Exponent,
}

/// A printf-style precision spec such as `.15g`, `.6f` or `.3e`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloatFormat {
    pub precision: usize,
    pub style: FloatStyle,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid float format {0:?}: expected something like \".15g\"")]
pub struct FloatFormatError(String);

impl FromStr for FloatFormat {
    type Err = FloatFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || FloatFormatError(s.to_string());
        let spec = s.strip_prefix('%').unwrap_or(s);
        let (head, style) = match spec.chars().last() {
            Some('g') | Some('G') => (&spec[..spec.len() - 1], FloatStyle::General),
            Some('f') | Some('F') => (&spec[..spec.len() - 1], FloatStyle::Fixed),
            Some('e') | Some('E') => (&spec[..spec.len() - 1], FloatStyle::Exponent),
            _ => return Err(bad()),
        };
        let precision = match head {
            "" => 6,
            _ => head
                .strip_prefix('.')
                .and_then(|p| p.parse().ok())
                .ok_or_else(bad)?,
        };
        Ok(FloatFormat { precision, style })
    }
}

impl fmt::Display for FloatFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self.style {
            FloatStyle::General => 'g',
            FloatStyle::Fixed => 'f',
            FloatStyle::Exponent => 'e',
        };
        write!(f, ".{}{}", self.precision, c)
    }
}

fn strip_fraction_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

impl FloatFormat {
    pub fn apply(&self, value: f64) -> String {
        if let Some(s) = format_non_finite(value) {
            return s;
        }
        match self.style {
            FloatStyle::Fixed => format!("{:.*}", self.precision, value),
            FloatStyle::Exponent => {
                let sci = format!("{:.*e}", self.precision, value);
                let (mantissa, exp) = split_exponent(&sci);
                let mut out = mantissa.to_string();
                push_exponent(&mut out, exp);
                out
            }
            FloatStyle::General => {
                let p = self.precision.max(1);
                let sci = format!("{:.*e}", p - 1, value);
                let (mantissa, exp) = split_exponent(&sci);
                if exp < -4 || exp >= p as i32 {
                    let mut out = strip_fraction_zeros(mantissa).to_string();
                    push_exponent(&mut out, exp);
                    out
                } else {
                    let decimals = (p as i32 - 1 - exp) as usize;
                    let fixed = format!("{:.*}", decimals, value);
                    strip_fraction_zeros(&fixed).to_string()
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnescapeError {
    #[error("Expected hex digits after \"\\x\".")]
    MissingHexDigits,
    #[error("Invalid escape sequence \"\\{0}\".")]
    UnknownEscape(char),
    #[error("Octal escape \"\\{0}\" is out of range.")]
    OctalOutOfRange(String),
    #[error("String ends with a lone backslash.")]
    TrailingBackslash,
}

/// Decodes the escapes in the body of one quoted literal.
pub fn unescape(body: &str) -> Result<Vec<u8>, UnescapeError> {
    let mut out = Vec::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    let mut buf = [0u8; 4];

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            continue;
        }

        let esc = chars.next().ok_or(UnescapeError::TrailingBackslash)?;
        match esc {
            'n' => out.push(b'\n'),
            'r' => out.push(b'\r'),
            't' => out.push(b'\t'),
            'a' => out.push(0x07),
            'b' => out.push(0x08),
            'f' => out.push(0x0c),
            'v' => out.push(0x0b),
            '\\' => out.push(b'\\'),
            '\'' => out.push(b'\''),
            '"' => out.push(b'"'),
            '?' => out.push(b'?'),
            '0'..='7' => {
                let mut digits = String::from(esc);
                while digits.len() < 3 {
                    match chars.peek() {
                        Some(c @ '0'..='7') => {
                            digits.push(*c);
                            chars.next();
                        }
                        _ => break,
                    }
                }
                let value = u32::from_str_radix(&digits, 8).unwrap_or(u32::MAX);
                let byte =
                    u8::try_from(value).map_err(|_| UnescapeError::OctalOutOfRange(digits))?;
                out.push(byte);
            }
            'x' | 'X' => {
                let mut digits = String::new();
                while digits.len() < 2 {
                    match chars.peek() {
                        Some(c) if c.is_ascii_hexdigit() => {
                            digits.push(*c);
                            chars.next();
                        }
                        _ => break,
                    }
                }
                if digits.is_empty() {
                    return Err(UnescapeError::MissingHexDigits);
                }
                // At most two hex digits always fit a byte.
                out.push(u8::from_str_radix(&digits, 16).unwrap_or_default());
            }
            other => return Err(UnescapeError::UnknownEscape(other)),
        }
    }
    Ok(out)
}

fn push_escaped_byte(out: &mut String, b: u8) {
    match b {
        b'\n' => out.push_str("\\n"),
        b'\r' => out.push_str("\\r"),
        b'\t' => out.push_str("\\t"),
        b'"' => out.push_str("\\\""),
        b'\'' => out.push_str("\\'"),
        b'\\' => out.push_str("\\\\"),
        0x20..=0x7e => out.push(b as char),
        _ => out.push_str(&format!("\\{:03o}", b)),
    }
}

/// Escapes raw bytes; everything outside printable ASCII becomes `\NNN`.
pub fn escape_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        push_escaped_byte(&mut out, b);
    }
    out
}

/// Escapes text. With `as_utf8`, non-ASCII characters are kept as they are.
pub fn escape_str(s: &str, as_utf8: bool) -> String {
    if !as_utf8 {
        return escape_bytes(s.as_bytes());
    }
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        if ch.is_ascii() {
            push_escaped_byte(&mut out, ch as u8);
        } else {
            out.push(ch);
        }
    }
    out
}
