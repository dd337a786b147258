//! Reading and writing protocol-buffer text format against a runtime
//! descriptor pool.
//!
//! ```text
//! optional_int32: 1
//! optional_nested_message { bb: 2 }
//! repeated_string: ["a", "b"]
//! [pkg.my_extension]: 3
//! ```

pub mod codec;
pub mod descriptor;
pub mod lexer;
pub mod message;
pub mod parser;
pub mod parser_error;
pub mod printer;
pub mod token;
pub mod token_dumper;
pub mod value;

pub use descriptor::{
    Delimiter, DescriptorPool, EnumDescriptor, FieldDescriptor, FieldType, Label,
    MessageDescriptor, PoolError,
};
pub use message::{DynamicMessage, FieldValue};
pub use parser::{ParseOptions, Parser};
pub use parser_error::ParseError;
pub use printer::{to_text, PrintOptions, Printer};
pub use value::Value;

/// Parses `text` into `message`. A singular field given twice is an error.
pub fn parse(text: &str, message: &mut DynamicMessage, pool: &DescriptorPool) -> Result<(), ParseError> {
    Parser::new(pool).parse(text, message)
}

/// Merges `text` into `message`. Later singular values replace earlier
/// ones and nested messages merge.
pub fn merge(text: &str, message: &mut DynamicMessage, pool: &DescriptorPool) -> Result<(), ParseError> {
    Parser::new(pool).merge(text, message)
}

pub fn parse_lines<I, S>(lines: I, message: &mut DynamicMessage, pool: &DescriptorPool) -> Result<(), ParseError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Parser::new(pool).parse_lines(lines, message)
}

pub fn merge_lines<I, S>(lines: I, message: &mut DynamicMessage, pool: &DescriptorPool) -> Result<(), ParseError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Parser::new(pool).merge_lines(lines, message)
}
