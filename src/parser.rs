use std::collections::HashMap;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::descriptor::{DescriptorPool, FieldDescriptor, FieldType, MessageDescriptor};
use crate::lexer::Lexer;
use crate::message::DynamicMessage;
use crate::parser_error::ParseError;
use crate::token::TokenKind;
use crate::value::Value;

pub const DEFAULT_MAX_DEPTH: usize = 100;

/// Knobs for reading text into a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOptions {
    /// Skip fields the message type does not declare instead of failing.
    pub allow_unknown_field: bool,
    /// Skip bracketed extensions missing from the pool instead of failing.
    pub allow_unknown_extension: bool,
    /// Accept field numbers in place of field names.
    pub allow_field_number: bool,
    /// Deepest nesting of message bodies accepted.
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            allow_unknown_field: false,
            allow_unknown_extension: false,
            allow_field_number: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ParseOptions {
    pub fn allow_unknown_field(mut self) -> Self {
        self.allow_unknown_field = true;
        self
    }

    pub fn allow_unknown_extension(mut self) -> Self {
        self.allow_unknown_extension = true;
        self
    }

    pub fn allow_field_number(mut self) -> Self {
        self.allow_field_number = true;
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// How a singular field that appears twice is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Policy {
    /// Second assignment is an error.
    Strict,
    /// Last scalar wins; nested messages merge.
    Merge,
}

/// Text-format reader bound to a descriptor pool.
///
/// ```text
/// body   := (field [',' | ';'])*
/// field  := name ':' value
///         | name [':'] ('{' body '}' | '<' body '>')
///         | '[' ext.name ']' (same tails)
/// value  := scalar | '[' scalar (',' scalar)* ']'
/// ```
pub struct Parser<'p> {
    pool: &'p DescriptorPool,
    options: ParseOptions,
}

impl<'p> Parser<'p> {
    pub fn new(pool: &'p DescriptorPool) -> Self {
        Parser {
            pool,
            options: ParseOptions::default(),
        }
    }

    pub fn options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    /// Parses `text` into `message`, rejecting repeated singular fields.
    pub fn parse(&self, text: &str, message: &mut DynamicMessage) -> Result<(), ParseError> {
        self.run(Lexer::new(text)?, message, Policy::Strict)
    }

    /// Merges `text` into `message`; later singular values win.
    pub fn merge(&self, text: &str, message: &mut DynamicMessage) -> Result<(), ParseError> {
        self.run(Lexer::new(text)?, message, Policy::Merge)
    }

    pub fn parse_lines<I, S>(&self, lines: I, message: &mut DynamicMessage) -> Result<(), ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.run(Lexer::from_lines(lines)?, message, Policy::Strict)
    }

    pub fn merge_lines<I, S>(&self, lines: I, message: &mut DynamicMessage) -> Result<(), ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.run(Lexer::from_lines(lines)?, message, Policy::Merge)
    }

    fn run(
        &self,
        lexer: Lexer,
        message: &mut DynamicMessage,
        policy: Policy,
    ) -> Result<(), ParseError> {
        let descriptor = self.pool.message(message.type_name()).ok_or_else(|| {
            ParseError::new(
                1,
                1,
                format!(
                    "Message type \"{}\" is not in the descriptor pool.",
                    message.type_name()
                ),
            )
        })?;
        debug!(message_type = %descriptor.full_name, ?policy, "parsing text");

        let root = Frame {
            message: std::mem::replace(message, DynamicMessage::new(&descriptor.full_name)),
            descriptor,
            seen: Seen::default(),
            closer: None,
            attach: Attach::Root,
        };
        let mut session = Session {
            pool: self.pool,
            options: &self.options,
            policy,
            lexer,
            current: root,
            parents: Vec::new(),
        };

        let result = session.run();
        if let Err(e) = &result {
            debug!(line = e.line, column = e.column, "parse failed: {}", e.message);
        }
        *message = session.unwind();
        result
    }
}

/// Singular fields already assigned in one message scope.
///
/// Scopes of singular nested messages are kept in `children` so that a
/// field set in one occurrence of a nested message and again in a later,
/// disjoint occurrence is still caught.
#[derive(Debug, Default)]
struct Seen {
    fields: HashSet<u32>,
    /// oneof name -> member number seen.
    oneofs: HashMap<String, u32>,
    children: HashMap<u32, Seen>,
}

/// Where a finished frame's message goes in its parent.
#[derive(Debug, Clone, Copy)]
enum Attach<'p> {
    Root,
    Singular(&'p FieldDescriptor),
    Repeated(&'p FieldDescriptor),
    /// Element of a `[ {...}, {...} ]` list.
    ListElement(&'p FieldDescriptor),
}

/// One open message body.
struct Frame<'p> {
    message: DynamicMessage,
    descriptor: &'p MessageDescriptor,
    seen: Seen,
    /// Closing delimiter; `None` for the top-level body.
    closer: Option<&'static str>,
    attach: Attach<'p>,
}

/// Outcome of reading one field.
#[derive(Debug, PartialEq, Eq)]
enum Step {
    /// The field is complete.
    Done,
    /// A message body was opened and is now the current frame.
    Opened,
}

struct Session<'p, 'o> {
    pool: &'p DescriptorPool,
    options: &'o ParseOptions,
    policy: Policy,
    lexer: Lexer,
    current: Frame<'p>,
    parents: Vec<Frame<'p>>,
}

impl<'p> Session<'p, '_> {
    fn run(&mut self) -> Result<(), ParseError> {
        loop {
            if let Some(closer) = self.current.closer {
                if self.lexer.try_consume(closer)? {
                    self.close_frame()?;
                    continue;
                }
                if self.lexer.at_end() {
                    return Err(self
                        .lexer
                        .error_previous_token(format!("Expected \"{}\".", closer)));
                }
                let token = self.lexer.token();
                if token.is_punct("}") || token.is_punct(">") {
                    return Err(self.lexer.error(format!("Expected \"{}\".", closer)));
                }
            } else if self.lexer.at_end() {
                return Ok(());
            }

            if self.parse_field()? == Step::Done {
                self.consume_separator()?;
            }
        }
    }

    /// Folds every open frame back into its parent and returns the root.
    fn unwind(mut self) -> DynamicMessage {
        while !self.parents.is_empty() {
            self.attach_current();
        }
        self.current.message
    }

    fn consume_separator(&mut self) -> Result<(), ParseError> {
        if !self.lexer.try_consume(",")? {
            self.lexer.try_consume(";")?;
        }
        Ok(())
    }

    fn type_error(&self, type_name: &str) -> ParseError {
        self.lexer.error(format!(
            "Type \"{}\" is not in the descriptor pool.",
            type_name
        ))
    }

    fn message_type(&self, field: &FieldDescriptor) -> Result<&'p MessageDescriptor, ParseError> {
        let name = field.type_name.as_deref().unwrap_or_default();
        self.pool.message(name).ok_or_else(|| self.type_error(name))
    }

    fn parse_field(&mut self) -> Result<Step, ParseError> {
        let field = if self.lexer.try_consume("[")? {
            self.resolve_extension()?
        } else {
            self.resolve_field()?
        };

        let Some(field) = field else {
            self.skip_field_contents()?;
            return Ok(Step::Done);
        };

        if field.is_message() {
            self.lexer.try_consume(":")?;
            if field.is_repeated() && self.lexer.try_consume("[")? {
                if self.lexer.try_consume("]")? {
                    return Ok(Step::Done);
                }
                self.open_message(field, Attach::ListElement(field))?;
                return Ok(Step::Opened);
            }
            let attach = if field.is_repeated() {
                Attach::Repeated(field)
            } else {
                Attach::Singular(field)
            };
            self.open_message(field, attach)?;
            return Ok(Step::Opened);
        }

        self.lexer.consume(":")?;
        if field.is_repeated() && self.lexer.try_consume("[")? {
            if !self.lexer.try_consume("]")? {
                loop {
                    let value = self.parse_scalar(field)?;
                    self.current.message.add_repeated(field, value);
                    if self.lexer.try_consume("]")? {
                        break;
                    }
                    self.lexer.consume(",")?;
                }
            }
        } else {
            let value = self.parse_scalar(field)?;
            self.assign(field, value)?;
        }
        Ok(Step::Done)
    }

    /// Resolves a plain field name (or number) in the current message type.
    ///
    /// `Ok(None)` means the field is unknown and should be skipped.
    fn resolve_field(&mut self) -> Result<Option<&'p FieldDescriptor>, ParseError> {
        let descriptor = self.current.descriptor;

        if self.options.allow_field_number && self.lexer.token().kind == TokenKind::Int {
            let number = self.lexer.consume_uint32()?;
            return match self.pool.field_for(descriptor, number) {
                Some(field) => Ok(Some(field)),
                None if self.options.allow_unknown_field => Ok(None),
                None => Err(self.lexer.error_previous_token(format!(
                    "Message type \"{}\" has no field with number {}.",
                    descriptor.full_name, number
                ))),
            };
        }

        let name = self.lexer.consume_identifier()?;
        let mut field = descriptor.field_by_name(&name).or_else(|| {
            // Groups are written with their type name but declared lowercase.
            descriptor
                .field_by_name(&name.to_lowercase())
                .filter(|f| f.is_group())
        });
        if let Some(f) = field {
            if f.is_group() {
                let type_name = f.type_name.as_deref().unwrap_or_default();
                let short = self.pool.message(type_name).map(|m| m.name());
                if short != Some(name.as_str()) {
                    field = None;
                }
            }
        }

        match field {
            Some(field) => Ok(Some(field)),
            None if self.options.allow_unknown_field => {
                trace!(field = %name, "skipping unknown field");
                Ok(None)
            }
            None => Err(self.lexer.error_previous_token(format!(
                "Message type \"{}\" has no field named \"{}\".",
                descriptor.full_name, name
            ))),
        }
    }

    /// Resolves `[pkg.ext_name]`; the opening bracket is already consumed.
    fn resolve_extension(&mut self) -> Result<Option<&'p FieldDescriptor>, ParseError> {
        let descriptor = self.current.descriptor;
        let start = self.lexer.token().clone();

        let mut name = self.lexer.consume_identifier()?;
        while self.lexer.try_consume(".")? {
            name.push('.');
            name.push_str(&self.lexer.consume_identifier()?);
        }
        let at_name = |message: String| ParseError::new(start.line, start.column, message);

        if !descriptor.extendable {
            return Err(at_name(format!(
                "Message type \"{}\" does not have extensions.",
                descriptor.full_name
            )));
        }

        let field = match self.pool.find_extension(&name) {
            Some(field) => {
                if field.extendee.as_deref() != Some(descriptor.full_name.as_str()) {
                    return Err(at_name(format!(
                        "Extension \"{}\" does not extend message type \"{}\".",
                        name, descriptor.full_name
                    )));
                }
                Some(field)
            }
            None if self.options.allow_unknown_extension => {
                trace!(extension = %name, "skipping unknown extension");
                None
            }
            None => return Err(at_name(format!("Extension \"{}\" not registered.", name))),
        };

        self.lexer.consume("]")?;
        Ok(field)
    }

    fn parse_scalar(&mut self, field: &'p FieldDescriptor) -> Result<Value, ParseError> {
        let value = match field.field_type {
            FieldType::Int32 | FieldType::SInt32 | FieldType::SFixed32 => {
                Value::Int32(self.lexer.consume_int32()?)
            }
            FieldType::Int64 | FieldType::SInt64 | FieldType::SFixed64 => {
                Value::Int64(self.lexer.consume_int64()?)
            }
            FieldType::UInt32 | FieldType::Fixed32 => Value::UInt32(self.lexer.consume_uint32()?),
            FieldType::UInt64 | FieldType::Fixed64 => Value::UInt64(self.lexer.consume_uint64()?),
            FieldType::Float => Value::Float32(self.lexer.consume_float()? as f32),
            FieldType::Double => Value::Float64(self.lexer.consume_float()?),
            FieldType::Bool => Value::Bool(self.lexer.consume_bool()?),
            FieldType::Bytes => Value::Bytes(self.lexer.consume_byte_string()?),
            FieldType::String => {
                let bytes = self.lexer.consume_byte_string()?;
                let text = String::from_utf8(bytes).map_err(|_| {
                    self.lexer.error_previous_token(format!(
                        "String field \"{}\" has type string, but isn't valid UTF-8.",
                        field.full_name
                    ))
                })?;
                Value::String(text)
            }
            FieldType::Enum => Value::Enum(self.parse_enum(field)?),
            FieldType::Message | FieldType::Group => {
                return Err(self.lexer.error(format!(
                    "Field \"{}\" holds a message; expected \"{{\" or \"<\".",
                    field.name
                )));
            }
        };
        Ok(value)
    }

    fn parse_enum(&mut self, field: &'p FieldDescriptor) -> Result<i32, ParseError> {
        let type_name = field.type_name.as_deref().unwrap_or_default();
        let enum_type = self
            .pool
            .enum_type(type_name)
            .ok_or_else(|| self.type_error(type_name))?;

        if matches!(
            self.lexer.token().kind,
            TokenKind::Identifier | TokenKind::Bool
        ) {
            let name = self.lexer.consume_identifier()?;
            return enum_type
                .value_by_name(&name)
                .map(|v| v.number)
                .ok_or_else(|| {
                    self.lexer.error_previous_token(format!(
                        "Enum type \"{}\" has no value named {}.",
                        enum_type.full_name, name
                    ))
                });
        }

        let number = self.lexer.consume_int32()?;
        enum_type
            .value_by_number(number)
            .map(|v| v.number)
            .ok_or_else(|| {
                self.lexer.error_previous_token(format!(
                    "Enum type \"{}\" has no value with number {}.",
                    enum_type.full_name, number
                ))
            })
    }

    /// Stores a scalar, applying the duplicate policy to singular fields.
    fn assign(&mut self, field: &'p FieldDescriptor, value: Value) -> Result<(), ParseError> {
        if field.is_repeated() {
            self.current.message.add_repeated(field, value);
            return Ok(());
        }

        if self.policy == Policy::Strict {
            if !self.current.seen.fields.insert(field.number) {
                return Err(self.duplicate_error(field));
            }
            self.check_oneof(field)?;
        }
        self.current.message.set(field, value);
        Ok(())
    }

    fn duplicate_error(&self, field: &FieldDescriptor) -> ParseError {
        let type_name = &self.current.descriptor.full_name;
        let message = if field.is_extension() {
            format!(
                "Message type \"{}\" should not have multiple \"{}\" extensions.",
                type_name, field.full_name
            )
        } else {
            format!(
                "Message type \"{}\" should not have multiple \"{}\" fields.",
                type_name, field.name
            )
        };
        self.lexer.error_previous_token(message)
    }

    /// Rejects a second, different member of the same oneof (strict only).
    fn check_oneof(&mut self, field: &FieldDescriptor) -> Result<(), ParseError> {
        let Some(oneof) = &field.oneof else {
            return Ok(());
        };
        match self.current.seen.oneofs.get(oneof).copied() {
            Some(other) if other != field.number => {
                let descriptor = self.current.descriptor;
                let other_name = descriptor
                    .field_by_number(other)
                    .map(|f| f.name.as_str())
                    .unwrap_or_default();
                Err(self.lexer.error_previous_token(format!(
                    "Field \"{}\" is specified along with field \"{}\", another member of oneof \"{}\" for message type \"{}\".",
                    field.name, other_name, oneof, descriptor.full_name
                )))
            }
            _ => {
                self.current.seen.oneofs.insert(oneof.clone(), field.number);
                Ok(())
            }
        }
    }

    /// Consumes an opening delimiter and pushes a frame for `field`.
    fn open_message(
        &mut self,
        field: &'p FieldDescriptor,
        attach: Attach<'p>,
    ) -> Result<(), ParseError> {
        let closer = if self.lexer.try_consume("<")? {
            ">"
        } else {
            self.lexer.consume("{")?;
            "}"
        };

        if self.parents.len() >= self.options.max_depth {
            return Err(self.lexer.error_previous_token(format!(
                "Message too deep. Max recursion depth is {}.",
                self.options.max_depth
            )));
        }

        let descriptor = self.message_type(field)?;
        let (message, seen) = match attach {
            Attach::Singular(_) => {
                if self.policy == Policy::Strict {
                    self.check_oneof(field)?;
                }
                let seen = self
                    .current
                    .seen
                    .children
                    .remove(&field.number)
                    .unwrap_or_default();
                (self.current.message.take_message(field), seen)
            }
            _ => (DynamicMessage::new(&descriptor.full_name), Seen::default()),
        };

        trace!(field = %field.name, depth = self.parents.len() + 1, "enter message");
        let child = Frame {
            message,
            descriptor,
            seen,
            closer: Some(closer),
            attach,
        };
        let parent = std::mem::replace(&mut self.current, child);
        self.parents.push(parent);
        Ok(())
    }

    /// Pops the current frame into its parent. The parent becomes current.
    fn attach_current(&mut self) -> Attach<'p> {
        let Some(parent) = self.parents.pop() else {
            return Attach::Root;
        };
        let child = std::mem::replace(&mut self.current, parent);
        match child.attach {
            Attach::Root => {}
            Attach::Singular(field) => {
                self.current
                    .message
                    .set(field, Value::Message(Box::new(child.message)));
                self.current.seen.children.insert(field.number, child.seen);
            }
            Attach::Repeated(field) | Attach::ListElement(field) => {
                self.current
                    .message
                    .add_repeated(field, Value::Message(Box::new(child.message)));
            }
        }
        child.attach
    }

    /// Handles a consumed closing delimiter.
    fn close_frame(&mut self) -> Result<(), ParseError> {
        let attach = self.attach_current();
        trace!(depth = self.parents.len(), "leave message");

        if let Attach::ListElement(field) = attach {
            if !self.lexer.try_consume("]")? {
                self.lexer.consume(",")?;
                self.open_message(field, Attach::ListElement(field))?;
                return Ok(());
            }
        }
        self.consume_separator()
    }

    /// Skips the value or body of an unknown field or extension.
    fn skip_field_contents(&mut self) -> Result<(), ParseError> {
        let colon = self.lexer.try_consume(":")?;
        let token = self.lexer.token();
        if token.is_punct("{") || token.is_punct("<") {
            return self.skip_balanced();
        }
        if !colon {
            return Err(self.lexer.error("Expected \"{\"."));
        }
        if token.is_punct("[") {
            return self.skip_balanced();
        }
        if matches!(token.kind, TokenKind::Punctuation | TokenKind::End) {
            return Err(self
                .lexer
                .error(format!("Invalid field value: {}", self.lexer.token())));
        }
        self.lexer.next_token()
    }

    /// Skips a bracketed group of tokens, checking that brackets pair up.
    fn skip_balanced(&mut self) -> Result<(), ParseError> {
        let mut closers: Vec<&'static str> = Vec::new();
        loop {
            let token = self.lexer.token();
            let opened = if token.is_punct("{") {
                Some("}")
            } else if token.is_punct("<") {
                Some(">")
            } else if token.is_punct("[") {
                Some("]")
            } else {
                None
            };

            if let Some(closer) = opened {
                if self.parents.len() + closers.len() >= self.options.max_depth {
                    return Err(self.lexer.error(format!(
                        "Message too deep. Max recursion depth is {}.",
                        self.options.max_depth
                    )));
                }
                closers.push(closer);
            } else if let Some(&expected) = closers.last() {
                if token.is_end() {
                    return Err(self
                        .lexer
                        .error_previous_token(format!("Expected \"{}\".", expected)));
                }
                if token.is_punct(expected) {
                    closers.pop();
                } else if token.is_punct("}") || token.is_punct(">") || token.is_punct("]") {
                    return Err(self.lexer.error(format!("Expected \"{}\".", expected)));
                }
            }

            self.lexer.next_token()?;
            if closers.is_empty() {
                return Ok(());
            }
        }
    }
}
