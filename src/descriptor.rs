//! Read-only schema model consumed by the parser and the printer.
//!
//! Types reference each other by fully qualified name and are resolved
//! through a [`DescriptorPool`], which also serves as the extension
//! registry. A pool can be snapshotted to compact bytes with postcard.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::codec::IntKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    Double,
    Float,
    Int64,
    UInt64,
    Int32,
    Fixed64,
    Fixed32,
    Bool,
    String,
    Group,
    Message,
    Bytes,
    UInt32,
    Enum,
    SFixed32,
    SFixed64,
    SInt32,
    SInt64,
}

impl FieldType {
    /// Integer range used when reading this type from text.
    pub fn int_kind(self) -> Option<IntKind> {
        match self {
            FieldType::Int32 | FieldType::SInt32 | FieldType::SFixed32 => Some(IntKind::Int32),
            FieldType::Int64 | FieldType::SInt64 | FieldType::SFixed64 => Some(IntKind::Int64),
            FieldType::UInt32 | FieldType::Fixed32 => Some(IntKind::UInt32),
            FieldType::UInt64 | FieldType::Fixed64 => Some(IntKind::UInt64),
            _ => None,
        }
    }

    pub fn is_message(self) -> bool {
        matches!(self, FieldType::Message | FieldType::Group)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Label {
    Optional,
    Required,
    Repeated,
}

/// Bracket pair around a nested message body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Delimiter {
    Brace,
    Angle,
}

impl Delimiter {
    pub fn open(self) -> &'static str {
        match self {
            Delimiter::Brace => "{",
            Delimiter::Angle => "<",
        }
    }

    pub fn close(self) -> &'static str {
        match self {
            Delimiter::Brace => "}",
            Delimiter::Angle => ">",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    /// `pkg.Message.field` for regular fields, `pkg.ext_name` for extensions.
    pub full_name: String,
    pub number: u32,
    pub label: Label,
    pub field_type: FieldType,
    /// Full name of the message, group or enum type this field holds.
    pub type_name: Option<String>,
    pub oneof: Option<String>,
    /// Extended message type; `Some` marks an extension.
    pub extendee: Option<String>,
    /// Message type the extension is declared inside, if any.
    pub extension_scope: Option<String>,
    /// Forces the printed delimiter regardless of printer options.
    pub delimiter: Option<Delimiter>,
}

impl FieldDescriptor {
    pub fn new(name: &str, number: u32, field_type: FieldType) -> Self {
        FieldDescriptor {
            name: name.to_string(),
            full_name: name.to_string(),
            number,
            label: Label::Optional,
            field_type,
            type_name: None,
            oneof: None,
            extendee: None,
            extension_scope: None,
            delimiter: None,
        }
    }

    pub fn repeated(mut self) -> Self {
        self.label = Label::Repeated;
        self
    }

    pub fn required(mut self) -> Self {
        self.label = Label::Required;
        self
    }

    /// Sets the referenced message, group or enum type.
    pub fn of_type(mut self, type_name: &str) -> Self {
        self.type_name = Some(type_name.to_string());
        self
    }

    pub fn in_oneof(mut self, oneof: &str) -> Self {
        self.oneof = Some(oneof.to_string());
        self
    }

    pub fn delimited_by(mut self, delimiter: Delimiter) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    /// Turns this field into an extension of `extendee` named `full_name`.
    pub fn extending(mut self, extendee: &str, full_name: &str) -> Self {
        self.extendee = Some(extendee.to_string());
        self.full_name = full_name.to_string();
        self
    }

    pub fn scoped_in(mut self, scope: &str) -> Self {
        self.extension_scope = Some(scope.to_string());
        self
    }

    pub fn is_repeated(&self) -> bool {
        self.label == Label::Repeated
    }

    pub fn is_extension(&self) -> bool {
        self.extendee.is_some()
    }

    pub fn is_message(&self) -> bool {
        self.field_type.is_message()
    }

    pub fn is_group(&self) -> bool {
        self.field_type == FieldType::Group
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDescriptor {
    pub full_name: String,
    /// Declaration order.
    pub fields: Vec<FieldDescriptor>,
    pub oneofs: Vec<String>,
    /// Whether the type declares extension ranges.
    pub extendable: bool,
    /// Legacy container keyed purely by extension identity.
    pub message_set: bool,
}

impl MessageDescriptor {
    pub fn new(full_name: &str) -> Self {
        MessageDescriptor {
            full_name: full_name.to_string(),
            fields: Vec::new(),
            oneofs: Vec::new(),
            extendable: false,
            message_set: false,
        }
    }

    /// Appends a field, qualifying its full name with this type's name.
    pub fn field(mut self, mut field: FieldDescriptor) -> Self {
        field.full_name = format!("{}.{}", self.full_name, field.name);
        if let Some(oneof) = &field.oneof {
            if !self.oneofs.contains(oneof) {
                self.oneofs.push(oneof.clone());
            }
        }
        self.fields.push(field);
        self
    }

    pub fn extendable(mut self) -> Self {
        self.extendable = true;
        self
    }

    pub fn message_set(mut self) -> Self {
        self.extendable = true;
        self.message_set = true;
        self
    }

    /// Unqualified type name (`NestedMessage` for `pkg.Outer.NestedMessage`).
    pub fn name(&self) -> &str {
        self.full_name
            .rsplit_once('.')
            .map(|(_, name)| name)
            .unwrap_or(&self.full_name)
    }

    pub fn field_by_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_by_number(&self, number: u32) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.number == number)
    }

    /// Declaration index, used for index-order printing.
    pub fn index_of(&self, number: u32) -> Option<usize> {
        self.fields.iter().position(|f| f.number == number)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumValue {
    pub name: String,
    pub number: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumDescriptor {
    pub full_name: String,
    pub values: Vec<EnumValue>,
}

impl EnumDescriptor {
    pub fn new(full_name: &str) -> Self {
        EnumDescriptor {
            full_name: full_name.to_string(),
            values: Vec::new(),
        }
    }

    pub fn value(mut self, name: &str, number: i32) -> Self {
        self.values.push(EnumValue {
            name: name.to_string(),
            number,
        });
        self
    }

    pub fn value_by_name(&self, name: &str) -> Option<&EnumValue> {
        self.values.iter().find(|v| v.name == name)
    }

    pub fn value_by_number(&self, number: i32) -> Option<&EnumValue> {
        self.values.iter().find(|v| v.number == number)
    }

    /// Number of the first declared value; the default for enum fields.
    pub fn default_number(&self) -> i32 {
        self.values.first().map(|v| v.number).unwrap_or(0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("descriptor snapshot is not readable: {0}")]
    Snapshot(#[from] postcard::Error),
}

/// Registry of message types, enum types and extensions.
///
/// Passed explicitly to every parse and print call; there is no global
/// registry, so unrelated schemas never interfere.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DescriptorPool {
    messages: BTreeMap<String, MessageDescriptor>,
    enums: BTreeMap<String, EnumDescriptor>,
    extensions: Vec<FieldDescriptor>,
}

impl DescriptorPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_message(&mut self, message: MessageDescriptor) -> &mut Self {
        self.messages.insert(message.full_name.clone(), message);
        self
    }

    pub fn add_enum(&mut self, enum_type: EnumDescriptor) -> &mut Self {
        self.enums.insert(enum_type.full_name.clone(), enum_type);
        self
    }

    /// Registers an extension built with [`FieldDescriptor::extending`].
    pub fn add_extension(&mut self, extension: FieldDescriptor) -> &mut Self {
        debug_assert!(extension.is_extension(), "{} has no extendee", extension.name);
        self.extensions.push(extension);
        self
    }

    pub fn message(&self, full_name: &str) -> Option<&MessageDescriptor> {
        self.messages.get(full_name)
    }

    pub fn enum_type(&self, full_name: &str) -> Option<&EnumDescriptor> {
        self.enums.get(full_name)
    }

    pub fn messages(&self) -> impl Iterator<Item = &MessageDescriptor> {
        self.messages.values()
    }

    /// Name a message-set extension is written under: the full name of its
    /// message type, when the extension is the canonical optional message
    /// extension declared inside that same type.
    pub fn message_set_name<'a>(&self, extension: &'a FieldDescriptor) -> Option<&'a str> {
        let extendee = self.message(extension.extendee.as_deref()?)?;
        let type_name = extension.type_name.as_deref()?;
        let canonical = extendee.message_set
            && extension.field_type == FieldType::Message
            && extension.label == Label::Optional
            && extension.extension_scope.as_deref() == Some(type_name);
        canonical.then_some(type_name)
    }

    /// Looks up an extension by the name written between brackets.
    ///
    /// Any registered extension matching `name` is returned even when it
    /// extends a different type, so callers can report the mismatch.
    pub fn find_extension(&self, name: &str) -> Option<&FieldDescriptor> {
        self.extensions
            .iter()
            .find(|ext| ext.full_name == name)
            .or_else(|| {
                self.extensions
                    .iter()
                    .find(|ext| self.message_set_name(ext) == Some(name))
            })
    }

    pub fn extension_by_number(&self, extendee: &str, number: u32) -> Option<&FieldDescriptor> {
        self.extensions
            .iter()
            .find(|ext| ext.number == number && ext.extendee.as_deref() == Some(extendee))
    }

    pub fn extensions_of<'a>(
        &'a self,
        extendee: &'a str,
    ) -> impl Iterator<Item = &'a FieldDescriptor> + 'a {
        self.extensions
            .iter()
            .filter(move |ext| ext.extendee.as_deref() == Some(extendee))
    }

    /// Resolves a field number of `message` to a regular field or extension.
    pub fn field_for<'a>(
        &'a self,
        message: &'a MessageDescriptor,
        number: u32,
    ) -> Option<&'a FieldDescriptor> {
        message
            .field_by_number(number)
            .or_else(|| self.extension_by_number(&message.full_name, number))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, PoolError> {
        Ok(postcard::to_allocvec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PoolError> {
        Ok(postcard::from_bytes(bytes)?)
    }
}
