use serde::{Deserialize, Serialize};

use crate::descriptor::{DescriptorPool, FieldDescriptor, FieldType};
use crate::message::DynamicMessage;

/// A single field value.
///
/// Exactly one variant is active; parser and printer match on it
/// exhaustively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Int32(i32),
    Int64(i64),
    UInt32(u32),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    Bool(bool),

    /// Text; always valid UTF-8.
    String(String),

    /// Arbitrary bytes.
    Bytes(Vec<u8>),

    /// Enum value number.
    Enum(i32),

    /// Nested message or group.
    Message(Box<DynamicMessage>),
}

impl Value {
    /// Schema default for a singular `field`.
    pub fn default_for(field: &FieldDescriptor, pool: &DescriptorPool) -> Value {
        match field.field_type {
            FieldType::Int32 | FieldType::SInt32 | FieldType::SFixed32 => Value::Int32(0),
            FieldType::Int64 | FieldType::SInt64 | FieldType::SFixed64 => Value::Int64(0),
            FieldType::UInt32 | FieldType::Fixed32 => Value::UInt32(0),
            FieldType::UInt64 | FieldType::Fixed64 => Value::UInt64(0),
            FieldType::Float => Value::Float32(0.0),
            FieldType::Double => Value::Float64(0.0),
            FieldType::Bool => Value::Bool(false),
            FieldType::String => Value::String(String::new()),
            FieldType::Bytes => Value::Bytes(Vec::new()),
            FieldType::Enum => Value::Enum(
                field
                    .type_name
                    .as_deref()
                    .and_then(|name| pool.enum_type(name))
                    .map(|e| e.default_number())
                    .unwrap_or(0),
            ),
            FieldType::Message | FieldType::Group => Value::Message(Box::new(
                DynamicMessage::new(field.type_name.as_deref().unwrap_or_default()),
            )),
        }
    }

    /// Whether this variant is the storage type for `field_type`.
    pub fn fits(&self, field_type: FieldType) -> bool {
        matches!(
            (self, field_type),
            (
                Value::Int32(_),
                FieldType::Int32 | FieldType::SInt32 | FieldType::SFixed32
            ) | (
                Value::Int64(_),
                FieldType::Int64 | FieldType::SInt64 | FieldType::SFixed64
            ) | (Value::UInt32(_), FieldType::UInt32 | FieldType::Fixed32)
                | (Value::UInt64(_), FieldType::UInt64 | FieldType::Fixed64)
                | (Value::Float32(_), FieldType::Float)
                | (Value::Float64(_), FieldType::Double)
                | (Value::Bool(_), FieldType::Bool)
                | (Value::String(_), FieldType::String)
                | (Value::Bytes(_), FieldType::Bytes)
                | (Value::Enum(_), FieldType::Enum)
                | (Value::Message(_), FieldType::Message | FieldType::Group)
        )
    }

    pub fn as_message(&self) -> Option<&DynamicMessage> {
        match self {
            Value::Message(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_message_mut(&mut self) -> Option<&mut DynamicMessage> {
        match self {
            Value::Message(m) => Some(m),
            _ => None,
        }
    }
}
