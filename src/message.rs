use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::descriptor::{DescriptorPool, FieldDescriptor};
use crate::value::Value;

/// Storage for one field of a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Singular(Value),
    /// Never empty; clearing the last element removes the entry.
    Repeated(Vec<Value>),
}

/// A message instance whose shape comes from a [`MessageDescriptor`].
///
/// Fields are keyed by number, so regular fields and extensions share one
/// map. Presence is tracked explicitly: a singular field set to its default
/// still counts as present.
///
/// [`MessageDescriptor`]: crate::descriptor::MessageDescriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicMessage {
    type_name: String,
    fields: BTreeMap<u32, FieldValue>,
    /// oneof name -> number of the member currently set.
    oneof_cases: BTreeMap<String, u32>,
}

impl DynamicMessage {
    pub fn new(type_name: &str) -> Self {
        DynamicMessage {
            type_name: type_name.to_string(),
            fields: BTreeMap::new(),
            oneof_cases: BTreeMap::new(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn has_field(&self, field: &FieldDescriptor) -> bool {
        self.fields.contains_key(&field.number)
    }

    /// Value of a singular field, if set.
    pub fn get(&self, field: &FieldDescriptor) -> Option<&Value> {
        match self.fields.get(&field.number) {
            Some(FieldValue::Singular(v)) => Some(v),
            _ => None,
        }
    }

    /// Value of a singular field, or its schema default.
    pub fn get_or_default(&self, field: &FieldDescriptor, pool: &DescriptorPool) -> Value {
        self.get(field)
            .cloned()
            .unwrap_or_else(|| Value::default_for(field, pool))
    }

    pub fn get_repeated(&self, field: &FieldDescriptor) -> &[Value] {
        match self.fields.get(&field.number) {
            Some(FieldValue::Repeated(values)) => values,
            _ => &[],
        }
    }

    /// Sets a singular field. Setting a oneof member clears its siblings.
    pub fn set(&mut self, field: &FieldDescriptor, value: Value) {
        debug_assert!(!field.is_repeated(), "{} is repeated", field.full_name);
        debug_assert!(value.fits(field.field_type), "{} type mismatch", field.full_name);
        self.claim_oneof(field);
        self.fields.insert(field.number, FieldValue::Singular(value));
    }

    pub fn add_repeated(&mut self, field: &FieldDescriptor, value: Value) {
        debug_assert!(field.is_repeated(), "{} is not repeated", field.full_name);
        debug_assert!(value.fits(field.field_type), "{} type mismatch", field.full_name);
        match self
            .fields
            .entry(field.number)
            .or_insert_with(|| FieldValue::Repeated(Vec::new()))
        {
            FieldValue::Repeated(values) => values.push(value),
            slot => *slot = FieldValue::Repeated(vec![value]),
        }
    }

    /// Nested message of a singular message field, created empty if unset.
    pub fn mutable_message(&mut self, field: &FieldDescriptor) -> &mut DynamicMessage {
        debug_assert!(!field.is_repeated(), "{} is repeated", field.full_name);
        self.claim_oneof(field);
        let type_name = field.type_name.as_deref().unwrap_or_default();
        let slot = self
            .fields
            .entry(field.number)
            .or_insert_with(|| FieldValue::Singular(empty_message(type_name)));
        singular_message(slot, type_name)
    }

    /// Appends an empty element to a repeated message field.
    pub fn add_message(&mut self, field: &FieldDescriptor) -> &mut DynamicMessage {
        debug_assert!(field.is_repeated(), "{} is not repeated", field.full_name);
        let type_name = field.type_name.as_deref().unwrap_or_default();
        let slot = self
            .fields
            .entry(field.number)
            .or_insert_with(|| FieldValue::Repeated(Vec::new()));
        pushed_message(slot, type_name)
    }

    /// Removes a singular message field and returns it, or an empty message
    /// of the right type when it was unset.
    pub fn take_message(&mut self, field: &FieldDescriptor) -> DynamicMessage {
        match self.fields.remove(&field.number) {
            Some(FieldValue::Singular(Value::Message(m))) => {
                self.release_oneof(field);
                *m
            }
            other => {
                if let Some(other) = other {
                    self.fields.insert(field.number, other);
                }
                DynamicMessage::new(field.type_name.as_deref().unwrap_or_default())
            }
        }
    }

    pub fn clear_field(&mut self, field: &FieldDescriptor) {
        if self.fields.remove(&field.number).is_some() {
            self.release_oneof(field);
        }
    }

    pub fn clear(&mut self) {
        self.fields.clear();
        self.oneof_cases.clear();
    }

    /// Number of the member of `oneof` that is currently set.
    pub fn which_oneof(&self, oneof: &str) -> Option<u32> {
        self.oneof_cases.get(oneof).copied()
    }

    /// Set fields in ascending field-number order.
    pub fn list_fields(&self) -> impl Iterator<Item = (u32, &FieldValue)> {
        self.fields.iter().map(|(number, value)| (*number, value))
    }

    fn claim_oneof(&mut self, field: &FieldDescriptor) {
        let Some(oneof) = &field.oneof else {
            return;
        };
        if let Some(previous) = self.oneof_cases.insert(oneof.clone(), field.number) {
            if previous != field.number {
                self.fields.remove(&previous);
            }
        }
    }

    fn release_oneof(&mut self, field: &FieldDescriptor) {
        if let Some(oneof) = &field.oneof {
            if self.oneof_cases.get(oneof) == Some(&field.number) {
                self.oneof_cases.remove(oneof);
            }
        }
    }
}

fn empty_message(type_name: &str) -> Value {
    Value::Message(Box::new(DynamicMessage::new(type_name)))
}

/// The message held in `slot`, replacing any other value.
fn message_in<'a>(slot: &'a mut Value, type_name: &str) -> &'a mut DynamicMessage {
    match slot {
        Value::Message(m) => m,
        other => {
            *other = empty_message(type_name);
            message_in(other, type_name)
        }
    }
}

fn singular_message<'a>(slot: &'a mut FieldValue, type_name: &str) -> &'a mut DynamicMessage {
    match slot {
        FieldValue::Singular(value) => message_in(value, type_name),
        other => {
            *other = FieldValue::Singular(empty_message(type_name));
            singular_message(other, type_name)
        }
    }
}

fn pushed_message<'a>(slot: &'a mut FieldValue, type_name: &str) -> &'a mut DynamicMessage {
    match slot {
        FieldValue::Repeated(values) => {
            values.push(empty_message(type_name));
            let last = values.len() - 1;
            message_in(&mut values[last], type_name)
        }
        other => {
            *other = FieldValue::Repeated(Vec::new());
            pushed_message(other, type_name)
        }
    }
}
