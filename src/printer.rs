use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::codec::{escape_bytes, escape_str, format_double, format_float, FloatFormat};
use crate::descriptor::{DescriptorPool, Delimiter, FieldDescriptor, MessageDescriptor};
use crate::message::{DynamicMessage, FieldValue};
use crate::value::Value;

/// Output settings for [`to_text`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintOptions {
    /// Everything on one line, fields separated by single spaces.
    pub as_one_line: bool,
    /// Keep non-ASCII text in string fields unescaped.
    pub as_utf8: bool,
    /// Use `< >` around nested messages instead of `{ }`.
    pub pointy_brackets: bool,
    /// Declaration order instead of field-number order.
    pub use_index_order: bool,
    /// Fixed formatting for every float and double.
    pub float_format: Option<FloatFormat>,
    /// Spaces before each top-level field.
    pub indent: usize,
}

impl PrintOptions {
    pub fn one_line(mut self) -> Self {
        self.as_one_line = true;
        self
    }

    pub fn utf8(mut self) -> Self {
        self.as_utf8 = true;
        self
    }

    pub fn pointy(mut self) -> Self {
        self.pointy_brackets = true;
        self
    }

    pub fn index_order(mut self) -> Self {
        self.use_index_order = true;
        self
    }

    pub fn float_format(mut self, format: FloatFormat) -> Self {
        self.float_format = Some(format);
        self
    }

    pub fn indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }
}

/// Renders messages as text.
pub struct Printer<'p> {
    pool: &'p DescriptorPool,
    options: PrintOptions,
    out: String,
}

impl<'p> Printer<'p> {
    pub fn new(pool: &'p DescriptorPool, options: PrintOptions) -> Self {
        Printer {
            pool,
            options,
            out: String::new(),
        }
    }

    /// Renders `message` and returns the text.
    pub fn print(mut self, message: &DynamicMessage) -> String {
        debug!(message_type = %message.type_name(), one_line = self.options.as_one_line, "printing text");
        self.print_message(message, self.options.indent);
        if self.options.as_one_line {
            let trimmed = self.out.trim_end().len();
            self.out.truncate(trimmed);
        }
        self.out
    }

    fn print_message(&mut self, message: &DynamicMessage, indent: usize) {
        let Some(descriptor) = self.pool.message(message.type_name()) else {
            return;
        };
        for (field, value) in self.ordered_fields(descriptor, message) {
            match value {
                FieldValue::Singular(v) => self.print_field(field, v, indent),
                FieldValue::Repeated(values) => {
                    for v in values {
                        self.print_field(field, v, indent);
                    }
                }
            }
        }
    }

    /// Set fields in output order. Fields unknown to the pool are dropped.
    fn ordered_fields<'m>(
        &self,
        descriptor: &'p MessageDescriptor,
        message: &'m DynamicMessage,
    ) -> Vec<(&'p FieldDescriptor, &'m FieldValue)> {
        let mut fields: Vec<_> = message
            .list_fields()
            .filter_map(|(number, value)| {
                self.pool
                    .field_for(descriptor, number)
                    .map(|field| (field, value))
            })
            .collect();

        if self.options.use_index_order {
            // Stable: extensions keep their number order after regular fields.
            fields.sort_by_key(|(field, _)| match descriptor.index_of(field.number) {
                Some(index) if !field.is_extension() => (0, index),
                _ => (1, 0),
            });
        }
        fields
    }

    fn field_name(&self, field: &FieldDescriptor) -> String {
        if field.is_extension() {
            let name = self
                .pool
                .message_set_name(field)
                .unwrap_or(field.full_name.as_str());
            return format!("[{}]", name);
        }
        if field.is_group() {
            if let Some(group) = field.type_name.as_deref().and_then(|t| self.pool.message(t)) {
                return group.name().to_string();
            }
        }
        field.name.clone()
    }

    fn delimiters(&self, field: &FieldDescriptor) -> (&'static str, &'static str) {
        let delimiter = field.delimiter.unwrap_or(if self.options.pointy_brackets {
            Delimiter::Angle
        } else {
            Delimiter::Brace
        });
        (delimiter.open(), delimiter.close())
    }

    fn print_field(&mut self, field: &FieldDescriptor, value: &Value, indent: usize) {
        let one_line = self.options.as_one_line;
        if !one_line {
            self.out.push_str(&" ".repeat(indent));
        }
        let name = self.field_name(field);
        self.out.push_str(&name);

        if let Value::Message(nested) = value {
            let (open, close) = self.delimiters(field);
            if one_line {
                self.out.push(' ');
                self.out.push_str(open);
                self.out.push(' ');
                self.print_message(nested, indent + 2);
                self.out.push_str(close);
                self.out.push(' ');
            } else {
                self.out.push(' ');
                self.out.push_str(open);
                self.out.push('\n');
                self.print_message(nested, indent + 2);
                self.out.push_str(&" ".repeat(indent));
                self.out.push_str(close);
                self.out.push('\n');
            }
            return;
        }

        self.out.push_str(": ");
        let text = self.scalar_text(field, value);
        self.out.push_str(&text);
        self.out.push(if one_line { ' ' } else { '\n' });
    }

    fn scalar_text(&self, field: &FieldDescriptor, value: &Value) -> String {
        match value {
            Value::Int32(v) => v.to_string(),
            Value::Int64(v) => v.to_string(),
            Value::UInt32(v) => v.to_string(),
            Value::UInt64(v) => v.to_string(),
            Value::Bool(v) => v.to_string(),
            Value::Float32(v) => match &self.options.float_format {
                Some(format) => format.apply(f64::from(*v)),
                None => format_float(*v),
            },
            Value::Float64(v) => match &self.options.float_format {
                Some(format) => format.apply(*v),
                None => format_double(*v),
            },
            Value::String(s) => format!("\"{}\"", escape_str(s, self.options.as_utf8)),
            Value::Bytes(b) => format!("\"{}\"", escape_bytes(b)),
            Value::Enum(number) => field
                .type_name
                .as_deref()
                .and_then(|t| self.pool.enum_type(t))
                .and_then(|e| e.value_by_number(*number))
                .map(|v| v.name.clone())
                .unwrap_or_else(|| number.to_string()),
            // Handled by `print_field`.
            Value::Message(_) => String::new(),
        }
    }
}

/// Renders `message` as text-format.
///
/// [`crate::parse`] reads the output back into an equal message, except when
/// an enum field holds a number its enum type does not declare. Such values
/// print as bare digits, which the parser rejects.
pub fn to_text(message: &DynamicMessage, pool: &DescriptorPool, options: &PrintOptions) -> String {
    Printer::new(pool, options.clone()).print(message)
}
