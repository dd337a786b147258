//! Test schema shaped after the classic `unittest.proto` messages.
#![allow(dead_code)]

use textproto::{
    DescriptorPool, DynamicMessage, EnumDescriptor, FieldDescriptor, FieldType, MessageDescriptor,
    Value,
};

pub const ALL_TYPES: &str = "protobuf_unittest.TestAllTypes";
pub const NESTED_MESSAGE: &str = "protobuf_unittest.TestAllTypes.NestedMessage";
pub const NESTED_ENUM: &str = "protobuf_unittest.TestAllTypes.NestedEnum";
pub const NESTED_ALL_TYPES: &str = "protobuf_unittest.NestedTestAllTypes";
pub const ALL_EXTENSIONS: &str = "protobuf_unittest.TestAllExtensions";
pub const FIELD_ORDERINGS: &str = "protobuf_unittest.TestFieldOrderings";
pub const MSET_CONTAINER: &str = "protobuf_unittest.TestMessageSetContainer";
pub const MSET: &str = "proto2_wireformat_unittest.TestMessageSet";
pub const MSET_EXT1: &str = "protobuf_unittest.TestMessageSetExtension1";
pub const MSET_EXT2: &str = "protobuf_unittest.TestMessageSetExtension2";

const SCALARS: [(&str, FieldType); 15] = [
    ("int32", FieldType::Int32),
    ("int64", FieldType::Int64),
    ("uint32", FieldType::UInt32),
    ("uint64", FieldType::UInt64),
    ("sint32", FieldType::SInt32),
    ("sint64", FieldType::SInt64),
    ("fixed32", FieldType::Fixed32),
    ("fixed64", FieldType::Fixed64),
    ("sfixed32", FieldType::SFixed32),
    ("sfixed64", FieldType::SFixed64),
    ("float", FieldType::Float),
    ("double", FieldType::Double),
    ("bool", FieldType::Bool),
    ("string", FieldType::String),
    ("bytes", FieldType::Bytes),
];

fn all_types() -> MessageDescriptor {
    let mut m = MessageDescriptor::new(ALL_TYPES);
    for (i, (suffix, ty)) in SCALARS.iter().enumerate() {
        m = m.field(FieldDescriptor::new(&format!("optional_{suffix}"), i as u32 + 1, *ty));
    }
    m = m
        .field(
            FieldDescriptor::new("optionalgroup", 16, FieldType::Group)
                .of_type("protobuf_unittest.TestAllTypes.OptionalGroup"),
        )
        .field(FieldDescriptor::new("optional_nested_message", 18, FieldType::Message).of_type(NESTED_MESSAGE))
        .field(
            FieldDescriptor::new("optional_foreign_message", 19, FieldType::Message)
                .of_type("protobuf_unittest.ForeignMessage"),
        )
        .field(FieldDescriptor::new("optional_nested_enum", 21, FieldType::Enum).of_type(NESTED_ENUM))
        .field(
            FieldDescriptor::new("optional_foreign_enum", 22, FieldType::Enum)
                .of_type("protobuf_unittest.ForeignEnum"),
        );
    for (i, (suffix, ty)) in SCALARS.iter().enumerate() {
        m = m.field(FieldDescriptor::new(&format!("repeated_{suffix}"), i as u32 + 31, *ty).repeated());
    }
    m.field(
        FieldDescriptor::new("repeatedgroup", 46, FieldType::Group)
            .of_type("protobuf_unittest.TestAllTypes.RepeatedGroup")
            .repeated(),
    )
    .field(
        FieldDescriptor::new("repeated_nested_message", 48, FieldType::Message)
            .of_type(NESTED_MESSAGE)
            .repeated(),
    )
    .field(
        FieldDescriptor::new("repeated_nested_enum", 51, FieldType::Enum)
            .of_type(NESTED_ENUM)
            .repeated(),
    )
    .field(FieldDescriptor::new("oneof_uint32", 111, FieldType::UInt32).in_oneof("oneof_field"))
    .field(
        FieldDescriptor::new("oneof_nested_message", 112, FieldType::Message)
            .of_type(NESTED_MESSAGE)
            .in_oneof("oneof_field"),
    )
    .field(FieldDescriptor::new("oneof_string", 113, FieldType::String).in_oneof("oneof_field"))
    .field(FieldDescriptor::new("oneof_bytes", 114, FieldType::Bytes).in_oneof("oneof_field"))
}

fn extensions(pool: &mut DescriptorPool) {
    let ext = |name: &str, number: u32, ty: FieldType| {
        FieldDescriptor::new(name, number, ty)
            .extending(ALL_EXTENSIONS, &format!("protobuf_unittest.{name}"))
    };
    pool.add_extension(ext("optional_int32_extension", 1, FieldType::Int32))
        .add_extension(ext("optional_string_extension", 14, FieldType::String))
        .add_extension(
            ext("optionalgroup_extension", 16, FieldType::Group)
                .of_type("protobuf_unittest.OptionalGroup_extension"),
        )
        .add_extension(ext("optional_nested_message_extension", 18, FieldType::Message).of_type(NESTED_MESSAGE))
        .add_extension(ext("optional_nested_enum_extension", 21, FieldType::Enum).of_type(NESTED_ENUM))
        .add_extension(ext("repeated_int32_extension", 31, FieldType::Int32).repeated())
        .add_extension(ext("repeated_double_extension", 42, FieldType::Double).repeated());
}

fn message_set(pool: &mut DescriptorPool) {
    pool.add_message(MessageDescriptor::new(MSET).extendable().message_set())
        .add_message(
            MessageDescriptor::new(MSET_CONTAINER)
                .field(FieldDescriptor::new("message_set", 1, FieldType::Message).of_type(MSET)),
        )
        .add_message(MessageDescriptor::new(MSET_EXT1).field(FieldDescriptor::new("i", 15, FieldType::Int32)))
        .add_message(
            MessageDescriptor::new(MSET_EXT2).field(FieldDescriptor::new("str", 25, FieldType::String)),
        );
    for (scope, number) in [(MSET_EXT1, 1545008), (MSET_EXT2, 1547769)] {
        pool.add_extension(
            FieldDescriptor::new("message_set_extension", number, FieldType::Message)
                .of_type(scope)
                .extending(MSET, &format!("{scope}.message_set_extension"))
                .scoped_in(scope),
        );
    }
}

pub fn unittest_pool() -> DescriptorPool {
    let mut pool = DescriptorPool::new();
    pool.add_enum(
        EnumDescriptor::new(NESTED_ENUM)
            .value("FOO", 1)
            .value("BAR", 2)
            .value("BAZ", 3)
            .value("NEG", -1),
    )
    .add_enum(
        EnumDescriptor::new("protobuf_unittest.ForeignEnum")
            .value("FOREIGN_FOO", 4)
            .value("FOREIGN_BAR", 5)
            .value("FOREIGN_BAZ", 6),
    )
    .add_message(all_types())
    .add_message(
        MessageDescriptor::new(NESTED_MESSAGE).field(FieldDescriptor::new("bb", 1, FieldType::Int32)),
    )
    .add_message(
        MessageDescriptor::new("protobuf_unittest.TestAllTypes.OptionalGroup")
            .field(FieldDescriptor::new("a", 17, FieldType::Int32)),
    )
    .add_message(
        MessageDescriptor::new("protobuf_unittest.TestAllTypes.RepeatedGroup")
            .field(FieldDescriptor::new("a", 47, FieldType::Int32)),
    )
    .add_message(
        MessageDescriptor::new("protobuf_unittest.ForeignMessage")
            .field(FieldDescriptor::new("c", 1, FieldType::Int32)),
    )
    .add_message(
        MessageDescriptor::new(NESTED_ALL_TYPES)
            .field(FieldDescriptor::new("child", 1, FieldType::Message).of_type(NESTED_ALL_TYPES))
            .field(FieldDescriptor::new("payload", 2, FieldType::Message).of_type(ALL_TYPES)),
    )
    .add_message(MessageDescriptor::new(ALL_EXTENSIONS).extendable())
    .add_message(
        MessageDescriptor::new("protobuf_unittest.OptionalGroup_extension")
            .field(FieldDescriptor::new("a", 17, FieldType::Int32)),
    )
    .add_message(
        MessageDescriptor::new(FIELD_ORDERINGS)
            .field(FieldDescriptor::new("my_string", 11, FieldType::String))
            .field(FieldDescriptor::new("my_int", 1, FieldType::Int64))
            .field(FieldDescriptor::new("my_float", 101, FieldType::Float))
            .field(
                FieldDescriptor::new("optional_nested_message", 200, FieldType::Message)
                    .of_type("protobuf_unittest.TestFieldOrderings.NestedMessage"),
            ),
    )
    .add_message(
        MessageDescriptor::new("protobuf_unittest.TestFieldOrderings.NestedMessage")
            .field(FieldDescriptor::new("oo", 2, FieldType::Int64))
            .field(FieldDescriptor::new("bb", 1, FieldType::Int32)),
    );
    extensions(&mut pool);
    message_set(&mut pool);
    pool
}

/// Regular field or extension of `type_name` by name.
pub fn field<'a>(pool: &'a DescriptorPool, type_name: &str, name: &str) -> &'a FieldDescriptor {
    pool.message(type_name)
        .and_then(|m| m.field_by_name(name))
        .or_else(|| pool.find_extension(name))
        .unwrap_or_else(|| panic!("no field {name} in {type_name}"))
}

pub fn nested(pool: &DescriptorPool, bb: i32) -> Value {
    let mut m = DynamicMessage::new(NESTED_MESSAGE);
    m.set(field(pool, NESTED_MESSAGE, "bb"), Value::Int32(bb));
    Value::Message(Box::new(m))
}

/// Populates every kind of field of `TestAllTypes`, in the manner of
/// `SetAllFields`.
pub fn set_all_fields(pool: &DescriptorPool) -> DynamicMessage {
    let f = |name: &str| field(pool, ALL_TYPES, name);
    let mut m = DynamicMessage::new(ALL_TYPES);

    m.set(f("optional_int32"), Value::Int32(101));
    m.set(f("optional_int64"), Value::Int64(102));
    m.set(f("optional_uint32"), Value::UInt32(103));
    m.set(f("optional_uint64"), Value::UInt64(104));
    m.set(f("optional_sint32"), Value::Int32(105));
    m.set(f("optional_sint64"), Value::Int64(106));
    m.set(f("optional_fixed32"), Value::UInt32(107));
    m.set(f("optional_fixed64"), Value::UInt64(108));
    m.set(f("optional_sfixed32"), Value::Int32(109));
    m.set(f("optional_sfixed64"), Value::Int64(110));
    m.set(f("optional_float"), Value::Float32(111.0));
    m.set(f("optional_double"), Value::Float64(112.0));
    m.set(f("optional_bool"), Value::Bool(true));
    m.set(f("optional_string"), Value::String("115".into()));
    m.set(f("optional_bytes"), Value::Bytes(b"116".to_vec()));

    let group_a = field(pool, "protobuf_unittest.TestAllTypes.OptionalGroup", "a");
    m.mutable_message(f("optionalgroup")).set(group_a, Value::Int32(117));
    m.set(f("optional_nested_message"), nested(pool, 118));
    let c = field(pool, "protobuf_unittest.ForeignMessage", "c");
    m.mutable_message(f("optional_foreign_message")).set(c, Value::Int32(119));
    m.set(f("optional_nested_enum"), Value::Enum(3));
    m.set(f("optional_foreign_enum"), Value::Enum(6));

    for base in [201, 301] {
        m.add_repeated(f("repeated_int32"), Value::Int32(base));
        m.add_repeated(f("repeated_int64"), Value::Int64(base as i64 + 1));
        m.add_repeated(f("repeated_uint32"), Value::UInt32(base as u32 + 2));
        m.add_repeated(f("repeated_uint64"), Value::UInt64(base as u64 + 3));
        m.add_repeated(f("repeated_sint32"), Value::Int32(base + 4));
        m.add_repeated(f("repeated_sint64"), Value::Int64(base as i64 + 5));
        m.add_repeated(f("repeated_fixed32"), Value::UInt32(base as u32 + 6));
        m.add_repeated(f("repeated_fixed64"), Value::UInt64(base as u64 + 7));
        m.add_repeated(f("repeated_sfixed32"), Value::Int32(base + 8));
        m.add_repeated(f("repeated_sfixed64"), Value::Int64(base as i64 + 9));
        m.add_repeated(f("repeated_float"), Value::Float32(base as f32 + 10.0));
        m.add_repeated(f("repeated_double"), Value::Float64(base as f64 + 11.0));
        m.add_repeated(f("repeated_bool"), Value::Bool(base == 201));
        m.add_repeated(f("repeated_string"), Value::String((base + 14).to_string()));
        m.add_repeated(f("repeated_bytes"), Value::Bytes((base + 15).to_string().into_bytes()));

        let group_a = field(pool, "protobuf_unittest.TestAllTypes.RepeatedGroup", "a");
        m.add_message(f("repeatedgroup")).set(group_a, Value::Int32(base + 16));
        m.add_repeated(f("repeated_nested_message"), nested(pool, base + 17));
        m.add_repeated(f("repeated_nested_enum"), Value::Enum(if base == 201 { 2 } else { 3 }));
    }

    m.set(f("oneof_uint32"), Value::UInt32(601));
    m
}

/// Populates a representative set of `TestAllExtensions` extensions.
pub fn set_all_extensions(pool: &DescriptorPool) -> DynamicMessage {
    let ext = |name: &str| {
        pool.find_extension(&format!("protobuf_unittest.{name}"))
            .unwrap_or_else(|| panic!("no extension {name}"))
    };
    let mut m = DynamicMessage::new(ALL_EXTENSIONS);
    m.set(ext("optional_int32_extension"), Value::Int32(101));
    m.set(ext("optional_string_extension"), Value::String("115".into()));
    let a = field(pool, "protobuf_unittest.OptionalGroup_extension", "a");
    m.mutable_message(ext("optionalgroup_extension")).set(a, Value::Int32(117));
    m.set(ext("optional_nested_message_extension"), nested(pool, 118));
    m.set(ext("optional_nested_enum_extension"), Value::Enum(3));
    for v in [201, 301] {
        m.add_repeated(ext("repeated_int32_extension"), Value::Int32(v));
    }
    m.add_repeated(ext("repeated_double_extension"), Value::Float64(212.0));
    m
}
