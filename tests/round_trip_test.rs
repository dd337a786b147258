//! Printing then parsing gives back the same message.

mod common;

use common::*;
use proptest::prelude::*;
use rstest::rstest;
use textproto::{to_text, DescriptorPool, DynamicMessage, PrintOptions, Value};

fn reparse(m: &DynamicMessage, pool: &DescriptorPool, options: &PrintOptions) -> DynamicMessage {
    let text = to_text(m, pool, options);
    let mut parsed = DynamicMessage::new(m.type_name());
    textproto::parse(&text, &mut parsed, pool)
        .unwrap_or_else(|e| panic!("{e}\n--- text ---\n{text}"));
    parsed
}

#[rstest]
#[case::multi_line(PrintOptions::default())]
#[case::one_line(PrintOptions::default().one_line())]
#[case::utf8(PrintOptions::default().utf8())]
#[case::one_line_utf8(PrintOptions::default().one_line().utf8())]
#[case::pointy(PrintOptions::default().pointy())]
#[case::index_order(PrintOptions::default().index_order())]
fn test_all_fields_round_trip(#[case] options: PrintOptions) {
    let pool = unittest_pool();
    let m = set_all_fields(&pool);
    assert_eq!(reparse(&m, &pool, &options), m);
}

#[rstest]
#[case::multi_line(PrintOptions::default())]
#[case::one_line(PrintOptions::default().one_line())]
fn test_all_extensions_round_trip(#[case] options: PrintOptions) {
    let pool = unittest_pool();
    let m = set_all_extensions(&pool);
    assert_eq!(reparse(&m, &pool, &options), m);
}

#[test]
fn test_exotic_strings_round_trip() {
    let pool = unittest_pool();
    let mut m = DynamicMessage::new(ALL_TYPES);
    let strings = field(&pool, ALL_TYPES, "repeated_string");
    m.add_repeated(strings, Value::String("\0\u{1}\u{7}\u{8}\u{c}\n\r\t\u{b}\\'\"".into()));
    m.add_repeated(strings, Value::String("\u{fc}\u{a71f}".into()));
    for options in [
        PrintOptions::default().one_line(),
        PrintOptions::default().one_line().utf8(),
    ] {
        assert_eq!(reparse(&m, &pool, &options), m);
    }
}

#[test]
fn test_message_set_round_trip() {
    let pool = unittest_pool();
    let mut m = DynamicMessage::new(MSET_CONTAINER);
    let set = m.mutable_message(field(&pool, MSET_CONTAINER, "message_set"));
    let ext = pool.find_extension(MSET_EXT1).unwrap();
    set.mutable_message(ext)
        .set(field(&pool, MSET_EXT1, "i"), Value::Int32(-3));
    assert_eq!(reparse(&m, &pool, &PrintOptions::default()), m);
}

#[test]
fn test_pool_snapshot_round_trip() {
    let pool = unittest_pool();
    let bytes = pool.to_bytes().unwrap();
    let restored = DescriptorPool::from_bytes(&bytes).unwrap();
    assert_eq!(restored, pool);

    let m = set_all_fields(&restored);
    assert_eq!(reparse(&m, &restored, &PrintOptions::default()), m);
}

#[test]
fn test_pool_snapshot_rejects_garbage() {
    assert!(DescriptorPool::from_bytes(&[0xff, 0xff, 0xff]).is_err());
}

#[rstest]
#[case::infinity(f32::INFINITY, f64::INFINITY)]
#[case::neg_infinity(f32::NEG_INFINITY, f64::NEG_INFINITY)]
#[case::neg_zero(-0.0, -0.0)]
fn test_non_finite_floats_round_trip(
    #[case] f32_value: f32,
    #[case] f64_value: f64,
    #[values(PrintOptions::default(), PrintOptions::default().one_line())] options: PrintOptions,
) {
    let pool = unittest_pool();
    let f = |name| field(&pool, ALL_TYPES, name);
    let mut m = DynamicMessage::new(ALL_TYPES);
    m.set(f("optional_float"), Value::Float32(f32_value));
    m.set(f("optional_double"), Value::Float64(f64_value));
    m.add_repeated(f("repeated_float"), Value::Float32(f32_value));
    m.add_repeated(f("repeated_double"), Value::Float64(f64_value));

    let parsed = reparse(&m, &pool, &options);
    assert_eq!(parsed, m);
    // `==` cannot tell the zeros apart.
    let sign = |v: Option<&Value>| match v {
        Some(Value::Float64(d)) => d.is_sign_negative(),
        Some(Value::Float32(d)) => d.is_sign_negative(),
        _ => false,
    };
    assert_eq!(sign(parsed.get(f("optional_double"))), f64_value.is_sign_negative());
    assert_eq!(sign(parsed.get(f("optional_float"))), f32_value.is_sign_negative());
}

#[test]
fn test_infinity_prints_as_parsable_literal() {
    let pool = unittest_pool();
    let mut m = DynamicMessage::new(ALL_TYPES);
    m.set(field(&pool, ALL_TYPES, "optional_double"), Value::Float64(f64::INFINITY));
    let text = to_text(&m, &pool, &PrintOptions::default());
    assert_eq!(text, "optional_double: inf\n");
    assert_eq!(reparse(&m, &pool, &PrintOptions::default()), m);
}

#[test]
fn test_unknown_enum_number_is_outside_round_trip() {
    let pool = unittest_pool();
    let mut m = DynamicMessage::new(ALL_TYPES);
    m.set(field(&pool, ALL_TYPES, "optional_nested_enum"), Value::Enum(42));
    let text = to_text(&m, &pool, &PrintOptions::default());
    let mut parsed = DynamicMessage::new(ALL_TYPES);
    let err = textproto::parse(&text, &mut parsed, &pool).unwrap_err();
    assert_eq!(
        err.message,
        "Enum type \"protobuf_unittest.TestAllTypes.NestedEnum\" has no value with number 42."
    );
}

fn scalar_message(
    pool: &DescriptorPool,
    text: &str,
    bytes: &[u8],
    ints: (i32, i64, u32, u64),
    floats: (f32, f64),
) -> DynamicMessage {
    let f = |name| field(pool, ALL_TYPES, name);
    let mut m = DynamicMessage::new(ALL_TYPES);
    m.set(f("optional_string"), Value::String(text.to_string()));
    m.set(f("optional_bytes"), Value::Bytes(bytes.to_vec()));
    m.set(f("optional_sint32"), Value::Int32(ints.0));
    m.set(f("optional_sfixed64"), Value::Int64(ints.1));
    m.set(f("optional_fixed32"), Value::UInt32(ints.2));
    m.set(f("optional_uint64"), Value::UInt64(ints.3));
    m.set(f("optional_float"), Value::Float32(floats.0));
    m.set(f("optional_double"), Value::Float64(floats.1));
    m.add_repeated(f("repeated_string"), Value::String(text.chars().rev().collect()));
    m
}

proptest! {
    #[test]
    fn prop_scalars_round_trip(
        text in any::<String>(),
        bytes in prop::collection::vec(any::<u8>(), 0..64),
        ints in (any::<i32>(), any::<i64>(), any::<u32>(), any::<u64>()),
        f32_value in prop::num::f32::ANY.prop_filter("nan", |v| !v.is_nan()),
        f64_value in prop::num::f64::ANY.prop_filter("nan", |v| !v.is_nan()),
        one_line in any::<bool>(),
        utf8 in any::<bool>(),
    ) {
        let pool = unittest_pool();
        let m = scalar_message(&pool, &text, &bytes, ints, (f32_value, f64_value));
        let options = PrintOptions { as_one_line: one_line, as_utf8: utf8, ..Default::default() };
        prop_assert_eq!(reparse(&m, &pool, &options), m);
    }

    #[test]
    fn prop_nested_depth_round_trip(depth in 0usize..40, leaf in any::<i32>()) {
        let pool = unittest_pool();
        let mut m = DynamicMessage::new(NESTED_ALL_TYPES);
        let child = field(&pool, NESTED_ALL_TYPES, "child");
        let payload = field(&pool, NESTED_ALL_TYPES, "payload");
        let mut cursor = &mut m;
        for _ in 0..depth {
            cursor = cursor.mutable_message(child);
        }
        cursor
            .mutable_message(payload)
            .set(field(&pool, ALL_TYPES, "optional_int32"), Value::Int32(leaf));
        prop_assert_eq!(reparse(&m, &pool, &PrintOptions::default().pointy()), m);
    }
}
