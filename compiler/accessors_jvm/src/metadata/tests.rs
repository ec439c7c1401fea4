#![allow(clippy::unwrap_used, clippy::expect_used)]

use accessors_ir::{ExtensionSpec, TypeSpec};
use pretty_assertions::assert_eq;

use super::*;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Value {
    Varint(u64),
    Bytes(Vec<u8>),
}

fn read_varint(bytes: &[u8], pos: &mut usize) -> u64 {
    let mut value = 0u64;
    let mut shift = 0;
    loop {
        let b = bytes[*pos];
        *pos += 1;
        value |= u64::from(b & 0x7F) << shift;
        if b & 0x80 == 0 {
            return value;
        }
        shift += 7;
    }
}

fn fields(bytes: &[u8]) -> Vec<(u64, Value)> {
    let mut pos = 0;
    let mut fields = Vec::new();
    while pos < bytes.len() {
        let tag = read_varint(bytes, &mut pos);
        let value = match tag & 7 {
            0 => Value::Varint(read_varint(bytes, &mut pos)),
            2 => {
                let len = read_varint(bytes, &mut pos) as usize;
                let value = bytes[pos..pos + len].to_vec();
                pos += len;
                Value::Bytes(value)
            }
            wire => panic!("unexpected wire type {wire}"),
        };
        fields.push((tag >> 3, value));
    }
    fields
}

fn bytes_of(value: &Value) -> &[u8] {
    match value {
        Value::Bytes(bytes) => bytes,
        Value::Varint(v) => panic!("expected bytes, found varint {v}"),
    }
}

fn decode_d1(strings: &[String]) -> Vec<u8> {
    let joined: String = strings.concat();
    let mut chars = joined.chars();
    assert_eq!(chars.next(), Some(UTF8_MODE_MARKER));
    chars.map(|c| u8::try_from(u32::from(c)).unwrap()).collect()
}

/// Split `d1` into the string table types and the package message.
fn split_payload(payload: &[u8]) -> (Vec<u8>, Vec<u8>) {
    let mut pos = 0;
    let len = read_varint(payload, &mut pos) as usize;
    (
        payload[pos..pos + len].to_vec(),
        payload[pos + len..].to_vec(),
    )
}

#[test]
fn flag_values() {
    assert_eq!(AccessorFlags::NON_INLINE_GETTER.bits(), 70);
}

#[test]
fn encode_bytes_marks_utf8_mode() {
    let strings = encode_bytes(&[0, 1, 0x7F, 0x80, 0xFF]);
    assert_eq!(strings, vec!["\u{0}\u{0}\u{1}\u{7f}\u{80}\u{ff}".to_owned()]);
}

#[test]
fn encode_bytes_of_nothing_is_marker_only() {
    assert_eq!(encode_bytes(&[]), vec!["\u{0}".to_owned()]);
}

#[test]
fn encode_bytes_splits_below_constant_limit() {
    let strings = encode_bytes(&[1u8; 70_000]);
    assert_eq!(strings.len(), 2);
    assert_eq!(strings[0].chars().count(), 65_533);
    assert_eq!(strings[1].chars().count(), 70_000 - 65_532);

    let wide = encode_bytes(&[0x80u8; 40_000]);
    assert_eq!(wide[0].chars().count(), 1 + 32_766);
    for string in &wide {
        assert!(crate::classfile::modified_utf8(string).len() <= 65_535);
    }
    assert_eq!(decode_d1(&wide), vec![0x80u8; 40_000]);
}

#[test]
fn string_table_runs_and_class_records() {
    let mut table = JvmStringTable::new();
    assert_eq!(table.string_index("a"), 0);
    assert_eq!(table.string_index("b"), 1);
    assert_eq!(table.qualified_class_name_index("x/Y"), 2);
    assert_eq!(table.string_index("c"), 3);
    assert_eq!(table.string_index("a"), 0);
    assert_eq!(table.qualified_class_name_index("x/Y"), 2);
    // The same text as a plain string is a separate entry.
    assert_eq!(table.string_index("x/Y"), 4);

    assert_eq!(table.strings(), &["a", "b", "Lx/Y;", "c", "x/Y"]);
    let records: Vec<_> = fields(&table.types_message().finish())
        .into_iter()
        .map(|(field, value)| {
            assert_eq!(field, 1);
            fields(bytes_of(&value))
        })
        .collect();
    assert_eq!(
        records,
        vec![
            vec![(1, Value::Varint(2))],
            vec![(3, Value::Varint(2))],
            vec![(1, Value::Varint(2))],
        ]
    );
}

#[test]
fn dollar_class_names_stay_verbatim() {
    let mut table = JvmStringTable::new();
    table.qualified_class_name_index("org/gradle/kotlin/dsl/A$bPluginGroup");
    assert_eq!(table.strings(), &["org/gradle/kotlin/dsl/A$bPluginGroup"]);
    assert_eq!(fields(&table.types_message().finish()).len(), 1);
}

#[test]
fn file_facade_header_describes_extension_property() {
    let extension = ExtensionSpec::new(
        "foo",
        TypeSpec::plugin_dependencies_spec(),
        TypeSpec::plugin_dependency_spec(),
    );
    let getter = MethodSignature::getter_for(&extension);

    let mut writer = FileFacadeHeaderWriter::new("kotlin-dsl-plugin-spec-accessors");
    writer.write_property_of(
        &extension.receiver_type.internal_name,
        &extension.return_type.internal_name,
        &extension.name,
        &getter,
        AccessorFlags::NON_INLINE_GETTER,
    );
    let metadata = writer.finish();

    assert_eq!(metadata.kind, 2);
    assert_eq!(
        metadata.data2,
        vec![
            "foo",
            "Lorg/gradle/plugin/use/PluginDependencySpec;",
            "Lorg/gradle/plugin/use/PluginDependenciesSpec;",
            "getFoo",
            "(Lorg/gradle/plugin/use/PluginDependenciesSpec;)Lorg/gradle/plugin/use/PluginDependencySpec;",
            "kotlin-dsl-plugin-spec-accessors",
        ]
    );

    let (types, package) = split_payload(&decode_d1(&metadata.data1));
    assert_eq!(
        fields(&types),
        vec![
            (1, Value::Bytes(vec![])),
            (1, Value::Bytes(vec![0x18, 0x02])),
            (1, Value::Bytes(vec![0x18, 0x02])),
            (1, Value::Bytes(vec![0x08, 0x03])),
        ]
    );

    let package = fields(&package);
    assert_eq!(package.len(), 2);
    assert_eq!(package[1], (101, Value::Varint(5)));
    assert_eq!(package[0].0, 4);

    let property = fields(bytes_of(&package[0].1));
    assert_eq!(property[0], (2, Value::Varint(0)));
    assert_eq!(property[1], (3, Value::Bytes(vec![0x30, 0x01])));
    assert_eq!(property[2], (5, Value::Bytes(vec![0x30, 0x02])));
    assert_eq!(property[3], (7, Value::Varint(70)));
    assert_eq!(property[4].0, 100);
    assert_eq!(property.len(), 5);

    let signature = fields(bytes_of(&property[4].1));
    assert_eq!(signature.len(), 1);
    assert_eq!(signature[0].0, 3);
    assert_eq!(
        fields(bytes_of(&signature[0].1)),
        vec![(1, Value::Varint(3)), (2, Value::Varint(4))]
    );
}

#[test]
fn implicit_module_name_is_not_recorded() {
    let metadata = FileFacadeHeaderWriter::new("main").finish();
    assert!(metadata.data2.is_empty());
    let (types, package) = split_payload(&decode_d1(&metadata.data1));
    assert!(types.is_empty());
    assert!(package.is_empty());
}

#[test]
fn annotation_elements_in_order() {
    let metadata = FileFacadeHeaderWriter::new("m").finish();
    let annotation = metadata.annotation();
    assert_eq!(annotation.type_desc, "Lkotlin/Metadata;");
    let names: Vec<_> = annotation.elements.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["mv", "bv", "k", "d1", "d2"]);
    assert_eq!(annotation.elements[2].1, ElementValue::Int(2));
    assert_eq!(
        annotation.elements[0].1,
        ElementValue::ints(&[1, 1, 16])
    );
}
