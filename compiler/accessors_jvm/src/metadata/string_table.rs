//! JVM string table for Kotlin metadata.
//!
//! Every name in the metadata protobuf is an index into this table. The
//! table itself travels in two parts: the strings go to `d2`, and a
//! `StringTableTypes` message describing how to interpret them is written
//! ahead of the metadata payload in `d1`.
//!
//! Runs of plain strings share one record whose `range` covers them all.
//! Class names are stored in descriptor form (`La/B;`) with a
//! `DESC_TO_CLASS_ID` operation that turns them back into class ids.

use rustc_hash::FxHashMap;

use super::protobuf::ProtoWriter;

// StringTableTypes
const STRING_TABLE_RECORD: u32 = 1;

// StringTableTypes.Record
const RECORD_RANGE: u32 = 1;
const RECORD_OPERATION: u32 = 3;

/// `Record.Operation.DESC_TO_CLASS_ID`
const OPERATION_DESC_TO_CLASS_ID: i32 = 2;

#[derive(Clone, Debug, PartialEq, Eq)]
struct Record {
    range: i32,
    operation: Option<i32>,
}

impl Record {
    fn plain() -> Self {
        Self {
            range: 1,
            operation: None,
        }
    }

    fn is_trivial(&self) -> bool {
        self.operation.is_none()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Key<'a> {
    Plain(&'a str),
    ClassName(&'a str),
}

#[derive(Debug, Default)]
pub struct JvmStringTable {
    strings: Vec<String>,
    records: Vec<Record>,
    plain: FxHashMap<String, i32>,
    class_names: FxHashMap<String, i32>,
}

impl JvmStringTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `value` as a plain string.
    pub fn string_index(&mut self, value: &str) -> i32 {
        self.index_of(Key::Plain(value))
    }

    /// Index of the class with internal name `internal_name` as a class id.
    pub fn qualified_class_name_index(&mut self, internal_name: &str) -> i32 {
        self.index_of(Key::ClassName(internal_name))
    }

    pub fn strings(&self) -> &[String] {
        &self.strings
    }

    fn index_of(&mut self, key: Key<'_>) -> i32 {
        let (map, value) = match key {
            Key::Plain(value) => (&self.plain, value),
            Key::ClassName(value) => (&self.class_names, value),
        };
        if let Some(&index) = map.get(value) {
            return index;
        }

        let index = i32::try_from(self.strings.len()).unwrap_or(i32::MAX);
        match key {
            Key::Plain(value) => {
                self.strings.push(value.to_owned());
                self.extend_or_add_plain_record();
                self.plain.insert(value.to_owned(), index);
            }
            // A `$` would read back as a nested class separator, so such
            // names are stored verbatim: a plain entry is already a valid
            // class id string.
            Key::ClassName(value) if value.contains('$') => {
                self.strings.push(value.to_owned());
                self.extend_or_add_plain_record();
                self.class_names.insert(value.to_owned(), index);
            }
            Key::ClassName(value) => {
                self.strings.push(format!("L{value};"));
                self.records.push(Record {
                    range: 1,
                    operation: Some(OPERATION_DESC_TO_CLASS_ID),
                });
                self.class_names.insert(value.to_owned(), index);
            }
        }
        index
    }

    fn extend_or_add_plain_record(&mut self) {
        match self.records.last_mut() {
            Some(last) if last.is_trivial() => last.range += 1,
            _ => self.records.push(Record::plain()),
        }
    }

    /// Encode the `StringTableTypes` message.
    pub(crate) fn types_message(&self) -> ProtoWriter {
        let mut types = ProtoWriter::new();
        for record in &self.records {
            let mut message = ProtoWriter::new();
            if record.range != 1 {
                message.int32_field(RECORD_RANGE, record.range);
            }
            if let Some(operation) = record.operation {
                message.int32_field(RECORD_OPERATION, operation);
            }
            types.message_field(STRING_TABLE_RECORD, message);
        }
        types
    }
}
