//! Fuzz testing for page building and reading.
//!
//! Drives a PageBuilder with arbitrary setter sequences against an arbitrary
//! schema and a small page size, then checks that a PageReader decodes
//! exactly the values that were committed.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use pagestream::{read_values, HeapAllocator, PageBuilder, Schema, Timestamp, Type, Value};
use pagestream::pipeline::PageCollector;

#[derive(Debug, Arbitrary)]
struct PageBuilderInput {
    page_size: u16,
    schema: Vec<FuzzType>,
    operations: Vec<Operation>,
}

#[derive(Debug, Arbitrary, Clone, Copy)]
enum FuzzType {
    Boolean,
    Long,
    Double,
    String,
    Timestamp,
    Json,
}

#[derive(Debug, Arbitrary)]
enum Operation {
    SetNull(u8),
    SetBoolean(u8, bool),
    SetLong(u8, i64),
    SetDouble(u8, f64),
    SetString(u8, String),
    SetTimestamp(u8, i64, u32),
    SetJson(u8, Option<i64>),
    AddRecord,
    Flush,
}

impl From<FuzzType> for Type {
    fn from(ft: FuzzType) -> Self {
        match ft {
            FuzzType::Boolean => Type::Boolean,
            FuzzType::Long => Type::Long,
            FuzzType::Double => Type::Double,
            FuzzType::String => Type::String,
            FuzzType::Timestamp => Type::Timestamp,
            FuzzType::Json => Type::Json,
        }
    }
}

fuzz_target!(|input: PageBuilderInput| {
    if input.schema.len() > 32 {
        return;
    }

    let schema = input
        .schema
        .iter()
        .enumerate()
        .fold(Schema::builder(), |b, (i, t)| b.add(format!("c{}", i), (*t).into()))
        .build()
        .unwrap();
    let allocator = HeapAllocator::new(input.page_size as usize);
    let mut builder = PageBuilder::new(&schema, &allocator, PageCollector::new());

    let width = schema.column_count();
    let mut staged = vec![Value::Null; width];
    let mut expected = Vec::new();

    for op in input.operations {
        let (col, value) = match op {
            Operation::AddRecord => {
                builder.add_record().unwrap();
                expected.push(std::mem::replace(&mut staged, vec![Value::Null; width]));
                continue;
            }
            Operation::Flush => {
                builder.flush().unwrap();
                continue;
            }
            Operation::SetNull(c) => (c, Value::Null),
            Operation::SetBoolean(c, v) => (c, Value::Boolean(v)),
            Operation::SetLong(c, v) => (c, Value::Long(v)),
            Operation::SetDouble(c, v) if v.is_nan() => (c, Value::Double(0.0)),
            Operation::SetDouble(c, v) => (c, Value::Double(v)),
            Operation::SetString(c, v) => (c, Value::String(v)),
            Operation::SetTimestamp(c, secs, nanos) => {
                let Ok(ts) = Timestamp::new(secs, nanos) else {
                    continue;
                };
                (c, Value::Timestamp(ts))
            }
            Operation::SetJson(c, v) => (c, Value::Json(serde_json::json!({ "v": v }))),
        };

        let col = col as usize;
        let accepted = builder.set_value(col, &value).is_ok();
        let fits = col < width
            && (value.is_null() || schema.column_type(col) == value.value_type());
        assert_eq!(accepted, fits, "column {} value {:?}", col, value);
        if accepted {
            staged[col] = value;
        }
    }

    let pages = builder.finish().unwrap().into_pages();
    let total: u32 = pages.iter().map(|p| p.record_count().unwrap()).sum();
    assert_eq!(total as usize, expected.len());

    let decoded = read_values(&schema, pages).unwrap();
    assert_eq!(decoded, expected);
});
