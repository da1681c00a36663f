//! Property tests over whole-document round trips

use std::io::Cursor;

use once_cell::sync::Lazy;
use proptest::prelude::*;
use sheetmap::prelude::*;

#[derive(Debug, Default, Clone, PartialEq)]
struct Entry {
    count: i64,
    small: Option<i16>,
    flag: bool,
    label: String,
}

static ENTRY: Lazy<RecordDescriptor<Entry>> = Lazy::new(|| {
    RecordDescriptor::builder()
        .field("count", |r: &Entry| r.count, |r, v| r.count = v)
        .field("small", |r: &Entry| r.small, |r, v| r.small = v)
        .field("flag", |r: &Entry| r.flag, |r, v| r.flag = v)
        .field("label", |r: &Entry| r.label.clone(), |r, v| r.label = v)
        .build()
});

impl StructRecord for Entry {
    fn descriptor() -> &'static RecordDescriptor<Self> {
        &ENTRY
    }
}

fn row_strategy() -> impl Strategy<Value = Entry> {
    (
        any::<i64>(),
        proptest::option::of(any::<i16>()),
        any::<bool>(),
        "[A-Za-z0-9][A-Za-z0-9 ]{0,12}[A-Za-z0-9]",
    )
        .prop_map(|(count, small, flag, label)| Entry {
            count,
            small,
            flag,
            label,
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn lossless_fields_roundtrip_through_xlsx(rows in proptest::collection::vec(row_strategy(), 0..6)) {
        let mapper = Mapper::new();
        let mut buf = Cursor::new(Vec::new());
        let report = mapper
            .write_records_derived(&rows, &mut buf, &WriteOptions::default())
            .unwrap();
        prop_assert!(report.field_errors.is_empty());

        buf.set_position(0);
        let parsed: Parsed<Entry> = mapper
            .read_records(&HeaderMap::for_reading::<Entry>().unwrap(), buf, &ReadOptions::default())
            .unwrap();
        prop_assert!(parsed.cell_errors.is_empty());
        prop_assert_eq!(parsed.records, rows);
    }

    #[test]
    fn escape_like_text_roundtrips_through_xlsx(label in "[a-z]{0,3}(_x[0-9A-Fa-f]{4}_|_x|_){1,3}[a-z]{0,3}") {
        let rows = vec![Entry { label: label.clone(), ..Entry::default() }];
        let mapper = Mapper::new();
        let mut buf = Cursor::new(Vec::new());
        mapper
            .write_records_derived(&rows, &mut buf, &WriteOptions::default())
            .unwrap();

        buf.set_position(0);
        let parsed: Parsed<Entry> = mapper
            .read_records_for(buf, &ReadOptions::default())
            .unwrap();
        prop_assert_eq!(&parsed.records[0].label, &label);
    }

    #[test]
    fn every_field_error_is_reported(count in 0usize..8) {
        let rows = vec![Entry::default(); count];
        let map = HeaderMap::from_pairs([("count", "Count"), ("ghost", "Ghost")]).unwrap();
        let mut buf = Cursor::new(Vec::new());
        let report = Mapper::new()
            .save_if_no_errors(&map, &rows, &mut buf, &WriteOptions::default())
            .unwrap();

        prop_assert_eq!(report.field_errors.len(), count);
        prop_assert_eq!(report.committed, count == 0);
        let indices: Vec<usize> = report.field_errors.iter().map(|e| e.record_index).collect();
        prop_assert_eq!(indices, (0..count).collect::<Vec<_>>());
    }
}
