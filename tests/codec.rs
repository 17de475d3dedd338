// tests/codec.rs
//! Plain inputs through the write codec and back through the decoder.

use chrono::NaiveDate;
use notion_typed::codec::{from_plain, from_wire, read, to_wire};
use notion_typed::{AppError, DateValue, FileReference, PropertyInput, SimpleValue};
use pretty_assertions::assert_eq;
use serde_json::json;

const ADA: &str = "6794760a-1f15-45cd-9c65-0dfe42f5135a";
const GRACE: &str = "0c1f7cb2-8d2f-4f5e-9b7a-3c63c1e2a9d4";
const PAGE: &str = "b55c9c91-384d-452b-81db-d1ef79372b75";

/// Writes `input` into a property of `config_type` and reads the wire form back.
fn write_and_read(config_type: &str, input: impl Into<PropertyInput>) -> SimpleValue {
    let value = from_plain(config_type, input.into()).unwrap();
    let wire = to_wire(&value).unwrap();
    let item = from_wire(config_type, &wire).unwrap().unwrap();
    read(&item).unwrap()
}

#[test]
fn test_text_like_properties() {
    assert_eq!(write_and_read("title", "Quarterly plan"), "Quarterly plan");
    assert_eq!(write_and_read("rich_text", String::from("notes")), "notes");
    assert_eq!(write_and_read("email", "ada@example.com"), "ada@example.com");
    assert_eq!(write_and_read("url", "https://example.com/a"), "https://example.com/a");
    assert_eq!(write_and_read("select", "High"), "High");
    assert_eq!(write_and_read("phone_number", "+1 555 0100"), "+1 555 0100");
    assert_eq!(write_and_read("phone_number", None::<String>), SimpleValue::Null);
}

#[test]
fn test_numbers_and_flags() {
    assert_eq!(write_and_read("number", 2.5), 2.5);
    assert_eq!(write_and_read("number", 7_u32), 7.0);
    assert_eq!(write_and_read("checkbox", true), true);
    assert_eq!(write_and_read("number", None::<f64>), SimpleValue::Null);
}

#[test]
fn test_lists() {
    assert_eq!(
        write_and_read("multi_select", vec!["a", "b"]),
        SimpleValue::List(vec![
            SimpleValue::Text("a".to_string()),
            SimpleValue::Text("b".to_string())
        ])
    );
    assert_eq!(
        write_and_read("relation", PAGE),
        SimpleValue::List(vec![SimpleValue::Text(PAGE.to_string())])
    );

    let people = from_plain("people", vec![ADA, GRACE].into()).unwrap();
    assert_eq!(
        to_wire(&people).unwrap(),
        json!({"people": [
            {"object": "user", "id": ADA},
            {"object": "user", "id": GRACE}
        ]})
    );
}

#[test]
fn test_dates_keep_their_range() {
    let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();

    let value = from_plain("date", (start, end).into()).unwrap();
    let wire = to_wire(&value).unwrap();
    assert_eq!(wire["date"]["start"], "2024-03-01");
    assert_eq!(wire["date"]["end"], "2024-03-04");

    match write_and_read("date", DateValue::starting(start).with_end(end)) {
        SimpleValue::Date(date) => {
            assert_eq!(date.start.to_string(), "2024-03-01");
            assert_eq!(date.end.map(|end| end.to_string()), Some("2024-03-04".to_string()));
        }
        other => panic!("expected a date, got {:?}", other),
    }
}

#[test]
fn test_files_are_external_references() {
    let file = FileReference::external("spec.pdf", "https://example.com/spec.pdf");
    match write_and_read("files", vec![file]) {
        SimpleValue::List(files) => assert_eq!(files.len(), 1),
        other => panic!("expected a file list, got {:?}", other),
    }

    // An empty list clears the property, as it does for the other list types.
    let cleared = from_plain("files", PropertyInput::from_json(json!([])).unwrap()).unwrap();
    assert_eq!(to_wire(&cleared).unwrap(), json!({"files": []}));
    assert_eq!(write_and_read("files", Vec::<String>::new()), SimpleValue::List(vec![]));
}

#[test]
fn test_rejected_writes() {
    assert!(matches!(
        from_plain("rollup", PropertyInput::Number(1.0)),
        Err(AppError::UnsupportedWrite { .. })
    ));
    assert!(matches!(
        from_plain("multi_select", PropertyInput::Bool(true)),
        Err(AppError::ConfigurationMismatch { ref expected, .. }) if expected == "multi_select"
    ));
    assert!(matches!(
        from_plain("relation", "not a page".into()),
        Err(AppError::Validation(_))
    ));
}
