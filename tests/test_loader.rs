//! Tests for ARFF loading and writing

use kddlab::pipeline::{parse_arff, write_arff, AttributeType};

#[path = "common/mod.rs"]
mod common;

#[test]
fn test_load_generated_kdd_file() {
    let text = common::kdd_arff(120, 1);
    let ds = parse_arff(text.as_bytes()).unwrap();

    assert_eq!(ds.relation(), "KDDTrain");
    assert_eq!(ds.height(), 120);
    assert_eq!(ds.attributes().len(), 9);
    assert_eq!(
        ds.attribute("flag").unwrap().kind,
        AttributeType::Nominal(vec!["SF".into(), "S0".into(), "REJ".into()])
    );
    assert_eq!(ds.attribute("same_srv_rate").unwrap().kind, AttributeType::Real);
    assert_eq!(
        ds.attribute("dst_host_srv_count").unwrap().kind,
        AttributeType::Integer
    );
}

#[test]
fn test_protocols_cycle_in_fixture() {
    let ds = parse_arff(common::kdd_arff(9, 3).as_bytes()).unwrap();
    let protocols = ds.string_values("protocol_type").unwrap();
    assert_eq!(protocols[0].as_deref(), Some("tcp"));
    assert_eq!(protocols[1].as_deref(), Some("udp"));
    assert_eq!(protocols[2].as_deref(), Some("icmp"));
    assert_eq!(protocols[3].as_deref(), Some("tcp"));
}

#[test]
fn test_question_mark_is_missing() {
    let text = "@relation r\n@attribute a numeric\n@attribute b string\n@data\n?,?\n1,'?'\n";
    let ds = parse_arff(text.as_bytes()).unwrap();
    assert_eq!(ds.numeric_values("a").unwrap(), vec![None, Some(1.0)]);
    // a quoted question mark is a literal string
    assert_eq!(
        ds.string_values("b").unwrap(),
        vec![None, Some("?".to_string())]
    );
}

#[test]
fn test_header_keywords_are_case_insensitive() {
    let text = "@RELATION r\n@ATTRIBUTE a NUMERIC\n@DATA\n4\n";
    let ds = parse_arff(text.as_bytes()).unwrap();
    assert_eq!(ds.numeric_values("a").unwrap(), vec![Some(4.0)]);
}

#[test]
fn test_header_only_file_is_empty_table() {
    let text = "@relation r\n@attribute a numeric\n@data\n";
    let ds = parse_arff(text.as_bytes()).unwrap();
    assert!(ds.is_empty());
    assert_eq!(ds.attributes().len(), 1);
}

#[test]
fn test_non_numeric_value_reports_line() {
    let text = "@relation r\n@attribute a numeric\n@data\n1\nabc\n";
    let err = parse_arff(text.as_bytes()).unwrap_err();
    assert_eq!(err.kind(), "parse_error");
    assert!(err.to_string().contains("line 5"));
}

#[test]
fn test_invalid_utf8_rejected() {
    let bytes = b"@relation r\n@attribute a string\n@data\n\xff\xfe\n";
    let err = parse_arff(bytes).unwrap_err();
    assert_eq!(err.kind(), "parse_error");
}

#[test]
fn test_round_trip_generated_file() {
    let ds = parse_arff(common::kdd_arff(60, 5).as_bytes()).unwrap();
    let again = parse_arff(write_arff(&ds).unwrap().as_bytes()).unwrap();

    assert_eq!(again.schema(), ds.schema());
    assert_eq!(again.relation(), ds.relation());
    for column in ["src_bytes", "dst_bytes", "same_srv_rate"] {
        assert_eq!(
            again.numeric_values(column).unwrap(),
            ds.numeric_values(column).unwrap()
        );
    }
    assert_eq!(
        again.string_values("class").unwrap(),
        ds.string_values("class").unwrap()
    );
}
