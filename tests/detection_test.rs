//! PII detection tests across name, schema and value signals

use serde_json::{json, Value};
use sieve::anonymization::detector::patterns::{is_credit_card, luhn_valid};
use sieve::anonymization::detector::HeuristicDetector;
use sieve::anonymization::{detect_pii, PiiDetector, PiiType};
use sieve::domain::{infer_schema, DataRecord, FieldType, SchemaField};

fn records(value: Value) -> Vec<DataRecord> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_object().unwrap().clone())
        .collect()
}

#[test]
fn test_luhn_checksum() {
    assert!(luhn_valid("79927398713"));
    assert!(!luhn_valid("79927398710"));
    assert!(!luhn_valid(""));
    assert!(!luhn_valid("4111a"));

    assert!(is_credit_card("4111 1111 1111 1111"));
    assert!(is_credit_card("5500-0000-0000-0004"));
    assert!(!is_credit_card("4111 1111 1111 1112"));
    assert!(!is_credit_card("4242"));
}

#[test]
fn test_card_numbers_found_by_value_alone() {
    let data = records(json!([
        {"payload": "4111 1111 1111 1111", "other": "4111 1111 1111 1112"},
        {"payload": "5500-0000-0000-0004", "other": "5500-0000-0000-0005"},
        {"payload": "4012888888881881", "other": "4012888888881882"}
    ]));

    let result = detect_pii(&data, &infer_schema(&data));

    assert_eq!(result.type_of("payload"), Some(PiiType::CreditCard));
    assert!(!result.is_detected("other"));
}

#[test]
fn test_name_and_value_signals_agree() {
    let data = records(json!([
        {"ssn": "123-45-6789", "amount": 10},
        {"ssn": "987-65-4321", "amount": 20}
    ]));

    let result = detect_pii(&data, &infer_schema(&data));

    assert_eq!(result.detected_fields.len(), 1);
    let ssn = &result.detected_fields[0];
    assert_eq!(ssn.pii_type, PiiType::Ssn);
    assert!((ssn.confidence - 1.0).abs() < 1e-9);
}

#[test]
fn test_confidence_threshold_is_exclusive() {
    // a token match on "name" alone scores 0.6
    let data = records(json!([{"nick_name": "x1"}, {"nick_name": "y2"}]));

    let default = HeuristicDetector::new().detect(&data, &infer_schema(&data));
    let detected = &default.detected_fields[0];
    assert_eq!(detected.pii_type, PiiType::Name);
    assert!((detected.confidence - 0.6).abs() < 1e-9);

    let at_score = HeuristicDetector::new()
        .with_confidence_threshold(0.6)
        .detect(&data, &infer_schema(&data));
    assert!(at_score.detected_fields.is_empty());

    let strict = HeuristicDetector::new()
        .with_confidence_threshold(0.7)
        .detect(&data, &infer_schema(&data));
    assert!(strict.detected_fields.is_empty());
}

#[test]
fn test_declared_schema_type_is_a_signal() {
    let data = records(json!([{"contact_info": "n/a"}, {"contact_info": "unknown"}]));
    let schema = vec![SchemaField::new("contact_info", FieldType::Email)];

    assert!(!detect_pii(&data, &infer_schema(&data)).is_detected("contact_info"));

    let result = detect_pii(&data, &schema);
    assert_eq!(result.type_of("contact_info"), Some(PiiType::Email));
    assert!((result.detected_fields[0].confidence - 0.7).abs() < 1e-9);
}

#[test]
fn test_dates_are_not_phone_numbers() {
    let data = records(json!([
        {"visited": "2024-01-05"},
        {"visited": "2024-02-11"},
        {"visited": "2023-12-30"}
    ]));

    let result = detect_pii(&data, &infer_schema(&data));
    assert_ne!(result.type_of("visited"), Some(PiiType::Phone));
}

#[test]
fn test_samples_are_distinct_and_bounded() {
    let data = records(json!([
        {"email": "a@example.com"},
        {"email": "a@example.com"},
        {"email": "b@example.com"},
        {"email": "c@example.com"},
        {"email": "d@example.com"}
    ]));

    let result = detect_pii(&data, &infer_schema(&data));
    let email = &result.detected_fields[0];
    assert_eq!(
        email.samples,
        vec!["a@example.com", "b@example.com", "c@example.com"]
    );
    assert_eq!(result.suggested_rules.len(), 1);
}

#[test]
fn test_empty_dataset_detects_nothing() {
    let result = detect_pii(&[], &[]);
    assert!(result.detected_fields.is_empty());
    assert!(result.suggested_rules.is_empty());

    // a declared schema alone is not evidence
    let schema = vec![
        SchemaField::new("email", FieldType::Email),
        SchemaField::new("phone", FieldType::Text),
    ];
    let result = detect_pii(&[], &schema);
    assert!(result.detected_fields.is_empty());
    assert!(result.suggested_rules.is_empty());

    // rows without a schema have no fields to score
    let data = records(json!([{"email": "alice@example.com"}]));
    assert!(detect_pii(&data, &[]).detected_fields.is_empty());
}
