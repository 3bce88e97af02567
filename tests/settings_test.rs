mod common;

use serde_json::{Map, Value, json};

use resortadm::errors::AppError;
use resortadm::models::setting;

#[test]
fn every_section_is_seeded() {
    let conn = common::seeded_conn();
    for name in setting::SECTIONS {
        let entries = setting::find_section(&conn, name).unwrap();
        assert!(!entries.is_empty(), "section {name} is empty");
    }
    assert_eq!(setting::get_i64(&conn, "security", "session_timeout_minutes", 0), 120);
    assert!(!setting::get_bool(&conn, "backup", "auto_enabled", true));
}

#[test]
fn section_object_types_the_values() {
    let conn = common::seeded_conn();
    let entries = setting::find_section(&conn, "backup").unwrap();
    let obj = setting::section_object(&entries);

    assert_eq!(obj.get("auto_enabled"), Some(&Value::Bool(false)));
    assert_eq!(obj.get("keep_count"), Some(&Value::from(14)));
    assert_eq!(obj.get("interval_hours"), Some(&Value::from(24)));
}

#[test]
fn partial_update_touches_only_submitted_keys() {
    let mut conn = common::seeded_conn();
    let mut changes = Map::new();
    changes.insert("keep_count".to_string(), json!(7));

    let changed = setting::update_section(&mut conn, "backup", &changes).unwrap();
    assert_eq!(changed, vec!["keep_count".to_string()]);

    assert_eq!(setting::get_i64(&conn, "backup", "keep_count", 0), 7);
    // Untouched keys keep their values.
    assert_eq!(setting::get_i64(&conn, "backup", "interval_hours", 0), 24);
}

#[test]
fn invalid_key_rejects_the_whole_update() {
    let mut conn = common::seeded_conn();
    let mut changes = Map::new();
    changes.insert("keep_count".to_string(), json!(3));
    changes.insert("no_such_key".to_string(), json!("x"));

    match setting::update_section(&mut conn, "backup", &changes) {
        Err(AppError::Validation(fields)) => {
            assert_eq!(fields.get("no_such_key").map(String::as_str), Some("Unknown setting"));
        }
        other => panic!("expected Validation, got {other:?}"),
    }
    // The valid key in the same submission was not written either.
    assert_eq!(setting::get_i64(&conn, "backup", "keep_count", 0), 14);
}

#[test]
fn type_mismatch_is_a_field_error() {
    let mut conn = common::seeded_conn();
    let mut changes = Map::new();
    changes.insert("keep_count".to_string(), json!("fourteen"));

    match setting::update_section(&mut conn, "backup", &changes) {
        Err(AppError::Validation(fields)) => {
            assert!(fields.get("keep_count").unwrap().contains("number"));
        }
        other => panic!("expected Validation, got {other:?}"),
    }
}

#[test]
fn unknown_section_is_not_found() {
    let mut conn = common::seeded_conn();
    let changes = Map::new();
    assert!(matches!(
        setting::update_section(&mut conn, "spa", &changes),
        Err(AppError::NotFound)
    ));
}
