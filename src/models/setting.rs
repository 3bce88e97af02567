use rusqlite::{Connection, params};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::errors::{AppError, FieldErrors};

/// The fixed settings sections, in display order.
pub const SECTIONS: &[&str] = &[
    "general",
    "security",
    "backup",
    "notifications",
    "integrations",
    "maintenance",
];

/// One configuration entry. `value_type` drives how `value` is typed on the
/// wire: "text", "number", or "boolean".
#[derive(Debug, Clone, Serialize)]
pub struct Setting {
    pub id: i64,
    pub section: String,
    pub key: String,
    pub value: String,
    pub value_type: String,
}

impl Setting {
    /// The JSON representation of this setting's value.
    pub fn json_value(&self) -> Value {
        match self.value_type.as_str() {
            "number" => self
                .value
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or_else(|_| Value::String(self.value.clone())),
            "boolean" => Value::Bool(self.value == "true"),
            _ => Value::String(self.value.clone()),
        }
    }
}

pub fn find_all(conn: &Connection) -> rusqlite::Result<Vec<Setting>> {
    let mut stmt = conn.prepare(
        "SELECT id, section, key, value, value_type FROM settings ORDER BY section, key",
    )?;
    let settings = stmt
        .query_map([], |row| {
            Ok(Setting {
                id: row.get("id")?,
                section: row.get("section")?,
                key: row.get("key")?,
                value: row.get("value")?,
                value_type: row.get("value_type")?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(settings)
}

pub fn find_section(conn: &Connection, section: &str) -> rusqlite::Result<Vec<Setting>> {
    let mut stmt = conn.prepare(
        "SELECT id, section, key, value, value_type FROM settings WHERE section = ?1 ORDER BY key",
    )?;
    let settings = stmt
        .query_map(params![section], |row| {
            Ok(Setting {
                id: row.get("id")?,
                section: row.get("section")?,
                key: row.get("key")?,
                value: row.get("value")?,
                value_type: row.get("value_type")?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(settings)
}

/// A section as a JSON object keyed by setting name, values typed.
pub fn section_object(settings: &[Setting]) -> Map<String, Value> {
    settings
        .iter()
        .map(|s| (s.key.clone(), s.json_value()))
        .collect()
}

/// Typed getters with defaults, for internal consumers (scheduler, login TTL).
pub fn get_value(conn: &Connection, section: &str, key: &str, default: &str) -> String {
    conn.query_row(
        "SELECT value FROM settings WHERE section = ?1 AND key = ?2",
        params![section, key],
        |row| row.get(0),
    )
    .unwrap_or_else(|_| default.to_string())
}

pub fn get_i64(conn: &Connection, section: &str, key: &str, default: i64) -> i64 {
    get_value(conn, section, key, "")
        .parse()
        .unwrap_or(default)
}

pub fn get_bool(conn: &Connection, section: &str, key: &str, default: bool) -> bool {
    match get_value(conn, section, key, "").as_str() {
        "true" => true,
        "false" => false,
        _ => default,
    }
}

/// Partial update of one section: only the keys present in `changes` are
/// touched. Unknown keys and type mismatches are field-level validation
/// errors; nothing is written unless every change validates.
pub fn update_section(
    conn: &mut Connection,
    section: &str,
    changes: &Map<String, Value>,
) -> Result<Vec<String>, AppError> {
    if !SECTIONS.contains(&section) {
        return Err(AppError::NotFound);
    }

    let existing = find_section(conn, section)?;
    let mut errors = FieldErrors::new();
    let mut writes: Vec<(String, String)> = Vec::new();

    for (key, value) in changes {
        let Some(setting) = existing.iter().find(|s| &s.key == key) else {
            errors.insert(key.clone(), "Unknown setting".to_string());
            continue;
        };
        match coerce(value, &setting.value_type) {
            Some(raw) => writes.push((key.clone(), raw)),
            None => {
                errors.insert(
                    key.clone(),
                    format!("Expected a {} value", setting.value_type),
                );
            }
        }
    }

    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let tx = conn.transaction()?;
    let mut changed = Vec::new();
    for (key, raw) in writes {
        tx.execute(
            "UPDATE settings SET value = ?1 WHERE section = ?2 AND key = ?3",
            params![raw, section, key],
        )?;
        changed.push(key);
    }
    tx.commit()?;
    Ok(changed)
}

/// Validate a JSON value against a setting's declared type and render the
/// stored TEXT form.
fn coerce(value: &Value, value_type: &str) -> Option<String> {
    match value_type {
        "number" => value.as_i64().map(|n| n.to_string()),
        "boolean" => value.as_bool().map(|b| b.to_string()),
        _ => value.as_str().map(str::to_string),
    }
}
