//! Extraction of typed fields from raw dataset entries

use serde_json::{Map, Value};

/// Reads fields from one raw entry and remembers which ones were missing.
///
/// Accessors return a placeholder for missing fields; callers build the
/// record and then keep it only if [`Fields::finish`] succeeds.
pub struct Fields<'a> {
    entry: &'a Value,
    missing: Vec<String>,
}

impl<'a> Fields<'a> {
    pub fn new(entry: &'a Value) -> Self {
        Self {
            entry,
            missing: Vec::new(),
        }
    }

    /// Non-blank string at `path`, trimmed
    pub fn text(&mut self, name: &str, path: &[&str]) -> String {
        match lookup(self.entry, path).and_then(as_text) {
            Some(text) => text,
            None => {
                self.missing.push(name.to_string());
                String::new()
            }
        }
    }

    /// Optional string at `path`; absence is not recorded
    pub fn optional_text(&self, path: &[&str]) -> Option<String> {
        lookup(self.entry, path).and_then(as_text)
    }

    /// Finite number at `path`; numeric strings are accepted
    pub fn number(&mut self, name: &str, path: &[&str]) -> f64 {
        match lookup(self.entry, path).and_then(as_number) {
            Some(number) => number,
            None => {
                self.missing.push(name.to_string());
                0.0
            }
        }
    }

    /// Non-negative integer count at `path`; zero is valid
    pub fn count(&mut self, name: &str, path: &[&str]) -> u32 {
        match lookup(self.entry, path).and_then(as_count) {
            Some(count) => count,
            None => {
                self.missing.push(name.to_string());
                0
            }
        }
    }

    /// Names of the fields that were missing or malformed
    pub fn finish(self) -> Result<(), Vec<String>> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(self.missing)
        }
    }
}

fn lookup<'v>(value: &'v Value, path: &[&str]) -> Option<&'v Value> {
    path.iter().try_fold(value, |current, key| current.get(key))
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn as_count(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => {
            if let Some(count) = n.as_u64() {
                return u32::try_from(count).ok();
            }
            // Whole floats such as 3.0 still count
            let float = n.as_f64()?;
            (float.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&float))
                .then_some(float as u32)
        }
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    }
}

/// Top-level fields of `item` with the members of its `data` object merged in.
/// Entries under `data` win on conflicts.
pub fn merge_data(item: &Value) -> Value {
    let mut merged = Map::new();
    if let Some(top) = item.as_object() {
        for (key, value) in top {
            if key != "data" {
                merged.insert(key.clone(), value.clone());
            }
        }
    }
    if let Some(data) = item.get("data").and_then(Value::as_object) {
        for (key, value) in data {
            merged.insert(key.clone(), value.clone());
        }
    }
    Value::Object(merged)
}
