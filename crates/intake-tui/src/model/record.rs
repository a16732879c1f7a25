use intake_core::PersistedResume;

/// Display fallback for absent optional fields.
pub const NOT_AVAILABLE: &str = "N/A";

pub fn field_or_na(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => NOT_AVAILABLE,
    }
}

/// Flatten a parsed-data JSON value into (label, value) pairs for the
/// detail view. Nested objects are dotted, arrays are indexed; depth is
/// capped so a pathological blob cannot explode the screen.
pub fn flatten_json(value: &serde_json::Value, out: &mut Vec<(String, String)>) {
    flatten_at("", value, 0, out);
}

const MAX_DEPTH: usize = 4;

fn flatten_at(prefix: &str, value: &serde_json::Value, depth: usize, out: &mut Vec<(String, String)>) {
    use serde_json::Value;

    if depth >= MAX_DEPTH {
        out.push((prefix.to_string(), value.to_string()));
        return;
    }

    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let label = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_at(&label, child, depth + 1, out);
            }
        }
        Value::Array(items) => {
            if items.is_empty() {
                out.push((prefix.to_string(), "[]".to_string()));
            }
            for (i, child) in items.iter().enumerate() {
                flatten_at(&format!("{prefix}[{i}]"), child, depth + 1, out);
            }
        }
        Value::String(s) => out.push((prefix.to_string(), s.clone())),
        Value::Null => out.push((prefix.to_string(), NOT_AVAILABLE.to_string())),
        other => out.push((prefix.to_string(), other.to_string())),
    }
}

/// Summary line for one persisted record in the list view.
pub fn summary_fields(record: &PersistedResume) -> [String; 5] {
    [
        field_or_na(record.filename.as_deref()).to_string(),
        field_or_na(record.candidate_name.as_deref()).to_string(),
        field_or_na(record.candidate_email.as_deref()).to_string(),
        field_or_na(record.total_experience.as_deref()).to_string(),
        field_or_na(record.created_at.as_deref()).to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_or_na_substitutes_empty_and_missing() {
        assert_eq!(field_or_na(None), "N/A");
        assert_eq!(field_or_na(Some("")), "N/A");
        assert_eq!(field_or_na(Some("  ")), "N/A");
        assert_eq!(field_or_na(Some("Ada")), "Ada");
    }

    #[test]
    fn flatten_handles_nested_objects_and_arrays() {
        let value = serde_json::json!({
            "name": "Ada Lovelace",
            "skills": ["rust", "calculus"],
            "education": [{"degree": "BSc"}],
            "experience": null
        });
        let mut out = Vec::new();
        flatten_json(&value, &mut out);

        assert!(out.contains(&("name".to_string(), "Ada Lovelace".to_string())));
        assert!(out.contains(&("skills[0]".to_string(), "rust".to_string())));
        assert!(out.contains(&("education[0].degree".to_string(), "BSc".to_string())));
        assert!(out.contains(&("experience".to_string(), "N/A".to_string())));
    }

    #[test]
    fn flatten_caps_depth() {
        let value = serde_json::json!({"a": {"b": {"c": {"d": {"e": {"f": 1}}}}}});
        let mut out = Vec::new();
        flatten_json(&value, &mut out);
        // Beyond the cap the remainder is rendered as raw JSON.
        assert_eq!(out.len(), 1);
        assert!(out[0].0.starts_with("a.b.c"));
        assert!(out[0].1.contains("{"));
    }

    #[test]
    fn flatten_empty_array_is_visible() {
        let value = serde_json::json!({"skills": []});
        let mut out = Vec::new();
        flatten_json(&value, &mut out);
        assert_eq!(out, vec![("skills".to_string(), "[]".to_string())]);
    }
}
