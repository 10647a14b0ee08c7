//! Profile document as served by the data resource.

use serde::{Deserialize, Deserializer};

/// Treat an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProfileDocument {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stats: Vec<StatEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub highlights: Vec<HighlightEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StatEntry {
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub suffix: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

impl StatEntry {
    pub fn new(value: f64, suffix: Option<&str>, label: &str) -> Self {
        Self {
            value: Some(value),
            suffix: suffix.map(str::to_string),
            label: Some(label.to_string()),
        }
    }

    /// Literal text of the number element before any animation: value then suffix.
    pub fn display_text(&self) -> String {
        let mut out = self.value.map(format_number).unwrap_or_default();
        if let Some(suffix) = &self.suffix {
            out.push_str(suffix);
        }
        out
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HighlightEntry {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

/// Integral values print without a fractional part (`1200`, not `1200.0`).
pub fn format_number(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_sequences_default_to_empty() {
        let doc: ProfileDocument = serde_json::from_str(r#"{"name":"A","stats":null}"#).unwrap();
        assert_eq!(doc.name.as_deref(), Some("A"));
        assert!(doc.stats.is_empty());
        assert!(doc.highlights.is_empty());
        assert!(doc.photo.is_none());
    }

    #[test]
    fn test_stat_display_text() {
        assert_eq!(StatEntry::new(1200.0, Some("+"), "Goals").display_text(), "1200+");
        assert_eq!(StatEntry::new(0.0, None, "Cards").display_text(), "0");
        assert_eq!(StatEntry::new(87.0, Some("%"), "Pass").display_text(), "87%");
        assert_eq!(StatEntry::default().display_text(), "");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(3.5), "3.5");
        assert_eq!(format_number(-2.0), "-2");
    }

    #[test]
    fn test_non_object_payload_is_rejected() {
        assert!(serde_json::from_str::<ProfileDocument>(r#""player""#).is_err());
        assert!(serde_json::from_str::<ProfileDocument>("null").is_err());
    }
}
