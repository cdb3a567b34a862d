//src/models.rs
use crate::codec::{to_display_label, to_storage_key};
use crate::config::Units;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Opaque identity the store assigns to an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntryId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<i64> for EntryId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

// Some stores hand out numeric ids; keep them as their decimal text.
impl<'de> Deserialize<'de> for EntryId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Int(i64),
        }
        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => Self(s),
            RawId::Int(n) => Self(n.to_string()),
        })
    }
}

/// Wire codec for `createdAt`.
///
/// Written as Unix milliseconds. Read from Unix milliseconds (integer or
/// float) or an RFC 3339 string, since stores have used both.
pub mod created_at {
    use chrono::{DateTime, TimeZone, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(ts.timestamp_millis())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawTimestamp {
            Millis(i64),
            FloatMillis(f64),
            Text(String),
        }
        match RawTimestamp::deserialize(deserializer)? {
            RawTimestamp::Millis(ms) => from_millis(ms).map_err(de::Error::custom),
            #[allow(clippy::cast_possible_truncation)]
            RawTimestamp::FloatMillis(ms) if ms.is_finite() => {
                from_millis(ms.round() as i64).map_err(de::Error::custom)
            }
            RawTimestamp::FloatMillis(ms) => {
                Err(de::Error::custom(format!("non-finite timestamp: {ms}")))
            }
            RawTimestamp::Text(text) => parse_text(&text).map_err(de::Error::custom),
        }
    }

    fn from_millis(ms: i64) -> Result<DateTime<Utc>, String> {
        Utc.timestamp_millis_opt(ms)
            .single()
            .ok_or_else(|| format!("timestamp out of range: {ms}"))
    }

    fn parse_text(text: &str) -> Result<DateTime<Utc>, String> {
        let trimmed = text.trim();
        if let Ok(ms) = trimmed.parse::<i64>() {
            return from_millis(ms);
        }
        DateTime::parse_from_rfc3339(trimmed)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| format!("invalid timestamp '{trimmed}': {e}"))
    }
}

/// One logged set, as owned by the store. Never edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseEntry {
    #[serde(rename = "_id", alias = "id")]
    pub id: EntryId,
    pub name: String, // Canonical key
    pub weight: f64,
    pub reps: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(with = "created_at")]
    pub created_at: DateTime<Utc>,
}

impl ExerciseEntry {
    /// Lines for an entry detail view.
    pub fn summary_lines(&self, units: Units) -> Vec<String> {
        let mut lines = vec![
            format!("Exercise: {}", to_display_label(&self.name)),
            format!("Weight: {} {}", self.weight, units.weight_label()),
            format!("Reps: {}", self.reps),
            format!(
                "Date: {}",
                self.created_at
                    .with_timezone(&Local)
                    .format("%a %b %d %Y %H:%M")
            ),
        ];
        if let Some(notes) = self.notes.as_deref().filter(|n| !n.trim().is_empty()) {
            lines.push(format!("Notes: {notes}"));
        }
        lines
    }
}

/// Body of a create request. The store assigns identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExerciseEntry {
    pub name: String,
    pub weight: f64,
    pub reps: u32,
    #[serde(with = "created_at")]
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Create response as received. A success status does not guarantee the
/// store actually assigned an id, so it stays optional until checked.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedEntry {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: Option<EntryId>,
    pub name: String,
    pub weight: f64,
    pub reps: u32,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(with = "created_at")]
    pub created_at: DateTime<Utc>,
}

impl CreatedEntry {
    /// Echo of a create request with the given id, as a well-behaved store returns it.
    pub fn echo(id: Option<EntryId>, new_entry: &NewExerciseEntry) -> Self {
        Self {
            id,
            name: new_entry.name.clone(),
            weight: new_entry.weight,
            reps: new_entry.reps,
            notes: new_entry.notes.clone(),
            created_at: new_entry.created_at,
        }
    }

    pub fn into_entry(self) -> Option<ExerciseEntry> {
        let id = self.id?;
        Some(ExerciseEntry {
            id,
            name: self.name,
            weight: self.weight,
            reps: self.reps,
            notes: self.notes,
            created_at: self.created_at,
        })
    }
}

/// Chart-ready projection of an entry. Regenerated wholesale on every refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPoint {
    pub x: f64, // Unix milliseconds
    pub y: f64,
    /// Identity of the source entry, used to re-fetch it on click.
    pub label: EntryId,
}

/// One option in the exercise selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropdownItem {
    pub label: String,
    pub value: String, // Canonical key
    new_exercise: bool,
}

impl DropdownItem {
    pub const NEW_EXERCISE_LABEL: &'static str = "+ New exercise";

    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            new_exercise: false,
        }
    }

    /// Item for a key coming from storage.
    pub fn from_key(key: &str) -> Self {
        Self::new(to_display_label(key), key)
    }

    /// Item for a name a user just typed.
    pub fn from_display_name(name: &str) -> Self {
        let label = name.split_whitespace().collect::<Vec<_>>().join(" ");
        let key = to_storage_key(&label);
        Self::new(label, key)
    }

    /// The "create a new exercise" option. Not a real exercise.
    pub fn new_exercise() -> Self {
        Self {
            label: Self::NEW_EXERCISE_LABEL.to_string(),
            value: String::new(),
            new_exercise: true,
        }
    }

    pub const fn is_new_exercise(&self) -> bool {
        self.new_exercise
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn created_at_accepts_millis_and_iso() {
        let from_millis: ExerciseEntry = serde_json::from_value(json!({
            "_id": 1, "name": "bench_press", "weight": 135, "reps": 5, "createdAt": 100
        }))
        .unwrap();
        assert_eq!(from_millis.created_at.timestamp_millis(), 100);
        assert_eq!(from_millis.id, EntryId::new("1"));

        let from_iso: ExerciseEntry = serde_json::from_value(json!({
            "_id": "abc", "name": "bench_press", "weight": 135.5, "reps": 5,
            "createdAt": "2024-03-01T12:00:00.000Z"
        }))
        .unwrap();
        assert_eq!(from_iso.created_at.timestamp_millis(), 1_709_294_400_000);
        assert_eq!(from_iso.notes, None);
    }

    #[test]
    fn new_entry_writes_millis() {
        let entry = NewExerciseEntry {
            name: "squat".into(),
            weight: 225.0,
            reps: 3,
            created_at: DateTime::from_timestamp_millis(1_700_000_000_123).unwrap(),
            notes: None,
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["createdAt"], json!(1_700_000_000_123_i64));
        assert!(value.get("notes").is_none());
    }

    #[test]
    fn created_entry_without_id_is_not_an_entry() {
        let created: CreatedEntry = serde_json::from_value(json!({
            "name": "squat", "weight": 225, "reps": 3, "createdAt": 5
        }))
        .unwrap();
        assert!(created.into_entry().is_none());
    }

    #[test]
    fn typed_name_label_collapses_spaces() {
        let item = DropdownItem::from_display_name("  overhead   PRESS ");
        assert_eq!(item.label, "overhead PRESS");
        assert_eq!(item.value, "overhead_press");
    }

    #[test]
    fn sentinel_never_equals_a_real_item() {
        let real = DropdownItem::from_display_name("New Exercise");
        assert!(!real.is_new_exercise());
        assert_ne!(real, DropdownItem::new_exercise());
    }
}
