use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::schemas::lenient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "Prathom 5")]
    Prathom5,
    #[serde(rename = "Prathom 6")]
    Prathom6,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Room {
    #[serde(rename = "Room 1")]
    Room1,
    #[serde(rename = "Room 2")]
    Room2,
    #[serde(rename = "Room 3")]
    Room3,
    #[serde(rename = "Room 4")]
    Room4,
}

impl Grade {
    pub const ALL: [Grade; 2] = [Grade::Prathom5, Grade::Prathom6];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Prathom5 => "Prathom 5",
            Self::Prathom6 => "Prathom 6",
        }
    }
}

impl Room {
    pub const ALL: [Room; 4] = [Room::Room1, Room::Room2, Room::Room3, Room::Room4];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Room1 => "Room 1",
            Self::Room2 => "Room 2",
            Self::Room3 => "Room 3",
            Self::Room4 => "Room 4",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseLevelError {
    kind: &'static str,
    value: String,
}

/// Accepts "Prathom 5", "p5" or just "5".
impl FromStr for Grade {
    type Err = ParseLevelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        let digits = normalized.trim_start_matches("prathom").trim_start_matches('p').trim();
        match digits {
            "5" => Ok(Self::Prathom5),
            "6" => Ok(Self::Prathom6),
            _ => Err(ParseLevelError { kind: "grade", value: value.to_string() }),
        }
    }
}

/// Accepts "Room 1" or just "1".
impl FromStr for Room {
    type Err = ParseLevelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.trim_start_matches("room").trim() {
            "1" => Ok(Self::Room1),
            "2" => Ok(Self::Room2),
            "3" => Ok(Self::Room3),
            "4" => Ok(Self::Room4),
            _ => Err(ParseLevelError { kind: "room", value: value.to_string() }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewStatus {
    Graded,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RubricReview {
    #[serde(deserialize_with = "lenient::i32_value")]
    pub content_accuracy: i32,
    #[serde(deserialize_with = "lenient::i32_value")]
    pub participation: i32,
    #[serde(deserialize_with = "lenient::i32_value")]
    pub presentation: i32,
    #[serde(deserialize_with = "lenient::i32_value")]
    pub discipline: i32,
    #[serde(deserialize_with = "lenient::i32_value")]
    pub total_score: i32,
    #[serde(deserialize_with = "lenient::f64_value")]
    pub percentage: f64,
    #[serde(default)]
    pub comment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graded_at: Option<String>,
    pub status: ReviewStatus,
}

/// A submission as the gateway stores it. The raw video never lives here; see
/// [`crate::flows::upload::SubmissionDraft`] for the not-yet-sent form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    #[serde(default, deserialize_with = "lenient::optional_i64")]
    pub row_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient::optional_string")]
    pub timestamp: Option<String>,
    pub name: String,
    #[serde(deserialize_with = "lenient::string_value")]
    pub student_number: String,
    pub grade: Grade,
    pub room: Room,
    #[serde(default, deserialize_with = "lenient::optional_string")]
    pub file_url: Option<String>,
    #[serde(default, deserialize_with = "complete_review")]
    pub review: Option<RubricReview>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reactions: Option<BTreeMap<String, u32>>,
}

impl SubmissionRecord {
    pub fn is_graded(&self) -> bool {
        self.review.is_some()
    }

    pub fn total_score(&self) -> Option<i32> {
        self.review.as_ref().map(|review| review.total_score)
    }

    pub fn matches_key(&self, student_number: &str, grade: Grade, room: Room) -> bool {
        self.student_number.trim() == student_number.trim()
            && self.grade == grade
            && self.room == room
    }
}

/// A review that is missing any field, or is not yet `Graded`, is treated as no
/// review at all; the spreadsheet writes an empty cell for ungraded rows.
fn complete_review<'de, D>(deserializer: D) -> Result<Option<RubricReview>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| match value {
        Value::Object(_) => serde_json::from_value::<RubricReview>(value)
            .ok()
            .filter(|review| review.status == ReviewStatus::Graded),
        _ => None,
    }))
}

/// Decodes a `list` payload record by record. Rows that fail to decode are
/// dropped with a warning instead of discarding the whole list.
pub fn decode_records(data: Option<Value>) -> Vec<SubmissionRecord> {
    let Some(Value::Array(items)) = data else {
        return Vec::new();
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<SubmissionRecord>(item) {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::warn!(error = %err, "Skipping undecodable submission row");
                None
            }
        })
        .collect()
}
