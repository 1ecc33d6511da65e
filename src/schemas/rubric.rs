use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::schemas::lenient;

pub const MAX_COMPONENT_SCORE: i32 = 5;
pub const MAX_TOTAL_SCORE: i32 = 20;

/// The four component scores a teacher enters for one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RubricScores {
    #[validate(range(min = 0, max = 5, message = "contentAccuracy must be between 0 and 5"))]
    pub content_accuracy: i32,
    #[validate(range(min = 0, max = 5, message = "participation must be between 0 and 5"))]
    pub participation: i32,
    #[validate(range(min = 0, max = 5, message = "presentation must be between 0 and 5"))]
    pub presentation: i32,
    #[validate(range(min = 0, max = 5, message = "discipline must be between 0 and 5"))]
    pub discipline: i32,
}

impl RubricScores {
    pub fn total(&self) -> i32 {
        self.content_accuracy + self.participation + self.presentation + self.discipline
    }

    pub fn percentage(&self) -> f64 {
        percentage_of_max(self.total())
    }
}

pub fn percentage_of_max(total: i32) -> f64 {
    let raw = f64::from(total) / f64::from(MAX_TOTAL_SCORE) * 100.0;
    (raw * 100.0).round() / 100.0
}

/// Body of the `grade` action.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeRequest {
    pub row_id: i64,
    #[serde(flatten)]
    pub scores: RubricScores,
    pub total_score: i32,
    pub percentage: f64,
    pub comment: String,
    pub graded_at: String,
    pub status: &'static str,
}

impl GradeRequest {
    pub fn new(row_id: i64, scores: RubricScores, comment: String, graded_at: String) -> Self {
        Self {
            row_id,
            scores,
            total_score: scores.total(),
            percentage: scores.percentage(),
            comment,
            graded_at,
            status: "Graded",
        }
    }
}

/// One entry of the `get_rubric` reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RubricCriterion {
    #[serde(default, alias = "criterion", alias = "title")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "optional_score")]
    pub max_score: Option<i32>,
}

fn optional_score<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(lenient::optional_i64(deserializer)?.map(|value| value as i32))
}

pub fn decode_criteria(data: Option<Value>) -> Vec<RubricCriterion> {
    let Some(Value::Array(items)) = data else {
        return Vec::new();
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<RubricCriterion>(item) {
            Ok(criterion) => Some(criterion),
            Err(err) => {
                tracing::warn!(error = %err, "Skipping undecodable rubric criterion");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scores(values: [i32; 4]) -> RubricScores {
        RubricScores {
            content_accuracy: values[0],
            participation: values[1],
            presentation: values[2],
            discipline: values[3],
        }
    }

    #[test]
    fn total_and_percentage() {
        let scores = scores([4, 4, 4, 3]);
        assert_eq!(scores.total(), 15);
        assert_eq!(scores.percentage(), 75.0);
        assert_eq!(percentage_of_max(MAX_TOTAL_SCORE), 100.0);
        assert_eq!(percentage_of_max(7), 35.0);
    }

    #[test]
    fn validation_rejects_out_of_range_components() {
        assert!(scores([5, 5, 5, 5]).validate().is_ok());
        assert!(scores([6, 0, 0, 0]).validate().is_err());
        assert!(scores([0, 0, 0, -1]).validate().is_err());
    }

    #[test]
    fn grade_request_flattens_scores() {
        let request = GradeRequest::new(
            7,
            scores([4, 4, 4, 3]),
            "Well done".to_string(),
            "2025-01-02T10:20:30Z".to_string(),
        );
        let body = serde_json::to_value(&request).expect("serialize");
        assert_eq!(
            body,
            json!({
                "rowId": 7,
                "contentAccuracy": 4,
                "participation": 4,
                "presentation": 4,
                "discipline": 3,
                "totalScore": 15,
                "percentage": 75.0,
                "comment": "Well done",
                "gradedAt": "2025-01-02T10:20:30Z",
                "status": "Graded"
            })
        );
    }

    #[test]
    fn criteria_accept_title_alias() {
        let criteria = decode_criteria(Some(json!([
            {"title": "Content accuracy", "description": "Facts are right", "maxScore": "5"},
            {"name": "Discipline"}
        ])));
        assert_eq!(criteria.len(), 2);
        assert_eq!(criteria[0].name, "Content accuracy");
        assert_eq!(criteria[0].max_score, Some(5));
        assert_eq!(criteria[1].max_score, None);
    }
}
