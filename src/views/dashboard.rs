use serde::Serialize;

use crate::schemas::submission::{Grade, Room, SubmissionRecord};

/// Graded records bucketed by percentage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScoreBands {
    /// 80% and above.
    pub excellent: usize,
    /// 60% up to 80%.
    pub good: usize,
    /// Below 60%.
    pub needs_work: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total: usize,
    pub graded: usize,
    pub pending: usize,
    /// Mean total score over graded records, rounded to two decimals.
    pub average_score: Option<f64>,
    pub highest_score: Option<i32>,
    pub by_grade: Vec<(Grade, usize)>,
    pub by_room: Vec<(Room, usize)>,
    pub bands: ScoreBands,
}

impl DashboardStats {
    pub fn from_records(records: &[SubmissionRecord]) -> Self {
        let reviews: Vec<_> = records.iter().filter_map(|record| record.review.as_ref()).collect();

        let average_score = (!reviews.is_empty()).then(|| {
            let sum: i64 = reviews.iter().map(|review| i64::from(review.total_score)).sum();
            let mean = sum as f64 / reviews.len() as f64;
            (mean * 100.0).round() / 100.0
        });

        let mut bands = ScoreBands::default();
        for review in &reviews {
            match review.percentage {
                p if p >= 80.0 => bands.excellent += 1,
                p if p >= 60.0 => bands.good += 1,
                _ => bands.needs_work += 1,
            }
        }

        Self {
            total: records.len(),
            graded: reviews.len(),
            pending: records.len() - reviews.len(),
            average_score,
            highest_score: reviews.iter().map(|review| review.total_score).max(),
            by_grade: Grade::ALL
                .iter()
                .map(|grade| (*grade, records.iter().filter(|record| record.grade == *grade).count()))
                .collect(),
            by_room: Room::ALL
                .iter()
                .map(|room| (*room, records.iter().filter(|record| record.room == *room).count()))
                .collect(),
            bands,
        }
    }
}
