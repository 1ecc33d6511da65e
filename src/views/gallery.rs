use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::schemas::submission::{Grade, Room, SubmissionRecord};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOption {
    #[default]
    Latest,
    Oldest,
    ScoreHigh,
    ScoreLow,
}

impl SortOption {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Latest => "latest",
            Self::Oldest => "oldest",
            Self::ScoreHigh => "score-high",
            Self::ScoreLow => "score-low",
        }
    }

    fn compare(self, a: &SubmissionRecord, b: &SubmissionRecord) -> Ordering {
        match self {
            Self::Latest => row_key(b).cmp(&row_key(a)),
            Self::Oldest => row_key(a).cmp(&row_key(b)),
            Self::ScoreHigh => score_key(b, -1).cmp(&score_key(a, -1)),
            Self::ScoreLow => score_key(a, 100).cmp(&score_key(b, 100)),
        }
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sort option: {0} (expected latest, oldest, score-high or score-low)")]
pub struct ParseSortError(String);

impl FromStr for SortOption {
    type Err = ParseSortError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "latest" => Ok(Self::Latest),
            "oldest" => Ok(Self::Oldest),
            "score-high" => Ok(Self::ScoreHigh),
            "score-low" => Ok(Self::ScoreLow),
            _ => Err(ParseSortError(value.to_string())),
        }
    }
}

/// Missing row ids sort as 0.
fn row_key(record: &SubmissionRecord) -> i64 {
    record.row_id.unwrap_or(0)
}

fn score_key(record: &SubmissionRecord, ungraded: i32) -> i32 {
    record.total_score().unwrap_or(ungraded)
}

/// Gallery controls. `None` for grade or room means "All".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GalleryFilter {
    pub search: String,
    pub grade: Option<Grade>,
    pub room: Option<Room>,
    pub sort: SortOption,
}

impl GalleryFilter {
    pub fn matches(&self, record: &SubmissionRecord) -> bool {
        let search = self.search.as_str();
        let matches_search = search.is_empty()
            || record.name.to_lowercase().contains(&search.to_lowercase())
            || record.student_number.contains(search);

        matches_search
            && self.grade.map_or(true, |grade| record.grade == grade)
            && self.room.map_or(true, |room| record.room == room)
    }

    /// Filters then sorts. The sort is stable, so ties keep cache order.
    pub fn apply<'a>(&self, records: &'a [SubmissionRecord]) -> Vec<&'a SubmissionRecord> {
        let mut visible: Vec<_> = records.iter().filter(|record| self.matches(record)).collect();
        visible.sort_by(|a, b| self.sort.compare(a, b));
        visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{graded, record};

    fn ids(records: &[&SubmissionRecord]) -> Vec<Option<i64>> {
        records.iter().map(|record| record.row_id).collect()
    }

    #[test]
    fn score_high_puts_ungraded_last() {
        let records = vec![graded(record(1, "A", "1"), 12), record(2, "B", "2"), graded(record(3, "C", "3"), 20)];
        let filter = GalleryFilter { sort: SortOption::ScoreHigh, ..GalleryFilter::default() };

        let scores: Vec<_> = filter.apply(&records).iter().map(|record| record.total_score()).collect();
        assert_eq!(scores, vec![Some(20), Some(12), None]);
    }

    #[test]
    fn score_low_puts_ungraded_after_any_real_score() {
        let records = vec![record(1, "A", "1"), graded(record(2, "B", "2"), 20), graded(record(3, "C", "3"), 4)];
        let filter = GalleryFilter { sort: SortOption::ScoreLow, ..GalleryFilter::default() };

        assert_eq!(ids(&filter.apply(&records)), vec![Some(3), Some(2), Some(1)]);
    }

    #[test]
    fn latest_and_oldest_order_by_row_id_with_missing_as_zero() {
        let mut no_id = record(0, "X", "9");
        no_id.row_id = None;
        let records = vec![record(5, "A", "1"), no_id, record(9, "B", "2")];

        let latest = GalleryFilter::default();
        assert_eq!(ids(&latest.apply(&records)), vec![Some(9), Some(5), None]);

        let oldest = GalleryFilter { sort: SortOption::Oldest, ..GalleryFilter::default() };
        assert_eq!(ids(&oldest.apply(&records)), vec![None, Some(5), Some(9)]);
    }

    #[test]
    fn ties_keep_cache_order() {
        let records = vec![record(4, "First", "1"), record(4, "Second", "2"), record(4, "Third", "3")];
        let names: Vec<_> =
            GalleryFilter::default().apply(&records).iter().map(|record| record.name.as_str()).collect();
        assert_eq!(names, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn search_matches_name_case_insensitively_or_number_substring() {
        let records = vec![record(1, "Somchai", "12"), record(2, "Malee", "7"), record(3, "Anan", "21")];

        let by_name = GalleryFilter { search: "SOM".to_string(), ..GalleryFilter::default() };
        assert_eq!(ids(&by_name.apply(&records)), vec![Some(1)]);

        let by_number = GalleryFilter { search: "2".to_string(), ..GalleryFilter::default() };
        assert_eq!(ids(&by_number.apply(&records)), vec![Some(3), Some(1)]);
    }

    #[test]
    fn grade_and_room_filters_combine() {
        let mut p6 = record(2, "B", "2");
        p6.grade = Grade::Prathom6;
        let mut room3 = record(3, "C", "3");
        room3.room = Room::Room3;
        let records = vec![record(1, "A", "1"), p6, room3];

        let filter = GalleryFilter { grade: Some(Grade::Prathom5), room: Some(Room::Room1), ..GalleryFilter::default() };
        assert_eq!(ids(&filter.apply(&records)), vec![Some(1)]);

        let all = GalleryFilter::default();
        assert_eq!(all.apply(&records).len(), 3);
    }

    #[test]
    fn sort_option_parses_cli_spelling() {
        assert_eq!("score-high".parse::<SortOption>(), Ok(SortOption::ScoreHigh));
        assert_eq!(" Oldest ".parse::<SortOption>(), Ok(SortOption::Oldest));
        assert!("newest".parse::<SortOption>().is_err());
    }
}
