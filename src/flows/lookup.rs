use crate::schemas::rubric::MAX_TOTAL_SCORE;
use crate::schemas::submission::{Grade, Room, RubricReview, SubmissionRecord};

/// What a student types to find their own submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupQuery {
    pub student_number: String,
    pub grade: Grade,
    pub room: Room,
}

impl LookupQuery {
    pub fn new(student_number: impl Into<String>, grade: Grade, room: Room) -> Self {
        Self { student_number: student_number.into().trim().to_string(), grade, room }
    }
}

impl Default for LookupQuery {
    fn default() -> Self {
        Self::new("", Grade::Prathom5, Room::Room1)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LookupState {
    NotSearched,
    Searched(Option<SubmissionRecord>),
}

/// A review that showed up after the student had already searched.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewArrival {
    pub student_name: String,
    pub review: RubricReview,
}

impl ReviewArrival {
    pub fn title(&self) -> &'static str {
        "Your teacher has graded your work!"
    }

    pub fn body(&self) -> String {
        format!("You scored {}/{MAX_TOTAL_SCORE}. Well done!", self.review.total_score)
    }
}

/// First record in cache order with the given key. The gateway does not
/// enforce uniqueness, so later duplicates are never returned.
pub fn find_first<'a>(
    records: &'a [SubmissionRecord],
    query: &LookupQuery,
) -> Option<&'a SubmissionRecord> {
    if query.student_number.is_empty() {
        return None;
    }
    records.iter().find(|record| record.matches_key(&query.student_number, query.grade, query.room))
}

/// Result lookup state machine. Searching is a pure cache lookup; `observe`
/// re-resolves the match after every refresh and reports the absent → present
/// review edge exactly once.
#[derive(Debug, Clone)]
pub struct ResultLookup {
    query: LookupQuery,
    state: LookupState,
    seen_review: bool,
}

impl Default for ResultLookup {
    fn default() -> Self {
        Self::new(LookupQuery::default())
    }
}

impl ResultLookup {
    pub fn new(query: LookupQuery) -> Self {
        Self { query, state: LookupState::NotSearched, seen_review: false }
    }

    pub fn query(&self) -> &LookupQuery {
        &self.query
    }

    pub fn state(&self) -> &LookupState {
        &self.state
    }

    /// Any change to the inputs forces a fresh search.
    pub fn set_query(&mut self, query: LookupQuery) {
        if query != self.query {
            self.query = query;
            self.state = LookupState::NotSearched;
            self.seen_review = false;
        }
    }

    pub fn search(&mut self, records: &[SubmissionRecord]) -> &LookupState {
        let found = find_first(records, &self.query).cloned();
        self.seen_review = found.as_ref().is_some_and(SubmissionRecord::is_graded);
        self.state = LookupState::Searched(found);
        &self.state
    }

    pub fn matched(&self) -> Option<&SubmissionRecord> {
        match &self.state {
            LookupState::Searched(found) => found.as_ref(),
            LookupState::NotSearched => None,
        }
    }

    /// True while a match exists and is still waiting for its review.
    pub fn needs_polling(&self) -> bool {
        self.matched().is_some_and(|record| !record.is_graded())
    }

    pub fn observe(&mut self, records: &[SubmissionRecord]) -> Option<ReviewArrival> {
        if self.state == LookupState::NotSearched {
            return None;
        }

        let found = find_first(records, &self.query).cloned();
        let arrival = match found.as_ref().and_then(|record| record.review.as_ref()) {
            Some(review) if !self.seen_review => Some(ReviewArrival {
                student_name: found.as_ref().map(|record| record.name.clone()).unwrap_or_default(),
                review: review.clone(),
            }),
            _ => None,
        };

        self.seen_review = found.as_ref().is_some_and(SubmissionRecord::is_graded);
        self.state = LookupState::Searched(found);
        arrival
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{graded, record, review};

    fn query(number: &str) -> LookupQuery {
        LookupQuery::new(number, Grade::Prathom5, Room::Room1)
    }

    #[test]
    fn search_returns_first_match_in_cache_order() {
        let mut twin = record(8, "Second", "3");
        twin.file_url = None;
        let records = vec![record(2, "Other", "4"), record(7, "First", "3"), twin];

        let mut lookup = ResultLookup::new(query("3"));
        lookup.search(&records);
        assert_eq!(lookup.matched().map(|record| record.name.as_str()), Some("First"));
    }

    #[test]
    fn search_respects_grade_and_room() {
        let mut other_room = record(1, "Other room", "3");
        other_room.room = Room::Room2;
        let mut other_grade = record(2, "Other grade", "3");
        other_grade.grade = Grade::Prathom6;
        let records = vec![other_room, other_grade];

        let mut lookup = ResultLookup::new(query("3"));
        assert_eq!(lookup.search(&records), &LookupState::Searched(None));

        lookup.set_query(LookupQuery::new("3", Grade::Prathom6, Room::Room1));
        lookup.search(&records);
        assert_eq!(lookup.matched().map(|record| record.name.as_str()), Some("Other grade"));
    }

    #[test]
    fn blank_number_never_matches() {
        let mut blank = record(1, "Blank", "");
        blank.student_number = String::new();
        let mut lookup = ResultLookup::new(query(" "));
        assert_eq!(lookup.search(&[blank]), &LookupState::Searched(None));
    }

    #[test]
    fn changing_query_resets_to_not_searched() {
        let records = vec![record(7, "A", "3")];
        let mut lookup = ResultLookup::new(query("3"));
        lookup.search(&records);
        assert!(lookup.matched().is_some());

        lookup.set_query(query("3"));
        assert!(lookup.matched().is_some());

        lookup.set_query(query("4"));
        assert_eq!(lookup.state(), &LookupState::NotSearched);
        assert!(!lookup.needs_polling());
    }

    #[test]
    fn notification_fires_once_on_review_arrival() {
        let pending = vec![record(7, "A", "3")];
        let done = vec![graded(record(7, "A", "3"), 15)];

        let mut lookup = ResultLookup::new(query("3"));
        lookup.search(&pending);
        assert!(lookup.needs_polling());

        assert!(lookup.observe(&pending).is_none());
        let arrival = lookup.observe(&done).expect("arrival");
        assert_eq!(arrival.review.total_score, 15);
        assert_eq!(arrival.student_name, "A");
        assert_eq!(arrival.body(), "You scored 15/20. Well done!");
        assert!(!lookup.needs_polling());

        for _ in 0..3 {
            assert!(lookup.observe(&done).is_none());
        }
    }

    #[test]
    fn already_graded_at_first_observation_never_notifies() {
        let done = vec![graded(record(7, "A", "3"), 12)];
        let mut lookup = ResultLookup::new(query("3"));
        lookup.search(&done);

        assert!(!lookup.needs_polling());
        assert!(lookup.observe(&done).is_none());
        assert!(lookup.observe(&done).is_none());
    }

    #[test]
    fn pending_review_keeps_polling_without_notifying() {
        let pending_review: SubmissionRecord = serde_json::from_value(serde_json::json!({
            "rowId": 7,
            "name": "A",
            "studentNumber": "3",
            "grade": "Prathom 5",
            "room": "Room 1",
            "review": {
                "contentAccuracy": 0,
                "participation": 0,
                "presentation": 0,
                "discipline": 0,
                "totalScore": 0,
                "percentage": 0,
                "status": "Pending"
            }
        }))
        .expect("record");

        let mut lookup = ResultLookup::new(query("3"));
        lookup.search(&[record(7, "A", "3")]);

        assert!(lookup.observe(&[pending_review]).is_none());
        assert!(lookup.needs_polling());

        let arrival = lookup.observe(&[graded(record(7, "A", "3"), 14)]).expect("arrival");
        assert_eq!(arrival.body(), "You scored 14/20. Well done!");
    }

    #[test]
    fn observe_before_search_is_ignored() {
        let mut lookup = ResultLookup::new(query("3"));
        assert!(lookup.observe(&[graded(record(7, "A", "3"), 12)]).is_none());
        assert_eq!(lookup.state(), &LookupState::NotSearched);
    }

    #[test]
    fn new_search_after_query_change_rebaselines() {
        let mut lookup = ResultLookup::new(query("3"));
        lookup.search(&[record(7, "A", "3")]);

        lookup.set_query(query("4"));
        let mut other = record(8, "B", "4");
        other.review = Some(review(18));
        lookup.search(&[other.clone()]);
        assert!(lookup.observe(&[other]).is_none());
    }
}
