use chrono::NaiveDate;

use super::Round;

/// Filter for the rounds list: a calendar day and, optionally, a single guard
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RoundQuery {
    pub date: Option<NaiveDate>,
    pub guard_id: Option<u64>,
}

impl RoundQuery {
    pub fn on_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn for_guard(mut self, guard_id: u64) -> Self {
        self.guard_id = Some(guard_id);
        self
    }

    /// Rounds match on the UTC date they started
    pub fn matches(&self, round: &Round) -> bool {
        self.date
            .is_none_or(|date| round.start_time.date_naive() == date)
            && self.guard_id.is_none_or(|guard_id| round.guard_id == guard_id)
    }

    pub fn apply<'a, I>(&self, rounds: I) -> Vec<&'a Round>
    where
        I: IntoIterator<Item = &'a Round>,
    {
        rounds.into_iter().filter(|r| self.matches(r)).collect()
    }
}
