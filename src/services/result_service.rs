use serde::{Deserialize, Serialize};

use crate::models::submission::SubmissionRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Append-only record list, most recent submission first.
#[derive(Debug, Clone, Default)]
pub struct ResultStore {
    records: Vec<SubmissionRecord>,
}

impl ResultStore {
    pub fn new(initial: Vec<SubmissionRecord>) -> Self {
        Self { records: initial }
    }

    pub fn append(&mut self, record: SubmissionRecord) {
        self.records.insert(0, record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&SubmissionRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Case-sensitive substring search over name, phone and enterprise,
    /// stably ordered by submission date.
    pub fn query(&self, search: &str, order: SortOrder) -> Vec<SubmissionRecord> {
        let mut matches: Vec<SubmissionRecord> = self
            .records
            .iter()
            .filter(|r| {
                r.customer_name.contains(search)
                    || r.phone.contains(search)
                    || r.enterprise.contains(search)
            })
            .cloned()
            .collect();

        match order {
            SortOrder::Desc => matches.sort_by(|a, b| b.submitted_on.cmp(&a.submitted_on)),
            SortOrder::Asc => matches.sort_by(|a, b| a.submitted_on.cmp(&b.submitted_on)),
        }
        matches
    }
}
