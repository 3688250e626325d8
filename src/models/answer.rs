use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A stored answer. Multi-select answers keep the question's option order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Single(String),
    Multiple(Vec<String>),
}

impl Answer {
    pub fn is_empty(&self) -> bool {
        match self {
            Answer::Single(option) => option.is_empty(),
            Answer::Multiple(options) => options.is_empty(),
        }
    }

    pub fn display(&self) -> String {
        match self {
            Answer::Single(option) => option.clone(),
            Answer::Multiple(options) => options.join("、"),
        }
    }
}

pub type AnswerSet = BTreeMap<u32, Answer>;
