use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: u32,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub title: String,
    pub options: Vec<String>,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    Single,
    Multiple,
}

impl Question {
    pub fn option_position(&self, option: &str) -> Option<usize> {
        self.options.iter().position(|o| o == option)
    }
}
