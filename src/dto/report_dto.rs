use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::answer::Answer;
use crate::models::question::{Question, QuestionKind};
use crate::models::submission::SubmissionRecord;
use crate::services::result_service::SortOrder;
use crate::utils::mask::{mask_name, mask_phone};

#[derive(Debug, Clone, Serialize, Deserialize, Default, Validate)]
#[serde(default)]
pub struct ResultListQuery {
    #[validate(length(max = 64))]
    pub search: Option<String>,
    pub sort: Option<SortOrder>,
}

impl ResultListQuery {
    pub fn search(&self) -> &str {
        self.search.as_deref().unwrap_or_default()
    }

    pub fn order(&self) -> SortOrder {
        self.sort.unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultSummary {
    pub id: String,
    pub customer_name: String,
    pub phone: String,
    pub enterprise: String,
    pub activity_name: String,
    pub submitted_on: NaiveDate,
}

impl From<&SubmissionRecord> for ResultSummary {
    fn from(record: &SubmissionRecord) -> Self {
        Self {
            id: record.id.clone(),
            customer_name: mask_name(&record.customer_name),
            phone: mask_phone(&record.phone),
            enterprise: record.enterprise.clone(),
            activity_name: record.activity_name.clone(),
            submitted_on: record.submitted_on,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultListResponse {
    pub items: Vec<ResultSummary>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerEcho {
    pub question_id: u32,
    pub title: String,
    pub kind: Option<QuestionKind>,
    pub answer: Answer,
    pub display: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultDetail {
    #[serde(flatten)]
    pub summary: ResultSummary,
    pub answers: Vec<AnswerEcho>,
}

impl ResultDetail {
    /// Echoes the record's answers in questionnaire order. Answers to
    /// questions no longer in the set follow, by question id.
    pub fn build(record: &SubmissionRecord, questions: &[Question]) -> Self {
        let mut answers: Vec<AnswerEcho> = questions
            .iter()
            .filter_map(|q| {
                record.answers.get(&q.id).map(|answer| AnswerEcho {
                    question_id: q.id,
                    title: q.title.clone(),
                    kind: Some(q.kind),
                    answer: answer.clone(),
                    display: answer.display(),
                })
            })
            .collect();

        answers.extend(
            record
                .answers
                .iter()
                .filter(|(id, _)| !questions.iter().any(|q| q.id == **id))
                .map(|(id, answer)| AnswerEcho {
                    question_id: *id,
                    title: format!("问题 {}", id),
                    kind: None,
                    answer: answer.clone(),
                    display: answer.display(),
                }),
        );

        Self {
            summary: ResultSummary::from(record),
            answers,
        }
    }
}
