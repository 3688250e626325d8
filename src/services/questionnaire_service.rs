use crate::error::{Error, Result};
use crate::models::activity::Activity;
use crate::models::answer::{Answer, AnswerSet};
use crate::models::question::{Question, QuestionKind};
use crate::models::submission::{CustomerIdentity, SubmissionRecord};
use crate::utils::time::today;
use crate::utils::token::generate_record_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionnairePhase {
    Answering,
    ReadyToSubmit,
}

/// Step-by-step questionnaire over a fixed question list.
#[derive(Debug, Clone)]
pub struct QuestionnaireEngine {
    questions: Vec<Question>,
    current_index: usize,
    answers: AnswerSet,
    phase: QuestionnairePhase,
}

impl QuestionnaireEngine {
    pub fn new(questions: Vec<Question>) -> Result<Self> {
        if questions.is_empty() {
            return Err(Error::BadRequest(
                "A questionnaire needs at least one question".to_string(),
            ));
        }
        Ok(Self {
            questions,
            current_index: 0,
            answers: AnswerSet::new(),
            phase: QuestionnairePhase::Answering,
        })
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_question(&self) -> &Question {
        &self.questions[self.current_index]
    }

    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    pub fn phase(&self) -> QuestionnairePhase {
        self.phase
    }

    pub fn select(&mut self, question_id: u32, option: &str) -> Result<()> {
        self.ensure_answering()?;
        let question = self
            .questions
            .iter()
            .find(|q| q.id == question_id)
            .ok_or_else(|| Error::NotFound(format!("Question {} not found", question_id)))?;
        if question.option_position(option).is_none() {
            return Err(Error::BadRequest(format!(
                "'{}' is not an option of question {}",
                option, question_id
            )));
        }

        match question.kind {
            QuestionKind::Single => {
                self.answers
                    .insert(question_id, Answer::Single(option.to_string()));
            }
            QuestionKind::Multiple => {
                let mut selected = match self.answers.remove(&question_id) {
                    Some(Answer::Multiple(options)) => options,
                    _ => Vec::new(),
                };
                if let Some(pos) = selected.iter().position(|o| o == option) {
                    selected.remove(pos);
                } else {
                    selected.push(option.to_string());
                    selected.sort_by_key(|o| question.option_position(o));
                }
                // An emptied selection is the same as no answer.
                if !selected.is_empty() {
                    self.answers.insert(question_id, Answer::Multiple(selected));
                }
            }
        }
        Ok(())
    }

    pub fn is_valid(&self, question: &Question) -> bool {
        if !question.required {
            return true;
        }
        self.answers
            .get(&question.id)
            .map(|answer| !answer.is_empty())
            .unwrap_or(false)
    }

    pub fn advance(&mut self) -> Result<QuestionnairePhase> {
        self.ensure_answering()?;
        let question = self.current_question();
        if !self.is_valid(question) {
            return Err(Error::Incomplete {
                question_id: question.id,
            });
        }
        if self.current_index + 1 == self.questions.len() {
            self.phase = QuestionnairePhase::ReadyToSubmit;
        } else {
            self.current_index += 1;
        }
        Ok(self.phase)
    }

    pub fn retreat(&mut self) -> Result<()> {
        self.ensure_answering()?;
        self.current_index = self.current_index.saturating_sub(1);
        Ok(())
    }

    /// Finalizes the collected answers and resets the engine for another customer.
    pub fn submit(
        &mut self,
        activity: &Activity,
        identity: &CustomerIdentity,
    ) -> Result<SubmissionRecord> {
        if self.phase != QuestionnairePhase::ReadyToSubmit {
            return Err(Error::InvalidState(
                "The questionnaire has not been completed yet".to_string(),
            ));
        }
        if let Some(missing) = self.questions.iter().find(|q| !self.is_valid(q)) {
            return Err(Error::Incomplete {
                question_id: missing.id,
            });
        }

        let record = SubmissionRecord {
            id: generate_record_id(),
            customer_name: identity.name.clone(),
            phone: identity.phone.clone(),
            enterprise: identity.enterprise.clone(),
            activity_name: activity.title.clone(),
            submitted_on: today(),
            answers: std::mem::take(&mut self.answers),
        };
        self.current_index = 0;
        self.phase = QuestionnairePhase::Answering;
        Ok(record)
    }

    fn ensure_answering(&self) -> Result<()> {
        match self.phase {
            QuestionnairePhase::Answering => Ok(()),
            QuestionnairePhase::ReadyToSubmit => Err(Error::InvalidState(
                "The questionnaire is waiting to be submitted".to_string(),
            )),
        }
    }
}
