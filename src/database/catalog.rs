use std::collections::HashMap;

use crate::models::activity::Activity;
use crate::models::question::Question;
use crate::models::recommendation::CustomerRecommendation;
use crate::models::submission::SubmissionRecord;

/// Read-only fixtures the session works from.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub activities: Vec<Activity>,
    pub default_questions: Vec<Question>,
    pub activity_questions: HashMap<String, Vec<Question>>,
    pub recommendations: Vec<CustomerRecommendation>,
    pub initial_results: Vec<SubmissionRecord>,
}

impl Catalog {
    pub fn seeded() -> Self {
        Self {
            activities: super::seed::activities(),
            default_questions: super::seed::questions(),
            activity_questions: HashMap::new(),
            recommendations: super::seed::recommendations(),
            initial_results: super::seed::initial_results(),
        }
    }

    pub fn questions_for(&self, activity_id: &str) -> &[Question] {
        self.activity_questions
            .get(activity_id)
            .map(Vec::as_slice)
            .unwrap_or(&self.default_questions)
    }

    /// Question set of the activity a record was filed under. Records keep the
    /// activity title only.
    pub fn questions_for_title(&self, activity_title: &str) -> &[Question] {
        match self.activities.iter().find(|a| a.title == activity_title) {
            Some(activity) => self.questions_for(&activity.id),
            None => &self.default_questions,
        }
    }

    /// Activities as shown on the selection screen, newest first.
    pub fn selectable_activities(&self) -> Vec<Activity> {
        let mut list = self.activities.clone();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        list
    }

    pub fn recommendation(&self, id: &str) -> Option<&CustomerRecommendation> {
        self.recommendations.iter().find(|r| r.id == id)
    }
}
