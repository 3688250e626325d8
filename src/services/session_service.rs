use std::sync::Arc;

use crate::database::catalog::Catalog;
use crate::dto::session_dto::{
    ActivitySummary, ChallengeView, MaskedCustomer, OutlineItem, PhoneView, PreviewView,
    QuestionnaireView, SessionSnapshot,
};
use crate::error::{Error, Result};
use crate::models::activity::Activity;
use crate::models::qr_challenge::QrStatus;
use crate::models::screen::{AgentScreen, PhoneScreen};
use crate::models::submission::{CustomerIdentity, SubmissionRecord};
use crate::services::qr_service::{QrStateMachine, ScanTicket, Tick};
use crate::services::questionnaire_service::QuestionnaireEngine;
use crate::services::result_service::ResultStore;
use crate::utils::qr_payload::{sign_challenge, verify_payload};
use crate::utils::time::now;

/// Timer work requested by a transition. The coordinator owns the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    StartCountdown { generation: u64 },
    VerifyScan(ScanTicket),
    SettleAuthorization { generation: u64 },
    CancelTimers,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Outcome {
    pub applied: bool,
    pub effects: Vec<Effect>,
}

impl Outcome {
    fn ignored() -> Self {
        Self::default()
    }

    fn applied(effects: Vec<Effect>) -> Self {
        Self {
            applied: true,
            effects,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionIntent {
    Preview,
    Fill,
}

/// Pad and phone state for one face-to-face session.
///
/// All mutation goes through the methods below; the QR status in particular
/// is only reachable through [`QrStateMachine`] transitions.
#[derive(Debug)]
pub struct Session {
    catalog: Arc<Catalog>,
    qr_secret: String,
    qr: QrStateMachine,
    agent_screen: AgentScreen,
    phone_screen: PhoneScreen,
    displayed_activities: Vec<Activity>,
    selected_activity: Option<Activity>,
    questionnaire: Option<QuestionnaireEngine>,
    customer: Option<CustomerIdentity>,
    results: ResultStore,
    notice: Option<String>,
    version: u64,
}

impl Session {
    pub fn new(catalog: Arc<Catalog>, qr_secret: String, validity_secs: u32) -> Self {
        let results = ResultStore::new(catalog.initial_results.clone());
        let displayed_activities = catalog.selectable_activities();
        Self {
            catalog,
            qr_secret,
            qr: QrStateMachine::new(validity_secs),
            agent_screen: AgentScreen::Home,
            phone_screen: PhoneScreen::Scanner,
            displayed_activities,
            selected_activity: None,
            questionnaire: None,
            customer: None,
            results,
            notice: None,
            version: 0,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn agent_screen(&self) -> AgentScreen {
        self.agent_screen
    }

    pub fn phone_screen(&self) -> PhoneScreen {
        self.phone_screen
    }

    pub fn qr_status(&self) -> QrStatus {
        self.qr.status()
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn results(&self) -> &ResultStore {
        &self.results
    }

    pub fn displayed_activities(&self) -> &[Activity] {
        &self.displayed_activities
    }

    // ── Pad: challenge ──

    /// Only the home screen hosts the QR modal, so a questionnaire in
    /// progress keeps its customer.
    pub fn open_challenge(&mut self, recommendation_id: Option<&str>) -> Result<Outcome> {
        self.ensure_screen(AgentScreen::Home)?;
        let customer = match recommendation_id {
            Some(id) => Some(
                self.catalog
                    .recommendation(id)
                    .ok_or_else(|| Error::NotFound(format!("Recommendation {} not found", id)))?
                    .identity(),
            ),
            None => None,
        };
        self.customer = customer;
        self.qr.open_challenge(now());
        self.phone_screen = PhoneScreen::Scanner;
        self.notice = None;
        self.changed();
        Ok(Outcome::applied(self.restart_countdown()))
    }

    pub fn refresh_challenge(&mut self) -> Outcome {
        if !self.qr.refresh_challenge(now()).applied() {
            return Outcome::ignored();
        }
        self.phone_screen = PhoneScreen::Scanner;
        self.changed();
        Outcome::applied(self.restart_countdown())
    }

    pub fn close_challenge(&mut self) -> Outcome {
        if !self.qr.close().applied() {
            return Outcome::ignored();
        }
        self.phone_screen = PhoneScreen::Scanner;
        self.changed();
        Outcome::applied(vec![Effect::CancelTimers])
    }

    // ── Phone ──

    /// Simulated scan. A payload, when given, must belong to the challenge
    /// currently on the pad.
    pub fn scan(&mut self, payload: Option<&str>) -> Outcome {
        let Some(challenge) = self.qr.challenge() else {
            return Outcome::ignored();
        };
        if let Some(payload) = payload {
            match verify_payload(payload, &self.qr_secret) {
                Some(id) if id == challenge.id => {}
                _ => return Outcome::ignored(),
            }
        }
        if self.phone_screen != PhoneScreen::Scanner {
            return Outcome::ignored();
        }
        match self.qr.begin_scan() {
            Some(ticket) => {
                self.changed();
                Outcome::applied(vec![Effect::VerifyScan(ticket)])
            }
            None => Outcome::ignored(),
        }
    }

    pub fn authorize(&mut self, confirmed: bool) -> Outcome {
        let generation = self.qr.current_generation();
        if !self.qr.authorize(confirmed).applied() {
            return Outcome::ignored();
        }
        self.changed();
        match (confirmed, generation) {
            (true, Some(generation)) => {
                self.phone_screen = PhoneScreen::Success;
                Outcome::applied(vec![Effect::SettleAuthorization { generation }])
            }
            _ => {
                self.phone_screen = PhoneScreen::Scanner;
                Outcome::applied(Vec::new())
            }
        }
    }

    /// Leaves the failure page on the phone.
    pub fn dismiss_failure(&mut self) -> Outcome {
        if self.phone_screen != PhoneScreen::Fail {
            return Outcome::ignored();
        }
        self.phone_screen = PhoneScreen::Scanner;
        self.changed();
        Outcome::applied(Vec::new())
    }

    // ── Timer callbacks ──

    pub fn on_scan_verified(&mut self, ticket: ScanTicket, success: bool) -> Outcome {
        if !self.qr.resolve_scan(ticket, success).applied() {
            return Outcome::ignored();
        }
        self.phone_screen = if success {
            PhoneScreen::Auth
        } else {
            PhoneScreen::Fail
        };
        self.changed();
        Outcome::applied(Vec::new())
    }

    pub fn on_tick(&mut self, generation: u64) -> Tick {
        let tick = self.qr.tick(generation);
        if matches!(tick, Tick::Counted(_) | Tick::Expired) {
            self.changed();
        }
        tick
    }

    /// Pad catches up with an authorization: closes the challenge and moves
    /// the agent on to activity selection.
    pub fn on_settle(&mut self, generation: u64) -> Outcome {
        if !self.qr.settle(generation).applied() {
            return Outcome::ignored();
        }
        self.phone_screen = PhoneScreen::Scanner;
        self.enter_activity_selection();
        self.changed();
        Outcome::applied(vec![Effect::CancelTimers])
    }

    // ── Pad: navigation ──

    pub fn select_activity(&mut self, activity_id: &str, intent: SelectionIntent) -> Result<()> {
        self.ensure_screen(AgentScreen::ActivitySelection)?;
        let activity = self
            .displayed_activities
            .iter()
            .find(|a| a.id == activity_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Activity {} not found", activity_id)))?;

        if !activity.is_available {
            self.displayed_activities.retain(|a| a.id != activity_id);
            let err = Error::ActivityUnavailable(activity.title.clone());
            self.notice = Some(err.to_string());
            self.changed();
            return Err(err);
        }

        self.notice = None;
        self.selected_activity = Some(activity);
        match intent {
            SelectionIntent::Preview => {
                self.agent_screen = AgentScreen::Preview;
                self.changed();
                Ok(())
            }
            SelectionIntent::Fill => self.begin_fill(),
        }
    }

    pub fn start_fill(&mut self) -> Result<()> {
        self.ensure_screen(AgentScreen::Preview)?;
        self.begin_fill()
    }

    pub fn back(&mut self) -> Outcome {
        match self.agent_screen {
            AgentScreen::Home => return Outcome::ignored(),
            AgentScreen::Preview => self.enter_activity_selection(),
            AgentScreen::ActivitySelection | AgentScreen::DataReport => {
                self.agent_screen = AgentScreen::Home;
            }
            AgentScreen::Fill => {
                self.questionnaire = None;
                self.agent_screen = AgentScreen::Home;
            }
        }
        self.changed();
        Outcome::applied(Vec::new())
    }

    pub fn view_report(&mut self) -> Result<()> {
        self.ensure_screen(AgentScreen::Home)?;
        self.agent_screen = AgentScreen::DataReport;
        self.changed();
        Ok(())
    }

    // ── Pad: questionnaire ──

    pub fn select_option(&mut self, question_id: u32, option: &str) -> Result<()> {
        self.engine_mut()?.select(question_id, option)?;
        self.changed();
        Ok(())
    }

    pub fn next_question(&mut self) -> Result<()> {
        self.engine_mut()?.advance()?;
        self.changed();
        Ok(())
    }

    pub fn previous_question(&mut self) -> Result<()> {
        self.engine_mut()?.retreat()?;
        self.changed();
        Ok(())
    }

    /// Finalizes the questionnaire, files the record and shows the report.
    pub fn submit_questionnaire(&mut self) -> Result<SubmissionRecord> {
        let activity = self
            .selected_activity
            .clone()
            .ok_or_else(|| Error::InvalidState("No activity selected".to_string()))?;
        let identity = self.customer.clone().unwrap_or_else(CustomerIdentity::walk_in);
        let record = self.engine_mut()?.submit(&activity, &identity)?;

        self.results.append(record.clone());
        self.questionnaire = None;
        self.selected_activity = None;
        self.customer = None;
        self.agent_screen = AgentScreen::DataReport;
        self.changed();
        Ok(record)
    }

    // ── Views ──

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            version: self.version,
            agent_screen: self.agent_screen,
            phone_screen: self.phone_screen,
            qr_status: self.qr.status(),
            challenge_displayed: self.qr.is_open(),
            challenge: self.qr.challenge().map(|c| ChallengeView {
                id: c.id.clone(),
                qr_payload: sign_challenge(&c.id, &self.qr_secret),
                remaining_secs: c.remaining_secs,
                validity_secs: self.qr.validity_secs(),
                created_at: c.created_at,
            }),
            selected_activity: self.selected_activity.as_ref().map(ActivitySummary::from),
            customer: self.customer.as_ref().map(MaskedCustomer::from),
            notice: self.notice.clone(),
        }
    }

    pub fn phone_view(&self) -> PhoneView {
        PhoneView {
            version: self.version,
            phone_screen: self.phone_screen,
            qr_status: self.qr.status(),
            pad_showing_qr: self.qr.is_open(),
        }
    }

    pub fn preview(&self) -> Result<PreviewView> {
        self.ensure_screen(AgentScreen::Preview)?;
        let activity = self
            .selected_activity
            .as_ref()
            .ok_or_else(|| Error::InvalidState("No activity selected".to_string()))?;
        let outline = self
            .catalog
            .questions_for(&activity.id)
            .iter()
            .enumerate()
            .map(|(idx, q)| OutlineItem {
                index: idx + 1,
                question_id: q.id,
                title: q.title.clone(),
                kind: q.kind,
                required: q.required,
            })
            .collect();
        Ok(PreviewView {
            activity: ActivitySummary::from(activity),
            outline,
        })
    }

    pub fn questionnaire_view(&self) -> Result<QuestionnaireView> {
        self.ensure_screen(AgentScreen::Fill)?;
        let engine = self
            .questionnaire
            .as_ref()
            .ok_or_else(|| Error::InvalidState("No questionnaire in progress".to_string()))?;
        let activity_title = self
            .selected_activity
            .as_ref()
            .map(|a| a.title.clone())
            .unwrap_or_default();
        let question = engine.current_question().clone();
        let total = engine.questions().len();
        Ok(QuestionnaireView {
            activity_title,
            index: engine.current_index(),
            total,
            progress_percent: ((engine.current_index() + 1) * 100 / total) as u32,
            phase: engine.phase(),
            can_advance: engine.is_valid(&question),
            is_last: engine.current_index() + 1 == total,
            question,
            answers: engine.answers().clone(),
        })
    }

    // ── Internals ──

    fn begin_fill(&mut self) -> Result<()> {
        let activity = self
            .selected_activity
            .as_ref()
            .ok_or_else(|| Error::InvalidState("No activity selected".to_string()))?;
        let questions = self.catalog.questions_for(&activity.id).to_vec();
        self.questionnaire = Some(QuestionnaireEngine::new(questions)?);
        self.agent_screen = AgentScreen::Fill;
        self.changed();
        Ok(())
    }

    fn enter_activity_selection(&mut self) {
        self.displayed_activities = self.catalog.selectable_activities();
        self.selected_activity = None;
        self.questionnaire = None;
        self.notice = None;
        self.agent_screen = AgentScreen::ActivitySelection;
    }

    fn restart_countdown(&self) -> Vec<Effect> {
        let mut effects = vec![Effect::CancelTimers];
        if let Some(generation) = self.qr.current_generation() {
            effects.push(Effect::StartCountdown { generation });
        }
        effects
    }

    fn engine_mut(&mut self) -> Result<&mut QuestionnaireEngine> {
        self.ensure_screen(AgentScreen::Fill)?;
        self.questionnaire
            .as_mut()
            .ok_or_else(|| Error::InvalidState("No questionnaire in progress".to_string()))
    }

    fn ensure_screen(&self, expected: AgentScreen) -> Result<()> {
        if self.agent_screen == expected {
            Ok(())
        } else {
            Err(Error::InvalidState(format!(
                "Action requires the {:?} screen, pad is on {:?}",
                expected, self.agent_screen
            )))
        }
    }

    fn changed(&mut self) {
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(Arc::new(Catalog::seeded()), "secret".to_string(), 60)
    }

    fn authorized(session: &mut Session) -> u64 {
        session.open_challenge(None).unwrap();
        let outcome = session.scan(None);
        let Effect::VerifyScan(ticket) = outcome.effects[0] else {
            panic!("scan should schedule verification");
        };
        session.on_scan_verified(ticket, true);
        let outcome = session.authorize(true);
        match outcome.effects[0] {
            Effect::SettleAuthorization { generation } => generation,
            other => panic!("unexpected effect {:?}", other),
        }
    }

    #[test]
    fn open_schedules_countdown_and_resets_phone() {
        let mut session = session();
        let outcome = session.open_challenge(None).unwrap();
        assert!(outcome.applied);
        assert_eq!(outcome.effects[0], Effect::CancelTimers);
        assert!(matches!(outcome.effects[1], Effect::StartCountdown { .. }));
        assert_eq!(session.phone_screen(), PhoneScreen::Scanner);
        assert!(session.snapshot().challenge_displayed);
    }

    #[test]
    fn unknown_recommendation_is_not_found() {
        let mut session = session();
        assert!(matches!(
            session.open_challenge(Some("nope")),
            Err(Error::NotFound(_))
        ));
        assert!(!session.snapshot().challenge_displayed);
    }

    #[test]
    fn scan_is_ignored_without_challenge() {
        let mut session = session();
        assert_eq!(session.scan(None), Outcome::ignored());
        assert_eq!(session.qr_status(), QrStatus::Idle);
    }

    #[test]
    fn scan_with_foreign_payload_is_ignored() {
        let mut session = session();
        session.open_challenge(None).unwrap();
        let old_payload = session.snapshot().challenge.unwrap().qr_payload;
        session.refresh_challenge();

        assert!(!session.scan(Some(&old_payload)).applied);
        assert!(!session.scan(Some("f2f:forged:00")).applied);

        let payload = session.snapshot().challenge.unwrap().qr_payload;
        assert!(session.scan(Some(&payload)).applied);
        assert_eq!(session.qr_status(), QrStatus::Scanning);
    }

    #[test]
    fn failed_scan_shows_fail_screen_until_dismissed() {
        let mut session = session();
        session.open_challenge(None).unwrap();
        let Effect::VerifyScan(ticket) = session.scan(None).effects[0] else {
            panic!("expected scan verification");
        };
        session.on_scan_verified(ticket, false);
        assert_eq!(session.phone_screen(), PhoneScreen::Fail);
        assert_eq!(session.qr_status(), QrStatus::Rejected);

        assert!(session.dismiss_failure().applied);
        assert_eq!(session.phone_screen(), PhoneScreen::Scanner);
        assert!(!session.dismiss_failure().applied);
    }

    #[test]
    fn cancel_authorization_returns_phone_to_scanner() {
        let mut session = session();
        session.open_challenge(None).unwrap();
        let Effect::VerifyScan(ticket) = session.scan(None).effects[0] else {
            panic!("expected scan verification");
        };
        session.on_scan_verified(ticket, true);
        assert_eq!(session.phone_screen(), PhoneScreen::Auth);

        let outcome = session.authorize(false);
        assert!(outcome.applied && outcome.effects.is_empty());
        assert_eq!(session.phone_screen(), PhoneScreen::Scanner);
        assert_eq!(session.qr_status(), QrStatus::Idle);
    }

    #[test]
    fn settle_moves_agent_to_activity_selection_once() {
        let mut session = session();
        let generation = authorized(&mut session);
        assert_eq!(session.phone_screen(), PhoneScreen::Success);
        assert_eq!(session.agent_screen(), AgentScreen::Home);

        assert!(session.on_settle(generation).applied);
        assert_eq!(session.agent_screen(), AgentScreen::ActivitySelection);
        assert_eq!(session.qr_status(), QrStatus::Idle);
        assert_eq!(session.phone_screen(), PhoneScreen::Scanner);
        assert!(!session.snapshot().challenge_displayed);

        session.back();
        assert!(!session.on_settle(generation).applied);
        assert_eq!(session.agent_screen(), AgentScreen::Home);
    }

    #[test]
    fn closing_during_settle_keeps_agent_home() {
        let mut session = session();
        let generation = authorized(&mut session);
        session.close_challenge();
        assert_eq!(session.phone_screen(), PhoneScreen::Scanner);
        assert!(!session.on_settle(generation).applied);
        assert_eq!(session.agent_screen(), AgentScreen::Home);
    }

    #[test]
    fn unavailable_activity_is_removed_without_navigation() {
        let mut session = session();
        let generation = authorized(&mut session);
        session.on_settle(generation);
        let before = session.displayed_activities().len();

        let err = session
            .select_activity("act4", SelectionIntent::Fill)
            .unwrap_err();
        assert!(matches!(err, Error::ActivityUnavailable(_)));
        assert_eq!(session.agent_screen(), AgentScreen::ActivitySelection);
        assert_eq!(session.displayed_activities().len(), before - 1);
        assert!(session.snapshot().notice.is_some());
        assert!(matches!(
            session.select_activity("act4", SelectionIntent::Preview),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn displayed_activities_are_newest_first() {
        let session = session();
        let ids: Vec<_> = session
            .displayed_activities()
            .iter()
            .map(|a| a.id.as_str())
            .collect();
        assert_eq!(ids, vec!["act1", "act2", "act3", "act4"]);
    }

    #[test]
    fn preview_then_fill_then_submit_lands_on_report() {
        let mut session = session();
        let generation = authorized(&mut session);
        session.on_settle(generation);

        session
            .select_activity("act3", SelectionIntent::Preview)
            .unwrap();
        let preview = session.preview().unwrap();
        assert_eq!(preview.outline.len(), 4);
        assert!(preview.outline[0].required);

        session.start_fill().unwrap();
        session.select_option(1, "商业保险").unwrap();
        session.next_question().unwrap();
        session.select_option(2, "公司品牌").unwrap();
        session.next_question().unwrap();
        session.select_option(3, "5%以内").unwrap();
        session.next_question().unwrap();
        session.next_question().unwrap();

        let before = session.results().len();
        let record = session.submit_questionnaire().unwrap();
        assert_eq!(session.agent_screen(), AgentScreen::DataReport);
        assert_eq!(session.results().len(), before + 1);
        assert_eq!(record.customer_name, "访客");
        assert!(session.questionnaire_view().is_err());
    }

    #[test]
    fn challenge_cannot_open_over_a_questionnaire() {
        let mut session = session();
        let generation = authorized(&mut session);
        session.on_settle(generation);
        session
            .select_activity("act1", SelectionIntent::Fill)
            .unwrap();
        session.select_option(1, "商业保险").unwrap();
        session.next_question().unwrap();
        let version = session.version();

        assert!(matches!(
            session.open_challenge(None),
            Err(Error::InvalidState(_))
        ));
        assert_eq!(session.agent_screen(), AgentScreen::Fill);
        assert_eq!(session.questionnaire_view().unwrap().index, 1);
        assert!(!session.snapshot().challenge_displayed);
        assert_eq!(session.version(), version);

        let outcome = session.scan(None);
        assert!(!outcome.applied);
        assert_eq!(session.agent_screen(), AgentScreen::Fill);
    }

    #[test]
    fn questionnaire_actions_require_fill_screen() {
        let mut session = session();
        assert!(matches!(
            session.select_option(1, "商业保险"),
            Err(Error::InvalidState(_))
        ));
        assert!(matches!(session.view_report(), Ok(())));
        assert_eq!(session.agent_screen(), AgentScreen::DataReport);
        assert!(session.back().applied);
        assert!(!session.back().applied);
    }

    #[test]
    fn version_moves_only_on_change() {
        let mut session = session();
        let start = session.version();
        session.scan(None);
        session.authorize(true);
        assert_eq!(session.version(), start);
        session.open_challenge(None).unwrap();
        assert!(session.version() > start);
    }
}
