use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};

use crate::config::SessionSettings;
use crate::database::catalog::Catalog;
use crate::dto::session_dto::{PhoneView, PreviewView, QuestionnaireView, SessionSnapshot};
use crate::error::Result;
use crate::models::activity::Activity;
use crate::models::submission::SubmissionRecord;
use crate::services::qr_service::{ScanTicket, Tick};
use crate::services::result_service::SortOrder;
use crate::services::scan_service::ScanVerifier;
use crate::services::session_service::{Effect, Outcome, SelectionIntent, Session};

#[derive(Default)]
struct Timers {
    countdown: Option<JoinHandle<()>>,
    scan: Option<JoinHandle<()>>,
    settle: Option<JoinHandle<()>>,
}

impl Timers {
    fn cancel_all(&mut self) {
        for handle in [self.countdown.take(), self.scan.take(), self.settle.take()]
            .into_iter()
            .flatten()
        {
            handle.abort();
        }
    }
}

struct Inner {
    session: Mutex<Session>,
    timers: Mutex<Timers>,
    settings: SessionSettings,
    verifier: Arc<dyn ScanVerifier>,
    updates: watch::Sender<SessionSnapshot>,
}

/// Owns the shared session and drives its timers.
///
/// Transitions run one at a time under the session lock; timer effects are
/// scheduled before the lock is released so a later transition always sees
/// (and may cancel) the timers of an earlier one.
#[derive(Clone)]
pub struct SessionCoordinator {
    inner: Arc<Inner>,
}

impl SessionCoordinator {
    pub fn new(
        catalog: Arc<Catalog>,
        settings: SessionSettings,
        qr_secret: String,
        verifier: Arc<dyn ScanVerifier>,
    ) -> Self {
        let session = Session::new(catalog, qr_secret, settings.challenge_validity_secs);
        let (updates, _) = watch::channel(session.snapshot());
        Self {
            inner: Arc::new(Inner {
                session: Mutex::new(session),
                timers: Mutex::new(Timers::default()),
                settings,
                verifier,
                updates,
            }),
        }
    }

    /// Capabilities of the agent's tablet.
    pub fn pad(&self) -> PadClient {
        PadClient {
            coordinator: self.clone(),
        }
    }

    /// Capabilities of the customer's phone.
    pub fn phone(&self) -> PhoneClient {
        PhoneClient {
            coordinator: self.clone(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.updates.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock_session().snapshot()
    }

    /// Waits until the published version moves past `after_version` or the
    /// timeout elapses, then returns the latest snapshot.
    pub async fn wait_for_change(&self, after_version: u64, timeout: Duration) -> SessionSnapshot {
        let mut rx = self.subscribe();
        let _ = tokio::time::timeout(timeout, rx.wait_for(|s| s.version > after_version)).await;
        let latest = rx.borrow().clone();
        latest
    }

    fn lock_session(&self) -> MutexGuard<'_, Session> {
        self.inner
            .session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_timers(&self) -> MutexGuard<'_, Timers> {
        self.inner
            .timers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Runs one transition, schedules its effects and publishes the new state.
    fn dispatch<T>(&self, op: impl FnOnce(&mut Session) -> (T, Vec<Effect>)) -> T {
        let mut session = self.lock_session();
        let before = session.version();
        let (value, effects) = op(&mut session);
        if !effects.is_empty() {
            let mut timers = self.lock_timers();
            for effect in effects {
                self.schedule(&mut timers, effect);
            }
        }
        if session.version() != before {
            self.inner.updates.send_replace(session.snapshot());
        }
        value
    }

    fn dispatch_outcome(&self, op: impl FnOnce(&mut Session) -> Outcome) -> bool {
        self.dispatch(|session| {
            let outcome = op(session);
            (outcome.applied, outcome.effects)
        })
    }

    fn dispatch_result<T>(&self, op: impl FnOnce(&mut Session) -> Result<T>) -> Result<T> {
        self.dispatch(|session| (op(session), Vec::new()))
    }

    fn schedule(&self, timers: &mut Timers, effect: Effect) {
        match effect {
            Effect::CancelTimers => timers.cancel_all(),
            Effect::StartCountdown { generation } => {
                if let Some(old) = timers.countdown.replace(self.spawn_countdown(generation)) {
                    old.abort();
                }
            }
            Effect::VerifyScan(ticket) => {
                if let Some(old) = timers.scan.replace(self.spawn_scan(ticket)) {
                    old.abort();
                }
            }
            Effect::SettleAuthorization { generation } => {
                if let Some(old) = timers.settle.replace(self.spawn_settle(generation)) {
                    old.abort();
                }
            }
        }
    }

    fn spawn_countdown(&self, generation: u64) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            let period = Duration::from_secs(1);
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let tick = this.dispatch(|session| (session.on_tick(generation), Vec::new()));
                match tick {
                    Tick::Counted(_) | Tick::Paused => continue,
                    Tick::Expired => {
                        tracing::info!(generation, "QR challenge expired");
                        break;
                    }
                    Tick::Stale => break,
                }
            }
        })
    }

    fn spawn_scan(&self, ticket: ScanTicket) -> JoinHandle<()> {
        let this = self.clone();
        let delay = self.inner.settings.scan_verify_delay;
        tokio::spawn(async move {
            sleep(delay).await;
            let success = this.inner.verifier.verify();
            let applied = this.dispatch_outcome(|session| session.on_scan_verified(ticket, success));
            if applied {
                tracing::info!(generation = ticket.generation, success, "scan verified");
            } else {
                tracing::debug!(generation = ticket.generation, "stale scan result dropped");
            }
        })
    }

    fn spawn_settle(&self, generation: u64) -> JoinHandle<()> {
        let this = self.clone();
        let delay = self.inner.settings.authorize_settle_delay;
        tokio::spawn(async move {
            sleep(delay).await;
            if this.dispatch_outcome(|session| session.on_settle(generation)) {
                tracing::info!(generation, "authorization settled, pad moved to activity selection");
            } else {
                tracing::debug!(generation, "stale settle dropped");
            }
        })
    }
}

fn log_trigger(side: &str, trigger: &str, applied: bool) -> bool {
    if applied {
        tracing::info!(side, trigger, "transition applied");
    } else {
        tracing::debug!(side, trigger, "stale trigger ignored");
    }
    applied
}

/// Operations available to the agent's tablet.
#[derive(Clone)]
pub struct PadClient {
    coordinator: SessionCoordinator,
}

impl PadClient {
    pub fn snapshot(&self) -> SessionSnapshot {
        self.coordinator.snapshot()
    }

    pub fn open_challenge(&self, recommendation_id: Option<&str>) -> Result<SessionSnapshot> {
        self.coordinator.dispatch(|session| match session.open_challenge(recommendation_id) {
            Ok(outcome) => (Ok(()), outcome.effects),
            Err(e) => (Err(e), Vec::new()),
        })?;
        log_trigger("pad", "open_challenge", true);
        Ok(self.snapshot())
    }

    pub fn refresh_challenge(&self) -> bool {
        let applied = self.coordinator.dispatch_outcome(Session::refresh_challenge);
        log_trigger("pad", "refresh_challenge", applied)
    }

    pub fn close_challenge(&self) -> bool {
        let applied = self.coordinator.dispatch_outcome(Session::close_challenge);
        log_trigger("pad", "close_challenge", applied)
    }

    pub fn activities(&self) -> Vec<Activity> {
        self.coordinator.lock_session().displayed_activities().to_vec()
    }

    pub fn select_activity(&self, activity_id: &str, intent: SelectionIntent) -> Result<()> {
        let result = self
            .coordinator
            .dispatch_result(|session| session.select_activity(activity_id, intent));
        if let Err(crate::error::Error::ActivityUnavailable(title)) = &result {
            tracing::warn!(activity_id, %title, "unavailable activity removed from selection");
        }
        result
    }

    pub fn start_fill(&self) -> Result<()> {
        self.coordinator.dispatch_result(Session::start_fill)
    }

    pub fn back(&self) -> bool {
        self.coordinator.dispatch_outcome(Session::back)
    }

    pub fn view_report(&self) -> Result<()> {
        self.coordinator.dispatch_result(Session::view_report)
    }

    pub fn preview(&self) -> Result<PreviewView> {
        self.coordinator.lock_session().preview()
    }

    pub fn questionnaire(&self) -> Result<QuestionnaireView> {
        self.coordinator.lock_session().questionnaire_view()
    }

    pub fn select_option(&self, question_id: u32, option: &str) -> Result<()> {
        self.coordinator
            .dispatch_result(|session| session.select_option(question_id, option))
    }

    pub fn next_question(&self) -> Result<()> {
        self.coordinator.dispatch_result(Session::next_question)
    }

    pub fn previous_question(&self) -> Result<()> {
        self.coordinator.dispatch_result(Session::previous_question)
    }

    pub fn submit_questionnaire(&self) -> Result<SubmissionRecord> {
        let record = self
            .coordinator
            .dispatch_result(Session::submit_questionnaire)?;
        tracing::info!(record_id = %record.id, activity = %record.activity_name, "questionnaire submitted");
        Ok(record)
    }

    pub fn query_results(&self, search: &str, order: SortOrder) -> Vec<SubmissionRecord> {
        self.coordinator.lock_session().results().query(search, order)
    }

    pub fn result(&self, id: &str) -> Option<SubmissionRecord> {
        self.coordinator.lock_session().results().get(id).cloned()
    }

    pub fn catalog(&self) -> Arc<Catalog> {
        self.coordinator.lock_session().catalog().clone()
    }
}

/// Operations available to the customer's phone.
#[derive(Clone)]
pub struct PhoneClient {
    coordinator: SessionCoordinator,
}

impl PhoneClient {
    pub fn view(&self) -> PhoneView {
        self.coordinator.lock_session().phone_view()
    }

    pub fn scan(&self, payload: Option<&str>) -> bool {
        let applied = self
            .coordinator
            .dispatch_outcome(|session| session.scan(payload));
        log_trigger("phone", "scan", applied)
    }

    pub fn authorize(&self, confirmed: bool) -> bool {
        let applied = self
            .coordinator
            .dispatch_outcome(|session| session.authorize(confirmed));
        log_trigger("phone", "authorize", applied)
    }

    pub fn dismiss_failure(&self) -> bool {
        let applied = self.coordinator.dispatch_outcome(Session::dismiss_failure);
        log_trigger("phone", "dismiss_failure", applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::qr_challenge::QrStatus;
    use crate::models::screen::{AgentScreen, PhoneScreen};
    use crate::services::scan_service::MockScanVerifier;

    fn coordinator(success: bool) -> SessionCoordinator {
        let mut verifier = MockScanVerifier::new();
        verifier.expect_verify().returning(move || success);
        SessionCoordinator::new(
            Arc::new(Catalog::seeded()),
            SessionSettings::default(),
            "secret".to_string(),
            Arc::new(verifier),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn authorization_reaches_pad_only_after_settle_delay() {
        let coordinator = coordinator(true);
        let (pad, phone) = (coordinator.pad(), coordinator.phone());

        pad.open_challenge(None).unwrap();
        assert!(phone.scan(None));
        assert_eq!(pad.snapshot().qr_status, QrStatus::Scanning);

        sleep(Duration::from_millis(1600)).await;
        assert_eq!(pad.snapshot().qr_status, QrStatus::Scanned);
        assert_eq!(phone.view().phone_screen, PhoneScreen::Auth);

        assert!(phone.authorize(true));
        sleep(Duration::from_millis(1000)).await;
        let snapshot = pad.snapshot();
        assert_eq!(snapshot.qr_status, QrStatus::Authorized);
        assert_eq!(snapshot.agent_screen, AgentScreen::Home);

        sleep(Duration::from_millis(600)).await;
        let snapshot = pad.snapshot();
        assert_eq!(snapshot.agent_screen, AgentScreen::ActivitySelection);
        assert_eq!(snapshot.qr_status, QrStatus::Idle);
        assert!(!snapshot.challenge_displayed);
        assert_eq!(phone.view().phone_screen, PhoneScreen::Scanner);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_scan_shows_fail_on_phone() {
        let coordinator = coordinator(false);
        coordinator.pad().open_challenge(None).unwrap();
        coordinator.phone().scan(None);
        sleep(Duration::from_millis(1600)).await;
        assert_eq!(coordinator.snapshot().qr_status, QrStatus::Rejected);
        assert_eq!(coordinator.phone().view().phone_screen, PhoneScreen::Fail);
    }

    #[tokio::test(start_paused = true)]
    async fn closing_mid_scan_drops_the_result() {
        let coordinator = coordinator(true);
        let pad = coordinator.pad();
        pad.open_challenge(None).unwrap();
        coordinator.phone().scan(None);
        sleep(Duration::from_millis(500)).await;
        assert!(pad.close_challenge());

        sleep(Duration::from_secs(3)).await;
        let snapshot = pad.snapshot();
        assert_eq!(snapshot.qr_status, QrStatus::Idle);
        assert!(!snapshot.challenge_displayed);
        assert_eq!(coordinator.phone().view().phone_screen, PhoneScreen::Scanner);
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_runs_down_to_expiry() {
        let coordinator = coordinator(true);
        let pad = coordinator.pad();
        pad.open_challenge(None).unwrap();

        sleep(Duration::from_millis(10_500)).await;
        let challenge = pad.snapshot().challenge.unwrap();
        assert_eq!(challenge.remaining_secs, 50);

        sleep(Duration::from_secs(50)).await;
        let snapshot = pad.snapshot();
        assert_eq!(snapshot.qr_status, QrStatus::Expired);
        assert_eq!(snapshot.challenge.unwrap().remaining_secs, 0);

        assert!(!coordinator.phone().scan(None));
        assert!(pad.refresh_challenge());
        let snapshot = pad.snapshot();
        assert_eq!(snapshot.qr_status, QrStatus::Idle);
        assert_eq!(snapshot.challenge.unwrap().remaining_secs, 60);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_restarts_a_single_countdown() {
        let coordinator = coordinator(true);
        let pad = coordinator.pad();
        pad.open_challenge(None).unwrap();
        sleep(Duration::from_millis(5_500)).await;
        pad.refresh_challenge();
        sleep(Duration::from_millis(3_200)).await;
        assert_eq!(pad.snapshot().challenge.unwrap().remaining_secs, 57);
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_see_every_published_change() {
        let coordinator = coordinator(true);
        let mut rx = coordinator.subscribe();
        let start = rx.borrow().version;

        coordinator.pad().open_challenge(None).unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow().version > start);
        assert!(rx.borrow().challenge_displayed);

        let seen = rx.borrow().version;
        let waited = coordinator
            .wait_for_change(seen, Duration::from_secs(5))
            .await;
        assert_eq!(waited.challenge.unwrap().remaining_secs, 59);
    }
}
