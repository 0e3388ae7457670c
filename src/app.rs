use tracing::{debug, info, warn};

use crate::auth::{AuthProvider, User};
use crate::celebration::Celebration;
use crate::corpus::Difficulty;
use crate::error::{ConfigurationError, Result, TypeRushError};
use crate::keyboard::VirtualKeyboard;
use crate::scores::{self, DashboardSummary, ProfileSummary, ScoreRecord};
use crate::session::{Effect, Phase, Session, SessionReport};
use crate::store::ScoreStore;

/// Durations offered on the setup screen, in seconds
pub const DURATION_CHOICES: [u32; 4] = [30, 60, 120, 300];

#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    Setup,
    Typing,
    Results,
    Profile,
}

/// What happened to the score write after a session completed
#[derive(Debug, Clone, PartialEq)]
pub enum PersistStatus {
    /// Completed and shown, not yet written
    Pending,
    Saved,
    Failed(String),
}

/// Completed session as shown on the results screen
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOutcome {
    pub report: SessionReport,
    pub is_new_high_score: bool,
    pub prior_high: u32,
    pub persist: PersistStatus,
}

impl SessionOutcome {
    pub fn warning(&self) -> Option<&str> {
        match &self.persist {
            PersistStatus::Pending | PersistStatus::Saved => None,
            PersistStatus::Failed(msg) => Some(msg),
        }
    }
}

/// Glues the session engine to identity, the score store, and the screens
pub struct App {
    pub session: Session,
    store: Box<dyn ScoreStore>,
    auth: Box<dyn AuthProvider>,
    pub state: AppState,
    pub keyboard: VirtualKeyboard,
    pub celebration: Celebration,
    pub input_focused: bool,
    pub outcome: Option<SessionOutcome>,
    pub profile: Option<ProfileSummary>,
    pub dashboard: Option<DashboardSummary>,
    /// Non-fatal message for the current screen
    pub notice: Option<String>,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("session", &self.session)
            .field("state", &self.state)
            .field("outcome", &self.outcome)
            .finish_non_exhaustive()
    }
}

impl App {
    pub fn new(session: Session, store: Box<dyn ScoreStore>, auth: Box<dyn AuthProvider>) -> Self {
        Self {
            session,
            store,
            auth,
            state: AppState::Setup,
            keyboard: VirtualKeyboard::new(),
            celebration: Celebration::new(),
            input_focused: false,
            outcome: None,
            profile: None,
            dashboard: None,
            notice: None,
        }
    }

    pub fn current_user(&self) -> Option<User> {
        if self.auth.is_loading() {
            return None;
        }
        self.auth.current_user()
    }

    /// Begin (or retry) a session. Requires a signed-in user since the score will be saved.
    pub fn start(&mut self) -> Result<Vec<Effect>> {
        if self.current_user().is_none() {
            return Err(TypeRushError::NotAuthenticated);
        }
        self.persist_pending();

        let effects = self.session.start();
        if !effects.is_empty() {
            self.outcome = None;
            self.notice = None;
            self.celebration.stop();
            self.keyboard.press(None);
            self.state = AppState::Typing;
        }
        Ok(self.settle(effects))
    }

    /// Replace the typed buffer wholesale
    pub fn keystroke(&mut self, buffer: &str) -> bool {
        let applied = self.session.keystroke(buffer);
        if applied {
            self.keyboard.press(self.session.last_key());
        }
        applied
    }

    pub fn type_char(&mut self, c: char) -> bool {
        let mut buffer = self.session.input().to_string();
        buffer.push(c);
        self.keystroke(&buffer)
    }

    pub fn backspace(&mut self) -> bool {
        let mut buffer = self.session.input().to_string();
        if buffer.pop().is_none() {
            return false;
        }
        self.keystroke(&buffer)
    }

    pub fn tick(&mut self) -> Vec<Effect> {
        let effects = self.session.tick();
        self.settle(effects)
    }

    /// End the running session early
    pub fn stop(&mut self) -> Vec<Effect> {
        let effects = self.session.stop();
        self.settle(effects)
    }

    /// Leave an active session without recording a score
    pub fn abandon(&mut self) -> Vec<Effect> {
        let effects = self.session.abandon();
        if !effects.is_empty() {
            self.state = AppState::Setup;
        }
        self.settle(effects)
    }

    /// Back to the setup screen from results or profile
    pub fn back_to_setup(&mut self) {
        self.persist_pending();
        self.session.reset();
        self.celebration.stop();
        if !self.session.is_active() {
            self.state = AppState::Setup;
            self.refresh_dashboard();
        }
    }

    /// Recompute the setup screen summary. A failed read hides the dashboard.
    pub fn refresh_dashboard(&mut self) {
        let Some(user) = self.current_user() else {
            self.dashboard = None;
            return;
        };
        self.dashboard = match self.store.read_scores(&user.id) {
            Ok(records) => Some(DashboardSummary::from_records(&records)),
            Err(e) => {
                warn!(user = %user.id, error = %e, "could not load dashboard");
                None
            }
        };
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) -> Result<bool, ConfigurationError> {
        self.session.set_difficulty(difficulty)
    }

    pub fn cycle_difficulty(&mut self) -> Result<bool, ConfigurationError> {
        let next = self.session.difficulty().next();
        self.set_difficulty(next)
    }

    pub fn set_duration(&mut self, secs: u32) -> Result<bool, ConfigurationError> {
        self.session.set_duration(secs)
    }

    pub fn cycle_duration(&mut self) -> Result<bool, ConfigurationError> {
        let current = self.session.duration_secs();
        let next = DURATION_CHOICES
            .iter()
            .copied()
            .find(|&d| d > current)
            .unwrap_or(DURATION_CHOICES[0]);
        self.set_duration(next)
    }

    /// Load the signed-in user's history for the profile screen
    pub fn show_profile(&mut self) -> Result<()> {
        self.persist_pending();
        let user = self.current_user().ok_or(TypeRushError::NotAuthenticated)?;
        let records = self.store.read_scores(&user.id)?;
        self.profile = Some(ProfileSummary::from_records(&records));
        if !self.session.is_active() {
            self.state = AppState::Profile;
        }
        Ok(())
    }

    pub fn history(&self) -> Result<Vec<ScoreRecord>> {
        let user = self.current_user().ok_or(TypeRushError::NotAuthenticated)?;
        Ok(self.store.read_scores(&user.id)?)
    }

    /// Apply the effects the app owns and hand the rest back to the host
    fn settle(&mut self, effects: Vec<Effect>) -> Vec<Effect> {
        for effect in &effects {
            match effect {
                Effect::FocusInput => self.input_focused = true,
                Effect::CancelTimer => self.input_focused = false,
                Effect::StartTimer => {}
                Effect::Completed(report) => {
                    self.state = AppState::Results;
                    self.outcome = Some(SessionOutcome {
                        report: report.clone(),
                        is_new_high_score: false,
                        prior_high: 0,
                        persist: PersistStatus::Pending,
                    });
                }
            }
        }
        effects
    }

    /// Write the completed session's score, if it has not been written yet.
    /// The host calls this after drawing the results so the write never delays
    /// the screen change. Returns whether a write was attempted.
    pub fn persist_pending(&mut self) -> bool {
        let report = match &self.outcome {
            Some(outcome) if outcome.persist == PersistStatus::Pending => outcome.report.clone(),
            _ => return false,
        };
        self.outcome = Some(self.record_score(report));
        true
    }

    /// High-score check and append. Failures are reported on the outcome and
    /// never undo the completed session.
    fn record_score(&mut self, report: SessionReport) -> SessionOutcome {
        let Some(user) = self.current_user() else {
            warn!("session completed without a signed-in user; score not saved");
            return SessionOutcome {
                report,
                is_new_high_score: false,
                prior_high: 0,
                persist: PersistStatus::Failed("not signed in; score not saved".into()),
            };
        };

        let (prior_high, is_new_high_score) = match self.store.read_scores(&user.id) {
            Ok(history) => {
                let prior = scores::prior_high(&history);
                (prior, scores::is_new_high_score(report.record.wpm, prior))
            }
            Err(e) => {
                warn!(user = %user.id, error = %e, "could not read score history");
                (0, false)
            }
        };

        let persist = match self.store.append_score(&user.id, &report.record) {
            Ok(()) => {
                info!(user = %user.id, wpm = report.record.wpm, new_high = is_new_high_score, "score saved");
                PersistStatus::Saved
            }
            Err(e) => {
                warn!(user = %user.id, error = %e, "failed to save score");
                PersistStatus::Failed(format!("score not saved: {e}"))
            }
        };
        debug!(prior_high, "high score compared");

        SessionOutcome {
            report,
            is_new_high_score,
            prior_high,
            persist,
        }
    }

    pub fn phase(&self) -> Phase {
        self.session.phase()
    }
}
