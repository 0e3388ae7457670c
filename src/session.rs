use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::clock::Clock;
use crate::corpus::Difficulty;
use crate::error::ConfigurationError;
use crate::metrics::{self, Metrics, Outcome};
use crate::scores::ScoreRecord;
use crate::text_generator::TextGenerator;

pub const DEFAULT_DURATION_SECS: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Active,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub difficulty: Difficulty,
    pub duration_secs: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::default(),
            duration_secs: DEFAULT_DURATION_SECS,
        }
    }
}

/// Side effects the host must carry out after a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Begin delivering one tick per second
    StartTimer,
    /// Stop delivering ticks, immediately
    CancelTimer,
    FocusInput,
    /// The session finished; persist the record exactly once
    Completed(SessionReport),
}

/// Everything computed when a session completes
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub metrics: Metrics,
    pub record: ScoreRecord,
}

/// One typing attempt: target text, captured input, and countdown
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    generator: TextGenerator,
    clock: Box<dyn Clock>,
    phase: Phase,
    target_text: String,
    input: String,
    started_at_ms: Option<i64>,
    remaining_secs: u32,
    last_key: Option<char>,
    report: Option<SessionReport>,
}

impl Session {
    /// Create an idle session with text already selected for the configured difficulty
    pub fn new(
        config: SessionConfig,
        mut generator: TextGenerator,
        clock: Box<dyn Clock>,
    ) -> Result<Self, ConfigurationError> {
        if config.duration_secs == 0 {
            return Err(ConfigurationError::InvalidDuration(0));
        }
        let target_text = generator.generate(config.difficulty)?;

        Ok(Self {
            config,
            generator,
            clock,
            phase: Phase::Idle,
            target_text,
            input: String::new(),
            started_at_ms: None,
            remaining_secs: config.duration_secs,
            last_key: None,
            report: None,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    pub fn difficulty(&self) -> Difficulty {
        self.config.difficulty
    }

    pub fn duration_secs(&self) -> u32 {
        self.config.duration_secs
    }

    pub fn target_text(&self) -> &str {
        &self.target_text
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn started_at_ms(&self) -> Option<i64> {
        self.started_at_ms
    }

    /// Most recently typed character, for the virtual keyboard
    pub fn last_key(&self) -> Option<char> {
        self.last_key
    }

    /// Report of the last completed run, kept until the next start
    pub fn report(&self) -> Option<&SessionReport> {
        self.report.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.phase == Phase::Active
    }

    /// Correctness of each typed character against the target
    pub fn char_outcomes(&self) -> Vec<Outcome> {
        metrics::char_outcomes(&self.input, &self.target_text)
    }

    /// Change the tier while idle. Reselects text only when the tier actually changes.
    /// Returns whether new text was selected.
    pub fn set_difficulty(&mut self, difficulty: Difficulty) -> Result<bool, ConfigurationError> {
        if self.phase != Phase::Idle || difficulty == self.config.difficulty {
            return Ok(false);
        }

        let text = self.generator.generate(difficulty)?;
        debug!(from = %self.config.difficulty, to = %difficulty, "difficulty changed, text reselected");
        self.config.difficulty = difficulty;
        self.target_text = text;
        Ok(true)
    }

    /// Change the test length while idle. Returns whether it was applied.
    pub fn set_duration(&mut self, duration_secs: u32) -> Result<bool, ConfigurationError> {
        if duration_secs == 0 {
            return Err(ConfigurationError::InvalidDuration(duration_secs));
        }
        if self.phase != Phase::Idle {
            return Ok(false);
        }

        self.config.duration_secs = duration_secs;
        self.remaining_secs = duration_secs;
        Ok(true)
    }

    /// Begin a run from `Idle` or `Complete`
    pub fn start(&mut self) -> Vec<Effect> {
        if self.phase == Phase::Active {
            return vec![];
        }

        let now = self.clock.now_ms();
        self.input.clear();
        self.last_key = None;
        self.report = None;
        self.remaining_secs = self.config.duration_secs;
        self.started_at_ms = Some(now);
        self.phase = Phase::Active;

        debug!(
            difficulty = %self.config.difficulty,
            duration_secs = self.config.duration_secs,
            "session started"
        );
        vec![Effect::StartTimer, Effect::FocusInput]
    }

    /// Replace the captured input with the full current buffer.
    /// Ignored unless active; returns whether it was applied.
    pub fn keystroke(&mut self, buffer: &str) -> bool {
        if self.phase != Phase::Active {
            return false;
        }

        if let Some(c) = buffer.chars().last() {
            self.last_key = Some(c);
        }
        self.input.clear();
        self.input.push_str(buffer);
        true
    }

    /// One elapsed second. Completes the session when the countdown reaches zero.
    pub fn tick(&mut self) -> Vec<Effect> {
        if self.phase != Phase::Active {
            return vec![];
        }

        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.complete()
        } else {
            vec![]
        }
    }

    /// End the run early
    pub fn stop(&mut self) -> Vec<Effect> {
        if self.phase != Phase::Active {
            return vec![];
        }
        self.complete()
    }

    /// Drop an active run without producing a score
    pub fn abandon(&mut self) -> Vec<Effect> {
        if self.phase != Phase::Active {
            return vec![];
        }

        debug!(typed = self.input.len(), "session abandoned");
        self.phase = Phase::Idle;
        self.input.clear();
        self.last_key = None;
        self.started_at_ms = None;
        self.remaining_secs = self.config.duration_secs;
        vec![Effect::CancelTimer]
    }

    /// Return from the results to the settings, keeping the current text
    pub fn reset(&mut self) -> bool {
        if self.phase != Phase::Complete {
            return false;
        }

        self.phase = Phase::Idle;
        self.input.clear();
        self.last_key = None;
        self.started_at_ms = None;
        self.remaining_secs = self.config.duration_secs;
        true
    }

    fn complete(&mut self) -> Vec<Effect> {
        let completed_at_ms = self.clock.now_ms();
        let started_at_ms = self.started_at_ms.unwrap_or(completed_at_ms);
        let metrics = Metrics::compute(&self.input, &self.target_text, started_at_ms, completed_at_ms);

        let record = ScoreRecord {
            wpm: metrics.wpm,
            accuracy: metrics.accuracy,
            difficulty: self.config.difficulty,
            duration_secs: self.config.duration_secs,
            completed_at: DateTime::<Utc>::from_timestamp_millis(completed_at_ms).unwrap_or_default(),
        };
        let report = SessionReport { metrics, record };

        self.phase = Phase::Complete;
        self.report = Some(report.clone());

        info!(
            wpm = metrics.wpm,
            accuracy = metrics.accuracy,
            words = metrics.word_count,
            elapsed_ms = metrics.elapsed_ms,
            "session complete"
        );
        vec![Effect::CancelTimer, Effect::Completed(report)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::corpus::Corpus;
    use crate::text_generator::SequenceIndex;
    use assert_matches::assert_matches;

    fn corpus() -> Corpus {
        Corpus::from_tiers([
            (Difficulty::Easy, vec!["cat".into(), "dog".into()]),
            (Difficulty::Medium, vec!["the quick brown fox".into()]),
            (Difficulty::Hard, vec!["sphinx of black quartz".into()]),
        ])
    }

    fn session_with(config: SessionConfig, indices: Vec<usize>) -> (Session, ManualClock) {
        let clock = ManualClock::new(1_000_000);
        let generator = TextGenerator::new(corpus(), Box::new(SequenceIndex::new(indices)));
        let session = Session::new(config, generator, Box::new(clock.clone())).unwrap();
        (session, clock)
    }

    fn session(duration_secs: u32) -> (Session, ManualClock) {
        session_with(
            SessionConfig {
                difficulty: Difficulty::Medium,
                duration_secs,
            },
            vec![],
        )
    }

    fn completed_report(effects: &[Effect]) -> Option<&SessionReport> {
        effects.iter().find_map(|e| match e {
            Effect::Completed(r) => Some(r),
            _ => None,
        })
    }

    #[test]
    fn test_new_session_is_idle_with_text() {
        let (s, _) = session(60);

        assert_eq!(s.phase(), Phase::Idle);
        assert_eq!(s.remaining_secs(), 60);
        assert_eq!(
            s.target_text(),
            "the quick brown fox the quick brown fox the quick brown fox the quick brown fox the quick brown fox"
        );
        assert!(s.input().is_empty());
    }

    #[test]
    fn test_zero_duration_rejected() {
        let generator = TextGenerator::with_random(corpus());
        let result = Session::new(
            SessionConfig {
                difficulty: Difficulty::Easy,
                duration_secs: 0,
            },
            generator,
            Box::new(ManualClock::new(0)),
        );
        assert_matches!(result, Err(ConfigurationError::InvalidDuration(0)));
    }

    #[test]
    fn test_empty_tier_fails_construction() {
        let generator = TextGenerator::with_random(Corpus::default());
        let result = Session::new(SessionConfig::default(), generator, Box::new(ManualClock::new(0)));
        assert_matches!(result, Err(ConfigurationError::EmptyTier(Difficulty::Medium)));
    }

    #[test]
    fn test_start_for_all_configs() {
        for difficulty in Difficulty::ALL {
            for duration_secs in [1, 30, 60, 120, 300] {
                let (mut s, clock) = session_with(
                    SessionConfig {
                        difficulty,
                        duration_secs,
                    },
                    vec![],
                );

                let effects = s.start();

                assert_eq!(effects, vec![Effect::StartTimer, Effect::FocusInput]);
                assert_eq!(s.phase(), Phase::Active);
                assert_eq!(s.remaining_secs(), duration_secs);
                assert_eq!(s.input(), "");
                assert_eq!(s.started_at_ms(), Some(clock.now_ms()));
                assert!(!s.target_text().is_empty());
            }
        }
    }

    #[test]
    fn test_start_while_active_is_noop() {
        let (mut s, clock) = session(60);
        s.start();
        s.keystroke("the");
        clock.advance_secs(3);

        assert!(s.start().is_empty());
        assert_eq!(s.input(), "the");
        assert_eq!(s.started_at_ms(), Some(1_000_000));
    }

    #[test]
    fn test_keystroke_replaces_input_and_tracks_last_key() {
        let (mut s, _) = session(60);
        s.start();

        assert!(s.keystroke("th"));
        assert!(s.keystroke("tha"));
        assert_eq!(s.input(), "tha");
        assert_eq!(s.last_key(), Some('a'));

        assert!(s.keystroke("th"));
        assert_eq!(s.input(), "th");
        assert_eq!(s.last_key(), Some('h'));

        assert!(s.keystroke(""));
        assert_eq!(s.input(), "");
        assert_eq!(s.last_key(), Some('h'));
    }

    #[test]
    fn test_keystroke_ignored_outside_active() {
        let (mut s, _) = session(1);

        assert!(!s.keystroke("abc"));
        assert_eq!(s.input(), "");

        s.start();
        s.tick();
        assert_eq!(s.phase(), Phase::Complete);
        assert!(!s.keystroke("abc"));
        assert_eq!(s.input(), "");
    }

    #[test]
    fn test_ticks_count_down_then_complete() {
        let duration = 5;
        let (mut s, clock) = session(duration);
        s.start();

        for k in 1..duration {
            clock.advance_secs(1);
            assert!(s.tick().is_empty());
            assert_eq!(s.remaining_secs(), duration - k);
            assert_eq!(s.phase(), Phase::Active);
        }

        clock.advance_secs(1);
        let effects = s.tick();

        assert_eq!(s.phase(), Phase::Complete);
        assert_eq!(s.remaining_secs(), 0);
        assert_eq!(effects[0], Effect::CancelTimer);
        assert!(completed_report(&effects).is_some());
    }

    #[test]
    fn test_ticks_after_complete_do_nothing() {
        let (mut s, _) = session(1);
        s.start();
        s.tick();

        assert!(s.tick().is_empty());
        assert_eq!(s.remaining_secs(), 0);
        assert_eq!(s.phase(), Phase::Complete);
    }

    #[test]
    fn test_tick_while_idle_does_nothing() {
        let (mut s, _) = session(10);
        assert!(s.tick().is_empty());
        assert_eq!(s.remaining_secs(), 10);
    }

    #[test]
    fn test_wpm_from_elapsed_time() {
        let (mut s, clock) = session(120);
        s.start();
        s.keystroke("the quick brown fox");
        clock.advance_secs(120);

        let mut effects = vec![];
        for _ in 0..120 {
            effects = s.tick();
        }
        let report = completed_report(&effects).unwrap();

        assert_eq!(report.metrics.wpm, 2);
        assert_eq!(report.metrics.accuracy, 100);
        assert_eq!(report.record.wpm, 2);
        assert_eq!(report.record.duration_secs, 120);
        assert_eq!(report.record.difficulty, Difficulty::Medium);
    }

    #[test]
    fn test_instant_stop_gives_zero_wpm() {
        let (mut s, _) = session(60);
        s.start();
        s.keystroke("the quick");

        let effects = s.stop();
        let report = completed_report(&effects).unwrap();

        assert_eq!(report.metrics.elapsed_ms, 0);
        assert_eq!(report.metrics.wpm, 0);
        assert_eq!(report.metrics.accuracy, 100);
    }

    #[test]
    fn test_empty_input_gives_zero_accuracy() {
        let (mut s, clock) = session(60);
        s.start();
        clock.advance_secs(30);

        let effects = s.stop();
        let report = completed_report(&effects).unwrap();

        assert_eq!(report.metrics.accuracy, 0);
        assert_eq!(report.metrics.wpm, 0);
    }

    #[test]
    fn test_cat_cas_accuracy() {
        let (mut s, clock) = session_with(
            SessionConfig {
                difficulty: Difficulty::Easy,
                duration_secs: 60,
            },
            vec![0, 0, 0, 0, 0],
        );
        assert!(s.target_text().starts_with("cat"));
        s.start();
        s.keystroke("cas");
        clock.advance_secs(60);

        let effects = s.stop();

        assert_eq!(completed_report(&effects).unwrap().metrics.accuracy, 67);
    }

    #[test]
    fn test_completed_at_uses_clock() {
        let (mut s, clock) = session(60);
        s.start();
        clock.set(1_700_000_000_000);

        let effects = s.stop();
        let record = &completed_report(&effects).unwrap().record;

        assert_eq!(record.completed_at.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn test_stop_outside_active_is_noop() {
        let (mut s, _) = session(60);
        assert!(s.stop().is_empty());
        assert_eq!(s.phase(), Phase::Idle);
        assert!(s.report().is_none());
    }

    #[test]
    fn test_exactly_one_report_per_completion() {
        let (mut s, _) = session(2);
        s.start();

        let mut reports = 0;
        for _ in 0..10 {
            let mut effects = s.tick();
            effects.extend(s.stop());
            reports += effects.iter().filter(|e| matches!(e, Effect::Completed(_))).count();
        }

        assert_eq!(reports, 1);
        assert!(s.report().is_some());
    }

    #[test]
    fn test_restart_from_complete() {
        let (mut s, _) = session(3);
        let text = s.target_text().to_string();
        s.start();
        s.keystroke("the");
        s.stop();

        let effects = s.start();

        assert_eq!(effects, vec![Effect::StartTimer, Effect::FocusInput]);
        assert_eq!(s.phase(), Phase::Active);
        assert_eq!(s.remaining_secs(), 3);
        assert_eq!(s.input(), "");
        assert!(s.report().is_none());
        assert_eq!(s.target_text(), text);
    }

    #[test]
    fn test_abandon_cancels_without_report() {
        let (mut s, _) = session(10);
        s.start();
        s.keystroke("the qu");
        s.tick();

        let effects = s.abandon();

        assert_eq!(effects, vec![Effect::CancelTimer]);
        assert_eq!(s.phase(), Phase::Idle);
        assert_eq!(s.remaining_secs(), 10);
        assert!(s.report().is_none());
        assert!(s.tick().is_empty());
        assert!(s.abandon().is_empty());
    }

    #[test]
    fn test_reset_from_complete() {
        let (mut s, _) = session(1);
        assert!(!s.reset());
        s.start();
        s.tick();

        assert!(s.reset());
        assert_eq!(s.phase(), Phase::Idle);
        assert_eq!(s.remaining_secs(), 1);
    }

    #[test]
    fn test_difficulty_change_reselects_once() {
        let (mut s, _) = session_with(
            SessionConfig {
                difficulty: Difficulty::Easy,
                duration_secs: 60,
            },
            vec![0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 1],
        );
        let original = s.target_text().to_string();
        assert_eq!(original, "cat cat cat cat cat");

        // unchanged difficulty never reselects
        for _ in 0..5 {
            assert!(!s.set_difficulty(Difficulty::Easy).unwrap());
            assert_eq!(s.target_text(), original);
        }

        assert!(s.set_difficulty(Difficulty::Hard).unwrap());
        assert_eq!(s.difficulty(), Difficulty::Hard);
        assert!(s.target_text().starts_with("sphinx"));

        // the pinned sequence continues where it left off
        assert!(s.set_difficulty(Difficulty::Easy).unwrap());
        assert_eq!(s.target_text(), "dog dog dog dog dog");
    }

    #[test]
    fn test_difficulty_locked_while_active() {
        let (mut s, _) = session(60);
        let text = s.target_text().to_string();
        s.start();

        assert!(!s.set_difficulty(Difficulty::Hard).unwrap());
        assert_eq!(s.difficulty(), Difficulty::Medium);
        assert_eq!(s.target_text(), text);
    }

    #[test]
    fn test_difficulty_change_to_empty_tier_keeps_state() {
        let generator = TextGenerator::with_random(Corpus::from_tiers([(
            Difficulty::Medium,
            vec!["only medium".to_string()],
        )]));
        let mut s =
            Session::new(SessionConfig::default(), generator, Box::new(ManualClock::new(0))).unwrap();

        assert_matches!(
            s.set_difficulty(Difficulty::Hard),
            Err(ConfigurationError::EmptyTier(Difficulty::Hard))
        );
        assert_eq!(s.difficulty(), Difficulty::Medium);
        assert!(s.target_text().starts_with("only medium"));
    }

    #[test]
    fn test_set_duration() {
        let (mut s, _) = session(60);

        assert!(s.set_duration(30).unwrap());
        assert_eq!(s.remaining_secs(), 30);
        assert_matches!(s.set_duration(0), Err(ConfigurationError::InvalidDuration(0)));

        s.start();
        assert!(!s.set_duration(120).unwrap());
        assert_eq!(s.duration_secs(), 30);
    }

    #[test]
    fn test_char_outcomes_follow_input() {
        let (mut s, _) = session(60);
        s.start();
        s.keystroke("thx");

        assert_eq!(
            s.char_outcomes(),
            vec![Outcome::Correct, Outcome::Correct, Outcome::Incorrect]
        );
    }
}
