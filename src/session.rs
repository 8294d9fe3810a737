use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info};

use crate::clock::{SessionClock, Tick};
use crate::compare::{tokenize, word_states, WordState};
use crate::content::ContentState;
use crate::metrics::{LiveMetrics, SessionResult};

pub const DEFAULT_DURATION_SECS: u64 = 4 * 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("a session is already running")]
    AlreadyRunning,
    #[error("no reference text loaded")]
    NoReferenceText,
    #[error("no session is running")]
    NotRunning,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub duration_secs: u64,
    pub minimum_words: Option<usize>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_secs: DEFAULT_DURATION_SECS,
            minimum_words: None,
        }
    }
}

/// The passage to reproduce; never empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceText {
    text: String,
    words: Vec<String>,
}

impl ReferenceText {
    /// `None` when the text holds no words
    pub fn parse(text: &str) -> Option<Self> {
        let words = tokenize(text);
        if words.is_empty() {
            return None;
        }
        Some(Self {
            text: text.trim().to_string(),
            words,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }
}

/// What the user has typed so far
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputBuffer {
    raw: String,
    words: Vec<String>,
}

impl InputBuffer {
    pub fn push(&mut self, c: char) {
        self.raw.push(c);
        self.words = tokenize(&self.raw);
    }

    pub fn backspace(&mut self) {
        if self.raw.pop().is_some() {
            self.words = tokenize(&self.raw);
        }
    }

    pub fn clear(&mut self) {
        self.raw.clear();
        self.words.clear();
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }
}

#[derive(Debug, Clone)]
pub enum Phase {
    Idle,
    Running { clock: SessionClock },
}

/// Drives one practice run at a time: idle -> running -> idle.
///
/// The countdown only exists inside `Phase::Running`, so leaving that phase
/// in any way drops it and later ticks have nothing to act on.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    content: ContentState,
    phase: Phase,
    input: InputBuffer,
    states: Vec<WordState>,
    live: LiveMetrics,
    result: Option<SessionResult>,
}

impl Session {
    pub fn new(config: SessionConfig, content: ContentState) -> Self {
        let mut session = Self {
            config,
            content,
            phase: Phase::Idle,
            input: InputBuffer::default(),
            states: Vec::new(),
            live: LiveMetrics::default(),
            result: None,
        };
        session.recompute();
        session
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn content(&self) -> &ContentState {
        &self.content
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn input(&self) -> &InputBuffer {
        &self.input
    }

    pub fn word_states(&self) -> &[WordState] {
        &self.states
    }

    pub fn live_metrics(&self) -> LiveMetrics {
        self.live
    }

    pub fn result(&self) -> Option<&SessionResult> {
        self.result.as_ref()
    }

    pub fn is_running(&self) -> bool {
        matches!(self.phase, Phase::Running { .. })
    }

    pub fn can_start(&self) -> bool {
        !self.is_running() && self.content.reference().is_some()
    }

    /// Seconds to show on the countdown
    pub fn remaining_secs(&self) -> u64 {
        match (&self.phase, &self.result) {
            (Phase::Running { clock }, _) => clock.remaining_secs(),
            (Phase::Idle, Some(result)) => result.configured_secs - result.time_elapsed,
            (Phase::Idle, None) => self.config.duration_secs,
        }
    }

    /// Swap the reference text; refused during a run
    pub fn set_content(&mut self, content: ContentState) -> Result<(), SessionError> {
        if self.is_running() {
            return Err(SessionError::AlreadyRunning);
        }
        debug!(available = content.reference().is_some(), "reference text replaced");
        self.content = content;
        self.input.clear();
        self.result = None;
        self.recompute();
        Ok(())
    }

    /// Close the results and clear the typed text, keeping the passage
    pub fn dismiss_result(&mut self) {
        if self.is_running() {
            return;
        }
        self.result = None;
        self.input.clear();
        self.recompute();
    }

    /// Change duration or goal for the next run
    pub fn set_config(&mut self, config: SessionConfig) -> Result<(), SessionError> {
        if self.is_running() {
            return Err(SessionError::AlreadyRunning);
        }
        self.config = config;
        Ok(())
    }

    pub fn start(&mut self) -> Result<(), SessionError> {
        self.start_at(Instant::now())
    }

    pub fn start_at(&mut self, now: Instant) -> Result<(), SessionError> {
        if self.is_running() {
            return Err(SessionError::AlreadyRunning);
        }
        if self.content.reference().is_none() {
            return Err(SessionError::NoReferenceText);
        }

        self.input.clear();
        self.result = None;
        self.phase = Phase::Running {
            clock: SessionClock::start_at(self.config.duration_secs, now),
        };
        self.recompute();
        info!(
            duration_secs = self.config.duration_secs,
            words = self.states.len(),
            "session started"
        );
        Ok(())
    }

    /// Abandon the run; nothing is reported
    pub fn cancel(&mut self) -> Result<(), SessionError> {
        if !self.is_running() {
            return Err(SessionError::NotRunning);
        }
        self.phase = Phase::Idle;
        self.input.clear();
        self.result = None;
        self.recompute();
        info!("session cancelled");
        Ok(())
    }

    /// End the run and compute its result.
    ///
    /// Returns `None` when no run is active, so repeated calls only ever
    /// produce one result.
    pub fn finish(&mut self) -> Option<SessionResult> {
        let Phase::Running { clock } = std::mem::replace(&mut self.phase, Phase::Idle) else {
            return None;
        };

        let result = SessionResult::compute(
            &self.states,
            self.input.words().len(),
            clock.configured_secs(),
            clock.remaining_secs(),
            self.config.minimum_words,
        );
        info!(
            wpm = result.wpm,
            accuracy = result.accuracy,
            correct = result.correct_words,
            elapsed_secs = result.time_elapsed,
            "session finished"
        );
        self.result = Some(result.clone());
        Some(result)
    }

    /// Advance the countdown; returns the result when this tick ran it out
    pub fn on_tick(&mut self) -> Option<SessionResult> {
        self.on_tick_at(Instant::now())
    }

    pub fn on_tick_at(&mut self, now: Instant) -> Option<SessionResult> {
        let Phase::Running { clock } = &mut self.phase else {
            return None;
        };

        match clock.tick_at(now) {
            Tick::Running(_) => {
                self.refresh_live();
                None
            }
            Tick::Expired | Tick::Idle => {
                debug!("countdown reached zero");
                self.finish()
            }
        }
    }

    pub fn on_char(&mut self, c: char) {
        if self.is_running() {
            self.input.push(c);
            self.recompute();
        }
    }

    pub fn on_backspace(&mut self) {
        if self.is_running() {
            self.input.backspace();
            self.recompute();
        }
    }

    fn recompute(&mut self) {
        self.states = match self.content.reference() {
            Some(reference) => word_states(reference.words(), self.input.words()),
            None => Vec::new(),
        };
        self.refresh_live();
    }

    fn refresh_live(&mut self) {
        self.live = match &self.phase {
            Phase::Running { clock } => LiveMetrics::compute(
                &self.states,
                self.input.words().len(),
                clock.configured_secs(),
                clock.remaining_secs(),
            ),
            Phase::Idle => LiveMetrics::default(),
        };
    }
}
