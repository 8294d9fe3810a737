use chrono::{DateTime, Local};

use crate::compare::{count, WordState, WordStatus};

/// Words per minute over the elapsed part of the session.
///
/// Zero until at least part of a second has elapsed.
pub fn wpm(typed_words: usize, configured_secs: u64, remaining_secs: u64) -> u32 {
    let elapsed_minutes = configured_secs.saturating_sub(remaining_secs) as f64 / 60.0;
    if elapsed_minutes <= 0.0 {
        return 0;
    }
    (typed_words as f64 / elapsed_minutes).round() as u32
}

/// Percentage of reference words typed correctly
pub fn accuracy(correct_words: usize, total_reference_words: usize) -> u32 {
    if total_reference_words == 0 {
        return 0;
    }
    ((correct_words as f64 / total_reference_words as f64) * 100.0).round() as u32
}

/// Render seconds as `mm:ss`
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Figures shown while a session is running
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LiveMetrics {
    pub wpm: u32,
    pub correct_words: usize,
}

impl LiveMetrics {
    pub fn compute(
        states: &[WordState],
        typed_words: usize,
        configured_secs: u64,
        remaining_secs: u64,
    ) -> Self {
        Self {
            wpm: wpm(typed_words, configured_secs, remaining_secs),
            correct_words: count(states, WordStatus::Correct),
        }
    }
}

/// Snapshot taken once when a session finishes
#[derive(Clone, Debug, PartialEq)]
pub struct SessionResult {
    pub wpm: u32,
    pub correct_words: usize,
    pub error_words: usize,
    pub typed_words: usize,
    pub total_words: usize,
    pub accuracy: u32,
    pub time_elapsed: u64,
    pub configured_secs: u64,
    pub minimum_words: Option<usize>,
    pub finished_at: DateTime<Local>,
}

impl SessionResult {
    pub fn compute(
        states: &[WordState],
        typed_words: usize,
        configured_secs: u64,
        remaining_secs: u64,
        minimum_words: Option<usize>,
    ) -> Self {
        let correct_words = count(states, WordStatus::Correct);
        Self {
            wpm: wpm(typed_words, configured_secs, remaining_secs),
            correct_words,
            error_words: count(states, WordStatus::Error),
            typed_words,
            total_words: states.len(),
            accuracy: accuracy(correct_words, states.len()),
            time_elapsed: configured_secs.saturating_sub(remaining_secs),
            configured_secs,
            minimum_words,
            finished_at: Local::now(),
        }
    }

    pub fn goal(&self) -> Option<GoalProgress> {
        self.minimum_words
            .map(|minimum| GoalProgress::new(self.correct_words, minimum))
    }
}

/// How far along the minimum-words goal a result got, in coarse bands
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum GoalBand {
    Critical,
    Low,
    Fair,
    Near,
    Met,
    Strong,
    Excellent,
    Outstanding,
}

impl GoalBand {
    fn from_percent(percent: f64) -> Self {
        match percent {
            p if p <= 25.0 => GoalBand::Critical,
            p if p <= 50.0 => GoalBand::Low,
            p if p <= 75.0 => GoalBand::Fair,
            p if p <= 100.0 => GoalBand::Near,
            p if p <= 125.0 => GoalBand::Met,
            p if p <= 150.0 => GoalBand::Strong,
            p if p <= 200.0 => GoalBand::Excellent,
            _ => GoalBand::Outstanding,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GoalProgress {
    pub minimum_words: usize,
    pub correct_words: usize,
    pub percent: f64,
    pub band: GoalBand,
}

impl GoalProgress {
    pub fn new(correct_words: usize, minimum_words: usize) -> Self {
        let percent = if minimum_words == 0 {
            100.0
        } else {
            correct_words as f64 / minimum_words as f64 * 100.0
        };
        Self {
            minimum_words,
            correct_words,
            percent,
            band: GoalBand::from_percent(percent),
        }
    }

    pub fn passed(&self) -> bool {
        self.correct_words >= self.minimum_words
    }

    /// Fill ratio for a gauge, capped at full
    pub fn ratio(&self) -> f64 {
        (self.percent / 100.0).clamp(0.0, 1.0)
    }
}
