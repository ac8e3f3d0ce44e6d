use crate::newton::{NewtonStep, NewtonTrace};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Delay between automatic steps; the host owns the timer.
    pub interval_ms: u32,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self { interval_ms: 2000 }
    }
}

impl PlaybackSettings {
    pub fn validate(&self) -> Result<()> {
        if self.interval_ms == 0 {
            bail!("interval_ms must be greater than zero.");
        }
        Ok(())
    }
}

/// Replays a precomputed trace one step at a time.
///
/// The cursor is `None` before anything is shown, otherwise the index of the
/// highlighted step. Nothing is recomputed while moving around.
#[derive(Debug, Clone, PartialEq)]
pub struct TracePlayer {
    trace: NewtonTrace,
    settings: PlaybackSettings,
    cursor: Option<usize>,
    animating: bool,
}

impl TracePlayer {
    pub fn new(trace: NewtonTrace, settings: PlaybackSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            trace,
            settings,
            cursor: None,
            animating: false,
        })
    }

    pub fn trace(&self) -> &NewtonTrace {
        &self.trace
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn is_animating(&self) -> bool {
        self.animating
    }

    pub fn interval_ms(&self) -> u32 {
        self.settings.interval_ms
    }

    pub fn current_step(&self) -> Option<&NewtonStep> {
        self.cursor.and_then(|idx| self.trace.steps.get(idx))
    }

    /// Steps drawn so far: everything up to and including the cursor.
    pub fn visible_steps(&self) -> &[NewtonStep] {
        match self.cursor {
            Some(idx) => &self.trace.steps[..=idx],
            None => &[],
        }
    }

    fn last_index(&self) -> Option<usize> {
        self.trace.steps.len().checked_sub(1)
    }

    /// Shows the first step and starts the animation. No-op on an empty trace.
    pub fn start(&mut self) {
        if self.trace.is_empty() {
            return;
        }
        self.cursor = Some(0);
        self.animating = self.last_index() != Some(0);
    }

    /// Continues animating from the current cursor.
    pub fn resume(&mut self) {
        if self.cursor.is_none() {
            self.start();
            return;
        }
        self.animating = self.cursor < self.last_index();
    }

    pub fn pause(&mut self) {
        self.animating = false;
    }

    /// Timer callback. Advances one step while animating and stops on the last one.
    /// Returns whether the cursor moved.
    pub fn tick(&mut self) -> bool {
        if !self.animating {
            return false;
        }
        let moved = self.next();
        if !moved || self.cursor == self.last_index() {
            self.animating = false;
        }
        moved
    }

    pub fn next(&mut self) -> bool {
        let Some(last) = self.last_index() else {
            return false;
        };
        match self.cursor {
            None => self.cursor = Some(0),
            Some(idx) if idx < last => self.cursor = Some(idx + 1),
            Some(_) => return false,
        }
        true
    }

    /// Steps back; from the first step this hides everything again.
    pub fn prev(&mut self) -> bool {
        match self.cursor {
            None => false,
            Some(0) => {
                self.cursor = None;
                true
            }
            Some(idx) => {
                self.cursor = Some(idx - 1);
                true
            }
        }
    }

    pub fn reset(&mut self) {
        self.cursor = None;
        self.animating = false;
    }
}
