//! Scripted command sequences, used for demos and regression checks.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;

use crate::{
    command::Command,
    engine::{Outcome, Session},
};

#[derive(Debug, Clone, Deserialize)]
pub struct ReplayScript {
    pub steps: Vec<ReplayStep>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplayStep {
    /// Offset from the start of the replay; must not decrease between steps.
    #[serde(default)]
    pub at_secs: u64,
    pub command: Command,
}

impl ReplayStep {
    /// `None` when `at_secs` does not fit a `TimeDelta`.
    pub fn offset(&self) -> Option<TimeDelta> {
        i64::try_from(self.at_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
    }
}

/// What happened at one step: the clock advance that preceded the command, then the command.
#[derive(Debug, Clone)]
pub struct StepReport {
    pub at: DateTime<Utc>,
    pub tick: Outcome,
    pub command: Outcome,
}

impl StepReport {
    pub fn win_dialog_opened(&self) -> bool {
        self.tick.win_dialog_opened || self.command.win_dialog_opened
    }

    /// Feedback lines in the order they were shown.
    pub fn feedback(&self) -> impl Iterator<Item = &str> {
        [&self.tick, &self.command]
            .into_iter()
            .filter_map(|outcome| outcome.feedback.as_ref())
            .map(|line| line.text.as_str())
    }
}

impl ReplayScript {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read replay script {}", path.display()))?;
        Self::from_yaml(&data).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        let script: ReplayScript = serde_yaml::from_str(text)?;
        if let Some(step) = script.steps.iter().find(|step| step.offset().is_none()) {
            anyhow::bail!("step at {}s is out of range", step.at_secs);
        }
        if let Some(pair) = script
            .steps
            .windows(2)
            .find(|pair| pair[1].at_secs < pair[0].at_secs)
        {
            anyhow::bail!(
                "step at {}s comes after a step at {}s",
                pair[1].at_secs,
                pair[0].at_secs
            );
        }
        Ok(script)
    }

    /// Applies every step to `session`, advancing its clock to each step's time first.
    pub fn run(&self, session: &mut Session, start: DateTime<Utc>) -> Result<Vec<StepReport>> {
        self.steps
            .iter()
            .map(|step| -> Result<StepReport> {
                let at = step
                    .offset()
                    .and_then(|offset| start.checked_add_signed(offset))
                    .with_context(|| {
                        format!("step at {}s falls outside the supported time range", step.at_secs)
                    })?;
                let tick = session.advance(at);
                let command = session.apply(step.command.clone(), at);
                Ok(StepReport { at, tick, command })
            })
            .collect()
    }
}
