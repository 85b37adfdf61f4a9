use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use crate::{
    command::BuildChoice,
    components::BuildingKind,
    error::{remaining_secs, Declined},
};

/// Player-facing notices, rendered as short lines by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    Gained(u32),
    Built(BuildChoice),
    Selected(BuildingKind),
    Upgraded,
    UpgradeUnaffordable,
    WallsUpgraded,
    ChooseBuilding(BuildingKind, usize),
    PlaceBuilding(BuildChoice),
    PlacementCancelled,
    VillageReset,
    GameStarted,
    Declined(Declined),
}

impl Feedback {
    pub fn message(&self) -> String {
        match self {
            Feedback::Gained(amount) => format!("+{amount} Water Drops!"),
            Feedback::Built(choice) => format!("Built {choice}!"),
            Feedback::Selected(kind) => format!("Selected {kind}"),
            Feedback::Upgraded => "Building upgraded!".to_string(),
            Feedback::UpgradeUnaffordable => "Not enough water drops to upgrade!".to_string(),
            Feedback::WallsUpgraded => "Walls upgraded!".to_string(),
            Feedback::ChooseBuilding(kind, count) => format!("Which {kind}? Pick 1-{count}"),
            Feedback::PlaceBuilding(choice) => format!("Drag to place your {choice}"),
            Feedback::PlacementCancelled => "Placement cancelled".to_string(),
            Feedback::VillageReset => "Village reset!".to_string(),
            Feedback::GameStarted => "Welcome to the village!".to_string(),
            Feedback::Declined(declined) => declined_message(declined),
        }
    }
}

fn declined_message(declined: &Declined) -> String {
    match declined {
        Declined::InsufficientFunds { .. } => "Not enough water drops!".to_string(),
        Declined::NoSelection => "No building selected!".to_string(),
        Declined::NoEligibleTarget => "Nothing to upgrade there!".to_string(),
        Declined::OnCooldown { remaining } => format!(
            "Well is refilling, try again in {}s",
            remaining_secs(remaining)
        ),
        Declined::OutOfBounds { .. } => "Can't build there, try again!".to_string(),
        other => {
            let text = other.to_string();
            let mut chars = text.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => text,
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackLine {
    pub text: String,
    pub expires_at: DateTime<Utc>,
}

/// Holds the most recent notice until its display time runs out.
#[derive(Debug, Clone)]
pub struct FeedbackBoard {
    duration: TimeDelta,
    current: Option<FeedbackLine>,
}

impl FeedbackBoard {
    pub fn new(duration: TimeDelta) -> Self {
        Self {
            duration,
            current: None,
        }
    }

    pub fn show(&mut self, feedback: &Feedback, now: DateTime<Utc>) -> FeedbackLine {
        let line = FeedbackLine {
            text: feedback.message(),
            expires_at: now + self.duration,
        };
        self.current = Some(line.clone());
        line
    }

    /// Drops the current line once expired; returns true if something was cleared.
    pub fn expire(&mut self, now: DateTime<Utc>) -> bool {
        let expired = self
            .current
            .as_ref()
            .is_some_and(|line| line.expires_at <= now);
        if expired {
            self.current = None;
        }
        expired
    }

    pub fn current(&self, now: DateTime<Utc>) -> Option<&FeedbackLine> {
        self.current.as_ref().filter(|line| line.expires_at > now)
    }
}
