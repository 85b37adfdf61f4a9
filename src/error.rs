use chrono::TimeDelta;
use thiserror::Error;

use crate::components::{BuildingId, Position};

/// A player action the village refused. Declines never mutate state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Declined {
    #[error("not enough water drops: need {cost}, have {available}")]
    InsufficientFunds { cost: u32, available: u32 },
    #[error("no building selected")]
    NoSelection,
    #[error("no eligible building to upgrade")]
    NoEligibleTarget,
    #[error("well is refilling, {} seconds left", remaining_secs(.remaining))]
    OnCooldown { remaining: TimeDelta },
    #[error("{position} is outside the village")]
    OutOfBounds { position: Position },
    #[error("unknown building {0}")]
    UnknownBuilding(BuildingId),
    #[error("'{0}' cannot be built or upgraded with these rules")]
    UnknownChoice(String),
    #[error("already upgraded")]
    AlreadyUpgraded,
    #[error("upgrades work differently with these rules")]
    UnsupportedUpgrade,
    #[error("wells fill on their own with these rules")]
    PassiveIncome,
    #[error("no placement in progress")]
    NotDragging,
    #[error("drag the building to where it should go first")]
    NoDropTarget,
    #[error("the game has not started")]
    NotStarted,
}

/// Whole seconds left, rounded up so a wait is never shown as zero.
pub fn remaining_secs(remaining: &TimeDelta) -> i64 {
    let millis = remaining.num_milliseconds().max(0);
    (millis + 999) / 1000
}

#[derive(Debug, Error)]
pub enum RulesError {
    #[error("rule set '{name}' has no cost for '{choice}'")]
    MissingCost { name: String, choice: &'static str },
    #[error("rule set '{name}': {reason}")]
    Invalid { name: String, reason: String },
}
