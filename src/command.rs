//! Player intents accepted by a session.
//!
//! Free-text choices ("house", "pump", ...) are parsed into closed enums before they
//! reach the village, so the state manager never compares strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::components::{BuildingId, BuildingKind, Position};
use crate::error::Declined;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildChoice {
    House,
    Tree,
    Pump,
}

impl BuildChoice {
    pub fn kind(self) -> BuildingKind {
        match self {
            BuildChoice::House => BuildingKind::Hut,
            BuildChoice::Tree => BuildingKind::Tree,
            BuildChoice::Pump => BuildingKind::Well,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BuildChoice::House => "house",
            BuildChoice::Tree => "tree",
            BuildChoice::Pump => "pump",
        }
    }
}

impl fmt::Display for BuildChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildChoice {
    type Err = Declined;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "house" => Ok(BuildChoice::House),
            "tree" => Ok(BuildChoice::Tree),
            "pump" => Ok(BuildChoice::Pump),
            other => Err(Declined::UnknownChoice(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeCategory {
    Wall,
    House,
    Pump,
}

impl UpgradeCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            UpgradeCategory::Wall => "wall",
            UpgradeCategory::House => "house",
            UpgradeCategory::Pump => "pump",
        }
    }
}

impl fmt::Display for UpgradeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpgradeCategory {
    type Err = Declined;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "wall" => Ok(UpgradeCategory::Wall),
            "house" => Ok(UpgradeCategory::House),
            "pump" => Ok(UpgradeCategory::Pump),
            other => Err(Declined::UnknownChoice(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    StartGame,
    /// Build immediately; a missing position is randomized.
    Build {
        choice: BuildChoice,
        #[serde(default)]
        at: Option<Position>,
    },
    BeginPlacement {
        choice: BuildChoice,
    },
    DragTo {
        position: Position,
    },
    Release,
    CancelPlacement,
    Select {
        building: BuildingId,
    },
    UpgradeSelected,
    Upgrade {
        category: UpgradeCategory,
    },
    /// Picks among the candidates of an ambiguous category upgrade.
    ChooseBuilding {
        index: usize,
    },
    HarvestWell {
        position: Position,
    },
    HarvestVillager,
    Reset,
    DismissWin,
}
