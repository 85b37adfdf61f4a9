//! Rule sets: costs, upgrade mechanics and well income for one flavour of the game.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::{
    command::BuildChoice,
    components::{BuildingKind, PlayArea, Position},
    error::RulesError,
    win::WinDialogPolicy,
};

fn default_starting_drops() -> u32 {
    1000
}

fn default_win_threshold() -> u32 {
    1000
}

fn default_villager_reward() -> u32 {
    10
}

fn default_feedback_millis() -> u64 {
    1500
}

fn default_random_area() -> PlayArea {
    PlayArea {
        min: Position::new(0, 0),
        max: Position::new(500, 300),
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub name: String,
    #[serde(default = "default_starting_drops")]
    pub starting_drops: u32,
    #[serde(default = "default_win_threshold")]
    pub win_threshold: u32,
    #[serde(default = "default_villager_reward")]
    pub villager_reward: u32,
    pub costs: BuildCosts,
    pub upgrades: UpgradePolicy,
    pub wells: WellIncome,
    /// Placement outside this rectangle is refused. `None` disables the check.
    #[serde(default)]
    pub play_area: Option<PlayArea>,
    /// Where randomized placements land.
    #[serde(default = "default_random_area")]
    pub random_area: PlayArea,
    #[serde(default)]
    pub layout: Layout,
    #[serde(default)]
    pub win_dialog: WinDialogPolicy,
    #[serde(default = "default_feedback_millis")]
    pub feedback_millis: u64,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildCosts {
    #[serde(default)]
    pub house: Option<u32>,
    #[serde(default)]
    pub tree: Option<u32>,
    #[serde(default)]
    pub pump: Option<u32>,
}

impl BuildCosts {
    pub fn cost(&self, choice: BuildChoice) -> Option<u32> {
        match choice {
            BuildChoice::House => self.house,
            BuildChoice::Tree => self.tree,
            BuildChoice::Pump => self.pump,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum UpgradePolicy {
    /// Upgrade whatever building the player selected, for a flat cost.
    Selection { cost: u32 },
    /// Upgrade by category; several eligible buildings require an explicit choice.
    Category {
        wall_cost: u32,
        house_cost: u32,
        #[serde(default)]
        pump_cost: Option<u32>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum WellIncome {
    /// Every well pays on its own each interval.
    Passive { interval_secs: u32 },
    /// Wells pay when clicked, then refill for the cooldown window.
    ClickGated { cooldown_secs: u32 },
}

impl WellIncome {
    pub fn window(&self) -> TimeDelta {
        match *self {
            WellIncome::Passive { interval_secs } => TimeDelta::seconds(interval_secs as i64),
            WellIncome::ClickGated { cooldown_secs } => TimeDelta::seconds(cooldown_secs as i64),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    pub buildings: Vec<SeedBuilding>,
    pub villagers: Vec<Position>,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            buildings: vec![
                SeedBuilding {
                    kind: BuildingKind::Hut,
                    position: Position::new(100, 200),
                },
                SeedBuilding {
                    kind: BuildingKind::Well,
                    position: Position::new(300, 150),
                },
            ],
            villagers: vec![
                Position::new(150, 250),
                Position::new(350, 220),
                Position::new(250, 100),
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedBuilding {
    pub kind: BuildingKind,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl RuleSet {
    /// Selection upgrades, trees, and wells that fill on a ten second timer.
    pub fn classic() -> Self {
        Self {
            name: "classic".to_string(),
            starting_drops: default_starting_drops(),
            win_threshold: default_win_threshold(),
            villager_reward: default_villager_reward(),
            costs: BuildCosts {
                house: Some(30),
                tree: Some(10),
                pump: Some(40),
            },
            upgrades: UpgradePolicy::Selection { cost: 20 },
            wells: WellIncome::Passive { interval_secs: 10 },
            play_area: None,
            random_area: default_random_area(),
            layout: Layout::default(),
            win_dialog: WinDialogPolicy::EveryTrigger,
            feedback_millis: default_feedback_millis(),
            logging: LoggingConfig::default(),
        }
    }

    /// Category upgrades, bounded placement, and wells harvested by hand every two minutes.
    pub fn frontier() -> Self {
        Self {
            name: "frontier".to_string(),
            starting_drops: default_starting_drops(),
            win_threshold: default_win_threshold(),
            villager_reward: default_villager_reward(),
            costs: BuildCosts {
                house: Some(30),
                tree: None,
                pump: Some(40),
            },
            upgrades: UpgradePolicy::Category {
                wall_cost: 80,
                house_cost: 70,
                pump_cost: Some(70),
            },
            wells: WellIncome::ClickGated { cooldown_secs: 120 },
            play_area: Some(PlayArea {
                min: Position::new(0, 0),
                max: Position::new(600, 400),
            }),
            random_area: default_random_area(),
            layout: Layout::default(),
            win_dialog: WinDialogPolicy::Once,
            feedback_millis: default_feedback_millis(),
            logging: LoggingConfig::default(),
        }
    }

    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "classic" => Some(Self::classic()),
            "frontier" => Some(Self::frontier()),
            _ => None,
        }
    }

    pub fn feedback_duration(&self) -> TimeDelta {
        TimeDelta::milliseconds(self.feedback_millis as i64)
    }

    pub fn validate(&self) -> Result<(), RulesError> {
        let invalid = |reason: &str| RulesError::Invalid {
            name: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name must not be empty"));
        }
        if self.random_area.max.x <= self.random_area.min.x
            || self.random_area.max.y <= self.random_area.min.y
        {
            return Err(invalid("random_area must have a positive size"));
        }
        if self.wells.window() <= TimeDelta::zero() {
            return Err(invalid("well interval must be at least one second"));
        }
        if self.feedback_millis == 0 {
            return Err(invalid("feedback_millis must be positive"));
        }

        for seed in &self.layout.buildings {
            let choice = match seed.kind {
                BuildingKind::Hut => BuildChoice::House,
                BuildingKind::Well => BuildChoice::Pump,
                BuildingKind::Tree => BuildChoice::Tree,
            };
            if self.costs.cost(choice).is_none() {
                return Err(RulesError::MissingCost {
                    name: self.name.clone(),
                    choice: choice.as_str(),
                });
            }
            if let Some(area) = self.play_area {
                if !area.contains(seed.position) {
                    return Err(invalid(&format!(
                        "seeded {} at {} lies outside the play area",
                        seed.kind, seed.position
                    )));
                }
            }
        }
        Ok(())
    }
}

pub struct RuleSetLoader {
    base_dir: PathBuf,
}

impl RuleSetLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<RuleSet> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read rule set file {}", path.display()))?;
        let rules: RuleSet = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        rules
            .validate()
            .with_context(|| format!("Invalid rule set in {}", path.display()))?;
        Ok(rules)
    }

    /// Accepts either a built-in name (`classic`, `frontier`) or a YAML path.
    pub fn resolve(&self, name_or_path: &str) -> Result<RuleSet> {
        match RuleSet::builtin(name_or_path) {
            Some(rules) => Ok(rules),
            None => self.load(name_or_path),
        }
    }
}
