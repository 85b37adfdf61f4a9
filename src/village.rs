use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, info};

use crate::{
    command::{BuildChoice, UpgradeCategory},
    components::{Building, BuildingId, BuildingKind, Position, PositionKey, Villager},
    error::Declined,
    rules::{RuleSet, UpgradePolicy, WellIncome},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpgradeOutcome {
    Upgraded(BuildingId),
    WallsUpgraded,
    /// Several buildings qualify; resolve with [`Village::choose_building`].
    NeedsChoice(Vec<BuildingId>),
}

/// Authoritative game state for one village.
///
/// Buildings and villagers are append-only until [`Village::init_game`]; a building's
/// `upgraded` flag only ever goes from false to true. Every operation checks its
/// preconditions before touching state, so a declined action leaves the village unchanged.
#[derive(Debug, Clone)]
pub struct Village {
    rules: RuleSet,
    drops: u32,
    buildings: Vec<Building>,
    villagers: Vec<Villager>,
    well_cooldowns: HashMap<PositionKey, DateTime<Utc>>,
    well_timers: HashMap<BuildingId, DateTime<Utc>>,
    selected: Option<BuildingId>,
    walls_upgraded: bool,
    pending: Option<PendingChoice>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingChoice {
    candidates: Vec<BuildingId>,
    cost: u32,
}

impl Village {
    pub fn new(rules: RuleSet) -> Self {
        let mut village = Self {
            drops: rules.starting_drops,
            rules,
            buildings: Vec::new(),
            villagers: Vec::new(),
            well_cooldowns: HashMap::new(),
            well_timers: HashMap::new(),
            selected: None,
            walls_upgraded: false,
            pending: None,
        };
        village.init_game();
        village
    }

    pub fn init_game(&mut self) {
        self.drops = self.rules.starting_drops;
        self.buildings.clear();
        self.villagers.clear();
        self.well_cooldowns.clear();
        self.well_timers.clear();
        self.selected = None;
        self.walls_upgraded = false;
        self.pending = None;

        let layout = self.rules.layout.clone();
        for seed in layout.buildings {
            self.place(seed.kind, seed.position);
        }
        self.villagers
            .extend(layout.villagers.into_iter().map(|position| Villager { position }));
        info!(
            rules = %self.rules.name,
            drops = self.drops,
            buildings = self.buildings.len(),
            villagers = self.villagers.len(),
            "village initialised"
        );
    }

    pub fn build(&mut self, choice: BuildChoice, position: Position) -> Result<BuildingId, Declined> {
        let cost = self
            .rules
            .costs
            .cost(choice)
            .ok_or_else(|| Declined::UnknownChoice(choice.to_string()))?;
        self.ensure_funds(cost)?;
        if let Some(area) = self.rules.play_area {
            if !area.contains(position) {
                debug!(%position, "placement outside play area");
                return Err(Declined::OutOfBounds { position });
            }
        }

        self.drops -= cost;
        let id = self.place(choice.kind(), position);
        info!(%choice, %position, cost, drops = self.drops, "built");
        Ok(id)
    }

    pub fn select(&mut self, id: BuildingId) -> Result<&Building, Declined> {
        let building = self
            .buildings
            .get(id.raw())
            .ok_or(Declined::UnknownBuilding(id))?;
        self.selected = Some(id);
        Ok(building)
    }

    pub fn upgrade_selected(&mut self) -> Result<BuildingId, Declined> {
        let UpgradePolicy::Selection { cost } = self.rules.upgrades else {
            return Err(Declined::UnsupportedUpgrade);
        };
        let id = self.selected.ok_or(Declined::NoSelection)?;
        if self.buildings[id.raw()].upgraded {
            return Err(Declined::AlreadyUpgraded);
        }
        self.ensure_funds(cost)?;

        self.drops -= cost;
        self.mark_upgraded(id);
        self.selected = None;
        info!(building = %id, cost, drops = self.drops, "upgraded selected building");
        Ok(id)
    }

    pub fn upgrade(&mut self, category: UpgradeCategory) -> Result<UpgradeOutcome, Declined> {
        let UpgradePolicy::Category {
            wall_cost,
            house_cost,
            pump_cost,
        } = self.rules.upgrades
        else {
            return Err(Declined::UnsupportedUpgrade);
        };

        let (kind, cost) = match category {
            UpgradeCategory::Wall => {
                if self.walls_upgraded {
                    return Err(Declined::AlreadyUpgraded);
                }
                self.ensure_funds(wall_cost)?;
                self.drops -= wall_cost;
                self.walls_upgraded = true;
                self.selected = None;
                self.pending = None;
                info!(cost = wall_cost, drops = self.drops, "walls upgraded");
                return Ok(UpgradeOutcome::WallsUpgraded);
            }
            UpgradeCategory::House => (BuildingKind::Hut, house_cost),
            UpgradeCategory::Pump => (
                BuildingKind::Well,
                pump_cost.ok_or_else(|| Declined::UnknownChoice(category.to_string()))?,
            ),
        };

        let eligible = self.eligible(kind);
        if eligible.is_empty() {
            return Err(Declined::NoEligibleTarget);
        }
        self.ensure_funds(cost)?;
        if let [only] = eligible.as_slice() {
            let id = *only;
            self.apply_upgrade(id, cost);
            return Ok(UpgradeOutcome::Upgraded(id));
        }
        debug!(%kind, candidates = eligible.len(), "upgrade needs a choice");
        self.pending = Some(PendingChoice {
            candidates: eligible.clone(),
            cost,
        });
        Ok(UpgradeOutcome::NeedsChoice(eligible))
    }

    /// Resolves a pending upgrade choice by index into its candidate list.
    pub fn choose_building(&mut self, index: usize) -> Result<BuildingId, Declined> {
        let (id, cost) = self
            .pending
            .as_ref()
            .and_then(|pending| Some((*pending.candidates.get(index)?, pending.cost)))
            .ok_or(Declined::NoEligibleTarget)?;
        if self.buildings[id.raw()].upgraded {
            return Err(Declined::AlreadyUpgraded);
        }
        self.ensure_funds(cost)?;

        self.apply_upgrade(id, cost);
        Ok(id)
    }

    pub fn harvest_well(&mut self, position: Position, now: DateTime<Utc>) -> Result<u32, Declined> {
        let well = self
            .buildings
            .iter()
            .find(|b| b.kind == BuildingKind::Well && b.position == position)
            .ok_or(Declined::NoEligibleTarget)?;
        let window = match self.rules.wells {
            WellIncome::Passive { .. } => return Err(Declined::PassiveIncome),
            WellIncome::ClickGated { .. } => self.rules.wells.window(),
        };

        let key = position.key();
        if let Some(last) = self.well_cooldowns.get(&key) {
            let elapsed = now - *last;
            if elapsed < window {
                let remaining = window - elapsed;
                debug!(%position, remaining_ms = remaining.num_milliseconds(), "well on cooldown");
                return Err(Declined::OnCooldown { remaining });
            }
        }

        let amount = well.well_yield();
        self.drops = self.drops.saturating_add(amount);
        self.well_cooldowns.insert(key, now);
        debug!(%position, amount, drops = self.drops, "well harvested");
        Ok(amount)
    }

    pub fn harvest_villager(&mut self) -> u32 {
        let amount = self.rules.villager_reward;
        self.drops = self.drops.saturating_add(amount);
        amount
    }

    /// Pays every well once per elapsed income interval. A well's first call only
    /// starts its timer. No-op unless wells earn passively.
    pub fn collect_well_income(&mut self, now: DateTime<Utc>) -> Vec<(BuildingId, u32)> {
        let WellIncome::Passive { .. } = self.rules.wells else {
            return Vec::new();
        };
        let interval_ms = self.rules.wells.window().num_milliseconds();
        if interval_ms <= 0 {
            return Vec::new();
        }

        let mut payouts = Vec::new();
        for well in self.buildings.iter().filter(|b| b.kind == BuildingKind::Well) {
            let baseline = self.well_timers.entry(well.id).or_insert(now);
            let periods = ((now - *baseline).num_milliseconds() / interval_ms).max(0);
            if periods == 0 {
                continue;
            }
            *baseline = *baseline + TimeDelta::milliseconds(interval_ms * periods);
            let amount = well.well_yield().saturating_mul(periods as u32);
            self.drops = self.drops.saturating_add(amount);
            payouts.push((well.id, amount));
        }
        if !payouts.is_empty() {
            debug!(wells = payouts.len(), drops = self.drops, "passive well income");
        }
        payouts
    }

    pub fn check_win(&self) -> bool {
        self.drops >= self.rules.win_threshold
            && !self.buildings.is_empty()
            && self.buildings.iter().all(|b| b.upgraded)
    }

    /// Time until the well at `position` can be harvested again, if it is refilling.
    pub fn well_cooldown_remaining(&self, position: Position, now: DateTime<Utc>) -> Option<TimeDelta> {
        let last = self.well_cooldowns.get(&position.key())?;
        let remaining = self.rules.wells.window() - (now - *last);
        (remaining > TimeDelta::zero()).then_some(remaining)
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn drops(&self) -> u32 {
        self.drops
    }

    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    pub fn building(&self, id: BuildingId) -> Option<&Building> {
        self.buildings.get(id.raw())
    }

    pub fn villagers(&self) -> &[Villager] {
        &self.villagers
    }

    pub fn selected(&self) -> Option<BuildingId> {
        self.selected
    }

    pub fn walls_upgraded(&self) -> bool {
        self.walls_upgraded
    }

    pub fn pending_choice(&self) -> Option<&[BuildingId]> {
        self.pending
            .as_ref()
            .map(|pending| pending.candidates.as_slice())
    }

    fn eligible(&self, kind: BuildingKind) -> Vec<BuildingId> {
        self.buildings
            .iter()
            .filter(|b| b.kind == kind && !b.upgraded)
            .map(|b| b.id)
            .collect()
    }

    fn ensure_funds(&self, cost: u32) -> Result<(), Declined> {
        if self.drops < cost {
            debug!(cost, available = self.drops, "insufficient funds");
            return Err(Declined::InsufficientFunds {
                cost,
                available: self.drops,
            });
        }
        Ok(())
    }

    fn apply_upgrade(&mut self, id: BuildingId, cost: u32) {
        self.drops -= cost;
        self.mark_upgraded(id);
        self.selected = None;
        self.pending = None;
        info!(building = %id, cost, drops = self.drops, "building upgraded");
    }

    fn mark_upgraded(&mut self, id: BuildingId) {
        if let Some(building) = self.buildings.get_mut(id.raw()) {
            building.upgraded = true;
        }
    }

    fn place(&mut self, kind: BuildingKind, position: Position) -> BuildingId {
        let id = BuildingId::new(self.buildings.len());
        self.buildings.push(Building {
            id,
            kind,
            position,
            upgraded: false,
        });
        id
    }
}
