use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::{
    command::Command,
    components::{BuildingId, BuildingKind},
    error::Declined,
    feedback::{Feedback, FeedbackBoard, FeedbackLine},
    placement::PlacementGesture,
    rng::{random_position, RngStreams},
    rules::RuleSet,
    snapshot::{SnapshotInputs, VillageSnapshot},
    systems::{FeedbackExpirySystem, WellIncomeSystem},
    village::{UpgradeOutcome, Village},
    win::WinTracker,
};

const PLACEMENT_STREAM: &str = "placement";

pub struct SystemContext {
    pub now: DateTime<Utc>,
}

/// A step run on every [`Session::advance`].
pub trait System: Send {
    fn name(&self) -> &str;
    /// Returns true when it changed anything the player can see.
    fn run(&mut self, ctx: &SystemContext, village: &mut Village, board: &mut FeedbackBoard) -> bool;
}

pub struct SessionBuilder {
    rules: RuleSet,
    seed: u64,
    systems: Vec<Box<dyn System>>,
}

impl SessionBuilder {
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules,
            seed: 0,
            systems: Vec::new(),
        }
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    pub fn with_default_systems(self) -> Self {
        self.with_system(FeedbackExpirySystem::new())
            .with_system(WellIncomeSystem::new())
    }

    pub fn build(self) -> Session {
        if let Err(err) = self.rules.validate() {
            warn!(%err, "starting a session with an invalid rule set");
        }
        Session {
            board: FeedbackBoard::new(self.rules.feedback_duration()),
            win: WinTracker::new(self.rules.win_dialog),
            village: Village::new(self.rules),
            started: false,
            rng: RngStreams::new(self.seed),
            placement: PlacementGesture::default(),
            systems: self.systems,
        }
    }
}

/// What a command or time step did, for the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    pub feedback: Option<FeedbackLine>,
    pub declined: Option<Declined>,
    /// Visible state changed; redraw.
    pub changed: bool,
    pub win_dialog_opened: bool,
    /// Candidates the player must pick from with `ChooseBuilding`.
    pub choice: Option<Vec<BuildingId>>,
}

/// One player's game: the village plus everything that sits between it and the UI.
pub struct Session {
    village: Village,
    started: bool,
    rng: RngStreams,
    board: FeedbackBoard,
    win: WinTracker,
    placement: PlacementGesture,
    systems: Vec<Box<dyn System>>,
}

impl Session {
    pub fn new(rules: RuleSet, seed: u64) -> Self {
        SessionBuilder::new(rules)
            .seed(seed)
            .with_default_systems()
            .build()
    }

    pub fn apply(&mut self, command: Command, now: DateTime<Utc>) -> Outcome {
        let mut outcome = Outcome::default();
        let upgrading = matches!(
            command,
            Command::UpgradeSelected | Command::Upgrade { .. } | Command::ChooseBuilding { .. }
        );
        let dismissing = matches!(command, Command::DismissWin);

        let result = if self.started || matches!(command, Command::StartGame) {
            self.execute(command, now, &mut outcome)
        } else {
            Err(Declined::NotStarted)
        };

        let feedback = match result {
            Ok(feedback) => {
                if !dismissing {
                    outcome.win_dialog_opened = self.observe_win();
                }
                feedback
            }
            Err(declined) => {
                debug!(%declined, "command declined");
                let feedback = match declined {
                    Declined::InsufficientFunds { .. } if upgrading => Feedback::UpgradeUnaffordable,
                    _ => Feedback::Declined(declined.clone()),
                };
                outcome.declined = Some(declined);
                Some(feedback)
            }
        };

        if let Some(feedback) = feedback {
            outcome.feedback = Some(self.board.show(&feedback, now));
            outcome.changed = true;
        }
        outcome
    }

    /// Runs the registered systems at `now`, then re-checks the win condition.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Outcome {
        let mut outcome = Outcome::default();
        if !self.started {
            return outcome;
        }
        let ctx = SystemContext { now };
        for system in &mut self.systems {
            if system.run(&ctx, &mut self.village, &mut self.board) {
                debug!(system = system.name(), "system changed state");
                outcome.changed = true;
            }
        }
        if outcome.changed {
            outcome.feedback = self.board.current(now).cloned();
            outcome.win_dialog_opened = self.observe_win();
        }
        outcome
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> VillageSnapshot {
        VillageSnapshot::capture(
            &self.village,
            SnapshotInputs {
                started: self.started,
                placement: self.placement.state(),
                feedback: self.board.current(now),
                win_dialog_open: self.win.is_open(),
            },
            now,
        )
    }

    pub fn village(&self) -> &Village {
        &self.village
    }

    pub fn win_dialog_open(&self) -> bool {
        self.win.is_open()
    }

    fn execute(
        &mut self,
        command: Command,
        now: DateTime<Utc>,
        outcome: &mut Outcome,
    ) -> Result<Option<Feedback>, Declined> {
        match command {
            Command::StartGame => {
                self.started = true;
                self.restart();
                Ok(Some(Feedback::GameStarted))
            }
            Command::Reset => {
                self.restart();
                Ok(Some(Feedback::VillageReset))
            }
            Command::Build { choice, at } => {
                let position = match at {
                    Some(position) => position,
                    None => random_position(
                        self.rng.stream(PLACEMENT_STREAM),
                        &self.village.rules().random_area,
                    ),
                };
                self.village.build(choice, position)?;
                Ok(Some(Feedback::Built(choice)))
            }
            Command::BeginPlacement { choice } => {
                if self.village.rules().costs.cost(choice).is_none() {
                    return Err(Declined::UnknownChoice(choice.to_string()));
                }
                self.placement.begin(choice);
                Ok(Some(Feedback::PlaceBuilding(choice)))
            }
            Command::DragTo { position } => {
                self.placement.drag_to(position)?;
                outcome.changed = true;
                Ok(None)
            }
            Command::Release => {
                let (choice, position) = self.placement.release()?;
                match self.village.build(choice, position) {
                    Ok(_) => Ok(Some(Feedback::Built(choice))),
                    Err(declined @ Declined::OutOfBounds { .. }) => {
                        self.placement.rearm(choice);
                        outcome.changed = true;
                        Err(declined)
                    }
                    Err(declined) => Err(declined),
                }
            }
            Command::CancelPlacement => {
                if self.placement.cancel() {
                    Ok(Some(Feedback::PlacementCancelled))
                } else {
                    Err(Declined::NotDragging)
                }
            }
            Command::Select { building } => {
                let selected = self.village.select(building)?;
                Ok(Some(Feedback::Selected(selected.kind)))
            }
            Command::UpgradeSelected => {
                self.village.upgrade_selected()?;
                Ok(Some(Feedback::Upgraded))
            }
            Command::Upgrade { category } => {
                match self.village.upgrade(category)? {
                    UpgradeOutcome::Upgraded(_) => Ok(Some(Feedback::Upgraded)),
                    UpgradeOutcome::WallsUpgraded => Ok(Some(Feedback::WallsUpgraded)),
                    UpgradeOutcome::NeedsChoice(candidates) => {
                        let kind = candidates
                            .first()
                            .and_then(|id| self.village.building(*id))
                            .map(|b| b.kind)
                            .unwrap_or(BuildingKind::Hut);
                        let count = candidates.len();
                        outcome.choice = Some(candidates);
                        Ok(Some(Feedback::ChooseBuilding(kind, count)))
                    }
                }
            }
            Command::ChooseBuilding { index } => {
                self.village.choose_building(index)?;
                Ok(Some(Feedback::Upgraded))
            }
            Command::HarvestWell { position } => {
                let amount = self.village.harvest_well(position, now)?;
                Ok(Some(Feedback::Gained(amount)))
            }
            Command::HarvestVillager => {
                let amount = self.village.harvest_villager();
                Ok(Some(Feedback::Gained(amount)))
            }
            Command::DismissWin => {
                outcome.changed = self.win.dismiss();
                Ok(None)
            }
        }
    }

    fn restart(&mut self) {
        self.village.init_game();
        self.win.reset();
        self.placement.cancel();
    }

    fn observe_win(&mut self) -> bool {
        let opened = self.win.observe(self.village.check_win());
        if opened {
            info!(drops = self.village.drops(), "village complete");
        }
        opened
    }
}
