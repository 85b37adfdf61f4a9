use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    components::{BuildingId, BuildingKind, Position},
    error::remaining_secs,
    feedback::FeedbackLine,
    placement::DragState,
    village::Village,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildingView {
    pub id: BuildingId,
    pub kind: BuildingKind,
    pub position: Position,
    pub upgraded: bool,
    pub selected: bool,
    /// Seconds until a click-gated well can be harvested again.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooldown_secs: Option<i64>,
}

/// Everything the presentation layer needs to redraw the village.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VillageSnapshot {
    pub rules: String,
    pub started: bool,
    pub drops: u32,
    pub buildings: Vec<BuildingView>,
    pub villagers: Vec<Position>,
    pub walls_upgraded: bool,
    pub pending_choice: Option<Vec<BuildingId>>,
    pub placement: DragState,
    pub feedback: Option<FeedbackLine>,
    pub win_condition_met: bool,
    pub win_dialog_open: bool,
}

pub(crate) struct SnapshotInputs<'a> {
    pub started: bool,
    pub placement: DragState,
    pub feedback: Option<&'a FeedbackLine>,
    pub win_dialog_open: bool,
}

impl VillageSnapshot {
    pub(crate) fn capture(village: &Village, inputs: SnapshotInputs<'_>, now: DateTime<Utc>) -> Self {
        let selected = village.selected();
        let buildings = village
            .buildings()
            .iter()
            .map(|building| BuildingView {
                id: building.id,
                kind: building.kind,
                position: building.position,
                upgraded: building.upgraded,
                selected: selected == Some(building.id),
                cooldown_secs: match building.kind {
                    BuildingKind::Well => village
                        .well_cooldown_remaining(building.position, now)
                        .map(|remaining| remaining_secs(&remaining)),
                    _ => None,
                },
            })
            .collect();

        Self {
            rules: village.rules().name.clone(),
            started: inputs.started,
            drops: village.drops(),
            buildings,
            villagers: village.villagers().iter().map(|v| v.position).collect(),
            walls_upgraded: village.walls_upgraded(),
            pending_choice: village.pending_choice().map(<[BuildingId]>::to_vec),
            placement: inputs.placement,
            feedback: inputs.feedback.cloned(),
            win_condition_met: village.check_win(),
            win_dialog_open: inputs.win_dialog_open,
        }
    }
}
