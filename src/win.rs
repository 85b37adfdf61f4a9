use serde::{Deserialize, Serialize};

/// When the win dialog opens once the win condition holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinDialogPolicy {
    /// First time per game only.
    #[default]
    Once,
    /// After every action that leaves the condition satisfied, unless already open.
    EveryTrigger,
}

#[derive(Debug, Clone)]
pub struct WinTracker {
    policy: WinDialogPolicy,
    open: bool,
    shown: bool,
}

impl WinTracker {
    pub fn new(policy: WinDialogPolicy) -> Self {
        Self {
            policy,
            open: false,
            shown: false,
        }
    }

    /// Feeds the current win predicate; returns true when the dialog should open now.
    pub fn observe(&mut self, satisfied: bool) -> bool {
        if !satisfied || self.open {
            return false;
        }
        if self.policy == WinDialogPolicy::Once && self.shown {
            return false;
        }
        self.open = true;
        self.shown = true;
        true
    }

    pub fn dismiss(&mut self) -> bool {
        std::mem::replace(&mut self.open, false)
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn reset(&mut self) {
        self.open = false;
        self.shown = false;
    }
}
