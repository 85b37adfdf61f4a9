use crate::{
    engine::{System, SystemContext},
    feedback::{Feedback, FeedbackBoard},
    village::Village,
};

/// Credits wells that fill on a timer. Does nothing under click-gated rules.
pub struct WellIncomeSystem;

impl WellIncomeSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WellIncomeSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for WellIncomeSystem {
    fn name(&self) -> &str {
        "well_income"
    }

    fn run(&mut self, ctx: &SystemContext, village: &mut Village, board: &mut FeedbackBoard) -> bool {
        let payouts = village.collect_well_income(ctx.now);
        for (_, amount) in &payouts {
            board.show(&Feedback::Gained(*amount), ctx.now);
        }
        !payouts.is_empty()
    }
}
