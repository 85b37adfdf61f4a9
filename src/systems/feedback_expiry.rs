use crate::{
    engine::{System, SystemContext},
    feedback::FeedbackBoard,
    village::Village,
};

pub struct FeedbackExpirySystem;

impl FeedbackExpirySystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FeedbackExpirySystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for FeedbackExpirySystem {
    fn name(&self) -> &str {
        "feedback_expiry"
    }

    fn run(&mut self, ctx: &SystemContext, _village: &mut Village, board: &mut FeedbackBoard) -> bool {
        board.expire(ctx.now)
    }
}
