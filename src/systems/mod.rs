mod feedback_expiry;
mod well_income;

pub use feedback_expiry::FeedbackExpirySystem;
pub use well_income::WellIncomeSystem;
