pub mod command;
pub mod components;
pub mod engine;
pub mod error;
pub mod feedback;
pub mod placement;
pub mod replay;
pub mod rng;
pub mod rules;
pub mod snapshot;
pub mod systems;
pub mod village;
pub mod web;
pub mod win;

pub use command::{BuildChoice, Command, UpgradeCategory};
pub use engine::{Outcome, Session, SessionBuilder};
pub use error::Declined;
pub use rules::{RuleSet, RuleSetLoader};
pub use village::Village;
