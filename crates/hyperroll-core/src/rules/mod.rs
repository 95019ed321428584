mod loader;
mod types;

pub use loader::{load_rules, RulesError, RulesSource};
pub use types::*;
