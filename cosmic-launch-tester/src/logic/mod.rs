pub mod odds;
pub mod reports;
pub mod seeds;
pub mod tester;

pub use odds::{
    OddsAggregate, OddsRecord, aggregate_odds, run_odds_analysis, validate_odds_targets,
};
pub use seeds::{SeedInfo, resolve_seed_inputs};
pub use tester::*;
