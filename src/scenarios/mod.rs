use std::error::Error;
use std::sync::atomic::Ordering;
use crate::auction::AuctionParams;
use crate::logger::{Logger, LogEvent};
use crate::utils::VERBOSE_AUCTION;
use crate::{errln, logln};

/// Function type for scenario entry functions
pub type ScenarioFn = fn(scenario_name: &str, logger: &mut Logger) -> Result<(), Box<dyn Error>>;

/// Entry in the scenario catalog
#[derive(Clone)]
pub struct ScenarioEntry {
    pub short_name: &'static str,
    pub run: ScenarioFn,
}

inventory::collect!(ScenarioEntry);

/// All registered scenarios, sorted by name
pub fn get_scenario_catalog() -> Vec<ScenarioEntry> {
    let mut catalog: Vec<ScenarioEntry> = inventory::iter::<ScenarioEntry>
        .into_iter()
        .cloned()
        .collect();
    catalog.sort_by_key(|entry| entry.short_name);
    catalog
}

/// Standard auction constants, with per-auction logging when `--verbose auction` was given
pub fn auction_params() -> AuctionParams {
    AuctionParams {
        log_auctions: VERBOSE_AUCTION.load(Ordering::Relaxed),
        ..AuctionParams::default()
    }
}

/// Collects the outcome of a scenario's checks
pub struct Checks {
    errors: Vec<String>,
}

impl Checks {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Log `message` as passed or failed
    pub fn check(&mut self, passed: bool, message: String, logger: &mut Logger) {
        if passed {
            logln!(logger, LogEvent::Scenario, "✓ {}", message);
        } else {
            errln!(logger, LogEvent::Scenario, "{}", message);
            self.errors.push(message);
        }
    }

    pub fn finish(self, scenario_name: &str) -> Result<(), Box<dyn Error>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(format!("Scenario '{}' validation failed:\n{}", scenario_name, self.errors.join("\n")).into())
        }
    }
}

impl Default for Checks {
    fn default() -> Self {
        Self::new()
    }
}

pub mod philadelphia;
pub mod budget_exhaustion;
pub mod custom_dealer;
pub mod luxury_targeting;
