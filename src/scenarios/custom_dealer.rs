/// Registering a custom dealer next to the Philadelphia roster.
///
/// A dealer that only supplies some of its quality attributes is rejected at registration,
/// as is a second dealer with a taken name. The same dealer with a pre-supplied quality score
/// is accepted and the campaign runs with every valid dealer.

use crate::auction::AuctionEngine;
use crate::campaign::{CampaignRunner, SearchSpace};
use crate::config::philadelphia_dealers;
use crate::dealer::DealerConfig;
use crate::errors::ConfigurationError;
use crate::logger::{Logger, LogEvent};
use crate::marketplace::Marketplace;
use crate::quality::QualityAttributes;
use crate::scenarios::{auction_params, Checks};
use crate::utils;
use crate::logln;

inventory::submit!(crate::scenarios::ScenarioEntry {
    short_name: "custom_dealer",
    run,
});

fn custom_dealer() -> DealerConfig {
    DealerConfig::new("Your Dealer Name", "Custom Type", 100.0, 4.0, &["Center City", "Main Line"], "luxury")
        .with_attributes(QualityAttributes {
            page_speed: Some(0.8),
            mobile_friendly: Some(0.9),
            ..QualityAttributes::default()
        })
}

pub fn run(scenario_name: &str, logger: &mut Logger) -> Result<(), Box<dyn std::error::Error>> {
    let mut marketplace = Marketplace::new();
    let rejected = marketplace.add_dealers(philadelphia_dealers(), logger);
    let roster_before = marketplace.dealers.len();

    let partial = marketplace.add_dealer(custom_dealer(), logger);
    let accepted = marketplace.add_dealer(custom_dealer().with_quality_score(6.0), logger);
    let duplicate = marketplace.add_dealer(custom_dealer().with_quality_score(9.0), logger);

    let mut runner = CampaignRunner::new(marketplace, SearchSpace::default(), utils::get_seed(3993))?
        .with_engine(AuctionEngine::with_params(auction_params()));
    runner.run_campaign(5, 200.0, logger)?;

    logln!(logger, LogEvent::Scenario, "");
    let mut checks = Checks::new();

    checks.check(rejected.is_empty() && roster_before == 3, format!("Philadelphia roster registered: {} dealers", roster_before), logger);
    checks.check(
        matches!(partial, Err(ConfigurationError::MissingAttribute { attribute: "conversion_forms", .. })),
        format!("Partially specified dealer rejected: {:?}", partial.as_ref().err().map(|e| e.to_string())),
        logger,
    );
    checks.check(accepted.is_ok(), format!("Dealer with quality score override accepted: {:?}", accepted.as_ref().ok()), logger);
    checks.check(
        matches!(duplicate, Err(ConfigurationError::DuplicateName(_))),
        "Second dealer with the same name rejected".to_string(),
        logger,
    );

    let dealers = &runner.marketplace.dealers;
    checks.check(dealers.len() == 4, format!("Roster holds only the valid dealers: {}", dealers.len()), logger);
    checks.check(
        dealers.find("Your Dealer Name").map(|d| d.quality_score) == Some(6.0),
        "Custom dealer keeps its supplied quality score".to_string(),
        logger,
    );
    checks.check(!runner.history().is_empty(), format!("Campaign ran after the rejections: {} auctions", runner.history().len()), logger);

    checks.finish(scenario_name)
}
