/// Two dealers with the same base ad rank, distinguished only by contextual multipliers.
///
/// - Variant A: every searcher is high income. The luxury dealer's income multiplier wins it
///   every auction.
///
/// - Variant B: every searcher is low income. Neither multiplier applies and the tie goes to
///   the dealer registered first.
///
/// - Variant C: low income searchers on the Main Line, which only the luxury dealer targets.
///   The location multiplier alone is enough to win.

use crate::auction::{AuctionEngine, IncomeTier};
use crate::campaign::{CampaignRunner, SearchSpace};
use crate::dealer::DealerConfig;
use crate::logger::{Logger, LogEvent};
use crate::marketplace::Marketplace;
use crate::scenarios::{auction_params, Checks};
use crate::utils;
use crate::logln;

inventory::submit!(crate::scenarios::ScenarioEntry {
    short_name: "luxury_targeting",
    run,
});

fn search_space(tier: IncomeTier, location: &str) -> SearchSpace {
    SearchSpace {
        queries: vec!["used BMW".to_string(), "luxury SUV".to_string()],
        locations: vec![location.to_string()],
        income_weights: vec![(tier, 1.0)],
    }
}

/// Runs a short campaign and returns the impressions of (diverse, luxury)
fn run_variant(search_space: SearchSpace, seed_offset: u64, logger: &mut Logger) -> Result<(u64, u64), Box<dyn std::error::Error>> {
    let mut marketplace = Marketplace::new();
    marketplace.add_dealer(DealerConfig::new("Diverse Lot", "Independent", 10_000.0, 4.0, &[], "diverse").with_quality_score(6.0), logger)?;
    marketplace.add_dealer(DealerConfig::new("Luxury Lot", "Boutique", 10_000.0, 4.0, &["Main Line"], "luxury").with_quality_score(6.0), logger)?;

    let mut runner = CampaignRunner::new(marketplace, search_space, utils::get_seed(seed_offset))?
        .with_engine(AuctionEngine::with_params(auction_params()));
    runner.run_campaign(3, 300.0, logger)?;

    let dealers = &runner.marketplace.dealers.dealers;
    Ok((dealers[0].total_impressions, dealers[1].total_impressions))
}

pub fn run(scenario_name: &str, logger: &mut Logger) -> Result<(), Box<dyn std::error::Error>> {
    let (diverse_a, luxury_a) = run_variant(search_space(IncomeTier::High, "Center City"), 4994, logger)?;
    let (diverse_b, luxury_b) = run_variant(search_space(IncomeTier::Low, "Center City"), 4995, logger)?;
    let (diverse_c, luxury_c) = run_variant(search_space(IncomeTier::Low, "Main Line"), 4996, logger)?;

    logln!(logger, LogEvent::Scenario, "");
    let mut checks = Checks::new();

    checks.check(
        diverse_a == 0 && luxury_a > 0,
        format!("Variant A (high income): luxury dealer wins every auction: {} vs {}", luxury_a, diverse_a),
        logger,
    );
    checks.check(
        luxury_b == 0 && diverse_b > 0,
        format!("Variant B (low income): tie goes to the first registered dealer: {} vs {}", diverse_b, luxury_b),
        logger,
    );
    checks.check(
        diverse_c == 0 && luxury_c > 0,
        format!("Variant C (Main Line): location targeting wins every auction: {} vs {}", luxury_c, diverse_c),
        logger,
    );

    checks.finish(scenario_name)
}
