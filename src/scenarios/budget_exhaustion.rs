/// A high-ranked leader and a weak follower compete for the same searches.
///
/// - Variant A: the leader's daily budget covers only seven clicks. Once its remaining budget
///   falls to the eligibility floor it drops out and the follower takes the rest of the day.
///   The daily reset brings the leader back for the first auction of the next day.
///
/// - Variant B: the leader has plenty of budget and the follower never shows.

use crate::auction::AuctionEngine;
use crate::campaign::{CampaignRunner, SearchSpace};
use crate::dealer::DealerConfig;
use crate::logger::{Logger, LogEvent};
use crate::marketplace::Marketplace;
use crate::scenarios::{auction_params, Checks};
use crate::utils;
use crate::logln;

inventory::submit!(crate::scenarios::ScenarioEntry {
    short_name: "budget_exhaustion",
    run,
});

const DAYS: usize = 5;
const SEARCHES_PER_DAY: f64 = 500.0;

fn prepare_runner(leader_budget: f64, logger: &mut Logger) -> Result<CampaignRunner, Box<dyn std::error::Error>> {
    let mut marketplace = Marketplace::new();
    // Leader pays 1 / 8 + 0.01 = 0.135 per click
    marketplace.add_dealer(DealerConfig::new("Leader", "Large Chain", leader_budget, 2.0, &[], "diverse").with_quality_score(8.0), logger)?;
    marketplace.add_dealer(DealerConfig::new("Follower", "Small Independent", 50.0, 1.0, &[], "diverse").with_quality_score(1.0), logger)?;
    Ok(CampaignRunner::new(marketplace, SearchSpace::default(), utils::get_seed(2992))?
        .with_engine(AuctionEngine::with_params(auction_params())))
}

/// Number of paid clicks of `dealer_id` on each day
fn charged_clicks_per_day(runner: &CampaignRunner, dealer_id: usize) -> Vec<usize> {
    (1..=DAYS)
        .map(|day| runner.history().iter().filter(|r| r.day == day && r.winner_id == dealer_id && r.charged).count())
        .collect()
}

pub fn run(scenario_name: &str, logger: &mut Logger) -> Result<(), Box<dyn std::error::Error>> {
    let mut runner_a = prepare_runner(1.0, logger)?;
    runner_a.run_campaign(DAYS, SEARCHES_PER_DAY, logger)?;

    let mut runner_b = prepare_runner(1000.0, logger)?;
    runner_b.run_campaign(DAYS, SEARCHES_PER_DAY, logger)?;

    logln!(logger, LogEvent::Scenario, "");
    let mut checks = Checks::new();

    let follower_a = &runner_a.marketplace.dealers.dealers[1];
    let follower_b = &runner_b.marketplace.dealers.dealers[1];
    checks.check(
        follower_a.total_impressions > 0,
        format!("Variant A (small budget) follower wins once the leader is exhausted: {} impressions", follower_a.total_impressions),
        logger,
    );
    checks.check(
        follower_b.total_impressions == 0,
        format!("Variant B (large budget) follower never wins: {} impressions", follower_b.total_impressions),
        logger,
    );

    let clicks = charged_clicks_per_day(&runner_a, 0);
    checks.check(
        clicks.iter().all(|&c| c == 7),
        format!("Variant A leader pays for exactly seven clicks per day: {:?}", clicks),
        logger,
    );

    let first_winners: Vec<Option<&str>> = (1..=DAYS)
        .map(|day| runner_a.history().iter().find(|r| r.day == day).map(|r| r.winner.as_str()))
        .collect();
    checks.check(
        first_winners.iter().all(|w| *w == Some("Leader")),
        format!("Variant A leader wins the first auction of every day after the reset: {:?}", first_winners),
        logger,
    );

    let leader_a = &runner_a.marketplace.dealers.dealers[0];
    checks.check(
        leader_a.total_spent <= leader_a.daily_budget * DAYS as f64 + 1e-9,
        format!("Variant A leader spend within cumulative budget: {:.3} <= {:.3}", leader_a.total_spent, leader_a.daily_budget * DAYS as f64),
        logger,
    );

    checks.finish(scenario_name)
}
