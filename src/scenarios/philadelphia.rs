/// The Greater Philadelphia used-car market with its three dealers over a 30 day campaign.
///
/// CarMax Philadelphia targets every location with the highest base ad rank, so it takes
/// nearly every auction. Once its daily budget no longer covers a click it keeps winning
/// impressions without paying for clicks until the next reset.

use crate::campaign::CampaignRunner;
use crate::config::CampaignConfig;
use crate::logger::{Logger, LogEvent};
use crate::report::{PerformanceReport, RoiAssumptions};
use crate::scenarios::{auction_params, Checks};
use crate::utils;
use crate::logln;

inventory::submit!(crate::scenarios::ScenarioEntry {
    short_name: "philadelphia",
    run,
});

pub fn run(scenario_name: &str, logger: &mut Logger) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = CampaignConfig::philadelphia();
    config.seed = Some(utils::get_seed(1991));
    config.auction = auction_params();
    let (days, searches_per_day) = (config.days, config.searches_per_day);

    let (mut runner, rejected) = config.build(logger)?;
    runner.run_campaign(days, searches_per_day, logger)?;

    let report = PerformanceReport::new(&runner.marketplace.dealers, runner.history(), &RoiAssumptions::default());
    report.printout(logger);

    logln!(logger, LogEvent::Scenario, "");
    let mut checks = Checks::new();
    validate(&runner, days, rejected.is_empty(), &mut checks, logger);
    checks.finish(scenario_name)
}

fn validate(runner: &CampaignRunner, days: usize, all_registered: bool, checks: &mut Checks, logger: &mut Logger) {
    let dealers = &runner.marketplace.dealers;
    let history = runner.history();

    checks.check(all_registered && dealers.len() == 3, format!("All three dealers registered: {}", dealers.len()), logger);

    checks.check(
        (20_000..=28_000).contains(&history.len()),
        format!("Auction count matches ~800 searches over {} days: {}", days, history.len()),
        logger,
    );

    if let Some(carmax) = dealers.find("CarMax Philadelphia") {
        let share = carmax.total_impressions as f64 / history.len().max(1) as f64;
        checks.check(share > 0.9, format!("CarMax Philadelphia wins nearly every auction: {:.1}%", share * 100.0), logger);
    }

    let prices_valid = history.iter().all(|r| {
        r.actual_cpc > 0.0 && r.actual_cpc <= dealers.dealers[r.winner_id].max_bid
    });
    checks.check(prices_valid, "Every price is positive and at most the winner's max bid".to_string(), logger);

    for dealer in &dealers.dealers {
        let charged: f64 = history.iter()
            .filter(|r| r.winner_id == dealer.dealer_id && r.charged)
            .map(|r| r.actual_cpc)
            .sum();
        checks.check(
            (charged - dealer.total_spent).abs() < 1e-6,
            format!("{} spend equals its charged clicks: {:.2} = {:.2}", dealer.name, dealer.total_spent, charged),
            logger,
        );

        let max_daily_spend = (1..=days)
            .map(|day| history.iter()
                .filter(|r| r.day == day && r.winner_id == dealer.dealer_id && r.charged)
                .map(|r| r.actual_cpc)
                .sum::<f64>())
            .fold(0.0, f64::max);
        checks.check(
            max_daily_spend <= dealer.daily_budget + 1e-9,
            format!("{} never spends more than its daily budget: {:.2} <= {:.2}", dealer.name, max_daily_spend, dealer.daily_budget),
            logger,
        );

        checks.check(
            dealer.remaining_budget == dealer.daily_budget,
            format!("{} budget reset after the last day: {:.2}", dealer.name, dealer.remaining_budget),
            logger,
        );
    }
}
