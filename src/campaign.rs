use rand::distributions::WeightedIndex;
use rand::seq::SliceRandom;
use rand::{rngs::StdRng, SeedableRng};
use rand_distr::{Distribution, Poisson};
use serde::Deserialize;
use crate::auction::{AuctionEngine, AuctionResult, IncomeTier};
use crate::errors::ConfigurationError;
use crate::logger::{Logger, LogEvent};
use crate::marketplace::Marketplace;
use crate::utils::TOTAL_CAMPAIGN_RUNS;
use crate::{logln, warnln};
use std::sync::atomic::Ordering;

/// Campaign progress is reported every this many days
const PROGRESS_EVERY_DAYS: usize = 10;

/// What simulated users search for, where they are, and how wealthy they are
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SearchSpace {
    pub queries: Vec<String>,
    pub locations: Vec<String>,
    /// Categorical income distribution; weights need not be normalized
    pub income_weights: Vec<(IncomeTier, f64)>,
}

impl Default for SearchSpace {
    fn default() -> Self {
        Self {
            queries: vec![
                "used BMW Philadelphia".to_string(),
                "certified pre owned cars Philly".to_string(),
                "best used car dealer near me".to_string(),
                "luxury SUV Philadelphia".to_string(),
            ],
            locations: vec![
                "Center City".to_string(),
                "Main Line".to_string(),
                "Northeast Philly".to_string(),
                "South Philly".to_string(),
                "Jersey Shore".to_string(),
            ],
            income_weights: vec![
                (IncomeTier::Low, 0.4),
                (IncomeTier::Medium, 0.4),
                (IncomeTier::High, 0.2),
            ],
        }
    }
}

/// Drives the day/search loop over a marketplace
/// Budgets and counters live in the dealers, so running again continues the same campaign
pub struct CampaignRunner {
    pub marketplace: Marketplace,
    pub engine: AuctionEngine,
    search_space: SearchSpace,
    income_distribution: WeightedIndex<f64>,
    rng: StdRng,
}

impl CampaignRunner {
    /// Create a runner with the default auction engine
    ///
    /// # Arguments
    /// * `marketplace` - Dealers already registered; history is usually empty
    /// * `search_space` - Must have at least one query, one location and a valid income distribution
    /// * `seed` - Seed for every random draw the campaign makes
    pub fn new(marketplace: Marketplace, search_space: SearchSpace, seed: u64) -> Result<Self, ConfigurationError> {
        if search_space.queries.is_empty() {
            return Err(ConfigurationError::EmptySearchSpace("queries"));
        }
        if search_space.locations.is_empty() {
            return Err(ConfigurationError::EmptySearchSpace("locations"));
        }
        let income_distribution = WeightedIndex::new(search_space.income_weights.iter().map(|(_, weight)| *weight))
            .map_err(|_| ConfigurationError::EmptySearchSpace("valid income weights"))?;

        Ok(Self {
            marketplace,
            engine: AuctionEngine::new(),
            search_space,
            income_distribution,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    pub fn with_engine(mut self, engine: AuctionEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn history(&self) -> &[AuctionResult] {
        &self.marketplace.auction_history
    }

    /// Draw one search (query, location, income tier, in that order) and auction it
    pub fn simulate_search(&mut self, logger: &mut Logger) -> Option<AuctionResult> {
        let query = self.search_space.queries.choose(&mut self.rng)?;
        let location = self.search_space.locations.choose(&mut self.rng)?;
        let income_tier = self.search_space.income_weights[self.income_distribution.sample(&mut self.rng)].0;
        self.engine.run_auction(&mut self.marketplace, query, location, income_tier, &mut self.rng, logger)
    }

    /// Simulate one day: a Poisson number of searches, then the daily budget reset
    ///
    /// # Returns
    /// The number of searches simulated
    fn run_day(&mut self, search_volume: Option<&Poisson<f64>>, logger: &mut Logger) -> u64 {
        self.marketplace.current_day += 1;
        let day = self.marketplace.current_day;
        let history_start = self.marketplace.auction_history.len();

        let daily_searches = match search_volume {
            Some(poisson) => Distribution::<f64>::sample(poisson, &mut self.rng) as u64,
            None => 0,
        };
        for _ in 0..daily_searches {
            // No eligible bidder is a normal outcome; nothing to record
            let _ = self.simulate_search(logger);
        }

        self.marketplace.dealers.reset_daily_budgets();

        if logger.is_enabled(LogEvent::Day) {
            let today = &self.marketplace.auction_history[history_start..];
            let clicks = today.iter().filter(|r| r.click).count();
            let spend: f64 = today.iter().filter(|r| r.charged).map(|r| r.actual_cpc).sum();
            logln!(logger, LogEvent::Day, "Day {} | searches: {} | auctions: {} | clicks: {} | spend: {:.2}",
                day, daily_searches, today.len(), clicks, spend);
        }
        if day % PROGRESS_EVERY_DAYS == 0 {
            logln!(logger, LogEvent::Campaign, "Day {} complete | auctions: {}", day, self.marketplace.auction_history.len());
        }

        daily_searches
    }

    /// Run `days` simulated days with a mean of `searches_per_day` searches each
    ///
    /// # Returns
    /// The full auction history accumulated so far, including earlier runs on this runner
    pub fn run_campaign(&mut self, days: usize, searches_per_day: f64, logger: &mut Logger) -> Result<&[AuctionResult], ConfigurationError> {
        if !searches_per_day.is_finite() || searches_per_day < 0.0 {
            return Err(ConfigurationError::InvalidSearchVolume(searches_per_day));
        }
        let search_volume = if searches_per_day > 0.0 {
            Some(Poisson::new(searches_per_day).map_err(|_| ConfigurationError::InvalidSearchVolume(searches_per_day))?)
        } else {
            None
        };

        logln!(logger, LogEvent::Campaign, "Starting {}-day campaign | {} dealers | {:.0} searches/day", days, self.marketplace.dealers.len(), searches_per_day);
        if self.marketplace.dealers.is_empty() {
            warnln!(logger, LogEvent::Campaign, "No dealers registered; every search will go unauctioned");
        }

        let mut total_searches = 0;
        for _ in 0..days {
            total_searches += self.run_day(search_volume.as_ref(), logger);
        }

        TOTAL_CAMPAIGN_RUNS.fetch_add(1, Ordering::Relaxed);
        logln!(logger, LogEvent::Campaign, "Campaign complete | searches: {} | auctions: {}", total_searches, self.marketplace.auction_history.len());

        Ok(&self.marketplace.auction_history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dealer::DealerConfig;
    use crate::logger::BufferReceiver;

    fn single_dealer_marketplace(daily_budget: f64) -> Marketplace {
        let mut marketplace = Marketplace::new();
        marketplace.dealers.add(
            DealerConfig::new("Solo Motors", "Custom", daily_budget, 4.0, &["Center City", "Main Line"], "luxury")
                .with_quality_score(7.0)
        ).unwrap();
        marketplace
    }

    fn two_dealer_marketplace() -> Marketplace {
        let mut marketplace = single_dealer_marketplace(5.0);
        marketplace.dealers.add(
            DealerConfig::new("Rival Auto", "Chain", 3.0, 3.5, &["South Philly"], "diverse").with_quality_score(6.5)
        ).unwrap();
        marketplace
    }

    /// Histories without the wall clock timestamp
    fn outcomes(history: &[AuctionResult]) -> Vec<(usize, String, String, IncomeTier, String, f64, bool, bool, bool)> {
        history.iter()
            .map(|r| (r.day, r.search_query.clone(), r.user_location.clone(), r.user_income, r.winner.clone(), r.actual_cpc, r.click, r.charged, r.conversion))
            .collect()
    }

    #[test]
    fn test_single_search_single_dealer() {
        let mut runner = CampaignRunner::new(single_dealer_marketplace(100.0), SearchSpace::default(), 1).unwrap();
        let mut logger = Logger::new();

        let result = runner.simulate_search(&mut logger).unwrap();

        assert_eq!(result.winner, "Solo Motors");
        assert_eq!(result.actual_cpc, 0.01);
        assert_eq!(runner.marketplace.dealers.dealers[0].total_impressions, 1);
        assert_eq!(runner.history().len(), 1);
        assert!(SearchSpace::default().queries.contains(&result.search_query));
        assert!(SearchSpace::default().locations.contains(&result.user_location));
    }

    #[test]
    fn test_empty_roster_warns() {
        let mut logger = Logger::new();
        let (receiver, buffer) = BufferReceiver::new(vec![LogEvent::Campaign]);
        logger.add_receiver(receiver);
        let mut runner = CampaignRunner::new(Marketplace::new(), SearchSpace::default(), 4).unwrap();
        runner.run_campaign(1, 10.0, &mut logger).unwrap();
        assert!(buffer.borrow().contains("WARNING No dealers registered"));

        let (receiver, buffer) = BufferReceiver::new(vec![LogEvent::Campaign]);
        logger.add_receiver(receiver);
        let mut runner = CampaignRunner::new(single_dealer_marketplace(100.0), SearchSpace::default(), 4).unwrap();
        runner.run_campaign(1, 10.0, &mut logger).unwrap();
        assert!(!buffer.borrow().contains("WARNING"));
    }

    #[test]
    fn test_no_dealers_empty_history() {
        let mut runner = CampaignRunner::new(Marketplace::new(), SearchSpace::default(), 2).unwrap();
        let mut logger = Logger::new();
        assert!(runner.simulate_search(&mut logger).is_none());
        let history = runner.run_campaign(3, 50.0, &mut logger).unwrap();
        assert!(history.is_empty());
        assert_eq!(runner.marketplace.current_day, 3);
    }

    #[test]
    fn test_daily_reset_restores_budget_only() {
        let mut runner = CampaignRunner::new(two_dealer_marketplace(), SearchSpace::default(), 3).unwrap();
        let mut logger = Logger::new();

        runner.run_campaign(5, 400.0, &mut logger).unwrap();

        for dealer in &runner.marketplace.dealers.dealers {
            assert_eq!(dealer.remaining_budget, dealer.daily_budget);
            // Unspent budget never carries over
            assert!(dealer.total_spent <= dealer.daily_budget * 5.0 + 1e-9);
            assert!(dealer.total_clicks <= dealer.total_impressions);
            assert!(dealer.total_conversions <= dealer.total_clicks);
        }
        let total_impressions: u64 = runner.marketplace.dealers.dealers.iter().map(|d| d.total_impressions).sum();
        assert_eq!(total_impressions as usize, runner.history().len());

        // Spend per day never exceeds that day's budget
        for day in 1..=5 {
            for dealer in &runner.marketplace.dealers.dealers {
                let spent: f64 = runner.history().iter()
                    .filter(|r| r.day == day && r.winner_id == dealer.dealer_id && r.charged)
                    .map(|r| r.actual_cpc)
                    .sum();
                assert!(spent <= dealer.daily_budget + 1e-9);
            }
        }
    }

    #[test]
    fn test_same_seed_same_campaign() {
        let mut logger = Logger::new();
        let mut first = CampaignRunner::new(two_dealer_marketplace(), SearchSpace::default(), 42).unwrap();
        let mut second = CampaignRunner::new(two_dealer_marketplace(), SearchSpace::default(), 42).unwrap();
        let first_history = outcomes(first.run_campaign(4, 200.0, &mut logger).unwrap());
        let second_history = outcomes(second.run_campaign(4, 200.0, &mut logger).unwrap());
        assert!(!first_history.is_empty());
        assert_eq!(first_history, second_history);
    }

    #[test]
    fn test_rerun_continues_campaign() {
        let mut logger = Logger::new();
        let mut runner = CampaignRunner::new(two_dealer_marketplace(), SearchSpace::default(), 5).unwrap();
        let after_first = runner.run_campaign(2, 100.0, &mut logger).unwrap().len();
        let spent_after_first: f64 = runner.marketplace.dealers.dealers.iter().map(|d| d.total_spent).sum();

        let after_second = runner.run_campaign(2, 100.0, &mut logger).unwrap().len();
        let spent_after_second: f64 = runner.marketplace.dealers.dealers.iter().map(|d| d.total_spent).sum();

        assert!(after_second > after_first);
        assert!(spent_after_second >= spent_after_first);
        assert_eq!(runner.marketplace.current_day, 4);
        assert_eq!(runner.history().last().map(|r| r.day), Some(4));
    }

    #[test]
    fn test_zero_search_volume() {
        let mut logger = Logger::new();
        let mut runner = CampaignRunner::new(single_dealer_marketplace(100.0), SearchSpace::default(), 6).unwrap();
        assert!(runner.run_campaign(3, 0.0, &mut logger).unwrap().is_empty());
        assert_eq!(runner.marketplace.current_day, 3);
    }

    #[test]
    fn test_invalid_search_volume() {
        let mut logger = Logger::new();
        let mut runner = CampaignRunner::new(single_dealer_marketplace(100.0), SearchSpace::default(), 6).unwrap();
        assert!(matches!(runner.run_campaign(3, -5.0, &mut logger), Err(ConfigurationError::InvalidSearchVolume(_))));
        assert!(matches!(runner.run_campaign(3, f64::NAN, &mut logger), Err(ConfigurationError::InvalidSearchVolume(_))));
        assert_eq!(runner.marketplace.current_day, 0);
    }

    #[test]
    fn test_invalid_search_space() {
        let mut search_space = SearchSpace::default();
        search_space.locations.clear();
        assert!(matches!(
            CampaignRunner::new(Marketplace::new(), search_space, 0),
            Err(ConfigurationError::EmptySearchSpace("locations"))
        ));

        let mut search_space = SearchSpace::default();
        search_space.income_weights = vec![(IncomeTier::High, 0.0)];
        assert!(CampaignRunner::new(Marketplace::new(), search_space, 0).is_err());
    }

    #[test]
    fn test_income_draw_follows_weights() {
        let mut search_space = SearchSpace::default();
        search_space.income_weights = vec![(IncomeTier::High, 1.0)];
        let mut runner = CampaignRunner::new(single_dealer_marketplace(1000.0), search_space, 9).unwrap();
        let mut logger = Logger::new();
        for _ in 0..20 {
            assert_eq!(runner.simulate_search(&mut logger).map(|r| r.user_income), Some(IncomeTier::High));
        }
    }

    #[test]
    fn test_custom_engine_params() {
        use crate::auction::AuctionParams;
        let mut logger = Logger::new();
        // Floor above every budget: nobody is ever eligible
        let engine = AuctionEngine::with_params(AuctionParams { budget_floor: 500.0, ..AuctionParams::default() });
        let mut runner = CampaignRunner::new(single_dealer_marketplace(100.0), SearchSpace::default(), 12).unwrap()
            .with_engine(engine);
        assert!(runner.run_campaign(2, 50.0, &mut logger).unwrap().is_empty());
    }

    #[test]
    fn test_progress_logged_every_ten_days() {
        let mut logger = Logger::new();
        let (receiver, buffer) = BufferReceiver::new(vec![LogEvent::Campaign]);
        logger.add_receiver(receiver);
        let mut runner = CampaignRunner::new(single_dealer_marketplace(100.0), SearchSpace::default(), 11).unwrap();

        runner.run_campaign(25, 10.0, &mut logger).unwrap();

        let log = buffer.borrow();
        assert!(log.contains("Day 10 complete"));
        assert!(log.contains("Day 20 complete"));
        assert!(!log.contains("Day 25 complete"));
        assert!(log.contains("Campaign complete"));
    }
}
