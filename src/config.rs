use std::fs;
use std::path::Path;
use serde::Deserialize;
use crate::auction::{AuctionEngine, AuctionParams};
use crate::campaign::{CampaignRunner, SearchSpace};
use crate::dealer::DealerConfig;
use crate::errors::ConfigurationError;
use crate::logger::Logger;
use crate::marketplace::Marketplace;
use crate::quality::QualityAttributes;

fn default_days() -> usize {
    30
}

fn default_searches_per_day() -> f64 {
    1000.0
}

/// A whole campaign as read from a JSON file
#[derive(Debug, Clone, Deserialize)]
pub struct CampaignConfig {
    #[serde(default = "default_days")]
    pub days: usize,
    #[serde(default = "default_searches_per_day")]
    pub searches_per_day: f64,
    /// Fixed seed for a reproducible run; a fresh random seed is used when absent
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub search_space: SearchSpace,
    #[serde(default)]
    pub dealers: Vec<DealerConfig>,
    /// Auction constants; the usual mechanics when absent
    #[serde(default)]
    pub auction: AuctionParams,
}

impl CampaignConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigurationError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigurationError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// The Greater Philadelphia used-car market: three dealers, 30 days of 800 searches
    pub fn philadelphia() -> Self {
        Self {
            days: 30,
            searches_per_day: 800.0,
            seed: None,
            search_space: SearchSpace::default(),
            dealers: philadelphia_dealers(),
            auction: AuctionParams::default(),
        }
    }

    /// Register the dealers and build a runner
    ///
    /// # Returns
    /// The runner together with the errors of dealers that were rejected and left out of the roster.
    /// Fails only when the search space itself is unusable.
    pub fn build(self, logger: &mut Logger) -> Result<(CampaignRunner, Vec<ConfigurationError>), ConfigurationError> {
        let mut marketplace = Marketplace::new();
        let rejected = marketplace.add_dealers(self.dealers, logger);
        let seed = self.seed.unwrap_or_else(rand::random);
        let runner = CampaignRunner::new(marketplace, self.search_space, seed)?
            .with_engine(AuctionEngine::with_params(self.auction));
        Ok((runner, rejected))
    }
}

/// Keenan Motors, Hertz Car Sales and CarMax Philadelphia
pub fn philadelphia_dealers() -> Vec<DealerConfig> {
    vec![
        DealerConfig::new(
            "Keenan Motors",
            "Large Independent",
            80.0,
            4.5,
            &["Main Line", "Center City", "Northeast Philly"],
            "luxury",
        ).with_attributes(QualityAttributes {
            page_speed: Some(0.8),
            mobile_friendly: Some(0.9),
            conversion_forms: Some(0.7),
            trust_signals: Some(0.8),
            keyword_match: Some(0.8),
            ad_copy_quality: Some(0.9),
            ad_extensions: Some(0.8),
            historical_ctr: Some(0.7),
            industry_benchmark: Some(0.8),
            competitor_gap: Some(0.6),
        }),
        DealerConfig::new(
            "Hertz Car Sales",
            "Large Independent",
            70.0,
            4.0,
            &["Center City", "Jersey Shore"],
            "diverse",
        ).with_attributes(QualityAttributes {
            page_speed: Some(0.9),
            mobile_friendly: Some(0.9),
            conversion_forms: Some(0.6),
            trust_signals: Some(0.9),
            keyword_match: Some(0.7),
            ad_copy_quality: Some(0.8),
            ad_extensions: Some(0.9),
            historical_ctr: Some(0.8),
            industry_benchmark: Some(0.9),
            competitor_gap: Some(0.7),
        }),
        DealerConfig::new(
            "CarMax Philadelphia",
            "Large Chain",
            120.0,
            5.0,
            &["Main Line", "Center City", "Northeast Philly", "South Philly", "Jersey Shore"],
            "diverse",
        ).with_quality_score(7.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::IncomeTier;

    #[test]
    fn test_defaults_apply() {
        let config = CampaignConfig::from_json_str("{}").unwrap();
        assert_eq!(config.days, 30);
        assert_eq!(config.searches_per_day, 1000.0);
        assert_eq!(config.seed, None);
        assert_eq!(config.search_space, SearchSpace::default());
        assert!(config.dealers.is_empty());
    }

    #[test]
    fn test_full_config() {
        let json = r#"{
            "days": 5,
            "searches_per_day": 120,
            "seed": 17,
            "search_space": {
                "queries": ["used trucks"],
                "locations": ["Camden"],
                "income_weights": [["high", 1.0]]
            },
            "dealers": [
                {
                    "name": "Your Dealer Name", "type": "Custom Type",
                    "daily_budget": 100, "max_bid": 4.0,
                    "target_locations": ["Camden"], "inventory_focus": "luxury",
                    "quality_score": 6.0
                },
                {
                    "name": "Partial", "type": "Custom Type",
                    "daily_budget": 100, "max_bid": 4.0,
                    "target_locations": ["Center City", "Main Line"], "inventory_focus": "luxury",
                    "page_speed": 0.8, "mobile_friendly": 0.9
                }
            ]
        }"#;
        let config = CampaignConfig::from_json_str(json).unwrap();
        assert_eq!(config.days, 5);
        assert_eq!(config.search_space.income_weights, vec![(IncomeTier::High, 1.0)]);
        assert_eq!(config.auction, AuctionParams::default());

        let mut logger = Logger::new();
        let (mut runner, rejected) = config.build(&mut logger).unwrap();
        assert_eq!(rejected.len(), 1);
        assert!(matches!(&rejected[0], ConfigurationError::MissingAttribute { attribute: "conversion_forms", .. }));
        assert_eq!(runner.marketplace.dealers.len(), 1);

        let result = runner.simulate_search(&mut logger).unwrap();
        assert_eq!(result.search_query, "used trucks");
        assert_eq!(result.user_location, "Camden");
        assert_eq!(result.user_income, IncomeTier::High);
    }

    #[test]
    fn test_auction_params_override() {
        let json = r#"{
            "searches_per_day": 50,
            "seed": 3,
            "auction": { "budget_floor": 500.0, "log_auctions": true },
            "dealers": [
                {
                    "name": "Solo", "type": "Custom", "daily_budget": 100, "max_bid": 4.0,
                    "target_locations": [], "inventory_focus": "diverse", "quality_score": 7.0
                }
            ]
        }"#;
        let config = CampaignConfig::from_json_str(json).unwrap();
        assert_eq!(config.auction.budget_floor, 500.0);
        assert!(config.auction.log_auctions);
        assert_eq!(config.auction.location_multiplier, 1.2);

        let mut logger = Logger::new();
        let (mut runner, _) = config.build(&mut logger).unwrap();
        // Floor above the budget: the only dealer never qualifies
        assert!(runner.simulate_search(&mut logger).is_none());
        assert!(runner.engine.params.log_auctions);
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(CampaignConfig::from_json_str("{\"days\": \"many\"}"), Err(ConfigurationError::Parse(_))));
        assert!(matches!(
            CampaignConfig::from_file(Path::new("/nonexistent/campaign.json")),
            Err(ConfigurationError::Io(_))
        ));
    }

    #[test]
    fn test_philadelphia_roster_registers() {
        let mut logger = Logger::new();
        let (runner, rejected) = CampaignConfig::philadelphia().build(&mut logger).unwrap();
        assert!(rejected.is_empty());
        let dealers = &runner.marketplace.dealers;
        assert_eq!(dealers.len(), 3);
        assert!((dealers.dealers[0].quality_score - 5.5575).abs() < 1e-9);
        assert_eq!(dealers.dealers[2].quality_score, 7.0);
    }
}
