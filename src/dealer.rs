use std::collections::HashSet;
use serde::Deserialize;
use crate::errors::ConfigurationError;
use crate::quality::{QualityAttributes, QualityScoreOptimizer, MAX_QUALITY_SCORE};

/// Landing page attribute assumed when a dealer did not supply one
const DEFAULT_LANDING_PAGE_ATTRIBUTE: f64 = 0.5;

/// Inventory focus that earns the high-income multiplier
pub const LUXURY_FOCUS: &str = "luxury";

/// Dealer configuration as supplied by a caller or a config file
/// All keys are optional at the type level; Dealer::from_config reports the missing ones
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DealerConfig {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub dealer_type: Option<String>,
    pub daily_budget: Option<f64>,
    pub max_bid: Option<f64>,
    pub target_locations: Option<Vec<String>>,
    pub inventory_focus: Option<String>,
    /// Skips quality score computation entirely when present
    pub quality_score: Option<f64>,
    #[serde(flatten)]
    pub attributes: QualityAttributes,
}

impl DealerConfig {
    /// Config with every required field set and no quality inputs yet
    pub fn new(name: &str, dealer_type: &str, daily_budget: f64, max_bid: f64, target_locations: &[&str], inventory_focus: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            dealer_type: Some(dealer_type.to_string()),
            daily_budget: Some(daily_budget),
            max_bid: Some(max_bid),
            target_locations: Some(target_locations.iter().map(|l| l.to_string()).collect()),
            inventory_focus: Some(inventory_focus.to_string()),
            quality_score: None,
            attributes: QualityAttributes::default(),
        }
    }

    pub fn with_quality_score(mut self, quality_score: f64) -> Self {
        self.quality_score = Some(quality_score);
        self
    }

    pub fn with_attributes(mut self, attributes: QualityAttributes) -> Self {
        self.attributes = attributes;
        self
    }
}

/// An advertiser competing in the auctions
/// Static configuration plus running counters; counters only ever grow, remaining_budget is reset daily
#[derive(Debug, Clone)]
pub struct Dealer {
    pub dealer_id: usize,
    pub name: String,
    pub dealer_type: String,
    pub daily_budget: f64,
    pub max_bid: f64,
    pub target_locations: HashSet<String>,
    pub inventory_focus: String,
    pub attributes: QualityAttributes,
    pub quality_score: f64,

    pub remaining_budget: f64,
    pub total_impressions: u64,
    pub total_clicks: u64,
    pub total_conversions: u64,
    pub total_spent: f64,
}

fn required<T>(value: Option<T>, dealer: &str, field: &'static str) -> Result<T, ConfigurationError> {
    value.ok_or_else(|| ConfigurationError::MissingField { dealer: dealer.to_string(), field })
}

fn positive(value: f64, dealer: &str, field: &'static str) -> Result<f64, ConfigurationError> {
    // Also rejects NaN
    if value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigurationError::NonPositive { dealer: dealer.to_string(), field, value })
    }
}

impl Dealer {
    /// Validate a config and build a dealer with a full daily budget and zeroed counters
    ///
    /// # Arguments
    /// * `config` - Dealer configuration; consumed
    /// * `dealer_id` - Position the dealer will take in the roster
    /// * `optimizer` - Used when the config has no quality_score override
    pub fn from_config(config: DealerConfig, dealer_id: usize, optimizer: &QualityScoreOptimizer) -> Result<Self, ConfigurationError> {
        let name = required(config.name, "<unnamed>", "name")?;
        let dealer_type = required(config.dealer_type, &name, "type")?;
        let daily_budget = positive(required(config.daily_budget, &name, "daily_budget")?, &name, "daily_budget")?;
        let max_bid = positive(required(config.max_bid, &name, "max_bid")?, &name, "max_bid")?;
        let target_locations = required(config.target_locations, &name, "target_locations")?;
        let inventory_focus = required(config.inventory_focus, &name, "inventory_focus")?;

        let quality_score = match config.quality_score {
            Some(value) if (0.0..=MAX_QUALITY_SCORE).contains(&value) => value,
            Some(value) => return Err(ConfigurationError::InvalidQualityScore { dealer: name, value }),
            None => optimizer.calculate_quality_score(&name, &config.attributes)?,
        };

        Ok(Self {
            dealer_id,
            name,
            dealer_type,
            daily_budget,
            max_bid,
            target_locations: target_locations.into_iter().collect(),
            inventory_focus,
            attributes: config.attributes,
            quality_score,
            remaining_budget: daily_budget,
            total_impressions: 0,
            total_clicks: 0,
            total_conversions: 0,
            total_spent: 0.0,
        })
    }

    /// Ad rank before any contextual multiplier
    pub fn base_ad_rank(&self) -> f64 {
        self.max_bid * self.quality_score
    }

    pub fn targets_location(&self, location: &str) -> bool {
        self.target_locations.contains(location)
    }

    pub fn is_luxury(&self) -> bool {
        self.inventory_focus == LUXURY_FOCUS
    }

    /// Whether the dealer can still enter auctions today
    pub fn is_eligible(&self, budget_floor: f64) -> bool {
        self.remaining_budget > budget_floor
    }

    /// Charge the dealer if the remaining budget covers the price
    /// Returns false and leaves the dealer untouched otherwise
    pub fn try_charge(&mut self, price: f64) -> bool {
        if self.remaining_budget >= price {
            self.total_spent += price;
            self.remaining_budget -= price;
            true
        } else {
            false
        }
    }

    /// Average of page speed and conversion forms, each defaulting to 0.5 when absent
    pub fn landing_page_score(&self) -> f64 {
        let page_speed = self.attributes.page_speed.unwrap_or(DEFAULT_LANDING_PAGE_ATTRIBUTE);
        let conversion_forms = self.attributes.conversion_forms.unwrap_or(DEFAULT_LANDING_PAGE_ATTRIBUTE);
        (page_speed + conversion_forms) / 2.0
    }

    /// Restore the spendable balance; lifetime counters are kept
    pub fn reset_daily_budget(&mut self) {
        self.remaining_budget = self.daily_budget;
    }
}
