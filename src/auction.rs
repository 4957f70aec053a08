use std::fmt;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use crate::dealer::Dealer;
use crate::dealers::Dealers;
use crate::logger::{Logger, LogEvent};
use crate::marketplace::Marketplace;
use crate::logln;

/// Income tier of the searching user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncomeTier {
    Low,
    Medium,
    High,
}

impl IncomeTier {
    pub const ALL: [IncomeTier; 3] = [IncomeTier::Low, IncomeTier::Medium, IncomeTier::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            IncomeTier::Low => "low",
            IncomeTier::Medium => "medium",
            IncomeTier::High => "high",
        }
    }
}

impl fmt::Display for IncomeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Constants of the auction mechanics
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AuctionParams {
    /// Dealers at or below this remaining budget sit out until the next daily reset
    pub budget_floor: f64,
    pub location_multiplier: f64,
    /// Applied when a high-income user meets a luxury-focused dealer
    pub income_multiplier: f64,
    /// Added to the second-price amount, and the whole price when there is no runner-up
    pub price_increment: f64,
    pub base_ctr: f64,
    pub base_cvr: f64,
    /// One CSV line per auction to LogEvent::Auction
    pub log_auctions: bool,
}

impl Default for AuctionParams {
    fn default() -> Self {
        Self {
            budget_floor: 0.1,
            location_multiplier: 1.2,
            income_multiplier: 1.3,
            price_increment: 0.01,
            base_ctr: 0.04,
            base_cvr: 0.05,
            log_auctions: false,
        }
    }
}

/// A dealer's position in one auction
#[derive(Debug, Clone, PartialEq)]
pub struct RankedBid {
    pub dealer_id: usize,
    pub base_ad_rank: f64,
    pub adjusted_ad_rank: f64,
}

/// Immutable record of one simulated search with at least one eligible bidder
#[derive(Debug, Clone, PartialEq)]
pub struct AuctionResult {
    pub day: usize,
    pub search_query: String,
    pub user_location: String,
    pub user_income: IncomeTier,
    pub winner_id: usize,
    pub winner: String,
    pub winner_type: String,
    /// Winner's adjusted ad rank
    pub ad_rank: f64,
    /// Price per click; only paid when `charged` is true
    pub actual_cpc: f64,
    pub click: bool,
    /// Click was paid for; false for an unclicked impression or a click the budget could not cover
    pub charged: bool,
    pub conversion: bool,
    pub timestamp: DateTime<Utc>,
}

/// Second-price ad-rank auction over the dealer roster
pub struct AuctionEngine {
    pub params: AuctionParams,
}

impl AuctionEngine {
    pub fn new() -> Self {
        Self { params: AuctionParams::default() }
    }

    pub fn with_params(params: AuctionParams) -> Self {
        Self { params }
    }

    /// Eligible dealers ranked by adjusted ad rank, highest first
    /// The sort is stable, so on equal rank the dealer registered first comes first
    pub fn rank_bids(&self, dealers: &Dealers, location: &str, income_tier: IncomeTier) -> Vec<RankedBid> {
        let mut ranked: Vec<RankedBid> = dealers.dealers.iter()
            .filter(|dealer| dealer.is_eligible(self.params.budget_floor))
            .map(|dealer| {
                let base_ad_rank = dealer.base_ad_rank();
                let location_multiplier = if dealer.targets_location(location) {
                    self.params.location_multiplier
                } else {
                    1.0
                };
                let income_multiplier = if income_tier == IncomeTier::High && dealer.is_luxury() {
                    self.params.income_multiplier
                } else {
                    1.0
                };
                RankedBid {
                    dealer_id: dealer.dealer_id,
                    base_ad_rank,
                    adjusted_ad_rank: base_ad_rank * location_multiplier * income_multiplier,
                }
            })
            .collect();
        ranked.sort_by(|a, b| b.adjusted_ad_rank.total_cmp(&a.adjusted_ad_rank));
        ranked
    }

    /// Minimum bid the winner needed to keep rank 1 against the runner-up's base rank, plus the increment
    /// Never less than the increment and never more than the winner's max bid
    pub fn price(&self, winner: &Dealer, runner_up: Option<&RankedBid>) -> f64 {
        let price = match runner_up {
            // A zero-quality winner has no meaningful second price
            Some(runner_up) if winner.quality_score > 0.0 => runner_up.base_ad_rank / winner.quality_score + self.params.price_increment,
            _ => self.params.price_increment,
        };
        price.max(self.params.price_increment).min(winner.max_bid)
    }

    fn simulated_ctr(&self, winner: &Dealer) -> f64 {
        self.params.base_ctr * (1.0 + winner.quality_score / 10.0)
    }

    fn simulated_cvr(&self, winner: &Dealer) -> f64 {
        self.params.base_cvr * (1.0 + winner.landing_page_score())
    }

    /// Run one auction for a search, update the winner's counters and append the result to the history
    ///
    /// # Arguments
    /// * `marketplace` - Roster and history; the winner is mutated in place
    /// * `query`, `location`, `income_tier` - Search context
    /// * `rng` - Source for the click and conversion draws, in that order
    ///
    /// # Returns
    /// None when no dealer has budget left above the floor; nothing is appended in that case
    pub fn run_auction<R: Rng>(
        &self,
        marketplace: &mut Marketplace,
        query: &str,
        location: &str,
        income_tier: IncomeTier,
        rng: &mut R,
        logger: &mut Logger,
    ) -> Option<AuctionResult> {
        let ranked = self.rank_bids(&marketplace.dealers, location, income_tier);
        let winning_bid = ranked.first()?;
        let day = marketplace.current_day;

        let winner = &mut marketplace.dealers.dealers[winning_bid.dealer_id];
        let actual_cpc = self.price(winner, ranked.get(1));

        winner.total_impressions += 1;

        let click = rng.gen::<f64>() < self.simulated_ctr(winner);
        let mut charged = false;
        let mut conversion = false;
        if click {
            winner.total_clicks += 1;
            // A click the remaining budget cannot cover is served but neither paid for nor converted
            if winner.try_charge(actual_cpc) {
                charged = true;
                conversion = rng.gen::<f64>() < self.simulated_cvr(winner);
                if conversion {
                    winner.total_conversions += 1;
                }
            }
        }

        let result = AuctionResult {
            day,
            search_query: query.to_string(),
            user_location: location.to_string(),
            user_income: income_tier,
            winner_id: winner.dealer_id,
            winner: winner.name.clone(),
            winner_type: winner.dealer_type.clone(),
            ad_rank: winning_bid.adjusted_ad_rank,
            actual_cpc,
            click,
            charged,
            conversion,
            timestamp: Utc::now(),
        };

        if self.params.log_auctions && logger.is_enabled(LogEvent::Auction) {
            log_auction_csv(&result, &ranked, &marketplace.dealers, logger);
        }

        marketplace.auction_history.push(result.clone());
        Some(result)
    }
}

impl Default for AuctionEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// day,query,location,income,winner,ad_rank,cpc,click,charged,conversion, then name:rank for every bidder
fn log_auction_csv(result: &AuctionResult, ranked: &[RankedBid], dealers: &Dealers, logger: &mut Logger) {
    let mut csv_fields = vec![
        format!("{}", result.day),
        result.search_query.clone(),
        result.user_location.clone(),
        result.user_income.to_string(),
        result.winner.clone(),
        format!("{:.4}", result.ad_rank),
        format!("{:.4}", result.actual_cpc),
        format!("{}", result.click),
        format!("{}", result.charged),
        format!("{}", result.conversion),
    ];
    for bid in ranked {
        csv_fields.push(format!("{}:{:.4}", dealers.dealers[bid.dealer_id].name, bid.adjusted_ad_rank));
    }
    logln!(logger, LogEvent::Auction, "{}", csv_fields.join(","));
}
