use std::collections::BTreeMap;
use crate::auction::AuctionResult;
use crate::dealers::Dealers;
use crate::logger::{Logger, LogEvent};
use crate::utils::safe_ratio;
use crate::logln;

/// Assumptions turning conversions into money for the ROI estimate
#[derive(Debug, Clone, PartialEq)]
pub struct RoiAssumptions {
    /// Share of conversions (leads) that end in a sale
    pub close_rate: f64,
    pub profit_per_sale: f64,
}

impl Default for RoiAssumptions {
    fn default() -> Self {
        Self {
            close_rate: 0.25,
            profit_per_sale: 2000.0,
        }
    }
}

/// Final counters of one dealer and the metrics derived from them
/// Ratios are 0 when their denominator is 0
#[derive(Debug, Clone, PartialEq)]
pub struct DealerPerformance {
    pub name: String,
    pub dealer_type: String,
    pub quality_score: f64,
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: u64,
    pub total_spent: f64,
    /// Percent
    pub ctr: f64,
    /// Percent
    pub cvr: f64,
    pub cpc: f64,
    pub cost_per_conversion: f64,
    /// Percent
    pub estimated_roi: f64,
}

/// Aggregate over all dealers of one type
#[derive(Debug, Clone, PartialEq)]
pub struct TypePerformance {
    pub dealer_type: String,
    pub clicks: u64,
    /// Percent of all clicks
    pub click_share: f64,
    pub mean_cost_per_conversion: f64,
    pub mean_cvr: f64,
}

/// Performance of every dealer after a campaign
pub struct PerformanceReport {
    /// In roster order
    pub dealers: Vec<DealerPerformance>,
    /// Sorted by type name
    pub types: Vec<TypePerformance>,
    pub total_auctions: usize,
}

impl PerformanceReport {
    pub fn new(dealers: &Dealers, auction_history: &[AuctionResult], assumptions: &RoiAssumptions) -> Self {
        let dealer_performances: Vec<DealerPerformance> = dealers.dealers.iter()
            .map(|dealer| {
                let impressions = dealer.total_impressions as f64;
                let clicks = dealer.total_clicks as f64;
                let conversions = dealer.total_conversions as f64;
                let estimated_profit = conversions * assumptions.close_rate * assumptions.profit_per_sale;
                DealerPerformance {
                    name: dealer.name.clone(),
                    dealer_type: dealer.dealer_type.clone(),
                    quality_score: dealer.quality_score,
                    impressions: dealer.total_impressions,
                    clicks: dealer.total_clicks,
                    conversions: dealer.total_conversions,
                    total_spent: dealer.total_spent,
                    ctr: safe_ratio(clicks, impressions) * 100.0,
                    cvr: safe_ratio(conversions, clicks) * 100.0,
                    cpc: safe_ratio(dealer.total_spent, clicks),
                    cost_per_conversion: safe_ratio(dealer.total_spent, conversions),
                    estimated_roi: safe_ratio(estimated_profit - dealer.total_spent, dealer.total_spent) * 100.0,
                }
            })
            .collect();

        let types = aggregate_by_type(&dealer_performances);

        Self {
            dealers: dealer_performances,
            types,
            total_auctions: auction_history.len(),
        }
    }

    /// Dealers by conversions, most first; ties keep roster order
    pub fn ranked_by_conversions(&self) -> Vec<&DealerPerformance> {
        let mut ranked: Vec<&DealerPerformance> = self.dealers.iter().collect();
        ranked.sort_by(|a, b| b.conversions.cmp(&a.conversions));
        ranked
    }

    pub fn printout(&self, logger: &mut Logger) {
        logln!(logger, LogEvent::Report, "\n=== Dealer Performance ({} auctions) ===", self.total_auctions);
        logln!(logger, LogEvent::Report, "{:<22} {:<18} {:>7} {:>7} {:>11} {:>8} {:>9}",
            "Dealer", "Type", "Quality", "Clicks", "Conversions", "CPC ($)", "ROI (%)");
        for performance in self.ranked_by_conversions() {
            logln!(logger, LogEvent::Report, "{:<22} {:<18} {:>7.2} {:>7} {:>11} {:>8.2} {:>9.2}",
                performance.name,
                performance.dealer_type,
                performance.quality_score,
                performance.clicks,
                performance.conversions,
                performance.cpc,
                performance.estimated_roi);
        }

        logln!(logger, LogEvent::Report, "\n=== Dealer Type Summary ===");
        for summary in &self.types {
            logln!(logger, LogEvent::Report, "{:<18} clicks: {:>6} ({:.1}%) | cost/conversion: {:.2} | CVR: {:.2}%",
                summary.dealer_type,
                summary.clicks,
                summary.click_share,
                summary.mean_cost_per_conversion,
                summary.mean_cvr);
        }
    }
}

fn aggregate_by_type(performances: &[DealerPerformance]) -> Vec<TypePerformance> {
    let mut groups: BTreeMap<&str, Vec<&DealerPerformance>> = BTreeMap::new();
    for performance in performances {
        groups.entry(performance.dealer_type.as_str()).or_default().push(performance);
    }
    let total_clicks: u64 = performances.iter().map(|p| p.clicks).sum();

    groups.into_iter()
        .map(|(dealer_type, members)| {
            let clicks: u64 = members.iter().map(|p| p.clicks).sum();
            let count = members.len() as f64;
            TypePerformance {
                dealer_type: dealer_type.to_string(),
                clicks,
                click_share: safe_ratio(clicks as f64, total_clicks as f64) * 100.0,
                mean_cost_per_conversion: members.iter().map(|p| p.cost_per_conversion).sum::<f64>() / count,
                mean_cvr: members.iter().map(|p| p.cvr).sum::<f64>() / count,
            }
        })
        .collect()
}
