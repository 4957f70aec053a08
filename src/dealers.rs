use crate::dealer::{Dealer, DealerConfig};
use crate::errors::ConfigurationError;
use crate::quality::QualityScoreOptimizer;

/// Roster of registered dealers
/// dealer_id always matches the dealer's index in the roster, which is also its auction tie-break order
pub struct Dealers {
    pub dealers: Vec<Dealer>,
    optimizer: QualityScoreOptimizer,
}

impl Dealers {
    pub fn new() -> Self {
        Self {
            dealers: Vec::new(),
            optimizer: QualityScoreOptimizer::new(),
        }
    }

    /// Validate and register a dealer
    ///
    /// # Returns
    /// The dealer_id of the just added dealer. On error the roster is left unchanged.
    pub fn add(&mut self, config: DealerConfig) -> Result<usize, ConfigurationError> {
        let dealer_id = self.dealers.len();
        let dealer = Dealer::from_config(config, dealer_id, &self.optimizer)?;
        if self.find(&dealer.name).is_some() {
            return Err(ConfigurationError::DuplicateName(dealer.name));
        }
        self.dealers.push(dealer);
        Ok(dealer_id)
    }

    pub fn find(&self, name: &str) -> Option<&Dealer> {
        self.dealers.iter().find(|d| d.name == name)
    }

    pub fn len(&self) -> usize {
        self.dealers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dealers.is_empty()
    }

    pub fn optimizer(&self) -> &QualityScoreOptimizer {
        &self.optimizer
    }

    /// Start a new day: every dealer gets its full daily budget back, unspent budget is lost
    pub fn reset_daily_budgets(&mut self) {
        for dealer in &mut self.dealers {
            dealer.reset_daily_budget();
        }
    }
}

impl Default for Dealers {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(name: &str) -> DealerConfig {
        DealerConfig::new(name, "Large Chain", 100.0, 4.0, &["Center City"], "diverse").with_quality_score(7.0)
    }

    #[test]
    fn test_ids_follow_insertion_order() {
        let mut dealers = Dealers::new();
        assert_eq!(dealers.add(config("A")).unwrap(), 0);
        assert_eq!(dealers.add(config("B")).unwrap(), 1);
        assert_eq!(dealers.len(), 2);
        assert_eq!(dealers.find("B").map(|d| d.dealer_id), Some(1));
    }

    #[test]
    fn test_invalid_dealer_leaves_roster_untouched() {
        let mut dealers = Dealers::new();
        dealers.add(config("A")).unwrap();

        let mut broken = config("B");
        broken.max_bid = None;
        assert!(dealers.add(broken).is_err());
        assert!(matches!(dealers.add(config("A")), Err(ConfigurationError::DuplicateName(name)) if name == "A"));
        assert_eq!(dealers.len(), 1);

        // Next valid dealer still gets the next free id
        assert_eq!(dealers.add(config("C")).unwrap(), 1);
    }

    #[test]
    fn test_reset_daily_budgets() {
        let mut dealers = Dealers::new();
        dealers.add(config("A")).unwrap();
        dealers.add(config("B")).unwrap();
        dealers.dealers[0].try_charge(60.0);
        dealers.dealers[1].remaining_budget = 0.05;
        dealers.dealers[1].total_impressions = 9;

        dealers.reset_daily_budgets();

        assert!(dealers.dealers.iter().all(|d| d.remaining_budget == d.daily_budget));
        assert_eq!(dealers.dealers[0].total_spent, 60.0);
        assert_eq!(dealers.dealers[1].total_impressions, 9);
    }
}
