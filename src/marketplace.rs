use crate::auction::AuctionResult;
use crate::dealer::DealerConfig;
use crate::dealers::Dealers;
use crate::errors::ConfigurationError;
use crate::logger::{Logger, LogEvent};
use crate::{errln, logln};

/// Session state shared by the auction engine and the campaign runner
/// The auction history is append-only; records are never changed after they are pushed
pub struct Marketplace {
    pub dealers: Dealers,
    pub auction_history: Vec<AuctionResult>,
    /// Day currently being simulated, 0 before the first day starts
    pub current_day: usize,
}

impl Marketplace {
    pub fn new() -> Self {
        Self {
            dealers: Dealers::new(),
            auction_history: Vec::new(),
            current_day: 0,
        }
    }

    /// Register a dealer, logging the outcome
    /// A rejected dealer is reported and kept out of the roster; the marketplace stays usable
    pub fn add_dealer(&mut self, config: DealerConfig, logger: &mut Logger) -> Result<usize, ConfigurationError> {
        match self.dealers.add(config) {
            Ok(dealer_id) => {
                let dealer = &self.dealers.dealers[dealer_id];
                match self.dealers.optimizer().breakdown(&dealer.attributes) {
                    Some(components) => {
                        let components: Vec<String> = components.iter().map(|(name, score)| format!("{} {:.2}", name, score)).collect();
                        logln!(logger, LogEvent::Campaign, "Added dealer {} ({}) | quality score: {:.1} ({})",
                            dealer.name, dealer.dealer_type, dealer.quality_score, components.join(", "));
                    }
                    None => {
                        logln!(logger, LogEvent::Campaign, "Added dealer {} ({}) | quality score: {:.1}", dealer.name, dealer.dealer_type, dealer.quality_score);
                    }
                }
                Ok(dealer_id)
            }
            Err(e) => {
                errln!(logger, LogEvent::Campaign, "Rejected dealer: {}", e);
                Err(e)
            }
        }
    }

    /// Register every config, returning the errors of the ones that were rejected
    pub fn add_dealers(&mut self, configs: Vec<DealerConfig>, logger: &mut Logger) -> Vec<ConfigurationError> {
        configs
            .into_iter()
            .filter_map(|config| self.add_dealer(config, logger).err())
            .collect()
    }
}

impl Default for Marketplace {
    fn default() -> Self {
        Self::new()
    }
}
