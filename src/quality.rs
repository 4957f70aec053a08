use serde::Deserialize;
use crate::errors::ConfigurationError;

/// Upper bound of the composite quality score
pub const MAX_QUALITY_SCORE: f64 = 10.0;

/// Raw quality inputs of a dealer, each nominally in [0, 1]
/// Every attribute is optional so that dealers with a pre-supplied quality score can omit them
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct QualityAttributes {
    pub page_speed: Option<f64>,
    pub mobile_friendly: Option<f64>,
    pub conversion_forms: Option<f64>,
    pub trust_signals: Option<f64>,
    pub keyword_match: Option<f64>,
    pub ad_copy_quality: Option<f64>,
    pub ad_extensions: Option<f64>,
    pub historical_ctr: Option<f64>,
    pub industry_benchmark: Option<f64>,
    pub competitor_gap: Option<f64>,
}

/// Names a single field of QualityAttributes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityAttribute {
    PageSpeed,
    MobileFriendly,
    ConversionForms,
    TrustSignals,
    KeywordMatch,
    AdCopyQuality,
    AdExtensions,
    HistoricalCtr,
    IndustryBenchmark,
    CompetitorGap,
}

impl QualityAttribute {
    pub fn name(&self) -> &'static str {
        match self {
            Self::PageSpeed => "page_speed",
            Self::MobileFriendly => "mobile_friendly",
            Self::ConversionForms => "conversion_forms",
            Self::TrustSignals => "trust_signals",
            Self::KeywordMatch => "keyword_match",
            Self::AdCopyQuality => "ad_copy_quality",
            Self::AdExtensions => "ad_extensions",
            Self::HistoricalCtr => "historical_ctr",
            Self::IndustryBenchmark => "industry_benchmark",
            Self::CompetitorGap => "competitor_gap",
        }
    }
}

impl QualityAttributes {
    pub fn get(&self, attribute: QualityAttribute) -> Option<f64> {
        match attribute {
            QualityAttribute::PageSpeed => self.page_speed,
            QualityAttribute::MobileFriendly => self.mobile_friendly,
            QualityAttribute::ConversionForms => self.conversion_forms,
            QualityAttribute::TrustSignals => self.trust_signals,
            QualityAttribute::KeywordMatch => self.keyword_match,
            QualityAttribute::AdCopyQuality => self.ad_copy_quality,
            QualityAttribute::AdExtensions => self.ad_extensions,
            QualityAttribute::HistoricalCtr => self.historical_ctr,
            QualityAttribute::IndustryBenchmark => self.industry_benchmark,
            QualityAttribute::CompetitorGap => self.competitor_gap,
        }
    }

    /// Every attribute set to the same value
    pub fn uniform(value: f64) -> Self {
        Self {
            page_speed: Some(value),
            mobile_friendly: Some(value),
            conversion_forms: Some(value),
            trust_signals: Some(value),
            keyword_match: Some(value),
            ad_copy_quality: Some(value),
            ad_extensions: Some(value),
            historical_ctr: Some(value),
            industry_benchmark: Some(value),
            competitor_gap: Some(value),
        }
    }
}

/// One weighted sub-score of the quality score
/// Weights within a component do not sum to 1; the multiplier scales the weighted sum
pub struct QualityComponent {
    pub name: &'static str,
    pub weights: &'static [(QualityAttribute, f64)],
    pub multiplier: f64,
}

impl QualityComponent {
    /// Weighted and scaled sub-score, or the first attribute that is missing
    fn score(&self, attributes: &QualityAttributes) -> Result<f64, QualityAttribute> {
        let mut weighted_sum = 0.0;
        for &(attribute, weight) in self.weights {
            let value = attributes.get(attribute).ok_or(attribute)?;
            weighted_sum += value * weight;
        }
        Ok(weighted_sum * self.multiplier)
    }
}

const LANDING_PAGE: QualityComponent = QualityComponent {
    name: "landing_page",
    weights: &[
        (QualityAttribute::PageSpeed, 0.25),
        (QualityAttribute::MobileFriendly, 0.20),
        (QualityAttribute::ConversionForms, 0.15),
        (QualityAttribute::TrustSignals, 0.10),
    ],
    multiplier: 4.0,
};

const AD_RELEVANCE: QualityComponent = QualityComponent {
    name: "ad_relevance",
    weights: &[
        (QualityAttribute::KeywordMatch, 0.30),
        (QualityAttribute::AdCopyQuality, 0.25),
        (QualityAttribute::AdExtensions, 0.15),
    ],
    multiplier: 3.5,
};

const EXPECTED_CTR: QualityComponent = QualityComponent {
    name: "expected_ctr",
    weights: &[
        (QualityAttribute::HistoricalCtr, 0.40),
        (QualityAttribute::IndustryBenchmark, 0.20),
        (QualityAttribute::CompetitorGap, 0.10),
    ],
    multiplier: 2.5,
};

/// Maps raw dealer attributes to a composite quality score in [.., 10]
/// There is no lower clamp: negative inputs are not expected but are not rejected either
pub struct QualityScoreOptimizer {
    pub components: Vec<QualityComponent>,
}

impl QualityScoreOptimizer {
    pub fn new() -> Self {
        Self {
            components: vec![LANDING_PAGE, AD_RELEVANCE, EXPECTED_CTR],
        }
    }

    /// Sum of the scaled sub-scores, clamped to MAX_QUALITY_SCORE
    ///
    /// # Arguments
    /// * `dealer_name` - Used only to label a MissingAttribute error
    /// * `attributes` - Raw quality inputs; all ten must be present
    pub fn calculate_quality_score(&self, dealer_name: &str, attributes: &QualityAttributes) -> Result<f64, ConfigurationError> {
        let mut total_score = 0.0;
        for component in &self.components {
            total_score += component.score(attributes).map_err(|attribute| ConfigurationError::MissingAttribute {
                dealer: dealer_name.to_string(),
                attribute: attribute.name(),
            })?;
        }
        Ok(total_score.min(MAX_QUALITY_SCORE))
    }

    /// Per-component breakdown, for logging; None if any attribute is missing
    pub fn breakdown(&self, attributes: &QualityAttributes) -> Option<Vec<(&'static str, f64)>> {
        self.components
            .iter()
            .map(|component| component.score(attributes).ok().map(|score| (component.name, score)))
            .collect()
    }
}

impl Default for QualityScoreOptimizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keenan_attributes() -> QualityAttributes {
        QualityAttributes {
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
        }
    }

    #[test]
    fn test_weighted_components() {
        let optimizer = QualityScoreOptimizer::new();
        // landing page: (0.2 + 0.18 + 0.105 + 0.08) * 4 = 2.26
        // ad relevance: (0.24 + 0.225 + 0.12) * 3.5 = 2.0475
        // expected ctr: (0.28 + 0.16 + 0.06) * 2.5 = 1.25
        let score = optimizer.calculate_quality_score("Keenan Motors", &keenan_attributes()).unwrap();
        assert!((score - 5.5575).abs() < 1e-9, "score was {}", score);

        let breakdown = optimizer.breakdown(&keenan_attributes()).unwrap();
        assert_eq!(breakdown[0].0, "landing_page");
        assert!((breakdown[0].1 - 2.26).abs() < 1e-9);
        assert!((breakdown[1].1 - 2.0475).abs() < 1e-9);
        assert!((breakdown[2].1 - 1.25).abs() < 1e-9);
    }

    #[test]
    fn test_all_ones_scores_below_clamp() {
        // Weights do not sum to one: 0.7*4 + 0.7*3.5 + 0.7*2.5 = 7.0
        let optimizer = QualityScoreOptimizer::new();
        let score = optimizer.calculate_quality_score("d", &QualityAttributes::uniform(1.0)).unwrap();
        assert!((score - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_clamped_to_ten() {
        let optimizer = QualityScoreOptimizer::new();
        let score = optimizer.calculate_quality_score("d", &QualityAttributes::uniform(5.0)).unwrap();
        assert_eq!(score, MAX_QUALITY_SCORE);
    }

    #[test]
    fn test_score_in_range_for_non_negative_inputs() {
        let optimizer = QualityScoreOptimizer::new();
        for step in 0..=40 {
            let value = step as f64 * 0.25;
            let score = optimizer.calculate_quality_score("d", &QualityAttributes::uniform(value)).unwrap();
            assert!((0.0..=MAX_QUALITY_SCORE).contains(&score), "value {} gave score {}", value, score);
        }
    }

    #[test]
    fn test_negative_inputs_are_not_clamped_below() {
        let optimizer = QualityScoreOptimizer::new();
        let score = optimizer.calculate_quality_score("d", &QualityAttributes::uniform(-1.0)).unwrap();
        assert!((score + 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_attribute() {
        let optimizer = QualityScoreOptimizer::new();
        let mut attributes = keenan_attributes();
        attributes.ad_extensions = None;
        match optimizer.calculate_quality_score("Keenan Motors", &attributes) {
            Err(ConfigurationError::MissingAttribute { dealer, attribute }) => {
                assert_eq!(dealer, "Keenan Motors");
                assert_eq!(attribute, "ad_extensions");
            }
            other => panic!("Expected MissingAttribute, got {:?}", other),
        }
        assert!(optimizer.breakdown(&attributes).is_none());
    }
}
