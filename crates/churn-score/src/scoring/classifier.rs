use serde::{Deserialize, Serialize};

/// Lower bound (inclusive) of the `high` band.
pub const HIGH_RISK_THRESHOLD: f64 = 0.8;
/// Lower bound (inclusive) of the `med` band.
pub const MEDIUM_RISK_THRESHOLD: f64 = 0.5;

/// Discrete churn-risk classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Med,
    High,
}

impl RiskTier {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Med => "med",
            Self::High => "high",
        }
    }

    /// Maps a model score onto a tier. Total: NaN falls through to `Low`.
    pub fn classify(score: f64) -> Self {
        if score >= HIGH_RISK_THRESHOLD {
            Self::High
        } else if score >= MEDIUM_RISK_THRESHOLD {
            Self::Med
        } else {
            Self::Low
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_are_inclusive_on_the_lower_side() {
        assert_eq!(RiskTier::classify(0.92), RiskTier::High);
        assert_eq!(RiskTier::classify(0.8), RiskTier::High);
        assert_eq!(RiskTier::classify(0.79999), RiskTier::Med);
        assert_eq!(RiskTier::classify(0.5), RiskTier::Med);
        assert_eq!(RiskTier::classify(0.49999), RiskTier::Low);
        assert_eq!(RiskTier::classify(0.0), RiskTier::Low);
    }

    #[test]
    fn classification_is_total_and_monotonic() {
        assert_eq!(RiskTier::classify(f64::NEG_INFINITY), RiskTier::Low);
        assert_eq!(RiskTier::classify(-3.0), RiskTier::Low);
        assert_eq!(RiskTier::classify(7.5), RiskTier::High);
        assert_eq!(RiskTier::classify(f64::INFINITY), RiskTier::High);
        assert_eq!(RiskTier::classify(f64::NAN), RiskTier::Low);

        let mut previous = RiskTier::Low;
        for step in 0..=200 {
            let tier = RiskTier::classify(step as f64 / 100.0);
            assert!(tier >= previous, "tier decreased at step {step}");
            previous = tier;
        }
    }

    #[test]
    fn tiers_serialize_as_labels() {
        for tier in [RiskTier::Low, RiskTier::Med, RiskTier::High] {
            let encoded = serde_json::to_value(tier).expect("serializes");
            assert_eq!(encoded, serde_json::Value::String(tier.label().to_string()));
        }
    }
}
