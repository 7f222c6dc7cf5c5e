use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::classifier::RiskTier;
use super::features::FeatureName;

/// Retention action suggested for a scored subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionAction {
    OfferCoupon,
    ShowRetentionOffer,
    ReachOut,
    Monitor,
    None,
}

impl RetentionAction {
    pub const fn label(self) -> &'static str {
        match self {
            Self::OfferCoupon => "offer_coupon",
            Self::ShowRetentionOffer => "show_retention_offer",
            Self::ReachOut => "reach_out",
            Self::Monitor => "monitor",
            Self::None => "none",
        }
    }
}

/// Suggested action, its justification, and the subject it applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub action: RetentionAction,
    pub reason: String,
    pub params: BTreeMap<String, String>,
}

/// Decision table over risk tier and the leading factor.
pub fn decide(tier: RiskTier, top_factor: Option<FeatureName>) -> (RetentionAction, &'static str) {
    match (tier, top_factor) {
        (RiskTier::High, Some(FeatureName::FailCnt14d)) => {
            (RetentionAction::OfferCoupon, "Recent payment failures")
        }
        (RiskTier::High, Some(FeatureName::CancelPageVisit14d)) => (
            RetentionAction::ShowRetentionOffer,
            "Cancellation intent detected",
        ),
        (RiskTier::High, _) => (RetentionAction::ReachOut, "High churn risk"),
        (RiskTier::Med, _) => (RetentionAction::Monitor, "Medium churn risk"),
        (RiskTier::Low, _) => (RetentionAction::None, "Low churn risk"),
    }
}

pub fn recommend(
    tier: RiskTier,
    top_factor: Option<FeatureName>,
    user_id: Uuid,
    product_id: &str,
) -> Recommendation {
    let (action, reason) = decide(tier, top_factor);

    let mut params = BTreeMap::new();
    params.insert("userId".to_string(), user_id.to_string());
    params.insert("prodId".to_string(), product_id.to_string());

    Recommendation {
        action,
        reason: reason.to_string(),
        params,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_tier_follows_top_factor() {
        assert_eq!(
            decide(RiskTier::High, Some(FeatureName::FailCnt14d)),
            (RetentionAction::OfferCoupon, "Recent payment failures")
        );
        assert_eq!(
            decide(RiskTier::High, Some(FeatureName::CancelPageVisit14d)),
            (
                RetentionAction::ShowRetentionOffer,
                "Cancellation intent detected"
            )
        );
        assert_eq!(
            decide(RiskTier::High, Some(FeatureName::Downgraded30d)).0,
            RetentionAction::ReachOut
        );
        assert_eq!(
            decide(RiskTier::High, None),
            (RetentionAction::ReachOut, "High churn risk")
        );
    }

    #[test]
    fn lower_tiers_ignore_factor() {
        for factor in [None, Some(FeatureName::FailCnt14d)] {
            assert_eq!(
                decide(RiskTier::Med, factor),
                (RetentionAction::Monitor, "Medium churn risk")
            );
            assert_eq!(
                decide(RiskTier::Low, factor),
                (RetentionAction::None, "Low churn risk")
            );
        }
    }

    #[test]
    fn recommendation_carries_subject_params() {
        let user = Uuid::new_v4();
        let recommendation = recommend(RiskTier::Med, None, user, "premium");

        assert_eq!(recommendation.action, RetentionAction::Monitor);
        assert_eq!(recommendation.params.get("userId"), Some(&user.to_string()));
        assert_eq!(
            recommendation.params.get("prodId").map(String::as_str),
            Some("premium")
        );
    }

    #[test]
    fn actions_serialize_as_labels() {
        let encoded = serde_json::to_value(RetentionAction::ShowRetentionOffer).expect("json");
        assert_eq!(encoded, serde_json::json!("show_retention_offer"));
        assert_eq!(RetentionAction::None.label(), "none");
    }
}
