use serde::{Deserialize, Serialize};

use super::features::{FeatureName, FeatureVector, FEATURE_COUNT};

/// Maximum number of factors reported per score.
pub const TOP_N: usize = 3;

/// Heuristic trigger: more than this many failed payments in 14 days.
const FAIL_COUNT_TRIGGER: f64 = 3.0;

/// A named feature and its signed influence on the score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Factor {
    pub name: FeatureName,
    pub contribution: f64,
}

/// Which path produced the factor list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributionMode {
    Contributions,
    Heuristic,
    Unavailable,
}

/// Ranked factors together with the path that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribution {
    pub mode: AttributionMode,
    pub factors: Vec<Factor>,
}

impl Attribution {
    pub fn top(&self) -> Option<&Factor> {
        self.factors.first()
    }
}

/// Aligns raw contribution output with the feature schema.
///
/// Models may prepend a bias term, giving one extra leading element. Any
/// other length cannot be attributed and yields `None`.
pub fn align_contributions(raw: &[f64]) -> Option<[f64; FEATURE_COUNT]> {
    let aligned = match raw.len() {
        FEATURE_COUNT => raw,
        len if len == FEATURE_COUNT + 1 => &raw[1..],
        _ => return None,
    };
    let mut values = [0.0; FEATURE_COUNT];
    values.copy_from_slice(aligned);
    Some(values)
}

/// Ranks the features behind a score.
///
/// With contributions the top [`TOP_N`] features by absolute weight are
/// returned; the sort is stable so equal magnitudes keep schema order and
/// NaN weights are left out of the ranking.
/// Without contributions a fixed payment-failure / cancel-intent rule applies.
pub fn attribute(vector: &FeatureVector, contributions: Option<&[f64]>) -> Attribution {
    match contributions {
        Some(raw) => match align_contributions(raw) {
            Some(weights) => Attribution {
                mode: AttributionMode::Contributions,
                factors: rank(&weights),
            },
            None => Attribution {
                mode: AttributionMode::Unavailable,
                factors: Vec::new(),
            },
        },
        None => Attribution {
            mode: AttributionMode::Heuristic,
            factors: heuristic(vector).into_iter().collect(),
        },
    }
}

fn rank(weights: &[f64; FEATURE_COUNT]) -> Vec<Factor> {
    let mut factors: Vec<Factor> = FeatureName::ordered()
        .into_iter()
        .zip(weights.iter().copied())
        .filter(|(_, contribution)| !contribution.is_nan())
        .map(|(name, contribution)| Factor { name, contribution })
        .collect();
    factors.sort_by(|left, right| {
        right
            .contribution
            .abs()
            .total_cmp(&left.contribution.abs())
    });
    factors.truncate(TOP_N);
    factors
}

fn heuristic(vector: &FeatureVector) -> Option<Factor> {
    let failures = vector.get(FeatureName::FailCnt14d);
    if failures > FAIL_COUNT_TRIGGER {
        return Some(Factor {
            name: FeatureName::FailCnt14d,
            contribution: failures,
        });
    }

    let cancel_visits = vector.get(FeatureName::CancelPageVisit14d);
    if cancel_visits > 0.0 {
        return Some(Factor {
            name: FeatureName::CancelPageVisit14d,
            contribution: cancel_visits,
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_ranked(factors: &[Factor]) {
        assert!(factors.len() <= TOP_N);
        for pair in factors.windows(2) {
            assert!(pair[0].contribution.abs() >= pair[1].contribution.abs());
        }
    }

    #[test]
    fn contributions_rank_by_absolute_value() {
        let mut weights = vec![0.0; FEATURE_COUNT];
        weights[FeatureName::SuccCnt14d.index()] = 0.2;
        weights[FeatureName::Downgraded30d.index()] = -0.9;
        weights[FeatureName::FaqCancelViews14d.index()] = 0.5;
        weights[FeatureName::AvgAmt30d.index()] = -0.1;

        let attribution = attribute(&FeatureVector::zeroed(), Some(weights.as_slice()));

        assert_eq!(attribution.mode, AttributionMode::Contributions);
        let names: Vec<FeatureName> = attribution.factors.iter().map(|f| f.name).collect();
        assert_eq!(
            names,
            vec![
                FeatureName::Downgraded30d,
                FeatureName::FaqCancelViews14d,
                FeatureName::SuccCnt14d,
            ]
        );
        assert_eq!(attribution.factors[0].contribution, -0.9);
        assert_ranked(&attribution.factors);
    }

    #[test]
    fn leading_bias_term_is_skipped() {
        let mut weights = vec![0.0; FEATURE_COUNT + 1];
        weights[0] = 100.0;
        weights[1 + FeatureName::CancelKeywordSearch14d.index()] = 0.7;

        let attribution = attribute(&FeatureVector::zeroed(), Some(weights.as_slice()));

        assert_eq!(attribution.mode, AttributionMode::Contributions);
        assert_eq!(
            attribution.top().map(|factor| factor.name),
            Some(FeatureName::CancelKeywordSearch14d)
        );
        assert!(attribution
            .factors
            .iter()
            .all(|factor| factor.contribution != 100.0));
    }

    #[test]
    fn equal_magnitudes_keep_schema_order() {
        let mut weights = vec![0.25; FEATURE_COUNT];
        weights[FeatureName::RefundAmt14d.index()] = -0.25;

        let attribution = attribute(&FeatureVector::zeroed(), Some(weights.as_slice()));
        let names: Vec<FeatureName> = attribution.factors.iter().map(|f| f.name).collect();
        assert_eq!(
            names,
            vec![
                FeatureName::FailCnt14d,
                FeatureName::SuccCnt14d,
                FeatureName::CouponAmt14d,
            ]
        );
    }

    #[test]
    fn nan_weights_are_not_ranked() {
        let mut weights = vec![0.0; FEATURE_COUNT];
        weights[FeatureName::FailCnt14d.index()] = 0.9;
        weights[FeatureName::FailCnt30d.index()] = f64::NAN;
        weights[FeatureName::CouponAmt30d.index()] = -0.4;

        let attribution = attribute(&FeatureVector::zeroed(), Some(weights.as_slice()));

        assert!(attribution
            .factors
            .iter()
            .all(|factor| !factor.contribution.is_nan()));
        assert_eq!(
            attribution.top().map(|factor| factor.name),
            Some(FeatureName::FailCnt14d)
        );
        assert_eq!(attribution.factors[1].name, FeatureName::CouponAmt30d);
        assert_ranked(&attribution.factors);
    }

    #[test]
    fn unexpected_contribution_length_yields_no_factors() {
        let vector = FeatureVector::zeroed().with(FeatureName::FailCnt14d, 9.0);
        for len in [0, 2, FEATURE_COUNT - 1, FEATURE_COUNT + 2] {
            let weights = vec![0.5; len];
            let attribution = attribute(&vector, Some(weights.as_slice()));
            assert_eq!(attribution.mode, AttributionMode::Unavailable);
            assert!(attribution.factors.is_empty());
        }
    }

    #[test]
    fn heuristic_reports_payment_failures() {
        let vector = FeatureVector::zeroed()
            .with(FeatureName::FailCnt14d, 4.0)
            .with(FeatureName::CancelPageVisit14d, 6.0);

        let attribution = attribute(&vector, None);

        assert_eq!(attribution.mode, AttributionMode::Heuristic);
        assert_eq!(
            attribution.factors,
            vec![Factor {
                name: FeatureName::FailCnt14d,
                contribution: 4.0,
            }]
        );
    }

    #[test]
    fn heuristic_reports_cancel_page_visits() {
        let vector = FeatureVector::zeroed().with(FeatureName::CancelPageVisit14d, 2.0);

        let attribution = attribute(&vector, None);

        assert_eq!(
            attribution.factors,
            vec![Factor {
                name: FeatureName::CancelPageVisit14d,
                contribution: 2.0,
            }]
        );
    }

    #[test]
    fn heuristic_requires_more_than_three_failures() {
        let vector = FeatureVector::zeroed().with(FeatureName::FailCnt14d, 3.0);
        let attribution = attribute(&vector, None);

        assert_eq!(attribution.mode, AttributionMode::Heuristic);
        assert!(attribution.factors.is_empty());
        assert!(attribution.top().is_none());
    }

    #[test]
    fn align_accepts_only_known_lengths() {
        assert!(align_contributions(&[0.0; FEATURE_COUNT]).is_some());
        assert!(align_contributions(&[0.0; FEATURE_COUNT + 1]).is_some());
        assert!(align_contributions(&[0.0; 1]).is_none());
    }
}
