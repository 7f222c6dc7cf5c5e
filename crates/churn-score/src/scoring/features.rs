use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of behavioral features the model consumes.
pub const FEATURE_COUNT: usize = 16;

/// Named slots of the feature vector, declared in model input order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureName {
    FailCnt14d,
    SuccCnt14d,
    CouponAmt14d,
    RefundAmt14d,
    AvgAmt14d,
    FailCnt30d,
    SuccCnt30d,
    CouponAmt30d,
    RefundAmt30d,
    AvgAmt30d,
    SwitchCnt14d,
    SwitchCnt30d,
    Downgraded30d,
    CancelKeywordSearch14d,
    FaqCancelViews14d,
    CancelPageVisit14d,
}

impl FeatureName {
    pub const fn ordered() -> [Self; FEATURE_COUNT] {
        [
            Self::FailCnt14d,
            Self::SuccCnt14d,
            Self::CouponAmt14d,
            Self::RefundAmt14d,
            Self::AvgAmt14d,
            Self::FailCnt30d,
            Self::SuccCnt30d,
            Self::CouponAmt30d,
            Self::RefundAmt30d,
            Self::AvgAmt30d,
            Self::SwitchCnt14d,
            Self::SwitchCnt30d,
            Self::Downgraded30d,
            Self::CancelKeywordSearch14d,
            Self::FaqCancelViews14d,
            Self::CancelPageVisit14d,
        ]
    }

    /// Column name in the feature store and in API payloads.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FailCnt14d => "fail_cnt_14d",
            Self::SuccCnt14d => "succ_cnt_14d",
            Self::CouponAmt14d => "coupon_amt_14d",
            Self::RefundAmt14d => "refund_amt_14d",
            Self::AvgAmt14d => "avg_amt_14d",
            Self::FailCnt30d => "fail_cnt_30d",
            Self::SuccCnt30d => "succ_cnt_30d",
            Self::CouponAmt30d => "coupon_amt_30d",
            Self::RefundAmt30d => "refund_amt_30d",
            Self::AvgAmt30d => "avg_amt_30d",
            Self::SwitchCnt14d => "switch_cnt_14d",
            Self::SwitchCnt30d => "switch_cnt_30d",
            Self::Downgraded30d => "downgraded_30d",
            Self::CancelKeywordSearch14d => "cancel_keyword_search_14d",
            Self::FaqCancelViews14d => "faq_cancel_views_14d",
            Self::CancelPageVisit14d => "cancel_page_visit_14d",
        }
    }

    /// Position of the feature in the model input tensor.
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for FeatureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed-length behavioral snapshot for one (user, product) pair.
///
/// The length is part of the type so a partially filled vector cannot be
/// constructed; missing data is represented by [`FeatureVector::zeroed`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub const fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    pub const fn zeroed() -> Self {
        Self([0.0; FEATURE_COUNT])
    }

    pub fn get(&self, name: FeatureName) -> f64 {
        self.0[name.index()]
    }

    pub fn set(&mut self, name: FeatureName, value: f64) {
        self.0[name.index()] = value;
    }

    /// Builder-style setter, mostly useful for fixtures.
    pub fn with(mut self, name: FeatureName, value: f64) -> Self {
        self.set(name, value);
        self
    }

    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.0
    }

    pub fn is_zeroed(&self) -> bool {
        self.0.iter().all(|value| *value == 0.0)
    }

    /// Model input row; the artifact is exported with a float32 input.
    pub fn to_f32(&self) -> Vec<f32> {
        self.0.iter().map(|value| *value as f32).collect()
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl From<[f64; FEATURE_COUNT]> for FeatureVector {
    fn from(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }
}
