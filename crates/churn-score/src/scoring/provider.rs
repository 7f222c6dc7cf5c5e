use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use super::features::FeatureVector;
use super::store::FeatureStore;

/// Assembles model input vectors from the feature store.
///
/// Absence and store failures both read as "no signal": the caller always
/// receives a complete vector, zero-filled when nothing could be read.
pub struct FeatureVectorProvider<S> {
    store: Arc<S>,
}

impl<S> Clone for FeatureVectorProvider<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> FeatureVectorProvider<S>
where
    S: FeatureStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn assemble(&self, user_id: Uuid, product_id: &str) -> FeatureVector {
        match self.store.fetch(user_id, product_id) {
            Ok(Some(vector)) => vector,
            Ok(None) => FeatureVector::zeroed(),
            Err(error) => {
                warn!(%user_id, product_id, %error, "feature lookup failed; using zero vector");
                FeatureVector::zeroed()
            }
        }
    }
}
