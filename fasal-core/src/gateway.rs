use async_trait::async_trait;
use std::sync::Arc;

use crate::models::{CreatePolicyRequest, Policy};
use crate::store::FasalStore;
use crate::types::FasalError;

/// Destination for finalised policy drafts.
///
/// The production implementation posts to `POST /api/policies/create`
/// (see `fasal-gateway`); [`StoreGateway`] writes straight to a store.
#[async_trait]
pub trait PolicyGateway: Send + Sync {
    async fn create_policy(&self, request: &CreatePolicyRequest) -> Result<Policy, FasalError>;
}

/// Inserts policies directly into a [`FasalStore`], with no HTTP hop.
#[derive(Clone)]
pub struct StoreGateway {
    store: Arc<dyn FasalStore>,
}

impl StoreGateway {
    pub fn new(store: Arc<dyn FasalStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PolicyGateway for StoreGateway {
    async fn create_policy(&self, request: &CreatePolicyRequest) -> Result<Policy, FasalError> {
        self.store.insert_policy(request.clone()).await
    }
}
