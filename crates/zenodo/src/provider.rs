//! Storage provider for one Zenodo instance

use std::sync::Arc;

use zs_core::{
    Address, ExampleQuery, QueryType, QueryValidation, Result, Settings, StorageProvider,
    validate_query,
};

use crate::client::ApiClient;
use crate::object::ZenodoObject;

const DEFAULT_MAX_REQUESTS_PER_SECOND: f64 = 5.0;

/// Builds [`ZenodoObject`]s that share one authenticated session
#[derive(Debug, Clone)]
pub struct ZenodoProvider {
    client: Arc<ApiClient>,
}

impl ZenodoProvider {
    /// Create a provider; fails without an access token
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = ApiClient::new(settings)?;
        tracing::debug!(endpoint = client.base_url(), "Zenodo provider ready");
        Ok(Self {
            client: Arc::new(client),
        })
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }
}

impl StorageProvider for ZenodoProvider {
    type Object = ZenodoObject;

    fn is_valid_query(&self, query: &str) -> QueryValidation {
        validate_query(query)
    }

    fn object(&self, query: &str) -> Result<ZenodoObject> {
        let address = Address::parse(query)?;
        Ok(ZenodoObject::new(query, address, self.client.clone()))
    }

    fn example_queries(&self) -> Vec<ExampleQuery> {
        vec![
            ExampleQuery {
                query: "zenodo://record/123456/path/to/file".into(),
                query_type: QueryType::Input,
                description: "A published zenodo record, starting with the ID, followed by \
                              the path to a file in the record."
                    .into(),
            },
            ExampleQuery {
                query: "zenodo://deposition/123456/path/to/file".into(),
                query_type: QueryType::Any,
                description: "An unpublished (still writable) zenodo deposition, starting \
                              with the ID, followed by the path to a file in the deposition."
                    .into(),
            },
        ]
    }

    fn rate_limiter_key(&self) -> String {
        self.client.base_url().to_string()
    }

    fn default_max_requests_per_second(&self) -> f64 {
        DEFAULT_MAX_REQUESTS_PER_SECOND
    }
}
