//! Item catalog listing

use crate::api::ApiClient;
use crate::error::GatewayResult;
use graphrec_common::ItemId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, warn};

const ITEMS_PATH: &str = "items";

/// Catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub category: String,
    /// Any other fields the service sends
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Items keyed by id
pub type Catalog = BTreeMap<ItemId, CatalogItem>;

/// Catalog gateway
#[derive(Clone)]
pub struct CatalogGateway {
    api: ApiClient,
}

impl CatalogGateway {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// All items; empty on failure
    pub async fn fetch_items(&self) -> Catalog {
        match self.try_fetch_items().await {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!(kind = e.kind(), error = %e, "Could not fetch catalog");
                Catalog::new()
            }
        }
    }

    /// All items, or the failure reason
    pub async fn try_fetch_items(&self) -> GatewayResult<Catalog> {
        let url = self.api.endpoint(ITEMS_PATH)?;
        debug!(url = %url, "Fetching catalog");
        let catalog: Catalog = self.api.send_json(self.api.get(url)).await?;
        debug!(count = catalog.len(), "Catalog fetched");
        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_keys_parse_as_item_ids() {
        let catalog: Catalog = serde_json::from_str(
            r#"{
                "101": {"title": "The Matrix", "category": "Sci-Fi"},
                "104": {"title": "Toy Story", "category": "Animation", "year": 1995}
            }"#,
        )
        .unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog[&ItemId(101)].title, "The Matrix");
        assert_eq!(catalog[&ItemId(104)].extra["year"], 1995);
    }
}
