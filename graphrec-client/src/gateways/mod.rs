//! Gateways to the GraphRec API
//!
//! Every gateway reads the active identity from [`SessionState`] on each
//! call; none of them caches it.
//!
//! [`SessionState`]: crate::session::SessionState

pub mod catalog;
pub mod interaction;
pub mod metrics;
pub mod preference;
pub mod recommendation;

pub use catalog::{Catalog, CatalogGateway, CatalogItem};
pub use interaction::InteractionGateway;
pub use metrics::{MetricsGateway, MetricsSnapshot};
pub use preference::{PreferenceGateway, PreferencesPushed};
pub use recommendation::{RecommendationGateway, RecommendationList, RecommendedItem};
