pub mod catalog_service;
pub use catalog_service::{CatalogError, CatalogService};

pub mod catalog_service_impl;
pub use catalog_service_impl::SeaOrmCatalogService;

pub mod checker;
pub use checker::{ChannelChecker, CheckReport};

pub mod m3u;

pub mod sources;
pub use sources::{ImportSummary, SourceService};

pub mod subscriptions;
pub use subscriptions::{PlaylistUpdate, watch_playlist};
