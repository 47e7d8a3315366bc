pub mod bids;
pub mod catalog;
pub mod controller;
pub mod drafts;
pub mod endpoints;
pub mod gateway;
pub mod geo;
pub mod transport;

pub use bids::{BidError, BidRefresh, BidService};
pub use catalog::CatalogClient;
pub use controller::BookingController;
pub use drafts::{DraftStore, DraftStoreError};
pub use gateway::SubmissionGateway;
pub use geo::{geocode_stop, plan_route, GeoError, Geocoder, RoutePreview, RouteProvider, RouteSource};
pub use transport::{
    ApiError, ApiRequest, ApiResponse, ApiTransport, HttpMethod, ReqwestTransport,
    ScriptedTransport, TransportError,
};
