pub mod client;
pub mod transport;
pub mod types;

pub use client::{AuthState, WebmotorsClient};
pub use transport::{ApiRequest, ApiResponse, Auth, Body, ReqwestTransport, Transport};
pub use types::{CatalogResponse, CatalogVehicle, Pagination};
