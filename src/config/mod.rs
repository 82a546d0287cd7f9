//! Configuration module

mod site;

pub use site::ApiConfig;
pub use site::DateConfig;
pub use site::FallbackMode;
pub use site::PostConfig;
pub use site::SiteConfig;
pub use site::{ACCESS_TOKEN_ENV, ENDPOINT_ENV};
