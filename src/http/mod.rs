//! HTTP protocol layer module
//!
//! Protocol-level building blocks shared by the API endpoints and the site
//! content handlers.

pub mod cache;
pub mod mime;
pub mod response;

// Re-export commonly used builders
pub use response::{
    build_304_response, build_405_response, build_413_response, build_500_response,
    build_direct_response, build_html_response, build_options_response, build_redirect_response,
};
