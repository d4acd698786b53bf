mod api;
pub use crate::api::*;
pub mod auth;
pub mod error;
pub mod net;
pub mod output;
pub mod render;

pub static API_URL: &'static str = "https://api.cloudflare.com/client/v4";

/// Key under which the provider credentials are nested in the credential file
pub static PROVIDER: &'static str = "cloudflare";
