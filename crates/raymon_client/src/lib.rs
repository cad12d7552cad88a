pub mod client;
pub mod validate;

pub use client::{build_http_client, RayDashboardClient};
pub use validate::{validate_input, ValidatedInput};
pub use reqwest::Client;
