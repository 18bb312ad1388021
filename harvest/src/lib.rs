mod auth;
mod client;
pub mod domain;
mod harvest_url;

pub(crate) use harvest_url::*;

pub use auth::*;
pub use client::*;
pub use domain::*;
