mod error;
pub mod events;
pub mod models;
pub mod ports;
pub mod services;

pub use error::*;
