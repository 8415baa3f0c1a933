pub mod config;
pub mod model;
pub mod payment;
pub mod router;

pub use config::Config;
