pub mod adapters;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod flows;
