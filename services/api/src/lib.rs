pub mod adapters;
pub mod auth;
pub mod config;
pub mod error;
pub mod web;

pub use web::router;
