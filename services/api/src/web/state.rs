//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::auth::TokenIssuer;
use course_market_core::ports::{DatabaseService, MediaStorageService};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
/// There is no other cross-request state; everything mutable lives behind
/// the database port.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub media: Arc<dyn MediaStorageService>,
    pub tokens: TokenIssuer,
}
