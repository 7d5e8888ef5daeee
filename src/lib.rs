//! TripDesk application library
//!
//! Domain modules for the travel agency backend, plus the package import
//! pipeline and the itinerary PDF generator they use.

pub mod app;
pub mod context;
pub mod import;
pub mod modules;
pub mod pdf;
pub mod utils;

pub use context::AppContext;
