//! Helpers shared by the domain modules.

pub mod listing;
pub mod openapi;
pub mod text;
