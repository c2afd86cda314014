//! Route handlers for the REST API.

pub mod catalog;
pub mod environments;
pub mod health;
pub mod wizard;
