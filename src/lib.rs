//! Catalog dashboard - application catalog browsing and deployment wizards
//!
//! The library holds the dashboard's session bookkeeping (recent apps,
//! active environment, wizard progress), the clients for the remote catalog
//! and environment services, and the REST API served by the binary.

pub mod api;
pub mod catalog;
pub mod config;
pub mod environments;
pub mod error;
pub mod forms;
pub mod logging;
pub mod rest;
pub mod session;
pub mod wizard;
