// ABOUTME: Library root for fleetroll - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod cloud;
pub mod config;
pub mod deploy;
pub mod error;
pub mod pipeline;
pub mod resource;
pub mod types;
