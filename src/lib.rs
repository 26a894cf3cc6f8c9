//! # Roster Library
//!
//! Team member, role and permission administration: SeaORM entities and
//! repositories, the axum HTTP API, configuration, logging and seeds.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod seeds;
pub mod server;
pub mod telemetry;
pub mod validation;
pub use migration;
