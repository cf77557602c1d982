//! Sensor Explorer - cached access to OGC SensorThings observation services
//!
//! Builds SensorThings queries, fetches and caches their results, and turns
//! them into time-ordered series with summary statistics. The library is
//! served over HTTP by the `sensor-explorer` binary.

pub mod common;
pub mod config;
pub mod entity;
pub mod error;
pub mod routes;
pub mod services;
pub mod sta;
