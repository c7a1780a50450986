//! # plexstat server
//!
//! Serves the collector's aggregate gauges on `/metrics` and its refresh
//! health on `/healthz`.

pub mod exposition;
pub mod infra;
pub mod routes;
