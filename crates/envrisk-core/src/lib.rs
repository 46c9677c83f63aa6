//! envrisk core - Domain models, errors and configuration
//!
//! This crate holds the types shared by every envrisk crate: the query point
//! and coordinate frames, polygon records and their classifications, layer
//! metadata, the error taxonomy, layered configuration and the GeoJSON
//! source reader used to hand pre-parsed layers to the engine.

pub mod config;
pub mod error;
pub mod formats;
pub mod models;

pub use error::{EnvriskError, Result};
