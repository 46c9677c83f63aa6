//! envrisk engine - Per-point hazard queries
//!
//! This crate exposes the two per-layer operations (membership and
//! neighborhood rendering), the ordered fallback chain across layers, and the
//! multi-section hazard report assembled for one query point.

pub mod engine;
pub mod models;
pub mod plan;

pub use engine::{EngineSettings, RiskEngine};
pub use models::{HazardReport, ImageStatus, Membership, NeighborhoodImage, SectionReport};
pub use plan::{FallbackChain, ReportPlan, Section};
