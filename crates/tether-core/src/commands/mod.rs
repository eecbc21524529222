//! High-level commands for tether operations.
//!
//! This module provides the public API that frontends call. Commands own
//! run-level setup and hand the per-subscription work to the orchestration
//! layer.

pub mod onboard;

pub use onboard::{
    OnboardCommand, OnboardOptions, OnboardReport, TargetSelection, select_targets,
};
