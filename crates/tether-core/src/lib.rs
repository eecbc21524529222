//! Tether Core Library
//!
//! Applies one delegation template to a selected set of subscriptions,
//! ensuring the required resource provider is registered first, and records
//! an auditable per-subscription result set.

pub mod cloud;
pub mod commands;
pub mod config;
pub mod context;
pub mod deploy;
pub mod error;
pub mod orchestration;
pub mod poll;
pub mod registration;
pub mod report;
pub mod template;
pub mod types;

/// Re-exports of commonly used types
pub mod prelude {
    // Collaborators
    pub use crate::cloud::{
        AzCli, CloudSession, ContextSelector, DeploymentSubmitter, ProviderRegistry,
        SubmissionMode, SubmissionResult, SubscriptionDirectory, TenantResolver,
    };

    // Commands
    pub use crate::commands::{OnboardCommand, OnboardOptions, OnboardReport, TargetSelection};

    // Configuration
    pub use crate::config::{ConfigStore, TetherConfig};

    // Core flow
    pub use crate::context::ExecutionContext;
    pub use crate::deploy::{DeploymentExecutor, DeploymentOutcome, DeploymentRequest};
    pub use crate::orchestration::{RunController, RunObserver, RunOptions};
    pub use crate::poll::{Clock, PollPolicy, SystemClock};
    pub use crate::registration::ProviderRegistrationPoller;
    pub use crate::report::{ResultRecord, RunSummary};
    pub use crate::template::{PreparedTemplate, Template, TemplateLocation, TemplateSource};

    // Errors
    pub use crate::error::SetupError;

    // Types
    pub use crate::types::{Outcome, OverallStatus, ProviderRegistrationState, Target};
}
