//! Deploy coordination: request building, target selection and submission.

pub mod executor;
pub mod request;
pub mod targeting;

pub use executor::{DeploymentExecutor, DeploymentOutcome, WHAT_IF_MESSAGE, WHAT_IF_STATE};
pub use request::{DEFAULT_DEPLOYMENT_PREFIX, DeploymentRequest, deployment_name};
pub use targeting::TargetingPolicy;
