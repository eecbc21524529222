//! Run orchestration across subscriptions.

pub mod run;

pub use run::{
    DEFAULT_REGION, NoopObserver, REGISTRATION_FAILED_MESSAGE, RunController, RunObserver,
    RunOptions, TargetState,
};
