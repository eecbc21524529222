//! Result records and run summaries. Pure data assembly, no I/O.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::deploy::DeploymentOutcome;
use crate::types::{Outcome, OverallStatus, Target};

/// Outcome of one target in a run. Every field is always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResultRecord {
    pub timestamp: DateTime<Utc>,
    pub target_id: String,
    pub deployment_name: Option<String>,
    pub provisioning_state: Option<String>,
    pub capability_owner_id: Option<String>,
    pub outcome: Outcome,
    pub message: String,
}

/// Fields of a record that do not come from the deployment outcome.
#[derive(Debug, Clone, Default)]
pub struct RecordFields {
    pub timestamp: Option<DateTime<Utc>>,
    pub deployment_name: Option<String>,
    pub capability_owner_id: Option<String>,
}

/// Build the record for one target.
pub fn record(target: &Target, outcome: DeploymentOutcome, fields: RecordFields) -> ResultRecord {
    ResultRecord {
        timestamp: fields.timestamp.unwrap_or_else(Utc::now),
        target_id: target.id.clone(),
        deployment_name: fields.deployment_name,
        provisioning_state: outcome.provisioning_state,
        capability_owner_id: fields.capability_owner_id,
        outcome: outcome.outcome,
        message: outcome.message,
    }
}

/// Ordered records of a run plus the derived overall status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub records: Vec<ResultRecord>,
    pub status: OverallStatus,
}

/// Derive the run summary. Only `Failed` records fail the run.
pub fn summarize(records: Vec<ResultRecord>) -> RunSummary {
    let status = if records.iter().any(|r| r.outcome == Outcome::Failed) {
        OverallStatus::Failed
    } else {
        OverallStatus::Success
    };
    RunSummary { records, status }
}

impl RunSummary {
    pub fn count(&self, outcome: Outcome) -> usize {
        self.records.iter().filter(|r| r.outcome == outcome).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ResultRecord> {
        self.records.iter().filter(|r| r.outcome == Outcome::Failed)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}
