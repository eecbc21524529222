//! CSV export of a run summary.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, SecondsFormat, Utc};

use super::{ResultRecord, RunSummary};

/// Column header of the export, in order.
pub const CSV_HEADER: [&str; 7] = [
    "Timestamp",
    "TargetId",
    "DeploymentName",
    "ProvisioningState",
    "CapabilityOwnerId",
    "Outcome",
    "Message",
];

/// Export file name used when no output path is given.
pub fn default_output_path(now: DateTime<Utc>) -> PathBuf {
    PathBuf::from(format!(
        "lighthouse-onboarding-{}.csv",
        now.format("%Y%m%d-%H%M%S")
    ))
}

/// Write one row per record, creating parent directories as needed.
pub fn write_csv(summary: &RunSummary, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }

    let file = File::create(path)
        .with_context(|| format!("Failed to create results file: {}", path.display()))?;
    write_records(summary, file)
        .with_context(|| format!("Failed to write results to {}", path.display()))
}

/// Write the header and every record to `writer` with CRLF row endings.
pub fn write_records<W: io::Write>(summary: &RunSummary, writer: W) -> anyhow::Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(writer);

    csv_writer.write_record(CSV_HEADER)?;
    for record in &summary.records {
        csv_writer.write_record(record_cells(record))?;
    }
    csv_writer.flush()?;
    Ok(())
}

fn record_cells(record: &ResultRecord) -> [String; 7] {
    [
        record.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        record.target_id.clone(),
        record.deployment_name.clone().unwrap_or_default(),
        record.provisioning_state.clone().unwrap_or_default(),
        record.capability_owner_id.clone().unwrap_or_default(),
        record.outcome.to_string(),
        record.message.clone(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_cells_with_separators() {
        let record = ResultRecord {
            timestamp: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            target_id: "sub-a".to_string(),
            deployment_name: None,
            provisioning_state: Some("Failed".to_string()),
            capability_owner_id: None,
            outcome: crate::types::Outcome::Failed,
            message: "a,b say \"hi\"".to_string(),
        };
        let summary = crate::report::summarize(vec![record]);

        let mut out = Vec::new();
        write_records(&summary, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(
            text,
            "Timestamp,TargetId,DeploymentName,ProvisioningState,CapabilityOwnerId,Outcome,Message\r\n\
             2023-11-14T22:13:20Z,sub-a,,Failed,,Failed,\"a,b say \"\"hi\"\"\"\r\n"
        );
    }

    #[test]
    fn default_path_uses_timestamp() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        assert_eq!(
            default_output_path(now),
            PathBuf::from("lighthouse-onboarding-20231114-221320.csv")
        );
    }
}
