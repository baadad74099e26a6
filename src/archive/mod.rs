//! C6: compliance archive generation (§4.6).
//!
//! [`ArchiveEngine`] owns the only mutable state here — a [`store::JobStore`]
//! — and is the only place that writes to an [`crate::domain::ArchiveJob`].
//! Everything that turns inputs into artifact bytes lives in
//! [`producers`]/[`methodology`]/[`manifest`] as pure functions; the engine's
//! job is solely to drive the `pending -> processing -> {complete | failed}`
//! lifecycle around them and keep the lineage log current.

pub mod canonical;
mod manifest;
mod methodology;
pub mod producers;
pub mod store;

use std::collections::BTreeMap;

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::cold::ColdStore;
use crate::domain::{ArchiveFormat, ArchiveJob, ArchiveRequest, ArchiveStatus, IncludeKind, LineageEntry};
use crate::error::QueryError;
use crate::snapshot::SnapshotReader;

use self::canonical::reproducibility_key;
use self::methodology::METHODOLOGY_VERSION;
use self::store::JobStore;

#[derive(Clone)]
pub struct ArchiveEngine {
    cold: ColdStore,
    snapshot: SnapshotReader,
    jobs: JobStore,
}

impl ArchiveEngine {
    pub fn new(cold: ColdStore, snapshot: SnapshotReader) -> Self {
        Self {
            cold,
            snapshot,
            jobs: JobStore::new(),
        }
    }

    /// Registers the job as `pending` and spawns background production
    /// (§4.6). Returns immediately with the job id; the caller polls
    /// [`ArchiveEngine::status`] for progress.
    pub async fn start_archive(&self, request: ArchiveRequest) -> Uuid {
        let id = Uuid::new_v4();
        let summary = (&request).into();
        self.jobs.insert(store::new_job(id, summary)).await;

        let engine = self.clone();
        tokio::spawn(async move {
            engine.process(id, request).await;
        });

        id
    }

    pub async fn status(&self, id: Uuid) -> Result<ArchiveJob, QueryError> {
        self.jobs.get(id).await
    }

    pub async fn lineage(&self, asset: Option<&str>, limit: usize) -> Vec<LineageEntry> {
        self.jobs.lineage(asset, limit).await
    }

    async fn process(&self, id: Uuid, request: ArchiveRequest) {
        if let Err(e) = self.jobs.update(id, |job| job.status = ArchiveStatus::Processing).await {
            error!(archive_id = %id, error = %e, "archive job vanished before processing started");
            return;
        }
        info!(archive_id = %id, asset = %request.asset, "archive job started");

        match self.produce_all(&request).await {
            Ok(artifacts) => {
                let checksums: BTreeMap<String, String> =
                    artifacts.iter().map(|a: &crate::domain::Artifact| (a.name.clone(), a.checksum.clone())).collect();

                let code = request.asset.code();
                let issuer = request.asset.issuer().unwrap_or_default();
                let include: Vec<&str> = request.effective_include().iter().map(IncludeKind::as_str).collect();
                let repro_key = reproducibility_key(
                    code,
                    issuer,
                    &request.start_date.to_string(),
                    &request.end_date.to_string(),
                    include,
                    METHODOLOGY_VERSION,
                );

                let job_snapshot = match self.jobs.get(id).await {
                    Ok(job) => job,
                    Err(e) => {
                        error!(archive_id = %id, error = %e, "archive job vanished before methodology render");
                        return;
                    }
                };
                let (methodology_bytes, methodology_checksum) =
                    methodology::render(&job_snapshot, &checksums, &repro_key);
                let mut all_checksums = checksums.clone();
                all_checksums.insert("methodology".to_string(), methodology_checksum.clone());

                let total_rows: usize = artifacts.iter().map(|a| a.row_count).sum();
                let (manifest_bytes, manifest_checksum) =
                    manifest::render(&job_snapshot, &all_checksums, total_rows, &repro_key, Utc::now());

                let mut final_artifacts = artifacts;
                final_artifacts.push(crate::domain::Artifact {
                    name: "methodology.md".to_string(),
                    format: ArchiveFormat::Json,
                    row_count: 0,
                    checksum: methodology_checksum,
                    bytes: methodology_bytes,
                });
                final_artifacts.push(crate::domain::Artifact {
                    name: "manifest.json".to_string(),
                    format: ArchiveFormat::Json,
                    row_count: 0,
                    checksum: manifest_checksum,
                    bytes: manifest_bytes,
                });

                let completed_at = Utc::now();
                let update_result = self
                    .jobs
                    .update(id, |job| {
                        job.status = ArchiveStatus::Complete;
                        job.artifacts = final_artifacts;
                        job.completed_at = Some(completed_at);
                    })
                    .await;

                if update_result.is_ok() {
                    self.jobs
                        .append_lineage(LineageEntry {
                            archive_id: id,
                            asset: request.asset.to_string(),
                            start_date: request.start_date,
                            end_date: request.end_date,
                            reproducibility_key: repro_key,
                            completed_at,
                        })
                        .await;
                    info!(archive_id = %id, "archive job completed");
                }
            }
            Err(e) => {
                warn!(archive_id = %id, error = %e, "archive job failed");
                let _ = self
                    .jobs
                    .update(id, |job| {
                        job.status = ArchiveStatus::Failed;
                        job.error = Some(e.to_string());
                        job.completed_at = Some(Utc::now());
                    })
                    .await;
            }
        }
    }

    /// Produces every included artifact. A failure in `transactions` or
    /// `supply` is fatal to the whole job; a failure producing one
    /// snapshot date within `balances` is logged and that date is skipped,
    /// since the other requested dates remain independently reproducible.
    async fn produce_all(&self, request: &ArchiveRequest) -> Result<Vec<crate::domain::Artifact>, QueryError> {
        let mut artifacts = Vec::new();
        let code = request.asset.code().to_string();
        let issuer = request.asset.issuer().unwrap_or_default().to_string();

        for include in request.effective_include() {
            match include {
                IncludeKind::Transactions => {
                    let artifact = producers::produce_transactions(
                        &self.cold,
                        &request.asset,
                        request.start_date,
                        request.end_date,
                        request.preferred_format,
                    )
                    .await?;
                    artifacts.push(artifact);
                }
                IncludeKind::Balances => {
                    for date in request.effective_snapshot_dates() {
                        match producers::produce_balance_snapshot(&self.cold, &request.asset, date, request.preferred_format).await {
                            Ok(artifact) => artifacts.push(artifact),
                            Err(e) => warn!(asset = %request.asset, date = %date, error = %e, "skipping balance snapshot for date"),
                        }
                    }
                }
                IncludeKind::Supply => {
                    let artifact = producers::produce_supply_timeline(
                        &self.snapshot,
                        &code,
                        &issuer,
                        request.start_date,
                        request.end_date,
                        request.preferred_format,
                    )
                    .await?;
                    artifacts.push(artifact);
                }
            }
        }

        Ok(artifacts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::Asset;
    use chrono::NaiveDate;

    fn sample_request() -> ArchiveRequest {
        ArchiveRequest {
            asset: Asset::Credit {
                code: "USDC".to_string(),
                issuer: "GISSUER".to_string(),
            },
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(),
            include: vec![],
            balance_snapshot_dates: vec![],
            preferred_format: ArchiveFormat::Json,
        }
    }

    #[test]
    fn effective_include_defaults_to_all_three() {
        let req = sample_request();
        assert_eq!(req.effective_include().len(), 3);
    }

    #[test]
    fn effective_snapshot_dates_defaults_to_end_date() {
        let req = sample_request();
        assert_eq!(req.effective_snapshot_dates(), vec![req.end_date]);
    }
}
