use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::asset::Asset;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveStatus {
    Pending,
    Processing,
    Complete,
    Failed,
}

impl ArchiveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveStatus::Pending => "pending",
            ArchiveStatus::Processing => "processing",
            ArchiveStatus::Complete => "complete",
            ArchiveStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveFormat {
    Json,
    Csv,
    Parquet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncludeKind {
    Transactions,
    Balances,
    Supply,
}

impl IncludeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncludeKind::Transactions => "transactions",
            IncludeKind::Balances => "balances",
            IncludeKind::Supply => "supply",
        }
    }

    pub const ALL: [IncludeKind; 3] = [
        IncludeKind::Transactions,
        IncludeKind::Balances,
        IncludeKind::Supply,
    ];
}

/// Request surface for `start_archive` (§4.6).
#[derive(Debug, Clone)]
pub struct ArchiveRequest {
    pub asset: Asset,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Empty means "all of transactions/balances/supply".
    pub include: Vec<IncludeKind>,
    /// Empty defaults to `[end_date]`.
    pub balance_snapshot_dates: Vec<NaiveDate>,
    pub preferred_format: ArchiveFormat,
}

impl ArchiveRequest {
    /// The effective `include` set, applying the "empty means all" rule.
    pub fn effective_include(&self) -> Vec<IncludeKind> {
        if self.include.is_empty() {
            IncludeKind::ALL.to_vec()
        } else {
            self.include.clone()
        }
    }

    /// The effective snapshot dates, applying the "empty defaults to
    /// end_date" rule.
    pub fn effective_snapshot_dates(&self) -> Vec<NaiveDate> {
        if self.balance_snapshot_dates.is_empty() {
            vec![self.end_date]
        } else {
            self.balance_snapshot_dates.clone()
        }
    }
}

/// One produced artifact, identified by its canonical checksum (§4.6, §6.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub name: String,
    pub format: ArchiveFormat,
    pub row_count: usize,
    pub checksum: String,
    pub bytes: Vec<u8>,
}

/// In-memory job record; lives only as long as the process (§3.4).
#[derive(Debug, Clone)]
pub struct ArchiveJob {
    pub id: Uuid,
    pub asset: Asset,
    pub request: ArchiveRequestSummary,
    pub status: ArchiveStatus,
    pub artifacts: Vec<Artifact>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Cheaply-cloned summary of the originating request, retained on the job
/// record for status queries and manifest generation.
#[derive(Debug, Clone)]
pub struct ArchiveRequestSummary {
    pub asset: Asset,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub include: Vec<IncludeKind>,
    pub balance_snapshot_dates: Vec<NaiveDate>,
}

impl ArchiveRequestSummary {
    /// The effective `include` set, applying the "empty means all" rule
    /// (mirrors [`ArchiveRequest::effective_include`]). The production
    /// conversion from `ArchiveRequest` already resolves this before
    /// storing it here, but rendering against this accessor rather than
    /// the raw field keeps that guarantee independent of how a given
    /// `ArchiveRequestSummary` was built.
    pub fn effective_include(&self) -> Vec<IncludeKind> {
        if self.include.is_empty() {
            IncludeKind::ALL.to_vec()
        } else {
            self.include.clone()
        }
    }
}

impl From<&ArchiveRequest> for ArchiveRequestSummary {
    fn from(r: &ArchiveRequest) -> Self {
        ArchiveRequestSummary {
            asset: r.asset.clone(),
            start_date: r.start_date,
            end_date: r.end_date,
            include: r.effective_include(),
            balance_snapshot_dates: r.effective_snapshot_dates(),
        }
    }
}

/// `start_archive(request)` response (§4.6, §6.1): the job is registered
/// and running in the background by the time this is returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartArchiveResp {
    pub archive_id: Uuid,
    pub status: &'static str,
    pub callback_path: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactSummary {
    pub name: String,
    pub format: ArchiveFormat,
    pub row_count: usize,
    pub checksum: String,
}

impl From<&Artifact> for ArtifactSummary {
    fn from(a: &Artifact) -> Self {
        ArtifactSummary {
            name: a.name.clone(),
            format: a.format,
            row_count: a.row_count,
            checksum: a.checksum.clone(),
        }
    }
}

/// `archive_status(id)` response: artifact bytes are withheld here, fetched
/// individually through the façade's content-negotiated download path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveStatusResp {
    pub archive_id: Uuid,
    pub status: ArchiveStatus,
    pub artifacts: Vec<ArtifactSummary>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Entry appended to the lineage log when a job completes successfully.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineageEntry {
    pub archive_id: Uuid,
    pub asset: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reproducibility_key: String,
    pub completed_at: DateTime<Utc>,
}
