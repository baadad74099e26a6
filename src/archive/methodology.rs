//! `methodology.md` producer (§4.6, §6.3): a deterministic Markdown
//! document describing how an archive was derived. Determinism means no
//! current-timestamp prose inside the body — `generated_at` lives only in
//! the manifest, never here, so this artifact's checksum depends on
//! nothing but the job's own (already-canonical) inputs (§9).

use std::collections::BTreeMap;

use crate::domain::{ArchiveJob, IncludeKind};

use super::canonical::checksum_of_bytes;

pub const METHODOLOGY_VERSION: &str = "1.0";

/// Renders the methodology document and returns it alongside its own
/// checksum, computed over the rendered bytes (the document has no
/// variable fields to exclude — it never mentions `generated_at`).
pub fn render(job: &ArchiveJob, artifact_checksums: &BTreeMap<String, String>, reproducibility_key: &str) -> (Vec<u8>, String) {
    let mut out = String::new();
    let effective_include = job.request.effective_include();
    let include: Vec<&str> = effective_include.iter().map(IncludeKind::as_str).collect();

    out.push_str("# Archive Methodology\n\n");

    out.push_str("## Archive Info\n\n");
    out.push_str(&format!("- Archive ID: {}\n", job.id));
    out.push_str(&format!("- Asset: {}\n", job.asset));
    out.push_str(&format!("- Period: {} to {}\n", job.request.start_date, job.request.end_date));
    out.push_str(&format!("- Included artifacts: {}\n", include.join(", ")));
    out.push_str(&format!("- Methodology version: {METHODOLOGY_VERSION}\n\n"));

    out.push_str("## Data Sources\n\n");
    out.push_str("- Payment-operation history (Silver `operations_enriched`), filtered to the requested asset and period.\n");
    out.push_str("- Trustline/account SCD2 snapshot tables (Gold `trustlines_snapshot` / `accounts_snapshot`) for balance reconstruction.\n");
    out.push_str("- Daily SCD2 aggregates for total supply and holder counts.\n\n");

    out.push_str("## Derivation Methods\n\n");
    out.push_str("- Transactions: payment-type operations in `[start_date, end_date)`, sorted by `(ledger_sequence, operation_index)` ascending.\n");
    out.push_str("- Balances: the unique SCD2 row valid at 23:59:59 UTC on each requested snapshot date, sorted by balance descending.\n");
    out.push_str("- Supply: one daily aggregate point per day in the period, computed in arbitrary-precision decimal arithmetic.\n\n");

    out.push_str("## Reproducibility Guarantee\n\n");
    out.push_str("Re-running this archive with the same asset, period, include set, and methodology version always yields byte-identical artifact checksums.\n");
    out.push_str(&format!("Reproducibility key: `{reproducibility_key}`\n\n"));

    out.push_str("## Checksums\n\n");
    out.push_str("| Artifact | Checksum |\n|---|---|\n");
    for (name, checksum) in artifact_checksums {
        out.push_str(&format!("| {name} | {checksum} |\n"));
    }
    out.push('\n');

    out.push_str("## Schema Definitions\n\n");
    out.push_str("- `transactions`: ledger_sequence:i64, closed_at:string, transaction_hash:string, operation_index:i32, operation_type:string, from_account:string, to_account:string, amount:decimal-string, successful:bool\n");
    out.push_str("- `balances`: account_id:string, balance:decimal-string, percent_of_supply:decimal-string\n");
    out.push_str("- `supply_timeline`: timestamp:string, ledger_sequence:i64, total_supply:decimal-string, circulating_supply:decimal-string, issuer_balance:decimal-string, holder_count:i32, supply_change:decimal-string?, supply_change_percent:decimal-string?\n\n");

    out.push_str("## Support\n\n");
    out.push_str("Questions about this archive's derivation should reference the archive ID and reproducibility key above.\n");

    let bytes = out.into_bytes();
    let checksum = checksum_of_bytes(&bytes);
    (bytes, checksum)
}
