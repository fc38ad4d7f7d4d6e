use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::decision::{Decision, TableKind, Verdict};
use crate::lookup::UsageId;
use crate::model::AmendmentCode;

#[derive(Debug, Clone, Serialize)]
pub struct TableSummary {
    pub kind: TableKind,
    pub table: String,
    pub rows: usize,
    pub groups: usize,
    pub approved: usize,
    pub partially_approved: usize,
    pub rejected: usize,
    pub usage_flagged: usize,
    /// Row count per verdict code.
    pub verdict_counts: BTreeMap<u8, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub name: String,
    pub engine_version: String,
    pub run_at: String,
    pub ledger: TableSummary,
    pub mandatory: TableSummary,
}

/// Count outcomes over one decisioned table. `codes` and `verdicts` are
/// parallel, one entry per row.
pub fn summarize(kind: TableKind, table: &str, codes: &[&AmendmentCode], verdicts: &[Verdict]) -> TableSummary {
    let mut summary = TableSummary {
        kind,
        table: table.to_string(),
        rows: verdicts.len(),
        groups: codes.iter().collect::<BTreeSet<_>>().len(),
        approved: 0,
        partially_approved: 0,
        rejected: 0,
        usage_flagged: 0,
        verdict_counts: BTreeMap::new(),
    };

    for v in verdicts {
        match v.decision {
            Decision::Approved => summary.approved += 1,
            Decision::PartiallyApproved => summary.partially_approved += 1,
            Decision::Rejected => summary.rejected += 1,
        }
        if v.usage_id == UsageId::Unique {
            summary.usage_flagged += 1;
        }
        *summary.verdict_counts.entry(v.verdict_code()).or_insert(0) += 1;
    }

    summary
}
