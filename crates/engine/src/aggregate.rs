use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{AmendmentCode, AmendmentRecord, MandatoryAllocationRecord};

/// Per-code totals over the ledger. Rows are bounded to `i64` cents; the
/// sums are widened so no group can overflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GroupSums {
    pub sectoral_cents: i128,
    pub requested_cents: i128,
}

/// A ledger record with its group's sums attached.
#[derive(Debug, Clone)]
pub struct SummedAmendment {
    pub record: AmendmentRecord,
    pub sums: GroupSums,
}

/// A mandatory-allocation record with its group's requested total attached.
#[derive(Debug, Clone)]
pub struct SummedMandatory {
    pub record: MandatoryAllocationRecord,
    pub mandatory_sum_cents: i128,
}

/// Group records by amendment code and sum one value per record.
pub fn sum_by_code<T>(
    records: &[T],
    code: impl Fn(&T) -> &AmendmentCode,
    value: impl Fn(&T) -> i64,
) -> BTreeMap<AmendmentCode, i128> {
    let mut sums: BTreeMap<AmendmentCode, i128> = BTreeMap::new();
    for record in records {
        *sums.entry(code(record).clone()).or_insert(0) += i128::from(value(record));
    }
    sums
}

/// Sectoral and requested totals per code.
pub fn ledger_group_sums(records: &[AmendmentRecord]) -> BTreeMap<AmendmentCode, GroupSums> {
    let mut groups: BTreeMap<AmendmentCode, GroupSums> = BTreeMap::new();
    for record in records {
        let entry = groups.entry(record.code.clone()).or_default();
        entry.sectoral_cents += i128::from(record.sectoral_cents);
        entry.requested_cents += i128::from(record.requested_cents);
    }
    groups
}

/// Attach the group sums to every ledger row of the group.
pub fn attach_ledger_sums(records: Vec<AmendmentRecord>) -> Vec<SummedAmendment> {
    let groups = ledger_group_sums(&records);
    records
        .into_iter()
        .map(|record| {
            let sums = groups.get(&record.code).copied().unwrap_or_default();
            SummedAmendment { record, sums }
        })
        .collect()
}

/// Attach the requested total of the group to every mandatory row.
pub fn attach_mandatory_sums(records: Vec<MandatoryAllocationRecord>) -> Vec<SummedMandatory> {
    let groups = sum_by_code(&records, |r| &r.code, |r| r.requested_cents);
    records
        .into_iter()
        .map(|record| {
            let mandatory_sum_cents = groups.get(&record.code).copied().unwrap_or_default();
            SummedMandatory {
                record,
                mandatory_sum_cents,
            }
        })
        .collect()
}
