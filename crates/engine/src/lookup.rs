//! Cross-table lookups: membership in the mandatory-allocation table and the
//! usage-criteria double match.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::aggregate::SummedMandatory;
use crate::model::{AmendmentCode, CriteriaRecord};
use crate::table::CellValue;

// ---------------------------------------------------------------------------
// Mandatory allocation
// ---------------------------------------------------------------------------

/// Whether a ledger amendment also appears in the mandatory-allocation table.
/// Only presence matters downstream; the amount is carried for the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MandatoryPortion {
    Present(i128),
    Absent,
}

impl MandatoryPortion {
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    /// Output cell: the mandatory total, or `-` when the code is absent.
    pub fn to_cell(self) -> CellValue {
        match self {
            Self::Present(cents) => CellValue::from_cents(cents),
            Self::Absent => CellValue::Text("-".into()),
        }
    }
}

/// `code → MandatorySum` over the aggregated mandatory-allocation table.
#[derive(Debug, Clone, Default)]
pub struct MandatoryIndex {
    sums: HashMap<AmendmentCode, i128>,
}

impl MandatoryIndex {
    pub fn from_summed(rows: &[SummedMandatory]) -> Self {
        let sums = rows
            .iter()
            .map(|r| (r.record.code.clone(), r.mandatory_sum_cents))
            .collect();
        Self { sums }
    }

    /// Membership test on the table's keys, regardless of amount.
    pub fn contains(&self, code: &AmendmentCode) -> bool {
        self.sums.contains_key(code)
    }

    pub fn portion(&self, code: &AmendmentCode) -> MandatoryPortion {
        match self.sums.get(code) {
            Some(&cents) => MandatoryPortion::Present(cents),
            None => MandatoryPortion::Absent,
        }
    }

    pub fn len(&self) -> usize {
        self.sums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sums.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Usage criteria
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageId {
    /// Exactly one criteria row matches the unit and exactly one the action.
    Unique,
    /// Zero or several matches on either axis.
    NotUnique,
}

impl UsageId {
    pub fn code(self) -> u8 {
        match self {
            Self::Unique => 6,
            Self::NotUnique => 0,
        }
    }
}

impl fmt::Display for UsageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Match counts over the criteria table's unit and action columns. The two
/// columns are counted independently, as the spreadsheet's COUNTIF pair did.
#[derive(Debug, Clone, Default)]
pub struct CriteriaIndex {
    units: HashMap<i64, usize>,
    actions: HashMap<String, usize>,
}

impl CriteriaIndex {
    pub fn new(records: &[CriteriaRecord]) -> Self {
        let mut index = Self::default();
        for record in records {
            if let Some(unit) = record.unit {
                *index.units.entry(unit).or_insert(0) += 1;
            }
            if let Some(ref action) = record.action {
                *index.actions.entry(action.clone()).or_insert(0) += 1;
            }
        }
        index
    }

    pub fn unit_count(&self, unit: i64) -> usize {
        self.units.get(&unit).copied().unwrap_or(0)
    }

    pub fn action_count(&self, action: &str) -> usize {
        self.actions.get(action).copied().unwrap_or(0)
    }

    /// Ambiguous matches are not an error: more than one hit on either axis
    /// yields `NotUnique`, exactly like no hit at all.
    pub fn usage_id(&self, unit: i64, program: &str) -> UsageId {
        let unit_matches = self.unit_count(unit);
        let action_matches = self.action_count(action_suffix(program));
        if unit_matches == 1 && action_matches == 1 {
            UsageId::Unique
        } else {
            UsageId::NotUnique
        }
    }
}

/// Last four characters of a functional program (the action code). Shorter
/// strings are returned whole.
pub fn action_suffix(program: &str) -> &str {
    let program = program.trim_end();
    match program.char_indices().rev().nth(3) {
        Some((idx, _)) => &program[idx..],
        None => program,
    }
}
