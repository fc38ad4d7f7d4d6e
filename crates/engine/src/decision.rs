//! Per-record decision: the three-way outcome, its verdict code, the usage
//! flag and the settled value.

use std::fmt;

use serde::Serialize;

use crate::aggregate::{GroupSums, SummedAmendment, SummedMandatory};
use crate::lookup::{CriteriaIndex, MandatoryIndex, MandatoryPortion, UsageId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approved,
    PartiallyApproved,
    Rejected,
}

impl Decision {
    pub const ALL: [Decision; 3] = [Self::Approved, Self::PartiallyApproved, Self::Rejected];

    /// Value of the decision column.
    pub fn code(self) -> u8 {
        match self {
            Self::Approved => 1,
            Self::PartiallyApproved => 2,
            Self::Rejected => 3,
        }
    }

    /// Standard verdict written back as the formal outcome. Fixed policy.
    pub fn verdict_code(self) -> u8 {
        match self {
            Self::Approved => 1,
            Self::PartiallyApproved => 13,
            Self::Rejected => 38,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approved => write!(f, "approved"),
            Self::PartiallyApproved => write!(f, "partially_approved"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// Which source table a record comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Ledger,
    /// Mandatory-allocation entries are approved unconditionally.
    Mandatory,
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ledger => write!(f, "ledger"),
            Self::Mandatory => write!(f, "mandatory"),
        }
    }
}

/// The decision rule. Depends only on the group's sums and on whether the
/// code is a key of the mandatory-allocation table.
pub fn decide(kind: TableKind, sums: GroupSums, in_mandatory_table: bool) -> Decision {
    if kind == TableKind::Mandatory {
        return Decision::Approved;
    }

    if sums.sectoral_cents != 0 {
        if sums.sectoral_cents == sums.requested_cents {
            Decision::Approved
        } else {
            Decision::PartiallyApproved
        }
    } else if in_mandatory_table {
        // Zero sectoral allocation, but a compulsory portion exists.
        Decision::PartiallyApproved
    } else {
        Decision::Rejected
    }
}

/// Everything the engine derives for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub usage_id: UsageId,
    pub decision: Decision,
    /// Ledger rows only.
    pub mandatory_portion: Option<MandatoryPortion>,
    /// Settled amount. `None` for mandatory rows without a value column.
    pub value_cents: Option<i64>,
}

impl Verdict {
    pub fn verdict_code(&self) -> u8 {
        self.decision.verdict_code()
    }
}

pub struct DecisionEngine<'a> {
    mandatory: &'a MandatoryIndex,
    criteria: &'a CriteriaIndex,
}

impl<'a> DecisionEngine<'a> {
    pub fn new(mandatory: &'a MandatoryIndex, criteria: &'a CriteriaIndex) -> Self {
        Self { mandatory, criteria }
    }

    pub fn evaluate_ledger(&self, row: &SummedAmendment) -> Verdict {
        let record = &row.record;
        let portion = self.mandatory.portion(&record.code);
        Verdict {
            usage_id: self.criteria.usage_id(record.unit, &record.program),
            decision: decide(TableKind::Ledger, row.sums, self.mandatory.contains(&record.code)),
            mandatory_portion: Some(portion),
            value_cents: Some(record.sectoral_cents),
        }
    }

    pub fn evaluate_mandatory(&self, row: &SummedMandatory) -> Verdict {
        let record = &row.record;
        let sums = GroupSums {
            sectoral_cents: 0,
            requested_cents: row.mandatory_sum_cents,
        };
        Verdict {
            usage_id: self.criteria.usage_id(record.unit, &record.program),
            decision: decide(TableKind::Mandatory, sums, true),
            mandatory_portion: None,
            value_cents: record.value_cents,
        }
    }
}
