//! One run: read the three tables, normalize, aggregate, cross-reference,
//! decide, and write both processed tables back.
//!
//! All reads happen before any write, and nothing is written unless both
//! tables were processed successfully.

use crate::aggregate::{attach_ledger_sums, attach_mandatory_sums};
use crate::config::EmendasConfig;
use crate::decision::{DecisionEngine, TableKind, Verdict};
use crate::error::Result;
use crate::lookup::{CriteriaIndex, MandatoryIndex, MandatoryPortion};
use crate::model::{load_criteria, load_ledger, load_mandatory};
use crate::normalize::normalize;
use crate::source::{TableSink, TableSource};
use crate::summary::{summarize, RunReport};
use crate::table::{CellValue, Table};

pub const MSG_STARTED: &str = "processing started";
pub const MSG_COMPLETED: &str = "completed successfully";

/// The three source tables as read from the source.
#[derive(Debug, Clone)]
pub struct RawInputs {
    pub ledger: Table,
    pub mandatory: Table,
    pub criteria: Table,
}

/// Both output tables plus the run report, ready to hand to a sink.
#[derive(Debug, Clone)]
pub struct ProcessedTables {
    pub ledger: Table,
    pub mandatory: Table,
    pub report: RunReport,
}

pub struct Pipeline {
    config: EmendasConfig,
}

impl Pipeline {
    pub fn new(config: EmendasConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EmendasConfig {
        &self.config
    }

    /// Run with separate source and sink.
    pub fn run(&self, source: &mut dyn TableSource, sink: &mut dyn TableSink) -> Result<RunReport> {
        notify(sink, MSG_STARTED);
        let processed = self.read_inputs(source).and_then(|inputs| self.process(&inputs));
        self.deliver(sink, processed)
    }

    /// Run against a store that is both source and sink, e.g. one workbook
    /// read and written in place.
    pub fn run_in_place<S: TableSource + TableSink>(&self, store: &mut S) -> Result<RunReport> {
        notify(store, MSG_STARTED);
        let processed = self.read_inputs(store).and_then(|inputs| self.process(&inputs));
        self.deliver(store, processed)
    }

    pub fn read_inputs(&self, source: &mut dyn TableSource) -> Result<RawInputs> {
        let names = &self.config.tables;
        Ok(RawInputs {
            ledger: source.read_table(&names.ledger)?,
            mandatory: source.read_table(&names.mandatory)?,
            criteria: source.read_table(&names.criteria)?,
        })
    }

    /// The pure transform. No I/O.
    pub fn process(&self, inputs: &RawInputs) -> Result<ProcessedTables> {
        let names = &self.config.tables;
        let cols = &self.config.columns;

        // Normalization precedes aggregation: trailing totals and merged-cell
        // gaps would corrupt group sums.
        let ledger = normalize(&inputs.ledger, &names.ledger, &cols.code)?;
        let mandatory = normalize(&inputs.mandatory, &names.mandatory, &cols.code)?;

        let ledger_rows = attach_ledger_sums(load_ledger(&ledger, &names.ledger, cols)?);
        let mandatory_rows = attach_mandatory_sums(load_mandatory(
            &mandatory,
            &names.mandatory,
            cols,
            self.config.mandatory.value_column.as_deref(),
        )?);
        let criteria = load_criteria(&inputs.criteria, &names.criteria, cols)?;

        let mandatory_index = MandatoryIndex::from_summed(&mandatory_rows);
        let criteria_index = CriteriaIndex::new(&criteria);
        let engine = DecisionEngine::new(&mandatory_index, &criteria_index);

        let ledger_verdicts: Vec<Verdict> = ledger_rows.iter().map(|r| engine.evaluate_ledger(r)).collect();
        let mandatory_verdicts: Vec<Verdict> =
            mandatory_rows.iter().map(|r| engine.evaluate_mandatory(r)).collect();

        let ledger_codes: Vec<_> = ledger_rows.iter().map(|r| &r.record.code).collect();
        let mandatory_codes: Vec<_> = mandatory_rows.iter().map(|r| &r.record.code).collect();
        let ledger_summary = summarize(TableKind::Ledger, &names.ledger, &ledger_codes, &ledger_verdicts);
        let mandatory_summary =
            summarize(TableKind::Mandatory, &names.mandatory, &mandatory_codes, &mandatory_verdicts);

        log::info!(
            "{}: {} row(s), {} group(s): {} approved, {} partial, {} rejected",
            names.ledger,
            ledger_summary.rows,
            ledger_summary.groups,
            ledger_summary.approved,
            ledger_summary.partially_approved,
            ledger_summary.rejected,
        );
        log::info!(
            "{}: {} row(s), {} group(s), {} with unique usage match",
            names.mandatory,
            mandatory_summary.rows,
            mandatory_summary.groups,
            mandatory_summary.usage_flagged,
        );

        Ok(ProcessedTables {
            ledger: self.assemble(&ledger, &ledger_verdicts, TableKind::Ledger),
            mandatory: self.assemble(&mandatory, &mandatory_verdicts, TableKind::Mandatory),
            report: RunReport {
                name: self.config.name.clone(),
                engine_version: env!("CARGO_PKG_VERSION").to_string(),
                run_at: chrono::Utc::now().to_rfc3339(),
                ledger: ledger_summary,
                mandatory: mandatory_summary,
            },
        })
    }

    /// Attach the derived columns to a normalized table. Helper sum columns
    /// are never added, and are dropped if the input carries them.
    fn assemble(&self, table: &Table, verdicts: &[Verdict], kind: TableKind) -> Table {
        let o = &self.config.output_columns;
        let mut out = table.clone();

        for helper in &o.helper {
            if out.drop_column(helper) {
                log::debug!("{kind}: dropped helper column '{helper}'");
            }
        }

        out.set_column(&o.usage_id, derived(verdicts, |v| CellValue::Number(v.usage_id.code().into())));
        out.set_column(&o.decision, derived(verdicts, |v| CellValue::Number(v.decision.code().into())));
        out.set_column(&o.verdict, derived(verdicts, |v| CellValue::Number(v.verdict_code().into())));

        if kind == TableKind::Ledger {
            out.set_column(
                &o.mandatory_portion,
                derived(verdicts, |v| v.mandatory_portion.unwrap_or(MandatoryPortion::Absent).to_cell()),
            );
        }

        let has_value = match kind {
            TableKind::Ledger => true,
            TableKind::Mandatory => self.config.mandatory.value_column.is_some(),
        };
        if has_value {
            out.set_column(
                &o.value,
                derived(verdicts, |v| v.value_cents.map(CellValue::from_cents).unwrap_or_default()),
            );
        } else {
            log::warn!(
                "{}: no mandatory.value_column configured; '{}' column omitted",
                self.config.tables.mandatory,
                o.value
            );
        }

        out
    }

    fn deliver(&self, sink: &mut dyn TableSink, processed: Result<ProcessedTables>) -> Result<RunReport> {
        let written = processed.and_then(|p| {
            sink.write_table(&self.config.tables.ledger, &p.ledger)?;
            sink.write_table(&self.config.tables.mandatory, &p.mandatory)?;
            Ok(p.report)
        });

        match written {
            Ok(report) => {
                notify(sink, MSG_COMPLETED);
                Ok(report)
            }
            Err(e) => {
                log::error!("run failed: {e}");
                notify(sink, &format!("processing failed: {e}"));
                Err(e)
            }
        }
    }
}

fn derived(verdicts: &[Verdict], cell: impl Fn(&Verdict) -> CellValue) -> Vec<CellValue> {
    verdicts.iter().map(cell).collect()
}

/// Status messages are best effort; a failing sink never aborts the run.
fn notify(sink: &mut dyn TableSink, message: &str) {
    if let Err(e) = sink.notify(message) {
        log::warn!("notification '{message}' not delivered: {e}");
    }
}
