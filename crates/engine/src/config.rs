use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{EmendasError, Result};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmendasConfig {
    #[serde(default = "default_name")]
    pub name: String,
    /// Workbook file or CSV directory holding the three source tables.
    #[serde(default)]
    pub input: Option<PathBuf>,
    /// Workbook file or CSV directory receiving the processed tables.
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub tables: TableNames,
    #[serde(default)]
    pub columns: ColumnNames,
    #[serde(default)]
    pub output_columns: OutputColumns,
    #[serde(default)]
    pub mandatory: MandatoryConfig,
}

fn default_name() -> String {
    "emendas".into()
}

impl Default for EmendasConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            input: None,
            output: None,
            tables: TableNames::default(),
            columns: ColumnNames::default(),
            output_columns: OutputColumns::default(),
            mandatory: MandatoryConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Source table names (sheet names, or CSV file stems)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TableNames {
    pub ledger: String,
    pub mandatory: String,
    pub criteria: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            ledger: "Relator - Coletivas Apropriação".into(),
            mandatory: "Bancada Impositiva - Consulta".into(),
            criteria: "Critério IU 6".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Input headers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnNames {
    /// Amendment code; also the presence column used to find the data extent.
    pub code: String,
    /// Organizational unit (UO), integral.
    pub unit: String,
    /// Functional program; its last four characters are the action code.
    pub program: String,
    pub sectoral: String,
    pub requested: String,
    /// Action code column of the criteria table.
    pub action: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            code: "Emenda".into(),
            unit: "UO".into(),
            program: "Funcional".into(),
            sectoral: "Atendimento Setorial".into(),
            requested: "Valor Solicitado".into(),
            action: "Ação".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Output headers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputColumns {
    pub usage_id: String,
    pub decision: String,
    pub verdict: String,
    pub mandatory_portion: String,
    pub value: String,
    /// Intermediate sum headers. Never written; stripped if the input
    /// already carries them from an earlier run.
    pub helper: Vec<String>,
}

impl Default for OutputColumns {
    fn default() -> Self {
        Self {
            usage_id: "ID Uso".into(),
            decision: "Decisão Parecer".into(),
            verdict: "Parecer Padrão".into(),
            mandatory_portion: "Tem parcela impositiva?".into(),
            value: "Valor".into(),
            helper: vec![
                "Soma Atendimento Setorial".into(),
                "Soma Valor Solicitado".into(),
                "Soma Parcela Impositiva".into(),
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// Mandatory-allocation table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MandatoryConfig {
    /// Amount column copied to the output `Value` column for mandatory rows.
    /// The table has no sectoral allocation of its own, so there is no
    /// implicit choice: when unset, the mandatory output has no `Value`.
    pub value_column: Option<String>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl EmendasConfig {
    pub fn from_toml(input: &str) -> Result<Self> {
        let config: EmendasConfig =
            toml::from_str(input).map_err(|e| EmendasError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let tables = [
            ("tables.ledger", &self.tables.ledger),
            ("tables.mandatory", &self.tables.mandatory),
            ("tables.criteria", &self.tables.criteria),
        ];
        require_non_empty(&tables)?;
        require_distinct("table names", &tables)?;

        let c = &self.columns;
        require_non_empty(&[
            ("columns.code", &c.code),
            ("columns.unit", &c.unit),
            ("columns.program", &c.program),
            ("columns.sectoral", &c.sectoral),
            ("columns.requested", &c.requested),
            ("columns.action", &c.action),
        ])?;

        let o = &self.output_columns;
        let outputs = [
            ("output_columns.usage_id", &o.usage_id),
            ("output_columns.decision", &o.decision),
            ("output_columns.verdict", &o.verdict),
            ("output_columns.mandatory_portion", &o.mandatory_portion),
            ("output_columns.value", &o.value),
        ];
        require_non_empty(&outputs)?;
        require_distinct("output columns", &outputs)?;

        // Writing a derived column over an input column the engine still
        // reads would corrupt the next run.
        let inputs = [&c.code, &c.unit, &c.program, &c.sectoral, &c.requested, &c.action];
        for (key, name) in outputs {
            if inputs.contains(&name) {
                return Err(EmendasError::ConfigValidation(format!(
                    "{key} '{name}' collides with an input column"
                )));
            }
            if o.helper.iter().any(|h| h == name) {
                return Err(EmendasError::ConfigValidation(format!(
                    "{key} '{name}' is also listed as a helper column"
                )));
            }
        }

        if let Some(ref value_column) = self.mandatory.value_column {
            if value_column.trim().is_empty() {
                return Err(EmendasError::ConfigValidation(
                    "mandatory.value_column must not be empty".into(),
                ));
            }
        }

        Ok(())
    }

    /// Resolve relative `input`/`output` paths against the config file's
    /// directory.
    pub fn resolve_paths(&mut self, base_dir: &Path) {
        for path in [&mut self.input, &mut self.output].into_iter().flatten() {
            if path.is_relative() {
                *path = base_dir.join(&*path);
            }
        }
    }
}

fn require_non_empty(fields: &[(&str, &String)]) -> Result<()> {
    for (key, value) in fields {
        if value.trim().is_empty() {
            return Err(EmendasError::ConfigValidation(format!("{key} must not be empty")));
        }
    }
    Ok(())
}

fn require_distinct(what: &str, fields: &[(&str, &String)]) -> Result<()> {
    let mut seen = HashSet::new();
    for (key, value) in fields {
        if !seen.insert(value.as_str()) {
            return Err(EmendasError::ConfigValidation(format!(
                "{what} must be distinct: {key} repeats '{value}'"
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
