use emendas_engine::aggregate::attach_ledger_sums;
use emendas_engine::decision::DecisionEngine;
use emendas_engine::lookup::{CriteriaIndex, MandatoryIndex};
use emendas_engine::model::{AmendmentCode, AmendmentRecord, CriteriaRecord};
use emendas_engine::{CellValue, Decision, EmendasConfig, EmendasError, MemoryStore, Pipeline, Table, UsageId};

fn n(v: f64) -> CellValue {
    CellValue::Number(v)
}

fn t(s: &str) -> CellValue {
    CellValue::Text(s.into())
}

fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Ledger as exported by the budget system: merged code cells, a totals row
/// and trailing blanks.
fn ledger() -> Table {
    Table::from_rows(
        headers(&["Emenda", "UO", "Funcional", "Atendimento Setorial", "Valor Solicitado", "Parecer Padrão"]),
        vec![
            // 1: two tranches, fully attended
            vec![n(1.0), n(10.0), t("10.302.5018.7001"), n(100.0), n(100.0), CellValue::Empty],
            vec![CellValue::Empty, CellValue::Empty, CellValue::Empty, n(0.0), n(0.0), CellValue::Empty],
            // 2: partially attended
            vec![n(2.0), n(20.0), t("10.302.5018.8002"), n(50.0), n(100.0), CellValue::Empty],
            // 3: nothing sectoral, but present in the mandatory table
            vec![n(3.0), n(30.0), t("10.302.5018.9003"), n(0.0), n(80.0), CellValue::Empty],
            // 4: nothing sectoral, nothing mandatory
            vec![n(4.0), n(40.0), t("10.302.5018.9004"), n(0.0), n(60.0), CellValue::Empty],
            vec![t("TOTAL"), CellValue::Empty, CellValue::Empty, n(150.0), n(340.0), CellValue::Empty],
            vec![CellValue::Empty; 6],
        ],
    )
}

fn mandatory() -> Table {
    Table::from_rows(
        headers(&["Emenda", "UO", "Funcional", "Valor Solicitado"]),
        vec![
            vec![n(3.0), n(30.0), t("10.302.5018.9003"), n(30.0)],
            vec![CellValue::Empty, CellValue::Empty, CellValue::Empty, n(20.0)],
            vec![n(5.0), n(10.0), t("10.302.5018.7001"), n(0.0)],
        ],
    )
}

fn criteria() -> Table {
    Table::from_rows(
        headers(&["UO", "Ação"]),
        vec![
            vec![n(10.0), t("7001")],
            vec![n(20.0), t("8002")],
            vec![n(20.0), t("9003")],
        ],
    )
}

fn store(config: &EmendasConfig) -> MemoryStore {
    MemoryStore::new()
        .with_table(&config.tables.ledger, ledger())
        .with_table(&config.tables.mandatory, mandatory())
        .with_table(&config.tables.criteria, criteria())
}

fn column(table: &Table, name: &str) -> Vec<CellValue> {
    let idx = table.column_index(name).unwrap_or_else(|| panic!("no column {name}"));
    table.rows.iter().map(|r| r[idx].clone()).collect()
}

#[test]
fn full_run_writes_both_tables() {
    let config = EmendasConfig::default();
    let mut store = store(&config);
    let report = Pipeline::new(config.clone()).run_in_place(&mut store).unwrap();

    let out = store.table(&config.tables.ledger).unwrap();
    assert_eq!(out.len(), 5);

    // Existing verdict column kept its position.
    assert_eq!(out.columns[5], "Parecer Padrão");
    assert_eq!(column(out, "Parecer Padrão"), vec![n(1.0), n(1.0), n(13.0), n(13.0), n(38.0)]);
    assert_eq!(column(out, "Decisão Parecer"), vec![n(1.0), n(1.0), n(2.0), n(2.0), n(3.0)]);
    assert_eq!(
        column(out, "Tem parcela impositiva?"),
        vec![t("-"), t("-"), t("-"), n(50.0), t("-")]
    );
    assert_eq!(column(out, "Valor"), vec![n(100.0), n(0.0), n(50.0), n(0.0), n(0.0)]);
    // Unit 20 appears twice in the criteria table.
    assert_eq!(column(out, "ID Uso"), vec![n(6.0), n(6.0), n(0.0), n(0.0), n(0.0)]);

    let bancada = store.table(&config.tables.mandatory).unwrap();
    assert_eq!(column(bancada, "Parecer Padrão"), vec![n(1.0), n(1.0), n(1.0)]);
    assert_eq!(column(bancada, "ID Uso"), vec![n(0.0), n(0.0), n(6.0)]);
    assert!(bancada.column_index("Valor").is_none());

    assert_eq!(report.ledger.groups, 4);
    assert_eq!(report.ledger.rejected, 1);
    assert_eq!(report.mandatory.approved, 3);
    assert_eq!(store.notifications.last().map(String::as_str), Some("completed successfully"));
}

#[test]
fn report_serializes() {
    let config = EmendasConfig::default();
    let report = Pipeline::new(config.clone()).run_in_place(&mut store(&config)).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["ledger"]["kind"], "ledger");
    assert_eq!(json["ledger"]["verdict_counts"]["13"], 2);
    assert_eq!(json["mandatory"]["rows"], 3);
}

#[test]
fn bad_unit_aborts_without_writing() {
    let config = EmendasConfig::default();
    let mut bad = ledger();
    bad.rows[2][1] = t("vinte");
    let mut store = store(&config).with_table(&config.tables.ledger, bad.clone());

    let err = Pipeline::new(config.clone()).run_in_place(&mut store).unwrap_err();
    match err {
        EmendasError::DataType { ref column, row, .. } => {
            assert_eq!(column, "UO");
            assert_eq!(row, 4);
        }
        ref other => panic!("unexpected error: {other}"),
    }
    assert!(store.writes.is_empty());
    assert_eq!(store.table(&config.tables.ledger), Some(&bad));
    assert!(store.notifications.last().unwrap().contains("vinte"));
}

fn huge_ledger(amount: f64) -> Table {
    Table::from_rows(
        headers(&["Emenda", "UO", "Funcional", "Atendimento Setorial", "Valor Solicitado"]),
        vec![
            vec![n(1.0), n(10.0), t("10.302.5018.7001"), n(amount), n(amount)],
            vec![n(1.0), n(10.0), t("10.302.5018.7001"), n(amount), n(amount)],
        ],
    )
}

#[test]
fn amount_beyond_cent_range_is_a_data_error() {
    let config = EmendasConfig::default();
    let mut store = store(&config).with_table(&config.tables.ledger, huge_ledger(1e17));

    let err = Pipeline::new(config).run_in_place(&mut store).unwrap_err();
    match err {
        EmendasError::DataType { ref column, row, expected, .. } => {
            assert_eq!(column, "Atendimento Setorial");
            assert_eq!(row, 2);
            assert_eq!(expected, "a numeric amount");
        }
        ref other => panic!("unexpected error: {other}"),
    }
    assert!(store.writes.is_empty());
}

#[test]
fn group_sum_past_i64_still_decides() {
    let config = EmendasConfig::default();
    let mut store = store(&config).with_table(&config.tables.ledger, huge_ledger(5e16));

    Pipeline::new(config.clone()).run_in_place(&mut store).unwrap();
    let out = store.table(&config.tables.ledger).unwrap();
    assert_eq!(column(out, "Parecer Padrão"), vec![n(1.0), n(1.0)]);
}

#[test]
fn renamed_headers_via_config() {
    let config = EmendasConfig::from_toml(
        r#"
[tables]
ledger = "relator"
mandatory = "bancada"
criteria = "criterio"

[columns]
code = "Sequencial da Emenda"
"#,
    )
    .unwrap();

    let mut ledger = ledger();
    ledger.columns[0] = "Sequencial da Emenda".into();
    let mut mandatory = mandatory();
    mandatory.columns[0] = "Sequencial da Emenda".into();

    let mut store = MemoryStore::new()
        .with_table("relator", ledger)
        .with_table("bancada", mandatory)
        .with_table("criterio", criteria());
    Pipeline::new(config).run_in_place(&mut store).unwrap();
    assert_eq!(store.writes, vec!["relator", "bancada"]);
}

// ---------------------------------------------------------------------------
// Worked examples, straight through the aggregator and decision engine
// ---------------------------------------------------------------------------

fn rec(code: &str, unit: i64, program: &str, sectoral: i64, requested: i64) -> AmendmentRecord {
    AmendmentRecord {
        code: AmendmentCode::new(code),
        unit,
        program: program.into(),
        sectoral_cents: sectoral,
        requested_cents: requested,
    }
}

fn decide_all(records: Vec<AmendmentRecord>, mandatory_codes: &[&str]) -> Vec<(String, Decision, u8)> {
    let mandatory = mandatory_index(mandatory_codes);
    let criteria = CriteriaIndex::default();
    let engine = DecisionEngine::new(&mandatory, &criteria);
    attach_ledger_sums(records)
        .iter()
        .map(|row| {
            let v = engine.evaluate_ledger(row);
            (row.record.code.to_string(), v.decision, v.verdict_code())
        })
        .collect()
}

fn mandatory_index(codes: &[&str]) -> MandatoryIndex {
    use emendas_engine::aggregate::attach_mandatory_sums;
    use emendas_engine::model::MandatoryAllocationRecord;

    let records = codes
        .iter()
        .map(|c| MandatoryAllocationRecord {
            code: AmendmentCode::new(*c),
            unit: 0,
            program: String::new(),
            requested_cents: 100,
            value_cents: None,
        })
        .collect();
    MandatoryIndex::from_summed(&attach_mandatory_sums(records))
}

#[test]
fn example_fully_attended() {
    let out = decide_all(vec![rec("A1", 1, "x", 10000, 10000), rec("A1", 1, "x", 0, 0)], &[]);
    assert_eq!(
        out,
        vec![
            ("A1".to_string(), Decision::Approved, 1),
            ("A1".to_string(), Decision::Approved, 1),
        ]
    );
}

#[test]
fn example_partially_attended() {
    let out = decide_all(vec![rec("A2", 1, "x", 5000, 6000), rec("A2", 1, "x", 0, 4000)], &[]);
    assert!(out.iter().all(|(_, d, v)| *d == Decision::PartiallyApproved && *v == 13));
}

#[test]
fn example_zero_sectoral_with_mandatory() {
    let out = decide_all(vec![rec("A3", 1, "x", 0, 5000)], &["A3"]);
    assert_eq!(out[0].1, Decision::PartiallyApproved);
    assert_eq!(out[0].2, 13);
}

#[test]
fn example_zero_sectoral_without_mandatory() {
    let out = decide_all(vec![rec("A4", 1, "x", 0, 5000)], &["A3"]);
    assert_eq!(out[0].1, Decision::Rejected);
    assert_eq!(out[0].2, 38);
}

#[test]
fn example_usage_id() {
    let unique = CriteriaIndex::new(&[CriteriaRecord::new(10, "7001"), CriteriaRecord::new(11, "8000")]);
    assert_eq!(unique.usage_id(10, "10.302.5018.7001"), UsageId::Unique);

    let no_unit = CriteriaIndex::new(&[CriteriaRecord::new(11, "7001")]);
    assert_eq!(no_unit.usage_id(10, "10.302.5018.7001").code(), 0);

    let twice_unit = CriteriaIndex::new(&[CriteriaRecord::new(10, "7001"), CriteriaRecord::new(10, "8000")]);
    assert_eq!(twice_unit.usage_id(10, "10.302.5018.7001").code(), 0);

    let no_action = CriteriaIndex::new(&[CriteriaRecord::new(10, "8000")]);
    assert_eq!(no_action.usage_id(10, "10.302.5018.7001").code(), 0);

    let twice_action = CriteriaIndex::new(&[CriteriaRecord::new(10, "7001"), CriteriaRecord::new(12, "7001")]);
    assert_eq!(twice_action.usage_id(10, "10.302.5018.7001").code(), 0);
}
