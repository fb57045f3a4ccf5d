//! End-to-end flows over the in-memory backend: writes observed through
//! subsequent table reads.

use gridport_engine::{
    BatchOp, CellValue, GridPort, MemoryBackend, ReadOptions, WriteOptions,
};
use serde_json::json;

fn text_row(cells: &[&str]) -> Vec<CellValue> {
    cells.iter().map(|c| CellValue::from(*c)).collect()
}

fn set(pairs: &[(&str, &str)]) -> Vec<(String, CellValue)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), CellValue::from(*v)))
        .collect()
}

#[test]
fn bootstrap_append_then_read() {
    let mut port = GridPort::new(MemoryBackend::new().with_sheet("CRM", Vec::new()));
    port.append(
        "CRM",
        &set(&[("Name", "Acme"), ("Status", "Active")]),
        &WriteOptions::default(),
    )
    .unwrap();

    let slice = port.read_table("CRM", &ReadOptions::default()).unwrap();
    assert_eq!(slice.header_row, Some(1));
    assert_eq!(slice.headers, vec!["Name", "Status"]);
    assert_eq!(
        slice.records(),
        vec![json!({"_row": 2, "Name": "Acme", "Status": "Active"})]
    );
}

#[test]
fn key_update_is_visible_to_reads() {
    let mut port = GridPort::new(MemoryBackend::new().with_sheet(
        "Tasks",
        vec![
            text_row(&["ID", "Name", "Status"]),
            text_row(&["T-1", "Acme", "Open"]),
            text_row(&["T-2", "Beta", "Open"]),
        ],
    ));
    let result = port
        .update_by_key(
            "Tasks",
            "ID",
            "T-1",
            &set(&[("Status", "Done")]),
            false,
            &WriteOptions::default(),
        )
        .unwrap();
    assert_eq!(result.matched_rows, 1);
    assert_eq!(result.updated_cells, 1);

    let slice = port.read_table("Tasks", &ReadOptions::default()).unwrap();
    assert_eq!(slice.records()[0]["Status"], json!("Done"));
    assert_eq!(slice.records()[1]["Status"], json!("Open"));
}

#[test]
fn dry_run_batch_leaves_reads_unchanged() {
    let mut port = GridPort::new(MemoryBackend::new().with_sheet(
        "Tasks",
        vec![text_row(&["ID", "Status"]), text_row(&["T-1", "Open"])],
    ));
    let before = port.read_table("Tasks", &ReadOptions::default()).unwrap();

    let ops: Vec<BatchOp> = serde_json::from_value(json!([
        {"op": "append", "values": {"ID": "T-2", "Status": "Open"}},
        {"op": "updateByKey", "key": "ID", "value": "T-1", "set": {"Status": "Done"}},
        {"op": "updateByRow", "row": 2, "set": {"Status": "Blocked"}},
        {"op": "setRange", "range": "A1:B1", "values": [["x", "y"]]},
    ]))
    .unwrap();
    let opts = WriteOptions {
        dry_run: true,
        ..WriteOptions::default()
    };
    let outcomes = port.run_batch("Tasks", &ops, &opts).unwrap();
    assert_eq!(outcomes.len(), 4);

    let after = port.read_table("Tasks", &ReadOptions::default()).unwrap();
    assert_eq!(before, after);
}

#[test]
fn numeric_date_rows_read_headerless() {
    let port = GridPort::new(MemoryBackend::new().with_sheet(
        "Log",
        vec![
            Vec::new(),
            Vec::new(),
            vec!["2025-01-01".into(), CellValue::Number(42.0)],
            vec!["2025-01-02".into(), CellValue::Number(43.0)],
        ],
    ));
    let slice = port.read_table("Log", &ReadOptions::default()).unwrap();
    assert_eq!(slice.header_row, None);
    assert_eq!(slice.headers, vec!["A", "B"]);
    // Row 3 is data, not a header, and keeps its absolute row.
    assert_eq!(slice.rows[0].row, 3);
}

#[test]
fn letter_addressed_updates_on_headerless_tables() {
    let mut port = GridPort::new(MemoryBackend::new().with_sheet(
        "Log",
        vec![vec!["2025-01-01".into(), CellValue::Number(42.0)]],
    ));
    let result = port
        .update_by_row("Log", 1, &set(&[("B", "fixed")]), &WriteOptions::default())
        .unwrap();
    assert_eq!(result.updated_cells, 1);
    assert_eq!(result.updated_ranges, vec!["'Log'!B1"]);

    let slice = port.read_table("Log", &ReadOptions::default()).unwrap();
    assert_eq!(slice.records()[0]["B"], json!("fixed"));
}
