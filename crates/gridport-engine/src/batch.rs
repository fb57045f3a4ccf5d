//! Ordered batches of heterogeneous write operations.
//!
//! A batch shares one `WriteOptions` across its operations and produces one
//! outcome per operation, in input order. Operations are independent: there
//! is no transaction, and a failure aborts the remaining sequence without
//! rolling back writes already issued.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use gridport_core::CellValue;

use crate::backend::ValuesBackend;
use crate::error::GridPortError;
use crate::runtime::GridPort;
use crate::writer::{
    AppendResult, SetRangeResult, UpdateByKeyResult, UpdateByRowResult, WriteOptions,
};

/// One element of a batch, as supplied by the caller. JSON object key order
/// is preserved, which is what gives bootstrap appends their header order.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum BatchOp {
    #[serde(rename_all = "camelCase")]
    Append { values: Map<String, JsonValue> },
    #[serde(rename_all = "camelCase")]
    UpdateByRow {
        row: i64,
        set: Map<String, JsonValue>,
    },
    #[serde(rename_all = "camelCase")]
    UpdateByKey {
        key: String,
        value: String,
        set: Map<String, JsonValue>,
        #[serde(default)]
        allow_multi: bool,
    },
    #[serde(rename_all = "camelCase")]
    SetRange {
        range: String,
        values: Vec<Vec<JsonValue>>,
    },
}

/// The per-operation result, tagged with the operation that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum BatchOutcome {
    Append(AppendResult),
    UpdateByRow(UpdateByRowResult),
    UpdateByKey(UpdateByKeyResult),
    SetRange(SetRangeResult),
}

impl<B: ValuesBackend> GridPort<B> {
    /// Run a sequence of operations against one sheet.
    pub fn run_batch(
        &mut self,
        sheet: &str,
        ops: &[BatchOp],
        opts: &WriteOptions,
    ) -> Result<Vec<BatchOutcome>, GridPortError> {
        let mut outcomes = Vec::with_capacity(ops.len());
        for op in ops {
            let outcome = match op {
                BatchOp::Append { values } => {
                    BatchOutcome::Append(self.append(sheet, &pairs(values), opts)?)
                }
                BatchOp::UpdateByRow { row, set } => BatchOutcome::UpdateByRow(
                    self.update_by_row(sheet, *row, &pairs(set), opts)?,
                ),
                BatchOp::UpdateByKey {
                    key,
                    value,
                    set,
                    allow_multi,
                } => BatchOutcome::UpdateByKey(self.update_by_key(
                    sheet,
                    key,
                    value,
                    &pairs(set),
                    *allow_multi,
                    opts,
                )?),
                BatchOp::SetRange { range, values } => {
                    let rows: Vec<Vec<CellValue>> = values
                        .iter()
                        .map(|row| row.iter().map(CellValue::from_json).collect())
                        .collect();
                    BatchOutcome::SetRange(self.set_range(sheet, range, &rows, opts)?)
                }
            };
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }
}

fn pairs(map: &Map<String, JsonValue>) -> Vec<(String, CellValue)> {
    map.iter()
        .map(|(key, value)| (key.clone(), CellValue::from_json(value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBackend;
    use serde_json::json;

    fn text_row(cells: &[&str]) -> Vec<CellValue> {
        cells.iter().map(|c| CellValue::from(*c)).collect()
    }

    fn ops(doc: JsonValue) -> Vec<BatchOp> {
        serde_json::from_value(doc).unwrap()
    }

    #[test]
    fn runs_ops_in_order() {
        let mut port = GridPort::new(MemoryBackend::new().with_sheet(
            "Tasks",
            vec![text_row(&["ID", "Status"]), text_row(&["T-1", "Open"])],
        ));
        let ops = ops(json!([
            {"op": "append", "values": {"ID": "T-2", "Status": "Open"}},
            {"op": "updateByKey", "key": "ID", "value": "T-1", "set": {"Status": "Done"}},
            {"op": "updateByRow", "row": 3, "set": {"Status": "Blocked"}},
            {"op": "setRange", "range": "D1", "values": [["note"]]},
        ]));
        let outcomes = port
            .run_batch("Tasks", &ops, &WriteOptions::default())
            .unwrap();
        assert_eq!(outcomes.len(), 4);
        assert!(matches!(outcomes[0], BatchOutcome::Append(_)));
        assert_eq!(
            port.backend().sheet_rows("Tasks").unwrap(),
            &vec![
                vec!["ID".into(), "Status".into(), CellValue::Empty, "note".into()],
                text_row(&["T-1", "Done"]),
                text_row(&["T-2", "Blocked"]),
            ]
        );
    }

    #[test]
    fn failure_aborts_without_rollback() {
        let mut port = GridPort::new(MemoryBackend::new().with_sheet(
            "Tasks",
            vec![text_row(&["ID", "Status"]), text_row(&["T-1", "Open"])],
        ));
        let ops = ops(json!([
            {"op": "updateByKey", "key": "ID", "value": "T-1", "set": {"Status": "Done"}},
            {"op": "updateByRow", "row": 0, "set": {"Status": "x"}},
            {"op": "append", "values": {"ID": "T-9"}},
        ]));
        let err = port
            .run_batch("Tasks", &ops, &WriteOptions::default())
            .unwrap_err();
        assert!(matches!(err, GridPortError::InvalidRowNumber { row: 0 }));
        // The first operation's write stays applied; the third never ran.
        assert_eq!(
            port.backend().value_at("Tasks", 2, 2),
            Some(&CellValue::from("Done"))
        );
        assert_eq!(port.backend().sheet_rows("Tasks").unwrap().len(), 2);
    }

    #[test]
    fn op_tag_round_trips_into_outcomes() {
        let mut port = GridPort::new(MemoryBackend::new().with_sheet(
            "Tasks",
            vec![text_row(&["ID", "Status"]), text_row(&["T-1", "Open"])],
        ));
        let ops = ops(json!([
            {"op": "updateByRow", "row": 2, "set": {"Status": "Done"}},
        ]));
        let outcomes = port
            .run_batch("Tasks", &ops, &WriteOptions::default())
            .unwrap();
        let doc = serde_json::to_value(&outcomes).unwrap();
        assert_eq!(doc[0]["op"], json!("updateByRow"));
        assert_eq!(doc[0]["updatedCells"], json!(1));
        assert_eq!(doc[0]["dryRun"], json!(false));
    }

    #[test]
    fn unknown_op_is_rejected_at_parse() {
        let err = serde_json::from_value::<Vec<BatchOp>>(json!([
            {"op": "dropTable", "values": {}}
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("dropTable"));
    }
}
