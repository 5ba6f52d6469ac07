use crate::error::DecisionIntelError;
use crate::records::RawDisbursementRecord;
use crate::DecisionResult;

/// Supplier of the raw record batch. Paging, retries and connection handling
/// belong to the implementor; the pipeline calls `fetch` exactly once and
/// treats an error as fatal for the whole run.
pub trait RecordSource {
    /// Short name used in logs and in `Upstream` errors.
    fn name(&self) -> &str;

    fn fetch(&self) -> DecisionResult<Vec<RawDisbursementRecord>>;
}

/// A batch that is already materialised in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    records: Vec<RawDisbursementRecord>,
}

impl InMemorySource {
    pub fn new(records: Vec<RawDisbursementRecord>) -> Self {
        Self { records }
    }

    /// Parse a JSON array of raw rows, or an object with a `records` array.
    /// An object without `records` is rejected rather than read as an empty
    /// batch.
    pub fn from_json(json: &str) -> DecisionResult<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let rows = match value {
            serde_json::Value::Object(mut map) => {
                map.remove("records")
                    .ok_or_else(|| DecisionIntelError::InvalidInput {
                        field: "records".into(),
                        reason: "Object input must carry a 'records' array".into(),
                    })?
            }
            other => other,
        };
        if !rows.is_array() {
            return Err(DecisionIntelError::InvalidInput {
                field: "records".into(),
                reason: "Expected an array of records".into(),
            });
        }
        Ok(Self::new(serde_json::from_value(rows)?))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordSource for InMemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    fn fetch(&self) -> DecisionResult<Vec<RawDisbursementRecord>> {
        Ok(self.records.clone())
    }
}
