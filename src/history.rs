// src/history.rs

use crate::error::EvalError;
use crate::value::Value;

/// Append-only record of per-line results. Index `i` is the result of script line `i`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultsHistory {
    results: Vec<Value>,
}

impl ResultsHistory {
    pub fn new() -> Self {
        ResultsHistory::default()
    }

    pub(crate) fn push(&mut self, value: Value) {
        self.results.push(value);
    }

    /// Resolves a `$n` reference. Negative indices count back from the end.
    pub fn get(&self, index: i64) -> Result<&Value, EvalError> {
        let len = self.results.len() as i64;
        let absolute = if index < 0 { len + index } else { index };
        if absolute < 0 || absolute >= len {
            return Err(EvalError::InvalidResultReference(index));
        }
        Ok(&self.results[absolute as usize])
    }

    pub fn last(&self) -> Option<&Value> {
        self.results.last()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.results.iter()
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.results
    }
}
