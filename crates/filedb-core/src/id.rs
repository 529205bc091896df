//! The numeric record identifier.
//!
//! Identifiers are stored on disk as plain JSON numbers under the reserved
//! `id` key. [`RecordId`] is the typed view of that number.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Store-assigned record identifier. The first record in an empty store gets 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u32);

impl RecordId {
    /// The identifier handed out when the table is empty.
    pub const FIRST: RecordId = RecordId(1);

    /// The identifier following this one, or `None` on `u32` overflow.
    pub fn next(self) -> Option<RecordId> {
        self.0.checked_add(1).map(RecordId)
    }

    /// Interprets a JSON value as an identifier.
    ///
    /// Accepts non-negative integers within `u32` range, including integral
    /// floats such as `3.0`.
    pub fn from_value(value: &Value) -> Option<RecordId> {
        let Value::Number(number) = value else {
            return None;
        };
        if let Some(n) = number.as_u64() {
            return u32::try_from(n).ok().map(RecordId);
        }
        let f = number.as_f64()?;
        if f.fract() == 0.0 && f >= 0.0 && f <= f64::from(u32::MAX) {
            Some(RecordId(f as u32))
        } else {
            None
        }
    }

    pub fn to_value(self) -> Value {
        Value::from(self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u32>().map(RecordId)
    }
}

impl From<u32> for RecordId {
    fn from(id: u32) -> Self {
        RecordId(id)
    }
}
