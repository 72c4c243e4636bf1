use serde::{Deserialize, Serialize};

/// A candidate start time (`HH:MM`) and whether anyone can take it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Slot {
    pub time: String,
    pub available: bool,
}
