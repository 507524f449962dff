use serde::{Deserialize, Serialize};

pub use crate::repositories::mappings::ChargerMapping;

/// Public view of a mapping; timestamps stay internal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MappingSummary {
    pub name: String,
    pub serial: String,
}

impl From<ChargerMapping> for MappingSummary {
    fn from(mapping: ChargerMapping) -> Self {
        Self {
            name: mapping.name,
            serial: mapping.serial,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusMessage {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl StatusMessage {
    pub fn new(status: &'static str) -> Self {
        Self { status, name: None }
    }

    pub fn with_name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }
}
