use serde::{Deserialize, Serialize};

/// Storage key for the selected domain.
pub const DOMAIN_KEY: &str = "domain";
/// Storage key for the dataset size field.
pub const DATASET_SIZE_KEY: &str = "datasetSize";

/// The two form values exactly as the user left them.
///
/// Neither field is trimmed or parsed; an empty `dataset_size` is a valid
/// state and is forwarded untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputState {
    pub domain: String,
    #[serde(rename = "datasetSize")]
    pub dataset_size: String,
}

impl InputState {
    pub fn new(domain: impl Into<String>, dataset_size: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            dataset_size: dataset_size.into(),
        }
    }
}

/// Values read back from the persisted store, one slot per key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedInputs {
    pub domain: Option<String>,
    pub dataset_size: Option<String>,
}

impl PersistedInputs {
    pub fn is_empty(&self) -> bool {
        self.domain.is_none() && self.dataset_size.is_none()
    }

    /// Overlays stored values onto form defaults.
    ///
    /// A stored empty string counts as absent, so a control that was cleared
    /// before the last submission comes back with its default.
    pub fn apply_to(&self, defaults: &InputState) -> InputState {
        InputState {
            domain: non_empty(self.domain.as_deref()).unwrap_or(&defaults.domain).to_string(),
            dataset_size: non_empty(self.dataset_size.as_deref())
                .unwrap_or(&defaults.dataset_size)
                .to_string(),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
