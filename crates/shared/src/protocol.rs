use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::InputState;

/// Body of `POST /predict`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub domain: String,
    #[serde(rename = "datasetSize")]
    pub dataset_size: String,
}

impl From<&InputState> for PredictionRequest {
    fn from(value: &InputState) -> Self {
        Self {
            domain: value.domain.clone(),
            dataset_size: value.dataset_size.clone(),
        }
    }
}

/// Successful reply from the prediction service.
///
/// `colour_prediction` keeps its wire name here; only the renderer treats it
/// as a display colour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub prediction: PredictionValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colour_prediction: Option<String>,
}

/// The service answers with a bare number or a (possibly nested) list of
/// numbers; regression output is commonly a one-element list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredictionValue {
    Scalar(f64),
    Series(Vec<PredictionValue>),
}

/// Numbers print the way JavaScript's `String(n)` does (`1e+21`, `1e-7`,
/// `0` for negative zero); lists join their elements with `,`, nested lists
/// flattening the same way.
impl fmt::Display for PredictionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(value) => f.write_str(ryu_js::Buffer::new().format(*value)),
            Self::Series(values) => {
                for (idx, value) in values.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{value}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
