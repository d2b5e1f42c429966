//! UI layer: the prediction form and CSS colour handling.

pub mod app;
pub mod colour;

pub use app::PredictionApp;
