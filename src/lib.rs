//! Vitaspan - Life-expectancy inference engine over national health indicators
//!
//! Vitaspan turns seven raw health/economic indicators for a country into a
//! single life-expectancy prediction through a deterministic pipeline:
//! bounds validation → feature derivation → model inference → report encoding.
//!
//! The regression model itself is an external collaborator: a pre-trained
//! tree-ensemble artifact loaded once at startup and injected into the
//! [`Predictor`](predictor::Predictor). Vitaspan never trains or mutates it.

pub mod chart;
pub mod error;
pub mod features;
pub mod model;
pub mod predictor;
pub mod report;
pub mod schema;

pub use error::PredictError;
pub use features::{FeatureBuilder, FeatureVector};
pub use model::{RegressionModel, TreeEnsembleModel};
pub use predictor::{predict_json, Predictor};
pub use report::PredictionReport;

// Schema exports
pub use schema::{IndicatorRecord, RawIndicators, SCHEMA_VERSION};

/// Vitaspan version embedded in all prediction reports
pub const VITASPAN_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for prediction reports
pub const PRODUCER_NAME: &str = "vitaspan";
