//! Pipeline orchestration
//!
//! This module provides the public API for Vitaspan. It wires the stages
//! together for one synchronous pass: validate the record, derive the
//! feature row, reorder it to the model's declared feature order, run the
//! model, and encode the report.
//!
//! The model/builder feature-list check happens once, at construction. A
//! mismatch there is a fatal configuration error, never a per-request one.

use std::path::Path;

use crate::error::PredictError;
use crate::features::{FeatureBuilder, CANONICAL_FEATURES};
use crate::model::{RegressionModel, TreeEnsembleModel};
use crate::report::{PredictionReport, ReportEncoder};
use crate::schema::IndicatorRecord;

/// Predict from a model artifact and an indicator record, both as JSON.
///
/// One-shot convenience for callers that do not keep a [`Predictor`]
/// around; returns the report as pretty-printed JSON.
///
/// # Example
/// ```ignore
/// let report_json = predict_json(&model_json, &record_json)?;
/// ```
pub fn predict_json(model_json: &str, record_json: &str) -> Result<String, PredictError> {
    let model = TreeEnsembleModel::from_json(model_json)?;
    let record = IndicatorRecord::from_json(record_json)?;

    let predictor = Predictor::from_artifact(model)?;
    let report = predictor.predict(&record)?;
    serde_json::to_string_pretty(&report).map_err(PredictError::JsonError)
}

/// Verify the builder's canonical feature set against a model's declared
/// list: same arity, same names. Declared order may differ; the row is
/// reordered per prediction.
fn check_feature_compatibility(declared: &[String]) -> Result<(), PredictError> {
    let mismatch = declared.len() != CANONICAL_FEATURES.len()
        || CANONICAL_FEATURES
            .iter()
            .any(|name| !declared.iter().any(|d| d == name));

    if mismatch {
        return Err(PredictError::FeatureMismatch {
            expected: declared.join(", "),
            actual: CANONICAL_FEATURES.join(", "),
        });
    }
    Ok(())
}

/// Life-expectancy predictor holding one injected, read-only model.
///
/// Built once at startup and reused for every request; the model is never
/// mutated, so shared references are safe without locking.
pub struct Predictor<M: RegressionModel> {
    model: M,
    model_id: String,
    encoder: ReportEncoder,
}

impl<M: RegressionModel> Predictor<M> {
    /// Create a predictor, failing fast if the model's feature list does
    /// not match the feature builder's output.
    pub fn new(model: M) -> Result<Self, PredictError> {
        check_feature_compatibility(model.feature_names())?;
        Ok(Self {
            model,
            model_id: "unknown".to_string(),
            encoder: ReportEncoder::new(),
        })
    }

    /// Set the model identifier carried in report provenance
    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    /// Access the injected model
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Run one full prediction pass for a single record.
    ///
    /// Stages:
    /// 1. Record validation (schema version + indicator bounds)
    /// 2. FeatureBuilder - derive the named feature row
    /// 3. Reorder to the model's declared feature order
    /// 4. Model prediction (single row, single scalar)
    /// 5. ReportEncoder - encode value, ranking, and provenance
    pub fn predict(&self, record: &IndicatorRecord) -> Result<PredictionReport, PredictError> {
        record.validate()?;

        let row = FeatureBuilder::build(&record.indicators);
        let values = row.reordered(self.model.feature_names())?;
        let years = self.model.predict(&values)?;

        Ok(self.encoder.encode(
            record,
            &self.model_id,
            years,
            self.model.feature_names(),
            self.model.feature_importances(),
        ))
    }
}

impl Predictor<TreeEnsembleModel> {
    /// Build a predictor from a loaded artifact, adopting its model id
    pub fn from_artifact(model: TreeEnsembleModel) -> Result<Self, PredictError> {
        let model_id = model.model_id.clone();
        Ok(Self::new(model)?.with_model_id(model_id))
    }

    /// Load the artifact from disk and build a predictor. Intended to run
    /// once at process start.
    pub fn load(path: &Path) -> Result<Self, PredictError> {
        Self::from_artifact(TreeEnsembleModel::load(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RawIndicators;

    // Artifact fixture with features deliberately NOT in builder order, so
    // every test exercises the reorder step. base 70; tree 1 adds -2.0 for
    // income < 0.6 (else +3.0); tree 2 adds +1.5 for HIV_log < 1.0 (else -4.0).
    fn sample_model_json() -> &'static str {
        r#"{
            "model_version": "life.model.v1",
            "model_id": "who-2015-gbr",
            "features": [
                "Schooling",
                " BMI ",
                "HIV_log",
                "Income composition of resources",
                " thinness  1-19 years",
                "five deaths_log",
                "Adult Mortality"
            ],
            "base_score": 70.0,
            "trees": [
                {
                    "nodes": [
                        {"kind": "split", "feature": 3, "threshold": 0.6, "left": 1, "right": 2},
                        {"kind": "leaf", "value": -2.0},
                        {"kind": "leaf", "value": 3.0}
                    ]
                },
                {
                    "nodes": [
                        {"kind": "split", "feature": 2, "threshold": 1.0, "left": 1, "right": 2},
                        {"kind": "leaf", "value": 1.5},
                        {"kind": "leaf", "value": -4.0}
                    ]
                }
            ],
            "importances": [0.10, 0.05, 0.20, 0.35, 0.03, 0.12, 0.15]
        }"#
    }

    fn sample_record() -> IndicatorRecord {
        IndicatorRecord::new(RawIndicators {
            income_composition: 0.5,
            schooling_years: 10.0,
            under_five_deaths: 42.0,
            adult_mortality: 160.0,
            thinness_10_19_pct: 4.0,
            hiv_prevalence: 0.1,
            bmi: 38.0,
        })
        .with_country("Testland")
    }

    #[test]
    fn test_end_to_end_prediction() {
        let model = TreeEnsembleModel::from_json(sample_model_json()).unwrap();
        let predictor = Predictor::from_artifact(model).unwrap();

        let report = predictor.predict(&sample_record()).unwrap();

        // income 0.5 < 0.6 -> -2.0; log1p(0.1) ≈ 0.095 < 1.0 -> +1.5
        assert!((report.prediction.years - 69.5).abs() < 1e-12);
        assert_eq!(report.prediction.display, "69.50 years");
        assert_eq!(report.country.as_deref(), Some("Testland"));
        assert_eq!(report.provenance.model_id, "who-2015-gbr");
    }

    #[test]
    fn test_ranking_descends_and_covers_all_features() {
        let model = TreeEnsembleModel::from_json(sample_model_json()).unwrap();
        let predictor = Predictor::from_artifact(model).unwrap();

        let report = predictor.predict(&sample_record()).unwrap();
        let ranking = &report.importance_ranking;

        assert_eq!(ranking.len(), 7);
        assert_eq!(ranking[0].feature, "Income composition of resources");
        assert_eq!(ranking[0].rank, 1);
        for pair in ranking.windows(2) {
            assert!(pair[0].importance >= pair[1].importance);
        }
    }

    #[test]
    fn test_high_hiv_changes_branch() {
        let model = TreeEnsembleModel::from_json(sample_model_json()).unwrap();
        let predictor = Predictor::from_artifact(model).unwrap();

        let mut record = sample_record();
        // log1p(2.0) ≈ 1.099 >= 1.0 -> second tree contributes -4.0
        record.indicators.hiv_prevalence = 2.0;

        let report = predictor.predict(&record).unwrap();
        assert!((report.prediction.years - 64.0).abs() < 1e-12);
    }

    #[test]
    fn test_mismatched_model_rejected_at_construction() {
        let mut model = TreeEnsembleModel::from_json(sample_model_json()).unwrap();
        model.features[1] = "BMI".to_string(); // trained name carries padding

        assert!(matches!(
            Predictor::from_artifact(model),
            Err(PredictError::FeatureMismatch { .. })
        ));
    }

    #[test]
    fn test_out_of_range_record_rejected() {
        let model = TreeEnsembleModel::from_json(sample_model_json()).unwrap();
        let predictor = Predictor::from_artifact(model).unwrap();

        let mut record = sample_record();
        record.indicators.under_five_deaths = 3000.0;

        assert!(matches!(
            predictor.predict(&record),
            Err(PredictError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_predict_json_one_shot() {
        let record_json = serde_json::to_string(&sample_record()).unwrap();
        let report_json = predict_json(sample_model_json(), &record_json).unwrap();

        let report: serde_json::Value = serde_json::from_str(&report_json).unwrap();
        assert_eq!(report["prediction"]["display"], "69.50 years");
        assert_eq!(report["producer"]["name"], "vitaspan");
        assert_eq!(report["report_version"], "life.report.v1");
    }

    #[test]
    fn test_predictions_deterministic() {
        let model = TreeEnsembleModel::from_json(sample_model_json()).unwrap();
        let predictor = Predictor::from_artifact(model).unwrap();

        let first = predictor.predict(&sample_record()).unwrap();
        let second = predictor.predict(&sample_record()).unwrap();
        assert_eq!(first.prediction.years, second.prediction.years);
        assert_eq!(first.importance_ranking, second.importance_ranking);
    }
}
