//! Report encoding
//!
//! This module encodes one prediction into the `life.report.v1` payload:
//! the scalar with its two-decimal display string, the importance ranking
//! sorted descending, and producer/provenance metadata.

use std::cmp::Ordering;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::IndicatorRecord;
use crate::{PRODUCER_NAME, VITASPAN_VERSION};

/// Current report schema version
pub const REPORT_VERSION: &str = "life.report.v1";

/// Report producer metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Report provenance information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProvenance {
    /// Identifier of the model artifact that produced the prediction
    pub model_id: String,
    /// Input schema the record was validated against
    pub input_schema: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_at_utc: Option<String>,
    pub computed_at_utc: String,
}

/// The predicted value and its fixed display form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictedValue {
    /// Predicted life expectancy in years
    pub years: f64,
    /// Two-decimal display string, e.g. "71.23 years"
    pub display: String,
}

/// One entry of the importance ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportanceEntry {
    /// 1-based position in the descending ranking
    pub rank: usize,
    /// Trained feature column name
    pub feature: String,
    /// Importance score as reported by the model (relative, unnormalized)
    pub importance: f64,
}

/// Complete prediction report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionReport {
    pub report_version: String,
    pub producer: ReportProducer,
    pub provenance: ReportProvenance,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub prediction: PredictedValue,
    /// Importance scores sorted descending
    pub importance_ranking: Vec<ImportanceEntry>,
}

/// Sort (feature, importance) pairs descending and assign 1-based ranks.
///
/// Equal scores keep the model's declared order (stable sort), so rank
/// output is deterministic for any input permutation.
pub fn rank_importances(names: &[String], scores: &[f64]) -> Vec<ImportanceEntry> {
    let mut pairs: Vec<(&String, f64)> = names.iter().zip(scores.iter().copied()).collect();
    pairs.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    pairs
        .into_iter()
        .enumerate()
        .map(|(i, (feature, importance))| ImportanceEntry {
            rank: i + 1,
            feature: feature.clone(),
            importance,
        })
        .collect()
}

/// Report encoder for producing `life.report.v1` payloads
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Encode one prediction into a report payload
    pub fn encode(
        &self,
        record: &IndicatorRecord,
        model_id: &str,
        years: f64,
        feature_names: &[String],
        importances: &[f64],
    ) -> PredictionReport {
        let producer = ReportProducer {
            name: PRODUCER_NAME.to_string(),
            version: VITASPAN_VERSION.to_string(),
            instance_id: self.instance_id.clone(),
        };

        let provenance = ReportProvenance {
            model_id: model_id.to_string(),
            input_schema: record.schema_version.clone(),
            observed_at_utc: record.observed_at.map(|t| t.to_rfc3339()),
            computed_at_utc: Utc::now().to_rfc3339(),
        };

        let prediction = PredictedValue {
            years,
            display: format!("{years:.2} years"),
        };

        PredictionReport {
            report_version: REPORT_VERSION.to_string(),
            producer,
            provenance,
            country: record.country.clone(),
            prediction,
            importance_ranking: rank_importances(feature_names, importances),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RawIndicators;

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

    fn names(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_display_has_two_decimals() {
        let encoder = ReportEncoder::with_instance_id("report-test".to_string());
        let report = encoder.encode(
            &sample_record(),
            "model-1",
            71.2345,
            &names(&["a", "b"]),
            &[0.7, 0.3],
        );

        assert_eq!(report.prediction.display, "71.23 years");
        assert_eq!(report.report_version, REPORT_VERSION);
        assert_eq!(report.country.as_deref(), Some("Testland"));
        assert_eq!(report.provenance.model_id, "model-1");
    }

    #[test]
    fn test_display_pads_to_two_decimals() {
        let encoder = ReportEncoder::new();
        let report =
            encoder.encode(&sample_record(), "m", 68.0, &names(&["a"]), &[1.0]);
        assert_eq!(report.prediction.display, "68.00 years");
    }

    #[test]
    fn test_ranking_sorted_descending() {
        let ranking = rank_importances(
            &names(&["low", "high", "mid"]),
            &[0.1, 0.6, 0.3],
        );

        assert_eq!(ranking[0].feature, "high");
        assert_eq!(ranking[1].feature, "mid");
        assert_eq!(ranking[2].feature, "low");
        assert_eq!(ranking[0].rank, 1);
        assert_eq!(ranking[2].rank, 3);
    }

    #[test]
    fn test_ranking_non_increasing_for_any_permutation() {
        let name_list = names(&["a", "b", "c", "d"]);
        let permutations: [[f64; 4]; 4] = [
            [0.4, 0.3, 0.2, 0.1],
            [0.1, 0.2, 0.3, 0.4],
            [0.3, 0.1, 0.4, 0.2],
            [0.2, 0.2, 0.2, 0.2],
        ];

        for scores in permutations {
            let ranking = rank_importances(&name_list, &scores);
            for pair in ranking.windows(2) {
                assert!(pair[0].importance >= pair[1].importance);
            }
        }
    }

    #[test]
    fn test_ties_keep_declared_order() {
        let ranking = rank_importances(&names(&["first", "second"]), &[0.5, 0.5]);
        assert_eq!(ranking[0].feature, "first");
        assert_eq!(ranking[1].feature, "second");
    }

    #[test]
    fn test_report_serializes_to_json() {
        let encoder = ReportEncoder::with_instance_id("fixed".to_string());
        let report = encoder.encode(
            &sample_record(),
            "model-1",
            71.0,
            &names(&["a"]),
            &[1.0],
        );
        let json = serde_json::to_string(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["producer"]["name"], "vitaspan");
        assert_eq!(value["producer"]["instance_id"], "fixed");
        assert_eq!(value["prediction"]["display"], "71.00 years");
    }
}
