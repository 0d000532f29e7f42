//! Feature derivation
//!
//! This module maps validated raw indicators into the named feature row the
//! regression model was trained on:
//! - `log1p` on under-five deaths and HIV prevalence (both right-skewed counts)
//! - identity on the remaining five indicators
//!
//! The feature names below are the model's trained column names and are an
//! external contract, whitespace included. They must never be normalized or
//! re-derived; the [`Predictor`](crate::predictor::Predictor) fails at
//! construction if the loaded artifact disagrees.

use serde::{Deserialize, Serialize};

use crate::error::PredictError;
use crate::schema::RawIndicators;

/// Trained column name: income composition index
pub const FEATURE_INCOME_COMPOSITION: &str = "Income composition of resources";
/// Trained column name: log1p-transformed HIV prevalence
pub const FEATURE_HIV_LOG: &str = "HIV_log";
/// Trained column name: mean BMI (padded spaces are part of the name)
pub const FEATURE_BMI: &str = " BMI ";
/// Trained column name: adult mortality rate
pub const FEATURE_ADULT_MORTALITY: &str = "Adult Mortality";
/// Trained column name: log1p-transformed under-five deaths
pub const FEATURE_FIVE_DEATHS_LOG: &str = "five deaths_log";
/// Trained column name: mean schooling years
pub const FEATURE_SCHOOLING: &str = "Schooling";
/// Trained column name: adolescent thinness (double space is part of the name)
pub const FEATURE_THINNESS: &str = " thinness  1-19 years";

/// The builder's canonical feature names, in builder order.
///
/// Set equality with the model's declared list is required; positional
/// order may differ and is reconciled by [`FeatureVector::reordered`].
pub const CANONICAL_FEATURES: [&str; 7] = [
    FEATURE_INCOME_COMPOSITION,
    FEATURE_HIV_LOG,
    FEATURE_BMI,
    FEATURE_ADULT_MORTALITY,
    FEATURE_FIVE_DEATHS_LOG,
    FEATURE_SCHOOLING,
    FEATURE_THINNESS,
];

/// A single named feature row for one prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    entries: Vec<(String, f64)>,
}

impl FeatureVector {
    /// Feature names in builder order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Look up a feature value by its trained column name
    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    /// Number of features in the row
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Re-order values to match the model's declared feature order.
    ///
    /// Fails fast if the model names a feature this row does not carry or
    /// the arities differ. A mismatch here is a configuration error between
    /// builder and artifact, not a per-request condition.
    pub fn reordered(&self, order: &[String]) -> Result<Vec<f64>, PredictError> {
        if order.len() != self.entries.len() {
            return Err(PredictError::FeatureMismatch {
                expected: order.join(", "),
                actual: self.names().collect::<Vec<_>>().join(", "),
            });
        }

        order
            .iter()
            .map(|name| {
                self.get(name)
                    .ok_or_else(|| PredictError::UnknownFeature(name.clone()))
            })
            .collect()
    }
}

/// Feature builder: pure mapping from raw indicators to a feature row
pub struct FeatureBuilder;

impl FeatureBuilder {
    /// Build the feature row for one set of validated indicators.
    ///
    /// Pure and total over in-range input; callers are expected to have
    /// run [`RawIndicators::validate`] first.
    pub fn build(indicators: &RawIndicators) -> FeatureVector {
        let entries = vec![
            (
                FEATURE_INCOME_COMPOSITION.to_string(),
                indicators.income_composition,
            ),
            (FEATURE_HIV_LOG.to_string(), indicators.hiv_prevalence.ln_1p()),
            (FEATURE_BMI.to_string(), indicators.bmi),
            (
                FEATURE_ADULT_MORTALITY.to_string(),
                indicators.adult_mortality,
            ),
            (
                FEATURE_FIVE_DEATHS_LOG.to_string(),
                indicators.under_five_deaths.ln_1p(),
            ),
            (FEATURE_SCHOOLING.to_string(), indicators.schooling_years),
            (FEATURE_THINNESS.to_string(), indicators.thinness_10_19_pct),
        ];

        FeatureVector { entries }
    }
}
