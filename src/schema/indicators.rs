//! health.indicators.v1 schema definition
//!
//! One record carries the seven raw indicators for a single country:
//! - Economic/education: income composition index, mean schooling years
//! - Mortality: under-five deaths, adult mortality rate
//! - Health/body: adolescent thinness, HIV/AIDS prevalence, mean BMI
//!
//! Every indicator has fixed bounds taken from the range of the training
//! data. Bounds are enforced by [`IndicatorRecord::validate`] before any
//! value reaches the feature builder; the builder itself is total over
//! validated input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PredictError;

/// Current schema version
pub const SCHEMA_VERSION: &str = "health.indicators.v1";

/// Closed numeric range for one indicator. `step` is the collection
/// granularity (slider/spinner increment) and is advisory; only `min` and
/// `max` are hard validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl Bounds {
    /// Check a value against this range, tagging errors with the field name.
    pub fn check(&self, field: &'static str, value: f64) -> Result<(), PredictError> {
        if !value.is_finite() {
            return Err(PredictError::NonFinite(field));
        }
        if value < self.min || value > self.max {
            return Err(PredictError::OutOfRange {
                field,
                value,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Income composition of resources index (HDI component, unitless)
pub const INCOME_COMPOSITION_BOUNDS: Bounds = Bounds { min: 0.0, max: 1.0, step: 0.01 };
/// Mean years of schooling
pub const SCHOOLING_BOUNDS: Bounds = Bounds { min: 0.0, max: 20.7, step: 0.1 };
/// Under-five deaths (count per country-year)
pub const UNDER_FIVE_DEATHS_BOUNDS: Bounds = Bounds { min: 0.0, max: 2500.0, step: 1.0 };
/// Adult mortality (deaths per 1,000 population aged 15-60)
pub const ADULT_MORTALITY_BOUNDS: Bounds = Bounds { min: 1.0, max: 723.0, step: 1.0 };
/// Prevalence of thinness, ages 10-19 (%)
pub const THINNESS_BOUNDS: Bounds = Bounds { min: 0.0, max: 27.7, step: 0.1 };
/// HIV/AIDS prevalence (deaths per 1,000 live births, 0-4 years)
pub const HIV_PREVALENCE_BOUNDS: Bounds = Bounds { min: 0.0, max: 50.6, step: 0.1 };
/// Mean body-mass index of adult population
pub const BMI_BOUNDS: Bounds = Bounds { min: 0.0, max: 87.0, step: 0.1 };

/// The seven raw indicator values for one country
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawIndicators {
    /// Income composition of resources index (0-1)
    pub income_composition: f64,
    /// Mean years of schooling
    pub schooling_years: f64,
    /// Under-five deaths (count)
    pub under_five_deaths: f64,
    /// Adult mortality per 1,000
    pub adult_mortality: f64,
    /// Thinness prevalence ages 10-19 (%)
    pub thinness_10_19_pct: f64,
    /// HIV/AIDS prevalence
    pub hiv_prevalence: f64,
    /// Mean BMI
    pub bmi: f64,
}

impl RawIndicators {
    /// Validate every indicator against its declared bounds.
    ///
    /// Returns the first violation found; fields are checked in declaration
    /// order so error output is stable.
    pub fn validate(&self) -> Result<(), PredictError> {
        INCOME_COMPOSITION_BOUNDS.check("income_composition", self.income_composition)?;
        SCHOOLING_BOUNDS.check("schooling_years", self.schooling_years)?;
        UNDER_FIVE_DEATHS_BOUNDS.check("under_five_deaths", self.under_five_deaths)?;
        ADULT_MORTALITY_BOUNDS.check("adult_mortality", self.adult_mortality)?;
        THINNESS_BOUNDS.check("thinness_10_19_pct", self.thinness_10_19_pct)?;
        HIV_PREVALENCE_BOUNDS.check("hiv_prevalence", self.hiv_prevalence)?;
        BMI_BOUNDS.check("bmi", self.bmi)?;
        Ok(())
    }

    /// All violations rather than just the first, for validation reports.
    pub fn violations(&self) -> Vec<PredictError> {
        let checks = [
            INCOME_COMPOSITION_BOUNDS.check("income_composition", self.income_composition),
            SCHOOLING_BOUNDS.check("schooling_years", self.schooling_years),
            UNDER_FIVE_DEATHS_BOUNDS.check("under_five_deaths", self.under_five_deaths),
            ADULT_MORTALITY_BOUNDS.check("adult_mortality", self.adult_mortality),
            THINNESS_BOUNDS.check("thinness_10_19_pct", self.thinness_10_19_pct),
            HIV_PREVALENCE_BOUNDS.check("hiv_prevalence", self.hiv_prevalence),
            BMI_BOUNDS.check("bmi", self.bmi),
        ];
        checks.into_iter().filter_map(Result::err).collect()
    }
}

/// Versioned input envelope for a prediction request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorRecord {
    /// Must equal [`SCHEMA_VERSION`]
    pub schema_version: String,
    /// Country label, carried through to the report verbatim
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// When the indicator values were observed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_at: Option<DateTime<Utc>>,
    /// The raw indicator values
    pub indicators: RawIndicators,
}

impl IndicatorRecord {
    /// Create a record with the current schema version
    pub fn new(indicators: RawIndicators) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            country: None,
            observed_at: None,
            indicators,
        }
    }

    /// Add a country label to the record
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    /// Add an observation timestamp to the record
    pub fn with_observed_at(mut self, observed_at: DateTime<Utc>) -> Self {
        self.observed_at = Some(observed_at);
        self
    }

    /// Validate the record: schema version first, then indicator bounds.
    pub fn validate(&self) -> Result<(), PredictError> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(PredictError::InvalidSchemaVersion {
                expected: SCHEMA_VERSION.to_string(),
                actual: self.schema_version.clone(),
            });
        }
        self.indicators.validate()
    }

    /// Parse and validate a record from a JSON document
    pub fn from_json(json: &str) -> Result<Self, PredictError> {
        let record: IndicatorRecord = serde_json::from_str(json)?;
        record.validate()?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_indicators() -> RawIndicators {
        RawIndicators {
            income_composition: 0.5,
            schooling_years: 10.0,
            under_five_deaths: 42.0,
            adult_mortality: 160.0,
            thinness_10_19_pct: 4.0,
            hiv_prevalence: 0.1,
            bmi: 38.0,
        }
    }

    #[test]
    fn test_valid_record_round_trip() {
        let record = IndicatorRecord::new(sample_indicators()).with_country("Testland");
        let json = serde_json::to_string(&record).unwrap();
        let parsed = IndicatorRecord::from_json(&json).unwrap();

        assert_eq!(parsed.schema_version, SCHEMA_VERSION);
        assert_eq!(parsed.country.as_deref(), Some("Testland"));
        assert_eq!(parsed.indicators, record.indicators);
    }

    #[test]
    fn test_bounds_at_extremes_are_valid() {
        let mut indicators = sample_indicators();
        indicators.under_five_deaths = 0.0;
        indicators.hiv_prevalence = 50.6;
        indicators.adult_mortality = 723.0;
        assert!(indicators.validate().is_ok());

        indicators.under_five_deaths = 2500.0;
        indicators.schooling_years = 20.7;
        assert!(indicators.validate().is_ok());
    }

    #[test]
    fn test_out_of_range_rejected() {
        let mut indicators = sample_indicators();
        indicators.bmi = 90.0;

        match indicators.validate() {
            Err(PredictError::OutOfRange { field, max, .. }) => {
                assert_eq!(field, "bmi");
                assert_eq!(max, 87.0);
            }
            other => panic!("expected OutOfRange, got {other:?}"),
        }
    }

    #[test]
    fn test_adult_mortality_zero_rejected() {
        // Adult mortality is a rate with min 1, not 0
        let mut indicators = sample_indicators();
        indicators.adult_mortality = 0.0;
        assert!(indicators.validate().is_err());
    }

    #[test]
    fn test_nan_rejected() {
        let mut indicators = sample_indicators();
        indicators.hiv_prevalence = f64::NAN;

        match indicators.validate() {
            Err(PredictError::NonFinite(field)) => assert_eq!(field, "hiv_prevalence"),
            other => panic!("expected NonFinite, got {other:?}"),
        }
    }

    #[test]
    fn test_violations_collects_all() {
        let mut indicators = sample_indicators();
        indicators.income_composition = 1.5;
        indicators.thinness_10_19_pct = -1.0;

        let violations = indicators.violations();
        assert_eq!(violations.len(), 2);
    }

    #[test]
    fn test_wrong_schema_version_rejected() {
        let mut record = IndicatorRecord::new(sample_indicators());
        record.schema_version = "health.indicators.v0".to_string();

        assert!(matches!(
            record.validate(),
            Err(PredictError::InvalidSchemaVersion { .. })
        ));
    }
}
