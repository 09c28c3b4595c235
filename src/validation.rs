//! Payload validation.
//!
//! Payloads are typed serde structs, so shape and enum checks happen during
//! deserialization. `Validate` covers the rules serde cannot express: ranges,
//! cross-field ordering, mutually exclusive fields.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

/// Validation failure with per-field messages
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    pub field_errors: HashMap<String, String>,
}

impl ValidationError {
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut field_errors = HashMap::new();
        field_errors.insert(field.into(), message.into());
        Self {
            message: "Validation failed".to_string(),
            field_errors,
        }
    }
}

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

impl<T: Validate> Validate for Option<T> {
    fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Some(inner) => inner.validate(),
            None => Ok(()),
        }
    }
}

/// Collects field errors while a payload is checked
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: HashMap<String, String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.entry(field.into()).or_insert_with(|| message.into());
    }

    /// Validate a nested payload and record its errors under `prefix.`
    pub fn nested<V: Validate>(&mut self, prefix: &str, value: &V) {
        if let Err(err) = value.validate() {
            for (field, message) in err.field_errors {
                self.add(format!("{}.{}", prefix, field), message);
            }
        }
    }

    /// Validate every element of a list, recording errors as `prefix[i].field`
    pub fn each<V: Validate>(&mut self, prefix: &str, values: &[V]) {
        for (i, value) in values.iter().enumerate() {
            self.nested(&format!("{}[{}]", prefix, i), value);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn finish(self) -> Result<(), ValidationError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                message: "Validation failed".to_string(),
                field_errors: self.errors,
            })
        }
    }

    pub fn range(&mut self, field: &str, value: Option<f64>, min: f64, max: f64) {
        if let Some(v) = value {
            if !v.is_finite() || v < min || v > max {
                self.add(field, format!("must be between {} and {}", min, max));
            }
        }
    }

    pub fn non_negative(&mut self, field: &str, value: Option<f64>) {
        if let Some(v) = value {
            if !v.is_finite() || v < 0.0 {
                self.add(field, "must be zero or greater");
            }
        }
    }

    pub fn positive(&mut self, field: &str, value: Option<f64>) {
        if let Some(v) = value {
            if !v.is_finite() || v <= 0.0 {
                self.add(field, "must be greater than zero");
            }
        }
    }

    pub fn finite(&mut self, field: &str, value: Option<f64>) {
        if let Some(v) = value {
            if !v.is_finite() {
                self.add(field, "must be a finite number");
            }
        }
    }

    pub fn not_blank(&mut self, field: &str, value: Option<&str>) {
        if let Some(v) = value {
            if v.trim().is_empty() {
                self.add(field, "must not be blank");
            }
        }
    }

    pub fn max_len(&mut self, field: &str, value: Option<&str>, max: usize) {
        if let Some(v) = value {
            if v.chars().count() > max {
                self.add(field, format!("must be at most {} characters", max));
            }
        }
    }

    pub fn tsn(&mut self, field: &str, value: Option<i32>) {
        if let Some(v) = value {
            if v <= 0 {
                self.add(field, "must be a positive ITIS TSN");
            }
        }
    }

    /// `end` must not precede `start` when both are present
    pub fn chronological(
        &mut self,
        field: &str,
        start: Option<&DateTime<Utc>>,
        end: Option<&DateTime<Utc>>,
        start_name: &str,
    ) {
        if let (Some(start), Some(end)) = (start, end) {
            if end < start {
                self.add(field, format!("must not be before {}", start_name));
            }
        }
    }

    pub fn exclusive(&mut self, field: &str, first: bool, second: bool, other: &str) {
        if first && second {
            self.add(field, format!("cannot be combined with {}", other));
        }
    }

    /// Wildlife health ids look like `17-10779` or `10-1234A`
    pub fn wlh_id(&mut self, field: &str, value: Option<&str>) {
        if let Some(v) = value {
            if !is_wlh_id(v) {
                self.add(field, "must look like NN-NNNN (two digits, dash, digits)");
            }
        }
    }
}

fn is_wlh_id(value: &str) -> bool {
    let Some((year, serial)) = value.split_once('-') else {
        return false;
    };
    let digits_end = serial.find(|c: char| !c.is_ascii_digit()).unwrap_or(serial.len());
    year.len() == 2
        && year.chars().all(|c| c.is_ascii_digit())
        && digits_end > 0
        && serial[digits_end..].chars().all(|c| c.is_ascii_alphabetic())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    struct Point {
        latitude: Option<f64>,
    }

    impl Validate for Point {
        fn validate(&self) -> Result<(), ValidationError> {
            let mut errors = FieldErrors::new();
            errors.range("latitude", self.latitude, -90.0, 90.0);
            errors.finish()
        }
    }

    #[test]
    fn wlh_ids() {
        assert!(is_wlh_id("17-10779"));
        assert!(is_wlh_id("10-1234A"));
        assert!(!is_wlh_id("1710779"));
        assert!(!is_wlh_id("171-10779"));
        assert!(!is_wlh_id("17-"));
        assert!(!is_wlh_id("17-12a3"));
    }

    #[test]
    fn range_rejects_out_of_bounds_and_nan() {
        let mut errors = FieldErrors::new();
        errors.range("latitude", Some(91.0), -90.0, 90.0);
        errors.range("longitude", Some(f64::NAN), -180.0, 180.0);
        errors.range("elevation", None, 0.0, 1.0);
        let err = errors.finish().unwrap_err();
        assert_eq!(err.field_errors.len(), 2);
        assert!(err.field_errors.contains_key("latitude"));
        assert!(err.field_errors.contains_key("longitude"));
    }

    #[test]
    fn chronological_order() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap();
        let mut errors = FieldErrors::new();
        errors.chronological("release_timestamp", Some(&start), Some(&end), "capture_timestamp");
        assert!(!errors.is_empty());

        let mut errors = FieldErrors::new();
        errors.chronological("release_timestamp", Some(&end), Some(&start), "capture_timestamp");
        assert!(errors.is_empty());
    }

    #[test]
    fn nested_lists_are_prefixed() {
        let points = vec![Point { latitude: Some(10.0) }, Point { latitude: Some(-100.0) }];
        let mut errors = FieldErrors::new();
        errors.each("locations", &points);
        let err = errors.finish().unwrap_err();
        assert!(err.field_errors.contains_key("locations[1].latitude"));
        assert_eq!(err.field_errors.len(), 1);
    }

    #[test]
    fn first_error_per_field_wins() {
        let mut errors = FieldErrors::new();
        errors.add("sex", "first");
        errors.add("sex", "second");
        let err = errors.finish().unwrap_err();
        assert_eq!(err.field_errors["sex"], "first");
    }
}
