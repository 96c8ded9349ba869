//! Core data models for the serving path

use serde::{Deserialize, Serialize};

/// Currency attached to every prediction. Fixed for this domain.
pub const CURRENCY: &str = "USD";

/// Feature names in canonical order, matching the training dataset columns.
pub const FEATURE_NAMES: [&str; 6] = [
    "area",
    "bedrooms",
    "bathrooms",
    "stories",
    "mainroad",
    "guestroom",
];

/// Input feature record for a single prediction.
///
/// The field set is fixed. Unknown fields are rejected rather than ignored,
/// and missing or mistyped fields fail deserialization before any model
/// invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeatureRecord {
    pub area: f64,
    pub bedrooms: i64,
    pub bathrooms: i64,
    pub stories: i64,
    /// 1 if the house fronts a main road, 0 otherwise
    pub mainroad: i64,
    /// 1 if the house has a guest room, 0 otherwise
    pub guestroom: i64,
}

impl FeatureRecord {
    /// Validate a raw JSON payload against the fixed schema.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value.clone())
    }

    /// Look up a feature value by its canonical name.
    pub fn feature(&self, name: &str) -> Option<f64> {
        match name {
            "area" => Some(self.area),
            "bedrooms" => Some(self.bedrooms as f64),
            "bathrooms" => Some(self.bathrooms as f64),
            "stories" => Some(self.stories as f64),
            "mainroad" => Some(self.mainroad as f64),
            "guestroom" => Some(self.guestroom as f64),
            _ => None,
        }
    }

    /// Feature values in canonical order.
    pub fn to_vector(&self) -> [f64; 6] {
        [
            self.area,
            self.bedrooms as f64,
            self.bathrooms as f64,
            self.stories as f64,
            self.mainroad as f64,
            self.guestroom as f64,
        ]
    }
}

/// Prediction response returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub prediction: f64,
    pub currency: String,
}

impl Prediction {
    pub fn new(value: f64) -> Self {
        Self {
            prediction: value,
            currency: CURRENCY.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_payload() -> serde_json::Value {
        json!({
            "area": 3000.0,
            "bedrooms": 3,
            "bathrooms": 2,
            "stories": 1,
            "mainroad": 1,
            "guestroom": 0
        })
    }

    #[test]
    fn test_valid_record_parses() {
        let record = FeatureRecord::from_value(&valid_payload()).unwrap();
        assert_eq!(record.area, 3000.0);
        assert_eq!(record.bedrooms, 3);
        assert_eq!(record.guestroom, 0);
    }

    #[test]
    fn test_integer_area_accepted_as_float() {
        let mut payload = valid_payload();
        payload["area"] = json!(3000);
        let record = FeatureRecord::from_value(&payload).unwrap();
        assert_eq!(record.area, 3000.0);
    }

    #[test]
    fn test_missing_field_rejected() {
        let mut payload = valid_payload();
        payload.as_object_mut().unwrap().remove("bedrooms");
        assert!(FeatureRecord::from_value(&payload).is_err());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let mut payload = valid_payload();
        payload["garden"] = json!(1);
        assert!(FeatureRecord::from_value(&payload).is_err());
    }

    #[test]
    fn test_wrong_type_rejected() {
        let mut payload = valid_payload();
        payload["bedrooms"] = json!("three");
        assert!(FeatureRecord::from_value(&payload).is_err());
    }

    #[test]
    fn test_float_for_int_field_rejected() {
        let mut payload = valid_payload();
        payload["stories"] = json!(1.5);
        assert!(FeatureRecord::from_value(&payload).is_err());
    }

    #[test]
    fn test_feature_lookup_matches_vector_order() {
        let record = FeatureRecord::from_value(&valid_payload()).unwrap();
        let vector = record.to_vector();
        for (name, expected) in FEATURE_NAMES.iter().zip(vector.iter()) {
            assert_eq!(record.feature(name), Some(*expected));
        }
        assert_eq!(record.feature("unknown"), None);
    }

    #[test]
    fn test_prediction_carries_fixed_currency() {
        let prediction = Prediction::new(4_250_000.0);
        assert_eq!(prediction.currency, "USD");
    }
}
