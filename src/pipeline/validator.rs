use crate::models::{Field, Listing};
use chrono::{Datelike, Utc};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Inclusive bounds for a numeric field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Range {
    pub fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }
}

/// Splits listings into valid and invalid ones
#[derive(Debug, Clone)]
pub struct Validator {
    required_fields: Vec<Field>,
    constraints: BTreeMap<Field, Range>,
}

impl Default for Validator {
    fn default() -> Self {
        let max_year = Utc::now().year() + 1;
        Self::new(
            vec![
                Field::Title,
                Field::Price,
                Field::Year,
                Field::Mileage,
                Field::Source,
                Field::Url,
            ],
            BTreeMap::from([
                (Field::Price, Range::between(0.0, 1_000_000.0)),
                (Field::Year, Range::between(1900.0, f64::from(max_year))),
                (Field::Mileage, Range::between(0.0, 500_000.0)),
            ]),
        )
    }
}

impl Validator {
    pub fn new(required_fields: Vec<Field>, constraints: BTreeMap<Field, Range>) -> Self {
        Self {
            required_fields,
            constraints,
        }
    }

    /// Returns `(valid, invalid)`, each in input order
    pub fn validate(&self, data: Vec<Listing>) -> (Vec<Listing>, Vec<Listing>) {
        let total = data.len();
        let (valid, invalid): (Vec<Listing>, Vec<Listing>) =
            data.into_iter().partition(|item| self.is_valid(item));

        info!(
            "Validated {} items: {} valid, {} invalid",
            total,
            valid.len(),
            invalid.len()
        );
        (valid, invalid)
    }

    pub fn is_valid(&self, item: &Listing) -> bool {
        if let Some(field) = self.required_fields.iter().find(|f| !item.has(**f)) {
            warn!("Missing required field: {}", field);
            return false;
        }

        for (field, range) in &self.constraints {
            // Constraints only apply to fields that are present
            let Some(value) = item.numeric(*field) else {
                continue;
            };

            if let Some(min) = range.min {
                if value < min {
                    warn!("Field {} value {} is below minimum {}", field, value, min);
                    return false;
                }
            }
            if let Some(max) = range.max {
                if value > max {
                    warn!("Field {} value {} is above maximum {}", field, value, max);
                    return false;
                }
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(price: f64, year: i32, mileage: i64) -> Listing {
        Listing {
            title: Some("Toyota Corolla".to_string()),
            price: Some(price),
            year: Some(year),
            mileage: Some(mileage),
            source: Some("cars.com".to_string()),
            url: Some("https://www.cars.com/vehicledetail/1/".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn typical_listing_is_valid() {
        assert!(Validator::default().is_valid(&listing(15000.0, 2020, 45000)));
    }

    #[test]
    fn out_of_range_values_are_invalid() {
        let validator = Validator::default();
        assert!(!validator.is_valid(&listing(-1.0, 2020, 45000)));
        assert!(!validator.is_valid(&listing(15000.0, 1899, 45000)));
        assert!(!validator.is_valid(&listing(15000.0, 2020, 500_001)));
        assert!(!validator.is_valid(&listing(1_000_000.5, 2020, 45000)));
    }

    #[test]
    fn bounds_are_inclusive() {
        let validator = Validator::default();
        assert!(validator.is_valid(&listing(0.0, 1900, 0)));
        assert!(validator.is_valid(&listing(1_000_000.0, 2020, 500_000)));
    }

    #[test]
    fn missing_required_field_is_invalid() {
        let mut item = listing(15000.0, 2020, 45000);
        item.url = None;
        assert!(!Validator::default().is_valid(&item));
    }

    #[test]
    fn partition_preserves_order() {
        let a = listing(1.0, 2020, 1);
        let b = listing(-5.0, 2020, 1);
        let c = listing(2.0, 2020, 2);
        let d = Listing::default();

        let (valid, invalid) =
            Validator::default().validate(vec![a.clone(), b.clone(), c.clone(), d.clone()]);
        assert_eq!(valid, vec![a, c]);
        assert_eq!(invalid, vec![b, d]);
    }

    #[test]
    fn custom_rules() {
        let validator = Validator::new(
            vec![Field::Title],
            BTreeMap::from([(
                Field::Price,
                Range {
                    min: Some(5000.0),
                    max: None,
                },
            )]),
        );

        let cheap = Listing {
            title: Some("Fiat Uno".into()),
            price: Some(4999.0),
            ..Default::default()
        };
        let no_price = Listing {
            title: Some("Fiat Uno".into()),
            ..Default::default()
        };
        assert!(!validator.is_valid(&cheap));
        assert!(validator.is_valid(&no_price));
    }
}
