//! Delivery address type.
//!
//! Field names follow the backend's camelCase JSON contract so serialized
//! addresses can be sent to `PUT /auth/address` and embedded in payment
//! verification bodies without translation.

use serde::{Deserialize, Serialize};

/// Errors from validating an [`Address`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// A required field is empty or missing.
    #[error("address field '{0}' is required")]
    MissingField(&'static str),
}

/// A delivery address.
///
/// `houseName`, `street`, `city`, `state`, and `zipCode` are required;
/// `country` defaults to "India" when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub house_name: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    #[serde(default = "default_country")]
    pub country: String,
}

fn default_country() -> String {
    "India".to_owned()
}

impl Default for Address {
    fn default() -> Self {
        Self {
            house_name: String::new(),
            street: String::new(),
            city: String::new(),
            state: String::new(),
            zip_code: String::new(),
            country: default_country(),
        }
    }
}

impl Address {
    /// Check that all required fields are filled in.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::MissingField` naming the first empty required
    /// field, in form order.
    pub fn validate(&self) -> Result<(), AddressError> {
        let required: [(&'static str, &str); 5] = [
            ("houseName", &self.house_name),
            ("street", &self.street),
            ("city", &self.city),
            ("state", &self.state),
            ("zipCode", &self.zip_code),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(AddressError::MissingField(name));
            }
        }
        Ok(())
    }

    /// Whether the address is usable for delivery routing.
    ///
    /// The checkout gate only requires a street; full validation happens in
    /// the address-capture form before saving.
    #[must_use]
    pub fn has_street(&self) -> bool {
        !self.street.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> Address {
        Address {
            house_name: "Rose Villa".to_owned(),
            street: "12 MG Road".to_owned(),
            city: "Bengaluru".to_owned(),
            state: "Karnataka".to_owned(),
            zip_code: "560001".to_owned(),
            country: "India".to_owned(),
        }
    }

    #[test]
    fn test_complete_address_validates() {
        assert!(complete().validate().is_ok());
    }

    #[test]
    fn test_missing_required_field_named() {
        let mut addr = complete();
        addr.zip_code = "  ".to_owned();
        assert_eq!(
            addr.validate(),
            Err(AddressError::MissingField("zipCode"))
        );
    }

    #[test]
    fn test_country_defaults_to_india() {
        let json = r#"{
            "houseName": "Rose Villa",
            "street": "12 MG Road",
            "city": "Bengaluru",
            "state": "Karnataka",
            "zipCode": "560001"
        }"#;
        let addr: Address = serde_json::from_str(json).unwrap();
        assert_eq!(addr.country, "India");
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(complete()).unwrap();
        assert!(json.get("houseName").is_some());
        assert!(json.get("zipCode").is_some());
        assert!(json.get("house_name").is_none());
    }

    #[test]
    fn test_has_street_gate() {
        assert!(complete().has_street());
        assert!(!Address::default().has_street());
    }
}
