//! User identity as handed over by the auth layer.
//!
//! Authentication itself lives outside this subsystem; checkout only needs
//! the authenticated identity object the backend returned at login.

use serde::{Deserialize, Serialize};

use crave_dine_core::{Address, UserId};

/// An authenticated user.
///
/// The backend serializes users with a Mongo-style `_id` and `username`;
/// every profile field beyond the id is optional, with prefill fallbacks
/// applied at checkout time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: UserId,
    #[serde(default, alias = "username")]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
    /// Saved delivery address, if the user has captured one.
    #[serde(default)]
    pub address: Option<Address>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserializes_backend_shape() {
        let json = r#"{
            "_id": "64fa01",
            "username": "asha",
            "email": "asha@example.com"
        }"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, UserId::new("64fa01"));
        assert_eq!(user.name.as_deref(), Some("asha"));
        assert!(user.address.is_none());
    }

    #[test]
    fn test_accepts_name_field_too() {
        let json = r#"{ "_id": "64fa02", "name": "ravi" }"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.name.as_deref(), Some("ravi"));
    }
}
