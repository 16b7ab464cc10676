use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A user record. Missing fields decode as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub first_name: String,
    pub last_name: String,
    pub biography: String,
}

/// Everything a successful response can carry under `data`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Id(String),
    User(User),
    Users(HashMap<String, User>),
}

/// Uniform response body: `{"data": ...}` or `{"error": "..."}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Envelope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Payload>,
}

impl Envelope {
    pub fn data(payload: Payload) -> Self {
        Self {
            error: None,
            data: Some(payload),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn user_decodes_with_missing_and_unknown_fields() {
        let user: User = serde_json::from_str(r#"{"first_name":"Ada","age":36}"#).unwrap();
        assert_eq!(
            user,
            User {
                first_name: "Ada".into(),
                ..User::default()
            }
        );
    }

    #[test]
    fn user_rejects_non_object_json() {
        assert!(serde_json::from_str::<User>(r#""Ada""#).is_err());
        assert!(serde_json::from_str::<User>("").is_err());
    }

    #[test]
    fn envelope_omits_absent_fields() {
        let body = serde_json::to_value(Envelope::data(Payload::Id("abc".into()))).unwrap();
        assert_eq!(body, json!({ "data": "abc" }));

        let body = serde_json::to_value(Envelope::error("nope")).unwrap();
        assert_eq!(body, json!({ "error": "nope" }));
    }

    #[test]
    fn empty_listing_still_serializes_data() {
        let body = serde_json::to_value(Envelope::data(Payload::Users(HashMap::new()))).unwrap();
        assert_eq!(body, json!({ "data": {} }));
    }
}
