//! REST wire contract shared by the `checkin` client and the `checkind` backend.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Multipart field carrying the JPEG capture.
pub const FIELD_IMAGE: &str = "image";
/// Multipart field carrying the selected event id.
pub const FIELD_EVENT_ID: &str = "event_id";
/// Multipart field carrying the person's name (registration only).
pub const FIELD_NAME: &str = "name";
/// File name attached to uploaded captures.
pub const CAPTURE_FILE_NAME: &str = "face.jpg";

/// Identifier of an admin-managed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub i64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EventId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(EventId)
    }
}

/// An event as listed by `GET /admin/events`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub name: String,
}

/// Body of `POST /admin/events` and `PUT /admin/events/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventName {
    /// A missing or `null` name reads as empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Acknowledgement returned by admin mutations. The client ignores it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ack {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EventId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Error payload carried by non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Person returned by a positive identification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedUser {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    pub event_name: String,
}

/// Body of `POST /identify` responses.
///
/// Every field defaults, so an error payload such as `{"error": ...}`
/// reads as a non-match without a message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdentifyResponse {
    #[serde(rename = "match", default)]
    pub matched: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<MatchedUser>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl IdentifyResponse {
    pub fn no_match(message: impl Into<String>) -> Self {
        Self {
            matched: false,
            user: None,
            message: Some(message.into()),
        }
    }
}

/// Body of a successful `POST /register`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterResponse {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    pub event_name: String,
}

/// Row of `GET /admin/faces`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceSummary {
    pub id: i64,
    pub name: String,
    pub event_id: EventId,
    pub event_name: String,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identify_match_uses_reserved_key() {
        let body = r#"{"match": true, "user": {"id": 4, "name": "Ann", "event_name": "Expo"}}"#;
        let parsed: IdentifyResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.matched);
        assert_eq!(parsed.user.unwrap().name, "Ann");

        let json = serde_json::to_value(IdentifyResponse::no_match("No match")).unwrap();
        assert_eq!(json["match"], false);
        assert_eq!(json["message"], "No match");
        assert!(json.get("user").is_none());
    }

    #[test]
    fn test_identify_error_payload_reads_as_no_match() {
        let parsed: IdentifyResponse =
            serde_json::from_str(r#"{"error": "Image and event required"}"#).unwrap();
        assert!(!parsed.matched);
        assert!(parsed.message.is_none());
    }

    #[test]
    fn test_event_id_parses_form_text() {
        assert_eq!(" 12 ".parse::<EventId>().unwrap(), EventId(12));
        assert!("abc".parse::<EventId>().is_err());
    }

    #[test]
    fn test_event_list_shape() {
        let events: Vec<Event> = serde_json::from_str(r#"[{"id": 1, "name": "Expo"}]"#).unwrap();
        assert_eq!(events, vec![Event { id: EventId(1), name: "Expo".into() }]);
    }

    #[test]
    fn test_null_or_missing_event_name_reads_as_empty() {
        let null: EventName = serde_json::from_str(r#"{"name": null}"#).unwrap();
        assert!(null.name.is_empty());
        let missing: EventName = serde_json::from_str("{}").unwrap();
        assert!(missing.name.is_empty());
        assert!(serde_json::from_str::<EventName>(r#"{"name": 5}"#).is_err());
    }
}
