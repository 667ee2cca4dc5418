//! JSON shapes returned by the hunt-jobs results endpoint.

use serde::Deserialize;
use serde::de::Error as _;
use serde_json::Value;

use crate::model::{NO_SUBJECT, Sample};

const UNKNOWN_SENDER: &str = "Unknown";
const UNKNOWN_ADDRESS: &str = "unknown@example.com";

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ResultsEnvelope {
    #[serde(default)]
    pub message_groups: Vec<MessageGroup>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessageGroup {
    pub id: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub flagged_rules: Vec<FlaggedRule>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Message {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub sender: Option<Party>,
    #[serde(default)]
    pub recipients: Vec<Party>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Party {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FlaggedRule {
    #[serde(default)]
    pub name: Option<String>,
}

impl From<MessageGroup> for Sample {
    fn from(group: MessageGroup) -> Self {
        let rules = group
            .flagged_rules
            .into_iter()
            .filter_map(|r| r.name)
            .collect();

        let Some(first) = group.messages.into_iter().next() else {
            return Self {
                rules,
                ..Self::new(group.id, NO_SUBJECT)
            };
        };

        let sender = first.sender.unwrap_or_default();
        let sender = format!(
            "{} <{}>",
            sender.display_name.as_deref().unwrap_or(UNKNOWN_SENDER),
            sender.email.as_deref().unwrap_or(UNKNOWN_ADDRESS),
        );

        Self {
            id: group.id,
            subject: first.subject.unwrap_or_else(|| NO_SUBJECT.to_string()),
            sender: Some(sender),
            recipients: first
                .recipients
                .into_iter()
                .map(|p| p.email.unwrap_or_else(|| UNKNOWN_ADDRESS.to_string()))
                .collect(),
            rules,
            timestamp: first.created_at,
        }
    }
}

/// Decode a results body into samples, in upstream order.
///
/// The body must be a JSON object. A bare array would otherwise decode as
/// an envelope with no message groups.
pub(crate) fn parse_results(body: &str) -> Result<Vec<Sample>, serde_json::Error> {
    let value: Value = serde_json::from_str(body)?;
    if !value.is_object() {
        return Err(serde_json::Error::custom(
            "results body is not a JSON object",
        ));
    }
    let envelope = ResultsEnvelope::deserialize(value)?;
    Ok(envelope
        .message_groups
        .into_iter()
        .map(Sample::from)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::parse_results;

    #[test]
    fn full_message_group() {
        let body = r#"{"message_groups":[{
            "id":"mg-1",
            "messages":[{
                "subject":"Invoice overdue",
                "sender":{"display_name":"Billing","email":"billing@example.net"},
                "recipients":[{"email":"a@corp.test"},{}],
                "created_at":"2024-05-01T10:00:00Z"
            }],
            "flagged_rules":[{"name":"Suspicious invoice"},{"name":null}]
        }]}"#;

        let samples = parse_results(body).unwrap();
        assert_eq!(samples.len(), 1);
        let s = &samples[0];
        assert_eq!(s.id, "mg-1");
        assert_eq!(s.subject, "Invoice overdue");
        assert_eq!(s.sender.as_deref(), Some("Billing <billing@example.net>"));
        assert_eq!(s.recipients, vec!["a@corp.test", "unknown@example.com"]);
        assert_eq!(s.rules, vec!["Suspicious invoice"]);
        assert_eq!(s.timestamp.as_deref(), Some("2024-05-01T10:00:00Z"));
    }

    #[test]
    fn group_without_messages_gets_default_subject() {
        let samples = parse_results(r#"{"message_groups":[{"id":"mg-2"}]}"#).unwrap();
        assert_eq!(samples[0].subject, "No subject");
        assert!(samples[0].sender.is_none());
    }

    #[test]
    fn missing_envelope_key_is_empty() {
        assert!(parse_results("{}").unwrap().is_empty());
        assert!(parse_results("[]").is_err());
        assert!(parse_results("[[]]").is_err());
        assert!(parse_results("null").is_err());
    }
}
