//! Parsing of relayed push messages carrying sensor readings

use serde::Deserialize;

use crate::models::{Origin, Reading};

/// Sender topic of widget updates; other push traffic is not ours
pub const WIDGET_SENDER: &str = "/topics/widget";

#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error("Invalid push envelope: {0}")]
    Envelope(#[source] serde_json::Error),

    #[error("Message from {0} is not a widget update")]
    ForeignSender(String),

    #[error("Widget update without {0}")]
    MissingField(&'static str),

    #[error("Invalid reading payload: {0}")]
    Payload(#[source] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct PushEnvelope {
    from: String,
    #[serde(default)]
    data: PushData,
}

#[derive(Debug, Default, Deserialize)]
struct PushData {
    topic: Option<String>,
    payload: Option<String>,
}

/// A reading relayed through the push channel
#[derive(Debug, Clone, PartialEq)]
pub struct PushUpdate {
    /// Full source topic, e.g. `room/readings`
    pub topic: String,
    pub reading: Reading,
}

/// Decode one push message
///
/// The reading itself is a JSON document embedded as a string in
/// `data.payload`; unknown fields are ignored and missing ones are zero.
pub fn parse_push_message(message: &str) -> Result<PushUpdate, PushError> {
    let envelope: PushEnvelope = serde_json::from_str(message).map_err(PushError::Envelope)?;

    if envelope.from != WIDGET_SENDER {
        return Err(PushError::ForeignSender(envelope.from));
    }

    let topic = envelope.data.topic.ok_or(PushError::MissingField("topic"))?;
    let payload = envelope
        .data
        .payload
        .ok_or(PushError::MissingField("payload"))?;

    let mut reading: Reading = serde_json::from_str(&payload).map_err(PushError::Payload)?;
    reading.origin = Origin::Push;

    Ok(PushUpdate { topic, reading })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_widget_update() {
        let message = r#"{
            "from": "/topics/widget",
            "data": {
                "topic": "room/readings",
                "payload": "{\"temperature\": 22.5, \"co2\": 640, \"timestamp\": 1700000100, \"origin\": \"scan\"}"
            }
        }"#;

        let update = parse_push_message(message).unwrap();
        assert_eq!(update.topic, "room/readings");
        assert_eq!(update.reading.temperature, 22.5);
        assert_eq!(update.reading.co2, 640.0);
        assert_eq!(update.reading.humidity, 0.0);
        assert_eq!(update.reading.timestamp, 1_700_000_100);
        assert_eq!(update.reading.origin, Origin::Push);
    }

    #[test]
    fn rejects_other_senders() {
        let message = r#"{"from": "/topics/alerts", "data": {"topic": "room", "payload": "{}"}}"#;
        assert!(matches!(
            parse_push_message(message),
            Err(PushError::ForeignSender(from)) if from == "/topics/alerts"
        ));
    }

    #[test]
    fn requires_topic_and_payload() {
        let no_topic = r#"{"from": "/topics/widget", "data": {"payload": "{}"}}"#;
        assert!(matches!(
            parse_push_message(no_topic),
            Err(PushError::MissingField("topic"))
        ));

        let no_payload = r#"{"from": "/topics/widget", "data": {"topic": "room"}}"#;
        assert!(matches!(
            parse_push_message(no_payload),
            Err(PushError::MissingField("payload"))
        ));
    }

    #[test]
    fn reports_broken_json() {
        assert!(matches!(
            parse_push_message("{"),
            Err(PushError::Envelope(_))
        ));

        let bad_payload = r#"{"from": "/topics/widget", "data": {"topic": "room", "payload": "[1, 2"}}"#;
        assert!(matches!(
            parse_push_message(bad_payload),
            Err(PushError::Payload(_))
        ));
    }
}
