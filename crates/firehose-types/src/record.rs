//! Stream records decoded from JSON lines.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One JSON object from the stream that carries a text and a user identity.
///
/// Everything else on the stream (keep-alives, control messages, malformed
/// lines) never becomes a `Record`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    value: Value,
}

impl Record {
    /// Decodes a line into a record.
    ///
    /// Returns `None` for blank lines, lines that do not start with `{`,
    /// invalid JSON, and objects lacking a non-empty `text` string or a
    /// `user.screen_name` string.
    #[must_use]
    pub fn from_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if !line.starts_with('{') {
            return None;
        }
        let value = serde_json::from_str::<Value>(line).ok()?;
        Self::from_value(value)
    }

    /// Wraps an already decoded value if it qualifies as a record.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        let text = value.get("text").and_then(Value::as_str)?;
        if text.is_empty() {
            return None;
        }
        value
            .get("user")
            .and_then(|user| user.get("screen_name"))
            .and_then(Value::as_str)?;
        Some(Self { value })
    }

    /// Returns the record text.
    #[must_use]
    pub fn text(&self) -> &str {
        self.value
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Returns the screen name of the user who produced the record.
    #[must_use]
    pub fn screen_name(&self) -> &str {
        self.value
            .get("user")
            .and_then(|user| user.get("screen_name"))
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Returns the underlying JSON value.
    #[must_use]
    pub const fn as_value(&self) -> &Value {
        &self.value
    }

    /// Consumes the record, returning the underlying JSON value.
    #[must_use]
    pub fn into_value(self) -> Value {
        self.value
    }
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} : {}", self.screen_name(), self.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_record() {
        let record = Record::from_line("{\"text\":\"hello\",\"user\":{\"screen_name\":\"alice\"}}\r\n")
            .expect("valid record");
        assert_eq!(record.text(), "hello");
        assert_eq!(record.screen_name(), "alice");
        assert_eq!(record.to_string(), "alice : hello");
    }

    #[test]
    fn test_keep_alive_is_not_a_record() {
        assert!(Record::from_line("\r\n").is_none());
        assert!(Record::from_line("").is_none());
    }

    #[test]
    fn test_control_message_is_not_a_record() {
        assert!(Record::from_line("{\"delete\":{\"status\":{\"id\":1234}}}").is_none());
        assert!(Record::from_line("{\"limit\":{\"track\":42}}").is_none());
        assert!(Record::from_line("{\"text\":\"hi\",\"user\":{\"id\":7}}").is_none());
    }

    #[test]
    fn test_malformed_lines_are_discarded() {
        assert!(Record::from_line("{\"text\":\"hi\",").is_none());
        assert!(Record::from_line("[{\"text\":\"hi\"}]").is_none());
        assert!(Record::from_line("not json").is_none());
    }

    #[test]
    fn test_empty_text_is_not_a_record() {
        assert!(Record::from_line("{\"text\":\"\",\"user\":{\"screen_name\":\"alice\"}}").is_none());
    }

    #[test]
    fn test_serializes_as_received_value() {
        let record = Record::from_line("{\"text\":\"hi\",\"user\":{\"screen_name\":\"bob\"},\"id\":9}")
            .expect("valid record");
        let json = serde_json::to_value(&record).expect("serialize");
        assert_eq!(json["id"], 9);
        assert_eq!(record.into_value()["user"]["screen_name"], "bob");
    }
}
