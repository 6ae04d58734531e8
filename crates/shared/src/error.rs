use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error body returned by the backend on non-2xx responses.
///
/// `detail` is either a plain message or a list of validation entries that each
/// carry a `msg` field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub detail: Value,
}

impl ApiErrorBody {
    pub fn message(&self) -> Option<String> {
        match &self.detail {
            Value::Null => None,
            Value::String(message) => Some(message.clone()),
            Value::Array(entries) => {
                let messages: Vec<String> = entries
                    .iter()
                    .map(|entry| match entry.get("msg").and_then(Value::as_str) {
                        Some(msg) => msg.to_string(),
                        None => entry.to_string(),
                    })
                    .collect();
                if messages.is_empty() {
                    None
                } else {
                    Some(messages.join("; "))
                }
            }
            other => Some(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_plain_detail() {
        let body: ApiErrorBody =
            serde_json::from_str(r#"{"detail":"Branch not found"}"#).expect("decode");
        assert_eq!(body.message().as_deref(), Some("Branch not found"));
    }

    #[test]
    fn joins_validation_entries() {
        let body: ApiErrorBody = serde_json::from_str(
            r#"{"detail":[{"loc":["body","name"],"msg":"field required"},{"msg":"too long"}]}"#,
        )
        .expect("decode");
        assert_eq!(
            body.message().as_deref(),
            Some("field required; too long")
        );
    }

    #[test]
    fn missing_detail_has_no_message() {
        let body: ApiErrorBody = serde_json::from_str("{}").expect("decode");
        assert!(body.message().is_none());
    }
}
