use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ControllerError;

pub const MISSING_DIRECT_FIELDS_MESSAGE: &str =
    "Both 'action' and 'instance' must be provided in the event";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Start,
    Stop,
    Resize,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Resize => "resize",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "start" => Some(Self::Start),
            "stop" => Some(Self::Stop),
            "resize" => Some(Self::Resize),
            _ => None,
        }
    }
}

/// A validated `{ "action": "<action>", "instance": "<id>" }` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectActionRequest {
    pub action: Action,
    pub instance_id: String,
}

impl DirectActionRequest {
    pub fn from_event(event: &Value) -> Result<Self, ControllerError> {
        let action = non_empty_field(event, "action");
        let instance_id = event
            .get("instance")
            .and_then(Value::as_str)
            .filter(|value| !value.trim().is_empty());

        let (Some(action), Some(instance_id)) = (action, instance_id) else {
            return Err(ControllerError::invalid_request(
                MISSING_DIRECT_FIELDS_MESSAGE,
            ));
        };

        let action = match action.as_str().and_then(Action::parse) {
            Some(parsed) => parsed,
            None => {
                let shown = action
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| action.to_string());
                return Err(ControllerError::invalid_request(format!(
                    "Invalid action: {shown}"
                )));
            }
        };

        Ok(Self {
            action,
            instance_id: instance_id.to_string(),
        })
    }
}

fn non_empty_field<'a>(event: &'a Value, name: &str) -> Option<&'a Value> {
    match event.get(name)? {
        Value::Null => None,
        Value::String(text) if text.is_empty() => None,
        value => Some(value),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationEnvelope {
    #[serde(rename = "Records")]
    pub records: Vec<NotificationRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationRecord {
    #[serde(rename = "Sns")]
    pub sns: SnsNotification,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnsNotification {
    #[serde(rename = "Message")]
    pub message: String,
}

/// The alarm document embedded, as a JSON string, in `Sns.Message`.
#[derive(Debug, Clone, Deserialize)]
pub struct AlarmMessage {
    #[serde(rename = "Trigger")]
    pub trigger: AlarmTrigger,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlarmTrigger {
    #[serde(rename = "Dimensions")]
    pub dimensions: Vec<AlarmDimension>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlarmDimension {
    #[serde(default)]
    pub name: Option<String>,
    pub value: String,
}

/// Where the resize handler gets its instance id from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResizeTarget {
    Explicit(String),
    FirstActive,
}

pub fn is_notification_event(event: &Value) -> bool {
    event
        .get("Records")
        .and_then(Value::as_array)
        .and_then(|records| records.first())
        .map(|record| record.get("Sns").is_some())
        .unwrap_or(false)
}

/// Envelope first, then an explicit `instance_id`, then the active-instance scan.
pub fn resolve_resize_target(event: &Value) -> Result<ResizeTarget, ControllerError> {
    if is_notification_event(event) {
        return instance_id_from_notification(event).map(ResizeTarget::Explicit);
    }

    match event.get("instance_id") {
        None | Some(Value::Null) => Ok(ResizeTarget::FirstActive),
        Some(Value::String(id)) if !id.trim().is_empty() => Ok(ResizeTarget::Explicit(id.clone())),
        Some(_) => Err(ControllerError::invalid_request(
            "'instance_id' must be a non-empty string",
        )),
    }
}

pub fn instance_id_from_notification(event: &Value) -> Result<String, ControllerError> {
    let envelope = NotificationEnvelope::deserialize(event).map_err(|error| {
        ControllerError::invalid_request(format!("Malformed notification envelope: {error}"))
    })?;
    let record = envelope.records.into_iter().next().ok_or_else(|| {
        ControllerError::invalid_request("Notification envelope has no records")
    })?;
    let message: AlarmMessage = serde_json::from_str(&record.sns.message).map_err(|error| {
        ControllerError::invalid_request(format!("Malformed notification message: {error}"))
    })?;

    message
        .trigger
        .dimensions
        .into_iter()
        .next()
        .map(|dimension| dimension.value)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| {
            ControllerError::invalid_request("Notification trigger carries no instance dimension")
        })
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InvocationResult {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub instance_id: Option<String>,
}

impl InvocationResult {
    /// 200 whose body is the message encoded as a JSON string.
    pub fn ok_message(message: &str, instance_id: Option<&str>) -> Self {
        Self {
            status_code: 200,
            body: Value::from(message).to_string(),
            instance_id: instance_id.map(str::to_string),
        }
    }

    pub fn ok_json(body: Value, instance_id: Option<&str>) -> Self {
        Self {
            status_code: 200,
            body: body.to_string(),
            instance_id: instance_id.map(str::to_string),
        }
    }

    pub fn client_error(error: &ControllerError) -> Self {
        Self {
            status_code: 400,
            body: json!({ "error": error.to_string() }).to_string(),
            instance_id: None,
        }
    }
}
