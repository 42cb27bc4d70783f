//! Decoded gateway reply.

use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::{GcmError, Result};

/// Field of a per-recipient result record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultField {
    /// Id of the delivered message (`message_id`).
    MessageId,
    /// Error code (`error`).
    Error,
    /// Canonical registration id (`registration_id`).
    CanonicalId,
}

impl ResultField {
    /// Wire name of the field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MessageId => "message_id",
            Self::Error => "error",
            Self::CanonicalId => "registration_id",
        }
    }
}

/// Per-recipient error codes returned by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// No registration id was sent.
    MissingRegistration,
    /// Registration id is malformed.
    InvalidRegistration,
    /// Registration id is no longer valid (app uninstalled, token rotated).
    NotRegistered,
    /// Registration id belongs to a different package than `restricted_package_name`.
    InvalidPackageName,
    /// Registration id is tied to another sender.
    MismatchSenderId,
    /// Payload exceeds the gateway limit.
    MessageTooBig,
    /// Payload uses a reserved key.
    InvalidDataKey,
    /// Time to live out of range.
    InvalidTtl,
    /// Gateway timed out processing this recipient.
    Unavailable,
    /// Gateway failed processing this recipient.
    InternalServerError,
    /// Too many messages to one device.
    DeviceMessageRateExceeded,
    /// Too many messages to one topic.
    TopicsMessageRateExceeded,
    /// Any code not listed above.
    Other(String),
}

impl ErrorCode {
    /// Parse a wire error code.
    pub fn parse(code: &str) -> Self {
        match code {
            "MissingRegistration" => Self::MissingRegistration,
            "InvalidRegistration" => Self::InvalidRegistration,
            "NotRegistered" => Self::NotRegistered,
            "InvalidPackageName" => Self::InvalidPackageName,
            "MismatchSenderId" => Self::MismatchSenderId,
            "MessageTooBig" => Self::MessageTooBig,
            "InvalidDataKey" => Self::InvalidDataKey,
            "InvalidTtl" => Self::InvalidTtl,
            "Unavailable" => Self::Unavailable,
            "InternalServerError" => Self::InternalServerError,
            "DeviceMessageRateExceeded" => Self::DeviceMessageRateExceeded,
            "TopicsMessageRateExceeded" => Self::TopicsMessageRateExceeded,
            other => Self::Other(other.to_string()),
        }
    }

    /// Wire form of the code.
    pub fn as_str(&self) -> &str {
        match self {
            Self::MissingRegistration => "MissingRegistration",
            Self::InvalidRegistration => "InvalidRegistration",
            Self::NotRegistered => "NotRegistered",
            Self::InvalidPackageName => "InvalidPackageName",
            Self::MismatchSenderId => "MismatchSenderId",
            Self::MessageTooBig => "MessageTooBig",
            Self::InvalidDataKey => "InvalidDataKey",
            Self::InvalidTtl => "InvalidTtl",
            Self::Unavailable => "Unavailable",
            Self::InternalServerError => "InternalServerError",
            Self::DeviceMessageRateExceeded => "DeviceMessageRateExceeded",
            Self::TopicsMessageRateExceeded => "TopicsMessageRateExceeded",
            Self::Other(code) => code,
        }
    }

    /// Check if the registration id should be dropped from the caller's store.
    pub fn should_remove_registration(&self) -> bool {
        matches!(
            self,
            Self::NotRegistered | Self::InvalidRegistration | Self::MissingRegistration
        )
    }

    /// Check if resending to this recipient later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Unavailable
                | Self::InternalServerError
                | Self::DeviceMessageRateExceeded
                | Self::TopicsMessageRateExceeded
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result record for one recipient, as sent by the gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryResult {
    fields: Map<String, Value>,
}

impl DeliveryResult {
    fn from_value(value: Value, position: usize) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            _ => Err(GcmError::MalformedResponse(format!(
                "result {position} is not an object"
            ))),
        }
    }

    /// Look up a field whatever its JSON type. `null` counts as absent.
    pub fn field(&self, field: ResultField) -> Option<&Value> {
        self.fields
            .get(field.as_str())
            .filter(|value| !value.is_null())
    }

    /// Id of the delivered message, if it was sent as a string.
    pub fn message_id(&self) -> Option<&str> {
        self.field(ResultField::MessageId).and_then(Value::as_str)
    }

    /// Raw error code, if it was sent as a string.
    pub fn error(&self) -> Option<&str> {
        self.field(ResultField::Error).and_then(Value::as_str)
    }

    /// Parsed error code. Non-string codes become [`ErrorCode::Other`] with their JSON text.
    pub fn error_code(&self) -> Option<ErrorCode> {
        self.field(ResultField::Error).map(|value| match value.as_str() {
            Some(code) => ErrorCode::parse(code),
            None => ErrorCode::Other(value.to_string()),
        })
    }

    /// Canonical registration id that replaces the one the message was sent to.
    pub fn registration_id(&self) -> Option<&str> {
        self.field(ResultField::CanonicalId).and_then(Value::as_str)
    }

    /// Check if the gateway accepted the message for this recipient.
    pub fn is_success(&self) -> bool {
        self.field(ResultField::MessageId).is_some() && self.field(ResultField::Error).is_none()
    }

    /// Check if the gateway reported a new registration id.
    pub fn has_canonical_id(&self) -> bool {
        self.field(ResultField::CanonicalId).is_some()
    }

    /// All fields of the record, including ones this crate does not interpret.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

/// Decoded multicast reply.
///
/// Only replies carrying `results`, `success`, `failure`, `canonical_ids` and
/// `multicast_id` are accepted. The original object is kept as received.
#[derive(Debug, Clone, PartialEq)]
pub struct GcmResponse {
    raw: Value,
    results: Vec<DeliveryResult>,
    success_count: i64,
    failure_count: i64,
    canonical_count: i64,
    multicast_id: i64,
}

impl GcmResponse {
    /// Decode a reply body.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(body).map_err(|e| {
            GcmError::MalformedResponse(format!("body is not valid JSON: {e}"))
        })?;
        Self::from_value(value)
    }

    /// Build from an already decoded JSON value.
    pub fn from_value(raw: Value) -> Result<Self> {
        let object = raw.as_object().ok_or_else(|| {
            GcmError::MalformedResponse("body is not a JSON object".to_string())
        })?;

        let results = match required(object, "results")? {
            Value::Array(items) => items
                .iter()
                .cloned()
                .enumerate()
                .map(|(position, item)| DeliveryResult::from_value(item, position))
                .collect::<Result<Vec<_>>>()?,
            _ => {
                return Err(GcmError::MalformedResponse(
                    "`results` is not an array".to_string(),
                ));
            }
        };
        let success_count = integer(object, "success")?;
        let failure_count = integer(object, "failure")?;
        let canonical_count = integer(object, "canonical_ids")?;
        let multicast_id = integer(object, "multicast_id")?;

        Ok(Self {
            raw,
            results,
            success_count,
            failure_count,
            canonical_count,
            multicast_id,
        })
    }

    /// Per-recipient results in the order the gateway sent them.
    pub fn results(&self) -> &[DeliveryResult] {
        &self.results
    }

    /// Number of recipients the gateway reported as delivered.
    pub fn success_count(&self) -> i64 {
        self.success_count
    }

    /// Number of recipients the gateway reported as failed.
    pub fn failure_count(&self) -> i64 {
        self.failure_count
    }

    /// Number of results carrying a canonical registration id.
    pub fn canonical_count(&self) -> i64 {
        self.canonical_count
    }

    /// Gateway id of the whole batch.
    pub fn multicast_id(&self) -> i64 {
        self.multicast_id
    }

    /// The reply exactly as received.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Consume and return the reply exactly as received.
    pub fn into_raw(self) -> Value {
        self.raw
    }
}

impl FromStr for GcmResponse {
    type Err = GcmError;

    fn from_str(body: &str) -> Result<Self> {
        Self::from_slice(body.as_bytes())
    }
}

fn required<'a>(object: &'a Map<String, Value>, field: &str) -> Result<&'a Value> {
    match object.get(field) {
        Some(Value::Null) | None => Err(GcmError::MalformedResponse(format!(
            "missing required field `{field}`"
        ))),
        Some(value) => Ok(value),
    }
}

// Counts and ids are integers on the wire, but numeric strings are accepted too.
fn integer(object: &Map<String, Value>, field: &str) -> Result<i64> {
    let value = required(object, field)?;
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
        .ok_or_else(|| GcmError::MalformedResponse(format!("`{field}` is not an integer")))
}
