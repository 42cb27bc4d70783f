//! Outbound GCM message.
//!
//! A [`Message`] is assembled through a [`MessageBuilder`], which validates
//! every mutation as it happens, and is read-only afterwards. The serialized
//! form only carries fields that differ from what the gateway would assume
//! anyway, so a fresh message encodes as `{}`.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::{DEFAULT_PRIORITY, DEFAULT_TIME_TO_LIVE};
use crate::{GcmError, Result};

/// A message addressed to one or more registration ids.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    recipients: Vec<String>,
    collapse_key: Option<String>,
    priority: Option<String>,
    data: Map<String, Value>,
    notification: Map<String, Value>,
    delay_while_idle: bool,
    time_to_live: u32,
    restricted_package_name: Option<String>,
    dry_run: bool,
}

impl Default for Message {
    fn default() -> Self {
        Self {
            recipients: Vec::new(),
            collapse_key: None,
            priority: Some(DEFAULT_PRIORITY.to_string()),
            data: Map::new(),
            notification: Map::new(),
            delay_while_idle: false,
            time_to_live: DEFAULT_TIME_TO_LIVE,
            restricted_package_name: None,
            dry_run: false,
        }
    }
}

impl Message {
    /// Create a builder.
    pub fn builder() -> MessageBuilder {
        MessageBuilder::new()
    }

    /// Re-open this message for editing.
    pub fn into_builder(self) -> MessageBuilder {
        MessageBuilder { message: self }
    }

    /// Registration ids in insertion order.
    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    /// Collapse key.
    pub fn collapse_key(&self) -> Option<&str> {
        self.collapse_key.as_deref()
    }

    /// Delivery priority.
    pub fn priority(&self) -> Option<&str> {
        self.priority.as_deref()
    }

    /// Application payload.
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Display payload.
    pub fn notification(&self) -> &Map<String, Value> {
        &self.notification
    }

    /// Whether delivery waits for the device to become active.
    pub fn delay_while_idle(&self) -> bool {
        self.delay_while_idle
    }

    /// Time to live in seconds.
    pub fn time_to_live(&self) -> u32 {
        self.time_to_live
    }

    /// Package name the registration ids must belong to.
    pub fn restricted_package_name(&self) -> Option<&str> {
        self.restricted_package_name.as_deref()
    }

    /// Whether the gateway should validate without delivering.
    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Encode the minimal wire payload as a JSON value.
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Encode the minimal wire payload as a JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    fn payload(&self) -> MessagePayload<'_> {
        MessagePayload {
            registration_ids: Some(self.recipients.as_slice()).filter(|ids| !ids.is_empty()),
            collapse_key: self.collapse_key.as_deref(),
            priority: self.priority.as_deref().filter(|p| *p != DEFAULT_PRIORITY),
            data: Some(&self.data).filter(|data| !data.is_empty()),
            notification: Some(&self.notification).filter(|notification| !notification.is_empty()),
            delay_while_idle: self.delay_while_idle,
            time_to_live: Some(self.time_to_live).filter(|ttl| *ttl != DEFAULT_TIME_TO_LIVE),
            restricted_package_name: self.restricted_package_name.as_deref(),
            dry_run: self.dry_run,
        }
    }
}

impl Serialize for Message {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.payload().serialize(serializer)
    }
}

// Wire format

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Serialize)]
struct MessagePayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    registration_ids: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    collapse_key: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notification: Option<&'a Map<String, Value>>,
    #[serde(skip_serializing_if = "is_false")]
    delay_while_idle: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    time_to_live: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    restricted_package_name: Option<&'a str>,
    #[serde(skip_serializing_if = "is_false")]
    dry_run: bool,
}

/// Builder for [`Message`].
///
/// Mutators validate eagerly and leave the builder untouched when they fail,
/// so they chain with `?`:
///
/// ```
/// use armature_gcm::Message;
///
/// # fn main() -> armature_gcm::Result<()> {
/// let mut builder = Message::builder();
/// builder
///     .add_recipient("device-a")?
///     .add_recipient("device-b")?
///     .add_data("score", 42)?
///     .dry_run(true);
/// let message = builder.build();
///
/// assert_eq!(message.recipients(), ["device-a", "device-b"]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MessageBuilder {
    message: Message,
}

impl MessageBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a registration id. Adding an id that is already present is a no-op.
    pub fn add_recipient(&mut self, id: impl Into<String>) -> Result<&mut Self> {
        let id = non_empty(id.into(), "registration id")?;
        if !self.message.recipients.contains(&id) {
            self.message.recipients.push(id);
        }
        Ok(self)
    }

    /// Replace the registration ids.
    ///
    /// Either every id is accepted or the current list is left as it was.
    pub fn set_recipients<I, S>(&mut self, ids: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut recipients: Vec<String> = Vec::new();
        for id in ids {
            let id = non_empty(id.into(), "registration id")?;
            if !recipients.contains(&id) {
                recipients.push(id);
            }
        }
        self.message.recipients = recipients;
        Ok(self)
    }

    /// Remove all registration ids.
    pub fn clear_recipients(&mut self) -> &mut Self {
        self.message.recipients.clear();
        self
    }

    /// Set the collapse key.
    pub fn collapse_key(&mut self, key: impl Into<String>) -> Result<&mut Self> {
        self.message.collapse_key = Some(non_empty(key.into(), "collapse key")?);
        Ok(self)
    }

    /// Unset the collapse key.
    pub fn clear_collapse_key(&mut self) -> &mut Self {
        self.message.collapse_key = None;
        self
    }

    /// Set the delivery priority (`"normal"` or `"high"` on the current gateway).
    pub fn priority(&mut self, priority: impl Into<String>) -> Result<&mut Self> {
        self.message.priority = Some(non_empty(priority.into(), "priority")?);
        Ok(self)
    }

    /// Unset the priority.
    pub fn clear_priority(&mut self) -> &mut Self {
        self.message.priority = None;
        self
    }

    /// Add an application payload entry.
    ///
    /// Fails with [`GcmError::KeyConflict`] if `key` is already present; the
    /// existing value is kept.
    pub fn add_data(
        &mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<&mut Self> {
        insert_unique(&mut self.message.data, "data", key.into(), value.into())?;
        Ok(self)
    }

    /// Replace the application payload.
    pub fn set_data<I, K, V>(&mut self, entries: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.message.data = collect_unique("data", entries)?;
        Ok(self)
    }

    /// Remove all application payload entries.
    pub fn clear_data(&mut self) -> &mut Self {
        self.message.data.clear();
        self
    }

    /// Add a display payload entry.
    ///
    /// Same rules as [`add_data`](Self::add_data), checked against the
    /// notification entries only.
    pub fn add_notification(
        &mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<&mut Self> {
        insert_unique(
            &mut self.message.notification,
            "notification",
            key.into(),
            value.into(),
        )?;
        Ok(self)
    }

    /// Replace the display payload.
    pub fn set_notification<I, K, V>(&mut self, entries: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.message.notification = collect_unique("notification", entries)?;
        Ok(self)
    }

    /// Remove all display payload entries.
    pub fn clear_notification(&mut self) -> &mut Self {
        self.message.notification.clear();
        self
    }

    /// Set delay while idle.
    pub fn delay_while_idle(&mut self, delay: bool) -> &mut Self {
        self.message.delay_while_idle = delay;
        self
    }

    /// Set the time to live in seconds. The gateway decides which values it accepts.
    pub fn time_to_live(&mut self, seconds: u32) -> &mut Self {
        self.message.time_to_live = seconds;
        self
    }

    /// Set the restricted package name.
    pub fn restricted_package_name(&mut self, name: impl Into<String>) -> Result<&mut Self> {
        self.message.restricted_package_name = Some(non_empty(name.into(), "package name")?);
        Ok(self)
    }

    /// Unset the restricted package name.
    pub fn clear_restricted_package_name(&mut self) -> &mut Self {
        self.message.restricted_package_name = None;
        self
    }

    /// Set dry run.
    pub fn dry_run(&mut self, dry_run: bool) -> &mut Self {
        self.message.dry_run = dry_run;
        self
    }

    /// Build the message.
    pub fn build(self) -> Message {
        self.message
    }
}

fn non_empty(value: String, what: &str) -> Result<String> {
    if value.is_empty() {
        return Err(GcmError::InvalidArgument(format!(
            "{what} must be a non-empty string"
        )));
    }
    Ok(value)
}

fn insert_unique(
    map: &mut Map<String, Value>,
    mapping: &'static str,
    key: String,
    value: Value,
) -> Result<()> {
    let key = non_empty(key, "key")?;
    if map.contains_key(&key) {
        return Err(GcmError::KeyConflict { mapping, key });
    }
    map.insert(key, value);
    Ok(())
}

fn collect_unique<I, K, V>(mapping: &'static str, entries: I) -> Result<Map<String, Value>>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    let mut map = Map::new();
    for (key, value) in entries {
        insert_unique(&mut map, mapping, key.into(), value.into())?;
    }
    Ok(map)
}
