//! # Armature GCM
//!
//! Client for the Google Cloud Messaging HTTP send endpoint.
//!
//! ## Features
//!
//! - **Validated messages**: registration ids, payload keys and options are
//!   checked as they are added
//! - **Minimal payloads**: only non-default fields go on the wire
//! - **Typed gateway errors**: HTTP status codes map to [`GcmError`] variants
//! - **Result correlation**: per-recipient results keyed by registration id
//! - **Pluggable transport**: `reqwest` by default, any [`HttpTransport`] otherwise
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use armature_gcm::{GcmClient, GcmConfig, Message, ResultField};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = GcmClient::new(GcmConfig::new("server-api-key"))?;
//!
//!     let mut builder = Message::builder();
//!     builder
//!         .set_recipients(["device-a", "device-b"])?
//!         .add_notification("title", "New Message")?
//!         .add_data("message_id", "12345")?;
//!     let message = builder.build();
//!
//!     let delivery = client.send(&message).await?;
//!
//!     for (recipient, message_id) in delivery.result(ResultField::MessageId) {
//!         println!("{recipient}: delivered as {message_id}");
//!     }
//!     for recipient in delivery.correlate().stale_recipients() {
//!         println!("{recipient}: drop this registration");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Correlating a stored reply
//!
//! ```
//! use armature_gcm::{Correlator, GcmResponse, Message, ResultField};
//!
//! # fn main() -> armature_gcm::Result<()> {
//! let mut builder = Message::builder();
//! builder.set_recipients(["A", "B"])?;
//! let message = builder.build();
//!
//! let response: GcmResponse = r#"{
//!     "multicast_id": 1, "success": 1, "failure": 1, "canonical_ids": 0,
//!     "results": [{"message_id": "x"}, {"error": "NotRegistered"}]
//! }"#
//! .parse()?;
//!
//! let ids = Correlator::new(&response, Some(&message)).result(ResultField::MessageId);
//! assert_eq!(ids.get("A").copied(), Some(&serde_json::json!("x")));
//! assert_eq!(ids.get("B"), None);
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod correlation;
mod error;
mod message;
mod response;
mod transport;

pub use client::GcmClient;
pub use config::{
    CONTENT_TYPE_JSON, DEFAULT_PRIORITY, DEFAULT_TIME_TO_LIVE, DEFAULT_TIMEOUT, ENV_API_KEY,
    ENV_ENDPOINT, GcmConfig, GcmConfigBuilder, SERVER_URI,
};
pub use correlation::{CorrelatedResults, Correlator, Delivery, ResultKey};
pub use error::{GcmError, Result};
pub use message::{Message, MessageBuilder};
pub use response::{DeliveryResult, ErrorCode, GcmResponse, ResultField};
pub use transport::{HttpTransport, ReqwestTransport, TransportRequest, TransportResponse};

/// Prelude for common imports.
///
/// ```
/// use armature_gcm::prelude::*;
/// ```
pub mod prelude {
    pub use crate::client::GcmClient;
    pub use crate::config::{GcmConfig, GcmConfigBuilder};
    pub use crate::correlation::{CorrelatedResults, Correlator, Delivery, ResultKey};
    pub use crate::error::{GcmError, Result};
    pub use crate::message::{Message, MessageBuilder};
    pub use crate::response::{DeliveryResult, ErrorCode, GcmResponse, ResultField};
    pub use crate::transport::{HttpTransport, ReqwestTransport};
}
