//! Re-association of positional gateway results with registration ids.
//!
//! The gateway answers a multicast request with one result record per
//! registration id, in the order the ids were sent. [`Correlator`] pairs the
//! two sequences index by index:
//!
//! - the first `min(recipients, results)` records are keyed by registration id;
//! - surplus records stay keyed by their position in the reply, so with one
//!   registration id and three records they are `Position(1)` and
//!   `Position(2)`, listed after the paired entries;
//! - surplus registration ids get no entry.
//!
//! Without a message every record is keyed by position. Views are recomputed
//! on each call and never mutate the response or the message.

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

use crate::{DeliveryResult, ErrorCode, GcmResponse, Message, ResultField};

/// Key of a correlated entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultKey<'a> {
    /// Registration id the result belongs to.
    Recipient(&'a str),
    /// Position of a result that could not be paired with a registration id.
    Position(usize),
}

impl ResultKey<'_> {
    /// Registration id, if this entry was paired.
    pub fn recipient(&self) -> Option<&str> {
        match self {
            Self::Recipient(id) => Some(*id),
            Self::Position(_) => None,
        }
    }
}

impl fmt::Display for ResultKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recipient(id) => f.write_str(id),
            Self::Position(position) => write!(f, "{position}"),
        }
    }
}

/// Ordered view of correlated entries.
///
/// Paired entries come first, in registration id order, followed by any
/// unpaired results in reply order.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelatedResults<'a, T> {
    entries: Vec<(ResultKey<'a>, T)>,
}

impl<'a, T> CorrelatedResults<'a, T> {
    /// Look up the entry for a registration id.
    pub fn get(&self, recipient: &str) -> Option<&T> {
        self.find(ResultKey::Recipient(recipient))
    }

    /// Look up an unpaired entry by its position in the reply.
    pub fn get_position(&self, position: usize) -> Option<&T> {
        self.find(ResultKey::Position(position))
    }

    fn find(&self, key: ResultKey<'_>) -> Option<&T> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, value)| value)
    }

    /// Iterate over entries in order.
    pub fn iter(&self) -> std::slice::Iter<'_, (ResultKey<'a>, T)> {
        self.entries.iter()
    }

    /// Keys in order.
    pub fn keys(&self) -> impl Iterator<Item = ResultKey<'a>> + '_ {
        self.entries.iter().map(|(key, _)| *key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Paired entries keyed by registration id. Unpaired entries are left out.
    pub fn to_recipient_map(&self) -> HashMap<&'a str, &T> {
        self.entries
            .iter()
            .filter_map(|(key, value)| match key {
                ResultKey::Recipient(id) => Some((*id, value)),
                ResultKey::Position(_) => None,
            })
            .collect()
    }

    fn filter_map<U>(self, mut f: impl FnMut(T) -> Option<U>) -> CorrelatedResults<'a, U> {
        CorrelatedResults {
            entries: self
                .entries
                .into_iter()
                .filter_map(|(key, value)| f(value).map(|value| (key, value)))
                .collect(),
        }
    }
}

impl<'a, T> IntoIterator for CorrelatedResults<'a, T> {
    type Item = (ResultKey<'a>, T);
    type IntoIter = std::vec::IntoIter<(ResultKey<'a>, T)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'r, 'a, T> IntoIterator for &'r CorrelatedResults<'a, T> {
    type Item = &'r (ResultKey<'a>, T);
    type IntoIter = std::slice::Iter<'r, (ResultKey<'a>, T)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Pairs a reply with the message that produced it.
#[derive(Debug, Clone, Copy)]
pub struct Correlator<'a> {
    response: &'a GcmResponse,
    message: Option<&'a Message>,
}

impl<'a> Correlator<'a> {
    /// Create a correlator. With no message, results stay positional.
    pub fn new(response: &'a GcmResponse, message: Option<&'a Message>) -> Self {
        Self { response, message }
    }

    /// The reply being correlated.
    pub fn response(&self) -> &'a GcmResponse {
        self.response
    }

    /// The message the reply is correlated against.
    pub fn message(&self) -> Option<&'a Message> {
        self.message
    }

    /// Full result records keyed by registration id.
    pub fn results(&self) -> CorrelatedResults<'a, &'a DeliveryResult> {
        let results = self.response.results();
        let recipients = self.message.map(Message::recipients).unwrap_or_default();

        let mut entries = Vec::with_capacity(results.len());
        for (id, result) in recipients.iter().zip(results) {
            entries.push((ResultKey::Recipient(id.as_str()), result));
        }
        let paired = entries.len();
        for (position, result) in results.iter().enumerate().skip(paired) {
            entries.push((ResultKey::Position(position), result));
        }

        CorrelatedResults { entries }
    }

    /// A single field of each record, whatever its JSON type. Records without
    /// the field, or with a `null` value, are left out.
    pub fn result(&self, field: ResultField) -> CorrelatedResults<'a, &'a Value> {
        self.results().filter_map(|result| result.field(field))
    }

    /// Parsed error codes of failed recipients.
    pub fn errors(&self) -> CorrelatedResults<'a, ErrorCode> {
        self.results().filter_map(DeliveryResult::error_code)
    }

    /// Canonical registration ids reported by the gateway.
    pub fn canonical_ids(&self) -> CorrelatedResults<'a, &'a Value> {
        self.result(ResultField::CanonicalId)
    }

    /// Registration ids the gateway no longer accepts.
    pub fn stale_recipients(&self) -> Vec<&'a str> {
        self.errors()
            .into_iter()
            .filter(|(_, code)| code.should_remove_registration())
            .filter_map(|(key, _)| match key {
                ResultKey::Recipient(id) => Some(id),
                ResultKey::Position(_) => None,
            })
            .collect()
    }
}

/// A decoded reply together with the message that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    response: GcmResponse,
    message: Message,
}

impl Delivery {
    /// Bundle a reply with its message.
    pub fn new(response: GcmResponse, message: Message) -> Self {
        Self { response, message }
    }

    /// The decoded reply.
    pub fn response(&self) -> &GcmResponse {
        &self.response
    }

    /// The message that was sent.
    pub fn message(&self) -> &Message {
        &self.message
    }

    /// Correlate the reply with the message.
    pub fn correlate(&self) -> Correlator<'_> {
        Correlator::new(&self.response, Some(&self.message))
    }

    /// Full result records keyed by registration id.
    pub fn results(&self) -> CorrelatedResults<'_, &DeliveryResult> {
        self.correlate().results()
    }

    /// A single field of each record keyed by registration id.
    pub fn result(&self, field: ResultField) -> CorrelatedResults<'_, &Value> {
        self.correlate().result(field)
    }

    /// Split into the reply and the message.
    pub fn into_parts(self) -> (GcmResponse, Message) {
        (self.response, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message(ids: &[&str]) -> Message {
        let mut builder = Message::builder();
        builder.set_recipients(ids.iter().copied()).unwrap();
        builder.build()
    }

    fn response(results: serde_json::Value) -> GcmResponse {
        GcmResponse::from_value(json!({
            "results": results,
            "success": 1,
            "failure": 1,
            "canonical_ids": 0,
            "multicast_id": 42
        }))
        .unwrap()
    }

    #[test]
    fn test_equal_lengths_pair_by_position() {
        let response = response(json!([{"message_id": "x"}, {"error": "NotRegistered"}]));
        let message = message(&["A", "B"]);
        let correlator = Correlator::new(&response, Some(&message));

        let results = correlator.results();
        assert_eq!(results.len(), 2);
        assert_eq!(results.get("A").unwrap().message_id(), Some("x"));
        assert_eq!(results.get("B").unwrap().error(), Some("NotRegistered"));
        assert_eq!(
            results.keys().collect::<Vec<_>>(),
            vec![ResultKey::Recipient("A"), ResultKey::Recipient("B")]
        );
    }

    #[test]
    fn test_field_projection_omits_missing_fields() {
        let response = response(json!([{"message_id": "x"}, {"error": "NotRegistered"}]));
        let message = message(&["A", "B"]);
        let correlator = Correlator::new(&response, Some(&message));

        let ids = correlator.result(ResultField::MessageId);
        assert_eq!(ids.len(), 1);
        assert_eq!(ids.get("A"), Some(&&json!("x")));
        assert_eq!(ids.get("B"), None);

        let errors = correlator.result(ResultField::Error);
        assert_eq!(
            errors.to_recipient_map(),
            HashMap::from([("B", &&json!("NotRegistered"))])
        );
    }

    #[test]
    fn test_field_projection_keeps_non_string_values() {
        let response = response(json!([
            {"message_id": 7},
            {"message_id": null},
            {"message_id": "c"}
        ]));
        let message = message(&["A", "B"]);
        let ids = Correlator::new(&response, Some(&message)).result(ResultField::MessageId);

        assert_eq!(
            ids.keys().collect::<Vec<_>>(),
            vec![ResultKey::Recipient("A"), ResultKey::Position(2)]
        );
        assert_eq!(ids.get("A"), Some(&&json!(7)));
        assert_eq!(ids.get("B"), None);
        assert_eq!(ids.get_position(2), Some(&&json!("c")));
    }

    #[test]
    fn test_without_message_results_stay_positional() {
        let response = response(json!([{"message_id": "1:234"}]));
        let correlator = Correlator::new(&response, None);

        let results = correlator.results();
        assert_eq!(results.keys().collect::<Vec<_>>(), vec![ResultKey::Position(0)]);
        assert_eq!(results.get_position(0), Some(&&response.results()[0]));

        let ids = correlator.result(ResultField::MessageId);
        assert_eq!(ids.get_position(0), Some(&&json!("1:234")));
        assert!(ids.to_recipient_map().is_empty());
    }

    #[test]
    fn test_attaching_message_keys_by_recipient() {
        let response = response(json!([{"message_id": "1:234"}]));
        let message = message(&["ABCDEF"]);

        let ids = Correlator::new(&response, Some(&message)).result(ResultField::MessageId);
        assert_eq!(
            ids.to_recipient_map(),
            HashMap::from([("ABCDEF", &&json!("1:234"))])
        );
    }

    #[test]
    fn test_surplus_results_keep_their_position() {
        let response = response(json!([
            {"message_id": "1"},
            {"message_id": "2"},
            {"message_id": "3"}
        ]));
        let message = message(&["A"]);
        let results = Correlator::new(&response, Some(&message)).results();

        assert_eq!(
            results.keys().collect::<Vec<_>>(),
            vec![
                ResultKey::Recipient("A"),
                ResultKey::Position(1),
                ResultKey::Position(2)
            ]
        );
        assert_eq!(results.get_position(2).unwrap().message_id(), Some("3"));
        assert_eq!(results.get_position(0), None);
    }

    #[test]
    fn test_surplus_recipients_get_no_entry() {
        let response = response(json!([{"message_id": "1"}]));
        let message = message(&["A", "B", "C"]);
        let results = Correlator::new(&response, Some(&message)).results();

        assert_eq!(results.len(), 1);
        assert!(results.get("A").is_some());
        assert!(results.get("B").is_none());
        assert!(results.get("C").is_none());
    }

    #[test]
    fn test_empty_results() {
        let response = response(json!([]));
        let message = message(&["A"]);
        assert!(Correlator::new(&response, Some(&message)).results().is_empty());
    }

    #[test]
    fn test_repeated_correlation_is_stable() {
        let response = response(json!([{"message_id": "x"}, {"error": "Unavailable"}]));
        let message = message(&["A", "B"]);
        let correlator = Correlator::new(&response, Some(&message));

        assert_eq!(correlator.results(), correlator.results());
        assert_eq!(message.recipients(), ["A", "B"]);
        assert_eq!(response.results().len(), 2);
    }

    #[test]
    fn test_errors_and_stale_recipients() {
        let response = response(json!([
            {"message_id": "1"},
            {"error": "NotRegistered"},
            {"error": "Unavailable"},
            {"error": "InvalidRegistration"}
        ]));
        let message = message(&["A", "B", "C", "D"]);
        let correlator = Correlator::new(&response, Some(&message));

        let errors = correlator.errors();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors.get("C"), Some(&ErrorCode::Unavailable));
        assert_eq!(correlator.stale_recipients(), vec!["B", "D"]);
    }

    #[test]
    fn test_canonical_ids() {
        let response = response(json!([
            {"message_id": "1", "registration_id": "A2"},
            {"message_id": "2"}
        ]));
        let message = message(&["A", "B"]);
        let canonical = Correlator::new(&response, Some(&message)).canonical_ids();
        assert_eq!(canonical.to_recipient_map(), HashMap::from([("A", &&json!("A2"))]));
    }

    #[test]
    fn test_delivery_bundle() {
        let delivery = Delivery::new(
            response(json!([{"message_id": "x"}, {"error": "NotRegistered"}])),
            message(&["A", "B"]),
        );

        assert_eq!(
            delivery.result(ResultField::MessageId).get("A"),
            Some(&&json!("x"))
        );
        assert_eq!(delivery.results().len(), 2);
        assert_eq!(delivery.response().multicast_id(), 42);

        let (response, message) = delivery.into_parts();
        assert_eq!(response.results().len(), 2);
        assert_eq!(message.recipients(), ["A", "B"]);
    }

    #[test]
    fn test_result_key_display() {
        assert_eq!(ResultKey::Recipient("A").to_string(), "A");
        assert_eq!(ResultKey::Position(3).to_string(), "3");
        assert_eq!(ResultKey::Position(3).recipient(), None);
    }
}
