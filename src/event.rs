//! Events sent to the collection endpoint.
use derive_more::From;
use serde::{Deserialize, Serialize};

/// Free-form event arguments.
pub type EventArgs = serde_json::Map<String, serde_json::Value>;

/// Attribution metadata attached to every event.
///
/// All fields except `project_id` come from [`AttributionResolver`](crate::AttributionResolver).
/// An empty string means "resolved to no value".
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Per-visitor tracking id.
    pub tracking_id: String,
    /// Project the event belongs to, if configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Affiliate id.
    #[serde(default)]
    pub referrer: String,
    /// Traffic source (`affiliate`, `organic`, `direct`, or an explicit source).
    #[serde(default)]
    pub source: String,
    /// Campaign category.
    #[serde(default)]
    pub category: String,
    /// Campaign title.
    #[serde(default)]
    pub title: String,
    /// Campaign tag.
    #[serde(default)]
    pub tag: String,
    /// The document referrer on first visit.
    #[serde(default)]
    pub referrer_url: String,
}

impl EventMetadata {
    /// Whether two metadata values describe the same attribution. `referrer_url` is not compared.
    pub fn same_attribution(&self, other: &EventMetadata) -> bool {
        self.tracking_id == other.tracking_id
            && self.project_id == other.project_id
            && self.referrer == other.referrer
            && self.source == other.source
            && self.category == other.category
            && self.title == other.title
            && self.tag == other.tag
    }
}

/// Wallet/user identity proof carried by identity events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Wallet address or user identifier.
    pub user_address: String,
    /// Signature of `signature_message` by `user_address`.
    pub signature: String,
    /// The signed message.
    pub signature_message: String,
}

/// An event without identity payload (e.g., `pageview` or a custom event).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericEvent {
    /// Event name. Deduplication state is kept per name.
    pub name: String,
    /// Free-form arguments. Only `page` takes part in deduplication.
    #[serde(default)]
    pub args: EventArgs,
    /// Attribution metadata.
    pub metadata: EventMetadata,
}

/// An event carrying a user identity (e.g., `connect_wallet`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityEvent {
    /// Event name. Deduplication state is kept per name.
    pub name: String,
    /// Identity proof, serialized inline next to `name`.
    #[serde(flatten)]
    pub identity: Identity,
    /// Free-form arguments. Only `page` takes part in deduplication.
    #[serde(default)]
    pub args: EventArgs,
    /// Attribution metadata.
    pub metadata: EventMetadata,
}

/// An outgoing event.
///
/// Serialized without a tag: identity events carry `user_address`, `signature`, and
/// `signature_message` next to `name`, `args`, and `metadata`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, From)]
#[serde(untagged)]
pub enum Event {
    // Identity must come first, so that records with identity fields don't parse as generic.
    /// Event with identity payload.
    Identity(IdentityEvent),
    /// Event without identity payload.
    Generic(GenericEvent),
}

impl Event {
    /// Event name.
    pub fn name(&self) -> &str {
        match self {
            Event::Identity(event) => &event.name,
            Event::Generic(event) => &event.name,
        }
    }

    /// Event arguments.
    pub fn args(&self) -> &EventArgs {
        match self {
            Event::Identity(event) => &event.args,
            Event::Generic(event) => &event.args,
        }
    }

    /// Attribution metadata.
    pub fn metadata(&self) -> &EventMetadata {
        match self {
            Event::Identity(event) => &event.metadata,
            Event::Generic(event) => &event.metadata,
        }
    }

    /// Identity proof, if this is an identity event.
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Event::Identity(event) => Some(&event.identity),
            Event::Generic(_) => None,
        }
    }
}

/// The last successfully sent event of a given name, as persisted in storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct SentEventRecord {
    #[serde(flatten)]
    pub event: Event,
    /// Seconds since epoch, captured at send time.
    pub timestamp: i64,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Event, EventMetadata, GenericEvent, Identity, IdentityEvent, SentEventRecord};

    fn metadata() -> EventMetadata {
        EventMetadata {
            tracking_id: "123".into(),
            source: "direct".into(),
            ..Default::default()
        }
    }

    #[test]
    fn identity_event_wire_format() {
        let event = Event::from(IdentityEvent {
            name: "connect_wallet".into(),
            identity: Identity {
                user_address: "0xabc".into(),
                signature: "0xsig".into(),
                signature_message: "hello".into(),
            },
            args: Default::default(),
            metadata: metadata(),
        });

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["user_address"], json!("0xabc"));
        assert_eq!(value["signature"], json!("0xsig"));
        assert_eq!(value["signature_message"], json!("hello"));
        assert_eq!(value["metadata"]["tracking_id"], json!("123"));
        assert!(value["metadata"].get("project_id").is_none());
    }

    #[test]
    fn parses_stored_record_into_matching_variant() {
        let record: SentEventRecord = serde_json::from_value(json!({
            "name": "connect_wallet",
            "user_address": "0xabc",
            "signature": "0xsig",
            "signature_message": "hello",
            "args": {},
            "metadata": {"tracking_id": "123"},
            "timestamp": 1000,
        }))
        .unwrap();
        assert!(matches!(record.event, Event::Identity(_)));
        assert_eq!(record.timestamp, 1000);

        let record: SentEventRecord = serde_json::from_value(json!({
            "name": "pageview",
            "args": {"page": "/home"},
            "metadata": {"tracking_id": "123"},
            "timestamp": 1000,
        }))
        .unwrap();
        assert!(matches!(record.event, Event::Generic(_)));
        assert_eq!(record.event.args()["page"], json!("/home"));
    }

    #[test]
    fn record_stores_timestamp_next_to_event_fields() {
        let record = SentEventRecord {
            event: GenericEvent {
                name: "pageview".into(),
                args: Default::default(),
                metadata: metadata(),
            }
            .into(),
            timestamp: 42,
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["name"], json!("pageview"));
        assert_eq!(value["timestamp"], json!(42));
    }

    #[test]
    fn same_attribution_ignores_referrer_url() {
        let a = metadata();
        let b = EventMetadata {
            referrer_url: "https://other.example".into(),
            ..metadata()
        };
        assert!(a.same_attribution(&b));

        let c = EventMetadata {
            tag: "spring".into(),
            ..metadata()
        };
        assert!(!a.same_attribution(&c));
    }
}
