//! Client-side referral attribution and event tracking.
//!
//! # Overview
//!
//! The SDK revolves around a [`Client`] that sends named events to a collection endpoint. Every
//! event carries attribution metadata describing how the visitor arrived: a per-visitor tracking
//! id, the referring affiliate, the traffic source, and campaign labels.
//!
//! Attribution is *first-touch*: [`AttributionResolver`] reads each field from the page URL and
//! referrer once, persists it in a [`KeyValueStore`], and returns the persisted value from then
//! on, even if the visitor later navigates with different query parameters.
//!
//! [`EventDeduplicator`] suppresses events that repeat the last sent event of the same name
//! within a validity window (60 seconds by default; identity events use the calendar day). Only
//! successfully delivered events are recorded, so failed events can be retried.
//!
//! # Browser capabilities
//!
//! The SDK does not talk to the browser directly. Provide a [`KeyValueStore`] (e.g., backed by
//! `localStorage`) and a [`PageContext`] (current URL and `document.referrer`) through
//! [`ClientConfig`]. Without them, attribution is unavailable and [`Client::send`] returns
//! [`SendOutcome::Unattributed`] instead of sending partially attributed events.
//!
//! ```
//! # use attribution::{ClientConfig, InMemoryStore, StaticPage};
//! let client = ClientConfig::from_api_key("api-key")
//!     .storage(InMemoryStore::new())
//!     .page(StaticPage::parse("https://example.com/?af=partner", "").unwrap())
//!     .to_client()
//!     .unwrap();
//! assert_eq!(client.attribution().unwrap().traffic_source, "affiliate");
//! ```
//!
//! # Error Handling
//!
//! Errors are represented by the [`Error`] enum. Only transport failures and invalid
//! configuration produce errors. Corrupt persisted state is ignored and logged.
//!
//! Tracking should not be critical enough to break your application, so it is recommended to log
//! and otherwise ignore errors returned by [`Client::send`].
//!
//! # Logging
//!
//! The package uses the [`log`](https://docs.rs/log/latest/log/) crate for logging
//! messages. Consider integrating a `log`-compatible logger implementation for better visibility
//! into SDK operations.

#![warn(rustdoc::missing_crate_level_docs)]
#![warn(missing_docs)]

mod attribution;
mod client;
mod clock;
mod config;
mod dedup;
mod error;
mod event;
mod event_logger;
mod id;
mod link;
mod page;
mod storage;
mod transport;

pub use attribution::{AttributionContext, AttributionResolver};
pub use client::{Client, SendOutcome, CONNECT_WALLET_EVENT, PAGEVIEW_EVENT};
pub use clock::{Clock, SystemClock};
pub use config::ClientConfig;
pub use dedup::{DedupPolicy, EventDeduplicator, IdentityWindow};
pub use error::{Error, Result};
pub use event::{Event, EventArgs, EventMetadata, GenericEvent, Identity, IdentityEvent};
pub use event_logger::EventLogger;
pub use id::{IdGenerator, RandomIdGenerator};
pub use link::{tracking_link, TrackingLinkParams};
pub use page::{PageContext, StaticPage};
pub use storage::{InMemoryStore, KeyValueStore};
pub use transport::{HttpTransport, Response, Transport};
