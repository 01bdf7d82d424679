//! Suppression of repeated events.
//!
//! The last successfully sent event of each name is persisted under `"<namespace>.sent_<name>"`.
//! A new event is a duplicate if it matches that record and the record is still valid. Records
//! expire lazily: validity is checked when the next event is considered, there are no timers.
//!
//! There is no locking between [`EventDeduplicator::is_duplicate`] and
//! [`EventDeduplicator::record_sent`]: two concurrent sends of the same event (e.g., from two
//! tabs) may both pass the check. Deduplication is a burst suppressor, not a delivery guarantee.
use std::{sync::Arc, time::Duration};

use crate::{
    clock::{same_day, Clock},
    event::{Event, SentEventRecord},
    storage::Storage,
};

/// How long a sent identity event suppresses identical ones.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum IdentityWindow {
    /// Identity events are duplicates for the rest of the UTC calendar day.
    #[default]
    SameDay,
    /// Identity events use the same window as other events.
    ValidityPeriod,
}

/// Deduplication settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DedupPolicy {
    /// How long a sent event suppresses identical ones.
    ///
    /// Defaults to [`DedupPolicy::DEFAULT_VALIDITY_PERIOD`].
    pub validity_period: Duration,
    /// Window used for identity events.
    pub identity_window: IdentityWindow,
}

impl DedupPolicy {
    /// Default value for [`DedupPolicy::validity_period`].
    pub const DEFAULT_VALIDITY_PERIOD: Duration = Duration::from_secs(60);

    /// Update validity period with `validity_period`. Sub-second precision is ignored.
    pub fn with_validity_period(mut self, validity_period: Duration) -> DedupPolicy {
        self.validity_period = validity_period;
        self
    }

    /// Update identity event window with `identity_window`.
    pub fn with_identity_window(mut self, identity_window: IdentityWindow) -> DedupPolicy {
        self.identity_window = identity_window;
        self
    }
}

impl Default for DedupPolicy {
    fn default() -> DedupPolicy {
        DedupPolicy {
            validity_period: DedupPolicy::DEFAULT_VALIDITY_PERIOD,
            identity_window: IdentityWindow::default(),
        }
    }
}

/// Decides whether an event repeats the last one sent with the same name.
pub struct EventDeduplicator {
    storage: Option<Storage>,
    clock: Arc<dyn Clock + Send + Sync>,
    policy: DedupPolicy,
}

impl EventDeduplicator {
    pub(crate) fn new(
        storage: Option<Storage>,
        clock: Arc<dyn Clock + Send + Sync>,
        policy: DedupPolicy,
    ) -> EventDeduplicator {
        EventDeduplicator {
            storage,
            clock,
            policy,
        }
    }

    /// Returns `true` if `event` matches the last sent event of the same name and that record is
    /// still within its window.
    ///
    /// Missing or corrupt records are never duplicates.
    pub fn is_duplicate(&self, event: &Event) -> bool {
        let Some(storage) = &self.storage else {
            return false;
        };
        let Some(record) = storage.get_json::<SentEventRecord>(&record_key(event.name())) else {
            return false;
        };

        let now = self.clock.now_seconds();
        if !self.within_window(event, record.timestamp, now) {
            return false;
        }

        same_event(&record.event, event)
    }

    /// Persist `event` as the last sent event of its name, replacing any previous record.
    ///
    /// Call this only after the event has been delivered successfully.
    pub fn record_sent(&self, event: &Event) {
        let Some(storage) = &self.storage else {
            return;
        };
        let record = SentEventRecord {
            event: event.clone(),
            timestamp: self.clock.now_seconds(),
        };
        storage.set_json(&record_key(event.name()), &record);
    }

    fn within_window(&self, event: &Event, sent_at: i64, now: i64) -> bool {
        match (event, self.policy.identity_window) {
            (Event::Identity(_), IdentityWindow::SameDay) => same_day(sent_at, now),
            _ => {
                let validity_period =
                    i64::try_from(self.policy.validity_period.as_secs()).unwrap_or(i64::MAX);
                // Records from the future (clock skew or tampering) are treated as expired.
                now.checked_sub(sent_at)
                    .is_some_and(|elapsed| (0..=validity_period).contains(&elapsed))
            }
        }
    }
}

fn record_key(event_name: &str) -> String {
    format!("sent_{}", event_name)
}

/// Field-subset equality. Volatile fields (e.g., `metadata.referrer_url` or arguments other than
/// `page`) are not compared.
fn same_event(previous: &Event, current: &Event) -> bool {
    if !previous
        .metadata()
        .same_attribution(current.metadata())
    {
        return false;
    }

    if let (Some(previous), Some(current)) = (previous.args().get("page"), current.args().get("page"))
    {
        if previous != current {
            return false;
        }
    }

    match (previous.identity(), current.identity()) {
        (None, None) => true,
        (Some(previous), Some(current)) => previous == current,
        // An identity event never repeats a generic one or vice versa.
        _ => false,
    }
}
