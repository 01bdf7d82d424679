use std::sync::Arc;

use crate::{
    attribution::{AttributionContext, AttributionResolver},
    dedup::EventDeduplicator,
    event::{Event, EventArgs, EventMetadata, GenericEvent, Identity, IdentityEvent},
    link::{tracking_link, TrackingLinkParams},
    storage::Storage,
    transport::{HttpTransport, HttpTransportConfig, Response, Transport},
    ClientConfig, EventLogger, PageContext, Result,
};

const EVENTS_ENDPOINT: &str = "events";

/// Name of the event sent by [`Client::track_pageview`].
pub const PAGEVIEW_EVENT: &str = "pageview";
/// Name of the event sent by [`Client::identify`].
pub const CONNECT_WALLET_EVENT: &str = "connect_wallet";

/// Result of [`Client::send`] when no transport error occurred.
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// The event was delivered.
    Sent(Response),
    /// An identical event was sent recently. Nothing was sent.
    Duplicate,
    /// Attribution is unavailable (storage or page missing). Nothing was sent.
    Unattributed,
}

/// A client that attaches attribution metadata to events and sends them to the collection
/// endpoint, suppressing recent duplicates.
///
/// In order to create a client instance, first create [`ClientConfig`].
///
/// # Examples
/// ```no_run
/// # use attribution::{ClientConfig, InMemoryStore, StaticPage};
/// let client = ClientConfig::from_api_key("api-key")
///     .storage(InMemoryStore::new())
///     .page(StaticPage::parse("https://example.com/?af=partner", "").unwrap())
///     .to_client()
///     .unwrap();
/// client.track_pageview(None).unwrap();
/// ```
pub struct Client {
    attribution: AttributionResolver,
    deduplicator: EventDeduplicator,
    transport: Box<dyn Transport + Send + Sync>,
    event_logger: Box<dyn EventLogger + Send + Sync>,
    page: Option<Arc<dyn PageContext + Send + Sync>>,
    project_id: Option<String>,
}

impl Client {
    /// Create a new `Client` using the specified configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = match config.transport {
            Some(transport) => transport,
            None => Box::new(HttpTransport::new(HttpTransportConfig {
                base_url: config.base_url,
                api_key: config.api_key,
                default_query_params: config.default_query_params,
            })?),
        };

        let storage = config
            .storage
            .map(|store| Storage::new(store, &config.namespace));
        if storage.is_none() || config.page.is_none() {
            log::warn!(target: "attribution", "storage or page is not configured, events will not be sent");
        }

        Ok(Client {
            attribution: AttributionResolver::new(
                storage.clone(),
                config.page.clone(),
                config.id_generator,
            ),
            deduplicator: EventDeduplicator::new(storage, config.clock, config.dedup_policy),
            transport,
            event_logger: config.event_logger,
            page: config.page,
            project_id: config.project_id,
        })
    }

    /// Access the attribution resolver.
    pub fn attribution_resolver(&self) -> &AttributionResolver {
        &self.attribution
    }

    /// Access the event deduplicator.
    pub fn deduplicator(&self) -> &EventDeduplicator {
        &self.deduplicator
    }

    /// Resolve all attribution fields. Returns `None` outside a browser context.
    pub fn attribution(&self) -> Option<AttributionContext> {
        self.attribution.context()
    }

    /// Build metadata for a new event. Returns `None` if attribution is unavailable.
    pub fn metadata(&self) -> Option<EventMetadata> {
        let context = self.attribution.context()?;
        Some(EventMetadata {
            tracking_id: context.tracking_id,
            project_id: self.project_id.clone(),
            referrer: context.affiliate_id,
            source: context.traffic_source,
            category: context.traffic_category,
            title: context.traffic_title,
            tag: context.traffic_tag,
            referrer_url: context.referrer_url,
        })
    }

    /// Send a custom event with the current attribution metadata.
    pub fn track(&self, name: impl Into<String>, args: EventArgs) -> Result<SendOutcome> {
        let Some(metadata) = self.metadata() else {
            return Ok(SendOutcome::Unattributed);
        };
        self.send(GenericEvent {
            name: name.into(),
            args,
            metadata,
        })
    }

    /// Send a `pageview` event. `page` defaults to the current location path.
    pub fn track_pageview(&self, page: Option<&str>) -> Result<SendOutcome> {
        let Some(location) = self.page.as_ref().map(|p| p.location()) else {
            return Ok(SendOutcome::Unattributed);
        };
        let page = page.unwrap_or(location.path());

        let mut args = EventArgs::new();
        args.insert("page".to_owned(), page.into());
        args.insert(
            "locationOrigin".to_owned(),
            location.origin().ascii_serialization().into(),
        );
        self.track(PAGEVIEW_EVENT, args)
    }

    /// Send a `connect_wallet` event proving the visitor's identity.
    pub fn identify(&self, identity: Identity) -> Result<SendOutcome> {
        let Some(metadata) = self.metadata() else {
            return Ok(SendOutcome::Unattributed);
        };
        self.send(IdentityEvent {
            name: CONNECT_WALLET_EVENT.to_owned(),
            identity,
            args: EventArgs::new(),
            metadata,
        })
    }

    /// Send `event` unless it repeats a recently sent one.
    ///
    /// # Errors
    ///
    /// Transport errors are returned unchanged. A failed event is not recorded, so sending it
    /// again is not treated as a duplicate.
    pub fn send(&self, event: impl Into<Event>) -> Result<SendOutcome> {
        let event = event.into();
        let event_name = event.name();

        if event.metadata().tracking_id.is_empty() {
            log::debug!(target: "attribution", event_name; "no tracking id, skipping event");
            return Ok(SendOutcome::Unattributed);
        }

        if self.deduplicator.is_duplicate(&event) {
            log::debug!(target: "attribution", event_name; "suppressing duplicate event");
            return Ok(SendOutcome::Duplicate);
        }

        let body = serde_json::to_value(&event)?;
        let response = self
            .transport
            .post(EVENTS_ENDPOINT, &body)
            .inspect_err(|err| {
                log::warn!(target: "attribution", event_name; "failed to send event: {:?}", err);
            })?;

        log::debug!(target: "attribution", event_name; "sent event");
        self.deduplicator.record_sent(&event);
        self.event_logger.log_event(&event);

        Ok(SendOutcome::Sent(response))
    }

    /// Build a tracking link attributing visitors of `base_url` to `affiliate_id`.
    pub fn tracking_link(
        &self,
        base_url: &str,
        affiliate_id: &str,
        params: &TrackingLinkParams,
    ) -> Result<String> {
        tracking_link(base_url, affiliate_id, params)
    }
}
