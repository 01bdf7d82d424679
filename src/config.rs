use std::sync::Arc;

use crate::{
    clock::{Clock, SystemClock},
    event_logger::NoopEventLogger,
    id::{IdGenerator, RandomIdGenerator},
    Client, DedupPolicy, EventLogger, KeyValueStore, PageContext, Result, Transport,
};

/// Configuration for [`Client`].
///
/// Browser capabilities (`storage` and `page`) are optional. When either is missing, the client
/// behaves as if it runs outside a browser: attribution is unavailable and events are not sent.
///
/// # Examples
/// ```
/// # use attribution::{ClientConfig, InMemoryStore, StaticPage};
/// let client = ClientConfig::from_api_key("api-key")
///     .project_id("my-project")
///     .storage(InMemoryStore::new())
///     .page(StaticPage::parse("https://example.com/?af=partner", "").unwrap())
///     .to_client()
///     .unwrap();
/// ```
pub struct ClientConfig {
    pub(crate) api_key: String,
    pub(crate) base_url: String,
    pub(crate) project_id: Option<String>,
    pub(crate) namespace: String,
    pub(crate) default_query_params: Vec<(String, String)>,
    pub(crate) storage: Option<Arc<dyn KeyValueStore + Send + Sync>>,
    pub(crate) page: Option<Arc<dyn PageContext + Send + Sync>>,
    pub(crate) id_generator: Box<dyn IdGenerator + Send + Sync>,
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,
    pub(crate) transport: Option<Box<dyn Transport + Send + Sync>>,
    pub(crate) event_logger: Box<dyn EventLogger + Send + Sync>,
    pub(crate) dedup_policy: DedupPolicy,
}

impl ClientConfig {
    /// Default base URL for API calls.
    pub const DEFAULT_BASE_URL: &'static str = "https://api.attribution.dev/api/v1";

    /// Default storage key namespace.
    pub const DEFAULT_NAMESPACE: &'static str = "attribution";

    /// Create a default configuration using the specified API key.
    ///
    /// ```
    /// # use attribution::ClientConfig;
    /// ClientConfig::from_api_key("api-key");
    /// ```
    pub fn from_api_key(api_key: impl Into<String>) -> Self {
        ClientConfig {
            api_key: api_key.into(),
            base_url: ClientConfig::DEFAULT_BASE_URL.to_owned(),
            project_id: None,
            namespace: ClientConfig::DEFAULT_NAMESPACE.to_owned(),
            default_query_params: Vec::new(),
            storage: None,
            page: None,
            id_generator: Box::new(RandomIdGenerator),
            clock: Arc::new(SystemClock),
            transport: None,
            event_logger: Box::new(NoopEventLogger),
            dedup_policy: DedupPolicy::default(),
        }
    }

    /// Override base URL for API calls. Clients should use the default setting in most cases.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Project that events belong to. Sent as `metadata.project_id`.
    pub fn project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Prefix for all storage keys. Clients sharing a namespace share attribution state.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Add a query parameter to every request.
    pub fn default_query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_query_params.push((name.into(), value.into()));
        self
    }

    /// Persistent storage for attribution and sent-event records.
    pub fn storage(mut self, storage: impl KeyValueStore + Send + Sync + 'static) -> Self {
        self.storage = Some(Arc::new(storage));
        self
    }

    /// The page the SDK runs on.
    pub fn page(mut self, page: impl PageContext + Send + Sync + 'static) -> Self {
        self.page = Some(Arc::new(page));
        self
    }

    /// Override the tracking id generator.
    pub fn id_generator(mut self, id_generator: impl IdGenerator + Send + Sync + 'static) -> Self {
        self.id_generator = Box::new(id_generator);
        self
    }

    /// Override the clock used for deduplication windows.
    pub fn clock(mut self, clock: impl Clock + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Replace the HTTP transport. `base_url`, `api_key`, and `default_query_param` are ignored
    /// when a custom transport is set.
    pub fn transport(mut self, transport: impl Transport + Send + Sync + 'static) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    /// Observe events after they have been sent.
    ///
    /// ```
    /// # use attribution::ClientConfig;
    /// let config = ClientConfig::from_api_key("api-key").event_logger(|event: &attribution::Event| {
    ///   println!("{:?}", event);
    /// });
    /// ```
    pub fn event_logger(mut self, event_logger: impl EventLogger + Send + Sync + 'static) -> Self {
        self.event_logger = Box::new(event_logger);
        self
    }

    /// Override deduplication settings.
    pub fn dedup_policy(mut self, dedup_policy: DedupPolicy) -> Self {
        self.dedup_policy = dedup_policy;
        self
    }

    /// Create a new [`Client`] using the specified configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBaseUrl`](crate::Error::InvalidBaseUrl) if `base_url` cannot be
    /// parsed.
    pub fn to_client(self) -> Result<Client> {
        Client::new(self)
    }
}
