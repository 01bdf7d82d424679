//! First-touch attribution: how the visitor arrived, resolved once and persisted.
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{id::IdGenerator, page::PageContext, storage::Storage};

pub(crate) const TRACKING_ID_KEY: &str = "tracking_id";
pub(crate) const AFFILIATE_ID_KEY: &str = "affiliate_id";
pub(crate) const TRAFFIC_SOURCE_KEY: &str = "traffic_source";
pub(crate) const TRAFFIC_CATEGORY_KEY: &str = "traffic_category";
pub(crate) const TRAFFIC_TITLE_KEY: &str = "traffic_title";
pub(crate) const TRAFFIC_TAG_KEY: &str = "traffic_tag";
pub(crate) const TRAFFIC_REFERRER_URL_KEY: &str = "referrer_url";

/// Referrer hosts classified as organic search traffic.
const SEARCH_ENGINE_DOMAINS: &[&str] = &["google.com", "bing.com", "yahoo.com"];

/// Snapshot of all attribution fields.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributionContext {
    /// Opaque per-visitor identifier.
    pub tracking_id: String,
    /// Referring affiliate, or empty.
    pub affiliate_id: String,
    /// `affiliate`, `organic`, `direct`, or the explicit `source` query parameter.
    pub traffic_source: String,
    /// `category` query parameter, or empty.
    pub traffic_category: String,
    /// `title` query parameter, or empty.
    pub traffic_title: String,
    /// `tag` query parameter, or empty.
    pub traffic_tag: String,
    /// Document referrer at first visit, or empty.
    pub referrer_url: String,
}

/// Resolves attribution fields from the current page and persists them.
///
/// Each field is computed at most once per storage lifetime: once a key exists in storage, its
/// value is returned as is, even if the page URL has changed since. Fields resolved to no value
/// are stored as empty strings.
///
/// All getters return `None` when storage or the page is unavailable (e.g., outside a browser).
pub struct AttributionResolver {
    storage: Option<Storage>,
    page: Option<Arc<dyn PageContext + Send + Sync>>,
    id_generator: Box<dyn IdGenerator + Send + Sync>,
}

impl AttributionResolver {
    pub(crate) fn new(
        storage: Option<Storage>,
        page: Option<Arc<dyn PageContext + Send + Sync>>,
        id_generator: Box<dyn IdGenerator + Send + Sync>,
    ) -> AttributionResolver {
        AttributionResolver {
            storage,
            page,
            id_generator,
        }
    }

    /// Return the value stored under `key`, or compute it with `init`, store it, and return it.
    pub fn get_or_init(
        &self,
        key: &str,
        init: impl FnOnce(&dyn PageContext) -> String,
    ) -> Option<String> {
        let (Some(storage), Some(page)) = (&self.storage, &self.page) else {
            log::debug!(target: "attribution", key; "storage or page unavailable, skipping attribution");
            return None;
        };

        if let Some(value) = storage.get(key) {
            return Some(value);
        }

        let value = init(page.as_ref());
        log::trace!(target: "attribution", key, value:display = value; "resolved attribution field");
        storage.set(key, &value);
        Some(value)
    }

    /// Per-visitor tracking id, generated on first access.
    pub fn tracking_id(&self) -> Option<String> {
        self.get_or_init(TRACKING_ID_KEY, |_| self.id_generator.generate_id())
    }

    /// Affiliate id from the `af` or `referrer` query parameter.
    pub fn affiliate_id(&self) -> Option<String> {
        self.get_or_init(AFFILIATE_ID_KEY, affiliate_from_query)
    }

    /// Traffic source, see [`AttributionResolver::get_or_init`] for persistence rules.
    ///
    /// Detection order, first match wins:
    /// 1. explicit non-empty `source` query parameter;
    /// 2. `"affiliate"` if the `af` or `referrer` query parameter is set;
    /// 3. `"organic"` if the referrer host is a known search engine;
    /// 4. `"direct"`.
    pub fn traffic_source(&self) -> Option<String> {
        self.get_or_init(TRAFFIC_SOURCE_KEY, |page| {
            if let Some(source) = page.query_param("source") {
                return source;
            }
            if !affiliate_from_query(page).is_empty() {
                return "affiliate".to_owned();
            }
            if is_search_engine(&page.referrer()) {
                return "organic".to_owned();
            }
            "direct".to_owned()
        })
    }

    /// Campaign category from the `category` query parameter.
    pub fn traffic_category(&self) -> Option<String> {
        self.get_or_init(TRAFFIC_CATEGORY_KEY, |page| query_or_empty(page, "category"))
    }

    /// Campaign title from the `title` query parameter.
    pub fn traffic_title(&self) -> Option<String> {
        self.get_or_init(TRAFFIC_TITLE_KEY, |page| query_or_empty(page, "title"))
    }

    /// Campaign tag from the `tag` query parameter.
    pub fn traffic_tag(&self) -> Option<String> {
        self.get_or_init(TRAFFIC_TAG_KEY, |page| query_or_empty(page, "tag"))
    }

    /// Document referrer at first resolution.
    pub fn referrer_url(&self) -> Option<String> {
        self.get_or_init(TRAFFIC_REFERRER_URL_KEY, |page| page.referrer())
    }

    /// Resolve every field. Returns `None` if attribution is unavailable.
    pub fn context(&self) -> Option<AttributionContext> {
        Some(AttributionContext {
            tracking_id: self.tracking_id()?,
            affiliate_id: self.affiliate_id()?,
            traffic_source: self.traffic_source()?,
            traffic_category: self.traffic_category()?,
            traffic_title: self.traffic_title()?,
            traffic_tag: self.traffic_tag()?,
            referrer_url: self.referrer_url()?,
        })
    }
}

fn query_or_empty(page: &dyn PageContext, name: &str) -> String {
    page.query_param(name).unwrap_or_default()
}

fn affiliate_from_query(page: &dyn PageContext) -> String {
    page.query_param("af")
        .or_else(|| page.query_param("referrer"))
        .unwrap_or_default()
}

/// Host-based match: `www.google.com` and `google.com` match, `notgoogle.com` does not.
fn is_search_engine(referrer: &str) -> bool {
    let Ok(url) = Url::parse(referrer) else {
        return false;
    };
    let Some(host) = url.host_str() else {
        return false;
    };
    SEARCH_ENGINE_DOMAINS.iter().any(|domain| {
        host == *domain
            || host
                .strip_suffix(domain)
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}
