//! Access to the current page: its URL and the document referrer.
use url::Url;

use crate::{Error, Result};

/// The page the SDK is running on.
///
/// In a browser, `location` is `window.location.href` and `referrer` is `document.referrer`.
pub trait PageContext {
    /// Current page URL.
    fn location(&self) -> Url;

    /// The document referrer. Empty if there is none.
    fn referrer(&self) -> String;

    /// Read a single query-string parameter from the current page URL.
    ///
    /// Returns `None` if the parameter is absent or empty.
    fn query_param(&self, name: &str) -> Option<String> {
        self.location()
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty())
    }
}

/// A fixed [`PageContext`], parsed once from a URL string.
#[derive(Debug, Clone)]
pub struct StaticPage {
    location: Url,
    referrer: String,
}

impl StaticPage {
    /// Create a page from its URL and the referrer it was reached from (`""` for none).
    ///
    /// ```
    /// # use attribution::StaticPage;
    /// let page = StaticPage::parse("https://example.com/?af=partner", "").unwrap();
    /// ```
    pub fn parse(location: &str, referrer: impl Into<String>) -> Result<StaticPage> {
        let location = Url::parse(location).map_err(Error::InvalidUrl)?;
        Ok(StaticPage {
            location,
            referrer: referrer.into(),
        })
    }
}

impl PageContext for StaticPage {
    fn location(&self) -> Url {
        self.location.clone()
    }

    fn referrer(&self) -> String {
        self.referrer.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::{PageContext, StaticPage};

    #[test]
    fn reads_query_params() {
        let page = StaticPage::parse("https://example.com/path?af=xyz&source=news%20letter", "")
            .unwrap();
        assert_eq!(page.query_param("af").as_deref(), Some("xyz"));
        assert_eq!(page.query_param("source").as_deref(), Some("news letter"));
        assert_eq!(page.query_param("referrer"), None);
    }

    #[test]
    fn empty_query_param_is_absent() {
        let page = StaticPage::parse("https://example.com/?af=", "").unwrap();
        assert_eq!(page.query_param("af"), None);
    }

    #[test]
    fn rejects_invalid_location() {
        assert!(StaticPage::parse("not a url", "").is_err());
    }
}
