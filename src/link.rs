use url::Url;

use crate::{Error, Result};

/// Optional campaign labels carried by a tracking link.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TrackingLinkParams {
    /// Sent as `title`.
    pub title: Option<String>,
    /// Sent as `source`. Overrides source detection on arrival.
    pub source: Option<String>,
    /// Sent as `category`.
    pub category: Option<String>,
    /// Sent as `tag`.
    pub tag: Option<String>,
}

/// Build a link to `base_url` that attributes visitors to `affiliate_id`.
///
/// The link carries the same query parameters that [`AttributionResolver`](crate::AttributionResolver)
/// reads on arrival. Existing query parameters of `base_url` are preserved.
///
/// ```
/// # use attribution::{tracking_link, TrackingLinkParams};
/// let link = tracking_link("https://example.com/", "0xabc", &TrackingLinkParams {
///     source: Some("twitter".to_owned()),
///     ..Default::default()
/// })
/// .unwrap();
/// assert_eq!(link, "https://example.com/?af=0xabc&source=twitter");
/// ```
pub fn tracking_link(base_url: &str, affiliate_id: &str, params: &TrackingLinkParams) -> Result<String> {
    let mut url = Url::parse(base_url).map_err(Error::InvalidUrl)?;
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("af", affiliate_id);
        let labels = [
            ("title", &params.title),
            ("source", &params.source),
            ("category", &params.category),
            ("tag", &params.tag),
        ];
        for (name, value) in labels {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                query.append_pair(name, value);
            }
        }
    }
    Ok(url.into())
}
