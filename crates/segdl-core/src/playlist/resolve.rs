//! Base-URL derivation and locator resolution.

use url::Url;

use crate::error::ParseError;

/// Source URL with query and fragment dropped and the last path component
/// stripped, keeping the trailing `/`.
///
/// `https://cdn.example.com/show/ep01/index.m3u8?sig=1` → `https://cdn.example.com/show/ep01/`
pub fn base_locator(source: &str) -> Result<Url, ParseError> {
    let mut url = Url::parse(source).map_err(|source_err| ParseError::InvalidLocator {
        locator: source.to_string(),
        source: source_err,
    })?;
    url.set_query(None);
    url.set_fragment(None);
    let dir = match url.path().rfind('/') {
        Some(i) => url.path()[..=i].to_string(),
        None => "/".to_string(),
    };
    url.set_path(&dir);
    Ok(url)
}

/// Resolve a segment locator against `base`. Absolute locators come back
/// unchanged whatever the base is.
pub fn resolve(base: &Url, locator: &str) -> Result<Url, ParseError> {
    let invalid = |source| ParseError::InvalidLocator {
        locator: locator.to_string(),
        source,
    };
    match Url::parse(locator) {
        Ok(abs) => Ok(abs),
        Err(url::ParseError::RelativeUrlWithoutBase) => base.join(locator).map_err(invalid),
        Err(e) => Err(invalid(e)),
    }
}
