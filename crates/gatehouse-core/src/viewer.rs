//! Resource viewer URL normalization.
//!
//! Catalog entries arrive in whatever form editors typed them: absolute,
//! protocol-relative, root-relative, with stray whitespace or plain `http`.
//! The viewer turns each into one canonical `https` URL that can be opened
//! directly.

use thiserror::Error;
use url::Url;

/// Errors from URL normalization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewerError {
    /// Resource has no URL.
    #[error("resource URL is empty")]
    Empty,

    /// URL uses a scheme the viewer will not open.
    #[error("unsupported URL scheme: {scheme}")]
    UnsupportedScheme {
        /// Offending scheme.
        scheme: String,
    },

    /// URL could not be parsed.
    #[error("invalid resource URL {raw:?}: {reason}")]
    Invalid {
        /// Input as given.
        raw: String,
        /// Parser message.
        reason: String,
    },
}

/// Normalizes resource locations against an asset host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    asset_base: Url,
}

impl Viewer {
    /// Create a viewer that resolves relative paths against `asset_base`.
    pub fn new(asset_base: Url) -> Self {
        Self { asset_base }
    }

    /// Parse `asset_base` and create a viewer.
    pub fn parse(asset_base: &str) -> Result<Self, ViewerError> {
        let base = Url::parse(asset_base.trim()).map_err(|e| ViewerError::Invalid {
            raw: asset_base.to_owned(),
            reason: e.to_string(),
        })?;
        Ok(Self::new(base))
    }

    /// Asset host used for relative paths.
    pub fn asset_base(&self) -> &Url {
        &self.asset_base
    }

    /// Canonical viewable form of `raw`.
    ///
    /// - surrounding whitespace is trimmed
    /// - `//host/path` gains `https:`
    /// - `http:` is upgraded to `https:`
    /// - relative paths resolve against the asset host
    /// - any scheme other than http(s) is rejected
    pub fn normalize(&self, raw: &str) -> Result<Url, ViewerError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ViewerError::Empty);
        }

        let invalid = |e: url::ParseError| ViewerError::Invalid {
            raw: raw.to_owned(),
            reason: e.to_string(),
        };

        let mut url = if let Some(rest) = trimmed.strip_prefix("//") {
            Url::parse(&format!("https://{rest}")).map_err(invalid)?
        } else {
            match Url::parse(trimmed) {
                Ok(url) => url,
                Err(url::ParseError::RelativeUrlWithoutBase) => {
                    self.asset_base.join(trimmed).map_err(invalid)?
                },
                Err(e) => return Err(invalid(e)),
            }
        };

        match url.scheme() {
            "https" => {},
            "http" => {
                url.set_scheme("https").map_err(|()| ViewerError::UnsupportedScheme {
                    scheme: "http".to_owned(),
                })?;
            },
            other => return Err(ViewerError::UnsupportedScheme { scheme: other.to_owned() }),
        }

        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewer() -> Viewer {
        Viewer::parse("https://assets.example.com/media/").expect("base")
    }

    #[test]
    fn absolute_https_unchanged() {
        let url = viewer().normalize("https://cdn.example.com/a.pdf").expect("normalize");
        assert_eq!(url.as_str(), "https://cdn.example.com/a.pdf");
    }

    #[test]
    fn http_upgraded_and_trimmed() {
        let url = viewer().normalize("  http://cdn.example.com/a.pdf\n").expect("normalize");
        assert_eq!(url.as_str(), "https://cdn.example.com/a.pdf");
    }

    #[test]
    fn protocol_relative() {
        let url = viewer().normalize("//cdn.example.com/chair.dwg").expect("normalize");
        assert_eq!(url.as_str(), "https://cdn.example.com/chair.dwg");
    }

    #[test]
    fn relative_paths_join_asset_base() {
        let v = viewer();
        assert_eq!(
            v.normalize("/files/guide.pdf").expect("root relative").as_str(),
            "https://assets.example.com/files/guide.pdf"
        );
        assert_eq!(
            v.normalize("guide.pdf").expect("path relative").as_str(),
            "https://assets.example.com/media/guide.pdf"
        );
    }

    #[test]
    fn rejects_empty_and_foreign_schemes() {
        let v = viewer();
        assert_eq!(v.normalize("   "), Err(ViewerError::Empty));
        assert_eq!(
            v.normalize("javascript:alert(1)"),
            Err(ViewerError::UnsupportedScheme { scheme: "javascript".to_owned() })
        );
        assert!(matches!(
            v.normalize("ftp://files.example.com/a.pdf"),
            Err(ViewerError::UnsupportedScheme { .. })
        ));
    }

    #[test]
    fn rejects_unparseable() {
        assert!(matches!(viewer().normalize("https://"), Err(ViewerError::Invalid { .. })));
        assert!(matches!(Viewer::parse("not a url"), Err(ViewerError::Invalid { .. })));
    }
}
