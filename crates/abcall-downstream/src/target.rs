//! Downstream operation addressing.

use url::Url;

use crate::error::TransportError;

/// One operation on one downstream service: an immutable base URL plus a
/// path relative to it.
///
/// Joining always yields exactly one `/` between base and path, whatever
/// slashes either side carries. A trailing slash on the path survives, since
/// the directory service distinguishes `/company/` from `/company`.
///
/// Caller-supplied identifiers go in a separate segment that is
/// percent-encoded on resolution, so `/`, `?`, `#` and `%` in it can never
/// change which operation is addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownstreamTarget {
    base: Url,
    path: String,
    segment: Option<String>,
}

impl DownstreamTarget {
    pub fn new(base: &Url, path: impl Into<String>) -> Self {
        Self {
            base: base.clone(),
            path: path.into(),
            segment: None,
        }
    }

    /// A fixed `path` followed by one opaque path segment.
    pub fn with_segment(base: &Url, path: impl Into<String>, segment: impl Into<String>) -> Self {
        Self {
            base: base.clone(),
            path: path.into(),
            segment: Some(segment.into()),
        }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether `segment` can be sent as one opaque path segment.
    pub fn accepts_segment(segment: &str) -> bool {
        is_opaque_segment(segment)
    }

    pub fn segment(&self) -> Option<&str> {
        self.segment.as_deref()
    }

    /// `path/segment` as written, for log and error labels.
    pub fn label(&self) -> String {
        match &self.segment {
            Some(segment) => format!("{}/{}", self.path.trim_end_matches('/'), segment),
            None => self.path.clone(),
        }
    }

    /// Resolve the absolute URL of this operation.
    pub fn url(&self) -> Result<Url, TransportError> {
        let joined = format!(
            "{}/{}",
            self.base.as_str().trim_end_matches('/'),
            self.path.trim_start_matches('/')
        );
        let mut url = Url::parse(&joined).map_err(|source| TransportError::InvalidTarget {
            url: joined,
            source,
        })?;

        if let Some(segment) = &self.segment {
            if !is_opaque_segment(segment) {
                return Err(TransportError::InvalidSegment(segment.clone()));
            }
            url.path_segments_mut()
                .map_err(|()| TransportError::InvalidSegment(segment.clone()))?
                .pop_if_empty()
                .push(segment);
        }
        Ok(url)
    }
}

/// Dot segments are dropped by URL normalization and control characters are
/// stripped, so neither can be addressed as a single opaque segment.
fn is_opaque_segment(segment: &str) -> bool {
    !matches!(segment, "" | "." | "..") && !segment.chars().any(char::is_control)
}
