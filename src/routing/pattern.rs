//! Path pattern compilation and matching.
//!
//! # Responsibilities
//! - Compile a route declaration (`/users/:id/files/*`) into typed segments
//! - Match a request path segment-by-segment, binding captures
//! - Reject malformed declarations at registration time
//!
//! # Design Decisions
//! - Literal segments compare byte-for-byte against the raw path (case-sensitive)
//! - Captures match exactly one non-empty segment and are percent-decoded
//! - Wildcard is terminal-only and binds the remainder under `*`
//! - No regex, no backtracking: matching is O(segments)

use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Parameter name bound by a trailing wildcard.
pub const WILDCARD_PARAM: &str = "*";

/// Path parameters produced by a successful match.
pub type ParamMap = HashMap<String, String>;

/// Errors raised while compiling a route declaration or mount prefix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// Pattern does not start with `/`.
    #[error("pattern `{0}` must start with '/'")]
    MissingLeadingSlash(String),

    /// A `*` segment appears before the end of the pattern.
    #[error("wildcard must be the last segment in `{0}`")]
    WildcardNotLast(String),

    /// Two captures in one pattern share a name.
    #[error("capture `:{name}` declared twice in `{pattern}`")]
    DuplicateCapture { pattern: String, name: String },

    /// Capture name is empty or contains characters outside `[A-Za-z0-9_]`.
    #[error("invalid capture name `{name}` in `{pattern}`")]
    InvalidCaptureName { pattern: String, name: String },

    /// Mount prefix is not a literal path.
    #[error("mount prefix `{0}` must be a literal path starting with '/'")]
    InvalidMountPrefix(String),

    /// Route declared without any handler.
    #[error("route `{0}` has no handlers")]
    EmptyChain(String),
}

/// One compiled segment of a [`PathPattern`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Capture(String),
    Wildcard,
}

/// A compiled route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    source: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Compile a declaration such as `/items/:id` or `/static/*`.
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        let Some(body) = pattern.strip_prefix('/') else {
            return Err(PatternError::MissingLeadingSlash(pattern.to_string()));
        };
        let body = body.strip_suffix('/').unwrap_or(body);

        let raw: Vec<&str> = split_path(body);
        let mut segments = Vec::with_capacity(raw.len());
        let mut seen: Vec<&str> = Vec::new();

        for (i, part) in raw.iter().enumerate() {
            if *part == WILDCARD_PARAM {
                if i + 1 != raw.len() {
                    return Err(PatternError::WildcardNotLast(pattern.to_string()));
                }
                segments.push(Segment::Wildcard);
            } else if let Some(name) = part.strip_prefix(':') {
                if !is_valid_name(name) {
                    return Err(PatternError::InvalidCaptureName {
                        pattern: pattern.to_string(),
                        name: name.to_string(),
                    });
                }
                if seen.contains(&name) {
                    return Err(PatternError::DuplicateCapture {
                        pattern: pattern.to_string(),
                        name: name.to_string(),
                    });
                }
                seen.push(name);
                segments.push(Segment::Capture(name.to_string()));
            } else {
                segments.push(Segment::Literal((*part).to_string()));
            }
        }

        Ok(Self {
            source: pattern.to_string(),
            segments,
        })
    }

    /// The declaration this pattern was compiled from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    fn has_wildcard(&self) -> bool {
        matches!(self.segments.last(), Some(Segment::Wildcard))
    }

    /// Match a request path, returning bound parameters on success.
    ///
    /// A non-match is a normal outcome and yields `None`.
    pub fn matches(&self, path: &str) -> Option<ParamMap> {
        let body = normalize(path)?;
        let parts = split_path(body);

        let fixed = if self.has_wildcard() {
            self.segments.len() - 1
        } else {
            self.segments.len()
        };

        if self.has_wildcard() {
            if parts.len() < fixed {
                return None;
            }
        } else if parts.len() != fixed {
            return None;
        }

        let mut params = ParamMap::new();
        for (segment, part) in self.segments[..fixed].iter().zip(&parts) {
            match segment {
                Segment::Literal(lit) => {
                    if lit.as_bytes() != part.as_bytes() {
                        return None;
                    }
                }
                Segment::Capture(name) => {
                    if part.is_empty() {
                        return None;
                    }
                    params.insert(name.clone(), decode(part));
                }
                Segment::Wildcard => {}
            }
        }

        if self.has_wildcard() {
            let rest = parts[fixed..].join("/");
            params.insert(WILDCARD_PARAM.to_string(), decode(&rest));
        }

        Some(params)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Validate a mount prefix and return its canonical form (no trailing slash,
/// `/` stays `/`).
pub fn normalize_mount_prefix(prefix: &str) -> Result<String, PatternError> {
    let invalid = || PatternError::InvalidMountPrefix(prefix.to_string());

    let body = prefix.strip_prefix('/').ok_or_else(invalid)?;
    let body = body.strip_suffix('/').unwrap_or(body);

    for part in split_path(body) {
        if part.is_empty() || part.starts_with(':') || part.contains('*') {
            return Err(invalid());
        }
    }

    Ok(format!("/{body}"))
}

/// If `path` lies under `prefix` (segment-aligned), return the remainder as an
/// absolute path.
pub fn strip_mount_prefix<'a>(prefix: &str, path: &'a str) -> Option<std::borrow::Cow<'a, str>> {
    use std::borrow::Cow;

    if prefix == "/" {
        return Some(Cow::Borrowed(path));
    }
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() {
        Some(Cow::Owned("/".to_string()))
    } else if rest.starts_with('/') {
        Some(Cow::Borrowed(rest))
    } else {
        None
    }
}

/// Strip the leading slash and at most one trailing slash from a request path.
fn normalize(path: &str) -> Option<&str> {
    let body = path.strip_prefix('/')?;
    Some(body.strip_suffix('/').unwrap_or(body))
}

fn split_path(body: &str) -> Vec<&str> {
    if body.is_empty() {
        Vec::new()
    } else {
        body.split('/').collect()
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn decode(raw: &str) -> String {
    String::from_utf8_lossy(&urlencoding::decode_binary(raw.as_bytes())).into_owned()
}
