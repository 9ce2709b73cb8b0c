//! Static file serving.
//!
//! # Responsibilities
//! - Serve files below a root directory for GET/HEAD under a URL prefix
//! - Refuse any path that resolves outside the root
//!
//! # Design Decisions
//! - The request path is percent-decoded, then normalized lexically; a `..`
//!   that climbs above the root is rejected before touching the filesystem
//! - The surviving path is canonicalized, so symlinks leading out of the
//!   root are rejected as well
//! - Missing files and directories fall through to the rest of the chain
//! - The transport drops the body of HEAD responses

use std::io;
use std::path::{Path, PathBuf};

use axum::http::{Method, StatusCode};
use serde_json::json;
use thiserror::Error;

use crate::context::Context;
use crate::dispatch::{Handler, HandlerResult, Next};
use crate::routing::pattern::{normalize_mount_prefix, strip_mount_prefix, PatternError};

#[derive(Debug, Error)]
pub enum StaticFilesError {
    #[error("invalid static prefix: {0}")]
    Prefix(#[from] PatternError),

    #[error("static root {path} is not usable: {source}")]
    Root {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct StaticFiles {
    prefix: String,
    root: PathBuf,
    cache_control: Option<String>,
}

impl StaticFiles {
    /// The root is created when missing and canonicalized once.
    pub fn new(prefix: &str, root: impl AsRef<Path>) -> Result<Self, StaticFilesError> {
        let prefix = normalize_mount_prefix(prefix)?;
        let root = root.as_ref();
        let root_err = |source| StaticFilesError::Root {
            path: root.to_path_buf(),
            source,
        };
        std::fs::create_dir_all(root).map_err(root_err)?;
        let root = root.canonicalize().map_err(root_err)?;
        Ok(Self {
            prefix,
            root,
            cache_control: None,
        })
    }

    pub fn with_cache_control(mut self, value: impl Into<String>) -> Self {
        self.cache_control = Some(value.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a request path to a file under the root.
    fn resolve(&self, request_path: &str) -> Lookup {
        let Some(rest) = strip_mount_prefix(&self.prefix, request_path) else {
            return Lookup::NotMine;
        };
        let decoded = urlencoding::decode_binary(rest.as_bytes());
        let decoded = String::from_utf8_lossy(&decoded);

        let mut parts: Vec<&str> = Vec::new();
        for part in decoded.split(['/', '\\']) {
            match part {
                "" | "." => {}
                ".." => {
                    if parts.pop().is_none() {
                        return Lookup::Forbidden;
                    }
                }
                p if p.contains('\0') => return Lookup::Forbidden,
                p => parts.push(p),
            }
        }
        if parts.is_empty() {
            return Lookup::NotMine;
        }

        let candidate = parts.iter().fold(self.root.clone(), |acc, p| acc.join(p));
        match candidate.canonicalize() {
            Ok(path) if !path.starts_with(&self.root) => Lookup::Forbidden,
            Ok(path) if path.is_file() => Lookup::File(path),
            Ok(_) => Lookup::NotMine,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Lookup::NotMine,
            Err(e) => Lookup::Failed(e),
        }
    }
}

enum Lookup {
    NotMine,
    Forbidden,
    File(PathBuf),
    Failed(io::Error),
}

impl Handler for StaticFiles {
    fn call(&self, ctx: &mut Context, next: Next<'_>) -> HandlerResult {
        if ctx.method() != Method::GET && ctx.method() != Method::HEAD {
            return next.run(ctx);
        }

        match self.resolve(ctx.path()) {
            Lookup::NotMine => next.run(ctx),
            Lookup::Forbidden => {
                tracing::warn!(path = %ctx.path(), "Blocked static path outside root");
                ctx.json(
                    StatusCode::FORBIDDEN,
                    &json!({ "error": "Forbidden", "message": "Access denied" }),
                )?;
                Ok(())
            }
            Lookup::Failed(e) => Err(e.into()),
            Lookup::File(path) => {
                let content = std::fs::read(&path)?;
                ctx.response
                    .set_status(StatusCode::OK)?
                    .content_type(content_type_for(&path))?;
                if let Some(cache) = &self.cache_control {
                    ctx.response.set_header("cache-control", cache)?;
                }
                ctx.response.send(content)?;
                Ok(())
            }
        }
    }
}

/// Content type by file extension.
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css",
        "js" | "mjs" => "application/javascript",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "webp" => "image/webp",
        "txt" => "text/plain; charset=utf-8",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_types() {
        assert_eq!(content_type_for(Path::new("a/b.CSS")), "text/css");
        assert_eq!(content_type_for(Path::new("logo.png")), "image/png");
        assert_eq!(content_type_for(Path::new("README")), "application/octet-stream");
    }

    #[test]
    fn test_lexical_escape_is_forbidden() {
        let dir = tempfile::tempdir().unwrap();
        let files = StaticFiles::new("/static", dir.path()).unwrap();
        assert!(matches!(files.resolve("/static/../secret"), Lookup::Forbidden));
        assert!(matches!(files.resolve("/static/%2e%2e/secret"), Lookup::Forbidden));
        assert!(matches!(files.resolve("/static/a/../../x"), Lookup::Forbidden));
        assert!(matches!(files.resolve("/other/x"), Lookup::NotMine));
        assert!(matches!(files.resolve("/static/missing.txt"), Lookup::NotMine));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_out_of_root_is_forbidden() {
        let root = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        let secret = outside.path().join("secret.txt");
        std::fs::write(&secret, "top-secret-bytes").unwrap();
        std::os::unix::fs::symlink(&secret, root.path().join("link.txt")).unwrap();
        std::os::unix::fs::symlink(outside.path(), root.path().join("dir")).unwrap();

        let files = StaticFiles::new("/static", root.path()).unwrap();
        assert!(matches!(files.resolve("/static/link.txt"), Lookup::Forbidden));
        assert!(matches!(files.resolve("/static/dir/secret.txt"), Lookup::Forbidden));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_inside_root_is_served() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("real.txt"), "hello").unwrap();
        std::os::unix::fs::symlink(root.path().join("real.txt"), root.path().join("alias.txt")).unwrap();

        let files = StaticFiles::new("/static", root.path()).unwrap();
        assert!(matches!(files.resolve("/static/alias.txt"), Lookup::File(_)));
    }
}
