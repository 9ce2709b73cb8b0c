//! Request body with a lazily parsed structured view.

use std::cell::OnceCell;
use std::collections::HashMap;

use axum::body::Bytes;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Decoded `application/x-www-form-urlencoded` fields (last value wins).
pub type FormMap = HashMap<String, String>;

/// Structured view of a request body, selected by its declared content type.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed {
    Json(Value),
    Form(FormMap),
    /// Empty body or a content type with no structured parser.
    Unparsed,
    /// Parsing was attempted and failed; the failure is cached.
    Error(String),
}

/// Errors returned by the typed body accessors.
#[derive(Debug, Error)]
pub enum BodyError {
    #[error("request body is not JSON (content type: {0})")]
    NotJson(String),

    #[error("request body is not form data (content type: {0})")]
    NotForm(String),

    #[error("invalid request body: {0}")]
    Malformed(String),

    #[error("request body does not match expected shape: {0}")]
    Shape(#[from] serde_json::Error),
}

/// Raw request body plus a memoized [`Parsed`] view.
#[derive(Debug, Default)]
pub struct Body {
    raw: Bytes,
    content_type: Option<String>,
    parsed: OnceCell<Parsed>,
}

impl Body {
    pub fn new(raw: Bytes, content_type: Option<String>) -> Self {
        Self {
            raw,
            content_type,
            parsed: OnceCell::new(),
        }
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Body as UTF-8 text, if valid.
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.raw).ok()
    }

    /// Declared content type, as sent by the client.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Parse on first access; later calls return the cached result,
    /// including a cached failure.
    pub fn parsed(&self) -> &Parsed {
        self.parsed.get_or_init(|| self.parse())
    }

    /// Whether the structured view has been computed yet.
    pub fn is_parsed(&self) -> bool {
        self.parsed.get().is_some()
    }

    pub fn as_json(&self) -> Result<&Value, BodyError> {
        match self.parsed() {
            Parsed::Json(value) => Ok(value),
            Parsed::Error(reason) if self.kind() == Kind::Json => {
                Err(BodyError::Malformed(reason.clone()))
            }
            _ => Err(BodyError::NotJson(self.content_type_label())),
        }
    }

    pub fn as_form(&self) -> Result<&FormMap, BodyError> {
        match self.parsed() {
            Parsed::Form(map) => Ok(map),
            Parsed::Error(reason) if self.kind() == Kind::Form => {
                Err(BodyError::Malformed(reason.clone()))
            }
            _ => Err(BodyError::NotForm(self.content_type_label())),
        }
    }

    /// Deserialize the JSON view into `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, BodyError> {
        let value = self.as_json()?;
        Ok(T::deserialize(value)?)
    }

    /// Look up a field regardless of whether the body was JSON or form data.
    pub fn field(&self, name: &str) -> Option<String> {
        match self.parsed() {
            Parsed::Json(Value::Object(map)) => map.get(name).map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            }),
            Parsed::Form(map) => map.get(name).cloned(),
            _ => None,
        }
    }

    fn kind(&self) -> Kind {
        let Some(ct) = self.content_type.as_deref() else {
            return Kind::Other;
        };
        let essence = ct
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if essence == "application/json" || essence.ends_with("+json") {
            Kind::Json
        } else if essence == "application/x-www-form-urlencoded" {
            Kind::Form
        } else {
            Kind::Other
        }
    }

    fn parse(&self) -> Parsed {
        if self.raw.is_empty() {
            return Parsed::Unparsed;
        }
        match self.kind() {
            Kind::Json => match serde_json::from_slice(&self.raw) {
                Ok(value) => Parsed::Json(value),
                Err(e) => Parsed::Error(e.to_string()),
            },
            Kind::Form => Parsed::Form(
                url::form_urlencoded::parse(&self.raw)
                    .into_owned()
                    .collect(),
            ),
            Kind::Other => Parsed::Unparsed,
        }
    }

    fn content_type_label(&self) -> String {
        self.content_type
            .clone()
            .unwrap_or_else(|| "none".to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Json,
    Form,
    Other,
}
