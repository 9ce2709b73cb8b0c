//! JSON error stage.

use serde_json::{json, Value};

use crate::config::ErrorsConfig;
use crate::context::Context;
use crate::dispatch::{ErrorStage, HandlerError, HandlerResult};

/// Renders errors as `{"error": <reason>}`, adding `"message"` only when
/// details are exposed.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonErrorStage {
    expose_details: bool,
}

impl JsonErrorStage {
    pub fn new(expose_details: bool) -> Self {
        Self { expose_details }
    }

    pub fn from_config(config: &ErrorsConfig) -> Self {
        Self::new(config.expose_details)
    }

    pub fn render(&self, err: &HandlerError) -> Value {
        let status = err.status();
        let mut body = json!({ "error": status.canonical_reason().unwrap_or("Error") });
        if self.expose_details {
            body["message"] = Value::String(err.to_string());
            body["kind"] = Value::String(err.kind().to_string());
        }
        body
    }
}

impl ErrorStage for JsonErrorStage {
    fn handle(&self, err: &HandlerError, ctx: &mut Context) -> HandlerResult {
        ctx.json(err.status(), &self.render(err))?;
        Ok(())
    }
}
