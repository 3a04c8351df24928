//! Echo handlers used by the CLI and for wiring checks.

use crate::dispatcher::{HandlerRequest, RouteHandler};
use serde_json::{json, Map, Value};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::info;

/// Shared buffer that [`recording_echo`] handlers append to
pub type EchoLog = Arc<Mutex<Vec<Value>>>;

/// JSON description of what a handler received
#[must_use]
pub fn echo_json(req: &HandlerRequest) -> Value {
    let params = |pairs: &crate::matcher::ParamVec| {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.clone())))
            .collect::<Map<String, Value>>()
    };
    json!({
        "routing_id": req.routing_id.to_string(),
        "owner": req.owner.to_string(),
        "schema": req.schema.as_ref(),
        "path_params": params(&req.path_params),
        "query_params": params(&req.query_params),
        "tail": req.tail,
    })
}

/// Handler body that logs the request
pub fn echo_handler(req: HandlerRequest) -> anyhow::Result<()> {
    let body = serde_json::to_string(&echo_json(&req))?;
    info!(routing_id = %req.routing_id, echo = %body, "Echo handler");
    Ok(())
}

/// Inline handler that logs the request and appends it to `log`
pub fn recording_echo(log: EchoLog) -> RouteHandler {
    RouteHandler::inline(move |req| {
        let value = echo_json(&req);
        info!(routing_id = %req.routing_id, schema = %req.schema, "Echo handler");
        log.lock().unwrap_or_else(PoisonError::into_inner).push(value);
        Ok(())
    })
}
