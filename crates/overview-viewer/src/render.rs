use crate::net::{Incoming, IncomingKind};
use overview_core::ViewState;
use serde_json::Value;

fn deployment_label(d: &Value) -> Option<&str> {
    d.get("id").and_then(Value::as_str)
}

/// Plain-text view of the state, one line per row.
pub fn summary(state: &ViewState) -> Vec<String> {
    let mut lines = vec![format!(
        "host: {}  version: {}",
        state.host().unwrap_or("-"),
        state.version().unwrap_or("-")
    )];

    // Deployments arrive either as a list or keyed by deployment id.
    match state.deployments() {
        Some(Value::Array(items)) => {
            lines.push(format!("deployments: {}", items.len()));
            for (i, d) in items.iter().enumerate() {
                match deployment_label(d) {
                    Some(id) => lines.push(format!("  - {id}")),
                    None => lines.push(format!("  - #{i}")),
                }
            }
        }
        Some(Value::Object(by_id)) => {
            lines.push(format!("deployments: {}", by_id.len()));
            for id in by_id.keys() {
                lines.push(format!("  - {id}"));
            }
        }
        Some(_) | None => lines.push("deployments: -".to_string()),
    }

    if let Some(events) = state.events() {
        lines.push(format!("events: {}", events.len()));
    }
    lines
}

pub fn status_line(inc: &Incoming) -> String {
    match &inc.kind {
        IncomingKind::Merged(keys) => format!("{} updated {}", inc.endpoint, keys.join(", ")),
        IncomingKind::Events(n) => format!("{} loaded {n} events", inc.endpoint),
        IncomingKind::StaleEvents => format!("{} superseded, ignored", inc.endpoint),
        IncomingKind::Failed(err) => format!("{err}"),
        IncomingKind::Stopped => "stopped".to_string(),
    }
}
