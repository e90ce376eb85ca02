use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

pub const EVENTS_KEY: &str = "events";

/// Shallow merge: top-level keys of `patch` overwrite those of `base`.
/// Nested values are replaced whole, never merged recursively.
pub fn merge(base: &Map<String, Value>, patch: &Map<String, Value>) -> Map<String, Value> {
    let mut out = base.clone();
    for (key, value) in patch {
        out.insert(key.clone(), value.clone());
    }
    out
}

/// Display state of the overview. Schemaless: holds whatever the last
/// successful responses contained.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewState(Map<String, Value>);

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites the top-level keys present in `patch`; every other key is kept.
    /// Returns the keys that were written.
    pub fn merge_from(&mut self, patch: Map<String, Value>) -> Vec<String> {
        let keys = patch.keys().cloned().collect();
        self.0 = merge(&self.0, &patch);
        keys
    }

    pub fn set_events(&mut self, events: Vec<Value>) {
        self.0.insert(EVENTS_KEY.to_string(), Value::Array(events));
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn host(&self) -> Option<&str> {
        self.0.get("host").and_then(Value::as_str)
    }

    pub fn version(&self) -> Option<&str> {
        self.0.get("version").and_then(Value::as_str)
    }

    pub fn deployments(&self) -> Option<&Value> {
        self.0.get("deployments")
    }

    pub fn events(&self) -> Option<&[Value]> {
        self.0
            .get(EVENTS_KEY)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct EventQuery {
    pub execution_id: String,
    pub node_instance_id: String,
}

impl EventQuery {
    pub fn new(execution_id: impl Into<String>, node_instance_id: impl Into<String>) -> Self {
        Self {
            execution_id: execution_id.into(),
            node_instance_id: node_instance_id.into(),
        }
    }
}

/// The routes an overview server exposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Metadata,
    State,
    Events(EventQuery),
}

impl Endpoint {
    /// Path segments, unencoded. Callers join them onto a base URL.
    pub fn segments(&self) -> Vec<&str> {
        match self {
            Self::Metadata => vec!["metadata"],
            Self::State => vec!["state"],
            Self::Events(q) => vec!["events", q.execution_id.as_str()],
        }
    }

    pub fn query(&self) -> Vec<(&'static str, &str)> {
        match self {
            Self::Events(q) => vec![("node_id", q.node_instance_id.as_str())],
            Self::Metadata | Self::State => Vec::new(),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.segments().join("/"))?;
        let query = self.query();
        if !query.is_empty() {
            let pairs: Vec<String> = query.iter().map(|(k, v)| format!("{k}={v}")).collect();
            write!(f, "?{}", pairs.join("&"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn merge_overwrites_top_level_keys_only() {
        let base = obj(json!({"host": "h0", "configuration": {"a": 1, "b": 2}}));
        let patch = obj(json!({"configuration": {"a": 9}}));

        let merged = merge(&base, &patch);

        assert_eq!(merged.get("host"), Some(&json!("h0")));
        assert_eq!(merged.get("configuration"), Some(&json!({"a": 9})));
        assert_eq!(base.get("configuration"), Some(&json!({"a": 1, "b": 2})));
    }

    #[test]
    fn merge_from_folds_a_sequence_of_responses() {
        let responses = [
            json!({"host": "h1", "deployments": []}),
            json!({"version": "1.0"}),
            json!({"host": "h2", "deployments": [{"id": "d1"}]}),
        ];

        let mut state = ViewState::new();
        let mut written = Vec::new();
        for r in responses {
            written.push(state.merge_from(obj(r)));
        }

        assert_eq!(
            state.as_map(),
            &obj(json!({"host": "h2", "version": "1.0", "deployments": [{"id": "d1"}]}))
        );
        assert_eq!(written.get(1), Some(&vec!["version".to_string()]));
        assert_eq!(state.host(), Some("h2"));
        assert_eq!(state.version(), Some("1.0"));
        assert_eq!(state.deployments(), Some(&json!([{"id": "d1"}])));
    }

    #[test]
    fn set_events_replaces_previous_events() {
        let mut state = ViewState::new();
        state.set_events(vec![json!("e0"), json!("e1"), json!("e2")]);
        state.set_events(vec![json!("e3")]);
        assert_eq!(state.events(), Some(&[json!("e3")][..]));
    }

    #[test]
    fn endpoint_display_is_canonical() {
        assert_eq!(Endpoint::Metadata.to_string(), "/metadata");
        assert_eq!(Endpoint::State.to_string(), "/state");
        let events = Endpoint::Events(EventQuery::new("exec-1", "node-A"));
        assert_eq!(events.to_string(), "/events/exec-1?node_id=node-A");
        assert_eq!(events.segments(), vec!["events", "exec-1"]);
    }
}
