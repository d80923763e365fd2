//! Execution context for agents
//!
//! A [`Context`] travels with a single request. It carries the subject being
//! analysed, the requested output format and the "as of" timestamp, plus any
//! intermediate values one agent wants to hand to the next.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Well-known context keys
pub mod keys {
    /// Symbol or portfolio name the request is about
    pub const SUBJECT: &str = "subject";
    /// Output format preference ("markdown", "json", "text")
    pub const OUTPUT_FORMAT: &str = "output_format";
    /// RFC 3339 timestamp the analysis refers to
    pub const AS_OF: &str = "as_of";
    /// Request identifier used in log spans
    pub const REQUEST_ID: &str = "request_id";
    /// Allocation plan computed earlier in the request
    pub const ALLOCATION_PLAN: &str = "allocation_plan";
}

/// Context passed to agents during execution
///
/// # Example
///
/// ```
/// use agent_core::Context;
///
/// let ctx = Context::new()
///     .with_subject("QQQI")
///     .with_output_format("markdown");
///
/// assert_eq!(ctx.subject(), Some("QQQI"));
/// assert_eq!(ctx.output_format(), Some("markdown"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Context {
    data: HashMap<String, serde_json::Value>,
}

impl Context {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the subject (symbol or portfolio name)
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.insert(keys::SUBJECT, serde_json::json!(subject.into()));
        self
    }

    /// Set the output format
    pub fn with_output_format(mut self, format: impl Into<String>) -> Self {
        self.insert(keys::OUTPUT_FORMAT, serde_json::json!(format.into()));
        self
    }

    /// Pin the analysis timestamp
    pub fn with_as_of(mut self, as_of: DateTime<Utc>) -> Self {
        self.insert(keys::AS_OF, serde_json::json!(as_of.to_rfc3339()));
        self
    }

    /// Set the request identifier
    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.insert(keys::REQUEST_ID, serde_json::json!(id.into()));
        self
    }

    pub fn subject(&self) -> Option<&str> {
        self.get(keys::SUBJECT).and_then(|v| v.as_str())
    }

    pub fn output_format(&self) -> Option<&str> {
        self.get(keys::OUTPUT_FORMAT).and_then(|v| v.as_str())
    }

    pub fn request_id(&self) -> Option<&str> {
        self.get(keys::REQUEST_ID).and_then(|v| v.as_str())
    }

    /// Analysis timestamp, or `None` when unset or unparsable
    pub fn as_of(&self) -> Option<DateTime<Utc>> {
        self.get(keys::AS_OF)
            .and_then(|v| v.as_str())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Analysis timestamp, falling back to the current time
    pub fn as_of_or_now(&self) -> DateTime<Utc> {
        self.as_of().unwrap_or_else(Utc::now)
    }

    /// Insert a raw JSON value
    pub fn insert(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.data.insert(key.into(), value);
    }

    /// Get a raw JSON value
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Insert a typed value, serializing it to JSON
    pub fn insert_typed<T: Serialize>(
        &mut self,
        key: impl Into<String>,
        value: &T,
    ) -> crate::Result<()> {
        let key = key.into();
        let json_value = serde_json::to_value(value).map_err(|e| crate::Error::ContextValue {
            key: key.clone(),
            detail: e.to_string(),
        })?;
        self.data.insert(key, json_value);
        Ok(())
    }

    /// Get a typed value, deserializing it from JSON
    pub fn get_typed<T: for<'de> Deserialize<'de>>(&self, key: &str) -> crate::Result<Option<T>> {
        match self.data.get(key) {
            None => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| crate::Error::ContextValue {
                    key: key.to_string(),
                    detail: e.to_string(),
                }),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.data.remove(key)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Merge another context into this one (other values override)
    pub fn merge(&mut self, other: Context) {
        self.data.extend(other.data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Buckets {
        income: f64,
        treasury: f64,
    }

    #[test]
    fn test_subject_and_format() {
        let ctx = Context::new()
            .with_subject("SPYI")
            .with_output_format("json")
            .with_request_id("req-1");

        assert_eq!(ctx.subject(), Some("SPYI"));
        assert_eq!(ctx.output_format(), Some("json"));
        assert_eq!(ctx.request_id(), Some("req-1"));
        assert_eq!(ctx.len(), 3);
    }

    #[test]
    fn test_as_of_roundtrip() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 14, 15, 30, 0).unwrap();
        let ctx = Context::new().with_as_of(ts);
        assert_eq!(ctx.as_of(), Some(ts));
        assert_eq!(ctx.as_of_or_now(), ts);
    }

    #[test]
    fn test_as_of_garbage_is_none() {
        let mut ctx = Context::new();
        ctx.insert(keys::AS_OF, serde_json::json!("yesterday"));
        assert!(ctx.as_of().is_none());
    }

    #[test]
    fn test_typed_values() {
        let mut ctx = Context::new();
        let buckets = Buckets {
            income: 0.7,
            treasury: 0.3,
        };
        ctx.insert_typed(keys::ALLOCATION_PLAN, &buckets).unwrap();

        let back: Buckets = ctx.get_typed(keys::ALLOCATION_PLAN).unwrap().unwrap();
        assert_eq!(back, buckets);

        let missing: Option<Buckets> = ctx.get_typed("missing").unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_typed_value_wrong_shape() {
        let mut ctx = Context::new();
        ctx.insert("plan", serde_json::json!("not a plan"));
        let err = ctx.get_typed::<Buckets>("plan").unwrap_err();
        assert!(err.to_string().contains("plan"));
    }

    #[test]
    fn test_merge_and_remove() {
        let mut a = Context::new().with_subject("QQQI");
        let b = Context::new().with_subject("JEPQ").with_output_format("text");
        a.merge(b);
        assert_eq!(a.subject(), Some("JEPQ"));
        assert!(a.contains_key(keys::OUTPUT_FORMAT));

        a.remove(keys::OUTPUT_FORMAT);
        assert_eq!(a.len(), 1);
        assert!(!a.is_empty());
    }
}
