//! Newline-delimited JSON wire format.
//!
//! # Requests
//!
//! ```text
//! {"action": "init", "num_particles": 50, "init_informed": 1}
//! {"action": "update"}
//! {"action": "estimate"}
//! ```
//!
//! `init_informed` accepts a boolean or an integer (1 = informed).
//!
//! # Responses
//!
//! ```text
//! {"algo": "pf", "circles": [[x, y, r], ...], "l1": [[x, y, theta, w, h], ...], ...}
//! {"error": "unknown action \"jump\""}
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, ServerError};
use jaal_pose::PartLists;

/// Estimator operation requested by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Create a fresh particle / belief set
    Init,
    /// Run one iteration
    Update,
    /// Report the current best pose
    Estimate,
}

impl std::str::FromStr for Action {
    type Err = ServerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "init" => Ok(Action::Init),
            "update" => Ok(Action::Update),
            "estimate" => Ok(Action::Estimate),
            other => Err(ServerError::Protocol(format!("unknown action {:?}", other))),
        }
    }
}

/// `init_informed` as sent by clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InformedFlag {
    /// `true` / `false`
    Bool(bool),
    /// `1` for informed, anything else uniform
    Int(i64),
}

impl InformedFlag {
    /// Whether informed initialization was requested.
    pub fn is_set(self) -> bool {
        match self {
            InformedFlag::Bool(b) => b,
            InformedFlag::Int(i) => i == 1,
        }
    }
}

/// One request line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Operation name
    #[serde(default)]
    pub action: Option<String>,

    /// Particle count for `init`
    #[serde(default)]
    pub num_particles: Option<usize>,

    /// Informed initialization flag for `init`
    #[serde(default)]
    pub init_informed: Option<InformedFlag>,
}

impl Request {
    /// Parse one JSON line.
    pub fn parse(line: &str) -> Result<Self> {
        Ok(serde_json::from_str(line.trim())?)
    }

    /// Resolve the action name.
    pub fn action(&self) -> Result<Action> {
        self.action
            .as_deref()
            .ok_or_else(|| ServerError::Protocol("missing \"action\"".to_string()))?
            .parse()
    }

    /// Informed flag, defaulting to informed when absent.
    pub fn informed(&self) -> bool {
        self.init_informed.is_none_or(InformedFlag::is_set)
    }
}

/// Part lists tagged with the estimator name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Estimator name (`pf` or `nbp`)
    pub algo: String,

    /// `circles`, `l1`..`l8`
    #[serde(flatten)]
    pub parts: PartLists,
}

impl Response {
    /// Wrap part lists for the wire.
    pub fn new(algo: &str, parts: PartLists) -> Self {
        Self {
            algo: algo.to_string(),
            parts,
        }
    }
}

/// Reply to a request that could not be served.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable reason
    pub error: String,
}

/// Serialize any reply as one JSON line (without the newline).
pub fn encode<T: Serialize>(reply: &T) -> Result<String> {
    Ok(serde_json::to_string(reply)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_init() {
        let req = Request::parse(r#"{"action": "init", "num_particles": 30, "init_informed": 0}"#).unwrap();
        assert_eq!(req.action().unwrap(), Action::Init);
        assert_eq!(req.num_particles, Some(30));
        assert!(!req.informed());
    }

    #[test]
    fn test_informed_forms() {
        let t = Request::parse(r#"{"action": "init", "init_informed": true}"#).unwrap();
        let one = Request::parse(r#"{"action": "init", "init_informed": 1}"#).unwrap();
        let two = Request::parse(r#"{"action": "init", "init_informed": 2}"#).unwrap();
        let absent = Request::parse(r#"{"action": "init"}"#).unwrap();
        assert!(t.informed());
        assert!(one.informed());
        assert!(!two.informed());
        assert!(absent.informed());
    }

    #[test]
    fn test_unknown_and_missing_action() {
        let req = Request::parse(r#"{"action": "jump"}"#).unwrap();
        assert!(matches!(req.action(), Err(ServerError::Protocol(_))));
        let req = Request::parse("{}").unwrap();
        assert!(matches!(req.action(), Err(ServerError::Protocol(_))));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(Request::parse("{action"), Err(ServerError::Protocol(_))));
    }

    #[test]
    fn test_response_is_flat() {
        let mut parts = PartLists::new();
        parts.push(0, vec![1.0, 2.0, 5.0]);
        let text = encode(&Response::new("pf", parts)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["algo"], "pf");
        assert_eq!(value["circles"][0][2], 5.0);
        assert!(value["l8"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_error_response() {
        let text = encode(&ErrorResponse {
            error: "nope".to_string(),
        })
        .unwrap();
        assert_eq!(text, r#"{"error":"nope"}"#);
    }
}
