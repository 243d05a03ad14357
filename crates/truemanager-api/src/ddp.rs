// DDP wire envelopes
//
// The TrueNAS middleware speaks a Meteor-style DDP dialect over its
// `/websocket` endpoint. Every frame is a JSON object tagged by `msg`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

/// Protocol version we offer in the `connect` frame.
pub const DDP_VERSION: &str = "1";

// ── Outbound ─────────────────────────────────────────────────────────

/// Frames the client sends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "msg", rename_all = "lowercase")]
pub enum ClientMessage {
    Connect {
        version: String,
        support: Vec<String>,
    },
    Method {
        id: String,
        method: String,
        params: Vec<Value>,
    },
    Sub {
        id: String,
        name: String,
    },
    Unsub {
        id: String,
    },
    Ping {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },
    Pong {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },
}

impl ClientMessage {
    /// The opening handshake frame.
    pub fn connect() -> Self {
        Self::Connect {
            version: DDP_VERSION.to_owned(),
            support: vec![DDP_VERSION.to_owned()],
        }
    }

    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }
}

// ── Inbound ──────────────────────────────────────────────────────────

/// Frames the server sends. Anything with an unrecognized `msg` becomes
/// [`Unknown`](Self::Unknown).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "msg", rename_all = "lowercase")]
pub enum ServerMessage {
    Connected {
        session: String,
    },
    Failed {
        #[serde(default)]
        version: Option<String>,
    },
    Result {
        id: String,
        #[serde(default)]
        result: Option<Value>,
        #[serde(default)]
        error: Option<RpcError>,
    },
    Ready {
        #[serde(default)]
        subs: Vec<String>,
    },
    Nosub {
        id: String,
        #[serde(default)]
        error: Option<RpcError>,
    },
    Added(CollectionUpdate),
    Changed(CollectionUpdate),
    Removed(CollectionUpdate),
    Ping {
        #[serde(default)]
        id: Option<String>,
    },
    Pong {
        #[serde(default)]
        id: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

/// Payload of `added` / `changed` / `removed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionUpdate {
    pub collection: String,
    /// Document id; numeric or string depending on the collection.
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub fields: Option<Value>,
}

/// Error object carried by `result` and `nosub`.
///
/// `error` is usually an errno-style integer, but some middleware paths
/// send a string, so it is kept loose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub errname: Option<String>,
    #[serde(default, rename = "type")]
    pub error_type: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub trace: Option<Value>,
    #[serde(default)]
    pub extra: Option<Value>,
}

impl RpcError {
    pub fn code(&self) -> Option<i64> {
        match self.error.as_ref()? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

impl From<RpcError> for Error {
    fn from(err: RpcError) -> Self {
        let code = err.code();
        let reason = err
            .reason
            .clone()
            .or_else(|| err.errname.clone())
            .unwrap_or_else(|| "unknown error".to_owned());
        Self::Rpc {
            code,
            errname: err.errname,
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn connect_frame_shape() {
        let value = serde_json::to_value(ClientMessage::connect()).unwrap();
        assert_eq!(value, json!({ "msg": "connect", "version": "1", "support": ["1"] }));
    }

    #[test]
    fn method_frame_shape() {
        let msg = ClientMessage::Method {
            id: "abc".into(),
            method: "system.info".into(),
            params: vec![],
        };
        assert_eq!(
            serde_json::to_value(msg).unwrap(),
            json!({ "msg": "method", "id": "abc", "method": "system.info", "params": [] })
        );
    }

    #[test]
    fn bare_ping_omits_id() {
        let value = serde_json::to_value(ClientMessage::Ping { id: None }).unwrap();
        assert_eq!(value, json!({ "msg": "ping" }));
    }

    #[test]
    fn parses_result_with_error() {
        let msg: ServerMessage = serde_json::from_value(json!({
            "msg": "result",
            "id": "1",
            "error": { "error": 22, "errname": "EINVAL", "reason": "bad pool", "trace": null }
        }))
        .unwrap();

        let ServerMessage::Result { id, result, error } = msg else {
            panic!("expected result frame");
        };
        assert_eq!(id, "1");
        assert!(result.is_none());
        let err: Error = error.unwrap().into();
        assert!(matches!(
            err,
            Error::Rpc { code: Some(22), ref errname, ref reason }
                if errname.as_deref() == Some("EINVAL") && reason == "bad pool"
        ));
    }

    #[test]
    fn parses_collection_update() {
        let msg: ServerMessage = serde_json::from_value(json!({
            "msg": "added",
            "collection": "reporting.realtime",
            "fields": { "cpu": {} }
        }))
        .unwrap();
        assert!(matches!(msg, ServerMessage::Added(ref u) if u.collection == "reporting.realtime"));
    }

    #[test]
    fn unknown_msg_is_tolerated() {
        let msg: ServerMessage = serde_json::from_value(json!({ "msg": "updated", "methods": [] })).unwrap();
        assert_eq!(msg, ServerMessage::Unknown);
    }

    #[test]
    fn string_error_code_is_parsed() {
        let err = RpcError {
            error: Some(json!("13")),
            errname: None,
            error_type: None,
            reason: None,
            trace: None,
            extra: None,
        };
        assert_eq!(err.code(), Some(13));
        let err: Error = err.into();
        assert_eq!(err.to_string(), "RPC error 13: unknown error");
    }
}
