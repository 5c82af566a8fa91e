//! The page/worker message protocol.
//!
//! A single message kind flows in both directions as JSON text frames:
//!
//! ```text
//! page -> worker: {"type": "SERVER_UPDATE", "server"?: "<addr>"}
//! worker -> all pages: {"type": "SERVER_UPDATE", "server": "<addr>"}
//! ```
//!
//! An omitted `server` field on the inbound message is a query: the
//! worker broadcasts the unchanged current value. This is a distinct
//! contract branch, not a default.

use serde::{Deserialize, Serialize};

/// Discriminant value of the one message kind.
pub const SERVER_UPDATE: &str = "SERVER_UPDATE";

/// Message sent from a page to the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PageMessage {
    #[serde(rename = "SERVER_UPDATE")]
    ServerUpdate {
        /// New backend address, or `None` to query without changing.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        server: Option<String>,
    },
}

/// Message broadcast from the worker to every connected page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WorkerMessage {
    #[serde(rename = "SERVER_UPDATE")]
    ServerUpdate {
        /// The current backend address.
        server: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_omits_server_field() {
        let msg = PageMessage::ServerUpdate { server: None };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"type":"SERVER_UPDATE"}"#);
    }

    #[test]
    fn test_update_carries_server_field() {
        let msg = PageMessage::ServerUpdate {
            server: Some("api.example.com:9000".to_string()),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(
            json,
            r#"{"type":"SERVER_UPDATE","server":"api.example.com:9000"}"#
        );
    }

    #[test]
    fn test_parse_query() {
        let msg: PageMessage = serde_json::from_str(r#"{"type":"SERVER_UPDATE"}"#).unwrap();
        assert_eq!(msg, PageMessage::ServerUpdate { server: None });
    }

    #[test]
    fn test_parse_update() {
        let msg: PageMessage =
            serde_json::from_str(r#"{"type":"SERVER_UPDATE","server":"host:1"}"#).unwrap();
        assert_eq!(
            msg,
            PageMessage::ServerUpdate {
                server: Some("host:1".to_string())
            }
        );
    }

    #[test]
    fn test_unknown_type_rejected() {
        let parsed = serde_json::from_str::<PageMessage>(r#"{"type":"PING"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_broadcast_shape() {
        let msg = WorkerMessage::ServerUpdate {
            server: "localhost:8081".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"type":"SERVER_UPDATE","server":"localhost:8081"}"#);
    }
}
