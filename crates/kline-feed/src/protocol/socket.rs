/*
[INPUT]:  Engine.IO message bodies
[OUTPUT]: Socket.IO v5 packets (connect, disconnect, event, ack, connect error)
[POS]:    Protocol layer - namespace/event framing
[UPDATE]: When Socket.IO packet handling changes
*/

use serde_json::Value;

use crate::error::{FeedError, Result};

pub const DEFAULT_NAMESPACE: &str = "/";

#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect {
        namespace: String,
        data: Option<Value>,
    },
    Disconnect {
        namespace: String,
    },
    Event {
        namespace: String,
        id: Option<u64>,
        name: String,
        args: Vec<Value>,
    },
    Ack {
        namespace: String,
        id: u64,
        args: Vec<Value>,
    },
    ConnectError {
        namespace: String,
        message: String,
    },
}

impl SocketPacket {
    /// Namespace connect request for the default namespace
    pub fn connect() -> Self {
        SocketPacket::Connect {
            namespace: DEFAULT_NAMESPACE.to_string(),
            data: None,
        }
    }

    pub fn decode(text: &str) -> Result<Self> {
        let mut rest = text;
        let kind = take_char(&mut rest)
            .ok_or_else(|| FeedError::Protocol("empty socket packet".to_string()))?;

        if matches!(kind, '5' | '6') {
            return Err(FeedError::Protocol(
                "binary socket packets are not supported".to_string(),
            ));
        }

        let namespace = take_namespace(&mut rest);
        let id = take_id(&mut rest);
        let payload = if rest.is_empty() {
            None
        } else {
            Some(serde_json::from_str::<Value>(rest)?)
        };

        match kind {
            '0' => Ok(SocketPacket::Connect {
                namespace,
                data: payload,
            }),
            '1' => Ok(SocketPacket::Disconnect { namespace }),
            '2' => {
                let mut items = into_array(payload)?;
                if items.is_empty() {
                    return Err(FeedError::Protocol("event without a name".to_string()));
                }
                let name = match items.remove(0) {
                    Value::String(name) => name,
                    other => {
                        return Err(FeedError::Protocol(format!(
                            "event name must be a string, got {other}"
                        )));
                    }
                };
                Ok(SocketPacket::Event {
                    namespace,
                    id,
                    name,
                    args: items,
                })
            }
            '3' => {
                let id = id.ok_or_else(|| FeedError::Protocol("ack without id".to_string()))?;
                Ok(SocketPacket::Ack {
                    namespace,
                    id,
                    args: into_array(payload)?,
                })
            }
            '4' => Ok(SocketPacket::ConnectError {
                namespace,
                message: error_message(payload),
            }),
            other => Err(FeedError::Protocol(format!(
                "unknown socket packet type: {other:?}"
            ))),
        }
    }

    pub fn encode(&self) -> String {
        let mut out = String::new();
        match self {
            SocketPacket::Connect { namespace, data } => {
                out.push('0');
                push_namespace(&mut out, namespace);
                if let Some(data) = data {
                    out.push_str(&data.to_string());
                }
            }
            SocketPacket::Disconnect { namespace } => {
                out.push('1');
                push_namespace(&mut out, namespace);
            }
            SocketPacket::Event {
                namespace,
                id,
                name,
                args,
            } => {
                out.push('2');
                push_namespace(&mut out, namespace);
                if let Some(id) = id {
                    out.push_str(&id.to_string());
                }
                let mut items = Vec::with_capacity(args.len() + 1);
                items.push(Value::String(name.clone()));
                items.extend(args.iter().cloned());
                out.push_str(&Value::Array(items).to_string());
            }
            SocketPacket::Ack {
                namespace,
                id,
                args,
            } => {
                out.push('3');
                push_namespace(&mut out, namespace);
                out.push_str(&id.to_string());
                out.push_str(&Value::Array(args.clone()).to_string());
            }
            SocketPacket::ConnectError { namespace, message } => {
                out.push('4');
                push_namespace(&mut out, namespace);
                out.push_str(&serde_json::json!({ "message": message }).to_string());
            }
        }
        out
    }
}

fn take_char(rest: &mut &str) -> Option<char> {
    let mut chars = rest.chars();
    let c = chars.next()?;
    *rest = chars.as_str();
    Some(c)
}

fn take_namespace(rest: &mut &str) -> String {
    if !rest.starts_with('/') {
        return DEFAULT_NAMESPACE.to_string();
    }
    match rest.find(',') {
        Some(pos) => {
            let namespace = rest[..pos].to_string();
            *rest = &rest[pos + 1..];
            namespace
        }
        None => {
            let namespace = rest.to_string();
            *rest = "";
            namespace
        }
    }
}

fn take_id(rest: &mut &str) -> Option<u64> {
    let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let id = rest[..digits].parse().ok();
    *rest = &rest[digits..];
    id
}

fn push_namespace(out: &mut String, namespace: &str) {
    if namespace != DEFAULT_NAMESPACE {
        out.push_str(namespace);
        out.push(',');
    }
}

fn into_array(payload: Option<Value>) -> Result<Vec<Value>> {
    match payload {
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(FeedError::Protocol(format!(
            "expected array payload, got {other}"
        ))),
        None => Ok(Vec::new()),
    }
}

fn error_message(payload: Option<Value>) -> String {
    match payload {
        Some(Value::String(message)) => message,
        Some(Value::Object(map)) => map
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| Value::Object(map).to_string()),
        Some(other) => other.to_string(),
        None => "connect error".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_connect_ack() {
        let packet = SocketPacket::decode(r#"0{"sid":"oSO0OpakMV_3jnilAAAA"}"#).unwrap();
        assert_eq!(
            packet,
            SocketPacket::Connect {
                namespace: "/".to_string(),
                data: Some(json!({"sid": "oSO0OpakMV_3jnilAAAA"})),
            }
        );
    }

    #[test]
    fn decode_kline_event() {
        let packet =
            SocketPacket::decode(r#"2["kline_data",[[1000,"1","2","0.5","100.5"]]]"#).unwrap();
        let SocketPacket::Event {
            namespace,
            id,
            name,
            args,
        } = packet
        else {
            panic!("expected event");
        };
        assert_eq!(namespace, "/");
        assert_eq!(id, None);
        assert_eq!(name, "kline_data");
        assert_eq!(args, vec![json!([[1000, "1", "2", "0.5", "100.5"]])]);
    }

    #[test]
    fn decode_event_with_namespace_and_ack_id() {
        let packet = SocketPacket::decode(r#"2/market,12["tick",1]"#).unwrap();
        assert_eq!(
            packet,
            SocketPacket::Event {
                namespace: "/market".to_string(),
                id: Some(12),
                name: "tick".to_string(),
                args: vec![json!(1)],
            }
        );
    }

    #[test]
    fn decode_connect_error_variants() {
        assert_eq!(
            SocketPacket::decode(r#"4{"message":"Not authorized"}"#).unwrap(),
            SocketPacket::ConnectError {
                namespace: "/".to_string(),
                message: "Not authorized".to_string(),
            }
        );
        assert_eq!(
            SocketPacket::decode(r#"4"Invalid namespace""#).unwrap(),
            SocketPacket::ConnectError {
                namespace: "/".to_string(),
                message: "Invalid namespace".to_string(),
            }
        );
    }

    #[test]
    fn decode_disconnect_and_errors() {
        assert_eq!(
            SocketPacket::decode("1").unwrap(),
            SocketPacket::Disconnect {
                namespace: "/".to_string()
            }
        );
        assert!(SocketPacket::decode(r#"2[]"#).is_err());
        assert!(SocketPacket::decode(r#"2[42]"#).is_err());
        assert!(SocketPacket::decode(r#"51-["bin",{"_placeholder":true,"num":0}]"#).is_err());
        assert!(SocketPacket::decode("").is_err());
    }

    #[test]
    fn encode_packets() {
        assert_eq!(SocketPacket::connect().encode(), "0");
        assert_eq!(
            SocketPacket::Disconnect {
                namespace: "/".to_string()
            }
            .encode(),
            "1"
        );
        assert_eq!(
            SocketPacket::Event {
                namespace: "/".to_string(),
                id: None,
                name: "kline_data".to_string(),
                args: vec![json!([])],
            }
            .encode(),
            r#"2["kline_data",[]]"#
        );
        assert_eq!(
            SocketPacket::Ack {
                namespace: "/admin".to_string(),
                id: 3,
                args: vec![json!("ok")],
            }
            .encode(),
            r#"3/admin,3["ok"]"#
        );
    }
}
