//! Log server wire protocol
//!
//! Frames are JSON text objects carrying a `cmd` discriminator.
//!
//! Server → client:
//! - `{"cmd":"connected","server":...}`
//! - `{"cmd":"error",...}`
//! - `{"cmd":"success","server":...,"msg":{"cmd":"keepalive"|"enable","type":...}}`
//! - `{"cmd":"available","type":...,"display_type":...,"server":...}`
//! - `{"cmd":"line","log_type":...,"text":...,"disp_time":...,"http_status":...}`
//!
//! Client → server: the authentication message from the connection descriptor
//! (sent verbatim), then `{"cmd":"enable","type":...,"server":...}` per
//! announced category.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// A `line` frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineFrame {
    pub log_type: String,
    pub text: String,
    pub disp_time: Option<String>,
    pub http_status: Option<u16>,
}

/// Command acknowledged by a `success` frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ack {
    Keepalive,
    Enable { log_type: String },
    Other,
}

/// A decoded server frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerFrame {
    Connected {
        server: String,
    },
    Error,
    Success {
        server: String,
        ack: Ack,
    },
    Available {
        log_type: String,
        display_type: String,
        server: String,
    },
    Line(LineFrame),
    /// Valid object with a `cmd` we do not handle
    Unknown,
}

/// Why a frame could not be decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    NotJson(String),
    NotObject,
    MissingField(&'static str),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotJson(e) => write!(f, "not JSON: {}", e),
            Self::NotObject => write!(f, "not a JSON object"),
            Self::MissingField(name) => write!(f, "missing field `{}`", name),
        }
    }
}

impl std::error::Error for FrameError {}

/// Decode one text frame
pub fn parse_frame(raw: &str) -> Result<ServerFrame, FrameError> {
    let value: Value = serde_json::from_str(raw).map_err(|e| FrameError::NotJson(e.to_string()))?;
    let Value::Object(obj) = value else {
        return Err(FrameError::NotObject);
    };

    let cmd = obj.get("cmd").and_then(Value::as_str).unwrap_or_default();
    let frame = match cmd {
        "connected" => ServerFrame::Connected {
            server: required_str(&obj, "server")?,
        },
        "error" => ServerFrame::Error,
        "success" => {
            let msg = obj
                .get("msg")
                .and_then(Value::as_object)
                .ok_or(FrameError::MissingField("msg"))?;
            let ack = match msg.get("cmd").and_then(Value::as_str) {
                Some("keepalive") => Ack::Keepalive,
                Some("enable") => Ack::Enable {
                    log_type: required_str(msg, "type")?,
                },
                _ => Ack::Other,
            };
            ServerFrame::Success {
                server: optional_str(&obj, "server").unwrap_or_default(),
                ack,
            }
        }
        "available" => ServerFrame::Available {
            log_type: required_str(&obj, "type")?,
            display_type: optional_str(&obj, "display_type").unwrap_or_default(),
            server: optional_str(&obj, "server").unwrap_or_default(),
        },
        "line" => ServerFrame::Line(LineFrame {
            log_type: required_str(&obj, "log_type")?,
            text: optional_str(&obj, "text").unwrap_or_default(),
            disp_time: optional_str(&obj, "disp_time"),
            http_status: obj.get("http_status").and_then(status_code),
        }),
        _ => ServerFrame::Unknown,
    };
    Ok(frame)
}

fn required_str(obj: &Map<String, Value>, key: &'static str) -> Result<String, FrameError> {
    optional_str(obj, key).ok_or(FrameError::MissingField(key))
}

fn optional_str(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Servers send the status as a number, older ones as a string
fn status_code(value: &Value) -> Option<u16> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// =============================================================================
// Client frames
// =============================================================================

#[derive(Serialize)]
struct EnableFrame<'a> {
    cmd: &'static str,
    #[serde(rename = "type")]
    log_type: &'a str,
    server: &'a str,
}

/// Subscription request for one category on one upstream server
pub fn enable_frame(log_type: &str, server: &str) -> String {
    let frame = EnableFrame {
        cmd: "enable",
        log_type,
        server,
    };
    // Serializing a struct of strings cannot fail
    serde_json::to_string(&frame).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_connected() {
        assert_eq!(
            parse_frame(r#"{"cmd":"connected","server":"logstream-api-1"}"#),
            Ok(ServerFrame::Connected {
                server: "logstream-api-1".into()
            })
        );
    }

    #[test]
    fn test_parse_success_variants() {
        assert_eq!(
            parse_frame(r#"{"cmd":"success","msg":{"cmd":"keepalive"}}"#),
            Ok(ServerFrame::Success {
                server: String::new(),
                ack: Ack::Keepalive
            })
        );
        assert_eq!(
            parse_frame(
                r#"{"cmd":"success","server":"web-1","msg":{"cmd":"enable","type":"php-error"}}"#
            ),
            Ok(ServerFrame::Success {
                server: "web-1".into(),
                ack: Ack::Enable {
                    log_type: "php-error".into()
                }
            })
        );
        assert_eq!(
            parse_frame(r#"{"cmd":"success","msg":{"cmd":"disable"}}"#),
            Ok(ServerFrame::Success {
                server: String::new(),
                ack: Ack::Other
            })
        );
    }

    #[test]
    fn test_parse_available() {
        assert_eq!(
            parse_frame(
                r#"{"cmd":"available","type":"php-error","display_type":"PHP error","server":"web-1"}"#
            ),
            Ok(ServerFrame::Available {
                log_type: "php-error".into(),
                display_type: "PHP error".into(),
                server: "web-1".into(),
            })
        );
    }

    #[test]
    fn test_parse_line_with_numeric_and_string_status() {
        let frame = parse_frame(
            r#"{"cmd":"line","log_type":"varnish-request","text":"GET /","disp_time":"2014-03-05 12:00:00","http_status":503}"#,
        )
        .unwrap();
        let ServerFrame::Line(line) = frame else {
            panic!("expected line");
        };
        assert_eq!(line.http_status, Some(503));
        assert_eq!(line.disp_time.as_deref(), Some("2014-03-05 12:00:00"));

        let frame =
            parse_frame(r#"{"cmd":"line","log_type":"x","text":"t","http_status":"404"}"#).unwrap();
        assert!(matches!(frame, ServerFrame::Line(LineFrame { http_status: Some(404), .. })));
    }

    #[test]
    fn test_parse_unknown_cmd() {
        assert_eq!(
            parse_frame(r#"{"cmd":"reticulate"}"#),
            Ok(ServerFrame::Unknown)
        );
        assert_eq!(parse_frame(r#"{}"#), Ok(ServerFrame::Unknown));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse_frame("not json"), Err(FrameError::NotJson(_))));
        assert_eq!(parse_frame("[1,2]"), Err(FrameError::NotObject));
        assert_eq!(
            parse_frame(r#"{"cmd":"line","text":"orphan"}"#),
            Err(FrameError::MissingField("log_type"))
        );
        assert_eq!(
            parse_frame(r#"{"cmd":"success"}"#),
            Err(FrameError::MissingField("msg"))
        );
    }

    #[test]
    fn test_enable_frame() {
        let frame: Value = serde_json::from_str(&enable_frame("php-error", "web-1")).unwrap();
        assert_eq!(frame["cmd"], "enable");
        assert_eq!(frame["type"], "php-error");
        assert_eq!(frame["server"], "web-1");
    }
}
