use std::{fmt, str::FromStr};

use serde::Deserialize;
use serde_json::Value;

pub use crate::error::{ClientError, Result};
use crate::{heap::ClassRegistry, output::PresentationSink};

/// The closed set of response kinds the server may declare.  Anything else is
/// a protocol mismatch; we never try to guess at what an unknown kind wants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseKind {
    Error,
    InitUI,
    ClassDefs,
    Histo,
}

impl ResponseKind {
    pub fn name(&self) -> &'static str {
        match self {
            ResponseKind::Error => "Error",
            ResponseKind::InitUI => "InitUI",
            ResponseKind::ClassDefs => "ClassDefs",
            ResponseKind::Histo => "Histo",
        }
    }
}

impl fmt::Display for ResponseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ResponseKind {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Error" => Ok(ResponseKind::Error),
            "InitUI" => Ok(ResponseKind::InitUI),
            "ClassDefs" => Ok(ResponseKind::ClassDefs),
            "Histo" => Ok(ResponseKind::Histo),
            _ => Err(ClientError::protocol(format!(
                "unknown response handler: {:?}",
                s
            ))),
        }
    }
}

/// The response envelope as it comes off the wire.  `data` is left untyped
/// until we know which handler is going to consume it.
#[derive(Clone, Debug, Deserialize)]
pub struct RawResponse {
    pub handler: String,
    #[serde(default)]
    pub data: Value,
}

impl RawResponse {
    pub fn parse(body: &str) -> Result<RawResponse> {
        serde_json::from_str(body).map_err(|err| {
            ClientError::protocol(format!("malformed response envelope: {}", err))
        })
    }
}

/// Session state a handler is allowed to touch.
pub struct DispatchContext<'a> {
    pub registry: &'a mut ClassRegistry,
    pub sink: &'a mut dyn PresentationSink,
}

pub trait ResponseHandler: fmt::Debug {
    fn run(&self, ctx: &mut DispatchContext<'_>, data: Value) -> Result<()>;
}

/// Decode a handler's payload, attributing failures to the response kind.
pub fn decode_payload<T>(kind: ResponseKind, data: Value) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_value(data)
        .map_err(|err| ClientError::protocol(format!("bad {} payload: {}", kind, err)))
}

#[test]
fn test_kind_resolution() {
    for kind in &[
        ResponseKind::Error,
        ResponseKind::InitUI,
        ResponseKind::ClassDefs,
        ResponseKind::Histo,
    ] {
        assert_eq!(kind.name().parse::<ResponseKind>().unwrap(), *kind);
    }
    assert!(matches!(
        "Bogus".parse::<ResponseKind>(),
        Err(ClientError::Protocol(_))
    ));
    // Kinds are case sensitive, just like the server's declarations.
    assert!("histo".parse::<ResponseKind>().is_err());
}

#[test]
fn test_envelope_parse() {
    let rsp = RawResponse::parse(r#"{"handler": "InitUI"}"#).unwrap();
    assert_eq!(rsp.handler, "InitUI");
    assert!(rsp.data.is_null());

    assert!(matches!(
        RawResponse::parse("<html>"),
        Err(ClientError::Protocol(_))
    ));
    assert!(RawResponse::parse(r#"{"data": []}"#).is_err());
}
