//! Event kinds and the wire envelope sent to every connected display.

use std::fmt;

use axum::body::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

// ---------------------------------------------------------------------------
// Event kinds
// ---------------------------------------------------------------------------

/// The `type` tag a client dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    Clear,
    NewRecord,
    AddLine,
    RemoveLine,
    AddLabel,
    Charge,
    Heartbeat,
}

impl EventKind {
    pub const ALL: [EventKind; 7] = [
        EventKind::Clear,
        EventKind::NewRecord,
        EventKind::AddLine,
        EventKind::RemoveLine,
        EventKind::AddLabel,
        EventKind::Charge,
        EventKind::Heartbeat,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            EventKind::Clear => "clear",
            EventKind::NewRecord => "new-record",
            EventKind::AddLine => "add-line",
            EventKind::RemoveLine => "remove-line",
            EventKind::AddLabel => "add-label",
            EventKind::Charge => "charge",
            EventKind::Heartbeat => "heartbeat",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// A fully serialized `{"type": <kind>, "body": <json>}` frame.
///
/// The body is captured as raw JSON text when the envelope is built and is
/// copied into the frame byte-for-byte, so the hub never re-encodes, reorders
/// or inspects it. Construction is the only fallible step; once an `Envelope`
/// exists, delivering it cannot fail because of its content.
#[derive(Debug, Clone)]
pub struct Envelope {
    kind: EventKind,
    frame: Bytes,
}

impl Envelope {
    /// Envelope with a `null` body.
    pub fn empty(kind: EventKind) -> Self {
        Self {
            kind,
            frame: encode(kind, None),
        }
    }

    /// Envelope around an already-serialized JSON body.
    pub fn new(kind: EventKind, body: &RawValue) -> Self {
        Self {
            kind,
            frame: encode(kind, Some(body)),
        }
    }

    /// Envelope around JSON text. Fails only if `body` is not valid JSON.
    pub fn from_json(kind: EventKind, body: &str) -> Result<Self, serde_json::Error> {
        let raw = RawValue::from_string(body.to_owned())?;
        Ok(Self::new(kind, &raw))
    }

    /// Serialize `body` and wrap it.
    pub fn from_value<T>(kind: EventKind, body: &T) -> Result<Self, serde_json::Error>
    where
        T: Serialize + ?Sized,
    {
        let raw = serde_json::value::to_raw_value(body)?;
        Ok(Self::new(kind, &raw))
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// The exact bytes written to each sink.
    pub fn frame(&self) -> &Bytes {
        &self.frame
    }
}

fn encode(kind: EventKind, body: Option<&RawValue>) -> Bytes {
    let body = body.map_or("null", RawValue::get);
    // Kind tags are fixed ASCII and never need escaping.
    let mut out = String::with_capacity(body.len() + 32);
    out.push_str(r#"{"type":""#);
    out.push_str(kind.as_str());
    out.push_str(r#"","body":"#);
    out.push_str(body);
    out.push('}');
    Bytes::from(out)
}
