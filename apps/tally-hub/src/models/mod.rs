//! Payloads producers send to the displays.

pub mod charge;
pub mod label;
pub mod line_item;
pub mod record;

pub use charge::Charge;
pub use label::Label;
pub use line_item::LineItem;
pub use record::Record;

use crate::hub::{Envelope, EventKind};

/// Every event a producer can emit, with its typed body.
///
/// The hub itself never sees this type; it only receives the serialized
/// [`Envelope`].
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayEvent {
    Clear,
    NewRecord(Record),
    AddLine(LineItem),
    RemoveLine(LineItem),
    AddLabel(Label),
    Charge(Charge),
}

impl DisplayEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            DisplayEvent::Clear => EventKind::Clear,
            DisplayEvent::NewRecord(_) => EventKind::NewRecord,
            DisplayEvent::AddLine(_) => EventKind::AddLine,
            DisplayEvent::RemoveLine(_) => EventKind::RemoveLine,
            DisplayEvent::AddLabel(_) => EventKind::AddLabel,
            DisplayEvent::Charge(_) => EventKind::Charge,
        }
    }

    /// Serialize the body and wrap it for broadcast.
    pub fn to_envelope(&self) -> Result<Envelope, serde_json::Error> {
        let kind = self.kind();
        match self {
            DisplayEvent::Clear => Ok(Envelope::empty(kind)),
            DisplayEvent::NewRecord(record) => Envelope::from_value(kind, record),
            DisplayEvent::AddLine(item) | DisplayEvent::RemoveLine(item) => {
                Envelope::from_value(kind, item)
            }
            DisplayEvent::AddLabel(label) => Envelope::from_value(kind, label),
            DisplayEvent::Charge(charge) => Envelope::from_value(kind, charge),
        }
    }
}
