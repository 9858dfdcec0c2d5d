use crate::protocol::types::InboundEvent;

/// Unified application event consumed by the main select loop.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// An event parsed from the assistant's stdout stream.
    Inbound(Box<InboundEvent>),
    /// A non-JSON line from the stream, echoed verbatim.
    RawLine(String),
    /// Standard input closed — the assistant process is done.
    Eof,
}
