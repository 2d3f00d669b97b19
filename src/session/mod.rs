//! Interactive preview over an editable graph.

pub mod preview;

pub use preview::{PreviewSession, RefreshReport, RefreshTicket, SessionOpts};
