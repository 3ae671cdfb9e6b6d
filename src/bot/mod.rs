//! Chat command front end.
//!
//! Messages starting with `!` are routed to the assistant; answers carry a
//! `Question: ` header so later feedback can be matched back to the log.

mod handler;
pub mod router;

pub use handler::{extract_question, Bot, Reply, QUESTION_NOT_FOUND};
pub use router::{Command, UsageError};
