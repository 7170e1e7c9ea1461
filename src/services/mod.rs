//! Services — the turn pipeline that sits between the HTTP routes and the
//! builder.
//!
//! - [`turn`]: one user turn end to end (prompt, model, parse, validate, repair)
//! - [`prompt`]: fixed prompt documents and per-turn context assembly
//! - [`trace`]: the step-by-step trace returned to the UI

pub mod prompt;
pub mod trace;
pub mod turn;
