//! Diagnostics for the NQJ compiler.
//!
//! Phases report problems as plain data: an [`ErrorCode`], a message, and
//! labeled spans. Rendering and exit behavior belong to the caller.

mod diagnostic;
mod error_code;

pub use diagnostic::{Diagnostic, Label};
pub use error_code::ErrorCode;
