//! Lowering from a type-checked NQJ module to LIR.
//!
//! [`translate`] consumes the [`TypedModule`](nqj_types::TypedModule)
//! produced by analysis and never resolves a name itself. The pass runs
//! in a fixed order:
//!
//! ```text
//! struct shells        object + vtable struct per class
//!   └─ class layouts   fields parent-first (slot 0 = vtable), vtable slots
//!        └─ procedures declared for every function and method
//!             └─ global functions (entry excluded)
//!                  └─ per class: methods, then vtable struct + constant
//!                       └─ entry function
//!                            └─ deferred newArray_* / newObject_* bodies
//! ```
//!
//! Runtime checks (null, bounds, division, array size) become explicit
//! branches to blocks that halt with a line-tagged message.

mod error;
mod layout;
mod lower;
mod translator;

pub use error::TranslateError;
pub use layout::{compute_class_shapes, ClassShape};
pub use translator::{translate, TranslateOptions};

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test assertions use unwrap/expect for clarity"
)]
