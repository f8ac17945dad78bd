//! NotQuiteJava compiler core.
//!
//! Takes a parsed [`Module`], checks it, and lowers it to a LIR [`Prog`]:
//!
//! ```text
//! Module ──check_module──▶ TypedModule ──translate──▶ Prog
//!                              │
//!                              └─ errors ──▶ Vec<Diagnostic>
//! ```
//!
//! Parsing is out of scope; front ends build the [`Module`] with
//! [`nqj_ir::ModuleBuilder`].

mod options;
mod pipeline;

use std::sync::Once;

pub use nqj_diagnostic::{Diagnostic, ErrorCode};
pub use nqj_ir::{Module, ModuleBuilder, StringInterner};
pub use nqj_lir::Prog;
pub use nqj_types::TypedModule;
pub use options::CompileOptions;
pub use pipeline::{analyze, compile, diagnostics, CompileError};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call multiple times. Enable with `RUST_LOG=nqj_translate=debug`
/// or `RUST_LOG=nqj_types=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
