//! The analysis-then-lowering pipeline.

use nqj_diagnostic::{Diagnostic, ErrorCode};
use nqj_ir::{Module, StringInterner};
use nqj_lir::Prog;
use nqj_translate::{translate, TranslateError};
use nqj_types::{check_module, TypedModule};

use crate::CompileOptions;

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// The program is ill-formed; one diagnostic per analysis error.
    #[error("{} semantic error(s)", .0.len())]
    Semantic(Vec<Diagnostic>),

    /// Lowering hit an internal invariant violation.
    #[error("internal compiler error: {0}")]
    Internal(#[from] TranslateError),
}

impl CompileError {
    /// Diagnostics describing the failure.
    ///
    /// An internal error yields a single `E9001` diagnostic.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            CompileError::Semantic(diagnostics) => diagnostics.clone(),
            CompileError::Internal(err) => vec![Diagnostic::error(ErrorCode::E9001)
                .with_message(format!("internal compiler error: {err}"))
                .with_note("the module passed analysis but could not be lowered")],
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, CompileError::Internal(_))
    }
}

/// Run semantic analysis only.
pub fn analyze(
    module: &Module,
    interner: &StringInterner,
    options: &CompileOptions,
) -> TypedModule {
    check_module(module, interner, &options.check_options())
}

/// Diagnostics for every analysis error, in report order.
pub fn diagnostics(typed: &TypedModule) -> Vec<Diagnostic> {
    typed.errors.iter().map(nqj_types::TypeCheckError::to_diagnostic).collect()
}

/// Check `module` and, if it is well-formed, lower it.
///
/// # Errors
/// [`CompileError::Semantic`] when analysis reports anything;
/// [`CompileError::Internal`] when lowering fails.
#[tracing::instrument(level = "debug", skip_all, fields(entry = %options.entry_point))]
pub fn compile(
    module: &Module,
    interner: &StringInterner,
    options: &CompileOptions,
) -> Result<Prog, CompileError> {
    let typed = analyze(module, interner, options);
    if typed.has_errors() {
        tracing::debug!(errors = typed.errors.len(), "analysis failed");
        return Err(CompileError::Semantic(diagnostics(&typed)));
    }
    Ok(translate(module, interner, &typed, &options.translate_options())?)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test assertions use unwrap/expect for clarity"
)]
