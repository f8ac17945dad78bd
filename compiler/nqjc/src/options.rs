//! Compiler configuration.

use nqj_translate::TranslateOptions;
use nqj_types::CheckOptions;

/// Options for one compilation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileOptions {
    /// Name of the entry function (default `main`).
    pub entry_point: String,
    /// Emit `Comment` instructions around every lowered statement.
    pub statement_comments: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            entry_point: "main".to_owned(),
            statement_comments: true,
        }
    }
}

impl CompileOptions {
    /// Defaults overridden by `NQJ_ENTRY` and `NQJ_NO_COMMENTS`.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by the variables `lookup` reports.
    ///
    /// An empty `NQJ_ENTRY` is ignored. Any `NQJ_NO_COMMENTS` value other
    /// than empty or `0` disables statement comments.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut options = Self::default();
        if let Some(entry) = lookup("NQJ_ENTRY").filter(|e| !e.is_empty()) {
            options.entry_point = entry;
        }
        if let Some(flag) = lookup("NQJ_NO_COMMENTS") {
            options.statement_comments = flag.is_empty() || flag == "0";
        }
        options
    }

    pub fn check_options(&self) -> CheckOptions {
        CheckOptions {
            entry_point: self.entry_point.clone(),
        }
    }

    pub fn translate_options(&self) -> TranslateOptions {
        TranslateOptions {
            entry_point: self.entry_point.clone(),
            statement_comments: self.statement_comments,
        }
    }
}
