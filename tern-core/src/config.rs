#![forbid(unsafe_code)]

/// Knobs for a checking session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckConfig {
    /// Evaluate literal-only integer arithmetic and casts at compile time.
    /// Overflow then becomes a static diagnostic instead of a runtime check.
    pub fold_constants: bool,
    /// Skip runtime range checks on `as?`/`as!` casts whose source range
    /// already fits the destination.
    pub elide_infallible_casts: bool,
    /// Stop collecting after this many diagnostics.
    pub diagnostic_limit: Option<usize>,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            fold_constants: true,
            elide_infallible_casts: true,
            diagnostic_limit: None,
        }
    }
}

impl CheckConfig {
    pub fn set_fold_constants(&mut self, fold: bool) -> &mut Self {
        self.fold_constants = fold;
        self
    }

    pub fn set_elide_infallible_casts(&mut self, elide: bool) -> &mut Self {
        self.elide_infallible_casts = elide;
        self
    }

    pub fn set_diagnostic_limit(&mut self, limit: Option<usize>) -> &mut Self {
        self.diagnostic_limit = limit;
        self
    }
}
