#![forbid(unsafe_code)]

//! Collected compile-time diagnostics.
//!
//! Passes report into a shared [`Diagnostics`] and keep going, so one run
//! surfaces every problem in a unit. Rendering goes through miette against
//! the unit's source text.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use miette::{GraphicalReportHandler, GraphicalTheme, NamedSource, Report};

use crate::error::{ErrorKind, SemanticError};

#[derive(Clone, Debug, Default)]
pub struct Diagnostics {
    items: Vec<SemanticError>,
    limit: Option<usize>,
    truncated: bool,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    pub fn push(&mut self, err: SemanticError) {
        if self.limit.is_some_and(|max| self.items.len() >= max) {
            self.truncated = true;
            return;
        }
        self.items.push(err);
    }

    pub fn report<T>(&mut self, result: Result<T, SemanticError>) -> Option<T> {
        match result {
            Ok(v) => Some(v),
            Err(e) => {
                self.push(e);
                None
            }
        }
    }

    pub fn append(&mut self, other: Diagnostics) {
        self.truncated |= other.truncated;
        for err in other.items {
            self.push(err);
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.items.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when the configured limit dropped at least one diagnostic.
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    pub fn iter(&self) -> impl Iterator<Item = &SemanticError> {
        self.items.iter()
    }

    pub fn kinds(&self) -> Vec<ErrorKind> {
        self.items.iter().map(SemanticError::kind).collect()
    }

    pub fn into_vec(self) -> Vec<SemanticError> {
        self.items
    }

    /// Renders every diagnostic as a labelled source report.
    pub fn render(&self, name: &str, source: &str) -> String {
        let handler = GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor());
        let src = NamedSource::new(name, source.to_string());
        let mut out = String::new();
        for err in &self.items {
            let report = Report::new(err.clone()).with_source_code(src.clone());
            if handler.render_report(&mut out, &*report).is_err() {
                let _ = writeln!(out, "{err}");
            }
        }
        if self.truncated {
            let _ = writeln!(out, "(further diagnostics suppressed)");
        }
        out
    }

    /// One line: total count followed by a count per kind.
    pub fn summary(&self) -> String {
        if self.items.is_empty() {
            return "no errors".to_string();
        }
        let mut counts: BTreeMap<ErrorKind, usize> = BTreeMap::new();
        for err in &self.items {
            *counts.entry(err.kind()).or_default() += 1;
        }
        let parts = counts
            .iter()
            .map(|(k, n)| format!("{k}: {n}"))
            .collect::<Vec<_>>()
            .join(", ");
        let noun = if self.items.len() == 1 { "error" } else { "errors" };
        format!("{} {noun} ({parts})", self.items.len())
    }
}

impl IntoIterator for Diagnostics {
    type Item = SemanticError;
    type IntoIter = std::vec::IntoIter<SemanticError>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tern_ast::span;

    fn unknown(name: &str, at: usize) -> SemanticError {
        SemanticError::UnknownType {
            name: name.to_string(),
            span: span(at, name.len()),
        }
    }

    #[test]
    fn limit_drops_and_flags() {
        let mut d = Diagnostics::with_limit(Some(1));
        d.push(unknown("A", 0));
        d.push(unknown("B", 0));
        assert_eq!(d.len(), 1);
        assert!(d.truncated());
    }

    #[test]
    fn summary_counts_by_kind() {
        let mut d = Diagnostics::new();
        d.push(unknown("A", 0));
        d.push(unknown("B", 0));
        d.push(SemanticError::RegistryClosed {
            name: "C".into(),
            span: span(0, 1),
        });
        assert_eq!(d.summary(), "3 errors (UnknownType: 2, RegistryClosed: 1)");
    }

    #[test]
    fn render_points_into_source() {
        let src = "let x: Widget = make()";
        let mut d = Diagnostics::new();
        d.push(unknown("Widget", 7));
        let out = d.render("main.tern", src);
        assert!(out.contains("unknown type 'Widget'"));
        assert!(out.contains("main.tern"));
        assert!(out.contains("tern::sema::unknown_type"));
    }
}
