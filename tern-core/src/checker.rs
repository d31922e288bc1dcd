#![forbid(unsafe_code)]

//! Checking session.
//!
//! Registration runs first and is closed once every unit's declarations are
//! in; bodies are then analysed against the closed registry, one unit at a
//! time or several in parallel.

use rayon::prelude::*;
use tern_ast::Program;
use tern_ast::visit::Visitor;

use crate::annotate::Annotations;
use crate::arith::ArithPass;
use crate::body::collect_bodies;
use crate::config::CheckConfig;
use crate::diagnostics::Diagnostics;
use crate::exhaustive::ExhaustivePass;
use crate::instantiate::Instantiator;
use crate::ownership::{CountedPaths, OwnershipPass, OwnershipTable, check_declarations};
use crate::propagation::PropagationPass;
use crate::registry::TypeRegistry;
use crate::resolve::{ResolvePass, TypeTable};
use crate::signatures::SignatureTable;

/// What one unit's analysis produced.
#[derive(Clone, Debug, Default)]
pub struct Analysis {
    pub annotations: Annotations,
    pub diagnostics: Diagnostics,
}

impl Analysis {
    pub fn is_ok(&self) -> bool {
        !self.diagnostics.has_errors()
    }

    pub fn into_result(self) -> Result<Annotations, Diagnostics> {
        if self.diagnostics.has_errors() {
            Err(self.diagnostics)
        } else {
            Ok(self.annotations)
        }
    }
}

#[derive(Debug, Default)]
pub struct Checker {
    config: CheckConfig,
    registry: TypeRegistry,
    signatures: SignatureTable,
    ownership: Option<OwnershipTable>,
}

impl Checker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CheckConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &CheckConfig {
        &self.config
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn signatures(&self) -> &SignatureTable {
        &self.signatures
    }

    /// Declares the unit's types and function signatures.
    pub fn register_program(&mut self, program: &Program) -> Diagnostics {
        let mut diags = Diagnostics::with_limit(self.config.diagnostic_limit);
        self.registry.declare_program(program, &mut diags);
        self.signatures.collect(program, &self.registry, &mut diags);
        diags
    }

    /// Ends registration, classifies every definition, and checks the
    /// declared field and signature types for misplaced weak references.
    pub fn close(&mut self) -> Diagnostics {
        let mut diags = Diagnostics::with_limit(self.config.diagnostic_limit);
        self.registry.close();
        self.ownership = Some(OwnershipTable::classify_all(&self.registry));
        for err in check_declarations(&self.registry, &self.signatures) {
            diags.push(err);
        }
        diags
    }

    /// Registers, closes and analyses a single unit.
    pub fn check_program(&mut self, program: &Program) -> Analysis {
        let mut diags = self.register_program(program);
        diags.append(self.close());
        let mut analysis = self.analyze(program);
        diags.append(analysis.diagnostics);
        analysis.diagnostics = diags;
        analysis
    }

    /// Checks every body in `program`. Registration should be closed; if it
    /// is not, ownership kinds are classified for this call only.
    pub fn analyze(&self, program: &Program) -> Analysis {
        let classified;
        let table = match &self.ownership {
            Some(t) => t,
            None => {
                classified = OwnershipTable::classify_all(&self.registry);
                &classified
            }
        };

        let mut annotations = Annotations::default();
        let mut diags = Diagnostics::with_limit(self.config.diagnostic_limit);
        let mut types = TypeTable::default();
        let mut instantiator = Instantiator::new(&self.registry);
        let bodies = collect_bodies(program);

        for body in &bodies {
            ResolvePass::new(
                &self.registry,
                &mut instantiator,
                &mut types,
                &mut annotations,
                &mut diags,
            )
            .run(body);
        }

        let mut paths = CountedPaths::new(&self.registry, table);
        for body in &bodies {
            OwnershipPass::new(
                &self.registry,
                table,
                &self.signatures,
                &types,
                &mut paths,
                &mut annotations,
                &mut diags,
            )
            .run(body);
            ArithPass::new(&self.config, &types, &mut annotations, &mut diags).visit_function(body.func);
            ExhaustivePass::new(
                &self.registry,
                &mut instantiator,
                &types,
                &mut annotations,
                &mut diags,
            )
            .visit_function(body.func);
            PropagationPass::new(&self.registry, &self.signatures, &types, &mut annotations, &mut diags)
                .run(body);
        }

        Analysis {
            annotations,
            diagnostics: diags,
        }
    }

    /// Analyses independent units against the same closed registry in
    /// parallel. Results are in input order.
    pub fn check_units(&self, programs: &[Program]) -> Vec<Analysis> {
        programs.par_iter().map(|p| self.analyze(p)).collect()
    }
}
