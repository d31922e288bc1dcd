#![forbid(unsafe_code)]

//! Function and method signatures, including the `throws` marker.

use std::collections::HashMap;

use tern_ast::{Decl, FunctionDef, Ident, Program, Span};

use crate::diagnostics::Diagnostics;
use crate::error::SemanticError;
use crate::registry::{TypeRegistry, TypeScope};
use crate::types::Type;

#[derive(Clone, Debug, PartialEq)]
pub struct FnSig {
    /// Qualified display name, `ns::f` or `ns::Class.method`.
    pub name: String,
    pub params: Vec<Type>,
    pub ret: Type,
    pub throws: bool,
    pub span: Span,
}

#[derive(Debug, Default)]
pub struct SignatureTable {
    functions: HashMap<(Vec<String>, String), FnSig>,
}

impl SignatureTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records every free function in `program`. Parameter and return types
    /// that fail to resolve are reported and become `Type::Unknown`. A second
    /// function of the same name in one namespace is reported and skipped.
    pub fn collect(&mut self, program: &Program, registry: &TypeRegistry, diags: &mut Diagnostics) {
        self.collect_decls(&program.decls, &mut Vec::new(), registry, diags);
    }

    fn collect_decls(
        &mut self,
        decls: &[Decl],
        namespace: &mut Vec<String>,
        registry: &TypeRegistry,
        diags: &mut Diagnostics,
    ) {
        for decl in decls {
            match decl {
                Decl::Function(f) => {
                    let key = (namespace.clone(), f.name.node.clone());
                    if let Some(previous) = self.functions.get(&key) {
                        diags.push(SemanticError::DuplicateFunction {
                            name: previous.name.clone(),
                            span: f.name.span,
                            previous: previous.span,
                        });
                        continue;
                    }
                    let sig = signature_of(f, namespace, registry, diags);
                    self.functions.insert(key, sig);
                }
                Decl::Namespace(ns) => {
                    namespace.push(ns.name.node.clone());
                    self.collect_decls(&ns.decls, namespace, registry, diags);
                    namespace.pop();
                }
                _ => {}
            }
        }
    }

    pub fn get(&self, namespace: &[String], name: &str) -> Option<&FnSig> {
        self.functions.get(&(namespace.to_vec(), name.to_string()))
    }

    /// Resolves a call the same way type names resolve: a qualified callee
    /// exactly, an unqualified one from `from` outward.
    pub fn lookup_call(&self, path: &[Ident], callee: &str, from: &[String]) -> Option<&FnSig> {
        if !path.is_empty() {
            let path: Vec<String> = path.iter().map(|p| p.node.clone()).collect();
            return self.get(&path, callee);
        }
        let mut ns = from.to_vec();
        loop {
            if let Some(sig) = self.get(&ns, callee) {
                return Some(sig);
            }
            ns.pop()?;
        }
    }

    /// Signature of `method` on a class-typed receiver, with the class's
    /// generic parameters replaced by the receiver's arguments.
    pub fn method(&self, registry: &TypeRegistry, receiver: &Type, method: &str) -> Option<FnSig> {
        let (def, args) = receiver.adt()?;
        let td = registry.get(def);
        let m = td.method(method)?;
        let subst: HashMap<String, Type> = td
            .generics
            .iter()
            .cloned()
            .zip(args.iter().cloned())
            .filter(|(g, _)| !m.generics.contains(g))
            .collect();
        Some(FnSig {
            name: format!("{}.{}", td.qualified_name(), m.name),
            params: m.params.iter().map(|p| p.substitute(&subst)).collect(),
            ret: m.ret.substitute(&subst),
            throws: m.throws,
            span: m.span,
        })
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FnSig> {
        self.functions.values()
    }
}

fn signature_of(f: &FunctionDef, namespace: &[String], registry: &TypeRegistry, diags: &mut Diagnostics) -> FnSig {
    let scope = TypeScope::new(
        namespace.to_vec(),
        f.generics.iter().map(|g| g.name.node.clone()).collect(),
    );
    let mut name = namespace.join("::");
    if !name.is_empty() {
        name.push_str("::");
    }
    name.push_str(&f.name.node);
    FnSig {
        name,
        params: f
            .params
            .iter()
            .map(|p| diags.report(registry.resolve_type(&p.ty, &scope)).unwrap_or(Type::Unknown))
            .collect(),
        ret: f
            .ret
            .as_ref()
            .map(|r| diags.report(registry.resolve_type(r, &scope)).unwrap_or(Type::Unknown))
            .unwrap_or(Type::Void),
        throws: f.throws,
        span: f.name.span,
    }
}
