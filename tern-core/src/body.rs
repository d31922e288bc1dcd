#![forbid(unsafe_code)]

use tern_ast::{ClassDef, Decl, FunctionDef, Program};

use crate::registry::TypeScope;

/// A function or method body together with where it was declared.
#[derive(Clone, Debug)]
pub struct Body<'p> {
    pub namespace: Vec<String>,
    pub class: Option<&'p ClassDef>,
    pub func: &'p FunctionDef,
}

impl Body<'_> {
    /// `ns::f` for functions, `ns::Class.method` for methods.
    pub fn name(&self) -> String {
        let mut out = String::new();
        for seg in &self.namespace {
            out.push_str(seg);
            out.push_str("::");
        }
        if let Some(c) = self.class {
            out.push_str(&c.name.node);
            out.push('.');
        }
        out.push_str(&self.func.name.node);
        out
    }

    /// Class generics followed by the function's own.
    pub fn scope(&self) -> TypeScope {
        let generics = self
            .class
            .into_iter()
            .flat_map(|c| c.params.iter())
            .chain(self.func.generics.iter())
            .map(|p| p.name.node.clone())
            .collect();
        TypeScope::new(self.namespace.clone(), generics)
    }
}

/// Every function and method with a body, in declaration order.
pub fn collect_bodies(program: &Program) -> Vec<Body<'_>> {
    let mut out = Vec::new();
    walk(&program.decls, &mut Vec::new(), &mut out);
    out
}

fn walk<'p>(decls: &'p [Decl], namespace: &mut Vec<String>, out: &mut Vec<Body<'p>>) {
    for decl in decls {
        match decl {
            Decl::Function(f) if f.body.is_some() => out.push(Body {
                namespace: namespace.clone(),
                class: None,
                func: f,
            }),
            Decl::Class(c) => {
                for m in c.methods.iter().filter(|m| m.body.is_some()) {
                    out.push(Body {
                        namespace: namespace.clone(),
                        class: Some(c),
                        func: m,
                    });
                }
            }
            Decl::Namespace(ns) => {
                namespace.push(ns.name.node.clone());
                walk(&ns.decls, namespace, out);
                namespace.pop();
            }
            _ => {}
        }
    }
}
