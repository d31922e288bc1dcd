#![forbid(unsafe_code)]

//! Output of a checking run: what code generation must insert, and where.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tern_ast::{CastKind, NodeId, Span};
use tern_rt::{IntOp, IntType, Scalar};

use crate::instantiate::ConcreteType;
use crate::types::Type;

/// Identity of one declared binding in a checked unit, in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(pub u32);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BindingDecl {
    pub name: String,
    pub span: Span,
}

/// Reference-counting work attached to a node or scope.
#[derive(Clone, Debug, PartialEq)]
pub enum Obligation {
    /// Increment the count of the value read at `node`.
    Retain { node: NodeId },
    /// Decrement at the end of the scope holding `decl`. `path` names a
    /// counted field inside a value-type binding; `None` is the binding
    /// itself. A `catch` binder has no static type; its release drops
    /// whatever the failure value holds.
    Release {
        binding: String,
        decl: BindingId,
        path: Option<Vec<String>>,
        scope_end: Span,
    },
    /// Release what the place at `node` held before the assignment.
    ReleaseOverwritten { node: NodeId },
    /// Copy the aggregate read at `node` and retain each listed field path.
    DeepCopy {
        node: NodeId,
        retained_paths: Vec<Vec<String>>,
    },
    /// Retain the counted parts of a payload copied out of a match
    /// scrutinee into the binder `decl`. The empty path is the binder itself.
    RetainBinder {
        decl: BindingId,
        retained_paths: Vec<Vec<String>>,
    },
    /// Store the value at `node` as a weak link; no retain.
    WeakStore { node: NodeId },
    /// Liveness check on the weak reference read at `node`; yields absent
    /// once the target is destroyed.
    WeakRead { node: NodeId },
}

impl Obligation {
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Obligation::Retain { node }
            | Obligation::ReleaseOverwritten { node }
            | Obligation::DeepCopy { node, .. }
            | Obligation::WeakStore { node }
            | Obligation::WeakRead { node } => Some(*node),
            Obligation::Release { .. } | Obligation::RetainBinder { .. } => None,
        }
    }
}

/// Runtime check required at a cast site.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CastCheck {
    /// Always representable.
    None,
    /// Integer range test.
    Range,
    /// Float conversion test (finite, integral, in range).
    Convert,
}

#[derive(Clone, Debug, PartialEq)]
pub enum CheckMarker {
    Overflow {
        node: NodeId,
        op: IntOp,
        ty: IntType,
        /// `/` and `%` also test the divisor.
        divide_by_zero: bool,
    },
    Wrapping {
        node: NodeId,
        op: IntOp,
        ty: IntType,
    },
    /// Evaluated at compile time; no runtime check.
    Folded { node: NodeId, value: i128 },
    /// Cast of a compile-time constant. `value` is the result; `None` only
    /// for an `as?` whose result is absent.
    FoldedCast {
        node: NodeId,
        kind: CastKind,
        value: Option<Scalar>,
    },
    Cast {
        node: NodeId,
        kind: CastKind,
        from: Type,
        to: Type,
        check: CastCheck,
    },
    Bounds { node: NodeId },
}

impl CheckMarker {
    pub fn node(&self) -> NodeId {
        match self {
            CheckMarker::Overflow { node, .. }
            | CheckMarker::Wrapping { node, .. }
            | CheckMarker::Folded { node, .. }
            | CheckMarker::FoldedCast { node, .. }
            | CheckMarker::Cast { node, .. }
            | CheckMarker::Bounds { node } => *node,
        }
    }
}

/// Which variants each arm handles at runtime, in arm order. An arm that
/// lost every variant to earlier arms has an empty list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchPlan {
    pub node: NodeId,
    pub arms: Vec<Vec<String>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallRoute {
    /// The enclosing function is `throws`; forward the failure.
    Propagate,
    /// An enclosing `try` hands the failure to its `catch`.
    Catch,
}

#[derive(Clone, Debug, Default)]
pub struct Annotations {
    /// Concrete type behind every expression of an instantiated generic type.
    pub instances: BTreeMap<NodeId, Arc<ConcreteType>>,
    pub obligations: Vec<Obligation>,
    pub markers: Vec<CheckMarker>,
    pub match_plans: BTreeMap<NodeId, MatchPlan>,
    pub call_routes: BTreeMap<NodeId, CallRoute>,
    /// Indexed by `BindingId`.
    pub bindings: Vec<BindingDecl>,
    obligations_by_node: HashMap<NodeId, Vec<usize>>,
    obligations_by_binding: HashMap<BindingId, Vec<usize>>,
    markers_by_node: HashMap<NodeId, Vec<usize>>,
}

impl Annotations {
    pub fn declare_binding(&mut self, name: &str, span: Span) -> BindingId {
        let id = BindingId(self.bindings.len() as u32);
        self.bindings.push(BindingDecl {
            name: name.to_string(),
            span,
        });
        id
    }

    /// Adding the same obligation twice has no effect.
    pub fn oblige(&mut self, o: Obligation) {
        let slot = match &o {
            Obligation::Release { decl, .. } | Obligation::RetainBinder { decl, .. } => {
                self.obligations_by_binding.entry(*decl).or_default()
            }
            other => match other.node() {
                Some(node) => self.obligations_by_node.entry(node).or_default(),
                None => return,
            },
        };
        if slot.iter().any(|&i| self.obligations[i] == o) {
            return;
        }
        slot.push(self.obligations.len());
        self.obligations.push(o);
    }

    pub fn mark(&mut self, m: CheckMarker) {
        let slot = self.markers_by_node.entry(m.node()).or_default();
        if slot.iter().any(|&i| self.markers[i] == m) {
            return;
        }
        slot.push(self.markers.len());
        self.markers.push(m);
    }

    pub fn obligations_at(&self, node: NodeId) -> Vec<&Obligation> {
        Self::indexed(&self.obligations, self.obligations_by_node.get(&node))
    }

    pub fn obligations_of(&self, decl: BindingId) -> Vec<&Obligation> {
        Self::indexed(&self.obligations, self.obligations_by_binding.get(&decl))
    }

    pub fn markers_at(&self, node: NodeId) -> Vec<&CheckMarker> {
        Self::indexed(&self.markers, self.markers_by_node.get(&node))
    }

    /// Releases of every binding declared under `name`, across scopes.
    pub fn releases_of(&self, binding: &str) -> Vec<&Obligation> {
        self.obligations
            .iter()
            .filter(|o| matches!(o, Obligation::Release { binding: b, .. } if b == binding))
            .collect()
    }

    /// Bindings declared under `name`, in declaration order.
    pub fn bindings_named(&self, name: &str) -> Vec<BindingId> {
        self.bindings
            .iter()
            .enumerate()
            .filter(|(_, b)| b.name == name)
            .map(|(i, _)| BindingId(i as u32))
            .collect()
    }

    fn indexed<'s, T>(items: &'s [T], slots: Option<&Vec<usize>>) -> Vec<&'s T> {
        slots
            .map(|slots| slots.iter().map(|&i| &items[i]).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tern_ast::span;

    #[test]
    fn repeated_obligations_and_markers_are_kept_once() {
        let mut a = Annotations::default();
        let node = NodeId(7);
        a.oblige(Obligation::Retain { node });
        a.oblige(Obligation::Retain { node });
        a.oblige(Obligation::WeakRead { node });
        a.mark(CheckMarker::Bounds { node });
        a.mark(CheckMarker::Bounds { node });
        assert_eq!(a.obligations_at(node).len(), 2);
        assert_eq!(a.markers_at(node), vec![&CheckMarker::Bounds { node }]);
        assert!(a.obligations_at(NodeId(8)).is_empty());
    }

    #[test]
    fn same_named_bindings_keep_separate_releases() {
        let mut a = Annotations::default();
        let first = a.declare_binding("a", span(0, 1));
        let second = a.declare_binding("a", span(0, 1));
        for decl in [first, second, first] {
            a.oblige(Obligation::Release {
                binding: "a".into(),
                decl,
                path: None,
                scope_end: span(1, 0),
            });
        }
        assert_ne!(first, second);
        assert_eq!(a.releases_of("a").len(), 2);
        assert_eq!(a.obligations_of(first).len(), 1);
        assert_eq!(a.bindings_named("a"), vec![first, second]);
    }
}
