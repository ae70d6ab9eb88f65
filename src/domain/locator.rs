//! Declaration lookup by identity.
//!
//! Only top-level items are searched. Methods live one level down, inside
//! top-level inherent `impl` blocks of their receiver; trait impls never
//! match.

use syn::{ImplItem, Item};

use crate::domain::declaration::{DeclarationKey, DeclarationKind};
use crate::domain::fragment::ident_is;
use crate::domain::tree::{inherent_self_name, NodeId, SyntaxTree};

/// Outcome of a lookup. Holds an index into the tree, never a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    Found(NodeId),
    NotFound,
}

impl MatchResult {
    pub fn is_found(&self) -> bool {
        matches!(self, MatchResult::Found(_))
    }

    pub fn node(&self) -> Option<NodeId> {
        match self {
            MatchResult::Found(id) => Some(*id),
            MatchResult::NotFound => None,
        }
    }
}

/// Find the first declaration whose identifier and shape match `key`.
pub fn locate(tree: &SyntaxTree, key: &DeclarationKey) -> MatchResult {
    if key.kind == DeclarationKind::Method {
        return locate_method(tree, key);
    }
    tree.items()
        .iter()
        .position(|item| item_matches(item, &key.name, key.kind))
        .map_or(MatchResult::NotFound, |i| MatchResult::Found(NodeId::Item(i)))
}

/// First inherent `impl` block of `receiver`, where a missing method goes.
pub fn find_impl_block(tree: &SyntaxTree, receiver: &str) -> Option<usize> {
    tree.items().iter().position(|item| match item {
        Item::Impl(imp) => inherent_self_name(imp).as_deref() == Some(receiver),
        _ => false,
    })
}

fn locate_method(tree: &SyntaxTree, key: &DeclarationKey) -> MatchResult {
    let Some(receiver) = key.receiver.as_deref() else {
        return MatchResult::NotFound;
    };
    for (item_index, item) in tree.items().iter().enumerate() {
        let Item::Impl(imp) = item else { continue };
        if inherent_self_name(imp).as_deref() != Some(receiver) {
            continue;
        }
        let found = imp.items.iter().position(|impl_item| match impl_item {
            ImplItem::Fn(f) => ident_is(&f.sig.ident, &key.name),
            _ => false,
        });
        if let Some(index) = found {
            return MatchResult::Found(NodeId::ImplFn {
                item: item_index,
                index,
            });
        }
    }
    MatchResult::NotFound
}

fn item_matches(item: &Item, name: &str, kind: DeclarationKind) -> bool {
    match (kind, item) {
        (DeclarationKind::Struct, Item::Struct(s)) => ident_is(&s.ident, name),
        (DeclarationKind::Interface, Item::Trait(t)) => ident_is(&t.ident, name),
        (DeclarationKind::Constructor, Item::Fn(f)) => ident_is(&f.sig.ident, name),
        (DeclarationKind::VariableLiteral, Item::Static(s)) => ident_is(&s.ident, name),
        (DeclarationKind::VariableLiteral, Item::Const(c)) => ident_is(&c.ident, name),
        _ => false,
    }
}
