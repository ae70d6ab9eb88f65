//! Owned syntax tree of one source file.
//!
//! The tree owns every node. Other components refer to declarations through
//! [`NodeId`] indices and borrow them mutably only for the duration of one
//! merge via [`DeclarationMut`].

use syn::{
    Block, Expr, File, ImplItem, ImplItemFn, Item, ItemImpl, ItemStruct, ItemTrait, ItemUse,
    Signature, Type,
};

use crate::domain::declaration::{DeclarationKey, DeclarationKind};
use crate::domain::fragment;
use crate::error::Result;

/// Position of a declaration inside a [`SyntaxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeId {
    /// A top-level item.
    Item(usize),
    /// A function inside the top-level `impl` block at `item`.
    ImplFn { item: usize, index: usize },
}

/// Mutable view of a declaration for the duration of one merge.
#[derive(Debug)]
pub enum DeclarationMut<'a> {
    Struct(&'a mut ItemStruct),
    Interface(&'a mut ItemTrait),
    Function {
        sig: &'a mut Signature,
        block: &'a mut Block,
    },
    Variable {
        ty: &'a Type,
        expr: &'a mut Expr,
    },
}

/// A parsed source file.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    file: File,
}

impl SyntaxTree {
    pub fn new(file: File) -> Self {
        Self { file }
    }

    /// The tree of a file that does not exist yet.
    pub fn empty() -> Self {
        Self {
            file: File {
                shebang: None,
                attrs: Vec::new(),
                items: Vec::new(),
            },
        }
    }

    pub fn file(&self) -> &File {
        &self.file
    }

    pub fn items(&self) -> &[Item] {
        &self.file.items
    }

    pub fn push_item(&mut self, item: Item) -> NodeId {
        self.file.items.push(item);
        NodeId::Item(self.file.items.len() - 1)
    }

    /// Append a method to the `impl` block at `item`.
    pub fn push_impl_fn(&mut self, item: usize, method: ImplItemFn) -> Option<NodeId> {
        match self.file.items.get_mut(item) {
            Some(Item::Impl(imp)) => {
                imp.items.push(ImplItem::Fn(method));
                Some(NodeId::ImplFn {
                    item,
                    index: imp.items.len() - 1,
                })
            }
            _ => None,
        }
    }

    pub fn declaration_mut(&mut self, id: NodeId) -> Option<DeclarationMut<'_>> {
        match id {
            NodeId::Item(index) => match self.file.items.get_mut(index)? {
                Item::Struct(s) => Some(DeclarationMut::Struct(s)),
                Item::Trait(t) => Some(DeclarationMut::Interface(t)),
                Item::Fn(f) => Some(DeclarationMut::Function {
                    sig: &mut f.sig,
                    block: &mut *f.block,
                }),
                Item::Static(s) => Some(DeclarationMut::Variable {
                    ty: &*s.ty,
                    expr: &mut *s.expr,
                }),
                Item::Const(c) => Some(DeclarationMut::Variable {
                    ty: &*c.ty,
                    expr: &mut *c.expr,
                }),
                _ => None,
            },
            NodeId::ImplFn { item, index } => match self.file.items.get_mut(item)? {
                Item::Impl(imp) => match imp.items.get_mut(index)? {
                    ImplItem::Fn(f) => Some(DeclarationMut::Function {
                        sig: &mut f.sig,
                        block: &mut f.block,
                    }),
                    _ => None,
                },
                _ => None,
            },
        }
    }

    /// Identity keys of every declaration the engine recognises, in file order.
    pub fn declarations(&self) -> Vec<DeclarationKey> {
        let mut out = Vec::new();
        for item in &self.file.items {
            if let Item::Impl(imp) = item {
                let Some(receiver) = inherent_self_name(imp) else {
                    continue;
                };
                for impl_item in &imp.items {
                    if let ImplItem::Fn(f) = impl_item {
                        out.push(DeclarationKey {
                            name: f.sig.ident.to_string(),
                            kind: DeclarationKind::Method,
                            receiver: Some(receiver.clone()),
                        });
                    }
                }
            } else if let Some((name, kind)) = item_identity(item) {
                out.push(DeclarationKey {
                    name,
                    kind,
                    receiver: None,
                });
            }
        }
        out
    }

    /// Add missing `use` paths after the last existing `use` item.
    /// Returns the number of `use` items inserted.
    pub fn merge_imports(&mut self, imports: &[String]) -> Result<usize> {
        let mut present: Vec<String> = self
            .file
            .items
            .iter()
            .filter_map(|item| match item {
                Item::Use(u) => Some(fragment::use_leaves(&u.tree)),
                _ => None,
            })
            .flatten()
            .collect();

        let mut insert_at = self
            .file
            .items
            .iter()
            .rposition(|item| matches!(item, Item::Use(_)))
            .map_or(0, |i| i + 1);

        let mut added = 0;
        for import in imports {
            let item = fragment::use_item(import)?;
            let leaves = fragment::use_leaves(&item.tree);
            let missing: Vec<String> = leaves
                .iter()
                .filter(|leaf| !present.contains(leaf))
                .cloned()
                .collect();
            if missing.is_empty() {
                continue;
            }
            // A group that overlaps existing imports is split into its missing leaves.
            let new_items = if missing.len() == leaves.len() {
                vec![item]
            } else {
                missing
                    .iter()
                    .map(|leaf| leaf_item(&item, leaf))
                    .collect::<Result<Vec<_>>>()?
            };
            present.extend(missing);
            for new_item in new_items {
                self.file.items.insert(insert_at, Item::Use(new_item));
                insert_at += 1;
                added += 1;
            }
        }
        Ok(added)
    }
}

/// Single-leaf `use` item for `leaf`, keeping the attributes and visibility
/// of the group it came from.
fn leaf_item(group: &ItemUse, leaf: &str) -> Result<ItemUse> {
    let path = match leaf.rsplit_once("::") {
        Some((prefix, last)) if last == "self" || last.starts_with("self ") => {
            format!("{prefix}::{{{last}}}")
        }
        _ => leaf.to_string(),
    };
    let mut item = fragment::use_item(&path)?;
    item.attrs = group.attrs.clone();
    item.vis = group.vis.clone();
    Ok(item)
}

/// (Name, Kind) of a top-level item, when it is one the engine recognises.
pub fn item_identity(item: &Item) -> Option<(String, DeclarationKind)> {
    match item {
        Item::Struct(s) => Some((s.ident.to_string(), DeclarationKind::Struct)),
        Item::Trait(t) => Some((t.ident.to_string(), DeclarationKind::Interface)),
        Item::Fn(f) => Some((f.sig.ident.to_string(), DeclarationKind::Constructor)),
        Item::Static(s) => Some((s.ident.to_string(), DeclarationKind::VariableLiteral)),
        Item::Const(c) => Some((c.ident.to_string(), DeclarationKind::VariableLiteral)),
        _ => None,
    }
}

/// Self type name of an inherent `impl` block; `None` for trait impls.
pub fn inherent_self_name(imp: &ItemImpl) -> Option<String> {
    if imp.trait_.is_some() {
        return None;
    }
    type_name(&imp.self_ty)
}

/// Last path segment of a type, looking through references and groups.
pub fn type_name(ty: &Type) -> Option<String> {
    match ty {
        Type::Path(p) => p.path.segments.last().map(|s| s.ident.to_string()),
        Type::Reference(r) => type_name(&r.elem),
        Type::Group(g) => type_name(&g.elem),
        Type::Paren(p) => type_name(&p.elem),
        _ => None,
    }
}
