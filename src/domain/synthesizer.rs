//! Declaration synthesis.
//!
//! A new declaration is the empty shape described by its spec with every
//! member merged in by [`MemberMerger`]. Synthesis and merge-from-empty
//! therefore always produce the same node.

use quote::quote;
use syn::{
    Attribute, Expr, ImplItemFn, Item, ItemFn, ItemImpl, ItemStatic, ItemStruct, ItemTrait, Stmt,
    Type,
};

use crate::domain::declaration::{DeclarationKind, DeclarationSpec};
use crate::domain::fragment;
use crate::domain::locator::find_impl_block;
use crate::domain::merger::{holds_literal, MemberMerger};
use crate::domain::tree::{DeclarationMut, NodeId, SyntaxTree};
use crate::error::{Result, SyncError};

/// A freshly built declaration, not yet part of any tree.
#[derive(Debug, Clone)]
pub enum Synthesized {
    Struct(ItemStruct),
    Interface(ItemTrait),
    Function(ItemFn),
    Method(ImplItemFn),
    Variable(ItemStatic),
}

impl Synthesized {
    pub fn target(&mut self) -> DeclarationMut<'_> {
        match self {
            Synthesized::Struct(s) => DeclarationMut::Struct(s),
            Synthesized::Interface(t) => DeclarationMut::Interface(t),
            Synthesized::Function(f) => DeclarationMut::Function {
                sig: &mut f.sig,
                block: &mut *f.block,
            },
            Synthesized::Method(f) => DeclarationMut::Function {
                sig: &mut f.sig,
                block: &mut f.block,
            },
            Synthesized::Variable(s) => DeclarationMut::Variable {
                ty: &*s.ty,
                expr: &mut *s.expr,
            },
        }
    }

    /// Append the declaration to `tree`. A method goes into the first
    /// inherent `impl` block of `receiver`, or into a new one at the end.
    pub fn insert_into(self, tree: &mut SyntaxTree, receiver: Option<&str>) -> Result<NodeId> {
        let item = match self {
            Synthesized::Struct(s) => Item::Struct(s),
            Synthesized::Interface(t) => Item::Trait(t),
            Synthesized::Function(f) => Item::Fn(f),
            Synthesized::Variable(s) => Item::Static(s),
            Synthesized::Method(method) => {
                let receiver = receiver.ok_or_else(|| {
                    SyncError::invalid_spec(&method.sig.ident.to_string(), "method without a receiver")
                })?;
                if let Some(index) = find_impl_block(tree, receiver) {
                    if let Some(id) = tree.push_impl_fn(index, method.clone()) {
                        return Ok(id);
                    }
                }
                let self_ty = fragment::ty(receiver)?;
                let block = syn::parse2::<ItemImpl>(quote!(impl #self_ty { #method }))
                    .map_err(|e| SyncError::malformed("impl block", receiver, e))?;
                let item = tree.items().len();
                tree.push_item(Item::Impl(block));
                return Ok(NodeId::ImplFn { item, index: 0 });
            }
        };
        Ok(tree.push_item(item))
    }
}

/// The declaration described by `spec` with none of its members.
pub fn empty_declaration(spec: &DeclarationSpec) -> Result<Synthesized> {
    let name = fragment::ident(&spec.name)?;
    let vis = fragment::visibility(spec.visibility);
    let attrs = outer_attributes(spec)?;

    let synthesized = match spec.kind {
        DeclarationKind::Struct => Synthesized::Struct(
            syn::parse2(quote!(#(#attrs)* #vis struct #name {}))
                .map_err(|e| SyncError::malformed("struct", &spec.name, e))?,
        ),
        DeclarationKind::Interface => Synthesized::Interface(
            syn::parse2(quote!(#(#attrs)* #vis trait #name {}))
                .map_err(|e| SyncError::malformed("trait", &spec.name, e))?,
        ),
        DeclarationKind::Constructor => {
            let output = return_type(spec)?;
            let stmts = body(spec)?;
            Synthesized::Function(
                syn::parse2(quote!(#(#attrs)* #vis fn #name() #output { #(#stmts)* }))
                    .map_err(|e| SyncError::malformed("function", &spec.name, e))?,
            )
        }
        DeclarationKind::Method => {
            let output = return_type(spec)?;
            let stmts = body(spec)?;
            let receiver = if spec.mutable_receiver() {
                quote!(&mut self)
            } else {
                quote!(&self)
            };
            Synthesized::Method(
                syn::parse2(quote!(#(#attrs)* #vis fn #name(#receiver) #output { #(#stmts)* }))
                    .map_err(|e| SyncError::malformed("method", &spec.name, e))?,
            )
        }
        DeclarationKind::VariableLiteral => {
            let ty_src = spec
                .returns
                .as_deref()
                .ok_or_else(|| SyncError::invalid_spec(&spec.name, "variable literal without a declared type"))?;
            let ty = fragment::ty(ty_src)?;
            let literal = fragment::empty_literal(spec.literal_type().unwrap_or(ty_src))?;
            Synthesized::Variable(
                syn::parse2(quote!(#(#attrs)* #vis static #name: #ty = #literal;))
                    .map_err(|e| SyncError::malformed("static", &spec.name, e))?,
            )
        }
    };
    Ok(synthesized)
}

/// Build the declaration for `spec` with every member in place. Returns the
/// node and the number of members it holds.
///
/// Fails with [`SyncError::UnsupportedShape`] when key-values are requested
/// but the new body has no literal to receive them.
pub fn synthesize(spec: &DeclarationSpec, merger: &MemberMerger) -> Result<(Synthesized, usize)> {
    let mut synthesized = empty_declaration(spec)?;
    if !holds_literal(synthesized.target(), spec) {
        return Err(SyncError::UnsupportedShape {
            name: spec.name.clone(),
            detail: format!(
                "no `{}` literal to hold its key-values; return a plain type or end the body with one",
                spec.literal_type().unwrap_or_default()
            ),
        });
    }
    let appended = merger.merge(synthesized.target(), spec)?;
    Ok((synthesized, appended))
}

fn outer_attributes(spec: &DeclarationSpec) -> Result<Vec<Attribute>> {
    let mut attrs = match &spec.doc {
        Some(doc) => fragment::doc_attribute(doc)?,
        None => Vec::new(),
    };
    for attr in &spec.attributes {
        attrs.extend(fragment::attributes(attr)?);
    }
    Ok(attrs)
}

fn return_type(spec: &DeclarationSpec) -> Result<syn::ReturnType> {
    match &spec.returns {
        Some(returns) => fragment::return_type(std::slice::from_ref(returns)),
        None => Ok(syn::ReturnType::Default),
    }
}

/// Body template, plus an empty literal of the return type when the
/// template does not end in a value of its own.
fn body(spec: &DeclarationSpec) -> Result<Vec<Stmt>> {
    let mut stmts = fragment::statements(&spec.body)?;
    let has_tail = matches!(stmts.last(), Some(Stmt::Expr(_, None)));
    if has_tail {
        return Ok(stmts);
    }
    if let Some(type_name) = literal_return_type(spec)? {
        let literal = fragment::empty_literal(&type_name)?;
        stmts.push(Stmt::Expr(Expr::Struct(literal), None));
    }
    Ok(stmts)
}

/// Name of a plain path return type (`Widget`, `crate::model::Widget`,
/// `Self`). Generic or non-path types get no literal.
fn literal_return_type(spec: &DeclarationSpec) -> Result<Option<String>> {
    let Some(returns) = spec.returns.as_deref() else {
        return Ok(None);
    };
    let Type::Path(path) = fragment::ty(returns)? else {
        return Ok(None);
    };
    if path.qself.is_some() {
        return Ok(None);
    }
    Ok(path
        .path
        .segments
        .last()
        .filter(|seg| seg.arguments.is_none())
        .map(|seg| seg.ident.to_string()))
}
