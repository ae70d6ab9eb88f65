//! Additive member merge.
//!
//! Every required member is looked up by its identity key. Present members
//! are left exactly as they are, absent ones are appended after everything
//! that already exists. Nothing is ever removed or reordered.

use quote::quote;
use syn::parse::Parser;
use syn::{
    Block, Expr, ExprStruct, Field, Fields, FieldsNamed, FnArg, ItemStruct, ItemTrait, Member,
    Pat, Signature, Stmt, TraitItem, TraitItemFn,
};
use tracing::{debug, warn};

use crate::domain::declaration::{
    last_path_segment, DeclarationSpec, FieldMember, KeyValueMember, MemberSpec, MethodMember,
    ParamMember, StatementMember, ValueExpr,
};
use crate::domain::fragment::{self, ident_is};
use crate::domain::tree::DeclarationMut;
use crate::error::{Result, SyncError};

/// One nested literal below the declaration's own literal.
pub const DEFAULT_MAX_DEPTH: usize = 2;

/// Appends missing members to a declaration in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberMerger {
    max_depth: usize,
}

impl Default for MemberMerger {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl MemberMerger {
    /// `max_depth` bounds literal merging: entries of the declaration's own
    /// literal are depth 1, each nested literal adds one.
    pub fn new(max_depth: usize) -> Result<Self> {
        if max_depth == 0 {
            return Err(SyncError::invalid_spec("max_depth", "must be at least 1"));
        }
        Ok(Self { max_depth })
    }

    /// Merge the members of `spec` into `target`. Returns how many members
    /// were appended, nested literal entries included.
    pub fn merge(&self, target: DeclarationMut<'_>, spec: &DeclarationSpec) -> Result<usize> {
        let appended = match target {
            DeclarationMut::Struct(item) => merge_fields(item, spec)?,
            DeclarationMut::Interface(item) => merge_trait_methods(item, spec)?,
            DeclarationMut::Function { sig, block } => {
                let mut count = merge_params(sig, spec)?;
                count += merge_statements(block, spec)?;
                count += self.merge_returned_literal(block, spec)?;
                count
            }
            DeclarationMut::Variable { expr, .. } => self.merge_variable_literal(expr, spec)?,
        };
        debug!(name = %spec.name, kind = %spec.kind, appended, "merged members");
        Ok(appended)
    }

    fn merge_returned_literal(&self, block: &mut Block, spec: &DeclarationSpec) -> Result<usize> {
        let entries = key_values(spec);
        let Some(type_name) = spec.literal_type() else {
            return Ok(0);
        };
        if entries.is_empty() {
            return Ok(0);
        }
        match returned_literal_mut(block, type_name) {
            Some(lit) => self.merge_entries(lit, &entries, 1),
            None => {
                warn!(
                    name = %spec.name,
                    literal = type_name,
                    "no returned `{type_name}` literal found, skipping key-values"
                );
                Ok(0)
            }
        }
    }

    fn merge_variable_literal(&self, expr: &mut Expr, spec: &DeclarationSpec) -> Result<usize> {
        let entries = key_values(spec);
        let Some(type_name) = spec.literal_type() else {
            return Ok(0);
        };
        if entries.is_empty() {
            return Ok(0);
        }
        match find_literal_mut(expr, type_name) {
            Some(lit) => self.merge_entries(lit, &entries, 1),
            None => {
                warn!(
                    name = %spec.name,
                    literal = type_name,
                    "initializer is not a `{type_name}` literal, skipping key-values"
                );
                Ok(0)
            }
        }
    }

    fn merge_entries(
        &self,
        lit: &mut ExprStruct,
        entries: &[&KeyValueMember],
        depth: usize,
    ) -> Result<usize> {
        let mut appended = 0;
        for kv in entries {
            let existing = lit.fields.iter_mut().find(|fv| match &fv.member {
                Member::Named(ident) => ident_is(ident, &kv.key),
                Member::Unnamed(_) => false,
            });
            match (existing, &kv.value) {
                (Some(fv), ValueExpr::Composite(nested)) if depth < self.max_depth => {
                    if let Some(inner) = find_literal_mut(&mut fv.expr, &nested.type_name) {
                        let nested_entries: Vec<&KeyValueMember> = nested.entries.iter().collect();
                        appended += self.merge_entries(inner, &nested_entries, depth + 1)?;
                    }
                }
                (Some(_), _) => {}
                (None, _) => {
                    lit.fields.push(fragment::field_value(kv)?);
                    if lit.rest.is_some() || lit.dot2_token.is_some() {
                        lit.fields.push_punct(Default::default());
                    }
                    appended += 1;
                }
            }
        }
        Ok(appended)
    }
}

fn merge_fields(item: &mut ItemStruct, spec: &DeclarationSpec) -> Result<usize> {
    let required: Vec<&FieldMember> = spec
        .members
        .iter()
        .filter_map(|m| match m {
            MemberSpec::Field(f) => Some(f),
            _ => None,
        })
        .collect();
    if required.is_empty() {
        return Ok(0);
    }

    if let Fields::Unit = item.fields {
        item.fields = Fields::Named(FieldsNamed {
            brace_token: Default::default(),
            named: Default::default(),
        });
        item.semi_token = None;
    }
    let Fields::Named(named) = &mut item.fields else {
        return Err(SyncError::UnsupportedShape {
            name: item.ident.to_string(),
            detail: "tuple struct fields have no names to merge by".to_string(),
        });
    };

    let mut appended = 0;
    for field in required {
        let present = named
            .named
            .iter()
            .filter_map(|f| f.ident.as_ref())
            .any(|ident| ident_is(ident, &field.name));
        if present {
            continue;
        }
        named.named.push(build_field(field)?);
        appended += 1;
    }
    Ok(appended)
}

fn build_field(field: &FieldMember) -> Result<Field> {
    let ident = fragment::ident(&field.name)?;
    let ty = fragment::ty(&field.ty)?;
    let attrs = match &field.tag {
        Some(tag) => fragment::attributes(tag)?,
        None => Vec::new(),
    };
    let vis = fragment::visibility(field.visibility);
    Field::parse_named
        .parse2(quote!(#(#attrs)* #vis #ident: #ty))
        .map_err(|e| SyncError::malformed("field", &field.name, e))
}

fn merge_trait_methods(item: &mut ItemTrait, spec: &DeclarationSpec) -> Result<usize> {
    let mut appended = 0;
    for member in &spec.members {
        let MemberSpec::Method(method) = member else {
            continue;
        };
        let present = item.items.iter().any(|ti| match ti {
            TraitItem::Fn(f) => ident_is(&f.sig.ident, &method.name),
            _ => false,
        });
        if present {
            continue;
        }
        item.items.push(TraitItem::Fn(build_trait_method(method)?));
        appended += 1;
    }
    Ok(appended)
}

fn build_trait_method(method: &MethodMember) -> Result<TraitItemFn> {
    let ident = fragment::ident(&method.name)?;
    let args = method
        .params
        .iter()
        .enumerate()
        .map(|(i, p)| fragment::method_arg(p, i))
        .collect::<Result<Vec<FnArg>>>()?;
    let output = fragment::return_type(&method.results)?;
    syn::parse2::<TraitItemFn>(quote!(fn #ident(&self #(, #args)*) #output;))
        .map_err(|e| SyncError::malformed("trait method", &method.name, e))
}

fn merge_params(sig: &mut Signature, spec: &DeclarationSpec) -> Result<usize> {
    let mut appended = 0;
    for member in &spec.members {
        let MemberSpec::Param(ParamMember { name, ty }) = member else {
            continue;
        };
        let present = sig.inputs.iter().any(|arg| match arg {
            FnArg::Typed(typed) => matches!(&*typed.pat, Pat::Ident(p) if ident_is(&p.ident, name)),
            FnArg::Receiver(_) => false,
        });
        if present {
            continue;
        }
        sig.inputs.push(fragment::param(name, ty)?);
        appended += 1;
    }
    Ok(appended)
}

fn merge_statements(block: &mut Block, spec: &DeclarationSpec) -> Result<usize> {
    let mut insert_at = match block.stmts.last() {
        Some(Stmt::Expr(_, None)) => block.stmts.len() - 1,
        _ => block.stmts.len(),
    };
    let mut appended = 0;
    for member in &spec.members {
        let MemberSpec::Statement(StatementMember { source }) = member else {
            continue;
        };
        let stmt = fragment::statement(source)?;
        let key = statement_key(&stmt);
        if block.stmts.iter().any(|s| statement_key(s) == key) {
            continue;
        }
        block.stmts.insert(insert_at, stmt);
        insert_at += 1;
        appended += 1;
    }
    Ok(appended)
}

/// Token text of a statement without its terminating semicolon.
fn statement_key(stmt: &Stmt) -> String {
    fragment::token_key(stmt)
        .trim_end_matches(';')
        .trim_end()
        .to_string()
}

fn key_values(spec: &DeclarationSpec) -> Vec<&KeyValueMember> {
    spec.members
        .iter()
        .filter_map(|m| match m {
            MemberSpec::KeyValue(kv) => Some(kv),
            _ => None,
        })
        .collect()
}

/// Whether `target` already holds the literal its key-values merge into.
/// Declarations without key-values or without a literal type always do.
pub fn holds_literal(target: DeclarationMut<'_>, spec: &DeclarationSpec) -> bool {
    let Some(type_name) = spec.literal_type() else {
        return true;
    };
    if key_values(spec).is_empty() {
        return true;
    }
    match target {
        DeclarationMut::Function { block, .. } => returned_literal_mut(block, type_name).is_some(),
        DeclarationMut::Variable { expr, .. } => find_literal_mut(expr, type_name).is_some(),
        DeclarationMut::Struct(_) | DeclarationMut::Interface(_) => true,
    }
}

/// The `type_name` literal a function body returns, either as its tail
/// expression or through a `return` statement.
fn returned_literal_mut<'a>(block: &'a mut Block, type_name: &str) -> Option<&'a mut ExprStruct> {
    let last = block.stmts.len().checked_sub(1)?;
    for (i, stmt) in block.stmts.iter_mut().enumerate().rev() {
        let candidate = match stmt {
            Stmt::Expr(Expr::Return(ret), _) => ret.expr.as_deref_mut(),
            Stmt::Expr(expr, None) if i == last => Some(expr),
            _ => None,
        };
        if let Some(lit) = candidate.and_then(|e| find_literal_mut(e, type_name)) {
            return Some(lit);
        }
    }
    None
}

/// Struct literal of `type_name` (or `Self`), looking through parentheses,
/// references and single-argument calls such as `Ok(..)` or `Arc::new(..)`.
fn find_literal_mut<'a>(expr: &'a mut Expr, type_name: &str) -> Option<&'a mut ExprStruct> {
    match expr {
        Expr::Struct(lit) if literal_matches(lit, type_name) => Some(lit),
        Expr::Paren(p) => find_literal_mut(&mut p.expr, type_name),
        Expr::Group(g) => find_literal_mut(&mut g.expr, type_name),
        Expr::Reference(r) => find_literal_mut(&mut r.expr, type_name),
        Expr::Call(call) if call.args.len() == 1 => call
            .args
            .first_mut()
            .and_then(|arg| find_literal_mut(arg, type_name)),
        _ => None,
    }
}

fn literal_matches(lit: &ExprStruct, type_name: &str) -> bool {
    let wanted = last_path_segment(type_name);
    lit.path
        .segments
        .last()
        .is_some_and(|seg| ident_is(&seg.ident, wanted) || seg.ident == "Self")
}
