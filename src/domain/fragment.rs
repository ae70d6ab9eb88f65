//! Turning spec snippets into syntax nodes.
//!
//! Every type, expression, statement and attribute in a [`DeclarationSpec`]
//! is Rust source text. Anything that does not form a valid node is a
//! [`SyncError::MalformedNode`], raised before the target file is written.
//!
//! [`DeclarationSpec`]: crate::domain::declaration::DeclarationSpec

use proc_macro2::TokenStream;
use quote::{quote, ToTokens};
use syn::ext::IdentExt;
use syn::parse::Parser;
use syn::punctuated::Punctuated;
use syn::{
    Attribute, Block, Expr, ExprStruct, FieldValue, FnArg, Ident, ItemUse, Member, Path,
    ReturnType, Stmt, Token, Type, UseTree,
};

use crate::domain::declaration::{KeyValueMember, ValueExpr, Visibility};
use crate::error::{Result, SyncError};

pub fn ident(name: &str) -> Result<Ident> {
    syn::parse_str::<Ident>(name.trim()).map_err(|e| SyncError::malformed("identifier", name, e))
}

pub fn ty(src: &str) -> Result<Type> {
    syn::parse_str::<Type>(src).map_err(|e| SyncError::malformed("type", src, e))
}

pub fn expr(src: &str) -> Result<Expr> {
    syn::parse_str::<Expr>(src).map_err(|e| SyncError::malformed("expression", src, e))
}

pub fn path(src: &str) -> Result<Path> {
    syn::parse_str::<Path>(src).map_err(|e| SyncError::malformed("path", src, e))
}

/// A single statement. A trailing expression gets a semicolon so it can sit
/// anywhere in a block.
pub fn statement(src: &str) -> Result<Stmt> {
    let stmts = Block::parse_within
        .parse_str(src)
        .map_err(|e| SyncError::malformed("statement", src, e))?;
    let mut iter = stmts.into_iter();
    match (iter.next(), iter.next()) {
        (Some(stmt), None) => Ok(terminate(stmt)),
        _ => Err(SyncError::malformed(
            "statement",
            src,
            "expected exactly one statement",
        )),
    }
}

/// Statements of a body template; a final expression stays a tail expression.
pub fn statements(srcs: &[String]) -> Result<Vec<Stmt>> {
    let mut out = Vec::new();
    for src in srcs {
        let stmts = Block::parse_within
            .parse_str(src)
            .map_err(|e| SyncError::malformed("statement", src, e))?;
        out.extend(stmts);
    }
    // Only the last statement of the whole template may stay unterminated.
    let last = out.len().saturating_sub(1);
    Ok(out
        .into_iter()
        .enumerate()
        .map(|(i, stmt)| if i == last { stmt } else { terminate(stmt) })
        .collect())
}

fn terminate(stmt: Stmt) -> Stmt {
    match stmt {
        Stmt::Expr(expr, None) => Stmt::Expr(expr, Some(Default::default())),
        Stmt::Macro(mut mac) if mac.semi_token.is_none() => {
            mac.semi_token = Some(Default::default());
            Stmt::Macro(mac)
        }
        other => other,
    }
}

/// Outer attributes. Accepts `#[a] #[b]` or a bare meta such as `serde(default)`.
pub fn attributes(src: &str) -> Result<Vec<Attribute>> {
    let trimmed = src.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let text = if trimmed.starts_with('#') {
        trimmed.to_string()
    } else {
        format!("#[{}]", trimmed)
    };
    Attribute::parse_outer
        .parse_str(&text)
        .map_err(|e| SyncError::malformed("attribute", src, e))
}

pub fn doc_attribute(doc: &str) -> Result<Vec<Attribute>> {
    let mut attrs = Vec::new();
    for line in doc.lines() {
        let text = format!(" {}", line.trim_end());
        attrs.extend(
            Attribute::parse_outer
                .parse2(quote!(#[doc = #text]))
                .map_err(|e| SyncError::malformed("doc comment", doc, e))?,
        );
    }
    Ok(attrs)
}

/// A `use` item. Accepts `use a::b;` or just `a::b`.
pub fn use_item(src: &str) -> Result<ItemUse> {
    let trimmed = src.trim();
    let text = if trimmed.starts_with("use ") || trimmed.starts_with("pub ") {
        trimmed.to_string()
    } else {
        format!("use {};", trimmed.trim_end_matches(';'))
    };
    syn::parse_str::<ItemUse>(&text).map_err(|e| SyncError::malformed("import", src, e))
}

/// Trait method parameter: `name: Type`, or a bare type named `arg{index}`.
pub fn method_arg(src: &str, index: usize) -> Result<FnArg> {
    if let Ok(arg @ FnArg::Typed(_)) = syn::parse_str::<FnArg>(src) {
        return Ok(arg);
    }
    let ty = ty(src)?;
    let name = Ident::new(&format!("arg{index}"), proc_macro2::Span::call_site());
    typed_arg(&name, &ty, src)
}

pub fn param(name: &str, ty_src: &str) -> Result<FnArg> {
    let ident = ident(name)?;
    let ty = ty(ty_src)?;
    typed_arg(&ident, &ty, ty_src)
}

fn typed_arg(name: &Ident, ty: &Type, src: &str) -> Result<FnArg> {
    syn::parse2::<FnArg>(quote!(#name: #ty)).map_err(|e| SyncError::malformed("parameter", src, e))
}

/// `()` for no results, `-> T` for one, `-> (A, B)` for several.
pub fn return_type(results: &[String]) -> Result<ReturnType> {
    let types = results.iter().map(|r| ty(r)).collect::<Result<Vec<_>>>()?;
    let tokens = match types.as_slice() {
        [] => return Ok(ReturnType::Default),
        [single] => quote!(-> #single),
        many => quote!(-> (#(#many),*)),
    };
    syn::parse2::<ReturnType>(tokens)
        .map_err(|e| SyncError::malformed("return type", &results.join(", "), e))
}

pub fn visibility(vis: Visibility) -> TokenStream {
    match vis {
        Visibility::Public => quote!(pub),
        Visibility::Crate => quote!(pub(crate)),
        Visibility::Private => TokenStream::new(),
    }
}

/// `key: value`, or the shorthand `key` when the value is the same identifier.
pub fn field_value(kv: &KeyValueMember) -> Result<FieldValue> {
    let key = ident(&kv.key)?;
    let expr = value_expr(&kv.value)?;
    let shorthand = matches!(&expr, Expr::Path(p) if p.qself.is_none() && p.path.is_ident(&key));
    Ok(FieldValue {
        attrs: Vec::new(),
        member: Member::Named(key),
        colon_token: if shorthand { None } else { Some(Default::default()) },
        expr,
    })
}

pub fn value_expr(value: &ValueExpr) -> Result<Expr> {
    match value {
        ValueExpr::Expr(src) => expr(src),
        ValueExpr::Composite(lit) => {
            let fields = lit
                .entries
                .iter()
                .map(field_value)
                .collect::<Result<Punctuated<FieldValue, Token![,]>>>()?;
            Ok(Expr::Struct(struct_literal(path(&lit.type_name)?, fields)))
        }
    }
}

pub fn empty_literal(type_name: &str) -> Result<ExprStruct> {
    Ok(struct_literal(path(type_name)?, Punctuated::new()))
}

fn struct_literal(path: Path, fields: Punctuated<FieldValue, Token![,]>) -> ExprStruct {
    ExprStruct {
        attrs: Vec::new(),
        qself: None,
        path,
        brace_token: Default::default(),
        fields,
        dot2_token: None,
        rest: None,
    }
}

/// Token-normalized text, the identity of statements and imports.
pub fn token_key<T: ToTokens>(node: &T) -> String {
    node.to_token_stream().to_string()
}

/// Compare an identifier against a spec name, ignoring any `r#` prefix.
pub fn ident_is(ident: &Ident, name: &str) -> bool {
    ident.unraw() == name.trim()
}

/// Every leaf path a `use` tree brings into scope, e.g. `a::{B, C}` gives
/// `a::B` and `a::C`.
pub fn use_leaves(tree: &UseTree) -> Vec<String> {
    let mut out = Vec::new();
    collect_use_leaves(tree, String::new(), &mut out);
    out
}

fn collect_use_leaves(tree: &UseTree, prefix: String, out: &mut Vec<String>) {
    let join = |segment: &str| {
        if prefix.is_empty() {
            segment.to_string()
        } else {
            format!("{prefix}::{segment}")
        }
    };
    match tree {
        UseTree::Path(p) => collect_use_leaves(&p.tree, join(&p.ident.to_string()), out),
        UseTree::Name(n) => out.push(join(&n.ident.to_string())),
        UseTree::Rename(r) => out.push(format!("{} as {}", join(&r.ident.to_string()), r.rename)),
        UseTree::Glob(_) => out.push(join("*")),
        UseTree::Group(g) => {
            for item in &g.items {
                collect_use_leaves(item, prefix.clone(), out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("String")]
    #[case("Arc<dyn WidgetRepository>")]
    #[case("&'static str")]
    #[case("(u32, Vec<u8>)")]
    fn test_types_parse(#[case] src: &str) {
        assert!(ty(src).is_ok(), "{src}");
    }

    #[rstest]
    #[case("ident", "type")]
    #[case("type", "Vec<")]
    #[case("expression", "a +")]
    fn test_malformed_fragments(#[case] what: &str, #[case] src: &str) {
        let err = match what {
            "ident" => ident(src).unwrap_err(),
            "type" => ty(src).unwrap_err(),
            _ => expr(src).unwrap_err(),
        };
        assert!(err.is_defect(), "{err}");
    }

    #[test]
    fn test_statement_gets_terminated() {
        let stmt = statement("self.routes.push((\"/widgets\", \"widget\"))").unwrap();
        assert!(matches!(stmt, Stmt::Expr(_, Some(_))));
        assert!(statement("let a = 1; let b = 2;").is_err());
    }

    #[test]
    fn test_statement_key_ignores_whitespace() {
        let a = statement("self.routes.push((\"/a\",   \"a\"));").unwrap();
        let b = statement("self.routes\n    .push((\"/a\", \"a\"))").unwrap();
        assert_eq!(token_key(&a), token_key(&b));
    }

    #[test]
    fn test_template_keeps_tail_expression() {
        let stmts = statements(&["let x = 1;".to_string(), "x + 1".to_string()]).unwrap();
        assert!(matches!(stmts[0], Stmt::Local(_)));
        assert!(matches!(stmts[1], Stmt::Expr(_, None)));
    }

    #[test]
    fn test_attributes_accept_bare_meta() {
        let attrs = attributes("serde(rename = \"id\")").unwrap();
        assert_eq!(attrs.len(), 1);
        assert!(attrs[0].path().is_ident("serde"));
        let attrs = attributes("#[serde(default)] #[allow(dead_code)]").unwrap();
        assert_eq!(attrs.len(), 2);
    }

    #[test]
    fn test_method_arg_names_bare_types() {
        let arg = method_arg("&str", 1).unwrap();
        assert_eq!(token_key(&arg), token_key(&param("arg1", "&str").unwrap()));
        let arg = method_arg("id: &str", 0).unwrap();
        assert_eq!(token_key(&arg), token_key(&param("id", "&str").unwrap()));
    }

    #[test]
    fn test_return_type_shapes() {
        assert_eq!(return_type(&[]).unwrap(), ReturnType::Default);
        let one = return_type(&["u32".to_string()]).unwrap();
        assert_eq!(token_key(&one), "-> u32");
        let two = return_type(&["u32".to_string(), "bool".to_string()]).unwrap();
        assert_eq!(token_key(&two), "-> (u32 , bool)");
    }

    #[test]
    fn test_field_value_shorthand() {
        let fv = field_value(&KeyValueMember::new("repo", "repo")).unwrap();
        assert!(fv.colon_token.is_none());
        let fv = field_value(&KeyValueMember::new("repo", "Arc::clone(&repo)")).unwrap();
        assert!(fv.colon_token.is_some());
    }

    #[test]
    fn test_use_leaves_expand_groups() {
        let item = use_item("use serde::{Deserialize, Serialize as Ser};").unwrap();
        assert_eq!(
            use_leaves(&item.tree),
            vec!["serde::Deserialize".to_string(), "serde::Serialize as Ser".to_string()]
        );
        let item = use_item("std::sync::Arc").unwrap();
        assert_eq!(use_leaves(&item.tree), vec!["std::sync::Arc".to_string()]);
    }
}
