//! Declaration descriptions consumed by the sync engine.
//!
//! A [`DeclarationSpec`] says which top-level declaration a file must
//! contain and which members it must at least have. Drivers build these
//! from project configuration; the engine never invents members on its own.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};

/// The closed set of declaration shapes the engine knows how to grow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationKind {
    /// `struct Name { .. }`
    Struct,
    /// `trait Name { .. }`
    Interface,
    /// Free function returning a struct literal.
    Constructor,
    /// Function inside an inherent `impl Receiver` block.
    Method,
    /// `static NAME: T = T { .. };`
    VariableLiteral,
}

impl DeclarationKind {
    pub fn name(&self) -> &'static str {
        match self {
            DeclarationKind::Struct => "struct",
            DeclarationKind::Interface => "interface",
            DeclarationKind::Constructor => "constructor",
            DeclarationKind::Method => "method",
            DeclarationKind::VariableLiteral => "variable literal",
        }
    }

    /// Whether members of `kind` may appear in a declaration of this kind.
    pub fn accepts(&self, member: MemberKind) -> bool {
        use MemberKind::*;
        match self {
            DeclarationKind::Struct => member == Field,
            DeclarationKind::Interface => member == Method,
            DeclarationKind::Constructor | DeclarationKind::Method => {
                matches!(member, Param | Statement | KeyValue)
            }
            DeclarationKind::VariableLiteral => member == KeyValue,
        }
    }
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Visibility given to synthesized declarations and fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    #[serde(alias = "pub")]
    Public,
    #[serde(alias = "pub(crate)")]
    Crate,
    Private,
}

/// Tag of a [`MemberSpec`] variant, used for compatibility checks and messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Field,
    Param,
    Method,
    KeyValue,
    Statement,
}

impl MemberKind {
    pub fn name(&self) -> &'static str {
        match self {
            MemberKind::Field => "field",
            MemberKind::Param => "param",
            MemberKind::Method => "method",
            MemberKind::KeyValue => "key-value",
            MemberKind::Statement => "statement",
        }
    }
}

/// A struct field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMember {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    /// Outer attributes, e.g. `serde(rename = "id")` or `#[serde(default)]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default)]
    pub visibility: Visibility,
}

/// A function parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamMember {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

/// A trait method signature. Every method takes `&self`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodMember {
    pub name: String,
    /// Either bare types (named `arg0`, `arg1`, ..) or `name: Type` pairs.
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default)]
    pub results: Vec<String>,
}

/// One `key: value` entry of a struct literal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValueMember {
    pub key: String,
    pub value: ValueExpr,
}

/// The value side of a [`KeyValueMember`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValueExpr {
    Expr(String),
    Composite(CompositeLiteral),
}

/// A nested struct literal, matched in existing code by its type name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeLiteral {
    pub type_name: String,
    #[serde(default)]
    pub entries: Vec<KeyValueMember>,
}

/// An opaque statement, identified by its token-normalized text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementMember {
    pub source: String,
}

/// A required member of a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberSpec {
    Field(FieldMember),
    Param(ParamMember),
    Method(MethodMember),
    KeyValue(KeyValueMember),
    Statement(StatementMember),
}

impl MemberSpec {
    pub fn kind(&self) -> MemberKind {
        match self {
            MemberSpec::Field(_) => MemberKind::Field,
            MemberSpec::Param(_) => MemberKind::Param,
            MemberSpec::Method(_) => MemberKind::Method,
            MemberSpec::KeyValue(_) => MemberKind::KeyValue,
            MemberSpec::Statement(_) => MemberKind::Statement,
        }
    }

    /// Identity of the member within its declaration.
    pub fn key(&self) -> &str {
        match self {
            MemberSpec::Field(f) => &f.name,
            MemberSpec::Param(p) => &p.name,
            MemberSpec::Method(m) => &m.name,
            MemberSpec::KeyValue(kv) => &kv.key,
            MemberSpec::Statement(s) => s.source.trim(),
        }
    }

    pub fn field(name: &str, ty: &str) -> Self {
        MemberSpec::Field(FieldMember {
            name: name.to_string(),
            ty: ty.to_string(),
            tag: None,
            visibility: Visibility::Public,
        })
    }

    pub fn tagged_field(name: &str, ty: &str, tag: &str) -> Self {
        MemberSpec::Field(FieldMember {
            name: name.to_string(),
            ty: ty.to_string(),
            tag: Some(tag.to_string()),
            visibility: Visibility::Public,
        })
    }

    pub fn private_field(name: &str, ty: &str) -> Self {
        MemberSpec::Field(FieldMember {
            name: name.to_string(),
            ty: ty.to_string(),
            tag: None,
            visibility: Visibility::Private,
        })
    }

    pub fn param(name: &str, ty: &str) -> Self {
        MemberSpec::Param(ParamMember {
            name: name.to_string(),
            ty: ty.to_string(),
        })
    }

    pub fn method(name: &str, params: &[&str], results: &[&str]) -> Self {
        MemberSpec::Method(MethodMember {
            name: name.to_string(),
            params: params.iter().map(|p| p.to_string()).collect(),
            results: results.iter().map(|r| r.to_string()).collect(),
        })
    }

    pub fn key_value(key: &str, value: &str) -> Self {
        MemberSpec::KeyValue(KeyValueMember {
            key: key.to_string(),
            value: ValueExpr::Expr(value.to_string()),
        })
    }

    pub fn nested(key: &str, type_name: &str, entries: Vec<KeyValueMember>) -> Self {
        MemberSpec::KeyValue(KeyValueMember {
            key: key.to_string(),
            value: ValueExpr::Composite(CompositeLiteral {
                type_name: type_name.to_string(),
                entries,
            }),
        })
    }

    pub fn statement(source: &str) -> Self {
        MemberSpec::Statement(StatementMember {
            source: source.to_string(),
        })
    }
}

impl KeyValueMember {
    pub fn new(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: ValueExpr::Expr(value.to_string()),
        }
    }
}

/// Identity of a declaration inside one file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeclarationKey {
    pub name: String,
    pub kind: DeclarationKind,
    /// Receiver type name, methods only.
    pub receiver: Option<String>,
}

impl fmt::Display for DeclarationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.receiver {
            Some(receiver) => write!(f, "{} {}::{}", self.kind, receiver, self.name),
            None => write!(f, "{} {}", self.kind, self.name),
        }
    }
}

/// Everything the engine needs to create or grow one declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclarationSpec {
    pub name: String,
    pub kind: DeclarationKind,
    /// Receiver type for methods; prefix with `&mut ` for a `&mut self` method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    /// Return type of a function, or declared type of a variable literal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returns: Option<String>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<String>,
    #[serde(default)]
    pub members: Vec<MemberSpec>,
    /// Fixed statements placed in a synthesized function body.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub body: Vec<String>,
}

impl DeclarationSpec {
    pub fn new(name: &str, kind: DeclarationKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            receiver: None,
            returns: None,
            visibility: Visibility::Public,
            doc: None,
            attributes: Vec::new(),
            imports: Vec::new(),
            members: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn structure(name: &str) -> Self {
        Self::new(name, DeclarationKind::Struct)
    }

    pub fn interface(name: &str) -> Self {
        Self::new(name, DeclarationKind::Interface)
    }

    pub fn constructor(name: &str, returns: &str) -> Self {
        Self::new(name, DeclarationKind::Constructor).returns(returns)
    }

    pub fn method(receiver: &str, name: &str) -> Self {
        let mut spec = Self::new(name, DeclarationKind::Method);
        spec.receiver = Some(receiver.to_string());
        spec
    }

    pub fn variable(name: &str, ty: &str) -> Self {
        Self::new(name, DeclarationKind::VariableLiteral).returns(ty)
    }

    pub fn returns(mut self, ty: &str) -> Self {
        self.returns = Some(ty.to_string());
        self
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn doc(mut self, doc: &str) -> Self {
        self.doc = Some(doc.to_string());
        self
    }

    pub fn attribute(mut self, attr: &str) -> Self {
        self.attributes.push(attr.to_string());
        self
    }

    pub fn import(mut self, path: &str) -> Self {
        self.imports.push(path.to_string());
        self
    }

    pub fn member(mut self, member: MemberSpec) -> Self {
        self.members.push(member);
        self
    }

    pub fn members(mut self, members: impl IntoIterator<Item = MemberSpec>) -> Self {
        self.members.extend(members);
        self
    }

    pub fn body_stmt(mut self, stmt: &str) -> Self {
        self.body.push(stmt.to_string());
        self
    }

    pub fn key(&self) -> DeclarationKey {
        DeclarationKey {
            name: self.name.clone(),
            kind: self.kind,
            receiver: self.receiver.as_deref().map(receiver_type_name),
        }
    }

    /// Whether a method spec asks for a `&mut self` receiver.
    pub fn mutable_receiver(&self) -> bool {
        self.receiver
            .as_deref()
            .is_some_and(|r| r.trim_start().starts_with("&mut "))
    }

    /// Type name struct literals of this declaration are matched by.
    pub fn literal_type(&self) -> Option<&str> {
        self.returns.as_deref().map(last_path_segment)
    }

    /// Check the spec before any file is touched.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(SyncError::invalid_spec(&self.name, "name is empty"));
        }
        if self.kind == DeclarationKind::Method && self.receiver.is_none() {
            return Err(SyncError::invalid_spec(&self.name, "method without a receiver"));
        }
        if self.kind == DeclarationKind::VariableLiteral && self.returns.is_none() {
            return Err(SyncError::invalid_spec(
                &self.name,
                "variable literal without a declared type",
            ));
        }

        let mut seen = HashSet::new();
        for member in &self.members {
            let kind = member.kind();
            if !self.kind.accepts(kind) {
                return Err(SyncError::invalid_spec(
                    &self.name,
                    format!("a {} cannot hold a {} member", self.kind, kind.name()),
                ));
            }
            if kind == MemberKind::KeyValue && self.returns.is_none() {
                return Err(SyncError::invalid_spec(
                    &self.name,
                    format!("key-value `{}` needs a return type to locate its literal", member.key()),
                ));
            }
            if !seen.insert((kind.name(), member.key())) {
                return Err(SyncError::invalid_spec(
                    &self.name,
                    format!("duplicate {} `{}`", kind.name(), member.key()),
                ));
            }
            if let MemberSpec::KeyValue(kv) = member {
                validate_nested(&self.name, kv)?;
            }
        }
        Ok(())
    }
}

/// Entry keys must be unique within each nested literal.
fn validate_nested(name: &str, kv: &KeyValueMember) -> Result<()> {
    let ValueExpr::Composite(literal) = &kv.value else {
        return Ok(());
    };
    let mut seen = HashSet::new();
    for entry in &literal.entries {
        if !seen.insert(entry.key.as_str()) {
            return Err(SyncError::invalid_spec(
                name,
                format!("duplicate key-value `{}` in `{}` literal", entry.key, literal.type_name),
            ));
        }
        validate_nested(name, entry)?;
    }
    Ok(())
}

/// `&mut Router` -> `Router`, `crate::model::Widget` -> `Widget`.
pub fn receiver_type_name(receiver: &str) -> String {
    let trimmed = receiver.trim();
    let stripped = trimmed
        .strip_prefix("&mut ")
        .or_else(|| trimmed.strip_prefix('&'))
        .unwrap_or(trimmed);
    last_path_segment(stripped).to_string()
}

/// Last `::` segment of a type path, without generic arguments.
pub fn last_path_segment(ty: &str) -> &str {
    let without_generics = ty.split('<').next().unwrap_or(ty).trim();
    without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics)
        .trim()
}
