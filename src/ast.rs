//! Parse-tree declaration shapes produced by [`crate::parser`], consumed by
//! [`crate::coordinator`] to populate an [`crate::scope::Ast`]'s scope with
//! real [`crate::types::Type`]s.
//!
//! Kept as a thin, mechanical layer between the grammar and the type
//! graph: the parser never resolves a reference or checks an invariant, it
//! just records what the grammar saw, e.g. the teacher's `Program`
//! (`ast.rs`) holding unions/words as plain decl structs for the resolver
//! to merge afterward.

use crate::constant::ConstantExpression;

#[derive(Debug, Clone)]
pub enum TopLevelDecl {
    Package(String),
    Import(ImportDecl),
    Enum(EnumDecl),
    Struct(StructDecl),
    Union(UnionDecl),
    Typedef(TypedefDecl),
    Interface(InterfaceDecl),
    Const(ConstDecl),
}

#[derive(Debug, Clone)]
pub struct ImportDecl {
    pub fqname: String,
}

#[derive(Debug, Clone)]
pub struct EnumValueDecl {
    pub name: String,
    pub explicit: Option<ConstantExpression>,
}

#[derive(Debug, Clone)]
pub struct EnumDecl {
    pub name: String,
    pub storage: String,
    pub values: Vec<EnumValueDecl>,
}

#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub type_name: String,
    pub name: String,
    pub array_dims: Vec<u64>,
}

#[derive(Debug, Clone)]
pub struct StructDecl {
    pub name: String,
    pub fields: Vec<FieldDecl>,
}

#[derive(Debug, Clone)]
pub struct UnionDecl {
    pub name: String,
    pub fields: Vec<FieldDecl>,
}

#[derive(Debug, Clone)]
pub struct TypedefDecl {
    pub name: String,
    pub target: String,
}

#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub name: String,
    pub inputs: Vec<(String, String)>,
    pub outputs: Vec<(String, String)>,
    pub one_way: bool,
}

#[derive(Debug, Clone)]
pub struct InterfaceDecl {
    pub name: String,
    pub extends: Option<String>,
    pub methods: Vec<MethodDecl>,
}

#[derive(Debug, Clone)]
pub struct ConstDecl {
    pub type_name: String,
    pub name: String,
    pub value: ConstantExpression,
}
