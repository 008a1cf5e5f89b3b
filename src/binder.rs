//! Lowers parser decl structs ([`crate::ast::TopLevelDecl`] and friends)
//! into the real type graph ([`crate::types`]) inside one file's
//! [`crate::scope::Ast`].
//!
//! Kept as its own pass (rather than folded into the parser) because name
//! resolution needs a populated scope to check against — the parser only
//! knows grammar, the binder knows types. Cross-file resolution goes
//! through the single [`BindContext`] trait object the Coordinator
//! implements directly, so there is exactly one mutable handle into the
//! shared arenas for the whole pass (splitting it into separate
//! arena-plus-resolver borrows is what the Coordinator's own recursive
//! `parse`/`lookup_type` calls would alias against).

use crate::ast::{ConstDecl, EnumDecl, FieldDecl, InterfaceDecl, StructDecl, TopLevelDecl, TypedefDecl, UnionDecl};
use crate::constant::ConstValue;
use crate::error::{HidlError, Result};
use crate::scope::{assign_serial_ids, Ast, Method, ScopeHandle};
use crate::types::{CompoundKind, EnumType, InterfaceType, ScalarKind, Type, TypeArena, TypeHandle};

/// Everything the binder needs besides the local `Ast`/decl tree: arena
/// mutation and cross-file name resolution, behind one trait so only one
/// mutable borrow of the Coordinator is ever live.
pub trait BindContext {
    fn alloc_type(&mut self, ty: Type) -> TypeHandle;
    fn arena(&self) -> &TypeArena;
    fn add_scoped_type(&mut self, scope: ScopeHandle, name: String, handle: TypeHandle) -> Result<()>;
    fn add_constant(&mut self, scope: ScopeHandle, name: String, value: ConstValue) -> Result<()>;
    fn lookup_local(&self, scope: ScopeHandle, name: &str) -> Option<TypeHandle>;

    /// Resolve a name this file doesn't define itself: an imported type's
    /// bare name, or a fully-qualified `package@version::Tail` string,
    /// relative to the file currently being bound.
    fn resolve_external(&mut self, current_package: &str, current_version: (u32, u32), name: &str) -> Result<TypeHandle>;

    /// The super-interface's last assigned method serial ID, for
    /// continuing the monotonic ID sequence across an `extends` edge.
    fn super_interface_last_id(
        &mut self,
        current_package: &str,
        current_version: (u32, u32),
        name: &str,
    ) -> Result<(TypeHandle, u32)>;
}

pub fn bind(
    decls: &[TopLevelDecl],
    ast: &mut Ast,
    ctx: &mut dyn BindContext,
    current_package: &str,
    current_version: (u32, u32),
) -> Result<()> {
    for decl in decls {
        match decl {
            TopLevelDecl::Package(_) | TopLevelDecl::Import(_) => {}
            TopLevelDecl::Enum(e) => bind_enum(e, ast, ctx)?,
            TopLevelDecl::Struct(s) => {
                bind_compound(&s.name, &s.fields, CompoundKind::Struct, ast, ctx, current_package, current_version)?
            }
            TopLevelDecl::Union(u) => {
                bind_compound(&u.name, &u.fields, CompoundKind::Union, ast, ctx, current_package, current_version)?
            }
            TopLevelDecl::Typedef(t) => bind_typedef(t, ast, ctx, current_package, current_version)?,
            TopLevelDecl::Interface(i) => bind_interface(i, ast, ctx, current_package, current_version)?,
            TopLevelDecl::Const(c) => bind_const(c, ast, ctx)?,
        }
    }
    Ok(())
}

fn resolve_type_name(
    name: &str,
    ast: &Ast,
    ctx: &mut dyn BindContext,
    current_package: &str,
    current_version: (u32, u32),
) -> Result<TypeHandle> {
    if let Some(scalar) = builtin_scalar(name) {
        return Ok(ctx.alloc_type(Type::Scalar(scalar)));
    }
    if name == "string" {
        return Ok(ctx.alloc_type(Type::Str));
    }
    if name == "handle" {
        return Ok(ctx.alloc_type(Type::Handle));
    }
    if let Some(inner_name) = name.strip_prefix("vec<").and_then(|s| s.strip_suffix('>')) {
        let inner = resolve_type_name(inner_name, ast, ctx, current_package, current_version)?;
        return Ok(ctx.alloc_type(Type::Vector(inner)));
    }
    if let Some(handle) = ctx.lookup_local(ast.root(), name) {
        return Ok(handle);
    }
    ctx.resolve_external(current_package, current_version, name)
}

fn builtin_scalar(name: &str) -> Option<ScalarKind> {
    Some(match name {
        "bool" | "boolean" => ScalarKind::Bool,
        "int8_t" => ScalarKind::Int8,
        "uint8_t" => ScalarKind::Uint8,
        "int16_t" => ScalarKind::Int16,
        "uint16_t" => ScalarKind::Uint16,
        "int32_t" => ScalarKind::Int32,
        "uint32_t" => ScalarKind::Uint32,
        "int64_t" => ScalarKind::Int64,
        "uint64_t" => ScalarKind::Uint64,
        "float" => ScalarKind::Float,
        "double" => ScalarKind::Double,
        _ => return None,
    })
}

/// `storage` is either a builtin scalar name or another enum declared
/// earlier in the same file, whose values this one continues.
fn bind_enum(decl: &EnumDecl, ast: &mut Ast, ctx: &mut dyn BindContext) -> Result<()> {
    let mut enum_type = if let Some(storage) = builtin_scalar(&decl.storage) {
        EnumType::new(&decl.name, storage)?
    } else if let Some(parent) = ctx.lookup_local(ast.root(), &decl.storage) {
        EnumType::new_inherited(&decl.name, parent, ctx.arena())?
    } else {
        return Err(HidlError::TypeConstraint(format!(
            "enum '{}' storage type '{}' is not a scalar or enum",
            decl.name, decl.storage
        )));
    };
    for value in &decl.values {
        let explicit = value.explicit.as_ref().map(|expr| expr.value());
        enum_type.push_value(&value.name, explicit, ctx.arena())?;
    }
    let handle = ctx.alloc_type(Type::Enum(enum_type));
    ctx.add_scoped_type(ast.root(), decl.name.clone(), handle)
}

#[allow(clippy::too_many_arguments)]
fn bind_compound(
    name: &str,
    fields: &[FieldDecl],
    kind: CompoundKind,
    ast: &mut Ast,
    ctx: &mut dyn BindContext,
    current_package: &str,
    current_version: (u32, u32),
) -> Result<()> {
    let mut bound_fields = Vec::with_capacity(fields.len());
    for field in fields {
        let mut handle = resolve_type_name(&field.type_name, ast, ctx, current_package, current_version)?;
        if !field.array_dims.is_empty() {
            let array = Type::array(handle, field.array_dims.clone())?;
            handle = ctx.alloc_type(array);
        }
        bound_fields.push(crate::types::Field {
            name: field.name.clone(),
            type_handle: handle,
        });
    }
    let compound = Type::compound(name, kind, bound_fields, ctx.arena())?;
    let handle = ctx.alloc_type(compound);
    ctx.add_scoped_type(ast.root(), name.to_string(), handle)
}

fn bind_typedef(
    decl: &TypedefDecl,
    ast: &mut Ast,
    ctx: &mut dyn BindContext,
    current_package: &str,
    current_version: (u32, u32),
) -> Result<()> {
    let target = resolve_type_name(&decl.target, ast, ctx, current_package, current_version)?;
    let handle = ctx.alloc_type(Type::TypeDef(decl.name.clone(), target));
    ctx.add_scoped_type(ast.root(), decl.name.clone(), handle)
}

fn bind_interface(
    decl: &InterfaceDecl,
    ast: &mut Ast,
    ctx: &mut dyn BindContext,
    current_package: &str,
    current_version: (u32, u32),
) -> Result<()> {
    let (super_handle, start_id) = match &decl.extends {
        Some(super_name) => {
            let (handle, last_id) = ctx.super_interface_last_id(current_package, current_version, super_name)?;
            (Some(handle), last_id + 1)
        }
        None => (None, 0),
    };

    let mut methods = Vec::with_capacity(decl.methods.len());
    for method in &decl.methods {
        let inputs = bind_params(&method.inputs, ast, ctx, current_package, current_version)?;
        let outputs = bind_params(&method.outputs, ast, ctx, current_package, current_version)?;
        methods.push(Method {
            name: method.name.clone(),
            inputs,
            outputs,
            one_way: method.one_way,
            annotations: Vec::new(),
            serial_id: 0,
        });
    }
    assign_serial_ids(&mut methods, start_id);

    let iface_type = Type::Interface(InterfaceType {
        name: decl.name.clone(),
        super_interface: super_handle,
        methods,
    });
    let handle = ctx.alloc_type(iface_type);
    ctx.add_scoped_type(ast.root(), decl.name.clone(), handle)
}

fn bind_params(
    params: &[(String, String)],
    ast: &mut Ast,
    ctx: &mut dyn BindContext,
    current_package: &str,
    current_version: (u32, u32),
) -> Result<Vec<(String, TypeHandle)>> {
    let mut out = Vec::with_capacity(params.len());
    for (name, type_name) in params {
        let handle = resolve_type_name(type_name, ast, ctx, current_package, current_version)?;
        out.push((name.clone(), handle));
    }
    Ok(out)
}

fn bind_const(decl: &ConstDecl, ast: &mut Ast, ctx: &mut dyn BindContext) -> Result<()> {
    ctx.add_constant(ast.root(), decl.name.clone(), decl.value.value())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_file;
    use crate::scope::ScopeArena;

    struct TestContext {
        type_arena: TypeArena,
        scope_arena: ScopeArena,
    }

    impl BindContext for TestContext {
        fn alloc_type(&mut self, ty: Type) -> TypeHandle {
            self.type_arena.alloc(ty)
        }
        fn arena(&self) -> &TypeArena {
            &self.type_arena
        }
        fn add_scoped_type(&mut self, scope: ScopeHandle, name: String, handle: TypeHandle) -> Result<()> {
            self.scope_arena.get_mut(scope).add_type(name, handle)
        }
        fn add_constant(&mut self, scope: ScopeHandle, name: String, value: ConstValue) -> Result<()> {
            self.scope_arena.get_mut(scope).add_constant(name, value)
        }
        fn lookup_local(&self, scope: ScopeHandle, name: &str) -> Option<TypeHandle> {
            self.scope_arena.lookup(scope, name)
        }
        fn resolve_external(&mut self, _current_package: &str, _current_version: (u32, u32), name: &str) -> Result<TypeHandle> {
            Err(HidlError::UnresolvedReference {
                name: name.to_string(),
                context: "test".to_string(),
            })
        }
        fn super_interface_last_id(&mut self, _p: &str, _v: (u32, u32), name: &str) -> Result<(TypeHandle, u32)> {
            Err(HidlError::UnresolvedReference {
                name: name.to_string(),
                context: "test".to_string(),
            })
        }
    }

    fn new_ctx() -> (TestContext, Ast) {
        let mut scope_arena = ScopeArena::new();
        let ast = Ast::new(&mut scope_arena);
        (
            TestContext {
                type_arena: TypeArena::new(),
                scope_arena,
            },
            ast,
        )
    }

    #[test]
    fn binds_struct_with_array_field() {
        let decls = parse_file("struct S { uint8_t a[4]; uint32_t b; };", "x.hal").unwrap();
        let (mut ctx, mut ast) = new_ctx();
        bind(&decls, &mut ast, &mut ctx, "foo.bar", (1, 0)).unwrap();
        let handle = ctx.lookup_local(ast.root(), "S").unwrap();
        let (align, size) = ctx.type_arena.get(handle).alignment_and_size(&ctx.type_arena).unwrap();
        assert_eq!(align, 4);
        assert_eq!(size, 12);
    }

    #[test]
    fn binds_enum_with_autofill() {
        let decls = parse_file("enum E : uint8_t { RED, GREEN = 5, BLUE };", "x.hal").unwrap();
        let (mut ctx, mut ast) = new_ctx();
        bind(&decls, &mut ast, &mut ctx, "foo.bar", (1, 0)).unwrap();
        let handle = ctx.lookup_local(ast.root(), "E").unwrap();
        match ctx.type_arena.get(handle) {
            Type::Enum(e) => assert_eq!(e.values[2].value.unsigned, 6),
            _ => panic!("expected enum"),
        }
    }

    #[test]
    fn binds_interface_methods_with_monotonic_ids() {
        let decls = parse_file(
            "interface IFoo { foo() generates (uint32_t x); bar(uint32_t y); };",
            "x.hal",
        )
        .unwrap();
        let (mut ctx, mut ast) = new_ctx();
        bind(&decls, &mut ast, &mut ctx, "foo.bar", (1, 0)).unwrap();
        let handle = ctx.lookup_local(ast.root(), "IFoo").unwrap();
        match ctx.type_arena.get(handle) {
            Type::Interface(i) => {
                assert_eq!(i.methods[0].serial_id, 0);
                assert_eq!(i.methods[1].serial_id, 1);
            }
            _ => panic!("expected interface"),
        }
    }

    #[test]
    fn unresolved_field_type_errors() {
        let decls = parse_file("struct S { Unknown a; };", "x.hal").unwrap();
        let (mut ctx, mut ast) = new_ctx();
        assert!(bind(&decls, &mut ast, &mut ctx, "foo.bar", (1, 0)).is_err());
    }

    #[test]
    fn union_with_vector_member_is_rejected() {
        let decls = parse_file("union U { vec<uint8_t> a; };", "x.hal").unwrap();
        let (mut ctx, mut ast) = new_ctx();
        assert!(bind(&decls, &mut ast, &mut ctx, "foo.bar", (1, 0)).is_err());
    }
}
