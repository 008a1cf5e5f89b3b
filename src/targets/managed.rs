//! Managed (JVM-style) source driver.
//!
//! Rejects any file containing a union or handle (directly or
//! transitively) with a `TargetCompatibility` error and emits nothing at
//! all for that file — scenario S6 requires no partial output, so
//! compatibility is checked for every declared type before any unit is
//! built, rather than failing mid-emission. One compilation unit is
//! produced per declared type plus one per interface (the original's
//! `AST::generateJavaTypes` "splits types.hal up into one java file per
//! declared type"), rather than a single file aggregating the whole
//! package.

use crate::error::{HidlError, Result};
use crate::fqname::FQName;
use crate::scope::{Ast, ScopeArena};
use crate::sink::Sink;
use crate::types::{Type, TypeArena, TypeHandle};

/// One generated managed-source file: the bare type name (the caller
/// appends the language's file extension) and its full contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedUnit {
    pub name: String,
    pub content: String,
}

pub fn emit_units(ast: &Ast, arena: &TypeArena, scopes: &ScopeArena, fqname: &FQName) -> Result<Vec<ManagedUnit>> {
    let handles = scopes.get(ast.root()).types();
    for &handle in handles {
        check_compatible(arena, handle)?;
    }

    let package_line = format!("package {};", fqname.java_package());
    Ok(handles
        .iter()
        .filter_map(|&handle| emit_unit(&package_line, arena, handle))
        .collect())
}

fn emit_unit(package_line: &str, arena: &TypeArena, handle: TypeHandle) -> Option<ManagedUnit> {
    let name = match arena.get(handle) {
        Type::TypeDef(..) => return None,
        ty => type_name(ty),
    };
    let mut sink = Sink::new();
    sink.writeln(package_line);
    sink.writeln("");
    emit_type(&mut sink, arena, handle);
    Some(ManagedUnit {
        name,
        content: sink.into_string(),
    })
}

fn check_compatible(arena: &TypeArena, handle: TypeHandle) -> Result<()> {
    let ty = arena.get(handle);
    if !ty.is_java_compatible(arena) {
        let name = type_name(ty);
        return Err(HidlError::TargetCompatibility {
            type_name: name,
            reason: "managed target cannot represent unions or handles".to_string(),
        });
    }
    Ok(())
}

fn type_name(ty: &Type) -> String {
    match ty {
        Type::Compound(c) => c.name.clone(),
        Type::Enum(e) => e.name.clone(),
        Type::Interface(i) => i.name.clone(),
        Type::TypeDef(name, _) => name.clone(),
        Type::Handle => "handle".to_string(),
        other => format!("{other:?}"),
    }
}

fn emit_type(sink: &mut Sink, arena: &TypeArena, handle: TypeHandle) {
    match arena.get(handle) {
        Type::Enum(e) => {
            sink.writeln(&format!("public final class {} {{", e.name));
            sink.block(|s| {
                for value in &e.values {
                    s.writeln(&format!("public static final {} {} = {};", e.effective_scalar(arena).managed_name(), value.name, value.value.render_managed()));
                }
            });
            sink.writeln("}");
            sink.writeln("");
        }
        Type::Compound(c) => {
            sink.writeln(&format!("public final class {} {{", c.name));
            sink.block(|s| {
                for field in &c.fields {
                    let rendered = arena.get(field.type_handle).storage_mode(crate::types::StorageMode::Stack, arena);
                    s.writeln(&format!("public {rendered} {};", field.name));
                }
            });
            sink.writeln("}");
            sink.writeln("");
        }
        Type::Interface(iface) => {
            sink.writeln(&format!("public interface {} extends android.os.IInterface {{", iface.name));
            sink.block(|s| {
                for method in &iface.methods {
                    let inputs = method
                        .inputs
                        .iter()
                        .map(|(name, h)| format!("{} {}", arena.get(*h).storage_mode(crate::types::StorageMode::Argument, arena), name))
                        .collect::<Vec<_>>()
                        .join(", ");
                    s.writeln(&format!("void {}({});  // serial {}", method.name, inputs, method.serial_id));
                }
            });
            sink.writeln("}");
            sink.writeln("");
        }
        Type::TypeDef(name, inner) => {
            let rendered = arena.get(*inner).storage_mode(crate::types::StorageMode::Stack, arena);
            sink.writeln(&format!("// typedef {name} = {rendered}"));
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CompoundKind, EnumType, Field, ScalarKind};

    #[test]
    fn rejects_handle_with_no_partial_output() {
        let mut arena = TypeArena::new();
        let mut scopes = ScopeArena::new();
        let mut ast = Ast::new(&mut scopes);
        ast.set_package(&FQName::parse("foo.bar@1.0").unwrap()).unwrap();
        let h = arena.alloc(Type::Handle);
        ast.add_scoped_type(&mut scopes, "H", h).unwrap();
        let fq = FQName::parse("foo.bar@1.0::types").unwrap();
        let result = emit_units(&ast, &arena, &scopes, &fq);
        assert!(result.is_err());
    }

    #[test]
    fn accepts_plain_struct() {
        let mut arena = TypeArena::new();
        let mut scopes = ScopeArena::new();
        let mut ast = Ast::new(&mut scopes);
        let a = arena.alloc(Type::Scalar(ScalarKind::Int32));
        let s = Type::compound(
            "S",
            CompoundKind::Struct,
            vec![Field {
                name: "x".to_string(),
                type_handle: a,
            }],
            &arena,
        )
        .unwrap();
        let handle = arena.alloc(s);
        ast.add_scoped_type(&mut scopes, "S", handle).unwrap();
        let fq = FQName::parse("foo.bar@1.0::types").unwrap();
        let result = emit_units(&ast, &arena, &scopes, &fq).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "S");
        assert!(result[0].content.contains("public final class S"));
    }

    #[test]
    fn splits_one_file_per_declared_type() {
        let mut arena = TypeArena::new();
        let mut scopes = ScopeArena::new();
        let mut ast = Ast::new(&mut scopes);
        let a = arena.alloc(Type::Scalar(ScalarKind::Int32));
        let s = Type::compound(
            "S",
            CompoundKind::Struct,
            vec![Field {
                name: "x".to_string(),
                type_handle: a,
            }],
            &arena,
        )
        .unwrap();
        let s_handle = arena.alloc(s);
        ast.add_scoped_type(&mut scopes, "S", s_handle).unwrap();
        let e = EnumType::new("E", ScalarKind::Uint8).unwrap();
        let e_handle = arena.alloc(Type::Enum(e));
        ast.add_scoped_type(&mut scopes, "E", e_handle).unwrap();

        let fq = FQName::parse("foo.bar@1.0::types").unwrap();
        let units = emit_units(&ast, &arena, &scopes, &fq).unwrap();
        assert_eq!(units.len(), 2);
        assert!(units.iter().any(|u| u.name == "S" && !u.content.contains("class E")));
        assert!(units.iter().any(|u| u.name == "E" && !u.content.contains("class S")));
    }
}
