//! Text verification descriptor driver.
//!
//! A plain, whitespace-stable listing of every declared type and its
//! members, meant to be diffed across compiler versions to catch an
//! accidental wire-format change. Formatting convention (one field per
//! line, two-space indent) is Open Question (c), decided in DESIGN.md;
//! [`Sink`]'s existing indent mechanics are used directly rather than
//! inventing separate formatting rules for this one target.

use crate::scope::{Ast, ScopeArena};
use crate::sink::Sink;
use crate::types::{CompoundKind, Type, TypeArena, TypeHandle};

pub fn emit(ast: &Ast, arena: &TypeArena, scopes: &ScopeArena) -> String {
    let mut sink = Sink::new();
    for &handle in scopes.get(ast.root()).types() {
        emit_type(&mut sink, arena, handle);
    }
    sink.into_string()
}

fn emit_type(sink: &mut Sink, arena: &TypeArena, handle: TypeHandle) {
    match arena.get(handle) {
        Type::Enum(e) => {
            sink.writeln(&format!("enum {} : {} {{", e.name, e.effective_scalar(arena)));
            sink.block(|s| {
                for value in &e.values {
                    s.writeln(&format!("{} = {},", value.name, value.value.render_native()));
                }
            });
            sink.writeln("};");
        }
        Type::Compound(c) => {
            let keyword = if c.kind == CompoundKind::Union { "union" } else { "struct" };
            let (align, size) = arena.get(handle).alignment_and_size(arena).unwrap_or((0, 0));
            sink.writeln(&format!("{keyword} {} {{  // align={align} size={size}", c.name));
            sink.block(|s| {
                for field in &c.fields {
                    let rendered = arena.get(field.type_handle).storage_mode(crate::types::StorageMode::Stack, arena);
                    s.writeln(&format!("{rendered} {};", field.name));
                }
            });
            sink.writeln("};");
        }
        Type::Interface(iface) => {
            sink.writeln(&format!("interface {} {{", iface.name));
            sink.block(|s| {
                for method in &iface.methods {
                    let dir = if method.one_way { "oneway " } else { "" };
                    s.writeln(&format!("{dir}{}: #{}", method.name, method.serial_id));
                }
            });
            sink.writeln("};");
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScalarKind;

    #[test]
    fn descriptor_indents_fields_two_spaces() {
        let mut arena = TypeArena::new();
        let mut scopes = ScopeArena::new();
        let mut ast = Ast::new(&mut scopes);
        let storage = ScalarKind::Uint8;
        let mut e = crate::types::EnumType::new("Color", storage).unwrap();
        e.push_value("RED", None, &arena).unwrap();
        let handle = arena.alloc(Type::Enum(e));
        ast.add_scoped_type(&mut scopes, "Color", handle).unwrap();
        let out = emit(&ast, &arena, &scopes);
        assert!(out.contains("  RED = 0x0u8,"));
    }
}
