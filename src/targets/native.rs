//! Native (C-family) header and source drivers.
//!
//! Grounded on the original `AST::generateCpp*` family for file shape (one
//! header declaring types plus a `BnFoo`/`BpFoo`/`BsFoo` triple, one source
//! defining their bodies) and on [`crate::codegen`] for the reader/writer
//! and proxy/stub/passthrough method bodies themselves.

use crate::codegen::{emit_passthrough_method, emit_proxy_method, emit_stub_method, PASSTHROUGH_QUEUE_CAPACITY};
use crate::error::Result;
use crate::fqname::FQName;
use crate::scope::{Ast, ScopeArena};
use crate::sink::Sink;
use crate::targets::header_guard;
use crate::types::{CompoundKind, Type, TypeArena};

/// `<basename>.h`: the include guard, namespace-opened declarations for
/// every struct/enum/interface in the file's root scope, then the
/// namespace close.
pub fn emit_header(ast: &Ast, arena: &TypeArena, scopes: &ScopeArena, fqname: &FQName, basename: &str) -> Result<String> {
    let mut sink = Sink::new();
    let guard = header_guard(fqname, basename);
    sink.writeln(&format!("#ifndef {guard}"));
    sink.writeln(&format!("#define {guard}"));
    sink.writeln("");
    sink.writeln("#include <hidl/HidlSupport.h>");
    sink.writeln("#include <utils/Errors.h>");
    let types = scopes.get(ast.root()).types();
    if types.iter().any(|&h| matches!(arena.get(h), Type::Interface(_))) {
        sink.writeln("#include <hidl/HidlInstrumentor.h>");
    }
    if types
        .iter()
        .any(|&h| matches!(arena.get(h), Type::Interface(i) if i.methods.iter().any(|m| m.one_way)))
    {
        sink.writeln("#include <hidl/TaskRunner.h>");
    }
    sink.writeln("");
    for component in fqname.package_and_version_components() {
        sink.writeln(&format!("namespace {component} {{"));
    }
    sink.writeln("");

    for &handle in scopes.get(ast.root()).types() {
        emit_type_declaration(&mut sink, arena, handle);
    }

    for component in fqname.package_and_version_components().iter().rev() {
        sink.writeln(&format!("}}  // namespace {component}"));
    }
    sink.writeln("");
    sink.writeln(&format!("#endif  // {guard}"));
    Ok(sink.into_string())
}

fn emit_type_declaration(sink: &mut Sink, arena: &TypeArena, handle: crate::types::TypeHandle) {
    match arena.get(handle) {
        Type::Enum(e) => {
            sink.writeln(&format!("enum class {} : {} {{", e.name, e.effective_scalar(arena).native_name()));
            sink.block(|s| {
                for value in &e.values {
                    s.writeln(&format!("{} = {},", value.name, value.value.render_native()));
                }
            });
            sink.writeln("};");
            sink.writeln("");
        }
        Type::Compound(c) => {
            let keyword = if c.kind == CompoundKind::Union { "union" } else { "struct" };
            sink.writeln(&format!("{keyword} {} {{", c.name));
            sink.block(|s| {
                for field in &c.fields {
                    let rendered = arena.get(field.type_handle).storage_mode(crate::types::StorageMode::Stack, arena);
                    s.writeln(&format!("{rendered} {};", field.name));
                }
            });
            sink.writeln("};");
            sink.writeln("");
        }
        Type::Interface(iface) => {
            let super_name = iface
                .super_interface
                .map(|h| match arena.get(h) {
                    Type::Interface(s) => s.name.clone(),
                    _ => "::android::hidl::base::V1_0::IBase".to_string(),
                })
                .unwrap_or_else(|| "::android::hidl::base::V1_0::IBase".to_string());
            sink.writeln(&format!("struct {} : public {} {{", iface.name, super_name));
            sink.block(|s| {
                for method in &iface.methods {
                    let inputs = method
                        .inputs
                        .iter()
                        .map(|(name, h)| format!("{} {}", arena.get(*h).storage_mode(crate::types::StorageMode::Argument, arena), name))
                        .collect::<Vec<_>>()
                        .join(", ");
                    s.writeln(&format!(
                        "virtual ::android::hardware::Return<void> {}({}) = 0;  // serial {}",
                        method.name, inputs, method.serial_id
                    ));
                }
            });
            sink.writeln("};");
            sink.writeln("");
            sink.writeln(&format!("struct Bn{0} : public ::android::hardware::BHwBinder, public {0} {{", iface.name));
            sink.writeln("  ::android::status_t onTransact(uint32_t code, const ::android::hardware::Parcel& data, ::android::hardware::Parcel* reply, uint32_t flags) override;");
            sink.writeln("};");
            sink.writeln("");
            sink.writeln(&format!("struct Bp{0} : public ::android::hardware::BpInterface<{0}> {{", iface.name));
            sink.writeln(&format!("  explicit Bp{}(const ::android::sp<::android::hardware::IBinder>& impl);", iface.name));
            sink.writeln("};");
            sink.writeln("");

            let has_oneway = iface.methods.iter().any(|m| m.one_way);
            sink.writeln(&format!("struct Bs{0} : public {0}, public ::android::hardware::HidlInstrumentor {{", iface.name));
            sink.writeln(&format!("  explicit Bs{0}(const ::android::sp<{0}>& impl);", iface.name));
            sink.writeln(&format!("  const ::android::sp<{}> mImpl;", iface.name));
            if has_oneway {
                sink.writeln("  ::android::hardware::TaskRunner mOnewayQueue;");
                sink.writeln("  ::android::hardware::Return<void> addOnewayTask(std::function<void(void)>);");
            }
            sink.writeln("};");
            sink.writeln("");
        }
        Type::TypeDef(name, inner) => {
            let rendered = arena.get(*inner).storage_mode(crate::types::StorageMode::Stack, arena);
            sink.writeln(&format!("using {name} = {rendered};"));
            sink.writeln("");
        }
        _ => {}
    }
}

/// `<basename>.cpp`: the serialization bodies and proxy/stub dispatch for
/// every interface declared in the file's root scope.
pub fn emit_source(ast: &Ast, arena: &TypeArena, scopes: &ScopeArena, basename: &str) -> Result<String> {
    let mut sink = Sink::new();
    sink.writeln(&format!("#include \"{basename}.h\""));
    sink.writeln("");
    for &handle in scopes.get(ast.root()).types() {
        if let Type::Interface(iface) = arena.get(handle) {
            let descriptor = &iface.name;
            sink.writeln(&format!("::android::status_t Bn{0}::onTransact(uint32_t code, const ::android::hardware::Parcel& _hidl_data, ::android::hardware::Parcel* _hidl_reply, uint32_t flags) {{", iface.name));
            sink.block(|s| {
                s.writeln("switch (code) {");
                s.block(|s| {
                    for method in &iface.methods {
                        s.writeln(&format!("case {}: {{", method.serial_id));
                        s.block(|s| emit_stub_method(s, arena, method, descriptor));
                        s.writeln("break; }");
                    }
                    s.writeln("default: return ::android::UNKNOWN_TRANSACTION;");
                });
                s.writeln("}");
                s.writeln("return ::android::OK;");
            });
            sink.writeln("}");
            sink.writeln("");

            sink.writeln(&format!(
                "Bp{0}::Bp{0}(const ::android::sp<::android::hardware::IBinder>& impl) : BpInterface<{0}>(impl) {{}}",
                iface.name
            ));
            sink.writeln("");
            for method in &iface.methods {
                sink.writeln(&format!("::android::hardware::Return<void> Bp{}::{}(...) {{", iface.name, method.name));
                sink.block(|s| emit_proxy_method(s, arena, method, descriptor));
                sink.writeln("}");
                sink.writeln("");
            }

            let has_oneway = iface.methods.iter().any(|m| m.one_way);
            sink.writeln(&format!(
                "Bs{0}::Bs{0}(const ::android::sp<{0}>& impl) : ::android::hardware::HidlInstrumentor(\"{1}\"), mImpl(impl) {{",
                iface.name, descriptor
            ));
            if has_oneway {
                sink.block(|s| s.writeln(&format!("mOnewayQueue.setLimit({PASSTHROUGH_QUEUE_CAPACITY});")));
            }
            sink.writeln("}");
            sink.writeln("");
            if has_oneway {
                sink.writeln(&format!(
                    "::android::hardware::Return<void> Bs{}::addOnewayTask(std::function<void(void)> fun) {{",
                    iface.name
                ));
                sink.block(|s| {
                    s.writeln("if (!mOnewayQueue.push(fun)) {");
                    s.block(|s| {
                        s.writeln("return ::android::hardware::Status::fromExceptionCode(::android::hardware::Status::EX_TRANSACTION_FAILED);");
                    });
                    s.writeln("}");
                    s.writeln("return ::android::hardware::Status();");
                });
                sink.writeln("}");
                sink.writeln("");
            }
            for method in &iface.methods {
                sink.writeln(&format!("::android::hardware::Return<void> Bs{}::{}(...) {{", iface.name, method.name));
                sink.block(|s| emit_passthrough_method(s, arena, method));
                sink.writeln("}");
                sink.writeln("");
            }
        }
    }
    Ok(sink.into_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::Method;
    use crate::types::InterfaceType;

    fn oneway_interface(arena: &mut TypeArena, scopes: &mut ScopeArena, ast: &mut Ast) -> &'static str {
        let iface = InterfaceType {
            name: "IThing".to_string(),
            super_interface: None,
            methods: vec![Method {
                name: "fireAndForget".to_string(),
                inputs: vec![],
                outputs: vec![],
                one_way: true,
                annotations: vec![],
                serial_id: 0,
            }],
        };
        let handle = arena.alloc(Type::Interface(iface));
        ast.add_scoped_type(scopes, "IThing", handle).unwrap();
        "IThing"
    }

    #[test]
    fn passthrough_adapter_carries_oneway_queue() {
        let mut arena = TypeArena::new();
        let mut scopes = ScopeArena::new();
        let mut ast = Ast::new(&mut scopes);
        oneway_interface(&mut arena, &mut scopes, &mut ast);
        let fq = FQName::parse("foo.bar@1.0::IThing").unwrap();

        let header = emit_header(&ast, &arena, &scopes, &fq, "IThing").unwrap();
        assert!(header.contains("struct BsIThing"));
        assert!(header.contains("TaskRunner mOnewayQueue"));
        assert!(header.contains("#include <hidl/TaskRunner.h>"));

        let source = emit_source(&ast, &arena, &scopes, "IThing").unwrap();
        assert!(source.contains(&format!("mOnewayQueue.setLimit({PASSTHROUGH_QUEUE_CAPACITY});")));
        assert!(source.contains("BsIThing::addOnewayTask"));
        assert!(source.contains("addOnewayTask([this] { mImpl->fireAndForget(...); });"));
    }
}
