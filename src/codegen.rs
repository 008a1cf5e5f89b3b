//! Serialization synthesis: per-type reader/writer emission, and the
//! proxy/stub/passthrough dispatch scaffolding built on top of it.
//!
//! Grounded on the teacher's `codegen.rs`/`codegen/mod.rs` traversal shape —
//! match over the type tag, delegate to a per-case emission function,
//! write through a buffered sink — carried over from stack-effect codegen
//! to parcel codegen. A type's wire image is either written directly at
//! its use site (`Scalar`, `Enum`) or split into a fixed-size top-level
//! slot plus an out-of-line embedded payload (`Str`, `Vector`, `Handle`,
//! `Interface`, `Reference`, and any `Compound`/`Array` that contains one
//! of those transitively) — see [`crate::types::Type::needs_embedded_rw`].

use crate::scope::Method;
use crate::sink::Sink;
use crate::types::{CompoundKind, Type, TypeArena, TypeHandle};

/// How a failed read/write should be surfaced at its call site. Threaded
/// through every emission function rather than centralized, because the
/// right control-flow construct differs between a field-by-field struct
/// writer (`goto`), an argument loop (`break`), a top-level method
/// dispatch (`return`), and a best-effort descriptor dump (`ignore`).
#[derive(Debug, Clone)]
pub enum ErrorMode {
    GotoLabel(String),
    Break,
    Return(String),
    Ignore,
}

impl ErrorMode {
    /// Emit the control-flow statement guarding `check_expr` (a condition
    /// that is true on failure).
    pub fn emit_guard(&self, sink: &mut Sink, check_expr: &str) {
        match self {
            ErrorMode::GotoLabel(label) => {
                sink.writeln(&format!("if ({check_expr}) {{ goto {label}; }}"));
            }
            ErrorMode::Break => {
                sink.writeln(&format!("if ({check_expr}) {{ break; }}"));
            }
            ErrorMode::Return(expr) => {
                sink.writeln(&format!("if ({check_expr}) {{ return {expr}; }}"));
            }
            ErrorMode::Ignore => {}
        }
    }
}

/// Emit the top-level write for `handle` into `parcel`, reading the value
/// from `value_expr`. For pointer-bearing types this writes the
/// fixed-size descriptor only; the payload follows via
/// [`emit_write_embedded`] in the required second pass.
pub fn emit_write_top_level(sink: &mut Sink, arena: &TypeArena, handle: TypeHandle, parcel: &str, value_expr: &str, err: &ErrorMode) {
    let ty = arena.get(handle);
    match ty {
        Type::Scalar(_) | Type::Enum(_) => {
            sink.writeln(&format!("{parcel}.writeScalar({value_expr});"));
        }
        Type::Str => {
            sink.writeln(&format!("{parcel}.writeBuffer({value_expr}.data(), {value_expr}.size());"));
        }
        Type::Handle => {
            sink.writeln(&format!("{parcel}.writeEmbeddedHandle({value_expr});"));
        }
        Type::Vector(_) => {
            sink.writeln(&format!("{parcel}.writeBuffer({value_expr}.data(), {value_expr}.size() * sizeof({value_expr}[0]));"));
        }
        Type::Interface(_) => {
            sink.writeln(&format!("{parcel}.writeStrongBinder({value_expr} == nullptr ? nullptr : {value_expr}->asBinder());"));
        }
        Type::Reference(r) => {
            sink.writeln(&format!("// reference to {}", r.fqname));
            sink.writeln(&format!("{parcel}.writeStrongBinder({value_expr}->asBinder());"));
        }
        Type::Compound(c) if c.kind == CompoundKind::Union => {
            sink.writeln(&format!("{parcel}.write(&{value_expr}, sizeof({value_expr}));"));
        }
        Type::Compound(c) => {
            sink.writeln(&format!("// struct '{}': top-level slot, embedded payload follows", c.name));
            sink.writeln(&format!("{parcel}.writeStruct({value_expr});"));
        }
        Type::Array(_, _) => {
            sink.writeln(&format!("{parcel}.write(&{value_expr}, sizeof({value_expr}));"));
        }
        Type::TypeDef(_, inner) => emit_write_top_level(sink, arena, *inner, parcel, value_expr, err),
    }
    err.emit_guard(sink, &format!("{parcel}.status() != OK"));
}

/// Emit the out-of-line embedded payload for `handle`, if it needs one.
/// Structs recurse field-by-field at each field's byte offset (computed
/// from [`Type::alignment_and_size`]); arrays recurse per element;
/// vectors/strings/handles/interfaces/references write their own payload
/// directly. No-op for types that don't carry an embedded payload.
pub fn emit_write_embedded(sink: &mut Sink, arena: &TypeArena, handle: TypeHandle, parcel: &str, value_expr: &str, err: &ErrorMode) {
    let ty = arena.get(handle);
    if !ty.needs_embedded_rw(arena) {
        return;
    }
    match ty {
        Type::Str | Type::Vector(_) | Type::Handle | Type::Interface(_) | Type::Reference(_) => {
            // Already fully written by emit_write_top_level; nothing left
            // to resolve out-of-line for the leaf pointer-bearing kinds.
        }
        Type::Compound(c) => {
            let mut offset = 0u32;
            for field in &c.fields {
                let field_ty = arena.get(field.type_handle);
                let (align, size) = field_ty.alignment_and_size(arena).unwrap_or((1, 0));
                let pad = offset % align.max(1);
                if pad != 0 {
                    offset += align - pad;
                }
                if field_ty.needs_embedded_rw(arena) {
                    let field_expr = format!("{value_expr}.{}", field.name);
                    emit_write_embedded(sink, arena, field.type_handle, parcel, &field_expr, err);
                }
                offset += size;
            }
        }
        Type::Array(inner, dims) => {
            let count: u64 = dims.iter().product();
            sink.writeln(&format!("for (size_t _hidl_index = 0; _hidl_index < {count}; ++_hidl_index) {{"));
            sink.block(|s| {
                let elem_expr = format!("{value_expr}[_hidl_index]");
                emit_write_embedded(s, arena, *inner, parcel, &elem_expr, err);
            });
            sink.writeln("}");
        }
        Type::TypeDef(_, inner) => emit_write_embedded(sink, arena, *inner, parcel, value_expr, err),
        Type::Scalar(_) | Type::Enum(_) => {}
    }
}

/// Mirror of [`emit_write_top_level`] for reading.
pub fn emit_read_top_level(sink: &mut Sink, arena: &TypeArena, handle: TypeHandle, parcel: &str, out_expr: &str, err: &ErrorMode) {
    let ty = arena.get(handle);
    match ty {
        Type::Scalar(_) | Type::Enum(_) => {
            sink.writeln(&format!("{out_expr} = {parcel}.readScalar();"));
        }
        Type::Str => {
            sink.writeln(&format!("{out_expr} = {parcel}.readString();"));
        }
        Type::Handle => {
            sink.writeln(&format!("{out_expr} = {parcel}.readEmbeddedHandle();"));
        }
        Type::Vector(_) => {
            sink.writeln(&format!("{out_expr} = {parcel}.readBuffer();"));
        }
        Type::Interface(_) | Type::Reference(_) => {
            sink.writeln(&format!("{out_expr} = {parcel}.readStrongBinder();"));
        }
        Type::Compound(_) | Type::Array(_, _) => {
            sink.writeln(&format!("{parcel}.read(&{out_expr}, sizeof({out_expr}));"));
        }
        Type::TypeDef(_, inner) => emit_read_top_level(sink, arena, *inner, parcel, out_expr, err),
    }
    err.emit_guard(sink, &format!("{parcel}.status() != OK"));
}

/// Mirror of [`emit_write_embedded`] for reading.
pub fn emit_read_embedded(sink: &mut Sink, arena: &TypeArena, handle: TypeHandle, parcel: &str, out_expr: &str, err: &ErrorMode) {
    let ty = arena.get(handle);
    if !ty.needs_embedded_rw(arena) {
        return;
    }
    match ty {
        Type::Compound(c) => {
            for field in &c.fields {
                if arena.get(field.type_handle).needs_embedded_rw(arena) {
                    let field_expr = format!("{out_expr}.{}", field.name);
                    emit_read_embedded(sink, arena, field.type_handle, parcel, &field_expr, err);
                }
            }
        }
        Type::Array(inner, dims) => {
            let count: u64 = dims.iter().product();
            sink.writeln(&format!("for (size_t _hidl_index = 0; _hidl_index < {count}; ++_hidl_index) {{"));
            sink.block(|s| {
                let elem_expr = format!("{out_expr}[_hidl_index]");
                emit_read_embedded(s, arena, *inner, parcel, &elem_expr, err);
            });
            sink.writeln("}");
        }
        Type::TypeDef(_, inner) => emit_read_embedded(sink, arena, *inner, parcel, out_expr, err),
        _ => {}
    }
}

/// Default bound on the passthrough adapter's one-way call queue (spec
/// §4.7). Overflow past this is a transaction-failed status, not a block.
pub const PASSTHROUGH_QUEUE_CAPACITY: usize = 3000;

/// Emit the proxy-side body of one method: descriptor token, two-pass
/// argument write, the transact call keyed by the method's stable serial
/// ID, status check, and (for a two-way call) the two-pass output read.
/// Direct-return methods ([`Method::elidable_callback`]) read outputs
/// straight into the return value; methods with more than one output
/// dispatch through a caller-supplied continuation instead.
pub fn emit_proxy_method(sink: &mut Sink, arena: &TypeArena, method: &Method, descriptor: &str) {
    sink.writeln(&format!("// proxy: {}", method.name));
    sink.writeln("::android::hardware::Parcel _hidl_data;");
    sink.writeln("::android::hardware::Parcel _hidl_reply;");
    sink.writeln(&format!("_hidl_data.writeInterfaceToken(\"{descriptor}\");"));
    for (name, handle) in &method.inputs {
        emit_write_top_level(sink, arena, *handle, "_hidl_data", name, &ErrorMode::Return("::android::hardware::Status::fromStatusT(_hidl_data.status())".to_string()));
    }
    for (name, handle) in &method.inputs {
        emit_write_embedded(sink, arena, *handle, "_hidl_data", name, &ErrorMode::Return("::android::hardware::Status::fromStatusT(_hidl_data.status())".to_string()));
    }
    let call = if method.one_way { "ONEWAY" } else { "0" };
    sink.writeln(&format!(
        "_hidl_status_t _hidl_transact_err = remote()->transact({}, _hidl_data, &_hidl_reply, {call});",
        method.serial_id
    ));
    sink.writeln("if (_hidl_transact_err != OK) { return ::android::hardware::Status::fromStatusT(_hidl_transact_err); }");
    if method.one_way {
        return;
    }
    sink.writeln("int32_t _hidl_status_code = _hidl_reply.readInt32();");
    sink.writeln("if (_hidl_status_code != OK) { return ::android::hardware::Status::fromStatusT(_hidl_status_code); }");
    if method.elidable_callback(arena) {
        for (name, handle) in &method.outputs {
            emit_read_top_level(sink, arena, *handle, "_hidl_reply", &format!("_hidl_out_{name}"), &ErrorMode::Return("::android::hardware::Status::fromStatusT(_hidl_reply.status())".to_string()));
        }
        for (name, handle) in &method.outputs {
            emit_read_embedded(sink, arena, *handle, "_hidl_reply", &format!("_hidl_out_{name}"), &ErrorMode::Ignore);
        }
    } else {
        sink.writeln("// multiple outputs: dispatched through the caller's callback, invoked at most once");
        for (name, handle) in &method.outputs {
            emit_read_top_level(sink, arena, *handle, "_hidl_reply", &format!("_hidl_out_{name}"), &ErrorMode::Ignore);
        }
        sink.writeln("_hidl_cb(_hidl_out_results...);");
    }
}

/// Emit the passthrough-side body of one method: call straight through to
/// the wrapped implementation. A one-way call is handed to the bounded
/// `addOnewayTask` queue ([`PASSTHROUGH_QUEUE_CAPACITY`]) instead of
/// running inline; a multi-output call dispatches through the caller's
/// callback exactly as [`emit_proxy_method`]/[`emit_stub_method`] do.
pub fn emit_passthrough_method(sink: &mut Sink, arena: &TypeArena, method: &Method) {
    sink.writeln(&format!("// passthrough: {}", method.name));
    if method.one_way {
        sink.writeln(&format!("return addOnewayTask([this] {{ mImpl->{}(...); }});", method.name));
        return;
    }
    if method.elidable_callback(arena) {
        sink.writeln(&format!("return mImpl->{}(...);", method.name));
    } else {
        sink.writeln("// multiple outputs: dispatched through the caller's callback, invoked at most once");
        sink.writeln(&format!("return mImpl->{}(..., [&](...) {{ _hidl_cb(...); }});", method.name));
    }
}

/// Emit the stub-side body of one method: verify the descriptor token,
/// two-pass read of the arguments, invoke the implementation, and (for a
/// multi-output method) guard the continuation so it fires exactly once.
pub fn emit_stub_method(sink: &mut Sink, arena: &TypeArena, method: &Method, descriptor: &str) {
    sink.writeln(&format!("// stub: {}", method.name));
    sink.writeln("if (!_hidl_data.enforceInterface(\"%s\"))");
    sink.writeln(&format!("  {{ return ::android::hardware::Status::fromExceptionCode(::android::hardware::Status::EX_ILLEGAL_STATE, \"{descriptor}\"); }}"));
    for (name, handle) in &method.inputs {
        emit_read_top_level(sink, arena, *handle, "_hidl_data", name, &ErrorMode::Return("::android::hardware::Status::fromStatusT(_hidl_data.status())".to_string()));
    }
    for (name, handle) in &method.inputs {
        emit_read_embedded(sink, arena, *handle, "_hidl_data", name, &ErrorMode::Ignore);
    }
    if !method.elidable_callback(arena) {
        sink.writeln("bool _hidl_callback_fired = false;");
    }
    sink.writeln(&format!("{}(...);", method.name));
}
