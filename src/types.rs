//! The type graph: every declarable type variant plus the capability set
//! each one exposes (storage rendering, reader/writer emission hooks,
//! alignment/size, and the various `is-*`/`needs-*` predicates).
//!
//! Grounded on the teacher's `types.rs` tagged-enum-plus-capability-methods
//! shape (`Type`, `StackType`, `Effect` there), adapted from a row-polymorphic
//! stack calculus to a struct/union/interface type system. Per the "avoid
//! subtype polymorphism" design note, this stays one `enum` with inherent
//! methods rather than a trait object hierarchy.

use crate::constant::{ConstValue, IntKind};
use crate::error::{HidlError, Result};
use std::collections::HashSet;
use std::fmt;

/// Stable reference into a [`TypeArena`]. Equality of `Type`s is by
/// identity once inserted, which this handle gives for free (two handles
/// are equal iff they name the same arena slot).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeHandle(usize);

/// Owns every `Type` ever constructed for one Coordinator session. Types
/// never move once allocated, so handles stay valid for the arena's whole
/// lifetime (which ends at Coordinator teardown, per the single-lifetime
/// ownership model).
#[derive(Debug, Default)]
pub struct TypeArena {
    types: Vec<Type>,
}

impl TypeArena {
    pub fn new() -> Self {
        TypeArena::default()
    }

    pub fn alloc(&mut self, ty: Type) -> TypeHandle {
        self.types.push(ty);
        TypeHandle(self.types.len() - 1)
    }

    pub fn get(&self, handle: TypeHandle) -> &Type {
        &self.types[handle.0]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Float,
    Double,
}

impl ScalarKind {
    pub fn alignment_and_size(self) -> (u32, u32) {
        match self {
            ScalarKind::Bool | ScalarKind::Int8 | ScalarKind::Uint8 => (1, 1),
            ScalarKind::Int16 | ScalarKind::Uint16 => (2, 2),
            ScalarKind::Int32 | ScalarKind::Uint32 | ScalarKind::Float => (4, 4),
            ScalarKind::Int64 | ScalarKind::Uint64 | ScalarKind::Double => (8, 8),
        }
    }

    pub fn is_integer(self) -> bool {
        !matches!(self, ScalarKind::Float | ScalarKind::Double)
    }

    /// The [`IntKind`] this scalar corresponds to, for enum storage and
    /// constant-expression casting. `None` for the two float kinds.
    pub fn int_kind(self) -> Option<IntKind> {
        match self {
            ScalarKind::Int8 => Some(IntKind::I8),
            ScalarKind::Uint8 | ScalarKind::Bool => Some(IntKind::U8),
            ScalarKind::Int16 => Some(IntKind::I16),
            ScalarKind::Uint16 => Some(IntKind::U16),
            ScalarKind::Int32 => Some(IntKind::I32),
            ScalarKind::Uint32 => Some(IntKind::U32),
            ScalarKind::Int64 => Some(IntKind::I64),
            ScalarKind::Uint64 => Some(IntKind::U64),
            ScalarKind::Float | ScalarKind::Double => None,
        }
    }

    pub fn native_name(self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::Int8 => "int8_t",
            ScalarKind::Uint8 => "uint8_t",
            ScalarKind::Int16 => "int16_t",
            ScalarKind::Uint16 => "uint16_t",
            ScalarKind::Int32 => "int32_t",
            ScalarKind::Uint32 => "uint32_t",
            ScalarKind::Int64 => "int64_t",
            ScalarKind::Uint64 => "uint64_t",
            ScalarKind::Float => "float",
            ScalarKind::Double => "double",
        }
    }

    pub fn managed_name(self) -> &'static str {
        match self {
            ScalarKind::Bool => "boolean",
            ScalarKind::Int8 | ScalarKind::Uint8 => "byte",
            ScalarKind::Int16 | ScalarKind::Uint16 => "short",
            ScalarKind::Int32 | ScalarKind::Uint32 => "int",
            ScalarKind::Int64 | ScalarKind::Uint64 => "long",
            ScalarKind::Float => "float",
            ScalarKind::Double => "double",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    Stack,
    Argument,
    Result,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub name: String,
    pub value: ConstValue,
}

/// An enum's storage type: either a builtin scalar, or another enum whose
/// values this one continues (`enum Foo : ParentEnum { ... }`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumStorage {
    Scalar(ScalarKind),
    Enum(TypeHandle),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    pub name: String,
    pub storage: EnumStorage,
    pub values: Vec<EnumValue>,
}

impl EnumType {
    /// `storage` must resolve to an integer scalar (spec §7 "enum storage
    /// is non-integral" violation).
    pub fn new(name: impl Into<String>, storage: ScalarKind) -> Result<EnumType> {
        if !storage.is_integer() {
            return Err(HidlError::TypeConstraint(format!(
                "enum '{}' storage must be an integer scalar",
                name.into()
            )));
        }
        Ok(EnumType {
            name: name.into(),
            storage: EnumStorage::Scalar(storage),
            values: Vec::new(),
        })
    }

    /// `storage type` names another enum: this one's values continue the
    /// parent's sequence, and `parent`'s own storage chain (which may
    /// itself be inherited) is what ultimately fixes the integer width.
    pub fn new_inherited(name: impl Into<String>, parent: TypeHandle, arena: &TypeArena) -> Result<EnumType> {
        let name = name.into();
        match arena.get(parent) {
            Type::Enum(_) => Ok(EnumType {
                name,
                storage: EnumStorage::Enum(parent),
                values: Vec::new(),
            }),
            _ => Err(HidlError::TypeConstraint(format!(
                "enum '{name}' storage type is not a scalar or enum"
            ))),
        }
    }

    /// Walk an inherited-storage chain down to the concrete scalar kind
    /// every value is ultimately cast against.
    pub fn effective_scalar(&self, arena: &TypeArena) -> ScalarKind {
        match self.storage {
            EnumStorage::Scalar(s) => s,
            EnumStorage::Enum(parent) => match arena.get(parent) {
                Type::Enum(p) => p.effective_scalar(arena),
                _ => unreachable!("EnumStorage::Enum always points at a Type::Enum"),
            },
        }
    }

    /// The last value in this enum's parent chain, for auto-filling the
    /// first value of a child enum that declares none of its own.
    fn parent_last_value(&self, arena: &TypeArena) -> Option<ConstValue> {
        match self.storage {
            EnumStorage::Scalar(_) => None,
            EnumStorage::Enum(parent) => match arena.get(parent) {
                Type::Enum(p) => p.values.last().map(|v| v.value).or_else(|| p.parent_last_value(arena)),
                _ => None,
            },
        }
    }

    /// Append a value, auto-filling from the previous value's `add_one`
    /// when `explicit` is `None` — continuing from this enum's own last
    /// value, or failing that its parent's, or failing that zero.
    pub fn push_value(&mut self, name: impl Into<String>, explicit: Option<ConstValue>, arena: &TypeArena) -> Result<()> {
        let kind = self.effective_scalar(arena).int_kind().unwrap();
        let value = match explicit {
            Some(v) => v.cast_to(kind),
            None => match self.values.last() {
                Some(prev) => prev.value.add_one(),
                None => match self.parent_last_value(arena) {
                    Some(parent_last) => parent_last.add_one(),
                    None => ConstValue::new(0, kind),
                },
            },
        };
        let in_range = if kind.is_signed() {
            value.signed >= kind.min_value() && value.signed <= kind.max_value()
        } else {
            value.unsigned <= kind.max_value() as u64
        };
        if !in_range {
            return Err(HidlError::TypeConstraint(format!(
                "enum '{}' value '{}' exceeds storage range",
                self.name,
                name.into()
            )));
        }
        self.values.push(EnumValue {
            name: name.into(),
            value,
        });
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompoundKind {
    Struct,
    Union,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub type_handle: TypeHandle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundType {
    pub name: String,
    pub kind: CompoundKind,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceType {
    pub name: String,
    pub super_interface: Option<TypeHandle>,
    pub methods: Vec<crate::scope::Method>,
}

impl InterfaceType {
    pub fn last_serial_id(&self) -> u32 {
        self.methods.last().map(|m| m.serial_id).unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceType {
    pub fqname: String,
    pub resolved: TypeHandle,
}

/// Every declarable type variant. A tagged enum rather than a trait object
/// hierarchy, per the "deep hierarchies are not needed" design note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Scalar(ScalarKind),
    Str,
    Handle,
    Enum(EnumType),
    Compound(CompoundType),
    Vector(TypeHandle),
    Array(TypeHandle, Vec<u64>),
    TypeDef(String, TypeHandle),
    Interface(InterfaceType),
    Reference(ReferenceType),
}

impl Type {
    /// Build a struct or union, validating the shape invariants that apply
    /// at construction time: unions forbid pointer-bearing members, and
    /// neither struct nor union may contain an interface member directly.
    pub fn compound(name: impl Into<String>, kind: CompoundKind, fields: Vec<Field>, arena: &TypeArena) -> Result<Type> {
        let name = name.into();
        for field in &fields {
            let field_ty = arena.get(field.type_handle);
            if field_ty.is_interface(arena) {
                return Err(HidlError::TypeConstraint(format!(
                    "'{}' member '{}' may not be an interface type",
                    name, field.name
                )));
            }
        }
        if kind == CompoundKind::Union {
            for field in &fields {
                if arena.get(field.type_handle).needs_embedded_rw(arena) {
                    return Err(HidlError::TypeConstraint(format!(
                        "union '{}' member '{}' is pointer-bearing; unions forbid embedded members",
                        name, field.name
                    )));
                }
            }
        }
        Ok(Type::Compound(CompoundType { name, kind, fields }))
    }

    /// Build a fixed-size array; every dimension must be a positive
    /// integer (spec §7 "array dimension is not a positive integer
    /// constant").
    pub fn array(element: TypeHandle, dims: Vec<u64>) -> Result<Type> {
        if dims.is_empty() || dims.iter().any(|&d| d == 0) {
            return Err(HidlError::TypeConstraint(
                "array dimensions must be positive integers".to_string(),
            ));
        }
        Ok(Type::Array(element, dims))
    }

    pub fn is_binder(&self) -> bool {
        matches!(self, Type::Interface(_) | Type::Handle)
    }

    pub fn is_interface(&self, _arena: &TypeArena) -> bool {
        matches!(self, Type::Interface(_))
    }

    pub fn is_scope(&self) -> bool {
        matches!(self, Type::Compound(_) | Type::Interface(_))
    }

    pub fn is_enum(&self) -> bool {
        matches!(self, Type::Enum(_))
    }

    pub fn is_type_def(&self) -> bool {
        matches!(self, Type::TypeDef(..))
    }

    /// `false` iff this type contains a union or handle transitively, or
    /// is an interface whose inheritance chain is not itself
    /// Java-compatible.
    pub fn is_java_compatible(&self, arena: &TypeArena) -> bool {
        self.is_java_compatible_visiting(arena, &mut HashSet::new())
    }

    fn is_java_compatible_visiting(&self, arena: &TypeArena, seen: &mut HashSet<usize>) -> bool {
        match self {
            Type::Handle => false,
            Type::Compound(c) if c.kind == CompoundKind::Union => false,
            Type::Compound(c) => c
                .fields
                .iter()
                .all(|f| visit(arena.get(f.type_handle), f.type_handle, arena, seen)),
            Type::Vector(inner) | Type::TypeDef(_, inner) => visit(arena.get(*inner), *inner, arena, seen),
            Type::Array(inner, _) => visit(arena.get(*inner), *inner, arena, seen),
            Type::Interface(iface) => match iface.super_interface {
                Some(s) => visit(arena.get(s), s, arena, seen),
                None => true,
            },
            Type::Reference(r) => visit(arena.get(r.resolved), r.resolved, arena, seen),
            Type::Scalar(_) | Type::Str | Type::Enum(_) => true,
        }
    }

    /// `true` iff the value contains at least one pointer-bearing field
    /// (strings, vectors, handles, references, interfaces, or
    /// transitively such).
    pub fn needs_embedded_rw(&self, arena: &TypeArena) -> bool {
        self.needs_embedded_rw_visiting(arena, &mut HashSet::new())
    }

    fn needs_embedded_rw_visiting(&self, arena: &TypeArena, seen: &mut HashSet<usize>) -> bool {
        match self {
            Type::Str | Type::Handle | Type::Interface(_) => true,
            Type::Vector(_) => true,
            Type::Reference(_) => true,
            Type::Scalar(_) | Type::Enum(_) => false,
            Type::Array(inner, _) => visit_rw(arena.get(*inner), *inner, arena, seen),
            Type::TypeDef(_, inner) => visit_rw(arena.get(*inner), *inner, arena, seen),
            Type::Compound(c) => c
                .fields
                .iter()
                .any(|f| visit_rw(arena.get(f.type_handle), f.type_handle, arena, seen)),
        }
    }

    /// `true` iff this value's own serialized image carries a reference
    /// that must be patched up after its containing buffer is written —
    /// the direct pointer-bearing kinds themselves, as opposed to
    /// [`Type::needs_embedded_rw`] which also answers `true` for a
    /// compound/array that merely *contains* one.
    pub fn needs_resolve_references(&self) -> bool {
        matches!(self, Type::Str | Type::Handle | Type::Interface(_) | Type::Vector(_) | Type::Reference(_))
    }

    /// Transitively unwrap `TypeDef`/`Enum` to reach a `Scalar`, or `None`.
    pub fn resolve_to_scalar<'a>(&'a self, arena: &'a TypeArena) -> Option<ScalarKind> {
        match self {
            Type::Scalar(k) => Some(*k),
            Type::Enum(e) => Some(e.effective_scalar(arena)),
            Type::TypeDef(_, inner) => arena.get(*inner).resolve_to_scalar(arena),
            Type::Reference(r) => arena.get(r.resolved).resolve_to_scalar(arena),
            _ => None,
        }
    }

    /// `(align, size)`, with size padded up to alignment. Structs lay out
    /// fields in declaration order with C-style alignment; alignment is
    /// the max of the fields'.
    pub fn alignment_and_size(&self, arena: &TypeArena) -> Result<(u32, u32)> {
        match self {
            Type::Scalar(k) => Ok(k.alignment_and_size()),
            Type::Str => Ok((8, 16)),
            Type::Handle => Ok((4, 4)),
            Type::Enum(e) => Ok(e.effective_scalar(arena).alignment_and_size()),
            Type::Vector(_) => Ok((8, 16)),
            Type::Interface(_) => Ok((8, 8)),
            Type::TypeDef(_, inner) => arena.get(*inner).alignment_and_size(arena),
            Type::Reference(r) => arena.get(r.resolved).alignment_and_size(arena),
            Type::Array(inner, dims) => {
                let (elem_align, elem_size) = arena.get(*inner).alignment_and_size(arena)?;
                let count: u64 = dims.iter().product();
                Ok((elem_align, elem_size * count as u32))
            }
            Type::Compound(c) => {
                if c.kind == CompoundKind::Union {
                    let mut align = 1u32;
                    let mut size = 0u32;
                    for field in &c.fields {
                        let (a, s) = arena.get(field.type_handle).alignment_and_size(arena)?;
                        align = align.max(a);
                        size = size.max(s);
                    }
                    size = pad_to(size, align);
                    Ok((align, size))
                } else {
                    let mut offset = 0u32;
                    let mut align = 1u32;
                    for field in &c.fields {
                        let (field_align, field_size) = arena.get(field.type_handle).alignment_and_size(arena)?;
                        let pad = offset % field_align;
                        if pad > 0 {
                            offset += field_align - pad;
                        }
                        offset += field_size;
                        align = align.max(field_align);
                    }
                    let size = pad_to(offset, align);
                    Ok((align, size))
                }
            }
        }
    }

    /// Rendered type name for `mode`. Heavy types (compounds, vectors,
    /// strings) are borrowed as `const T&` for arguments and returned
    /// indirectly as `const T*` for results; scalars and enums render the
    /// same in every mode.
    pub fn storage_mode(&self, mode: StorageMode, arena: &TypeArena) -> String {
        let base = self.native_type_name(arena);
        let heavy = matches!(
            self,
            Type::Str | Type::Vector(_) | Type::Compound(_) | Type::Array(..)
        );
        match (mode, heavy) {
            (StorageMode::Stack, _) => base,
            (StorageMode::Argument, true) => format!("const {base}&"),
            (StorageMode::Argument, false) => base,
            (StorageMode::Result, true) => format!("const {base}*"),
            (StorageMode::Result, false) => base,
        }
    }

    fn native_type_name(&self, arena: &TypeArena) -> String {
        match self {
            Type::Scalar(k) => k.native_name().to_string(),
            Type::Str => "::android::hardware::hidl_string".to_string(),
            Type::Handle => "::android::hardware::hidl_handle".to_string(),
            Type::Enum(e) => e.name.clone(),
            Type::Compound(c) => c.name.clone(),
            Type::Vector(inner) => format!("::android::hardware::hidl_vec<{}>", arena.get(*inner).native_type_name(arena)),
            Type::Array(inner, dims) => {
                let dim = dims.iter().map(|d| format!("[{d}]")).collect::<String>();
                format!("{}{}", arena.get(*inner).native_type_name(arena), dim)
            }
            Type::TypeDef(name, _) => name.clone(),
            Type::Interface(i) => format!("::android::sp<{}>", i.name),
            Type::Reference(r) => r.fqname.clone(),
        }
    }
}

fn visit(ty: &Type, handle: TypeHandle, arena: &TypeArena, seen: &mut HashSet<usize>) -> bool {
    if !seen.insert(handle_index(handle)) {
        return true;
    }
    ty.is_java_compatible_visiting(arena, seen)
}

fn visit_rw(ty: &Type, handle: TypeHandle, arena: &TypeArena, seen: &mut HashSet<usize>) -> bool {
    if !seen.insert(handle_index(handle)) {
        return false;
    }
    ty.needs_embedded_rw_visiting(arena, seen)
}

fn handle_index(handle: TypeHandle) -> usize {
    handle.0
}

fn pad_to(size: u32, align: u32) -> u32 {
    let rem = size % align;
    if rem == 0 {
        size
    } else {
        size + (align - rem)
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.native_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(arena: &mut TypeArena, name: &str, ty: Type) -> Field {
        Field {
            name: name.to_string(),
            type_handle: arena.alloc(ty),
        }
    }

    #[test]
    fn struct_layout_matches_c_alignment() {
        let mut arena = TypeArena::new();
        let a = field(&mut arena, "a", Type::Scalar(ScalarKind::Uint8));
        let b = field(&mut arena, "b", Type::Scalar(ScalarKind::Uint32));
        let c = field(&mut arena, "c", Type::Scalar(ScalarKind::Uint8));
        let s = Type::compound("S", CompoundKind::Struct, vec![a, b, c], &arena).unwrap();
        let handle = arena.alloc(s);
        let (align, size) = arena.get(handle).alignment_and_size(&arena).unwrap();
        assert_eq!(align, 4);
        assert_eq!(size, 12);
    }

    #[test]
    fn union_rejects_pointer_bearing_member() {
        let mut arena = TypeArena::new();
        let s = field(&mut arena, "s", Type::Str);
        let result = Type::compound("U", CompoundKind::Union, vec![s], &arena);
        assert!(result.is_err());
    }

    #[test]
    fn union_needs_embedded_rw_is_always_false() {
        let mut arena = TypeArena::new();
        let a = field(&mut arena, "a", Type::Scalar(ScalarKind::Uint32));
        let u = Type::compound("U", CompoundKind::Union, vec![a], &arena).unwrap();
        let handle = arena.alloc(u);
        assert!(!arena.get(handle).needs_embedded_rw(&arena));
    }

    #[test]
    fn struct_rejects_interface_member() {
        let mut arena = TypeArena::new();
        let iface = arena.alloc(Type::Interface(InterfaceType {
            name: "IFoo".to_string(),
            super_interface: None,
            methods: Vec::new(),
        }));
        let f = Field {
            name: "f".to_string(),
            type_handle: iface,
        };
        let result = Type::compound("S", CompoundKind::Struct, vec![f], &arena);
        assert!(result.is_err());
    }

    #[test]
    fn enum_autofill_matches_scenario() {
        let arena = TypeArena::new();
        let mut e = EnumType::new("E", ScalarKind::Uint8).unwrap();
        e.push_value("RED", None, &arena).unwrap();
        e.push_value("GREEN", Some(ConstValue::new(5, IntKind::U8)), &arena).unwrap();
        e.push_value("BLUE", None, &arena).unwrap();
        assert_eq!(e.values[0].value.unsigned, 0);
        assert_eq!(e.values[1].value.unsigned, 5);
        assert_eq!(e.values[2].value.unsigned, 6);
    }

    #[test]
    fn enum_storage_must_be_integer() {
        assert!(EnumType::new("E", ScalarKind::Float).is_err());
    }

    #[test]
    fn enum_rejects_negative_cast_out_of_range_but_accepts_in_range() {
        let arena = TypeArena::new();
        let mut e = EnumType::new("E", ScalarKind::Int8).unwrap();
        e.push_value("NEG", Some(ConstValue::new((-5i64) as u64, IntKind::I32)), &arena).unwrap();
        assert_eq!(e.values[0].value.signed, -5);

        let mut overflowing = EnumType::new("F", ScalarKind::Int8).unwrap();
        let result = overflowing.push_value("TOO_BIG", Some(ConstValue::new(200, IntKind::I32)), &arena);
        assert!(result.is_err());
    }

    #[test]
    fn enum_inherits_storage_and_autofills_from_parent_last_value() {
        let mut arena = TypeArena::new();
        let mut parent = EnumType::new("Parent", ScalarKind::Uint8).unwrap();
        parent.push_value("A", None, &arena).unwrap();
        parent.push_value("B", Some(ConstValue::new(5, IntKind::U8)), &arena).unwrap();
        let parent_handle = arena.alloc(Type::Enum(parent));

        let mut child = EnumType::new_inherited("Child", parent_handle, &arena).unwrap();
        child.push_value("C", None, &arena).unwrap();
        assert_eq!(child.effective_scalar(&arena), ScalarKind::Uint8);
        assert_eq!(child.values[0].value.unsigned, 6);
    }

    #[test]
    fn vector_needs_embedded_rw() {
        let mut arena = TypeArena::new();
        let scalar = arena.alloc(Type::Scalar(ScalarKind::Uint8));
        let vec_handle = arena.alloc(Type::Vector(scalar));
        assert!(arena.get(vec_handle).needs_embedded_rw(&arena));
    }

    #[test]
    fn handle_is_not_java_compatible() {
        let arena = TypeArena::new();
        assert!(!Type::Handle.is_java_compatible(&arena));
    }

    #[test]
    fn struct_with_handle_field_is_not_java_compatible() {
        let mut arena = TypeArena::new();
        let h = field(&mut arena, "h", Type::Handle);
        let s = Type::compound("S", CompoundKind::Struct, vec![h], &arena).unwrap();
        let handle = arena.alloc(s);
        assert!(!arena.get(handle).is_java_compatible(&arena));
    }

    #[test]
    fn resolve_to_scalar_unwraps_typedef_and_enum() {
        let mut arena = TypeArena::new();
        let scalar = arena.alloc(Type::Scalar(ScalarKind::Int32));
        let typedef = arena.alloc(Type::TypeDef("MyInt".to_string(), scalar));
        assert_eq!(arena.get(typedef).resolve_to_scalar(&arena), Some(ScalarKind::Int32));
    }

    #[test]
    fn array_rejects_zero_dimension() {
        let mut arena = TypeArena::new();
        let scalar = arena.alloc(Type::Scalar(ScalarKind::Uint8));
        assert!(Type::array(scalar, vec![0]).is_err());
    }

    #[test]
    fn array_size_multiplies_element_by_dims() {
        let mut arena = TypeArena::new();
        let scalar = arena.alloc(Type::Scalar(ScalarKind::Uint32));
        let arr = Type::array(scalar, vec![4]).unwrap();
        let handle = arena.alloc(arr);
        let (align, size) = arena.get(handle).alignment_and_size(&arena).unwrap();
        assert_eq!(align, 4);
        assert_eq!(size, 16);
    }
}
