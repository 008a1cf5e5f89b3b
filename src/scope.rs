//! Scopes, the AST, and interface methods.
//!
//! A `Scope` owns an ordered list of named types plus an insertion-order
//! map for lookup; an `Ast` owns a root `Scope` and the file's identity
//! (FQN, imports). Grounded on the teacher's `Resolver`/`Program` merge
//! shape (`resolver.rs`) for the "one parsed unit owns its declarations,
//! assembled bottom-up" structure, generalized from word/union lists to a
//! scope chain with duplicate-name rejection.

use crate::error::{HidlError, Result};
use crate::fqname::FQName;
use crate::types::{Type, TypeArena, TypeHandle};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeHandle(usize);

/// Owns every `Scope` belonging to one `Ast`.
#[derive(Debug, Default)]
pub struct ScopeArena {
    scopes: Vec<Scope>,
}

impl ScopeArena {
    pub fn new() -> Self {
        ScopeArena::default()
    }

    pub fn alloc(&mut self, parent: Option<ScopeHandle>) -> ScopeHandle {
        self.scopes.push(Scope {
            parent,
            order: Vec::new(),
            names: HashMap::new(),
            constants: HashMap::new(),
        });
        ScopeHandle(self.scopes.len() - 1)
    }

    pub fn get(&self, handle: ScopeHandle) -> &Scope {
        &self.scopes[handle.0]
    }

    pub fn get_mut(&mut self, handle: ScopeHandle) -> &mut Scope {
        &mut self.scopes[handle.0]
    }

    /// Walk innermost-first, returning the first scope in the chain that
    /// binds `name`.
    pub fn lookup(&self, from: ScopeHandle, name: &str) -> Option<TypeHandle> {
        let mut current = Some(from);
        while let Some(handle) = current {
            let scope = self.get(handle);
            if let Some(&idx) = scope.names.get(name) {
                return Some(scope.order[idx]);
            }
            current = scope.parent;
        }
        None
    }
}

/// An ordered, duplicate-checked collection of named types plus a
/// per-scope constant table. May itself be the body of a struct, union,
/// interface, or enum.
#[derive(Debug)]
pub struct Scope {
    parent: Option<ScopeHandle>,
    order: Vec<TypeHandle>,
    names: HashMap<String, usize>,
    constants: HashMap<String, crate::constant::ConstValue>,
}

impl Scope {
    pub fn parent(&self) -> Option<ScopeHandle> {
        self.parent
    }

    pub fn add_type(&mut self, name: impl Into<String>, handle: TypeHandle) -> Result<()> {
        let name = name.into();
        if self.names.contains_key(&name) {
            return Err(HidlError::DuplicateName {
                name,
                first: None,
                second: None,
            });
        }
        let idx = self.order.len();
        self.order.push(handle);
        self.names.insert(name, idx);
        Ok(())
    }

    pub fn add_constant(&mut self, name: impl Into<String>, value: crate::constant::ConstValue) -> Result<()> {
        let name = name.into();
        if self.constants.contains_key(&name) {
            return Err(HidlError::DuplicateName {
                name,
                first: None,
                second: None,
            });
        }
        self.constants.insert(name, value);
        Ok(())
    }

    pub fn constant(&self, name: &str) -> Option<crate::constant::ConstValue> {
        self.constants.get(name).copied()
    }

    pub fn local_type(&self, name: &str) -> Option<TypeHandle> {
        self.names.get(name).map(|&idx| self.order[idx])
    }

    pub fn types(&self) -> &[TypeHandle] {
        &self.order
    }

    pub fn type_count(&self) -> usize {
        self.order.len()
    }

    /// Returns the sole interface handle iff this scope holds exactly one
    /// named type and it is an interface. Drives the "interface file vs
    /// types file" distinction the Coordinator relies on.
    pub fn contains_single_interface(&self, arena: &TypeArena) -> Option<TypeHandle> {
        if self.order.len() != 1 {
            return None;
        }
        let only = self.order[0];
        match arena.get(only) {
            Type::Interface(_) => Some(only),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Import {
    Package(String),
    Interface(FQName),
    Type(FQName),
}

/// One parsed `.hal` file: its declared identity, the types/interfaces it
/// imports, and a root scope populated by the parser. Constructed empty by
/// the Coordinator, then memoized forever.
#[derive(Debug)]
pub struct Ast {
    package: Option<String>,
    version: Option<(u32, u32)>,
    root: ScopeHandle,
    imports: Vec<Import>,
}

impl Ast {
    pub fn new(scopes: &mut ScopeArena) -> Ast {
        Ast {
            package: None,
            version: None,
            root: scopes.alloc(None),
            imports: Vec::new(),
        }
    }

    pub fn root(&self) -> ScopeHandle {
        self.root
    }

    /// `package foo.bar@1.0;` — requires both package and version, and
    /// forbids a tail (a package declaration never names a specific type).
    pub fn set_package(&mut self, fqname: &FQName) -> Result<()> {
        if fqname.package().is_empty() || fqname.version().is_none() {
            return Err(HidlError::TypeConstraint(
                "package declaration requires both a package and a version".to_string(),
            ));
        }
        if !fqname.tail().is_empty() {
            return Err(HidlError::TypeConstraint(
                "package declaration may not name a specific type".to_string(),
            ));
        }
        self.package = Some(fqname.package().to_string());
        self.version = fqname.version();
        Ok(())
    }

    pub fn package(&self) -> Option<&str> {
        self.package.as_deref()
    }

    pub fn version(&self) -> Option<(u32, u32)> {
        self.version
    }

    pub fn fqname(&self) -> Option<FQName> {
        Some(FQName::new(self.package.clone()?, self.version, ""))
    }

    pub fn add_import(&mut self, import: Import) {
        self.imports.push(import);
    }

    pub fn imports(&self) -> &[Import] {
        &self.imports
    }

    pub fn add_scoped_type(
        &self,
        scopes: &mut ScopeArena,
        name: impl Into<String>,
        handle: TypeHandle,
    ) -> Result<()> {
        scopes.get_mut(self.root).add_type(name, handle)
    }

    /// Unqualified lookup walks the scope chain starting at the root
    /// scope. Qualified (dotted) lookups delegate to the Coordinator.
    pub fn lookup_type(&self, scopes: &ScopeArena, name: &str) -> Option<TypeHandle> {
        scopes.lookup(self.root, name)
    }
}

/// A single interface method: name, typed inputs/outputs, one-way flag,
/// and the monotonically assigned wire serial ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    pub name: String,
    pub inputs: Vec<(String, TypeHandle)>,
    pub outputs: Vec<(String, TypeHandle)>,
    pub one_way: bool,
    pub annotations: Vec<String>,
    pub serial_id: u32,
}

impl Method {
    /// A direct-return proxy method is possible iff there is exactly one
    /// output and that output's type carries no embedded pointers and is
    /// not a native handle; two or more outputs, zero outputs, or a
    /// single heavy/binder output all require a callback on the proxy
    /// side and a single-invocation guard on the stub side (scenario S5).
    pub fn elidable_callback(&self, arena: &crate::types::TypeArena) -> bool {
        match self.outputs.as_slice() {
            [(_, handle)] => !arena.get(*handle).needs_embedded_rw(arena),
            _ => false,
        }
    }
}

/// Assign serial IDs to `methods` in declaration order, continuing from
/// `start` (the super-interface's last ID, or 0 for a root interface).
pub fn assign_serial_ids(methods: &mut [Method], start: u32) {
    for (i, method) in methods.iter_mut().enumerate() {
        method.serial_id = start + i as u32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ScalarKind, Type};

    #[test]
    fn duplicate_name_is_rejected() {
        let mut type_arena = TypeArena::new();
        let mut scopes = ScopeArena::new();
        let handle = scopes.alloc(None);
        let t1 = type_arena.alloc(Type::Scalar(ScalarKind::Int32));
        let t2 = type_arena.alloc(Type::Scalar(ScalarKind::Uint8));
        scopes.get_mut(handle).add_type("Foo", t1).unwrap();
        assert!(scopes.get_mut(handle).add_type("Foo", t2).is_err());
    }

    #[test]
    fn lookup_walks_parent_chain_innermost_first() {
        let mut type_arena = TypeArena::new();
        let mut scopes = ScopeArena::new();
        let outer = scopes.alloc(None);
        let inner = scopes.alloc(Some(outer));
        let outer_ty = type_arena.alloc(Type::Scalar(ScalarKind::Int32));
        let inner_ty = type_arena.alloc(Type::Scalar(ScalarKind::Uint8));
        scopes.get_mut(outer).add_type("Shared", outer_ty).unwrap();
        scopes.get_mut(inner).add_type("Local", inner_ty).unwrap();

        assert_eq!(scopes.lookup(inner, "Local"), Some(inner_ty));
        assert_eq!(scopes.lookup(inner, "Shared"), Some(outer_ty));
        assert_eq!(scopes.lookup(inner, "Missing"), None);
    }

    #[test]
    fn set_package_requires_package_and_version() {
        let mut scopes = ScopeArena::new();
        let mut ast = Ast::new(&mut scopes);
        let bad = FQName::parse("foo.bar").unwrap();
        assert!(ast.set_package(&bad).is_err());

        let bad_tail = FQName::parse("foo.bar@1.0::Baz").unwrap();
        assert!(ast.set_package(&bad_tail).is_err());

        let good = FQName::parse("foo.bar@1.0").unwrap();
        assert!(ast.set_package(&good).is_ok());
        assert_eq!(ast.package(), Some("foo.bar"));
    }

    #[test]
    fn contains_single_interface_requires_exactly_one_type() {
        let mut type_arena = TypeArena::new();
        let mut scopes = ScopeArena::new();
        let handle = scopes.alloc(None);
        let iface = type_arena.alloc(Type::Interface(crate::types::InterfaceType {
            name: "IFoo".to_string(),
            super_interface: None,
            methods: Vec::new(),
        }));
        scopes.get_mut(handle).add_type("IFoo", iface).unwrap();
        assert_eq!(scopes.get(handle).contains_single_interface(&type_arena), Some(iface));

        let other = type_arena.alloc(Type::Scalar(ScalarKind::Int32));
        scopes.get_mut(handle).add_type("Other", other).unwrap();
        assert_eq!(scopes.get(handle).contains_single_interface(&type_arena), None);
    }

    #[test]
    fn serial_ids_continue_from_super_interface() {
        let mut methods = vec![
            Method {
                name: "a".to_string(),
                inputs: vec![],
                outputs: vec![],
                one_way: false,
                annotations: vec![],
                serial_id: 0,
            },
            Method {
                name: "b".to_string(),
                inputs: vec![],
                outputs: vec![],
                one_way: false,
                annotations: vec![],
                serial_id: 0,
            },
        ];
        assign_serial_ids(&mut methods, 5);
        assert_eq!(methods[0].serial_id, 5);
        assert_eq!(methods[1].serial_id, 6);
    }

    #[test]
    fn elidable_callback_true_for_single_output() {
        let mut type_arena = TypeArena::new();
        let x = type_arena.alloc(Type::Scalar(ScalarKind::Uint32));
        let m = Method {
            name: "foo".to_string(),
            inputs: vec![],
            outputs: vec![("x".to_string(), x)],
            one_way: false,
            annotations: vec![],
            serial_id: 0,
        };
        assert!(m.elidable_callback(&type_arena));
    }

    #[test]
    fn elidable_callback_false_for_two_outputs() {
        let mut type_arena = TypeArena::new();
        let x = type_arena.alloc(Type::Scalar(ScalarKind::Uint32));
        let y = type_arena.alloc(Type::Vector(x));
        let m = Method {
            name: "foo".to_string(),
            inputs: vec![],
            outputs: vec![("x".to_string(), x), ("y".to_string(), y)],
            one_way: false,
            annotations: vec![],
            serial_id: 0,
        };
        assert!(!m.elidable_callback(&type_arena));
    }

    #[test]
    fn elidable_callback_false_for_single_pointer_bearing_output() {
        let mut type_arena = TypeArena::new();
        let byte = type_arena.alloc(Type::Scalar(ScalarKind::Uint8));
        let bytes = type_arena.alloc(Type::Vector(byte));
        let m = Method {
            name: "foo".to_string(),
            inputs: vec![],
            outputs: vec![("data".to_string(), bytes)],
            one_way: false,
            annotations: vec![],
            serial_id: 0,
        };
        assert!(!m.elidable_callback(&type_arena));
    }

    #[test]
    fn elidable_callback_false_for_single_handle_output() {
        let mut type_arena = TypeArena::new();
        let h = type_arena.alloc(Type::Handle);
        let m = Method {
            name: "foo".to_string(),
            inputs: vec![],
            outputs: vec![("h".to_string(), h)],
            one_way: false,
            annotations: vec![],
            serial_id: 0,
        };
        assert!(!m.elidable_callback(&type_arena));
    }
}
