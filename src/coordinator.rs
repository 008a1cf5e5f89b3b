//! The Coordinator: package-prefix → directory mappings, FQN-keyed AST
//! memoization, and cycle-safe recursive parsing.
//!
//! Grounded on the teacher's `Resolver` (`resolver.rs`) for the "own a
//! visited-set, recurse into dependencies, merge results" shape, adapted
//! from a single-root include graph to a prefix-list, cache-by-FQN design
//! (the source's own two competing Coordinator shapes are resolved in
//! favor of the prefix-list per the open design note).

use crate::ast::TopLevelDecl;
use crate::binder::{self, BindContext};
use crate::constant::ConstValue;
use crate::error::{HidlError, Result};
use crate::fqname::FQName;
use crate::parser;
use crate::scope::{Ast, ScopeArena, ScopeHandle};
use crate::types::{Type, TypeArena, TypeHandle};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AstHandle(usize);

enum Slot {
    InProgress,
    Ready(AstHandle),
}

pub struct Coordinator {
    prefixes: Vec<(String, PathBuf)>,
    type_arena: TypeArena,
    scope_arena: ScopeArena,
    asts: Vec<Ast>,
    cache: HashMap<String, Slot>,
    opened_files: Vec<PathBuf>,
}

impl Coordinator {
    pub fn new() -> Self {
        Coordinator {
            prefixes: Vec::new(),
            type_arena: TypeArena::new(),
            scope_arena: ScopeArena::new(),
            asts: Vec::new(),
            cache: HashMap::new(),
            opened_files: Vec::new(),
        }
    }

    /// Every `.hal` path successfully opened so far, in parse order —
    /// the listing the `-d` dependency-file output is built from.
    pub fn opened_files(&self) -> &[PathBuf] {
        &self.opened_files
    }

    /// Register a `(package-prefix, directory)` mapping. Order is
    /// significant only in that the longest matching prefix wins
    /// regardless of registration order.
    pub fn add_prefix(&mut self, prefix: impl Into<String>, dir: impl Into<PathBuf>) {
        self.prefixes.push((prefix.into(), dir.into()));
    }

    pub fn type_arena(&self) -> &TypeArena {
        &self.type_arena
    }

    pub fn scope_arena(&self) -> &ScopeArena {
        &self.scope_arena
    }

    pub fn ast(&self, handle: AstHandle) -> &Ast {
        &self.asts[handle.0]
    }

    /// Step 1-7 of the Coordinator's parse algorithm (spec §4.6).
    pub fn parse(&mut self, fqname: &FQName) -> Result<AstHandle> {
        if !fqname.is_fully_qualified() {
            return Err(HidlError::TypeConstraint(format!(
                "Coordinator::parse requires a fully qualified name, got '{}'",
                fqname
            )));
        }
        let key = fqname.string();
        match self.cache.get(&key) {
            Some(Slot::Ready(handle)) => return Ok(*handle),
            Some(Slot::InProgress) => {
                return Err(HidlError::TypeConstraint(format!(
                    "cyclic import observed while parsing '{}'",
                    fqname
                )))
            }
            None => {}
        }
        self.cache.insert(key.clone(), Slot::InProgress);

        if fqname.tail() != "types" {
            let types_fq = FQName::new(fqname.package().to_string(), fqname.version(), "types");
            let _ = self.parse(&types_fq);
        }

        let result = self.parse_uncached(fqname);
        match result {
            Ok(handle) => {
                self.cache.insert(key, Slot::Ready(handle));
                Ok(handle)
            }
            Err(e) => {
                self.cache.remove(&key);
                Err(e)
            }
        }
    }

    fn parse_uncached(&mut self, fqname: &FQName) -> Result<AstHandle> {
        let path = self.derive_path(fqname)?;
        let source = fs::read_to_string(&path).map_err(|e| HidlError::io(path.clone(), e))?;

        let decls = parser::parse_file(&source, &path)?;

        let mut ast = Ast::new(&mut self.scope_arena);
        if let Some(package_decl) = decls.iter().find_map(|d| match d {
            TopLevelDecl::Package(p) => Some(p.clone()),
            _ => None,
        }) {
            let declared = FQName::parse(&package_decl)
                .ok_or_else(|| HidlError::TypeConstraint(format!("malformed package declaration '{package_decl}'")))?;
            ast.set_package(&declared.default_apply(fqname.package(), fqname.version().unwrap()))?;
        }

        if ast.package() != Some(fqname.package()) || ast.version() != fqname.version() {
            return Err(HidlError::PackageMismatch {
                file: path.clone(),
                expected: fqname.string(),
                found: format!("{}@{:?}", ast.package().unwrap_or(""), ast.version()),
            });
        }

        for decl in &decls {
            if let TopLevelDecl::Import(import) = decl {
                ast.add_import(crate::scope::Import::Package(import.fqname.clone()));
                // Eagerly follow the import, matching AST::addImport in the
                // original. A mutual-import pair re-enters parse() on the
                // same fully qualified name while it's still InProgress;
                // that failure is expected and discarded here exactly as
                // the implicit types.hal parse above discards its own, so
                // a cycle is broken rather than propagated as a hard error.
                if let Some(parsed) = FQName::parse(&import.fqname) {
                    let resolved = parsed.default_apply(fqname.package(), fqname.version().unwrap());
                    if resolved.is_fully_qualified() {
                        let _ = self.parse(&resolved);
                    }
                }
            }
        }

        binder::bind(&decls, &mut ast, self, fqname.package(), fqname.version().unwrap())?;

        self.validate_file_shape(fqname, &ast, &path)?;

        self.opened_files.push(path);
        self.asts.push(ast);
        Ok(AstHandle(self.asts.len() - 1))
    }

    fn validate_file_shape(&self, fqname: &FQName, ast: &Ast, path: &Path) -> Result<()> {
        let root = self.scope_arena.get(ast.root());
        if fqname.tail() == "types" {
            if root.contains_single_interface(&self.type_arena).is_some() {
                return Err(HidlError::InterfaceFileMismatch {
                    file: path.to_path_buf(),
                    message: "types.hal may not declare an interface".to_string(),
                });
            }
        } else if let Some(iface_handle) = root.contains_single_interface(&self.type_arena) {
            let name = match self.type_arena.get(iface_handle) {
                Type::Interface(i) => i.name.clone(),
                _ => unreachable!(),
            };
            if name != fqname.tail() {
                return Err(HidlError::InterfaceFileMismatch {
                    file: path.to_path_buf(),
                    message: format!("file declares interface '{name}', expected '{}'", fqname.tail()),
                });
            }
        } else if root.type_count() > 0 {
            return Err(HidlError::InterfaceFileMismatch {
                file: path.to_path_buf(),
                message: format!("'{}.hal' must declare exactly interface '{}'", fqname.tail(), fqname.tail()),
            });
        }
        Ok(())
    }

    /// `lookup-type`: split the tail at its first dot; the leading segment
    /// names either an interface (search its own AST) or a type inside
    /// the package's `types` AST.
    pub fn lookup_type(&mut self, fqname: &FQName) -> Result<TypeHandle> {
        if !fqname.is_fully_qualified() {
            return Err(HidlError::UnresolvedReference {
                name: fqname.string(),
                context: "lookup_type requires a fully qualified name".to_string(),
            });
        }
        let (head, rest) = match fqname.tail().split_once('.') {
            Some((h, r)) => (h.to_string(), Some(r.to_string())),
            None => (fqname.tail().to_string(), None),
        };

        let head_fq = FQName::new(fqname.package().to_string(), fqname.version(), head.clone());
        if let Ok(handle) = self.parse(&head_fq) {
            let ast = self.ast(handle);
            let target_name = rest.as_deref().unwrap_or(&head);
            if let Some(found) = ast.lookup_type(&self.scope_arena, target_name) {
                return Ok(self.make_reference(fqname, found));
            }
        }

        let types_fq = FQName::new(fqname.package().to_string(), fqname.version(), "types");
        let handle = self.parse(&types_fq)?;
        let ast = self.ast(handle);
        let target_name = rest.as_deref().unwrap_or(&head);
        match ast.lookup_type(&self.scope_arena, target_name) {
            Some(found) => Ok(self.make_reference(fqname, found)),
            None => Err(HidlError::UnresolvedReference {
                name: fqname.string(),
                context: "Coordinator::lookup_type".to_string(),
            }),
        }
    }

    fn make_reference(&mut self, fqname: &FQName, resolved: TypeHandle) -> TypeHandle {
        self.type_arena.alloc(Type::Reference(crate::types::ReferenceType {
            fqname: fqname.string(),
            resolved,
        }))
    }

    fn derive_path(&self, fqname: &FQName) -> Result<PathBuf> {
        let (prefix, dir) = self
            .prefixes
            .iter()
            .filter(|(p, _)| fqname.package() == *p || fqname.package().starts_with(&format!("{p}.")))
            .max_by_key(|(p, _)| p.len())
            .ok_or_else(|| HidlError::TypeConstraint(format!("no prefix mapping covers package '{}'", fqname.package())))?;

        let mut path = dir.clone();
        let remaining = fqname.package().strip_prefix(prefix).unwrap_or("").trim_start_matches('.');
        for component in remaining.split('.').filter(|c| !c.is_empty()) {
            path.push(component);
        }
        let (major, minor) = fqname.version().expect("fully qualified");
        path.push(format!("V{major}_{minor}"));
        path.push(format!("{}.hal", fqname.tail()));
        Ok(path)
    }
}

impl Default for Coordinator {
    fn default() -> Self {
        Coordinator::new()
    }
}

/// The Coordinator implements `BindContext` directly: arena mutation and
/// cross-file resolution both go through `&mut self`, so the binder pass
/// only ever holds one mutable borrow into the Coordinator's state (the
/// arenas are never re-borrowed separately from the resolver that itself
/// recurses back into them via `parse`/`lookup_type`).
impl BindContext for Coordinator {
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

    fn resolve_external(&mut self, current_package: &str, current_version: (u32, u32), name: &str) -> Result<TypeHandle> {
        let fq = if let Some(parsed) = FQName::parse(name) {
            parsed.default_apply(current_package, current_version)
        } else {
            FQName::new(current_package.to_string(), Some(current_version), name)
        };
        self.lookup_type(&fq)
    }

    fn super_interface_last_id(
        &mut self,
        current_package: &str,
        current_version: (u32, u32),
        name: &str,
    ) -> Result<(TypeHandle, u32)> {
        let handle = self.resolve_external(current_package, current_version, name)?;
        let resolved = match self.type_arena.get(handle) {
            Type::Reference(r) => r.resolved,
            _ => handle,
        };
        match self.type_arena.get(resolved) {
            Type::Interface(iface) => Ok((handle, iface.last_serial_id())),
            _ => Err(HidlError::TypeConstraint(format!("'{name}' is not an interface"))),
        }
    }
}
