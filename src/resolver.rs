//! Reference resolution
//!
//! After a document is compiled, every `ref` value, `ref` key and `file`
//! reference reachable from its root is bound to a target element. `ref`
//! paths are looked up from the root of the document that declares them;
//! `file` paths are read relative to that document and compiled into the
//! same arena, once per canonical path.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::arena::Arena;
use crate::compiler::Compiler;
use crate::element::{Element, ElementId, RefId};
use crate::error::{Result, SchemaError};
use crate::key::KeyKind;
use crate::loader::read_document;

#[derive(Debug)]
enum Pending {
    Ref { slot: RefId, path: String, address: String },
    File { slot: RefId, path: String, address: String },
}

pub(crate) struct Resolver<'m> {
    compiler: Compiler<'m>,
    documents: HashMap<PathBuf, ElementId>,
}

impl<'m> Resolver<'m> {
    pub fn new(compiler: Compiler<'m>) -> Self {
        Self {
            compiler,
            documents: HashMap::new(),
        }
    }

    pub fn into_arena(self) -> Arena {
        self.compiler.into_arena()
    }

    /// Bind the references of the outermost document. `document` is the
    /// file it was read from, if any; `file` references need it.
    pub fn resolve_root(&mut self, root: ElementId, document: Option<&Path>) -> Result<()> {
        if let Some(canonical) = document.and_then(|path| path.canonicalize().ok()) {
            self.documents.insert(canonical, root);
        }
        self.resolve_document(root, document)
    }

    fn resolve_document(&mut self, root: ElementId, document: Option<&Path>) -> Result<()> {
        let mut pending = Vec::new();
        collect(&self.compiler.arena, root, &mut pending);

        for item in pending {
            match item {
                Pending::Ref { slot, path, address } => {
                    let target = lookup(&self.compiler.arena, root, &path)
                        .map_err(|message| SchemaError::new(&address, message))?;
                    tracing::debug!(path = %path, address = %address, "bound reference");
                    self.compiler.arena.bind(slot, target);
                }
                Pending::File { slot, path, address } => {
                    let target = self.load_file(&path, document, &address)?;
                    self.compiler.arena.bind(slot, target);
                }
            }
        }
        Ok(())
    }

    fn load_file(&mut self, file: &str, document: Option<&Path>, address: &str) -> Result<ElementId> {
        let Some(document) = document else {
            return Err(SchemaError::new(
                address,
                "Schema has file reference. Must specify document name.",
            ));
        };
        let wrap = |detail: String| SchemaError::new(address, format!("Error reading '{file}': {detail}"));

        let path = document.parent().unwrap_or_else(|| Path::new("")).join(file);
        let canonical = path.canonicalize().map_err(|err| wrap(err.to_string()))?;
        if let Some(root) = self.documents.get(&canonical) {
            return Ok(*root);
        }

        tracing::debug!(path = %canonical.display(), "loading referenced schema document");
        let table = read_document(&path).map_err(|err| wrap(err.detail()))?;
        let root = self
            .compiler
            .compile_root(&table, "")
            .map_err(|err| wrap(err.to_string()))?;
        // Registered before its own references are bound, so cycles between
        // documents end at the cached root.
        self.documents.insert(canonical, root);
        self.resolve_document(root, Some(&path))
            .map_err(|err| wrap(err.to_string()))?;
        Ok(root)
    }
}

/// Depth-first walk collecting unbound references. Does not enter other
/// documents: their roots are only reachable through `file` slots.
fn collect(arena: &Arena, id: ElementId, pending: &mut Vec<Pending>) {
    match arena.get(id) {
        Element::Table(table) => {
            for (key, child) in &table.entries {
                if let KeyKind::Ref { path, slot, address } = &key.kind {
                    pending.push(Pending::Ref {
                        slot: *slot,
                        path: path.clone(),
                        address: address.clone(),
                    });
                }
                collect(arena, *child, pending);
            }
        }
        Element::Array(array) => collect(arena, array.member, pending),
        Element::Union(union) => {
            for member in &union.members {
                collect(arena, *member, pending);
            }
        }
        Element::Ref(reference) => pending.push(Pending::Ref {
            slot: reference.slot,
            path: reference.path.clone(),
            address: reference.address.clone(),
        }),
        Element::File(file) => pending.push(Pending::File {
            slot: file.slot,
            path: file.path.clone(),
            address: file.address.clone(),
        }),
        _ => {}
    }
}

/// Follow a dotted path of literal keys from `root`, hidden keys first.
/// Errors name the path prefix that failed.
pub(crate) fn lookup(arena: &Arena, root: ElementId, path: &str) -> std::result::Result<ElementId, String> {
    let mut current = root;
    let mut base = String::new();
    for segment in path.split('.') {
        if !base.is_empty() {
            base.push('.');
        }
        base.push_str(segment);

        let Some(table) = arena.get(current).as_table() else {
            return Err(format!("Reference to non-existing sub-key: {base}"));
        };
        current = table
            .get_for_reference(segment)
            .ok_or_else(|| format!("Reference to non-existing key: {base}"))?;
    }
    Ok(current)
}
