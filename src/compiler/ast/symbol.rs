//! Symbols bound into the type environment (spec §4.3).
//!
//! Unlike the teacher's prototype, a `Symbol` here never owns an `Arc<Node>`
//! back into the AST — declarations are recorded by `Span` only, so a symbol
//! is a plain, cheaply-cloneable value. Declaration merging (interfaces,
//! `declare module` augmentation) is modeled by a symbol accumulating more
//! than one declaration span and, for interfaces, more than one member set
//! that the environment flattens on lookup.

use std::collections::HashMap;
use std::rc::Rc;

use super::node::Span;
use super::symbol_flags::SymbolFlags;
use crate::compiler::types::Type;

/// Maps names to symbols within one scope.
pub type SymbolTable = HashMap<String, Rc<Symbol>>;

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub flags: SymbolFlags,
    /// Spans of every declaration contributing to this symbol (plural for
    /// declaration merging: `interface X {}` appearing twice, or function
    /// overload signatures).
    pub declarations: Vec<Span>,
    /// The symbol's resolved type, set once the declaration(s) are checked.
    pub resolved_type: Option<Type>,
    /// Named members, for symbols that are themselves containers
    /// (interfaces, classes, namespaces, enums).
    pub members: SymbolTable,
    /// Exported members, for namespace/module symbols.
    pub exports: SymbolTable,
}

impl Symbol {
    pub fn new(name: impl Into<String>, flags: SymbolFlags) -> Self {
        Symbol {
            name: name.into(),
            flags,
            declarations: Vec::new(),
            resolved_type: None,
            members: HashMap::new(),
            exports: HashMap::new(),
        }
    }

    pub fn with_declaration(mut self, span: Span) -> Self {
        self.declarations.push(span);
        self
    }

    /// Declaration merging: an existing `interface`/`namespace` symbol
    /// absorbs a second declaration of the same kind. Conflicting flags
    /// (e.g. merging a class into a variable) are rejected by the caller
    /// before this is invoked.
    pub fn merge_declaration(&mut self, other_span: Span, other_members: SymbolTable) {
        self.declarations.push(other_span);
        for (name, symbol) in other_members {
            self.members.entry(name).or_insert(symbol);
        }
    }
}

/// Prefix for internal symbol names — an invalid identifier, so it can never
/// collide with a user-written name.
pub const INTERNAL_SYMBOL_NAME_PREFIX: &str = "\u{FE}";

pub mod internal_symbol_names {
    /// Export assignment symbol (`export = expr`).
    pub const EXPORT_EQUALS: &str = "export=";
    /// Default export symbol.
    pub const DEFAULT: &str = "default";
    /// `this` binding.
    pub const THIS: &str = "this";
}
