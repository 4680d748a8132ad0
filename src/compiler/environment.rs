//! The lexical type environment (spec §4.3): a stack of scopes mapping value
//! names, type names, interface/class/enum/namespace names, and import
//! aliases to their bindings.
//!
//! Scopes are immutable once pushed (`Rc<Scope>`), so `Environment` itself is
//! a cheap-to-clone persistent structure — the representation the checker
//! needs anyway for narrowing (spec §4.7: "the checker maintains the
//! environment immutably per branch"). A narrowed branch is just a normal
//! child scope that shadows the narrowed name; no separate overlay mechanism
//! is needed.

use std::collections::HashMap;
use std::rc::Rc;

use super::ast::symbol::{Symbol, SymbolTable};
use super::ast::symbol_flags::SymbolFlags;
use super::types::Type;

/// One lexical scope. Namespaces nest a whole child `Environment` so that
/// `namespace A { namespace B { ... } }` / `declare module "m" { ... }`
/// resolve dotted paths by walking down through `namespaces`.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    pub values: SymbolTable,
    pub types: SymbolTable,
    pub namespaces: HashMap<String, Rc<Environment>>,
    /// `import X = A.B.C` — local name to a dotted path resolved against the
    /// environment at use (spec §6 "Import aliases ... bind a local name to a
    /// resolved path inside an already-known namespace").
    pub import_aliases: HashMap<String, Vec<String>>,
    pub labels: HashMap<String, ()>,
}

#[derive(Debug, Clone)]
pub struct Environment {
    scopes: Vec<Rc<Scope>>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            scopes: vec![Rc::new(Scope::default())],
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Pushes a fresh child scope (block/function/namespace entry).
    pub fn push_child(&self) -> Self {
        let mut scopes = self.scopes.clone();
        scopes.push(Rc::new(Scope::default()));
        Environment { scopes }
    }

    /// Pops the innermost scope, returning to the enclosing one.
    pub fn pop(&self) -> Self {
        let mut scopes = self.scopes.clone();
        if scopes.len() > 1 {
            scopes.pop();
        }
        Environment { scopes }
    }

    fn with_top_scope(&self, f: impl FnOnce(&mut Scope)) -> Self {
        let mut scopes = self.scopes.clone();
        let top = scopes.last().cloned().unwrap_or_default();
        let mut new_top = (*top).clone();
        f(&mut new_top);
        *scopes.last_mut().unwrap() = Rc::new(new_top);
        Environment { scopes }
    }

    pub fn declare_value(&self, name: impl Into<String>, symbol: Symbol) -> Self {
        let name = name.into();
        self.with_top_scope(|scope| {
            scope.values.insert(name, Rc::new(symbol));
        })
    }

    pub fn declare_type(&self, name: impl Into<String>, symbol: Symbol) -> Self {
        let name = name.into();
        self.with_top_scope(|scope| {
            scope.types.insert(name, Rc::new(symbol));
        })
    }

    /// Declaration merging (spec §4.3): a second `interface X` (or
    /// `namespace X`) in the *same* scope absorbs into the existing symbol
    /// rather than shadowing it.
    pub fn merge_type_declaration(
        &self,
        name: impl Into<String>,
        span: super::ast::node::Span,
        new_members: SymbolTable,
        flags: SymbolFlags,
    ) -> Result<Self, String> {
        let name = name.into();
        let top = self.scopes.last().cloned().unwrap_or_default();
        if let Some(existing) = top.types.get(&name) {
            if !existing.flags.intersects(flags) {
                return Err(format!(
                    "Duplicate identifier '{}': declarations can only merge with declarations of the same kind.",
                    name
                ));
            }
            let mut merged = (**existing).clone();
            merged.merge_declaration(span, new_members);
            Ok(self.with_top_scope(|scope| {
                scope.types.insert(name, Rc::new(merged));
            }))
        } else {
            let mut sym = Symbol::new(name.clone(), flags).with_declaration(span);
            sym.members = new_members;
            Ok(self.declare_type(name, sym))
        }
    }

    pub fn declare_namespace(&self, name: impl Into<String>, env: Environment) -> Self {
        let name = name.into();
        self.with_top_scope(|scope| {
            scope.namespaces.insert(name, Rc::new(env));
        })
    }

    /// Merges a namespace declared twice in the same scope by unioning the
    /// inner environments' top-level bindings (spec §9 open question:
    /// "declarations merge in lexical file order").
    pub fn merge_namespace(&self, name: impl Into<String>, env: Environment) -> Self {
        let name = name.into();
        let existing = self
            .scopes
            .last()
            .and_then(|s| s.namespaces.get(&name))
            .cloned();
        let merged = match existing {
            Some(prev) => prev.union(&env),
            None => env,
        };
        self.with_top_scope(|scope| {
            scope.namespaces.insert(name, Rc::new(merged));
        })
    }

    /// Shallow union of two namespace environments' outermost scope,
    /// existing bindings win on conflict (spec §9: "later files cannot
    /// re-narrow earlier types").
    fn union(&self, other: &Environment) -> Environment {
        let mut result = self.clone();
        if let (Some(mine), Some(theirs)) = (self.scopes.first(), other.scopes.first()) {
            let mut merged_top = (**mine).clone();
            for (k, v) in &theirs.values {
                merged_top.values.entry(k.clone()).or_insert_with(|| v.clone());
            }
            for (k, v) in &theirs.types {
                merged_top.types.entry(k.clone()).or_insert_with(|| v.clone());
            }
            for (k, v) in &theirs.namespaces {
                merged_top
                    .namespaces
                    .entry(k.clone())
                    .or_insert_with(|| v.clone());
            }
            result.scopes[0] = Rc::new(merged_top);
        }
        result
    }

    pub fn declare_import_alias(&self, name: impl Into<String>, path: Vec<String>) -> Self {
        let name = name.into();
        self.with_top_scope(|scope| {
            scope.import_aliases.insert(name, path);
        })
    }

    pub fn lookup_value(&self, name: &str) -> Option<Rc<Symbol>> {
        for scope in self.scopes.iter().rev() {
            if let Some(sym) = scope.values.get(name) {
                return Some(sym.clone());
            }
        }
        None
    }

    pub fn lookup_type(&self, name: &str) -> Option<Rc<Symbol>> {
        for scope in self.scopes.iter().rev() {
            if let Some(sym) = scope.types.get(name) {
                return Some(sym.clone());
            }
        }
        None
    }

    pub fn lookup_namespace(&self, name: &str) -> Option<Rc<Environment>> {
        for scope in self.scopes.iter().rev() {
            if let Some(env) = scope.namespaces.get(name) {
                return Some(env.clone());
            }
        }
        None
    }

    pub fn lookup_import_alias(&self, name: &str) -> Option<Vec<String>> {
        for scope in self.scopes.iter().rev() {
            if let Some(path) = scope.import_aliases.get(name) {
                return Some(path.clone());
            }
        }
        None
    }

    /// Resolves a dotted path (`A.B.C`) starting from this environment,
    /// returning the final segment's value symbol if the intermediate
    /// segments are namespaces.
    pub fn resolve_path_value(&self, path: &[String]) -> Option<Rc<Symbol>> {
        match path {
            [] => None,
            [only] => self.lookup_value(only),
            [head, rest @ ..] => self.lookup_namespace(head)?.resolve_path_value(rest),
        }
    }

    pub fn resolve_path_type(&self, path: &[String]) -> Option<Rc<Symbol>> {
        match path {
            [] => None,
            [only] => self.lookup_type(only),
            [head, rest @ ..] => self.lookup_namespace(head)?.resolve_path_type(rest),
        }
    }

    pub fn is_value_bound(&self, name: &str) -> bool {
        self.lookup_value(name).is_some()
    }

    pub fn declare_label(&self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.with_top_scope(|scope| {
            scope.labels.insert(name, ());
        })
    }

    pub fn has_label_in_current_function(&self, name: &str) -> bool {
        self.scopes.iter().rev().any(|s| s.labels.contains_key(name))
    }
}

/// Convenience constructor for a simple value symbol already carrying a
/// resolved type (the common case for parameters, loop bindings, etc).
pub fn value_symbol(name: &str, ty: Type, flags: SymbolFlags) -> Symbol {
    let mut sym = Symbol::new(name, flags);
    sym.resolved_type = Some(ty);
    sym
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::ast::node::Span;

    #[test]
    fn shadowing_in_child_scope() {
        let env = Environment::new();
        let env = env.declare_value("x", value_symbol("x", Type::Number, SymbolFlags::BLOCK_SCOPED_VARIABLE));
        let child = env.push_child();
        let child = child.declare_value("x", value_symbol("x", Type::String, SymbolFlags::BLOCK_SCOPED_VARIABLE));
        assert_eq!(
            child.lookup_value("x").unwrap().resolved_type,
            Some(Type::String)
        );
        assert_eq!(env.lookup_value("x").unwrap().resolved_type, Some(Type::Number));
    }

    #[test]
    fn interface_declaration_merges() {
        let env = Environment::new();
        let span = Span::new(0, 0, 1);
        let mut members_a = SymbolTable::new();
        members_a.insert(
            "x".to_string(),
            Rc::new(value_symbol("x", Type::Number, SymbolFlags::PROPERTY)),
        );
        let env = env
            .merge_type_declaration("A", span, members_a, SymbolFlags::INTERFACE)
            .unwrap();
        let mut members_b = SymbolTable::new();
        members_b.insert(
            "y".to_string(),
            Rc::new(value_symbol("y", Type::String, SymbolFlags::PROPERTY)),
        );
        let env = env
            .merge_type_declaration("A", span, members_b, SymbolFlags::INTERFACE)
            .unwrap();
        let merged = env.lookup_type("A").unwrap();
        assert_eq!(merged.declarations.len(), 2);
        assert!(merged.members.contains_key("x"));
        assert!(merged.members.contains_key("y"));
    }
}
