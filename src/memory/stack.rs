//! Scope stack
//!
//! This module provides the chained symbol tables used during execution:
//! - [`ScopeStack`]: the stack of active scopes
//! - [`Scope`]: one block's symbols plus a link to its parent
//! - [`Symbol`]: a declared name with its type, value and usage flag
//!
//! # Scope chaining
//!
//! The stack depth follows the dynamic nesting of active blocks. Each scope
//! records the index of its parent; lookups walk that chain outward. Loop and
//! branch scopes chain to the scope that was active when they were entered,
//! while function scopes and the entry scope chain straight to the global
//! scope, so a callee never sees its caller's locals.

use std::rc::Rc;

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use super::value::{Value, ValueType};
use crate::parser::ast::FunctionDef;

/// What a symbol names
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolKind {
    Scalar(ValueType),
    Array { element: ValueType, dimension: usize },
    Function(Rc<FunctionDef>),
}

impl SymbolKind {
    /// Type tag used in diagnostics
    pub fn describe(&self) -> String {
        match self {
            SymbolKind::Scalar(t) => t.to_string(),
            SymbolKind::Array { element, dimension } => format!("recipe {}[{}]", element, dimension),
            SymbolKind::Function(_) => String::from("function"),
        }
    }
}

/// A declared name
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// `None` until the first assignment
    pub value: Option<Value>,
    pub used: bool,
    pub line: usize,
}

impl Symbol {
    pub fn scalar(name: impl Into<String>, value_type: ValueType, line: usize) -> Self {
        Symbol {
            name: name.into(),
            kind: SymbolKind::Scalar(value_type),
            value: None,
            used: false,
            line,
        }
    }

    pub fn array(name: impl Into<String>, element: ValueType, dimension: usize, line: usize) -> Self {
        Symbol {
            name: name.into(),
            kind: SymbolKind::Array { element, dimension },
            value: None,
            used: false,
            line,
        }
    }

    pub fn function(def: Rc<FunctionDef>) -> Self {
        Symbol {
            name: def.name.clone(),
            line: def.line,
            kind: SymbolKind::Function(def),
            value: None,
            used: false,
        }
    }

    pub fn is_function(&self) -> bool {
        matches!(self.kind, SymbolKind::Function(_))
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }
}

/// Why a scope was opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    /// Locals and body of `chef pinch dish()`
    Entry,
    Function,
    Loop,
    Branch,
}

/// One block's symbol table
#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    parent: Option<usize>,
    symbols: IndexMap<String, Symbol, FxBuildHasher>,
}

impl Scope {
    fn new(kind: ScopeKind, parent: Option<usize>) -> Self {
        Scope {
            kind,
            parent,
            symbols: IndexMap::default(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    /// Variables never looked up, in declaration order
    pub fn unused(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols
            .values()
            .filter(|symbol| !symbol.used && !symbol.is_function())
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// A declaration that collides with a function of the same name
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateDeclaration {
    pub name: String,
    pub existing_line: usize,
}

/// The stack of active scopes
#[derive(Debug, Clone)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
}

impl ScopeStack {
    /// A stack holding only the global scope
    pub fn new() -> Self {
        ScopeStack {
            scopes: vec![Scope::new(ScopeKind::Global, None)],
        }
    }

    /// Enter a block scope chained to the current scope.
    pub fn push(&mut self, kind: ScopeKind) {
        let parent = self.scopes.len().checked_sub(1);
        tracing::trace!(?kind, depth = self.scopes.len() + 1, "enter scope");
        self.scopes.push(Scope::new(kind, parent));
    }

    /// Enter a function scope chained to the global scope.
    pub fn push_function(&mut self) {
        tracing::trace!(depth = self.scopes.len() + 1, "enter function scope");
        self.scopes.push(Scope::new(ScopeKind::Function, Some(0)));
    }

    /// Enter the entry body's scope, chained to the global scope.
    pub fn push_entry(&mut self) {
        tracing::trace!(depth = self.scopes.len() + 1, "enter entry scope");
        self.scopes.push(Scope::new(ScopeKind::Entry, Some(0)));
    }

    /// Leave the innermost scope. The global scope is never popped.
    pub fn pop(&mut self) -> Option<Scope> {
        if self.scopes.len() <= 1 {
            return None;
        }
        tracing::trace!(depth = self.scopes.len(), "exit scope");
        self.scopes.pop()
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn global(&self) -> &Scope {
        &self.scopes[0]
    }

    pub fn current(&self) -> &Scope {
        self.scopes.last().unwrap_or(&self.scopes[0])
    }

    /// Declare in the innermost scope.
    ///
    /// A name already present in that scope may be redeclared unless either
    /// the old or the new symbol is a function.
    pub fn declare(&mut self, symbol: Symbol) -> Result<(), DuplicateDeclaration> {
        let top = self.scopes.len() - 1;
        self.declare_in(top, symbol)
    }

    /// Declare in the global scope.
    pub fn declare_global(&mut self, symbol: Symbol) -> Result<(), DuplicateDeclaration> {
        self.declare_in(0, symbol)
    }

    fn declare_in(&mut self, index: usize, symbol: Symbol) -> Result<(), DuplicateDeclaration> {
        let scope = &mut self.scopes[index];
        if let Some(existing) = scope.symbols.get(&symbol.name) {
            if existing.is_function() || symbol.is_function() {
                return Err(DuplicateDeclaration {
                    name: symbol.name,
                    existing_line: existing.line,
                });
            }
        }
        scope.symbols.insert(symbol.name.clone(), symbol);
        Ok(())
    }

    /// Index of the scope that resolves `name`, walking the parent chain.
    fn resolve(&self, name: &str) -> Option<usize> {
        let mut index = Some(self.scopes.len() - 1);
        while let Some(i) = index {
            let scope = &self.scopes[i];
            if scope.symbols.contains_key(name) {
                return Some(i);
            }
            index = scope.parent;
        }
        None
    }

    /// Look a name up, optionally marking it used.
    pub fn lookup(&mut self, name: &str, mark_used: bool) -> Option<&Symbol> {
        let symbol = self.lookup_mut(name)?;
        if mark_used {
            symbol.used = true;
        }
        Some(&*symbol)
    }

    /// Look a name up without touching its usage flag.
    pub fn peek(&self, name: &str) -> Option<&Symbol> {
        let index = self.resolve(name)?;
        self.scopes[index].symbols.get(name)
    }

    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        let index = self.resolve(name)?;
        self.scopes[index].symbols.get_mut(name)
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}
