use hashbrown::HashMap;
use tracing::trace;

use crate::{
    frontend::ast::TypeSpec,
    index::{Index, IndexVec, simple_index},
    middle::primitive::PrimitiveKind,
};

simple_index! {
    /// Identifies a scope within a [`ScopeTree`]
    pub struct ScopeId;
}

impl ScopeId {
    pub const GLOBAL: Self = Self(0);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolKind {
    Function { parameters: Vec<TypeSpec> },
    Variable,
    Parameter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    /// Declared type, or the return type for functions
    pub ty: TypeSpec,
    pub kind: SymbolKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Function { name: String, return_type: TypeSpec },
    /// A compound statement, numbered in creation order
    Block(usize),
}

#[derive(Debug)]
pub struct Scope {
    pub kind: ScopeKind,
    pub symbols: HashMap<String, Symbol>,
    /// Type names usable in this scope on top of the ones its ancestors allow
    pub allowed_types: Vec<String>,
    pub parent: Option<ScopeId>,
}

/// Arena of every scope created while checking a unit. Parents are referred
/// to by id so the tree can be walked upwards without shared ownership.
#[derive(Debug)]
pub struct ScopeTree {
    scopes: IndexVec<ScopeId, Scope>,
    next_block: usize,
}

impl ScopeTree {
    /// Creates a tree holding only the global scope, which allows the
    /// built-in primitive types.
    pub fn new() -> Self {
        let mut scopes = IndexVec::new();

        scopes.push(Scope {
            kind: ScopeKind::Global,
            symbols: HashMap::new(),
            allowed_types: [
                PrimitiveKind::String,
                PrimitiveKind::Variadic,
                PrimitiveKind::I32,
                PrimitiveKind::I64,
                PrimitiveKind::U32,
                PrimitiveKind::U64,
            ]
            .iter()
            .map(PrimitiveKind::to_string)
            .collect(),
            parent: None,
        });

        Self {
            scopes,
            next_block: 0,
        }
    }

    pub fn push_function(&mut self, parent: ScopeId, name: &str, return_type: TypeSpec) -> ScopeId {
        self.push(
            parent,
            ScopeKind::Function {
                name: name.to_owned(),
                return_type,
            },
        )
    }

    pub fn push_block(&mut self, parent: ScopeId) -> ScopeId {
        let number = self.next_block;
        self.next_block += 1;

        self.push(parent, ScopeKind::Block(number))
    }

    fn push(&mut self, parent: ScopeId, kind: ScopeKind) -> ScopeId {
        let id = self.scopes.push(Scope {
            kind,
            symbols: HashMap::new(),
            allowed_types: Vec::new(),
            parent: Some(parent),
        });

        trace!("created scope {} ({:?}) under {}", id.index(), self.scopes[id].kind, parent.index());

        id
    }

    /// Adds a symbol to a scope, handing it back if the name is taken there
    pub fn insert(&mut self, scope: ScopeId, symbol: Symbol) -> Result<(), Symbol> {
        let symbols = &mut self.scopes[scope].symbols;

        if symbols.contains_key(&symbol.name) {
            return Err(symbol);
        }

        symbols.insert(symbol.name.clone(), symbol);

        Ok(())
    }

    pub fn lookup_local(&self, scope: ScopeId, name: &str) -> Option<&Symbol> {
        self.scopes[scope].symbols.get(name)
    }

    /// Finds the nearest declaration of `name`, walking outwards
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<&Symbol> {
        self.ancestors(scope)
            .find_map(|scope| scope.symbols.get(name))
    }

    pub fn is_type_allowed(&self, scope: ScopeId, name: &str) -> bool {
        self.ancestors(scope)
            .any(|scope| scope.allowed_types.iter().any(|allowed| allowed == name))
    }

    /// The innermost scope that isn't a block, i.e. the function (or the
    /// global scope) a statement belongs to
    pub fn enclosing_non_block(&self, scope: ScopeId) -> &Scope {
        let mut scope = &self.scopes[scope];

        while let (ScopeKind::Block(_), Some(parent)) = (&scope.kind, scope.parent) {
            scope = &self.scopes[parent];
        }

        scope
    }

    fn ancestors(&self, scope: ScopeId) -> impl Iterator<Item = &Scope> {
        let mut next = Some(scope);

        std::iter::from_fn(move || {
            let scope = &self.scopes[next?];
            next = scope.parent;
            Some(scope)
        })
    }
}
