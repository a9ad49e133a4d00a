use crate::frontend::source::Position;
use crate::ir::{Callee, Type, Value};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

/// Storage a variable name is bound to.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableInfo {
    /// Pointer to the variable's storage.
    pub storage: Value,
    /// `None` for bindings installed by the runtime.
    pub declared_at: Option<Position>,
}

impl VariableInfo {
    /// Type of the value held in the storage.
    pub fn value_type(&self) -> Option<Type> {
        self.storage.ty().pointee().cloned()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SymbolError {
    /// The name is already bound in the same scope. `previous` is where the
    /// existing binding was declared, if it came from source.
    Redefinition {
        name: String,
        previous: Option<Position>,
    },
    /// Functions can only be declared in the root scope.
    NotRootScope(String),
    /// The scope was already discarded.
    UnknownScope,
}

#[derive(Debug, Clone, Default)]
struct Frame {
    parent: Option<ScopeId>,
    variables: HashMap<String, VariableInfo>,
}

/// Lexical environments stored in an arena and linked by parent index.
///
/// The root scope (index 0) additionally owns the function table. Child
/// scopes are discarded in LIFO order as their constructs finish lowering.
#[derive(Debug, Clone)]
pub struct ScopeTree {
    frames: Vec<Frame>,
    functions: HashMap<String, Callee>,
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeTree {
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::default()],
            functions: HashMap::new(),
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn is_root(&self, scope: ScopeId) -> bool {
        scope.0 == 0
    }

    /// Number of live scopes, root included.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.frames.get(scope.0).and_then(|f| f.parent)
    }

    /// Open a scope whose parent is `parent`.
    pub fn push_child_scope(&mut self, parent: ScopeId) -> ScopeId {
        self.frames.push(Frame {
            parent: Some(parent),
            variables: HashMap::new(),
        });
        ScopeId(self.frames.len() - 1)
    }

    /// Drop a child scope and its bindings. Only the newest scope can be discarded.
    pub fn discard(&mut self, scope: ScopeId) {
        if scope.0 != 0 && scope.0 + 1 == self.frames.len() {
            self.frames.pop();
        }
    }

    /// Bind `name` in `scope`; fails if `scope` already binds it.
    pub fn declare_variable(
        &mut self,
        scope: ScopeId,
        name: &str,
        info: VariableInfo,
    ) -> Result<(), SymbolError> {
        let frame = self
            .frames
            .get_mut(scope.0)
            .ok_or(SymbolError::UnknownScope)?;
        if let Some(existing) = frame.variables.get(name) {
            return Err(SymbolError::Redefinition {
                name: name.to_string(),
                previous: existing.declared_at,
            });
        }
        frame.variables.insert(name.to_string(), info);
        Ok(())
    }

    /// Register a callable. Only valid on the root scope.
    pub fn declare_function(
        &mut self,
        scope: ScopeId,
        name: &str,
        callee: Callee,
    ) -> Result<(), SymbolError> {
        if !self.is_root(scope) {
            return Err(SymbolError::NotRootScope(name.to_string()));
        }
        if self.functions.contains_key(name) {
            return Err(SymbolError::Redefinition {
                name: name.to_string(),
                previous: None,
            });
        }
        self.functions.insert(name.to_string(), callee);
        Ok(())
    }

    /// Lookup through `scope` and then each of its ancestors.
    pub fn resolve_variable(&self, scope: ScopeId, name: &str) -> Option<&VariableInfo> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let frame = self.frames.get(id.0)?;
            if let Some(info) = frame.variables.get(name) {
                return Some(info);
            }
            current = frame.parent;
        }
        None
    }

    /// Lookup only in `scope` itself
    pub fn lookup_local(&self, scope: ScopeId, name: &str) -> Option<&VariableInfo> {
        self.frames.get(scope.0)?.variables.get(name)
    }

    /// Functions always resolve through the root scope.
    pub fn resolve_function(&self, name: &str) -> Option<&Callee> {
        self.functions.get(name)
    }
}
