use crate::ir::runtime;
use crate::ir::symbol_table::{ScopeId, ScopeTree};
use crate::ir::*;
use crate::CompileError;

/// State of one in-flight compilation.
///
/// Owns the module under construction, the scope tree, and the counters
/// used to name temporaries and hoisted string constants.
pub struct Gen {
    pub module: Module,
    pub scopes: ScopeTree,
    pub scope: ScopeId,
    pub function: FunctionId,
    pub block: BlockId,
    pub temp_count: usize,
    pub string_count: usize,
}

impl Gen {
    /// A fresh compilation with the runtime installed and `main` opened.
    pub fn new() -> Result<Self, CompileError> {
        let mut module = Module::new();
        let mut scopes = ScopeTree::new();
        runtime::install(&mut module, &mut scopes)?;

        let mut main = Function {
            signature: Callee {
                name: "main".to_string(),
                ret: Type::i32(),
                params: Vec::new(),
                variadic: false,
            },
            blocks: Vec::new(),
        };
        let entry = main.new_block();
        let function = module.add_function(main);
        let scope = scopes.root();

        Ok(Self {
            module,
            scopes,
            scope,
            function,
            block: entry,
            temp_count: 0,
            string_count: 0,
        })
    }

    /// Close `main` with `ret i32 0` and check every block is terminated.
    pub fn finish(mut self) -> Result<Module, CompileError> {
        self.terminate(Terminator::Ret(Value::i32(0)))?;
        self.module.verify()?;
        tracing::info!(
            blocks = self.current_function()?.blocks.len(),
            globals = self.module.globals.len(),
            "compilation finished"
        );
        Ok(self.module)
    }

    pub fn current_function(&self) -> Result<&Function, CompileError> {
        Ok(self.module.function(self.function)?)
    }

    fn current_function_mut(&mut self) -> Result<&mut Function, CompileError> {
        Ok(self.module.function_mut(self.function)?)
    }

    pub fn new_temp(&mut self, ty: Type) -> Value {
        let name = format!("t{}", self.temp_count);
        self.temp_count += 1;
        Value::Temp { name, ty }
    }

    pub fn new_block(&mut self) -> Result<BlockId, CompileError> {
        let id = self.current_function_mut()?.new_block();
        tracing::debug!(block = id.0, "allocated block");
        Ok(id)
    }

    /// Append to the current block.
    pub fn emit(&mut self, i: Instr) -> Result<(), CompileError> {
        let block = self.block;
        self.current_function_mut()?.push(block, i)?;
        Ok(())
    }

    /// Terminate the current block.
    pub fn terminate(&mut self, term: Terminator) -> Result<(), CompileError> {
        let block = self.block;
        self.terminate_block(block, term)
    }

    pub fn terminate_block(&mut self, block: BlockId, term: Terminator) -> Result<(), CompileError> {
        self.current_function_mut()?.terminate(block, term)?;
        Ok(())
    }

    /// Run `f` inside a child of the current scope, discarding it afterwards.
    pub fn with_child_scope<F, R>(&mut self, f: F) -> Result<R, CompileError>
    where
        F: FnOnce(&mut Self) -> Result<R, CompileError>,
    {
        let parent = self.scope;
        let child = self.scopes.push_child_scope(parent);
        tracing::debug!(depth = self.scopes.depth(), "entered scope");
        self.scope = child;
        let result = f(self);
        self.scopes.discard(child);
        self.scope = parent;
        tracing::debug!(depth = self.scopes.depth(), "left scope");
        result
    }
}
