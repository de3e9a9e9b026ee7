//! Code generation - lowering analyzed bodies to a Cranelift JIT module.
//!
//! Emission is demand-driven. A backend function is declared the first time
//! something refers to it (a call, a vtable slot or the entry) and queued for
//! lowering; each function moves `Queued -> Emitted` exactly once.
//!
//! - [`layout`]: value types and heap record offsets
//! - [`vtable`]: virtual method slot assignment
//! - [`jit`]: module setup, runtime and host symbol linking

mod data;
mod function;
pub mod jit;
pub mod layout;
mod native;
pub mod vtable;

use std::collections::VecDeque;

use cranelift_codegen::ir::{AbiParam, Signature, UserFuncName};
use cranelift_frontend::{FunctionBuilder, FunctionBuilderContext};
use cranelift_module::{DataId, FuncId as ClifFuncId, Linkage, Module};
use quill_core::CodegenError;
use quill_registry::{FuncId, FunctionBody, TypeId};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::context::CompilationContext;
use function::FunctionLowering;
use jit::{Backend, JitOptions};
use layout::{POINTER_TYPE, abi_param};
use vtable::VtableLayout;

/// Emission progress of a backend function. Absent means unemitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitState {
    Queued,
    Emitted,
}

/// Lowers every function reachable from the entry into one JIT module.
pub struct Generator<'c, 'ast> {
    ctx: &'c CompilationContext<'ast>,
    backend: Backend,
    functions: FxHashMap<FuncId, ClifFuncId>,
    states: FxHashMap<FuncId, EmitState>,
    queue: VecDeque<FuncId>,

    layouts: FxHashMap<TypeId, VtableLayout>,
    metadata: FxHashMap<TypeId, DataId>,
    vtables: FxHashMap<TypeId, Option<DataId>>,
    strings: FxHashMap<String, DataId>,
}

impl<'c, 'ast> Generator<'c, 'ast> {
    pub fn new(
        ctx: &'c CompilationContext<'ast>,
        options: JitOptions,
        host_symbols: &[(String, *const u8)],
    ) -> Result<Self, CodegenError> {
        Ok(Self {
            ctx,
            backend: Backend::new(options, host_symbols)?,
            functions: FxHashMap::default(),
            states: FxHashMap::default(),
            queue: VecDeque::new(),
            layouts: FxHashMap::default(),
            metadata: FxHashMap::default(),
            vtables: FxHashMap::default(),
            strings: FxHashMap::default(),
        })
    }

    /// Emit `entry` and everything it reaches, then finalize the module.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn generate(mut self, entry: FuncId) -> Result<CompiledModule, CodegenError> {
        let main = self.function_ref(entry)?;
        while let Some(func) = self.queue.pop_front() {
            self.emit(func)?;
        }
        self.backend.finalize()?;
        debug!(
            functions = self.functions.len(),
            vtables = self.vtables.values().flatten().count(),
            "finalized module"
        );

        let emitted = self
            .states
            .iter()
            .filter(|&(_, &state)| state == EmitState::Emitted)
            .map(|(&func, _)| self.ctx.registry().canonical_name(func))
            .collect();
        let result = self
            .ctx
            .registry()
            .function(entry)
            .signature
            .as_ref()
            .and_then(|signature| signature.ret);
        Ok(CompiledModule {
            entry: self.backend.function_address(main),
            result,
            emitted,
            _backend: self.backend,
        })
    }

    pub fn emit_state(&self, func: FuncId) -> Option<EmitState> {
        self.states.get(&func).copied()
    }

    /// The backend function of `func`, declared and queued on first use.
    pub(crate) fn function_ref(&mut self, func: FuncId) -> Result<ClifFuncId, CodegenError> {
        if let Some(&id) = self.functions.get(&func) {
            return Ok(id);
        }
        let registry = self.ctx.registry();
        let name = registry.canonical_name(func);
        let linkage = match registry.function(func).body {
            FunctionBody::Script(_) | FunctionBody::Entry(_) => Linkage::Export,
            FunctionBody::Extern => Linkage::Import,
            FunctionBody::Native(_) => {
                return Err(CodegenError::internal(format!("native function '{name}' has no symbol")));
            }
        };
        let signature = self.signature_of(func)?;
        let id = self
            .backend
            .module
            .declare_function(&name, linkage, &signature)
            .map_err(CodegenError::backend)?;
        self.functions.insert(func, id);

        if linkage == Linkage::Export {
            self.states.insert(func, EmitState::Queued);
            self.queue.push_back(func);
            trace!(function = %name, "queued function");
        }
        Ok(id)
    }

    /// Backend signature of `func`: the receiver word first, then the
    /// declared parameters.
    pub(crate) fn signature_of(&self, func: FuncId) -> Result<Signature, CodegenError> {
        let registry = self.ctx.registry();
        let function = registry.function(func);
        let resolved = function.signature.as_ref().ok_or_else(|| {
            CodegenError::internal(format!("'{}' has no resolved prototype", registry.canonical_name(func)))
        })?;

        let mut signature = self.backend.module.make_signature();
        if function.has_receiver() {
            signature.params.push(AbiParam::new(POINTER_TYPE));
        }
        signature
            .params
            .extend(resolved.params.iter().map(|&param| abi_param(registry, param)));
        signature.returns.extend(resolved.ret.map(|ret| abi_param(registry, ret)));
        Ok(signature)
    }

    fn emit(&mut self, func: FuncId) -> Result<(), CodegenError> {
        if self.emit_state(func) == Some(EmitState::Emitted) {
            return Ok(());
        }
        let ctx = self.ctx;
        let registry = ctx.registry();
        let name = registry.canonical_name(func);
        let body = ctx
            .typed_body(func)
            .ok_or_else(|| CodegenError::internal(format!("'{name}' was queued without an analyzed body")))?;
        let id = *self
            .functions
            .get(&func)
            .ok_or_else(|| CodegenError::internal(format!("'{name}' was queued without a declaration")))?;

        let mut context = self.backend.module.make_context();
        context.func.signature = self.signature_of(func)?;
        context.func.name = UserFuncName::user(0, id.as_u32());
        let mut builder_context = FunctionBuilderContext::new();
        {
            let builder = FunctionBuilder::new(&mut context.func, &mut builder_context);
            FunctionLowering::new(self, builder, func, body).lower(registry.function(func).body)?;
        }

        self.backend
            .module
            .define_function(id, &mut context)
            .map_err(|err| CodegenError::backend(format!("failed to define '{name}': {err:?}")))?;
        self.states.insert(func, EmitState::Emitted);
        debug!(function = %name, "emitted function");
        Ok(())
    }
}

/// A finalized module ready to run.
///
/// Owns the JIT memory; the entry address is valid while this value lives.
pub struct CompiledModule {
    entry: *const u8,
    result: Option<TypeId>,
    emitted: Vec<String>,
    _backend: Backend,
}

impl CompiledModule {
    /// Address of `main`.
    pub fn entry(&self) -> *const u8 {
        self.entry
    }

    /// Type of the value `main` returns, `None` for void.
    pub fn result_type(&self) -> Option<TypeId> {
        self.result
    }

    /// Canonical names of every emitted function.
    pub fn emitted(&self) -> &[String] {
        &self.emitted
    }

    pub fn is_emitted(&self, canonical_name: &str) -> bool {
        self.emitted.iter().any(|name| name == canonical_name)
    }
}

impl std::fmt::Debug for CompiledModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledModule")
            .field("entry", &self.entry)
            .field("result", &self.result)
            .field("emitted", &self.emitted.len())
            .finish()
    }
}
