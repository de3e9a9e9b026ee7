//! Cranelift JIT module setup and symbol linking.

use cranelift_codegen::ir::{AbiParam, Signature, types};
use cranelift_codegen::settings::{self, Configurable};
use cranelift_jit::{JITBuilder, JITModule};
use cranelift_module::{FuncId as ClifFuncId, Linkage, Module};
use quill_core::CodegenError;
use rustc_hash::FxHashMap;

use crate::runtime::{AbiTy, RuntimeFn, SigSpec};

/// Cranelift optimization level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OptLevel {
    None,
    #[default]
    Speed,
    SpeedAndSize,
}

impl OptLevel {
    fn setting(self) -> &'static str {
        match self {
            OptLevel::None => "none",
            OptLevel::Speed => "speed",
            OptLevel::SpeedAndSize => "speed_and_size",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JitOptions {
    pub opt_level: OptLevel,
    /// Run the Cranelift IR verifier on every function.
    pub verifier: bool,
}

impl Default for JitOptions {
    fn default() -> Self {
        Self {
            opt_level: OptLevel::Speed,
            verifier: true,
        }
    }
}

/// The JIT module plus the runtime imports declared in it.
pub struct Backend {
    pub(crate) module: JITModule,
    runtime: FxHashMap<RuntimeFn, ClifFuncId>,
}

impl Backend {
    /// A module linked against the runtime and the given host symbols.
    ///
    /// Symbols not registered here are looked up in the host process.
    pub fn new(options: JitOptions, host_symbols: &[(String, *const u8)]) -> Result<Self, CodegenError> {
        let mut flags = settings::builder();
        let verifier = if options.verifier { "true" } else { "false" };
        for (name, value) in [
            ("use_colocated_libcalls", "false"),
            ("is_pic", "false"),
            ("opt_level", options.opt_level.setting()),
            ("enable_verifier", verifier),
        ] {
            flags.set(name, value).map_err(CodegenError::backend)?;
        }

        let isa = cranelift_native::builder()
            .map_err(CodegenError::backend)?
            .finish(settings::Flags::new(flags))
            .map_err(CodegenError::backend)?;

        let mut builder = JITBuilder::with_isa(isa, cranelift_module::default_libcall_names());
        for runtime in RuntimeFn::ALL {
            builder.symbol(runtime.symbol(), runtime.address());
        }
        for (name, address) in host_symbols {
            builder.symbol(name.clone(), *address);
        }

        Ok(Self {
            module: JITModule::new(builder),
            runtime: FxHashMap::default(),
        })
    }

    /// Import a runtime callable, declaring it on first use.
    pub fn runtime(&mut self, runtime: RuntimeFn) -> Result<ClifFuncId, CodegenError> {
        if let Some(&id) = self.runtime.get(&runtime) {
            return Ok(id);
        }
        let signature = self.runtime_signature(runtime.signature());
        let id = self
            .module
            .declare_function(runtime.symbol(), Linkage::Import, &signature)
            .map_err(CodegenError::backend)?;
        self.runtime.insert(runtime, id);
        Ok(id)
    }

    fn runtime_signature(&self, spec: SigSpec) -> Signature {
        let mut signature = self.module.make_signature();
        signature.params.extend(spec.params.iter().map(|&ty| abi_param(ty)));
        signature.returns.extend(spec.ret.map(abi_param));
        signature
    }

    /// Resolve every declared function and data object.
    pub fn finalize(&mut self) -> Result<(), CodegenError> {
        self.module.finalize_definitions().map_err(CodegenError::backend)
    }

    pub fn function_address(&self, id: ClifFuncId) -> *const u8 {
        self.module.get_finalized_function(id)
    }
}

fn abi_param(ty: AbiTy) -> AbiParam {
    match ty {
        AbiTy::Ptr | AbiTy::I64 => AbiParam::new(types::I64),
        AbiTy::I8 => AbiParam::new(types::I8).uext(),
        AbiTy::F64 => AbiParam::new(types::F64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_imports_are_declared_once() {
        let mut backend = Backend::new(JitOptions::default(), &[]).unwrap();
        let first = backend.runtime(RuntimeFn::Alloc).unwrap();
        let second = backend.runtime(RuntimeFn::Alloc).unwrap();
        assert_eq!(first, second);
        assert_ne!(first, backend.runtime(RuntimeFn::PrintI64).unwrap());
    }

    #[test]
    fn every_opt_level_builds() {
        for opt_level in [OptLevel::None, OptLevel::Speed, OptLevel::SpeedAndSize] {
            let options = JitOptions {
                opt_level,
                verifier: false,
            };
            assert!(Backend::new(options, &[]).is_ok());
        }
    }
}
