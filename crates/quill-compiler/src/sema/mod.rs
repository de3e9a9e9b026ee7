//! Semantic analysis.
//!
//! The [`Analyzer`] turns the parsed files of a unit into a populated
//! [`CompilationContext`]. Declarations are registered in global phases
//! across every file, so a name is visible in every file of the unit no
//! matter which file declares it:
//!
//! 1. **Type shells**: every class and `extern type` is registered by name
//! 2. **Members**: superclasses, fields and methods are attached, parents
//!    first; generic templates are skipped and attached per instantiation
//! 3. **Functions**: free functions and `extern` functions
//! 4. **Entry**: the top-level statements of the entry file become `main`
//!
//! Bodies are analyzed on demand. `main` is demanded first; every call
//! demands its target, overriding methods are demanded with the method
//! they override, and every vtable slot of a constructed class is demanded
//! before analysis completes. Bodies nobody demands are never type-checked.

mod class;
mod expr;
mod infer;
mod returns;
mod stmt;
mod typed_body;

pub use typed_body::{BranchFacts, Construction, FieldRef, TypedBody};

use quill_core::{PrimitiveKind, QuillResult, SemanticError, Span};
use quill_parser::ast::{FunctionDecl, Stmt};
use quill_registry::{
    FuncId, Function, FunctionBody, FunctionFlags, Param, Registry, Resolution, ScopeId, Signature, Substitution, TypeId,
    TypeName,
};
use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use crate::codegen::vtable::VtableLayout;
use crate::context::{CompilationContext, FunctionState};
use crate::scope::{LocalId, VarScope};

/// One parsed file of a unit.
#[derive(Debug, Clone, Copy)]
pub struct SourceFile<'ast> {
    pub path: &'ast str,
    pub stmts: &'ast [Stmt<'ast>],
}

/// Registers declarations and type-checks demanded bodies.
pub struct Analyzer<'c, 'ast> {
    ctx: &'c mut CompilationContext<'ast>,
    /// Classes whose members have been attached.
    attached: FxHashSet<TypeId>,
}

impl<'c, 'ast> Analyzer<'c, 'ast> {
    pub fn new(ctx: &'c mut CompilationContext<'ast>) -> Self {
        Self {
            ctx,
            attached: FxHashSet::default(),
        }
    }

    /// Analyze a unit.
    ///
    /// `imports` are the imported files in dependency order; `entry` is the
    /// file whose top-level statements form `main`. Returns the id of
    /// `main`.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn analyze(&mut self, imports: &[SourceFile<'ast>], entry: SourceFile<'ast>) -> QuillResult<FuncId> {
        for file in imports {
            check_declarations_only(file)?;
        }
        let files: Vec<SourceFile<'ast>> = imports.iter().copied().chain([entry]).collect();

        for file in &files {
            self.declare_types(file)?;
        }
        for file in &files {
            self.attach_classes(file)?;
        }
        for file in &files {
            self.declare_functions(file)?;
        }
        let main = self.declare_entry(entry);
        debug!(
            files = files.len(),
            types = self.registry().type_count(),
            functions = self.registry().function_count(),
            "registered declarations"
        );

        self.demand(main);
        self.drain()?;
        debug!(
            bodies = self.analyzed_count(),
            instances = self.registry().instance_count(),
            "analysis complete"
        );
        Ok(main)
    }

    #[inline]
    fn registry(&self) -> &Registry<'ast> {
        self.ctx.registry()
    }

    #[inline]
    fn registry_mut(&mut self) -> &mut Registry<'ast> {
        self.ctx.registry_mut()
    }

    fn analyzed_count(&self) -> usize {
        self.registry()
            .functions()
            .filter(|(id, _)| self.ctx.state(*id) == FunctionState::BodyResolved)
            .count()
    }

    // ==========================================================================
    // Declarations
    // ==========================================================================

    fn declare_functions(&mut self, file: &SourceFile<'ast>) -> QuillResult<()> {
        for stmt in file.stmts {
            match stmt {
                Stmt::Function(decl) => {
                    let function = script_function(decl, None, FunctionFlags::empty(), Substitution::default());
                    let module = self.registry().module_scope();
                    self.add_to_scope(function, module)?;
                }
                Stmt::ExternFunction(decl) => {
                    let function = Function {
                        name: decl.name.to_string(),
                        owner: None,
                        params: decl.params.iter().map(|p| param(p.name, p.ty.name, p.span)).collect(),
                        declared_return: decl.return_type.map(|ty| ty.name.to_string()),
                        body: FunctionBody::Extern,
                        substitution: Substitution::default(),
                        flags: FunctionFlags::EXTERN,
                        overriders: Default::default(),
                        signature: None,
                        span: decl.span,
                    };
                    self.declare_extern(function)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Add a script function to `scope`, rejecting a second overload with
    /// the same written signature.
    fn add_to_scope(&mut self, function: Function<'ast>, scope: ScopeId) -> QuillResult<FuncId> {
        let registry = self.registry();
        let duplicate = registry
            .scopes()
            .lookup_local(scope, &function.name)
            .iter()
            .any(|&existing| registry.function(existing).same_declared_signature(&function));
        if duplicate {
            let name = match function.owner {
                Some(owner) => format!("{}.{}", registry.name(owner), function.name),
                None => function.name.clone(),
            };
            return Err(SemanticError::RedefinitionError {
                name,
                span: function.span,
            }
            .into());
        }
        let name = function.name.clone();
        let registry = self.registry_mut();
        let id = registry.add_function(function);
        registry.scopes_mut().insert(scope, &name, id);
        Ok(id)
    }

    /// Extern functions link by plain name, so two declarations of one name
    /// must agree.
    fn declare_extern(&mut self, function: Function<'ast>) -> QuillResult<()> {
        let module = self.registry().module_scope();
        let registry = self.registry();
        for &existing in registry.scopes().lookup_local(module, &function.name) {
            let other = registry.function(existing);
            if other.flags.contains(FunctionFlags::EXTERN) {
                if other.same_declared_signature(&function) {
                    return Ok(());
                }
                return Err(SemanticError::RedefinitionError {
                    name: function.name,
                    span: function.span,
                }
                .into());
            }
        }
        let name = function.name.clone();
        let registry = self.registry_mut();
        let id = registry.add_function(function);
        registry.scopes_mut().insert(module, &name, id);
        Ok(())
    }

    fn declare_entry(&mut self, entry: SourceFile<'ast>) -> FuncId {
        let function = Function {
            name: "main".to_string(),
            owner: None,
            params: Vec::new(),
            declared_return: None,
            body: FunctionBody::Entry(entry.stmts),
            substitution: Substitution::default(),
            flags: FunctionFlags::ENTRY,
            overriders: Default::default(),
            signature: None,
            span: entry.stmts.first().map(Stmt::span).unwrap_or_default(),
        };
        let main = self.registry_mut().add_function(function);
        self.ctx.set_entry(main);
        main
    }

    // ==========================================================================
    // Type resolution
    // ==========================================================================

    /// Resolve a written type under `subst`, instantiating generic classes
    /// as needed.
    pub(crate) fn resolve_type(&mut self, text: &str, subst: &Substitution, span: Span) -> QuillResult<TypeId> {
        let parsed =
            TypeName::parse(text).ok_or_else(|| SemanticError::mismatch(format!("malformed type '{text}'"), span))?;
        self.resolve_type_name(&parsed, subst, span)
    }

    fn resolve_type_name(&mut self, name: &TypeName, subst: &Substitution, span: Span) -> QuillResult<TypeId> {
        match name {
            TypeName::Array(element) => {
                let element = self.resolve_type_name(element, subst, span)?;
                Ok(self.registry_mut().array_of(element))
            }
            TypeName::Named { base, args } if args.is_empty() => {
                if let Some(&bound) = subst.get(base) {
                    return Ok(bound);
                }
                Ok(self.registry().resolve_simple(base, span)?)
            }
            TypeName::Named { base, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.resolve_type_name(arg, subst, span))
                    .collect::<QuillResult<Vec<_>>>()?;
                match self.registry_mut().resolve_generic(base, &args, span)? {
                    Resolution::Found(id) => Ok(id),
                    Resolution::NeedsInstance { template, args, name } => self.instantiate(template, args, &name),
                }
            }
        }
    }

    /// Resolve the parameter and return types of `func` once.
    pub(crate) fn resolve_prototype(&mut self, func: FuncId) -> QuillResult<Signature> {
        let function = self.registry().function(func);
        if let Some(signature) = &function.signature {
            return Ok(signature.clone());
        }
        let params: Vec<(String, Span)> = function.params.iter().map(|p| (p.declared.clone(), p.span)).collect();
        let declared_return = function.declared_return.clone();
        let subst = function.substitution.clone();
        let span = function.span;

        let params = params
            .iter()
            .map(|(text, span)| self.resolve_type(text, &subst, *span))
            .collect::<QuillResult<Vec<_>>>()?;
        let ret = match declared_return {
            Some(text) => Some(self.resolve_type(&text, &subst, span)?),
            None => None,
        };
        let signature = Signature { params, ret };
        self.registry_mut().function_mut(func).signature = Some(signature.clone());
        trace!(function = %self.registry().canonical_name(func), "resolved prototype");
        Ok(signature)
    }

    // ==========================================================================
    // Demand-driven body analysis
    // ==========================================================================

    /// Request the body of `func`, and of every method overriding it.
    pub(crate) fn demand(&mut self, func: FuncId) {
        let mut pending = vec![func];
        while let Some(next) = pending.pop() {
            let function = self.registry().function(next);
            if !matches!(function.body, FunctionBody::Script(_) | FunctionBody::Entry(_)) {
                continue;
            }
            let overriders: Vec<FuncId> = function.overriders.values().copied().collect();
            if self.ctx.enqueue(next) {
                pending.extend(overriders);
            }
        }
    }

    /// Record a `new` of `class` and demand what its vtable points at.
    pub(crate) fn construct(&mut self, class: TypeId) {
        if self.ctx.mark_constructed(class) {
            self.demand_vtable(class);
        }
    }

    fn demand_vtable(&mut self, class: TypeId) {
        let layout = VtableLayout::compute(self.registry(), class);
        for implementation in layout.implementations(self.registry(), class) {
            self.demand(implementation);
        }
    }

    fn drain(&mut self) -> QuillResult<()> {
        loop {
            while let Some(func) = self.ctx.next_demanded() {
                self.analyze_body(func)?;
            }
            // Overrides registered while the queue drained can add slot
            // implementations to classes constructed earlier.
            let constructed: Vec<TypeId> = self.ctx.constructed().collect();
            for class in constructed {
                self.demand_vtable(class);
            }
            if !self.ctx.has_demanded() {
                return Ok(());
            }
        }
    }

    fn analyze_body(&mut self, func: FuncId) -> QuillResult<()> {
        if self.ctx.state(func) >= FunctionState::BodyInProgress {
            return Ok(());
        }
        let signature = self.resolve_prototype(func)?;
        self.ctx.set_body_state(func, FunctionState::BodyInProgress);

        let function = self.registry().function(func);
        let body_source = function.body;
        let owner = function.owner;
        let has_receiver = function.has_receiver();
        let subst = function.substitution.clone();
        let name = self.registry().canonical_name(func);

        let mut body = BodyAnalyzer {
            analyzer: self,
            name: name.clone(),
            owner,
            has_receiver,
            receiver: None,
            ret: signature.ret,
            in_entry: false,
            subst,
            scope: VarScope::new(),
            body: TypedBody::new(),
        };
        match body_source {
            FunctionBody::Script(decl) => body.analyze_function(decl, &signature)?,
            FunctionBody::Entry(stmts) => body.analyze_entry(stmts)?,
            FunctionBody::Native(_) | FunctionBody::Extern => {}
        }
        let entry_ret = body.ret;
        let typed = body.finish();

        if matches!(body_source, FunctionBody::Entry(_)) {
            self.registry_mut().function_mut(func).signature = Some(Signature {
                params: Vec::new(),
                ret: entry_ret,
            });
        }
        debug!(function = %name, locals = typed.locals().len(), "analyzed body");
        self.ctx.insert_body(func, typed);
        self.ctx.set_body_state(func, FunctionState::BodyResolved);
        Ok(())
    }
}

/// Analysis state of one function body.
pub(crate) struct BodyAnalyzer<'a, 'c, 'ast> {
    analyzer: &'a mut Analyzer<'c, 'ast>,
    /// Canonical name, for diagnostics.
    name: String,
    owner: Option<TypeId>,
    has_receiver: bool,
    receiver: Option<LocalId>,
    /// Declared return type; for the entry, the type of its result.
    ret: Option<TypeId>,
    /// Analyzing the entry's top-level statements, where `return` is invalid.
    in_entry: bool,
    subst: Substitution,
    scope: VarScope,
    body: TypedBody,
}

impl<'a, 'c, 'ast> BodyAnalyzer<'a, 'c, 'ast> {
    #[inline]
    fn registry(&self) -> &Registry<'ast> {
        self.analyzer.registry()
    }

    #[inline]
    fn registry_mut(&mut self) -> &mut Registry<'ast> {
        self.analyzer.registry_mut()
    }

    fn primitive(&self, kind: PrimitiveKind) -> TypeId {
        self.registry().primitive(kind)
    }

    fn type_name(&self, ty: TypeId) -> String {
        self.registry().name(ty).to_string()
    }

    fn resolve_type(&mut self, text: &str, span: Span) -> QuillResult<TypeId> {
        let subst = std::mem::take(&mut self.subst);
        let resolved = self.analyzer.resolve_type(text, &subst, span);
        self.subst = subst;
        resolved
    }

    fn finish(self) -> TypedBody {
        let mut body = self.body;
        body.receiver = self.receiver;
        body.locals = self.scope.into_locals();
        body
    }
}

fn param(name: &str, declared: &str, span: Span) -> Param {
    Param {
        name: name.to_string(),
        declared: declared.to_string(),
        span,
    }
}

fn script_function<'ast>(
    decl: &'ast FunctionDecl<'ast>,
    owner: Option<TypeId>,
    flags: FunctionFlags,
    substitution: Substitution,
) -> Function<'ast> {
    Function {
        name: decl.name.to_string(),
        owner,
        params: decl.params.iter().map(|p| param(p.name, p.ty.name, p.span)).collect(),
        declared_return: decl.return_type.map(|ty| ty.name.to_string()),
        body: FunctionBody::Script(decl),
        substitution,
        flags,
        overriders: Default::default(),
        signature: None,
        span: decl.span,
    }
}

fn check_declarations_only(file: &SourceFile<'_>) -> Result<(), SemanticError> {
    match file.stmts.iter().find(|stmt| !stmt.is_declaration()) {
        Some(stmt) => Err(SemanticError::ImportFailed {
            path: file.path.to_string(),
            reason: "imported files may only contain declarations".to_string(),
            span: stmt.span(),
        }),
        None => Ok(()),
    }
}
