//! Lowering of one analyzed body to Cranelift IR.

use cranelift_codegen::ir::{Block, InstBuilder, MemFlags, Type as ClifType, Value, types};
use cranelift_frontend::{FunctionBuilder, Variable};
use cranelift_module::{DataId, Module};
use quill_core::{CodegenError, PrimitiveKind};
use quill_parser::ast::{
    ArrayLiteralExpr, AssignExpr, BinaryExpr, CallExpr, Expr, ForStmt, IfStmt, IndexExpr, LiteralExpr, LiteralKind,
    NewExpr, ReturnStmt, Stmt, VarStmt,
};
use quill_registry::{FuncId, FunctionBody, Registry, Type, TypeId};

use super::Generator;
use super::layout::{
    ARRAY_DATA_OFFSET, METADATA_OFFSET, POINTER_TYPE, VTABLE_OFFSET, WORD, field_offset, object_size, value_type,
};
use crate::runtime::RuntimeFn;
use crate::scope::LocalId;
use crate::sema::{FieldRef, TypedBody};

pub(super) struct FunctionLowering<'g, 'c, 'ast, 'f> {
    pub(super) generator: &'g mut Generator<'c, 'ast>,
    pub(super) builder: FunctionBuilder<'f>,
    ctx: &'c crate::context::CompilationContext<'ast>,
    body: &'c TypedBody,
    func: FuncId,
}

impl<'g, 'c, 'ast, 'f> FunctionLowering<'g, 'c, 'ast, 'f> {
    pub(super) fn new(
        generator: &'g mut Generator<'c, 'ast>,
        builder: FunctionBuilder<'f>,
        func: FuncId,
        body: &'c TypedBody,
    ) -> Self {
        let ctx = generator.ctx;
        Self {
            generator,
            builder,
            ctx,
            body,
            func,
        }
    }

    #[inline]
    pub(super) fn registry(&self) -> &'c Registry<'ast> {
        self.ctx.registry()
    }

    pub(super) fn lower(mut self, source: FunctionBody<'ast>) -> Result<(), CodegenError> {
        let entry = self.builder.create_block();
        self.builder.append_block_params_for_function_params(entry);
        self.builder.switch_to_block(entry);
        self.builder.seal_block(entry);

        let body = self.body;
        let registry = self.registry();
        for (index, local) in body.locals().iter().enumerate() {
            self.builder.declare_var(Variable::from_u32(index as u32), value_type(registry, local.ty));
        }
        let incoming = self.builder.block_params(entry).to_vec();
        let bound: Vec<LocalId> = body.receiver().into_iter().chain(body.params().iter().copied()).collect();
        if incoming.len() != bound.len() {
            return Err(self.internal("parameter count differs from the signature"));
        }
        for (local, value) in bound.into_iter().zip(incoming) {
            self.builder.def_var(variable(local), value);
        }

        match source {
            FunctionBody::Script(decl) => {
                let terminated = self.lower_block(decl.body.stmts)?;
                if terminated != self.body.definitely_returns() {
                    return Err(self.internal("lowered control flow disagrees with the return analysis"));
                }
                if !terminated {
                    self.return_default();
                }
            }
            FunctionBody::Entry(stmts) => self.lower_entry(stmts)?,
            FunctionBody::Native(_) | FunctionBody::Extern => {
                return Err(self.internal("only script functions have bodies"));
            }
        }

        self.builder.seal_all_blocks();
        self.builder.finalize();
        Ok(())
    }

    fn lower_entry(&mut self, stmts: &'ast [Stmt<'ast>]) -> Result<(), CodegenError> {
        let result = self.body.result();
        let mut value = None;
        for stmt in stmts.iter().filter(|stmt| !stmt.is_declaration()) {
            match stmt {
                Stmt::Expr(expr) if Some(expr.id()) == result => value = self.lower_expr(expr)?,
                _ => {
                    if self.lower_stmt(stmt)? {
                        return Err(self.internal("entry statements cannot return"));
                    }
                }
            }
        }
        match value {
            Some(value) => self.builder.ins().return_(&[value]),
            None => self.builder.ins().return_(&[]),
        };
        Ok(())
    }

    /// Falling off the end of a function: only void functions get here
    /// through reachable code.
    fn return_default(&mut self) {
        match self.return_type() {
            Some(ret) => {
                let zero = self.zero(value_type(self.registry(), ret));
                self.builder.ins().return_(&[zero]);
            }
            None => {
                self.builder.ins().return_(&[]);
            }
        }
    }

    fn return_type(&self) -> Option<TypeId> {
        self.registry()
            .function(self.func)
            .signature
            .as_ref()
            .and_then(|signature| signature.ret)
    }

    // ==========================================================================
    // Statements
    // ==========================================================================

    /// Returns whether the block ended in a terminator, in which case the
    /// current block is filled and nothing more may be appended to it.
    fn lower_block(&mut self, stmts: &'ast [Stmt<'ast>]) -> Result<bool, CodegenError> {
        for stmt in stmts {
            if self.lower_stmt(stmt)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Termination follows the analyzer's definite-return facts: a `return`
    /// terminates, an `if` terminates when neither branch reaches the merge,
    /// and a loop never does.
    fn lower_stmt(&mut self, stmt: &'ast Stmt<'ast>) -> Result<bool, CodegenError> {
        match stmt {
            Stmt::Expr(expr) => {
                self.lower_expr(expr)?;
            }
            Stmt::Var(var) => self.lower_var(var)?,
            Stmt::If(s) => return self.lower_if(s),
            Stmt::For(s) => self.lower_for(s)?,
            Stmt::Return(s) => {
                self.lower_return(s)?;
                return Ok(true);
            }
            Stmt::Body(body) => return self.lower_block(body.stmts),
            Stmt::Function(_) | Stmt::Class(_) | Stmt::Import(_) | Stmt::ExternFunction(_) | Stmt::ExternType(_) => {}
        }
        Ok(false)
    }

    fn lower_var(&mut self, var: &'ast VarStmt<'ast>) -> Result<(), CodegenError> {
        let local = self.binding(var.id)?;
        let ty = self.local_type(local);
        let value = match var.init {
            Some(init) => self.lower_as(init, ty)?,
            None => self.zero(value_type(self.registry(), ty)),
        };
        self.builder.def_var(variable(local), value);
        Ok(())
    }

    /// `then`/`else`/merge blocks. A branch that definitely returns needs no
    /// edge to the merge block, and when both do there is no merge block.
    fn lower_if(&mut self, s: &'ast IfStmt<'ast>) -> Result<bool, CodegenError> {
        let condition = self.lower_value(s.condition)?;
        let facts = self.body.branches(s.id);

        let then_block = self.builder.create_block();
        let else_block = s.else_branch.map(|_| self.builder.create_block());
        let merge = facts.needs_merge().then(|| self.builder.create_block());
        let otherwise = else_block
            .or(merge)
            .ok_or_else(|| self.internal("if without else has no merge block"))?;
        self.builder.ins().brif(condition, then_block, &[], otherwise, &[]);

        self.builder.switch_to_block(then_block);
        let terminated = self.lower_stmt(s.then_branch)?;
        self.close_branch(terminated, facts.then_returns, merge)?;

        if let (Some(block), Some(branch)) = (else_block, s.else_branch) {
            self.builder.switch_to_block(block);
            let terminated = self.lower_stmt(branch)?;
            self.close_branch(terminated, facts.else_returns, merge)?;
        }
        match merge {
            Some(merge) => {
                self.builder.switch_to_block(merge);
                Ok(false)
            }
            None => Ok(true),
        }
    }

    /// Jump from a branch that falls through to the merge block.
    fn close_branch(&mut self, terminated: bool, returns: bool, merge: Option<Block>) -> Result<(), CodegenError> {
        if terminated != returns {
            return Err(self.internal("branch termination disagrees with the return analysis"));
        }
        if returns {
            return Ok(());
        }
        let merge = merge.ok_or_else(|| self.internal("branch falls through without a merge block"))?;
        self.builder.ins().jump(merge, &[]);
        Ok(())
    }

    /// `header -> body -> header` with the exit taken when the condition
    /// fails.
    fn lower_for(&mut self, s: &'ast ForStmt<'ast>) -> Result<(), CodegenError> {
        if let Some(init) = s.init {
            self.lower_stmt(init)?;
        }
        let header = self.builder.create_block();
        let body = self.builder.create_block();
        let exit = self.builder.create_block();
        self.builder.ins().jump(header, &[]);

        self.builder.switch_to_block(header);
        let condition = self.lower_value(s.condition)?;
        self.builder.ins().brif(condition, body, &[], exit, &[]);

        self.builder.switch_to_block(body);
        if !self.lower_stmt(s.body)? {
            if let Some(step) = s.step {
                self.lower_expr(step)?;
            }
            self.builder.ins().jump(header, &[]);
        }

        self.builder.switch_to_block(exit);
        Ok(())
    }

    fn lower_return(&mut self, s: &'ast ReturnStmt<'ast>) -> Result<(), CodegenError> {
        match (s.value, self.return_type()) {
            (Some(value), Some(ret)) => {
                let value = self.lower_as(value, ret)?;
                self.builder.ins().return_(&[value]);
            }
            (None, None) => {
                self.builder.ins().return_(&[]);
            }
            _ => return Err(self.internal("return does not match the signature")),
        }
        Ok(())
    }

    // ==========================================================================
    // Expressions
    // ==========================================================================

    pub(super) fn lower_value(&mut self, expr: &'ast Expr<'ast>) -> Result<Value, CodegenError> {
        self.lower_expr(expr)?
            .ok_or_else(|| self.internal("expression produced no value"))
    }

    /// Lower `expr` and convert it to `to`.
    pub(super) fn lower_as(&mut self, expr: &'ast Expr<'ast>, to: TypeId) -> Result<Value, CodegenError> {
        let value = self.lower_value(expr)?;
        let from = self.type_of(expr)?;
        Ok(self.coerce(value, from, to))
    }

    fn lower_expr(&mut self, expr: &'ast Expr<'ast>) -> Result<Option<Value>, CodegenError> {
        let value = match *expr {
            Expr::Literal(lit) => self.lower_literal(lit, expr)?,
            Expr::Identifier(name) => {
                let local = self.binding(name.id)?;
                self.builder.use_var(variable(local))
            }
            Expr::Constant(name) => {
                return Err(self.internal(&format!("type '{}' reached code generation as a value", name.name)));
            }
            Expr::InstanceVariableRef(name) => {
                let receiver = self.receiver()?;
                let field = self.field(name.id)?;
                self.load_field(receiver, field)
            }
            Expr::MemberAccess(member) => {
                let object = self.lower_value(member.object)?;
                let field = self.field(member.id)?;
                self.load_field(object, field)
            }
            Expr::Call(call) => return self.lower_call(call),
            Expr::Assign(assign) => self.lower_assign(assign)?,
            Expr::New(new) => self.lower_new(new)?,
            Expr::NewArray(new) => {
                let element = self.element_type(self.type_of(expr)?)?;
                let int = self.registry().primitive(PrimitiveKind::Int);
                let length = self.lower_as(new.length, int)?;
                let length = self.builder.ins().sextend(types::I64, length);
                let size = i64::from(self.registry().size_of(element));
                let size = self.builder.ins().iconst(types::I64, size);
                self.call_runtime_value(RuntimeFn::ArrayNew, &[length, size])?
            }
            Expr::ArrayAccess(index) => {
                let (address, element) = self.element_address(index)?;
                let ty = value_type(self.registry(), element);
                self.load(ty, address, 0)
            }
            Expr::ArrayLiteral(lit) => self.lower_array_literal(lit, expr)?,
            Expr::Binary(binary) => return self.lower_binary(binary),
            Expr::Unary(unary) => {
                let target = self.call_target(unary.id)?;
                let param = self.param_types(target)?[0];
                let operand = self.lower_as(unary.operand, param)?;
                return self.invoke(target, None, None, &[operand]);
            }
            Expr::Cast(cast) => {
                let value = self.lower_value(cast.expr)?;
                match self.body.call(cast.id) {
                    Some(conversion) => return self.invoke(conversion, None, None, &[value]),
                    None => value,
                }
            }
            Expr::SizeOf(size) => {
                let bytes = self
                    .body
                    .size(size.id)
                    .ok_or_else(|| self.internal("sizeof without a recorded size"))?;
                self.builder.ins().iconst(types::I32, i64::from(bytes))
            }
        };
        Ok(Some(value))
    }

    fn lower_literal(&mut self, lit: &LiteralExpr<'ast>, expr: &'ast Expr<'ast>) -> Result<Value, CodegenError> {
        Ok(match lit.kind {
            LiteralKind::Int(value) => {
                let ty = value_type(self.registry(), self.type_of(expr)?);
                self.builder.ins().iconst(ty, value)
            }
            LiteralKind::Double(value) => self.builder.ins().f64const(value.into_inner()),
            LiteralKind::Bool(value) => self.builder.ins().iconst(types::I8, i64::from(value)),
            LiteralKind::Null => self.builder.ins().iconst(POINTER_TYPE, 0),
            LiteralKind::Str(text) => {
                let data = self.generator.string_literal(text)?;
                self.data_address(data)
            }
        })
    }

    fn lower_call(&mut self, call: &'ast CallExpr<'ast>) -> Result<Option<Value>, CodegenError> {
        let target = self.call_target(call.id)?;
        let has_receiver = self.registry().function(target).has_receiver();
        let (receiver, receiver_ty) = match call.receiver {
            Some(Expr::Constant(_)) => (None, None),
            Some(expr) => (Some(self.lower_value(expr)?), Some(self.type_of(expr)?)),
            None if has_receiver => (Some(self.receiver()?), self.registry().function(self.func).owner),
            None => (None, None),
        };
        let params = self.param_types(target)?;
        let mut args = Vec::with_capacity(call.args.len());
        for (arg, &param) in call.args.iter().zip(params) {
            args.push(self.lower_as(arg, param)?);
        }
        self.invoke(target, receiver, receiver_ty, &args)
    }

    /// Operators call natives: class functions take both operands, `String`
    /// methods take the left operand as receiver.
    fn lower_binary(&mut self, binary: &'ast BinaryExpr<'ast>) -> Result<Option<Value>, CodegenError> {
        let target = self.call_target(binary.id)?;
        let params = self.param_types(target)?;
        if self.registry().function(target).has_receiver() {
            let left = self.lower_value(binary.left)?;
            let right = self.lower_as(binary.right, params[0])?;
            let left_ty = self.type_of(binary.left)?;
            self.invoke(target, Some(left), Some(left_ty), &[right])
        } else {
            let left = self.lower_as(binary.left, params[0])?;
            let right = self.lower_as(binary.right, params[1])?;
            self.invoke(target, None, None, &[left, right])
        }
    }

    /// Call `target`: inline for natives, through the vtable for methods
    /// with overriders, direct otherwise.
    pub(super) fn invoke(
        &mut self,
        target: FuncId,
        receiver: Option<Value>,
        receiver_ty: Option<TypeId>,
        args: &[Value],
    ) -> Result<Option<Value>, CodegenError> {
        let function = self.registry().function(target);
        if let Some(op) = function.native_op() {
            return self.emit_native(op, target, receiver, args);
        }

        let mut call_args = Vec::with_capacity(args.len() + 1);
        if function.has_receiver() {
            call_args.push(receiver.ok_or_else(|| self.internal("method call without a receiver"))?);
        }
        call_args.extend_from_slice(args);

        let inst = if function.has_receiver() && function.is_virtual() {
            let class = receiver_ty.ok_or_else(|| self.internal("virtual call without a receiver type"))?;
            let registry = self.registry();
            let slot = self
                .generator
                .layout(class)
                .slot_of(registry, class, target)
                .ok_or_else(|| self.internal("virtual method has no vtable slot"))?;
            let signature = self.generator.signature_of(target)?;
            let signature = self.builder.import_signature(signature);
            let vtable = self.load(POINTER_TYPE, call_args[0], VTABLE_OFFSET);
            let callee = self.load(POINTER_TYPE, vtable, slot as i32 * WORD);
            self.builder.ins().call_indirect(signature, callee, &call_args)
        } else {
            let id = self.generator.function_ref(target)?;
            let callee = self.generator.backend.module.declare_func_in_func(id, self.builder.func);
            self.builder.ins().call(callee, &call_args)
        };
        Ok(self.builder.inst_results(inst).first().copied())
    }

    fn lower_assign(&mut self, assign: &'ast AssignExpr<'ast>) -> Result<Value, CodegenError> {
        match *assign.target {
            Expr::Identifier(name) => {
                let local = self.binding(name.id)?;
                let value = self.lower_as(assign.value, self.local_type(local))?;
                self.builder.def_var(variable(local), value);
                Ok(value)
            }
            Expr::InstanceVariableRef(name) => {
                let receiver = self.receiver()?;
                let field = self.field(name.id)?;
                let value = self.lower_as(assign.value, field.ty)?;
                self.store(value, receiver, field_offset(field.slot));
                Ok(value)
            }
            Expr::MemberAccess(member) => {
                let object = self.lower_value(member.object)?;
                let field = self.field(member.id)?;
                let value = self.lower_as(assign.value, field.ty)?;
                self.store(value, object, field_offset(field.slot));
                Ok(value)
            }
            Expr::ArrayAccess(index) => {
                let (address, element) = self.element_address(index)?;
                let value = self.lower_as(assign.value, element)?;
                self.store(value, address, 0);
                Ok(value)
            }
            _ => Err(self.internal("invalid assignment target")),
        }
    }

    /// Zero-filled allocation with the header written, then the
    /// constructor.
    fn lower_new(&mut self, new: &'ast NewExpr<'ast>) -> Result<Value, CodegenError> {
        let construction = self
            .body
            .construction(new.id)
            .ok_or_else(|| self.internal("new without a recorded construction"))?;
        let class = construction.class;

        let mut args = Vec::with_capacity(new.args.len());
        if let Some(init) = construction.init {
            let params = self.param_types(init)?;
            for (arg, &param) in new.args.iter().zip(params) {
                args.push(self.lower_as(arg, param)?);
            }
        }

        match self.registry().ty(class) {
            Type::Pointer(_) => {
                let init = construction
                    .init
                    .ok_or_else(|| self.internal("pointer allocation without a size"))?;
                self.invoke(init, None, Some(class), &args)?
                    .ok_or_else(|| self.internal("pointer allocation produced no value"))
            }
            Type::Object(_) => {
                let fields = self.registry().all_fields(class).len();
                let size = self.builder.ins().iconst(types::I64, object_size(fields));
                let object = self.call_runtime_value(RuntimeFn::Alloc, &[size])?;
                if let Some(vtable) = self.generator.vtable(class)? {
                    let address = self.data_address(vtable);
                    self.store(address, object, VTABLE_OFFSET);
                }
                let metadata = self.generator.type_metadata(class)?;
                let address = self.data_address(metadata);
                self.store(address, object, METADATA_OFFSET);

                if let Some(init) = construction.init {
                    self.invoke(init, Some(object), Some(class), &args)?;
                }
                Ok(object)
            }
            _ => Err(self.internal("cannot allocate a non-class type")),
        }
    }

    fn lower_array_literal(
        &mut self,
        lit: &'ast ArrayLiteralExpr<'ast>,
        expr: &'ast Expr<'ast>,
    ) -> Result<Value, CodegenError> {
        let element = self.element_type(self.type_of(expr)?)?;
        let size = self.registry().size_of(element);
        let length = self.builder.ins().iconst(types::I64, lit.elements.len() as i64);
        let size_value = self.builder.ins().iconst(types::I64, i64::from(size));
        let array = self.call_runtime_value(RuntimeFn::ArrayNew, &[length, size_value])?;
        let data = self.load(POINTER_TYPE, array, ARRAY_DATA_OFFSET);
        for (index, item) in lit.elements.iter().enumerate() {
            let value = self.lower_as(item, element)?;
            self.store(value, data, (index as u32 * size) as i32);
        }
        Ok(array)
    }

    /// Address of `array[index]` and the element type.
    fn element_address(&mut self, index: &'ast IndexExpr<'ast>) -> Result<(Value, TypeId), CodegenError> {
        let element = self.element_type(self.type_of(index.array)?)?;
        let array = self.lower_value(index.array)?;
        let int = self.registry().primitive(PrimitiveKind::Int);
        let position = self.lower_as(index.index, int)?;
        let data = self.load(POINTER_TYPE, array, ARRAY_DATA_OFFSET);
        Ok((self.indexed_address(data, position, element), element))
    }

    // ==========================================================================
    // Helpers
    // ==========================================================================

    /// `base + index * sizeof(element)` for an `Int` index.
    pub(super) fn indexed_address(&mut self, base: Value, index: Value, element: TypeId) -> Value {
        let size = i64::from(self.registry().size_of(element));
        let index = self.builder.ins().sextend(types::I64, index);
        let offset = self.builder.ins().imul_imm(index, size);
        self.builder.ins().iadd(base, offset)
    }

    /// Implicit conversion at an assignment, argument or return.
    pub(super) fn coerce(&mut self, value: Value, from: TypeId, to: TypeId) -> Value {
        let registry = self.registry();
        match (registry.primitive_kind(from), registry.primitive_kind(to)) {
            (Some(from), Some(to)) if from != to && from.is_numeric() && to.is_numeric() => {
                self.convert(value, from, to)
            }
            _ => value,
        }
    }

    pub(super) fn call_runtime(&mut self, runtime: RuntimeFn, args: &[Value]) -> Result<Option<Value>, CodegenError> {
        let id = self.generator.backend.runtime(runtime)?;
        let callee = self.generator.backend.module.declare_func_in_func(id, self.builder.func);
        let inst = self.builder.ins().call(callee, args);
        Ok(self.builder.inst_results(inst).first().copied())
    }

    pub(super) fn call_runtime_value(&mut self, runtime: RuntimeFn, args: &[Value]) -> Result<Value, CodegenError> {
        self.call_runtime(runtime, args)?
            .ok_or_else(|| self.internal(&format!("{} returns no value", runtime.symbol())))
    }

    pub(super) fn data_address(&mut self, data: DataId) -> Value {
        let global = self.generator.backend.module.declare_data_in_func(data, self.builder.func);
        self.builder.ins().global_value(POINTER_TYPE, global)
    }

    #[inline]
    pub(super) fn load(&mut self, ty: ClifType, address: Value, offset: i32) -> Value {
        self.builder.ins().load(ty, MemFlags::trusted(), address, offset)
    }

    #[inline]
    pub(super) fn store(&mut self, value: Value, address: Value, offset: i32) {
        self.builder.ins().store(MemFlags::trusted(), value, address, offset);
    }

    fn load_field(&mut self, object: Value, field: FieldRef) -> Value {
        let ty = value_type(self.registry(), field.ty);
        self.load(ty, object, field_offset(field.slot))
    }

    pub(super) fn zero(&mut self, ty: ClifType) -> Value {
        match ty {
            types::F32 => self.builder.ins().f32const(0.0),
            types::F64 => self.builder.ins().f64const(0.0),
            _ => self.builder.ins().iconst(ty, 0),
        }
    }

    fn receiver(&mut self) -> Result<Value, CodegenError> {
        let local = self
            .body
            .receiver()
            .ok_or_else(|| self.internal("'self' used outside of a method"))?;
        Ok(self.builder.use_var(variable(local)))
    }

    pub(super) fn type_of(&self, expr: &Expr<'_>) -> Result<TypeId, CodegenError> {
        self.body
            .type_of(expr.id())
            .ok_or_else(|| self.internal(&format!("expression {:?} has no recorded type", expr.id())))
    }

    pub(super) fn element_type(&self, ty: TypeId) -> Result<TypeId, CodegenError> {
        match *self.registry().ty(ty) {
            Type::Array(element) | Type::Pointer(element) => Ok(element),
            _ => Err(self.internal(&format!("'{}' has no elements", self.registry().name(ty)))),
        }
    }

    fn call_target(&self, node: quill_parser::ast::NodeId) -> Result<FuncId, CodegenError> {
        self.body
            .call(node)
            .ok_or_else(|| self.internal(&format!("call {node:?} was not resolved")))
    }

    pub(super) fn param_types(&self, func: FuncId) -> Result<&'c [TypeId], CodegenError> {
        self.registry()
            .function(func)
            .signature
            .as_ref()
            .map(|signature| signature.params.as_slice())
            .ok_or_else(|| self.internal("call target has no resolved prototype"))
    }

    fn binding(&self, node: quill_parser::ast::NodeId) -> Result<LocalId, CodegenError> {
        self.body
            .binding(node)
            .ok_or_else(|| self.internal(&format!("variable {node:?} is unbound")))
    }

    fn field(&self, node: quill_parser::ast::NodeId) -> Result<FieldRef, CodegenError> {
        self.body
            .field(node)
            .ok_or_else(|| self.internal(&format!("field {node:?} has no slot")))
    }

    fn local_type(&self, local: LocalId) -> TypeId {
        self.body.locals()[local.index()].ty
    }

    pub(super) fn internal(&self, message: &str) -> CodegenError {
        CodegenError::internal(format!("{}: {message}", self.registry().canonical_name(self.func)))
    }
}

#[inline]
fn variable(local: LocalId) -> Variable {
    Variable::from_u32(local.0)
}
