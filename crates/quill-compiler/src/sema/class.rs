//! Class registration and member attachment.

use quill_core::{QuillResult, SemanticError, Span};
use quill_parser::ast::{ClassDecl, FunctionDecl, Stmt};
use quill_registry::{ExternalType, Field, FuncId, FunctionFlags, ObjectType, Substitution, Type, TypeId};
use tracing::debug;

use super::{Analyzer, SourceFile, script_function};

impl<'c, 'ast> Analyzer<'c, 'ast> {
    /// Register a shell for every class and extern type of `file`.
    ///
    /// A class declared again (in the same or another file) reopens the
    /// existing shell; its members are attached together.
    pub(super) fn declare_types(&mut self, file: &SourceFile<'ast>) -> QuillResult<()> {
        for stmt in file.stmts {
            match stmt {
                Stmt::Class(decl) => self.declare_class(decl)?,
                Stmt::ExternType(decl) => {
                    let external = Type::External(ExternalType {
                        declared_at: vec![decl.span],
                    });
                    self.registry_mut().register(decl.name, external, decl.span)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn declare_class(&mut self, decl: &'ast ClassDecl<'ast>) -> QuillResult<()> {
        let generic_params: Vec<String> = decl.generic_params.iter().map(|p| p.to_string()).collect();
        let shell = Type::Object(ObjectType {
            generic_params: generic_params.clone(),
            ..ObjectType::default()
        });
        let id = self.registry_mut().register(decl.name, shell, decl.span)?;
        let Some(object) = self.registry_mut().object_mut(id) else {
            return Ok(());
        };
        if object.generic_params != generic_params {
            return Err(SemanticError::mismatch(
                format!("class '{}' redeclared with different generic parameters", decl.name),
                decl.span,
            )
            .into());
        }
        object.decls.push(decl);
        Ok(())
    }

    pub(super) fn attach_classes(&mut self, file: &SourceFile<'ast>) -> QuillResult<()> {
        for stmt in file.stmts {
            if let Stmt::Class(decl) = stmt {
                let Some(id) = self.registry().lookup(decl.name) else {
                    continue;
                };
                let is_template = self.registry().object(id).is_some_and(ObjectType::is_template);
                if !is_template {
                    self.attach_class(id)?;
                }
            }
        }
        Ok(())
    }

    /// Attach the superclass, fields and methods of `class`.
    ///
    /// The superclass is attached first, so override detection sees every
    /// inherited method. Classes without an explicit superclass extend
    /// `Object`.
    pub(super) fn attach_class(&mut self, class: TypeId) -> QuillResult<()> {
        if !self.attached.insert(class) {
            return Ok(());
        }
        let Some(object) = self.registry().object(class) else {
            return Ok(());
        };
        let decls = object.decls.clone();
        let subst = object.substitution.clone();
        let root = self.registry().builtins().object;
        if class == root && decls.iter().all(|decl| decl.superclass.is_none()) {
            return self.attach_members(class, &decls, &subst);
        }

        let mut explicit: Option<(TypeId, Span)> = None;
        for decl in &decls {
            let Some(written) = decl.superclass else {
                continue;
            };
            let parent = self.resolve_type(written.name, &subst, written.span)?;
            match explicit {
                Some((earlier, _)) if earlier != parent => {
                    return Err(SemanticError::mismatch(
                        format!(
                            "class '{}' already extends '{}'",
                            self.registry().name(class),
                            self.registry().name(earlier)
                        ),
                        written.span,
                    )
                    .into());
                }
                _ => explicit = Some((parent, written.span)),
            }
        }
        let (parent, span) = explicit.unwrap_or((root, Span::default()));
        if parent != class {
            self.attach_class(parent)?;
        }
        self.registry_mut().set_superclass(class, parent, span)?;
        self.attach_members(class, &decls, &subst)
    }

    fn attach_members(
        &mut self,
        class: TypeId,
        decls: &[&'ast ClassDecl<'ast>],
        subst: &Substitution,
    ) -> QuillResult<()> {
        for decl in decls {
            for field in decl.fields {
                let ty = self.resolve_type(field.ty.name, subst, field.ty.span)?;
                self.registry_mut().add_field(
                    class,
                    Field {
                        name: field.name.to_string(),
                        ty,
                        span: field.span,
                    },
                )?;
            }
        }

        let mut methods = 0;
        for decl in decls {
            for method in decl.methods {
                self.attach_method(class, method, subst)?;
                methods += 1;
            }
        }
        debug!(
            class = self.registry().name(class),
            fields = self.registry().all_fields(class).len(),
            methods,
            "attached class"
        );
        Ok(())
    }

    fn attach_method(
        &mut self,
        class: TypeId,
        decl: &'ast FunctionDecl<'ast>,
        subst: &Substitution,
    ) -> QuillResult<FuncId> {
        let is_constructor = decl.name == "init" && !decl.is_static;
        if is_constructor && decl.return_type.is_some() {
            return Err(SemanticError::mismatch("constructor 'init' cannot declare a return type", decl.span).into());
        }
        let mut flags = FunctionFlags::empty();
        if decl.is_static {
            flags |= FunctionFlags::STATIC;
        }
        if is_constructor {
            flags |= FunctionFlags::CONSTRUCTOR;
        }

        let info = self.registry().get(class);
        let scope = if decl.is_static { info.statics } else { info.methods };
        let function = script_function(decl, Some(class), flags, subst.clone());
        let id = self.add_to_scope(function, scope)?;

        let overridden = self.registry_mut().register_overrides(id);
        if overridden.iter().any(|&base| self.ctx.is_demanded(base)) {
            self.demand(id);
        }
        Ok(id)
    }

    /// Create a generic instantiation and attach the template's members
    /// under the instance's substitution.
    pub(super) fn instantiate(&mut self, template: TypeId, args: Vec<TypeId>, name: &str) -> QuillResult<TypeId> {
        let decls = self
            .registry()
            .object(template)
            .map(|object| object.decls.clone())
            .unwrap_or_default();
        let instance = self.registry_mut().create_instance(template, args, name);
        if let Some(object) = self.registry_mut().object_mut(instance) {
            object.decls = decls;
        }
        self.attach_class(instance)?;
        Ok(instance)
    }
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;
    use quill_core::QuillError;
    use quill_parser::Parser;

    use crate::context::CompilationContext;
    use crate::sema::{Analyzer, SourceFile};

    fn analyze(source: &str) -> Result<CompilationContext<'static>, QuillError> {
        let arena: &'static Bump = Box::leak(Box::new(Bump::new()));
        let script = Parser::parse(source, arena)?;
        let mut ctx = CompilationContext::new();
        Analyzer::new(&mut ctx).analyze(
            &[],
            SourceFile {
                path: "main.ql",
                stmts: script.stmts(),
            },
        )?;
        Ok(ctx)
    }

    #[test]
    fn fields_are_inherited_in_order() {
        let ctx = analyze("class A { var x: Int }  class B < A { var y: Long }").unwrap();
        let registry = ctx.registry();
        let b = registry.lookup("B").unwrap();
        let names: Vec<&str> = registry.all_fields(b).iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["x", "y"]);
    }

    #[test]
    fn subclass_declared_before_parent() {
        let ctx = analyze("class Dog < Animal { def speak() -> Int { return 2 } }  class Animal { def speak() -> Int { return 1 } }").unwrap();
        let registry = ctx.registry();
        let (animal, dog) = (registry.lookup("Animal").unwrap(), registry.lookup("Dog").unwrap());
        assert_eq!(registry.superclass(dog), Some(animal));
        let base = registry.method_candidates(animal, "speak")[0];
        assert!(registry.function(base).is_virtual());
        let overrider = registry.method_candidates(dog, "speak")[0];
        assert_eq!(registry.resolve_override(base, dog), overrider);
    }

    #[test]
    fn reopened_class_merges_members() {
        let ctx = analyze("class P { var a: Int }  class P { var b: Int }").unwrap();
        let registry = ctx.registry();
        let p = registry.lookup("P").unwrap();
        assert_eq!(registry.all_fields(p).len(), 2);
    }

    #[test]
    fn cyclic_inheritance_fails() {
        let err = analyze("class A < B {}  class B < A {}").unwrap_err();
        assert!(err.to_string().contains("cyclic inheritance"), "{err}");
    }

    #[test]
    fn conflicting_superclass_fails() {
        let err = analyze("class A {}  class B {}  class C < A {}  class C < B {}").unwrap_err();
        assert!(err.to_string().contains("already extends"), "{err}");
    }

    #[test]
    fn duplicate_field_fails() {
        let err = analyze("class A { var x: Int }  class B < A { var x: Int }").unwrap_err();
        assert!(matches!(
            err.as_semantic(),
            Some(quill_core::SemanticError::RedefinitionError { name, .. }) if name == "@x"
        ));
    }

    #[test]
    fn constructor_with_return_type_fails() {
        let err = analyze("class A { def init() -> Int { return 1 } }").unwrap_err();
        assert!(err.to_string().contains("constructor"), "{err}");
    }

    #[test]
    fn generic_instances_are_memoized() {
        let ctx = analyze(
            "class List<T> { var items: T[] }\n\
             var a = new List<Int>\n\
             var b = new List<Int>\n\
             var c = new List<Long>",
        )
        .unwrap();
        let registry = ctx.registry();
        assert_eq!(registry.instance_count(), 2);
        let list_int = registry.lookup("List<Int>").unwrap();
        let int_array = registry.lookup("Int[]").unwrap();
        assert_eq!(registry.field_slot(list_int, "items"), Some((0, int_array)));
    }
}
