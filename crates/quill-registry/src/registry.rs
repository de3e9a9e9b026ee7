//! The type registry.
//!
//! [`Registry`] owns every type, every function overload and the function
//! scopes of one compilation unit. Types are interned by their canonical
//! rendered name, so two references to `Box<Int>` always produce the same
//! [`TypeId`].
//!
//! # Storage Model
//!
//! - **Types**: a dense `Vec<TypeInfo>` indexed by [`TypeId`], plus a name index
//! - **Functions**: a dense `Vec<Function>` indexed by [`FuncId`]; scopes hold
//!   ids only
//! - **Derived types**: arrays, pointers and generic instances are memoized
//!   so each is created once
//!
//! # Example
//!
//! ```
//! use quill_core::{PrimitiveKind, Span};
//! use quill_registry::Registry;
//!
//! let mut registry = Registry::new();
//! let int = registry.primitive(PrimitiveKind::Int);
//! let double = registry.primitive(PrimitiveKind::Double);
//!
//! assert_eq!(registry.castable(int, double), Some(3));
//! assert_eq!(registry.castable(double, int), None);
//! assert_eq!(registry.array_of(int), registry.array_of(int));
//! ```

use quill_core::{PrimitiveKind, SemanticError, Span, TypeHash};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::builtins::{self, Builtins};
use crate::function::{Function, FunctionBody, FunctionFlags};
use crate::hierarchy::ClassGraph;
use crate::instance_cache::InstanceCache;
use crate::scope::ScopeArena;
use crate::type_name::render_instance;
use crate::types::{Field, ObjectType, Substitution, Type, TypeInfo};
use crate::{FuncId, ScopeId, TypeId};

/// Rendered name of a type id that does not exist.
const UNKNOWN: &str = "<unknown>";

/// Outcome of resolving `Base<Args>`.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Already registered (memoized instance or a pointer type).
    Found(TypeId),
    /// The template has not been instantiated with these arguments yet.
    ///
    /// The caller creates the shell with [`Registry::create_instance`] and
    /// then attaches the template's members under the substitution.
    NeedsInstance {
        template: TypeId,
        args: Vec<TypeId>,
        name: String,
    },
}

/// Types, functions and scopes of one compilation unit.
#[derive(Debug)]
pub struct Registry<'ast> {
    types: Vec<TypeInfo<'ast>>,
    by_name: FxHashMap<String, TypeId>,

    functions: Vec<Function<'ast>>,
    scopes: ScopeArena,
    /// Free functions of every file in the unit.
    module_scope: ScopeId,

    arrays: FxHashMap<TypeId, TypeId>,
    pointers: FxHashMap<TypeId, TypeId>,
    instances: InstanceCache,
    classes: ClassGraph,

    pub(crate) builtins: Builtins,
}

impl Default for Registry<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'ast> Registry<'ast> {
    /// Create a registry pre-seeded with the builtin types and natives.
    pub fn new() -> Self {
        let mut scopes = ScopeArena::new();
        let module_scope = scopes.create(None);
        let mut registry = Registry {
            types: Vec::new(),
            by_name: FxHashMap::default(),
            functions: Vec::new(),
            scopes,
            module_scope,
            arrays: FxHashMap::default(),
            pointers: FxHashMap::default(),
            instances: InstanceCache::new(),
            classes: ClassGraph::new(),
            builtins: Builtins::placeholder(),
        };
        builtins::install(&mut registry);
        registry
    }

    // ==========================================================================
    // Types
    // ==========================================================================

    /// Add a type under `name` without checking for an existing binding.
    pub(crate) fn intern(&mut self, name: &str, ty: Type<'ast>) -> TypeId {
        let id = TypeId::new(self.types.len() as u32);
        let methods = self.scopes.create(None);
        let statics = self.scopes.create(None);
        self.types.push(TypeInfo {
            name: name.to_string(),
            ty,
            methods,
            statics,
            hash: TypeHash::from_name(name),
        });
        self.by_name.insert(name.to_string(), id);
        trace!(name, ?id, "interned type");
        id
    }

    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    /// Create-or-retrieve `name`.
    ///
    /// Registering a name again with the same kind returns the existing id;
    /// for `extern type` the new declaration location is recorded. A
    /// different kind is a [`SemanticError::RedefinitionError`].
    pub fn register(&mut self, name: &str, ty: Type<'ast>, span: Span) -> Result<TypeId, SemanticError> {
        let Some(existing) = self.lookup(name) else {
            return Ok(self.intern(name, ty));
        };
        let info = &mut self.types[existing.index()];
        if !info.ty.same_kind(&ty) {
            return Err(SemanticError::RedefinitionError {
                name: format!("{name} (already a {})", info.ty.kind_name()),
                span,
            });
        }
        if let (Type::External(current), Type::External(added)) = (&mut info.ty, ty) {
            current.declared_at.extend(added.declared_at);
        }
        Ok(existing)
    }

    #[inline]
    pub fn get(&self, id: TypeId) -> &TypeInfo<'ast> {
        &self.types[id.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, id: TypeId) -> &mut TypeInfo<'ast> {
        &mut self.types[id.index()]
    }

    #[inline]
    pub fn ty(&self, id: TypeId) -> &Type<'ast> {
        &self.types[id.index()].ty
    }

    /// Canonical name of `id`, `<unknown>` if it is not registered.
    pub fn name(&self, id: TypeId) -> &str {
        self.types.get(id.index()).map_or(UNKNOWN, |info| info.name.as_str())
    }

    /// Render an optional type for diagnostics; `None` is `void`.
    pub fn render(&self, id: Option<TypeId>) -> String {
        id.map_or_else(|| "void".to_string(), |id| self.name(id).to_string())
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn primitive(&self, kind: PrimitiveKind) -> TypeId {
        self.builtins.primitives[u8::from(kind) as usize]
    }

    pub fn primitive_kind(&self, id: TypeId) -> Option<PrimitiveKind> {
        self.ty(id).as_primitive()
    }

    pub fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    pub fn object(&self, id: TypeId) -> Option<&ObjectType<'ast>> {
        self.ty(id).as_object()
    }

    pub fn object_mut(&mut self, id: TypeId) -> Option<&mut ObjectType<'ast>> {
        match &mut self.types[id.index()].ty {
            Type::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Whether values of `id` are a pointer word.
    pub fn is_reference(&self, id: TypeId) -> bool {
        self.ty(id).is_reference()
    }

    pub fn is_null(&self, id: TypeId) -> bool {
        self.primitive_kind(id) == Some(PrimitiveKind::Null)
    }

    /// Storage width of a value of `id` in bytes.
    pub fn size_of(&self, id: TypeId) -> u32 {
        match self.ty(id) {
            Type::Primitive(kind) => kind.byte_width(),
            _ => 8,
        }
    }

    // ==========================================================================
    // Derived types
    // ==========================================================================

    /// `element[]`, created with its native methods on first use.
    pub fn array_of(&mut self, element: TypeId) -> TypeId {
        if let Some(&array) = self.arrays.get(&element) {
            return array;
        }
        let name = format!("{}[]", self.name(element));
        let array = self.intern(&name, Type::Array(element));
        self.arrays.insert(element, array);
        builtins::install_array_natives(self, array, element);
        array
    }

    /// `Pointer<pointee>`, created with its native methods on first use.
    pub fn pointer_of(&mut self, pointee: TypeId) -> TypeId {
        if let Some(&pointer) = self.pointers.get(&pointee) {
            return pointer;
        }
        let name = render_instance("Pointer", &[self.name(pointee)]);
        let pointer = self.intern(&name, Type::Pointer(pointee));
        self.pointers.insert(pointee, pointer);
        builtins::install_pointer_natives(self, pointer, pointee);
        pointer
    }

    /// Resolve a type name written without arguments.
    pub fn resolve_simple(&self, name: &str, span: Span) -> Result<TypeId, SemanticError> {
        let id = self
            .lookup(name)
            .ok_or_else(|| SemanticError::undefined("type", name, span))?;
        if self.object(id).is_some_and(ObjectType::is_template) {
            return Err(SemanticError::mismatch(
                format!("generic type '{name}' requires type arguments"),
                span,
            ));
        }
        Ok(id)
    }

    /// Resolve `base<args>` where every argument is already resolved.
    pub fn resolve_generic(&mut self, base: &str, args: &[TypeId], span: Span) -> Result<Resolution, SemanticError> {
        let Some(template) = self.lookup(base) else {
            return Err(SemanticError::undefined("type", base, span));
        };

        if template == self.builtins.pointer {
            let [pointee] = args else {
                return Err(SemanticError::mismatch("Pointer expects 1 type argument", span));
            };
            return Ok(Resolution::Found(self.pointer_of(*pointee)));
        }

        let arity = self.object(template).map_or(0, |object| object.generic_params.len());
        if arity == 0 {
            return Err(SemanticError::mismatch(format!("type '{base}' is not generic"), span));
        }
        if arity != args.len() {
            return Err(SemanticError::mismatch(
                format!("'{base}' expects {arity} type arguments, found {}", args.len()),
                span,
            ));
        }

        if let Some(instance) = self.instances.get(template, args) {
            return Ok(Resolution::Found(instance));
        }
        let names: Vec<&str> = args.iter().map(|&arg| self.name(arg)).collect();
        Ok(Resolution::NeedsInstance {
            template,
            args: args.to_vec(),
            name: render_instance(base, &names),
        })
    }

    /// Create and memoize the shell of a generic instantiation.
    pub fn create_instance(&mut self, template: TypeId, args: Vec<TypeId>, name: &str) -> TypeId {
        let substitution: Substitution = self
            .object(template)
            .map(|object| object.generic_params.iter().cloned().zip(args.iter().copied()).collect())
            .unwrap_or_default();
        let instance = self.intern(
            name,
            Type::Object(ObjectType {
                generic_args: args.clone(),
                template: Some(template),
                substitution,
                ..ObjectType::default()
            }),
        );
        self.instances.insert(template, args, instance);
        debug!(name, ?template, ?instance, "instantiated generic type");
        instance
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    // ==========================================================================
    // Inheritance
    // ==========================================================================

    /// Make `superclass` the parent of `class`.
    ///
    /// Fails on a non-class parent, on a cycle, and on a class that already
    /// extends a different explicit superclass.
    pub fn set_superclass(&mut self, class: TypeId, superclass: TypeId, span: Span) -> Result<(), SemanticError> {
        let Some(parent) = self.object(superclass) else {
            return Err(SemanticError::mismatch(
                format!("superclass '{}' is not a class", self.name(superclass)),
                span,
            ));
        };
        if parent.is_template() {
            return Err(SemanticError::mismatch(
                format!("generic type '{}' requires type arguments", self.name(superclass)),
                span,
            ));
        }

        let current = self.superclass(class);
        if current == Some(superclass) {
            return Ok(());
        }
        if let Some(current) = current.filter(|&current| current != self.builtins.object) {
            return Err(SemanticError::mismatch(
                format!(
                    "class '{}' already extends '{}'",
                    self.name(class),
                    self.name(current)
                ),
                span,
            ));
        }
        if self.classes.would_cycle(class, superclass) {
            return Err(SemanticError::mismatch(
                format!(
                    "cyclic inheritance between '{}' and '{}'",
                    self.name(class),
                    self.name(superclass)
                ),
                span,
            ));
        }

        self.link_class(class, superclass);
        debug!(class = self.name(class), superclass = self.name(superclass), "linked class");
        Ok(())
    }

    /// Record the link and chain the method and static scopes.
    pub(crate) fn link_class(&mut self, class: TypeId, superclass: TypeId) {
        if !self.classes.link(class, superclass) {
            return;
        }
        let (methods, statics) = (self.get(superclass).methods, self.get(superclass).statics);
        let info = &self.types[class.index()];
        let (own_methods, own_statics) = (info.methods, info.statics);
        self.scopes.set_parent(own_methods, Some(methods));
        self.scopes.set_parent(own_statics, Some(statics));
        if let Some(object) = self.object_mut(class) {
            object.superclass = Some(superclass);
        }
    }

    pub fn superclass(&self, class: TypeId) -> Option<TypeId> {
        self.object(class).and_then(|object| object.superclass)
    }

    /// `class` followed by its ancestors, nearest first.
    pub fn chain(&self, class: TypeId) -> Vec<TypeId> {
        let mut chain = vec![class];
        let mut current = self.superclass(class);
        while let Some(parent) = current {
            chain.push(parent);
            current = self.superclass(parent);
        }
        chain
    }

    pub fn subclasses(&self, class: TypeId) -> Vec<TypeId> {
        self.classes.subclasses(class).collect()
    }

    // ==========================================================================
    // Fields
    // ==========================================================================

    /// Append an instance variable to `class`.
    pub fn add_field(&mut self, class: TypeId, field: Field) -> Result<(), SemanticError> {
        if self.field_slot(class, &field.name).is_some() {
            return Err(SemanticError::RedefinitionError {
                name: format!("@{}", field.name),
                span: field.span,
            });
        }
        if let Some(object) = self.object_mut(class) {
            object.fields.push(field);
        }
        Ok(())
    }

    /// Every instance variable of `class`, superclass fields first.
    pub fn all_fields(&self, class: TypeId) -> Vec<&Field> {
        let mut chain = self.chain(class);
        chain.reverse();
        chain
            .into_iter()
            .filter_map(|id| self.object(id))
            .flat_map(|object| object.fields.iter())
            .collect()
    }

    /// Index of `name` in [`all_fields`](Self::all_fields) and its type.
    pub fn field_slot(&self, class: TypeId, name: &str) -> Option<(usize, TypeId)> {
        self.all_fields(class)
            .iter()
            .enumerate()
            .find(|(_, field)| field.name == name)
            .map(|(slot, field)| (slot, field.ty))
    }

    // ==========================================================================
    // Functions
    // ==========================================================================

    pub fn add_function(&mut self, function: Function<'ast>) -> FuncId {
        let id = FuncId::new(self.functions.len() as u32);
        self.functions.push(function);
        id
    }

    #[inline]
    pub fn function(&self, id: FuncId) -> &Function<'ast> {
        &self.functions[id.index()]
    }

    #[inline]
    pub fn function_mut(&mut self, id: FuncId) -> &mut Function<'ast> {
        &mut self.functions[id.index()]
    }

    pub fn functions(&self) -> impl Iterator<Item = (FuncId, &Function<'ast>)> {
        self.functions
            .iter()
            .enumerate()
            .map(|(i, function)| (FuncId::new(i as u32), function))
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    pub fn scopes(&self) -> &ScopeArena {
        &self.scopes
    }

    pub fn scopes_mut(&mut self) -> &mut ScopeArena {
        &mut self.scopes
    }

    pub fn module_scope(&self) -> ScopeId {
        self.module_scope
    }

    /// Backend symbol of a function.
    ///
    /// `Owner.name(P1,P2)` for class functions, `name(P1,P2)` for free
    /// functions and the plain name for `extern` functions and the entry.
    pub fn canonical_name(&self, id: FuncId) -> String {
        let function = self.function(id);
        if function.flags.intersects(FunctionFlags::EXTERN | FunctionFlags::ENTRY) {
            return function.name.clone();
        }
        let params = match &function.signature {
            Some(signature) => signature
                .params
                .iter()
                .map(|&param| self.name(param))
                .collect::<Vec<_>>()
                .join(","),
            None => UNKNOWN.to_string(),
        };
        match function.owner {
            Some(owner) => format!("{}.{}({params})", self.name(owner), function.name),
            None => format!("{}({params})", function.name),
        }
    }

    /// Overloads of `name` callable on a value of `receiver`.
    ///
    /// Collected along the inheritance chain, nearest class first. An
    /// ancestor's script method with the same written signature as a nearer
    /// candidate is overridden and therefore hidden.
    pub fn method_candidates(&self, receiver: TypeId, name: &str) -> Vec<FuncId> {
        self.chain_candidates(self.get(receiver).methods, name)
            .into_iter()
            .filter(|&id| !self.function(id).flags.contains(FunctionFlags::CONSTRUCTOR))
            .collect()
    }

    /// Class functions (and native operators) of `owner` named `name`.
    pub fn static_candidates(&self, owner: TypeId, name: &str) -> Vec<FuncId> {
        self.chain_candidates(self.get(owner).statics, name)
    }

    /// Free functions named `name`.
    pub fn global_candidates(&self, name: &str) -> Vec<FuncId> {
        self.scopes.lookup_local(self.module_scope, name).to_vec()
    }

    /// The `init` overloads declared by `class` itself.
    pub fn constructors(&self, class: TypeId) -> Vec<FuncId> {
        self.scopes
            .lookup_local(self.get(class).methods, "init")
            .iter()
            .copied()
            .filter(|&id| self.function(id).flags.contains(FunctionFlags::CONSTRUCTOR))
            .collect()
    }

    fn chain_candidates(&self, scope: ScopeId, name: &str) -> Vec<FuncId> {
        let mut found: Vec<FuncId> = Vec::new();
        for level in self.scopes.lookup_chain(scope, name) {
            let nearer = found.len();
            for &candidate in level {
                let function = self.function(candidate);
                let hidden = matches!(function.body, FunctionBody::Script(_))
                    && found[..nearer]
                        .iter()
                        .any(|&seen| self.function(seen).same_declared_signature(function));
                if !hidden {
                    found.push(candidate);
                }
            }
        }
        found
    }

    /// Register `func` as an overrider in every ancestor method it overrides.
    ///
    /// Returns the overridden functions.
    pub fn register_overrides(&mut self, func: FuncId) -> Vec<FuncId> {
        let function = self.function(func);
        let Some(owner) = function.owner else {
            return Vec::new();
        };
        if function
            .flags
            .intersects(FunctionFlags::STATIC | FunctionFlags::CONSTRUCTOR)
        {
            return Vec::new();
        }

        let mut overridden = Vec::new();
        for ancestor in self.chain(owner).into_iter().skip(1) {
            let methods = self.get(ancestor).methods;
            for &candidate in self.scopes.lookup_local(methods, &function.name) {
                let other = self.function(candidate);
                if matches!(other.body, FunctionBody::Script(_))
                    && !other.flags.contains(FunctionFlags::CONSTRUCTOR)
                    && other.same_declared_signature(function)
                {
                    overridden.push(candidate);
                }
            }
        }
        for &base in &overridden {
            self.function_mut(base).overriders.insert(owner, func);
        }
        if !overridden.is_empty() {
            debug!(
                method = %self.canonical_name(func),
                overrides = overridden.len(),
                "registered override"
            );
        }
        overridden
    }

    /// The function that runs for `func` on an object of dynamic type `class`.
    pub fn resolve_override(&self, func: FuncId, class: TypeId) -> FuncId {
        let overriders = &self.function(func).overriders;
        self.chain(class)
            .into_iter()
            .find_map(|ancestor| overriders.get(&ancestor).copied())
            .unwrap_or(func)
    }

    // ==========================================================================
    // Type relations
    // ==========================================================================

    /// Implicit conversion cost from `from` to `to`.
    ///
    /// Identity costs 0, each inheritance hop 1, numeric widening the rank
    /// difference and `null` to a reference 1. `None` means not castable.
    pub fn castable(&self, from: TypeId, to: TypeId) -> Option<u32> {
        if from == to {
            return Some(0);
        }
        match (self.ty(from), self.ty(to)) {
            (Type::Primitive(PrimitiveKind::Null), target) => target.is_reference().then_some(1),
            (Type::Primitive(a), Type::Primitive(b)) => a.widening_distance(*b),
            (Type::Object(_), Type::Object(_)) => self
                .chain(from)
                .iter()
                .position(|&ancestor| ancestor == to)
                .map(|hops| hops as u32),
            _ => None,
        }
    }

    /// Nearest type every element of `types` is castable to.
    ///
    /// Candidates are taken from the first non-null element: its
    /// inheritance chain for classes, itself and every wider type for
    /// numerics. `null` elements only constrain the result to a reference.
    pub fn common_ancestor(&self, types: &[TypeId]) -> Option<TypeId> {
        let first = types.iter().copied().find(|&ty| !self.is_null(ty))?;
        self.widening_chain(first)
            .into_iter()
            .find(|&candidate| types.iter().all(|&ty| self.castable(ty, candidate).is_some()))
    }

    fn widening_chain(&self, ty: TypeId) -> Vec<TypeId> {
        match self.ty(ty) {
            Type::Primitive(kind) if kind.is_numeric() => PrimitiveKind::NUMERIC
                .into_iter()
                .filter(|other| other >= kind)
                .map(|other| self.primitive(other))
                .collect(),
            Type::Object(_) => self.chain(ty),
            _ => vec![ty],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ExternalType;

    fn class<'a>(registry: &mut Registry<'a>, name: &str, superclass: Option<TypeId>) -> TypeId {
        let id = registry
            .register(name, Type::Object(ObjectType::default()), Span::default())
            .unwrap();
        let parent = superclass.unwrap_or(registry.builtins().object);
        registry.set_superclass(id, parent, Span::default()).unwrap();
        id
    }

    #[test]
    fn builtins_are_seeded() {
        let registry = Registry::new();
        for name in ["Bool", "Char", "Short", "Int", "Long", "Float", "Double", "Object", "String", "Pointer"] {
            assert!(registry.lookup(name).is_some(), "missing {name}");
        }
        let string = registry.builtins().string;
        assert_eq!(registry.superclass(string), Some(registry.builtins().object));
        assert_eq!(registry.all_fields(string)[0].name, "data");
    }

    #[test]
    fn castable_counts_hops() {
        let mut registry = Registry::new();
        let animal = class(&mut registry, "Animal", None);
        let dog = class(&mut registry, "Dog", Some(animal));
        let puppy = class(&mut registry, "Puppy", Some(dog));
        let object = registry.builtins().object;

        assert_eq!(registry.castable(dog, animal), Some(1));
        assert_eq!(registry.castable(puppy, animal), Some(2));
        assert_eq!(registry.castable(puppy, object), Some(3));
        assert_eq!(registry.castable(animal, dog), None);
        assert_eq!(registry.castable(dog, dog), Some(0));
    }

    #[test]
    fn castable_numeric_and_null() {
        let mut registry = Registry::new();
        let animal = class(&mut registry, "Animal", None);
        let int = registry.primitive(PrimitiveKind::Int);
        let long = registry.primitive(PrimitiveKind::Long);
        let null = registry.primitive(PrimitiveKind::Null);
        let string = registry.builtins().string;

        assert_eq!(registry.castable(int, long), Some(1));
        assert_eq!(registry.castable(long, int), None);
        assert_eq!(registry.castable(null, animal), Some(1));
        assert_eq!(registry.castable(null, string), Some(1));
        assert_eq!(registry.castable(null, int), None);
        assert_eq!(registry.castable(int, string), None);
    }

    #[test]
    fn register_is_create_or_retrieve() {
        let mut registry = Registry::new();
        let first = class(&mut registry, "Shape", None);
        let again = registry
            .register("Shape", Type::Object(ObjectType::default()), Span::default())
            .unwrap();
        assert_eq!(first, again);

        let err = registry
            .register("Int", Type::Object(ObjectType::default()), Span::new(4, 1, 3))
            .unwrap_err();
        assert!(matches!(err, SemanticError::RedefinitionError { .. }));
        assert_eq!(err.span(), Span::new(4, 1, 3));
    }

    #[test]
    fn extern_types_collect_declarations() {
        let mut registry = Registry::new();
        let decl = |line| {
            Type::External(ExternalType {
                declared_at: vec![Span::new(line, 1, 4)],
            })
        };
        let file = registry.register("FILE", decl(1), Span::new(1, 1, 4)).unwrap();
        registry.register("FILE", decl(7), Span::new(7, 1, 4)).unwrap();
        let Type::External(external) = registry.ty(file) else {
            panic!("expected extern type");
        };
        assert_eq!(external.declared_at.len(), 2);
    }

    #[test]
    fn cyclic_inheritance_is_rejected() {
        let mut registry = Registry::new();
        let a = class(&mut registry, "A", None);
        let b = class(&mut registry, "B", Some(a));
        let err = registry.set_superclass(a, b, Span::new(2, 1, 1)).unwrap_err();
        assert!(err.to_string().contains("cyclic inheritance"));
    }

    #[test]
    fn generic_instances_are_memoized() {
        let mut registry = Registry::new();
        let list = registry
            .register(
                "List",
                Type::Object(ObjectType {
                    generic_params: vec!["T".into()],
                    ..ObjectType::default()
                }),
                Span::default(),
            )
            .unwrap();
        let int = registry.primitive(PrimitiveKind::Int);

        let Resolution::NeedsInstance { template, args, name } =
            registry.resolve_generic("List", &[int], Span::default()).unwrap()
        else {
            panic!("expected a new instance");
        };
        assert_eq!(template, list);
        assert_eq!(name, "List<Int>");
        let instance = registry.create_instance(template, args, &name);

        assert_eq!(
            registry.resolve_generic("List", &[int], Span::default()).unwrap(),
            Resolution::Found(instance)
        );
        assert_eq!(registry.lookup("List<Int>"), Some(instance));
        assert_eq!(registry.object(instance).unwrap().substitution["T"], int);
        assert_eq!(registry.instance_count(), 1);
    }

    #[test]
    fn generic_arity_and_bare_template_errors() {
        let mut registry = Registry::new();
        let int = registry.primitive(PrimitiveKind::Int);
        assert!(registry.resolve_generic("Int", &[int], Span::default()).is_err());
        assert!(registry.resolve_generic("Pointer", &[int, int], Span::default()).is_err());
        assert!(registry.resolve_simple("Pointer", Span::default()).is_err());
        assert!(matches!(
            registry.resolve_simple("Nope", Span::default()),
            Err(SemanticError::UndefinedSymbol { what: "type", .. })
        ));
    }

    #[test]
    fn pointer_generic_resolves_to_pointer_type() {
        let mut registry = Registry::new();
        let int = registry.primitive(PrimitiveKind::Int);
        let resolved = registry.resolve_generic("Pointer", &[int], Span::default()).unwrap();
        let pointer = registry.pointer_of(int);
        assert_eq!(resolved, Resolution::Found(pointer));
        assert_eq!(registry.name(pointer), "Pointer<Int>");
        assert_eq!(registry.constructors(pointer).len(), 1);
    }

    #[test]
    fn arrays_get_natives() {
        let mut registry = Registry::new();
        let int = registry.primitive(PrimitiveKind::Int);
        let ints = registry.array_of(int);
        assert_eq!(registry.name(ints), "Int[]");
        assert_eq!(registry.method_candidates(ints, "add").len(), 1);
        assert_eq!(registry.method_candidates(ints, "capacity").len(), 1);
        let nested = registry.array_of(ints);
        assert_eq!(registry.name(nested), "Int[][]");
    }

    #[test]
    fn common_ancestor_of_siblings() {
        let mut registry = Registry::new();
        let animal = class(&mut registry, "Animal", None);
        let dog = class(&mut registry, "Dog", Some(animal));
        let cat = class(&mut registry, "Cat", Some(animal));
        let null = registry.primitive(PrimitiveKind::Null);
        let int = registry.primitive(PrimitiveKind::Int);
        let double = registry.primitive(PrimitiveKind::Double);

        assert_eq!(registry.common_ancestor(&[dog, cat]), Some(animal));
        assert_eq!(registry.common_ancestor(&[null, dog, dog]), Some(dog));
        assert_eq!(registry.common_ancestor(&[int, double]), Some(double));
        assert_eq!(registry.common_ancestor(&[dog, int]), None);
        assert_eq!(registry.common_ancestor(&[null]), None);
    }

    #[test]
    fn fields_are_laid_out_superclass_first() {
        let mut registry = Registry::new();
        let int = registry.primitive(PrimitiveKind::Int);
        let base = class(&mut registry, "Base", None);
        let derived = class(&mut registry, "Derived", Some(base));
        let field = |name: &str| Field {
            name: name.into(),
            ty: int,
            span: Span::default(),
        };
        registry.add_field(derived, field("b")).unwrap();
        registry.add_field(base, field("a")).unwrap();

        assert_eq!(registry.field_slot(derived, "a"), Some((0, int)));
        assert_eq!(registry.field_slot(derived, "b"), Some((1, int)));
        assert!(registry.add_field(derived, field("a")).is_err());
    }

    #[test]
    fn canonical_names_of_natives() {
        let registry = Registry::new();
        let double = registry.primitive(PrimitiveKind::Double);
        let add = registry.static_candidates(double, "+")[0];
        assert_eq!(registry.canonical_name(add), "Double.+(Double,Double)");

        let int = registry.primitive(PrimitiveKind::Int);
        let to_string = registry.method_candidates(int, "to_string")[0];
        assert_eq!(registry.canonical_name(to_string), "Int.to_string()");
        assert_eq!(registry.global_candidates("print").len(), 6);
    }

    #[test]
    fn unknown_ids_render_defensively() {
        let registry = Registry::new();
        assert_eq!(registry.name(TypeId::new(9_999)), "<unknown>");
        assert_eq!(registry.render(None), "void");
    }
}
