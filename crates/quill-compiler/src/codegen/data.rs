//! Static data: type metadata, vtables and string literals.

use cranelift_module::{DataDescription, DataId, Module};
use quill_core::CodegenError;
use quill_registry::TypeId;
use tracing::debug;

use super::Generator;
use super::layout::{
    METADATA_HASH_OFFSET, METADATA_NAME_OFFSET, METADATA_OFFSET, METADATA_PARENT_OFFSET, METADATA_SIZE,
    STRING_DATA_OFFSET, STRING_OBJECT_SIZE, WORD,
};
use super::vtable::VtableLayout;

impl<'c, 'ast> Generator<'c, 'ast> {
    pub(crate) fn layout(&mut self, class: TypeId) -> &VtableLayout {
        let registry = self.ctx.registry();
        self.layouts
            .entry(class)
            .or_insert_with(|| VtableLayout::compute(registry, class))
    }

    /// The metadata record of `class`, defined with its ancestors' on first
    /// use.
    pub(crate) fn type_metadata(&mut self, class: TypeId) -> Result<DataId, CodegenError> {
        if let Some(&id) = self.metadata.get(&class) {
            return Ok(id);
        }
        let ctx = self.ctx;
        let registry = ctx.registry();
        let parent = match registry.superclass(class) {
            Some(parent) if parent != class => Some(self.type_metadata(parent)?),
            _ => None,
        };
        let info = registry.get(class);
        let name = self.c_string(&info.name)?;

        let mut contents = vec![0u8; METADATA_SIZE];
        contents[METADATA_HASH_OFFSET..METADATA_HASH_OFFSET + 8].copy_from_slice(&info.hash.as_u64().to_le_bytes());
        let mut desc = DataDescription::new();
        desc.define(contents.into_boxed_slice());
        desc.set_align(8);
        let name_ref = self.backend.module.declare_data_in_data(name, &mut desc);
        desc.write_data_addr(METADATA_NAME_OFFSET as u32, name_ref, 0);
        if let Some(parent) = parent {
            let parent_ref = self.backend.module.declare_data_in_data(parent, &mut desc);
            desc.write_data_addr(METADATA_PARENT_OFFSET as u32, parent_ref, 0);
        }

        let id = self.define_data(&desc, false)?;
        self.metadata.insert(class, id);
        Ok(id)
    }

    /// The vtable of `class`, or `None` when it has no virtual methods.
    ///
    /// Defining a vtable queues every function it points to.
    pub(crate) fn vtable(&mut self, class: TypeId) -> Result<Option<DataId>, CodegenError> {
        if let Some(&id) = self.vtables.get(&class) {
            return Ok(id);
        }
        let ctx = self.ctx;
        let registry = ctx.registry();
        let layout = self.layout(class);
        if layout.is_empty() {
            self.vtables.insert(class, None);
            return Ok(None);
        }
        let implementations = layout.implementations(registry, class);

        let mut desc = DataDescription::new();
        desc.define(vec![0u8; implementations.len() * WORD as usize].into_boxed_slice());
        desc.set_align(8);
        for (slot, &func) in implementations.iter().enumerate() {
            let target = self.function_ref(func)?;
            let func_ref = self.backend.module.declare_func_in_data(target, &mut desc);
            desc.write_function_addr((slot * WORD as usize) as u32, func_ref);
        }

        let id = self.define_data(&desc, false)?;
        self.vtables.insert(class, Some(id));
        debug!(class = registry.name(class), slots = implementations.len(), "defined vtable");
        Ok(Some(id))
    }

    /// A static `String` object holding `text`.
    pub(crate) fn string_literal(&mut self, text: &str) -> Result<DataId, CodegenError> {
        if let Some(&id) = self.strings.get(text) {
            return Ok(id);
        }
        let string = self.ctx.registry().builtins().string;
        let metadata = self.type_metadata(string)?;
        let bytes = self.c_string(text)?;

        let mut desc = DataDescription::new();
        desc.define(vec![0u8; STRING_OBJECT_SIZE as usize].into_boxed_slice());
        desc.set_align(8);
        let metadata_ref = self.backend.module.declare_data_in_data(metadata, &mut desc);
        desc.write_data_addr(METADATA_OFFSET as u32, metadata_ref, 0);
        let bytes_ref = self.backend.module.declare_data_in_data(bytes, &mut desc);
        desc.write_data_addr(STRING_DATA_OFFSET as u32, bytes_ref, 0);

        // Writable: the `data` field may be reassigned.
        let id = self.define_data(&desc, true)?;
        self.strings.insert(text.to_string(), id);
        Ok(id)
    }

    fn c_string(&mut self, text: &str) -> Result<DataId, CodegenError> {
        let mut bytes = Vec::with_capacity(text.len() + 1);
        bytes.extend_from_slice(text.as_bytes());
        bytes.push(0);
        let mut desc = DataDescription::new();
        desc.define(bytes.into_boxed_slice());
        self.define_data(&desc, false)
    }

    fn define_data(&mut self, desc: &DataDescription, writable: bool) -> Result<DataId, CodegenError> {
        let module = &mut self.backend.module;
        let id = module
            .declare_anonymous_data(writable, false)
            .map_err(CodegenError::backend)?;
        module.define_data(id, desc).map_err(CodegenError::backend)?;
        Ok(id)
    }
}
