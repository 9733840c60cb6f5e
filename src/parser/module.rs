//! The module graph.
//!
//! A [`Module`] owns one [`EntityList`] per entity kind. Imported entities
//! sit at the front of each list's index space, defined ones follow. All
//! cross references (instructions, exports, segments, block types) are ids,
//! so the graph can be edited freely and the wire indices are recomputed on
//! encode.

use std::fmt;

use log::trace;
use thiserror::Error;

use super::entity::{EntityList, Id, Importable};
use super::instruction::{walk_instructions, walk_instructions_mut, Instruction, LocalId, Opcode};
use super::types::{
    EntityKind, ExternalKind, FuncType, GlobalType, MemoryType, RefType, SectionId, TableType, ValueType,
};

pub type TypeId = Id<FuncType>;
pub type FuncId = Id<Function>;
pub type TableId = Id<Table>;
pub type MemoryId = Id<Memory>;
pub type GlobalId = Id<Global>;
pub type TagId = Id<Tag>;
pub type ElemId = Id<ElementSegment>;
pub type DataId = Id<DataSegment>;

// ===========================================================================
// Errors
// ===========================================================================

#[derive(Debug, Error)]
pub enum EditError {
    #[error("unknown {kind}")]
    UnknownEntity { kind: EntityKind },

    #[error("type mismatch: expected {expected}, found {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("{kind} is not imported")]
    NotImported { kind: EntityKind },

    #[error("duplicate export name {0:?}")]
    DuplicateExport(String),
}

// ===========================================================================
// Entities
// ===========================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImportName {
    pub module: String,
    pub field: String,
}

impl ImportName {
    pub fn new(module: impl Into<String>, field: impl Into<String>) -> ImportName {
        ImportName { module: module.into(), field: field.into() }
    }
}

impl fmt::Display for ImportName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.field)
    }
}

/// Byte range of a function body within the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodePosition {
    /// First byte after the body size prefix.
    pub start: usize,
    /// First byte of the instruction stream (after local declarations).
    pub instructions_start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Local {
    pub value_type: ValueType,
    pub is_param: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FunctionBody {
    /// Parameters followed by declared locals; a [`LocalId`] indexes this.
    pub locals: Vec<Local>,
    pub instructions: Vec<Instruction>,
    pub position: Option<CodePosition>,
}

impl FunctionBody {
    pub fn new(params: &[ValueType], declared: &[ValueType], instructions: Vec<Instruction>) -> FunctionBody {
        let locals = params
            .iter()
            .map(|t| Local { value_type: *t, is_param: true })
            .chain(declared.iter().map(|t| Local { value_type: *t, is_param: false }))
            .collect();
        FunctionBody { locals, instructions, position: None }
    }

    pub fn local_type(&self, local: LocalId) -> Option<ValueType> {
        self.locals.get(local.0 as usize).map(|l| l.value_type)
    }

    /// Declared (non-parameter) locals in slot order.
    pub fn declared_locals(&self) -> impl Iterator<Item = ValueType> + '_ {
        self.locals.iter().filter(|l| !l.is_param).map(|l| l.value_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FunctionKind {
    Imported(ImportName),
    Defined(FunctionBody),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub type_id: TypeId,
    /// Debug name from the `name` custom section, when decoded.
    pub name: Option<String>,
    pub kind: FunctionKind,
}

impl Function {
    pub fn body(&self) -> Option<&FunctionBody> {
        match &self.kind {
            FunctionKind::Defined(body) => Some(body),
            FunctionKind::Imported(_) => None,
        }
    }

    pub fn body_mut(&mut self) -> Option<&mut FunctionBody> {
        match &mut self.kind {
            FunctionKind::Defined(body) => Some(body),
            FunctionKind::Imported(_) => None,
        }
    }
}

impl Importable for Function {
    fn import(&self) -> Option<&ImportName> {
        match &self.kind {
            FunctionKind::Imported(name) => Some(name),
            FunctionKind::Defined(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlobalKind {
    Imported(ImportName),
    Defined { init: Vec<Instruction> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Global {
    pub global_type: GlobalType,
    pub kind: GlobalKind,
}

impl Importable for Global {
    fn import(&self) -> Option<&ImportName> {
        match &self.kind {
            GlobalKind::Imported(name) => Some(name),
            GlobalKind::Defined { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Memory {
    pub memory_type: MemoryType,
    pub import: Option<ImportName>,
}

impl Importable for Memory {
    fn import(&self) -> Option<&ImportName> {
        self.import.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub table_type: TableType,
    pub import: Option<ImportName>,
    /// Function references placed by active element segments with a constant
    /// offset, indexed by table slot.
    pub initial: Vec<Option<FuncId>>,
}

impl Table {
    /// Writes `funcs` starting at slot `offset`, growing the contents vector as needed.
    pub fn place(&mut self, offset: usize, funcs: impl IntoIterator<Item = Option<FuncId>>) {
        for (i, func) in funcs.into_iter().enumerate() {
            let slot = offset + i;
            if slot >= self.initial.len() {
                self.initial.resize(slot + 1, None);
            }
            self.initial[slot] = func;
        }
    }
}

impl Importable for Table {
    fn import(&self) -> Option<&ImportName> {
        self.import.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub type_id: TypeId,
    /// Always 0 (exception) in the current proposal.
    pub attribute: u8,
    pub import: Option<ImportName>,
}

impl Importable for Tag {
    fn import(&self) -> Option<&ImportName> {
        self.import.as_ref()
    }
}

/// What an export (or an import-created entity) refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Function(FuncId),
    Table(TableId),
    Memory(MemoryId),
    Global(GlobalId),
    Tag(TagId),
}

impl EntityRef {
    pub fn kind(&self) -> ExternalKind {
        match self {
            EntityRef::Function(_) => ExternalKind::Function,
            EntityRef::Table(_) => ExternalKind::Table,
            EntityRef::Memory(_) => ExternalKind::Memory,
            EntityRef::Global(_) => ExternalKind::Global,
            EntityRef::Tag(_) => ExternalKind::Tag,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub name: String,
    pub target: EntityRef,
}

/// Descriptor for a new import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportDesc {
    Function(TypeId),
    Table(TableType),
    Memory(MemoryType),
    Global(GlobalType),
    Tag(TypeId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementMode {
    Active {
        table: TableId,
        offset: Vec<Instruction>,
        /// Whether the input spelled out the table index (flags 2 and 6).
        explicit_table: bool,
    },
    Passive,
    Declarative,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementItems {
    Functions(Vec<FuncId>),
    Expressions { ref_type: RefType, exprs: Vec<Vec<Instruction>> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSegment {
    pub mode: ElementMode,
    pub items: ElementItems,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataMode {
    Active {
        memory: MemoryId,
        offset: Vec<Instruction>,
        /// Whether the input spelled out the memory index (flag 2).
        explicit_memory: bool,
    },
    Passive,
}

/// A bounds-checked window into the module's [`DataImage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteView {
    pub offset: usize,
    pub len: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSegment {
    pub mode: DataMode,
    pub bytes: ByteView,
}

/// Backing store for every data segment's payload. Segments hold views into
/// it, so patching a segment's bytes is an in-place write here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataImage {
    bytes: Vec<u8>,
}

impl DataImage {
    pub fn append(&mut self, bytes: &[u8]) -> ByteView {
        let view = ByteView { offset: self.bytes.len(), len: bytes.len() };
        self.bytes.extend_from_slice(bytes);
        view
    }

    pub fn get(&self, view: ByteView) -> Option<&[u8]> {
        self.bytes.get(view.offset..view.offset.checked_add(view.len)?)
    }

    pub fn get_mut(&mut self, view: ByteView) -> Option<&mut [u8]> {
        self.bytes.get_mut(view.offset..view.offset.checked_add(view.len)?)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// ===========================================================================
// Sections
// ===========================================================================

/// Payload range of a section in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionPosition {
    pub start: usize,
    pub end: usize,
}

impl SectionPosition {
    pub fn new(start: usize, end: usize) -> SectionPosition {
        SectionPosition { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomSection {
    pub name: String,
    pub payload: Vec<u8>,
    pub position: Option<SectionPosition>,
}

/// One entry in the module's section list, which records input order so
/// custom sections are re-emitted where they were found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section {
    Known { id: SectionId, position: Option<SectionPosition> },
    Custom(CustomSection),
}

impl Section {
    pub fn id(&self) -> SectionId {
        match self {
            Section::Known { id, .. } => *id,
            Section::Custom(_) => SectionId::Custom,
        }
    }

    pub fn position(&self) -> Option<SectionPosition> {
        match self {
            Section::Known { position, .. } => *position,
            Section::Custom(custom) => custom.position,
        }
    }
}

// ===========================================================================
// Module
// ===========================================================================

#[derive(Debug, Clone)]
pub struct Module {
    /// Module name from the `name` custom section, when decoded.
    pub name: Option<String>,
    pub version: u32,

    pub types: EntityList<FuncType>,
    pub functions: EntityList<Function>,
    pub tables: EntityList<Table>,
    pub memories: EntityList<Memory>,
    pub globals: EntityList<Global>,
    pub tags: EntityList<Tag>,
    pub exports: Vec<Export>,
    pub start: Option<FuncId>,
    pub elements: EntityList<ElementSegment>,
    pub data: EntityList<DataSegment>,
    pub data_image: DataImage,

    pub sections: Vec<Section>,
    /// Value of the data count section, when the input had one.
    pub declared_data_count: Option<u32>,
}

impl Default for Module {
    fn default() -> Self {
        Module::new()
    }
}

impl Module {
    pub fn new() -> Module {
        Module {
            name: None,
            version: 1,
            types: EntityList::new(),
            functions: EntityList::new(),
            tables: EntityList::new(),
            memories: EntityList::new(),
            globals: EntityList::new(),
            tags: EntityList::new(),
            exports: Vec::new(),
            start: None,
            elements: EntityList::new(),
            data: EntityList::new(),
            data_image: DataImage::default(),
            sections: Vec::new(),
            declared_data_count: None,
        }
    }

    // Lookups -----------------------------------------------------------------

    pub fn func_type(&self, func: FuncId) -> Option<&FuncType> {
        let function = self.functions.get(func)?;
        self.types.get(function.type_id)
    }

    pub fn contains(&self, target: EntityRef) -> bool {
        match target {
            EntityRef::Function(id) => self.functions.contains(id),
            EntityRef::Table(id) => self.tables.contains(id),
            EntityRef::Memory(id) => self.memories.contains(id),
            EntityRef::Global(id) => self.globals.contains(id),
            EntityRef::Tag(id) => self.tags.contains(id),
        }
    }

    /// Whether `target` is an imported entity. Unknown targets are not.
    pub fn is_imported(&self, target: EntityRef) -> bool {
        match target {
            EntityRef::Function(id) => self.functions.get(id).map_or(false, Importable::is_imported),
            EntityRef::Table(id) => self.tables.get(id).map_or(false, Importable::is_imported),
            EntityRef::Memory(id) => self.memories.get(id).map_or(false, Importable::is_imported),
            EntityRef::Global(id) => self.globals.get(id).map_or(false, Importable::is_imported),
            EntityRef::Tag(id) => self.tags.get(id).map_or(false, Importable::is_imported),
        }
    }

    /// Position of `target` in its kind's index space.
    pub fn index_of(&self, target: EntityRef) -> Option<usize> {
        match target {
            EntityRef::Function(id) => self.functions.position_of(id),
            EntityRef::Table(id) => self.tables.position_of(id),
            EntityRef::Memory(id) => self.memories.position_of(id),
            EntityRef::Global(id) => self.globals.position_of(id),
            EntityRef::Tag(id) => self.tags.position_of(id),
        }
    }

    /// Finds a function by debug name first, then by export name.
    pub fn get_function_by_name(&self, name: &str) -> Option<FuncId> {
        let by_debug_name = self
            .functions
            .iter()
            .find(|(_, f)| f.name.as_deref() == Some(name))
            .map(|(id, _)| id);
        by_debug_name.or_else(|| {
            self.exports.iter().find_map(|export| match export.target {
                EntityRef::Function(id) if export.name == name => Some(id),
                _ => None,
            })
        })
    }

    pub fn find_export(&self, name: &str) -> Option<&Export> {
        self.exports.iter().find(|e| e.name == name)
    }

    pub fn find_section(&self, id: SectionId) -> Option<&Section> {
        self.sections.iter().find(|s| s.id() == id)
    }

    pub fn find_custom_section(&self, name: &str) -> Option<&CustomSection> {
        self.custom_sections().find(|c| c.name == name)
    }

    pub fn custom_sections(&self) -> impl Iterator<Item = &CustomSection> + '_ {
        self.sections.iter().filter_map(|s| match s {
            Section::Custom(custom) => Some(custom),
            Section::Known { .. } => None,
        })
    }

    pub fn segment_bytes(&self, data: DataId) -> Option<&[u8]> {
        let segment = self.data.get(data)?;
        self.data_image.get(segment.bytes)
    }

    /// Mutable view of a data segment's payload for in-place patching.
    pub fn segment_bytes_mut(&mut self, data: DataId) -> Option<&mut [u8]> {
        let view = self.data.get(data)?.bytes;
        self.data_image.get_mut(view)
    }

    /// The first entity kind whose imports do not form a prefix of its index space.
    pub fn check_import_prefix(&self) -> Option<EntityKind> {
        if !self.functions.imports_form_prefix() {
            return Some(EntityKind::Function);
        }
        if !self.tables.imports_form_prefix() {
            return Some(EntityKind::Table);
        }
        if !self.memories.imports_form_prefix() {
            return Some(EntityKind::Memory);
        }
        if !self.globals.imports_form_prefix() {
            return Some(EntityKind::Global);
        }
        if !self.tags.imports_form_prefix() {
            return Some(EntityKind::Tag);
        }
        None
    }

    /// Whether any function body uses an instruction that requires the data
    /// count section (`memory.init`, `data.drop`).
    pub fn code_requires_data_count(&self) -> bool {
        let mut required = false;
        for body in self.functions.values().filter_map(|f| f.body()) {
            walk_instructions(&body.instructions, &mut |inst| {
                if matches!(inst.opcode(), Opcode::MemoryInit | Opcode::DataDrop) {
                    required = true;
                }
            });
        }
        required
    }

    /// Visits every instruction in the module: function bodies, global
    /// initialisers, and element/data segment expressions.
    pub fn for_each_instruction_mut<F>(&mut self, mut visit: F)
    where
        F: FnMut(&mut Instruction),
    {
        for function in self.functions.values_mut() {
            if let Some(body) = function.body_mut() {
                walk_instructions_mut(&mut body.instructions, &mut visit);
            }
        }
        for global in self.globals.values_mut() {
            if let GlobalKind::Defined { init } = &mut global.kind {
                walk_instructions_mut(init, &mut visit);
            }
        }
        for segment in self.elements.values_mut() {
            if let ElementMode::Active { offset, .. } = &mut segment.mode {
                walk_instructions_mut(offset, &mut visit);
            }
            if let ElementItems::Expressions { exprs, .. } = &mut segment.items {
                for expr in exprs {
                    walk_instructions_mut(expr, &mut visit);
                }
            }
        }
        for segment in self.data.values_mut() {
            if let DataMode::Active { offset, .. } = &mut segment.mode {
                walk_instructions_mut(offset, &mut visit);
            }
        }
    }

    // Edits -------------------------------------------------------------------

    /// Returns the first type with this signature, creating it if absent.
    pub fn get_or_create_type(&mut self, params: &[ValueType], results: &[ValueType]) -> TypeId {
        if let Some((id, _)) = self.types.iter().find(|(_, t)| t.matches(params, results)) {
            return id;
        }
        self.types.push(FuncType::new(params.to_vec(), results.to_vec()))
    }

    /// Adds an import, placing it after the existing imports of its kind.
    pub fn append_import(
        &mut self,
        module: &str,
        field: &str,
        desc: ImportDesc,
    ) -> Result<EntityRef, EditError> {
        let import = ImportName::new(module, field);
        trace!("append import {import} {desc:?}");
        let target = match desc {
            ImportDesc::Function(type_id) => {
                self.require_type(type_id)?;
                EntityRef::Function(self.functions.insert_import(Function {
                    type_id,
                    name: None,
                    kind: FunctionKind::Imported(import),
                }))
            }
            ImportDesc::Table(table_type) => EntityRef::Table(self.tables.insert_import(Table {
                table_type,
                import: Some(import),
                initial: Vec::new(),
            })),
            ImportDesc::Memory(memory_type) => {
                EntityRef::Memory(self.memories.insert_import(Memory { memory_type, import: Some(import) }))
            }
            ImportDesc::Global(global_type) => EntityRef::Global(
                self.globals.insert_import(Global { global_type, kind: GlobalKind::Imported(import) }),
            ),
            ImportDesc::Tag(type_id) => {
                self.require_type(type_id)?;
                EntityRef::Tag(self.tags.insert_import(Tag { type_id, attribute: 0, import: Some(import) }))
            }
        };
        Ok(target)
    }

    fn require_type(&self, type_id: TypeId) -> Result<(), EditError> {
        if self.types.contains(type_id) {
            Ok(())
        } else {
            Err(EditError::UnknownEntity { kind: EntityKind::Type })
        }
    }

    pub fn append_export(&mut self, name: impl Into<String>, target: EntityRef) -> Result<(), EditError> {
        let name = name.into();
        if !self.contains(target) {
            return Err(EditError::UnknownEntity { kind: target.kind().into() });
        }
        if self.find_export(&name).is_some() {
            return Err(EditError::DuplicateExport(name));
        }
        self.exports.push(Export { name, target });
        Ok(())
    }

    /// Removes every export of `target`, returning how many were removed.
    pub fn remove_export_by_ref(&mut self, target: EntityRef) -> usize {
        let before = self.exports.len();
        self.exports.retain(|e| e.target != target);
        before - self.exports.len()
    }

    /// Points every use of `old` (instructions, initialisers, exports) at
    /// `new`, then removes `old` from the global index space. Returns the
    /// number of rewritten references; replacing a global with itself is a
    /// no-op.
    pub fn replace_global(&mut self, old: GlobalId, new: GlobalId) -> Result<usize, EditError> {
        let old_type = self
            .globals
            .get(old)
            .filter(|_| self.globals.contains(old))
            .ok_or(EditError::UnknownEntity { kind: EntityKind::Global })?
            .global_type;
        let new_type = self
            .globals
            .get(new)
            .filter(|_| self.globals.contains(new))
            .ok_or(EditError::UnknownEntity { kind: EntityKind::Global })?
            .global_type;
        if old_type.value_type != new_type.value_type || (old_type.mutable && !new_type.mutable) {
            return Err(EditError::TypeMismatch { expected: old_type.to_string(), actual: new_type.to_string() });
        }
        if old == new {
            return Ok(0);
        }

        let mut rewritten = 0;
        self.for_each_instruction_mut(|inst| match inst {
            Instruction::GlobalGet { global } | Instruction::GlobalSet { global } if *global == old => {
                *global = new;
                rewritten += 1;
            }
            _ => {}
        });
        for export in &mut self.exports {
            if export.target == EntityRef::Global(old) {
                export.target = EntityRef::Global(new);
                rewritten += 1;
            }
        }
        self.globals.remove(old);
        trace!("replaced global {old} with {new}, {rewritten} references");
        Ok(rewritten)
    }

    /// Turns an imported function into a defined one with `body`. The
    /// function moves to the end of the index space.
    pub fn implement_import(&mut self, func: FuncId, body: FunctionBody) -> Result<(), EditError> {
        let function = self
            .functions
            .get_mut(func)
            .ok_or(EditError::UnknownEntity { kind: EntityKind::Function })?;
        if !function.is_imported() {
            return Err(EditError::NotImported { kind: EntityKind::Function });
        }
        function.kind = FunctionKind::Defined(body);
        let function = self.functions[func].clone();
        self.functions.remove(func);
        let moved = self.functions.push(function);
        self.retarget_function(func, moved);
        Ok(())
    }

    fn retarget_function(&mut self, from: FuncId, to: FuncId) {
        self.for_each_instruction_mut(|inst| match inst {
            Instruction::Call { func } | Instruction::ReturnCall { func } | Instruction::RefFunc { func }
                if *func == from =>
            {
                *func = to
            }
            _ => {}
        });
        for export in &mut self.exports {
            if export.target == EntityRef::Function(from) {
                export.target = EntityRef::Function(to);
            }
        }
        if self.start == Some(from) {
            self.start = Some(to);
        }
        for segment in self.elements.values_mut() {
            if let ElementItems::Functions(funcs) = &mut segment.items {
                for f in funcs.iter_mut().filter(|f| **f == from) {
                    *f = to;
                }
            }
        }
        for table in self.tables.values_mut() {
            for slot in table.initial.iter_mut().filter(|s| **s == Some(from)) {
                *slot = Some(to);
            }
        }
    }

    pub fn add_defined_function(
        &mut self,
        type_id: TypeId,
        locals: &[ValueType],
        instructions: Vec<Instruction>,
    ) -> Result<FuncId, EditError> {
        let params = self
            .types
            .get(type_id)
            .filter(|_| self.types.contains(type_id))
            .ok_or(EditError::UnknownEntity { kind: EntityKind::Type })?
            .params
            .clone();
        let body = FunctionBody::new(&params, locals, instructions);
        Ok(self.functions.push(Function { type_id, name: None, kind: FunctionKind::Defined(body) }))
    }

    pub fn add_defined_global(&mut self, global_type: GlobalType, init: Vec<Instruction>) -> GlobalId {
        self.globals.push(Global { global_type, kind: GlobalKind::Defined { init } })
    }

    pub fn add_defined_memory(&mut self, memory_type: MemoryType) -> MemoryId {
        self.memories.push(Memory { memory_type, import: None })
    }

    pub fn add_defined_table(&mut self, table_type: TableType) -> TableId {
        self.tables.push(Table { table_type, import: None, initial: Vec::new() })
    }

    pub fn add_data_segment(&mut self, mode: DataMode, bytes: &[u8]) -> DataId {
        let view = self.data_image.append(bytes);
        self.data.push(DataSegment { mode, bytes: view })
    }

    pub fn add_element_segment(&mut self, segment: ElementSegment) -> ElemId {
        self.elements.push(segment)
    }

    /// Appends a custom section after every existing section.
    pub fn add_custom_section(&mut self, name: impl Into<String>, payload: Vec<u8>) {
        self.sections.push(Section::Custom(CustomSection { name: name.into(), payload, position: None }));
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Module")?;
        if let Some(name) = &self.name {
            write!(f, " name = {name}")?;
        }
        write!(f, " version = {}", self.version)?;
        write!(f, " types = {}", self.types.len())?;
        write!(
            f,
            " functions = {} ({} imported)",
            self.functions.len(),
            self.functions.imported_count()
        )?;
        write!(f, " tables = {}", self.tables.len())?;
        write!(f, " memories = {}", self.memories.len())?;
        write!(f, " globals = {}", self.globals.len())?;
        write!(f, " tags = {}", self.tags.len())?;
        write!(f, " exports = {}", self.exports.len())?;
        write!(f, " elements = {}", self.elements.len())?;
        write!(f, " data = {}", self.data.len())?;
        write!(f, " custom = ")?;
        f.debug_set().entries(self.custom_sections().map(|c| &c.name)).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::types::Limits;

    fn i32_global(mutable: bool, value: i32) -> (GlobalType, Vec<Instruction>) {
        (GlobalType { value_type: ValueType::I32, mutable }, vec![Instruction::I32Const { value }])
    }

    #[test]
    fn test_type_dedup() {
        let mut module = Module::new();
        let a = module.get_or_create_type(&[ValueType::I32], &[]);
        let b = module.get_or_create_type(&[ValueType::I32], &[]);
        let c = module.get_or_create_type(&[], &[ValueType::I32]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(module.types.len(), 2);
    }

    #[test]
    fn test_append_import_keeps_prefix() {
        let mut module = Module::new();
        let ty = module.get_or_create_type(&[], &[]);
        let defined = module.add_defined_function(ty, &[], vec![]).unwrap();
        let imported = module.append_import("env", "f", ImportDesc::Function(ty)).unwrap();

        assert_eq!(module.check_import_prefix(), None);
        let EntityRef::Function(imported) = imported else { panic!("expected a function") };
        assert_eq!(module.functions.position_of(imported), Some(0));
        assert_eq!(module.functions.position_of(defined), Some(1));
    }

    #[test]
    fn test_append_import_rejects_unknown_type() {
        let mut module = Module::new();
        let mut other = Module::new();
        let foreign = other.get_or_create_type(&[ValueType::F64], &[]);
        let err = module.append_import("env", "f", ImportDesc::Function(foreign)).unwrap_err();
        assert!(matches!(err, EditError::UnknownEntity { kind: EntityKind::Type }));
    }

    #[test]
    fn test_export_edits() {
        let mut module = Module::new();
        let memory = module.add_defined_memory(MemoryType { limits: Limits::new(1, None), shared: false });
        module.append_export("memory", EntityRef::Memory(memory)).unwrap();
        module.append_export("mem2", EntityRef::Memory(memory)).unwrap();
        assert!(matches!(
            module.append_export("memory", EntityRef::Memory(memory)),
            Err(EditError::DuplicateExport(_))
        ));
        assert_eq!(module.remove_export_by_ref(EntityRef::Memory(memory)), 2);
        assert!(module.exports.is_empty());
    }

    #[test]
    fn test_replace_global_rewrites_everything() {
        let mut module = Module::new();
        let (ty, init) = i32_global(true, 1);
        let old = module.add_defined_global(ty, init);
        let (ty, init) = i32_global(true, 2);
        let new = module.add_defined_global(ty, init);
        let sig = module.get_or_create_type(&[], &[]);
        let func = module
            .add_defined_function(
                sig,
                &[],
                vec![
                    Instruction::GlobalGet { global: old },
                    Instruction::GlobalSet { global: old },
                    Instruction::Block {
                        block_type: super::super::instruction::BlockType::Empty,
                        body: vec![Instruction::GlobalGet { global: old }],
                    },
                ],
            )
            .unwrap();
        module.append_export("g", EntityRef::Global(old)).unwrap();

        assert_eq!(module.replace_global(old, new).unwrap(), 4);
        assert!(!module.globals.contains(old));
        assert_eq!(module.globals.position_of(new), Some(0));
        assert_eq!(module.find_export("g").unwrap().target, EntityRef::Global(new));

        let mut seen = Vec::new();
        walk_instructions(&module.functions[func].body().unwrap().instructions, &mut |inst| {
            if let Instruction::GlobalGet { global } | Instruction::GlobalSet { global } = inst {
                seen.push(*global);
            }
        });
        assert_eq!(seen, vec![new, new, new]);
    }

    #[test]
    fn test_replace_global_type_mismatch() {
        let mut module = Module::new();
        let (ty, init) = i32_global(true, 1);
        let old = module.add_defined_global(ty, init);
        let (ty, init) = i32_global(false, 2);
        let new = module.add_defined_global(ty, init);
        assert!(matches!(module.replace_global(old, new), Err(EditError::TypeMismatch { .. })));
    }

    #[test]
    fn test_replace_global_with_itself() {
        let mut module = Module::new();
        let (ty, init) = i32_global(true, 1);
        let global = module.add_defined_global(ty, init);
        module.append_export("g", EntityRef::Global(global)).unwrap();

        assert_eq!(module.replace_global(global, global).unwrap(), 0);
        assert!(module.globals.contains(global));
        assert_eq!(module.find_export("g").unwrap().target, EntityRef::Global(global));
    }

    #[test]
    fn test_get_function_by_name() {
        let mut module = Module::new();
        let sig = module.get_or_create_type(&[], &[]);
        let a = module.add_defined_function(sig, &[], vec![]).unwrap();
        let b = module.add_defined_function(sig, &[], vec![]).unwrap();
        module.functions[a].name = Some("first".to_string());
        module.append_export("second", EntityRef::Function(b)).unwrap();
        module.append_export("first", EntityRef::Function(b)).unwrap();

        assert_eq!(module.get_function_by_name("first"), Some(a));
        assert_eq!(module.get_function_by_name("second"), Some(b));
        assert_eq!(module.get_function_by_name("third"), None);
    }

    #[test]
    fn test_implement_import_moves_to_defined() {
        let mut module = Module::new();
        let sig = module.get_or_create_type(&[], &[]);
        let EntityRef::Function(imported) = module.append_import("env", "f", ImportDesc::Function(sig)).unwrap()
        else {
            panic!("expected a function")
        };
        let caller = module.add_defined_function(sig, &[], vec![Instruction::Call { func: imported }]).unwrap();

        module.implement_import(imported, FunctionBody::default()).unwrap();
        assert_eq!(module.functions.imported_count(), 0);
        let moved = module.functions.id_at(1).unwrap();
        assert_eq!(
            module.functions[caller].body().unwrap().instructions,
            vec![Instruction::Call { func: moved }]
        );
        assert!(matches!(
            module.implement_import(moved, FunctionBody::default()),
            Err(EditError::NotImported { .. })
        ));
    }

    #[test]
    fn test_data_image_views() {
        let mut module = Module::new();
        let a = module.add_data_segment(DataMode::Passive, b"abc");
        let b = module.add_data_segment(DataMode::Passive, b"de");
        module.segment_bytes_mut(a).unwrap()[0] = b'z';
        assert_eq!(module.segment_bytes(a).unwrap(), b"zbc");
        assert_eq!(module.segment_bytes(b).unwrap(), b"de");
        assert_eq!(module.data_image.len(), 5);
        assert_eq!(module.data_image.get(ByteView { offset: 4, len: 2 }), None);
    }
}
