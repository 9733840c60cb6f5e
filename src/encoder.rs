//! Encodes a [`Module`] to WebAssembly binary format (`.wasm`).
//!
//! This is the inverse of [`crate::parser::parse`]. Wire indices are never
//! stored on the module; every encode derives them from the current order of
//! each entity list, so a module can be edited freely between encodes.
//!
//! # Binary format overview
//!
//! A WebAssembly binary begins with a magic number (`\0asm`) and version (1),
//! followed by sections. Each section is encoded as:
//!
//! ```text
//! section_id: u8 | byte_length: vu32 | contents: byte*
//! ```
//!
//! Every length prefix is produced by running the same writer against a
//! [`LengthCounter`](crate::parser::encoding::LengthCounter) first, and the
//! bytes written afterwards are checked against that count. The output
//! buffer is allocated once, at its exact final size.
//!
//! # Example
//!
//! ```
//! use wasmgraph::encoder::EncodeOptions;
//! use wasmgraph::parser::Module;
//!
//! let module = Module::parse(b"\0asm\x01\0\0\0").unwrap();
//! let bytes = module.encode(&EncodeOptions::default()).unwrap();
//! assert_eq!(bytes, b"\0asm\x01\0\0\0");
//! ```

use log::{debug, error};
use thiserror::Error;

use crate::parser::encoding::{
    measure, ByteSink, Writer, DATA_ACTIVE, DATA_ACTIVE_EXPLICIT, DATA_PASSIVE, DESC_FUNC, DESC_GLOBAL, DESC_MEMORY,
    DESC_TABLE, DESC_TAG, ELEMKIND_FUNCREF, ELEM_EXPLICIT_TABLE, ELEM_EXPRESSIONS, ELEM_NON_ACTIVE, LIMITS_HAS_MAX,
    LIMITS_SHARED, MAGIC, TYPE_FUNC, VERSION,
};
use crate::parser::entity::Importable;
use crate::parser::instruction::encode::IndexSpace;
use crate::parser::instruction::{encode_expression, EncodeContext};
use crate::parser::module::{
    CustomSection, DataMode, ElementItems, ElementMode, EntityRef, FuncId, FunctionBody, GlobalKind, Module, Section,
};
use crate::parser::types::{EntityKind, GlobalType, Limits, RefType, SectionId, TableType, ValueType};

// ===========================================================================
// Error type
// ===========================================================================

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("reference to a {kind} that is not part of the module")]
    DanglingReference { kind: EntityKind },

    #[error("imported {kind} entries do not form a prefix of the index space")]
    ImportsMixed { kind: EntityKind },

    #[error("{what}: measured {expected} bytes but wrote {actual}")]
    LengthMismatch { what: String, expected: usize, actual: usize },

    #[error("buffer overflow at {position}: {needed} more bytes needed, capacity {capacity}")]
    BufferOverflow { position: usize, needed: usize, capacity: usize },

    #[error("value {value} does not fit in {width} LEB128 bytes")]
    PaddingOverflow { value: i128, width: usize },

    #[error("invalid state: {0}")]
    InvalidState(String),
}

// ===========================================================================
// Options
// ===========================================================================

/// A section to leave out of the output.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Known(SectionId),
    Custom(String),
}

#[derive(Debug, Clone, Default)]
pub struct EncodeOptions {
    /// Write function, global and type indices and memory limits as fixed
    /// five-byte LEB128 slots so they can be patched in place later.
    pub relocatable: bool,
    pub exclude_sections: Vec<SectionKind>,
}

impl EncodeOptions {
    pub fn new() -> EncodeOptions {
        EncodeOptions::default()
    }

    pub fn relocatable(mut self, relocatable: bool) -> Self {
        self.relocatable = relocatable;
        self
    }

    pub fn exclude(mut self, section: SectionKind) -> Self {
        self.exclude_sections.push(section);
        self
    }

    fn excludes_known(&self, id: SectionId) -> bool {
        self.exclude_sections.contains(&SectionKind::Known(id))
    }

    fn excludes_custom(&self, name: &str) -> bool {
        self.exclude_sections.iter().any(|s| matches!(s, SectionKind::Custom(n) if n == name))
    }
}

// ===========================================================================
// Public API
// ===========================================================================

/// Encodes a WebAssembly module to binary format.
pub fn encode(module: &Module, options: &EncodeOptions) -> Result<Vec<u8>, EncodeError> {
    if let Some(kind) = module.check_import_prefix() {
        return Err(EncodeError::ImportsMixed { kind });
    }

    let encoder = ModuleEncoder::new(module, options);
    let plan = encoder.plan();

    let total = measure(|counter| encoder.write_module(counter, &plan))?;
    let mut writer = Writer::with_len(total);
    encoder.write_module(&mut writer, &plan)?;
    check_length("module", total, writer.position())?;

    debug!("encoded {} sections, {total} bytes", plan.len());
    Ok(writer.into_bytes())
}

impl Module {
    pub fn encode(&self, options: &EncodeOptions) -> Result<Vec<u8>, EncodeError> {
        encode(self, options)
    }
}

/// Size of `func`'s code section entry, excluding its own length prefix.
pub fn code_entry_length(module: &Module, func: FuncId, options: &EncodeOptions) -> Result<usize, EncodeError> {
    let body = module
        .functions
        .get(func)
        .filter(|_| module.functions.contains(func))
        .and_then(|f| f.body())
        .ok_or(EncodeError::DanglingReference { kind: EntityKind::Function })?;
    let encoder = ModuleEncoder::new(module, options);
    measure(|counter| encoder.write_function_body(counter, body))
}

fn check_length(what: &str, expected: usize, actual: usize) -> Result<(), EncodeError> {
    if expected != actual {
        error!("{what}: measured {expected} bytes but wrote {actual}");
        return Err(EncodeError::LengthMismatch { what: what.to_string(), expected, actual });
    }
    Ok(())
}

// ===========================================================================
// Section plan
// ===========================================================================

#[derive(Debug, Clone, Copy)]
enum Planned<'m> {
    Known(SectionId),
    Custom(&'m CustomSection),
}

/// Where a custom section goes relative to the known sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    Start,
    After(usize),
    End,
}

struct ModuleEncoder<'m> {
    module: &'m Module,
    indices: IndexSpace,
    options: &'m EncodeOptions,
}

impl<'m> ModuleEncoder<'m> {
    fn new(module: &'m Module, options: &'m EncodeOptions) -> ModuleEncoder<'m> {
        ModuleEncoder { module, indices: IndexSpace::new(module), options }
    }

    fn ctx(&self) -> EncodeContext<'_> {
        EncodeContext::new(&self.indices).relocatable(self.options.relocatable)
    }

    fn has_content(&self, id: SectionId) -> bool {
        let m = self.module;
        match id {
            SectionId::Custom => false,
            SectionId::Type => !m.types.is_empty(),
            SectionId::Import => {
                m.functions.imported_count()
                    + m.tables.imported_count()
                    + m.memories.imported_count()
                    + m.globals.imported_count()
                    + m.tags.imported_count()
                    > 0
            }
            SectionId::Function | SectionId::Code => m.functions.defined().next().is_some(),
            SectionId::Table => m.tables.defined().next().is_some(),
            SectionId::Memory => m.memories.defined().next().is_some(),
            SectionId::Tag => m.tags.defined().next().is_some(),
            SectionId::Global => m.globals.defined().next().is_some(),
            SectionId::Export => !m.exports.is_empty(),
            SectionId::Start => m.start.is_some(),
            SectionId::Element => !m.elements.is_empty(),
            SectionId::DataCount => m.declared_data_count.is_some() || m.code_requires_data_count(),
            SectionId::Data => !m.data.is_empty(),
        }
    }

    /// Known sections in canonical order, with each custom section placed
    /// after the known section that preceded it in the input.
    fn plan(&self) -> Vec<Planned<'m>> {
        let module = self.module;
        let mut anchored: Vec<(Anchor, &'m CustomSection)> = Vec::new();
        let mut last_known = None;
        for (i, section) in module.sections.iter().enumerate() {
            match section {
                Section::Known { id, .. } => last_known = id.rank(),
                Section::Custom(custom) => {
                    if self.options.excludes_custom(&custom.name) {
                        continue;
                    }
                    let known_follows = module.sections[i + 1..].iter().any(|s| matches!(s, Section::Known { .. }));
                    let anchor = match last_known {
                        Some(rank) => Anchor::After(rank),
                        None if known_follows => Anchor::Start,
                        None => Anchor::End,
                    };
                    anchored.push((anchor, custom));
                }
            }
        }

        let customs_at = |anchor: Anchor| {
            anchored.iter().filter(move |(a, _)| *a == anchor).map(|(_, custom)| Planned::Custom(*custom))
        };

        let mut plan: Vec<Planned<'m>> = customs_at(Anchor::Start).collect();
        for (rank, id) in SectionId::CANONICAL_ORDER.iter().enumerate() {
            if self.has_content(*id) && !self.options.excludes_known(*id) {
                plan.push(Planned::Known(*id));
            }
            plan.extend(customs_at(Anchor::After(rank)));
        }
        plan.extend(customs_at(Anchor::End));
        plan
    }

    fn write_module<S: ByteSink>(&self, sink: &mut S, plan: &[Planned]) -> Result<(), EncodeError> {
        sink.write_bytes(&MAGIC)?;
        sink.write_u32(VERSION)?;
        for section in plan {
            match section {
                Planned::Known(id) => self.emit_section(sink, *id)?,
                Planned::Custom(custom) => self.emit_custom_section(sink, custom)?,
            }
        }
        Ok(())
    }

    fn emit_section<S: ByteSink>(&self, sink: &mut S, id: SectionId) -> Result<(), EncodeError> {
        let size = measure(|counter| self.write_section_contents(counter, id))?;
        sink.write_byte(id.into())?;
        sink.write_vu32(size as u32)?;
        let start = sink.position();
        self.write_section_contents(sink, id)?;
        check_length(id.name(), size, sink.position() - start)
    }

    fn write_section_contents<S: ByteSink>(&self, sink: &mut S, id: SectionId) -> Result<(), EncodeError> {
        match id {
            SectionId::Type => self.encode_type_section(sink),
            SectionId::Import => self.encode_import_section(sink),
            SectionId::Function => self.encode_function_section(sink),
            SectionId::Table => self.encode_table_section(sink),
            SectionId::Memory => self.encode_memory_section(sink),
            SectionId::Tag => self.encode_tag_section(sink),
            SectionId::Global => self.encode_global_section(sink),
            SectionId::Export => self.encode_export_section(sink),
            SectionId::Start => self.encode_start_section(sink),
            SectionId::Element => self.encode_element_section(sink),
            SectionId::DataCount => sink.write_vu32(self.module.data.len() as u32),
            SectionId::Code => self.encode_code_section(sink),
            SectionId::Data => self.encode_data_section(sink),
            SectionId::Custom => Err(EncodeError::InvalidState("custom section has no fixed contents".to_string())),
        }
    }

    /// ```text
    /// customsec ::= section_0(name byte*)
    /// ```
    fn emit_custom_section<S: ByteSink>(&self, sink: &mut S, custom: &CustomSection) -> Result<(), EncodeError> {
        let size = measure(|counter| write_custom_contents(counter, &custom.name, &custom.payload))?;
        sink.write_byte(SectionId::Custom.into())?;
        sink.write_vu32(size as u32)?;
        let start = sink.position();
        write_custom_contents(sink, &custom.name, &custom.payload)?;
        check_length(&format!("custom section {:?}", custom.name), size, sink.position() - start)
    }

    // =======================================================================
    // Section encoders
    // =======================================================================

    /// Type section (id 1): function signatures.
    ///
    /// ```text
    /// typesec  ::= section_1(vec(functype))
    /// functype ::= 0x60 vec(valtype) vec(valtype)
    /// ```
    fn encode_type_section<S: ByteSink>(&self, sink: &mut S) -> Result<(), EncodeError> {
        let types = &self.module.types;
        sink.write_vu32(types.len() as u32)?;
        for ft in types.values() {
            sink.write_byte(TYPE_FUNC)?;
            write_value_types(sink, &ft.params)?;
            write_value_types(sink, &ft.results)?;
        }
        Ok(())
    }

    /// Import section (id 2), grouped by kind in index-space order.
    ///
    /// ```text
    /// importsec  ::= section_2(vec(import))
    /// import     ::= module:name name:name importdesc
    /// importdesc ::= 0x00 typeidx | 0x01 tabletype | 0x02 memtype | 0x03 globaltype | 0x04 tag
    /// ```
    fn encode_import_section<S: ByteSink>(&self, sink: &mut S) -> Result<(), EncodeError> {
        let m = self.module;
        let count = m.functions.imported_count()
            + m.tables.imported_count()
            + m.memories.imported_count()
            + m.globals.imported_count()
            + m.tags.imported_count();
        sink.write_vu32(count as u32)?;

        for function in m.functions.values() {
            if let Some(import) = function.import() {
                sink.write_name(&import.module)?;
                sink.write_name(&import.field)?;
                sink.write_byte(DESC_FUNC)?;
                sink.write_index(self.indices.type_index(function.type_id)?, self.options.relocatable)?;
            }
        }
        for table in m.tables.values() {
            if let Some(import) = table.import() {
                sink.write_name(&import.module)?;
                sink.write_name(&import.field)?;
                sink.write_byte(DESC_TABLE)?;
                write_table_type(sink, &table.table_type)?;
            }
        }
        for memory in m.memories.values() {
            if let Some(import) = memory.import() {
                sink.write_name(&import.module)?;
                sink.write_name(&import.field)?;
                sink.write_byte(DESC_MEMORY)?;
                write_limits(sink, &memory.memory_type.limits, memory.memory_type.shared, self.options.relocatable)?;
            }
        }
        for global in m.globals.values() {
            if let Some(import) = global.import() {
                sink.write_name(&import.module)?;
                sink.write_name(&import.field)?;
                sink.write_byte(DESC_GLOBAL)?;
                write_global_type(sink, &global.global_type)?;
            }
        }
        for tag in m.tags.values() {
            if let Some(import) = tag.import() {
                sink.write_name(&import.module)?;
                sink.write_name(&import.field)?;
                sink.write_byte(DESC_TAG)?;
                sink.write_byte(tag.attribute)?;
                sink.write_vu32(self.indices.type_index(tag.type_id)?)?;
            }
        }
        Ok(())
    }

    /// Function section (id 3): type index per defined function.
    ///
    /// ```text
    /// funcsec ::= section_3(vec(typeidx))
    /// ```
    fn encode_function_section<S: ByteSink>(&self, sink: &mut S) -> Result<(), EncodeError> {
        let defined: Vec<_> = self.module.functions.defined().collect();
        sink.write_vu32(defined.len() as u32)?;
        for (_, function) in defined {
            sink.write_index(self.indices.type_index(function.type_id)?, self.options.relocatable)?;
        }
        Ok(())
    }

    /// Table section (id 4).
    ///
    /// ```text
    /// tablesec  ::= section_4(vec(tabletype))
    /// tabletype ::= reftype limits
    /// ```
    fn encode_table_section<S: ByteSink>(&self, sink: &mut S) -> Result<(), EncodeError> {
        let defined: Vec<_> = self.module.tables.defined().collect();
        sink.write_vu32(defined.len() as u32)?;
        for (_, table) in defined {
            write_table_type(sink, &table.table_type)?;
        }
        Ok(())
    }

    /// Memory section (id 5). Limits are padded in relocatable mode.
    ///
    /// ```text
    /// memsec  ::= section_5(vec(memtype))
    /// memtype ::= limits
    /// ```
    fn encode_memory_section<S: ByteSink>(&self, sink: &mut S) -> Result<(), EncodeError> {
        let defined: Vec<_> = self.module.memories.defined().collect();
        sink.write_vu32(defined.len() as u32)?;
        for (_, memory) in defined {
            write_limits(sink, &memory.memory_type.limits, memory.memory_type.shared, self.options.relocatable)?;
        }
        Ok(())
    }

    /// Tag section (id 13).
    ///
    /// ```text
    /// tagsec ::= section_13(vec(tag))
    /// tag    ::= 0x00 typeidx
    /// ```
    fn encode_tag_section<S: ByteSink>(&self, sink: &mut S) -> Result<(), EncodeError> {
        let defined: Vec<_> = self.module.tags.defined().collect();
        sink.write_vu32(defined.len() as u32)?;
        for (_, tag) in defined {
            sink.write_byte(tag.attribute)?;
            sink.write_vu32(self.indices.type_index(tag.type_id)?)?;
        }
        Ok(())
    }

    /// Global section (id 6).
    ///
    /// ```text
    /// globalsec  ::= section_6(vec(global))
    /// global     ::= globaltype expr
    /// ```
    fn encode_global_section<S: ByteSink>(&self, sink: &mut S) -> Result<(), EncodeError> {
        let defined: Vec<_> = self.module.globals.defined().collect();
        sink.write_vu32(defined.len() as u32)?;
        for (_, global) in defined {
            write_global_type(sink, &global.global_type)?;
            match &global.kind {
                GlobalKind::Defined { init } => encode_expression(sink, init, &self.ctx())?,
                GlobalKind::Imported(_) => {
                    return Err(EncodeError::InvalidState("imported global in the defined range".to_string()))
                }
            }
        }
        Ok(())
    }

    /// Export section (id 7).
    ///
    /// ```text
    /// exportsec  ::= section_7(vec(export))
    /// export     ::= name exportdesc
    /// exportdesc ::= 0x00 funcidx | 0x01 tableidx | 0x02 memidx | 0x03 globalidx | 0x04 tagidx
    /// ```
    fn encode_export_section<S: ByteSink>(&self, sink: &mut S) -> Result<(), EncodeError> {
        let exports = &self.module.exports;
        sink.write_vu32(exports.len() as u32)?;
        for export in exports {
            sink.write_name(&export.name)?;
            sink.write_byte(export.target.kind().into())?;
            let index = match export.target {
                EntityRef::Function(id) => self.indices.func_index(id)?,
                EntityRef::Table(id) => self.indices.table_index(id)?,
                EntityRef::Memory(id) => self.indices.memory_index(id)?,
                EntityRef::Global(id) => self.indices.global_index(id)?,
                EntityRef::Tag(id) => self.indices.tag_index(id)?,
            };
            sink.write_vu32(index)?;
        }
        Ok(())
    }

    /// Start section (id 8).
    ///
    /// ```text
    /// startsec ::= section_8(funcidx)
    /// ```
    fn encode_start_section<S: ByteSink>(&self, sink: &mut S) -> Result<(), EncodeError> {
        let start = self.module.start.ok_or_else(|| EncodeError::InvalidState("no start function".to_string()))?;
        sink.write_vu32(self.indices.func_index(start)?)
    }

    /// Element section (id 9). The flags are derived from each segment's mode
    /// and item encoding; an implicit table index is only used for table 0.
    ///
    /// ```text
    /// elemsec ::= section_9(vec(elem))
    /// elem    ::= 0:u32 e:expr vec(funcidx)
    ///           | 1:u32 0x00 vec(funcidx)
    ///           | 2:u32 x:tableidx e:expr 0x00 vec(funcidx)
    ///           | 3:u32 0x00 vec(funcidx)
    ///           | 4:u32 e:expr vec(expr)
    ///           | 5:u32 reftype vec(expr)
    ///           | 6:u32 x:tableidx e:expr reftype vec(expr)
    ///           | 7:u32 reftype vec(expr)
    /// ```
    fn encode_element_section<S: ByteSink>(&self, sink: &mut S) -> Result<(), EncodeError> {
        let elements = &self.module.elements;
        sink.write_vu32(elements.len() as u32)?;
        let ctx = self.ctx();

        for segment in elements.values() {
            let expressions = matches!(segment.items, ElementItems::Expressions { .. });
            let mut flags = if expressions { ELEM_EXPRESSIONS } else { 0 };

            let active = match &segment.mode {
                ElementMode::Active { table, offset, explicit_table } => {
                    let table_index = self.indices.table_index(*table)?;
                    let non_funcref = matches!(
                        segment.items,
                        ElementItems::Expressions { ref_type, .. } if ref_type != RefType::FuncRef
                    );
                    if *explicit_table || table_index != 0 || non_funcref {
                        flags |= ELEM_EXPLICIT_TABLE;
                    }
                    Some((table_index, offset))
                }
                ElementMode::Passive => {
                    flags |= ELEM_NON_ACTIVE;
                    None
                }
                ElementMode::Declarative => {
                    flags |= ELEM_NON_ACTIVE | ELEM_EXPLICIT_TABLE;
                    None
                }
            };

            sink.write_vu32(flags)?;
            if let Some((table_index, offset)) = active {
                if flags & ELEM_EXPLICIT_TABLE != 0 {
                    sink.write_vu32(table_index)?;
                }
                encode_expression(sink, offset, &ctx)?;
            }

            let has_kind = flags & (ELEM_NON_ACTIVE | ELEM_EXPLICIT_TABLE) != 0;
            match &segment.items {
                ElementItems::Functions(funcs) => {
                    if has_kind {
                        sink.write_byte(ELEMKIND_FUNCREF)?;
                    }
                    sink.write_vu32(funcs.len() as u32)?;
                    for func in funcs {
                        sink.write_index(self.indices.func_index(*func)?, self.options.relocatable)?;
                    }
                }
                ElementItems::Expressions { ref_type, exprs } => {
                    if has_kind {
                        sink.write_byte((*ref_type).into())?;
                    }
                    sink.write_vu32(exprs.len() as u32)?;
                    for expr in exprs {
                        encode_expression(sink, expr, &ctx)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Code section (id 10): one size-prefixed entry per defined function.
    ///
    /// ```text
    /// codesec ::= section_10(vec(code))
    /// code    ::= size:u32 func
    /// func    ::= vec(locals) expr
    /// locals  ::= n:u32 valtype
    /// ```
    fn encode_code_section<S: ByteSink>(&self, sink: &mut S) -> Result<(), EncodeError> {
        let defined: Vec<_> = self.module.functions.defined().collect();
        sink.write_vu32(defined.len() as u32)?;
        for (id, function) in defined {
            let body = function
                .body()
                .ok_or_else(|| EncodeError::InvalidState(format!("function {id} has no body")))?;
            let size = measure(|counter| self.write_function_body(counter, body))?;
            sink.write_vu32(size as u32)?;
            let start = sink.position();
            self.write_function_body(sink, body)?;
            check_length(&format!("function {id}"), size, sink.position() - start)?;
        }
        Ok(())
    }

    fn write_function_body<S: ByteSink>(&self, sink: &mut S, body: &FunctionBody) -> Result<(), EncodeError> {
        let runs = local_runs(body.declared_locals());
        sink.write_vu32(runs.len() as u32)?;
        for (value_type, count) in runs {
            sink.write_vu32(count)?;
            sink.write_byte(value_type.into())?;
        }
        let ctx = self.ctx().with_locals(body.locals.len() as u32);
        encode_expression(sink, &body.instructions, &ctx)
    }

    /// Data section (id 11).
    ///
    /// ```text
    /// datasec ::= section_11(vec(data))
    /// data    ::= 0:u32 e:expr vec(byte)
    ///           | 1:u32 vec(byte)
    ///           | 2:u32 x:memidx e:expr vec(byte)
    /// ```
    fn encode_data_section<S: ByteSink>(&self, sink: &mut S) -> Result<(), EncodeError> {
        let module = self.module;
        sink.write_vu32(module.data.len() as u32)?;
        let ctx = self.ctx();

        for (id, segment) in module.data.iter() {
            match &segment.mode {
                DataMode::Active { memory, offset, explicit_memory } => {
                    let memory_index = self.indices.memory_index(*memory)?;
                    if *explicit_memory || memory_index != 0 {
                        sink.write_vu32(DATA_ACTIVE_EXPLICIT)?;
                        sink.write_vu32(memory_index)?;
                    } else {
                        sink.write_vu32(DATA_ACTIVE)?;
                    }
                    encode_expression(sink, offset, &ctx)?;
                }
                DataMode::Passive => sink.write_vu32(DATA_PASSIVE)?,
            }
            let bytes = module
                .data_image
                .get(segment.bytes)
                .ok_or_else(|| EncodeError::InvalidState(format!("data segment {id} lies outside the data image")))?;
            sink.write_u8vec(bytes)?;
        }
        Ok(())
    }
}

// ===========================================================================
// Shared helpers
// ===========================================================================

fn write_custom_contents<S: ByteSink>(sink: &mut S, name: &str, payload: &[u8]) -> Result<(), EncodeError> {
    sink.write_name(name)?;
    sink.write_bytes(payload)
}

fn write_value_types<S: ByteSink>(sink: &mut S, types: &[ValueType]) -> Result<(), EncodeError> {
    sink.write_vu32(types.len() as u32)?;
    for vt in types {
        sink.write_byte((*vt).into())?;
    }
    Ok(())
}

fn write_limits<S: ByteSink>(sink: &mut S, limits: &Limits, shared: bool, padded: bool) -> Result<(), EncodeError> {
    let mut flags = 0;
    if limits.max.is_some() {
        flags |= LIMITS_HAS_MAX;
    }
    if shared {
        flags |= LIMITS_SHARED;
    }
    sink.write_byte(flags)?;
    sink.write_index(limits.min, padded)?;
    if let Some(max) = limits.max {
        sink.write_index(max, padded)?;
    }
    Ok(())
}

fn write_table_type<S: ByteSink>(sink: &mut S, table_type: &TableType) -> Result<(), EncodeError> {
    sink.write_byte(table_type.ref_type.into())?;
    write_limits(sink, &table_type.limits, false, false)
}

fn write_global_type<S: ByteSink>(sink: &mut S, global_type: &GlobalType) -> Result<(), EncodeError> {
    sink.write_byte(global_type.value_type.into())?;
    sink.write_vu1(global_type.mutable)
}

/// Collapses consecutive locals of one type into `(type, count)` runs.
fn local_runs(locals: impl Iterator<Item = ValueType>) -> Vec<(ValueType, u32)> {
    let mut runs: Vec<(ValueType, u32)> = Vec::new();
    for value_type in locals {
        match runs.last_mut() {
            Some((last, count)) if *last == value_type => *count += 1,
            _ => runs.push((value_type, 1)),
        }
    }
    runs
}
