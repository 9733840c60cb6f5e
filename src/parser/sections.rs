//! Section payload readers.
//!
//! Each reader consumes one known section's payload and adds its entities to
//! the module. Readers run in dependency order, so every index they meet can
//! be resolved against entities decoded earlier.

use log::trace;

use super::encoding::{
    DATA_ACTIVE, DATA_ACTIVE_EXPLICIT, DATA_PASSIVE, ELEMKIND_FUNCREF, ELEM_EXPLICIT_TABLE, ELEM_EXPRESSIONS,
    ELEM_NON_ACTIVE, LIMITS_HAS_MAX, LIMITS_SHARED, TYPE_FUNC,
};
use super::error::ParseError;
use super::instruction::{decode_expression, DecodeContext, Instruction};
use super::limits::*;
use super::module::{
    CodePosition, DataMode, ElementItems, ElementMode, ElementSegment, EntityRef, Export, Function, FunctionBody,
    FunctionKind, Global, GlobalKind, ImportName, Local, Memory, Module, Table, Tag,
};
use super::reader::Reader;
use super::types::{
    EntityKind, ExternalKind, FuncType, GlobalType, Limits, MemoryType, RefType, SectionId, TableType, ValueType,
};

/* TYPES ************************************************************/

fn read_value_types(reader: &mut Reader, what: &'static str, limit: u32) -> Result<Vec<ValueType>, ParseError> {
    let count = reader.read_count(what, limit)?;
    let mut types = Vec::with_capacity(count as usize);
    for _ in 0..count {
        types.push(ValueType::decode(reader.read_byte()?)?);
    }
    Ok(types)
}

/// Limits and the shared flag.
fn read_limits(reader: &mut Reader) -> Result<(Limits, bool), ParseError> {
    let flags = reader.read_byte()?;
    if flags & !(LIMITS_HAS_MAX | LIMITS_SHARED) != 0 {
        return Err(ParseError::InvalidLimits(flags));
    }
    let min = reader.read_vu32()?;
    let max = if flags & LIMITS_HAS_MAX != 0 { Some(reader.read_vu32()?) } else { None };
    Ok((Limits::new(min, max), flags & LIMITS_SHARED != 0))
}

fn read_table_type(reader: &mut Reader) -> Result<TableType, ParseError> {
    let ref_type = RefType::decode(reader.read_byte()?)?;
    let (limits, shared) = read_limits(reader)?;
    if shared {
        return Err(ParseError::InvalidLimits(LIMITS_SHARED));
    }
    Ok(TableType { ref_type, limits })
}

fn read_memory_type(reader: &mut Reader) -> Result<MemoryType, ParseError> {
    let (limits, shared) = read_limits(reader)?;
    // Shared memories must declare a maximum.
    if shared && limits.max.is_none() {
        return Err(ParseError::InvalidLimits(LIMITS_SHARED));
    }
    Ok(MemoryType { limits, shared })
}

fn read_global_type(reader: &mut Reader) -> Result<GlobalType, ParseError> {
    let value_type = ValueType::decode(reader.read_byte()?)?;
    let mutable = match reader.read_byte()? {
        0x00 => false,
        0x01 => true,
        other => return Err(ParseError::InvalidMutability(other)),
    };
    Ok(GlobalType { value_type, mutable })
}

fn read_const_expr(reader: &mut Reader, module: &Module) -> Result<Vec<Instruction>, ParseError> {
    decode_expression(reader, &DecodeContext::new(module))
}

/* SECTION READERS ************************************************/

pub(crate) fn read_section_type(reader: &mut Reader, module: &mut Module) -> Result<(), ParseError> {
    let count = reader.read_count("types", MAX_TYPES)?;

    for _ in 0..count {
        reader.expect_byte(TYPE_FUNC)?;
        let params = read_value_types(reader, "function params", MAX_FUNCTION_PARAMS)?;
        let results = read_value_types(reader, "function results", MAX_FUNCTION_RETURNS)?;
        let id = module.types.push(FuncType::new(params, results));
        trace!("type {id} = {}", module.types[id]);
    }

    Ok(())
}

pub(crate) fn read_section_import(reader: &mut Reader, module: &mut Module) -> Result<(), ParseError> {
    let count = reader.read_count("imports", MAX_IMPORTS)?;

    for _ in 0..count {
        let name = ImportName::new(reader.read_name()?, reader.read_name()?);
        let kind_byte = reader.read_byte()?;
        let kind = ExternalKind::try_from(kind_byte).map_err(|_| ParseError::InvalidExternalKind(kind_byte))?;
        trace!("import {name} ({kind:?})");

        match kind {
            ExternalKind::Function => {
                let type_id = DecodeContext::new(module).type_id(reader.read_vu32()?)?;
                module.functions.push(Function { type_id, name: None, kind: FunctionKind::Imported(name) });
            }
            ExternalKind::Table => {
                let table_type = read_table_type(reader)?;
                module.tables.push(Table { table_type, import: Some(name), initial: Vec::new() });
            }
            ExternalKind::Memory => {
                let memory_type = read_memory_type(reader)?;
                module.memories.push(Memory { memory_type, import: Some(name) });
            }
            ExternalKind::Global => {
                let global_type = read_global_type(reader)?;
                module.globals.push(Global { global_type, kind: GlobalKind::Imported(name) });
            }
            ExternalKind::Tag => {
                let attribute = reader.read_byte()?;
                let type_id = DecodeContext::new(module).type_id(reader.read_vu32()?)?;
                module.tags.push(Tag { type_id, attribute, import: Some(name) });
            }
        }
    }

    Ok(())
}

/// Declares the defined functions. Their bodies arrive with the code section.
pub(crate) fn read_section_function(reader: &mut Reader, module: &mut Module) -> Result<(), ParseError> {
    let count = reader.read_count("functions", MAX_FUNCTIONS)?;

    for _ in 0..count {
        let type_id = DecodeContext::new(module).type_id(reader.read_vu32()?)?;
        module.functions.push(Function { type_id, name: None, kind: FunctionKind::Defined(FunctionBody::default()) });
    }

    Ok(())
}

pub(crate) fn read_section_table(reader: &mut Reader, module: &mut Module) -> Result<(), ParseError> {
    let count = reader.read_count("tables", MAX_TABLES)?;

    for _ in 0..count {
        let table_type = read_table_type(reader)?;
        module.add_defined_table(table_type);
    }

    Ok(())
}

pub(crate) fn read_section_memory(reader: &mut Reader, module: &mut Module) -> Result<(), ParseError> {
    let count = reader.read_count("memories", MAX_MEMORIES)?;

    for _ in 0..count {
        let memory_type = read_memory_type(reader)?;
        module.add_defined_memory(memory_type);
    }

    Ok(())
}

pub(crate) fn read_section_tag(reader: &mut Reader, module: &mut Module) -> Result<(), ParseError> {
    let count = reader.read_count("tags", MAX_TAGS)?;

    for _ in 0..count {
        let attribute = reader.read_byte()?;
        let type_id = DecodeContext::new(module).type_id(reader.read_vu32()?)?;
        module.tags.push(Tag { type_id, attribute, import: None });
    }

    Ok(())
}

pub(crate) fn read_section_global(reader: &mut Reader, module: &mut Module) -> Result<(), ParseError> {
    let count = reader.read_count("globals", MAX_GLOBALS)?;

    for _ in 0..count {
        let global_type = read_global_type(reader)?;
        let init = read_const_expr(reader, module)?;
        let id = module.add_defined_global(global_type, init);
        trace!("global {id}: {global_type}");
    }

    Ok(())
}

/// Exports may name imported entities as well as defined ones; rejecting
/// re-exported imports is left to [`ParseOptions::defined_exports_only`].
///
/// [`ParseOptions::defined_exports_only`]: super::ParseOptions::defined_exports_only
pub(crate) fn read_section_export(reader: &mut Reader, module: &mut Module) -> Result<(), ParseError> {
    let count = reader.read_count("exports", MAX_EXPORTS)?;

    for _ in 0..count {
        let name = reader.read_name()?;
        let kind_byte = reader.read_byte()?;
        let kind = ExternalKind::try_from(kind_byte).map_err(|_| ParseError::InvalidExternalKind(kind_byte))?;
        let index = reader.read_vu32()?;

        let ctx = DecodeContext::new(module);
        let target = match kind {
            ExternalKind::Function => EntityRef::Function(ctx.func(index)?),
            ExternalKind::Table => EntityRef::Table(ctx.table(index)?),
            ExternalKind::Memory => EntityRef::Memory(ctx.memory(index)?),
            ExternalKind::Global => EntityRef::Global(ctx.global(index)?),
            ExternalKind::Tag => EntityRef::Tag(ctx.tag(index)?),
        };
        trace!("export {name:?} -> {target:?}");
        module.exports.push(Export { name, target });
    }

    Ok(())
}

pub(crate) fn read_section_start(reader: &mut Reader, module: &mut Module) -> Result<(), ParseError> {
    let index = reader.read_vu32()?;
    let func = DecodeContext::new(module).func(index)?;
    let signature_is_empty = module.func_type(func).map_or(false, |t| t.params.is_empty() && t.results.is_empty());
    if !signature_is_empty {
        return Err(ParseError::InvalidType {
            kind: EntityKind::Function,
            index,
            reason: "start function must take and return nothing".to_string(),
        });
    }
    module.start = Some(func);
    Ok(())
}

pub(crate) fn read_section_element(reader: &mut Reader, module: &mut Module) -> Result<(), ParseError> {
    let count = reader.read_count("element segments", MAX_ELEMENT_SEGMENTS)?;

    for _ in 0..count {
        let flags = reader.read_vu32()?;
        if flags > (ELEM_NON_ACTIVE | ELEM_EXPLICIT_TABLE | ELEM_EXPRESSIONS) {
            return Err(ParseError::InvalidSegmentFlags { kind: EntityKind::Element, flags });
        }
        let ctx = DecodeContext::new(module);

        let mode = if flags & ELEM_NON_ACTIVE == 0 {
            let explicit_table = flags & ELEM_EXPLICIT_TABLE != 0;
            let table_index = if explicit_table { reader.read_vu32()? } else { 0 };
            let table = ctx.table(table_index)?;
            let offset = read_const_expr(reader, module)?;
            ElementMode::Active { table, offset, explicit_table }
        } else if flags & ELEM_EXPLICIT_TABLE == 0 {
            ElementMode::Passive
        } else {
            ElementMode::Declarative
        };

        // Flags 0 and 4 carry no element kind or type byte.
        let has_kind = flags & (ELEM_NON_ACTIVE | ELEM_EXPLICIT_TABLE) != 0;

        let items = if flags & ELEM_EXPRESSIONS == 0 {
            if has_kind {
                reader.expect_byte(ELEMKIND_FUNCREF)?;
            }
            let len = reader.read_count("table init entries", MAX_TABLE_INIT_ENTRIES)?;
            let mut funcs = Vec::with_capacity(len as usize);
            for _ in 0..len {
                funcs.push(ctx.func(reader.read_vu32()?)?);
            }
            ElementItems::Functions(funcs)
        } else {
            let ref_type = if has_kind { RefType::decode(reader.read_byte()?)? } else { RefType::FuncRef };
            let len = reader.read_count("table init entries", MAX_TABLE_INIT_ENTRIES)?;
            let mut exprs = Vec::with_capacity(len as usize);
            for _ in 0..len {
                exprs.push(read_const_expr(reader, module)?);
            }
            ElementItems::Expressions { ref_type, exprs }
        };

        if let ElementMode::Active { table, .. } = &mode {
            let table_ref = module.tables[*table].table_type.ref_type;
            let item_ref = match &items {
                ElementItems::Functions(_) => RefType::FuncRef,
                ElementItems::Expressions { ref_type, .. } => *ref_type,
            };
            if table_ref != item_ref {
                return Err(ParseError::InvalidType {
                    kind: EntityKind::Table,
                    index: module.tables.position_of(*table).unwrap_or_default() as u32,
                    reason: format!("{item_ref} segment cannot initialise a {table_ref} table"),
                });
            }
        }

        module.add_element_segment(ElementSegment { mode, items });
    }

    Ok(())
}

pub(crate) fn read_section_data_count(reader: &mut Reader, module: &mut Module) -> Result<(), ParseError> {
    module.declared_data_count = Some(reader.read_vu32()?);
    Ok(())
}

pub(crate) fn read_section_data(reader: &mut Reader, module: &mut Module) -> Result<(), ParseError> {
    let count = reader.read_count("data segments", MAX_DATA_SEGMENTS)?;
    if let Some(declared) = module.declared_data_count {
        if declared != count {
            return Err(ParseError::DataCountMismatch { declared, actual: count as usize });
        }
    }

    for _ in 0..count {
        let flags = reader.read_vu32()?;
        let mode = match flags {
            DATA_ACTIVE | DATA_ACTIVE_EXPLICIT => {
                let explicit_memory = flags == DATA_ACTIVE_EXPLICIT;
                let index = if explicit_memory { reader.read_vu32()? } else { 0 };
                let memory = DecodeContext::new(module).memory(index)?;
                let offset = read_const_expr(reader, module)?;
                DataMode::Active { memory, offset, explicit_memory }
            }
            DATA_PASSIVE => DataMode::Passive,
            _ => return Err(ParseError::InvalidSegmentFlags { kind: EntityKind::Data, flags }),
        };
        let bytes = reader.read_u8vec()?;
        let id = module.add_data_segment(mode, bytes);
        trace!("data segment {id}: {} bytes", bytes.len());
    }

    Ok(())
}

pub(crate) fn read_section_code(reader: &mut Reader, module: &mut Module) -> Result<(), ParseError> {
    let defined: Vec<_> = module.functions.defined().map(|(id, _)| id).collect();
    let count = reader.read_count("function bodies", MAX_FUNCTIONS)?;
    if count as usize != defined.len() {
        return Err(ParseError::FunctionCountMismatch { functions: defined.len(), bodies: count as usize });
    }

    for func in defined {
        let size = reader.read_vu32()?;
        if size > MAX_FUNCTION_SIZE {
            return Err(ParseError::LimitExceeded { what: "function body size", count: size, limit: MAX_FUNCTION_SIZE });
        }
        let mut body_reader = reader.sub_reader(size as usize)?;
        let start = body_reader.pos();

        let params = module.func_type(func).map(|t| t.params.clone()).unwrap_or_default();
        let mut locals: Vec<Local> = params.iter().map(|t| Local { value_type: *t, is_param: true }).collect();

        let runs = body_reader.read_count("local declarations", MAX_FUNCTION_LOCALS)?;
        let mut declared: u64 = 0;
        for _ in 0..runs {
            let n = body_reader.read_vu32()?;
            declared += n as u64;
            if declared > MAX_FUNCTION_LOCALS as u64 {
                return Err(ParseError::LimitExceeded {
                    what: "function locals",
                    count: declared.min(u32::MAX as u64) as u32,
                    limit: MAX_FUNCTION_LOCALS,
                });
            }
            let value_type = ValueType::decode(body_reader.read_byte()?)?;
            locals.extend((0..n).map(|_| Local { value_type, is_param: false }));
        }

        let instructions_start = body_reader.pos();
        let ctx = DecodeContext::for_function(module, locals.len() as u32);
        let instructions = decode_expression(&mut body_reader, &ctx)?;
        if !body_reader.is_empty() {
            return Err(ParseError::SectionSizeMismatch {
                section: SectionId::Code,
                expected: size as usize,
                actual: body_reader.local_pos(),
            });
        }

        let position = CodePosition { start, instructions_start, end: body_reader.pos() };
        trace!("function {func}: {} locals, {} instructions", locals.len(), instructions.len());
        module.functions[func].kind = FunctionKind::Defined(FunctionBody { locals, instructions, position: Some(position) });
    }

    Ok(())
}

/// Fills each table's initial contents from active function segments with a
/// constant offset.
pub(crate) fn place_table_elements(module: &mut Module) {
    let mut placements = Vec::new();
    for segment in module.elements.values() {
        let ElementMode::Active { table, offset, .. } = &segment.mode else {
            continue;
        };
        let start = match offset.as_slice() {
            [Instruction::I32Const { value }] if *value >= 0 && (*value as u32) <= MAX_TABLE_SIZE => *value as usize,
            _ => continue,
        };
        let funcs: Vec<_> = match &segment.items {
            ElementItems::Functions(funcs) => funcs.iter().map(|f| Some(*f)).collect(),
            ElementItems::Expressions { exprs, .. } => exprs
                .iter()
                .map(|expr| match expr.as_slice() {
                    [Instruction::RefFunc { func }] => Some(*func),
                    _ => None,
                })
                .collect(),
        };
        placements.push((*table, start, funcs));
    }
    for (table, start, funcs) in placements {
        module.tables[table].place(start, funcs);
    }
}
