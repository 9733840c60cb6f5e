//! Instruction encoding to binary format.
//!
//! There is exactly one serializer. Byte lengths are obtained by running it
//! against a [`LengthCounter`](crate::parser::encoding::LengthCounter), so the
//! measured length and the written length cannot drift apart.

use super::{BlockType, Instruction, MemArg, Opcode};
use crate::encoder::EncodeError;
use crate::parser::encoding::{measure, ByteSink, BLOCK_TYPE_EMPTY, OP_END};
use crate::parser::entity::{Id, Positions};
use crate::parser::module::{
    DataId, DataSegment, ElemId, ElementSegment, FuncId, Function, Global, GlobalId, Memory, MemoryId, Module, Table,
    TableId, Tag, TagId, TypeId,
};
use crate::parser::types::{EntityKind, FuncType};

/// Wire index of every live entity, computed once per encode from the
/// module's current ordering.
#[derive(Debug, Clone)]
pub struct IndexSpace {
    types: Positions<FuncType>,
    functions: Positions<Function>,
    tables: Positions<Table>,
    memories: Positions<Memory>,
    globals: Positions<Global>,
    tags: Positions<Tag>,
    elements: Positions<ElementSegment>,
    data: Positions<DataSegment>,
}

fn lookup<T>(positions: &Positions<T>, kind: EntityKind, id: Id<T>) -> Result<u32, EncodeError> {
    positions.get(id).ok_or(EncodeError::DanglingReference { kind })
}

impl IndexSpace {
    pub fn new(module: &Module) -> IndexSpace {
        IndexSpace {
            types: module.types.positions(),
            functions: module.functions.positions(),
            tables: module.tables.positions(),
            memories: module.memories.positions(),
            globals: module.globals.positions(),
            tags: module.tags.positions(),
            elements: module.elements.positions(),
            data: module.data.positions(),
        }
    }

    pub fn type_index(&self, id: TypeId) -> Result<u32, EncodeError> {
        lookup(&self.types, EntityKind::Type, id)
    }

    pub fn func_index(&self, id: FuncId) -> Result<u32, EncodeError> {
        lookup(&self.functions, EntityKind::Function, id)
    }

    pub fn table_index(&self, id: TableId) -> Result<u32, EncodeError> {
        lookup(&self.tables, EntityKind::Table, id)
    }

    pub fn memory_index(&self, id: MemoryId) -> Result<u32, EncodeError> {
        lookup(&self.memories, EntityKind::Memory, id)
    }

    pub fn global_index(&self, id: GlobalId) -> Result<u32, EncodeError> {
        lookup(&self.globals, EntityKind::Global, id)
    }

    pub fn tag_index(&self, id: TagId) -> Result<u32, EncodeError> {
        lookup(&self.tags, EntityKind::Tag, id)
    }

    pub fn elem_index(&self, id: ElemId) -> Result<u32, EncodeError> {
        lookup(&self.elements, EntityKind::Element, id)
    }

    pub fn data_index(&self, id: DataId) -> Result<u32, EncodeError> {
        lookup(&self.data, EntityKind::Data, id)
    }
}

/// Encoding parameters for one instruction sequence.
#[derive(Debug, Clone, Copy)]
pub struct EncodeContext<'a> {
    pub indices: &'a IndexSpace,
    /// Number of local slots (params included); 0 for constant expressions.
    pub local_count: u32,
    /// Write function, global and type indices at the fixed relocatable width.
    pub relocatable: bool,
}

impl<'a> EncodeContext<'a> {
    pub fn new(indices: &'a IndexSpace) -> EncodeContext<'a> {
        EncodeContext { indices, local_count: 0, relocatable: false }
    }

    pub fn with_locals(self, local_count: u32) -> EncodeContext<'a> {
        EncodeContext { local_count, ..self }
    }

    pub fn relocatable(self, relocatable: bool) -> EncodeContext<'a> {
        EncodeContext { relocatable, ..self }
    }
}

/// Writes `instructions` without a trailing `end`.
pub fn encode_instructions<S: ByteSink>(
    sink: &mut S,
    instructions: &[Instruction],
    ctx: &EncodeContext,
) -> Result<(), EncodeError> {
    for inst in instructions {
        encode_instruction(sink, inst, ctx)?;
    }
    Ok(())
}

/// Writes `instructions` followed by the `end` that terminates an expression
/// or function body.
pub fn encode_expression<S: ByteSink>(
    sink: &mut S,
    instructions: &[Instruction],
    ctx: &EncodeContext,
) -> Result<(), EncodeError> {
    encode_instructions(sink, instructions, ctx)?;
    sink.write_byte(OP_END)
}

/// Exact number of bytes [`encode_instructions`] writes for `instructions`.
pub fn byte_length(instructions: &[Instruction], ctx: &EncodeContext) -> Result<usize, EncodeError> {
    measure(|counter| encode_instructions(counter, instructions, ctx))
}

pub fn write_opcode<S: ByteSink>(sink: &mut S, op: Opcode) -> Result<(), EncodeError> {
    match op.prefix() {
        Some(prefix) => {
            sink.write_byte(prefix)?;
            sink.write_vu32(op.sub_opcode())
        }
        None => sink.write_byte(op.sub_opcode() as u8),
    }
}

fn write_block_type<S: ByteSink>(sink: &mut S, block_type: &BlockType, ctx: &EncodeContext) -> Result<(), EncodeError> {
    match block_type {
        BlockType::Empty => sink.write_byte(BLOCK_TYPE_EMPTY),
        BlockType::Value(vt) => sink.write_byte((*vt).into()),
        BlockType::Type(type_id) => sink.write_vs64(ctx.indices.type_index(*type_id)? as i64),
    }
}

fn write_memarg<S: ByteSink>(sink: &mut S, memarg: &MemArg) -> Result<(), EncodeError> {
    sink.write_vu32(memarg.align)?;
    sink.write_vu32(memarg.offset)
}

fn write_reserved<S: ByteSink>(sink: &mut S, count: usize) -> Result<(), EncodeError> {
    for _ in 0..count {
        sink.write_byte(0x00)?;
    }
    Ok(())
}

fn encode_instruction<S: ByteSink>(sink: &mut S, inst: &Instruction, ctx: &EncodeContext) -> Result<(), EncodeError> {
    use Instruction::*;

    let op = inst.opcode();
    write_opcode(sink, op)?;

    let indices = ctx.indices;
    match inst {
        Block { block_type, body } | Loop { block_type, body } => {
            write_block_type(sink, block_type, ctx)?;
            encode_expression(sink, body, ctx)
        }
        If { block_type, then_body, else_body } => {
            write_block_type(sink, block_type, ctx)?;
            encode_instructions(sink, then_body, ctx)?;
            if let Some(else_body) = else_body {
                write_opcode(sink, Opcode::Else)?;
                encode_instructions(sink, else_body, ctx)?;
            }
            sink.write_byte(OP_END)
        }
        Try { block_type, body, catches, catch_all, delegate } => {
            write_block_type(sink, block_type, ctx)?;
            encode_instructions(sink, body, ctx)?;
            if let Some(depth) = delegate {
                write_opcode(sink, Opcode::Delegate)?;
                return sink.write_vu32(*depth);
            }
            for catch in catches {
                write_opcode(sink, Opcode::Catch)?;
                sink.write_vu32(indices.tag_index(catch.tag)?)?;
                encode_instructions(sink, &catch.body, ctx)?;
            }
            if let Some(catch_all) = catch_all {
                write_opcode(sink, Opcode::CatchAll)?;
                encode_instructions(sink, catch_all, ctx)?;
            }
            sink.write_byte(OP_END)
        }

        Br { depth } | BrIf { depth } | Rethrow { depth } => sink.write_vu32(*depth),
        BrTable { targets, default } => {
            sink.write_vu32(targets.len() as u32)?;
            for target in targets {
                sink.write_vu32(*target)?;
            }
            sink.write_vu32(*default)
        }
        Throw { tag } => sink.write_vu32(indices.tag_index(*tag)?),

        Call { func } | ReturnCall { func } | RefFunc { func } => {
            sink.write_index(indices.func_index(*func)?, ctx.relocatable)
        }
        CallIndirect { type_id, table } | ReturnCallIndirect { type_id, table } => {
            sink.write_index(indices.type_index(*type_id)?, ctx.relocatable)?;
            sink.write_vu32(indices.table_index(*table)?)
        }

        SelectTyped { types } => {
            sink.write_vu32(types.len() as u32)?;
            for vt in types {
                sink.write_byte((*vt).into())?;
            }
            Ok(())
        }

        LocalGet { local } | LocalSet { local } | LocalTee { local } => {
            if local.0 >= ctx.local_count {
                return Err(EncodeError::DanglingReference { kind: EntityKind::Local });
            }
            sink.write_vu32(local.0)
        }
        GlobalGet { global } | GlobalSet { global } => {
            sink.write_index(indices.global_index(*global)?, ctx.relocatable)
        }

        TableGet { table } | TableSet { table } | TableGrow { table } | TableSize { table } | TableFill { table } => {
            sink.write_vu32(indices.table_index(*table)?)
        }
        TableInit { elem, table } => {
            sink.write_vu32(indices.elem_index(*elem)?)?;
            sink.write_vu32(indices.table_index(*table)?)
        }
        ElemDrop { elem } => sink.write_vu32(indices.elem_index(*elem)?),
        TableCopy { dst, src } => {
            sink.write_vu32(indices.table_index(*dst)?)?;
            sink.write_vu32(indices.table_index(*src)?)
        }

        MemoryInit { data } => {
            sink.write_vu32(indices.data_index(*data)?)?;
            write_reserved(sink, 1)
        }
        DataDrop { data } => sink.write_vu32(indices.data_index(*data)?),

        RefNull { ref_type } => sink.write_byte((*ref_type).into()),

        I32Const { value } => sink.write_vs32(*value),
        I64Const { value } => sink.write_vs64(*value),
        F32Const { bits } => sink.write_f32_bits(*bits),
        F64Const { bits } => sink.write_f64_bits(*bits),
        V128Const { bytes } => sink.write_bytes(bytes),
        I8x16Shuffle { lanes } => sink.write_bytes(lanes),

        Instruction::Memory { memarg, .. } => write_memarg(sink, memarg),
        MemoryLane { memarg, lane, .. } => {
            write_memarg(sink, memarg)?;
            sink.write_byte(*lane)
        }
        Lane { lane, .. } => sink.write_byte(*lane),
        Plain { op } => write_reserved(sink, op.immediate().reserved_bytes()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::encoding::Writer;
    use crate::parser::instruction::{decode_expression, DecodeContext, LocalId};
    use crate::parser::reader::Reader;
    use crate::parser::types::ValueType;

    fn encode(module: &Module, locals: u32, instructions: &[Instruction]) -> Vec<u8> {
        let indices = IndexSpace::new(module);
        let ctx = EncodeContext::new(&indices).with_locals(locals);
        let len = byte_length(instructions, &ctx).unwrap();
        let mut writer = Writer::with_len(len);
        encode_instructions(&mut writer, instructions, &ctx).unwrap();
        assert_eq!(writer.position(), len);
        writer.into_bytes()
    }

    #[test]
    fn test_encode_add() {
        let module = Module::new();
        let body = vec![
            Instruction::LocalGet { local: LocalId(0) },
            Instruction::I32Const { value: 1 },
            Instruction::plain(Opcode::I32Add),
        ];
        assert_eq!(encode(&module, 1, &body), vec![0x20, 0x00, 0x41, 0x01, 0x6a]);
    }

    #[test]
    fn test_encode_prefixed_and_reserved() {
        let module = Module::new();
        let body = vec![
            Instruction::plain(Opcode::MemoryFill),
            Instruction::plain(Opcode::MemorySize),
            Instruction::Lane { op: Opcode::I32x4ExtractLane, lane: 3 },
        ];
        assert_eq!(encode(&module, 0, &body), vec![0xfc, 0x0b, 0x00, 0x3f, 0x00, 0xfd, 0x1b, 0x03]);
    }

    #[test]
    fn test_multibyte_sub_opcode() {
        let module = Module::new();
        let body = vec![Instruction::plain(Opcode::I32x4DotI16x8S)];
        assert_eq!(encode(&module, 0, &body), vec![0xfd, 0xba, 0x01]);
    }

    #[test]
    fn test_encode_relocatable_call() {
        let mut module = Module::new();
        let ty = module.types.push(FuncType::default());
        let func = module.add_defined_function(ty, &[], vec![]).unwrap();
        let indices = IndexSpace::new(&module);
        let body = [Instruction::Call { func }];

        let ctx = EncodeContext::new(&indices);
        assert_eq!(byte_length(&body, &ctx).unwrap(), 2);

        let ctx = ctx.relocatable(true);
        assert_eq!(byte_length(&body, &ctx).unwrap(), 6);
        let mut writer = Writer::with_len(6);
        encode_instructions(&mut writer, &body, &ctx).unwrap();
        assert_eq!(writer.into_bytes(), vec![0x10, 0x80, 0x80, 0x80, 0x80, 0x00]);
    }

    #[test]
    fn test_dangling_reference() {
        let mut module = Module::new();
        let ty = module.types.push(FuncType::default());
        let func = module.add_defined_function(ty, &[], vec![]).unwrap();
        module.functions.remove(func);

        let indices = IndexSpace::new(&module);
        let ctx = EncodeContext::new(&indices);
        let err = byte_length(&[Instruction::Call { func }], &ctx).unwrap_err();
        assert!(matches!(err, EncodeError::DanglingReference { kind: EntityKind::Function }));

        let err = byte_length(&[Instruction::LocalGet { local: LocalId(0) }], &ctx).unwrap_err();
        assert!(matches!(err, EncodeError::DanglingReference { kind: EntityKind::Local }));
    }

    #[test]
    fn test_nested_blocks_reencode_identically() {
        let mut module = Module::new();
        module.types.push(FuncType::new(vec![], vec![ValueType::I32, ValueType::I32]));
        // block (type 0) loop if (result i32) i32.const 1 else i32.const 2 end br 1 end end
        let bytes = [
            0x02, 0x00, 0x03, 0x40, 0x04, 0x7f, 0x41, 0x01, 0x05, 0x41, 0x02, 0x0b, 0x0c, 0x01, 0x0b, 0x0b, 0x0b,
        ];
        let mut reader = Reader::new(&bytes);
        let insts = decode_expression(&mut reader, &DecodeContext::new(&module)).unwrap();

        let indices = IndexSpace::new(&module);
        let ctx = EncodeContext::new(&indices);
        let len = measure(|c| encode_expression(c, &insts, &ctx)).unwrap();
        assert_eq!(len, bytes.len());
        let mut writer = Writer::with_len(len);
        encode_expression(&mut writer, &insts, &ctx).unwrap();
        assert_eq!(writer.into_bytes(), bytes.to_vec());
    }

    #[test]
    fn test_byte_length_matches_written_for_random_constants() {
        use rand::Rng;
        let module = Module::new();
        let indices = IndexSpace::new(&module);
        let ctx = EncodeContext::new(&indices);
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let body = vec![
                Instruction::I32Const { value: rng.gen() },
                Instruction::I64Const { value: rng.gen() },
                Instruction::memory(Opcode::I64Load, MemArg { align: 3, offset: rng.gen() }),
            ];
            let len = byte_length(&body, &ctx).unwrap();
            let mut writer = Writer::with_len(len);
            encode_instructions(&mut writer, &body, &ctx).unwrap();
            assert_eq!(writer.position(), len);
        }
    }
}
