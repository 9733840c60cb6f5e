//! Instruction decoding.
//!
//! Instructions are read as a flat opcode stream and folded into the nested
//! [`Instruction`] tree with an explicit scope stack, so deeply nested input
//! cannot exhaust the native stack. Every index immediate is resolved to an
//! entity id against the module decoded so far.

use std::mem;

use super::{BlockType, Catch, Immediate, Instruction, LocalId, MemArg, Opcode};
use crate::parser::encoding::{BLOCK_TYPE_EMPTY, PREFIX_ATOMIC, PREFIX_MISC, PREFIX_SIMD};
use crate::parser::entity::{EntityList, Id};
use crate::parser::error::ParseError;
use crate::parser::limits::{MAX_BR_TABLE_LABELS, MAX_NESTING_DEPTH, MAX_SELECT_TYPED_VALUES};
use crate::parser::module::{DataId, ElemId, FuncId, GlobalId, MemoryId, Module, TableId, TagId, TypeId};
use crate::parser::reader::Reader;
use crate::parser::types::{EntityKind, RefType, ValueType};

/// Resolves wire indices against a partially decoded module.
#[derive(Debug, Clone, Copy)]
pub struct DecodeContext<'m> {
    module: &'m Module,
    local_count: u32,
}

impl<'m> DecodeContext<'m> {
    /// Context for constant expressions, which have no locals.
    pub fn new(module: &'m Module) -> DecodeContext<'m> {
        DecodeContext { module, local_count: 0 }
    }

    /// Context for a function body with `local_count` slots (params included).
    pub fn for_function(module: &'m Module, local_count: u32) -> DecodeContext<'m> {
        DecodeContext { module, local_count }
    }

    fn resolve<T>(list: &EntityList<T>, kind: EntityKind, index: u32) -> Result<Id<T>, ParseError> {
        list.id_at(index).ok_or(ParseError::IndexOutOfRange { kind, index, len: list.len() })
    }

    /// Structurally equal types resolve to the first of them, so every use
    /// of one signature shares a [`TypeId`].
    pub fn type_id(&self, index: u32) -> Result<TypeId, ParseError> {
        let id = Self::resolve(&self.module.types, EntityKind::Type, index)?;
        let ty = &self.module.types[id];
        Ok(self.module.types.iter().find(|(_, t)| **t == *ty).map_or(id, |(first, _)| first))
    }

    pub fn func(&self, index: u32) -> Result<FuncId, ParseError> {
        Self::resolve(&self.module.functions, EntityKind::Function, index)
    }

    pub fn table(&self, index: u32) -> Result<TableId, ParseError> {
        Self::resolve(&self.module.tables, EntityKind::Table, index)
    }

    pub fn memory(&self, index: u32) -> Result<MemoryId, ParseError> {
        Self::resolve(&self.module.memories, EntityKind::Memory, index)
    }

    pub fn global(&self, index: u32) -> Result<GlobalId, ParseError> {
        Self::resolve(&self.module.globals, EntityKind::Global, index)
    }

    pub fn tag(&self, index: u32) -> Result<TagId, ParseError> {
        Self::resolve(&self.module.tags, EntityKind::Tag, index)
    }

    pub fn elem(&self, index: u32) -> Result<ElemId, ParseError> {
        Self::resolve(&self.module.elements, EntityKind::Element, index)
    }

    pub fn data(&self, index: u32) -> Result<DataId, ParseError> {
        Self::resolve(&self.module.data, EntityKind::Data, index)
    }

    pub fn local(&self, index: u32) -> Result<LocalId, ParseError> {
        if index >= self.local_count {
            return Err(ParseError::IndexOutOfRange {
                kind: EntityKind::Local,
                index,
                len: self.local_count as usize,
            });
        }
        Ok(LocalId(index))
    }
}

#[derive(Debug)]
enum Clause {
    Body,
    Catch(TagId),
    CatchAll,
}

#[derive(Debug)]
enum Frame {
    /// The expression itself; its `end` finishes decoding.
    Root,
    Block(BlockType),
    Loop(BlockType),
    If {
        block_type: BlockType,
        then_body: Option<Vec<Instruction>>,
    },
    Try {
        block_type: BlockType,
        body: Option<Vec<Instruction>>,
        catches: Vec<Catch>,
        clause: Clause,
    },
}

#[derive(Debug)]
struct Scope {
    frame: Frame,
    instructions: Vec<Instruction>,
}

impl Scope {
    fn new(frame: Frame) -> Scope {
        Scope { frame, instructions: Vec::new() }
    }
}

/// Reads instructions up to and including the `end` that closes the
/// expression. The terminating `end` is not part of the result.
pub fn decode_expression(reader: &mut Reader, ctx: &DecodeContext) -> Result<Vec<Instruction>, ParseError> {
    let mut stack = vec![Scope::new(Frame::Root)];

    loop {
        let offset = reader.pos();
        let op = read_opcode(reader)?;

        match op {
            Opcode::Block | Opcode::Loop | Opcode::If | Opcode::Try => {
                if stack.len() >= MAX_NESTING_DEPTH {
                    return Err(ParseError::malformed(offset, "nesting too deep"));
                }
                let block_type = read_block_type(reader, ctx)?;
                let frame = match op {
                    Opcode::Block => Frame::Block(block_type),
                    Opcode::Loop => Frame::Loop(block_type),
                    Opcode::If => Frame::If { block_type, then_body: None },
                    _ => Frame::Try { block_type, body: None, catches: Vec::new(), clause: Clause::Body },
                };
                stack.push(Scope::new(frame));
            }

            Opcode::Else => {
                let top = current(&mut stack, offset)?;
                match &mut top.frame {
                    Frame::If { then_body, .. } if then_body.is_none() => {
                        *then_body = Some(mem::take(&mut top.instructions));
                    }
                    _ => return Err(ParseError::malformed(offset, "else without matching if")),
                }
            }

            Opcode::Catch | Opcode::CatchAll => {
                let next = if op == Opcode::Catch {
                    Clause::Catch(ctx.tag(reader.read_vu32()?)?)
                } else {
                    Clause::CatchAll
                };
                let top = current(&mut stack, offset)?;
                match &mut top.frame {
                    Frame::Try { body, catches, clause, .. } => {
                        let finished = mem::take(&mut top.instructions);
                        match clause {
                            Clause::Body => *body = Some(finished),
                            Clause::Catch(tag) => catches.push(Catch { tag: *tag, body: finished }),
                            Clause::CatchAll => {
                                return Err(ParseError::malformed(offset, "catch clause after catch_all"));
                            }
                        }
                        *clause = next;
                    }
                    _ => return Err(ParseError::malformed(offset, "catch without matching try")),
                }
            }

            Opcode::Delegate => {
                let depth = reader.read_vu32()?;
                let scope = pop_scope(&mut stack, offset)?;
                let inst = match scope.frame {
                    Frame::Try { block_type, clause: Clause::Body, .. } => Instruction::Try {
                        block_type,
                        body: scope.instructions,
                        catches: Vec::new(),
                        catch_all: None,
                        delegate: Some(depth),
                    },
                    _ => return Err(ParseError::malformed(offset, "delegate without matching try")),
                };
                current(&mut stack, offset)?.instructions.push(inst);
            }

            Opcode::End => {
                let scope = pop_scope(&mut stack, offset)?;
                let body = scope.instructions;
                let inst = match scope.frame {
                    Frame::Root => return Ok(body),
                    Frame::Block(block_type) => Instruction::Block { block_type, body },
                    Frame::Loop(block_type) => Instruction::Loop { block_type, body },
                    Frame::If { block_type, then_body: None } => {
                        Instruction::If { block_type, then_body: body, else_body: None }
                    }
                    Frame::If { block_type, then_body: Some(then_body) } => {
                        Instruction::If { block_type, then_body, else_body: Some(body) }
                    }
                    Frame::Try { block_type, body: try_body, mut catches, clause } => {
                        let (try_body, catch_all) = match clause {
                            Clause::Body => (body, None),
                            Clause::Catch(tag) => {
                                catches.push(Catch { tag, body });
                                (try_body.unwrap_or_default(), None)
                            }
                            Clause::CatchAll => (try_body.unwrap_or_default(), Some(body)),
                        };
                        Instruction::Try { block_type, body: try_body, catches, catch_all, delegate: None }
                    }
                };
                current(&mut stack, offset)?.instructions.push(inst);
            }

            _ => {
                let inst = decode_leaf(op, offset, reader, ctx)?;
                current(&mut stack, offset)?.instructions.push(inst);
            }
        }
    }
}

fn current(stack: &mut [Scope], offset: usize) -> Result<&mut Scope, ParseError> {
    stack
        .last_mut()
        .ok_or_else(|| ParseError::malformed(offset, "instruction after end of expression"))
}

/// Pops the innermost scope; the root scope may only be closed by `end`.
fn pop_scope(stack: &mut Vec<Scope>, offset: usize) -> Result<Scope, ParseError> {
    stack.pop().ok_or_else(|| ParseError::malformed(offset, "unbalanced end"))
}

/// Reads a single- or multi-byte opcode.
pub fn read_opcode(reader: &mut Reader) -> Result<Opcode, ParseError> {
    let offset = reader.pos();
    let byte = reader.read_byte()?;
    match byte {
        PREFIX_MISC | PREFIX_SIMD | PREFIX_ATOMIC => {
            let sub = reader.read_vu32()?;
            let unknown = ParseError::UnknownInstruction { offset, prefix: byte, sub };
            if sub > 0xFF {
                return Err(unknown);
            }
            Opcode::from_code(((byte as u16) << 8) | sub as u16).ok_or(unknown)
        }
        _ => Opcode::from_code(byte as u16).ok_or(ParseError::UnknownOpcode { offset, opcode: byte }),
    }
}

pub fn read_block_type(reader: &mut Reader, ctx: &DecodeContext) -> Result<BlockType, ParseError> {
    match reader.peek_byte() {
        Some(BLOCK_TYPE_EMPTY) => {
            reader.read_byte()?;
            Ok(BlockType::Empty)
        }
        Some(byte) if ValueType::try_from(byte).is_ok() => Ok(BlockType::Value(ValueType::decode(reader.read_byte()?)?)),
        _ => {
            let index = reader.read_vs33()?;
            if index < 0 {
                return Err(ParseError::InvalidBlockType(index));
            }
            Ok(BlockType::Type(ctx.type_id(index as u32)?))
        }
    }
}

fn read_memarg(reader: &mut Reader) -> Result<MemArg, ParseError> {
    let align = reader.read_vu32()?;
    let offset = reader.read_vu32()?;
    Ok(MemArg { align, offset })
}

fn expect_reserved(reader: &mut Reader, count: usize) -> Result<(), ParseError> {
    for _ in 0..count {
        let offset = reader.pos();
        if reader.read_byte()? != 0x00 {
            return Err(ParseError::malformed(offset, "zero byte expected"));
        }
    }
    Ok(())
}

fn decode_leaf(op: Opcode, offset: usize, reader: &mut Reader, ctx: &DecodeContext) -> Result<Instruction, ParseError> {
    use Instruction as I;

    let inst = match op {
        Opcode::Br => I::Br { depth: reader.read_vu32()? },
        Opcode::BrIf => I::BrIf { depth: reader.read_vu32()? },
        Opcode::Rethrow => I::Rethrow { depth: reader.read_vu32()? },
        Opcode::BrTable => {
            let count = reader.read_count("br_table labels", MAX_BR_TABLE_LABELS)?;
            let mut targets = Vec::with_capacity(count as usize);
            for _ in 0..count {
                targets.push(reader.read_vu32()?);
            }
            I::BrTable { targets, default: reader.read_vu32()? }
        }
        Opcode::Throw => I::Throw { tag: ctx.tag(reader.read_vu32()?)? },

        Opcode::Call => I::Call { func: ctx.func(reader.read_vu32()?)? },
        Opcode::ReturnCall => I::ReturnCall { func: ctx.func(reader.read_vu32()?)? },
        Opcode::RefFunc => I::RefFunc { func: ctx.func(reader.read_vu32()?)? },
        Opcode::CallIndirect | Opcode::ReturnCallIndirect => {
            let type_id = ctx.type_id(reader.read_vu32()?)?;
            let table = ctx.table(reader.read_vu32()?)?;
            if op == Opcode::CallIndirect {
                I::CallIndirect { type_id, table }
            } else {
                I::ReturnCallIndirect { type_id, table }
            }
        }

        Opcode::SelectTyped => {
            let count = reader.read_count("select types", MAX_SELECT_TYPED_VALUES)?;
            let mut types = Vec::with_capacity(count as usize);
            for _ in 0..count {
                types.push(ValueType::decode(reader.read_byte()?)?);
            }
            I::SelectTyped { types }
        }

        Opcode::LocalGet => I::LocalGet { local: ctx.local(reader.read_vu32()?)? },
        Opcode::LocalSet => I::LocalSet { local: ctx.local(reader.read_vu32()?)? },
        Opcode::LocalTee => I::LocalTee { local: ctx.local(reader.read_vu32()?)? },
        Opcode::GlobalGet => I::GlobalGet { global: ctx.global(reader.read_vu32()?)? },
        Opcode::GlobalSet => I::GlobalSet { global: ctx.global(reader.read_vu32()?)? },

        Opcode::TableGet => I::TableGet { table: ctx.table(reader.read_vu32()?)? },
        Opcode::TableSet => I::TableSet { table: ctx.table(reader.read_vu32()?)? },
        Opcode::TableGrow => I::TableGrow { table: ctx.table(reader.read_vu32()?)? },
        Opcode::TableSize => I::TableSize { table: ctx.table(reader.read_vu32()?)? },
        Opcode::TableFill => I::TableFill { table: ctx.table(reader.read_vu32()?)? },
        Opcode::TableInit => {
            let elem = ctx.elem(reader.read_vu32()?)?;
            let table = ctx.table(reader.read_vu32()?)?;
            I::TableInit { elem, table }
        }
        Opcode::ElemDrop => I::ElemDrop { elem: ctx.elem(reader.read_vu32()?)? },
        Opcode::TableCopy => {
            let dst = ctx.table(reader.read_vu32()?)?;
            let src = ctx.table(reader.read_vu32()?)?;
            I::TableCopy { dst, src }
        }

        Opcode::MemoryInit => {
            let data = ctx.data(reader.read_vu32()?)?;
            expect_reserved(reader, 1)?;
            I::MemoryInit { data }
        }
        Opcode::DataDrop => I::DataDrop { data: ctx.data(reader.read_vu32()?)? },

        Opcode::RefNull => I::RefNull { ref_type: RefType::decode(reader.read_byte()?)? },

        Opcode::I32Const => I::I32Const { value: reader.read_vs32()? },
        Opcode::I64Const => I::I64Const { value: reader.read_vs64()? },
        Opcode::F32Const => I::F32Const { bits: reader.read_f32_bits()? },
        Opcode::F64Const => I::F64Const { bits: reader.read_f64_bits()? },
        Opcode::V128Const => I::V128Const { bytes: reader.read_v128()? },
        Opcode::I8x16Shuffle => I::I8x16Shuffle { lanes: reader.read_v128()? },

        _ => match op.immediate() {
            Immediate::None => I::Plain { op },
            imm @ (Immediate::ReservedByte | Immediate::ReservedBytes2) => {
                expect_reserved(reader, imm.reserved_bytes())?;
                I::Plain { op }
            }
            Immediate::MemArg => I::Memory { op, memarg: read_memarg(reader)? },
            Immediate::MemArgLane => {
                let memarg = read_memarg(reader)?;
                I::MemoryLane { op, memarg, lane: reader.read_byte()? }
            }
            Immediate::Lane => I::Lane { op, lane: reader.read_byte()? },
            _ => return Err(ParseError::malformed(offset, format!("{op} is not valid here"))),
        },
    };
    Ok(inst)
}
