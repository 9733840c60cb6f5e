//! WebAssembly instruction representation.
//!
//! Instructions form a tree: `block`, `loop`, `if` and `try` own their nested
//! bodies, and the structural opcodes (`else`, `catch`, `catch_all`,
//! `delegate`, `end`) never appear as standalone nodes. Every immediate that
//! names a module entity holds that entity's [`Id`](super::entity::Id), not a
//! wire index; indices are resolved while decoding and recomputed while
//! encoding.

pub mod decode;
pub mod encode;
pub mod opcode;

pub use decode::{decode_expression, DecodeContext};
pub use encode::{byte_length, encode_expression, encode_instructions, EncodeContext};
pub use opcode::{Align, Category, Computed, Descriptor, Flags, Immediate, Opcode, StackSpec};

use super::module::{DataId, ElemId, FuncId, GlobalId, TableId, TagId, TypeId};
use super::types::{RefType, ValueType};
use fhex::ToHex;
use std::fmt;

/// Memory argument for memory access instructions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemArg {
    /// Memory alignment (as power of 2)
    pub align: u32,
    /// Memory offset
    pub offset: u32,
}

impl MemArg {
    /// Naturally aligned access at offset 0.
    pub fn natural(op: Opcode) -> MemArg {
        MemArg { align: op.descriptor().align.log2().unwrap_or(0), offset: 0 }
    }
}

/// Block type for structured control instructions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockType {
    /// Empty block type (no parameters or results)
    Empty,
    /// Single value type result
    Value(ValueType),
    /// Function type for multi-value blocks
    Type(TypeId),
}

/// A function-local variable slot (parameters first, then declared locals).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalId(pub u32);

/// A `catch <tag>` clause of a `try`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catch {
    pub tag: TagId,
    pub body: Vec<Instruction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    // Structured control
    Block {
        block_type: BlockType,
        body: Vec<Instruction>,
    },
    Loop {
        block_type: BlockType,
        body: Vec<Instruction>,
    },
    If {
        block_type: BlockType,
        then_body: Vec<Instruction>,
        else_body: Option<Vec<Instruction>>,
    },
    /// Legacy exception handling. Ends either with `end` after the clauses or
    /// with `delegate <label>`, in which case there are no clauses.
    Try {
        block_type: BlockType,
        body: Vec<Instruction>,
        catches: Vec<Catch>,
        catch_all: Option<Vec<Instruction>>,
        delegate: Option<u32>,
    },

    // Branches
    Br { depth: u32 },
    BrIf { depth: u32 },
    BrTable { targets: Vec<u32>, default: u32 },
    Rethrow { depth: u32 },
    Throw { tag: TagId },

    // Calls
    Call { func: FuncId },
    ReturnCall { func: FuncId },
    CallIndirect { type_id: TypeId, table: TableId },
    ReturnCallIndirect { type_id: TypeId, table: TableId },

    // Parametric
    SelectTyped { types: Vec<ValueType> },

    // Variables
    LocalGet { local: LocalId },
    LocalSet { local: LocalId },
    LocalTee { local: LocalId },
    GlobalGet { global: GlobalId },
    GlobalSet { global: GlobalId },

    // Tables
    TableGet { table: TableId },
    TableSet { table: TableId },
    TableGrow { table: TableId },
    TableSize { table: TableId },
    TableFill { table: TableId },
    TableInit { elem: ElemId, table: TableId },
    ElemDrop { elem: ElemId },
    TableCopy { dst: TableId, src: TableId },

    // Bulk memory
    MemoryInit { data: DataId },
    DataDrop { data: DataId },

    // References
    RefNull { ref_type: RefType },
    RefFunc { func: FuncId },

    // Constants; floats are kept as raw bits so NaN payloads compare exactly
    I32Const { value: i32 },
    I64Const { value: i64 },
    F32Const { bits: u32 },
    F64Const { bits: u64 },
    V128Const { bytes: [u8; 16] },
    I8x16Shuffle { lanes: [u8; 16] },

    /// Any opcode whose only immediate is a memarg (loads, stores, atomics).
    Memory { op: Opcode, memarg: MemArg },
    /// SIMD load/store lane: memarg followed by a lane index.
    MemoryLane { op: Opcode, memarg: MemArg, lane: u8 },
    /// SIMD extract/replace lane.
    Lane { op: Opcode, lane: u8 },
    /// Every opcode without entity or constant immediates, including the
    /// ones whose only immediates are reserved zero bytes.
    Plain { op: Opcode },
}

impl Instruction {
    pub fn plain(op: Opcode) -> Instruction {
        Instruction::Plain { op }
    }

    pub fn memory(op: Opcode, memarg: MemArg) -> Instruction {
        Instruction::Memory { op, memarg }
    }

    pub fn opcode(&self) -> Opcode {
        use Instruction::*;
        match self {
            Block { .. } => Opcode::Block,
            Loop { .. } => Opcode::Loop,
            If { .. } => Opcode::If,
            Try { .. } => Opcode::Try,
            Br { .. } => Opcode::Br,
            BrIf { .. } => Opcode::BrIf,
            BrTable { .. } => Opcode::BrTable,
            Rethrow { .. } => Opcode::Rethrow,
            Throw { .. } => Opcode::Throw,
            Call { .. } => Opcode::Call,
            ReturnCall { .. } => Opcode::ReturnCall,
            CallIndirect { .. } => Opcode::CallIndirect,
            ReturnCallIndirect { .. } => Opcode::ReturnCallIndirect,
            SelectTyped { .. } => Opcode::SelectTyped,
            LocalGet { .. } => Opcode::LocalGet,
            LocalSet { .. } => Opcode::LocalSet,
            LocalTee { .. } => Opcode::LocalTee,
            GlobalGet { .. } => Opcode::GlobalGet,
            GlobalSet { .. } => Opcode::GlobalSet,
            TableGet { .. } => Opcode::TableGet,
            TableSet { .. } => Opcode::TableSet,
            TableGrow { .. } => Opcode::TableGrow,
            TableSize { .. } => Opcode::TableSize,
            TableFill { .. } => Opcode::TableFill,
            TableInit { .. } => Opcode::TableInit,
            ElemDrop { .. } => Opcode::ElemDrop,
            TableCopy { .. } => Opcode::TableCopy,
            MemoryInit { .. } => Opcode::MemoryInit,
            DataDrop { .. } => Opcode::DataDrop,
            RefNull { .. } => Opcode::RefNull,
            RefFunc { .. } => Opcode::RefFunc,
            I32Const { .. } => Opcode::I32Const,
            I64Const { .. } => Opcode::I64Const,
            F32Const { .. } => Opcode::F32Const,
            F64Const { .. } => Opcode::F64Const,
            V128Const { .. } => Opcode::V128Const,
            I8x16Shuffle { .. } => Opcode::I8x16Shuffle,
            Memory { op, .. } | MemoryLane { op, .. } | Lane { op, .. } | Plain { op } => *op,
        }
    }

    pub fn mnemonic(&self) -> &'static str {
        self.opcode().mnemonic()
    }

    pub fn descriptor(&self) -> &'static Descriptor {
        self.opcode().descriptor()
    }

    /// Nested instruction lists, in wire order.
    pub fn bodies(&self) -> Vec<&[Instruction]> {
        match self {
            Instruction::Block { body, .. } | Instruction::Loop { body, .. } => vec![body.as_slice()],
            Instruction::If { then_body, else_body, .. } => {
                let mut bodies = vec![then_body.as_slice()];
                if let Some(else_body) = else_body {
                    bodies.push(else_body.as_slice());
                }
                bodies
            }
            Instruction::Try { body, catches, catch_all, .. } => {
                let mut bodies = vec![body.as_slice()];
                bodies.extend(catches.iter().map(|c| c.body.as_slice()));
                if let Some(catch_all) = catch_all {
                    bodies.push(catch_all.as_slice());
                }
                bodies
            }
            _ => Vec::new(),
        }
    }

    pub fn bodies_mut(&mut self) -> Vec<&mut Vec<Instruction>> {
        match self {
            Instruction::Block { body, .. } | Instruction::Loop { body, .. } => vec![body],
            Instruction::If { then_body, else_body, .. } => {
                let mut bodies = vec![then_body];
                if let Some(else_body) = else_body {
                    bodies.push(else_body);
                }
                bodies
            }
            Instruction::Try { body, catches, catch_all, .. } => {
                let mut bodies = vec![body];
                bodies.extend(catches.iter_mut().map(|c| &mut c.body));
                if let Some(catch_all) = catch_all {
                    bodies.push(catch_all);
                }
                bodies
            }
            _ => Vec::new(),
        }
    }
}

/// Visits every instruction, parents before their nested bodies.
pub fn walk_instructions<'a, F>(instructions: &'a [Instruction], visit: &mut F)
where
    F: FnMut(&'a Instruction),
{
    for inst in instructions {
        visit(inst);
        for body in inst.bodies() {
            walk_instructions(body, visit);
        }
    }
}

pub fn walk_instructions_mut<F>(instructions: &mut [Instruction], visit: &mut F)
where
    F: FnMut(&mut Instruction),
{
    for inst in instructions.iter_mut() {
        visit(inst);
        for body in inst.bodies_mut() {
            walk_instructions_mut(body, visit);
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;

        write!(f, "{}", self.mnemonic())?;

        match self {
            Block { block_type, .. } | Loop { block_type, .. } | If { block_type, .. } | Try { block_type, .. } => {
                write!(f, "{block_type}")
            }
            Br { depth } | BrIf { depth } | Rethrow { depth } => write!(f, " {depth}"),
            BrTable { targets, default } => {
                for target in targets {
                    write!(f, " {target}")?;
                }
                write!(f, " {default}")
            }
            Throw { tag } => write!(f, " {tag}"),
            Call { func } | ReturnCall { func } | RefFunc { func } => write!(f, " {func}"),
            CallIndirect { type_id, table } | ReturnCallIndirect { type_id, table } => {
                write!(f, " {table} (type {type_id})")
            }
            RefNull { ref_type } => match ref_type {
                RefType::FuncRef => write!(f, " func"),
                RefType::ExternRef => write!(f, " extern"),
            },
            SelectTyped { types } => {
                for vt in types {
                    write!(f, " {vt}")?;
                }
                Ok(())
            }
            LocalGet { local } | LocalSet { local } | LocalTee { local } => write!(f, " {}", local.0),
            GlobalGet { global } | GlobalSet { global } => write!(f, " {global}"),
            TableGet { table } | TableSet { table } | TableGrow { table } | TableSize { table } | TableFill { table } => {
                write!(f, " {table}")
            }
            TableInit { elem, table } => write!(f, " {table} {elem}"),
            ElemDrop { elem } => write!(f, " {elem}"),
            TableCopy { dst, src } => write!(f, " {dst} {src}"),
            MemoryInit { data } | DataDrop { data } => write!(f, " {data}"),
            I32Const { value } => write!(f, " {value}"),
            I64Const { value } => write!(f, " {value}"),
            F32Const { bits } => write!(f, " {}", f32::from_bits(*bits).to_hex()),
            F64Const { bits } => write!(f, " {}", f64::from_bits(*bits).to_hex()),
            V128Const { bytes } => {
                write!(f, " i8x16")?;
                for byte in bytes {
                    write!(f, " {byte:#04x}")?;
                }
                Ok(())
            }
            I8x16Shuffle { lanes } => {
                for lane in lanes {
                    write!(f, " {lane}")?;
                }
                Ok(())
            }
            Memory { memarg, .. } => write_memarg(f, memarg),
            MemoryLane { memarg, lane, .. } => {
                write_memarg(f, memarg)?;
                write!(f, " {lane}")
            }
            Lane { lane, .. } => write!(f, " {lane}"),
            Plain { .. } => Ok(()),
        }
    }
}

fn write_memarg(f: &mut fmt::Formatter<'_>, memarg: &MemArg) -> fmt::Result {
    if memarg.offset != 0 {
        write!(f, " offset={}", memarg.offset)?;
    }
    write!(f, " align={}", 1u64 << memarg.align.min(63))
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockType::Empty => Ok(()),
            BlockType::Value(vt) => write!(f, " (result {vt})"),
            BlockType::Type(type_id) => write!(f, " (type {type_id})"),
        }
    }
}
