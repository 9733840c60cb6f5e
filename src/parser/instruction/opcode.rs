//! Opcode descriptor table.
//!
//! Every opcode the codec understands is listed once in the `opcodes!`
//! invocation below. Single-byte opcodes use their byte as the code;
//! prefixed opcodes (0xFC, 0xFD, 0xFE) use `(prefix << 8) | sub_opcode`.
//! New proposals are supported by adding rows here and, when they introduce
//! a new immediate shape, a leaf case in the decoder and encoder.
//!
//! Row layout:
//!
//! ```text
//! Variant = code "mnemonic" Category Immediate pull push Align FLAGS;
//! ```
//!
//! `pull`/`push` are `[]` (nothing), `[T ...]` (fixed value types, deepest
//! first) or `{Computed}` (resolved from the enclosing function and the
//! instruction's own immediates).

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use once_cell::sync::Lazy;
use thiserror::Error;

use crate::parser::types::ValueType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Control,
    Parametric,
    Variable,
    Table,
    Memory,
    Numeric,
    Vector,
    Reference,
    Exception,
    Atomic,
}

/// Shape of the immediates that follow an opcode on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Immediate {
    None,
    /// 0x40, a value type byte, or a signed 33-bit type index
    BlockType,
    Label,
    /// vec(labelidx) labelidx
    LabelTable,
    Function,
    /// typeidx tableidx
    CallIndirect,
    Tag,
    /// vec(valtype), `select t*`
    ValueTypes,
    Local,
    Global,
    Table,
    /// elemidx tableidx
    TableInit,
    Elem,
    /// dst tableidx, src tableidx
    TableCopy,
    Data,
    /// dataidx 0x00
    MemoryInit,
    RefType,
    MemArg,
    /// memarg laneidx
    MemArgLane,
    Lane,
    /// one reserved 0x00 (memory index placeholder)
    ReservedByte,
    /// two reserved 0x00 bytes
    ReservedBytes2,
    I32,
    I64,
    F32,
    F64,
    V128,
    /// 16 lane indices
    Shuffle,
}

impl Immediate {
    /// Number of reserved zero bytes the immediate carries.
    pub fn reserved_bytes(self) -> usize {
        match self {
            Immediate::ReservedByte | Immediate::MemoryInit => 1,
            Immediate::ReservedBytes2 => 2,
            _ => 0,
        }
    }
}

/// Stack effect that depends on the surrounding module, function or the
/// instruction's own immediates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Computed {
    BlockParams,
    BlockResults,
    /// block params plus the i32 condition
    IfParams,
    TagParams,
    CallParams,
    CallResults,
    /// callee params plus the i32 table slot
    CallIndirectParams,
    CallIndirectResults,
    /// a single operand of any type (`drop`, `ref.is_null`)
    Operand,
    /// two operands of one type plus the i32 condition
    Select,
    SelectResult,
    LocalType,
    GlobalType,
    /// the element type of the instruction's table
    TableElem,
    /// [i32 ref]
    TableSet,
    /// [ref i32]
    TableGrow,
    /// [i32 ref i32]
    TableFill,
    RefNullType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StackSpec {
    None,
    One(ValueType),
    Many(&'static [ValueType]),
    Computed(Computed),
}

impl StackSpec {
    /// Arity when it does not depend on context.
    pub fn fixed_arity(&self) -> Option<usize> {
        match self {
            StackSpec::None => Some(0),
            StackSpec::One(_) => Some(1),
            StackSpec::Many(types) => Some(types.len()),
            StackSpec::Computed(_) => None,
        }
    }
}

/// Natural alignment of a memory access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Align {
    A0,
    A8,
    A16,
    A32,
    A64,
    A128,
}

impl Align {
    /// The memarg alignment exponent for a naturally aligned access.
    pub fn log2(self) -> Option<u32> {
        match self {
            Align::A0 => None,
            Align::A8 => Some(0),
            Align::A16 => Some(1),
            Align::A32 => Some(2),
            Align::A64 => Some(3),
            Align::A128 => Some(4),
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Flags: u8 {
        const MEMARG = 0b0001;
        const READS = 0b0010;
        const WRITES = 0b0100;
        const TRAPS = 0b1000;

        const LOAD = Self::MEMARG.bits() | Self::READS.bits() | Self::TRAPS.bits();
        const STORE = Self::MEMARG.bits() | Self::WRITES.bits() | Self::TRAPS.bits();
        const RMW = Self::LOAD.bits() | Self::WRITES.bits();
        const FILL = Self::WRITES.bits() | Self::TRAPS.bits();
        const COPY = Self::READS.bits() | Self::WRITES.bits() | Self::TRAPS.bits();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor {
    pub code: u16,
    pub name: &'static str,
    pub category: Category,
    pub immediate: Immediate,
    pub pull: StackSpec,
    pub push: StackSpec,
    pub align: Align,
    pub flags: Flags,
}

macro_rules! stack {
    ([]) => {
        StackSpec::None
    };
    ([$t:ident]) => {
        StackSpec::One(ValueType::$t)
    };
    ([$($t:ident)+]) => {
        StackSpec::Many(&[$(ValueType::$t),+])
    };
    ({$c:ident}) => {
        StackSpec::Computed(Computed::$c)
    };
}

macro_rules! flags {
    (NONE) => {
        Flags::empty()
    };
    ($f:ident) => {
        Flags::$f
    };
}

macro_rules! opcodes {
    ($($variant:ident = $code:literal $name:literal $cat:ident $imm:ident $pull:tt $push:tt $align:ident $flags:ident;)*) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Opcode {
            $($variant,)*
        }

        static DESCRIPTORS: &[Descriptor] = &[
            $(Descriptor {
                code: $code,
                name: $name,
                category: Category::$cat,
                immediate: Immediate::$imm,
                pull: stack!($pull),
                push: stack!($push),
                align: Align::$align,
                flags: flags!($flags),
            },)*
        ];

        impl Opcode {
            /// Every opcode, in table order.
            pub const ALL: &'static [Opcode] = &[$(Opcode::$variant,)*];

            pub fn from_code(code: u16) -> Option<Opcode> {
                match code {
                    $($code => Some(Opcode::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

opcodes! {
    Unreachable = 0x00 "unreachable" Control None [] [] A0 TRAPS;
    Nop = 0x01 "nop" Control None [] [] A0 NONE;
    Block = 0x02 "block" Control BlockType {BlockParams} {BlockResults} A0 NONE;
    Loop = 0x03 "loop" Control BlockType {BlockParams} {BlockResults} A0 NONE;
    If = 0x04 "if" Control BlockType {IfParams} {BlockResults} A0 NONE;
    Else = 0x05 "else" Control None [] [] A0 NONE;
    Try = 0x06 "try" Exception BlockType {BlockParams} {BlockResults} A0 NONE;
    Catch = 0x07 "catch" Exception Tag [] {TagParams} A0 NONE;
    Throw = 0x08 "throw" Exception Tag {TagParams} [] A0 TRAPS;
    Rethrow = 0x09 "rethrow" Exception Label [] [] A0 TRAPS;
    End = 0x0B "end" Control None [] [] A0 NONE;
    Br = 0x0C "br" Control Label [] [] A0 NONE;
    BrIf = 0x0D "br_if" Control Label [I32] [] A0 NONE;
    BrTable = 0x0E "br_table" Control LabelTable [I32] [] A0 NONE;
    Return = 0x0F "return" Control None [] [] A0 NONE;
    Call = 0x10 "call" Control Function {CallParams} {CallResults} A0 TRAPS;
    CallIndirect = 0x11 "call_indirect" Control CallIndirect {CallIndirectParams} {CallIndirectResults} A0 TRAPS;
    ReturnCall = 0x12 "return_call" Control Function {CallParams} [] A0 TRAPS;
    ReturnCallIndirect = 0x13 "return_call_indirect" Control CallIndirect {CallIndirectParams} [] A0 TRAPS;
    Delegate = 0x18 "delegate" Exception Label [] [] A0 NONE;
    CatchAll = 0x19 "catch_all" Exception None [] [] A0 NONE;
    Drop = 0x1A "drop" Parametric None {Operand} [] A0 NONE;
    Select = 0x1B "select" Parametric None {Select} {SelectResult} A0 NONE;
    SelectTyped = 0x1C "select" Parametric ValueTypes {Select} {SelectResult} A0 NONE;
    LocalGet = 0x20 "local.get" Variable Local [] {LocalType} A0 NONE;
    LocalSet = 0x21 "local.set" Variable Local {LocalType} [] A0 NONE;
    LocalTee = 0x22 "local.tee" Variable Local {LocalType} {LocalType} A0 NONE;
    GlobalGet = 0x23 "global.get" Variable Global [] {GlobalType} A0 NONE;
    GlobalSet = 0x24 "global.set" Variable Global {GlobalType} [] A0 NONE;
    TableGet = 0x25 "table.get" Table Table [I32] {TableElem} A0 TRAPS;
    TableSet = 0x26 "table.set" Table Table {TableSet} [] A0 TRAPS;
    I32Load = 0x28 "i32.load" Memory MemArg [I32] [I32] A32 LOAD;
    I64Load = 0x29 "i64.load" Memory MemArg [I32] [I64] A64 LOAD;
    F32Load = 0x2A "f32.load" Memory MemArg [I32] [F32] A32 LOAD;
    F64Load = 0x2B "f64.load" Memory MemArg [I32] [F64] A64 LOAD;
    I32Load8S = 0x2C "i32.load8_s" Memory MemArg [I32] [I32] A8 LOAD;
    I32Load8U = 0x2D "i32.load8_u" Memory MemArg [I32] [I32] A8 LOAD;
    I32Load16S = 0x2E "i32.load16_s" Memory MemArg [I32] [I32] A16 LOAD;
    I32Load16U = 0x2F "i32.load16_u" Memory MemArg [I32] [I32] A16 LOAD;
    I64Load8S = 0x30 "i64.load8_s" Memory MemArg [I32] [I64] A8 LOAD;
    I64Load8U = 0x31 "i64.load8_u" Memory MemArg [I32] [I64] A8 LOAD;
    I64Load16S = 0x32 "i64.load16_s" Memory MemArg [I32] [I64] A16 LOAD;
    I64Load16U = 0x33 "i64.load16_u" Memory MemArg [I32] [I64] A16 LOAD;
    I64Load32S = 0x34 "i64.load32_s" Memory MemArg [I32] [I64] A32 LOAD;
    I64Load32U = 0x35 "i64.load32_u" Memory MemArg [I32] [I64] A32 LOAD;
    I32Store = 0x36 "i32.store" Memory MemArg [I32 I32] [] A32 STORE;
    I64Store = 0x37 "i64.store" Memory MemArg [I32 I64] [] A64 STORE;
    F32Store = 0x38 "f32.store" Memory MemArg [I32 F32] [] A32 STORE;
    F64Store = 0x39 "f64.store" Memory MemArg [I32 F64] [] A64 STORE;
    I32Store8 = 0x3A "i32.store8" Memory MemArg [I32 I32] [] A8 STORE;
    I32Store16 = 0x3B "i32.store16" Memory MemArg [I32 I32] [] A16 STORE;
    I64Store8 = 0x3C "i64.store8" Memory MemArg [I32 I64] [] A8 STORE;
    I64Store16 = 0x3D "i64.store16" Memory MemArg [I32 I64] [] A16 STORE;
    I64Store32 = 0x3E "i64.store32" Memory MemArg [I32 I64] [] A32 STORE;
    MemorySize = 0x3F "memory.size" Memory ReservedByte [] [I32] A0 NONE;
    MemoryGrow = 0x40 "memory.grow" Memory ReservedByte [I32] [I32] A0 NONE;
    I32Const = 0x41 "i32.const" Numeric I32 [] [I32] A0 NONE;
    I64Const = 0x42 "i64.const" Numeric I64 [] [I64] A0 NONE;
    F32Const = 0x43 "f32.const" Numeric F32 [] [F32] A0 NONE;
    F64Const = 0x44 "f64.const" Numeric F64 [] [F64] A0 NONE;
    I32Eqz = 0x45 "i32.eqz" Numeric None [I32] [I32] A0 NONE;
    I32Eq = 0x46 "i32.eq" Numeric None [I32 I32] [I32] A0 NONE;
    I32Ne = 0x47 "i32.ne" Numeric None [I32 I32] [I32] A0 NONE;
    I32LtS = 0x48 "i32.lt_s" Numeric None [I32 I32] [I32] A0 NONE;
    I32LtU = 0x49 "i32.lt_u" Numeric None [I32 I32] [I32] A0 NONE;
    I32GtS = 0x4A "i32.gt_s" Numeric None [I32 I32] [I32] A0 NONE;
    I32GtU = 0x4B "i32.gt_u" Numeric None [I32 I32] [I32] A0 NONE;
    I32LeS = 0x4C "i32.le_s" Numeric None [I32 I32] [I32] A0 NONE;
    I32LeU = 0x4D "i32.le_u" Numeric None [I32 I32] [I32] A0 NONE;
    I32GeS = 0x4E "i32.ge_s" Numeric None [I32 I32] [I32] A0 NONE;
    I32GeU = 0x4F "i32.ge_u" Numeric None [I32 I32] [I32] A0 NONE;
    I64Eqz = 0x50 "i64.eqz" Numeric None [I64] [I32] A0 NONE;
    I64Eq = 0x51 "i64.eq" Numeric None [I64 I64] [I32] A0 NONE;
    I64Ne = 0x52 "i64.ne" Numeric None [I64 I64] [I32] A0 NONE;
    I64LtS = 0x53 "i64.lt_s" Numeric None [I64 I64] [I32] A0 NONE;
    I64LtU = 0x54 "i64.lt_u" Numeric None [I64 I64] [I32] A0 NONE;
    I64GtS = 0x55 "i64.gt_s" Numeric None [I64 I64] [I32] A0 NONE;
    I64GtU = 0x56 "i64.gt_u" Numeric None [I64 I64] [I32] A0 NONE;
    I64LeS = 0x57 "i64.le_s" Numeric None [I64 I64] [I32] A0 NONE;
    I64LeU = 0x58 "i64.le_u" Numeric None [I64 I64] [I32] A0 NONE;
    I64GeS = 0x59 "i64.ge_s" Numeric None [I64 I64] [I32] A0 NONE;
    I64GeU = 0x5A "i64.ge_u" Numeric None [I64 I64] [I32] A0 NONE;
    F32Eq = 0x5B "f32.eq" Numeric None [F32 F32] [I32] A0 NONE;
    F32Ne = 0x5C "f32.ne" Numeric None [F32 F32] [I32] A0 NONE;
    F32Lt = 0x5D "f32.lt" Numeric None [F32 F32] [I32] A0 NONE;
    F32Gt = 0x5E "f32.gt" Numeric None [F32 F32] [I32] A0 NONE;
    F32Le = 0x5F "f32.le" Numeric None [F32 F32] [I32] A0 NONE;
    F32Ge = 0x60 "f32.ge" Numeric None [F32 F32] [I32] A0 NONE;
    F64Eq = 0x61 "f64.eq" Numeric None [F64 F64] [I32] A0 NONE;
    F64Ne = 0x62 "f64.ne" Numeric None [F64 F64] [I32] A0 NONE;
    F64Lt = 0x63 "f64.lt" Numeric None [F64 F64] [I32] A0 NONE;
    F64Gt = 0x64 "f64.gt" Numeric None [F64 F64] [I32] A0 NONE;
    F64Le = 0x65 "f64.le" Numeric None [F64 F64] [I32] A0 NONE;
    F64Ge = 0x66 "f64.ge" Numeric None [F64 F64] [I32] A0 NONE;
    I32Clz = 0x67 "i32.clz" Numeric None [I32] [I32] A0 NONE;
    I32Ctz = 0x68 "i32.ctz" Numeric None [I32] [I32] A0 NONE;
    I32Popcnt = 0x69 "i32.popcnt" Numeric None [I32] [I32] A0 NONE;
    I32Add = 0x6A "i32.add" Numeric None [I32 I32] [I32] A0 NONE;
    I32Sub = 0x6B "i32.sub" Numeric None [I32 I32] [I32] A0 NONE;
    I32Mul = 0x6C "i32.mul" Numeric None [I32 I32] [I32] A0 NONE;
    I32DivS = 0x6D "i32.div_s" Numeric None [I32 I32] [I32] A0 TRAPS;
    I32DivU = 0x6E "i32.div_u" Numeric None [I32 I32] [I32] A0 TRAPS;
    I32RemS = 0x6F "i32.rem_s" Numeric None [I32 I32] [I32] A0 TRAPS;
    I32RemU = 0x70 "i32.rem_u" Numeric None [I32 I32] [I32] A0 TRAPS;
    I32And = 0x71 "i32.and" Numeric None [I32 I32] [I32] A0 NONE;
    I32Or = 0x72 "i32.or" Numeric None [I32 I32] [I32] A0 NONE;
    I32Xor = 0x73 "i32.xor" Numeric None [I32 I32] [I32] A0 NONE;
    I32Shl = 0x74 "i32.shl" Numeric None [I32 I32] [I32] A0 NONE;
    I32ShrS = 0x75 "i32.shr_s" Numeric None [I32 I32] [I32] A0 NONE;
    I32ShrU = 0x76 "i32.shr_u" Numeric None [I32 I32] [I32] A0 NONE;
    I32Rotl = 0x77 "i32.rotl" Numeric None [I32 I32] [I32] A0 NONE;
    I32Rotr = 0x78 "i32.rotr" Numeric None [I32 I32] [I32] A0 NONE;
    I64Clz = 0x79 "i64.clz" Numeric None [I64] [I64] A0 NONE;
    I64Ctz = 0x7A "i64.ctz" Numeric None [I64] [I64] A0 NONE;
    I64Popcnt = 0x7B "i64.popcnt" Numeric None [I64] [I64] A0 NONE;
    I64Add = 0x7C "i64.add" Numeric None [I64 I64] [I64] A0 NONE;
    I64Sub = 0x7D "i64.sub" Numeric None [I64 I64] [I64] A0 NONE;
    I64Mul = 0x7E "i64.mul" Numeric None [I64 I64] [I64] A0 NONE;
    I64DivS = 0x7F "i64.div_s" Numeric None [I64 I64] [I64] A0 TRAPS;
    I64DivU = 0x80 "i64.div_u" Numeric None [I64 I64] [I64] A0 TRAPS;
    I64RemS = 0x81 "i64.rem_s" Numeric None [I64 I64] [I64] A0 TRAPS;
    I64RemU = 0x82 "i64.rem_u" Numeric None [I64 I64] [I64] A0 TRAPS;
    I64And = 0x83 "i64.and" Numeric None [I64 I64] [I64] A0 NONE;
    I64Or = 0x84 "i64.or" Numeric None [I64 I64] [I64] A0 NONE;
    I64Xor = 0x85 "i64.xor" Numeric None [I64 I64] [I64] A0 NONE;
    I64Shl = 0x86 "i64.shl" Numeric None [I64 I64] [I64] A0 NONE;
    I64ShrS = 0x87 "i64.shr_s" Numeric None [I64 I64] [I64] A0 NONE;
    I64ShrU = 0x88 "i64.shr_u" Numeric None [I64 I64] [I64] A0 NONE;
    I64Rotl = 0x89 "i64.rotl" Numeric None [I64 I64] [I64] A0 NONE;
    I64Rotr = 0x8A "i64.rotr" Numeric None [I64 I64] [I64] A0 NONE;
    F32Abs = 0x8B "f32.abs" Numeric None [F32] [F32] A0 NONE;
    F32Neg = 0x8C "f32.neg" Numeric None [F32] [F32] A0 NONE;
    F32Ceil = 0x8D "f32.ceil" Numeric None [F32] [F32] A0 NONE;
    F32Floor = 0x8E "f32.floor" Numeric None [F32] [F32] A0 NONE;
    F32Trunc = 0x8F "f32.trunc" Numeric None [F32] [F32] A0 NONE;
    F32Nearest = 0x90 "f32.nearest" Numeric None [F32] [F32] A0 NONE;
    F32Sqrt = 0x91 "f32.sqrt" Numeric None [F32] [F32] A0 NONE;
    F32Add = 0x92 "f32.add" Numeric None [F32 F32] [F32] A0 NONE;
    F32Sub = 0x93 "f32.sub" Numeric None [F32 F32] [F32] A0 NONE;
    F32Mul = 0x94 "f32.mul" Numeric None [F32 F32] [F32] A0 NONE;
    F32Div = 0x95 "f32.div" Numeric None [F32 F32] [F32] A0 NONE;
    F32Min = 0x96 "f32.min" Numeric None [F32 F32] [F32] A0 NONE;
    F32Max = 0x97 "f32.max" Numeric None [F32 F32] [F32] A0 NONE;
    F32Copysign = 0x98 "f32.copysign" Numeric None [F32 F32] [F32] A0 NONE;
    F64Abs = 0x99 "f64.abs" Numeric None [F64] [F64] A0 NONE;
    F64Neg = 0x9A "f64.neg" Numeric None [F64] [F64] A0 NONE;
    F64Ceil = 0x9B "f64.ceil" Numeric None [F64] [F64] A0 NONE;
    F64Floor = 0x9C "f64.floor" Numeric None [F64] [F64] A0 NONE;
    F64Trunc = 0x9D "f64.trunc" Numeric None [F64] [F64] A0 NONE;
    F64Nearest = 0x9E "f64.nearest" Numeric None [F64] [F64] A0 NONE;
    F64Sqrt = 0x9F "f64.sqrt" Numeric None [F64] [F64] A0 NONE;
    F64Add = 0xA0 "f64.add" Numeric None [F64 F64] [F64] A0 NONE;
    F64Sub = 0xA1 "f64.sub" Numeric None [F64 F64] [F64] A0 NONE;
    F64Mul = 0xA2 "f64.mul" Numeric None [F64 F64] [F64] A0 NONE;
    F64Div = 0xA3 "f64.div" Numeric None [F64 F64] [F64] A0 NONE;
    F64Min = 0xA4 "f64.min" Numeric None [F64 F64] [F64] A0 NONE;
    F64Max = 0xA5 "f64.max" Numeric None [F64 F64] [F64] A0 NONE;
    F64Copysign = 0xA6 "f64.copysign" Numeric None [F64 F64] [F64] A0 NONE;
    I32WrapI64 = 0xA7 "i32.wrap_i64" Numeric None [I64] [I32] A0 NONE;
    I32TruncF32S = 0xA8 "i32.trunc_f32_s" Numeric None [F32] [I32] A0 TRAPS;
    I32TruncF32U = 0xA9 "i32.trunc_f32_u" Numeric None [F32] [I32] A0 TRAPS;
    I32TruncF64S = 0xAA "i32.trunc_f64_s" Numeric None [F64] [I32] A0 TRAPS;
    I32TruncF64U = 0xAB "i32.trunc_f64_u" Numeric None [F64] [I32] A0 TRAPS;
    I64ExtendI32S = 0xAC "i64.extend_i32_s" Numeric None [I32] [I64] A0 NONE;
    I64ExtendI32U = 0xAD "i64.extend_i32_u" Numeric None [I32] [I64] A0 NONE;
    I64TruncF32S = 0xAE "i64.trunc_f32_s" Numeric None [F32] [I64] A0 TRAPS;
    I64TruncF32U = 0xAF "i64.trunc_f32_u" Numeric None [F32] [I64] A0 TRAPS;
    I64TruncF64S = 0xB0 "i64.trunc_f64_s" Numeric None [F64] [I64] A0 TRAPS;
    I64TruncF64U = 0xB1 "i64.trunc_f64_u" Numeric None [F64] [I64] A0 TRAPS;
    F32ConvertI32S = 0xB2 "f32.convert_i32_s" Numeric None [I32] [F32] A0 NONE;
    F32ConvertI32U = 0xB3 "f32.convert_i32_u" Numeric None [I32] [F32] A0 NONE;
    F32ConvertI64S = 0xB4 "f32.convert_i64_s" Numeric None [I64] [F32] A0 NONE;
    F32ConvertI64U = 0xB5 "f32.convert_i64_u" Numeric None [I64] [F32] A0 NONE;
    F32DemoteF64 = 0xB6 "f32.demote_f64" Numeric None [F64] [F32] A0 NONE;
    F64ConvertI32S = 0xB7 "f64.convert_i32_s" Numeric None [I32] [F64] A0 NONE;
    F64ConvertI32U = 0xB8 "f64.convert_i32_u" Numeric None [I32] [F64] A0 NONE;
    F64ConvertI64S = 0xB9 "f64.convert_i64_s" Numeric None [I64] [F64] A0 NONE;
    F64ConvertI64U = 0xBA "f64.convert_i64_u" Numeric None [I64] [F64] A0 NONE;
    F64PromoteF32 = 0xBB "f64.promote_f32" Numeric None [F32] [F64] A0 NONE;
    I32ReinterpretF32 = 0xBC "i32.reinterpret_f32" Numeric None [F32] [I32] A0 NONE;
    I64ReinterpretF64 = 0xBD "i64.reinterpret_f64" Numeric None [F64] [I64] A0 NONE;
    F32ReinterpretI32 = 0xBE "f32.reinterpret_i32" Numeric None [I32] [F32] A0 NONE;
    F64ReinterpretI64 = 0xBF "f64.reinterpret_i64" Numeric None [I64] [F64] A0 NONE;
    I32Extend8S = 0xC0 "i32.extend8_s" Numeric None [I32] [I32] A0 NONE;
    I32Extend16S = 0xC1 "i32.extend16_s" Numeric None [I32] [I32] A0 NONE;
    I64Extend8S = 0xC2 "i64.extend8_s" Numeric None [I64] [I64] A0 NONE;
    I64Extend16S = 0xC3 "i64.extend16_s" Numeric None [I64] [I64] A0 NONE;
    I64Extend32S = 0xC4 "i64.extend32_s" Numeric None [I64] [I64] A0 NONE;
    RefNull = 0xD0 "ref.null" Reference RefType [] {RefNullType} A0 NONE;
    RefIsNull = 0xD1 "ref.is_null" Reference None {Operand} [I32] A0 NONE;
    RefFunc = 0xD2 "ref.func" Reference Function [] [FuncRef] A0 NONE;
    I32TruncSatF32S = 0xFC00 "i32.trunc_sat_f32_s" Numeric None [F32] [I32] A0 NONE;
    I32TruncSatF32U = 0xFC01 "i32.trunc_sat_f32_u" Numeric None [F32] [I32] A0 NONE;
    I32TruncSatF64S = 0xFC02 "i32.trunc_sat_f64_s" Numeric None [F64] [I32] A0 NONE;
    I32TruncSatF64U = 0xFC03 "i32.trunc_sat_f64_u" Numeric None [F64] [I32] A0 NONE;
    I64TruncSatF32S = 0xFC04 "i64.trunc_sat_f32_s" Numeric None [F32] [I64] A0 NONE;
    I64TruncSatF32U = 0xFC05 "i64.trunc_sat_f32_u" Numeric None [F32] [I64] A0 NONE;
    I64TruncSatF64S = 0xFC06 "i64.trunc_sat_f64_s" Numeric None [F64] [I64] A0 NONE;
    I64TruncSatF64U = 0xFC07 "i64.trunc_sat_f64_u" Numeric None [F64] [I64] A0 NONE;
    MemoryInit = 0xFC08 "memory.init" Memory MemoryInit [I32 I32 I32] [] A0 FILL;
    DataDrop = 0xFC09 "data.drop" Memory Data [] [] A0 NONE;
    MemoryCopy = 0xFC0A "memory.copy" Memory ReservedBytes2 [I32 I32 I32] [] A0 COPY;
    MemoryFill = 0xFC0B "memory.fill" Memory ReservedByte [I32 I32 I32] [] A0 FILL;
    TableInit = 0xFC0C "table.init" Table TableInit [I32 I32 I32] [] A0 TRAPS;
    ElemDrop = 0xFC0D "elem.drop" Table Elem [] [] A0 NONE;
    TableCopy = 0xFC0E "table.copy" Table TableCopy [I32 I32 I32] [] A0 TRAPS;
    TableGrow = 0xFC0F "table.grow" Table Table {TableGrow} [I32] A0 NONE;
    TableSize = 0xFC10 "table.size" Table Table [] [I32] A0 NONE;
    TableFill = 0xFC11 "table.fill" Table Table {TableFill} [] A0 TRAPS;
    V128Load = 0xFD00 "v128.load" Vector MemArg [I32] [V128] A128 LOAD;
    V128Load8x8S = 0xFD01 "v128.load8x8_s" Vector MemArg [I32] [V128] A64 LOAD;
    V128Load8x8U = 0xFD02 "v128.load8x8_u" Vector MemArg [I32] [V128] A64 LOAD;
    V128Load16x4S = 0xFD03 "v128.load16x4_s" Vector MemArg [I32] [V128] A64 LOAD;
    V128Load16x4U = 0xFD04 "v128.load16x4_u" Vector MemArg [I32] [V128] A64 LOAD;
    V128Load32x2S = 0xFD05 "v128.load32x2_s" Vector MemArg [I32] [V128] A64 LOAD;
    V128Load32x2U = 0xFD06 "v128.load32x2_u" Vector MemArg [I32] [V128] A64 LOAD;
    V128Load8Splat = 0xFD07 "v128.load8_splat" Vector MemArg [I32] [V128] A8 LOAD;
    V128Load16Splat = 0xFD08 "v128.load16_splat" Vector MemArg [I32] [V128] A16 LOAD;
    V128Load32Splat = 0xFD09 "v128.load32_splat" Vector MemArg [I32] [V128] A32 LOAD;
    V128Load64Splat = 0xFD0A "v128.load64_splat" Vector MemArg [I32] [V128] A64 LOAD;
    V128Store = 0xFD0B "v128.store" Vector MemArg [I32 V128] [] A128 STORE;
    V128Const = 0xFD0C "v128.const" Vector V128 [] [V128] A0 NONE;
    I8x16Shuffle = 0xFD0D "i8x16.shuffle" Vector Shuffle [V128 V128] [V128] A0 NONE;
    I8x16Swizzle = 0xFD0E "i8x16.swizzle" Vector None [V128 V128] [V128] A0 NONE;
    I8x16Splat = 0xFD0F "i8x16.splat" Vector None [I32] [V128] A0 NONE;
    I16x8Splat = 0xFD10 "i16x8.splat" Vector None [I32] [V128] A0 NONE;
    I32x4Splat = 0xFD11 "i32x4.splat" Vector None [I32] [V128] A0 NONE;
    I64x2Splat = 0xFD12 "i64x2.splat" Vector None [I64] [V128] A0 NONE;
    F32x4Splat = 0xFD13 "f32x4.splat" Vector None [F32] [V128] A0 NONE;
    F64x2Splat = 0xFD14 "f64x2.splat" Vector None [F64] [V128] A0 NONE;
    I8x16ExtractLaneS = 0xFD15 "i8x16.extract_lane_s" Vector Lane [V128] [I32] A0 NONE;
    I8x16ExtractLaneU = 0xFD16 "i8x16.extract_lane_u" Vector Lane [V128] [I32] A0 NONE;
    I8x16ReplaceLane = 0xFD17 "i8x16.replace_lane" Vector Lane [V128 I32] [V128] A0 NONE;
    I16x8ExtractLaneS = 0xFD18 "i16x8.extract_lane_s" Vector Lane [V128] [I32] A0 NONE;
    I16x8ExtractLaneU = 0xFD19 "i16x8.extract_lane_u" Vector Lane [V128] [I32] A0 NONE;
    I16x8ReplaceLane = 0xFD1A "i16x8.replace_lane" Vector Lane [V128 I32] [V128] A0 NONE;
    I32x4ExtractLane = 0xFD1B "i32x4.extract_lane" Vector Lane [V128] [I32] A0 NONE;
    I32x4ReplaceLane = 0xFD1C "i32x4.replace_lane" Vector Lane [V128 I32] [V128] A0 NONE;
    I64x2ExtractLane = 0xFD1D "i64x2.extract_lane" Vector Lane [V128] [I64] A0 NONE;
    I64x2ReplaceLane = 0xFD1E "i64x2.replace_lane" Vector Lane [V128 I64] [V128] A0 NONE;
    F32x4ExtractLane = 0xFD1F "f32x4.extract_lane" Vector Lane [V128] [F32] A0 NONE;
    F32x4ReplaceLane = 0xFD20 "f32x4.replace_lane" Vector Lane [V128 F32] [V128] A0 NONE;
    F64x2ExtractLane = 0xFD21 "f64x2.extract_lane" Vector Lane [V128] [F64] A0 NONE;
    F64x2ReplaceLane = 0xFD22 "f64x2.replace_lane" Vector Lane [V128 F64] [V128] A0 NONE;
    I8x16Eq = 0xFD23 "i8x16.eq" Vector None [V128 V128] [V128] A0 NONE;
    I8x16Ne = 0xFD24 "i8x16.ne" Vector None [V128 V128] [V128] A0 NONE;
    I8x16LtS = 0xFD25 "i8x16.lt_s" Vector None [V128 V128] [V128] A0 NONE;
    I8x16LtU = 0xFD26 "i8x16.lt_u" Vector None [V128 V128] [V128] A0 NONE;
    I8x16GtS = 0xFD27 "i8x16.gt_s" Vector None [V128 V128] [V128] A0 NONE;
    I8x16GtU = 0xFD28 "i8x16.gt_u" Vector None [V128 V128] [V128] A0 NONE;
    I8x16LeS = 0xFD29 "i8x16.le_s" Vector None [V128 V128] [V128] A0 NONE;
    I8x16LeU = 0xFD2A "i8x16.le_u" Vector None [V128 V128] [V128] A0 NONE;
    I8x16GeS = 0xFD2B "i8x16.ge_s" Vector None [V128 V128] [V128] A0 NONE;
    I8x16GeU = 0xFD2C "i8x16.ge_u" Vector None [V128 V128] [V128] A0 NONE;
    I16x8Eq = 0xFD2D "i16x8.eq" Vector None [V128 V128] [V128] A0 NONE;
    I16x8Ne = 0xFD2E "i16x8.ne" Vector None [V128 V128] [V128] A0 NONE;
    I16x8LtS = 0xFD2F "i16x8.lt_s" Vector None [V128 V128] [V128] A0 NONE;
    I16x8LtU = 0xFD30 "i16x8.lt_u" Vector None [V128 V128] [V128] A0 NONE;
    I16x8GtS = 0xFD31 "i16x8.gt_s" Vector None [V128 V128] [V128] A0 NONE;
    I16x8GtU = 0xFD32 "i16x8.gt_u" Vector None [V128 V128] [V128] A0 NONE;
    I16x8LeS = 0xFD33 "i16x8.le_s" Vector None [V128 V128] [V128] A0 NONE;
    I16x8LeU = 0xFD34 "i16x8.le_u" Vector None [V128 V128] [V128] A0 NONE;
    I16x8GeS = 0xFD35 "i16x8.ge_s" Vector None [V128 V128] [V128] A0 NONE;
    I16x8GeU = 0xFD36 "i16x8.ge_u" Vector None [V128 V128] [V128] A0 NONE;
    I32x4Eq = 0xFD37 "i32x4.eq" Vector None [V128 V128] [V128] A0 NONE;
    I32x4Ne = 0xFD38 "i32x4.ne" Vector None [V128 V128] [V128] A0 NONE;
    I32x4LtS = 0xFD39 "i32x4.lt_s" Vector None [V128 V128] [V128] A0 NONE;
    I32x4LtU = 0xFD3A "i32x4.lt_u" Vector None [V128 V128] [V128] A0 NONE;
    I32x4GtS = 0xFD3B "i32x4.gt_s" Vector None [V128 V128] [V128] A0 NONE;
    I32x4GtU = 0xFD3C "i32x4.gt_u" Vector None [V128 V128] [V128] A0 NONE;
    I32x4LeS = 0xFD3D "i32x4.le_s" Vector None [V128 V128] [V128] A0 NONE;
    I32x4LeU = 0xFD3E "i32x4.le_u" Vector None [V128 V128] [V128] A0 NONE;
    I32x4GeS = 0xFD3F "i32x4.ge_s" Vector None [V128 V128] [V128] A0 NONE;
    I32x4GeU = 0xFD40 "i32x4.ge_u" Vector None [V128 V128] [V128] A0 NONE;
    F32x4Eq = 0xFD41 "f32x4.eq" Vector None [V128 V128] [V128] A0 NONE;
    F32x4Ne = 0xFD42 "f32x4.ne" Vector None [V128 V128] [V128] A0 NONE;
    F32x4Lt = 0xFD43 "f32x4.lt" Vector None [V128 V128] [V128] A0 NONE;
    F32x4Gt = 0xFD44 "f32x4.gt" Vector None [V128 V128] [V128] A0 NONE;
    F32x4Le = 0xFD45 "f32x4.le" Vector None [V128 V128] [V128] A0 NONE;
    F32x4Ge = 0xFD46 "f32x4.ge" Vector None [V128 V128] [V128] A0 NONE;
    F64x2Eq = 0xFD47 "f64x2.eq" Vector None [V128 V128] [V128] A0 NONE;
    F64x2Ne = 0xFD48 "f64x2.ne" Vector None [V128 V128] [V128] A0 NONE;
    F64x2Lt = 0xFD49 "f64x2.lt" Vector None [V128 V128] [V128] A0 NONE;
    F64x2Gt = 0xFD4A "f64x2.gt" Vector None [V128 V128] [V128] A0 NONE;
    F64x2Le = 0xFD4B "f64x2.le" Vector None [V128 V128] [V128] A0 NONE;
    F64x2Ge = 0xFD4C "f64x2.ge" Vector None [V128 V128] [V128] A0 NONE;
    V128Not = 0xFD4D "v128.not" Vector None [V128] [V128] A0 NONE;
    V128And = 0xFD4E "v128.and" Vector None [V128 V128] [V128] A0 NONE;
    V128Andnot = 0xFD4F "v128.andnot" Vector None [V128 V128] [V128] A0 NONE;
    V128Or = 0xFD50 "v128.or" Vector None [V128 V128] [V128] A0 NONE;
    V128Xor = 0xFD51 "v128.xor" Vector None [V128 V128] [V128] A0 NONE;
    V128Bitselect = 0xFD52 "v128.bitselect" Vector None [V128 V128 V128] [V128] A0 NONE;
    V128AnyTrue = 0xFD53 "v128.any_true" Vector None [V128] [I32] A0 NONE;
    V128Load8Lane = 0xFD54 "v128.load8_lane" Vector MemArgLane [I32 V128] [V128] A8 LOAD;
    V128Load16Lane = 0xFD55 "v128.load16_lane" Vector MemArgLane [I32 V128] [V128] A16 LOAD;
    V128Load32Lane = 0xFD56 "v128.load32_lane" Vector MemArgLane [I32 V128] [V128] A32 LOAD;
    V128Load64Lane = 0xFD57 "v128.load64_lane" Vector MemArgLane [I32 V128] [V128] A64 LOAD;
    V128Store8Lane = 0xFD58 "v128.store8_lane" Vector MemArgLane [I32 V128] [] A8 STORE;
    V128Store16Lane = 0xFD59 "v128.store16_lane" Vector MemArgLane [I32 V128] [] A16 STORE;
    V128Store32Lane = 0xFD5A "v128.store32_lane" Vector MemArgLane [I32 V128] [] A32 STORE;
    V128Store64Lane = 0xFD5B "v128.store64_lane" Vector MemArgLane [I32 V128] [] A64 STORE;
    V128Load32Zero = 0xFD5C "v128.load32_zero" Vector MemArg [I32] [V128] A32 LOAD;
    V128Load64Zero = 0xFD5D "v128.load64_zero" Vector MemArg [I32] [V128] A64 LOAD;
    F32x4DemoteF64x2Zero = 0xFD5E "f32x4.demote_f64x2_zero" Vector None [V128] [V128] A0 NONE;
    F64x2PromoteLowF32x4 = 0xFD5F "f64x2.promote_low_f32x4" Vector None [V128] [V128] A0 NONE;
    I8x16Abs = 0xFD60 "i8x16.abs" Vector None [V128] [V128] A0 NONE;
    I8x16Neg = 0xFD61 "i8x16.neg" Vector None [V128] [V128] A0 NONE;
    I8x16Popcnt = 0xFD62 "i8x16.popcnt" Vector None [V128] [V128] A0 NONE;
    I8x16AllTrue = 0xFD63 "i8x16.all_true" Vector None [V128] [I32] A0 NONE;
    I8x16Bitmask = 0xFD64 "i8x16.bitmask" Vector None [V128] [I32] A0 NONE;
    I8x16NarrowI16x8S = 0xFD65 "i8x16.narrow_i16x8_s" Vector None [V128 V128] [V128] A0 NONE;
    I8x16NarrowI16x8U = 0xFD66 "i8x16.narrow_i16x8_u" Vector None [V128 V128] [V128] A0 NONE;
    F32x4Ceil = 0xFD67 "f32x4.ceil" Vector None [V128] [V128] A0 NONE;
    F32x4Floor = 0xFD68 "f32x4.floor" Vector None [V128] [V128] A0 NONE;
    F32x4Trunc = 0xFD69 "f32x4.trunc" Vector None [V128] [V128] A0 NONE;
    F32x4Nearest = 0xFD6A "f32x4.nearest" Vector None [V128] [V128] A0 NONE;
    I8x16Shl = 0xFD6B "i8x16.shl" Vector None [V128 I32] [V128] A0 NONE;
    I8x16ShrS = 0xFD6C "i8x16.shr_s" Vector None [V128 I32] [V128] A0 NONE;
    I8x16ShrU = 0xFD6D "i8x16.shr_u" Vector None [V128 I32] [V128] A0 NONE;
    I8x16Add = 0xFD6E "i8x16.add" Vector None [V128 V128] [V128] A0 NONE;
    I8x16AddSatS = 0xFD6F "i8x16.add_sat_s" Vector None [V128 V128] [V128] A0 NONE;
    I8x16AddSatU = 0xFD70 "i8x16.add_sat_u" Vector None [V128 V128] [V128] A0 NONE;
    I8x16Sub = 0xFD71 "i8x16.sub" Vector None [V128 V128] [V128] A0 NONE;
    I8x16SubSatS = 0xFD72 "i8x16.sub_sat_s" Vector None [V128 V128] [V128] A0 NONE;
    I8x16SubSatU = 0xFD73 "i8x16.sub_sat_u" Vector None [V128 V128] [V128] A0 NONE;
    F64x2Ceil = 0xFD74 "f64x2.ceil" Vector None [V128] [V128] A0 NONE;
    F64x2Floor = 0xFD75 "f64x2.floor" Vector None [V128] [V128] A0 NONE;
    I8x16MinS = 0xFD76 "i8x16.min_s" Vector None [V128 V128] [V128] A0 NONE;
    I8x16MinU = 0xFD77 "i8x16.min_u" Vector None [V128 V128] [V128] A0 NONE;
    I8x16MaxS = 0xFD78 "i8x16.max_s" Vector None [V128 V128] [V128] A0 NONE;
    I8x16MaxU = 0xFD79 "i8x16.max_u" Vector None [V128 V128] [V128] A0 NONE;
    F64x2Trunc = 0xFD7A "f64x2.trunc" Vector None [V128] [V128] A0 NONE;
    I8x16AvgrU = 0xFD7B "i8x16.avgr_u" Vector None [V128 V128] [V128] A0 NONE;
    I16x8ExtaddPairwiseI8x16S = 0xFD7C "i16x8.extadd_pairwise_i8x16_s" Vector None [V128] [V128] A0 NONE;
    I16x8ExtaddPairwiseI8x16U = 0xFD7D "i16x8.extadd_pairwise_i8x16_u" Vector None [V128] [V128] A0 NONE;
    I32x4ExtaddPairwiseI16x8S = 0xFD7E "i32x4.extadd_pairwise_i16x8_s" Vector None [V128] [V128] A0 NONE;
    I32x4ExtaddPairwiseI16x8U = 0xFD7F "i32x4.extadd_pairwise_i16x8_u" Vector None [V128] [V128] A0 NONE;
    I16x8Abs = 0xFD80 "i16x8.abs" Vector None [V128] [V128] A0 NONE;
    I16x8Neg = 0xFD81 "i16x8.neg" Vector None [V128] [V128] A0 NONE;
    I16x8Q15mulrSatS = 0xFD82 "i16x8.q15mulr_sat_s" Vector None [V128 V128] [V128] A0 NONE;
    I16x8AllTrue = 0xFD83 "i16x8.all_true" Vector None [V128] [I32] A0 NONE;
    I16x8Bitmask = 0xFD84 "i16x8.bitmask" Vector None [V128] [I32] A0 NONE;
    I16x8NarrowI32x4S = 0xFD85 "i16x8.narrow_i32x4_s" Vector None [V128 V128] [V128] A0 NONE;
    I16x8NarrowI32x4U = 0xFD86 "i16x8.narrow_i32x4_u" Vector None [V128 V128] [V128] A0 NONE;
    I16x8ExtendLowI8x16S = 0xFD87 "i16x8.extend_low_i8x16_s" Vector None [V128] [V128] A0 NONE;
    I16x8ExtendHighI8x16S = 0xFD88 "i16x8.extend_high_i8x16_s" Vector None [V128] [V128] A0 NONE;
    I16x8ExtendLowI8x16U = 0xFD89 "i16x8.extend_low_i8x16_u" Vector None [V128] [V128] A0 NONE;
    I16x8ExtendHighI8x16U = 0xFD8A "i16x8.extend_high_i8x16_u" Vector None [V128] [V128] A0 NONE;
    I16x8Shl = 0xFD8B "i16x8.shl" Vector None [V128 I32] [V128] A0 NONE;
    I16x8ShrS = 0xFD8C "i16x8.shr_s" Vector None [V128 I32] [V128] A0 NONE;
    I16x8ShrU = 0xFD8D "i16x8.shr_u" Vector None [V128 I32] [V128] A0 NONE;
    I16x8Add = 0xFD8E "i16x8.add" Vector None [V128 V128] [V128] A0 NONE;
    I16x8AddSatS = 0xFD8F "i16x8.add_sat_s" Vector None [V128 V128] [V128] A0 NONE;
    I16x8AddSatU = 0xFD90 "i16x8.add_sat_u" Vector None [V128 V128] [V128] A0 NONE;
    I16x8Sub = 0xFD91 "i16x8.sub" Vector None [V128 V128] [V128] A0 NONE;
    I16x8SubSatS = 0xFD92 "i16x8.sub_sat_s" Vector None [V128 V128] [V128] A0 NONE;
    I16x8SubSatU = 0xFD93 "i16x8.sub_sat_u" Vector None [V128 V128] [V128] A0 NONE;
    F64x2Nearest = 0xFD94 "f64x2.nearest" Vector None [V128] [V128] A0 NONE;
    I16x8Mul = 0xFD95 "i16x8.mul" Vector None [V128 V128] [V128] A0 NONE;
    I16x8MinS = 0xFD96 "i16x8.min_s" Vector None [V128 V128] [V128] A0 NONE;
    I16x8MinU = 0xFD97 "i16x8.min_u" Vector None [V128 V128] [V128] A0 NONE;
    I16x8MaxS = 0xFD98 "i16x8.max_s" Vector None [V128 V128] [V128] A0 NONE;
    I16x8MaxU = 0xFD99 "i16x8.max_u" Vector None [V128 V128] [V128] A0 NONE;
    I16x8AvgrU = 0xFD9B "i16x8.avgr_u" Vector None [V128 V128] [V128] A0 NONE;
    I16x8ExtmulLowI8x16S = 0xFD9C "i16x8.extmul_low_i8x16_s" Vector None [V128 V128] [V128] A0 NONE;
    I16x8ExtmulHighI8x16S = 0xFD9D "i16x8.extmul_high_i8x16_s" Vector None [V128 V128] [V128] A0 NONE;
    I16x8ExtmulLowI8x16U = 0xFD9E "i16x8.extmul_low_i8x16_u" Vector None [V128 V128] [V128] A0 NONE;
    I16x8ExtmulHighI8x16U = 0xFD9F "i16x8.extmul_high_i8x16_u" Vector None [V128 V128] [V128] A0 NONE;
    I32x4Abs = 0xFDA0 "i32x4.abs" Vector None [V128] [V128] A0 NONE;
    I32x4Neg = 0xFDA1 "i32x4.neg" Vector None [V128] [V128] A0 NONE;
    I32x4AllTrue = 0xFDA3 "i32x4.all_true" Vector None [V128] [I32] A0 NONE;
    I32x4Bitmask = 0xFDA4 "i32x4.bitmask" Vector None [V128] [I32] A0 NONE;
    I32x4ExtendLowI16x8S = 0xFDA7 "i32x4.extend_low_i16x8_s" Vector None [V128] [V128] A0 NONE;
    I32x4ExtendHighI16x8S = 0xFDA8 "i32x4.extend_high_i16x8_s" Vector None [V128] [V128] A0 NONE;
    I32x4ExtendLowI16x8U = 0xFDA9 "i32x4.extend_low_i16x8_u" Vector None [V128] [V128] A0 NONE;
    I32x4ExtendHighI16x8U = 0xFDAA "i32x4.extend_high_i16x8_u" Vector None [V128] [V128] A0 NONE;
    I32x4Shl = 0xFDAB "i32x4.shl" Vector None [V128 I32] [V128] A0 NONE;
    I32x4ShrS = 0xFDAC "i32x4.shr_s" Vector None [V128 I32] [V128] A0 NONE;
    I32x4ShrU = 0xFDAD "i32x4.shr_u" Vector None [V128 I32] [V128] A0 NONE;
    I32x4Add = 0xFDAE "i32x4.add" Vector None [V128 V128] [V128] A0 NONE;
    I32x4Sub = 0xFDB1 "i32x4.sub" Vector None [V128 V128] [V128] A0 NONE;
    I32x4Mul = 0xFDB5 "i32x4.mul" Vector None [V128 V128] [V128] A0 NONE;
    I32x4MinS = 0xFDB6 "i32x4.min_s" Vector None [V128 V128] [V128] A0 NONE;
    I32x4MinU = 0xFDB7 "i32x4.min_u" Vector None [V128 V128] [V128] A0 NONE;
    I32x4MaxS = 0xFDB8 "i32x4.max_s" Vector None [V128 V128] [V128] A0 NONE;
    I32x4MaxU = 0xFDB9 "i32x4.max_u" Vector None [V128 V128] [V128] A0 NONE;
    I32x4DotI16x8S = 0xFDBA "i32x4.dot_i16x8_s" Vector None [V128 V128] [V128] A0 NONE;
    I32x4ExtmulLowI16x8S = 0xFDBC "i32x4.extmul_low_i16x8_s" Vector None [V128 V128] [V128] A0 NONE;
    I32x4ExtmulHighI16x8S = 0xFDBD "i32x4.extmul_high_i16x8_s" Vector None [V128 V128] [V128] A0 NONE;
    I32x4ExtmulLowI16x8U = 0xFDBE "i32x4.extmul_low_i16x8_u" Vector None [V128 V128] [V128] A0 NONE;
    I32x4ExtmulHighI16x8U = 0xFDBF "i32x4.extmul_high_i16x8_u" Vector None [V128 V128] [V128] A0 NONE;
    I64x2Abs = 0xFDC0 "i64x2.abs" Vector None [V128] [V128] A0 NONE;
    I64x2Neg = 0xFDC1 "i64x2.neg" Vector None [V128] [V128] A0 NONE;
    I64x2AllTrue = 0xFDC3 "i64x2.all_true" Vector None [V128] [I32] A0 NONE;
    I64x2Bitmask = 0xFDC4 "i64x2.bitmask" Vector None [V128] [I32] A0 NONE;
    I64x2ExtendLowI32x4S = 0xFDC7 "i64x2.extend_low_i32x4_s" Vector None [V128] [V128] A0 NONE;
    I64x2ExtendHighI32x4S = 0xFDC8 "i64x2.extend_high_i32x4_s" Vector None [V128] [V128] A0 NONE;
    I64x2ExtendLowI32x4U = 0xFDC9 "i64x2.extend_low_i32x4_u" Vector None [V128] [V128] A0 NONE;
    I64x2ExtendHighI32x4U = 0xFDCA "i64x2.extend_high_i32x4_u" Vector None [V128] [V128] A0 NONE;
    I64x2Shl = 0xFDCB "i64x2.shl" Vector None [V128 I32] [V128] A0 NONE;
    I64x2ShrS = 0xFDCC "i64x2.shr_s" Vector None [V128 I32] [V128] A0 NONE;
    I64x2ShrU = 0xFDCD "i64x2.shr_u" Vector None [V128 I32] [V128] A0 NONE;
    I64x2Add = 0xFDCE "i64x2.add" Vector None [V128 V128] [V128] A0 NONE;
    I64x2Sub = 0xFDD1 "i64x2.sub" Vector None [V128 V128] [V128] A0 NONE;
    I64x2Mul = 0xFDD5 "i64x2.mul" Vector None [V128 V128] [V128] A0 NONE;
    I64x2Eq = 0xFDD6 "i64x2.eq" Vector None [V128 V128] [V128] A0 NONE;
    I64x2Ne = 0xFDD7 "i64x2.ne" Vector None [V128 V128] [V128] A0 NONE;
    I64x2LtS = 0xFDD8 "i64x2.lt_s" Vector None [V128 V128] [V128] A0 NONE;
    I64x2GtS = 0xFDD9 "i64x2.gt_s" Vector None [V128 V128] [V128] A0 NONE;
    I64x2LeS = 0xFDDA "i64x2.le_s" Vector None [V128 V128] [V128] A0 NONE;
    I64x2GeS = 0xFDDB "i64x2.ge_s" Vector None [V128 V128] [V128] A0 NONE;
    I64x2ExtmulLowI32x4S = 0xFDDC "i64x2.extmul_low_i32x4_s" Vector None [V128 V128] [V128] A0 NONE;
    I64x2ExtmulHighI32x4S = 0xFDDD "i64x2.extmul_high_i32x4_s" Vector None [V128 V128] [V128] A0 NONE;
    I64x2ExtmulLowI32x4U = 0xFDDE "i64x2.extmul_low_i32x4_u" Vector None [V128 V128] [V128] A0 NONE;
    I64x2ExtmulHighI32x4U = 0xFDDF "i64x2.extmul_high_i32x4_u" Vector None [V128 V128] [V128] A0 NONE;
    F32x4Abs = 0xFDE0 "f32x4.abs" Vector None [V128] [V128] A0 NONE;
    F32x4Neg = 0xFDE1 "f32x4.neg" Vector None [V128] [V128] A0 NONE;
    F32x4Sqrt = 0xFDE3 "f32x4.sqrt" Vector None [V128] [V128] A0 NONE;
    F32x4Add = 0xFDE4 "f32x4.add" Vector None [V128 V128] [V128] A0 NONE;
    F32x4Sub = 0xFDE5 "f32x4.sub" Vector None [V128 V128] [V128] A0 NONE;
    F32x4Mul = 0xFDE6 "f32x4.mul" Vector None [V128 V128] [V128] A0 NONE;
    F32x4Div = 0xFDE7 "f32x4.div" Vector None [V128 V128] [V128] A0 NONE;
    F32x4Min = 0xFDE8 "f32x4.min" Vector None [V128 V128] [V128] A0 NONE;
    F32x4Max = 0xFDE9 "f32x4.max" Vector None [V128 V128] [V128] A0 NONE;
    F32x4Pmin = 0xFDEA "f32x4.pmin" Vector None [V128 V128] [V128] A0 NONE;
    F32x4Pmax = 0xFDEB "f32x4.pmax" Vector None [V128 V128] [V128] A0 NONE;
    F64x2Abs = 0xFDEC "f64x2.abs" Vector None [V128] [V128] A0 NONE;
    F64x2Neg = 0xFDED "f64x2.neg" Vector None [V128] [V128] A0 NONE;
    F64x2Sqrt = 0xFDEF "f64x2.sqrt" Vector None [V128] [V128] A0 NONE;
    F64x2Add = 0xFDF0 "f64x2.add" Vector None [V128 V128] [V128] A0 NONE;
    F64x2Sub = 0xFDF1 "f64x2.sub" Vector None [V128 V128] [V128] A0 NONE;
    F64x2Mul = 0xFDF2 "f64x2.mul" Vector None [V128 V128] [V128] A0 NONE;
    F64x2Div = 0xFDF3 "f64x2.div" Vector None [V128 V128] [V128] A0 NONE;
    F64x2Min = 0xFDF4 "f64x2.min" Vector None [V128 V128] [V128] A0 NONE;
    F64x2Max = 0xFDF5 "f64x2.max" Vector None [V128 V128] [V128] A0 NONE;
    F64x2Pmin = 0xFDF6 "f64x2.pmin" Vector None [V128 V128] [V128] A0 NONE;
    F64x2Pmax = 0xFDF7 "f64x2.pmax" Vector None [V128 V128] [V128] A0 NONE;
    I32x4TruncSatF32x4S = 0xFDF8 "i32x4.trunc_sat_f32x4_s" Vector None [V128] [V128] A0 NONE;
    I32x4TruncSatF32x4U = 0xFDF9 "i32x4.trunc_sat_f32x4_u" Vector None [V128] [V128] A0 NONE;
    F32x4ConvertI32x4S = 0xFDFA "f32x4.convert_i32x4_s" Vector None [V128] [V128] A0 NONE;
    F32x4ConvertI32x4U = 0xFDFB "f32x4.convert_i32x4_u" Vector None [V128] [V128] A0 NONE;
    I32x4TruncSatF64x2SZero = 0xFDFC "i32x4.trunc_sat_f64x2_s_zero" Vector None [V128] [V128] A0 NONE;
    I32x4TruncSatF64x2UZero = 0xFDFD "i32x4.trunc_sat_f64x2_u_zero" Vector None [V128] [V128] A0 NONE;
    F64x2ConvertLowI32x4S = 0xFDFE "f64x2.convert_low_i32x4_s" Vector None [V128] [V128] A0 NONE;
    F64x2ConvertLowI32x4U = 0xFDFF "f64x2.convert_low_i32x4_u" Vector None [V128] [V128] A0 NONE;
    MemoryAtomicNotify = 0xFE00 "memory.atomic.notify" Atomic MemArg [I32 I32] [I32] A32 LOAD;
    MemoryAtomicWait32 = 0xFE01 "memory.atomic.wait32" Atomic MemArg [I32 I32 I64] [I32] A32 LOAD;
    MemoryAtomicWait64 = 0xFE02 "memory.atomic.wait64" Atomic MemArg [I32 I64 I64] [I32] A64 LOAD;
    AtomicFence = 0xFE03 "atomic.fence" Atomic ReservedByte [] [] A0 NONE;
    I32AtomicLoad = 0xFE10 "i32.atomic.load" Atomic MemArg [I32] [I32] A32 LOAD;
    I64AtomicLoad = 0xFE11 "i64.atomic.load" Atomic MemArg [I32] [I64] A64 LOAD;
    I32AtomicLoad8U = 0xFE12 "i32.atomic.load8_u" Atomic MemArg [I32] [I32] A8 LOAD;
    I32AtomicLoad16U = 0xFE13 "i32.atomic.load16_u" Atomic MemArg [I32] [I32] A16 LOAD;
    I64AtomicLoad8U = 0xFE14 "i64.atomic.load8_u" Atomic MemArg [I32] [I64] A8 LOAD;
    I64AtomicLoad16U = 0xFE15 "i64.atomic.load16_u" Atomic MemArg [I32] [I64] A16 LOAD;
    I64AtomicLoad32U = 0xFE16 "i64.atomic.load32_u" Atomic MemArg [I32] [I64] A32 LOAD;
    I32AtomicStore = 0xFE17 "i32.atomic.store" Atomic MemArg [I32 I32] [] A32 STORE;
    I64AtomicStore = 0xFE18 "i64.atomic.store" Atomic MemArg [I32 I64] [] A64 STORE;
    I32AtomicStore8 = 0xFE19 "i32.atomic.store8" Atomic MemArg [I32 I32] [] A8 STORE;
    I32AtomicStore16 = 0xFE1A "i32.atomic.store16" Atomic MemArg [I32 I32] [] A16 STORE;
    I64AtomicStore8 = 0xFE1B "i64.atomic.store8" Atomic MemArg [I32 I64] [] A8 STORE;
    I64AtomicStore16 = 0xFE1C "i64.atomic.store16" Atomic MemArg [I32 I64] [] A16 STORE;
    I64AtomicStore32 = 0xFE1D "i64.atomic.store32" Atomic MemArg [I32 I64] [] A32 STORE;
    I32AtomicRmwAdd = 0xFE1E "i32.atomic.rmw.add" Atomic MemArg [I32 I32] [I32] A32 RMW;
    I64AtomicRmwAdd = 0xFE1F "i64.atomic.rmw.add" Atomic MemArg [I32 I64] [I64] A64 RMW;
    I32AtomicRmw8AddU = 0xFE20 "i32.atomic.rmw8.add_u" Atomic MemArg [I32 I32] [I32] A8 RMW;
    I32AtomicRmw16AddU = 0xFE21 "i32.atomic.rmw16.add_u" Atomic MemArg [I32 I32] [I32] A16 RMW;
    I64AtomicRmw8AddU = 0xFE22 "i64.atomic.rmw8.add_u" Atomic MemArg [I32 I64] [I64] A8 RMW;
    I64AtomicRmw16AddU = 0xFE23 "i64.atomic.rmw16.add_u" Atomic MemArg [I32 I64] [I64] A16 RMW;
    I64AtomicRmw32AddU = 0xFE24 "i64.atomic.rmw32.add_u" Atomic MemArg [I32 I64] [I64] A32 RMW;
    I32AtomicRmwSub = 0xFE25 "i32.atomic.rmw.sub" Atomic MemArg [I32 I32] [I32] A32 RMW;
    I64AtomicRmwSub = 0xFE26 "i64.atomic.rmw.sub" Atomic MemArg [I32 I64] [I64] A64 RMW;
    I32AtomicRmw8SubU = 0xFE27 "i32.atomic.rmw8.sub_u" Atomic MemArg [I32 I32] [I32] A8 RMW;
    I32AtomicRmw16SubU = 0xFE28 "i32.atomic.rmw16.sub_u" Atomic MemArg [I32 I32] [I32] A16 RMW;
    I64AtomicRmw8SubU = 0xFE29 "i64.atomic.rmw8.sub_u" Atomic MemArg [I32 I64] [I64] A8 RMW;
    I64AtomicRmw16SubU = 0xFE2A "i64.atomic.rmw16.sub_u" Atomic MemArg [I32 I64] [I64] A16 RMW;
    I64AtomicRmw32SubU = 0xFE2B "i64.atomic.rmw32.sub_u" Atomic MemArg [I32 I64] [I64] A32 RMW;
    I32AtomicRmwAnd = 0xFE2C "i32.atomic.rmw.and" Atomic MemArg [I32 I32] [I32] A32 RMW;
    I64AtomicRmwAnd = 0xFE2D "i64.atomic.rmw.and" Atomic MemArg [I32 I64] [I64] A64 RMW;
    I32AtomicRmw8AndU = 0xFE2E "i32.atomic.rmw8.and_u" Atomic MemArg [I32 I32] [I32] A8 RMW;
    I32AtomicRmw16AndU = 0xFE2F "i32.atomic.rmw16.and_u" Atomic MemArg [I32 I32] [I32] A16 RMW;
    I64AtomicRmw8AndU = 0xFE30 "i64.atomic.rmw8.and_u" Atomic MemArg [I32 I64] [I64] A8 RMW;
    I64AtomicRmw16AndU = 0xFE31 "i64.atomic.rmw16.and_u" Atomic MemArg [I32 I64] [I64] A16 RMW;
    I64AtomicRmw32AndU = 0xFE32 "i64.atomic.rmw32.and_u" Atomic MemArg [I32 I64] [I64] A32 RMW;
    I32AtomicRmwOr = 0xFE33 "i32.atomic.rmw.or" Atomic MemArg [I32 I32] [I32] A32 RMW;
    I64AtomicRmwOr = 0xFE34 "i64.atomic.rmw.or" Atomic MemArg [I32 I64] [I64] A64 RMW;
    I32AtomicRmw8OrU = 0xFE35 "i32.atomic.rmw8.or_u" Atomic MemArg [I32 I32] [I32] A8 RMW;
    I32AtomicRmw16OrU = 0xFE36 "i32.atomic.rmw16.or_u" Atomic MemArg [I32 I32] [I32] A16 RMW;
    I64AtomicRmw8OrU = 0xFE37 "i64.atomic.rmw8.or_u" Atomic MemArg [I32 I64] [I64] A8 RMW;
    I64AtomicRmw16OrU = 0xFE38 "i64.atomic.rmw16.or_u" Atomic MemArg [I32 I64] [I64] A16 RMW;
    I64AtomicRmw32OrU = 0xFE39 "i64.atomic.rmw32.or_u" Atomic MemArg [I32 I64] [I64] A32 RMW;
    I32AtomicRmwXor = 0xFE3A "i32.atomic.rmw.xor" Atomic MemArg [I32 I32] [I32] A32 RMW;
    I64AtomicRmwXor = 0xFE3B "i64.atomic.rmw.xor" Atomic MemArg [I32 I64] [I64] A64 RMW;
    I32AtomicRmw8XorU = 0xFE3C "i32.atomic.rmw8.xor_u" Atomic MemArg [I32 I32] [I32] A8 RMW;
    I32AtomicRmw16XorU = 0xFE3D "i32.atomic.rmw16.xor_u" Atomic MemArg [I32 I32] [I32] A16 RMW;
    I64AtomicRmw8XorU = 0xFE3E "i64.atomic.rmw8.xor_u" Atomic MemArg [I32 I64] [I64] A8 RMW;
    I64AtomicRmw16XorU = 0xFE3F "i64.atomic.rmw16.xor_u" Atomic MemArg [I32 I64] [I64] A16 RMW;
    I64AtomicRmw32XorU = 0xFE40 "i64.atomic.rmw32.xor_u" Atomic MemArg [I32 I64] [I64] A32 RMW;
    I32AtomicRmwXchg = 0xFE41 "i32.atomic.rmw.xchg" Atomic MemArg [I32 I32] [I32] A32 RMW;
    I64AtomicRmwXchg = 0xFE42 "i64.atomic.rmw.xchg" Atomic MemArg [I32 I64] [I64] A64 RMW;
    I32AtomicRmw8XchgU = 0xFE43 "i32.atomic.rmw8.xchg_u" Atomic MemArg [I32 I32] [I32] A8 RMW;
    I32AtomicRmw16XchgU = 0xFE44 "i32.atomic.rmw16.xchg_u" Atomic MemArg [I32 I32] [I32] A16 RMW;
    I64AtomicRmw8XchgU = 0xFE45 "i64.atomic.rmw8.xchg_u" Atomic MemArg [I32 I64] [I64] A8 RMW;
    I64AtomicRmw16XchgU = 0xFE46 "i64.atomic.rmw16.xchg_u" Atomic MemArg [I32 I64] [I64] A16 RMW;
    I64AtomicRmw32XchgU = 0xFE47 "i64.atomic.rmw32.xchg_u" Atomic MemArg [I32 I64] [I64] A32 RMW;
    I32AtomicRmwCmpxchg = 0xFE48 "i32.atomic.rmw.cmpxchg" Atomic MemArg [I32 I32 I32] [I32] A32 RMW;
    I64AtomicRmwCmpxchg = 0xFE49 "i64.atomic.rmw.cmpxchg" Atomic MemArg [I32 I64 I64] [I64] A64 RMW;
    I32AtomicRmw8CmpxchgU = 0xFE4A "i32.atomic.rmw8.cmpxchg_u" Atomic MemArg [I32 I32 I32] [I32] A8 RMW;
    I32AtomicRmw16CmpxchgU = 0xFE4B "i32.atomic.rmw16.cmpxchg_u" Atomic MemArg [I32 I32 I32] [I32] A16 RMW;
    I64AtomicRmw8CmpxchgU = 0xFE4C "i64.atomic.rmw8.cmpxchg_u" Atomic MemArg [I32 I64 I64] [I64] A8 RMW;
    I64AtomicRmw16CmpxchgU = 0xFE4D "i64.atomic.rmw16.cmpxchg_u" Atomic MemArg [I32 I64 I64] [I64] A16 RMW;
    I64AtomicRmw32CmpxchgU = 0xFE4E "i64.atomic.rmw32.cmpxchg_u" Atomic MemArg [I32 I64 I64] [I64] A32 RMW;
}

impl Opcode {
    pub fn descriptor(self) -> &'static Descriptor {
        &DESCRIPTORS[self as usize]
    }

    pub fn code(self) -> u16 {
        self.descriptor().code
    }

    /// The family prefix byte for multi-byte opcodes.
    pub fn prefix(self) -> Option<u8> {
        let code = self.code();
        if code > 0xFF {
            Some((code >> 8) as u8)
        } else {
            None
        }
    }

    /// The opcode byte, or the sub-opcode following the prefix.
    pub fn sub_opcode(self) -> u32 {
        (self.code() & 0xFF) as u32
    }

    pub fn mnemonic(self) -> &'static str {
        self.descriptor().name
    }

    pub fn immediate(self) -> Immediate {
        self.descriptor().immediate
    }

    pub fn has_memarg(self) -> bool {
        self.descriptor().flags.contains(Flags::MEMARG)
    }

    /// Instructions after which the operand stack is polymorphic.
    pub fn is_stack_polymorphic(self) -> bool {
        matches!(
            self,
            Opcode::Unreachable
                | Opcode::Br
                | Opcode::BrTable
                | Opcode::Return
                | Opcode::ReturnCall
                | Opcode::ReturnCallIndirect
                | Opcode::Throw
                | Opcode::Rethrow
        )
    }
}

static BY_MNEMONIC: Lazy<HashMap<&'static str, Opcode>> = Lazy::new(|| {
    let mut map = HashMap::with_capacity(Opcode::ALL.len());
    for op in Opcode::ALL {
        // `select` appears twice; the untyped form wins.
        map.entry(op.mnemonic()).or_insert(*op);
    }
    map
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown instruction mnemonic: {0}")]
pub struct UnknownMnemonic(pub String);

impl FromStr for Opcode {
    type Err = UnknownMnemonic;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BY_MNEMONIC.get(s).copied().ok_or_else(|| UnknownMnemonic(s.to_owned()))
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashSet;

    #[test]
    fn test_codes_are_unique_and_round_trip() {
        let mut seen = HashSet::new();
        for op in Opcode::ALL {
            assert!(seen.insert(op.code()), "duplicate code {:#x} for {op:?}", op.code());
            assert_eq!(Opcode::from_code(op.code()), Some(*op));
        }
    }

    #[test]
    fn test_simd_space_is_dense_where_defined() {
        let simd = Opcode::ALL.iter().filter(|op| op.prefix() == Some(0xFD)).count();
        assert_eq!(simd, 236);
        for reserved in [0x9A, 0xA2, 0xA5, 0xA6, 0xAF, 0xB0, 0xB2, 0xB3, 0xB4, 0xBB, 0xC2, 0xE2, 0xEE] {
            assert_eq!(Opcode::from_code(0xFD00 | reserved), None);
        }
    }

    #[rstest]
    #[case(0x6A, "i32.add", Opcode::I32Add)]
    #[case(0x28, "i32.load", Opcode::I32Load)]
    #[case(0xFC0A, "memory.copy", Opcode::MemoryCopy)]
    #[case(0xFD0D, "i8x16.shuffle", Opcode::I8x16Shuffle)]
    #[case(0xFE48, "i32.atomic.rmw.cmpxchg", Opcode::I32AtomicRmwCmpxchg)]
    #[case(0x12, "return_call", Opcode::ReturnCall)]
    fn test_lookup(#[case] code: u16, #[case] name: &str, #[case] expected: Opcode) {
        assert_eq!(Opcode::from_code(code), Some(expected));
        assert_eq!(name.parse::<Opcode>().unwrap(), expected);
        assert_eq!(expected.mnemonic(), name);
    }

    #[test]
    fn test_select_mnemonic_prefers_untyped() {
        assert_eq!("select".parse::<Opcode>().unwrap(), Opcode::Select);
        let err = "i32.bogus".parse::<Opcode>().unwrap_err();
        assert_eq!(err, UnknownMnemonic("i32.bogus".to_string()));
        assert_eq!(err.to_string(), "unknown instruction mnemonic: i32.bogus");
    }

    #[test]
    fn test_store_descriptor() {
        let d = Opcode::I32Store.descriptor();
        assert_eq!(d.category, Category::Memory);
        assert_eq!(d.immediate, Immediate::MemArg);
        assert_eq!(d.pull, StackSpec::Many(&[ValueType::I32, ValueType::I32]));
        assert_eq!(d.push, StackSpec::None);
        assert_eq!(d.align.log2(), Some(2));
        assert!(d.flags.contains(Flags::MEMARG | Flags::WRITES | Flags::TRAPS));
        assert!(!d.flags.contains(Flags::READS));
    }

    #[test]
    fn test_memargs_have_alignment() {
        for op in Opcode::ALL {
            let d = op.descriptor();
            assert_eq!(d.flags.contains(Flags::MEMARG), d.align.log2().is_some(), "{op:?}");
        }
    }

    #[test]
    fn test_prefix_split() {
        assert_eq!(Opcode::I64x2Mul.prefix(), Some(0xFD));
        assert_eq!(Opcode::I64x2Mul.sub_opcode(), 0xD5);
        assert_eq!(Opcode::Call.prefix(), None);
        assert_eq!(Opcode::Call.sub_opcode(), 0x10);
    }
}
