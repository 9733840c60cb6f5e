//! Byte-coded enums and small structural types shared by the decoder, the
//! module graph and the encoder.

use std::fmt;

use num_enum::{IntoPrimitive, TryFromPrimitive};

use super::error::ParseError;

/// Known section ids. Custom sections are id 0 and may appear anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum SectionId {
    Custom = 0,
    Type = 1,
    Import = 2,
    Function = 3,
    Table = 4,
    Memory = 5,
    Global = 6,
    Export = 7,
    Start = 8,
    Element = 9,
    Code = 10,
    Data = 11,
    DataCount = 12,
    Tag = 13,
}

impl SectionId {
    /// Known sections in the order they must appear on the wire. Data-count and
    /// tag are numbered after the sections they precede.
    pub const CANONICAL_ORDER: [SectionId; 13] = [
        SectionId::Type,
        SectionId::Import,
        SectionId::Function,
        SectionId::Table,
        SectionId::Memory,
        SectionId::Tag,
        SectionId::Global,
        SectionId::Export,
        SectionId::Start,
        SectionId::Element,
        SectionId::DataCount,
        SectionId::Code,
        SectionId::Data,
    ];

    /// Position in [`SectionId::CANONICAL_ORDER`]; `None` for custom sections.
    pub fn rank(self) -> Option<usize> {
        SectionId::CANONICAL_ORDER.iter().position(|id| *id == self)
    }

    pub fn name(self) -> &'static str {
        match self {
            SectionId::Custom => "custom",
            SectionId::Type => "type",
            SectionId::Import => "import",
            SectionId::Function => "function",
            SectionId::Table => "table",
            SectionId::Memory => "memory",
            SectionId::Global => "global",
            SectionId::Export => "export",
            SectionId::Start => "start",
            SectionId::Element => "element",
            SectionId::Code => "code",
            SectionId::Data => "data",
            SectionId::DataCount => "data count",
            SectionId::Tag => "tag",
        }
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum ValueType {
    // Number types
    I32 = 0x7F,
    I64 = 0x7E,
    F32 = 0x7D,
    F64 = 0x7C,
    // Vector types
    V128 = 0x7B,
    // Reference types
    FuncRef = 0x70,
    ExternRef = 0x6F,
}

impl ValueType {
    pub fn decode(byte: u8) -> Result<Self, ParseError> {
        ValueType::try_from(byte).map_err(|_| ParseError::InvalidValueType(byte))
    }

    pub fn is_ref(self) -> bool {
        matches!(self, ValueType::FuncRef | ValueType::ExternRef)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            ValueType::I32 => "i32",
            ValueType::I64 => "i64",
            ValueType::F32 => "f32",
            ValueType::F64 => "f64",
            ValueType::V128 => "v128",
            ValueType::FuncRef => "funcref",
            ValueType::ExternRef => "externref",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum RefType {
    FuncRef = 0x70,
    ExternRef = 0x6F,
}

impl RefType {
    pub fn decode(byte: u8) -> Result<Self, ParseError> {
        RefType::try_from(byte).map_err(|_| ParseError::InvalidRefType(byte))
    }
}

impl From<RefType> for ValueType {
    fn from(r: RefType) -> ValueType {
        match r {
            RefType::FuncRef => ValueType::FuncRef,
            RefType::ExternRef => ValueType::ExternRef,
        }
    }
}

impl fmt::Display for RefType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        ValueType::from(*self).fmt(f)
    }
}

/// Import/export descriptor kind byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum ExternalKind {
    Function = 0x00,
    Table = 0x01,
    Memory = 0x02,
    Global = 0x03,
    Tag = 0x04,
}

/// Every kind of entity an index can refer to; used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Type,
    Function,
    Table,
    Memory,
    Global,
    Tag,
    Element,
    Data,
    Local,
    Label,
}

impl From<ExternalKind> for EntityKind {
    fn from(kind: ExternalKind) -> EntityKind {
        match kind {
            ExternalKind::Function => EntityKind::Function,
            ExternalKind::Table => EntityKind::Table,
            ExternalKind::Memory => EntityKind::Memory,
            ExternalKind::Global => EntityKind::Global,
            ExternalKind::Tag => EntityKind::Tag,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            EntityKind::Type => "type",
            EntityKind::Function => "function",
            EntityKind::Table => "table",
            EntityKind::Memory => "memory",
            EntityKind::Global => "global",
            EntityKind::Tag => "tag",
            EntityKind::Element => "element segment",
            EntityKind::Data => "data segment",
            EntityKind::Local => "local",
            EntityKind::Label => "label",
        })
    }
}

/// A function signature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FuncType {
    pub params: Vec<ValueType>,
    pub results: Vec<ValueType>,
}

impl FuncType {
    pub fn new(params: Vec<ValueType>, results: Vec<ValueType>) -> FuncType {
        FuncType { params, results }
    }

    pub fn matches(&self, params: &[ValueType], results: &[ValueType]) -> bool {
        self.params == params && self.results == results
    }
}

impl fmt::Display for FuncType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let join = |types: &[ValueType]| types.iter().map(|t| t.to_string()).collect::<Vec<_>>().join(", ");
        write!(f, "({}) -> ({})", join(&self.params), join(&self.results))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Limits {
    pub min: u32,
    pub max: Option<u32>,
}

impl Limits {
    pub fn new(min: u32, max: Option<u32>) -> Limits {
        Limits { min, max }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryType {
    pub limits: Limits,
    pub shared: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableType {
    pub ref_type: RefType,
    pub limits: Limits,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlobalType {
    pub value_type: ValueType,
    pub mutable: bool,
}

impl fmt::Display for GlobalType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.mutable {
            write!(f, "(mut {})", self.value_type)
        } else {
            write!(f, "{}", self.value_type)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_type_bytes() {
        assert_eq!(ValueType::decode(0x7f).unwrap(), ValueType::I32);
        assert_eq!(u8::from(ValueType::ExternRef), 0x6f);
        assert!(matches!(ValueType::decode(0x40), Err(ParseError::InvalidValueType(0x40))));
    }

    #[test]
    fn test_canonical_rank_places_extensions() {
        assert!(SectionId::Tag.rank() < SectionId::Global.rank());
        assert!(SectionId::DataCount.rank() < SectionId::Code.rank());
        assert_eq!(SectionId::Custom.rank(), None);
    }

    #[test]
    fn test_func_type_display() {
        let ft = FuncType::new(vec![ValueType::I32, ValueType::I32], vec![ValueType::I32]);
        assert_eq!(ft.to_string(), "(i32, i32) -> (i32)");
    }
}
