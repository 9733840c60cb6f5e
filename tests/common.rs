//! Common test utilities shared between integration tests

#![allow(dead_code)]

use wasmgraph::parser::instruction::{BlockType, Instruction, LocalId, MemArg, Opcode};
use wasmgraph::parser::module::{
    DataMode, ElementItems, ElementMode, ElementSegment, EntityRef, FuncId, ImportDesc, Module,
};
use wasmgraph::parser::types::{GlobalType, Limits, MemoryType, RefType, TableType, ValueType};

pub const HEADER: [u8; 8] = [0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00];

/// Assembles a module from `(section id, contents)` pairs. Contents must be
/// shorter than 128 bytes so the size fits in one LEB128 byte.
pub fn module_bytes(sections: &[(u8, &[u8])]) -> Vec<u8> {
    let mut bytes = HEADER.to_vec();
    for (id, contents) in sections {
        assert!(contents.len() < 0x80, "section too large for a one-byte size");
        bytes.push(*id);
        bytes.push(contents.len() as u8);
        bytes.extend_from_slice(contents);
    }
    bytes
}

/// `(func (export "add1") (param i32) (result i32) local.get 0 i32.const 1 i32.add)`
pub fn add1_bytes() -> Vec<u8> {
    module_bytes(&[
        (0x01, &[0x01, 0x60, 0x01, 0x7f, 0x01, 0x7f]),
        (0x03, &[0x01, 0x00]),
        (0x07, &[0x01, 0x04, b'a', b'd', b'd', b'1', 0x00, 0x00]),
        (0x0a, &[0x01, 0x07, 0x00, 0x20, 0x00, 0x41, 0x01, 0x6a, 0x0b]),
    ])
}

pub fn add1_module() -> (Module, FuncId) {
    let mut module = Module::new();
    let ty = module.get_or_create_type(&[ValueType::I32], &[ValueType::I32]);
    let body = vec![
        Instruction::LocalGet { local: LocalId(0) },
        Instruction::I32Const { value: 1 },
        Instruction::plain(Opcode::I32Add),
    ];
    let func = module.add_defined_function(ty, &[], body).unwrap();
    module.append_export("add1", EntityRef::Function(func)).unwrap();
    (module, func)
}

pub fn func_id(target: EntityRef) -> FuncId {
    match target {
        EntityRef::Function(id) => id,
        other => panic!("expected a function, got {other:?}"),
    }
}

/// A module touching most sections: imports, a mutable global, a table with
/// an active element segment, active and passive data, a start function, an
/// export of an imported memory and a trailing custom section.
pub fn sample_module() -> Module {
    let mut module = Module::new();
    let unary = module.get_or_create_type(&[ValueType::I32], &[ValueType::I32]);
    let void = module.get_or_create_type(&[], &[]);

    let log = func_id(module.append_import("env", "log", ImportDesc::Function(unary)).unwrap());
    let memory = module
        .append_import(
            "env",
            "memory",
            ImportDesc::Memory(MemoryType { limits: Limits::new(1, None), shared: false }),
        )
        .unwrap();
    let EntityRef::Memory(memory_id) = memory else { panic!("expected a memory") };

    let counter = module.add_defined_global(
        GlobalType { value_type: ValueType::I32, mutable: true },
        vec![Instruction::I32Const { value: 0 }],
    );
    let table = module.add_defined_table(TableType { ref_type: RefType::FuncRef, limits: Limits::new(2, Some(2)) });

    let step_body = vec![
        Instruction::LocalGet { local: LocalId(0) },
        Instruction::Call { func: log },
        Instruction::GlobalGet { global: counter },
        Instruction::plain(Opcode::I32Add),
        Instruction::LocalTee { local: LocalId(1) },
        Instruction::GlobalSet { global: counter },
        Instruction::LocalGet { local: LocalId(1) },
        Instruction::I32Const { value: 16 },
        Instruction::memory(Opcode::I32Store, MemArg::natural(Opcode::I32Store)),
        Instruction::Block {
            block_type: BlockType::Value(ValueType::I32),
            body: vec![
                Instruction::LocalGet { local: LocalId(0) },
                Instruction::If {
                    block_type: BlockType::Empty,
                    then_body: vec![Instruction::plain(Opcode::Nop)],
                    else_body: Some(vec![Instruction::plain(Opcode::Nop)]),
                },
                Instruction::LocalGet { local: LocalId(1) },
            ],
        },
    ];
    let step = module.add_defined_function(unary, &[ValueType::I32, ValueType::F64], step_body).unwrap();
    let init = module.add_defined_function(void, &[], vec![]).unwrap();
    module.start = Some(init);

    module.add_element_segment(ElementSegment {
        mode: ElementMode::Active { table, offset: vec![Instruction::I32Const { value: 1 }], explicit_table: false },
        items: ElementItems::Functions(vec![step]),
    });
    module.add_data_segment(
        DataMode::Active { memory: memory_id, offset: vec![Instruction::I32Const { value: 8 }], explicit_memory: false },
        b"hi",
    );
    module.add_data_segment(DataMode::Passive, b"xyz");

    module.append_export("step", EntityRef::Function(step)).unwrap();
    module.append_export("memory", memory).unwrap();
    module.add_custom_section("meta", vec![0x01, 0x02]);
    module
}

/// Compares everything but input positions.
pub fn assert_same_graph(a: &Module, b: &Module) {
    assert_eq!(a.types.values().collect::<Vec<_>>(), b.types.values().collect::<Vec<_>>(), "types");
    assert_eq!(a.functions.len(), b.functions.len(), "function count");
    for ((_, fa), (_, fb)) in a.functions.iter().zip(b.functions.iter()) {
        assert_eq!(fa.type_id, fb.type_id);
        match (fa.body(), fb.body()) {
            (Some(ba), Some(bb)) => {
                assert_eq!(ba.locals, bb.locals, "locals");
                assert_eq!(ba.instructions, bb.instructions, "instructions");
            }
            (None, None) => assert_eq!(fa.kind, fb.kind),
            _ => panic!("function kinds differ"),
        }
    }
    assert_eq!(a.globals.values().collect::<Vec<_>>(), b.globals.values().collect::<Vec<_>>(), "globals");
    assert_eq!(a.memories.values().collect::<Vec<_>>(), b.memories.values().collect::<Vec<_>>(), "memories");
    let table_types = |m: &Module| m.tables.values().map(|t| (t.table_type, t.import.clone())).collect::<Vec<_>>();
    assert_eq!(table_types(a), table_types(b), "tables");
    assert_eq!(a.tags.values().collect::<Vec<_>>(), b.tags.values().collect::<Vec<_>>(), "tags");
    assert_eq!(a.exports, b.exports, "exports");
    assert_eq!(a.start, b.start, "start");
    assert_eq!(a.elements.values().collect::<Vec<_>>(), b.elements.values().collect::<Vec<_>>(), "elements");
    let data = |m: &Module| {
        m.data.iter().map(|(id, d)| (d.mode.clone(), m.segment_bytes(id).map(|b| b.to_vec()))).collect::<Vec<_>>()
    };
    assert_eq!(data(a), data(b), "data");
    let customs = |m: &Module| m.custom_sections().map(|c| (c.name.clone(), c.payload.clone())).collect::<Vec<_>>();
    assert_eq!(customs(a), customs(b), "custom sections");
}
