//! Encoder tests: exact bytes for small modules, graph edits followed by an
//! encode, and round trips through the parser.
//!
//! Round trips are checked two ways: the re-parsed graph must match the
//! original (ignoring input positions), and encoding the re-parsed module
//! must reproduce the first encoding byte for byte.

mod common;

#[cfg(test)]
mod tests {
    use crate::common::{add1_bytes, add1_module, assert_same_graph, func_id, module_bytes, sample_module};
    use rstest::rstest;
    use wasmgraph::encoder::code_entry_length;
    use wasmgraph::parser::encoding::{ByteSink, Writer};
    use wasmgraph::parser::entity::Importable;
    use wasmgraph::parser::instruction::{Instruction, LocalId, Opcode};
    use wasmgraph::parser::module::{DataMode, EntityRef, Function, FunctionKind, ImportDesc, ImportName};
    use wasmgraph::parser::types::{EntityKind, GlobalType, Limits, MemoryType, SectionId, ValueType};
    use wasmgraph::{EncodeError, EncodeOptions, Module, SectionKind};

    fn round_trip(module: &Module, options: &EncodeOptions) -> (Vec<u8>, Module) {
        let bytes = module.encode(options).unwrap_or_else(|e| panic!("encode failed: {e}"));
        let reparsed = Module::parse(&bytes).unwrap_or_else(|e| panic!("re-parse failed: {e}"));
        (bytes, reparsed)
    }

    // =======================================================================
    // Byte-level output
    // =======================================================================

    #[test]
    fn test_add1_bytes() {
        let (module, func) = add1_module();
        let bytes = module.encode(&EncodeOptions::default()).unwrap();
        assert_eq!(hex::encode(&bytes), hex::encode(add1_bytes()));
        assert_eq!(code_entry_length(&module, func, &EncodeOptions::default()).unwrap(), 7);
    }

    #[rstest]
    #[case(0, "00")]
    #[case(127, "7f")]
    #[case(128, "8001")]
    #[case(300, "ac02")]
    #[case(u32::MAX, "ffffffff0f")]
    fn test_vu32(#[case] value: u32, #[case] expected: &str) {
        let mut writer = Writer::with_len(expected.len() / 2);
        writer.write_vu32(value).unwrap();
        assert_eq!(hex::encode(writer.into_bytes()), expected);
    }

    #[test]
    fn test_padded_varint() {
        let mut writer = Writer::with_len(5);
        writer.write_padded_vu32(3, 5).unwrap();
        assert_eq!(writer.into_bytes(), vec![0x83, 0x80, 0x80, 0x80, 0x00]);

        let mut writer = Writer::with_len(2);
        let err = writer.write_padded_vu32(1 << 14, 2).unwrap_err();
        assert!(matches!(err, EncodeError::PaddingOverflow { value: 16384, width: 2 }));
    }

    #[test]
    fn test_writer_overflow() {
        let mut writer = Writer::with_len(3);
        let err = writer.write_u32(1).unwrap_err();
        assert!(matches!(err, EncodeError::BufferOverflow { capacity: 3, .. }));
    }

    #[test]
    fn test_custom_sections_keep_their_place() {
        let bytes = module_bytes(&[
            (0x00, &[0x01, b'a', 0xff]),
            (0x01, &[0x01, 0x60, 0x00, 0x00]),
            (0x00, &[0x01, b'b']),
        ]);
        let module = Module::parse(&bytes).unwrap();
        assert_eq!(module.encode(&EncodeOptions::default()).unwrap(), bytes);
    }

    #[test]
    fn test_relocatable_call_is_padded() {
        let (mut module, func) = add1_module();
        let ty = module.functions[func].type_id;
        let body = vec![Instruction::LocalGet { local: LocalId(0) }, Instruction::Call { func }];
        let caller = module.add_defined_function(ty, &[], body).unwrap();

        let (plain, _) = round_trip(&module, &EncodeOptions::default());
        let (padded, reparsed) = round_trip(&module, &EncodeOptions::new().relocatable(true));
        assert!(padded.len() > plain.len());
        // call 0 as a five-byte slot
        assert!(padded.windows(6).any(|w| w == [0x10, 0x80, 0x80, 0x80, 0x80, 0x00]));
        assert_same_graph(&module, &reparsed);
        assert!(reparsed.functions[caller].body().is_some());
    }

    // =======================================================================
    // Edits
    // =======================================================================

    #[test]
    fn test_type_dedup() {
        let mut module = Module::new();
        let a = module.get_or_create_type(&[ValueType::I32], &[]);
        let b = module.get_or_create_type(&[ValueType::I32], &[]);
        let c = module.get_or_create_type(&[ValueType::I64], &[]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(module.types.len(), 2);
    }

    #[test]
    fn test_append_import_shifts_defined_indices() {
        let (mut module, add1) = add1_module();
        let ty = module.functions[add1].type_id;
        module.add_defined_function(ty, &[], vec![Instruction::Call { func: add1 }]).unwrap();

        let log = func_id(module.append_import("env", "log", ImportDesc::Function(ty)).unwrap());
        assert_eq!(module.functions.position_of(log), Some(0));
        assert!(module.check_import_prefix().is_none());

        let (bytes, reparsed) = round_trip(&module, &EncodeOptions::default());
        // the import takes index 0, so add1 is now called as index 1
        assert!(bytes.windows(2).any(|w| w == [0x10, 0x01]));
        let ids: Vec<_> = reparsed.functions.ids().collect();
        assert!(reparsed.functions[ids[0]].is_imported());
        assert_eq!(reparsed.functions[ids[2]].body().unwrap().instructions, vec![Instruction::Call { func: ids[1] }]);
        assert_eq!(reparsed.find_export("add1").unwrap().target, EntityRef::Function(ids[1]));
    }

    #[test]
    fn test_imports_mixed() {
        let (mut module, add1) = add1_module();
        let ty = module.functions[add1].type_id;
        module.functions.push(Function {
            type_id: ty,
            name: None,
            kind: FunctionKind::Imported(ImportName::new("env", "late")),
        });
        let err = module.encode(&EncodeOptions::default()).unwrap_err();
        assert!(matches!(err, EncodeError::ImportsMixed { kind: EntityKind::Function }), "{err}");
    }

    #[test]
    fn test_dangling_call() {
        let (mut module, add1) = add1_module();
        let ty = module.functions[add1].type_id;
        let gone = module.add_defined_function(ty, &[], vec![]).unwrap();
        module.functions[add1].body_mut().unwrap().instructions.push(Instruction::Call { func: gone });
        module.functions.remove(gone);
        let err = module.encode(&EncodeOptions::default()).unwrap_err();
        assert!(matches!(err, EncodeError::DanglingReference { kind: EntityKind::Function }), "{err}");
    }

    #[test]
    fn test_replace_global() {
        let mut module = Module::new();
        let ty = module.get_or_create_type(&[], &[ValueType::I32]);
        let imported = module
            .append_import("env", "base", ImportDesc::Global(GlobalType { value_type: ValueType::I32, mutable: false }))
            .unwrap();
        let EntityRef::Global(old) = imported else { panic!("expected a global") };
        let new = module.add_defined_global(
            GlobalType { value_type: ValueType::I32, mutable: false },
            vec![Instruction::I32Const { value: 1024 }],
        );
        let func = module.add_defined_function(ty, &[], vec![Instruction::GlobalGet { global: old }]).unwrap();
        module.append_export("base", imported).unwrap();

        assert_eq!(module.replace_global(old, new).unwrap(), 2);

        let (_, reparsed) = round_trip(&module, &EncodeOptions::default());
        assert_eq!(reparsed.globals.len(), 1);
        let global = reparsed.globals.id_at(0).unwrap();
        assert_eq!(reparsed.functions[func].body().unwrap().instructions, vec![Instruction::GlobalGet { global }]);
        assert_eq!(reparsed.find_export("base").unwrap().target, EntityRef::Global(global));
    }

    #[test]
    fn test_replace_global_with_itself_still_encodes() {
        let mut module = Module::new();
        let ty = module.get_or_create_type(&[], &[ValueType::I32]);
        let global = module.add_defined_global(
            GlobalType { value_type: ValueType::I32, mutable: true },
            vec![Instruction::I32Const { value: 7 }],
        );
        let func = module.add_defined_function(ty, &[], vec![Instruction::GlobalGet { global }]).unwrap();
        module.append_export("g", EntityRef::Global(global)).unwrap();

        assert_eq!(module.replace_global(global, global).unwrap(), 0);

        let (_, reparsed) = round_trip(&module, &EncodeOptions::default());
        assert_eq!(reparsed.globals.len(), 1);
        assert_eq!(reparsed.functions[func].body().unwrap().instructions, vec![Instruction::GlobalGet { global }]);
        assert_eq!(reparsed.find_export("g").unwrap().target, EntityRef::Global(global));
    }

    #[test]
    fn test_remove_export_by_ref() {
        let (mut module, add1) = add1_module();
        module.append_export("inc", EntityRef::Function(add1)).unwrap();
        assert_eq!(module.remove_export_by_ref(EntityRef::Function(add1)), 2);
        let (_, reparsed) = round_trip(&module, &EncodeOptions::default());
        assert!(reparsed.exports.is_empty());
        assert!(reparsed.find_section(SectionId::Export).is_none());
    }

    #[test]
    fn test_data_count_emitted_for_memory_init() {
        let mut module = Module::new();
        let ty = module.get_or_create_type(&[], &[]);
        module.add_defined_memory(MemoryType { limits: Limits::new(1, None), shared: false });
        let data = module.add_data_segment(DataMode::Passive, b"payload");
        let body = vec![
            Instruction::I32Const { value: 0 },
            Instruction::I32Const { value: 0 },
            Instruction::I32Const { value: 7 },
            Instruction::MemoryInit { data },
            Instruction::DataDrop { data },
        ];
        module.add_defined_function(ty, &[], body).unwrap();
        assert!(module.code_requires_data_count());

        let (_, reparsed) = round_trip(&module, &EncodeOptions::default());
        assert!(reparsed.find_section(SectionId::DataCount).is_some());
        assert_eq!(reparsed.declared_data_count, Some(1));
        assert_same_graph(&module, &reparsed);
    }

    #[test]
    fn test_edit_data_bytes_in_place() {
        let mut module = sample_module();
        let first = module.data.id_at(0).unwrap();
        module.segment_bytes_mut(first).unwrap().copy_from_slice(b"HI");
        let (_, reparsed) = round_trip(&module, &EncodeOptions::default());
        assert_eq!(reparsed.segment_bytes(reparsed.data.id_at(0).unwrap()), Some(&b"HI"[..]));
    }

    // =======================================================================
    // Round trips
    // =======================================================================

    #[test]
    fn test_sample_round_trip() {
        let module = sample_module();
        let (bytes_a, reparsed) = round_trip(&module, &EncodeOptions::default());
        assert_same_graph(&module, &reparsed);

        let bytes_b = reparsed.encode(&EncodeOptions::default()).unwrap();
        assert_eq!(bytes_a, bytes_b, "encode stability failed");
    }

    #[test]
    fn test_parsed_round_trip_is_identical() {
        let bytes = add1_bytes();
        let module = Module::parse(&bytes).unwrap();
        assert_eq!(module.encode(&EncodeOptions::default()).unwrap(), bytes);
    }

    #[test]
    fn test_exclude_sections() {
        let module = sample_module();
        let options = EncodeOptions::new()
            .exclude(SectionKind::Known(SectionId::Start))
            .exclude(SectionKind::Custom("meta".to_string()));
        let (_, reparsed) = round_trip(&module, &options);
        assert_eq!(reparsed.start, None);
        assert!(reparsed.find_custom_section("meta").is_none());
        assert_eq!(reparsed.functions.len(), module.functions.len());
    }

    #[test]
    fn test_reencode_after_instruction_edit() {
        let (mut module, add1) = add1_module();
        module.for_each_instruction_mut(|inst| {
            if *inst == Instruction::plain(Opcode::I32Add) {
                *inst = Instruction::plain(Opcode::I32Sub);
            }
        });
        let (bytes, reparsed) = round_trip(&module, &EncodeOptions::default());
        assert_eq!(bytes[bytes.len() - 2], 0x6b);
        assert_eq!(
            reparsed.functions[add1].body().unwrap().instructions.last(),
            Some(&Instruction::plain(Opcode::I32Sub))
        );
    }
}
