mod common;

#[cfg(test)]
mod tests {
    use crate::common::{add1_bytes, module_bytes};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rstest::rstest;
    use wasmgraph::parser::instruction::{Instruction, LocalId, Opcode};
    use wasmgraph::parser::module::{DataMode, ElementItems, ElementMode, EntityRef, Section};
    use wasmgraph::parser::types::{EntityKind, SectionId, ValueType};
    use wasmgraph::{parse, Module, ParseError, ParseOptions};

    const TYPE_VOID: (u8, &[u8]) = (0x01, &[0x01, 0x60, 0x00, 0x00]);
    const ONE_FUNCTION: (u8, &[u8]) = (0x03, &[0x01, 0x00]);

    // =======================================================================
    // Well-formed modules
    // =======================================================================

    #[test]
    fn test_parse_add1() {
        let module = Module::parse(&add1_bytes()).unwrap();

        assert_eq!(module.types.len(), 1);
        let ty = module.types.values().next().unwrap();
        assert_eq!(ty.params, vec![ValueType::I32]);
        assert_eq!(ty.results, vec![ValueType::I32]);

        let func = module.functions.id_at(0).unwrap();
        let export = module.find_export("add1").unwrap();
        assert_eq!(export.target, EntityRef::Function(func));

        let body = module.functions[func].body().unwrap();
        assert_eq!(
            body.instructions,
            vec![
                Instruction::LocalGet { local: LocalId(0) },
                Instruction::I32Const { value: 1 },
                Instruction::plain(Opcode::I32Add),
            ]
        );
        let position = body.position.unwrap();
        assert_eq!(position.end - position.start, 7);
        assert_eq!(position.instructions_start, position.start + 1);

        let ids: Vec<_> = module.sections.iter().map(Section::id).collect();
        assert_eq!(ids, vec![SectionId::Type, SectionId::Function, SectionId::Export, SectionId::Code]);
    }

    #[test]
    fn test_duplicate_types_share_an_id() {
        let bytes = module_bytes(&[
            (0x01, &[0x02, 0x60, 0x01, 0x7f, 0x00, 0x60, 0x01, 0x7f, 0x00]),
            (0x03, &[0x02, 0x00, 0x01]),
            (0x0a, &[0x02, 0x02, 0x00, 0x0b, 0x02, 0x00, 0x0b]),
        ]);
        let module = Module::parse(&bytes).unwrap();
        let types: Vec<_> = module.functions.values().map(|f| f.type_id).collect();
        assert_eq!(types.len(), 2);
        assert_eq!(types[0], types[1]);
        // both wire entries stay so the type index space is unchanged
        assert_eq!(module.types.len(), 2);
    }

    #[test]
    fn test_element_segment_modes() {
        let bytes = module_bytes(&[
            TYPE_VOID,
            ONE_FUNCTION,
            (0x04, &[0x01, 0x70, 0x00, 0x01]),
            (
                0x09,
                &[
                    0x03, // count
                    0x00, 0x41, 0x00, 0x0b, 0x01, 0x00, // active, table 0, offset 0
                    0x01, 0x00, 0x01, 0x00, // passive
                    0x03, 0x00, 0x01, 0x00, // declarative
                ],
            ),
            (0x0a, &[0x01, 0x02, 0x00, 0x0b]),
        ]);
        let module = Module::parse(&bytes).unwrap();
        let func = module.functions.id_at(0).unwrap();
        let table = module.tables.id_at(0).unwrap();

        let segments: Vec<_> = module.elements.values().collect();
        assert_eq!(
            segments[0].mode,
            ElementMode::Active { table, offset: vec![Instruction::I32Const { value: 0 }], explicit_table: false }
        );
        assert_eq!(segments[1].mode, ElementMode::Passive);
        assert_eq!(segments[2].mode, ElementMode::Declarative);
        for segment in &segments {
            assert_eq!(segment.items, ElementItems::Functions(vec![func]));
        }
        assert_eq!(module.tables[table].initial.first(), Some(&Some(func)));
    }

    #[test]
    fn test_data_segments_share_an_image() {
        let bytes = module_bytes(&[
            (0x05, &[0x01, 0x00, 0x01]),
            (0x0b, &[0x02, 0x00, 0x41, 0x00, 0x0b, 0x02, b'h', b'i', 0x01, 0x01, b'z']),
        ]);
        let mut module = Module::parse(&bytes).unwrap();
        let ids: Vec<_> = module.data.ids().collect();

        assert!(matches!(module.data[ids[0]].mode, DataMode::Active { explicit_memory: false, .. }));
        assert_eq!(module.data[ids[1]].mode, DataMode::Passive);
        assert_eq!(module.segment_bytes(ids[0]), Some(&b"hi"[..]));
        assert_eq!(module.segment_bytes(ids[1]), Some(&b"z"[..]));
        assert_eq!(module.data_image.len(), 3);

        module.segment_bytes_mut(ids[0]).unwrap().copy_from_slice(b"ho");
        assert_eq!(module.data_image.get(module.data[ids[0]].bytes), Some(&b"ho"[..]));
    }

    #[test]
    fn test_name_section() {
        let mut sections = add1_bytes();
        // module name "m", function 0 named "inc"
        sections.extend_from_slice(&[
            0x00, 0x11, 0x04, b'n', b'a', b'm', b'e', 0x00, 0x02, 0x01, b'm', 0x01, 0x06, 0x01, 0x00, 0x03, b'i', b'n',
            b'c',
        ]);
        let module = Module::parse(&sections).unwrap();
        assert_eq!(module.name.as_deref(), Some("m"));
        let func = module.get_function_by_name("inc").unwrap();
        assert_eq!(module.functions.position_of(func), Some(0));

        let module = parse(&sections, &ParseOptions::new().decode_names(false)).unwrap();
        assert_eq!(module.name, None);
        assert!(module.find_custom_section("name").is_some());
    }

    #[test]
    fn test_custom_decoder_receives_payload() {
        let mut bytes = add1_bytes();
        bytes.extend_from_slice(&[0x00, 0x05, 0x03, b'a', b'p', b'p', 0x2a]);
        let options =
            ParseOptions::new().with_custom_decoder("app", |module: &mut Module, payload: &[u8]| -> Result<(), ParseError> {
                module.name = Some(format!("app-{}", payload[0]));
                Ok(())
            });
        let module = parse(&bytes, &options).unwrap();
        assert_eq!(module.name.as_deref(), Some("app-42"));
        assert_eq!(module.find_custom_section("app").unwrap().payload, vec![0x2a]);
    }

    #[test]
    fn test_reexported_import() {
        let bytes = module_bytes(&[
            (0x02, &[0x01, 0x03, b'e', b'n', b'v', 0x01, b'm', 0x02, 0x00, 0x01]),
            (0x07, &[0x01, 0x01, b'm', 0x02, 0x00]),
        ]);
        let module = Module::parse(&bytes).unwrap();
        let memory = module.memories.id_at(0).unwrap();
        assert_eq!(module.find_export("m").unwrap().target, EntityRef::Memory(memory));
        assert!(module.is_imported(EntityRef::Memory(memory)));

        let err = parse(&bytes, &ParseOptions::new().defined_exports_only(true)).unwrap_err();
        assert!(matches!(err, ParseError::InvalidType { kind: EntityKind::Memory, index: 0, .. }), "{err}");
    }

    // =======================================================================
    // Malformed input
    // =======================================================================

    fn code(body: &[u8]) -> Vec<u8> {
        let mut contents = vec![0x01, body.len() as u8];
        contents.extend_from_slice(body);
        module_bytes(&[TYPE_VOID, ONE_FUNCTION, (0x0a, &contents)])
    }

    #[rstest]
    #[case::unknown_opcode(code(&[0x00, 0x27, 0x0b]))]
    #[case::unknown_prefixed(code(&[0x00, 0xfc, 0x7f, 0x0b]))]
    #[case::negative_block_type(code(&[0x00, 0x02, 0x60, 0x0b, 0x0b]))]
    #[case::unterminated(code(&[0x00, 0x01]))]
    #[case::bad_local(code(&[0x00, 0x20, 0x05, 0x1a, 0x0b]))]
    #[case::call_out_of_range(code(&[0x00, 0x10, 0x02, 0x0b]))]
    #[case::bad_value_type(module_bytes(&[(0x01, &[0x01, 0x60, 0x01, 0x55, 0x00])]))]
    #[case::bad_external_kind(module_bytes(&[(0x02, &[0x01, 0x01, b'a', 0x01, b'b', 0x09, 0x00])]))]
    #[case::export_out_of_range(module_bytes(&[(0x07, &[0x01, 0x01, b'f', 0x00, 0x00])]))]
    #[case::start_out_of_range(module_bytes(&[(0x08, &[0x00])]))]
    #[case::data_count_mismatch(module_bytes(&[(0x05, &[0x01, 0x00, 0x01]), (0x0c, &[0x02]), (0x0b, &[0x01, 0x01, 0x00])]))]
    fn test_malformed(#[case] bytes: Vec<u8>) {
        assert!(Module::parse(&bytes).is_err());
    }

    #[test]
    fn test_error_kinds() {
        let err = Module::parse(&code(&[0x00, 0x27, 0x0b])).unwrap_err();
        assert!(matches!(err, ParseError::UnknownOpcode { opcode: 0x27, .. }), "{err}");

        let err = Module::parse(&code(&[0x00, 0x10, 0x02, 0x0b])).unwrap_err();
        assert!(matches!(err, ParseError::IndexOutOfRange { kind: EntityKind::Function, index: 2, len: 1 }), "{err}");

        let bytes = module_bytes(&[(0x05, &[0x01, 0x00, 0x01]), (0x0c, &[0x02]), (0x0b, &[0x01, 0x01, 0x00])]);
        let err = Module::parse(&bytes).unwrap_err();
        assert!(matches!(err, ParseError::DataCountMismatch { declared: 2, actual: 1 }), "{err}");
    }

    #[test]
    fn test_truncated_input_never_panics() {
        let bytes = add1_bytes();
        for len in 0..bytes.len() {
            let _ = Module::parse(&bytes[..len]);
        }
        assert!(Module::parse(&bytes[..bytes.len() - 1]).is_err());
    }

    #[test]
    fn test_mutated_input_never_panics() {
        let original = add1_bytes();
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..2000 {
            let mut bytes = original.clone();
            for _ in 0..rng.gen_range(1..4) {
                let at = rng.gen_range(8..bytes.len());
                bytes[at] = rng.gen();
            }
            let _ = Module::parse(&bytes);
        }
    }
}
