//! Custom section decoding.
//!
//! Custom sections are always kept as opaque payloads on the module so they
//! re-encode byte for byte. A decoder registered for a section name may
//! additionally read the payload and annotate the module; the only decoder
//! built in is the one for the `name` section.

use log::trace;

use super::error::ParseError;
use super::module::{FuncId, Module};
use super::reader::Reader;
use super::types::EntityKind;

pub const NAME_SECTION: &str = "name";

const NAME_SUBSECTION_MODULE: u8 = 0;
const NAME_SUBSECTION_FUNCTIONS: u8 = 1;

/// Reads a custom section payload (the bytes after the section name).
pub trait CustomSectionDecoder {
    fn decode(&self, module: &mut Module, payload: &[u8]) -> Result<(), ParseError>;
}

impl<F> CustomSectionDecoder for F
where
    F: Fn(&mut Module, &[u8]) -> Result<(), ParseError>,
{
    fn decode(&self, module: &mut Module, payload: &[u8]) -> Result<(), ParseError> {
        self(module, payload)
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Names {
    module: Option<String>,
    functions: Vec<(FuncId, String)>,
}

fn read_names(payload: &[u8], module: &Module) -> Result<Names, ParseError> {
    let mut reader = Reader::new(payload);
    let mut names = Names::default();

    while !reader.is_empty() {
        let id = reader.read_byte()?;
        let size = reader.read_vu32()? as usize;
        let mut sub = reader.sub_reader(size)?;
        match id {
            NAME_SUBSECTION_MODULE => names.module = Some(sub.read_name()?),
            NAME_SUBSECTION_FUNCTIONS => {
                let count = sub.read_vu32()?;
                for _ in 0..count {
                    let index = sub.read_vu32()?;
                    let func = module.functions.id_at(index).ok_or(ParseError::IndexOutOfRange {
                        kind: EntityKind::Function,
                        index,
                        len: module.functions.len(),
                    })?;
                    names.functions.push((func, sub.read_name()?));
                }
            }
            // local, label, type, ... names are not retained
            _ => trace!("skipping name subsection {id}"),
        }
    }

    Ok(names)
}

/// Applies the `name` section to the module. Nothing is applied unless the
/// whole payload decodes.
pub fn decode_name_section(module: &mut Module, payload: &[u8]) -> Result<(), ParseError> {
    let names = read_names(payload, module)?;
    if names.module.is_some() {
        module.name = names.module;
    }
    for (func, name) in names.functions {
        module.functions[func].name = Some(name);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::types::FuncType;

    #[test]
    fn test_name_section() {
        let mut module = Module::new();
        let ty = module.types.push(FuncType::default());
        let f = module.add_defined_function(ty, &[], vec![]).unwrap();

        let payload = [
            0x00, 0x04, 0x03, b'm', b'o', b'd', // module name
            0x01, 0x06, 0x01, 0x00, 0x03, b'a', b'd', b'd', // function 0 = "add"
            0x02, 0x01, 0x00, // local names, skipped
        ];
        decode_name_section(&mut module, &payload).unwrap();
        assert_eq!(module.name.as_deref(), Some("mod"));
        assert_eq!(module.functions[f].name.as_deref(), Some("add"));
        assert_eq!(module.get_function_by_name("add"), Some(f));
    }

    #[test]
    fn test_bad_name_section_changes_nothing() {
        let mut module = Module::new();
        let payload = [0x00, 0x02, 0x01, b'm', 0x01, 0x03, 0x01, 0x05, 0x00];
        assert!(decode_name_section(&mut module, &payload).is_err());
        assert_eq!(module.name, None);
    }

    #[test]
    fn test_closure_decoder() {
        let decoder = |module: &mut Module, payload: &[u8]| -> Result<(), ParseError> {
            module.name = Some(String::from_utf8_lossy(payload).into_owned());
            Ok(())
        };
        let mut module = Module::new();
        decoder.decode(&mut module, b"hello").unwrap();
        assert_eq!(module.name.as_deref(), Some("hello"));
    }
}
