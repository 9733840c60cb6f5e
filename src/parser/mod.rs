pub mod custom;
pub mod encoding;
pub mod entity;
pub mod error;
pub mod instruction;
pub mod limits;
pub mod module;
pub mod reader;
mod sections;
pub mod types;

use std::collections::HashMap;
use std::fmt;

use log::{debug, warn};

pub use custom::{CustomSectionDecoder, NAME_SECTION};
pub use error::ParseError;
pub use module::Module;

use encoding::{MAGIC, VERSION};
use module::{CustomSection, Section, SectionPosition};
use reader::Reader;
use types::SectionId;

/// Order in which known sections are decoded. Tags come before globals and
/// data before code so every index can be resolved when it is read.
const DECODE_ORDER: [SectionId; 13] = [
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
    SectionId::Data,
    SectionId::Code,
];

/// Options for [`parse`].
pub struct ParseOptions {
    custom_decoders: HashMap<String, Box<dyn CustomSectionDecoder>>,
    decode_names: bool,
    defined_exports_only: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions { custom_decoders: HashMap::new(), decode_names: true, defined_exports_only: false }
    }
}

impl ParseOptions {
    pub fn new() -> ParseOptions {
        ParseOptions::default()
    }

    /// Registers a decoder for custom sections called `name`. A registered
    /// decoder takes precedence over the built-in `name` section decoder, and
    /// its errors abort the parse.
    pub fn with_custom_decoder(mut self, name: impl Into<String>, decoder: impl CustomSectionDecoder + 'static) -> Self {
        self.custom_decoders.insert(name.into(), Box::new(decoder));
        self
    }

    /// Whether to apply the `name` section to module and function names.
    pub fn decode_names(mut self, decode_names: bool) -> Self {
        self.decode_names = decode_names;
        self
    }

    /// Rejects exports of imported entities. Off by default: the binary
    /// format allows re-exporting an import, but some hosts only accept
    /// exports of entities the module defines.
    pub fn defined_exports_only(mut self, defined_exports_only: bool) -> Self {
        self.defined_exports_only = defined_exports_only;
        self
    }
}

impl fmt::Debug for ParseOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.custom_decoders.keys().collect();
        names.sort();
        f.debug_struct("ParseOptions")
            .field("custom_decoders", &names)
            .field("decode_names", &self.decode_names)
            .field("defined_exports_only", &self.defined_exports_only)
            .finish()
    }
}

/// Decodes a binary module.
pub fn parse(bytes: &[u8], options: &ParseOptions) -> Result<Module, ParseError> {
    let mut reader = Reader::new(bytes);
    let mut module = Module::new();

    module.version = read_header(&mut reader)?;
    let payloads = split_sections(&mut reader, &mut module)?;

    for id in DECODE_ORDER {
        let Some((_, payload)) = payloads.iter().find(|(seen, _)| *seen == id) else {
            continue;
        };
        let mut payload = payload.clone();
        let expected = payload.remaining();
        debug!("decoding {id} section, {expected} bytes");

        read_section(id, &mut payload, &mut module)?;

        if !payload.is_empty() {
            return Err(ParseError::SectionSizeMismatch { section: id, expected, actual: payload.local_pos() });
        }
    }

    // A function section without a code section leaves bodies unfilled.
    if module.find_section(SectionId::Code).is_none() {
        let defined = module.functions.defined().count();
        if defined > 0 {
            return Err(ParseError::FunctionCountMismatch { functions: defined, bodies: 0 });
        }
    }
    if let Some(declared) = module.declared_data_count {
        if declared as usize != module.data.len() {
            return Err(ParseError::DataCountMismatch { declared, actual: module.data.len() });
        }
    }

    if options.defined_exports_only {
        check_defined_exports(&module)?;
    }

    sections::place_table_elements(&mut module);
    decode_custom_sections(&mut module, options)?;

    debug!("{module}");
    Ok(module)
}

impl Module {
    /// Decodes a binary module with default options.
    pub fn parse(bytes: &[u8]) -> Result<Module, ParseError> {
        parse(bytes, &ParseOptions::default())
    }
}

fn check_defined_exports(module: &Module) -> Result<(), ParseError> {
    match module.exports.iter().find(|e| module.is_imported(e.target)) {
        Some(export) => Err(ParseError::InvalidType {
            kind: export.target.kind().into(),
            index: module.index_of(export.target).unwrap_or_default() as u32,
            reason: format!("export {:?} refers to an import; only defined entities are exportable", export.name),
        }),
        None => Ok(()),
    }
}

fn read_header(reader: &mut Reader) -> Result<u32, ParseError> {
    let magic = reader.read_bytes(MAGIC.len())?;
    if magic != MAGIC {
        return Err(ParseError::BadMagic(u32::from_le_bytes([magic[0], magic[1], magic[2], magic[3]])));
    }
    let version = reader.read_u32()?;
    if version != VERSION {
        return Err(ParseError::UnsupportedVersion(version));
    }
    Ok(version)
}

/// Splits the input into section payloads, recording every section in input
/// order on the module. Custom sections are stored whole; known sections are
/// returned for decoding.
fn split_sections<'a>(
    reader: &mut Reader<'a>,
    module: &mut Module,
) -> Result<Vec<(SectionId, Reader<'a>)>, ParseError> {
    let mut known: Vec<(SectionId, Reader<'a>)> = Vec::new();
    let mut last_rank = None;

    while !reader.is_empty() {
        let id_byte = reader.read_byte()?;
        let id = SectionId::try_from(id_byte).map_err(|_| ParseError::UnknownSection(id_byte))?;
        let size = reader.read_vu32()? as usize;
        let start = reader.pos();
        let mut payload = reader.sub_reader(size)?;
        let position = Some(SectionPosition::new(start, start + size));

        match id.rank() {
            None => {
                let name = payload.read_name()?;
                let data = payload.read_bytes(payload.remaining())?.to_vec();
                debug!("custom section {name:?}, {} bytes", data.len());
                module.sections.push(Section::Custom(CustomSection { name, payload: data, position }));
            }
            Some(rank) => {
                if known.iter().any(|(seen, _)| *seen == id) {
                    return Err(ParseError::DuplicateSection(id));
                }
                if last_rank.map_or(false, |last| rank < last) {
                    return Err(ParseError::SectionOutOfOrder(id));
                }
                last_rank = Some(rank);
                module.sections.push(Section::Known { id, position });
                known.push((id, payload));
            }
        }
    }

    Ok(known)
}

fn read_section(id: SectionId, reader: &mut Reader, module: &mut Module) -> Result<(), ParseError> {
    match id {
        SectionId::Type => sections::read_section_type(reader, module),
        SectionId::Import => sections::read_section_import(reader, module),
        SectionId::Function => sections::read_section_function(reader, module),
        SectionId::Table => sections::read_section_table(reader, module),
        SectionId::Memory => sections::read_section_memory(reader, module),
        SectionId::Tag => sections::read_section_tag(reader, module),
        SectionId::Global => sections::read_section_global(reader, module),
        SectionId::Export => sections::read_section_export(reader, module),
        SectionId::Start => sections::read_section_start(reader, module),
        SectionId::Element => sections::read_section_element(reader, module),
        SectionId::DataCount => sections::read_section_data_count(reader, module),
        SectionId::Data => sections::read_section_data(reader, module),
        SectionId::Code => sections::read_section_code(reader, module),
        SectionId::Custom => Ok(()),
    }
}

fn decode_custom_sections(module: &mut Module, options: &ParseOptions) -> Result<(), ParseError> {
    let customs: Vec<(String, Vec<u8>)> =
        module.custom_sections().map(|c| (c.name.clone(), c.payload.clone())).collect();

    for (name, payload) in customs {
        if let Some(decoder) = options.custom_decoders.get(&name) {
            decoder
                .decode(module, &payload)
                .map_err(|e| ParseError::CustomSection { name: name.clone(), reason: e.to_string() })?;
        } else if name == NAME_SECTION && options.decode_names {
            if let Err(e) = custom::decode_name_section(module, &payload) {
                warn!("ignoring malformed name section: {e}");
            }
        } else {
            debug!("custom section {name:?} kept opaque");
        }
    }

    Ok(())
}
