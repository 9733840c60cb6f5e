//! A WebAssembly binary codec built around an editable module graph.
//!
//! wasmgraph decodes `.wasm` bytes into a [`Module`] whose entities refer to
//! each other by identity rather than by wire index, lets callers edit that
//! graph (add imports and exports, swap globals, append functions and
//! segments), and encodes it back to bytes with every index recomputed.
//!
//! # Modules
//!
//! - [`parser`] -- Binary decoder, the module graph, and the opcode table.
//! - [`encoder`] -- Binary encoder. Serialises a `Module` back to `.wasm` bytes.
//! - [`provenance`] -- Backward stack walk locating the producer of an operand.
//!
//! # Example
//!
//! Parse a module, export its function under a new name, and re-encode:
//!
//! ```
//! use wasmgraph::{EncodeOptions, Module};
//! use wasmgraph::parser::module::EntityRef;
//!
//! let bytes = [
//!     0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00, // header
//!     0x01, 0x04, 0x01, 0x60, 0x00, 0x00, // type () -> ()
//!     0x03, 0x02, 0x01, 0x00, // one function of type 0
//!     0x0a, 0x04, 0x01, 0x02, 0x00, 0x0b, // empty body
//! ];
//! let mut module = Module::parse(&bytes).unwrap();
//! let func = module.functions.id_at(0).unwrap();
//! module.append_export("run", EntityRef::Function(func)).unwrap();
//!
//! let encoded = module.encode(&EncodeOptions::default()).unwrap();
//! let reparsed = Module::parse(&encoded).unwrap();
//! assert_eq!(reparsed.find_export("run").map(|e| e.target), Some(EntityRef::Function(func)));
//! ```
//!
//! # Specification
//!
//! Reads and writes the [WebAssembly binary format](https://webassembly.github.io/spec/core/binary/)
//! including bulk memory, reference types, SIMD, threads, tail calls and the
//! legacy exception handling proposal.

pub mod encoder;
pub mod parser;
pub mod provenance;

pub use encoder::{encode, EncodeError, EncodeOptions, SectionKind};
pub use parser::{parse, Module, ParseError, ParseOptions};
pub use provenance::{find_memory_address, find_producer, Provenance, StackContext};
