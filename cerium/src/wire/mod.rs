pub mod ops;
mod writer;

pub use writer::PickleWriter;

/// Stream preamble constant. Readers reject anything else outright.
pub const MAGIC: [u8; 4] = *b"CER1";

pub const FORMAT_MAJOR: u32 = 1;
pub const FORMAT_MINOR: u32 = 0;

/// Version of the metadata model the stream was produced against.
/// Informational only; the reader does not branch on it.
pub const MODEL_MAJOR: u32 = 1;
pub const MODEL_MINOR: u32 = 0;

/// Marks the end of a translated IL body.
pub const BODY_TERMINATOR: u8 = 0xFF;
