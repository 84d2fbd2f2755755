//! On-disk format: ustar header blocks, PAX records and the compression
//! wrappers around them.

pub mod compression;
pub mod header;
pub mod pax;

pub use compression::CompressionCodec;
pub use header::HeaderFields;
pub use pax::PaxAttributes;
