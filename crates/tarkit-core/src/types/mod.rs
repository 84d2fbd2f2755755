//! Entry model and the path types extraction is built on.
//!
//! [`DestDir`] and [`SafePath`] can only be obtained through validation, so
//! any path the extractor writes to has been proven to stay inside the root.

pub mod dest_dir;
pub mod entry;
pub mod entry_type;
pub mod safe_path;

pub use dest_dir::DestDir;
pub use entry::Entry;
pub use entry_type::EntryType;
pub use safe_path::SafePath;
pub use safe_path::strip_components;
