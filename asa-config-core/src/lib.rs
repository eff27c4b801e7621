//! Line model, grammars and object catalog for ASA-style firewall configurations.

pub mod catalog;
pub mod document;
pub mod grammar;

pub use catalog::{reference_of, Catalog, CatalogEntry, CatalogError, ObjectRef, RefKind};
pub use document::{parse, parse_file, write, write_file, ConfigLine, ReadError, WriteError};
pub use grammar::{join_fields, parse_ace, parse_service, AccessListEntry, ServiceObject};
