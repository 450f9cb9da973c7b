//! # eats-store
//!
//! Storage layer for EATS records.
//!
//! This crate provides:
//! - `EntityRecord` (an entity and the property assertions made about it)
//! - `MemoryStore` (the name-assertion repository: infrastructure,
//!   authorities, entities, and the operations that keep the name index
//!   consistent with them)
//! - `NameIndex` (the searchable name-form rows derived from names)
//! - JSONL read/write (portable persistence)
//!
//! ## Data model
//!
//! ```text
//! store.jsonl        (one record per line: language, script, authority,
//!     ↕               entity, merged, sequence)
//! MemoryStore  ──create/update name──▶ NameIndex
//!     ↕                                    ↕
//!                                  store.index.jsonl (derived, stamped
//!                                  with the store snapshot it came from)
//! ```

pub mod entity;
pub mod jsonl;
pub mod memory;
pub mod name_index;

pub use entity::EntityRecord;
pub use jsonl::{
    JsonlError, encode_records, parse_records, read_records_from_path, write_records_to_path,
};
pub use memory::{MemoryStore, ReindexSummary, StoreError, StoreRecord, index_path_for};
pub use name_index::{IndexRow, NameIndex};
