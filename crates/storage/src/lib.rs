#![forbid(unsafe_code)]

pub mod builtin;
pub mod repository;
pub mod sqlite;

pub use repository::{Storage, StorageError};
