//! Storage layer: the blob capability trait and its adapters.

pub mod blob_service;
pub mod fs_blob_store;

#[cfg(test)]
pub mod memory_blob_store;
