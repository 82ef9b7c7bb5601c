//! Domain model for the task board.
//!
//! # Responsibility
//! - Define the canonical task record and its validated inputs.
//! - Keep wire naming (`camelCase`) next to the data it describes.
//!
//! # Invariants
//! - Every task is identified by a stable `TaskId`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod task;
