// src/pipeline/mod.rs

//! Build actions: the work attached to graph tasks.
//!
//! - [`transform`] invokes the external transformer over the source file
//!   set, per file or as one bundle.
//! - [`assets`] copies static files verbatim under the destination
//!   directory, preserving relative structure.
//!
//! Actions capture their configuration up front and re-evaluate their file
//! sets on every run. Failures inside a batch are collected, not fatal: the
//! rest of the batch still runs, and the collected failures surface as one
//! failure outcome for the task graph to report.

pub mod assets;
pub mod transform;

pub use assets::CopyAssetsAction;
pub use transform::{OutputMode, TransformAction};
