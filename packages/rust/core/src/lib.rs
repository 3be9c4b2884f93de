//! Archive pipeline and domain logic for toolvault.
//!
//! This crate ties together keyword classification, the archive index,
//! source decoding and note writing into a single run (`pipeline::run`).

pub mod archive;
pub mod classify;
pub mod document;
pub mod pipeline;
pub mod source;
