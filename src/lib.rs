//! Code generator for fixed-width multi-precision integer arithmetic on
//! x86-64.  See the `src/bin` directory for the executable program using
//! this library.
//!
//! Big integers are arrays of `n` 64-bit limbs, least significant first.
//! For a given `n` the crate emits one routine family in either of two
//! renderings: standalone GNU assembly following the System V AMD64 calling
//! convention, or a C header whose function bodies are GCC extended inline
//! assembly.  Both renderings come from a single template per routine,
//! written against the [`emit::Emitter`] contract; the backends differ only
//! in operand spelling, register reservation, and clobber reporting.

pub mod asm;
pub mod caps;
pub mod catalog;
pub mod driver;
pub mod emit;
pub mod funcs;
