//! The emitter contract the routine templates are written against.
//!
//! A template never knows which backend renders it.  It obtains registers
//! for its arguments, a zero register, and a return-value register through
//! the trait below, emits instruction lines as text, and lets the backend
//! decide how operands are spelled and how clobbers are reported.

pub mod inline;
pub mod sysv;

pub use inline::InlineAsmEmitter;
pub use sysv::SysvFnEmitter;

use crate::asm::{Reg, RegPool, Register};

/// One backend of the generator.
///
/// The contract around arguments: `add_fixed_reg` declarations must precede
/// `set_nargs` and any `take_arg_reg`, and the inline backend requires
/// argument indices to be taken in increasing order starting from zero.
pub trait Emitter {
    /// Declare that the routine will use a specific named register, so
    /// arguments that arrive in it must be moved out of the way first.
    fn add_fixed_reg(&mut self, reg: Register);

    /// Lock in the number of live arguments and rebind any whose SysV slot
    /// collides with a fixed register.  A no-op for the inline backend.
    fn set_nargs(&mut self, nargs: usize);

    /// Obtain a register holding argument `index`.  With `into` set, the
    /// value is steered into that specific register (moving if necessary).
    /// With `write`, the register is marked clobbered.
    fn take_arg_reg(&mut self, index: usize, write: bool, into: Option<Register>) -> Reg;

    /// Obtain a register guaranteed to hold zero.
    fn take_zero_reg(&mut self) -> Reg;

    /// Obtain the register carrying the routine result.  When
    /// `may_overwrite_taken` is false, the inline backend marks the output
    /// early-clobber so the compiler will not alias it with a live input.
    fn take_retval_reg(&mut self, may_overwrite_taken: bool) -> Reg;

    /// Route `src` into the return-value slot, moving only if needed.
    fn write_retval(&mut self, src: &Reg);

    /// Append one instruction line.
    fn emit(&mut self, line: &str);

    fn emit_prologue(&mut self);
    fn emit_epilogue(&mut self);

    /// A fresh routine-local label.
    fn gen_label(&mut self) -> String;

    /// Place a previously generated label at the current position.
    fn label_here(&mut self, label: &str);

    /// The backend's register pool, for templates that need raw scratch.
    fn pool(&mut self) -> &mut RegPool;
}
