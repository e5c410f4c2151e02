//! The register catalog.
//!
//! Fourteen general-purpose registers are usable by generated code (`rsp`
//! is left alone and `rbp` may be a frame pointer).  Scratch registers come
//! first in index order, callee-saved registers last, so a pool drawn from
//! the scratch set never hands out a register the caller expects preserved.

use derive_more::Display;

/// General-purpose x86-64 registers, in catalog index order.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq, PartialOrd, Ord)]
#[allow(missing_docs)]
pub enum Register {
    #[display("rax")]
    Rax,
    #[display("rdi")]
    Rdi,
    #[display("rsi")]
    Rsi,
    #[display("rdx")]
    Rdx,
    #[display("rcx")]
    Rcx,
    #[display("r8")]
    R8,
    #[display("r9")]
    R9,
    #[display("r10")]
    R10,
    #[display("r11")]
    R11,
    #[display("rbx")]
    Rbx,
    #[display("r12")]
    R12,
    #[display("r13")]
    R13,
    #[display("r14")]
    R14,
    #[display("r15")]
    R15,
}

use Register::*;

/// Registers free for unrestricted use under the SysV AMD64 ABI.
pub const SCRATCH_REGS: [Register; 9] = [Rax, Rdi, Rsi, Rdx, Rcx, R8, R9, R10, R11];

/// Registers the caller expects preserved.
pub const CALLEE_SAVED_REGS: [Register; 5] = [Rbx, R12, R13, R14, R15];

/// The first six integer arguments are passed in these, in order.
pub const SYSV_ABI_ARG_REGS: [Register; 6] = [Rdi, Rsi, Rdx, Rcx, R8, R9];

impl Register {
    /// Position in the catalog; scratch registers sort before callee-saved.
    pub fn index(self) -> usize {
        self as usize
    }

    /// The low-32-bit alias, without the `%` sigil.
    pub fn dword_name(self) -> &'static str {
        match self {
            Rax => "eax",
            Rdi => "edi",
            Rsi => "esi",
            Rdx => "edx",
            Rcx => "ecx",
            R8 => "r8d",
            R9 => "r9d",
            R10 => "r10d",
            R11 => "r11d",
            Rbx => "ebx",
            R12 => "r12d",
            R13 => "r13d",
            R14 => "r14d",
            R15 => "r15d",
        }
    }

    /// The low-8-bit alias, without the `%` sigil.
    pub fn byte_name(self) -> &'static str {
        match self {
            Rax => "al",
            Rdi => "dil",
            Rsi => "sil",
            Rdx => "dl",
            Rcx => "cl",
            R8 => "r8b",
            R9 => "r9b",
            R10 => "r10b",
            R11 => "r11b",
            Rbx => "bl",
            R12 => "r12b",
            R13 => "r13b",
            R14 => "r14b",
            R15 => "r15b",
        }
    }

    /// The single-letter GCC register constraint, for the registers that
    /// have one.
    pub fn constraint_letter(self) -> Option<char> {
        match self {
            Rax => Some('a'),
            Rbx => Some('b'),
            Rcx => Some('c'),
            Rdx => Some('d'),
            Rsi => Some('S'),
            Rdi => Some('D'),
            _ => None,
        }
    }
}
