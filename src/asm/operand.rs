//! Operands that emitted instructions can mention.
//!
//! A register operand is either *concrete* (a catalog register, spelled
//! `%rax`) or *symbolic* (a named hole the GCC constraint solver fills in
//! later).  Symbolic operands are spelled with a `!` placeholder sigil
//! (`![arg0]`); the inline backend rewrites `!` to `%` after doubling
//! literal `%`s, so both kinds survive its escaping.  Symbolic operands
//! never appear in SysV output; concrete ones appear in inline output only
//! when a template steered a value into a named register.

use derive_more::Display;
use std::fmt;

use super::reg::Register;

/// A register operand usable at qword, dword, or byte width.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum Reg {
    /// A concrete catalog register.
    #[display("%{_0}")]
    Real(Register),
    /// A placeholder bound by the inline-asm constraint system.
    #[display("![{_0}]")]
    Sym(String),
}

impl Reg {
    pub fn sym(keyword: impl Into<String>) -> Self {
        Reg::Sym(keyword.into())
    }

    /// The full 64-bit spelling (same as `Display`).
    pub fn full(&self) -> String {
        self.to_string()
    }

    /// The low-32-bit spelling (`%eax` / `!k[arg0]`).
    pub fn dword(&self) -> String {
        match self {
            Reg::Real(r) => format!("%{}", r.dword_name()),
            Reg::Sym(kw) => format!("!k[{kw}]"),
        }
    }

    /// The low-8-bit spelling (`%al` / `!b[arg0]`).
    pub fn byte(&self) -> String {
        match self {
            Reg::Real(r) => format!("%{}", r.byte_name()),
            Reg::Sym(kw) => format!("!b[{kw}]"),
        }
    }
}

/// A pointer into a limb array: a base register plus a displacement
/// counted in limbs.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Ptr {
    base: Reg,
    disp: i64,
}

impl Ptr {
    pub fn new(base: Reg) -> Self {
        Ptr { base, disp: 0 }
    }

    /// A pointer to the limb `disp` positions further; shares the base.
    pub fn displace(&self, disp: i64) -> Ptr {
        Ptr {
            base: self.base.clone(),
            disp: self.disp + disp,
        }
    }
}

impl fmt::Display for Ptr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.disp != 0 {
            write!(f, "{}({})", self.disp * 8, self.base)
        } else {
            write!(f, "({})", self.base)
        }
    }
}

/// Any instruction operand: a register, a memory location, or an
/// immediate.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum Operand {
    Reg(Reg),
    Mem(Ptr),
    #[display("${_0}")]
    Imm(i64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concrete_spellings() {
        let r = Reg::Real(Register::Rax);
        assert_eq!(r.full(), "%rax");
        assert_eq!(r.dword(), "%eax");
        assert_eq!(r.byte(), "%al");
    }

    #[test]
    fn symbolic_spellings() {
        let r = Reg::sym("arg0");
        assert_eq!(r.full(), "![arg0]");
        assert_eq!(r.dword(), "!k[arg0]");
        assert_eq!(r.byte(), "!b[arg0]");
    }

    #[test]
    fn pointer_displacement_is_in_limbs() {
        let p = Ptr::new(Reg::Real(Register::Rdi));
        assert_eq!(p.to_string(), "(%rdi)");
        assert_eq!(p.displace(3).to_string(), "24(%rdi)");
        assert_eq!(p.displace(1).displace(1).to_string(), "16(%rdi)");
    }

    #[test]
    fn immediate_display() {
        assert_eq!(Operand::Imm(0).to_string(), "$0");
        assert_eq!(Operand::Mem(Ptr::new(Reg::sym("arg1"))).to_string(), "(![arg1])");
    }
}
