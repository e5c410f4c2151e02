//! Division of a limb vector by a single limb.

use crate::asm::{Ptr, Register};
use crate::emit::Emitter;

/// Whether quotient limbs are stored or only the remainder is wanted.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DivKind {
    Div,
    Mod,
}

/// `dst[0..n) = a[0..n) / m`, high limb first, returning the remainder.
/// In mod-only mode there is no destination argument and only the
/// remainder is produced.  No guard is emitted: `divq` by zero traps.
pub fn div_q(e: &mut dyn Emitter, n: usize, kind: DivKind) {
    e.add_fixed_reg(Register::Rax);
    e.add_fixed_reg(Register::Rdx);

    let a = Ptr::new(e.take_arg_reg(0, false, None));
    let m = e.take_arg_reg(1, false, None);
    let dst = match kind {
        DivKind::Div => Some(Ptr::new(e.take_arg_reg(2, false, None))),
        DivKind::Mod => None,
    };

    let rax = e.pool().take_named(Register::Rax, true);
    let rdx = e.pool().take_named(Register::Rdx, true);

    // %rdx is the running high half; it starts at zero and carries each
    // step's remainder into the next.
    e.emit(&format!("xorl {}, {}", rdx.dword(), rdx.dword()));

    for i in (0..n as i64).rev() {
        e.emit(&format!("movq {}, {rax}", a.displace(i)));
        e.emit(&format!("divq {m}"));
        if let Some(dst) = &dst {
            e.emit(&format!("movq {rax}, {}", dst.displace(i)));
        }
    }

    e.write_retval(&rdx);
}
