//! Addition and subtraction chains.

use crate::asm::{Operand, Ptr, Reg};
use crate::emit::Emitter;

/// Whether a carry chain adds or subtracts.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AddSub {
    Add,
    Sub,
}

impl AddSub {
    /// The chain-starting mnemonic.
    pub fn plain(self) -> &'static str {
        match self {
            AddSub::Add => "add",
            AddSub::Sub => "sub",
        }
    }

    /// The flag-consuming continuation mnemonic.
    pub fn carrying(self) -> &'static str {
        match self {
            AddSub::Add => "adc",
            AddSub::Sub => "sbb",
        }
    }
}

/// `a[0..n) ±= b[0..n)`; returns `!0` on carry/borrow out, else `0`.
pub fn addsub(e: &mut dyn Emitter, n: usize, op: AddSub) {
    let a = Ptr::new(e.take_arg_reg(0, false, None));
    let b = Ptr::new(e.take_arg_reg(1, false, None));

    let tmp = e.pool().take(true);

    for i in 0..n as i64 {
        e.emit(&format!("movq {}, {tmp}", b.displace(i)));
        let insn = if i == 0 { op.plain() } else { op.carrying() };
        e.emit(&format!("{insn}q {tmp}, {}", a.displace(i)));
    }

    let ret = e.take_retval_reg(true);
    e.emit(&format!("sbbq {ret}, {ret}"));
}

/// One group of the masked chain: mask `group.len()` limbs of `b` into the
/// group registers, then add/subtract them into `a`.  `restore` re-arms CF
/// from the saved borrow before continuing the chain; `save` captures CF
/// into the carry register afterwards.
fn masked_group(
    e: &mut dyn Emitter,
    a: &Ptr,
    b: &Ptr,
    carry: Option<&Reg>,
    mask: &Reg,
    group: &[Reg],
    op: AddSub,
    save: bool,
    restore: bool,
) {
    for (i, reg) in group.iter().enumerate() {
        e.emit(&format!("movq {}, {reg}", b.displace(i as i64)));
        e.emit(&format!("andq {mask}, {reg}"));
    }

    if restore {
        let carry = carry.expect("no carry register to restore from");
        e.emit(&format!("shlq $1, {carry}"));
    }

    for (i, reg) in group.iter().enumerate() {
        let insn = if !restore && i == 0 { op.plain() } else { op.carrying() };
        e.emit(&format!("{insn}q {reg}, {}", a.displace(i as i64)));
    }

    if save {
        let carry = carry.expect("no carry register to save into");
        e.emit(&format!("sbbq {carry}, {carry}"));
    }
}

/// `a[0..n) ±= b[0..n) & mask`, processed in groups of `m` to cap register
/// pressure; returns the final carry/borrow as a mask.
pub fn addsub_masked(e: &mut dyn Emitter, n: usize, op: AddSub, m: usize) {
    let mut a = Ptr::new(e.take_arg_reg(0, false, None));
    let mut b = Ptr::new(e.take_arg_reg(1, false, None));
    let mask = e.take_arg_reg(2, false, None);

    if n > m {
        let carry = e.pool().take(true);
        let group: Vec<Reg> = (0..m).map(|_| e.pool().take(true)).collect();
        let mut restore = false;
        let mut left = n;
        while left > 0 {
            let this_m = left.min(m);
            masked_group(
                e,
                &a,
                &b,
                Some(&carry),
                &mask,
                &group[..this_m],
                op,
                this_m != left,
                restore,
            );
            a = a.displace(this_m as i64);
            b = b.displace(this_m as i64);
            restore = true;
            left -= this_m;
        }
    } else {
        let group: Vec<Reg> = (0..n).map(|_| e.pool().take(true)).collect();
        masked_group(e, &a, &b, None, &mask, &group, op, false, false);
    }

    let ret = e.take_retval_reg(true);
    e.emit(&format!("sbbq {ret}, {ret}"));
}

/// `a[0..n) ±= b` with carry propagation through the zero addends;
/// returns the final carry/borrow as a mask.
///
/// The leaky variant may exit early once the chain is past the point where
/// a carry is still likely; it never branches on the first limb, whose
/// carry is a coin flip the branch predictor cannot learn.
pub fn addsub_q(e: &mut dyn Emitter, n: usize, op: AddSub, leaky: bool) {
    let a = Ptr::new(e.take_arg_reg(0, false, None));
    let b = e.take_arg_reg(1, false, None);

    let zero = Operand::Imm(0);

    let label_done = if leaky && n > 2 {
        Some(e.gen_label())
    } else {
        None
    };

    for i in 0..n {
        if i > 0 {
            e.emit(&format!("{}q {zero}, {}", op.carrying(), a.displace(i as i64)));
            if let Some(label) = &label_done {
                if i != n - 1 {
                    e.emit(&format!("jnc {label}"));
                }
            }
        } else {
            e.emit(&format!("{}q {b}, {}", op.plain(), a.displace(0)));
        }
    }

    if let Some(label) = &label_done {
        e.label_here(label);
    }

    let ret = e.take_retval_reg(true);
    e.emit(&format!("sbbq {ret}, {ret}"));
}

/// `b[0..n) = -a[0..n)`, borrow-chained; returns `!0` iff `a` was nonzero.
pub fn negate(e: &mut dyn Emitter, n: usize) {
    let a = Ptr::new(e.take_arg_reg(0, false, None));
    let b = Ptr::new(e.take_arg_reg(1, false, None));

    let tmp = e.pool().take(true);

    for i in 0..n as i64 {
        if i > 0 {
            e.emit(&format!("movq $0, {tmp}"));
            e.emit(&format!("sbbq {}, {tmp}", a.displace(i)));
        } else {
            e.emit(&format!("movq {}, {tmp}", a.displace(i)));
            e.emit(&format!("negq {tmp}"));
        }
        e.emit(&format!("movq {tmp}, {}", b.displace(i)));
    }

    let ret = e.take_retval_reg(true);
    e.emit(&format!("sbbq {ret}, {ret}"));
}
