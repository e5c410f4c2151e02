//! Comparisons.
//!
//! The unsigned orderings materialize the final borrow as a mask with
//! `sbbq r,r`; the signed variants read the borrow chain's sign flags with
//! `setl`/`setge`, so they return `1`/`0` rather than a mask.

use crate::asm::Ptr;
use crate::emit::Emitter;

/// `a < b`.
pub fn cmplt(e: &mut dyn Emitter, n: usize, signed: bool) {
    let a = Ptr::new(e.take_arg_reg(0, false, None));
    let b = Ptr::new(e.take_arg_reg(1, false, None));

    let tmp = e.pool().take(true);

    for i in 0..n as i64 {
        e.emit(&format!("movq {}, {tmp}", a.displace(i)));
        let insn = if i == 0 { "subq" } else { "sbbq" };
        e.emit(&format!("{insn} {}, {tmp}", b.displace(i)));
    }

    let ret = e.take_retval_reg(true);
    if signed {
        e.emit(&format!("setl {}", ret.byte()));
        e.emit(&format!("movzbq {}, {ret}", ret.byte()));
    } else {
        e.emit(&format!("sbbq {ret}, {ret}"));
    }
}

/// `a <= b`, computed as the complement of `b < a`.
pub fn cmple(e: &mut dyn Emitter, n: usize, signed: bool) {
    let a = Ptr::new(e.take_arg_reg(0, false, None));
    let b = Ptr::new(e.take_arg_reg(1, false, None));

    let tmp = e.pool().take(true);

    for i in 0..n as i64 {
        e.emit(&format!("movq {}, {tmp}", b.displace(i)));
        let insn = if i == 0 { "subq" } else { "sbbq" };
        e.emit(&format!("{insn} {}, {tmp}", a.displace(i)));
    }

    let ret = e.take_retval_reg(true);
    if signed {
        e.emit(&format!("setge {}", ret.byte()));
        e.emit(&format!("movzbq {}, {ret}", ret.byte()));
    } else {
        e.emit(&format!("sbbq {ret}, {ret}"));
        e.emit(&format!("notq {ret}"));
    }
}

/// `a == b`: XOR-reduce the difference, then turn nonzero into `0` and
/// zero into `!0`.
pub fn cmpeq(e: &mut dyn Emitter, n: usize) {
    let a = Ptr::new(e.take_arg_reg(0, false, None));
    let b = Ptr::new(e.take_arg_reg(1, false, None));

    let tmp = e.pool().take(true);
    let ret = e.take_retval_reg(false);

    for i in 0..n as i64 {
        if i > 0 {
            e.emit(&format!("movq {}, {tmp}", a.displace(i)));
            e.emit(&format!("xorq {}, {tmp}", b.displace(i)));
            e.emit(&format!("orq {tmp}, {ret}"));
        } else {
            e.emit(&format!("movq {}, {ret}", a.displace(i)));
            e.emit(&format!("xorq {}, {ret}", b.displace(i)));
        }
    }

    e.emit(&format!("subq $1, {ret}"));
    e.emit(&format!("sbbq {ret}, {ret}"));
}
