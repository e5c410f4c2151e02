//! Bit shifts by a runtime count in `0..64`.
//!
//! The baseline lowering keeps the count in `%cl` and merges neighbor
//! limbs with `shrdq`/`shldq`.  The BMI2 lowering uses the three-operand
//! `shrxq`/`shlxq`/`sarxq`, shifting the donor limb the opposite way by
//! the negated count and OR-ing the pieces; that merge is only correct for
//! a nonzero count, which is why the zero-tolerant exports stay on the
//! baseline.
//!
//! Both walks ping-pong two temporaries so the current limb and its donor
//! are always at hand.

use std::mem;

use crate::asm::{Operand, Ptr, Reg, Register};
use crate::emit::Emitter;

#[allow(clippy::too_many_arguments)]
fn shift_right_step(
    e: &mut dyn Emitter,
    src: &Operand,
    dst: &Reg,
    donor: Option<&Reg>,
    count: &Reg,
    neg_count: Option<&Reg>,
    scratch: Option<&Reg>,
    signed: bool,
    bmi2: bool,
) {
    // the top limb of a signed shift fills with the sign, all others get
    // donor bits
    let base = if signed && donor.is_none() { "sar" } else { "shr" };
    if bmi2 {
        e.emit(&format!("{base}xq {count}, {src}, {dst}"));
        if let Some(donor) = donor {
            let neg_count = neg_count.expect("no negated count register");
            let scratch = scratch.expect("no scratch register");
            e.emit(&format!("shlxq {neg_count}, {donor}, {scratch}"));
            e.emit(&format!("orq {scratch}, {dst}"));
        }
    } else {
        if *src != Operand::Reg(dst.clone()) {
            e.emit(&format!("movq {src}, {dst}"));
        }
        match donor {
            Some(donor) => e.emit(&format!("shrdq %cl, {donor}, {dst}")),
            None => e.emit(&format!("{base}q %cl, {dst}")),
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn shift_left_step(
    e: &mut dyn Emitter,
    src: &Operand,
    dst: &Reg,
    donor: Option<&Reg>,
    count: &Reg,
    neg_count: Option<&Reg>,
    scratch: Option<&Reg>,
    bmi2: bool,
) {
    if bmi2 {
        e.emit(&format!("shlxq {count}, {src}, {dst}"));
        if let Some(donor) = donor {
            let neg_count = neg_count.expect("no negated count register");
            let scratch = scratch.expect("no scratch register");
            e.emit(&format!("shrxq {neg_count}, {donor}, {scratch}"));
            e.emit(&format!("orq {scratch}, {dst}"));
        }
    } else {
        if *src != Operand::Reg(dst.clone()) {
            e.emit(&format!("movq {src}, {dst}"));
        }
        match donor {
            Some(donor) => e.emit(&format!("shldq %cl, {donor}, {dst}")),
            None => e.emit(&format!("shlq %cl, {dst}")),
        }
    }
}

/// `dst[0..n) = a[0..n) >> count`, walking limbs upward so each step's
/// donor is the next-higher limb.
pub fn shr(e: &mut dyn Emitter, n: usize, signed: bool, bmi2: bool) {
    if !bmi2 {
        e.add_fixed_reg(Register::Rcx);
    }

    let a = Ptr::new(e.take_arg_reg(0, false, None));
    let count = if bmi2 {
        e.take_arg_reg(1, false, None)
    } else {
        e.take_arg_reg(1, false, Some(Register::Rcx))
    };
    let dst = Ptr::new(e.take_arg_reg(2, false, None));

    let mut tmp1 = e.pool().take(true);
    let mut tmp2 = e.pool().take(true);

    let (neg_count, scratch) = if bmi2 {
        let neg_count = e.pool().take(true);
        let scratch = e.pool().take(true);
        e.emit(&format!("movq {count}, {neg_count}"));
        e.emit(&format!("negq {neg_count}"));
        (Some(neg_count), Some(scratch))
    } else {
        (None, None)
    };

    for i in 0..n {
        let cur_src = if i == 0 {
            Operand::Mem(a.displace(i as i64))
        } else {
            Operand::Reg(tmp1.clone())
        };

        let donor = if i == n - 1 {
            None
        } else {
            e.emit(&format!("movq {}, {tmp2}", a.displace(i as i64 + 1)));
            Some(tmp2.clone())
        };

        shift_right_step(
            e,
            &cur_src,
            &tmp1,
            donor.as_ref(),
            &count,
            neg_count.as_ref(),
            scratch.as_ref(),
            signed,
            bmi2,
        );

        e.emit(&format!("movq {tmp1}, {}", dst.displace(i as i64)));
        mem::swap(&mut tmp1, &mut tmp2);
    }
}

/// `dst[0..n) = a[0..n) << count`, walking limbs downward so each step's
/// donor is the next-lower limb.
pub fn shl(e: &mut dyn Emitter, n: usize, bmi2: bool) {
    if !bmi2 {
        e.add_fixed_reg(Register::Rcx);
    }

    let a = Ptr::new(e.take_arg_reg(0, false, None));
    let count = if bmi2 {
        e.take_arg_reg(1, false, None)
    } else {
        e.take_arg_reg(1, false, Some(Register::Rcx))
    };
    let dst = Ptr::new(e.take_arg_reg(2, false, None));

    let mut tmp1 = e.pool().take(true);
    let mut tmp2 = e.pool().take(true);

    let (neg_count, scratch) = if bmi2 {
        let neg_count = e.pool().take(true);
        let scratch = e.pool().take(true);
        e.emit(&format!("movq {count}, {neg_count}"));
        e.emit(&format!("negq {neg_count}"));
        (Some(neg_count), Some(scratch))
    } else {
        (None, None)
    };

    for i in (0..n).rev() {
        let cur_src = if i == n - 1 {
            Operand::Mem(a.displace(i as i64))
        } else {
            Operand::Reg(tmp1.clone())
        };

        let donor = if i == 0 {
            None
        } else {
            e.emit(&format!("movq {}, {tmp2}", a.displace(i as i64 - 1)));
            Some(tmp2.clone())
        };

        shift_left_step(
            e,
            &cur_src,
            &tmp1,
            donor.as_ref(),
            &count,
            neg_count.as_ref(),
            scratch.as_ref(),
            bmi2,
        );

        e.emit(&format!("movq {tmp1}, {}", dst.displace(i as i64)));
        mem::swap(&mut tmp1, &mut tmp2);
    }
}
