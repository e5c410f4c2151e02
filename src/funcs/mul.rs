//! Schoolbook multiplication.
//!
//! The plain lowering drives `mulq` (implicit `%rax`/`%rdx`); the BMI2
//! lowering drives `mulxq`, which preserves flags and frees the chain to
//! keep CF live across steps.

use std::mem;

use crate::asm::{Operand, Ptr, Reg, Register};
use crate::emit::Emitter;

/// Multiply `src[0..n)` by `mulby`, writing or adding the product limbs
/// into `dst[0..n)`.
///
/// Positions at or past `undef_from` are treated as holding no defined
/// value and are stored with a plain `movq`; earlier positions are
/// accumulated into.  Unless `drop_last_carry` is set, returns the
/// register holding the carry out of the last limb; the caller must
/// release or consume it.
pub fn mul_aux(
    e: &mut dyn Emitter,
    n: usize,
    undef_from: usize,
    src: &Ptr,
    mulby: &Operand,
    dst: &Ptr,
    zero: &Operand,
    drop_last_carry: bool,
) -> Option<Reg> {
    let rax = e.pool().take_named(Register::Rax, true);
    let rdx = e.pool().take_named(Register::Rdx, true);
    let carry = e.pool().take(true);

    for i in 0..n {
        let last = drop_last_carry && i + 1 == n;

        if i > 0 {
            e.emit(&format!("movq {rdx}, {carry}"));
        }

        e.emit(&format!("movq {mulby}, {rax}"));
        if last {
            // only the low half survives, so the cheaper form will do
            e.emit(&format!("imulq {}, {rax}", src.displace(i as i64)));
        } else {
            e.emit(&format!("mulq {}", src.displace(i as i64)));
        }

        if i > 0 {
            e.emit(&format!("addq {carry}, {rax}"));
            if !last {
                e.emit(&format!("adcq {zero}, {rdx}"));
            }
        }

        if i >= undef_from {
            e.emit(&format!("movq {rax}, {}", dst.displace(i as i64)));
        } else {
            e.emit(&format!("addq {rax}, {}", dst.displace(i as i64)));
            if !last {
                e.emit(&format!("adcq {zero}, {rdx}"));
            }
        }
    }

    e.pool().release(&carry);
    e.pool().release(&rax);
    if drop_last_carry {
        e.pool().release(&rdx);
        None
    } else {
        Some(rdx)
    }
}

/// BMI2 variant of [`mul_aux`]; the multiplier must already sit in `%rdx`.
///
/// A three-register `(lo, hi, carry)` ring rotates so each step's high
/// half becomes the next step's carry.  The returned flag says whether CF
/// is still part of the chain.  When `n` is odd the ring is pre-swapped so
/// the rotation lands the final carry in `carry_in` itself; callers rely
/// on getting back the exact register they passed.
pub fn mul_aux_bmi2(
    e: &mut dyn Emitter,
    n: usize,
    undef_from: usize,
    src: &Ptr,
    dst: &Ptr,
    zero: &Operand,
    drop_last_carry: bool,
    carry_in: Option<Reg>,
) -> (Option<Reg>, bool) {
    let mut carry = match carry_in {
        Some(reg) => reg,
        None => e.pool().take(true),
    };
    let lo = e.pool().take(true);
    let mut hi = e.pool().take(true);

    if n % 2 == 1 {
        mem::swap(&mut hi, &mut carry);
    }

    let mut cy_meaningful = false;

    for i in 0..n {
        let last = drop_last_carry && i + 1 == n;

        e.emit(&format!("mulxq {}, {lo}, {hi}", src.displace(i as i64)));

        if i > 0 {
            let insn = if cy_meaningful { "adcq" } else { "addq" };
            e.emit(&format!("{insn} {carry}, {lo}"));
            cy_meaningful = true;
        }

        if i >= undef_from {
            e.emit(&format!("movq {lo}, {}", dst.displace(i as i64)));
        } else {
            if cy_meaningful && !last {
                e.emit(&format!("adcq {zero}, {hi}"));
            }
            e.emit(&format!("addq {lo}, {}", dst.displace(i as i64)));
            cy_meaningful = true;
        }

        mem::swap(&mut hi, &mut carry);
    }

    e.pool().release(&lo);
    e.pool().release(&hi);
    if drop_last_carry {
        e.pool().release(&carry);
        (None, cy_meaningful)
    } else {
        (Some(carry), cy_meaningful)
    }
}

/// Like [`mul_aux`] with the multiplier in memory; for `n > 1` it is
/// cached in a register so it is not reloaded every step.
pub fn mul_aux_auto(
    e: &mut dyn Emitter,
    n: usize,
    undef_from: usize,
    src: &Ptr,
    b: &Ptr,
    dst: &Ptr,
    zero: &Operand,
    drop_last_carry: bool,
) -> Option<Reg> {
    if n == 1 {
        mul_aux(
            e,
            n,
            undef_from,
            src,
            &Operand::Mem(b.clone()),
            dst,
            zero,
            drop_last_carry,
        )
    } else {
        let mulby = e.pool().take(true);
        e.emit(&format!("movq {b}, {mulby}"));
        let result = mul_aux(
            e,
            n,
            undef_from,
            src,
            &Operand::Reg(mulby.clone()),
            dst,
            zero,
            drop_last_carry,
        );
        e.pool().release(&mulby);
        result
    }
}

/// One schoolbook row: `src[0..n) * b[0]` written or added into
/// `dst[0..=n]`.
pub fn long_mul_step(
    e: &mut dyn Emitter,
    n: usize,
    undef_from: usize,
    src: &Ptr,
    b: &Ptr,
    dst: &Ptr,
    zero: &Operand,
) {
    let last_carry = mul_aux_auto(e, n, undef_from, src, b, dst, zero, false)
        .expect("the carry out of the last limb was dropped");

    if n >= undef_from {
        e.emit(&format!("movq {last_carry}, {}", dst.displace(n as i64)));
    } else {
        e.emit(&format!("addq {last_carry}, {}", dst.displace(n as i64)));
    }

    e.pool().release(&last_carry);
}

/// BMI2 variant of [`long_mul_step`].
pub fn long_mul_step_bmi2(
    e: &mut dyn Emitter,
    n: usize,
    undef_from: usize,
    src: &Ptr,
    dst: &Ptr,
    zero: &Operand,
) {
    let (last_carry, cy_meaningful) =
        mul_aux_bmi2(e, n, undef_from, src, dst, zero, false, None);
    let last_carry = last_carry.expect("the carry out of the last limb was dropped");

    if n >= undef_from {
        if cy_meaningful {
            e.emit(&format!("adcq {zero}, {last_carry}"));
        }
        e.emit(&format!("movq {last_carry}, {}", dst.displace(n as i64)));
    } else {
        let insn = if cy_meaningful { "adcq" } else { "addq" };
        e.emit(&format!("{insn} {last_carry}, {}", dst.displace(n as i64)));
    }

    e.pool().release(&last_carry);
}

/// `dst[0..n+m) = a[0..n) * b[0..m)`.
pub fn mul(e: &mut dyn Emitter, n: usize, m: usize) {
    assert!(n >= m, "expected n >= m");

    e.add_fixed_reg(Register::Rax);
    e.add_fixed_reg(Register::Rdx);

    let a = Ptr::new(e.take_arg_reg(0, false, None));
    let b = Ptr::new(e.take_arg_reg(1, false, None));
    let dst = Ptr::new(e.take_arg_reg(2, false, None));

    let zero = Operand::Imm(0);

    for i in 0..m {
        let undef_from = if i == 0 { 0 } else { n };
        long_mul_step(
            e,
            n,
            undef_from,
            &a,
            &b.displace(i as i64),
            &dst.displace(i as i64),
            &zero,
        );
    }
}

/// BMI2 variant of [`mul`].
pub fn mul_bmi2(e: &mut dyn Emitter, n: usize, m: usize) {
    assert!(n >= m, "expected n >= m");

    e.add_fixed_reg(Register::Rdx);

    let a = Ptr::new(e.take_arg_reg(0, false, None));
    let b = Ptr::new(e.take_arg_reg(1, false, None));
    let dst = Ptr::new(e.take_arg_reg(2, false, None));

    let rdx = e.pool().take_named(Register::Rdx, true);

    let zero = Operand::Imm(0);

    for i in 0..m {
        let undef_from = if i == 0 { 0 } else { n };
        e.emit(&format!("movq {}, {rdx}", b.displace(i as i64)));
        long_mul_step_bmi2(e, n, undef_from, &a, &dst.displace(i as i64), &zero);
    }
}

/// `dst[0..n) = (a[0..n) * b[0..n)) mod 2^(64 n)`.
pub fn mul_lo(e: &mut dyn Emitter, n: usize) {
    e.add_fixed_reg(Register::Rax);
    e.add_fixed_reg(Register::Rdx);

    let a = Ptr::new(e.take_arg_reg(0, false, None));
    let b = Ptr::new(e.take_arg_reg(1, false, None));
    let dst = Ptr::new(e.take_arg_reg(2, false, None));

    let zero = Operand::Imm(0);

    for i in 0..n {
        let undef_from = if i == 0 { 0 } else { n };
        let _ = mul_aux_auto(
            e,
            n - i,
            undef_from,
            &a,
            &b.displace(i as i64),
            &dst.displace(i as i64),
            &zero,
            true,
        );
    }
}

/// BMI2 variant of [`mul_lo`].
pub fn mul_lo_bmi2(e: &mut dyn Emitter, n: usize) {
    e.add_fixed_reg(Register::Rdx);

    let a = Ptr::new(e.take_arg_reg(0, false, None));
    let b = Ptr::new(e.take_arg_reg(1, false, None));
    let dst = Ptr::new(e.take_arg_reg(2, false, None));

    let rdx = e.pool().take_named(Register::Rdx, true);

    let zero = Operand::Imm(0);

    for i in 0..n {
        let undef_from = if i == 0 { 0 } else { n };
        e.emit(&format!("movq {}, {rdx}", b.displace(i as i64)));
        mul_aux_bmi2(
            e,
            n - i,
            undef_from,
            &a,
            &dst.displace(i as i64),
            &zero,
            true,
            None,
        );
    }
}

/// `dst[0..n) = a[0..n) * m`; returns the carry out of the top limb.
pub fn mul_q(e: &mut dyn Emitter, n: usize) {
    e.add_fixed_reg(Register::Rax);
    e.add_fixed_reg(Register::Rdx);

    let src = Ptr::new(e.take_arg_reg(0, false, None));
    let mulby = e.take_arg_reg(1, false, None);
    let dst = Ptr::new(e.take_arg_reg(2, false, None));

    let zero = Operand::Imm(0);

    let last_carry = mul_aux(
        e,
        n,
        0,
        &src,
        &Operand::Reg(mulby),
        &dst,
        &zero,
        false,
    )
    .expect("the carry out of the last limb was dropped");

    e.write_retval(&last_carry);
}

/// BMI2 variant of [`mul_q`]: the multiplier is steered into `%rdx` and
/// the result register doubles as the ring's carry.
pub fn mul_q_bmi2(e: &mut dyn Emitter, n: usize) {
    e.add_fixed_reg(Register::Rdx);
    e.set_nargs(3);

    let src = Ptr::new(e.take_arg_reg(0, false, None));
    let _mulby = e.take_arg_reg(1, false, Some(Register::Rdx));
    let dst = Ptr::new(e.take_arg_reg(2, false, None));

    let result = e.take_retval_reg(false);

    let (last_carry, cy_meaningful) = mul_aux_bmi2(
        e,
        n,
        0,
        &src,
        &dst,
        &Operand::Imm(0),
        false,
        Some(result.clone()),
    );
    let last_carry = last_carry.expect("the carry out of the last limb was dropped");
    assert_eq!(
        last_carry, result,
        "ring rotation must land the carry in the result register"
    );

    if cy_meaningful {
        e.emit(&format!("adcq $0, {last_carry}"));
    }
}
