//! Shifts by an integral number of limbs, `0..=n`, where the amount is a
//! runtime value.
//!
//! No branch ever depends on the amount; every pass is a ladder of
//! conditional moves.  For small `n` the ladder applies `n` passes of
//! amount 1; past that, one pass per bit of the amount keeps the sequence
//! logarithmic.  A final pass of amount `n` collapses the output to the
//! fill value whenever the amount is out of range.

use derive_more::Display;

use crate::asm::{Operand, Ptr, Reg};
use crate::emit::Emitter;

/// Shift direction, in bit-significance terms.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Direction {
    #[display("left")]
    Left,
    #[display("right")]
    Right,
}

/// `cmov` condition suffixes used by the ladders.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
enum Cond {
    #[display("a")]
    Above,
    #[display("nz")]
    NonZero,
}

/// A conditional per-limb assignment: move limb `src` (or the fill value,
/// when `None`) into limb `dst` under `cond`.
type Assign<'a> = dyn FnMut(&mut dyn Emitter, Option<usize>, usize, Cond) + 'a;

fn shr_words_pass(e: &mut dyn Emitter, n: usize, amount: usize, assign: &mut Assign, cond: Cond) {
    for i in 0..n {
        let src = i + amount;
        assign(e, (src < n).then_some(src), i, cond);
    }
}

fn shl_words_pass(e: &mut dyn Emitter, n: usize, amount: usize, assign: &mut Assign, cond: Cond) {
    for i in (0..n).rev() {
        assign(e, i.checked_sub(amount), i, cond);
    }
}

fn dumb_shr_words(e: &mut dyn Emitter, count: &Reg, n: usize, assign: &mut Assign) {
    for i in 0..n {
        if i > 0 {
            e.emit(&format!("cmpq ${i}, {count}"));
        } else {
            e.emit(&format!("testq {count}, {count}"));
        }
        shr_words_pass(e, n - i, 1, assign, Cond::Above);
    }
}

fn dumb_shl_words(e: &mut dyn Emitter, count: &Reg, n: usize, assign: &mut Assign) {
    for i in 0..n {
        if i > 0 {
            e.emit(&format!("cmpq ${i}, {count}"));
        } else {
            e.emit(&format!("testq {count}, {count}"));
        }

        // pass `i` only touches the limbs that can still carry data
        let mut shifted = |e: &mut dyn Emitter, src: Option<usize>, dst: usize, cond: Cond| {
            assign(e, src.map(|s| s + i), dst + i, cond)
        };
        shl_words_pass(e, n - i, 1, &mut shifted, Cond::Above);
    }
}

fn fancy_shift_words(
    e: &mut dyn Emitter,
    count: &Reg,
    n: usize,
    pass: fn(&mut dyn Emitter, usize, usize, &mut Assign, Cond),
    assign: &mut Assign,
) {
    let mut bit = 1;
    while bit < n {
        e.emit(&format!("testq ${bit}, {count}"));
        pass(e, n, bit, assign, Cond::NonZero);
        bit <<= 1;
    }

    // any residual amount >= n collapses the output to the fill value
    e.emit(&format!("cmpq ${}, {count}", n - 1));
    pass(e, n, n, assign, Cond::Above);
}

fn shift_words_ladder(
    e: &mut dyn Emitter,
    count: &Reg,
    n: usize,
    direction: Direction,
    assign: &mut Assign,
) {
    if n <= 8 {
        match direction {
            Direction::Left => dumb_shl_words(e, count, n, assign),
            Direction::Right => dumb_shr_words(e, count, n, assign),
        }
    } else {
        match direction {
            Direction::Left => fancy_shift_words(e, count, n, shl_words_pass, assign),
            Direction::Right => fancy_shift_words(e, count, n, shr_words_pass, assign),
        }
    }
}

/// `c[0..n) = a[0..n)` shifted by `count` whole limbs.  Unsigned shifts
/// fill with zero; a signed right shift fills with the broadcast sign of
/// the top limb.
///
/// With `n <= m` all limbs live in registers across the ladder; larger
/// widths work in place over the destination, tracking per position
/// whether it still reads from `a` or already from `c`.
pub fn shift_words(e: &mut dyn Emitter, n: usize, direction: Direction, signed: bool, m: usize) {
    let a = Ptr::new(e.take_arg_reg(0, false, None));
    let count = e.take_arg_reg(1, false, None);
    let c = Ptr::new(e.take_arg_reg(2, false, None));

    if n > m {
        let fill = if signed {
            let fill = e.pool().take(true);
            e.emit(&format!("movq {}, {fill}", a.displace(n as i64 - 1)));
            e.emit(&format!("sarq $63, {fill}"));
            fill
        } else {
            e.take_zero_reg()
        };

        let tmp = e.pool().take(true);

        let mut written = vec![false; n];
        {
            let written = &mut written;
            let a = &a;
            let c = &c;
            let tmp = &tmp;
            let fill = &fill;
            let mut assign = |e: &mut dyn Emitter, src: Option<usize>, dst: usize, cond: Cond| {
                let read = |i: usize, written: &[bool]| {
                    if written[i] {
                        c.displace(i as i64)
                    } else {
                        a.displace(i as i64)
                    }
                };
                let src_op = match src {
                    None => Operand::Reg(fill.clone()),
                    Some(s) => Operand::Mem(read(s, written)),
                };
                e.emit(&format!("movq {}, {tmp}", read(dst, written)));
                e.emit(&format!("cmov{cond}q {src_op}, {tmp}"));
                e.emit(&format!("movq {tmp}, {}", c.displace(dst as i64)));
                written[dst] = true;
            };
            shift_words_ladder(e, &count, n, direction, &mut assign);
        }

        assert!(
            written.iter().all(|&w| w),
            "every destination limb must be written"
        );
    } else {
        let tmps: Vec<Reg> = (0..n).map(|_| e.pool().take(true)).collect();
        for (i, tmp) in tmps.iter().enumerate() {
            e.emit(&format!("movq {}, {tmp}", a.displace(i as i64)));
        }

        let fill = if signed {
            let fill = e.pool().take(true);
            e.emit(&format!("movq {}, {fill}", tmps[n - 1]));
            e.emit(&format!("sarq $63, {fill}"));
            fill
        } else {
            e.take_zero_reg()
        };

        let mut assign = |e: &mut dyn Emitter, src: Option<usize>, dst: usize, cond: Cond| {
            match src {
                None => e.emit(&format!("cmov{cond}q {fill}, {}", tmps[dst])),
                Some(s) => e.emit(&format!("cmov{cond}q {}, {}", tmps[s], tmps[dst])),
            }
        };
        shift_words_ladder(e, &count, n, direction, &mut assign);

        for (i, tmp) in tmps.iter().enumerate() {
            e.emit(&format!("movq {tmp}, {}", c.displace(i as i64)));
        }
    }
}
