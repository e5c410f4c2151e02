//! The routine catalog.
//!
//! Every width exports the same fixed family of routines.  An entry pairs
//! the exported name and prototype with a generator closure; the drivers
//! run that closure against the backend of their choice.

pub mod proto;

use crate::caps::{Cap, CapError, Caps};
use crate::emit::Emitter;
use crate::funcs::*;
use proto::Proto;

/// An exported routine name.  Interned: the same name is compared and
/// printed many times across filtering and the three drivers.
pub type Id = internment::Intern<String>;

/// Which backend the catalog is built for.  Group sizes differ: more
/// scratch is safely available under constraint-solved allocation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Backend {
    Sysv,
    Inline,
}

/// One exported routine.
pub struct Routine {
    pub name: Id,
    pub proto: Proto,
    pub gen: Box<dyn Fn(&mut dyn Emitter)>,
}

impl Routine {
    fn new(name: String, proto: &str, gen: impl Fn(&mut dyn Emitter) + 'static) -> Routine {
        Routine {
            name: Id::new(name),
            proto: Proto::parse(proto),
            gen: Box::new(gen),
        }
    }
}

/// Every exported name starts with this.
pub const PREFIX: &str = "asm";

/// Build the routine family for width `n`.  Plain-vs-BMI2 choices are
/// resolved here, once, against `caps`.
pub fn routines(n: usize, backend: Backend, caps: &Caps) -> Result<Vec<Routine>, CapError> {
    let bmi2 = caps.have(Cap::Bmi2)?;
    let masked_m = match backend {
        Backend::Sysv => 4,
        Backend::Inline => 8,
    };
    let words_m = masked_m;

    Ok(vec![
        Routine::new(
            format!("{PREFIX}_add_{n}"),
            "#*, @#* -> #",
            move |e| addsub(e, n, AddSub::Add),
        ),
        Routine::new(
            format!("{PREFIX}_sub_{n}"),
            "#*, @#* -> #",
            move |e| addsub(e, n, AddSub::Sub),
        ),
        Routine::new(
            format!("{PREFIX}_add_masked_{n}"),
            "#*, @#*, # -> #",
            move |e| addsub_masked(e, n, AddSub::Add, masked_m),
        ),
        Routine::new(
            format!("{PREFIX}_sub_masked_{n}"),
            "#*, @#*, # -> #",
            move |e| addsub_masked(e, n, AddSub::Sub, masked_m),
        ),
        Routine::new(
            format!("{PREFIX}_negate_{n}"),
            "@#*, #* -> #",
            move |e| negate(e, n),
        ),
        Routine::new(
            format!("{PREFIX}_add_q_{n}"),
            "#*, # -> #",
            move |e| addsub_q(e, n, AddSub::Add, false),
        ),
        Routine::new(
            format!("{PREFIX}_sub_q_{n}"),
            "#*, # -> #",
            move |e| addsub_q(e, n, AddSub::Sub, false),
        ),
        Routine::new(
            format!("{PREFIX}_add_q_leaky_{n}"),
            "#*, # -> #",
            move |e| addsub_q(e, n, AddSub::Add, true),
        ),
        Routine::new(
            format!("{PREFIX}_sub_q_leaky_{n}"),
            "#*, # -> #",
            move |e| addsub_q(e, n, AddSub::Sub, true),
        ),
        Routine::new(
            format!("{PREFIX}_cmplt_{n}"),
            "@#*, @#* -> #",
            move |e| cmplt(e, n, false),
        ),
        Routine::new(
            format!("{PREFIX}_cmple_{n}"),
            "@#*, @#* -> #",
            move |e| cmple(e, n, false),
        ),
        Routine::new(
            format!("{PREFIX}_S_cmplt_{n}"),
            "@#*, @#* -> #",
            move |e| cmplt(e, n, true),
        ),
        Routine::new(
            format!("{PREFIX}_S_cmple_{n}"),
            "@#*, @#* -> #",
            move |e| cmple(e, n, true),
        ),
        Routine::new(
            format!("{PREFIX}_cmpeq_{n}"),
            "@#*, @#* -> #",
            move |e| cmpeq(e, n),
        ),
        Routine::new(
            format!("{PREFIX}_mul_q_{n}"),
            "@#*, #, #* -> #",
            move |e| {
                if bmi2 {
                    mul_q_bmi2(e, n)
                } else {
                    mul_q(e, n)
                }
            },
        ),
        Routine::new(
            format!("{PREFIX}_div_q_{n}"),
            "@#*, #, #* -> #",
            move |e| div_q(e, n, DivKind::Div),
        ),
        Routine::new(
            format!("{PREFIX}_mod_q_{n}"),
            "@#*, # -> #",
            move |e| div_q(e, n, DivKind::Mod),
        ),
        Routine::new(
            format!("{PREFIX}_mul_lo_{n}"),
            "@#*, @#*, #* -> void",
            move |e| {
                if bmi2 {
                    mul_lo_bmi2(e, n)
                } else {
                    mul_lo(e, n)
                }
            },
        ),
        Routine::new(
            format!("{PREFIX}_mul_{n}"),
            "@#*, @#*, #* -> void",
            move |e| {
                if bmi2 {
                    mul_bmi2(e, n, n)
                } else {
                    mul(e, n, n)
                }
            },
        ),
        Routine::new(
            format!("{PREFIX}_shr_nz_{n}"),
            "@#*, #, #* -> void",
            move |e| shr(e, n, false, bmi2),
        ),
        Routine::new(
            format!("{PREFIX}_S_shr_nz_{n}"),
            "@#*, #, #* -> void",
            move |e| shr(e, n, true, bmi2),
        ),
        Routine::new(
            format!("{PREFIX}_shl_nz_{n}"),
            "@#*, #, #* -> void",
            move |e| shl(e, n, bmi2),
        ),
        // zero counts must stay well-defined, so these never use the BMI2
        // donor merge
        Routine::new(
            format!("{PREFIX}_shr_{n}"),
            "@#*, #, #* -> void",
            move |e| shr(e, n, false, false),
        ),
        Routine::new(
            format!("{PREFIX}_S_shr_{n}"),
            "@#*, #, #* -> void",
            move |e| shr(e, n, true, false),
        ),
        Routine::new(
            format!("{PREFIX}_shl_{n}"),
            "@#*, #, #* -> void",
            move |e| shl(e, n, false),
        ),
        Routine::new(
            format!("{PREFIX}_shr_words_{n}"),
            "@#*, #, #* -> void",
            move |e| shift_words(e, n, Direction::Right, false, words_m),
        ),
        Routine::new(
            format!("{PREFIX}_S_shr_words_{n}"),
            "@#*, #, #* -> void",
            move |e| shift_words(e, n, Direction::Right, true, words_m),
        ),
        Routine::new(
            format!("{PREFIX}_shl_words_{n}"),
            "@#*, #, #* -> void",
            move |e| shift_words(e, n, Direction::Left, false, words_m),
        ),
    ])
}
