//! The GCC extended-asm backend.
//!
//! Emits placeholder tokens and lets the compiler's constraint solver pick
//! physical registers.  Instruction lines are written with the `!` sigil
//! standing in for `%`; `emit` doubles literal `%`s (concrete registers a
//! template steered into) and then turns `!` into `%`.  The epilogue
//! renders the `: outputs : inputs : clobbers );` tail from everything the
//! routine recorded along the way.

use super::Emitter;
use crate::asm::{Reg, RegPool, Register};

pub struct InlineAsmEmitter {
    pool: RegPool,
    /// Per argument, in take order: was it written, and which register was
    /// it steered into.
    args: Vec<(bool, Option<Register>)>,
    /// `None` while the routine has no result operand; then the register
    /// the result was steered into, if any.
    retval: Option<Option<Register>>,
    retval_earlyclobber: bool,
    needs_zero_input: bool,
    label_counter: u64,
    out: String,
}

impl InlineAsmEmitter {
    pub fn new() -> Self {
        InlineAsmEmitter {
            pool: RegPool::new(),
            args: Vec::new(),
            retval: None,
            retval_earlyclobber: false,
            needs_zero_input: false,
            label_counter: 0,
            out: String::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.out
    }
}

impl Default for InlineAsmEmitter {
    fn default() -> Self {
        Self::new()
    }
}

fn add_output(
    outputs: &mut Vec<String>,
    clobbers: &mut Vec<String>,
    keyword: &str,
    forced: Option<Register>,
    is_read: bool,
    force_earlyclobber: bool,
) {
    let mut earlyclobber = force_earlyclobber;
    let letter = match forced {
        None => 'r',
        Some(reg) => {
            let letter = reg
                .constraint_letter()
                .unwrap_or_else(|| panic!("register {reg} has no constraint letter"));
            // A steered register that also shows up as a written scratch
            // must be an early-clobber operand, not a free clobber.
            let name = reg.to_string();
            if let Some(pos) = clobbers.iter().position(|c| *c == name) {
                clobbers.remove(pos);
                earlyclobber = true;
            }
            letter
        }
    };
    let mut mode = String::from(if is_read { "+" } else { "=" });
    if earlyclobber {
        mode.push('&');
    }
    outputs.push(format!("[{keyword}] \"{mode}{letter}\" ({keyword})"));
}

fn add_input(inputs: &mut Vec<String>, keyword: &str, forced: Option<Register>) {
    let letter = match forced {
        None => 'r',
        Some(reg) => reg
            .constraint_letter()
            .unwrap_or_else(|| panic!("register {reg} has no constraint letter")),
    };
    inputs.push(format!("[{keyword}] \"{letter}\" ({keyword})"));
}

impl Emitter for InlineAsmEmitter {
    fn add_fixed_reg(&mut self, _reg: Register) {
        // the constraint solver handles binding
    }

    fn set_nargs(&mut self, _nargs: usize) {}

    fn take_arg_reg(&mut self, index: usize, write: bool, into: Option<Register>) -> Reg {
        assert_eq!(
            self.args.len(),
            index,
            "argument indices must be taken in increasing order"
        );
        self.args.push((write, into));
        Reg::sym(format!("arg{index}"))
    }

    fn take_zero_reg(&mut self) -> Reg {
        self.needs_zero_input = true;
        Reg::sym("zero")
    }

    fn take_retval_reg(&mut self, may_overwrite_taken: bool) -> Reg {
        self.retval = Some(None);
        self.retval_earlyclobber = !may_overwrite_taken;
        Reg::sym("ret")
    }

    fn write_retval(&mut self, src: &Reg) {
        if let Reg::Real(reg) = src {
            if reg.constraint_letter().is_some() {
                // No move: the occupied named register becomes the result
                // operand itself.
                self.retval = Some(Some(*reg));
                return;
            }
        }
        self.retval = Some(None);
        let line = format!("movq {src}, ![ret]");
        self.emit(&line);
    }

    fn emit(&mut self, line: &str) {
        let line = line.replace('%', "%%").replace('!', "%");
        self.out.push_str(&format!("    \"{line}\\n\"\n"));
    }

    fn emit_prologue(&mut self) {
        self.out.push_str("    asm volatile (\n");
    }

    fn emit_epilogue(&mut self) {
        let mut clobbers: Vec<String> =
            self.pool.clobbers().iter().map(|r| r.to_string()).collect();
        let mut outputs = Vec::new();
        let mut inputs = Vec::new();

        for (i, &(is_written, forced)) in self.args.iter().enumerate() {
            let keyword = format!("arg{i}");
            let aliases_retval = forced.is_some() && self.retval == Some(forced);
            if is_written && !aliases_retval {
                add_output(&mut outputs, &mut clobbers, &keyword, forced, true, false);
            } else {
                add_input(&mut inputs, &keyword, forced);
            }
        }

        if let Some(forced) = self.retval {
            add_output(
                &mut outputs,
                &mut clobbers,
                "ret",
                forced,
                false,
                self.retval_earlyclobber,
            );
        }

        if self.needs_zero_input {
            inputs.push("[zero] \"r\" ((uint64_t) 0)".to_string());
        }

        clobbers.push("cc".to_string());
        clobbers.push("memory".to_string());
        clobbers.sort();

        let join = |items: &[String], fallback: &str| {
            if items.is_empty() {
                fallback.to_string()
            } else {
                items.join(", ")
            }
        };
        let clobbers: Vec<String> = clobbers.iter().map(|s| format!("\"{s}\"")).collect();

        self.out
            .push_str(&format!("    : {}\n", join(&outputs, "/*no outputs*/")));
        self.out
            .push_str(&format!("    : {}\n", join(&inputs, "/*no inputs*/")));
        self.out
            .push_str(&format!("    : {}\n", join(&clobbers, "/*no clobbers*/")));
        self.out.push_str("    );\n");
    }

    fn gen_label(&mut self) -> String {
        self.label_counter += 1;
        // `!=` renders as `%=`, which GCC expands to a per-instance number.
        format!(".L!=_{}", self.label_counter)
    }

    fn label_here(&mut self, label: &str) {
        let line = format!("{label}:");
        self.emit(&line);
    }

    fn pool(&mut self) -> &mut RegPool {
        &mut self.pool
    }
}
