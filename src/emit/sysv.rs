//! The standalone-function backend.
//!
//! Prints raw AT&T-syntax instructions and allocates concrete registers
//! from the scratch pool.  Callee-saved registers sit outside that pool,
//! so routines need no stack frame and no save/restore code; the write
//! record is kept only because the trait demands it.

use super::Emitter;
use crate::asm::{Reg, RegPool, Register, SYSV_ABI_ARG_REGS};

pub struct SysvFnEmitter {
    pool: RegPool,
    fixed_regs: Vec<Register>,
    /// Position `i` maps to the register actually holding argument `i`
    /// after any forced moves.
    arg_map: Vec<Register>,
    label_counter: u64,
    out: String,
}

impl SysvFnEmitter {
    /// `label_seed` is the label counter threaded through the driver so
    /// labels stay unique across every routine of one run.
    pub fn new(label_seed: u64) -> Self {
        SysvFnEmitter {
            pool: RegPool::new(),
            fixed_regs: Vec::new(),
            arg_map: SYSV_ABI_ARG_REGS.to_vec(),
            label_counter: label_seed,
            out: String::new(),
        }
    }

    /// The counter after this routine, fed to the next emitter.
    pub fn label_seed(&self) -> u64 {
        self.label_counter
    }

    pub fn text(&self) -> &str {
        &self.out
    }
}

impl Emitter for SysvFnEmitter {
    fn add_fixed_reg(&mut self, reg: Register) {
        self.fixed_regs.push(reg);
    }

    fn set_nargs(&mut self, nargs: usize) {
        self.arg_map.clear();
        let mut moved = Vec::new();
        for i in 0..nargs {
            let reg = SYSV_ABI_ARG_REGS[i];
            if self.fixed_regs.contains(&reg) {
                let dst = self.pool.take(true);
                let line = format!("movq %{reg}, {dst}");
                self.emit(&line);
                let Reg::Real(dst_reg) = &dst else {
                    unreachable!()
                };
                self.arg_map.push(*dst_reg);
                moved.push(dst);
            } else {
                self.arg_map.push(reg);
            }
        }
        // The rebinding moves are done; the destinations go back to the
        // free list so take_arg_reg can claim them by name.
        for reg in moved {
            self.pool.release(&reg);
        }
    }

    fn take_arg_reg(&mut self, index: usize, write: bool, into: Option<Register>) -> Reg {
        let cur = self.arg_map[index];
        let must_move = self.fixed_regs.contains(&cur) || into.is_some_and(|r| r != cur);
        if must_move {
            let src = self.pool.take_named(cur, false);
            let dst = match into {
                Some(reg) => self.pool.take_named(reg, true),
                None => self.pool.take(true),
            };
            let line = format!("movq {src}, {dst}");
            self.emit(&line);
            self.pool.release(&src);
            dst
        } else {
            self.pool.take_named(cur, write)
        }
    }

    fn take_zero_reg(&mut self) -> Reg {
        let reg = self.pool.take(true);
        let line = format!("xorl {}, {}", reg.dword(), reg.dword());
        self.emit(&line);
        reg
    }

    fn take_retval_reg(&mut self, _may_overwrite_taken: bool) -> Reg {
        self.pool.take_named(Register::Rax, true)
    }

    fn write_retval(&mut self, src: &Reg) {
        self.pool.mark_written(Register::Rax);
        if *src != Reg::Real(Register::Rax) {
            let line = format!("movq {src}, %rax");
            self.emit(&line);
        }
    }

    fn emit(&mut self, line: &str) {
        self.out.push_str(line);
        self.out.push('\n');
    }

    fn emit_prologue(&mut self) {}

    fn emit_epilogue(&mut self) {}

    fn gen_label(&mut self) -> String {
        self.label_counter += 1;
        format!(".L{}", self.label_counter)
    }

    fn label_here(&mut self, label: &str) {
        let line = format!("{label}:");
        self.emit(&line);
    }

    fn pool(&mut self) -> &mut RegPool {
        &mut self.pool
    }
}
