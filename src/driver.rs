//! The backend drivers.
//!
//! Each driver iterates the catalog, instantiates its emitter per routine,
//! runs the generator between prologue and epilogue, and flushes the
//! accumulated text into the sink with the surrounding banners.

use std::io::{self, Write};

use crate::catalog::Routine;
use crate::emit::{Emitter, InlineAsmEmitter, SysvFnEmitter};

/// Standalone assembly: a `.global`/`.type`/`.align` banner and label per
/// routine, `retq` at the end of each.
pub fn gen_asm(funcs: &[Routine], out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "# Auto-generated; do not edit.")?;
    let mut label_seed = 0;
    for func in funcs {
        writeln!(out)?;
        writeln!(out, ".global {}", func.name)?;
        writeln!(out, ".type {}, @function", func.name)?;
        writeln!(out, ".align 32")?;
        writeln!(out, "{}:", func.name)?;

        let mut e = SysvFnEmitter::new(label_seed);
        e.emit_prologue();
        (func.gen)(&mut e);
        e.emit_epilogue();
        label_seed = e.label_seed();

        out.write_all(e.text().as_bytes())?;
        writeln!(out, "retq")?;
    }
    Ok(())
}

/// A C header with one `extern` declaration per routine.
pub fn gen_c_header(funcs: &[Routine], out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "// Auto-generated; do not edit.")?;
    writeln!(out, "#pragma once")?;
    writeln!(out, "#include <stdint.h>")?;
    writeln!(out)?;
    for func in funcs {
        writeln!(out, "{}", func.proto.extern_decl(func.name.as_str()))?;
    }
    Ok(())
}

/// A C header defining every routine as a function whose body is one GCC
/// extended-asm block.  `asm_attrs` comes from the user's `asm_config.h`.
pub fn gen_inline_asm(funcs: &[Routine], out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "// Auto-generated; do not edit.")?;
    writeln!(out, "#pragma once")?;
    writeln!(out, "#include <stdint.h>")?;
    writeln!(out, "#include \"asm_config.h\"")?;
    for func in funcs {
        writeln!(out)?;
        writeln!(out, "asm_attrs {}", func.proto.c_signature(func.name.as_str()))?;
        writeln!(out, "{{")?;
        if func.proto.returns_value() {
            writeln!(out, "    {} ret;", func.proto.ret.c_name())?;
        }

        let mut e = InlineAsmEmitter::new();
        e.emit_prologue();
        (func.gen)(&mut e);
        e.emit_epilogue();
        out.write_all(e.text().as_bytes())?;

        if func.proto.returns_value() {
            writeln!(out, "    return ret;")?;
        }
        writeln!(out, "}}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caps::{Cap, Caps};
    use crate::catalog::{routines, Backend, Routine};
    use pretty_assertions::assert_eq;

    fn family(n: usize, backend: Backend, bmi2: bool) -> Vec<Routine> {
        let caps = Caps::fixed([(Cap::Bmi2, bmi2)]);
        routines(n, backend, &caps).unwrap()
    }

    fn render(
        driver: fn(&[Routine], &mut dyn Write) -> io::Result<()>,
        funcs: &[Routine],
    ) -> String {
        let mut buf = Vec::new();
        driver(funcs, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn pick(funcs: Vec<Routine>, name: &str) -> Vec<Routine> {
        funcs
            .into_iter()
            .filter(|f| f.name.as_str() == name)
            .collect()
    }

    #[test]
    fn every_width_generates_under_both_backends() {
        for n in [1usize, 2, 4, 8, 12, 16] {
            for bmi2 in [false, true] {
                let asm = render(gen_asm, &family(n, Backend::Sysv, bmi2));
                let inline = render(gen_inline_asm, &family(n, Backend::Inline, bmi2));
                for op in [
                    "add", "sub", "add_masked", "sub_masked", "negate", "add_q", "sub_q",
                    "add_q_leaky", "sub_q_leaky", "cmplt", "cmple", "S_cmplt", "S_cmple",
                    "cmpeq", "mul_q", "div_q", "mod_q", "mul_lo", "mul", "shr_nz", "S_shr_nz",
                    "shl_nz", "shr", "S_shr", "shl", "shr_words", "S_shr_words", "shl_words",
                ] {
                    assert!(asm.contains(&format!("\nasm_{op}_{n}:\n")), "asm_{op}_{n} at {n}");
                    assert!(
                        inline.contains(&format!(" asm_{op}_{n}(")),
                        "asm_{op}_{n} inline at {n}"
                    );
                }
                // the inline tail always clobbers flags and memory
                assert!(inline.contains("\"cc\", \"memory\""));
            }
        }
    }

    #[test]
    fn asm_stream_wraps_each_routine() {
        let funcs = pick(family(1, Backend::Sysv, false), "asm_add_1");
        assert_eq!(
            render(gen_asm, &funcs),
            "# Auto-generated; do not edit.\n\
             \n\
             .global asm_add_1\n\
             .type asm_add_1, @function\n\
             .align 32\n\
             asm_add_1:\n\
             movq (%rsi), %r11\n\
             addq %r11, (%rdi)\n\
             sbbq %rax, %rax\n\
             retq\n"
        );
    }

    #[test]
    fn asm_labels_stay_unique_across_routines() {
        let asm = render(gen_asm, &family(4, Backend::Sysv, false));
        // the two leaky scalar routines are the only label users
        assert!(asm.contains(".L1:"));
        assert!(asm.contains(".L2:"));
        assert!(!asm.contains(".L3"));
    }

    #[test]
    fn header_for_width_two() {
        assert_eq!(
            render(gen_c_header, &family(2, Backend::Sysv, false)),
            "// Auto-generated; do not edit.\n\
             #pragma once\n\
             #include <stdint.h>\n\
             \n\
             extern uint64_t asm_add_2(uint64_t*, const uint64_t*);\n\
             extern uint64_t asm_sub_2(uint64_t*, const uint64_t*);\n\
             extern uint64_t asm_add_masked_2(uint64_t*, const uint64_t*, uint64_t);\n\
             extern uint64_t asm_sub_masked_2(uint64_t*, const uint64_t*, uint64_t);\n\
             extern uint64_t asm_negate_2(const uint64_t*, uint64_t*);\n\
             extern uint64_t asm_add_q_2(uint64_t*, uint64_t);\n\
             extern uint64_t asm_sub_q_2(uint64_t*, uint64_t);\n\
             extern uint64_t asm_add_q_leaky_2(uint64_t*, uint64_t);\n\
             extern uint64_t asm_sub_q_leaky_2(uint64_t*, uint64_t);\n\
             extern uint64_t asm_cmplt_2(const uint64_t*, const uint64_t*);\n\
             extern uint64_t asm_cmple_2(const uint64_t*, const uint64_t*);\n\
             extern uint64_t asm_S_cmplt_2(const uint64_t*, const uint64_t*);\n\
             extern uint64_t asm_S_cmple_2(const uint64_t*, const uint64_t*);\n\
             extern uint64_t asm_cmpeq_2(const uint64_t*, const uint64_t*);\n\
             extern uint64_t asm_mul_q_2(const uint64_t*, uint64_t, uint64_t*);\n\
             extern uint64_t asm_div_q_2(const uint64_t*, uint64_t, uint64_t*);\n\
             extern uint64_t asm_mod_q_2(const uint64_t*, uint64_t);\n\
             extern void asm_mul_lo_2(const uint64_t*, const uint64_t*, uint64_t*);\n\
             extern void asm_mul_2(const uint64_t*, const uint64_t*, uint64_t*);\n\
             extern void asm_shr_nz_2(const uint64_t*, uint64_t, uint64_t*);\n\
             extern void asm_S_shr_nz_2(const uint64_t*, uint64_t, uint64_t*);\n\
             extern void asm_shl_nz_2(const uint64_t*, uint64_t, uint64_t*);\n\
             extern void asm_shr_2(const uint64_t*, uint64_t, uint64_t*);\n\
             extern void asm_S_shr_2(const uint64_t*, uint64_t, uint64_t*);\n\
             extern void asm_shl_2(const uint64_t*, uint64_t, uint64_t*);\n\
             extern void asm_shr_words_2(const uint64_t*, uint64_t, uint64_t*);\n\
             extern void asm_S_shr_words_2(const uint64_t*, uint64_t, uint64_t*);\n\
             extern void asm_shl_words_2(const uint64_t*, uint64_t, uint64_t*);\n"
        );
    }

    #[test]
    fn inline_header_defines_a_full_function() {
        let funcs = pick(family(1, Backend::Inline, false), "asm_add_1");
        assert_eq!(
            render(gen_inline_asm, &funcs),
            "// Auto-generated; do not edit.\n\
             #pragma once\n\
             #include <stdint.h>\n\
             #include \"asm_config.h\"\n\
             \n\
             asm_attrs uint64_t asm_add_1(uint64_t* arg0, const uint64_t* arg1)\n\
             {\n\
             \x20   uint64_t ret;\n\
             \x20   asm volatile (\n\
             \x20   \"movq (%[arg1]), %%r11\\n\"\n\
             \x20   \"addq %%r11, (%[arg0])\\n\"\n\
             \x20   \"sbbq %[ret], %[ret]\\n\"\n\
             \x20   : [ret] \"=r\" (ret)\n\
             \x20   : [arg0] \"r\" (arg0), [arg1] \"r\" (arg1)\n\
             \x20   : \"cc\", \"memory\", \"r11\"\n\
             \x20   );\n\
             \x20   return ret;\n\
             }\n"
        );
    }

    #[test]
    fn void_routines_have_no_result_plumbing() {
        let funcs = pick(family(2, Backend::Inline, false), "asm_shl_2");
        let text = render(gen_inline_asm, &funcs);
        assert!(text.contains("asm_attrs void asm_shl_2("));
        assert!(!text.contains("uint64_t ret;"));
        assert!(!text.contains("return ret;"));
        assert!(text.contains(": /*no outputs*/"));
    }
}
