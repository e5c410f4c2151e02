//! The generator binary.  Takes an action, a limb count, and an optional
//! comma-separated allow-list of exported routine names; prints the
//! generated text to stdout.
//!
//! Run with `--help` for more info.

use std::collections::BTreeSet;
use std::io::{self, Write};

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use fiwia::caps::Caps;
use fiwia::catalog::{self, Backend};
use fiwia::driver;

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// what to generate
    #[arg(value_enum)]
    action: Action,
    /// the number of 64-bit limbs per big integer
    #[arg(value_parser = clap::value_parser!(u32).range(1..))]
    width: u32,
    /// comma-separated allow-list of exported routine names
    func_names: Option<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum)]
#[value(rename_all = "snake_case")]
enum Action {
    /// print assembly to stdout
    GenAsm,
    /// print a C header to stdout
    GenCHeader,
    /// print a C header with inline functions to stdout
    GenInlineAsm,
}

fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let backend = match args.action {
        Action::GenInlineAsm => Backend::Inline,
        Action::GenAsm | Action::GenCHeader => Backend::Sysv,
    };

    let caps = Caps::from_env();
    let mut funcs = catalog::routines(args.width as usize, backend, &caps)?;

    if let Some(names) = &args.func_names {
        let keep: BTreeSet<&str> = names.split(',').collect();
        funcs.retain(|f| keep.contains(f.name.as_str()));
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.action {
        Action::GenAsm => driver::gen_asm(&funcs, &mut out)?,
        Action::GenCHeader => driver::gen_c_header(&funcs, &mut out)?,
        Action::GenInlineAsm => driver::gen_inline_asm(&funcs, &mut out)?,
    }
    out.flush()?;

    Ok(())
}
