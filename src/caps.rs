//! Host capability probing.
//!
//! Whether the generator may lower to BMI2 depends on the machine it runs
//! on.  A nonempty `FIWIA_CAP_<NAME>` environment variable overrides the
//! answer (`0` disables, any other integer enables); otherwise a small C
//! helper is compiled with `$CC` (default `gcc`) into a temp directory and
//! run with the capability name as its argument.  Exit 0 means present,
//! any other exit means absent, failure to compile is a hard error.
//! Answers are memoized per [`Caps`] instance, so a process probes each
//! capability at most once.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::process::Command;

use derive_more::Display;
use tracing::debug;

/// Capabilities the routine templates can be specialized for.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Cap {
    #[display("bmi2")]
    Bmi2,
}

impl Cap {
    fn override_var(self) -> String {
        format!("FIWIA_CAP_{}", self.to_string().to_uppercase())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CapError {
    #[error("cannot run the capability probe: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot compile the capability probe with `{cc}`")]
    ProbeBuild { cc: String },
    #[error("{var} is set to {value:?}, expected an integer")]
    BadOverride { var: String, value: String },
}

const PROBE_SOURCE: &str = r#"#include <string.h>

int main(int argc, char **argv)
{
    if (argc != 2)
        return 2;
    if (strcmp(argv[1], "bmi2") == 0)
        return !__builtin_cpu_supports("bmi2");
    return 2;
}
"#;

/// The capability collaborator handed to the catalog builder.
pub struct Caps {
    cc: String,
    answers: RefCell<BTreeMap<Cap, bool>>,
    may_probe: bool,
}

impl Caps {
    /// Probe lazily, honoring `CC` and the `FIWIA_CAP_*` overrides.
    pub fn from_env() -> Caps {
        let cc = env::var("CC")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "gcc".to_string());
        Caps {
            cc,
            answers: RefCell::new(BTreeMap::new()),
            may_probe: true,
        }
    }

    /// Fixed answers for tests; never spawns a subprocess.
    pub fn fixed(answers: impl IntoIterator<Item = (Cap, bool)>) -> Caps {
        Caps {
            cc: String::new(),
            answers: RefCell::new(answers.into_iter().collect()),
            may_probe: false,
        }
    }

    pub fn have(&self, cap: Cap) -> Result<bool, CapError> {
        if let Some(&known) = self.answers.borrow().get(&cap) {
            return Ok(known);
        }
        let answer = self.resolve(cap)?;
        self.answers.borrow_mut().insert(cap, answer);
        Ok(answer)
    }

    fn resolve(&self, cap: Cap) -> Result<bool, CapError> {
        let var = cap.override_var();
        if let Ok(value) = env::var(&var) {
            if !value.is_empty() {
                let parsed: i64 = value.parse().map_err(|_| CapError::BadOverride {
                    var,
                    value: value.clone(),
                })?;
                debug!(%cap, value = parsed, "capability overridden from the environment");
                return Ok(parsed != 0);
            }
        }
        assert!(self.may_probe, "no injected answer for capability {cap}");
        self.probe(cap)
    }

    fn probe(&self, cap: Cap) -> Result<bool, CapError> {
        let dir = tempfile::tempdir()?;
        let source = dir.path().join("check_cap.c");
        let binary = dir.path().join("check_cap");
        fs::write(&source, PROBE_SOURCE)?;

        debug!(cc = %self.cc, "compiling the capability probe");
        let status = Command::new(&self.cc)
            .arg(&source)
            .arg("-o")
            .arg(&binary)
            .status()?;
        if !status.success() {
            return Err(CapError::ProbeBuild {
                cc: self.cc.clone(),
            });
        }

        let status = Command::new(&binary).arg(cap.to_string()).status()?;
        debug!(%cap, present = status.success(), "capability probed");
        Ok(status.success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_answers_are_memoized_without_probing() {
        let caps = Caps::fixed([(Cap::Bmi2, true)]);
        assert!(caps.have(Cap::Bmi2).unwrap());
        assert!(caps.have(Cap::Bmi2).unwrap());
    }

    #[test]
    fn override_variable_naming() {
        assert_eq!(Cap::Bmi2.override_var(), "FIWIA_CAP_BMI2");
    }
}
