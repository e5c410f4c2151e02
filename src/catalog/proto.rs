//! The compact prototype grammar.
//!
//! A prototype is a comma list of parameter types, `->`, and a return
//! type, where `#` is a 64-bit limb, `#*` a mutable pointer to limb,
//! `@#*` a read-only pointer to limb, and `void` a missing value.

use regex::Regex;

/// A C-surface type of the generated routines.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CType {
    Limb,
    LimbPtr,
    ConstLimbPtr,
    Void,
}

impl CType {
    pub fn c_name(self) -> &'static str {
        match self {
            CType::Limb => "uint64_t",
            CType::LimbPtr => "uint64_t*",
            CType::ConstLimbPtr => "const uint64_t*",
            CType::Void => "void",
        }
    }
}

/// A parsed prototype.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Proto {
    pub params: Vec<CType>,
    pub ret: CType,
}

fn parse_type(token: &str) -> CType {
    match token.trim() {
        "#" => CType::Limb,
        "#*" => CType::LimbPtr,
        "@#*" => CType::ConstLimbPtr,
        "void" => CType::Void,
        other => panic!("unknown prototype token {other:?}"),
    }
}

impl Proto {
    /// Parse the compact grammar.  A malformed string is a catalog bug and
    /// panics.
    pub fn parse(proto: &str) -> Proto {
        let shape = Regex::new(r"\A\s*(.*?)\s*->\s*(\S+)\s*\z").unwrap();
        let parts = shape
            .captures(proto)
            .unwrap_or_else(|| panic!("malformed prototype {proto:?}"));
        Proto {
            params: parts[1].split(',').map(parse_type).collect(),
            ret: parse_type(&parts[2]),
        }
    }

    pub fn returns_value(&self) -> bool {
        self.ret != CType::Void
    }

    /// `extern` declaration for the plain C header.
    pub fn extern_decl(&self, name: &str) -> String {
        let params: Vec<&str> = self.params.iter().map(|t| t.c_name()).collect();
        format!("extern {} {}({});", self.ret.c_name(), name, params.join(", "))
    }

    /// Definition head for the inline-asm header, with `arg0..argN`
    /// parameter names.
    pub fn c_signature(&self, name: &str) -> String {
        let params: Vec<String> = self
            .params
            .iter()
            .enumerate()
            .map(|(i, t)| format!("{} arg{i}", t.c_name()))
            .collect();
        format!("{} {}({})", self.ret.c_name(), name, params.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_grammar() {
        let proto = Proto::parse("#*, @#* -> #");
        assert_eq!(proto.params, vec![CType::LimbPtr, CType::ConstLimbPtr]);
        assert_eq!(proto.ret, CType::Limb);
        assert!(proto.returns_value());

        let proto = Proto::parse("@#*, #, #* -> void");
        assert_eq!(
            proto.params,
            vec![CType::ConstLimbPtr, CType::Limb, CType::LimbPtr]
        );
        assert!(!proto.returns_value());
    }

    #[test]
    fn renders_c_declarations() {
        let proto = Proto::parse("#*, @#*, # -> #");
        assert_eq!(
            proto.extern_decl("asm_add_masked_4"),
            "extern uint64_t asm_add_masked_4(uint64_t*, const uint64_t*, uint64_t);"
        );
        assert_eq!(
            proto.c_signature("asm_add_masked_4"),
            "uint64_t asm_add_masked_4(uint64_t* arg0, const uint64_t* arg1, uint64_t arg2)"
        );
    }

    #[test]
    #[should_panic(expected = "unknown prototype token")]
    fn rejects_unknown_tokens() {
        Proto::parse("#%, # -> void");
    }
}
