//! Per-target emission options.
//!
//! Every option's effect is local to emission: transformers never consult
//! them except where a mapping is itself an emission choice (Ruby symbol
//! keys). Unset fields fall back to the target's own defaults.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "lowercase")]
pub enum IndentStyle {
    Tab,
    #[strum(serialize = "2-space")]
    Spaces2,
    #[strum(serialize = "4-space")]
    Spaces4,
}

impl IndentStyle {
    pub fn unit(self) -> &'static str {
        match self {
            IndentStyle::Tab => "\t",
            IndentStyle::Spaces2 => "  ",
            IndentStyle::Spaces4 => "    ",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "lowercase")]
pub enum LineEnding {
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// C language standard accepted by the C back-end.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "lowercase")]
pub enum CStandard {
    C89,
    C99,
    C11,
    C17,
    C23,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmitOptions {
    /// `None` → the target's default (4-space C, 2-space Ruby/TypeScript).
    pub indent: Option<IndentStyle>,
    pub line_ending: LineEnding,
    /// Generated-by banner and documentation comments.
    pub doc_comments: bool,
    /// Ruby only: `#!/usr/bin/env ruby` line.
    pub shebang: bool,
    /// C only.
    pub c_standard: CStandard,
    /// Emit bounds/argument guards where the target mapping offers them.
    pub safety_checks: bool,
    /// Ruby only: hash literals use symbol keys.
    pub symbol_keys: bool,
}

impl Default for EmitOptions {
    fn default() -> EmitOptions {
        EmitOptions {
            indent: None,
            line_ending: LineEnding::Lf,
            doc_comments: true,
            shebang: false,
            c_standard: CStandard::C99,
            safety_checks: false,
            symbol_keys: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_indent_units() {
        assert_eq!(IndentStyle::Tab.unit(), "\t");
        assert_eq!(IndentStyle::Spaces2.unit(), "  ");
        assert_eq!(IndentStyle::Spaces4.unit(), "    ");
    }

    #[test]
    fn test_option_enums_parse_from_cli_spellings() {
        assert_eq!(IndentStyle::from_str("2-space").unwrap(), IndentStyle::Spaces2);
        assert_eq!(LineEnding::from_str("crlf").unwrap(), LineEnding::CrLf);
        assert_eq!(CStandard::from_str("c11").unwrap(), CStandard::C11);
        assert!(CStandard::from_str("c03").is_err());
    }
}
