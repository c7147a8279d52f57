//! `argot.toml` — per-target default emit options.
//!
//! Fields mirror the CLI flags; anything absent falls through to the
//! target's own defaults. CLI flags override the file.

use argot_compiler::options::{CStandard, EmitOptions, IndentStyle, LineEnding};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub targets: HashMap<String, TargetConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TargetConfig {
    pub indent: Option<String>,
    pub line_ending: Option<String>,
    pub doc_comments: Option<bool>,
    pub shebang: Option<bool>,
    pub c_standard: Option<String>,
    pub safety_checks: Option<bool>,
    pub symbol_keys: Option<bool>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<ConfigFile, String> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
        toml::from_str(&text).map_err(|e| format!("cannot parse {}: {e}", path.display()))
    }

    /// Apply this file's settings for `target` over `options`.
    pub fn apply(&self, target: &str, options: &mut EmitOptions) -> Result<(), String> {
        let Some(config) = self.targets.get(target) else {
            return Ok(());
        };
        if let Some(indent) = &config.indent {
            options.indent =
                Some(IndentStyle::from_str(indent).map_err(|_| bad("indent", indent))?);
        }
        if let Some(line_ending) = &config.line_ending {
            options.line_ending =
                LineEnding::from_str(line_ending).map_err(|_| bad("line_ending", line_ending))?;
        }
        if let Some(doc_comments) = config.doc_comments {
            options.doc_comments = doc_comments;
        }
        if let Some(shebang) = config.shebang {
            options.shebang = shebang;
        }
        if let Some(standard) = &config.c_standard {
            options.c_standard =
                CStandard::from_str(standard).map_err(|_| bad("c_standard", standard))?;
        }
        if let Some(safety_checks) = config.safety_checks {
            options.safety_checks = safety_checks;
        }
        if let Some(symbol_keys) = config.symbol_keys {
            options.symbol_keys = symbol_keys;
        }
        Ok(())
    }
}

fn bad(key: &str, value: &str) -> String {
    format!("invalid {key} value '{value}' in argot.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_overrides_only_named_target() {
        let file: ConfigFile = toml::from_str(
            r#"
[targets.ruby]
indent = "tab"
symbol_keys = false

[targets.c]
c_standard = "c11"
"#,
        )
        .unwrap();
        let mut ruby = EmitOptions::default();
        file.apply("ruby", &mut ruby).unwrap();
        assert_eq!(ruby.indent, Some(IndentStyle::Tab));
        assert!(!ruby.symbol_keys);

        let mut ts = EmitOptions::default();
        file.apply("typescript", &mut ts).unwrap();
        assert_eq!(ts.indent, None);
    }

    #[test]
    fn test_bad_value_is_reported() {
        let file: ConfigFile = toml::from_str(
            r#"
[targets.c]
c_standard = "c03"
"#,
        )
        .unwrap();
        let mut options = EmitOptions::default();
        let err = file.apply("c", &mut options).unwrap_err();
        assert!(err.contains("c_standard"));
    }
}
