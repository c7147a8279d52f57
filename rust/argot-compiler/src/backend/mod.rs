//! Shared back-end machinery.
//!
//! Each target contributes a transformer (IL → target AST), an emitter
//! (target AST → text), and a runtime-fragment table. The pieces shared by
//! all three targets live here: the helper registry a transformer fills and
//! its emitter reads, the indentation-owning printer, and the plugin trait
//! the registry stores.

pub mod c;
pub mod ruby;
pub mod ts;

use crate::diagnostics::Diagnostics;
use crate::il::Module;
use crate::options::{EmitOptions, IndentStyle};
use std::collections::BTreeSet;

/// Names of runtime helpers the output program needs. Ordered so prologue
/// emission is deterministic.
#[derive(Debug, Default, Clone)]
pub struct HelperSet {
    names: BTreeSet<&'static str>,
}

impl HelperSet {
    pub fn new() -> HelperSet {
        HelperSet::default()
    }

    pub fn register(&mut self, name: &'static str) {
        self.names.insert(name);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.names.iter().copied()
    }
}

/// What a back-end hands back to the driver.
#[derive(Debug)]
pub struct BackendOutput {
    pub code: String,
    /// Standard headers / requires the output expects (C `#include`s, Ruby
    /// `require`s). Already emitted into the code; listed for the caller.
    pub dependencies: Vec<String>,
    pub diagnostics: Diagnostics,
}

/// Static description of a registered target.
#[derive(Debug, Clone)]
pub struct TargetInfo {
    pub name: &'static str,
    pub extension: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
    pub mime: &'static str,
    pub version: &'static str,
}

/// One registered target: transformer + emitter + runtime triple.
pub trait Backend {
    fn info(&self) -> &TargetInfo;
    fn default_options(&self) -> EmitOptions;
    fn emit(&self, module: &Module, options: &EmitOptions) -> BackendOutput;
}

/// Line-oriented output writer. The emitters are the only components that
/// touch whitespace, and they touch it only through this type.
#[derive(Debug)]
pub struct Printer {
    out: String,
    indent_unit: &'static str,
    line_ending: &'static str,
    level: usize,
}

impl Printer {
    pub fn new(options: &EmitOptions, default_indent: IndentStyle) -> Printer {
        Printer {
            out: String::new(),
            indent_unit: options.indent.unwrap_or(default_indent).unit(),
            line_ending: options.line_ending.as_str(),
            level: 0,
        }
    }

    pub fn indent(&mut self) {
        self.level += 1;
    }

    pub fn dedent(&mut self) {
        self.level = self.level.saturating_sub(1);
    }

    /// One indented line.
    pub fn line(&mut self, text: &str) {
        if text.is_empty() {
            self.blank();
            return;
        }
        for _ in 0..self.level {
            self.out.push_str(self.indent_unit);
        }
        self.out.push_str(text);
        self.out.push_str(self.line_ending);
    }

    pub fn blank(&mut self) {
        self.out.push_str(self.line_ending);
    }

    /// A pre-formatted multi-line fragment (runtime helper bodies). Emitted
    /// verbatim at column zero, normalising only the line ending.
    pub fn fragment(&mut self, text: &str) {
        for line in text.trim_end().lines() {
            self.out.push_str(line);
            self.out.push_str(self.line_ending);
        }
    }

    pub fn finish(self) -> String {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helper_set_is_sorted_and_deduped() {
        let mut helpers = HelperSet::new();
        helpers.register("rotl32");
        helpers.register("hex_to_bytes");
        helpers.register("rotl32");
        let names: Vec<_> = helpers.iter().collect();
        assert_eq!(names, vec!["hex_to_bytes", "rotl32"]);
    }

    #[test]
    fn test_printer_indents_and_terminates_lines() {
        let options = EmitOptions::default();
        let mut p = Printer::new(&options, IndentStyle::Spaces2);
        p.line("class Foo");
        p.indent();
        p.line("x = 1");
        p.dedent();
        p.line("end");
        assert_eq!(p.finish(), "class Foo\n  x = 1\nend\n");
    }

    #[test]
    fn test_printer_honours_configured_indent() {
        let options = EmitOptions {
            indent: Some(IndentStyle::Tab),
            ..EmitOptions::default()
        };
        let mut p = Printer::new(&options, IndentStyle::Spaces4);
        p.indent();
        p.line("a");
        assert_eq!(p.finish(), "\ta\n");
    }
}
