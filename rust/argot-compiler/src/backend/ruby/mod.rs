//! The Ruby target.

pub mod ast;
pub mod emit;
pub mod runtime;
pub mod transform;

use crate::backend::{Backend, BackendOutput, TargetInfo};
use crate::il::Module;
use crate::options::EmitOptions;
use transform::RubyTransformer;

pub struct RubyBackend {
    info: TargetInfo,
}

impl RubyBackend {
    pub fn new() -> RubyBackend {
        RubyBackend {
            info: TargetInfo {
                name: "ruby",
                extension: "rb",
                icon: "gem",
                description: "Idiomatic Ruby with pack/unpack-based byte handling",
                mime: "text/x-ruby",
                version: "1.0.0",
            },
        }
    }
}

impl Default for RubyBackend {
    fn default() -> Self {
        RubyBackend::new()
    }
}

impl Backend for RubyBackend {
    fn info(&self) -> &TargetInfo {
        &self.info
    }

    fn default_options(&self) -> EmitOptions {
        EmitOptions::default()
    }

    fn emit(&self, module: &Module, options: &EmitOptions) -> BackendOutput {
        let mut transformer = RubyTransformer::new(options);
        let program = transformer.transform_module(module);
        let code = emit::emit_program(&program, &transformer.helpers, options, &module.fingerprint);
        BackendOutput {
            code,
            dependencies: program.requires.clone(),
            diagnostics: transformer.diags,
        }
    }
}
