//! The C target.

pub mod ast;
pub mod emit;
pub mod runtime;
pub mod transform;

use crate::backend::{Backend, BackendOutput, TargetInfo};
use crate::il::Module;
use crate::options::EmitOptions;
use transform::CTransformer;

pub struct CBackend {
    info: TargetInfo,
}

impl CBackend {
    pub fn new() -> CBackend {
        CBackend {
            info: TargetInfo {
                name: "c",
                extension: "c",
                icon: "copyright",
                description: "Portable C99 with struct-based classes and fixed-width helpers",
                mime: "text/x-csrc",
                version: "1.0.0",
            },
        }
    }
}

impl Default for CBackend {
    fn default() -> Self {
        CBackend::new()
    }
}

impl Backend for CBackend {
    fn info(&self) -> &TargetInfo {
        &self.info
    }

    fn default_options(&self) -> EmitOptions {
        EmitOptions::default()
    }

    fn emit(&self, module: &Module, options: &EmitOptions) -> BackendOutput {
        let mut transformer = CTransformer::new(options);
        let program = transformer.transform_module(module);
        let mut diagnostics = transformer.diags;
        let code = emit::emit_program(
            &program,
            &transformer.helpers,
            options,
            &module.fingerprint,
            &mut diagnostics,
        );
        let dependencies = program
            .includes
            .iter()
            .map(|inc| inc.to_string())
            .collect();
        BackendOutput {
            code,
            dependencies,
            diagnostics,
        }
    }
}
