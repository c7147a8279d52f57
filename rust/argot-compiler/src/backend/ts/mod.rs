//! The TypeScript target.

pub mod ast;
pub mod emit;
pub mod runtime;
pub mod transform;

use crate::backend::{Backend, BackendOutput, TargetInfo};
use crate::il::Module;
use crate::options::EmitOptions;
use transform::TsTransformer;

pub struct TypeScriptBackend {
    info: TargetInfo,
}

impl TypeScriptBackend {
    pub fn new() -> TypeScriptBackend {
        TypeScriptBackend {
            info: TargetInfo {
                name: "typescript",
                extension: "ts",
                icon: "square-ts",
                description: "Typed TypeScript preserving zero-fill shifts and template literals",
                mime: "text/typescript",
                version: "1.0.0",
            },
        }
    }
}

impl Default for TypeScriptBackend {
    fn default() -> Self {
        TypeScriptBackend::new()
    }
}

impl Backend for TypeScriptBackend {
    fn info(&self) -> &TargetInfo {
        &self.info
    }

    fn default_options(&self) -> EmitOptions {
        EmitOptions::default()
    }

    fn emit(&self, module: &Module, options: &EmitOptions) -> BackendOutput {
        let mut transformer = TsTransformer::new(options);
        let program = transformer.transform_module(module);
        let code = emit::emit_program(&program, &transformer.helpers, options, &module.fingerprint);
        BackendOutput {
            code,
            dependencies: Vec::new(),
            diagnostics: transformer.diags,
        }
    }
}
