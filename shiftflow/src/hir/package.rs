use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use thiserror::Error;

use crate::hir::*;
use crate::{vir, virgen};

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum PackageError {
    #[error("file system error: {error:?}")]
    Fs { error: io::Error },

    #[error("module `{0}` is contained in the package twice")]
    DuplicateModule(String),
}

/// Package.
#[derive(Debug, Default)]
pub struct Package {
    /// Modules.
    pub modules: Vec<Module>,
}

impl Package {
    /// Adds the given module to package.
    pub fn add(&mut self, module: Module) { self.modules.push(module); }

    /// Lowers every module to Verilog IR.
    pub fn gen_vir_modules(&self) -> Result<Vec<vir::Module>, PackageError> {
        let mut names = HashSet::new();
        for module in &self.modules {
            if !names.insert(module.name()) {
                return Err(PackageError::DuplicateModule(module.name().to_string()));
            }
        }

        Ok(self
            .modules
            .iter()
            .map(|module| vir::opt::dead_code_opt(virgen::gen_vir_module(module)))
            .collect())
    }

    /// Generates Verilog code at the given directory path.
    pub fn gen_vir<P: AsRef<Path>>(&self, path_dir: P) -> Result<(), PackageError> {
        let modules = self.gen_vir_modules()?;
        fs::create_dir_all(path_dir.as_ref()).map_err(|error| PackageError::Fs { error })?;

        for module in modules {
            let path = path_dir.as_ref().join(format!("{}.v", module.name));
            let mut file = File::create(&path).map_err(|error| PackageError::Fs { error })?;
            writeln!(file, "{}", module).map_err(|error| PackageError::Fs { error })?;
            tracing::debug!(module = %module.name, path = %path.display(), "wrote verilog");
        }

        Ok(())
    }
}
