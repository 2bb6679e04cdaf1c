//! Contract module validation against the host ABI.
//!
//! A module is accepted only if it:
//!
//! 1. Exports a linear memory named `memory` that may grow by the host
//!    region
//! 2. Imports nothing but functions from the `vmbridge` host module
//! 3. Imports no WASI functions
//! 4. Exports the requested entry point as `(i32, i32) -> ()`
//!
//! Checks 1-3 run once per compiled module; check 4 runs per invocation
//! since the entry point is chosen by the caller.

use wasmtime::{ExternType, Module, ValType};

use vmbridge_primitives::types::HOST_MODULE;

use crate::error::SandboxError;
use crate::linker::HOST_FUNCTIONS;
use crate::memory::HOST_ALLOC_PAGES;

/// Validate exports and imports of a compiled module.
pub fn validate_module(module: &Module) -> Result<(), SandboxError> {
    validate_memory(module)?;
    validate_imports(module)?;
    Ok(())
}

fn validate_memory(module: &Module) -> Result<(), SandboxError> {
    match module.get_export("memory") {
        Some(ExternType::Memory(ty)) => match ty.maximum() {
            // The host region is appended above the guest's initial pages.
            Some(max) if max < ty.minimum().saturating_add(HOST_ALLOC_PAGES) => {
                Err(SandboxError::ValidationError(format!(
                    "memory maximum of {} pages leaves no room for {} host pages above {}",
                    max,
                    HOST_ALLOC_PAGES,
                    ty.minimum()
                )))
            }
            _ => Ok(()),
        },
        Some(_) => Err(SandboxError::ValidationError("export 'memory' is not a memory".into())),
        None => Err(SandboxError::ValidationError("no 'memory' export".into())),
    }
}

/// Check that `entry` is exported with signature `(i32 input_ptr, i32 input_len) -> ()`.
pub fn validate_entry(module: &Module, entry: &str) -> Result<(), SandboxError> {
    let export = module.get_export(entry).ok_or_else(|| {
        SandboxError::ValidationError(format!("missing entry point: {}", entry))
    })?;

    let func_ty = match export {
        ExternType::Func(ft) => ft,
        _ => {
            return Err(SandboxError::ValidationError(format!(
                "entry point '{}' must be a function",
                entry
            )));
        }
    };

    let params: Vec<ValType> = func_ty.params().collect();
    let results = func_ty.results().len();
    if params.len() != 2 || !params.iter().all(|p| matches!(p, ValType::I32)) || results != 0 {
        return Err(SandboxError::ValidationError(format!(
            "entry point '{}' must be (i32, i32) -> (), got {} params and {} results",
            entry,
            params.len(),
            results
        )));
    }
    Ok(())
}

fn validate_imports(module: &Module) -> Result<(), SandboxError> {
    for import in module.imports() {
        if let Some(reason) = import_rejection(import.module(), import.name(), &import.ty()) {
            return Err(SandboxError::ValidationError(format!(
                "{}: {}::{}",
                reason,
                import.module(),
                import.name()
            )));
        }
    }
    Ok(())
}

/// Why a single import is refused, if it is.
fn import_rejection(module: &str, name: &str, ty: &ExternType) -> Option<&'static str> {
    if module.starts_with("wasi") {
        Some("WASI is not available to contracts")
    } else if module != HOST_MODULE {
        Some("contracts may only import from the vmbridge host module")
    } else if !matches!(ty, ExternType::Func(_)) {
        Some("host imports must be functions")
    } else if !HOST_FUNCTIONS.contains(&name) {
        Some("no such host function")
    } else {
        None
    }
}
