//! Sandbox runtime Wasmtime engine, module loading, and invocation.
//!
//! The `Sandbox` struct is the main entry point. It compiles (or fetches
//! from its cache) a contract module, validates its ABI, and runs one
//! entry point per call in a fresh instance.
//!
//! Gas is tracked in a shared [`GasLedger`]. Guest instructions burn
//! engine fuel, which is folded into the ledger at every host call, after
//! every nested call and when the entry point returns.

use std::sync::Arc;

use wasmtime::{Config, Engine, Linker, Store, StoreLimitsBuilder};

use vmbridge_hostapi::{GasLedger, Notification};
use vmbridge_primitives::types::address_to_hex;
use vmbridge_primitives::{
    ContextSnapshot, ErrorCode, InteropError, InvocationContext, InvocationState, OutputResult,
    OwnedBuffer,
};

use crate::cache::ModuleCache;
use crate::config::SandboxConfig;
use crate::error::SandboxError;
use crate::error_channel::classify_trap;
use crate::host_impl::HostState;
use crate::linker::register_host_functions;
use crate::memory::{self, HostAllocator, HOST_ALLOC_PAGES, PAGE_SIZE};
use crate::output::CallOutput;
use crate::validation::validate_entry;

/// Result of `invoke`: the captured output or the error that ended the call.
pub type InvokeResult = Result<CallOutput, InteropError>;

/// What a finished guest call leaves behind.
pub(crate) struct RunOutcome {
    pub(crate) output: Option<OwnedBuffer>,
    pub(crate) logs: Vec<String>,
    pub(crate) notifications: Vec<Notification>,
}

/// The deterministic WASM execution sandbox.
///
/// Cheap to clone; clones share the engine, configuration and module
/// cache. Each call runs in a fresh Wasmtime instance.
#[derive(Clone)]
pub struct Sandbox {
    engine: Engine,
    config: Arc<SandboxConfig>,
    cache: Arc<ModuleCache>,
}

impl Sandbox {
    /// Create a sandbox with its own engine and module cache.
    pub fn new(config: SandboxConfig) -> Result<Self, SandboxError> {
        config.validate()?;
        let engine = create_engine(&config)?;
        let cache = Arc::new(ModuleCache::new(config.module_cache_size));
        Ok(Self {
            engine,
            config: Arc::new(config),
            cache,
        })
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    pub fn cache(&self) -> &ModuleCache {
        &self.cache
    }

    /// Run the configured entry point of `code`.
    ///
    /// Consumed gas is deducted from `ctx.gas_left` whether the call
    /// succeeds or not; on `GasExhausted` it is zero.
    pub fn invoke(&self, code: &[u8], ctx: &mut InvocationContext<'_>) -> InvokeResult {
        self.invoke_at(code, &self.config.entry_point, ctx)
    }

    /// Run the entry point named `entry`.
    pub fn invoke_at(&self, code: &[u8], entry: &str, ctx: &mut InvocationContext<'_>) -> InvokeResult {
        if code.is_empty() {
            return Err(InteropError::invalid_code("empty code"));
        }
        if ctx.gas_left == 0 {
            return Err(InteropError::gas_exhausted());
        }

        let ledger = GasLedger::new(ctx.gas_left);
        log::debug!(
            "invoke {}::{} with {} gas, {} input bytes",
            address_to_hex(&ctx.self_address),
            entry,
            ctx.gas_left,
            ctx.input.len()
        );

        let result = self.run(code, entry, ctx.snapshot(), ctx.input.as_slice(), ledger.clone(), 0);
        ctx.gas_left = ledger.query();

        match result {
            Ok(outcome) => {
                log::debug!(
                    "invoke {} completed, gas used {}",
                    address_to_hex(&ctx.self_address),
                    ledger.consumed()
                );
                Ok(CallOutput::new(
                    outcome.output,
                    ledger.consumed(),
                    ctx.gas_left,
                    outcome.logs,
                    outcome.notifications,
                ))
            }
            Err(err) => {
                log::warn!(
                    "invoke {} failed after {} gas: {}",
                    address_to_hex(&ctx.self_address),
                    ledger.consumed(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Run one call in a fresh instance. Nested calls come back through here.
    pub(crate) fn run(
        &self,
        code: &[u8],
        entry: &str,
        snapshot: ContextSnapshot,
        input: &[u8],
        ledger: GasLedger,
        depth: u32,
    ) -> Result<RunOutcome, InteropError> {
        // 1. Compile or fetch, then check the entry point
        let module = self.cache.get_or_compile(&self.engine, code)?;
        validate_entry(&module, entry)?;

        // 2. Create store with fuel matching the ledger and memory limits
        let limits = StoreLimitsBuilder::new()
            .memory_size(self.config.max_memory_bytes())
            .build();
        let host_state = HostState::new(self.clone(), snapshot, ledger.clone(), depth, limits);
        let mut store = Store::new(&self.engine, host_state);
        store.limiter(|state| &mut state.limits);
        let fuel = store.data().fuel_base;
        store.set_fuel(fuel).map_err(host_call)?;

        // 3. Create linker, register host functions and instantiate
        let mut linker = Linker::new(&self.engine);
        register_host_functions(&mut linker)?;
        let instance = linker
            .instantiate(&mut store, &module)
            .map_err(|e| match e.downcast::<InteropError>() {
                Ok(err) => err,
                Err(e) => InteropError::invalid_code(format!("instantiation failed: {:#}", e)),
            })?;

        // 4. Reserve the host region and copy the input in
        let wasm_memory = instance
            .get_memory(&mut store, "memory")
            .ok_or_else(|| InteropError::invalid_code("no memory export"))?;
        let current_pages = wasm_memory.size(&store);
        wasm_memory
            .grow(&mut store, HOST_ALLOC_PAGES)
            .map_err(|e| SandboxError::MemoryError(format!("initial grow: {}", e)))?;
        store.data_mut().allocator = HostAllocator::new(
            current_pages as usize * PAGE_SIZE,
            HOST_ALLOC_PAGES as usize * PAGE_SIZE,
        );
        let (input_ptr, input_len) = memory::alloc_and_write(&wasm_memory, &mut store, input)?;
        store.data_mut().input = (input_ptr, input_len);

        // 5. Call the entry point
        let entry_fn = instance
            .get_typed_func::<(i32, i32), ()>(&mut store, entry)
            .map_err(|e| InteropError::invalid_code(format!("{:#}", e)))?;
        store.data_mut().advance(InvocationState::Invoking)?;
        let call = entry_fn.call(&mut store, (input_ptr as i32, input_len as i32));

        // 6. Settle fuel against the ledger and collect the result
        let fuel_now = store.get_fuel().unwrap_or(0);
        match call {
            Ok(()) => {
                store.data_mut().absorb_fuel(fuel_now)?;
                store.data_mut().advance(InvocationState::Completed)?;
                store.data_mut().advance(InvocationState::OutputReady)?;
                let state = store.into_data();
                Ok(RunOutcome {
                    output: state.call_output,
                    logs: state.logs,
                    notifications: state.notifications,
                })
            }
            Err(trap) => {
                let err = classify_trap(trap);
                let next = if err.code() == ErrorCode::GasExhausted {
                    ledger.exhaust();
                    InvocationState::GasExhausted
                } else {
                    // Gas burned up to the trap is still spent.
                    let _ = store.data_mut().absorb_fuel(fuel_now);
                    InvocationState::Trapped
                };
                store.data_mut().advance(next)?;
                log::debug!("guest trapped at depth {}: {}", depth, err);
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for Sandbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sandbox")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .finish()
    }
}

fn host_call(err: anyhow::Error) -> InteropError {
    InteropError::host_call(format!("{:#}", err))
}

/// Run the configured entry point and hand the output buffer to the caller.
pub fn call_invoke(sandbox: &Sandbox, code: &[u8], ctx: &mut InvocationContext<'_>) -> OutputResult {
    sandbox.invoke(code, ctx)?.take()
}

/// Create a Wasmtime engine with deterministic configuration.
fn create_engine(config: &SandboxConfig) -> Result<Engine, SandboxError> {
    let mut wasm_config = Config::new();

    // Fuel metering: the gas clock for guest instructions
    wasm_config.consume_fuel(true);

    // Determinism enforcement
    wasm_config.wasm_threads(false);
    wasm_config.wasm_simd(false);
    wasm_config.wasm_relaxed_simd(false);
    wasm_config.wasm_multi_memory(false);
    wasm_config.cranelift_nan_canonicalization(true);

    // Memory limits
    let max_bytes = config.max_memory_bytes() as u64;
    wasm_config.memory_guaranteed_dense_image_size(max_bytes.min(16 * 1024 * 1024));

    Ok(Engine::new(&wasm_config)?)
}
