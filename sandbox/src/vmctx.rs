//! The guest-call handle seen by host functions.
//!
//! A [`VmCtx`] wraps the `Caller` of one host-function invocation together
//! with the guest's exported memory. It only exists while the guest is
//! suspended in that host call, so nothing obtained through it can outlive
//! the call.

use wasmtime::{Caller, Memory};

use vmbridge_hostapi::{registry, Notification};
use vmbridge_primitives::types::{address_to_hex, pack_addresses};
use vmbridge_primitives::{
    Address, ErrorResult, GuestContext, InteropError, InvocationState, OutputResult, OwnedBuffer,
    ServiceHandle, U64Result,
};

use crate::error_channel;
use crate::host_impl::HostState;
use crate::memory;

/// Handle to the running invocation, valid for one host call.
pub struct VmCtx<'a, 'b> {
    caller: &'a mut Caller<'b, HostState>,
    memory: Memory,
}

impl<'a, 'b> VmCtx<'a, 'b> {
    pub fn new(caller: &'a mut Caller<'b, HostState>) -> Result<Self, InteropError> {
        let memory = caller
            .get_export("memory")
            .and_then(|e| e.into_memory())
            .ok_or_else(|| InteropError::host_call("guest exports no memory"))?;
        Ok(Self { caller, memory })
    }

    pub fn state(&self) -> &HostState {
        self.caller.data()
    }

    fn state_mut(&mut self) -> &mut HostState {
        self.caller.data_mut()
    }

    fn guest_memory(&self) -> &[u8] {
        self.memory.data(&*self.caller)
    }

    /// Copy `len` bytes at `offset` out of guest memory.
    pub fn read_guest_memory(&self, offset: u32, len: u32) -> OutputResult {
        memory::read_guest_memory(self.guest_memory(), offset, len)
    }

    pub fn read_address(&self, offset: u32) -> Result<Address, InteropError> {
        memory::read_address(self.guest_memory(), offset)
    }

    pub fn write_u32(&mut self, offset: u32, value: u32) -> ErrorResult {
        memory::write_u32(self.memory.data_mut(&mut *self.caller), offset, value)
    }

    /// Place `data` in the host region of guest memory.
    pub fn alloc_and_write(&mut self, data: &[u8]) -> Result<(u32, u32), InteropError> {
        let memory = self.memory;
        memory::alloc_and_write(&memory, &mut *self.caller, data)
    }

    /// Check both output slots before anything is charged or written.
    pub fn check_out_slots(&self, ptr_slot: u32, len_slot: u32) -> ErrorResult {
        let mem = self.guest_memory();
        memory::read_u32(mem, ptr_slot)?;
        memory::read_u32(mem, len_slot)?;
        Ok(())
    }

    /// Write a `(ptr, len)` pair into two guest slots.
    pub fn write_out_pair(&mut self, ptr_slot: u32, len_slot: u32, (ptr, len): (u32, u32)) -> ErrorResult {
        self.write_u32(ptr_slot, ptr)?;
        self.write_u32(len_slot, len)
    }

    /// Charge `cost` gas, first folding in the fuel burned so far.
    pub fn charge(&mut self, cost: u64) -> ErrorResult {
        let fuel_now = self.caller.get_fuel().map_err(|e| InteropError::host_call(e.to_string()))?;
        let charged = self.state_mut().charge(fuel_now, cost);
        let fuel = self.state().fuel_base;
        self.caller.set_fuel(fuel).map_err(|e| InteropError::host_call(e.to_string()))?;
        charged.map(|_| ()).map_err(Into::into)
    }

    /// Re-align store fuel with the shared ledger, e.g. after a nested call.
    pub fn resync_fuel(&mut self) -> ErrorResult {
        let fuel = self.state().ledger_fuel();
        self.state_mut().fuel_base = fuel;
        self.caller.set_fuel(fuel).map_err(|e| InteropError::host_call(e.to_string()))
    }

    /// Remaining gas after charging `cost` for the query itself.
    pub fn gas_left(&mut self, cost: u64) -> U64Result {
        self.charge(cost)?;
        Ok(self.state().ledger.query())
    }

    pub fn check_witness(&self, addr: &Address) -> bool {
        self.state().snapshot.is_witness(addr)
    }

    /// Store a host-owned copy of `bytes` as the call output. Last write wins.
    pub fn set_call_output(&mut self, bytes: &[u8]) -> ErrorResult {
        if self.state().state != InvocationState::Invoking {
            return Err(InteropError::host_call("no running invocation"));
        }
        let max = self.state().sandbox.config().execution.max_output_len;
        if bytes.len() > max {
            return Err(InteropError::host_call(format!(
                "call output of {} bytes exceeds limit of {}",
                bytes.len(),
                max
            )));
        }
        self.state_mut().call_output = Some(OwnedBuffer::copy_from(bytes));
        Ok(())
    }

    pub fn service_handle_of(&self) -> U64Result {
        let handle = self.state().snapshot.service;
        if handle.is_none() {
            return Err(InteropError::host_call("no host service bound to this invocation"));
        }
        Ok(handle.as_u64())
    }

    /// Copy a guest message into an owned error, cut to the configured length.
    pub fn construct_error(&self, ptr: u32, len: u32) -> InteropError {
        let max = self.state().sandbox.config().execution.max_message_len;
        let len = len.min(u32::try_from(max).unwrap_or(u32::MAX));
        error_channel::construct_error(self.guest_memory(), ptr, len)
    }

    /// Record a `printf` line if guest logs are enabled.
    pub fn guest_log(&mut self, bytes: &[u8]) {
        if !self.state().sandbox.config().enable_guest_logs {
            return;
        }
        let line = String::from_utf8_lossy(bytes).into_owned();
        log::info!(
            target: "vmbridge::guest",
            "[{}] {}",
            address_to_hex(&self.state().snapshot.self_address),
            line
        );
        self.state_mut().add_log(line);
    }

    /// Record a `notify` event from the running contract.
    pub fn notify(&mut self, payload: &[u8]) -> ErrorResult {
        let max = self.state().sandbox.config().execution.max_notify_len;
        if payload.len() > max {
            return Err(InteropError::host_call(format!(
                "notification of {} bytes exceeds limit of {}",
                payload.len(),
                max
            )));
        }
        let contract = self.state().snapshot.self_address;
        log::debug!("notify from {}: {} bytes", address_to_hex(&contract), payload.len());
        self.state_mut().notifications.push(Notification {
            contract,
            payload: payload.to_vec(),
        });
        Ok(())
    }

    /// Marshal the context into guest memory in the configured schema.
    ///
    /// Returns the `(ptr, len)` of the struct. Output fields are always zero:
    /// output is returned through `set_call_output` only.
    pub fn marshal_context(&mut self) -> Result<(u32, u32), InteropError> {
        let snapshot = self.state().snapshot.clone();
        let schema = self.state().sandbox.config().context_schema;
        let (input, input_len) = self.state().input;

        let (block_hash, _) = self.alloc_and_write(&snapshot.block_hash)?;
        let (tx_hash, _) = self.alloc_and_write(&snapshot.tx_hash)?;
        let (self_address, _) = self.alloc_and_write(&snapshot.self_address)?;
        let (callers, _) = self.alloc_and_write(&pack_addresses(&snapshot.callers))?;
        let (witness, _) = self.alloc_and_write(&pack_addresses(&snapshot.witness))?;

        let guest = GuestContext {
            height: snapshot.height,
            block_hash,
            timestamp: snapshot.timestamp,
            tx_hash,
            self_address,
            callers,
            callers_num: snapshot.callers.len() as u32,
            witness,
            witness_num: snapshot.witness.len() as u32,
            input,
            input_len,
            service: snapshot.service.as_u64(),
            gas_left: self.state().ledger.query(),
            call_output: 0,
            call_output_len: 0,
        };
        self.alloc_and_write(&guest.encode(schema))
    }

    /// Run the contract deployed at `callee` on the shared gas ledger.
    ///
    /// Fails with `HostCallFailure` when no service is bound, the callee is
    /// unknown or the depth limit is reached; any failure of the callee
    /// itself is returned unchanged.
    pub fn call_contract(&mut self, callee: Address, input: &[u8]) -> OutputResult {
        let (sandbox, snapshot, ledger, depth) = {
            let state = self.state();
            (
                state.sandbox.clone(),
                state.snapshot.nested(callee),
                state.ledger.clone(),
                state.depth + 1,
            )
        };
        if depth > sandbox.config().max_call_depth {
            return Err(InteropError::host_call(format!(
                "call depth {} exceeds limit of {}",
                depth,
                sandbox.config().max_call_depth
            )));
        }

        let handle = ServiceHandle(self.service_handle_of()?);
        let service = registry::resolve(handle).map_err(InteropError::from)?;
        let code = service
            .contract_code(&callee)
            .map_err(InteropError::from)?
            .ok_or_else(|| {
                InteropError::host_call(format!("no contract at {}", address_to_hex(&callee)))
            })?;

        log::debug!(
            "nested call {} -> {} at depth {}",
            address_to_hex(&self.state().snapshot.self_address),
            address_to_hex(&callee),
            depth
        );
        let entry = sandbox.config().entry_point.clone();
        let outcome = sandbox.run(&code, &entry, snapshot, input, ledger, depth);
        self.resync_fuel()?;
        let outcome = outcome?;
        for line in outcome.logs {
            self.state_mut().add_log(line);
        }
        self.state_mut().notifications.extend(outcome.notifications);
        Ok(outcome.output.unwrap_or_default())
    }
}

/// Store a host-owned copy of `bytes` as the output of the running call.
pub fn set_call_output(vmctx: &mut VmCtx<'_, '_>, bytes: &[u8]) -> ErrorResult {
    vmctx.set_call_output(bytes)
}

/// The service handle bound to the running call.
pub fn service_handle_of(vmctx: &VmCtx<'_, '_>) -> U64Result {
    vmctx.service_handle_of()
}
