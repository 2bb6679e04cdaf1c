//! Gas cost constants for host functions.
//!
//! Guest instructions are metered by the engine at one fuel unit per gas
//! unit. Host functions charge the costs below on top of that.

/// Cost of `gas_left`.
pub const G_GAS_LEFT: u64 = 5;

/// Cost of `check_witness`.
pub const G_CHECK_WITNESS: u64 = 200;

/// Base cost of `printf`.
pub const G_PRINTF: u64 = 10;

/// Base cost of `set_call_output`.
pub const G_SET_CALL_OUTPUT: u64 = 20;

/// Base cost of `get_context`.
pub const G_GET_CONTEXT: u64 = 50;

/// Base cost of `notify`.
pub const G_NOTIFY: u64 = 30;

/// Base cost of `call_contract`, excluding the callee's own consumption.
pub const G_CALL_CONTRACT: u64 = 10;

/// Per-byte cost added to operations that copy across the boundary.
pub const G_PER_BYTE: u64 = 1;

/// Number of fuel units the engine burns per gas unit.
pub const FUEL_PER_GAS: u64 = 1;

/// Base cost plus a per-byte charge, saturating.
pub fn gas_cost_with_bytes(base: u64, byte_count: usize) -> u64 {
    base.saturating_add((byte_count as u64).saturating_mul(G_PER_BYTE))
}

/// Cost of `printf` for a message of `msg_len` bytes.
pub fn gas_cost_printf(msg_len: usize) -> u64 {
    gas_cost_with_bytes(G_PRINTF, msg_len)
}

/// Cost of `set_call_output` for an output of `len` bytes.
pub fn gas_cost_set_call_output(len: usize) -> u64 {
    gas_cost_with_bytes(G_SET_CALL_OUTPUT, len)
}

/// Cost of `notify` for a payload of `len` bytes.
pub fn gas_cost_notify(len: usize) -> u64 {
    gas_cost_with_bytes(G_NOTIFY, len)
}

/// Cost of `call_contract` for an input of `input_len` bytes.
pub fn gas_cost_call_contract(input_len: usize) -> u64 {
    gas_cost_with_bytes(G_CALL_CONTRACT, input_len)
}
