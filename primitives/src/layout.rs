//! Versioned binary layouts of the context struct as the guest sees it.
//!
//! The guest is wasm32: pointers and sizes are 4 bytes, `u64` fields are
//! 8-byte aligned, every value is little-endian and the struct size is
//! rounded up to 8. Three historical schemas exist:
//!
//! ```text
//! common prefix: height:u32 block_hash:ptr timestamp:u64 tx_hash:ptr
//!                self_address:ptr callers:ptr callers_num:size
//!                witness:ptr witness_num:size input:ptr input_len:size
//! V1: prefix + gas_left:u64 call_output:ptr call_output_len:size   (64 bytes)
//! V2: prefix + service:u64 gas_left:u64                            (64 bytes)
//! V3: prefix + service:u64 gas_left:u64 call_output:ptr
//!              call_output_len:size                                (72 bytes)
//! ```
//!
//! All schemas decode into one [`GuestContext`] record; fields a schema lacks
//! read as zero. [`translate`] converts an encoded struct between schemas.

use crate::error::InteropError;

/// A field of the guest-visible context struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Height,
    BlockHash,
    Timestamp,
    TxHash,
    SelfAddress,
    Callers,
    CallersNum,
    Witness,
    WitnessNum,
    Input,
    InputLen,
    Service,
    GasLeft,
    CallOutput,
    CallOutputLen,
}

impl Field {
    /// Width in bytes on wasm32.
    pub fn width(self) -> usize {
        match self {
            Self::Timestamp | Self::Service | Self::GasLeft => 8,
            _ => 4,
        }
    }
}

const PREFIX: [Field; 11] = [
    Field::Height,
    Field::BlockHash,
    Field::Timestamp,
    Field::TxHash,
    Field::SelfAddress,
    Field::Callers,
    Field::CallersNum,
    Field::Witness,
    Field::WitnessNum,
    Field::Input,
    Field::InputLen,
];

const V1_FIELDS: [Field; 14] = concat_fields(&[Field::GasLeft, Field::CallOutput, Field::CallOutputLen]);
const V2_FIELDS: [Field; 13] = concat_fields(&[Field::Service, Field::GasLeft]);
const V3_FIELDS: [Field; 15] = concat_fields(&[
    Field::Service,
    Field::GasLeft,
    Field::CallOutput,
    Field::CallOutputLen,
]);

const fn concat_fields<const N: usize>(tail: &[Field]) -> [Field; N] {
    let mut out = [Field::Height; N];
    let mut i = 0;
    while i < PREFIX.len() {
        out[i] = PREFIX[i];
        i += 1;
    }
    let mut j = 0;
    while j < tail.len() {
        out[i + j] = tail[j];
        j += 1;
    }
    out
}

/// A versioned context schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ContextSchema {
    /// Output and gas fields, no service handle.
    V1,
    /// Service handle and gas, no output fields.
    V2,
    /// Service handle, gas and output fields.
    #[default]
    V3,
}

impl ContextSchema {
    pub const ALL: [ContextSchema; 3] = [Self::V1, Self::V2, Self::V3];

    /// Fields in declaration order.
    pub fn fields(self) -> &'static [Field] {
        match self {
            Self::V1 => &V1_FIELDS,
            Self::V2 => &V2_FIELDS,
            Self::V3 => &V3_FIELDS,
        }
    }

    /// Byte offset of `field`, or `None` if the schema lacks it.
    pub fn offset_of(self, field: Field) -> Option<usize> {
        let mut offset = 0;
        for &f in self.fields() {
            offset = align_up(offset, f.width());
            if f == field {
                return Some(offset);
            }
            offset += f.width();
        }
        None
    }

    /// Total encoded size, padded to the struct alignment.
    pub fn size(self) -> usize {
        let end = self.fields().iter().fold(0, |offset, f| {
            align_up(offset, f.width()) + f.width()
        });
        align_up(end, 8)
    }

    pub fn has(self, field: Field) -> bool {
        self.fields().contains(&field)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::V1 => "v1",
            Self::V2 => "v2",
            Self::V3 => "v3",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }
}

fn align_up(offset: usize, align: usize) -> usize {
    (offset + align - 1) & !(align - 1)
}

/// Canonical record of the guest-visible context.
///
/// Pointer fields hold guest linear-memory offsets, not host addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GuestContext {
    pub height: u32,
    pub block_hash: u32,
    pub timestamp: u64,
    pub tx_hash: u32,
    pub self_address: u32,
    pub callers: u32,
    pub callers_num: u32,
    pub witness: u32,
    pub witness_num: u32,
    pub input: u32,
    pub input_len: u32,
    pub service: u64,
    pub gas_left: u64,
    pub call_output: u32,
    pub call_output_len: u32,
}

impl GuestContext {
    /// Read a field as a widened integer.
    pub fn get(&self, field: Field) -> u64 {
        match field {
            Field::Height => self.height as u64,
            Field::BlockHash => self.block_hash as u64,
            Field::Timestamp => self.timestamp,
            Field::TxHash => self.tx_hash as u64,
            Field::SelfAddress => self.self_address as u64,
            Field::Callers => self.callers as u64,
            Field::CallersNum => self.callers_num as u64,
            Field::Witness => self.witness as u64,
            Field::WitnessNum => self.witness_num as u64,
            Field::Input => self.input as u64,
            Field::InputLen => self.input_len as u64,
            Field::Service => self.service,
            Field::GasLeft => self.gas_left,
            Field::CallOutput => self.call_output as u64,
            Field::CallOutputLen => self.call_output_len as u64,
        }
    }

    /// Set a field; 4-byte fields keep the low 32 bits.
    pub fn set(&mut self, field: Field, value: u64) {
        let narrow = value as u32;
        match field {
            Field::Height => self.height = narrow,
            Field::BlockHash => self.block_hash = narrow,
            Field::Timestamp => self.timestamp = value,
            Field::TxHash => self.tx_hash = narrow,
            Field::SelfAddress => self.self_address = narrow,
            Field::Callers => self.callers = narrow,
            Field::CallersNum => self.callers_num = narrow,
            Field::Witness => self.witness = narrow,
            Field::WitnessNum => self.witness_num = narrow,
            Field::Input => self.input = narrow,
            Field::InputLen => self.input_len = narrow,
            Field::Service => self.service = value,
            Field::GasLeft => self.gas_left = value,
            Field::CallOutput => self.call_output = narrow,
            Field::CallOutputLen => self.call_output_len = narrow,
        }
    }

    /// Encode in `schema`. Fields the schema lacks are dropped.
    pub fn encode(&self, schema: ContextSchema) -> Vec<u8> {
        let mut buf = vec![0u8; schema.size()];
        let mut offset = 0;
        for &field in schema.fields() {
            offset = align_up(offset, field.width());
            let value = self.get(field);
            match field.width() {
                8 => buf[offset..offset + 8].copy_from_slice(&value.to_le_bytes()),
                _ => buf[offset..offset + 4].copy_from_slice(&(value as u32).to_le_bytes()),
            }
            offset += field.width();
        }
        buf
    }

    /// Decode from `schema`. Fields the schema lacks are zero.
    pub fn decode(bytes: &[u8], schema: ContextSchema) -> Result<Self, InteropError> {
        if bytes.len() < schema.size() {
            return Err(InteropError::out_of_bounds(format!(
                "context {} needs {} bytes, got {}",
                schema.name(),
                schema.size(),
                bytes.len()
            )));
        }
        let mut ctx = GuestContext::default();
        let mut offset = 0;
        for &field in schema.fields() {
            offset = align_up(offset, field.width());
            let value = match field.width() {
                8 => {
                    let mut raw = [0u8; 8];
                    raw.copy_from_slice(&bytes[offset..offset + 8]);
                    u64::from_le_bytes(raw)
                }
                _ => {
                    let mut raw = [0u8; 4];
                    raw.copy_from_slice(&bytes[offset..offset + 4]);
                    u32::from_le_bytes(raw) as u64
                }
            };
            ctx.set(field, value);
            offset += field.width();
        }
        Ok(ctx)
    }
}

/// Re-encode a context struct from one schema into another.
pub fn translate(
    bytes: &[u8],
    from: ContextSchema,
    to: ContextSchema,
) -> Result<Vec<u8>, InteropError> {
    Ok(GuestContext::decode(bytes, from)?.encode(to))
}
