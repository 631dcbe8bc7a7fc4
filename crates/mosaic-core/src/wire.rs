//! Little-endian wire codec for packed payloads.
//!
//! All integers are little-endian. Sequences and strings are prefixed with
//! a `u32` length. There is no alignment padding and no self-describing
//! schema: the reader must know what it is reading, which the
//! [`WireType`] carried alongside every storage and transfer descriptor
//! makes explicit.
//!
//! Values either implement [`Wire`] directly, or are serialized through an
//! explicit [`Codec`] value passed to `pack`/`unpack`. [`WireCodec`] bridges
//! the two.

use crate::error::WireError;
use crate::id::{ObjectId, PartitionId, Rank};

// ── Wire datatype descriptor ────────────────────────────────────

/// Datatype of the elements in a packed payload.
///
/// Derived deterministically from a storage's kind and carried by both the
/// storage and every transfer descriptor built for it, so pack and unpack
/// always agree on the element layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WireType {
    /// Fixed-width little-endian `i32` per cell.
    Int32,
    /// Fixed-width little-endian `f64` per cell.
    Float64,
    /// Codec-encoded values paired with an integer location.
    Object,
    /// Codec-encoded values paired with a real-valued location.
    LocatedObject,
}

impl WireType {
    /// Bytes per element for fixed-width types, `None` for codec-encoded ones.
    pub fn fixed_width(self) -> Option<usize> {
        match self {
            Self::Int32 => Some(4),
            Self::Float64 => Some(8),
            Self::Object | Self::LocatedObject => None,
        }
    }

    fn tag(self) -> u8 {
        match self {
            Self::Int32 => 0,
            Self::Float64 => 1,
            Self::Object => 2,
            Self::LocatedObject => 3,
        }
    }

    fn from_tag(tag: u8) -> Result<Self, WireError> {
        match tag {
            0 => Ok(Self::Int32),
            1 => Ok(Self::Float64),
            2 => Ok(Self::Object),
            3 => Ok(Self::LocatedObject),
            other => Err(WireError::Malformed {
                detail: format!("unknown wire type tag {other}"),
            }),
        }
    }
}

// ── Traits ──────────────────────────────────────────────────────

/// A type with a canonical binary encoding.
pub trait Wire: Sized {
    /// Append the encoding of `self` to `out`.
    fn encode(&self, out: &mut Vec<u8>);

    /// Decode one value from the front of `input`, advancing it.
    fn decode(input: &mut &[u8]) -> Result<Self, WireError>;
}

/// An explicit serializer for values of type `T`.
///
/// Storages and collectives take a codec parameter instead of requiring
/// `T: Wire`, so callers can ship the same element type with different
/// encodings (for example a compact encoding for halo refresh).
pub trait Codec<T> {
    /// Append the encoding of `value` to `out`.
    fn encode(&self, value: &T, out: &mut Vec<u8>);

    /// Decode one value from the front of `input`, advancing it.
    fn decode(&self, input: &mut &[u8]) -> Result<T, WireError>;
}

/// The codec that uses a type's own [`Wire`] implementation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WireCodec;

impl<T: Wire> Codec<T> for WireCodec {
    fn encode(&self, value: &T, out: &mut Vec<u8>) {
        value.encode(out);
    }

    fn decode(&self, input: &mut &[u8]) -> Result<T, WireError> {
        T::decode(input)
    }
}

// ── Primitive writers ───────────────────────────────────────────

/// Write a single byte.
pub fn put_u8(out: &mut Vec<u8>, v: u8) {
    out.push(v);
}

/// Write a little-endian u32.
pub fn put_u32_le(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

/// Write a little-endian u64.
pub fn put_u64_le(out: &mut Vec<u8>, v: u64) {
    out.extend_from_slice(&v.to_le_bytes());
}

/// Write a little-endian i32.
pub fn put_i32_le(out: &mut Vec<u8>, v: i32) {
    out.extend_from_slice(&v.to_le_bytes());
}

/// Write a little-endian f64.
pub fn put_f64_le(out: &mut Vec<u8>, v: f64) {
    out.extend_from_slice(&v.to_le_bytes());
}

/// Write a length-prefixed byte array (u32 length + bytes).
pub fn put_bytes(out: &mut Vec<u8>, b: &[u8]) {
    put_u32_le(out, b.len() as u32);
    out.extend_from_slice(b);
}

// ── Primitive readers ───────────────────────────────────────────

/// Split `n` bytes off the front of `input`.
pub fn take<'a>(input: &mut &'a [u8], n: usize) -> Result<&'a [u8], WireError> {
    let whole: &'a [u8] = *input;
    if whole.len() < n {
        return Err(WireError::Truncated {
            needed: n,
            remaining: whole.len(),
        });
    }
    let (head, tail) = whole.split_at(n);
    *input = tail;
    Ok(head)
}

fn take_array<const N: usize>(input: &mut &[u8]) -> Result<[u8; N], WireError> {
    let mut buf = [0u8; N];
    buf.copy_from_slice(take(input, N)?);
    Ok(buf)
}

/// Read a single byte.
pub fn take_u8(input: &mut &[u8]) -> Result<u8, WireError> {
    Ok(take_array::<1>(input)?[0])
}

/// Read a little-endian u32.
pub fn take_u32_le(input: &mut &[u8]) -> Result<u32, WireError> {
    Ok(u32::from_le_bytes(take_array(input)?))
}

/// Read a little-endian u64.
pub fn take_u64_le(input: &mut &[u8]) -> Result<u64, WireError> {
    Ok(u64::from_le_bytes(take_array(input)?))
}

/// Read a little-endian i32.
pub fn take_i32_le(input: &mut &[u8]) -> Result<i32, WireError> {
    Ok(i32::from_le_bytes(take_array(input)?))
}

/// Read a little-endian f64.
pub fn take_f64_le(input: &mut &[u8]) -> Result<f64, WireError> {
    Ok(f64::from_le_bytes(take_array(input)?))
}

/// Read a `u32` length prefix and check it against the remaining input,
/// assuming each element occupies at least `min_elem` bytes.
pub fn take_len(input: &mut &[u8], min_elem: usize) -> Result<usize, WireError> {
    let len = take_u32_le(input)? as usize;
    if len.saturating_mul(min_elem) > input.len() {
        return Err(WireError::LengthOverflow { len: len as u64 });
    }
    Ok(len)
}

/// Read a length-prefixed byte array.
pub fn take_bytes<'a>(input: &mut &'a [u8]) -> Result<&'a [u8], WireError> {
    let len = take_len(input, 1)?;
    take(input, len)
}

// ── Wire impls ──────────────────────────────────────────────────

impl Wire for u8 {
    fn encode(&self, out: &mut Vec<u8>) {
        put_u8(out, *self);
    }
    fn decode(input: &mut &[u8]) -> Result<Self, WireError> {
        take_u8(input)
    }
}

impl Wire for bool {
    fn encode(&self, out: &mut Vec<u8>) {
        put_u8(out, u8::from(*self));
    }
    fn decode(input: &mut &[u8]) -> Result<Self, WireError> {
        match take_u8(input)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(WireError::Malformed {
                detail: format!("invalid bool byte {other}"),
            }),
        }
    }
}

impl Wire for u32 {
    fn encode(&self, out: &mut Vec<u8>) {
        put_u32_le(out, *self);
    }
    fn decode(input: &mut &[u8]) -> Result<Self, WireError> {
        take_u32_le(input)
    }
}

impl Wire for u64 {
    fn encode(&self, out: &mut Vec<u8>) {
        put_u64_le(out, *self);
    }
    fn decode(input: &mut &[u8]) -> Result<Self, WireError> {
        take_u64_le(input)
    }
}

impl Wire for i32 {
    fn encode(&self, out: &mut Vec<u8>) {
        put_i32_le(out, *self);
    }
    fn decode(input: &mut &[u8]) -> Result<Self, WireError> {
        take_i32_le(input)
    }
}

impl Wire for i64 {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
    fn decode(input: &mut &[u8]) -> Result<Self, WireError> {
        Ok(i64::from_le_bytes(take_array(input)?))
    }
}

impl Wire for f64 {
    fn encode(&self, out: &mut Vec<u8>) {
        put_f64_le(out, *self);
    }
    fn decode(input: &mut &[u8]) -> Result<Self, WireError> {
        take_f64_le(input)
    }
}

impl Wire for String {
    fn encode(&self, out: &mut Vec<u8>) {
        put_bytes(out, self.as_bytes());
    }
    fn decode(input: &mut &[u8]) -> Result<Self, WireError> {
        let bytes = take_bytes(input)?;
        String::from_utf8(bytes.to_vec()).map_err(|e| WireError::Malformed {
            detail: format!("invalid UTF-8: {e}"),
        })
    }
}

impl<T: Wire> Wire for Vec<T> {
    fn encode(&self, out: &mut Vec<u8>) {
        put_u32_le(out, self.len() as u32);
        for v in self {
            v.encode(out);
        }
    }
    fn decode(input: &mut &[u8]) -> Result<Self, WireError> {
        let len = take_len(input, 1)?;
        let mut v = Vec::with_capacity(len);
        for _ in 0..len {
            v.push(T::decode(input)?);
        }
        Ok(v)
    }
}

impl<T: Wire> Wire for Option<T> {
    fn encode(&self, out: &mut Vec<u8>) {
        match self {
            None => put_u8(out, 0),
            Some(v) => {
                put_u8(out, 1);
                v.encode(out);
            }
        }
    }
    fn decode(input: &mut &[u8]) -> Result<Self, WireError> {
        match take_u8(input)? {
            0 => Ok(None),
            1 => Ok(Some(T::decode(input)?)),
            other => Err(WireError::Malformed {
                detail: format!("invalid option tag {other}"),
            }),
        }
    }
}

impl<A: Wire, B: Wire> Wire for (A, B) {
    fn encode(&self, out: &mut Vec<u8>) {
        self.0.encode(out);
        self.1.encode(out);
    }
    fn decode(input: &mut &[u8]) -> Result<Self, WireError> {
        let a = A::decode(input)?;
        let b = B::decode(input)?;
        Ok((a, b))
    }
}

impl Wire for ObjectId {
    fn encode(&self, out: &mut Vec<u8>) {
        put_u64_le(out, self.0);
    }
    fn decode(input: &mut &[u8]) -> Result<Self, WireError> {
        Ok(Self(take_u64_le(input)?))
    }
}

impl Wire for Rank {
    fn encode(&self, out: &mut Vec<u8>) {
        put_u32_le(out, self.0);
    }
    fn decode(input: &mut &[u8]) -> Result<Self, WireError> {
        Ok(Self(take_u32_le(input)?))
    }
}

impl Wire for PartitionId {
    fn encode(&self, out: &mut Vec<u8>) {
        put_u32_le(out, self.0);
    }
    fn decode(input: &mut &[u8]) -> Result<Self, WireError> {
        Ok(Self(take_u32_le(input)?))
    }
}

impl Wire for WireType {
    fn encode(&self, out: &mut Vec<u8>) {
        put_u8(out, self.tag());
    }
    fn decode(input: &mut &[u8]) -> Result<Self, WireError> {
        Self::from_tag(take_u8(input)?)
    }
}
