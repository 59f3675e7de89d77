//! Little-endian field reads at explicit payload offsets

use crate::{JammonError, Result};

/// Trait for fixed-width values that can be read from a payload.
///
/// Every read is bounds checked; a payload that ends before the field does
/// yields [`JammonError::Truncated`] instead of a panic.
pub trait LeField: Sized {
    /// Width of the field on the wire, in bytes.
    const WIDTH: usize;

    /// Parse this type from `payload` at `offset`.
    fn read_le(payload: &[u8], offset: usize) -> Result<Self>;
}

macro_rules! impl_le_field {
    ($($ty:ty),* $(,)?) => {
        $(
            impl LeField for $ty {
                const WIDTH: usize = std::mem::size_of::<$ty>();

                fn read_le(payload: &[u8], offset: usize) -> Result<Self> {
                    let bytes = take::<{ std::mem::size_of::<$ty>() }>(payload, offset)?;
                    Ok(<$ty>::from_le_bytes(bytes))
                }
            }
        )*
    };
}

impl_le_field!(u8, i8, u16, i16, u32, i32);

/// Read a field of type `T` at `offset`.
pub fn read<T: LeField>(payload: &[u8], offset: usize) -> Result<T> {
    T::read_le(payload, offset)
}

/// Copy `N` raw bytes starting at `offset`.
pub fn take<const N: usize>(payload: &[u8], offset: usize) -> Result<[u8; N]> {
    offset
        .checked_add(N)
        .and_then(|end| payload.get(offset..end))
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(JammonError::Truncated {
            offset,
            needed: N,
            available: payload.len().saturating_sub(offset),
        })
}
