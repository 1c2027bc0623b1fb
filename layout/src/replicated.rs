//! Value codecs for replicated properties and RPC arguments.

use bitstream::{BitError, BitReader, BitResult, BitWriter};

use crate::error::{LayoutError, LayoutResult};

/// Maximum encoded length of a replicated `String`, in bytes.
pub const MAX_STRING_BYTES: usize = 4096;

/// Maximum number of elements in a replicated `Vec`.
pub const MAX_LIST_LEN: usize = 1024;

/// Shape of a replicated value, as recorded in layout manifests.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueKind {
    /// No data.
    Unit,
    /// One bit.
    Bool,
    /// Fixed-width unsigned integer.
    UInt { bits: u8 },
    /// Fixed-width two's complement integer.
    SInt { bits: u8 },
    /// IEEE 754 float, stored as its raw bits.
    Float { bits: u8 },
    /// Byte-aligned, length-prefixed UTF-8.
    Str,
    /// Byte-aligned, length-prefixed sequence.
    List(Box<ValueKind>),
    /// Fields written back to back.
    Tuple(Vec<ValueKind>),
}

/// A value that can be written to and read from a bitstream.
///
/// Both peers must agree on the encoding, so implementations must be
/// deterministic: `read` consumes exactly what `write` produced.
pub trait Replicated: Sized {
    /// Shape of the encoding.
    fn kind() -> ValueKind;

    /// Writes the value.
    fn write(&self, out: &mut BitWriter) -> BitResult<()>;

    /// Reads a value.
    fn read(input: &mut BitReader<'_>) -> BitResult<Self>;
}

impl Replicated for () {
    fn kind() -> ValueKind {
        ValueKind::Unit
    }

    fn write(&self, _out: &mut BitWriter) -> BitResult<()> {
        Ok(())
    }

    fn read(_input: &mut BitReader<'_>) -> BitResult<Self> {
        Ok(())
    }
}

impl Replicated for bool {
    fn kind() -> ValueKind {
        ValueKind::Bool
    }

    fn write(&self, out: &mut BitWriter) -> BitResult<()> {
        out.write_bool(*self);
        Ok(())
    }

    fn read(input: &mut BitReader<'_>) -> BitResult<Self> {
        input.read_bool()
    }
}

macro_rules! impl_unsigned {
    ($($ty:ty => $bits:expr),* $(,)?) => {$(
        impl Replicated for $ty {
            fn kind() -> ValueKind {
                ValueKind::UInt { bits: $bits }
            }

            fn write(&self, out: &mut BitWriter) -> BitResult<()> {
                out.write_bits(u64::from(*self), $bits)
            }

            fn read(input: &mut BitReader<'_>) -> BitResult<Self> {
                let raw = input.read_bits($bits)?;
                <$ty>::try_from(raw).map_err(|_| BitError::ValueOutOfRange {
                    value: raw,
                    bits: $bits,
                })
            }
        }
    )*};
}

macro_rules! impl_signed {
    ($($ty:ty as $unsigned:ty => $bits:expr),* $(,)?) => {$(
        impl Replicated for $ty {
            fn kind() -> ValueKind {
                ValueKind::SInt { bits: $bits }
            }

            fn write(&self, out: &mut BitWriter) -> BitResult<()> {
                out.write_bits(u64::from(*self as $unsigned), $bits)
            }

            fn read(input: &mut BitReader<'_>) -> BitResult<Self> {
                let raw = input.read_bits($bits)?;
                let unsigned = <$unsigned>::try_from(raw).map_err(|_| {
                    BitError::ValueOutOfRange {
                        value: raw,
                        bits: $bits,
                    }
                })?;
                Ok(unsigned as $ty)
            }
        }
    )*};
}

impl_unsigned!(u8 => 8, u16 => 16, u32 => 32, u64 => 64);
impl_signed!(i8 as u8 => 8, i16 as u16 => 16, i32 as u32 => 32, i64 as u64 => 64);

impl Replicated for f32 {
    fn kind() -> ValueKind {
        ValueKind::Float { bits: 32 }
    }

    fn write(&self, out: &mut BitWriter) -> BitResult<()> {
        self.to_bits().write(out)
    }

    fn read(input: &mut BitReader<'_>) -> BitResult<Self> {
        u32::read(input).map(Self::from_bits)
    }
}

impl Replicated for f64 {
    fn kind() -> ValueKind {
        ValueKind::Float { bits: 64 }
    }

    fn write(&self, out: &mut BitWriter) -> BitResult<()> {
        self.to_bits().write(out)
    }

    fn read(input: &mut BitReader<'_>) -> BitResult<Self> {
        u64::read(input).map(Self::from_bits)
    }
}

impl Replicated for String {
    fn kind() -> ValueKind {
        ValueKind::Str
    }

    fn write(&self, out: &mut BitWriter) -> BitResult<()> {
        if self.len() > MAX_STRING_BYTES {
            return Err(BitError::LengthLimitExceeded {
                len: self.len(),
                limit: MAX_STRING_BYTES,
            });
        }
        out.align_to_byte();
        out.write_bytes(self.as_bytes())
    }

    fn read(input: &mut BitReader<'_>) -> BitResult<Self> {
        input.align_to_byte()?;
        let bytes = input.read_bytes(MAX_STRING_BYTES)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| BitError::InvalidUtf8)
    }
}

impl<T: Replicated> Replicated for Vec<T> {
    fn kind() -> ValueKind {
        ValueKind::List(Box::new(T::kind()))
    }

    fn write(&self, out: &mut BitWriter) -> BitResult<()> {
        if self.len() > MAX_LIST_LEN {
            return Err(BitError::LengthLimitExceeded {
                len: self.len(),
                limit: MAX_LIST_LEN,
            });
        }
        out.align_to_byte();
        // Bounded by MAX_LIST_LEN above.
        out.write_varu32(self.len() as u32)?;
        for item in self {
            item.write(out)?;
        }
        Ok(())
    }

    fn read(input: &mut BitReader<'_>) -> BitResult<Self> {
        input.align_to_byte()?;
        let len = input.read_varu32()? as usize;
        if len > MAX_LIST_LEN {
            return Err(BitError::LengthLimitExceeded {
                len,
                limit: MAX_LIST_LEN,
            });
        }
        let mut items = Vec::with_capacity(len.min(input.bits_remaining()));
        for _ in 0..len {
            items.push(T::read(input)?);
        }
        Ok(items)
    }
}

macro_rules! impl_tuple {
    ($($name:ident),+) => {
        impl<$($name: Replicated),+> Replicated for ($($name,)+) {
            fn kind() -> ValueKind {
                ValueKind::Tuple(vec![$($name::kind()),+])
            }

            #[allow(non_snake_case)]
            fn write(&self, out: &mut BitWriter) -> BitResult<()> {
                let ($($name,)+) = self;
                $($name.write(out)?;)+
                Ok(())
            }

            fn read(input: &mut BitReader<'_>) -> BitResult<Self> {
                Ok(($($name::read(input)?,)+))
            }
        }
    };
}

impl_tuple!(A, B);
impl_tuple!(A, B, C);
impl_tuple!(A, B, C, D);

/// Encodes a single value into a standalone payload.
pub fn encode_value<T: Replicated>(value: &T) -> BitResult<Vec<u8>> {
    let mut out = BitWriter::new();
    value.write(&mut out)?;
    Ok(out.finish())
}

/// Decodes a payload produced by [`encode_value`].
///
/// Padding bits in the final byte are ignored; any further bytes are an error.
pub fn decode_value<T: Replicated>(payload: &[u8]) -> LayoutResult<T> {
    let mut input = BitReader::new(payload);
    let value = T::read(&mut input)?;
    let remaining = input.whole_bytes_remaining();
    if remaining > 0 {
        return Err(LayoutError::TrailingPayload { remaining });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_is_one_bit() {
        let mut out = BitWriter::new();
        true.write(&mut out).unwrap();
        assert_eq!(out.bits_written(), 1);
    }

    #[test]
    fn signed_values_keep_sign() {
        for value in [i16::MIN, -1, 0, 1, i16::MAX] {
            assert_eq!(decode_value::<i16>(&encode_value(&value).unwrap()).unwrap(), value);
        }
    }

    #[test]
    fn floats_roundtrip_bit_exact() {
        let value = -0.0f32;
        let decoded: f32 = decode_value(&encode_value(&value).unwrap()).unwrap();
        assert_eq!(decoded.to_bits(), value.to_bits());

        let nan = f64::NAN;
        let decoded: f64 = decode_value(&encode_value(&nan).unwrap()).unwrap();
        assert!(decoded.is_nan());
    }

    #[test]
    fn string_after_bool_is_realigned() {
        let value = (true, String::from("hello"));
        let bytes = encode_value(&value).unwrap();
        // 1 bit padded to a byte, 1 length byte, 5 bytes of text
        assert_eq!(bytes.len(), 7);
        assert_eq!(decode_value::<(bool, String)>(&bytes).unwrap(), value);
    }

    #[test]
    fn oversized_string_is_rejected_on_write() {
        let value = "x".repeat(MAX_STRING_BYTES + 1);
        assert!(matches!(
            encode_value(&value),
            Err(BitError::LengthLimitExceeded { .. })
        ));
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let err = decode_value::<String>(&[2, 0xC3, 0x28]).unwrap_err();
        assert_eq!(err, LayoutError::Decode(BitError::InvalidUtf8));
    }

    #[test]
    fn list_length_is_bounded_before_allocation() {
        // varint 100_000
        let err = decode_value::<Vec<u8>>(&[0xA0, 0x8D, 0x06]).unwrap_err();
        assert!(matches!(
            err,
            LayoutError::Decode(BitError::LengthLimitExceeded { len: 100_000, .. })
        ));
    }

    #[test]
    fn list_roundtrip() {
        let value = vec![3u16, 1, 4, 1, 5];
        assert_eq!(decode_value::<Vec<u16>>(&encode_value(&value).unwrap()).unwrap(), value);
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let err = decode_value::<u8>(&[1, 2]).unwrap_err();
        assert_eq!(err, LayoutError::TrailingPayload { remaining: 1 });
    }

    #[test]
    fn unit_payload_is_empty() {
        assert!(encode_value(&()).unwrap().is_empty());
        decode_value::<()>(&[]).unwrap();
    }

    #[test]
    fn kinds_describe_nesting() {
        assert_eq!(
            <Vec<(u8, bool)>>::kind(),
            ValueKind::List(Box::new(ValueKind::Tuple(vec![
                ValueKind::UInt { bits: 8 },
                ValueKind::Bool
            ])))
        );
    }
}
