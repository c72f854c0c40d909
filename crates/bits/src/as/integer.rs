use bitvec::{order::Msb0, vec::BitVec, view::AsBits};
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, Zero};

use crate::{
    Error,
    de::{BitReader, BitReaderExt, r#as::BitUnpackAs},
    ser::{BitWriter, BitWriterExt, r#as::BitPackAs},
};

/// Adapter to **de**/**ser**ialize integer into exactly `BITS` bits.
/// ```tlb
/// uint$_ {n:#} = uint n;
/// int$_ {n:#} = int n;
/// ```
/// See [`VarNBits`] for *dynamic* version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NBits<const BITS: usize>;

/// Adapter to **de**/**ser**ialize integer into number of bits given in args.
/// See [`NBits`] for *constant* version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarNBits;

impl<T, const BITS: usize> BitPackAs<T> for NBits<BITS>
where
    VarNBits: BitPackAs<T, Args = u32>,
{
    type Args = ();

    #[inline]
    fn pack_as<W>(source: &T, writer: &mut W, _: Self::Args) -> Result<(), W::Error>
    where
        W: BitWriter + ?Sized,
    {
        VarNBits::pack_as(source, writer, BITS as u32)
    }
}

impl<'de, T, const BITS: usize> BitUnpackAs<'de, T> for NBits<BITS>
where
    VarNBits: BitUnpackAs<'de, T, Args = u32>,
{
    type Args = ();

    #[inline]
    fn unpack_as<R>(reader: &mut R, _: Self::Args) -> Result<T, R::Error>
    where
        R: BitReader<'de> + ?Sized,
    {
        VarNBits::unpack_as(reader, BITS as u32)
    }
}

impl BitPackAs<BigUint> for VarNBits {
    /// number of bits
    type Args = u32;

    #[inline]
    fn pack_as<W>(source: &BigUint, writer: &mut W, num_bits: Self::Args) -> Result<(), W::Error>
    where
        W: BitWriter + ?Sized,
    {
        let num_bits = num_bits as usize;
        let used_bits = source.bits() as usize;
        if num_bits < used_bits {
            return Err(Error::custom(format!(
                "{source:#b} cannot be packed into {num_bits} bits"
            )));
        }

        writer.repeat_bit(num_bits - used_bits, false)?;

        let bytes = source.to_bytes_be();
        let bits = bytes.as_bits::<Msb0>();
        writer.write_bitslice(&bits[bits.len() - used_bits..])?;
        Ok(())
    }
}

impl<'de> BitUnpackAs<'de, BigUint> for VarNBits {
    /// number of bits
    type Args = u32;

    #[inline]
    fn unpack_as<R>(reader: &mut R, num_bits: Self::Args) -> Result<BigUint, R::Error>
    where
        R: BitReader<'de> + ?Sized,
    {
        let num_bits = num_bits as usize;
        let padded = (num_bits + 7) & !7;
        let mut bits: BitVec<u8, Msb0> = BitVec::repeat(false, padded - num_bits);
        bits.extend_from_bitslice(&reader.read_bits(num_bits)?);
        Ok(BigUint::from_bytes_be(bits.as_raw_slice()))
    }
}

impl BitPackAs<BigInt> for VarNBits {
    /// number of bits
    type Args = u32;

    #[inline]
    fn pack_as<W>(source: &BigInt, writer: &mut W, num_bits: Self::Args) -> Result<(), W::Error>
    where
        W: BitWriter + ?Sized,
    {
        if num_bits == 0 {
            if !source.is_zero() {
                return Err(Error::custom(format!(
                    "{source} cannot be packed into 0 bits"
                )));
            }
            return Ok(());
        }
        let bound = BigInt::one() << (num_bits - 1);
        if *source < -&bound || *source >= bound {
            return Err(Error::custom(format!(
                "{source} cannot be packed into {num_bits} signed bits"
            )));
        }
        // two's complement
        let unsigned = match source.sign() {
            Sign::Minus => (BigInt::one() << num_bits) + source,
            _ => source.clone(),
        };
        let unsigned = unsigned
            .to_biguint()
            .ok_or_else(|| Error::custom("negative after two's complement"))?;
        writer.pack_as::<_, &VarNBits>(&unsigned, num_bits)?;
        Ok(())
    }
}

impl<'de> BitUnpackAs<'de, BigInt> for VarNBits {
    /// number of bits
    type Args = u32;

    #[inline]
    fn unpack_as<R>(reader: &mut R, num_bits: Self::Args) -> Result<BigInt, R::Error>
    where
        R: BitReader<'de> + ?Sized,
    {
        let unsigned: BigUint = reader.unpack_as::<_, VarNBits>(num_bits)?;
        let v = BigInt::from(unsigned);
        if num_bits > 0 && v.bit(u64::from(num_bits - 1)) {
            return Ok(v - (BigInt::one() << num_bits));
        }
        Ok(v)
    }
}

/// Adapter for [`Var[U]Integer n`](https://docs.ton.org/develop/data-formats/msg-tlb#varuinteger-n)
/// where the length prefix occupies `BITS_FOR_BYTES_LEN` bits.
///
/// ```tlb
/// var_uint$_ {n:#} len:(#< n) value:(uint (len * 8)) = VarUInteger n;
/// var_int$_ {n:#} len:(#< n) value:(int (len * 8)) = VarInteger n;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarInt<const BITS_FOR_BYTES_LEN: usize>;

impl<const BITS_FOR_BYTES_LEN: usize> VarInt<BITS_FOR_BYTES_LEN> {
    fn check_len<E: Error>(len: usize) -> Result<(), E> {
        if len >= 1 << BITS_FOR_BYTES_LEN {
            return Err(Error::custom(format!(
                "{len} bytes cannot be prefixed with {BITS_FOR_BYTES_LEN} bits"
            )));
        }
        Ok(())
    }
}

impl<const BITS_FOR_BYTES_LEN: usize> BitPackAs<BigUint> for VarInt<BITS_FOR_BYTES_LEN> {
    type Args = ();

    #[inline]
    fn pack_as<W>(source: &BigUint, writer: &mut W, _: Self::Args) -> Result<(), W::Error>
    where
        W: BitWriter + ?Sized,
    {
        let len = source.bits().div_ceil(8) as usize;
        Self::check_len(len)?;
        writer
            .pack_as::<_, VarNBits>(len as u32, BITS_FOR_BYTES_LEN as u32)?
            .pack_as::<_, &VarNBits>(source, len as u32 * 8)?;
        Ok(())
    }
}

impl<'de, const BITS_FOR_BYTES_LEN: usize> BitUnpackAs<'de, BigUint>
    for VarInt<BITS_FOR_BYTES_LEN>
{
    type Args = ();

    #[inline]
    fn unpack_as<R>(reader: &mut R, _: Self::Args) -> Result<BigUint, R::Error>
    where
        R: BitReader<'de> + ?Sized,
    {
        let len: u32 = reader.unpack_as::<_, VarNBits>(BITS_FOR_BYTES_LEN as u32)?;
        reader.unpack_as::<_, VarNBits>(len * 8)
    }
}

impl<const BITS_FOR_BYTES_LEN: usize> BitPackAs<BigInt> for VarInt<BITS_FOR_BYTES_LEN> {
    type Args = ();

    #[inline]
    fn pack_as<W>(source: &BigInt, writer: &mut W, _: Self::Args) -> Result<(), W::Error>
    where
        W: BitWriter + ?Sized,
    {
        let len = if source.is_zero() {
            0
        } else {
            source.to_signed_bytes_be().len()
        };
        Self::check_len(len)?;
        writer
            .pack_as::<_, VarNBits>(len as u32, BITS_FOR_BYTES_LEN as u32)?
            .pack_as::<_, &VarNBits>(source, len as u32 * 8)?;
        Ok(())
    }
}

impl<'de, const BITS_FOR_BYTES_LEN: usize> BitUnpackAs<'de, BigInt> for VarInt<BITS_FOR_BYTES_LEN> {
    type Args = ();

    #[inline]
    fn unpack_as<R>(reader: &mut R, _: Self::Args) -> Result<BigInt, R::Error>
    where
        R: BitReader<'de> + ?Sized,
    {
        let len: u32 = reader.unpack_as::<_, VarNBits>(BITS_FOR_BYTES_LEN as u32)?;
        reader.unpack_as::<_, VarNBits>(len * 8)
    }
}

#[cfg(test)]
mod tests {
    use bitvec::bits;
    use rstest::rstest;

    use crate::{ser::pack_as, tests::assert_pack_unpack_as_eq};

    use super::*;

    #[test]
    fn store_nbits_uint() {
        assert_eq!(
            pack_as::<_, NBits<7>>(0x7Eu8, ()).unwrap(),
            bits![u8, Msb0; 1, 1, 1, 1, 1, 1, 0],
        )
    }

    #[test]
    fn serde_big_nbits() {
        assert_pack_unpack_as_eq::<BigUint, NBits<100>>(12345_u64.into(), ());
    }

    #[rstest]
    #[case(-1)]
    #[case(-128)]
    #[case(127)]
    #[case(0)]
    fn serde_big_signed_nbits(#[case] v: i64) {
        assert_pack_unpack_as_eq::<BigInt, NBits<8>>(v.into(), ());
    }

    #[test]
    fn big_signed_out_of_range() {
        assert!(pack_as::<_, NBits<8>>(BigInt::from(128), ()).is_err());
        assert!(pack_as::<_, NBits<8>>(BigInt::from(-129), ()).is_err());
    }

    #[test]
    fn var_uint_layout() {
        // len = 2 in 4 bits, then 0x0100
        assert_eq!(
            pack_as::<_, VarInt<4>>(BigUint::from(256u32), ()).unwrap(),
            bits![u8, Msb0; 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0],
        );
    }

    #[rstest]
    #[case(0)]
    #[case(-129)]
    #[case(1_000_000)]
    fn serde_var_int(#[case] v: i64) {
        assert_pack_unpack_as_eq::<BigInt, VarInt<5>>(v.into(), ());
    }
}
