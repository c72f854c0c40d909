use core::mem;

use bitvec::{
    mem::bits_of,
    order::Msb0,
    view::{AsBits, AsMutBits},
};

use crate::{
    Error,
    r#as::VarNBits,
    de::{BitReader, BitReaderExt, BitUnpack, r#as::BitUnpackAs},
    ser::{BitPack, BitWriter, r#as::BitPackAs},
};

macro_rules! impl_bit_serde_for_integers {
    ($($t:tt)+) => {$(
        impl BitPack for $t {
            type Args = ();

            #[inline]
            fn pack<W>(&self, writer: &mut W, _: Self::Args) -> Result<(), W::Error>
            where
                W: BitWriter + ?Sized,
            {
                writer.write_bitslice(self.to_be_bytes().as_bits())
            }
        }

        impl<'de> BitUnpack<'de> for $t {
            type Args = ();

            #[inline]
            fn unpack<R>(reader: &mut R, _: Self::Args) -> Result<Self, R::Error>
            where
                R: BitReader<'de> + ?Sized,
            {
                reader.read_bytes_array().map(Self::from_be_bytes)
            }
        }
    )+};
}
impl_bit_serde_for_integers! {
    u8 u16 u32 u64 u128 usize
    i8 i16 i32 i64 i128 isize
}

macro_rules! impl_var_nbits_for_uints {
    ($($t:tt)+) => {$(
        impl BitPackAs<$t> for VarNBits {
            /// number of bits
            type Args = u32;

            #[inline]
            fn pack_as<W>(source: &$t, writer: &mut W, num_bits: Self::Args) -> Result<(), W::Error>
            where
                W: BitWriter + ?Sized,
            {
                const BITS_SIZE: usize = bits_of::<$t>();
                let num_bits = num_bits as usize;
                if num_bits > BITS_SIZE {
                    return Err(Error::custom("excessive bits for type"));
                }
                if num_bits < BITS_SIZE - source.leading_zeros() as usize {
                    return Err(Error::custom(
                        format!("{source:#b} cannot be packed into {num_bits} bits"),
                    ));
                }
                let bytes = source.to_be_bytes();
                let bits = bytes.as_bits::<Msb0>();
                writer.write_bitslice(&bits[BITS_SIZE - num_bits..])
            }
        }

        impl<'de> BitUnpackAs<'de, $t> for VarNBits {
            /// number of bits
            type Args = u32;

            #[inline]
            fn unpack_as<R>(reader: &mut R, num_bits: Self::Args) -> Result<$t, R::Error>
            where
                R: BitReader<'de> + ?Sized,
            {
                const BITS_SIZE: usize = bits_of::<$t>();
                let num_bits = num_bits as usize;
                if num_bits > BITS_SIZE {
                    return Err(Error::custom("excessive bits for type"));
                }
                let mut arr = [0u8; mem::size_of::<$t>()];
                reader.read_bits_into(&mut arr.as_mut_bits()[BITS_SIZE - num_bits..])?;
                Ok($t::from_be_bytes(arr))
            }
        }
    )+};
}
impl_var_nbits_for_uints! {
    u8 u16 u32 u64 u128 usize
}

macro_rules! impl_var_nbits_for_ints {
    ($($t:tt:$u:tt)+) => {$(
        impl BitPackAs<$t> for VarNBits {
            /// number of bits
            type Args = u32;

            #[inline]
            fn pack_as<W>(source: &$t, writer: &mut W, num_bits: Self::Args) -> Result<(), W::Error>
            where
                W: BitWriter + ?Sized,
            {
                const BITS_SIZE: u32 = bits_of::<$t>() as u32;
                if num_bits > BITS_SIZE {
                    return Err(Error::custom("excessive bits for type"));
                }
                if num_bits == 0 {
                    if *source != 0 {
                        return Err(Error::custom(format!("{source} cannot be packed into 0 bits")));
                    }
                    return Ok(());
                }
                let shift = BITS_SIZE - num_bits;
                if (*source << shift) >> shift != *source {
                    return Err(Error::custom(
                        format!("{source} cannot be packed into {num_bits} signed bits"),
                    ));
                }
                let bytes = source.to_be_bytes();
                let bits = bytes.as_bits::<Msb0>();
                writer.write_bitslice(&bits[shift as usize..])
            }
        }

        impl<'de> BitUnpackAs<'de, $t> for VarNBits {
            /// number of bits
            type Args = u32;

            #[inline]
            fn unpack_as<R>(reader: &mut R, num_bits: Self::Args) -> Result<$t, R::Error>
            where
                R: BitReader<'de> + ?Sized,
            {
                const BITS_SIZE: u32 = bits_of::<$t>() as u32;
                let v: $u = reader.unpack_as::<_, VarNBits>(num_bits)?;
                if num_bits == 0 {
                    return Ok(0);
                }
                let shift = BITS_SIZE - num_bits;
                // sign extension
                Ok(((v as $t) << shift) >> shift)
            }
        }
    )+};
}
impl_var_nbits_for_ints! {
    i8:u8 i16:u16 i32:u32 i64:u64 i128:u128 isize:usize
}

#[cfg(test)]
mod tests {
    use bitvec::{bits, order::Msb0};
    use rstest::rstest;

    use crate::{
        r#as::NBits,
        ser::{pack, pack_as},
        tests::{assert_pack_unpack_as_eq, assert_pack_unpack_eq},
    };

    #[test]
    fn store_uint() {
        assert_eq!(
            pack(0xFD_FE_u16, ()).unwrap(),
            bits![u8, Msb0; 1, 1, 1, 1, 1, 1, 0, 1, 1, 1, 1, 1, 1, 1, 1, 0],
        )
    }

    #[test]
    fn serde_uint() {
        assert_eq!(assert_pack_unpack_eq(12345_u32, ()).len(), 32);
    }

    #[test]
    fn nbits_one_bit() {
        assert_eq!(
            pack_as::<_, NBits<1>>(0b1u8, ()).unwrap(),
            pack(true, ()).unwrap()
        )
    }

    #[test]
    fn store_nbits_same_uint() {
        const N: u8 = 231;
        assert_eq!(pack(N, ()).unwrap(), pack_as::<_, NBits<8>>(N, ()).unwrap())
    }

    #[test]
    fn serde_nbits_uint() {
        assert_eq!(assert_pack_unpack_as_eq::<u8, NBits<7>>(0x7E, ()).len(), 7);
    }

    #[test]
    fn nbits_uint_overflow() {
        assert!(pack_as::<_, NBits<7>>(0x80u8, ()).is_err());
    }

    #[test]
    fn store_nbits_negative() {
        assert_eq!(
            pack_as::<_, NBits<3>>(-1i32, ()).unwrap(),
            bits![u8, Msb0; 1, 1, 1],
        )
    }

    #[rstest]
    #[case(-4)]
    #[case(3)]
    #[case(0)]
    fn serde_nbits_int(#[case] v: i8) {
        assert_eq!(assert_pack_unpack_as_eq::<i8, NBits<3>>(v, ()).len(), 3);
    }

    #[test]
    fn nbits_int_overflow() {
        assert!(pack_as::<_, NBits<3>>(4i8, ()).is_err());
        assert!(pack_as::<_, NBits<3>>(-5i8, ()).is_err());
    }
}
