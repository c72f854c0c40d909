use std::borrow::Cow;

use bitvec::{order::Msb0, slice::BitSlice, vec::BitVec, view::AsMutBits};
use impl_tools::autoimpl;

use crate::{Error, StringError};

use super::{BitUnpack, r#as::BitUnpackAs};

/// Bitwise reader.
///
/// All methods except [`.read_bit()`](BitReader::read_bit) fail when the
/// reader holds fewer bits than requested.
#[autoimpl(for <R: trait + ?Sized> &mut R, Box<R>)]
pub trait BitReader<'de> {
    /// An error ocurred while reading
    type Error: Error;

    /// Returns number of bits left
    fn bits_left(&self) -> usize;

    /// Reads a single bit or returns `None` if there is nothing left
    fn read_bit(&mut self) -> Result<Option<bool>, Self::Error>;

    /// Reads exactly `dst.len()` bits into `dst`.
    #[inline]
    fn read_bits_into(&mut self, dst: &mut BitSlice<u8, Msb0>) -> Result<(), Self::Error> {
        if self.bits_left() < dst.len() {
            return Err(Error::custom("EOF"));
        }
        for mut bit in dst.iter_mut() {
            *bit = self.read_bit()?.ok_or_else(|| Error::custom("EOF"))?;
        }
        Ok(())
    }

    /// Reads exactly `n` bits, borrowing them when possible.
    #[inline]
    fn read_bits(&mut self, n: usize) -> Result<Cow<'de, BitSlice<u8, Msb0>>, Self::Error> {
        let mut dst = BitVec::repeat(false, n);
        self.read_bits_into(&mut dst)?;
        Ok(Cow::Owned(dst))
    }

    /// Skips exactly `n` bits.
    #[inline]
    fn skip(&mut self, n: usize) -> Result<(), Self::Error> {
        if self.bits_left() < n {
            return Err(Error::custom("EOF"));
        }
        for _ in 0..n {
            self.read_bit()?;
        }
        Ok(())
    }
}

/// Extension helper for [`BitReader`].
pub trait BitReaderExt<'de>: BitReader<'de> {
    /// Reads exactly `N` bytes
    #[inline]
    fn read_bytes_array<const N: usize>(&mut self) -> Result<[u8; N], Self::Error> {
        let mut arr = [0; N];
        self.read_bits_into(arr.as_mut_bits())?;
        Ok(arr)
    }

    /// Unpack value with args using its [`BitUnpack`] implementation
    #[inline]
    fn unpack<T>(&mut self, args: T::Args) -> Result<T, Self::Error>
    where
        T: BitUnpack<'de>,
    {
        T::unpack(self, args)
    }

    /// Unpack value with args using an adapter.
    /// See [`as`](crate::as) module-level documentation for more.
    #[inline]
    fn unpack_as<T, As>(&mut self, args: As::Args) -> Result<T, Self::Error>
    where
        As: BitUnpackAs<'de, T> + ?Sized,
    {
        As::unpack_as(self, args)
    }
}
impl<'de, R> BitReaderExt<'de> for R where R: BitReader<'de> + ?Sized {}

impl<'de> BitReader<'de> for &'de BitSlice<u8, Msb0> {
    type Error = StringError;

    #[inline]
    fn bits_left(&self) -> usize {
        self.len()
    }

    #[inline]
    fn read_bit(&mut self) -> Result<Option<bool>, Self::Error> {
        let this: &'de BitSlice<u8, Msb0> = *self;
        let Some((bit, rest)) = this.split_first() else {
            return Ok(None);
        };
        let bit = *bit;
        *self = rest;
        Ok(Some(bit))
    }

    #[inline]
    fn read_bits_into(&mut self, dst: &mut BitSlice<u8, Msb0>) -> Result<(), Self::Error> {
        let v = self.read_bits(dst.len())?;
        dst.copy_from_bitslice(&v);
        Ok(())
    }

    #[inline]
    fn read_bits(&mut self, n: usize) -> Result<Cow<'de, BitSlice<u8, Msb0>>, Self::Error> {
        let this: &'de BitSlice<u8, Msb0> = *self;
        if this.len() < n {
            return Err(Error::custom("EOF"));
        }
        let (v, rest) = this.split_at(n);
        *self = rest;
        Ok(Cow::Borrowed(v))
    }

    #[inline]
    fn skip(&mut self, n: usize) -> Result<(), Self::Error> {
        self.read_bits(n).map(|_| ())
    }
}
