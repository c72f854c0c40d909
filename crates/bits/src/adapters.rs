//! Adapters for [`BitReader`]/[`BitWriter`]
use std::borrow::Cow;

use bitvec::{order::Msb0, slice::BitSlice};
use impl_tools::autoimpl;

use crate::{Error, de::BitReader, ser::BitWriter};

/// Adapter returned by [`.limit()`](crate::ser::BitWriterExt::limit)
#[autoimpl(Deref using self.inner)]
#[derive(Debug, Clone)]
pub struct LimitWriter<W> {
    inner: BitCounter<W>,
    limit: usize,
}

impl<W> LimitWriter<W>
where
    W: BitWriter,
{
    #[inline]
    pub const fn new(writer: W, limit: usize) -> Self {
        Self {
            inner: BitCounter::new(writer),
            limit,
        }
    }

    #[inline]
    fn ensure_more(&self, n: usize) -> Result<(), W::Error> {
        if self.capacity_left() < n {
            return Err(Error::custom("max bits limit reached"));
        }
        Ok(())
    }

    #[inline]
    pub fn into_inner(self) -> W {
        self.inner.into_inner()
    }
}

impl<W> BitWriter for LimitWriter<W>
where
    W: BitWriter,
{
    type Error = W::Error;

    #[inline]
    fn capacity_left(&self) -> usize {
        (self.limit - self.bit_count()).min(self.inner.capacity_left())
    }

    #[inline]
    fn write_bit(&mut self, bit: bool) -> Result<(), Self::Error> {
        self.ensure_more(1)?;
        self.inner.write_bit(bit)
    }

    #[inline]
    fn write_bitslice(&mut self, bits: &BitSlice<u8, Msb0>) -> Result<(), Self::Error> {
        self.ensure_more(bits.len())?;
        self.inner.write_bitslice(bits)
    }

    #[inline]
    fn repeat_bit(&mut self, n: usize, bit: bool) -> Result<(), Self::Error> {
        self.ensure_more(n)?;
        self.inner.repeat_bit(n, bit)
    }
}

/// Adapter for counting the number of bits read/written.
#[autoimpl(Deref using self.inner)]
#[derive(Debug, Clone)]
pub struct BitCounter<T> {
    inner: T,
    counter: usize,
}

impl<T> BitCounter<T> {
    #[inline]
    pub const fn new(inner: T) -> Self {
        Self { inner, counter: 0 }
    }

    /// Return total number of recorded bits
    #[inline]
    pub const fn bit_count(&self) -> usize {
        self.counter
    }

    #[inline]
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<'de, R> BitReader<'de> for BitCounter<R>
where
    R: BitReader<'de>,
{
    type Error = R::Error;

    #[inline]
    fn bits_left(&self) -> usize {
        self.inner.bits_left()
    }

    #[inline]
    fn read_bit(&mut self) -> Result<Option<bool>, Self::Error> {
        let bit = self.inner.read_bit()?;
        if bit.is_some() {
            self.counter += 1;
        }
        Ok(bit)
    }

    #[inline]
    fn read_bits_into(&mut self, dst: &mut BitSlice<u8, Msb0>) -> Result<(), Self::Error> {
        self.inner.read_bits_into(dst)?;
        self.counter += dst.len();
        Ok(())
    }

    #[inline]
    fn read_bits(&mut self, n: usize) -> Result<Cow<'de, BitSlice<u8, Msb0>>, Self::Error> {
        let v = self.inner.read_bits(n)?;
        self.counter += v.len();
        Ok(v)
    }

    #[inline]
    fn skip(&mut self, n: usize) -> Result<(), Self::Error> {
        self.inner.skip(n)?;
        self.counter += n;
        Ok(())
    }
}

impl<W> BitWriter for BitCounter<W>
where
    W: BitWriter,
{
    type Error = W::Error;

    #[inline]
    fn capacity_left(&self) -> usize {
        self.inner.capacity_left()
    }

    #[inline]
    fn write_bit(&mut self, bit: bool) -> Result<(), Self::Error> {
        self.inner.write_bit(bit)?;
        self.counter += 1;
        Ok(())
    }

    #[inline]
    fn write_bitslice(&mut self, bits: &BitSlice<u8, Msb0>) -> Result<(), Self::Error> {
        self.inner.write_bitslice(bits)?;
        self.counter += bits.len();
        Ok(())
    }

    #[inline]
    fn repeat_bit(&mut self, n: usize, bit: bool) -> Result<(), Self::Error> {
        self.inner.repeat_bit(n, bit)?;
        self.counter += n;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bitvec::{bits, vec::BitVec};

    use crate::ser::BitWriterExt;

    use super::*;

    #[test]
    fn limit_rejects_overflow() {
        let mut w = BitVec::<u8, Msb0>::new().limit(3);
        w.write_bitslice(bits![u8, Msb0; 1, 0]).unwrap();
        assert_eq!(w.capacity_left(), 1);
        assert!(w.write_bitslice(bits![u8, Msb0; 1, 1]).is_err());
        w.write_bit(true).unwrap();
        assert_eq!(w.into_inner(), bits![u8, Msb0; 1, 0, 1]);
    }

    #[test]
    fn counter_tracks_reads() {
        let data = bits![u8, Msb0; 1, 0, 1, 1, 0];
        let mut r = BitCounter::new(data);
        r.skip(2).unwrap();
        r.read_bit().unwrap();
        assert_eq!(r.bit_count(), 3);
        assert_eq!(r.bits_left(), 2);
    }
}
