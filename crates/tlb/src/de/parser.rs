use core::{fmt, mem};
use std::{borrow::Cow, sync::Arc};

use crate::{
    Cell, Error,
    bits::{
        bitvec::{order::Msb0, slice::BitSlice},
        de::BitReader,
        ser::BitWriter,
    },
    schema::SizeExt,
    ser::{CellBuilder, CellBuilderError, CellSerialize},
};

use super::{CellDeserialize, r#as::CellDeserializeAs};

/// [`Error`] for [`CellParser`]
pub type CellParserError<'de> = <CellParser<'de> as BitReader<'de>>::Error;

/// Cell parser created with [`Cell::parser()`].
///
/// Besides typed parsing, the parser is a cursor over the remaining bits and
/// references of the cell. Cursor methods never panic and return [`None`] or
/// `false` when the cell holds fewer bits or references than requested.
/// Clones are independent cursors over the same cell.
#[derive(Clone)]
pub struct CellParser<'de> {
    data: &'de BitSlice<u8, Msb0>,
    references: &'de [Arc<Cell>],
}

impl<'de> CellParser<'de> {
    #[inline]
    pub(crate) const fn new(data: &'de BitSlice<u8, Msb0>, references: &'de [Arc<Cell>]) -> Self {
        Self { data, references }
    }

    /// Parse the value with args using its [`CellDeserialize`]
    /// implementation.
    #[inline]
    pub fn parse<T>(&mut self, args: T::Args) -> Result<T, CellParserError<'de>>
    where
        T: CellDeserialize<'de>,
    {
        T::parse(self, args)
    }

    /// Parse value with args using an adapter.
    ///
    /// This approach is heavily inspired by
    /// [serde_with](https://docs.rs/serde_with/latest/serde_with).
    /// Please, read their docs for more usage examples.
    #[inline]
    pub fn parse_as<T, As>(&mut self, args: As::Args) -> Result<T, CellParserError<'de>>
    where
        As: CellDeserializeAs<'de, T> + ?Sized,
    {
        As::parse_as(self, args)
    }

    #[inline]
    pub(crate) fn pop_reference(&mut self) -> Result<&'de Arc<Cell>, CellParserError<'de>> {
        self.fetch_reference()
            .ok_or_else(|| Error::custom("no more references left"))
    }

    #[inline]
    pub(crate) fn parse_reference_as<T, As>(
        &mut self,
        args: As::Args,
    ) -> Result<T, CellParserError<'de>>
    where
        As: CellDeserializeAs<'de, T> + ?Sized,
    {
        self.pop_reference()?.parse_fully_as::<T, As>(args)
    }

    /// Remaining data bits
    #[inline]
    pub const fn data(&self) -> &'de BitSlice<u8, Msb0> {
        self.data
    }

    /// Remaining references
    #[inline]
    pub const fn references(&self) -> &'de [Arc<Cell>] {
        self.references
    }

    #[inline]
    pub fn bits_left(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn no_bits_left(&self) -> bool {
        self.bits_left() == 0
    }

    #[inline]
    pub const fn references_left(&self) -> usize {
        self.references.len()
    }

    #[inline]
    pub const fn no_references_left(&self) -> bool {
        self.references_left() == 0
    }

    /// Returns whether this parser has no more data and references.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.no_bits_left() && self.no_references_left()
    }

    /// Returns an error if this parser has more data or references.
    #[inline]
    pub fn ensure_empty(&self) -> Result<(), CellParserError<'de>> {
        if !self.is_empty() {
            return Err(Error::custom(format!(
                "more data left: {} bits, {} references",
                self.data.len(),
                self.references.len(),
            )));
        }
        Ok(())
    }

    /// Moves everything left into returned parser
    #[inline]
    pub fn take_rest(&mut self) -> Self {
        Self {
            data: mem::take(&mut self.data),
            references: mem::take(&mut self.references),
        }
    }

    /// Remaining bits and references
    #[inline]
    pub fn size_ext(&self) -> SizeExt {
        SizeExt::new(self.bits_left(), self.references_left())
    }

    #[inline]
    pub fn have(&self, bits: usize) -> bool {
        self.bits_left() >= bits
    }

    #[inline]
    pub fn have_refs(&self, refs: usize) -> bool {
        self.references_left() >= refs
    }

    #[inline]
    pub fn have_ext(&self, size: SizeExt) -> bool {
        self.have(size.bits()) && self.have_refs(size.refs())
    }

    #[inline]
    pub fn advance(&mut self, bits: usize) -> Option<()> {
        self.data = self.data.get(bits..)?;
        Some(())
    }

    #[inline]
    pub fn advance_refs(&mut self, refs: usize) -> Option<()> {
        self.references = self.references.get(refs..)?;
        Some(())
    }

    /// Advances by given bits and references at once, or not at all
    #[inline]
    pub fn advance_ext(&mut self, size: SizeExt) -> Option<()> {
        if !self.have_ext(size) {
            return None;
        }
        self.advance(size.bits())?;
        self.advance_refs(size.refs())
    }

    /// Reads up to 64 bits as big-endian unsigned integer without advancing
    #[inline]
    pub fn prefetch_uint(&self, bits: usize) -> Option<u64> {
        if bits > 64 {
            return None;
        }
        Some(
            self.data
                .get(..bits)?
                .iter()
                .by_vals()
                .fold(0, |acc, bit| (acc << 1) | u64::from(bit)),
        )
    }

    #[inline]
    pub fn fetch_uint(&mut self, bits: usize) -> Option<u64> {
        let v = self.prefetch_uint(bits)?;
        self.advance(bits)?;
        Some(v)
    }

    /// Reads up to 64 bits as big-endian two's complement integer without
    /// advancing
    #[inline]
    pub fn prefetch_int(&self, bits: usize) -> Option<i64> {
        let v = self.prefetch_uint(bits)?;
        if bits == 0 {
            return Some(0);
        }
        let shift = 64 - bits as u32;
        Some(((v << shift) as i64) >> shift)
    }

    #[inline]
    pub fn fetch_int(&mut self, bits: usize) -> Option<i64> {
        let v = self.prefetch_int(bits)?;
        self.advance(bits)?;
        Some(v)
    }

    /// `#<= upper`: reads a natural in `ceil(log2(upper + 1))` bits and
    /// fails if it exceeds `upper`
    #[inline]
    pub fn fetch_uint_leq(&mut self, upper: u64) -> Option<u64> {
        let v = self.fetch_uint((u64::BITS - upper.leading_zeros()) as usize)?;
        (v <= upper).then_some(v)
    }

    /// `#< upper`: reads a natural in `ceil(log2(upper))` bits and fails if
    /// it is not less than `upper`
    #[inline]
    pub fn fetch_uint_less(&mut self, upper: u64) -> Option<u64> {
        self.fetch_uint_leq(upper.checked_sub(1)?)
    }

    #[inline]
    pub fn prefetch_bits(&self, bits: usize) -> Option<&'de BitSlice<u8, Msb0>> {
        self.data.get(..bits)
    }

    #[inline]
    pub fn fetch_bits(&mut self, bits: usize) -> Option<&'de BitSlice<u8, Msb0>> {
        let v = self.prefetch_bits(bits)?;
        self.advance(bits)?;
        Some(v)
    }

    #[inline]
    pub fn prefetch_reference(&self) -> Option<&'de Arc<Cell>> {
        self.references.first()
    }

    #[inline]
    pub fn fetch_reference(&mut self) -> Option<&'de Arc<Cell>> {
        let (first, rest) = self.references.split_first()?;
        self.references = rest;
        Some(first)
    }

    /// Number of leading bits equal to `bit`
    #[inline]
    pub fn count_leading(&self, bit: bool) -> usize {
        if bit {
            self.data.leading_ones()
        } else {
            self.data.leading_zeros()
        }
    }

    /// Keeps only the part of this parser that precedes `tail`, where `tail`
    /// is this parser advanced further.
    #[inline]
    pub fn cut_tail(&mut self, tail: &Self) -> Option<()> {
        let bits = self.bits_left().checked_sub(tail.bits_left())?;
        let refs = self.references_left().checked_sub(tail.references_left())?;
        self.only_first(SizeExt::new(bits, refs))
    }

    /// Keeps only first bits and references
    #[inline]
    pub fn only_first(&mut self, size: SizeExt) -> Option<()> {
        self.data = self.data.get(..size.bits())?;
        self.references = self.references.get(..size.refs())?;
        Some(())
    }

    /// Whether both parsers have equal bits and references left
    #[inline]
    pub fn contents_equal(&self, other: &Self) -> bool {
        self.data == other.data && self.references == other.references
    }
}

impl<'de> BitReader<'de> for CellParser<'de> {
    type Error = <&'de BitSlice<u8, Msb0> as BitReader<'de>>::Error;

    #[inline]
    fn bits_left(&self) -> usize {
        self.data.len()
    }

    #[inline]
    fn read_bit(&mut self) -> Result<Option<bool>, Self::Error> {
        self.data.read_bit()
    }

    #[inline]
    fn read_bits_into(&mut self, dst: &mut BitSlice<u8, Msb0>) -> Result<(), Self::Error> {
        self.data.read_bits_into(dst)
    }

    #[inline]
    fn read_bits(&mut self, n: usize) -> Result<Cow<'de, BitSlice<u8, Msb0>>, Self::Error> {
        self.data.read_bits(n)
    }

    #[inline]
    fn skip(&mut self, n: usize) -> Result<(), Self::Error> {
        self.data.skip(n)
    }
}

impl<'de> CellDeserialize<'de> for CellParser<'de> {
    type Args = ();

    #[inline]
    fn parse(parser: &mut CellParser<'de>, _: Self::Args) -> Result<Self, CellParserError<'de>> {
        Ok(parser.take_rest())
    }
}

/// Stores the remaining bits and references
impl CellSerialize for CellParser<'_> {
    type Args = ();

    fn store(&self, builder: &mut CellBuilder, _: Self::Args) -> Result<(), CellBuilderError> {
        builder.write_bitslice(self.data)?;
        for r in self.references {
            builder.store_reference(r.clone())?;
        }
        Ok(())
    }
}

/// `x{HEX}` with `_` padding mark for incomplete bytes, then
/// references count
impl fmt::Debug for CellParser<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{{")?;
        for chunk in self.data.chunks(4) {
            let nibble = chunk
                .iter()
                .by_vals()
                .fold(0u8, |acc, bit| (acc << 1) | u8::from(bit));
            write!(f, "{:X}", nibble << (4 - chunk.len()))?;
        }
        if self.data.len() % 4 != 0 {
            write!(f, "_")?;
        }
        write!(f, "}}")?;
        if !self.references.is_empty() {
            write!(f, " +{}", self.references.len())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bitvec::bits;

    use crate::{bits::ser::BitWriterExt, r#as::Ref, ser::CellSerializeExt};

    use super::*;

    fn sample() -> Cell {
        let mut builder = Cell::builder();
        builder
            .pack(bits![u8, Msb0; 1, 0, 1, 1, 0, 0, 0, 1, 1, 1, 1, 1], ())
            .unwrap()
            .store_as::<_, Ref>((), ())
            .unwrap();
        builder.into_cell()
    }

    #[test]
    fn fetch_uint_int() {
        let cell = sample();
        let mut cs = cell.parser();
        assert_eq!(cs.prefetch_uint(4), Some(0b1011));
        assert_eq!(cs.fetch_int(4), Some(-5));
        assert_eq!(cs.fetch_uint(4), Some(0b0001));
        assert_eq!(cs.fetch_uint(5), None);
        assert_eq!(cs.bits_left(), 4);
        assert_eq!(cs.count_leading(true), 4);
    }

    #[test]
    fn bounded_naturals() {
        let cell = sample();
        // 0b101 = 5 in 3 bits
        assert_eq!(cell.parser().fetch_uint_leq(5), Some(5));
        assert_eq!(cell.parser().fetch_uint_leq(4), None);
        assert_eq!(cell.parser().fetch_uint_less(6), Some(5));
        assert_eq!(cell.parser().fetch_uint_less(5), None);
        assert_eq!(cell.parser().fetch_uint_less(0), None);
    }

    #[test]
    fn advance_ext_is_atomic() {
        let cell = sample();
        let mut cs = cell.parser();
        assert_eq!(cs.advance_ext(SizeExt::new(3, 2)), None);
        assert_eq!(cs.size_ext(), SizeExt::new(12, 1));
        assert_eq!(cs.advance_ext(SizeExt::new(3, 1)), Some(()));
        assert_eq!(cs.size_ext(), SizeExt::new(9, 0));
    }

    #[test]
    fn cut_tail() {
        let cell = sample();
        let mut head = cell.parser();
        let mut tail = head.clone();
        tail.advance(5).unwrap();
        tail.advance_refs(1).unwrap();
        head.cut_tail(&tail).unwrap();
        assert_eq!(head.size_ext(), SizeExt::new(5, 1));
        assert_eq!(format!("{head:?}"), "x{B0_} +1");
    }

    #[test]
    fn contents_equal() {
        let a = ().to_cell(()).unwrap();
        let cell = sample();
        let mut b = cell.parser();
        b.advance(12).unwrap();
        b.advance_refs(1).unwrap();
        assert!(a.parser().contents_equal(&b));
        assert!(!a.parser().contents_equal(&cell.parser()));
    }
}
