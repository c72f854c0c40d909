use num_bigint::{BigInt, Sign};

use crate::{de::CellParser, ser::CellBuilder};

use super::{
    Ops, PrettyPrinter, TlbType,
    basic::{fetch_bigint, fetch_biguint, leq_bits, store_bigint, store_biguint, store_uint, store_zeros},
};

/// Width of the `len:(#< n)` prefix
#[inline]
const fn len_bits(n: u32) -> u32 {
    leq_bits(n.saturating_sub(1) as u64)
}

/// Whether the top 9 bits of a signed value are all equal, i.e. its first
/// byte is redundant
#[inline]
fn redundant_sign_byte(cs: &CellParser<'_>) -> bool {
    matches!(cs.prefetch_int(9), Some(0 | -1))
}

/// Bytes needed for the magnitude of `value` in the given signedness
#[inline]
fn byte_len(value: &BigInt, signed: bool) -> u64 {
    let bits = if signed {
        match value.sign() {
            Sign::NoSign => 0,
            Sign::Plus => value.bits() + 1,
            Sign::Minus => (-value - 1u8).bits() + 1,
        }
    } else {
        value.bits()
    };
    bits.div_ceil(8)
}

/// ```tlb
/// var_uint$_ {n:#} len:(#< n) value:(uint (len * 8)) = VarUInteger n;
/// ```
///
/// Validation rejects a zero leading byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarUInteger {
    n: u32,
    ln: u32,
}

impl VarUInteger {
    #[inline]
    pub const fn new(n: u32) -> Self {
        Self { n, ln: len_bits(n) }
    }

    #[inline]
    pub const fn n(&self) -> u32 {
        self.n
    }

    /// Width of the length prefix
    #[inline]
    pub const fn len_bits(&self) -> u32 {
        self.ln
    }

    /// Fast path for values that fit in 64 bits
    pub fn as_uint(&self, cs: &CellParser<'_>) -> Option<u64> {
        let mut cs = cs.clone();
        let len = cs.fetch_uint(self.ln as usize)?;
        if len > 8 {
            return None;
        }
        cs.fetch_uint(len as usize * 8)
    }

    /// Fails on a length out of range or a zero leading byte
    fn fetch_len(&self, cs: &mut CellParser<'_>) -> Option<u32> {
        let len = cs.fetch_uint(self.ln as usize)? as u32;
        if len >= self.n || (len > 0 && cs.prefetch_uint(8)? == 0) {
            return None;
        }
        Some(len)
    }
}

impl TlbType for VarUInteger {
    #[inline]
    fn validate_skip(&self, _: &mut Ops, cs: &mut CellParser<'_>, _: bool) -> Option<()> {
        let len = self.fetch_len(cs)?;
        cs.advance(len as usize * 8)
    }

    #[inline]
    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        let len = cs.fetch_uint(self.ln as usize)?;
        if len >= u64::from(self.n) {
            return None;
        }
        cs.advance(len as usize * 8)
    }

    #[inline]
    fn as_integer_skip(&self, cs: &mut CellParser<'_>) -> Option<BigInt> {
        let len = self.fetch_len(cs)?;
        fetch_biguint(cs, len * 8).map(BigInt::from)
    }

    #[inline]
    fn null_value(&self, cb: &mut CellBuilder) -> Option<()> {
        store_zeros(cb, self.ln as usize)
    }

    fn store_integer_value(&self, cb: &mut CellBuilder, value: &BigInt) -> Option<()> {
        let value = value.to_biguint()?;
        let len = value.bits().div_ceil(8);
        if len >= u64::from(self.n) {
            return None;
        }
        store_uint(cb, len, self.ln)?;
        store_biguint(cb, &value, len as u32 * 8)
    }

    fn print_skip(&self, pp: &mut PrettyPrinter, cs: &mut CellParser<'_>) -> Option<()> {
        let v = self.as_integer_skip(cs)?;
        pp.out(v)
    }
}

/// [`VarUInteger`] that must be positive.
///
/// The relaxed flavour additionally stores zero as an empty value, for
/// arithmetic whose intermediate results may vanish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarUIntegerPos {
    n: u32,
    ln: u32,
    relaxed: bool,
}

impl VarUIntegerPos {
    #[inline]
    pub const fn new(n: u32) -> Self {
        Self {
            n,
            ln: len_bits(n),
            relaxed: false,
        }
    }

    #[inline]
    pub const fn relaxed(n: u32) -> Self {
        Self {
            relaxed: true,
            ..Self::new(n)
        }
    }

    #[inline]
    pub const fn is_relaxed(&self) -> bool {
        self.relaxed
    }

    /// Fast path for values that fit in 64 bits
    pub fn as_uint(&self, cs: &CellParser<'_>) -> Option<u64> {
        let mut cs = cs.clone();
        let len = cs.fetch_uint(self.ln as usize)?;
        if len == 0 || len > 8 || cs.prefetch_uint(8)? == 0 {
            return None;
        }
        cs.fetch_uint(len as usize * 8)
    }

    fn fetch_len(&self, cs: &mut CellParser<'_>) -> Option<u32> {
        let len = cs.fetch_uint(self.ln as usize)? as u32;
        if len == 0 || len >= self.n || cs.prefetch_uint(8)? == 0 {
            return None;
        }
        Some(len)
    }
}

impl TlbType for VarUIntegerPos {
    #[inline]
    fn validate_skip(&self, _: &mut Ops, cs: &mut CellParser<'_>, _: bool) -> Option<()> {
        let len = self.fetch_len(cs)?;
        cs.advance(len as usize * 8)
    }

    #[inline]
    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        let len = cs.fetch_uint(self.ln as usize)?;
        if len == 0 || len >= u64::from(self.n) {
            return None;
        }
        cs.advance(len as usize * 8)
    }

    #[inline]
    fn as_integer_skip(&self, cs: &mut CellParser<'_>) -> Option<BigInt> {
        let len = self.fetch_len(cs)?;
        fetch_biguint(cs, len * 8).map(BigInt::from)
    }

    fn store_integer_value(&self, cb: &mut CellBuilder, value: &BigInt) -> Option<()> {
        let value = value.to_biguint()?;
        let len = value.bits().div_ceil(8);
        if len >= u64::from(self.n) || (len == 0 && !self.relaxed) {
            return None;
        }
        store_uint(cb, len, self.ln)?;
        store_biguint(cb, &value, len as u32 * 8)
    }

    fn print_skip(&self, pp: &mut PrettyPrinter, cs: &mut CellParser<'_>) -> Option<()> {
        let v = self.as_integer_skip(cs)?;
        pp.out(v)
    }
}

/// ```tlb
/// var_int$_ {n:#} len:(#< n) value:(int (len * 8)) = VarInteger n;
/// ```
///
/// Validation rejects a redundant leading sign byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarInteger {
    n: u32,
    ln: u32,
}

impl VarInteger {
    #[inline]
    pub const fn new(n: u32) -> Self {
        Self { n, ln: len_bits(n) }
    }

    /// Fast path for values that fit in 64 bits
    pub fn as_int(&self, cs: &CellParser<'_>) -> Option<i64> {
        let mut cs = cs.clone();
        let len = cs.fetch_uint(self.ln as usize)?;
        if len > 8 {
            return None;
        }
        cs.fetch_int(len as usize * 8)
    }

    fn fetch_len(&self, cs: &mut CellParser<'_>) -> Option<u32> {
        let len = cs.fetch_uint(self.ln as usize)? as u32;
        if len >= self.n || (len > 0 && redundant_sign_byte(cs)) {
            return None;
        }
        Some(len)
    }
}

impl TlbType for VarInteger {
    #[inline]
    fn validate_skip(&self, _: &mut Ops, cs: &mut CellParser<'_>, _: bool) -> Option<()> {
        let len = self.fetch_len(cs)?;
        cs.advance(len as usize * 8)
    }

    #[inline]
    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        let len = cs.fetch_uint(self.ln as usize)?;
        if len >= u64::from(self.n) {
            return None;
        }
        cs.advance(len as usize * 8)
    }

    #[inline]
    fn as_integer_skip(&self, cs: &mut CellParser<'_>) -> Option<BigInt> {
        let len = self.fetch_len(cs)?;
        fetch_bigint(cs, len * 8)
    }

    #[inline]
    fn null_value(&self, cb: &mut CellBuilder) -> Option<()> {
        store_zeros(cb, self.ln as usize)
    }

    fn store_integer_value(&self, cb: &mut CellBuilder, value: &BigInt) -> Option<()> {
        let len = byte_len(value, true);
        if len >= u64::from(self.n) {
            return None;
        }
        store_uint(cb, len, self.ln)?;
        store_bigint(cb, value, len as u32 * 8)
    }

    fn print_skip(&self, pp: &mut PrettyPrinter, cs: &mut CellParser<'_>) -> Option<()> {
        let v = self.as_integer_skip(cs)?;
        pp.out(v)
    }
}

/// [`VarInteger`] that must be non-zero
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarIntegerNz {
    n: u32,
    ln: u32,
}

impl VarIntegerNz {
    #[inline]
    pub const fn new(n: u32) -> Self {
        Self { n, ln: len_bits(n) }
    }

    fn fetch_len(&self, cs: &mut CellParser<'_>) -> Option<u32> {
        let len = cs.fetch_uint(self.ln as usize)? as u32;
        if len == 0 || len >= self.n || redundant_sign_byte(cs) {
            return None;
        }
        Some(len)
    }
}

impl TlbType for VarIntegerNz {
    #[inline]
    fn validate_skip(&self, _: &mut Ops, cs: &mut CellParser<'_>, _: bool) -> Option<()> {
        let len = self.fetch_len(cs)?;
        cs.advance(len as usize * 8)
    }

    #[inline]
    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        let len = cs.fetch_uint(self.ln as usize)?;
        if len == 0 || len >= u64::from(self.n) {
            return None;
        }
        cs.advance(len as usize * 8)
    }

    #[inline]
    fn as_integer_skip(&self, cs: &mut CellParser<'_>) -> Option<BigInt> {
        let len = self.fetch_len(cs)?;
        fetch_bigint(cs, len * 8)
    }

    fn store_integer_value(&self, cb: &mut CellBuilder, value: &BigInt) -> Option<()> {
        let len = byte_len(value, true);
        if len == 0 || len >= u64::from(self.n) {
            return None;
        }
        store_uint(cb, len, self.ln)?;
        store_bigint(cb, value, len as u32 * 8)
    }

    fn print_skip(&self, pp: &mut PrettyPrinter, cs: &mut CellParser<'_>) -> Option<()> {
        let v = self.as_integer_skip(cs)?;
        pp.out(v)
    }
}

/// `nanograms$_ amount:(VarUInteger 16) = Grams;`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grams;

impl Grams {
    const INNER: VarUInteger = VarUInteger::new(16);

    #[inline]
    pub fn as_uint(&self, cs: &CellParser<'_>) -> Option<u64> {
        Self::INNER.as_uint(cs)
    }
}

impl TlbType for Grams {
    #[inline]
    fn validate_skip(&self, ops: &mut Ops, cs: &mut CellParser<'_>, weak: bool) -> Option<()> {
        Self::INNER.validate_skip(ops, cs, weak)
    }

    #[inline]
    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        Self::INNER.skip(cs)
    }

    #[inline]
    fn as_integer_skip(&self, cs: &mut CellParser<'_>) -> Option<BigInt> {
        Self::INNER.as_integer_skip(cs)
    }

    #[inline]
    fn null_value(&self, cb: &mut CellBuilder) -> Option<()> {
        Self::INNER.null_value(cb)
    }

    #[inline]
    fn store_integer_value(&self, cb: &mut CellBuilder, value: &BigInt) -> Option<()> {
        Self::INNER.store_integer_value(cb, value)
    }

    #[inline]
    fn print_skip(&self, pp: &mut PrettyPrinter, cs: &mut CellParser<'_>) -> Option<()> {
        Self::INNER.print_skip(pp, cs)
    }
}

#[cfg(test)]
mod tests {
    use bitvec::{bits, order::Msb0};
    use hex_literal::hex;
    use rstest::rstest;

    use crate::{
        Cell,
        bits::ser::BitWriterExt,
        schema::{Subtraction, TlbTypeExt},
    };

    use super::*;

    fn cell_of(bits: &bitvec::slice::BitSlice<u8, Msb0>) -> Cell {
        let mut b = Cell::builder();
        b.pack(bits, ()).unwrap();
        b.into_cell()
    }

    #[test]
    fn grams_129() {
        // len = 1 in 4 bits, then 0x81
        let cell = cell_of(bits![u8, Msb0; 0, 0, 0, 1, 1, 0, 0, 0, 0, 0, 0, 1]);
        let cs = cell.parser();
        assert!(Grams.validate_exact(&mut Ops::default(), &cs, false));
        assert_eq!(Grams.as_integer(&cs), Some(BigInt::from(129)));
        assert_eq!(Grams.as_uint(&cs), Some(129));
        assert_eq!(Grams.integer_cell(&BigInt::from(129)).unwrap(), cell);
    }

    #[rstest]
    #[case(0u64)]
    #[case(255)]
    #[case(256)]
    #[case(u64::MAX)]
    fn grams_store_parse(#[case] v: u64) {
        let cell = Grams.integer_cell(&BigInt::from(v)).unwrap();
        assert!(Grams.validate_cell(&cell, false));
        assert_eq!(Grams.as_integer(&cell.parser()), Some(BigInt::from(v)));
    }

    #[test]
    fn grams_max() {
        let max = BigInt::from_bytes_be(Sign::Plus, &[0xff; 15]);
        let cell = Grams.integer_cell(&max).unwrap();
        assert_eq!(Grams.as_integer(&cell.parser()), Some(max.clone()));
        assert!(Grams.integer_cell(&(max + 1)).is_none());
        assert!(Grams.integer_cell(&BigInt::from(-1)).is_none());
    }

    #[test]
    fn zero_leading_byte_passes_skip_but_not_validation() {
        // len = 2, bytes 0x00 0x81
        let mut b = Cell::builder();
        b.pack(bits![u8, Msb0; 0, 0, 1, 0], ())
            .unwrap()
            .pack(hex!("0081"), ())
            .unwrap();
        let cell = b.into_cell();
        let cs = cell.parser();
        assert_eq!(Grams.get_size(&cs).map(|s| s.bits()), Some(20));
        assert!(!Grams.validate(&mut Ops::default(), &cs, false));
        assert_eq!(Grams.as_integer(&cs), None);
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(-1)]
    #[case(127)]
    #[case(128)]
    #[case(-128)]
    #[case(-129)]
    fn var_integer_minimal(#[case] v: i64) {
        let t = VarInteger::new(32);
        let cell = t.integer_cell(&BigInt::from(v)).unwrap();
        assert!(t.validate_cell(&cell, false));
        assert_eq!(t.as_integer(&cell.parser()), Some(BigInt::from(v)));
        assert_eq!(t.as_int(&cell.parser()), Some(v));
    }

    #[test]
    fn var_integer_redundant_sign_byte() {
        // len = 2, bytes 0xff 0x80: -128 with a redundant 0xff
        let mut b = Cell::builder();
        b.pack(bits![u8, Msb0; 0, 0, 0, 1, 0], ())
            .unwrap()
            .pack(hex!("ff80"), ())
            .unwrap();
        let cell = b.into_cell();
        let t = VarInteger::new(32);
        assert!(t.get_size(&cell.parser()).is_some());
        assert!(!t.validate_cell(&cell, false));
    }

    #[test]
    fn nz_and_pos_reject_zero() {
        assert!(VarIntegerNz::new(16).integer_cell(&BigInt::from(0)).is_none());
        assert!(VarUIntegerPos::new(16).integer_cell(&BigInt::from(0)).is_none());
        let zero = VarUIntegerPos::relaxed(16).integer_cell(&BigInt::from(0)).unwrap();
        assert_eq!(zero.data, bits![u8, Msb0; 0, 0, 0, 0]);
        assert!(!VarUIntegerPos::new(16).validate_cell(&zero, false));
        assert!(VarUIntegerPos::new(16).null_cell().is_none());
    }

    #[test]
    fn arithmetic() {
        let a = Grams.integer_cell(&BigInt::from(1000)).unwrap();
        let b = Grams.integer_cell(&BigInt::from(24)).unwrap();

        let mut cb = Cell::builder();
        Grams
            .add_values(&mut cb, &mut a.parser(), &mut b.parser())
            .unwrap();
        assert_eq!(Grams.as_integer(&cb.into_cell().parser()), Some(1024.into()));

        let mut cb = Cell::builder();
        assert_eq!(
            Grams.sub_values(&mut cb, &mut a.parser(), &mut b.parser()),
            Subtraction::NonZero
        );
        assert_eq!(Grams.as_integer(&cb.into_cell().parser()), Some(976.into()));

        let mut cb = Cell::builder();
        assert_eq!(
            Grams.sub_values(&mut cb, &mut a.parser(), &mut a.parser()),
            Subtraction::Zero
        );
        let mut cb = Cell::builder();
        assert_eq!(
            Grams.sub_values(&mut cb, &mut b.parser(), &mut a.parser()),
            Subtraction::Invalid
        );
    }
}
