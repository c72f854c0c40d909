use num_bigint::{BigInt, BigUint};

use crate::{
    bits::{
        r#as::VarNBits,
        de::BitReaderExt,
        ser::{BitWriter, BitWriterExt},
    },
    de::CellParser,
    ser::CellBuilder,
};

use super::{Ops, PrettyPrinter, SizeExt, TlbType};

#[inline]
pub fn fetch_biguint(cs: &mut CellParser<'_>, bits: u32) -> Option<BigUint> {
    cs.unpack_as::<BigUint, VarNBits>(bits).ok()
}

#[inline]
pub fn fetch_bigint(cs: &mut CellParser<'_>, bits: u32) -> Option<BigInt> {
    cs.unpack_as::<BigInt, VarNBits>(bits).ok()
}

#[inline]
pub fn store_biguint(cb: &mut CellBuilder, value: &BigUint, bits: u32) -> Option<()> {
    cb.pack_as::<_, &VarNBits>(value, bits).ok()?;
    Some(())
}

#[inline]
pub fn store_bigint(cb: &mut CellBuilder, value: &BigInt, bits: u32) -> Option<()> {
    cb.pack_as::<_, &VarNBits>(value, bits).ok()?;
    Some(())
}

#[inline]
pub fn store_uint(cb: &mut CellBuilder, value: u64, bits: u32) -> Option<()> {
    cb.pack_as::<_, VarNBits>(value, bits).ok()?;
    Some(())
}

#[inline]
pub fn store_zeros(cb: &mut CellBuilder, bits: usize) -> Option<()> {
    cb.repeat_bit(bits, false).ok()
}

/// Width of `#<= upper`
#[inline]
pub(crate) const fn leq_bits(upper: u64) -> u32 {
    u64::BITS - upper.leading_zeros()
}

/// `int n`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Int(pub u32);

impl TlbType for Int {
    #[inline]
    fn validate_skip(&self, _: &mut Ops, cs: &mut CellParser<'_>, _: bool) -> Option<()> {
        self.skip(cs)
    }

    #[inline]
    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        cs.advance(self.0 as usize)
    }

    #[inline]
    fn get_size(&self, _: &CellParser<'_>) -> Option<SizeExt> {
        Some(SizeExt::bits_only(self.0 as usize))
    }

    #[inline]
    fn as_integer_skip(&self, cs: &mut CellParser<'_>) -> Option<BigInt> {
        fetch_bigint(cs, self.0)
    }

    #[inline]
    fn null_value(&self, cb: &mut CellBuilder) -> Option<()> {
        store_zeros(cb, self.0 as usize)
    }

    #[inline]
    fn store_integer_value(&self, cb: &mut CellBuilder, value: &BigInt) -> Option<()> {
        store_bigint(cb, value, self.0)
    }

    fn print_skip(&self, pp: &mut PrettyPrinter, cs: &mut CellParser<'_>) -> Option<()> {
        let v = self.as_integer_skip(cs)?;
        pp.out(v)
    }
}

/// `uint n`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UInt(pub u32);

impl TlbType for UInt {
    #[inline]
    fn validate_skip(&self, _: &mut Ops, cs: &mut CellParser<'_>, _: bool) -> Option<()> {
        self.skip(cs)
    }

    #[inline]
    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        cs.advance(self.0 as usize)
    }

    #[inline]
    fn get_size(&self, _: &CellParser<'_>) -> Option<SizeExt> {
        Some(SizeExt::bits_only(self.0 as usize))
    }

    #[inline]
    fn as_integer_skip(&self, cs: &mut CellParser<'_>) -> Option<BigInt> {
        fetch_biguint(cs, self.0).map(BigInt::from)
    }

    #[inline]
    fn null_value(&self, cb: &mut CellBuilder) -> Option<()> {
        store_zeros(cb, self.0 as usize)
    }

    #[inline]
    fn store_integer_value(&self, cb: &mut CellBuilder, value: &BigInt) -> Option<()> {
        store_biguint(cb, &value.to_biguint()?, self.0)
    }

    fn print_skip(&self, pp: &mut PrettyPrinter, cs: &mut CellParser<'_>) -> Option<()> {
        let v = self.as_integer_skip(cs)?;
        pp.out(v)
    }
}

/// `bits n`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bits(pub u32);

impl TlbType for Bits {
    #[inline]
    fn validate_skip(&self, _: &mut Ops, cs: &mut CellParser<'_>, _: bool) -> Option<()> {
        self.skip(cs)
    }

    #[inline]
    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        cs.advance(self.0 as usize)
    }

    #[inline]
    fn get_size(&self, _: &CellParser<'_>) -> Option<SizeExt> {
        Some(SizeExt::bits_only(self.0 as usize))
    }

    #[inline]
    fn null_value(&self, cb: &mut CellBuilder) -> Option<()> {
        store_zeros(cb, self.0 as usize)
    }

    fn print_skip(&self, pp: &mut PrettyPrinter, cs: &mut CellParser<'_>) -> Option<()> {
        let v = self.fetch(cs)?;
        pp.out(format_args!("{v:?}"))
    }
}

/// `## n`: natural in `n` bits, at most 64
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NatWidth(pub u32);

impl TlbType for NatWidth {
    #[inline]
    fn validate_skip(&self, _: &mut Ops, cs: &mut CellParser<'_>, _: bool) -> Option<()> {
        cs.fetch_uint(self.0 as usize).map(|_| ())
    }

    #[inline]
    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        cs.advance(self.0 as usize)
    }

    #[inline]
    fn get_size(&self, _: &CellParser<'_>) -> Option<SizeExt> {
        Some(SizeExt::bits_only(self.0 as usize))
    }

    #[inline]
    fn as_integer_skip(&self, cs: &mut CellParser<'_>) -> Option<BigInt> {
        cs.fetch_uint(self.0 as usize).map(BigInt::from)
    }

    #[inline]
    fn null_value(&self, cb: &mut CellBuilder) -> Option<()> {
        store_zeros(cb, self.0 as usize)
    }

    #[inline]
    fn store_integer_value(&self, cb: &mut CellBuilder, value: &BigInt) -> Option<()> {
        store_uint(cb, u64::try_from(value).ok()?, self.0)
    }

    fn print_skip(&self, pp: &mut PrettyPrinter, cs: &mut CellParser<'_>) -> Option<()> {
        let v = cs.fetch_uint(self.0 as usize)?;
        pp.out(v)
    }
}

/// `#< n`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NatLess {
    upper: u64,
    bits: u32,
}

impl NatLess {
    #[inline]
    pub const fn new(upper: u64) -> Self {
        Self {
            upper,
            bits: leq_bits(upper.saturating_sub(1)),
        }
    }

    #[inline]
    pub const fn bits(&self) -> u32 {
        self.bits
    }
}

impl TlbType for NatLess {
    #[inline]
    fn validate_skip(&self, _: &mut Ops, cs: &mut CellParser<'_>, _: bool) -> Option<()> {
        cs.fetch_uint_less(self.upper).map(|_| ())
    }

    #[inline]
    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        cs.advance(self.bits as usize)
    }

    #[inline]
    fn get_size(&self, _: &CellParser<'_>) -> Option<SizeExt> {
        Some(SizeExt::bits_only(self.bits as usize))
    }

    #[inline]
    fn as_integer_skip(&self, cs: &mut CellParser<'_>) -> Option<BigInt> {
        cs.fetch_uint_less(self.upper).map(BigInt::from)
    }

    #[inline]
    fn null_value(&self, cb: &mut CellBuilder) -> Option<()> {
        (self.upper > 0).then_some(())?;
        store_zeros(cb, self.bits as usize)
    }

    #[inline]
    fn store_integer_value(&self, cb: &mut CellBuilder, value: &BigInt) -> Option<()> {
        let v = u64::try_from(value).ok()?;
        (v < self.upper).then_some(())?;
        store_uint(cb, v, self.bits)
    }

    fn print_skip(&self, pp: &mut PrettyPrinter, cs: &mut CellParser<'_>) -> Option<()> {
        let v = cs.fetch_uint_less(self.upper)?;
        pp.out(v)
    }
}

/// `#<= n`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NatLeq {
    upper: u64,
    bits: u32,
}

impl NatLeq {
    #[inline]
    pub const fn new(upper: u64) -> Self {
        Self {
            upper,
            bits: leq_bits(upper),
        }
    }

    #[inline]
    pub const fn bits(&self) -> u32 {
        self.bits
    }
}

impl TlbType for NatLeq {
    #[inline]
    fn validate_skip(&self, _: &mut Ops, cs: &mut CellParser<'_>, _: bool) -> Option<()> {
        cs.fetch_uint_leq(self.upper).map(|_| ())
    }

    #[inline]
    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        cs.advance(self.bits as usize)
    }

    #[inline]
    fn get_size(&self, _: &CellParser<'_>) -> Option<SizeExt> {
        Some(SizeExt::bits_only(self.bits as usize))
    }

    #[inline]
    fn as_integer_skip(&self, cs: &mut CellParser<'_>) -> Option<BigInt> {
        cs.fetch_uint_leq(self.upper).map(BigInt::from)
    }

    #[inline]
    fn null_value(&self, cb: &mut CellBuilder) -> Option<()> {
        store_zeros(cb, self.bits as usize)
    }

    #[inline]
    fn store_integer_value(&self, cb: &mut CellBuilder, value: &BigInt) -> Option<()> {
        let v = u64::try_from(value).ok()?;
        (v <= self.upper).then_some(())?;
        store_uint(cb, v, self.bits)
    }

    fn print_skip(&self, pp: &mut PrettyPrinter, cs: &mut CellParser<'_>) -> Option<()> {
        let v = cs.fetch_uint_leq(self.upper)?;
        pp.out(v)
    }
}

/// ```tlb
/// bool_false$0 = Bool;
/// bool_true$1 = Bool;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bool;

impl TlbType for Bool {
    #[inline]
    fn validate_skip(&self, _: &mut Ops, cs: &mut CellParser<'_>, _: bool) -> Option<()> {
        self.skip(cs)
    }

    #[inline]
    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        cs.advance(1)
    }

    #[inline]
    fn get_size(&self, _: &CellParser<'_>) -> Option<SizeExt> {
        Some(SizeExt::bits_only(1))
    }

    #[inline]
    fn get_tag(&self, cs: &CellParser<'_>) -> Option<u32> {
        cs.prefetch_uint(1).map(|b| b as u32)
    }

    #[inline]
    fn as_integer_skip(&self, cs: &mut CellParser<'_>) -> Option<BigInt> {
        cs.fetch_uint(1).map(BigInt::from)
    }

    #[inline]
    fn null_value(&self, cb: &mut CellBuilder) -> Option<()> {
        store_zeros(cb, 1)
    }

    fn print_skip(&self, pp: &mut PrettyPrinter, cs: &mut CellParser<'_>) -> Option<()> {
        match cs.fetch_uint(1)? {
            0 => pp.out("bool_false"),
            _ => pp.out("bool_true"),
        }
    }
}

/// `true$_ = True;`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct True;

impl TlbType for True {
    #[inline]
    fn validate_skip(&self, _: &mut Ops, _: &mut CellParser<'_>, _: bool) -> Option<()> {
        Some(())
    }

    #[inline]
    fn skip(&self, _: &mut CellParser<'_>) -> Option<()> {
        Some(())
    }

    #[inline]
    fn get_size(&self, _: &CellParser<'_>) -> Option<SizeExt> {
        Some(SizeExt::default())
    }

    #[inline]
    fn null_value(&self, _: &mut CellBuilder) -> Option<()> {
        Some(())
    }

    fn print_skip(&self, pp: &mut PrettyPrinter, _: &mut CellParser<'_>) -> Option<()> {
        pp.out("true")
    }
}

/// `Cell` inlined: the rest of the slice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anything;

impl TlbType for Anything {
    #[inline]
    fn validate_skip(&self, _: &mut Ops, cs: &mut CellParser<'_>, _: bool) -> Option<()> {
        self.skip(cs)
    }

    #[inline]
    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        cs.take_rest();
        Some(())
    }

    #[inline]
    fn get_size(&self, cs: &CellParser<'_>) -> Option<SizeExt> {
        Some(cs.size_ext())
    }
}

/// `^Cell`: a reference to a cell with arbitrary contents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefAnything;

impl TlbType for RefAnything {
    #[inline]
    fn validate_skip(&self, _: &mut Ops, cs: &mut CellParser<'_>, _: bool) -> Option<()> {
        self.skip(cs)
    }

    #[inline]
    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        cs.advance_refs(1)
    }

    #[inline]
    fn get_size(&self, _: &CellParser<'_>) -> Option<SizeExt> {
        Some(SizeExt::new(0, 1))
    }

    fn print_skip(&self, pp: &mut PrettyPrinter, cs: &mut CellParser<'_>) -> Option<()> {
        let cell = cs.fetch_reference()?;
        pp.out(format_args!("^{:?}", cell.parser()))
    }
}

/// ```tlb
/// unary_zero$0 = Unary ~0;
/// unary_succ$1 {n:#} x:(Unary ~n) = Unary ~(n + 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unary;

impl Unary {
    /// Skips the value and returns `n`
    #[inline]
    pub fn skip_get(&self, cs: &mut CellParser<'_>) -> Option<usize> {
        let n = cs.count_leading(true);
        cs.advance(n + 1)?;
        Some(n)
    }
}

impl TlbType for Unary {
    #[inline]
    fn validate_skip(&self, _: &mut Ops, cs: &mut CellParser<'_>, _: bool) -> Option<()> {
        self.skip(cs)
    }

    #[inline]
    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        self.skip_get(cs).map(|_| ())
    }

    #[inline]
    fn get_size(&self, cs: &CellParser<'_>) -> Option<SizeExt> {
        let n = cs.count_leading(true);
        cs.have(n + 1).then(|| SizeExt::bits_only(n + 1))
    }

    #[inline]
    fn get_tag(&self, cs: &CellParser<'_>) -> Option<u32> {
        cs.prefetch_uint(1).map(|b| b as u32)
    }

    #[inline]
    fn as_integer_skip(&self, cs: &mut CellParser<'_>) -> Option<BigInt> {
        self.skip_get(cs).map(BigInt::from)
    }

    fn print_skip(&self, pp: &mut PrettyPrinter, cs: &mut CellParser<'_>) -> Option<()> {
        let n = self.skip_get(cs)?;
        pp.out(n)
    }
}

#[cfg(test)]
mod tests {
    use bitvec::{bits, order::Msb0};

    use crate::{Cell, bits::ser::BitWriterExt, schema::TlbTypeExt};

    use super::*;

    fn cell_of(bits: &bitvec::slice::BitSlice<u8, Msb0>) -> Cell {
        let mut b = Cell::builder();
        b.pack(bits, ()).unwrap();
        b.into_cell()
    }

    #[test]
    fn fixed_sizes() {
        let cell = cell_of(bits![u8, Msb0; 1; 16]);
        let cs = cell.parser();
        assert_eq!(UInt(8).get_size(&cs), Some(SizeExt::bits_only(8)));
        assert_eq!(True.get_size(&cs), Some(SizeExt::default()));
        assert_eq!(Anything.get_size(&cs), Some(SizeExt::bits_only(16)));
        assert_eq!(UInt(8).as_integer(&cs), None);
        assert_eq!(UInt(16).as_integer(&cs), Some(BigInt::from(0xffff)));
        assert_eq!(Int(16).as_integer(&cs), Some(BigInt::from(-1)));
    }

    #[test]
    fn bounded_naturals() {
        // 0b101 = 5
        let cell = cell_of(bits![u8, Msb0; 1, 0, 1]);
        let cs = cell.parser();
        assert!(NatLeq::new(5).validate_exact(&mut Ops::default(), &cs, false));
        assert!(!NatLeq::new(4).validate(&mut Ops::default(), &cs, false));
        assert!(NatLess::new(6).validate_exact(&mut Ops::default(), &cs, false));
        assert!(!NatLess::new(5).validate(&mut Ops::default(), &cs, false));
        // skip does not check the bound
        assert_eq!(NatLess::new(5).get_size(&cs), Some(SizeExt::bits_only(3)));
    }

    #[test]
    fn unary() {
        let cell = cell_of(bits![u8, Msb0; 1, 1, 1, 0, 1]);
        let mut cs = cell.parser();
        assert_eq!(Unary.get_size(&cs), Some(SizeExt::bits_only(4)));
        assert_eq!(Unary.skip_get(&mut cs), Some(3));
        assert_eq!(cs.bits_left(), 1);
        assert_eq!(Unary.get_size(&cs), None);
    }

    #[test]
    fn integer_store() {
        let cell = UInt(8).integer_cell(&BigInt::from(255)).unwrap();
        assert_eq!(cell.data, bits![u8, Msb0; 1; 8]);
        assert!(UInt(8).integer_cell(&BigInt::from(256)).is_none());
        assert!(UInt(8).integer_cell(&BigInt::from(-1)).is_none());
        assert!(Int(8).integer_cell(&BigInt::from(-128)).is_some());
        assert!(Int(8).integer_cell(&BigInt::from(128)).is_none());
        assert_eq!(UInt(3).null_cell().unwrap().data, bits![u8, Msb0; 0; 3]);
    }

    #[test]
    fn prints() {
        let cell = cell_of(bits![u8, Msb0; 0, 0, 0, 0, 0, 1, 0, 1]);
        assert_eq!(UInt(8).print_cell(&cell).unwrap(), "5");
        assert_eq!(Bits(8).print_cell(&cell).unwrap(), "x{05}");
        assert!(UInt(4).print_cell(&cell).is_err());
    }
}
