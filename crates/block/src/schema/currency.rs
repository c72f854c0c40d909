use num_bigint::BigInt;
use tlb::{de::CellParser, ser::CellBuilder};

use super::{
    Grams, HashmapE, Ops, PrettyPrinter, Subtraction, TlbType, VarUIntegerPos, store_zeros,
};

/// ```tlb
/// extra_currencies$_ dict:(HashmapE 32 (VarUInteger 32))
///   = ExtraCurrencyCollection;
/// ```
///
/// Amounts are positive. Subtraction drops currencies whose amount nets
/// to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtraCurrencyCollection;

impl ExtraCurrencyCollection {
    const INNER: HashmapE<VarUIntegerPos> = HashmapE::new(32, VarUIntegerPos::new(32));
    const RELAXED: HashmapE<VarUIntegerPos> = HashmapE::new(32, VarUIntegerPos::relaxed(32));
}

impl TlbType for ExtraCurrencyCollection {
    #[inline]
    fn validate_skip(&self, ops: &mut Ops, cs: &mut CellParser<'_>, weak: bool) -> Option<()> {
        Self::INNER.validate_skip(ops, cs, weak)
    }

    #[inline]
    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        Self::INNER.skip(cs)
    }

    #[inline]
    fn get_tag(&self, cs: &CellParser<'_>) -> Option<u32> {
        Self::INNER.get_tag(cs)
    }

    #[inline]
    fn null_value(&self, cb: &mut CellBuilder) -> Option<()> {
        Self::INNER.null_value(cb)
    }

    #[inline]
    fn add_values(
        &self,
        cb: &mut CellBuilder,
        cs1: &mut CellParser<'_>,
        cs2: &mut CellParser<'_>,
    ) -> Option<()> {
        Self::INNER.add_values(cb, cs1, cs2)
    }

    #[inline]
    fn sub_values(
        &self,
        cb: &mut CellBuilder,
        cs1: &mut CellParser<'_>,
        cs2: &mut CellParser<'_>,
    ) -> Subtraction {
        Self::RELAXED.sub_values(cb, cs1, cs2)
    }

    #[inline]
    fn print_skip(&self, pp: &mut PrettyPrinter, cs: &mut CellParser<'_>) -> Option<()> {
        Self::INNER.print_skip(pp, cs)
    }
}

/// ```tlb
/// currencies$_ grams:Grams other:ExtraCurrencyCollection
///   = CurrencyCollection;
/// ```
///
/// The integer view is the amount of grams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrencyCollection;

impl CurrencyCollection {
    /// Reads a value and stores it back with `grams` added to its grams
    pub fn skip_add_grams(
        &self,
        cb: &mut CellBuilder,
        cs: &mut CellParser<'_>,
        grams: &BigInt,
    ) -> Option<()> {
        let own = Grams.as_integer_skip(cs)?;
        let other = ExtraCurrencyCollection.fetch(cs)?;
        Grams.store_integer_value(cb, &(own + grams))?;
        cb.store(&other, ()).ok()?;
        Some(())
    }

    /// Stores `grams` with no extra currencies
    #[inline]
    pub fn store_grams(&self, cb: &mut CellBuilder, grams: &BigInt) -> Option<()> {
        Grams.store_integer_value(cb, grams)?;
        ExtraCurrencyCollection.null_value(cb)
    }
}

impl TlbType for CurrencyCollection {
    #[inline]
    fn validate_skip(&self, ops: &mut Ops, cs: &mut CellParser<'_>, weak: bool) -> Option<()> {
        Grams.validate_skip(ops, cs, weak)?;
        ExtraCurrencyCollection.validate_skip(ops, cs, weak)
    }

    #[inline]
    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        Grams.skip(cs)?;
        ExtraCurrencyCollection.skip(cs)
    }

    #[inline]
    fn as_integer_skip(&self, cs: &mut CellParser<'_>) -> Option<BigInt> {
        let grams = Grams.as_integer_skip(cs)?;
        ExtraCurrencyCollection.skip(cs)?;
        Some(grams)
    }

    #[inline]
    fn null_value(&self, cb: &mut CellBuilder) -> Option<()> {
        // grams len, then hme_empty
        store_zeros(cb, 4 + 1)
    }

    #[inline]
    fn store_integer_value(&self, cb: &mut CellBuilder, value: &BigInt) -> Option<()> {
        self.store_grams(cb, value)
    }

    fn add_values(
        &self,
        cb: &mut CellBuilder,
        cs1: &mut CellParser<'_>,
        cs2: &mut CellParser<'_>,
    ) -> Option<()> {
        Grams.add_values(cb, cs1, cs2)?;
        ExtraCurrencyCollection.add_values(cb, cs1, cs2)
    }

    fn sub_values(
        &self,
        cb: &mut CellBuilder,
        cs1: &mut CellParser<'_>,
        cs2: &mut CellParser<'_>,
    ) -> Subtraction {
        let grams = Grams.sub_values(cb, cs1, cs2);
        if !grams.is_valid() {
            return Subtraction::Invalid;
        }
        match (grams, ExtraCurrencyCollection.sub_values(cb, cs1, cs2)) {
            (_, Subtraction::Invalid) => Subtraction::Invalid,
            (Subtraction::Zero, Subtraction::Zero) => Subtraction::Zero,
            _ => Subtraction::NonZero,
        }
    }

    fn print_skip(&self, pp: &mut PrettyPrinter, cs: &mut CellParser<'_>) -> Option<()> {
        pp.open("currencies")?;
        pp.field("grams")?;
        Grams.print_skip(pp, cs)?;
        pp.field("other")?;
        ExtraCurrencyCollection.print_skip(pp, cs)?;
        pp.close()
    }
}
