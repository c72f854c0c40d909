//! Collection of types to work with currencies
use num_bigint::BigUint;
use tlb::{
    Context, Error,
    r#as::{Data, Same, VarInt, hashmap::HashmapE},
    bits::{
        bitvec::{order::Msb0, vec::BitVec},
        de::BitReaderExt,
        ser::BitWriterExt,
    },
    de::{CellDeserialize, CellParser, CellParserError},
    ser::{CellBuilder, CellBuilderError, CellSerialize},
};

/// 1 TON in nanograms
pub const ONE_TON: u64 = 1_000_000_000;

/// Adapter for `VarUInteger 16`
/// ```tlb
/// nanograms$_ amount:(VarUInteger 16) = Grams;
/// ```
pub type Grams = VarInt<4>;

/// Adapter for `VarUInteger 32`
pub type VarUInteger32 = VarInt<5>;

/// [`CurrencyCollection`](https://docs.ton.org/develop/data-formats/msg-tlb#currencycollection)
/// ```tlb
/// currencies$_ grams:Grams other:ExtraCurrencyCollection = CurrencyCollection;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CurrencyCollection {
    pub grams: BigUint,
    pub other: ExtraCurrencyCollection,
}

impl CurrencyCollection {
    /// Only nanograms, no extra currencies
    #[inline]
    pub fn grams(grams: impl Into<BigUint>) -> Self {
        Self {
            grams: grams.into(),
            other: ExtraCurrencyCollection::default(),
        }
    }
}

impl CellSerialize for CurrencyCollection {
    type Args = ();

    #[inline]
    fn store(&self, builder: &mut CellBuilder, _: Self::Args) -> Result<(), CellBuilderError> {
        builder
            .pack_as::<_, &Grams>(&self.grams, ())
            .context("grams")?
            .store(&self.other, ())
            .context("other")?;
        Ok(())
    }
}

impl<'de> CellDeserialize<'de> for CurrencyCollection {
    type Args = ();

    #[inline]
    fn parse(parser: &mut CellParser<'de>, _: Self::Args) -> Result<Self, CellParserError<'de>> {
        Ok(Self {
            grams: parser.unpack_as::<_, Grams>(()).context("grams")?,
            other: parser.parse(()).context("other")?,
        })
    }
}

/// Amounts of extra currencies by their 32-bit ids
/// ```tlb
/// extra_currencies$_ dict:(HashmapE 32 (VarUInteger 32)) = ExtraCurrencyCollection;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtraCurrencyCollection(pub HashmapE<BigUint>);

impl ExtraCurrencyCollection {
    /// Builds the collection from `(currency_id, amount)` pairs
    pub fn from_amounts(
        amounts: impl IntoIterator<Item = (u32, BigUint)>,
    ) -> Result<Self, CellBuilderError> {
        HashmapE::from_entries(
            32,
            amounts
                .into_iter()
                .map(|(id, amount)| (currency_key(id), amount)),
        )
        .map(Self)
        .map_err(Error::custom)
    }

    #[inline]
    pub fn get(&self, currency_id: u32) -> Option<&BigUint> {
        self.0.get(currency_key(currency_id))
    }

    /// `(currency_id, amount)` pairs in ascending id order
    pub fn amounts(&self) -> impl Iterator<Item = (u32, &BigUint)> {
        self.0
            .iter()
            .map(|(k, v)| (k.iter().by_vals().fold(0u32, |id, b| id << 1 | u32::from(b)), v))
    }
}

#[inline]
fn currency_key(id: u32) -> BitVec<u8, Msb0> {
    BitVec::from_vec(id.to_be_bytes().to_vec())
}

impl CellSerialize for ExtraCurrencyCollection {
    type Args = ();

    #[inline]
    fn store(&self, builder: &mut CellBuilder, _: Self::Args) -> Result<(), CellBuilderError> {
        builder.store_as::<_, &HashmapE<Data<VarUInteger32>, Same>>(&self.0, (32, (), ()))?;
        Ok(())
    }
}

impl<'de> CellDeserialize<'de> for ExtraCurrencyCollection {
    type Args = ();

    #[inline]
    fn parse(parser: &mut CellParser<'de>, _: Self::Args) -> Result<Self, CellParserError<'de>> {
        Ok(Self(
            parser.parse_as::<_, HashmapE<Data<VarUInteger32>, Same>>((32, (), ()))?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use tlb::ser::CellSerializeExt;

    use crate::schema::{self, TlbTypeExt};

    use super::*;

    #[test]
    fn currency_collection_serde() {
        let v = CurrencyCollection::default();

        let cell = v.to_cell(()).unwrap();
        let got: CurrencyCollection = cell.parse_fully(()).unwrap();

        assert_eq!(got, v);
    }

    #[test]
    fn extra_currencies() {
        let v = CurrencyCollection {
            grams: ONE_TON.into(),
            other: ExtraCurrencyCollection::from_amounts([
                (1, 100u32.into()),
                (7, BigUint::from(u128::MAX)),
            ])
            .unwrap(),
        };
        assert_eq!(v.other.get(7), Some(&BigUint::from(u128::MAX)));
        assert_eq!(v.other.get(2), None);
        assert_eq!(
            v.other.amounts().map(|(id, _)| id).collect::<Vec<_>>(),
            [1, 7]
        );

        let cell = v.to_cell(()).unwrap();
        assert!(schema::CurrencyCollection.validate_cell(&cell, false));
        let got: CurrencyCollection = cell.parse_fully(()).unwrap();
        assert_eq!(got, v);
    }
}
