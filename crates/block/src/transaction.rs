use num_bigint::BigUint;
use tlb::{
    Context, Error,
    bits::{
        r#as::NBits,
        de::{BitReader, BitReaderExt, BitUnpack},
        ser::{BitPack, BitWriter, BitWriterExt},
    },
    de::{CellDeserialize, CellParser, CellParserError},
    ser::{CellBuilder, CellBuilderError, CellSerialize},
};

use crate::currency::{CurrencyCollection, Grams};

/// ```tlb
/// acst_unchanged$0 = AccStatusChange;  // x -> x
/// acst_frozen$10 = AccStatusChange;    // init -> frozen
/// acst_deleted$11 = AccStatusChange;   // frozen -> deleted
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AccStatusChange {
    #[default]
    Unchanged,
    Frozen,
    Deleted,
}

impl BitPack for AccStatusChange {
    type Args = ();

    fn pack<W>(&self, writer: &mut W, _: Self::Args) -> Result<(), W::Error>
    where
        W: BitWriter + ?Sized,
    {
        match self {
            Self::Unchanged => writer.pack(false, ())?,
            Self::Frozen => writer.pack_as::<_, NBits<2>>(0b10u8, ())?,
            Self::Deleted => writer.pack_as::<_, NBits<2>>(0b11u8, ())?,
        };
        Ok(())
    }
}

impl<'de> BitUnpack<'de> for AccStatusChange {
    type Args = ();

    fn unpack<R>(reader: &mut R, _: Self::Args) -> Result<Self, R::Error>
    where
        R: BitReader<'de> + ?Sized,
    {
        if !reader.unpack::<bool>(())? {
            return Ok(Self::Unchanged);
        }
        Ok(match reader.unpack::<bool>(())? {
            false => Self::Frozen,
            true => Self::Deleted,
        })
    }
}

/// Fees and value collected by importing a message
/// ```tlb
/// import_fees$_ fees_collected:Grams
///   value_imported:CurrencyCollection = ImportFees;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportFees {
    pub fees_collected: BigUint,
    pub value_imported: CurrencyCollection,
}

impl CellSerialize for ImportFees {
    type Args = ();

    fn store(&self, builder: &mut CellBuilder, _: Self::Args) -> Result<(), CellBuilderError> {
        builder
            .pack_as::<_, &Grams>(&self.fees_collected, ())
            .context("fees_collected")?
            .store(&self.value_imported, ())
            .context("value_imported")?;
        Ok(())
    }
}

impl<'de> CellDeserialize<'de> for ImportFees {
    type Args = ();

    fn parse(parser: &mut CellParser<'de>, _: Self::Args) -> Result<Self, CellParserError<'de>> {
        Ok(Self {
            fees_collected: parser
                .unpack_as::<_, Grams>(())
                .context("fees_collected")?,
            value_imported: parser.parse(()).context("value_imported")?,
        })
    }
}

/// ```tlb
/// update_hashes#72 {X:Type} old_hash:bits256 new_hash:bits256 = HASH_UPDATE X;
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct HashUpdate {
    pub old_hash: [u8; 32],
    pub new_hash: [u8; 32],
}

impl HashUpdate {
    pub const TAG: u8 = 0x72;
}

impl BitPack for HashUpdate {
    type Args = ();

    fn pack<W>(&self, writer: &mut W, _: Self::Args) -> Result<(), W::Error>
    where
        W: BitWriter + ?Sized,
    {
        writer
            .pack(Self::TAG, ())?
            .pack(self.old_hash, ())?
            .pack(self.new_hash, ())?;
        Ok(())
    }
}

impl<'de> BitUnpack<'de> for HashUpdate {
    type Args = ();

    fn unpack<R>(reader: &mut R, _: Self::Args) -> Result<Self, R::Error>
    where
        R: BitReader<'de> + ?Sized,
    {
        let tag: u8 = reader.unpack(())?;
        if tag != Self::TAG {
            return Err(Error::custom(format!("invalid update_hashes tag: {tag:#x}")));
        }
        Ok(Self {
            old_hash: reader.unpack(()).context("old_hash")?,
            new_hash: reader.unpack(()).context("new_hash")?,
        })
    }
}

/// ```tlb
/// split_merge_info$_ cur_shard_pfx_len:(## 6)
///   acc_split_depth:(## 6) this_addr:bits256 sibling_addr:bits256
///   = SplitMergeInfo;
/// ```
///
/// `cur_shard_pfx_len` is less than `acc_split_depth`, and `this_addr`
/// differs from `sibling_addr` only in bit `cur_shard_pfx_len`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SplitMergeInfo {
    pub cur_shard_pfx_len: u8,
    pub acc_split_depth: u8,
    pub this_addr: [u8; 32],
    pub sibling_addr: [u8; 32],
}

impl BitPack for SplitMergeInfo {
    type Args = ();

    fn pack<W>(&self, writer: &mut W, _: Self::Args) -> Result<(), W::Error>
    where
        W: BitWriter + ?Sized,
    {
        writer
            .pack_as::<_, NBits<6>>(self.cur_shard_pfx_len, ())?
            .pack_as::<_, NBits<6>>(self.acc_split_depth, ())?
            .pack(self.this_addr, ())?
            .pack(self.sibling_addr, ())?;
        Ok(())
    }
}

impl<'de> BitUnpack<'de> for SplitMergeInfo {
    type Args = ();

    fn unpack<R>(reader: &mut R, _: Self::Args) -> Result<Self, R::Error>
    where
        R: BitReader<'de> + ?Sized,
    {
        Ok(Self {
            cur_shard_pfx_len: reader.unpack_as::<_, NBits<6>>(())?,
            acc_split_depth: reader.unpack_as::<_, NBits<6>>(())?,
            this_addr: reader.unpack(()).context("this_addr")?,
            sibling_addr: reader.unpack(()).context("sibling_addr")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;
    use rstest::rstest;
    use tlb::{
        Cell,
        bits::{de::unpack_fully, ser::pack},
        schema::{TlbType, TlbTypeExt},
        ser::CellSerializeExt,
    };

    use crate::schema;

    use super::*;

    #[rstest]
    #[case(AccStatusChange::Unchanged, 1)]
    #[case(AccStatusChange::Frozen, 2)]
    #[case(AccStatusChange::Deleted, 2)]
    fn acc_status_change(#[case] change: AccStatusChange, #[case] len: usize) {
        let bits = pack(change, ()).unwrap();
        assert_eq!(bits.len(), len);
        assert_eq!(unpack_fully::<AccStatusChange>(&bits, ()).unwrap(), change);
    }

    #[test]
    fn hash_update() {
        let u = HashUpdate {
            old_hash: [0xAA; 32],
            new_hash: [0xBB; 32],
        };
        let bits = pack(u, ()).unwrap();
        assert_eq!(bits.len(), 8 + 512);
        assert_eq!(bits.as_raw_slice()[0], 0x72);
        assert_eq!(unpack_fully::<HashUpdate>(&bits, ()).unwrap(), u);

        let mut b = Cell::builder();
        b.pack(u, ()).unwrap();
        assert!(schema::HashUpdate.validate_cell(&b.into_cell(), false));
    }

    #[test]
    fn split_merge_info() {
        let mut sibling = [0u8; 32];
        sibling[0] = 0x80;
        let info = SplitMergeInfo {
            cur_shard_pfx_len: 0,
            acc_split_depth: 1,
            this_addr: [0; 32],
            sibling_addr: sibling,
        };
        let mut b = Cell::builder();
        b.pack(info, ()).unwrap();
        let cell = b.into_cell();
        assert!(schema::SplitMergeInfo.validate_cell(&cell, false));

        // differs in a second bit
        let info = SplitMergeInfo {
            sibling_addr: hex!("c000000000000000000000000000000000000000000000000000000000000000"),
            ..info
        };
        let mut b = Cell::builder();
        b.pack(info, ()).unwrap();
        assert!(!schema::SplitMergeInfo.validate_cell(&b.into_cell(), false));
    }

    #[test]
    fn import_fees() {
        let fees = ImportFees {
            fees_collected: 5u32.into(),
            value_imported: CurrencyCollection::grams(100u32),
        };
        let cell = fees.to_cell(()).unwrap();
        assert!(schema::ImportFees.validate_cell(&cell, false));
        assert_eq!(cell.parse_fully::<ImportFees>(()).unwrap(), fees);
        assert_eq!(
            schema::ImportFees.get_size(&cell.parser()).map(|s| s.bits()),
            Some(cell.data.len())
        );
    }
}
