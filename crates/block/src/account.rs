use num_bigint::BigUint;
use strum::Display;
use tlb::{
    Cell, Context, Error,
    r#as::{Ref, VarInt},
    bits::{
        r#as::NBits,
        de::{BitReader, BitReaderExt, BitUnpack},
        ser::{BitPack, BitWriter, BitWriterExt},
    },
    de::{CellDeserialize, CellParser, CellParserError},
    ser::{CellBuilder, CellBuilderError, CellSerialize},
};

use crate::currency::CurrencyCollection;

/// Adapter for `VarUInteger 7`
pub type VarUInteger7 = VarInt<3>;

/// ```tlb
/// acc_state_uninit$00 = AccountStatus;
/// acc_state_frozen$01 = AccountStatus;
/// acc_state_active$10 = AccountStatus;
/// acc_state_nonexist$11 = AccountStatus;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[repr(u8)]
pub enum AccountStatus {
    #[strum(serialize = "acc_state_uninit")]
    Uninit,
    #[strum(serialize = "acc_state_frozen")]
    Frozen,
    #[strum(serialize = "acc_state_active")]
    Active,
    #[strum(serialize = "acc_state_nonexist")]
    NonExist,
}

impl BitPack for AccountStatus {
    type Args = ();

    #[inline]
    fn pack<W>(&self, writer: &mut W, _: Self::Args) -> Result<(), W::Error>
    where
        W: BitWriter + ?Sized,
    {
        writer.pack_as::<_, NBits<2>>(*self as u8, ())?;
        Ok(())
    }
}

impl<'de> BitUnpack<'de> for AccountStatus {
    type Args = ();

    #[inline]
    fn unpack<R>(reader: &mut R, _: Self::Args) -> Result<Self, R::Error>
    where
        R: BitReader<'de> + ?Sized,
    {
        Ok(match reader.unpack_as::<u8, NBits<2>>(())? {
            0b00 => Self::Uninit,
            0b01 => Self::Frozen,
            0b10 => Self::Active,
            _ => Self::NonExist,
        })
    }
}

/// ```tlb
/// storage_used$_ cells:(VarUInteger 7) bits:(VarUInteger 7)
///   public_cells:(VarUInteger 7) = StorageUsed;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageUsed {
    pub cells: BigUint,
    pub bits: BigUint,
    pub public_cells: BigUint,
}

impl BitPack for StorageUsed {
    type Args = ();

    fn pack<W>(&self, writer: &mut W, _: Self::Args) -> Result<(), W::Error>
    where
        W: BitWriter + ?Sized,
    {
        writer
            .pack_as::<_, &VarUInteger7>(&self.cells, ())
            .context("cells")?
            .pack_as::<_, &VarUInteger7>(&self.bits, ())
            .context("bits")?
            .pack_as::<_, &VarUInteger7>(&self.public_cells, ())
            .context("public_cells")?;
        Ok(())
    }
}

impl<'de> BitUnpack<'de> for StorageUsed {
    type Args = ();

    fn unpack<R>(reader: &mut R, _: Self::Args) -> Result<Self, R::Error>
    where
        R: BitReader<'de> + ?Sized,
    {
        Ok(Self {
            cells: reader.unpack_as::<_, VarUInteger7>(()).context("cells")?,
            bits: reader.unpack_as::<_, VarUInteger7>(()).context("bits")?,
            public_cells: reader
                .unpack_as::<_, VarUInteger7>(())
                .context("public_cells")?,
        })
    }
}

/// ```tlb
/// storage_used_short$_ cells:(VarUInteger 7) bits:(VarUInteger 7) = StorageUsedShort;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageUsedShort {
    pub cells: BigUint,
    pub bits: BigUint,
}

impl BitPack for StorageUsedShort {
    type Args = ();

    fn pack<W>(&self, writer: &mut W, _: Self::Args) -> Result<(), W::Error>
    where
        W: BitWriter + ?Sized,
    {
        writer
            .pack_as::<_, &VarUInteger7>(&self.cells, ())
            .context("cells")?
            .pack_as::<_, &VarUInteger7>(&self.bits, ())
            .context("bits")?;
        Ok(())
    }
}

impl<'de> BitUnpack<'de> for StorageUsedShort {
    type Args = ();

    fn unpack<R>(reader: &mut R, _: Self::Args) -> Result<Self, R::Error>
    where
        R: BitReader<'de> + ?Sized,
    {
        Ok(Self {
            cells: reader.unpack_as::<_, VarUInteger7>(()).context("cells")?,
            bits: reader.unpack_as::<_, VarUInteger7>(()).context("bits")?,
        })
    }
}

/// Extra of [`ShardAccounts`](crate::schema::ShardAccounts)
/// ```tlb
/// depth_balance$_ split_depth:(#<= 30) balance:CurrencyCollection = DepthBalanceInfo;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepthBalanceInfo {
    pub split_depth: u8,
    pub balance: CurrencyCollection,
}

impl DepthBalanceInfo {
    pub const MAX_SPLIT_DEPTH: u8 = 30;
}

impl CellSerialize for DepthBalanceInfo {
    type Args = ();

    fn store(&self, builder: &mut CellBuilder, _: Self::Args) -> Result<(), CellBuilderError> {
        if self.split_depth > Self::MAX_SPLIT_DEPTH {
            return Err(Error::custom(format!(
                "split_depth {} exceeds 30",
                self.split_depth
            )));
        }
        builder
            .pack_as::<_, NBits<5>>(self.split_depth, ())?
            .store(&self.balance, ())
            .context("balance")?;
        Ok(())
    }
}

impl<'de> CellDeserialize<'de> for DepthBalanceInfo {
    type Args = ();

    fn parse(parser: &mut CellParser<'de>, _: Self::Args) -> Result<Self, CellParserError<'de>> {
        let split_depth: u8 = parser.unpack_as::<_, NBits<5>>(())?;
        if split_depth > Self::MAX_SPLIT_DEPTH {
            return Err(Error::custom(format!("split_depth {split_depth} exceeds 30")));
        }
        Ok(Self {
            split_depth,
            balance: parser.parse(()).context("balance")?,
        })
    }
}

/// Value of [`ShardAccounts`](crate::schema::ShardAccounts), the account
/// itself stays an opaque cell
/// ```tlb
/// account_descr$_ account:^Account last_trans_hash:bits256
///   last_trans_lt:uint64 = ShardAccount;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShardAccount {
    pub account: Cell,
    pub last_trans_hash: [u8; 32],
    pub last_trans_lt: u64,
}

impl CellSerialize for ShardAccount {
    type Args = ();

    fn store(&self, builder: &mut CellBuilder, _: Self::Args) -> Result<(), CellBuilderError> {
        builder
            .store_as::<_, Ref>(&self.account, ())
            .context("account")?
            .pack(self.last_trans_hash, ())?
            .pack(self.last_trans_lt, ())?;
        Ok(())
    }
}

impl<'de> CellDeserialize<'de> for ShardAccount {
    type Args = ();

    fn parse(parser: &mut CellParser<'de>, _: Self::Args) -> Result<Self, CellParserError<'de>> {
        Ok(Self {
            account: parser.parse_as::<_, Ref>(()).context("account")?,
            last_trans_hash: parser.unpack(()).context("last_trans_hash")?,
            last_trans_lt: parser.unpack(()).context("last_trans_lt")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use tlb::{
        r#as::Data,
        bits::{de::unpack_fully, ser::pack},
        schema::TlbTypeExt,
        ser::CellSerializeExt,
    };

    use crate::schema;

    use super::*;

    #[rstest]
    #[case(AccountStatus::Uninit, "acc_state_uninit")]
    #[case(AccountStatus::Frozen, "acc_state_frozen")]
    #[case(AccountStatus::Active, "acc_state_active")]
    #[case(AccountStatus::NonExist, "acc_state_nonexist")]
    fn account_status(#[case] status: AccountStatus, #[case] name: &str) {
        assert_eq!(status.to_string(), name);
        let bits = pack(status, ()).unwrap();
        assert_eq!(bits.len(), 2);
        assert_eq!(unpack_fully::<AccountStatus>(&bits, ()).unwrap(), status);
    }

    #[test]
    fn storage_used() {
        let used = StorageUsed {
            cells: 3u32.into(),
            bits: 1023u32.into(),
            public_cells: BigUint::default(),
        };
        let mut b = Cell::builder();
        b.pack(&used, ()).unwrap();
        let cell = b.into_cell();
        assert!(schema::StorageUsed.validate_cell(&cell, false));
        assert_eq!(cell.parse_fully_as::<StorageUsed, Data>(()).unwrap(), used);
    }

    #[test]
    fn depth_balance_info() {
        let info = DepthBalanceInfo {
            split_depth: 30,
            balance: CurrencyCollection::grams(10u32),
        };
        let cell = info.to_cell(()).unwrap();
        assert!(schema::DepthBalanceInfo.validate_cell(&cell, false));
        assert_eq!(cell.parse_fully::<DepthBalanceInfo>(()).unwrap(), info);

        let too_deep = DepthBalanceInfo {
            split_depth: 31,
            ..info
        };
        assert!(too_deep.to_cell(()).is_err());
    }

    #[test]
    fn shard_account() {
        // account_none$0
        let mut b = Cell::builder();
        b.pack(false, ()).unwrap();
        let acc = ShardAccount {
            account: b.into_cell(),
            last_trans_hash: [1; 32],
            last_trans_lt: 9,
        };
        let cell = acc.to_cell(()).unwrap();
        assert_eq!(cell.parse_fully::<ShardAccount>(()).unwrap(), acc);
        // shard accounts never hold account_none
        assert!(!schema::ShardAccount.validate_cell(&cell, false));
        assert!(schema::Account::new(true).validate_cell(&acc.account, false));
        assert!(!schema::Account::new(false).validate_cell(&acc.account, false));
    }
}
