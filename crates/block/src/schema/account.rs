use tlb::{
    bits::bitvec::{order::Msb0, view::BitView},
    de::CellParser,
    ser::CellBuilder,
};

use super::{
    Augmentation, CurrencyCollection, Grams, HashmapAugE, Maybe, MsgAddressInt, Ops,
    PrettyPrinter, RefTo, SizeExt, StateInit, TlbType, VarUInteger, store_uint, store_zeros,
};

const VAR_UINT_7: VarUInteger = VarUInteger::new(7);

/// ```tlb
/// storage_used$_ cells:(VarUInteger 7) bits:(VarUInteger 7)
///   public_cells:(VarUInteger 7) = StorageUsed;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageUsed;

impl TlbType for StorageUsed {
    fn validate_skip(&self, ops: &mut Ops, cs: &mut CellParser<'_>, weak: bool) -> Option<()> {
        for _ in 0..3 {
            VAR_UINT_7.validate_skip(ops, cs, weak)?;
        }
        Some(())
    }

    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        for _ in 0..3 {
            VAR_UINT_7.skip(cs)?;
        }
        Some(())
    }
}

/// ```tlb
/// storage_used_short$_ cells:(VarUInteger 7)
///   bits:(VarUInteger 7) = StorageUsedShort;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageUsedShort;

impl TlbType for StorageUsedShort {
    fn validate_skip(&self, ops: &mut Ops, cs: &mut CellParser<'_>, weak: bool) -> Option<()> {
        VAR_UINT_7.validate_skip(ops, cs, weak)?;
        VAR_UINT_7.validate_skip(ops, cs, weak)
    }

    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        VAR_UINT_7.skip(cs)?;
        VAR_UINT_7.skip(cs)
    }
}

/// ```tlb
/// storage_info$_ used:StorageUsed last_paid:uint32
///   due_payment:(Maybe Grams) = StorageInfo;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageInfo;

impl TlbType for StorageInfo {
    fn validate_skip(&self, ops: &mut Ops, cs: &mut CellParser<'_>, weak: bool) -> Option<()> {
        StorageUsed.validate_skip(ops, cs, weak)?;
        cs.advance(32)?;
        Maybe(Grams).validate_skip(ops, cs, weak)
    }

    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        StorageUsed.skip(cs)?;
        cs.advance(32)?;
        Maybe(Grams).skip(cs)
    }
}

/// ```tlb
/// account_uninit$00 = AccountState;
/// account_active$1 _:StateInit = AccountState;
/// account_frozen$01 state_hash:bits256 = AccountState;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountState;

impl AccountState {
    pub const ACCOUNT_UNINIT: u32 = 0;
    pub const ACCOUNT_FROZEN: u32 = 1;
    pub const ACCOUNT_ACTIVE: u32 = 2;

    /// `tick tock` bits of an active account, zero otherwise
    pub fn get_ticktock(&self, cs: &mut CellParser<'_>) -> Option<u8> {
        if self.get_tag(cs)? != Self::ACCOUNT_ACTIVE {
            return Some(0);
        }
        cs.advance(1)?;
        StateInit.get_ticktock(cs)
    }
}

impl TlbType for AccountState {
    fn validate_skip(&self, ops: &mut Ops, cs: &mut CellParser<'_>, weak: bool) -> Option<()> {
        match self.get_tag(cs)? {
            Self::ACCOUNT_UNINIT => cs.advance(2),
            Self::ACCOUNT_FROZEN => cs.advance(2 + 256),
            _ => {
                cs.advance(1)?;
                StateInit.validate_skip(ops, cs, weak)
            }
        }
    }

    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        match self.get_tag(cs)? {
            Self::ACCOUNT_UNINIT => cs.advance(2),
            Self::ACCOUNT_FROZEN => cs.advance(2 + 256),
            _ => {
                cs.advance(1)?;
                StateInit.skip(cs)
            }
        }
    }

    #[inline]
    fn get_tag(&self, cs: &CellParser<'_>) -> Option<u32> {
        match cs.prefetch_uint(2)? as u32 {
            3 => Some(Self::ACCOUNT_ACTIVE),
            t => Some(t),
        }
    }

    fn print_skip(&self, pp: &mut PrettyPrinter, cs: &mut CellParser<'_>) -> Option<()> {
        match self.get_tag(cs)? {
            Self::ACCOUNT_UNINIT => {
                cs.advance(2)?;
                pp.out("account_uninit")
            }
            Self::ACCOUNT_FROZEN => {
                cs.advance(2)?;
                pp.open("account_frozen")?;
                pp.field("state_hash")?;
                let mut hash = [0u8; 32];
                hash.view_bits_mut::<Msb0>().copy_from_bitslice(cs.fetch_bits(256)?);
                pp.out(format_args!("x{}", hex::encode_upper(hash)))?;
                pp.close()
            }
            _ => {
                cs.advance(1)?;
                pp.open("account_active")?;
                pp.next_field()?;
                StateInit.print_skip(pp, cs)?;
                pp.close()
            }
        }
    }
}

/// ```tlb
/// account_storage$_ last_trans_lt:uint64
///   balance:CurrencyCollection state:AccountState
///   = AccountStorage;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountStorage;

impl AccountStorage {
    /// Advances past the value and appends its balance to `cb`
    pub fn skip_copy_balance(&self, cb: &mut CellBuilder, cs: &mut CellParser<'_>) -> Option<()> {
        cs.advance(64)?;
        CurrencyCollection.skip_copy(cb, cs)?;
        AccountState.skip(cs)
    }
}

impl TlbType for AccountStorage {
    fn validate_skip(&self, ops: &mut Ops, cs: &mut CellParser<'_>, weak: bool) -> Option<()> {
        cs.advance(64)?;
        CurrencyCollection.validate_skip(ops, cs, weak)?;
        AccountState.validate_skip(ops, cs, weak)
    }

    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        cs.advance(64)?;
        CurrencyCollection.skip(cs)?;
        AccountState.skip(cs)
    }

    fn print_skip(&self, pp: &mut PrettyPrinter, cs: &mut CellParser<'_>) -> Option<()> {
        pp.open("account_storage")?;
        pp.field("last_trans_lt")?;
        pp.out(cs.fetch_uint(64)?)?;
        pp.field("balance")?;
        CurrencyCollection.print_skip(pp, cs)?;
        pp.field("state")?;
        AccountState.print_skip(pp, cs)?;
        pp.close()
    }
}

/// ```tlb
/// account_none$0 = Account;
/// account$1 addr:MsgAddressInt storage_stat:StorageInfo
///   storage:AccountStorage = Account;
/// ```
///
/// `account_none` is accepted only when `allow_empty` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Account {
    allow_empty: bool,
}

impl Account {
    pub const ACCOUNT_NONE: u32 = 0;
    pub const ACCOUNT: u32 = 1;

    #[inline]
    pub const fn new(allow_empty: bool) -> Self {
        Self { allow_empty }
    }

    #[inline]
    pub const fn allow_empty(&self) -> bool {
        self.allow_empty
    }

    /// Advances past the account and appends its balance to `cb`, the
    /// null balance for `account_none`
    pub fn skip_copy_balance(&self, cb: &mut CellBuilder, cs: &mut CellParser<'_>) -> Option<()> {
        match self.get_tag(cs)? {
            Self::ACCOUNT_NONE => {
                self.skip_none(cs)?;
                CurrencyCollection.null_value(cb)
            }
            _ => {
                cs.advance(1)?;
                MsgAddressInt.skip(cs)?;
                StorageInfo.skip(cs)?;
                AccountStorage.skip_copy_balance(cb, cs)
            }
        }
    }

    /// Advances past the account and appends its [`DepthBalanceInfo`]
    /// to `cb`: the anycast depth of its address and its balance
    pub fn skip_copy_depth_balance(
        &self,
        cb: &mut CellBuilder,
        cs: &mut CellParser<'_>,
    ) -> Option<()> {
        match self.get_tag(cs)? {
            Self::ACCOUNT_NONE => {
                self.skip_none(cs)?;
                DepthBalanceInfo.null_value(cb)
            }
            _ => {
                cs.advance(1)?;
                let depth = MsgAddressInt.skip_get_depth(cs)?;
                if depth as u64 > DepthBalanceInfo::MAX_SPLIT_DEPTH {
                    return None;
                }
                store_uint(cb, depth as u64, 5)?;
                StorageInfo.skip(cs)?;
                AccountStorage.skip_copy_balance(cb, cs)
            }
        }
    }

    fn skip_none(&self, cs: &mut CellParser<'_>) -> Option<()> {
        if !self.allow_empty {
            return None;
        }
        cs.advance(1)
    }
}

impl TlbType for Account {
    fn validate_skip(&self, ops: &mut Ops, cs: &mut CellParser<'_>, weak: bool) -> Option<()> {
        match self.get_tag(cs)? {
            Self::ACCOUNT_NONE => self.skip_none(cs),
            _ => {
                cs.advance(1)?;
                MsgAddressInt.validate_skip(ops, cs, weak)?;
                StorageInfo.validate_skip(ops, cs, weak)?;
                AccountStorage.validate_skip(ops, cs, weak)
            }
        }
    }

    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        match self.get_tag(cs)? {
            Self::ACCOUNT_NONE => self.skip_none(cs),
            _ => {
                cs.advance(1)?;
                MsgAddressInt.skip(cs)?;
                StorageInfo.skip(cs)?;
                AccountStorage.skip(cs)
            }
        }
    }

    #[inline]
    fn get_tag(&self, cs: &CellParser<'_>) -> Option<u32> {
        cs.prefetch_uint(1).map(|t| t as u32)
    }

    fn print_skip(&self, pp: &mut PrettyPrinter, cs: &mut CellParser<'_>) -> Option<()> {
        match self.get_tag(cs)? {
            Self::ACCOUNT_NONE => {
                self.skip_none(cs)?;
                pp.out("account_none")
            }
            _ => {
                cs.advance(1)?;
                pp.open("account")?;
                pp.field("addr")?;
                MsgAddressInt.print_skip(pp, cs)?;
                pp.field("storage_stat")?;
                StorageInfo.print_skip(pp, cs)?;
                pp.field("storage")?;
                AccountStorage.print_skip(pp, cs)?;
                pp.close()
            }
        }
    }
}

/// ```tlb
/// account_descr$_ account:^Account last_trans_hash:bits256
///   last_trans_lt:uint64 = ShardAccount;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardAccount;

impl ShardAccount {
    const ACCOUNT: RefTo<Account> = RefTo(Account::new(false));
}

impl TlbType for ShardAccount {
    fn validate_skip(&self, ops: &mut Ops, cs: &mut CellParser<'_>, weak: bool) -> Option<()> {
        Self::ACCOUNT.validate_skip(ops, cs, weak)?;
        cs.advance(256 + 64)
    }

    #[inline]
    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        cs.advance_ext(SizeExt::new(256 + 64, 1))
    }

    #[inline]
    fn get_size(&self, _: &CellParser<'_>) -> Option<SizeExt> {
        Some(SizeExt::new(256 + 64, 1))
    }
}

/// ```tlb
/// depth_balance$_ split_depth:(#<= 30)
///   balance:CurrencyCollection = DepthBalanceInfo;
/// ```
///
/// Sums keep the greater depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthBalanceInfo;

impl DepthBalanceInfo {
    pub const MAX_SPLIT_DEPTH: u64 = 30;
}

impl TlbType for DepthBalanceInfo {
    fn validate_skip(&self, ops: &mut Ops, cs: &mut CellParser<'_>, weak: bool) -> Option<()> {
        cs.fetch_uint_leq(Self::MAX_SPLIT_DEPTH)?;
        CurrencyCollection.validate_skip(ops, cs, weak)
    }

    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        cs.advance(5)?;
        CurrencyCollection.skip(cs)
    }

    fn null_value(&self, cb: &mut CellBuilder) -> Option<()> {
        store_zeros(cb, 5)?;
        CurrencyCollection.null_value(cb)
    }

    fn add_values(
        &self,
        cb: &mut CellBuilder,
        cs1: &mut CellParser<'_>,
        cs2: &mut CellParser<'_>,
    ) -> Option<()> {
        let d1 = cs1.fetch_uint_leq(Self::MAX_SPLIT_DEPTH)?;
        let d2 = cs2.fetch_uint_leq(Self::MAX_SPLIT_DEPTH)?;
        store_uint(cb, d1.max(d2), 5)?;
        CurrencyCollection.add_values(cb, cs1, cs2)
    }

    fn print_skip(&self, pp: &mut PrettyPrinter, cs: &mut CellParser<'_>) -> Option<()> {
        pp.open("depth_balance")?;
        pp.field("split_depth")?;
        pp.out(cs.fetch_uint_leq(Self::MAX_SPLIT_DEPTH)?)?;
        pp.field("balance")?;
        CurrencyCollection.print_skip(pp, cs)?;
        pp.close()
    }
}

/// Derives a [`DepthBalanceInfo`] from each account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AugShardAccounts;

impl Augmentation for AugShardAccounts {
    #[inline]
    fn value_type(&self) -> &dyn TlbType {
        &ShardAccount
    }

    #[inline]
    fn extra_type(&self) -> &dyn TlbType {
        &DepthBalanceInfo
    }

    fn eval_leaf(&self, cb: &mut CellBuilder, value: &mut CellParser<'_>) -> Option<()> {
        let account = value.fetch_reference()?;
        if account.exotic {
            return None;
        }
        Account::new(false).skip_copy_depth_balance(cb, &mut account.parser())
    }
}

named_type! {
    /// ```tlb
    /// _ (HashmapAugE 256 ShardAccount DepthBalanceInfo) = ShardAccounts;
    /// ```
    pub struct ShardAccounts: HashmapAugE<AugShardAccounts> = HashmapAugE::new(256, AugShardAccounts);
}
