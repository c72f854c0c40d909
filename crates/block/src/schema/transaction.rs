use num_bigint::BigInt;
use tlb::{Cell, de::CellParser, ser::CellBuilder};

use super::{
    Augmentation, CurrencyCollection, Grams, HashmapAug, HashmapAugE, HashmapE, Int, Maybe,
    Message, Ops, RefTo, SizeExt, StorageUsedShort, TlbType, VarUInteger,
};

/// ```tlb
/// acst_unchanged$0 = AccStatusChange;
/// acst_frozen$10 = AccStatusChange;
/// acst_deleted$11 = AccStatusChange;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccStatusChange;

impl TlbType for AccStatusChange {
    #[inline]
    fn validate_skip(&self, _: &mut Ops, cs: &mut CellParser<'_>, _: bool) -> Option<()> {
        self.skip(cs)
    }

    #[inline]
    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        let size = self.get_size(cs)?;
        cs.advance_ext(size)
    }

    #[inline]
    fn get_size(&self, cs: &CellParser<'_>) -> Option<SizeExt> {
        match cs.prefetch_uint(1)? {
            0 => Some(SizeExt::bits_only(1)),
            _ => cs.have(2).then_some(SizeExt::bits_only(2)),
        }
    }

    #[inline]
    fn get_tag(&self, cs: &CellParser<'_>) -> Option<u32> {
        match cs.prefetch_uint(1)? {
            0 => Some(0),
            _ => cs.prefetch_uint(2).map(|t| t as u32),
        }
    }
}

/// ```tlb
/// tr_phase_storage$_ storage_fees_collected:Grams
///   storage_fees_due:(Maybe Grams)
///   status_change:AccStatusChange
///   = TrStoragePhase;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrStoragePhase;

impl TrStoragePhase {
    /// `storage_fees_collected`
    #[inline]
    pub fn get_storage_fees(&self, cs: &mut CellParser<'_>) -> Option<BigInt> {
        Grams.as_integer_skip(cs)
    }
}

impl TlbType for TrStoragePhase {
    fn validate_skip(&self, ops: &mut Ops, cs: &mut CellParser<'_>, weak: bool) -> Option<()> {
        Grams.validate_skip(ops, cs, weak)?;
        Maybe(Grams).validate_skip(ops, cs, weak)?;
        AccStatusChange.validate_skip(ops, cs, weak)
    }

    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        Grams.skip(cs)?;
        Maybe(Grams).skip(cs)?;
        AccStatusChange.skip(cs)
    }
}

/// ```tlb
/// tr_phase_credit$_ due_fees_collected:(Maybe Grams)
///   credit:CurrencyCollection = TrCreditPhase;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrCreditPhase;

impl TlbType for TrCreditPhase {
    fn validate_skip(&self, ops: &mut Ops, cs: &mut CellParser<'_>, weak: bool) -> Option<()> {
        Maybe(Grams).validate_skip(ops, cs, weak)?;
        CurrencyCollection.validate_skip(ops, cs, weak)
    }

    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        Maybe(Grams).skip(cs)?;
        CurrencyCollection.skip(cs)
    }
}

/// The referenced part of `tr_phase_compute_vm`
/// ```tlb
/// _ gas_used:(VarUInteger 7) gas_limit:(VarUInteger 7)
///   gas_credit:(Maybe (VarUInteger 3)) mode:int8
///   exit_code:int32 exit_arg:(Maybe int32) vm_steps:uint32
///   vm_init_state_hash:bits256 vm_final_state_hash:bits256
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrComputeInternal1;

impl TlbType for TrComputeInternal1 {
    fn validate_skip(&self, ops: &mut Ops, cs: &mut CellParser<'_>, weak: bool) -> Option<()> {
        VarUInteger::new(7).validate_skip(ops, cs, weak)?;
        VarUInteger::new(7).validate_skip(ops, cs, weak)?;
        Maybe(VarUInteger::new(3)).validate_skip(ops, cs, weak)?;
        cs.advance(8 + 32)?;
        Maybe(Int(32)).validate_skip(ops, cs, weak)?;
        cs.advance(32 + 256 + 256)
    }

    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        VarUInteger::new(7).skip(cs)?;
        VarUInteger::new(7).skip(cs)?;
        Maybe(VarUInteger::new(3)).skip(cs)?;
        cs.advance(8 + 32)?;
        Maybe(Int(32)).skip(cs)?;
        cs.advance(32 + 256 + 256)
    }
}

/// ```tlb
/// cskip_no_state$00 = ComputeSkipReason;
/// cskip_bad_state$01 = ComputeSkipReason;
/// cskip_no_gas$10 = ComputeSkipReason;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComputeSkipReason;

impl TlbType for ComputeSkipReason {
    #[inline]
    fn validate_skip(&self, _: &mut Ops, cs: &mut CellParser<'_>, _: bool) -> Option<()> {
        (cs.fetch_uint(2)? < 3).then_some(())
    }

    #[inline]
    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        cs.advance(2)
    }

    #[inline]
    fn get_size(&self, _: &CellParser<'_>) -> Option<SizeExt> {
        Some(SizeExt::bits_only(2))
    }

    #[inline]
    fn get_tag(&self, cs: &CellParser<'_>) -> Option<u32> {
        match cs.prefetch_uint(2)? as u32 {
            t @ 0..3 => Some(t),
            _ => None,
        }
    }
}

/// ```tlb
/// tr_phase_compute_skipped$0 reason:ComputeSkipReason
///   = TrComputePhase;
/// tr_phase_compute_vm$1 success:Bool msg_state_used:Bool
///   account_activated:Bool gas_fees:Grams
///   _:^[ ... ] = TrComputePhase;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrComputePhase;

impl TrComputePhase {
    pub const SKIPPED: u32 = 0;
    pub const VM: u32 = 1;
}

impl TlbType for TrComputePhase {
    fn validate_skip(&self, ops: &mut Ops, cs: &mut CellParser<'_>, weak: bool) -> Option<()> {
        match self.get_tag(cs)? {
            Self::SKIPPED => {
                cs.advance(1)?;
                ComputeSkipReason.validate_skip(ops, cs, weak)
            }
            _ => {
                cs.advance(1 + 3)?;
                Grams.validate_skip(ops, cs, weak)?;
                RefTo(TrComputeInternal1).validate_skip(ops, cs, weak)
            }
        }
    }

    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        match self.get_tag(cs)? {
            Self::SKIPPED => cs.advance(1 + 2),
            _ => {
                cs.advance(1 + 3)?;
                Grams.skip(cs)?;
                cs.advance_refs(1)
            }
        }
    }

    #[inline]
    fn get_tag(&self, cs: &CellParser<'_>) -> Option<u32> {
        cs.prefetch_uint(1).map(|t| t as u32)
    }
}

/// ```tlb
/// tr_phase_action$_ success:Bool valid:Bool no_funds:Bool
///   status_change:AccStatusChange
///   total_fwd_fees:(Maybe Grams) total_action_fees:(Maybe Grams)
///   result_code:int32 result_arg:(Maybe int32) tot_actions:uint16
///   spec_actions:uint16 skipped_actions:uint16 msgs_created:uint16
///   action_list_hash:bits256 tot_msg_size:StorageUsedShort
///   = TrActionPhase;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrActionPhase;

impl TlbType for TrActionPhase {
    fn validate_skip(&self, ops: &mut Ops, cs: &mut CellParser<'_>, weak: bool) -> Option<()> {
        cs.advance(3)?;
        AccStatusChange.validate_skip(ops, cs, weak)?;
        Maybe(Grams).validate_skip(ops, cs, weak)?;
        Maybe(Grams).validate_skip(ops, cs, weak)?;
        cs.advance(32)?;
        Maybe(Int(32)).validate_skip(ops, cs, weak)?;
        cs.advance(16 * 4 + 256)?;
        StorageUsedShort.validate_skip(ops, cs, weak)
    }

    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        cs.advance(3)?;
        AccStatusChange.skip(cs)?;
        Maybe(Grams).skip(cs)?;
        Maybe(Grams).skip(cs)?;
        cs.advance(32)?;
        Maybe(Int(32)).skip(cs)?;
        cs.advance(16 * 4 + 256)?;
        StorageUsedShort.skip(cs)
    }
}

/// ```tlb
/// tr_phase_bounce_negfunds$00 = TrBouncePhase;
/// tr_phase_bounce_nofunds$01 msg_size:StorageUsedShort
///   req_fwd_fees:Grams = TrBouncePhase;
/// tr_phase_bounce_ok$1 msg_size:StorageUsedShort
///   msg_fees:Grams fwd_fees:Grams = TrBouncePhase;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrBouncePhase;

impl TrBouncePhase {
    pub const NEGFUNDS: u32 = 0;
    pub const NOFUNDS: u32 = 1;
    pub const OK: u32 = 2;
}

impl TlbType for TrBouncePhase {
    fn validate_skip(&self, ops: &mut Ops, cs: &mut CellParser<'_>, weak: bool) -> Option<()> {
        match self.get_tag(cs)? {
            Self::NEGFUNDS => cs.advance(2),
            Self::NOFUNDS => {
                cs.advance(2)?;
                StorageUsedShort.validate_skip(ops, cs, weak)?;
                Grams.validate_skip(ops, cs, weak)
            }
            _ => {
                cs.advance(1)?;
                StorageUsedShort.validate_skip(ops, cs, weak)?;
                Grams.validate_skip(ops, cs, weak)?;
                Grams.validate_skip(ops, cs, weak)
            }
        }
    }

    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        match self.get_tag(cs)? {
            Self::NEGFUNDS => cs.advance(2),
            Self::NOFUNDS => {
                cs.advance(2)?;
                StorageUsedShort.skip(cs)?;
                Grams.skip(cs)
            }
            _ => {
                cs.advance(1)?;
                StorageUsedShort.skip(cs)?;
                Grams.skip(cs)?;
                Grams.skip(cs)
            }
        }
    }

    #[inline]
    fn get_tag(&self, cs: &CellParser<'_>) -> Option<u32> {
        if cs.prefetch_uint(1)? == 1 {
            return Some(Self::OK);
        }
        cs.prefetch_uint(2).map(|t| t as u32)
    }
}

/// ```tlb
/// split_merge_info$_ cur_shard_pfx_len:(## 6)
///   acc_split_depth:(## 6) this_addr:bits256 sibling_addr:bits256
///   = SplitMergeInfo;
/// ```
///
/// `cur_shard_pfx_len` is less than `acc_split_depth`, and the two
/// addresses differ only in bit `cur_shard_pfx_len`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitMergeInfo;

impl SplitMergeInfo {
    const BITS: usize = 6 + 6 + 256 + 256;
}

impl TlbType for SplitMergeInfo {
    fn validate_skip(&self, _: &mut Ops, cs: &mut CellParser<'_>, _: bool) -> Option<()> {
        if !cs.have(Self::BITS) {
            return None;
        }
        let cur_pfx_len = cs.fetch_uint(6)? as usize;
        let split_depth = cs.fetch_uint(6)? as usize;
        if cur_pfx_len >= split_depth {
            return None;
        }
        let this_addr = cs.fetch_bits(256)?;
        let sibling_addr = cs.fetch_bits(256)?;
        let mut flipped = this_addr.to_bitvec();
        let bit = !flipped[cur_pfx_len];
        flipped.set(cur_pfx_len, bit);
        (flipped.as_bitslice() == sibling_addr).then_some(())
    }

    #[inline]
    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        cs.advance(Self::BITS)
    }

    #[inline]
    fn get_size(&self, _: &CellParser<'_>) -> Option<SizeExt> {
        Some(SizeExt::bits_only(Self::BITS))
    }
}

/// ```tlb
/// trans_ord$0000 credit_first:Bool
///   storage_ph:(Maybe TrStoragePhase) credit_ph:(Maybe TrCreditPhase)
///   compute_ph:TrComputePhase action:(Maybe ^TrActionPhase)
///   aborted:Bool bounce:(Maybe TrBouncePhase) destroyed:Bool
///   = TransactionDescr;
/// trans_storage$0001 storage_ph:TrStoragePhase = TransactionDescr;
/// trans_tick_tock$001 is_tock:Bool storage_ph:TrStoragePhase
///   compute_ph:TrComputePhase action:(Maybe ^TrActionPhase)
///   aborted:Bool destroyed:Bool = TransactionDescr;
/// trans_split_prepare$0100 split_info:SplitMergeInfo
///   storage_ph:(Maybe TrStoragePhase) compute_ph:TrComputePhase
///   action:(Maybe ^TrActionPhase) aborted:Bool destroyed:Bool
///   = TransactionDescr;
/// trans_split_install$0101 split_info:SplitMergeInfo
///   prepare_transaction:^Transaction installed:Bool
///   = TransactionDescr;
/// trans_merge_prepare$0110 split_info:SplitMergeInfo
///   storage_ph:TrStoragePhase aborted:Bool = TransactionDescr;
/// trans_merge_install$0111 split_info:SplitMergeInfo
///   prepare_transaction:^Transaction
///   storage_ph:(Maybe TrStoragePhase) credit_ph:(Maybe TrCreditPhase)
///   compute_ph:TrComputePhase action:(Maybe ^TrActionPhase)
///   aborted:Bool destroyed:Bool = TransactionDescr;
/// ```
///
/// The compute phase of `trans_merge_install` is parsed as optional, as
/// the validator does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionDescr;

impl TransactionDescr {
    pub const TRANS_ORD: u32 = 0;
    pub const TRANS_STORAGE: u32 = 1;
    pub const TRANS_TICK_TOCK: u32 = 2;
    pub const TRANS_SPLIT_PREPARE: u32 = 4;
    pub const TRANS_SPLIT_INSTALL: u32 = 5;
    pub const TRANS_MERGE_PREPARE: u32 = 6;
    pub const TRANS_MERGE_INSTALL: u32 = 7;

    const ACTION: Maybe<RefTo<TrActionPhase>> = Maybe(RefTo(TrActionPhase));

    /// Moves the cursor to the storage phase and tells whether the
    /// description has one
    pub fn skip_to_storage_phase(&self, cs: &mut CellParser<'_>) -> Option<bool> {
        match self.get_tag(cs)? {
            Self::TRANS_ORD => {
                cs.advance(4 + 1)?;
                Some(cs.fetch_uint(1)? == 1)
            }
            Self::TRANS_STORAGE => cs.advance(4).map(|_| true),
            Self::TRANS_TICK_TOCK => cs.advance(3 + 1).map(|_| true),
            Self::TRANS_SPLIT_PREPARE => {
                cs.advance(4)?;
                SplitMergeInfo.skip(cs)?;
                Some(cs.fetch_uint(1)? == 1)
            }
            Self::TRANS_SPLIT_INSTALL => Some(false),
            Self::TRANS_MERGE_PREPARE => {
                cs.advance(4)?;
                SplitMergeInfo.skip(cs)?;
                Some(true)
            }
            _ => {
                cs.advance(4)?;
                SplitMergeInfo.skip(cs)?;
                cs.advance_refs(1)?;
                Some(cs.fetch_uint(1)? == 1)
            }
        }
    }

    /// `storage_fees_collected` of the storage phase, zero without one
    pub fn get_storage_fees(&self, cell: &Cell) -> Option<BigInt> {
        if cell.exotic {
            return None;
        }
        let mut cs = cell.parser();
        if self.skip_to_storage_phase(&mut cs)? {
            TrStoragePhase.get_storage_fees(&mut cs)
        } else {
            Some(BigInt::ZERO)
        }
    }
}

impl TlbType for TransactionDescr {
    fn validate_skip(&self, ops: &mut Ops, cs: &mut CellParser<'_>, weak: bool) -> Option<()> {
        let Some(tag) = self.get_tag(cs) else {
            invalid_tag!("TransactionDescr", cs);
            return None;
        };
        match tag {
            Self::TRANS_ORD => {
                cs.advance(4 + 1)?;
                Maybe(TrStoragePhase).validate_skip(ops, cs, weak)?;
                Maybe(TrCreditPhase).validate_skip(ops, cs, weak)?;
                TrComputePhase.validate_skip(ops, cs, weak)?;
                Self::ACTION.validate_skip(ops, cs, weak)?;
                cs.advance(1)?;
                Maybe(TrBouncePhase).validate_skip(ops, cs, weak)?;
                cs.advance(1)
            }
            Self::TRANS_STORAGE => {
                cs.advance(4)?;
                TrStoragePhase.validate_skip(ops, cs, weak)
            }
            Self::TRANS_TICK_TOCK => {
                cs.advance(3 + 1)?;
                TrStoragePhase.validate_skip(ops, cs, weak)?;
                TrComputePhase.validate_skip(ops, cs, weak)?;
                Self::ACTION.validate_skip(ops, cs, weak)?;
                cs.advance(2)
            }
            Self::TRANS_SPLIT_PREPARE => {
                cs.advance(4)?;
                SplitMergeInfo.validate_skip(ops, cs, weak)?;
                Maybe(TrStoragePhase).validate_skip(ops, cs, weak)?;
                TrComputePhase.validate_skip(ops, cs, weak)?;
                Self::ACTION.validate_skip(ops, cs, weak)?;
                cs.advance(2)
            }
            Self::TRANS_SPLIT_INSTALL => {
                cs.advance(4)?;
                SplitMergeInfo.validate_skip(ops, cs, weak)?;
                RefTo(Transaction).validate_skip(ops, cs, weak)?;
                cs.advance(1)
            }
            Self::TRANS_MERGE_PREPARE => {
                cs.advance(4)?;
                SplitMergeInfo.validate_skip(ops, cs, weak)?;
                TrStoragePhase.validate_skip(ops, cs, weak)?;
                cs.advance(1)
            }
            _ => {
                cs.advance(4)?;
                SplitMergeInfo.validate_skip(ops, cs, weak)?;
                RefTo(Transaction).validate_skip(ops, cs, weak)?;
                Maybe(TrStoragePhase).validate_skip(ops, cs, weak)?;
                Maybe(TrCreditPhase).validate_skip(ops, cs, weak)?;
                Maybe(TrComputePhase).validate_skip(ops, cs, weak)?;
                Self::ACTION.validate_skip(ops, cs, weak)?;
                cs.advance(2)
            }
        }
    }

    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        match self.get_tag(cs)? {
            Self::TRANS_ORD => {
                cs.advance(4 + 1)?;
                Maybe(TrStoragePhase).skip(cs)?;
                Maybe(TrCreditPhase).skip(cs)?;
                TrComputePhase.skip(cs)?;
                Self::ACTION.skip(cs)?;
                cs.advance(1)?;
                Maybe(TrBouncePhase).skip(cs)?;
                cs.advance(1)
            }
            Self::TRANS_STORAGE => {
                cs.advance(4)?;
                TrStoragePhase.skip(cs)
            }
            Self::TRANS_TICK_TOCK => {
                cs.advance(3 + 1)?;
                TrStoragePhase.skip(cs)?;
                TrComputePhase.skip(cs)?;
                Self::ACTION.skip(cs)?;
                cs.advance(2)
            }
            Self::TRANS_SPLIT_PREPARE => {
                cs.advance(4)?;
                SplitMergeInfo.skip(cs)?;
                Maybe(TrStoragePhase).skip(cs)?;
                TrComputePhase.skip(cs)?;
                Self::ACTION.skip(cs)?;
                cs.advance(2)
            }
            Self::TRANS_SPLIT_INSTALL => {
                cs.advance(4)?;
                SplitMergeInfo.skip(cs)?;
                cs.advance_refs(1)?;
                cs.advance(1)
            }
            Self::TRANS_MERGE_PREPARE => {
                cs.advance(4)?;
                SplitMergeInfo.skip(cs)?;
                TrStoragePhase.skip(cs)?;
                cs.advance(1)
            }
            _ => {
                cs.advance(4)?;
                SplitMergeInfo.skip(cs)?;
                cs.advance_refs(1)?;
                Maybe(TrStoragePhase).skip(cs)?;
                Maybe(TrCreditPhase).skip(cs)?;
                Maybe(TrComputePhase).skip(cs)?;
                Self::ACTION.skip(cs)?;
                cs.advance(2)
            }
        }
    }

    #[inline]
    fn get_tag(&self, cs: &CellParser<'_>) -> Option<u32> {
        match cs.prefetch_uint(4)? as u32 {
            2 | 3 => Some(Self::TRANS_TICK_TOCK),
            t @ 0..8 => Some(t),
            _ => None,
        }
    }
}

/// The referenced part of `transaction` holding its messages
/// ```tlb
/// _ in_msg:(Maybe ^(Message Any))
///   out_msgs:(HashmapE 15 ^(Message Any))
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionAux;

impl TransactionAux {
    const IN_MSG: Maybe<RefTo<Message>> = Maybe(RefTo(Message));
    const OUT_MSGS: HashmapE<RefTo<Message>> = HashmapE::new(15, RefTo(Message));
}

impl TlbType for TransactionAux {
    fn validate_skip(&self, ops: &mut Ops, cs: &mut CellParser<'_>, weak: bool) -> Option<()> {
        Self::IN_MSG.validate_skip(ops, cs, weak)?;
        Self::OUT_MSGS.validate_skip(ops, cs, weak)
    }

    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        Self::IN_MSG.skip(cs)?;
        Self::OUT_MSGS.skip(cs)
    }
}

/// ```tlb
/// transaction$0111 account_addr:bits256 lt:uint64
///   prev_trans_hash:bits256 prev_trans_lt:uint64 now:uint32
///   outmsg_cnt:uint15
///   orig_status:AccountStatus end_status:AccountStatus
///   ^[ in_msg:(Maybe ^(Message Any)) out_msgs:(HashmapE 15 ^(Message Any)) ]
///   total_fees:CurrencyCollection state_update:^(HASH_UPDATE Account)
///   description:^TransactionDescr = Transaction;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transaction;

impl Transaction {
    pub const TAG: u64 = 0b0111;

    /// Bits between the tag and `orig_status`
    const HEADER_BITS: usize = 256 + 64 + 256 + 64 + 32 + 15;

    /// `total_fees`, fetched as a separate slice
    pub fn get_total_fees<'de>(&self, cs: &CellParser<'de>) -> Option<CellParser<'de>> {
        let mut cs = cs.clone();
        if cs.fetch_uint(4)? != Self::TAG {
            return None;
        }
        cs.advance(Self::HEADER_BITS + 2 + 2)?;
        cs.advance_refs(1)?;
        CurrencyCollection.fetch(&mut cs)
    }

    /// The `description` cell
    pub fn get_descr<'de>(&self, cs: &CellParser<'de>) -> Option<&'de Cell> {
        let mut cs = cs.clone();
        if cs.fetch_uint(4)? != Self::TAG {
            return None;
        }
        cs.advance(Self::HEADER_BITS + 2 + 2)?;
        cs.advance_refs(1)?;
        CurrencyCollection.skip(&mut cs)?;
        cs.advance_refs(1)?;
        cs.fetch_reference().map(|c| &**c)
    }
}

impl TlbType for Transaction {
    fn validate_skip(&self, ops: &mut Ops, cs: &mut CellParser<'_>, weak: bool) -> Option<()> {
        if cs.fetch_uint(4)? != Self::TAG {
            invalid_tag!("Transaction", cs);
            return None;
        }
        // account statuses are any 2 bits
        cs.advance(Self::HEADER_BITS + 2 + 2)?;
        RefTo(TransactionAux).validate_skip(ops, cs, weak)?;
        CurrencyCollection.validate_skip(ops, cs, weak)?;
        RefTo(HashUpdate).validate_skip(ops, cs, weak)?;
        RefTo(TransactionDescr).validate_skip(ops, cs, weak)
    }

    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        cs.advance(4 + Self::HEADER_BITS + 2 + 2)?;
        cs.advance_refs(1)?;
        CurrencyCollection.skip(cs)?;
        cs.advance_refs(2)
    }
}

/// ```tlb
/// update_hashes#72 {X:Type} old_hash:bits256 new_hash:bits256
///   = HASH_UPDATE X;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashUpdate;

impl HashUpdate {
    pub const TAG: u64 = 0x72;
}

impl TlbType for HashUpdate {
    #[inline]
    fn validate_skip(&self, _: &mut Ops, cs: &mut CellParser<'_>, _: bool) -> Option<()> {
        if cs.fetch_uint(8)? != Self::TAG {
            invalid_tag!("HashUpdate", cs);
            return None;
        }
        cs.advance(256 + 256)
    }

    #[inline]
    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        cs.advance(8 + 256 + 256)
    }

    #[inline]
    fn get_size(&self, _: &CellParser<'_>) -> Option<SizeExt> {
        Some(SizeExt::bits_only(8 + 256 + 256))
    }
}

/// Derives the total fees of each transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AugAccountTransactions;

impl Augmentation for AugAccountTransactions {
    #[inline]
    fn value_type(&self) -> &dyn TlbType {
        &RefTo(Transaction)
    }

    #[inline]
    fn extra_type(&self) -> &dyn TlbType {
        &CurrencyCollection
    }

    fn eval_leaf(&self, cb: &mut CellBuilder, value: &mut CellParser<'_>) -> Option<()> {
        let tx = value.fetch_reference()?;
        if tx.exotic {
            return None;
        }
        let fees = Transaction.get_total_fees(&tx.parser())?;
        cb.store(&fees, ()).ok()?;
        Some(())
    }
}

named_type! {
    /// `HashmapAug 64 ^Transaction CurrencyCollection`
    pub struct AccountTransactions: HashmapAug<AugAccountTransactions> =
        HashmapAug::new(64, AugAccountTransactions);
}

/// ```tlb
/// acc_trans#5 account_addr:bits256
///   transactions:(HashmapAug 64 ^Transaction CurrencyCollection)
///   state_update:^(HASH_UPDATE Account)
///   = AccountBlock;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountBlock;

impl AccountBlock {
    pub const TAG: u64 = 5;

    /// Total fees of all its transactions, the root extra of
    /// `transactions`
    pub fn get_total_fees<'de>(&self, cs: &CellParser<'de>) -> Option<CellParser<'de>> {
        let mut cs = cs.clone();
        if cs.fetch_uint(4)? != Self::TAG {
            return None;
        }
        cs.advance(256)?;
        AccountTransactions.inner().extract_extra(&mut cs)?;
        Some(cs)
    }
}

impl TlbType for AccountBlock {
    fn validate_skip(&self, ops: &mut Ops, cs: &mut CellParser<'_>, weak: bool) -> Option<()> {
        if cs.fetch_uint(4)? != Self::TAG {
            invalid_tag!("AccountBlock", cs);
            return None;
        }
        cs.advance(256)?;
        AccountTransactions.validate_skip(ops, cs, weak)?;
        RefTo(HashUpdate).validate_skip(ops, cs, weak)
    }

    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        cs.advance(4 + 256)?;
        AccountTransactions.skip(cs)?;
        cs.advance_refs(1)
    }
}

/// Derives the total fees of each account block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AugShardAccountBlocks;

impl Augmentation for AugShardAccountBlocks {
    #[inline]
    fn value_type(&self) -> &dyn TlbType {
        &AccountBlock
    }

    #[inline]
    fn extra_type(&self) -> &dyn TlbType {
        &CurrencyCollection
    }

    fn eval_leaf(&self, cb: &mut CellBuilder, value: &mut CellParser<'_>) -> Option<()> {
        let fees = AccountBlock.get_total_fees(value)?;
        CurrencyCollection.copy(cb, &fees)
    }
}

named_type! {
    /// ```tlb
    /// _ (HashmapAugE 256 AccountBlock CurrencyCollection)
    ///   = ShardAccountBlocks;
    /// ```
    pub struct ShardAccountBlocks: HashmapAugE<AugShardAccountBlocks> =
        HashmapAugE::new(256, AugShardAccountBlocks);
}
