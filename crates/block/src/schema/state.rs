use tlb::{bits::ser::BitWriterExt, de::CellParser, ser::CellBuilder};

use super::{
    Augmentation, Bits, CurrencyCollection, Hashmap, HashmapAugE, HashmapE, Maybe, Ops,
    OutMsgQueueInfo, PrettyPrinter, RefTo, ShardAccounts, SizeExt, TlbType, True, store_uint,
    store_zeros,
};

/// ```tlb
/// shard_ident$00 shard_pfx_bits:(#<= 60)
///   workchain_id:int32 shard_prefix:uint64 = ShardIdent;
/// ```
///
/// Bits of `shard_prefix` past `shard_pfx_bits` must be zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardIdent;

impl ShardIdent {
    pub const MAX_PFX_BITS: u64 = 60;
    const BITS: usize = 2 + 6 + 32 + 64;

    /// Workchain and shard id (prefix followed by a single tag bit)
    pub fn get_shard(&self, cs: &CellParser<'_>) -> Option<(i32, u64)> {
        let mut cs = cs.clone();
        self.fetch_checked(&mut cs)
            .map(|(pfx_bits, workchain, prefix)| (workchain, prefix | 1 << (63 - pfx_bits)))
    }

    fn fetch_checked(&self, cs: &mut CellParser<'_>) -> Option<(u32, i32, u64)> {
        if cs.fetch_uint(2)? != 0 {
            return None;
        }
        let pfx_bits = cs.fetch_uint_leq(Self::MAX_PFX_BITS)? as u32;
        let workchain = cs.fetch_int(32)? as i32;
        let prefix = cs.fetch_uint(64)?;
        if workchain == i32::MIN || prefix & ((1 << (63 - pfx_bits)) - 1) != 0 {
            return None;
        }
        Some((pfx_bits, workchain, prefix))
    }
}

impl TlbType for ShardIdent {
    #[inline]
    fn validate_skip(&self, _: &mut Ops, cs: &mut CellParser<'_>, _: bool) -> Option<()> {
        self.fetch_checked(cs).map(|_| ())
    }

    #[inline]
    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        cs.advance(Self::BITS)
    }

    #[inline]
    fn get_size(&self, _: &CellParser<'_>) -> Option<SizeExt> {
        Some(SizeExt::bits_only(Self::BITS))
    }

    #[inline]
    fn get_tag(&self, _: &CellParser<'_>) -> Option<u32> {
        Some(0)
    }

    fn print_skip(&self, pp: &mut PrettyPrinter, cs: &mut CellParser<'_>) -> Option<()> {
        let (workchain, shard) = self.get_shard(cs)?;
        self.skip(cs)?;
        pp.out(format_args!("{workchain}:{shard:016x}"))
    }
}

/// ```tlb
/// block_id_ext$_ shard_id:ShardIdent seq_no:uint32
///   root_hash:bits256 file_hash:bits256 = BlockIdExt;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockIdExt;

impl BlockIdExt {
    const BITS: usize = ShardIdent::BITS + 32 + 256 + 256;
}

impl TlbType for BlockIdExt {
    fn validate_skip(&self, ops: &mut Ops, cs: &mut CellParser<'_>, weak: bool) -> Option<()> {
        ShardIdent.validate_skip(ops, cs, weak)?;
        cs.advance(32 + 256 + 256)
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

named_type! {
    /// ```tlb
    /// ext_blk_ref$_ end_lt:uint64 seq_no:uint32
    ///   root_hash:bits256 file_hash:bits256 = ExtBlkRef;
    /// ```
    pub struct ExtBlkRef: Bits = Bits(64 + 32 + 256 + 256);
}

named_type! {
    /// ```tlb
    /// master_info$_ master:ExtBlkRef = BlkMasterInfo;
    /// ```
    pub struct BlkMasterInfo: ExtBlkRef = ExtBlkRef;
}

/// ```tlb
/// prev_blk_info$_ prev:ExtBlkRef = BlkPrevInfo 0;
/// prev_blks_info$_ prev1:ExtBlkRef prev2:ExtBlkRef = BlkPrevInfo 1;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlkPrevInfo {
    merged: bool,
}

impl BlkPrevInfo {
    #[inline]
    pub const fn new(merged: bool) -> Self {
        Self { merged }
    }

    #[inline]
    pub const fn merged(&self) -> bool {
        self.merged
    }

    #[inline]
    const fn count(&self) -> usize {
        if self.merged { 2 } else { 1 }
    }
}

impl TlbType for BlkPrevInfo {
    fn validate_skip(&self, ops: &mut Ops, cs: &mut CellParser<'_>, weak: bool) -> Option<()> {
        for _ in 0..self.count() {
            ExtBlkRef.validate_skip(ops, cs, weak)?;
        }
        Some(())
    }

    #[inline]
    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        let size = self.get_size(cs)?;
        cs.advance_ext(size)
    }

    #[inline]
    fn get_size(&self, cs: &CellParser<'_>) -> Option<SizeExt> {
        let one = ExtBlkRef.get_size(cs)?;
        Some(SizeExt::bits_only(one.bits() * self.count()))
    }
}

/// ```tlb
/// shared_lib_descr$00 lib:^Cell
///   publishers:(Hashmap 256 True) = LibDescr;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LibDescr;

impl LibDescr {
    pub const SHARED_LIB_DESCR: u32 = 0;

    const PUBLISHERS: Hashmap<True> = Hashmap::new(256, True);
}

impl TlbType for LibDescr {
    fn validate_skip(&self, ops: &mut Ops, cs: &mut CellParser<'_>, weak: bool) -> Option<()> {
        if self.get_tag(cs)? != Self::SHARED_LIB_DESCR {
            invalid_tag!("LibDescr", cs);
            return None;
        }
        cs.advance(2)?;
        cs.fetch_reference()?;
        Self::PUBLISHERS.validate_skip(ops, cs, weak)
    }

    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        cs.advance(2)?;
        cs.advance_refs(1)?;
        Self::PUBLISHERS.skip(cs)
    }

    #[inline]
    fn get_tag(&self, cs: &CellParser<'_>) -> Option<u32> {
        cs.prefetch_uint(2).map(|t| t as u32)
    }
}

/// The referenced part of `shard_state`
/// ```tlb
/// ^[ overload_history:uint64 underload_history:uint64
///   total_balance:CurrencyCollection
///   total_validator_fees:CurrencyCollection
///   libraries:(HashmapE 256 LibDescr)
///   master_ref:(Maybe BlkMasterInfo) ]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardStateAux;

impl ShardStateAux {
    const LIBRARIES: HashmapE<LibDescr> = HashmapE::new(256, LibDescr);
}

impl TlbType for ShardStateAux {
    fn validate_skip(&self, ops: &mut Ops, cs: &mut CellParser<'_>, weak: bool) -> Option<()> {
        cs.advance(64 + 64)?;
        CurrencyCollection.validate_skip(ops, cs, weak)?;
        CurrencyCollection.validate_skip(ops, cs, weak)?;
        Self::LIBRARIES.validate_skip(ops, cs, weak)?;
        Maybe(BlkMasterInfo).validate_skip(ops, cs, weak)
    }

    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        cs.advance(64 + 64)?;
        CurrencyCollection.skip(cs)?;
        CurrencyCollection.skip(cs)?;
        Self::LIBRARIES.skip(cs)?;
        Maybe(BlkMasterInfo).skip(cs)
    }
}

/// ```tlb
/// masterchain_state_extra#cc26 ... = McStateExtra;
/// ```
///
/// Only the tag is checked, the rest of the cell is taken as is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct McStateExtra;

impl McStateExtra {
    pub const TAG: u64 = 0xcc26;
}

impl TlbType for McStateExtra {
    fn validate_skip(&self, _: &mut Ops, cs: &mut CellParser<'_>, _: bool) -> Option<()> {
        if cs.fetch_uint(16)? != Self::TAG {
            invalid_tag!("McStateExtra", cs);
            return None;
        }
        cs.take_rest();
        Some(())
    }

    #[inline]
    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        cs.take_rest();
        Some(())
    }
}

/// ```tlb
/// shard_state#9023afe2 global_id:int32
///   shard_id:ShardIdent
///   seq_no:uint32 vert_seq_no:#
///   gen_utime:uint32 gen_lt:uint64
///   min_ref_mc_seqno:uint32
///   out_msg_queue_info:^OutMsgQueueInfo
///   before_split:(## 1)
///   accounts:^ShardAccounts
///   ^[ ... ]
///   custom:(Maybe ^McStateExtra)
///   = ShardStateUnsplit;
/// ```
///
/// `seq_no` is read as signed and must be at least `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardState;

impl ShardState {
    pub const SHARD_STATE: u32 = 0x9023afe2;

    const CUSTOM: Maybe<RefTo<McStateExtra>> = Maybe(RefTo(McStateExtra));
}

impl TlbType for ShardState {
    fn validate_skip(&self, ops: &mut Ops, cs: &mut CellParser<'_>, weak: bool) -> Option<()> {
        if self.get_tag(cs).is_none() {
            invalid_tag!("ShardState", cs);
            return None;
        }
        cs.advance(32 + 32)?;
        ShardIdent.validate_skip(ops, cs, weak)?;
        if cs.fetch_int(32)? < -1 {
            return None;
        }
        cs.advance(32 + 32 + 64 + 32)?;
        RefTo(OutMsgQueueInfo).validate_skip(ops, cs, weak)?;
        cs.advance(1)?;
        ShardAccounts.validate_skip_ref(ops, cs, weak)?;
        ShardStateAux.validate_skip_ref(ops, cs, weak)?;
        Self::CUSTOM.validate_skip(ops, cs, weak)
    }

    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        self.get_tag(cs)?;
        cs.advance(32 + 32)?;
        ShardIdent.skip(cs)?;
        cs.advance(32 + 32 + 32 + 64 + 32)?;
        cs.advance_refs(1)?;
        cs.advance(1)?;
        cs.advance_refs(2)?;
        Self::CUSTOM.skip(cs)
    }

    #[inline]
    fn get_tag(&self, cs: &CellParser<'_>) -> Option<u32> {
        (cs.prefetch_uint(32)? == Self::SHARD_STATE as u64).then_some(Self::SHARD_STATE)
    }
}

named_type! {
    /// ```tlb
    /// _ key:Bool blk_ref:ExtBlkRef = KeyExtBlkRef;
    /// ```
    pub struct KeyExtBlkRef: Bits = Bits(1 + 64 + 32 + 256 + 256);
}

/// ```tlb
/// _ key:Bool max_end_lt:uint64 = KeyMaxLt;
/// ```
///
/// Sums are the disjunction of keys and the greatest `max_end_lt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyMaxLt;

impl TlbType for KeyMaxLt {
    #[inline]
    fn validate_skip(&self, _: &mut Ops, cs: &mut CellParser<'_>, _: bool) -> Option<()> {
        self.skip(cs)
    }

    #[inline]
    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        cs.advance(1 + 64)
    }

    #[inline]
    fn get_size(&self, _: &CellParser<'_>) -> Option<SizeExt> {
        Some(SizeExt::bits_only(1 + 64))
    }

    #[inline]
    fn null_value(&self, cb: &mut CellBuilder) -> Option<()> {
        store_zeros(cb, 1 + 64)
    }

    fn add_values(
        &self,
        cb: &mut CellBuilder,
        cs1: &mut CellParser<'_>,
        cs2: &mut CellParser<'_>,
    ) -> Option<()> {
        let (key1, lt1) = (cs1.fetch_uint(1)?, cs1.fetch_uint(64)?);
        let (key2, lt2) = (cs2.fetch_uint(1)?, cs2.fetch_uint(64)?);
        store_uint(cb, key1 | key2, 1)?;
        store_uint(cb, lt1.max(lt2), 64)
    }
}

/// Keeps the key flag and the end lt of each block reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AugOldMcBlocksInfo;

impl Augmentation for AugOldMcBlocksInfo {
    #[inline]
    fn value_type(&self) -> &dyn TlbType {
        &KeyExtBlkRef
    }

    #[inline]
    fn extra_type(&self) -> &dyn TlbType {
        &KeyMaxLt
    }

    fn eval_leaf(&self, cb: &mut CellBuilder, value: &mut CellParser<'_>) -> Option<()> {
        cb.pack(value.prefetch_bits(1 + 64)?, ()).ok()?;
        Some(())
    }
}

named_type! {
    /// ```tlb
    /// _ (HashmapAugE 32 KeyExtBlkRef KeyMaxLt) = OldMcBlocksInfo;
    /// ```
    pub struct OldMcBlocksInfo: HashmapAugE<AugOldMcBlocksInfo> =
        HashmapAugE::new(32, AugOldMcBlocksInfo);
}

/// ```tlb
/// _ fees:CurrencyCollection create:CurrencyCollection
///   = ShardFeeCreated;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardFeeCreated;

impl TlbType for ShardFeeCreated {
    fn validate_skip(&self, ops: &mut Ops, cs: &mut CellParser<'_>, weak: bool) -> Option<()> {
        CurrencyCollection.validate_skip(ops, cs, weak)?;
        CurrencyCollection.validate_skip(ops, cs, weak)
    }

    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        CurrencyCollection.skip(cs)?;
        CurrencyCollection.skip(cs)
    }

    fn null_value(&self, cb: &mut CellBuilder) -> Option<()> {
        CurrencyCollection.null_value(cb)?;
        CurrencyCollection.null_value(cb)
    }

    fn add_values(
        &self,
        cb: &mut CellBuilder,
        cs1: &mut CellParser<'_>,
        cs2: &mut CellParser<'_>,
    ) -> Option<()> {
        CurrencyCollection.add_values(cb, cs1, cs2)?;
        CurrencyCollection.add_values(cb, cs1, cs2)
    }

    fn print_skip(&self, pp: &mut PrettyPrinter, cs: &mut CellParser<'_>) -> Option<()> {
        pp.open("")?;
        pp.field("fees")?;
        CurrencyCollection.print_skip(pp, cs)?;
        pp.field("create")?;
        CurrencyCollection.print_skip(pp, cs)?;
        pp.close()
    }
}

/// The extra of a shard is its value itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AugShardFees;

impl Augmentation for AugShardFees {
    #[inline]
    fn value_type(&self) -> &dyn TlbType {
        &ShardFeeCreated
    }

    #[inline]
    fn extra_type(&self) -> &dyn TlbType {
        &ShardFeeCreated
    }

    fn eval_leaf(&self, cb: &mut CellBuilder, value: &mut CellParser<'_>) -> Option<()> {
        let copy = value.clone();
        ShardFeeCreated.skip(value)?;
        if !value.is_empty() {
            return None;
        }
        cb.store(&copy, ()).ok()?;
        Some(())
    }
}

named_type! {
    /// ```tlb
    /// _ (HashmapAugE 96 ShardFeeCreated ShardFeeCreated) = ShardFees;
    /// ```
    pub struct ShardFees: HashmapAugE<AugShardFees> = HashmapAugE::new(96, AugShardFees);
}
