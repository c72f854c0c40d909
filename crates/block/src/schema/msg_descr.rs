//! Inbound and outbound message descriptors of a block and the outbound
//! message queue of a shard.
use tlb::{de::CellParser, ser::CellBuilder};

use super::{
    Augmentation, Bits, CommonMsgInfo, CurrencyCollection, Grams, HashmapAugE, HashmapE,
    Message, MsgEnvelope, Ops, PrettyPrinter, RefAnything, RefTo, SizeExt, TlbType, Transaction,
    UInt, store_uint, store_zeros,
};

/// ```tlb
/// import_fees$_ fees_collected:Grams
///   value_imported:CurrencyCollection = ImportFees;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportFees;

impl TlbType for ImportFees {
    fn validate_skip(&self, ops: &mut Ops, cs: &mut CellParser<'_>, weak: bool) -> Option<()> {
        Grams.validate_skip(ops, cs, weak)?;
        CurrencyCollection.validate_skip(ops, cs, weak)
    }

    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        Grams.skip(cs)?;
        CurrencyCollection.skip(cs)
    }

    #[inline]
    fn null_value(&self, cb: &mut CellBuilder) -> Option<()> {
        store_zeros(cb, 4 + 4 + 1)
    }

    fn add_values(
        &self,
        cb: &mut CellBuilder,
        cs1: &mut CellParser<'_>,
        cs2: &mut CellParser<'_>,
    ) -> Option<()> {
        Grams.add_values(cb, cs1, cs2)?;
        CurrencyCollection.add_values(cb, cs1, cs2)
    }

    fn print_skip(&self, pp: &mut PrettyPrinter, cs: &mut CellParser<'_>) -> Option<()> {
        pp.open("import_fees")?;
        pp.field("fees_collected")?;
        Grams.print_skip(pp, cs)?;
        pp.field("value_imported")?;
        CurrencyCollection.print_skip(pp, cs)?;
        pp.close()
    }
}

/// Parses the envelope at the first reference and stores
/// `value + ihr_fee + fwd_fee_remaining` of its message
fn store_envelope_value(cb: &mut CellBuilder, cs: &CellParser<'_>) -> Option<()> {
    let env = cs.prefetch_reference()?;
    if env.exotic {
        return None;
    }
    let (fwd_fee_remaining, mut msg) = MsgEnvelope.unpack_value(&env.parser())?;
    CurrencyCollection.skip_add_grams(cb, &mut msg.value, &(msg.ihr_fee + fwd_fee_remaining))
}

/// ```tlb
/// msg_import_ext$000 msg:^(Message Any) transaction:^Transaction
///   = InMsg;
/// msg_import_ihr$010 msg:^(Message Any) transaction:^Transaction
///   ihr_fee:Grams proof_created:^Cell = InMsg;
/// msg_import_imm$011 in_msg:^MsgEnvelope
///   transaction:^Transaction fwd_fee:Grams = InMsg;
/// msg_import_fin$100 in_msg:^MsgEnvelope
///   transaction:^Transaction fwd_fee:Grams = InMsg;
/// msg_import_tr$101 in_msg:^MsgEnvelope out_msg:^MsgEnvelope
///   transit_fee:Grams = InMsg;
/// msg_discard_fin$110 in_msg:^MsgEnvelope transaction_id:uint64
///   fwd_fee:Grams = InMsg;
/// msg_discard_tr$111 in_msg:^MsgEnvelope transaction_id:uint64
///   fwd_fee:Grams proof_delivered:^Cell = InMsg;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InMsg;

impl InMsg {
    pub const MSG_IMPORT_EXT: u32 = 0;
    pub const MSG_IMPORT_IHR: u32 = 2;
    pub const MSG_IMPORT_IMM: u32 = 3;
    pub const MSG_IMPORT_FIN: u32 = 4;
    pub const MSG_IMPORT_TR: u32 = 5;
    pub const MSG_DISCARD_FIN: u32 = 6;
    pub const MSG_DISCARD_TR: u32 = 7;

    /// Stores the [`ImportFees`] of the descriptor at the cursor
    pub fn get_import_fees(&self, cb: &mut CellBuilder, cs: &mut CellParser<'_>) -> Option<()> {
        match self.get_tag(cs)? {
            Self::MSG_IMPORT_EXT => {
                self.skip(cs)?;
                ImportFees.null_value(cb)
            }
            Self::MSG_IMPORT_IHR => {
                if !cs.have_refs(3) {
                    return None;
                }
                let msg = cs.prefetch_reference()?;
                if msg.exotic {
                    return None;
                }
                cs.advance(3)?;
                let ihr_fee = Grams.as_integer_skip(cs)?;
                let mut info = CommonMsgInfo.int_value(&msg.parser())?;
                if info.ihr_fee != ihr_fee {
                    return None;
                }
                Grams.store_integer_value(cb, &ihr_fee)?;
                CurrencyCollection.skip_add_grams(cb, &mut info.value, &ihr_fee)
            }
            Self::MSG_IMPORT_IMM => {
                if !cs.have_refs(2) {
                    return None;
                }
                cs.advance(3)?;
                Grams.skip_copy(cb, cs)?;
                CurrencyCollection.null_value(cb)
            }
            Self::MSG_IMPORT_FIN => {
                let env = cs.prefetch_reference()?;
                if env.exotic {
                    return None;
                }
                cs.advance(3)?;
                let fwd_fee = Grams.as_integer_skip(cs)?;
                let (fwd_fee_remaining, mut msg) = MsgEnvelope.unpack_value(&env.parser())?;
                if fwd_fee != fwd_fee_remaining {
                    return None;
                }
                Grams.store_integer_value(cb, &fwd_fee_remaining)?;
                CurrencyCollection.skip_add_grams(
                    cb,
                    &mut msg.value,
                    &(msg.ihr_fee + fwd_fee_remaining),
                )
            }
            Self::MSG_IMPORT_TR => {
                let env = cs.prefetch_reference()?;
                if env.exotic {
                    return None;
                }
                cs.advance(3)?;
                let transit_fee = Grams.as_integer_skip(cs)?;
                let (fwd_fee_remaining, mut msg) = MsgEnvelope.unpack_value(&env.parser())?;
                if transit_fee > fwd_fee_remaining {
                    return None;
                }
                Grams.store_integer_value(cb, &transit_fee)?;
                CurrencyCollection.skip_add_grams(
                    cb,
                    &mut msg.value,
                    &(msg.ihr_fee + fwd_fee_remaining),
                )
            }
            tag => {
                let refs = if tag == Self::MSG_DISCARD_FIN { 1 } else { 2 };
                if !cs.have_refs(refs) {
                    return None;
                }
                cs.advance(3 + 64)?;
                let fwd_fee = Grams.as_integer_skip(cs)?;
                Grams.store_integer_value(cb, &fwd_fee)?;
                CurrencyCollection.store_grams(cb, &fwd_fee)
            }
        }
    }
}

impl TlbType for InMsg {
    fn validate_skip(&self, ops: &mut Ops, cs: &mut CellParser<'_>, weak: bool) -> Option<()> {
        let Some(tag) = self.get_tag(cs) else {
            invalid_tag!("InMsg", cs);
            return None;
        };
        cs.advance(3)?;
        match tag {
            Self::MSG_IMPORT_EXT => {
                RefTo(Message).validate_skip(ops, cs, weak)?;
                RefTo(Transaction).validate_skip(ops, cs, weak)
            }
            Self::MSG_IMPORT_IHR => {
                RefTo(Message).validate_skip(ops, cs, weak)?;
                RefTo(Transaction).validate_skip(ops, cs, weak)?;
                Grams.validate_skip(ops, cs, weak)?;
                RefAnything.validate_skip(ops, cs, weak)
            }
            Self::MSG_IMPORT_IMM | Self::MSG_IMPORT_FIN => {
                RefTo(MsgEnvelope).validate_skip(ops, cs, weak)?;
                RefTo(Transaction).validate_skip(ops, cs, weak)?;
                Grams.validate_skip(ops, cs, weak)
            }
            Self::MSG_IMPORT_TR => {
                RefTo(MsgEnvelope).validate_skip(ops, cs, weak)?;
                RefTo(MsgEnvelope).validate_skip(ops, cs, weak)?;
                Grams.validate_skip(ops, cs, weak)
            }
            Self::MSG_DISCARD_FIN => {
                RefTo(MsgEnvelope).validate_skip(ops, cs, weak)?;
                cs.advance(64)?;
                Grams.validate_skip(ops, cs, weak)
            }
            _ => {
                RefTo(MsgEnvelope).validate_skip(ops, cs, weak)?;
                cs.advance(64)?;
                Grams.validate_skip(ops, cs, weak)?;
                RefAnything.validate_skip(ops, cs, weak)
            }
        }
    }

    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        let tag = self.get_tag(cs)?;
        cs.advance(3)?;
        match tag {
            Self::MSG_IMPORT_EXT => cs.advance_refs(2),
            Self::MSG_IMPORT_IHR => {
                cs.advance_refs(2)?;
                Grams.skip(cs)?;
                cs.advance_refs(1)
            }
            Self::MSG_IMPORT_IMM | Self::MSG_IMPORT_FIN | Self::MSG_IMPORT_TR => {
                cs.advance_refs(2)?;
                Grams.skip(cs)
            }
            Self::MSG_DISCARD_FIN => {
                cs.advance_refs(1)?;
                cs.advance(64)?;
                Grams.skip(cs)
            }
            _ => {
                cs.advance_refs(1)?;
                cs.advance(64)?;
                Grams.skip(cs)?;
                cs.advance_refs(1)
            }
        }
    }

    #[inline]
    fn get_tag(&self, cs: &CellParser<'_>) -> Option<u32> {
        match cs.prefetch_uint(3)? as u32 {
            1 => None,
            t => Some(t),
        }
    }
}

/// ```tlb
/// msg_export_ext$000 msg:^(Message Any)
///   transaction:^Transaction = OutMsg;
/// msg_export_new$001 out_msg:^MsgEnvelope
///   transaction:^Transaction = OutMsg;
/// msg_export_imm$010 out_msg:^MsgEnvelope
///   transaction:^Transaction reimport:^InMsg = OutMsg;
/// msg_export_tr$011 out_msg:^MsgEnvelope
///   imported:^InMsg = OutMsg;
/// msg_export_deq_imm$100 out_msg:^MsgEnvelope
///   reimport:^InMsg = OutMsg;
/// msg_export_deq$110 out_msg:^MsgEnvelope
///   import_block_lt:uint64 = OutMsg;
/// msg_export_tr_req$111 out_msg:^MsgEnvelope
///   imported:^InMsg = OutMsg;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutMsg;

impl OutMsg {
    pub const MSG_EXPORT_EXT: u32 = 0;
    pub const MSG_EXPORT_NEW: u32 = 1;
    pub const MSG_EXPORT_IMM: u32 = 2;
    pub const MSG_EXPORT_TR: u32 = 3;
    pub const MSG_EXPORT_DEQ_IMM: u32 = 4;
    pub const MSG_EXPORT_DEQ: u32 = 6;
    pub const MSG_EXPORT_TR_REQ: u32 = 7;

    /// Stores the value exported by the descriptor at the cursor
    pub fn get_export_value(&self, cb: &mut CellBuilder, cs: &mut CellParser<'_>) -> Option<()> {
        match self.get_tag(cs)? {
            Self::MSG_EXPORT_EXT => {
                cs.have_ext(SizeExt::new(3, 2)).then_some(())?;
                CurrencyCollection.null_value(cb)
            }
            Self::MSG_EXPORT_IMM => {
                cs.have_refs(3).then_some(())?;
                CurrencyCollection.null_value(cb)
            }
            Self::MSG_EXPORT_DEQ_IMM => {
                cs.have_refs(2).then_some(())?;
                CurrencyCollection.null_value(cb)
            }
            Self::MSG_EXPORT_DEQ => {
                cs.have_refs(1).then_some(())?;
                CurrencyCollection.null_value(cb)
            }
            _ => store_envelope_value(cb, cs),
        }
    }

    /// `created_lt` of the exported message
    pub fn get_created_lt(&self, cs: &CellParser<'_>) -> Option<u64> {
        let tag = self.get_tag(cs)?;
        let msg = cs.prefetch_reference()?;
        if msg.exotic {
            return None;
        }
        match tag {
            Self::MSG_EXPORT_EXT => Message.get_created_lt(&msg.parser()),
            _ => MsgEnvelope.get_created_lt(&msg.parser()),
        }
    }
}

impl TlbType for OutMsg {
    fn validate_skip(&self, ops: &mut Ops, cs: &mut CellParser<'_>, weak: bool) -> Option<()> {
        let Some(tag) = self.get_tag(cs) else {
            invalid_tag!("OutMsg", cs);
            return None;
        };
        cs.advance(3)?;
        match tag {
            Self::MSG_EXPORT_EXT => {
                RefTo(Message).validate_skip(ops, cs, weak)?;
                RefTo(Transaction).validate_skip(ops, cs, weak)
            }
            Self::MSG_EXPORT_NEW => {
                RefTo(MsgEnvelope).validate_skip(ops, cs, weak)?;
                RefTo(Transaction).validate_skip(ops, cs, weak)
            }
            Self::MSG_EXPORT_IMM => {
                RefTo(MsgEnvelope).validate_skip(ops, cs, weak)?;
                RefTo(Transaction).validate_skip(ops, cs, weak)?;
                RefTo(InMsg).validate_skip(ops, cs, weak)
            }
            Self::MSG_EXPORT_DEQ => {
                RefTo(MsgEnvelope).validate_skip(ops, cs, weak)?;
                cs.advance(64)
            }
            // tr, deq_imm, tr_req
            _ => {
                RefTo(MsgEnvelope).validate_skip(ops, cs, weak)?;
                RefTo(InMsg).validate_skip(ops, cs, weak)
            }
        }
    }

    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        let tag = self.get_tag(cs)?;
        cs.advance(3)?;
        match tag {
            Self::MSG_EXPORT_IMM => cs.advance_refs(3),
            Self::MSG_EXPORT_DEQ => {
                cs.advance_refs(1)?;
                cs.advance(64)
            }
            _ => cs.advance_refs(2),
        }
    }

    #[inline]
    fn get_tag(&self, cs: &CellParser<'_>) -> Option<u32> {
        match cs.prefetch_uint(3)? as u32 {
            5 => None,
            t => Some(t),
        }
    }
}

/// Derives [`ImportFees`] from each inbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AugInMsgDescr;

impl Augmentation for AugInMsgDescr {
    #[inline]
    fn value_type(&self) -> &dyn TlbType {
        &InMsg
    }

    #[inline]
    fn extra_type(&self) -> &dyn TlbType {
        &ImportFees
    }

    #[inline]
    fn eval_leaf(&self, cb: &mut CellBuilder, value: &mut CellParser<'_>) -> Option<()> {
        InMsg.get_import_fees(cb, value)
    }
}

/// Derives the exported value of each outbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AugOutMsgDescr;

impl Augmentation for AugOutMsgDescr {
    #[inline]
    fn value_type(&self) -> &dyn TlbType {
        &OutMsg
    }

    #[inline]
    fn extra_type(&self) -> &dyn TlbType {
        &CurrencyCollection
    }

    #[inline]
    fn eval_leaf(&self, cb: &mut CellBuilder, value: &mut CellParser<'_>) -> Option<()> {
        OutMsg.get_export_value(cb, value)
    }
}

named_type! {
    /// ```tlb
    /// _ (HashmapAugE 256 InMsg ImportFees) = InMsgDescr;
    /// ```
    pub struct InMsgDescr: HashmapAugE<AugInMsgDescr> = HashmapAugE::new(256, AugInMsgDescr);
}

named_type! {
    /// ```tlb
    /// _ (HashmapAugE 256 OutMsg CurrencyCollection) = OutMsgDescr;
    /// ```
    pub struct OutMsgDescr: HashmapAugE<AugOutMsgDescr> = HashmapAugE::new(256, AugOutMsgDescr);
}

/// ```tlb
/// _ enqueued_lt:uint64 out_msg:^MsgEnvelope = EnqueuedMsg;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnqueuedMsg;

impl TlbType for EnqueuedMsg {
    fn validate_skip(&self, ops: &mut Ops, cs: &mut CellParser<'_>, weak: bool) -> Option<()> {
        cs.advance(64)?;
        RefTo(MsgEnvelope).validate_skip(ops, cs, weak)
    }

    #[inline]
    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        cs.advance_ext(SizeExt::new(64, 1))
    }

    #[inline]
    fn get_size(&self, _: &CellParser<'_>) -> Option<SizeExt> {
        Some(SizeExt::new(64, 1))
    }
}

/// Keeps the least `created_lt` of the queued messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AugOutMsgQueue;

impl Augmentation for AugOutMsgQueue {
    #[inline]
    fn value_type(&self) -> &dyn TlbType {
        &EnqueuedMsg
    }

    #[inline]
    fn extra_type(&self) -> &dyn TlbType {
        &UInt(64)
    }

    fn eval_leaf(&self, cb: &mut CellBuilder, value: &mut CellParser<'_>) -> Option<()> {
        let env = value.fetch_reference()?;
        if env.exotic {
            return None;
        }
        let created_lt = MsgEnvelope.get_created_lt(&env.parser())?;
        store_uint(cb, created_lt, 64)
    }

    fn eval_fork(
        &self,
        cb: &mut CellBuilder,
        left: &mut CellParser<'_>,
        right: &mut CellParser<'_>,
    ) -> Option<()> {
        let x = left.fetch_uint(64)?;
        let y = right.fetch_uint(64)?;
        store_uint(cb, x.min(y), 64)
    }

    #[inline]
    fn eval_empty(&self, cb: &mut CellBuilder) -> Option<()> {
        store_zeros(cb, 64)
    }
}

named_type! {
    /// ```tlb
    /// _ (HashmapAugE 352 EnqueuedMsg uint64) = OutMsgQueue;
    /// ```
    ///
    /// Keys are the destination workchain, the first 64 bits of the
    /// destination address and the message hash.
    pub struct OutMsgQueue: HashmapAugE<AugOutMsgQueue> =
        HashmapAugE::new(32 + 64 + 256, AugOutMsgQueue);
}

named_type! {
    /// ```tlb
    /// processed_upto$_ last_msg_lt:uint64 last_msg_hash:bits256
    ///   = ProcessedUpto;
    /// ```
    pub struct ProcessedUpto: Bits = Bits(64 + 256);
}

named_type! {
    /// ```tlb
    /// _ (HashmapE 96 ProcessedUpto) = ProcessedInfo;
    /// ```
    pub struct ProcessedInfo: HashmapE<ProcessedUpto> = HashmapE::new(32 + 64, ProcessedUpto);
}

named_type! {
    /// ```tlb
    /// _ (HashmapE 256 uint128) = IhrPendingInfo;
    /// ```
    pub struct IhrPendingInfo: HashmapE<UInt> = HashmapE::new(256, UInt(128));
}

/// ```tlb
/// _ out_queue:OutMsgQueue proc_info:ProcessedInfo
///   ihr_pending:IhrPendingInfo = OutMsgQueueInfo;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutMsgQueueInfo;

impl TlbType for OutMsgQueueInfo {
    fn validate_skip(&self, ops: &mut Ops, cs: &mut CellParser<'_>, weak: bool) -> Option<()> {
        OutMsgQueue.validate_skip(ops, cs, weak)?;
        ProcessedInfo.validate_skip(ops, cs, weak)?;
        IhrPendingInfo.validate_skip(ops, cs, weak)
    }

    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        OutMsgQueue.skip(cs)?;
        ProcessedInfo.skip(cs)?;
        IhrPendingInfo.skip(cs)
    }

    fn print_skip(&self, pp: &mut PrettyPrinter, cs: &mut CellParser<'_>) -> Option<()> {
        pp.open("")?;
        pp.field("out_queue")?;
        OutMsgQueue.print_skip(pp, cs)?;
        pp.field("proc_info")?;
        ProcessedInfo.print_skip(pp, cs)?;
        pp.field("ihr_pending")?;
        IhrPendingInfo.print_skip(pp, cs)?;
        pp.close()
    }
}
