use num_bigint::BigInt;
use tlb::de::CellParser;

use super::{
    Anything, Bits, CurrencyCollection, Either, Grams, Maybe, MsgAddressExt, MsgAddressInt, Ops,
    PrettyPrinter, RefAnything, RefTo, SizeExt, TlbType, UInt,
};

/// ```tlb
/// int_msg_info$0 ihr_disabled:Bool bounce:Bool bounced:Bool
///   src:MsgAddressInt dest:MsgAddressInt
///   value:CurrencyCollection ihr_fee:Grams fwd_fee:Grams
///   created_lt:uint64 created_at:uint32 = CommonMsgInfo;
/// ext_in_msg_info$10 src:MsgAddressExt dest:MsgAddressInt
///   import_fee:Grams = CommonMsgInfo;
/// ext_out_msg_info$11 src:MsgAddressInt dest:MsgAddressExt
///   created_lt:uint64 created_at:uint32 = CommonMsgInfo;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommonMsgInfo;

/// Amounts carried by an internal message
#[derive(Debug, Clone)]
pub struct IntMsgValue<'de> {
    /// `value:CurrencyCollection` slice
    pub value: CellParser<'de>,
    pub ihr_fee: BigInt,
    pub fwd_fee: BigInt,
}

impl CommonMsgInfo {
    pub const INT_MSG_INFO: u32 = 0;
    pub const EXT_IN_MSG_INFO: u32 = 2;
    pub const EXT_OUT_MSG_INFO: u32 = 3;

    /// `created_lt` of internal and outbound external messages
    pub fn get_created_lt(&self, cs: &CellParser<'_>) -> Option<u64> {
        let mut cs = cs.clone();
        match self.get_tag(&cs)? {
            Self::INT_MSG_INFO => {
                cs.advance(4)?;
                MsgAddressInt.skip(&mut cs)?;
                MsgAddressInt.skip(&mut cs)?;
                CurrencyCollection.skip(&mut cs)?;
                Grams.skip(&mut cs)?;
                Grams.skip(&mut cs)?;
            }
            Self::EXT_OUT_MSG_INFO => {
                cs.advance(2)?;
                MsgAddressInt.skip(&mut cs)?;
                MsgAddressExt.skip(&mut cs)?;
            }
            _ => return None,
        }
        let created_lt = cs.fetch_uint(64)?;
        cs.advance(32)?;
        Some(created_lt)
    }

    /// Value and fees of an `int_msg_info`
    pub fn int_value<'de>(&self, cs: &CellParser<'de>) -> Option<IntMsgValue<'de>> {
        if self.get_tag(cs)? != Self::INT_MSG_INFO {
            return None;
        }
        let mut cs = cs.clone();
        cs.advance(4)?;
        MsgAddressInt.skip(&mut cs)?;
        MsgAddressInt.skip(&mut cs)?;
        Some(IntMsgValue {
            value: CurrencyCollection.fetch(&mut cs)?,
            ihr_fee: Grams.as_integer_skip(&mut cs)?,
            fwd_fee: Grams.as_integer_skip(&mut cs)?,
        })
    }
}

impl TlbType for CommonMsgInfo {
    fn validate_skip(&self, ops: &mut Ops, cs: &mut CellParser<'_>, weak: bool) -> Option<()> {
        match self.get_tag(cs) {
            Some(Self::INT_MSG_INFO) => {
                cs.advance(4)?;
                MsgAddressInt.validate_skip(ops, cs, weak)?;
                MsgAddressInt.validate_skip(ops, cs, weak)?;
                CurrencyCollection.validate_skip(ops, cs, weak)?;
                Grams.validate_skip(ops, cs, weak)?;
                Grams.validate_skip(ops, cs, weak)?;
                cs.advance(64 + 32)
            }
            Some(Self::EXT_IN_MSG_INFO) => {
                cs.advance(2)?;
                MsgAddressExt.validate_skip(ops, cs, weak)?;
                MsgAddressInt.validate_skip(ops, cs, weak)?;
                Grams.validate_skip(ops, cs, weak)
            }
            Some(Self::EXT_OUT_MSG_INFO) => {
                cs.advance(2)?;
                MsgAddressInt.validate_skip(ops, cs, weak)?;
                MsgAddressExt.validate_skip(ops, cs, weak)?;
                cs.advance(64 + 32)
            }
            _ => {
                invalid_tag!("CommonMsgInfo", cs);
                None
            }
        }
    }

    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        match self.get_tag(cs)? {
            Self::INT_MSG_INFO => {
                cs.advance(4)?;
                MsgAddressInt.skip(cs)?;
                MsgAddressInt.skip(cs)?;
                CurrencyCollection.skip(cs)?;
                Grams.skip(cs)?;
                Grams.skip(cs)?;
                cs.advance(64 + 32)
            }
            Self::EXT_IN_MSG_INFO => {
                cs.advance(2)?;
                MsgAddressExt.skip(cs)?;
                MsgAddressInt.skip(cs)?;
                Grams.skip(cs)
            }
            _ => {
                cs.advance(2)?;
                MsgAddressInt.skip(cs)?;
                MsgAddressExt.skip(cs)?;
                cs.advance(64 + 32)
            }
        }
    }

    #[inline]
    fn get_tag(&self, cs: &CellParser<'_>) -> Option<u32> {
        match cs.prefetch_uint(2)? as u32 {
            0 | 1 => Some(Self::INT_MSG_INFO),
            t => Some(t),
        }
    }

    fn print_skip(&self, pp: &mut PrettyPrinter, cs: &mut CellParser<'_>) -> Option<()> {
        match self.get_tag(cs)? {
            Self::INT_MSG_INFO => {
                cs.advance(1)?;
                pp.open("int_msg_info")?;
                for flag in ["ihr_disabled", "bounce", "bounced"] {
                    pp.field(flag)?;
                    pp.out(cs.fetch_uint(1)?)?;
                }
                pp.field("src")?;
                MsgAddressInt.print_skip(pp, cs)?;
                pp.field("dest")?;
                MsgAddressInt.print_skip(pp, cs)?;
                pp.field("value")?;
                CurrencyCollection.print_skip(pp, cs)?;
                pp.field("ihr_fee")?;
                Grams.print_skip(pp, cs)?;
                pp.field("fwd_fee")?;
                Grams.print_skip(pp, cs)?;
            }
            Self::EXT_IN_MSG_INFO => {
                cs.advance(2)?;
                pp.open("ext_in_msg_info")?;
                pp.field("src")?;
                MsgAddressExt.print_skip(pp, cs)?;
                pp.field("dest")?;
                MsgAddressInt.print_skip(pp, cs)?;
                pp.field("import_fee")?;
                Grams.print_skip(pp, cs)?;
                return pp.close();
            }
            _ => {
                cs.advance(2)?;
                pp.open("ext_out_msg_info")?;
                pp.field("src")?;
                MsgAddressInt.print_skip(pp, cs)?;
                pp.field("dest")?;
                MsgAddressExt.print_skip(pp, cs)?;
            }
        }
        pp.field("created_lt")?;
        pp.out(cs.fetch_uint(64)?)?;
        pp.field("created_at")?;
        pp.out(cs.fetch_uint(32)?)?;
        pp.close()
    }
}

/// `tick_tock$_ tick:Bool tock:Bool = TickTock;`
pub const TICK_TOCK: Bits = Bits(2);

/// ```tlb
/// _ split_depth:(Maybe (## 5)) special:(Maybe TickTock)
///   code:(Maybe ^Cell) data:(Maybe ^Cell)
///   library:(Maybe ^Cell) = StateInit;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateInit;

impl StateInit {
    /// Skips `split_depth` and returns `special` as two bits `tick tock`,
    /// zero when absent
    pub fn get_ticktock(&self, cs: &mut CellParser<'_>) -> Option<u8> {
        Maybe(UInt(5)).skip(cs)?;
        match cs.fetch_uint(1)? {
            0 => Some(0),
            _ => cs.fetch_uint(2).map(|t| t as u8),
        }
    }
}

impl TlbType for StateInit {
    fn validate_skip(&self, ops: &mut Ops, cs: &mut CellParser<'_>, weak: bool) -> Option<()> {
        Maybe(UInt(5)).validate_skip(ops, cs, weak)?;
        Maybe(TICK_TOCK).validate_skip(ops, cs, weak)?;
        // code, data, library
        for _ in 0..3 {
            Maybe(RefAnything).validate_skip(ops, cs, weak)?;
        }
        Some(())
    }

    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        Maybe(UInt(5)).skip(cs)?;
        Maybe(TICK_TOCK).skip(cs)?;
        for _ in 0..3 {
            Maybe(RefAnything).skip(cs)?;
        }
        Some(())
    }

    fn print_skip(&self, pp: &mut PrettyPrinter, cs: &mut CellParser<'_>) -> Option<()> {
        pp.open("")?;
        pp.field("split_depth")?;
        Maybe(UInt(5)).print_skip(pp, cs)?;
        pp.field("special")?;
        Maybe(TICK_TOCK).print_skip(pp, cs)?;
        for name in ["code", "data", "library"] {
            pp.field(name)?;
            Maybe(RefAnything).print_skip(pp, cs)?;
        }
        pp.close()
    }
}

/// ```tlb
/// message$_ {X:Type} info:CommonMsgInfo
///   init:(Maybe (Either StateInit ^StateInit))
///   body:(Either X ^X) = Message X;
/// ```
///
/// The body is not interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message;

impl Message {
    const INIT: Maybe<Either<StateInit, RefTo<StateInit>>> =
        Maybe(Either(StateInit, RefTo(StateInit)));
    const BODY: Either<Anything, RefAnything> = Either(Anything, RefAnything);

    /// Keeps only the `info` part
    #[inline]
    pub fn extract_info(&self, cs: &mut CellParser<'_>) -> Option<()> {
        CommonMsgInfo.extract(cs)
    }

    #[inline]
    pub fn get_created_lt(&self, cs: &CellParser<'_>) -> Option<u64> {
        CommonMsgInfo.get_created_lt(cs)
    }

    #[inline]
    pub fn is_internal(&self, cs: &CellParser<'_>) -> bool {
        CommonMsgInfo.get_tag(cs) == Some(CommonMsgInfo::INT_MSG_INFO)
    }
}

impl TlbType for Message {
    fn validate_skip(&self, ops: &mut Ops, cs: &mut CellParser<'_>, weak: bool) -> Option<()> {
        CommonMsgInfo.validate_skip(ops, cs, weak)?;
        Self::INIT.validate_skip(ops, cs, weak)?;
        Self::BODY.validate_skip(ops, cs, weak)
    }

    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        CommonMsgInfo.skip(cs)?;
        Self::INIT.skip(cs)?;
        Self::BODY.skip(cs)
    }

    fn print_skip(&self, pp: &mut PrettyPrinter, cs: &mut CellParser<'_>) -> Option<()> {
        pp.open("message")?;
        pp.field("info")?;
        CommonMsgInfo.print_skip(pp, cs)?;
        pp.field("init")?;
        Self::INIT.print_skip(pp, cs)?;
        pp.field("body")?;
        Self::BODY.print_skip(pp, cs)?;
        pp.close()
    }
}

/// ```tlb
/// interm_addr_regular$0 use_dest_bits:(#<= 96) = IntermediateAddress;
/// interm_addr_simple$10 workchain_id:int8
///   addr_pfx:uint64 = IntermediateAddress;
/// interm_addr_ext$11 workchain_id:int32
///   addr_pfx:uint64 = IntermediateAddress;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntermediateAddress;

impl IntermediateAddress {
    pub const REGULAR: u32 = 0;
    pub const SIMPLE: u32 = 2;
    pub const EXT: u32 = 3;
}

impl TlbType for IntermediateAddress {
    fn validate_skip(&self, _: &mut Ops, cs: &mut CellParser<'_>, _: bool) -> Option<()> {
        match self.get_tag(cs)? {
            Self::REGULAR => {
                cs.advance(1)?;
                (cs.fetch_uint(7)? <= 96).then_some(())
            }
            Self::SIMPLE => cs.advance(2 + 8 + 64),
            _ => {
                cs.advance(2)?;
                let workchain = cs.fetch_int(32)?;
                if (-128..128).contains(&workchain) {
                    // fits interm_addr_simple
                    return None;
                }
                cs.advance(64)
            }
        }
    }

    #[inline]
    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        let size = self.get_size(cs)?;
        cs.advance_ext(size)
    }

    #[inline]
    fn get_size(&self, cs: &CellParser<'_>) -> Option<SizeExt> {
        Some(SizeExt::bits_only(match self.get_tag(cs)? {
            Self::REGULAR => 1 + 7,
            Self::SIMPLE => 2 + 8 + 64,
            _ => 2 + 32 + 64,
        }))
    }

    #[inline]
    fn get_tag(&self, cs: &CellParser<'_>) -> Option<u32> {
        match cs.prefetch_uint(2)? as u32 {
            0 | 1 => Some(Self::REGULAR),
            t => Some(t),
        }
    }
}

/// ```tlb
/// msg_envelope#4 cur_addr:IntermediateAddress
///   next_addr:IntermediateAddress fwd_fee_remaining:Grams
///   msg:^(Message Any) = MsgEnvelope;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MsgEnvelope;

impl MsgEnvelope {
    pub const TAG: u64 = 4;

    /// `created_lt` of the enclosed message
    pub fn get_created_lt(&self, cs: &CellParser<'_>) -> Option<u64> {
        let msg = cs.prefetch_reference()?;
        if msg.exotic {
            return None;
        }
        Message.get_created_lt(&msg.parser())
    }

    /// `fwd_fee_remaining` and the value of the enclosed internal message
    pub fn unpack_value<'de>(&self, cs: &CellParser<'de>) -> Option<(BigInt, IntMsgValue<'de>)> {
        let mut cs = cs.clone();
        if cs.fetch_uint(4)? != Self::TAG {
            return None;
        }
        IntermediateAddress.skip(&mut cs)?;
        IntermediateAddress.skip(&mut cs)?;
        let fwd_fee_remaining = Grams.as_integer_skip(&mut cs)?;
        let msg = cs.fetch_reference()?;
        if msg.exotic {
            return None;
        }
        let value = CommonMsgInfo.int_value(&msg.parser())?;
        Some((fwd_fee_remaining, value))
    }
}

impl TlbType for MsgEnvelope {
    fn validate_skip(&self, ops: &mut Ops, cs: &mut CellParser<'_>, weak: bool) -> Option<()> {
        if cs.fetch_uint(4)? != Self::TAG {
            invalid_tag!("MsgEnvelope", cs);
            return None;
        }
        IntermediateAddress.validate_skip(ops, cs, weak)?;
        IntermediateAddress.validate_skip(ops, cs, weak)?;
        Grams.validate_skip(ops, cs, weak)?;
        RefTo(Message).validate_skip(ops, cs, weak)
    }

    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        cs.advance(4)?;
        IntermediateAddress.skip(cs)?;
        IntermediateAddress.skip(cs)?;
        Grams.skip(cs)?;
        cs.advance_refs(1)
    }
}
