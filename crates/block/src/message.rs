//! Collection of types related to [Message](https://docs.ton.org/develop/data-formats/msg-tlb#message-tl-b)
use num_bigint::BigUint;
use tlb::{
    Cell, Context, Error,
    r#as::{EitherInlineOrRef, Ref},
    bits::{
        r#as::NBits,
        de::{BitReader, BitReaderExt, BitUnpack},
        ser::{BitPack, BitWriter, BitWriterExt},
    },
    de::{CellDeserialize, CellParser, CellParserError},
    ser::{CellBuilder, CellBuilderError, CellSerialize, CellSerializeExt},
};

use crate::{
    MsgAddress, MsgAddressExt,
    currency::{CurrencyCollection, Grams},
    state_init::StateInit,
};

/// [Message](https://docs.ton.org/develop/data-formats/msg-tlb#message-tl-b)
/// ```tlb
/// message$_ {X:Type} info:CommonMsgInfo
/// init:(Maybe (Either StateInit ^StateInit))
/// body:(Either X ^X) = Message X;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message<T = Cell, IC = Cell, ID = Cell> {
    pub info: CommonMsgInfo,
    pub init: Option<StateInit<IC, ID>>,
    pub body: T,
}

impl<T, IC, ID> Message<T, IC, ID>
where
    T: CellSerialize<Args = ()>,
    IC: CellSerialize<Args = ()>,
    ID: CellSerialize<Args = ()>,
{
    #[inline]
    pub fn with_state_init(mut self, state_init: impl Into<Option<StateInit<IC, ID>>>) -> Self {
        self.init = state_init.into();
        self
    }

    /// Replaces typed body and state init with their cells
    #[inline]
    pub fn normalize(&self) -> Result<Message, CellBuilderError> {
        Ok(Message {
            info: self.info.clone(),
            init: self.init.as_ref().map(StateInit::normalize).transpose()?,
            body: self.body.to_cell(())?,
        })
    }
}

impl<T, IC, ID> Message<T, IC, ID> {
    /// Inbound external message to `dst`, e.g. the one deploying a
    /// contract at [`MsgAddress::derive`]
    #[inline]
    pub fn external_in(dst: MsgAddress, state_init: Option<StateInit<IC, ID>>, body: T) -> Self {
        Self {
            info: CommonMsgInfo::ExternalIn(ExternalInMsgInfo {
                src: MsgAddressExt::None,
                dst,
                import_fee: BigUint::default(),
            }),
            init: state_init,
            body,
        }
    }
}

impl Message<()> {
    /// Simple native transfer message
    #[inline]
    pub fn transfer(dst: MsgAddress, grams: BigUint, bounce: bool) -> Self {
        Self {
            info: CommonMsgInfo::transfer(dst, grams, bounce),
            init: None,
            body: (),
        }
    }
}

impl<T, IC, ID> CellSerialize for Message<T, IC, ID>
where
    T: CellSerialize<Args = ()>,
    IC: CellSerialize<Args = ()>,
    ID: CellSerialize<Args = ()>,
{
    type Args = ();

    fn store(&self, builder: &mut CellBuilder, _: Self::Args) -> Result<(), CellBuilderError> {
        builder
            // info:CommonMsgInfo
            .store(&self.info, ())
            .context("info")?
            // init:(Maybe (Either StateInit ^StateInit))
            .store_as::<_, Option<EitherInlineOrRef>>(self.init.as_ref(), ())
            .context("init")?
            // body:(Either X ^X)
            .store_as::<_, EitherInlineOrRef>(&self.body, ())
            .context("body")?;
        Ok(())
    }
}

impl<'de, T, IC, ID> CellDeserialize<'de> for Message<T, IC, ID>
where
    T: CellDeserialize<'de, Args = ()>,
    IC: CellDeserialize<'de, Args = ()>,
    ID: CellDeserialize<'de, Args = ()>,
{
    type Args = ();

    fn parse(parser: &mut CellParser<'de>, _: Self::Args) -> Result<Self, CellParserError<'de>> {
        Ok(Self {
            // info:CommonMsgInfo
            info: parser.parse(()).context("info")?,
            // init:(Maybe (Either StateInit ^StateInit))
            init: parser
                .parse_as::<_, Option<EitherInlineOrRef>>(())
                .context("init")?,
            // body:(Either X ^X)
            body: parser
                .parse_as::<_, EitherInlineOrRef>(())
                .context("body")?,
        })
    }
}

/// `info` field for [`Message`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommonMsgInfo {
    /// ```tlb
    /// int_msg_info$0
    /// ```
    Internal(InternalMsgInfo),

    /// ```tlb
    /// ext_in_msg_info$10
    /// ```
    ExternalIn(ExternalInMsgInfo),

    /// ```tlb
    /// ext_out_msg_info$11
    /// ```
    ExternalOut(ExternalOutMsgInfo),
}

impl CommonMsgInfo {
    #[inline]
    pub fn transfer(dst: MsgAddress, grams: BigUint, bounce: bool) -> Self {
        Self::Internal(InternalMsgInfo::transfer(dst, grams, bounce))
    }

    /// Logical time of creation, inbound externals have none
    #[inline]
    pub const fn created_lt(&self) -> Option<u64> {
        match self {
            Self::Internal(info) => Some(info.created_lt),
            Self::ExternalIn(_) => None,
            Self::ExternalOut(info) => Some(info.created_lt),
        }
    }
}

impl CellSerialize for CommonMsgInfo {
    type Args = ();

    #[inline]
    fn store(&self, builder: &mut CellBuilder, _: Self::Args) -> Result<(), CellBuilderError> {
        match self {
            Self::Internal(msg) => builder
                // int_msg_info$0
                .pack(false, ())?
                .store(msg, ())
                .context("int_msg_info")?,
            Self::ExternalIn(msg) => builder
                // ext_in_msg_info$10
                .pack_as::<_, NBits<2>>(0b10u8, ())?
                .pack(msg, ())
                .context("ext_in_msg_info")?,
            Self::ExternalOut(msg) => builder
                // ext_out_msg_info$11
                .pack_as::<_, NBits<2>>(0b11u8, ())?
                .pack(msg, ())
                .context("ext_out_msg_info")?,
        };
        Ok(())
    }
}

impl<'de> CellDeserialize<'de> for CommonMsgInfo {
    type Args = ();

    #[inline]
    fn parse(parser: &mut CellParser<'de>, _: Self::Args) -> Result<Self, CellParserError<'de>> {
        match parser.unpack(())? {
            // int_msg_info$0
            false => Ok(Self::Internal(parser.parse(()).context("int_msg_info")?)),
            true => match parser.unpack(())? {
                // ext_in_msg_info$10
                false => Ok(Self::ExternalIn(
                    parser.unpack(()).context("ext_in_msg_info")?,
                )),
                // ext_out_msg_info$11
                true => Ok(Self::ExternalOut(
                    parser.unpack(()).context("ext_out_msg_info")?,
                )),
            },
        }
    }
}

/// [`int_msg_info$0`](https://docs.ton.org/develop/data-formats/msg-tlb#int_msg_info0)
/// ```tlb
/// int_msg_info$0 ihr_disabled:Bool bounce:Bool bounced:Bool
/// src:MsgAddressInt dest:MsgAddressInt
/// value:CurrencyCollection ihr_fee:Grams fwd_fee:Grams
/// created_lt:uint64 created_at:uint32 = CommonMsgInfo;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternalMsgInfo {
    /// Hyper cube routing flag.
    pub ihr_disabled: bool,
    /// Message should be bounced if there are errors during processing.
    /// If message's flat bounce = 1, it calls bounceable.
    pub bounce: bool,
    /// Flag that describes, that message itself is a result of bounce.
    pub bounced: bool,
    /// Address of smart contract sender of message.
    pub src: MsgAddress,
    /// Address of smart contract destination of message.
    pub dst: MsgAddress,
    /// Structure which describes currency information including total funds transferred in message.
    pub value: CurrencyCollection,
    /// Fees for hyper routing delivery
    pub ihr_fee: BigUint,
    /// Fees for forwarding messages assigned by validators
    pub fwd_fee: BigUint,
    /// Logic time of sending message assigned by validator. Using for odering actions in smart contract.
    pub created_lt: u64,
    /// Unix time, zero when not assigned yet
    pub created_at: u32,
}

impl InternalMsgInfo {
    #[inline]
    pub fn transfer(dst: MsgAddress, grams: BigUint, bounce: bool) -> Self {
        InternalMsgInfo {
            ihr_disabled: true,
            bounce,
            bounced: false,
            src: MsgAddress::NULL,
            dst,
            value: CurrencyCollection::grams(grams),
            ihr_fee: BigUint::default(),
            fwd_fee: BigUint::default(),
            created_lt: 0,
            created_at: 0,
        }
    }
}

impl CellSerialize for InternalMsgInfo {
    type Args = ();

    fn store(&self, builder: &mut CellBuilder, _: Self::Args) -> Result<(), CellBuilderError> {
        builder
            .pack(self.ihr_disabled, ())?
            .pack(self.bounce, ())?
            .pack(self.bounced, ())?
            .pack(self.src, ())
            .context("src")?
            .pack(self.dst, ())
            .context("dst")?
            .store(&self.value, ())
            .context("value")?
            .pack_as::<_, &Grams>(&self.ihr_fee, ())
            .context("ihr_fee")?
            .pack_as::<_, &Grams>(&self.fwd_fee, ())
            .context("fwd_fee")?
            .pack(self.created_lt, ())?
            .pack(self.created_at, ())?;
        Ok(())
    }
}

impl<'de> CellDeserialize<'de> for InternalMsgInfo {
    type Args = ();

    fn parse(parser: &mut CellParser<'de>, _: Self::Args) -> Result<Self, CellParserError<'de>> {
        Ok(Self {
            ihr_disabled: parser.unpack(())?,
            bounce: parser.unpack(())?,
            bounced: parser.unpack(())?,
            src: parser.unpack(()).context("src")?,
            dst: parser.unpack(()).context("dst")?,
            value: parser.parse(()).context("value")?,
            ihr_fee: parser.unpack_as::<_, Grams>(()).context("ihr_fee")?,
            fwd_fee: parser.unpack_as::<_, Grams>(()).context("fwd_fee")?,
            created_lt: parser.unpack(()).context("created_lt")?,
            created_at: parser.unpack(()).context("created_at")?,
        })
    }
}

/// [`ext_in_msg_info$10`](https://docs.ton.org/develop/data-formats/msg-tlb#ext_in_msg_info10)
/// ```tlb
/// ext_in_msg_info$10 src:MsgAddressExt dest:MsgAddressInt
/// import_fee:Grams = CommonMsgInfo;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalInMsgInfo {
    pub src: MsgAddressExt,
    pub dst: MsgAddress,
    pub import_fee: BigUint,
}

impl BitPack for ExternalInMsgInfo {
    type Args = ();

    fn pack<W>(&self, writer: &mut W, _: Self::Args) -> Result<(), W::Error>
    where
        W: BitWriter + ?Sized,
    {
        writer
            .pack(&self.src, ())
            .context("src")?
            .pack(self.dst, ())
            .context("dst")?
            .pack_as::<_, &Grams>(&self.import_fee, ())
            .context("import_fee")?;
        Ok(())
    }
}

impl<'de> BitUnpack<'de> for ExternalInMsgInfo {
    type Args = ();

    fn unpack<R>(reader: &mut R, _: Self::Args) -> Result<Self, R::Error>
    where
        R: BitReader<'de> + ?Sized,
    {
        Ok(Self {
            src: reader.unpack(()).context("src")?,
            dst: reader.unpack(()).context("dst")?,
            import_fee: reader.unpack_as::<_, Grams>(()).context("import_fee")?,
        })
    }
}

/// [`ext_out_msg_info$11`](https://docs.ton.org/develop/data-formats/msg-tlb#ext_out_msg_info11)
/// ```tlb
/// ext_out_msg_info$11 src:MsgAddressInt dest:MsgAddressExt
/// created_lt:uint64 created_at:uint32 = CommonMsgInfo;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalOutMsgInfo {
    pub src: MsgAddress,
    pub dst: MsgAddressExt,
    pub created_lt: u64,
    pub created_at: u32,
}

impl BitPack for ExternalOutMsgInfo {
    type Args = ();

    fn pack<W>(&self, writer: &mut W, _: Self::Args) -> Result<(), W::Error>
    where
        W: BitWriter + ?Sized,
    {
        writer
            .pack(self.src, ())
            .context("src")?
            .pack(&self.dst, ())
            .context("dst")?
            .pack(self.created_lt, ())?
            .pack(self.created_at, ())?;
        Ok(())
    }
}

impl<'de> BitUnpack<'de> for ExternalOutMsgInfo {
    type Args = ();

    fn unpack<R>(reader: &mut R, _: Self::Args) -> Result<Self, R::Error>
    where
        R: BitReader<'de> + ?Sized,
    {
        Ok(Self {
            src: reader.unpack(()).context("src")?,
            dst: reader.unpack(()).context("dst")?,
            created_lt: reader.unpack(())?,
            created_at: reader.unpack(())?,
        })
    }
}

/// Position of a message on its way between shards
/// ```tlb
/// interm_addr_regular$0 use_dest_bits:(#<= 96) = IntermediateAddress;
/// interm_addr_simple$10 workchain_id:int8 addr_pfx:uint64 = IntermediateAddress;
/// interm_addr_ext$11 workchain_id:int32 addr_pfx:uint64 = IntermediateAddress;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntermediateAddress {
    Regular { use_dest_bits: u8 },
    Simple { workchain_id: i8, addr_pfx: u64 },
    Ext { workchain_id: i32, addr_pfx: u64 },
}

impl IntermediateAddress {
    pub const MAX_DEST_BITS: u8 = 96;
}

impl BitPack for IntermediateAddress {
    type Args = ();

    fn pack<W>(&self, writer: &mut W, _: Self::Args) -> Result<(), W::Error>
    where
        W: BitWriter + ?Sized,
    {
        match *self {
            Self::Regular { use_dest_bits } => {
                if use_dest_bits > Self::MAX_DEST_BITS {
                    return Err(Error::custom(format!(
                        "use_dest_bits {use_dest_bits} exceeds 96"
                    )));
                }
                writer
                    .pack(false, ())?
                    .pack_as::<_, NBits<7>>(use_dest_bits, ())?;
            }
            Self::Simple {
                workchain_id,
                addr_pfx,
            } => {
                writer
                    .pack_as::<_, NBits<2>>(0b10u8, ())?
                    .pack(workchain_id, ())?
                    .pack(addr_pfx, ())?;
            }
            Self::Ext {
                workchain_id,
                addr_pfx,
            } => {
                writer
                    .pack_as::<_, NBits<2>>(0b11u8, ())?
                    .pack(workchain_id, ())?
                    .pack(addr_pfx, ())?;
            }
        }
        Ok(())
    }
}

impl<'de> BitUnpack<'de> for IntermediateAddress {
    type Args = ();

    fn unpack<R>(reader: &mut R, _: Self::Args) -> Result<Self, R::Error>
    where
        R: BitReader<'de> + ?Sized,
    {
        if !reader.unpack::<bool>(())? {
            let use_dest_bits: u8 = reader.unpack_as::<_, NBits<7>>(())?;
            if use_dest_bits > Self::MAX_DEST_BITS {
                return Err(Error::custom(format!(
                    "use_dest_bits {use_dest_bits} exceeds 96"
                )));
            }
            return Ok(Self::Regular { use_dest_bits });
        }
        Ok(match reader.unpack::<bool>(())? {
            false => Self::Simple {
                workchain_id: reader.unpack(())?,
                addr_pfx: reader.unpack(())?,
            },
            true => Self::Ext {
                workchain_id: reader.unpack(())?,
                addr_pfx: reader.unpack(())?,
            },
        })
    }
}

/// Message travelling between shards
/// ```tlb
/// msg_envelope#4 cur_addr:IntermediateAddress
///   next_addr:IntermediateAddress fwd_fee_remaining:Grams
///   msg:^(Message Any) = MsgEnvelope;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsgEnvelope {
    pub cur_addr: IntermediateAddress,
    pub next_addr: IntermediateAddress,
    pub fwd_fee_remaining: BigUint,
    pub msg: Message,
}

impl MsgEnvelope {
    const TAG: u8 = 4;
}

impl CellSerialize for MsgEnvelope {
    type Args = ();

    fn store(&self, builder: &mut CellBuilder, _: Self::Args) -> Result<(), CellBuilderError> {
        builder
            .pack_as::<_, NBits<4>>(Self::TAG, ())?
            .pack(self.cur_addr, ())
            .context("cur_addr")?
            .pack(self.next_addr, ())
            .context("next_addr")?
            .pack_as::<_, &Grams>(&self.fwd_fee_remaining, ())
            .context("fwd_fee_remaining")?
            .store_as::<_, Ref>(&self.msg, ())
            .context("msg")?;
        Ok(())
    }
}

impl<'de> CellDeserialize<'de> for MsgEnvelope {
    type Args = ();

    fn parse(parser: &mut CellParser<'de>, _: Self::Args) -> Result<Self, CellParserError<'de>> {
        let tag: u8 = parser.unpack_as::<_, NBits<4>>(())?;
        if tag != Self::TAG {
            return Err(Error::custom(format!("invalid msg_envelope tag: {tag:#x}")));
        }
        Ok(Self {
            cur_addr: parser.unpack(()).context("cur_addr")?,
            next_addr: parser.unpack(()).context("next_addr")?,
            fwd_fee_remaining: parser
                .unpack_as::<_, Grams>(())
                .context("fwd_fee_remaining")?,
            msg: parser.parse_as::<_, Ref>(()).context("msg")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use tlb::schema::TlbTypeExt;

    use crate::schema;

    use super::*;

    fn addr(b: u8) -> MsgAddress {
        MsgAddress {
            workchain_id: 0,
            address: [b; 32],
        }
    }

    fn internal() -> InternalMsgInfo {
        InternalMsgInfo {
            ihr_disabled: true,
            bounce: true,
            bounced: false,
            src: addr(0x11),
            dst: MsgAddress {
                workchain_id: -1,
                address: [0x55; 32],
            },
            value: CurrencyCollection::grams(1_000u32),
            ihr_fee: BigUint::default(),
            fwd_fee: BigUint::from(7u32),
            created_lt: 42,
            created_at: 1_700_000_000,
        }
    }

    #[test]
    fn message_serde() {
        let msg = Message::<(), (), ()> {
            info: CommonMsgInfo::Internal(internal()),
            init: None,
            body: (),
        };

        let cell = msg.to_cell(()).unwrap();
        let got: Message<(), (), ()> = cell.parse_fully(()).unwrap();

        assert_eq!(got, msg);
        assert!(schema::Message.validate_cell(&cell, false));
        assert_eq!(
            schema::Message.get_created_lt(&cell.parser()),
            Some(42)
        );
    }

    #[test]
    fn internal_msg_info_serde() {
        let info = CommonMsgInfo::Internal(internal());

        let cell = info.to_cell(()).unwrap();
        let got: CommonMsgInfo = cell.parse_fully(()).unwrap();

        assert_eq!(got, info);
        assert_eq!(got.created_lt(), Some(42));
    }

    #[test]
    fn external_in_msg_info_serde() {
        let info = CommonMsgInfo::ExternalIn(ExternalInMsgInfo {
            src: MsgAddressExt::None,
            dst: addr(0x22),
            import_fee: BigUint::default(),
        });

        let cell = info.to_cell(()).unwrap();
        let got: CommonMsgInfo = cell.parse_fully(()).unwrap();

        assert_eq!(got, info);
        assert!(schema::CommonMsgInfo.validate_cell(&cell, false));
        assert_eq!(schema::CommonMsgInfo.get_created_lt(&cell.parser()), None);
    }

    #[test]
    fn external_out_msg_info_serde() {
        let info = CommonMsgInfo::ExternalOut(ExternalOutMsgInfo {
            src: addr(0x33),
            dst: MsgAddressExt::None,
            created_lt: 5,
            created_at: 0,
        });

        let cell = info.to_cell(()).unwrap();
        let got: CommonMsgInfo = cell.parse_fully(()).unwrap();

        assert_eq!(got, info);
        assert_eq!(schema::CommonMsgInfo.get_created_lt(&cell.parser()), Some(5));
    }

    #[test]
    fn external_in_with_state_init() {
        let init = StateInit::<Cell, Cell> {
            code: Some(Cell::default()),
            ..Default::default()
        };
        let msg = Message::external_in(addr(0x44), Some(init), Cell::default());
        let cell = msg.to_cell(()).unwrap();
        assert!(schema::Message.validate_cell(&cell, false));
        let got: Message = cell.parse_fully(()).unwrap();
        assert_eq!(got, msg);
    }

    #[test]
    fn envelope() {
        let env = MsgEnvelope {
            cur_addr: IntermediateAddress::Regular { use_dest_bits: 0 },
            next_addr: IntermediateAddress::Regular { use_dest_bits: 96 },
            fwd_fee_remaining: BigUint::from(3u32),
            msg: Message {
                info: CommonMsgInfo::Internal(internal()),
                init: None,
                body: Cell::default(),
            },
        };
        let cell = env.to_cell(()).unwrap();
        assert!(schema::MsgEnvelope.validate_cell(&cell, false));
        assert_eq!(schema::MsgEnvelope.get_created_lt(&cell.parser()), Some(42));
        let got: MsgEnvelope = cell.parse_fully(()).unwrap();
        assert_eq!(got, env);

        let bad = IntermediateAddress::Regular { use_dest_bits: 97 };
        assert!(tlb::bits::ser::pack(bad, ()).is_err());
    }
}
