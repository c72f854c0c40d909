use tlb::{
    Cell,
    bits::{
        bitvec::{order::Msb0, slice::BitSlice, view::BitView},
        ser::BitWriterExt,
    },
    de::CellParser,
};

use super::{Maybe, Ops, PrettyPrinter, SizeExt, TlbType};

/// ```tlb
/// anycast_info$_ depth:(#<= 30) { depth >= 1 }
///   rewrite_pfx:(bits depth) = Anycast;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anycast;

impl Anycast {
    pub const MAX_DEPTH: u64 = 30;

    /// Skips the value and returns its depth
    #[inline]
    pub fn skip_get_depth(&self, cs: &mut CellParser<'_>) -> Option<u32> {
        let depth = cs.fetch_uint_leq(Self::MAX_DEPTH)?;
        cs.advance(depth as usize)?;
        Some(depth as u32)
    }

    /// Returns the rewrite prefix and advances past the value
    #[inline]
    fn fetch_rewrite<'de>(&self, cs: &mut CellParser<'de>) -> Option<&'de BitSlice<u8, Msb0>> {
        let depth = cs.fetch_uint_leq(Self::MAX_DEPTH)?;
        cs.fetch_bits(depth as usize)
    }
}

impl TlbType for Anycast {
    #[inline]
    fn validate_skip(&self, _: &mut Ops, cs: &mut CellParser<'_>, _: bool) -> Option<()> {
        let depth = self.skip_get_depth(cs)?;
        (depth >= 1).then_some(())
    }

    #[inline]
    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        self.skip_get_depth(cs).map(|_| ())
    }
}

/// ```tlb
/// addr_none$00 = MsgAddressExt;
/// addr_extern$01 len:(## 9) external_address:(bits len) = MsgAddressExt;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MsgAddressExt;

impl MsgAddressExt {
    pub const ADDR_NONE: u32 = 0;
    pub const ADDR_EXTERN: u32 = 1;
}

impl TlbType for MsgAddressExt {
    #[inline]
    fn validate_skip(&self, _: &mut Ops, cs: &mut CellParser<'_>, _: bool) -> Option<()> {
        self.skip(cs)
    }

    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        let size = self.get_size(cs)?;
        cs.advance_ext(size)
    }

    fn get_size(&self, cs: &CellParser<'_>) -> Option<SizeExt> {
        match self.get_tag(cs)? {
            Self::ADDR_NONE => Some(SizeExt::bits_only(2)),
            _ => {
                let len = cs.prefetch_uint(2 + 9)? & 0x1ff;
                Some(SizeExt::bits_only(2 + 9 + len as usize))
            }
        }
    }

    #[inline]
    fn get_tag(&self, cs: &CellParser<'_>) -> Option<u32> {
        match cs.prefetch_uint(2)? as u32 {
            t @ (Self::ADDR_NONE | Self::ADDR_EXTERN) => Some(t),
            _ => None,
        }
    }

    fn print_skip(&self, pp: &mut PrettyPrinter, cs: &mut CellParser<'_>) -> Option<()> {
        match cs.fetch_uint(2)? as u32 {
            Self::ADDR_NONE => pp.out("addr_none"),
            Self::ADDR_EXTERN => {
                let len = cs.fetch_uint(9)?;
                let mut addr = Cell::builder();
                addr.pack(cs.fetch_bits(len as usize)?, ()).ok()?;
                pp.open("addr_extern")?;
                pp.field("len")?;
                pp.out(len)?;
                pp.field("external_address")?;
                pp.out(format_args!("{:?}", addr.into_cell().parser()))?;
                pp.close()
            }
            _ => None,
        }
    }
}

/// ```tlb
/// addr_std$10 anycast:(Maybe Anycast)
///   workchain_id:int8 address:bits256 = MsgAddressInt;
/// addr_var$11 anycast:(Maybe Anycast) addr_len:(## 9)
///   workchain_id:int32 address:(bits addr_len) = MsgAddressInt;
/// ```
///
/// `addr_var` is only valid for addresses that `addr_std` cannot express.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MsgAddressInt;

impl MsgAddressInt {
    pub const ADDR_STD: u32 = 2;
    pub const ADDR_VAR: u32 = 3;
    /// Never a valid workchain id
    pub const RESERVED_WORKCHAIN: i32 = i32::MIN;

    /// Skips the address and returns the depth of its anycast, or zero
    pub fn skip_get_depth(&self, cs: &mut CellParser<'_>) -> Option<u32> {
        if !cs.have(3) {
            return None;
        }
        match cs.fetch_uint(2)? as u32 {
            Self::ADDR_STD => {
                let depth = Self::skip_get_anycast_depth(cs)?;
                cs.advance(8 + 256)?;
                Some(depth)
            }
            Self::ADDR_VAR => {
                let depth = Self::skip_get_anycast_depth(cs)?;
                let len = cs.fetch_uint(9)?;
                cs.advance(32 + len as usize)?;
                Some(depth)
            }
            _ => None,
        }
    }

    fn skip_get_anycast_depth(cs: &mut CellParser<'_>) -> Option<u32> {
        match cs.fetch_uint(1)? {
            0 => Some(0),
            _ => Anycast.skip_get_depth(cs),
        }
    }

    /// Workchain and the first 64 bits of the address, with the anycast
    /// rewrite prefix applied
    pub fn get_prefix(&self, cs: &CellParser<'_>) -> Option<(i32, u64)> {
        if !cs.have(3 + 8 + 64) {
            return None;
        }
        let mut cs = cs.clone();
        let t = cs.prefetch_uint(2 + 1 + 5)?;
        match t >> 5 {
            // addr_std$10 nothing$0
            0b100 => {
                cs.advance(3)?;
                let workchain = cs.fetch_int(8)? as i32;
                Some((workchain, cs.fetch_uint(64)?))
            }
            // addr_std$10 just$1
            0b101 => {
                let depth = (t & 31) as u32;
                cs.advance(8)?;
                let rewrite = cs.fetch_uint(depth as usize)?;
                let workchain = cs.fetch_int(8)? as i32;
                let prefix = cs.fetch_uint(64)?;
                Some((workchain, Self::rewrite_prefix(prefix, rewrite, depth)))
            }
            // addr_var$11 nothing$0
            0b110 => {
                cs.advance(3)?;
                if cs.fetch_uint(9)? < 64 {
                    return None;
                }
                let workchain = cs.fetch_int(32)? as i32;
                if workchain == Self::RESERVED_WORKCHAIN {
                    return None;
                }
                Some((workchain, cs.fetch_uint(64)?))
            }
            // addr_var$11 just$1
            0b111 => {
                let depth = (t & 31) as u32;
                cs.advance(8)?;
                let rewrite = cs.fetch_uint(depth as usize)?;
                if cs.fetch_uint(9)? < 64 {
                    return None;
                }
                let workchain = cs.fetch_int(32)? as i32;
                if workchain == Self::RESERVED_WORKCHAIN {
                    return None;
                }
                let prefix = cs.fetch_uint(64)?;
                Some((workchain, Self::rewrite_prefix(prefix, rewrite, depth)))
            }
            _ => None,
        }
    }

    #[inline]
    const fn rewrite_prefix(prefix: u64, rewrite: u64, depth: u32) -> u64 {
        if depth == 0 {
            return prefix;
        }
        (prefix & (u64::MAX >> depth)) | (rewrite << (64 - depth))
    }

    /// Workchain and 256-bit address of a standard address. `addr_var`
    /// qualifies only with a 256-bit address. With `rewrite`, the first
    /// bits of the address are replaced by the anycast rewrite prefix.
    pub fn extract_std_address(&self, cs: &CellParser<'_>, rewrite: bool) -> Option<(i32, [u8; 32])> {
        if !cs.have(3 + 8 + 64) {
            return None;
        }
        let mut cs = cs.clone();
        let tag = cs.fetch_uint(2)? as u32;
        let anycast = match cs.fetch_uint(1)? {
            0 => None,
            _ => Some(Anycast.fetch_rewrite(&mut cs)?),
        };
        let workchain = match tag {
            Self::ADDR_STD => cs.fetch_int(8)? as i32,
            Self::ADDR_VAR => {
                if cs.fetch_uint(9)? != 256 {
                    return None;
                }
                match cs.fetch_int(32)? as i32 {
                    Self::RESERVED_WORKCHAIN => return None,
                    workchain => workchain,
                }
            }
            _ => return None,
        };
        let mut addr = [0u8; 32];
        let bits = addr.view_bits_mut::<Msb0>();
        bits.copy_from_bitslice(cs.fetch_bits(256)?);
        if let Some(pfx) = anycast.filter(|_| rewrite) {
            bits[..pfx.len()].copy_from_bitslice(pfx);
        }
        Some((workchain, addr))
    }
}

impl TlbType for MsgAddressInt {
    fn validate_skip(&self, ops: &mut Ops, cs: &mut CellParser<'_>, weak: bool) -> Option<()> {
        if !cs.have(3) {
            return None;
        }
        match cs.fetch_uint(2)? as u32 {
            Self::ADDR_STD => {
                Maybe(Anycast).validate_skip(ops, cs, weak)?;
                cs.advance(8 + 256)
            }
            Self::ADDR_VAR => {
                Maybe(Anycast).validate_skip(ops, cs, weak)?;
                let len = cs.fetch_uint(9)?;
                let workchain = cs.fetch_int(32)?;
                cs.advance(len as usize)?;
                ((!(-0x80..=0x7f).contains(&workchain) || len != 256)
                    && workchain != 0
                    && workchain != -1
                    && workchain != Self::RESERVED_WORKCHAIN as i64)
                    .then_some(())
            }
            _ => {
                invalid_tag!("MsgAddressInt", cs);
                None
            }
        }
    }

    #[inline]
    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        self.skip_get_depth(cs).map(|_| ())
    }

    #[inline]
    fn get_tag(&self, cs: &CellParser<'_>) -> Option<u32> {
        match cs.prefetch_uint(2)? as u32 {
            t @ (Self::ADDR_STD | Self::ADDR_VAR) => Some(t),
            _ => None,
        }
    }

    fn print_skip(&self, pp: &mut PrettyPrinter, cs: &mut CellParser<'_>) -> Option<()> {
        let Some((workchain, addr)) = self.extract_std_address(cs, false) else {
            pp.open("raw@MsgAddressInt")?;
            let value = self.fetch(cs)?;
            pp.out(format_args!("{value:?}"))?;
            return pp.close();
        };
        self.skip(cs)?;
        pp.out(format_args!("{workchain}:{}", hex::encode(addr)))
    }
}

/// ```tlb
/// _ _:MsgAddressInt = MsgAddress;
/// _ _:MsgAddressExt = MsgAddress;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MsgAddress;

impl MsgAddress {
    pub const ADDR_NONE: u32 = 0;
    pub const ADDR_EXTERN: u32 = 1;
    pub const ADDR_STD: u32 = 2;
    pub const ADDR_VAR: u32 = 3;
}

impl TlbType for MsgAddress {
    fn validate_skip(&self, ops: &mut Ops, cs: &mut CellParser<'_>, weak: bool) -> Option<()> {
        match self.get_tag(cs)? {
            Self::ADDR_NONE | Self::ADDR_EXTERN => MsgAddressExt.validate_skip(ops, cs, weak),
            _ => MsgAddressInt.validate_skip(ops, cs, weak),
        }
    }

    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        match self.get_tag(cs)? {
            Self::ADDR_NONE | Self::ADDR_EXTERN => MsgAddressExt.skip(cs),
            _ => MsgAddressInt.skip(cs),
        }
    }

    #[inline]
    fn get_tag(&self, cs: &CellParser<'_>) -> Option<u32> {
        cs.prefetch_uint(2).map(|t| t as u32)
    }

    fn print_skip(&self, pp: &mut PrettyPrinter, cs: &mut CellParser<'_>) -> Option<()> {
        match self.get_tag(cs)? {
            Self::ADDR_NONE | Self::ADDR_EXTERN => MsgAddressExt.print_skip(pp, cs),
            _ => MsgAddressInt.print_skip(pp, cs),
        }
    }
}
