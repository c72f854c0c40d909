use core::{
    fmt::{self, Debug, Display},
    str::FromStr,
};

use base64::{
    Engine, engine::general_purpose::STANDARD_NO_PAD, engine::general_purpose::URL_SAFE_NO_PAD,
};
use crc::Crc;
use digest::{Digest, Output};
use strum::Display;
use tlb::{
    Context, Error, StringError,
    bits::{
        r#as::NBits,
        bitvec::{order::Msb0, vec::BitVec},
        de::{BitReader, BitReaderExt, BitUnpack},
        ser::{BitPack, BitWriter, BitWriterExt},
    },
    ser::{CellBuilderError, CellSerialize, CellSerializeExt},
};

use crate::state_init::StateInit;

const CRC_16_XMODEM: Crc<u16> = Crc::<u16>::new(&crc::CRC_16_XMODEM);

/// Standard internal address, or `addr_none` when [`NULL`](MsgAddress::NULL)
/// ```tlb
/// addr_none$00 = MsgAddressExt;
/// addr_extern$01 len:(## 9) external_address:(bits len) = MsgAddressExt;
///
/// addr_std$10 anycast:(Maybe Anycast)
/// workchain_id:int8 address:bits256  = MsgAddressInt;
/// addr_var$11 anycast:(Maybe Anycast) addr_len:(## 9)
/// workchain_id:int32 address:(bits addr_len) = MsgAddressInt;
///
/// _ _:MsgAddressInt = MsgAddress;
/// _ _:MsgAddressExt = MsgAddress;
/// ```
///
/// Anycast info is dropped when unpacking.
#[cfg_attr(
    feature = "serde",
    derive(::serde_with::SerializeDisplay, ::serde_with::DeserializeFromStr)
)]
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MsgAddress {
    pub workchain_id: i32,
    pub address: [u8; 32],
}

impl MsgAddress {
    pub const NULL: Self = Self {
        workchain_id: 0,
        address: [0; 32],
    };

    /// [Derive](https://docs.ton.org/learn/overviews/addresses#address-of-smart-contract)
    /// [`MsgAddress`] of a smart-contract by its workchain and [`StateInit`]
    #[cfg(feature = "sha2")]
    #[inline]
    pub fn derive<C, D>(
        workchain_id: i32,
        state_init: &StateInit<C, D>,
    ) -> Result<Self, CellBuilderError>
    where
        C: CellSerialize<Args = ()>,
        D: CellSerialize<Args = ()>,
    {
        Self::derive_digest::<C, D, sha2::Sha256>(workchain_id, state_init)
    }

    #[inline]
    pub fn derive_digest<C, D, H>(
        workchain_id: i32,
        state_init: &StateInit<C, D>,
    ) -> Result<Self, CellBuilderError>
    where
        C: CellSerialize<Args = ()>,
        D: CellSerialize<Args = ()>,
        H: Digest,
        Output<H>: Into<[u8; 32]>,
    {
        Ok(Self {
            workchain_id,
            address: state_init.to_cell(())?.hash_digest::<H>(),
        })
    }

    pub fn from_hex(s: impl AsRef<str>) -> Result<Self, StringError> {
        let s = s.as_ref();
        let (workchain, addr) = s
            .split_once(':')
            .ok_or_else(|| Error::custom("wrong format"))?;
        let workchain_id = workchain.parse::<i32>().map_err(Error::custom)?;
        let mut address = [0; 32];
        hex::decode_to_slice(addr, &mut address).map_err(Error::custom)?;
        Ok(Self {
            workchain_id,
            address,
        })
    }

    /// [Raw Address](https://docs.ton.org/learn/overviews/addresses#raw-address)
    /// representation
    #[inline]
    pub fn to_hex(&self) -> String {
        format!("{}:{}", self.workchain_id, hex::encode(self.address))
    }

    /// Shortcut for [`.from_base64_url_flags()?.0`](MsgAddress::from_base64_url_flags)
    #[inline]
    pub fn from_base64_url(s: impl AsRef<str>) -> Result<Self, StringError> {
        Self::from_base64_url_flags(s).map(|(addr, _, _)| addr)
    }

    /// Parse address from URL-base64
    /// [user-friendly](https://docs.ton.org/learn/overviews/addresses#user-friendly-address)
    /// representation and its flags: `(address, non_bounceable, non_production)`
    #[inline]
    pub fn from_base64_url_flags(s: impl AsRef<str>) -> Result<(Self, bool, bool), StringError> {
        Self::from_base64_repr(URL_SAFE_NO_PAD, s)
    }

    /// Shortcut for [`.from_base64_std_flags()?.0`](MsgAddress::from_base64_std_flags)
    #[inline]
    pub fn from_base64_std(s: impl AsRef<str>) -> Result<Self, StringError> {
        Self::from_base64_std_flags(s).map(|(addr, _, _)| addr)
    }

    /// Parse address from standard base64
    /// [user-friendly](https://docs.ton.org/learn/overviews/addresses#user-friendly-address)
    /// representation and its flags: `(address, non_bounceable, non_production)`
    #[inline]
    pub fn from_base64_std_flags(s: impl AsRef<str>) -> Result<(Self, bool, bool), StringError> {
        Self::from_base64_repr(STANDARD_NO_PAD, s)
    }

    #[inline]
    pub fn to_base64_url(self) -> String {
        self.to_base64_url_flags(false, false)
    }

    #[inline]
    pub fn to_base64_url_flags(self, non_bounceable: bool, non_production: bool) -> String {
        self.to_base64_flags(non_bounceable, non_production, URL_SAFE_NO_PAD)
    }

    #[inline]
    pub fn to_base64_std(self) -> String {
        self.to_base64_std_flags(false, false)
    }

    #[inline]
    pub fn to_base64_std_flags(self, non_bounceable: bool, non_production: bool) -> String {
        self.to_base64_flags(non_bounceable, non_production, STANDARD_NO_PAD)
    }

    fn from_base64_repr(
        engine: impl Engine,
        s: impl AsRef<str>,
    ) -> Result<(Self, bool, bool), StringError> {
        let mut bytes = [0; 36];
        if engine
            .decode_slice(s.as_ref(), &mut bytes)
            .map_err(Error::custom)
            .context("base64")?
            != bytes.len()
        {
            return Err(Error::custom("invalid length"));
        };

        let (non_production, non_bounceable) = match bytes[0] {
            0x11 => (false, false),
            0x51 => (false, true),
            0x91 => (true, false),
            0xD1 => (true, true),
            flags => return Err(Error::custom(format!("unsupported flags: {flags:#x}"))),
        };
        let workchain_id = bytes[1] as i8 as i32;
        let crc = u16::from_be_bytes([bytes[34], bytes[35]]);
        if crc != CRC_16_XMODEM.checksum(&bytes[0..34]) {
            return Err(Error::custom("CRC mismatch"));
        }
        let mut address = [0_u8; 32];
        address.copy_from_slice(&bytes[2..34]);
        Ok((
            Self {
                workchain_id,
                address,
            },
            non_bounceable,
            non_production,
        ))
    }

    fn to_base64_flags(
        self,
        non_bounceable: bool,
        non_production: bool,
        engine: impl Engine,
    ) -> String {
        let mut bytes = [0; 36];
        bytes[0] = match (non_production, non_bounceable) {
            (false, false) => 0x11,
            (false, true) => 0x51,
            (true, false) => 0x91,
            (true, true) => 0xD1,
        };
        bytes[1] = self.workchain_id as u8;
        bytes[2..34].copy_from_slice(&self.address);
        let crc = CRC_16_XMODEM.checksum(&bytes[0..34]);
        bytes[34..].copy_from_slice(&crc.to_be_bytes());
        engine.encode(bytes)
    }

    /// Returns whether this address is [`NULL`](MsgAddress::NULL)
    #[inline]
    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }
}

impl Debug for MsgAddress {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_hex().as_str())
    }
}

impl Display for MsgAddress {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_base64_url().as_str())
    }
}

impl FromStr for MsgAddress {
    type Err = StringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() == 48 {
            if s.contains(['-', '_']) {
                Self::from_base64_url(s)
            } else {
                Self::from_base64_std(s)
            }
        } else {
            Self::from_hex(s)
        }
    }
}

impl BitPack for MsgAddress {
    type Args = ();

    #[inline]
    fn pack<W>(&self, writer: &mut W, _: Self::Args) -> Result<(), W::Error>
    where
        W: BitWriter + ?Sized,
    {
        if self.is_null() {
            writer.pack(MsgAddressTag::Null, ())?;
            return Ok(());
        }
        let workchain_id = i8::try_from(self.workchain_id)
            .map_err(|_| Error::custom(format!("workchain {} does not fit int8", self.workchain_id)))?;
        writer
            .pack(MsgAddressTag::Std, ())?
            // anycast:(Maybe Anycast)
            .pack::<Option<&Anycast>>(None, ())?
            // workchain_id:int8
            .pack(workchain_id, ())
            .context("workchain_id")?
            // address:bits256
            .pack(self.address, ())
            .context("address")?;
        Ok(())
    }
}

impl<'de> BitUnpack<'de> for MsgAddress {
    type Args = ();

    fn unpack<R>(reader: &mut R, _: Self::Args) -> Result<Self, R::Error>
    where
        R: BitReader<'de> + ?Sized,
    {
        match reader.unpack(())? {
            MsgAddressTag::Null => Ok(Self::NULL),
            MsgAddressTag::Std => {
                // anycast:(Maybe Anycast)
                let _: Option<Anycast> = reader.unpack(()).context("anycast")?;
                Ok(Self {
                    // workchain_id:int8
                    workchain_id: reader.unpack::<i8>(()).context("workchain_id")? as i32,
                    // address:bits256
                    address: reader.unpack(()).context("address")?,
                })
            }
            MsgAddressTag::Var => {
                // anycast:(Maybe Anycast)
                let _: Option<Anycast> = reader.unpack(()).context("anycast")?;
                // addr_len:(## 9)
                let addr_len: u16 = reader.unpack_as::<_, NBits<9>>(())?;
                if addr_len != 256 {
                    return Err(Error::custom(format!(
                        "only 256-bit addresses are supported for addr_var$11, got {addr_len} bits"
                    )));
                }
                Ok(Self {
                    // workchain_id:int32
                    workchain_id: reader.unpack(()).context("workchain_id")?,
                    // address:(bits addr_len)
                    address: reader.unpack(()).context("address")?,
                })
            }
            tag => Err(Error::custom(format!("unsupported address tag: {tag}"))),
        }
    }
}

#[derive(Clone, Copy, Display)]
#[repr(u8)]
enum MsgAddressTag {
    #[strum(serialize = "addr_none$00")]
    Null,
    #[strum(serialize = "addr_extern$01")]
    Extern,
    #[strum(serialize = "addr_std$10")]
    Std,
    #[strum(serialize = "addr_var$11")]
    Var,
}

impl BitPack for MsgAddressTag {
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

impl<'de> BitUnpack<'de> for MsgAddressTag {
    type Args = ();

    #[inline]
    fn unpack<R>(reader: &mut R, _: Self::Args) -> Result<Self, R::Error>
    where
        R: BitReader<'de> + ?Sized,
    {
        Ok(match reader.unpack_as::<u8, NBits<2>>(())? {
            0b00 => Self::Null,
            0b01 => Self::Extern,
            0b10 => Self::Std,
            _ => Self::Var,
        })
    }
}

/// External address: `addr_none$00` or `addr_extern$01`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum MsgAddressExt {
    #[default]
    None,
    Extern(BitVec<u8, Msb0>),
}

impl BitPack for MsgAddressExt {
    type Args = ();

    fn pack<W>(&self, writer: &mut W, _: Self::Args) -> Result<(), W::Error>
    where
        W: BitWriter + ?Sized,
    {
        match self {
            Self::None => {
                writer.pack(MsgAddressTag::Null, ())?;
            }
            Self::Extern(addr) => {
                if addr.len() >= 1 << 9 {
                    return Err(Error::custom(format!(
                        "external address of {} bits is too long",
                        addr.len()
                    )));
                }
                writer
                    .pack(MsgAddressTag::Extern, ())?
                    // len:(## 9)
                    .pack_as::<_, NBits<9>>(addr.len() as u16, ())?
                    // external_address:(bits len)
                    .pack(addr.as_bitslice(), ())?;
            }
        }
        Ok(())
    }
}

impl<'de> BitUnpack<'de> for MsgAddressExt {
    type Args = ();

    fn unpack<R>(reader: &mut R, _: Self::Args) -> Result<Self, R::Error>
    where
        R: BitReader<'de> + ?Sized,
    {
        match reader.unpack(())? {
            MsgAddressTag::Null => Ok(Self::None),
            MsgAddressTag::Extern => {
                // len:(## 9)
                let len: u16 = reader.unpack_as::<_, NBits<9>>(()).context("len")?;
                // external_address:(bits len)
                Ok(Self::Extern(
                    reader.unpack(len as usize).context("external_address")?,
                ))
            }
            tag => Err(Error::custom(format!("{tag} is not an external address"))),
        }
    }
}

/// ```tlb
/// anycast_info$_ depth:(#<= 30) { depth >= 1 } rewrite_pfx:(bits depth) = Anycast;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Anycast {
    pub rewrite_pfx: BitVec<u8, Msb0>,
}

impl Anycast {
    pub const MAX_DEPTH: usize = 30;
}

impl BitPack for Anycast {
    type Args = ();

    fn pack<W>(&self, writer: &mut W, _: Self::Args) -> Result<(), W::Error>
    where
        W: BitWriter + ?Sized,
    {
        let depth = self.rewrite_pfx.len();
        if !(1..=Self::MAX_DEPTH).contains(&depth) {
            return Err(Error::custom(format!("depth {depth} is out of 1..=30")));
        }
        writer
            // depth:(#<= 30)
            .pack_as::<_, NBits<5>>(depth as u8, ())?
            // rewrite_pfx:(bits depth)
            .pack(self.rewrite_pfx.as_bitslice(), ())?;
        Ok(())
    }
}

impl<'de> BitUnpack<'de> for Anycast {
    type Args = ();

    fn unpack<R>(reader: &mut R, _: Self::Args) -> Result<Self, R::Error>
    where
        R: BitReader<'de> + ?Sized,
    {
        let depth: u8 = reader.unpack_as::<_, NBits<5>>(()).context("depth")?;
        if !(1..=Self::MAX_DEPTH).contains(&(depth as usize)) {
            return Err(Error::custom(format!("depth {depth} is out of 1..=30")));
        }
        Ok(Self {
            rewrite_pfx: reader.unpack(depth as usize).context("rewrite_pfx")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use tlb::bits::{bitvec::bits, de::unpack_fully, ser::pack};

    use super::*;

    #[test]
    fn parse_address() {
        let addr: MsgAddress = "EQBGXZ9ddZeWypx8EkJieHJX75ct0bpkmu0Y4YoYr3NM0Z9e"
            .parse()
            .unwrap();
        assert_eq!(addr.workchain_id, 0);
        assert_eq!(addr.to_base64_url(), "EQBGXZ9ddZeWypx8EkJieHJX75ct0bpkmu0Y4YoYr3NM0Z9e");
        assert_eq!(MsgAddress::from_hex(addr.to_hex()).unwrap(), addr);
    }

    #[test]
    fn crc_mismatch() {
        assert!(
            "EQBGXZ9ddZeWypx8EkJieHJX75ct0bpkmu0Y4YoYr3NM0Z9f"
                .parse::<MsgAddress>()
                .is_err()
        );
    }

    #[test]
    fn null_is_addr_none() {
        let bits = pack(MsgAddress::NULL, ()).unwrap();
        assert_eq!(bits.as_bitslice(), bits![u8, Msb0; 0, 0]);
        assert_eq!(unpack_fully::<MsgAddress>(&bits, ()).unwrap(), MsgAddress::NULL);
    }

    #[test]
    fn wide_workchain_is_rejected() {
        let addr = MsgAddress {
            workchain_id: 1000,
            address: [1; 32],
        };
        assert!(pack(addr, ()).is_err());
    }

    #[test]
    fn std_with_anycast() {
        let mut bits = BitVec::<u8, Msb0>::new();
        BitWriterExt::pack(&mut bits, MsgAddressTag::Std, ())
            .unwrap()
            .pack(
                Some(Anycast {
                    rewrite_pfx: bits![u8, Msb0; 1, 0, 1].to_bitvec(),
                }),
                (),
            )
            .unwrap()
            .pack(-1i8, ())
            .unwrap()
            .pack([0xAB; 32], ())
            .unwrap();
        assert_eq!(
            unpack_fully::<MsgAddress>(&bits, ()).unwrap(),
            MsgAddress {
                workchain_id: -1,
                address: [0xAB; 32],
            }
        );
    }

    #[test]
    fn external_address() {
        let ext = MsgAddressExt::Extern(bits![u8, Msb0; 1, 1, 0, 1].to_bitvec());
        let bits = pack(&ext, ()).unwrap();
        assert_eq!(bits.len(), 2 + 9 + 4);
        assert_eq!(unpack_fully::<MsgAddressExt>(&bits, ()).unwrap(), ext);
        assert!(unpack_fully::<MsgAddressExt>(&pack(MsgAddress::NULL, ()).unwrap(), ()).is_ok());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde() {
        use serde_json::json;

        let _: MsgAddress =
            serde_json::from_value(json!("EQBGXZ9ddZeWypx8EkJieHJX75ct0bpkmu0Y4YoYr3NM0Z9e"))
                .unwrap();
    }
}
