use core::fmt::{self, Display};

use tlb::{
    Context, Error,
    bits::{
        r#as::NBits,
        de::{BitReader, BitReaderExt, BitUnpack},
        ser::{BitPack, BitWriter, BitWriterExt},
    },
};

/// Shard of a workchain: the first `shard_pfx_bits` bits of the account
/// addresses it covers
/// ```tlb
/// shard_ident$00 shard_pfx_bits:(#<= 60)
///   workchain_id:int32 shard_prefix:uint64 = ShardIdent;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShardIdent {
    pub shard_pfx_bits: u8,
    pub workchain_id: i32,
    pub shard_prefix: u64,
}

impl ShardIdent {
    pub const MAX_PFX_BITS: u8 = 60;

    /// The whole workchain
    #[inline]
    pub const fn full(workchain_id: i32) -> Self {
        Self {
            shard_pfx_bits: 0,
            workchain_id,
            shard_prefix: 0,
        }
    }

    /// From the shard id form: prefix bits followed by a single tag bit
    pub fn from_shard(workchain_id: i32, shard: u64) -> Option<Self> {
        if shard == 0 {
            return None;
        }
        let shard_pfx_bits = 63 - shard.trailing_zeros() as u8;
        let s = Self {
            shard_pfx_bits,
            workchain_id,
            shard_prefix: shard & !(1 << (63 - shard_pfx_bits)),
        };
        s.is_valid().then_some(s)
    }

    /// Shard id form: prefix bits followed by a single tag bit
    #[inline]
    pub const fn shard(&self) -> u64 {
        self.shard_prefix | 1 << 63u8.saturating_sub(self.shard_pfx_bits)
    }

    /// Whether the prefix fits its length and the workchain is not
    /// the reserved `i32::MIN`
    #[inline]
    pub const fn is_valid(&self) -> bool {
        self.shard_pfx_bits <= Self::MAX_PFX_BITS
            && self.workchain_id != i32::MIN
            && self.shard_prefix & ((1 << (63 - self.shard_pfx_bits)) - 1) == 0
    }
}

impl Display for ShardIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:016x}", self.workchain_id, self.shard())
    }
}

impl BitPack for ShardIdent {
    type Args = ();

    fn pack<W>(&self, writer: &mut W, _: Self::Args) -> Result<(), W::Error>
    where
        W: BitWriter + ?Sized,
    {
        if !self.is_valid() {
            return Err(Error::custom(format!("invalid shard {self:?}")));
        }
        writer
            .pack_as::<_, NBits<2>>(0u8, ())?
            .pack_as::<_, NBits<6>>(self.shard_pfx_bits, ())?
            .pack(self.workchain_id, ())?
            .pack(self.shard_prefix, ())?;
        Ok(())
    }
}

impl<'de> BitUnpack<'de> for ShardIdent {
    type Args = ();

    fn unpack<R>(reader: &mut R, _: Self::Args) -> Result<Self, R::Error>
    where
        R: BitReader<'de> + ?Sized,
    {
        let tag: u8 = reader.unpack_as::<_, NBits<2>>(())?;
        if tag != 0 {
            return Err(Error::custom(format!("invalid shard_ident tag: {tag:#b}")));
        }
        let s = Self {
            shard_pfx_bits: reader.unpack_as::<_, NBits<6>>(())?,
            workchain_id: reader.unpack(()).context("workchain_id")?,
            shard_prefix: reader.unpack(()).context("shard_prefix")?,
        };
        if !s.is_valid() {
            return Err(Error::custom(format!("invalid shard {s:?}")));
        }
        Ok(s)
    }
}

/// ```tlb
/// block_id_ext$_ shard_id:ShardIdent seq_no:uint32
///   root_hash:bits256 file_hash:bits256 = BlockIdExt;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockIdExt {
    pub shard_id: ShardIdent,
    pub seq_no: u32,
    pub root_hash: [u8; 32],
    pub file_hash: [u8; 32],
}

impl BitPack for BlockIdExt {
    type Args = ();

    fn pack<W>(&self, writer: &mut W, _: Self::Args) -> Result<(), W::Error>
    where
        W: BitWriter + ?Sized,
    {
        writer
            .pack(self.shard_id, ())
            .context("shard_id")?
            .pack(self.seq_no, ())?
            .pack(self.root_hash, ())?
            .pack(self.file_hash, ())?;
        Ok(())
    }
}

impl<'de> BitUnpack<'de> for BlockIdExt {
    type Args = ();

    fn unpack<R>(reader: &mut R, _: Self::Args) -> Result<Self, R::Error>
    where
        R: BitReader<'de> + ?Sized,
    {
        Ok(Self {
            shard_id: reader.unpack(()).context("shard_id")?,
            seq_no: reader.unpack(()).context("seq_no")?,
            root_hash: reader.unpack(()).context("root_hash")?,
            file_hash: reader.unpack(()).context("file_hash")?,
        })
    }
}

/// Reference to a block of another chain
/// ```tlb
/// ext_blk_ref$_ end_lt:uint64 seq_no:uint32
///   root_hash:bits256 file_hash:bits256 = ExtBlkRef;
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ExtBlkRef {
    pub end_lt: u64,
    pub seq_no: u32,
    pub root_hash: [u8; 32],
    pub file_hash: [u8; 32],
}

impl BitPack for ExtBlkRef {
    type Args = ();

    fn pack<W>(&self, writer: &mut W, _: Self::Args) -> Result<(), W::Error>
    where
        W: BitWriter + ?Sized,
    {
        writer
            .pack(self.end_lt, ())?
            .pack(self.seq_no, ())?
            .pack(self.root_hash, ())?
            .pack(self.file_hash, ())?;
        Ok(())
    }
}

impl<'de> BitUnpack<'de> for ExtBlkRef {
    type Args = ();

    fn unpack<R>(reader: &mut R, _: Self::Args) -> Result<Self, R::Error>
    where
        R: BitReader<'de> + ?Sized,
    {
        Ok(Self {
            end_lt: reader.unpack(()).context("end_lt")?,
            seq_no: reader.unpack(()).context("seq_no")?,
            root_hash: reader.unpack(()).context("root_hash")?,
            file_hash: reader.unpack(()).context("file_hash")?,
        })
    }
}

/// Value of [`ProcessedInfo`](crate::schema::ProcessedInfo)
/// ```tlb
/// processed_upto$_ last_msg_lt:uint64 last_msg_hash:bits256 = ProcessedUpto;
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ProcessedUpto {
    pub last_msg_lt: u64,
    pub last_msg_hash: [u8; 32],
}

impl BitPack for ProcessedUpto {
    type Args = ();

    #[inline]
    fn pack<W>(&self, writer: &mut W, _: Self::Args) -> Result<(), W::Error>
    where
        W: BitWriter + ?Sized,
    {
        writer
            .pack(self.last_msg_lt, ())?
            .pack(self.last_msg_hash, ())?;
        Ok(())
    }
}

impl<'de> BitUnpack<'de> for ProcessedUpto {
    type Args = ();

    #[inline]
    fn unpack<R>(reader: &mut R, _: Self::Args) -> Result<Self, R::Error>
    where
        R: BitReader<'de> + ?Sized,
    {
        Ok(Self {
            last_msg_lt: reader.unpack(())?,
            last_msg_hash: reader.unpack(())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use tlb::{
        Cell,
        r#as::Data,
        bits::{de::unpack_fully, ser::pack},
        schema::{SizeExt, TlbType, TlbTypeExt},
    };

    use crate::schema;

    use super::*;

    fn cell_of(value: impl BitPack<Args = ()>) -> Cell {
        let mut b = Cell::builder();
        b.pack(value, ()).unwrap();
        b.into_cell()
    }

    #[rstest]
    #[case(0, 0x8000_0000_0000_0000)]
    #[case(-1, 0x8000_0000_0000_0000)]
    #[case(0, 0x4000_0000_0000_0000)]
    #[case(0, 0xE000_0000_0000_0000)]
    #[case(5, 0x0000_0000_0000_0010)]
    fn shard_id_form(#[case] workchain_id: i32, #[case] shard: u64) {
        let s = ShardIdent::from_shard(workchain_id, shard).unwrap();
        assert_eq!(s.shard(), shard);

        let cell = cell_of(s);
        assert_eq!(cell.data.len(), 104);
        assert!(schema::ShardIdent.validate_cell(&cell, false));
        assert_eq!(cell.parse_fully_as::<ShardIdent, Data>(()).unwrap(), s);
    }

    #[test]
    fn shard_prefix_with_stray_bits() {
        let s = ShardIdent {
            shard_pfx_bits: 1,
            workchain_id: 0,
            shard_prefix: 0x4000_0000_0000_0000,
        };
        assert!(!s.is_valid());
        assert!(pack(s, ()).is_err());
        assert!(ShardIdent::from_shard(0, 0).is_none());
        assert!(ShardIdent::from_shard(i32::MIN, 1 << 63).is_none());
        // 62 prefix bits
        assert!(ShardIdent::from_shard(0, 0b10).is_none());
    }

    #[test]
    fn block_id_ext() {
        let id = BlockIdExt {
            shard_id: ShardIdent::full(-1),
            seq_no: 100,
            root_hash: [2; 32],
            file_hash: [3; 32],
        };
        let cell = cell_of(id);
        assert!(schema::BlockIdExt.validate_cell(&cell, false));
        assert_eq!(
            schema::BlockIdExt.get_size(&cell.parser()),
            Some(SizeExt::bits_only(104 + 32 + 512))
        );
        assert_eq!(cell.parse_fully_as::<BlockIdExt, Data>(()).unwrap(), id);
        assert_eq!(id.shard_id.to_string(), "-1:8000000000000000");
    }

    #[test]
    fn processed_upto() {
        let p = ProcessedUpto {
            last_msg_lt: 1,
            last_msg_hash: [9; 32],
        };
        let bits = pack(p, ()).unwrap();
        assert_eq!(bits.len(), 320);
        assert_eq!(unpack_fully::<ProcessedUpto>(&bits, ()).unwrap(), p);

        let blk = ExtBlkRef {
            end_lt: 7,
            seq_no: 1,
            ..Default::default()
        };
        assert!(schema::ExtBlkRef.validate_cell(&cell_of(blk), false));
    }
}
