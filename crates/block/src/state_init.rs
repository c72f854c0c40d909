//! Collection of types related to [StateInit](https://docs.ton.org/develop/data-formats/msg-tlb#stateinit-tl-b)
use impl_tools::autoimpl;
use tlb::{
    Cell, Context,
    r#as::{NBits, ParseFully, Ref, Same, hashmap::HashmapE},
    bits::{
        de::{BitReader, BitReaderExt, BitUnpack},
        ser::{BitPack, BitWriter, BitWriterExt},
    },
    de::{CellDeserialize, CellParser, CellParserError},
    ser::{CellBuilder, CellBuilderError, CellSerialize, CellSerializeExt},
};

/// [StateInit](https://docs.ton.org/develop/data-formats/msg-tlb#stateinit-tl-b)
/// ```tlb
/// _ split_depth:(Maybe (## 5)) special:(Maybe TickTock)
/// code:(Maybe ^Cell) data:(Maybe ^Cell)
/// library:(HashmapE 256 SimpleLib) = StateInitWithLibs;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[autoimpl(Default)]
pub struct StateInit<C = Cell, D = Cell> {
    pub split_depth: Option<u8>,
    pub special: Option<TickTock>,
    pub code: Option<C>,
    pub data: Option<D>,
    pub library: HashmapE<SimpleLib>,
}

impl<C, D> StateInit<C, D>
where
    C: CellSerialize<Args = ()>,
    D: CellSerialize<Args = ()>,
{
    /// Replaces typed code and data with their cells
    pub fn normalize(&self) -> Result<StateInit, CellBuilderError> {
        Ok(StateInit {
            split_depth: self.split_depth,
            special: self.special,
            code: self.code.as_ref().map(|c| c.to_cell(())).transpose()?,
            data: self.data.as_ref().map(|d| d.to_cell(())).transpose()?,
            library: self.library.clone(),
        })
    }
}

impl<C, D> CellSerialize for StateInit<C, D>
where
    C: CellSerialize<Args = ()>,
    D: CellSerialize<Args = ()>,
{
    type Args = ();

    #[inline]
    fn store(&self, builder: &mut CellBuilder, _: Self::Args) -> Result<(), CellBuilderError> {
        builder
            // split_depth:(Maybe (## 5))
            .pack_as::<_, Option<NBits<5>>>(self.split_depth, ())
            .context("split_depth")?
            // special:(Maybe TickTock)
            .pack(self.special, ())
            .context("special")?
            // code:(Maybe ^Cell)
            .store_as::<_, Option<Ref>>(self.code.as_ref(), ())
            .context("code")?
            // data:(Maybe ^Cell)
            .store_as::<_, Option<Ref>>(self.data.as_ref(), ())
            .context("data")?
            // library:(HashmapE 256 SimpleLib)
            .store_as::<_, &HashmapE<Same, Same>>(&self.library, (256, (), ()))
            .context("library")?;
        Ok(())
    }
}

impl<'de, C, D> CellDeserialize<'de> for StateInit<C, D>
where
    C: CellDeserialize<'de, Args = ()>,
    D: CellDeserialize<'de, Args = ()>,
{
    type Args = ();

    #[inline]
    fn parse(parser: &mut CellParser<'de>, _: Self::Args) -> Result<Self, CellParserError<'de>> {
        Ok(Self {
            split_depth: parser
                .unpack_as::<_, Option<NBits<5>>>(())
                .context("split_depth")?,
            special: parser.unpack(()).context("special")?,
            code: parser
                .parse_as::<_, Option<Ref<ParseFully>>>(())
                .context("code")?,
            data: parser
                .parse_as::<_, Option<Ref<ParseFully>>>(())
                .context("data")?,
            library: parser
                .parse_as::<_, HashmapE<Same, Same>>((256, (), ()))
                .context("library")?,
        })
    }
}

/// `tick_tock` field for [`StateInit`]
/// ```tlb
/// tick_tock$_ tick:Bool tock:Bool = TickTock;
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TickTock {
    pub tick: bool,
    pub tock: bool,
}

impl TickTock {
    /// Two-bit form with `tick` as the high bit
    #[inline]
    pub const fn bits(&self) -> u8 {
        (self.tick as u8) << 1 | self.tock as u8
    }
}

impl BitPack for TickTock {
    type Args = ();

    #[inline]
    fn pack<W>(&self, writer: &mut W, _: Self::Args) -> Result<(), W::Error>
    where
        W: BitWriter + ?Sized,
    {
        writer.pack(self.tick, ())?.pack(self.tock, ())?;
        Ok(())
    }
}

impl<'de> BitUnpack<'de> for TickTock {
    type Args = ();

    #[inline]
    fn unpack<R>(reader: &mut R, _: Self::Args) -> Result<Self, R::Error>
    where
        R: BitReader<'de> + ?Sized,
    {
        Ok(Self {
            tick: reader.unpack(())?,
            tock: reader.unpack(())?,
        })
    }
}

/// `library` field for [`StateInit`]
/// ```tlb
/// simple_lib$_ public:Bool root:^Cell = SimpleLib;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleLib {
    pub public: bool,
    pub root: Cell,
}

impl CellSerialize for SimpleLib {
    type Args = ();

    #[inline]
    fn store(&self, builder: &mut CellBuilder, _: Self::Args) -> Result<(), CellBuilderError> {
        builder
            .pack(self.public, ())?
            .store_as::<_, Ref>(&self.root, ())?;
        Ok(())
    }
}

impl<'de> CellDeserialize<'de> for SimpleLib {
    type Args = ();

    #[inline]
    fn parse(parser: &mut CellParser<'de>, _: Self::Args) -> Result<Self, CellParserError<'de>> {
        Ok(SimpleLib {
            public: parser.unpack(())?,
            root: parser.parse_as::<_, Ref>(())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use tlb::{
        bits::bitvec::{order::Msb0, vec::BitVec},
        schema::TlbTypeExt,
    };

    use crate::schema;

    use super::*;

    #[test]
    fn state_init_serde() {
        let s = StateInit::<(), ()>::default();
        let cell = s.to_cell(()).unwrap();
        let got: StateInit<(), ()> = cell.parse_fully(()).unwrap();
        assert_eq!(got, s);
    }

    #[test]
    fn state_init_matches_descriptor() {
        let s = StateInit::<Cell, Cell> {
            split_depth: Some(3),
            special: Some(TickTock {
                tick: true,
                tock: false,
            }),
            code: Some(Cell::default()),
            data: None,
            library: HashmapE::from_entries(
                256,
                [(
                    BitVec::<u8, Msb0>::from_slice(&[7; 32]),
                    SimpleLib {
                        public: true,
                        root: Cell::default(),
                    },
                )],
            )
            .unwrap(),
        };
        let cell = s.to_cell(()).unwrap();
        assert!(schema::StateInit.validate_cell(&cell, false));
        assert_eq!(
            schema::StateInit.get_ticktock(&mut cell.parser()),
            Some(0b10)
        );
        let got: StateInit = cell.parse_fully(()).unwrap();
        assert_eq!(got, s);
    }
}
