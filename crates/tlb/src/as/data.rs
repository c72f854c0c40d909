use core::marker::PhantomData;

use crate::{
    bits::{de::r#as::BitUnpackAs, ser::r#as::BitPackAs},
    de::{CellParser, CellParserError, r#as::CellDeserializeAs},
    ser::{CellBuilder, CellBuilderError, r#as::CellSerializeAs},
};

use super::Same;

/// Adapter to store bit-level values in the data part of the cell
pub struct Data<As: ?Sized = Same>(PhantomData<As>);

impl<T, As> CellSerializeAs<T> for Data<As>
where
    As: BitPackAs<T> + ?Sized,
    T: ?Sized,
{
    type Args = As::Args;

    #[inline]
    fn store_as(source: &T, builder: &mut CellBuilder, args: Self::Args) -> Result<(), CellBuilderError> {
        As::pack_as(source, builder, args)
    }
}

impl<'de, T, As> CellDeserializeAs<'de, T> for Data<As>
where
    As: BitUnpackAs<'de, T> + ?Sized,
{
    type Args = As::Args;

    #[inline]
    fn parse_as(parser: &mut CellParser<'de>, args: Self::Args) -> Result<T, CellParserError<'de>> {
        As::unpack_as(parser, args)
    }
}
