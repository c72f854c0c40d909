use crate::{
    bits::r#as::Same,
    de::{CellDeserialize, CellParser, CellParserError, r#as::CellDeserializeAs},
    ser::{CellBuilder, CellBuilderError, CellSerialize, r#as::CellSerializeAs},
};

impl<T> CellSerializeAs<T> for Same
where
    T: CellSerialize + ?Sized,
{
    type Args = T::Args;

    #[inline]
    fn store_as(source: &T, builder: &mut CellBuilder, args: Self::Args) -> Result<(), CellBuilderError> {
        source.store(builder, args)
    }
}

impl<'de, T> CellDeserializeAs<'de, T> for Same
where
    T: CellDeserialize<'de>,
{
    type Args = T::Args;

    #[inline]
    fn parse_as(parser: &mut CellParser<'de>, args: Self::Args) -> Result<T, CellParserError<'de>> {
        T::parse(parser, args)
    }
}
