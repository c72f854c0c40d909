use core::marker::PhantomData;

use crate::{
    Cell, Context, Either,
    bits::ser::BitWriter,
    de::{CellParser, CellParserError, r#as::CellDeserializeAs},
    ser::{CellBuilder, CellBuilderError, r#as::CellSerializeAs},
};

use super::Same;

/// Adapter to **de**/**ser**ialize value from/into reference to the child cell.
/// ```tlb
/// ^X
/// ```
pub struct Ref<As: ?Sized = Same>(PhantomData<As>);

impl<T, As> CellSerializeAs<T> for Ref<As>
where
    As: CellSerializeAs<T> + ?Sized,
    T: ?Sized,
{
    type Args = As::Args;

    #[inline]
    fn store_as(source: &T, builder: &mut CellBuilder, args: Self::Args) -> Result<(), CellBuilderError> {
        builder
            .store_reference_as::<&T, &As>(source, args)
            .context("^")?;
        Ok(())
    }
}

impl<'de, T, As> CellDeserializeAs<'de, T> for Ref<As>
where
    As: CellDeserializeAs<'de, T> + ?Sized,
{
    type Args = As::Args;

    #[inline]
    fn parse_as(parser: &mut CellParser<'de>, args: Self::Args) -> Result<T, CellParserError<'de>> {
        parser.parse_reference_as::<T, As>(args).context("^")
    }
}

/// Stores inline when the value fits into the rest of the builder,
/// otherwise in a child cell.
/// ```tlb
/// {X:Type} Either X ^X = EitherInlineOrRef X
/// ```
pub struct EitherInlineOrRef<As: ?Sized = Same>(PhantomData<As>);

impl<T, As> CellSerializeAs<T> for EitherInlineOrRef<As>
where
    As: CellSerializeAs<T> + ?Sized,
{
    type Args = As::Args;

    #[inline]
    fn store_as(source: &T, builder: &mut CellBuilder, args: Self::Args) -> Result<(), CellBuilderError> {
        let mut b = Cell::builder();
        As::store_as(source, &mut b, args)?;
        let cell = b.into_cell();
        // one bit goes to the tag
        let inline = cell.data.len() < builder.capacity_left()
            && cell.references.len() <= builder.references_left();
        builder.store_as::<_, Either<Same, Ref>>(
            if inline { Either::Left } else { Either::Right }(cell),
            ((), ()),
        )?;
        Ok(())
    }
}

impl<'de, T, As> CellDeserializeAs<'de, T> for EitherInlineOrRef<As>
where
    As: CellDeserializeAs<'de, T>,
    As::Args: Clone,
{
    type Args = As::Args;

    #[inline]
    fn parse_as(parser: &mut CellParser<'de>, args: Self::Args) -> Result<T, CellParserError<'de>> {
        Either::<As, Ref<As>>::parse_as(parser, (args.clone(), args)).map(Either::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        bits::r#as::NBits,
        r#as::Data,
        tests::assert_store_parse_as_eq,
    };

    use super::*;

    #[test]
    fn ref_layout() {
        let mut builder = Cell::builder();
        builder.store_as::<_, Ref<Data>>(0xABu8, ()).unwrap();
        let cell = builder.into_cell();
        assert!(cell.data.is_empty());
        assert_eq!(cell.references.len(), 1);
        assert_eq!(cell.references[0].data.len(), 8);
    }

    #[test]
    fn either_inline_or_ref_serde() {
        assert_store_parse_as_eq::<u32, EitherInlineOrRef<Data<NBits<20>>>>(0xBEEF, ());
    }

    #[test]
    fn either_inline_or_ref_spills() {
        let mut builder = Cell::builder();
        builder.repeat_bit(1000, false).unwrap();
        builder
            .store_as::<_, EitherInlineOrRef<Data<NBits<32>>>>(7u32, ())
            .unwrap();
        let cell = builder.into_cell();
        assert_eq!(cell.data.len(), 1001);
        assert_eq!(cell.references.len(), 1);
    }
}
