use core::marker::PhantomData;

use crate::de::{CellDeserializeAs, CellParser, CellParserError};

use super::Same;

/// **De**serializes with `As` and fails unless the cell is consumed
/// exactly, both data and references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParseFully<As: ?Sized = Same>(PhantomData<As>);

impl<'de, T, As> CellDeserializeAs<'de, T> for ParseFully<As>
where
    As: CellDeserializeAs<'de, T> + ?Sized,
{
    type Args = As::Args;

    #[inline]
    fn parse_as(parser: &mut CellParser<'de>, args: Self::Args) -> Result<T, CellParserError<'de>> {
        let value = parser.parse_as::<_, As>(args)?;
        parser.ensure_empty()?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{Cell, bits::ser::BitWriterExt, r#as::Data};

    use super::*;

    #[test]
    fn trailing_bits() {
        let mut b = Cell::builder();
        b.pack(7u32, ()).unwrap().pack(true, ()).unwrap();
        let cell = b.into_cell();

        assert_eq!(cell.parser().parse_as::<u32, Data>(()).unwrap(), 7);
        assert!(cell.parser().parse_as::<u32, ParseFully<Data>>(()).is_err());
    }

    #[test]
    fn trailing_reference() {
        let mut b = Cell::builder();
        b.pack(7u32, ()).unwrap();
        b.store_reference(Arc::new(Cell::default())).unwrap();
        let cell = b.into_cell();

        assert!(cell.parser().parse_as::<u32, ParseFully<Data>>(()).is_err());
    }
}
