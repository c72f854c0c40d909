use crate::{
    de::{BitReader, BitUnpack, r#as::BitUnpackAs},
    ser::{BitPack, BitWriter, r#as::BitPackAs},
};

/// Adapter to de/serialize value with its own implementation
pub struct Same;

impl<T> BitPackAs<T> for Same
where
    T: BitPack,
{
    type Args = T::Args;

    #[inline]
    fn pack_as<W>(source: &T, writer: &mut W, args: Self::Args) -> Result<(), W::Error>
    where
        W: BitWriter + ?Sized,
    {
        source.pack(writer, args)
    }
}

impl<'de, T> BitUnpackAs<'de, T> for Same
where
    T: BitUnpack<'de>,
{
    type Args = T::Args;

    #[inline]
    fn unpack_as<R>(reader: &mut R, args: Self::Args) -> Result<T, R::Error>
    where
        R: BitReader<'de> + ?Sized,
    {
        T::unpack(reader, args)
    }
}
