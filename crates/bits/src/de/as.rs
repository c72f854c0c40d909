use bitvec::{order::Msb0, slice::BitSlice};
use either::Either;

use crate::{Context, Error, StringError};

use super::{BitReader, BitReaderExt};

/// Adapter to **de**serialize `T` with args.
/// See [`as`](crate::as) module-level documentation for more.
pub trait BitUnpackAs<'de, T> {
    type Args;

    /// Unpacks value with args using an adapter
    fn unpack_as<R>(reader: &mut R, args: Self::Args) -> Result<T, R::Error>
    where
        R: BitReader<'de> + ?Sized;
}

/// **De**serialize value from [`BitSlice`] with args using an adapter
#[inline]
pub fn unpack_as<'de, T, As>(
    mut bits: &'de BitSlice<u8, Msb0>,
    args: As::Args,
) -> Result<T, StringError>
where
    As: BitUnpackAs<'de, T> + ?Sized,
{
    bits.unpack_as::<_, As>(args)
}

/// **De**serialize value from [`BitSlice`] using an adapter
/// and ensure that no more data left.
#[inline]
pub fn unpack_fully_as<'de, T, As>(
    mut bits: &'de BitSlice<u8, Msb0>,
    args: As::Args,
) -> Result<T, StringError>
where
    As: BitUnpackAs<'de, T> + ?Sized,
{
    let v = bits.unpack_as::<T, As>(args)?;
    if !bits.is_empty() {
        return Err(Error::custom("more data left"));
    }
    Ok(v)
}

/// [Maybe](https://docs.ton.org/develop/data-formats/tl-b-types#maybe)
impl<'de, T, As> BitUnpackAs<'de, Option<T>> for Option<As>
where
    As: BitUnpackAs<'de, T>,
{
    type Args = As::Args;

    #[inline]
    fn unpack_as<R>(reader: &mut R, args: Self::Args) -> Result<Option<T>, R::Error>
    where
        R: BitReader<'de> + ?Sized,
    {
        Ok(match reader.unpack::<bool>(()).context("tag")? {
            false => None,
            true => Some(reader.unpack_as::<_, As>(args).context("value")?),
        })
    }
}

impl<'de, Left, Right, AsLeft, AsRight> BitUnpackAs<'de, Either<Left, Right>>
    for Either<AsLeft, AsRight>
where
    AsLeft: BitUnpackAs<'de, Left>,
    AsRight: BitUnpackAs<'de, Right>,
{
    type Args = (AsLeft::Args, AsRight::Args);

    #[inline]
    fn unpack_as<R>(reader: &mut R, (la, ra): Self::Args) -> Result<Either<Left, Right>, R::Error>
    where
        R: BitReader<'de> + ?Sized,
    {
        match reader.unpack::<bool>(()).context("tag")? {
            false => reader
                .unpack_as::<_, AsLeft>(la)
                .map(Either::Left)
                .context("left"),
            true => reader
                .unpack_as::<_, AsRight>(ra)
                .map(Either::Right)
                .context("right"),
        }
    }
}

impl<'de, T, As> BitUnpackAs<'de, Box<T>> for Box<As>
where
    As: BitUnpackAs<'de, T> + ?Sized,
{
    type Args = As::Args;

    #[inline]
    fn unpack_as<R>(reader: &mut R, args: Self::Args) -> Result<Box<T>, R::Error>
    where
        R: BitReader<'de> + ?Sized,
    {
        As::unpack_as(reader, args).map(Box::new)
    }
}
