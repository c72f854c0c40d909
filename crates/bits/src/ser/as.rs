use bitvec::{order::Msb0, vec::BitVec};
use either::Either;

use crate::{Context, StringError};

use super::{BitWriter, BitWriterExt};

/// Adapter to **ser**ialize `T` with args.
/// See [`as`](crate::as) module-level documentation for more.
pub trait BitPackAs<T: ?Sized> {
    type Args;

    /// Packs given value with args using an adapter
    fn pack_as<W>(source: &T, writer: &mut W, args: Self::Args) -> Result<(), W::Error>
    where
        W: BitWriter + ?Sized;
}

/// **Ser**ialize given value with args into [`BitVec`] using an adapter
#[inline]
pub fn pack_as<T, As>(value: T, args: As::Args) -> Result<BitVec<u8, Msb0>, StringError>
where
    As: BitPackAs<T> + ?Sized,
{
    let mut writer = BitVec::new();
    writer.pack_as::<_, As>(value, args)?;
    Ok(writer)
}

impl<'a, T, As> BitPackAs<&'a T> for &'a As
where
    T: ?Sized,
    As: BitPackAs<T> + ?Sized,
{
    type Args = As::Args;

    #[inline]
    fn pack_as<W>(source: &&T, writer: &mut W, args: Self::Args) -> Result<(), W::Error>
    where
        W: BitWriter + ?Sized,
    {
        As::pack_as(source, writer, args)
    }
}

/// [Maybe](https://docs.ton.org/develop/data-formats/tl-b-types#maybe)
impl<T, As> BitPackAs<Option<T>> for Option<As>
where
    As: BitPackAs<T>,
{
    type Args = As::Args;

    #[inline]
    fn pack_as<W>(source: &Option<T>, writer: &mut W, args: Self::Args) -> Result<(), W::Error>
    where
        W: BitWriter + ?Sized,
    {
        match source {
            None => {
                // nothing$0
                writer.pack(false, ()).context("tag")?;
            }
            Some(v) => {
                // just$1
                writer
                    .pack(true, ())
                    .context("tag")?
                    .pack_as::<_, &As>(v, args)
                    .context("value")?;
            }
        }
        Ok(())
    }
}

impl<Left, Right, AsLeft, AsRight> BitPackAs<Either<Left, Right>> for Either<AsLeft, AsRight>
where
    AsLeft: BitPackAs<Left>,
    AsRight: BitPackAs<Right>,
{
    type Args = (AsLeft::Args, AsRight::Args);

    #[inline]
    fn pack_as<W>(
        source: &Either<Left, Right>,
        writer: &mut W,
        (la, ra): Self::Args,
    ) -> Result<(), W::Error>
    where
        W: BitWriter + ?Sized,
    {
        match source {
            Either::Left(l) => writer
                .pack(false, ())
                .context("tag")?
                .pack_as::<_, &AsLeft>(l, la)
                .context("left")?,
            Either::Right(r) => writer
                .pack(true, ())
                .context("tag")?
                .pack_as::<_, &AsRight>(r, ra)
                .context("right")?,
        };
        Ok(())
    }
}

impl<T, As> BitPackAs<Box<T>> for Box<As>
where
    As: BitPackAs<T> + ?Sized,
{
    type Args = As::Args;

    #[inline]
    fn pack_as<W>(source: &Box<T>, writer: &mut W, args: Self::Args) -> Result<(), W::Error>
    where
        W: BitWriter + ?Sized,
    {
        As::pack_as(source, writer, args)
    }
}
