//! Binary **de**serialization for [TL-B](https://docs.ton.org/develop/data-formats/tl-b-language)
pub mod r#as;
mod reader;

pub use self::{r#as::*, reader::*};

use std::{borrow::Cow, sync::Arc};

use bitvec::{order::Msb0, slice::BitSlice, vec::BitVec};
use either::Either;

use crate::{Context, Error, StringError};

/// A type that can be bitwise-**de**serialized from any [`BitReader`].
pub trait BitUnpack<'de>: Sized {
    type Args;

    /// Unpacks the value with args
    fn unpack<R>(reader: &mut R, args: Self::Args) -> Result<Self, R::Error>
    where
        R: BitReader<'de> + ?Sized;
}

/// **De**serialize the value from [`BitSlice`] with args
#[inline]
pub fn unpack<'de, T>(mut bits: &'de BitSlice<u8, Msb0>, args: T::Args) -> Result<T, StringError>
where
    T: BitUnpack<'de>,
{
    bits.unpack(args)
}

/// **De**serialize the value from [`BitSlice`] with args and ensure that
/// no more data left.
#[inline]
pub fn unpack_fully<'de, T>(
    mut bits: &'de BitSlice<u8, Msb0>,
    args: T::Args,
) -> Result<T, StringError>
where
    T: BitUnpack<'de>,
{
    let v = bits.unpack(args)?;
    if !bits.is_empty() {
        return Err(Error::custom("more data left"));
    }
    Ok(v)
}

impl<'de> BitUnpack<'de> for () {
    type Args = ();

    #[inline]
    fn unpack<R>(_reader: &mut R, _: Self::Args) -> Result<Self, R::Error>
    where
        R: BitReader<'de> + ?Sized,
    {
        Ok(())
    }
}

impl<'de> BitUnpack<'de> for bool {
    type Args = ();

    #[inline]
    fn unpack<R>(reader: &mut R, _: Self::Args) -> Result<Self, R::Error>
    where
        R: BitReader<'de> + ?Sized,
    {
        reader.read_bit()?.ok_or_else(|| Error::custom("EOF"))
    }
}

impl<'de, T, const N: usize> BitUnpack<'de> for [T; N]
where
    T: BitUnpack<'de>,
    T::Args: Clone,
{
    type Args = T::Args;

    #[inline]
    fn unpack<R>(reader: &mut R, args: Self::Args) -> Result<Self, R::Error>
    where
        R: BitReader<'de> + ?Sized,
    {
        let v = (0..N)
            .map(|i| T::unpack(&mut *reader, args.clone()).with_context(|| format!("[{i}]")))
            .collect::<Result<Vec<_>, _>>()?;
        v.try_into()
            .map_err(|_| Error::custom(format!("expected {N} elements")))
    }
}

macro_rules! impl_bit_unpack_for_tuple {
    ($($n:tt:$t:ident),+) => {
        impl<'de, $($t),+> BitUnpack<'de> for ($($t,)+)
        where $(
            $t: BitUnpack<'de>,
        )+
        {
            type Args = ($($t::Args,)+);

            #[inline]
            fn unpack<R>(reader: &mut R, args: Self::Args) -> Result<Self, R::Error>
            where
                R: BitReader<'de> + ?Sized,
            {
                Ok(($(
                    $t::unpack(&mut *reader, args.$n).context(concat!(".", stringify!($n)))?,
                )+))
            }
        }
    };
}
impl_bit_unpack_for_tuple!(0:T0);
impl_bit_unpack_for_tuple!(0:T0,1:T1);
impl_bit_unpack_for_tuple!(0:T0,1:T1,2:T2);
impl_bit_unpack_for_tuple!(0:T0,1:T1,2:T2,3:T3);
impl_bit_unpack_for_tuple!(0:T0,1:T1,2:T2,3:T3,4:T4);
impl_bit_unpack_for_tuple!(0:T0,1:T1,2:T2,3:T3,4:T4,5:T5);
impl_bit_unpack_for_tuple!(0:T0,1:T1,2:T2,3:T3,4:T4,5:T5,6:T6);
impl_bit_unpack_for_tuple!(0:T0,1:T1,2:T2,3:T3,4:T4,5:T5,6:T6,7:T7);

impl<'de, T> BitUnpack<'de> for Box<T>
where
    T: BitUnpack<'de>,
{
    type Args = T::Args;

    #[inline]
    fn unpack<R>(reader: &mut R, args: Self::Args) -> Result<Self, R::Error>
    where
        R: BitReader<'de> + ?Sized,
    {
        T::unpack(reader, args).map(Box::new)
    }
}

impl<'de, T> BitUnpack<'de> for Arc<T>
where
    T: BitUnpack<'de>,
{
    type Args = T::Args;

    #[inline]
    fn unpack<R>(reader: &mut R, args: Self::Args) -> Result<Self, R::Error>
    where
        R: BitReader<'de> + ?Sized,
    {
        T::unpack(reader, args).map(Arc::new)
    }
}

/// Always unpacks as [`Either::Left`] when the tag bit is `0`
/// and as [`Either::Right`] otherwise.
/// ```tlb
/// left$0 {X:Type} {Y:Type} value:X = Either X Y;
/// right$1 {X:Type} {Y:Type} value:Y = Either X Y;
/// ```
impl<'de, Left, Right> BitUnpack<'de> for Either<Left, Right>
where
    Left: BitUnpack<'de>,
    Right: BitUnpack<'de>,
{
    type Args = (Left::Args, Right::Args);

    #[inline]
    fn unpack<R>(reader: &mut R, (la, ra): Self::Args) -> Result<Self, R::Error>
    where
        R: BitReader<'de> + ?Sized,
    {
        match reader.unpack(()).context("tag")? {
            false => reader.unpack(la).map(Either::Left).context("left"),
            true => reader.unpack(ra).map(Either::Right).context("right"),
        }
    }
}

/// [Maybe](https://docs.ton.org/develop/data-formats/tl-b-types#maybe)
/// ```tlb
/// nothing$0 {X:Type} = Maybe X;
/// just$1 {X:Type} value:X = Maybe X;
/// ```
impl<'de, T> BitUnpack<'de> for Option<T>
where
    T: BitUnpack<'de>,
{
    type Args = T::Args;

    #[inline]
    fn unpack<R>(reader: &mut R, args: Self::Args) -> Result<Self, R::Error>
    where
        R: BitReader<'de> + ?Sized,
    {
        Ok(match reader.unpack(()).context("tag")? {
            false => None,
            true => Some(reader.unpack(args).context("value")?),
        })
    }
}

impl<'de> BitUnpack<'de> for Cow<'de, BitSlice<u8, Msb0>> {
    /// length in bits
    type Args = usize;

    #[inline]
    fn unpack<R>(reader: &mut R, len: Self::Args) -> Result<Self, R::Error>
    where
        R: BitReader<'de> + ?Sized,
    {
        reader.read_bits(len)
    }
}

impl<'de> BitUnpack<'de> for BitVec<u8, Msb0> {
    /// length in bits
    type Args = usize;

    #[inline]
    fn unpack<R>(reader: &mut R, len: Self::Args) -> Result<Self, R::Error>
    where
        R: BitReader<'de> + ?Sized,
    {
        reader.read_bits(len).map(Cow::into_owned)
    }
}
