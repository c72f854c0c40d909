//! Binary **ser**ialization for [TL-B](https://docs.ton.org/develop/data-formats/tl-b-language)
pub mod r#as;
mod writer;

pub use self::{r#as::*, writer::*};

use std::{borrow::Cow, sync::Arc};

use bitvec::{order::Msb0, slice::BitSlice, vec::BitVec};
use either::Either;
use impl_tools::autoimpl;

use crate::{Context, StringError};

/// A type that can be bitwise-**ser**ilalized into any [`BitWriter`].
#[autoimpl(for<T: trait + ToOwned + ?Sized> Cow<'_, T>)]
#[autoimpl(for<T: trait + ?Sized> &T, &mut T, Box<T>, Arc<T>)]
pub trait BitPack {
    type Args;

    /// Packs the value into given writer with args
    fn pack<W>(&self, writer: &mut W, args: Self::Args) -> Result<(), W::Error>
    where
        W: BitWriter + ?Sized;
}

/// **Ser**ialize given value with args into [`BitVec`]
#[inline]
pub fn pack<T>(value: T, args: T::Args) -> Result<BitVec<u8, Msb0>, StringError>
where
    T: BitPack,
{
    let mut writer = BitVec::new();
    BitWriterExt::pack(&mut writer, value, args)?;
    Ok(writer)
}

impl BitPack for () {
    type Args = ();

    #[inline]
    fn pack<W>(&self, _writer: &mut W, _: Self::Args) -> Result<(), W::Error>
    where
        W: BitWriter + ?Sized,
    {
        Ok(())
    }
}

impl BitPack for bool {
    type Args = ();

    #[inline]
    fn pack<W>(&self, writer: &mut W, _: Self::Args) -> Result<(), W::Error>
    where
        W: BitWriter + ?Sized,
    {
        writer.write_bit(*self)
    }
}

impl<T, const N: usize> BitPack for [T; N]
where
    T: BitPack,
    T::Args: Clone,
{
    type Args = T::Args;

    #[inline]
    fn pack<W>(&self, writer: &mut W, args: Self::Args) -> Result<(), W::Error>
    where
        W: BitWriter + ?Sized,
    {
        for (i, v) in self.iter().enumerate() {
            v.pack(writer, args.clone())
                .with_context(|| format!("[{i}]"))?;
        }
        Ok(())
    }
}

macro_rules! impl_bit_pack_for_tuple {
    ($($n:tt:$t:ident),+) => {
        impl<$($t),+> BitPack for ($($t,)+)
        where $(
            $t: BitPack,
        )+
        {
            type Args = ($($t::Args,)+);

            #[inline]
            fn pack<W>(&self, writer: &mut W, args: Self::Args) -> Result<(), W::Error>
            where
                W: BitWriter + ?Sized,
            {
                $(self.$n.pack(writer, args.$n).context(concat!(".", stringify!($n)))?;)+
                Ok(())
            }
        }
    };
}
impl_bit_pack_for_tuple!(0:T0);
impl_bit_pack_for_tuple!(0:T0,1:T1);
impl_bit_pack_for_tuple!(0:T0,1:T1,2:T2);
impl_bit_pack_for_tuple!(0:T0,1:T1,2:T2,3:T3);
impl_bit_pack_for_tuple!(0:T0,1:T1,2:T2,3:T3,4:T4);
impl_bit_pack_for_tuple!(0:T0,1:T1,2:T2,3:T3,4:T4,5:T5);
impl_bit_pack_for_tuple!(0:T0,1:T1,2:T2,3:T3,4:T4,5:T5,6:T6);
impl_bit_pack_for_tuple!(0:T0,1:T1,2:T2,3:T3,4:T4,5:T5,6:T6,7:T7);

/// ```tlb
/// left$0 {X:Type} {Y:Type} value:X = Either X Y;
/// right$1 {X:Type} {Y:Type} value:Y = Either X Y;
/// ```
impl<L, R> BitPack for Either<L, R>
where
    L: BitPack,
    R: BitPack,
{
    type Args = (L::Args, R::Args);

    #[inline]
    fn pack<W>(&self, writer: &mut W, (la, ra): Self::Args) -> Result<(), W::Error>
    where
        W: BitWriter + ?Sized,
    {
        match self {
            Self::Left(l) => writer
                .pack(false, ())
                .context("tag")?
                .pack(l, la)
                .context("left")?,
            Self::Right(r) => writer
                .pack(true, ())
                .context("tag")?
                .pack(r, ra)
                .context("right")?,
        };
        Ok(())
    }
}

/// [Maybe](https://docs.ton.org/develop/data-formats/tl-b-types#maybe)
/// ```tlb
/// nothing$0 {X:Type} = Maybe X;
/// just$1 {X:Type} value:X = Maybe X;
/// ```
impl<T> BitPack for Option<T>
where
    T: BitPack,
{
    type Args = T::Args;

    #[inline]
    fn pack<W>(&self, writer: &mut W, args: Self::Args) -> Result<(), W::Error>
    where
        W: BitWriter + ?Sized,
    {
        match self {
            None => {
                writer.pack(false, ()).context("tag")?;
            }
            Some(v) => {
                writer
                    .pack(true, ())
                    .context("tag")?
                    .pack(v, args)
                    .context("value")?;
            }
        }
        Ok(())
    }
}

impl BitPack for BitSlice<u8, Msb0> {
    type Args = ();

    #[inline]
    fn pack<W>(&self, writer: &mut W, _: Self::Args) -> Result<(), W::Error>
    where
        W: BitWriter + ?Sized,
    {
        writer.write_bitslice(self)
    }
}

impl BitPack for BitVec<u8, Msb0> {
    type Args = ();

    #[inline]
    fn pack<W>(&self, writer: &mut W, _: Self::Args) -> Result<(), W::Error>
    where
        W: BitWriter + ?Sized,
    {
        writer.write_bitslice(self)
    }
}
