use std::sync::Arc;

use crate::{Context, Either, r#as::AsWrap, bits::ser::BitWriterExt};

use super::{CellBuilder, CellBuilderError, CellSerialize};

/// Adapter to **ser**ialize `T` with args.
/// See [`as`](crate::as) module-level documentation for more.
pub trait CellSerializeAs<T: ?Sized> {
    type Args;

    /// Store given value with args using an adapter
    fn store_as(source: &T, builder: &mut CellBuilder, args: Self::Args) -> Result<(), CellBuilderError>;
}

impl<'a, T, As> CellSerializeAs<&'a T> for &'a As
where
    As: CellSerializeAs<T> + ?Sized,
    T: ?Sized,
{
    type Args = As::Args;

    #[inline]
    fn store_as(source: &&T, builder: &mut CellBuilder, args: Self::Args) -> Result<(), CellBuilderError> {
        As::store_as(source, builder, args)
    }
}

impl<T, As> CellSerializeAs<[T]> for [As]
where
    As: CellSerializeAs<T>,
    As::Args: Clone,
{
    type Args = As::Args;

    #[inline]
    fn store_as(source: &[T], builder: &mut CellBuilder, args: Self::Args) -> Result<(), CellBuilderError> {
        for (i, v) in source.iter().enumerate() {
            As::store_as(v, builder, args.clone()).with_context(|| format!("[{i}]"))?;
        }
        Ok(())
    }
}

impl<T, As, const N: usize> CellSerializeAs<[T; N]> for [As; N]
where
    As: CellSerializeAs<T>,
    As::Args: Clone,
{
    type Args = As::Args;

    #[inline]
    fn store_as(source: &[T; N], builder: &mut CellBuilder, args: Self::Args) -> Result<(), CellBuilderError> {
        <[As]>::store_as(source.as_slice(), builder, args)
    }
}

macro_rules! impl_cell_serialize_as_for_tuple {
    ($($n:tt:$t:ident as $a:ident),+) => {
        impl<$($t, $a),+> CellSerializeAs<($($t,)+)> for ($($a,)+)
        where $(
            $a: CellSerializeAs<$t>,
        )+
        {
            type Args = ($($a::Args,)+);

            #[inline]
            fn store_as(source: &($($t,)+), builder: &mut CellBuilder, args: Self::Args) -> Result<(), CellBuilderError> {
                $($a::store_as(&source.$n, builder, args.$n).context(concat!(".", stringify!($n)))?;)+
                Ok(())
            }
        }
    };
}
impl_cell_serialize_as_for_tuple!(0:T0 as As0);
impl_cell_serialize_as_for_tuple!(0:T0 as As0,1:T1 as As1);
impl_cell_serialize_as_for_tuple!(0:T0 as As0,1:T1 as As1,2:T2 as As2);
impl_cell_serialize_as_for_tuple!(0:T0 as As0,1:T1 as As1,2:T2 as As2,3:T3 as As3);
impl_cell_serialize_as_for_tuple!(0:T0 as As0,1:T1 as As1,2:T2 as As2,3:T3 as As3,4:T4 as As4);
impl_cell_serialize_as_for_tuple!(0:T0 as As0,1:T1 as As1,2:T2 as As2,3:T3 as As3,4:T4 as As4,5:T5 as As5);
impl_cell_serialize_as_for_tuple!(0:T0 as As0,1:T1 as As1,2:T2 as As2,3:T3 as As3,4:T4 as As4,5:T5 as As5,6:T6 as As6);
impl_cell_serialize_as_for_tuple!(0:T0 as As0,1:T1 as As1,2:T2 as As2,3:T3 as As3,4:T4 as As4,5:T5 as As5,6:T6 as As6,7:T7 as As7);
impl_cell_serialize_as_for_tuple!(0:T0 as As0,1:T1 as As1,2:T2 as As2,3:T3 as As3,4:T4 as As4,5:T5 as As5,6:T6 as As6,7:T7 as As7,8:T8 as As8);
impl_cell_serialize_as_for_tuple!(0:T0 as As0,1:T1 as As1,2:T2 as As2,3:T3 as As3,4:T4 as As4,5:T5 as As5,6:T6 as As6,7:T7 as As7,8:T8 as As8,9:T9 as As9);

impl<T, As> CellSerializeAs<Box<T>> for Box<As>
where
    As: CellSerializeAs<T> + ?Sized,
{
    type Args = As::Args;

    #[inline]
    fn store_as(source: &Box<T>, builder: &mut CellBuilder, args: Self::Args) -> Result<(), CellBuilderError> {
        As::store_as(source, builder, args)
    }
}

impl<T, As> CellSerializeAs<Arc<T>> for Arc<As>
where
    As: CellSerializeAs<T> + ?Sized,
{
    type Args = As::Args;

    #[inline]
    fn store_as(source: &Arc<T>, builder: &mut CellBuilder, args: Self::Args) -> Result<(), CellBuilderError> {
        As::store_as(source, builder, args)
    }
}

/// Implementation of [`Either X Y`](https://docs.ton.org/develop/data-formats/tl-b-types#either):
/// ```tlb
/// left$0 {X:Type} {Y:Type} value:X = Either X Y;
/// right$1 {X:Type} {Y:Type} value:Y = Either X Y;
/// ```
impl<Left, Right, AsLeft, AsRight> CellSerializeAs<Either<Left, Right>> for Either<AsLeft, AsRight>
where
    AsLeft: CellSerializeAs<Left>,
    AsRight: CellSerializeAs<Right>,
{
    type Args = (AsLeft::Args, AsRight::Args);

    #[inline]
    fn store_as(
        source: &Either<Left, Right>,
        builder: &mut CellBuilder,
        args: Self::Args,
    ) -> Result<(), CellBuilderError> {
        source
            .as_ref()
            .map_either(AsWrap::<&Left, AsLeft>::new, AsWrap::<&Right, AsRight>::new)
            .store(builder, args)
    }
}

/// Implementation of [`Maybe X`](https://docs.ton.org/develop/data-formats/tl-b-types#maybe):
/// ```tlb
/// nothing$0 {X:Type} = Maybe X;
/// just$1 {X:Type} value:X = Maybe X;
/// ```
impl<T, As> CellSerializeAs<Option<T>> for Option<As>
where
    As: CellSerializeAs<T>,
{
    type Args = As::Args;

    #[inline]
    fn store_as(source: &Option<T>, builder: &mut CellBuilder, args: Self::Args) -> Result<(), CellBuilderError> {
        match source {
            None => {
                builder.pack(false, ()).context("tag")?;
            }
            Some(v) => {
                builder
                    .pack(true, ())
                    .context("tag")?
                    .store_as::<&T, &As>(v, args)
                    .context("value")?;
            }
        }
        Ok(())
    }
}

pub trait CellSerializeWrapAsExt {
    /// Wrap `self` so that it is serialized with an adapter
    #[inline]
    fn wrap_as<As>(&self) -> AsWrap<&'_ Self, As>
    where
        As: CellSerializeAs<Self> + ?Sized,
    {
        AsWrap::new(self)
    }
}
impl<T> CellSerializeWrapAsExt for T {}
