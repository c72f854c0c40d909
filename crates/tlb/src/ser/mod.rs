//! **Ser**ialization for [TL-B](https://docs.ton.org/develop/data-formats/tl-b-language)
pub mod r#as;
mod builder;

pub use self::{builder::*, r#as::*};

use std::sync::Arc;

use impl_tools::autoimpl;

use crate::{Cell, Context, Either, bits::ser::BitWriterExt, r#as::Same};

/// A type that can be **ser**ialized into [`CellBuilder`] with args.
#[autoimpl(for <T: trait + ?Sized> &T, &mut T, Box<T>, Arc<T>)]
pub trait CellSerialize {
    type Args;

    /// Store the value with args
    fn store(&self, builder: &mut CellBuilder, args: Self::Args) -> Result<(), CellBuilderError>;
}

impl CellSerialize for () {
    type Args = ();

    #[inline]
    fn store(&self, _builder: &mut CellBuilder, _: Self::Args) -> Result<(), CellBuilderError> {
        Ok(())
    }
}

impl<T> CellSerialize for [T]
where
    T: CellSerialize,
    T::Args: Clone,
{
    type Args = T::Args;

    #[inline]
    fn store(&self, builder: &mut CellBuilder, args: Self::Args) -> Result<(), CellBuilderError> {
        builder.store_many(self, args)?;
        Ok(())
    }
}

impl<T, const N: usize> CellSerialize for [T; N]
where
    T: CellSerialize,
    T::Args: Clone,
{
    type Args = T::Args;

    #[inline]
    fn store(&self, builder: &mut CellBuilder, args: Self::Args) -> Result<(), CellBuilderError> {
        self.as_slice().store(builder, args)
    }
}

macro_rules! impl_cell_serialize_for_tuple {
    ($($n:tt:$t:ident),+) => {
        impl<$($t),+> CellSerialize for ($($t,)+)
        where $(
            $t: CellSerialize,
        )+
        {
            type Args = ($($t::Args,)+);

            #[inline]
            fn store(&self, builder: &mut CellBuilder, args: Self::Args) -> Result<(), CellBuilderError>
            {
                $(self.$n.store(builder, args.$n).context(concat!(".", stringify!($n)))?;)+
                Ok(())
            }
        }
    };
}
impl_cell_serialize_for_tuple!(0:T0);
impl_cell_serialize_for_tuple!(0:T0,1:T1);
impl_cell_serialize_for_tuple!(0:T0,1:T1,2:T2);
impl_cell_serialize_for_tuple!(0:T0,1:T1,2:T2,3:T3);
impl_cell_serialize_for_tuple!(0:T0,1:T1,2:T2,3:T3,4:T4);
impl_cell_serialize_for_tuple!(0:T0,1:T1,2:T2,3:T3,4:T4,5:T5);
impl_cell_serialize_for_tuple!(0:T0,1:T1,2:T2,3:T3,4:T4,5:T5,6:T6);
impl_cell_serialize_for_tuple!(0:T0,1:T1,2:T2,3:T3,4:T4,5:T5,6:T6,7:T7);
impl_cell_serialize_for_tuple!(0:T0,1:T1,2:T2,3:T3,4:T4,5:T5,6:T6,7:T7,8:T8);
impl_cell_serialize_for_tuple!(0:T0,1:T1,2:T2,3:T3,4:T4,5:T5,6:T6,7:T7,8:T8,9:T9);

/// ```tlb
/// left$0 {X:Type} {Y:Type} value:X = Either X Y;
/// right$1 {X:Type} {Y:Type} value:Y = Either X Y;
/// ```
impl<L, R> CellSerialize for Either<L, R>
where
    L: CellSerialize,
    R: CellSerialize,
{
    type Args = (L::Args, R::Args);

    #[inline]
    fn store(&self, builder: &mut CellBuilder, (la, ra): Self::Args) -> Result<(), CellBuilderError> {
        match self {
            Self::Left(l) => builder
                .pack(false, ())
                .context("tag")?
                .store(l, la)
                .context("left")?,
            Self::Right(r) => builder
                .pack(true, ())
                .context("tag")?
                .store(r, ra)
                .context("right")?,
        };
        Ok(())
    }
}

/// [Maybe](https://docs.ton.org/develop/data-formats/tl-b-types#maybe)
impl<T> CellSerialize for Option<T>
where
    T: CellSerialize,
{
    type Args = T::Args;

    #[inline]
    fn store(&self, builder: &mut CellBuilder, args: Self::Args) -> Result<(), CellBuilderError> {
        <Option<Same>>::store_as(self, builder, args)
    }
}

/// Stores data bits and references of the cell.
/// The exotic flag is not representable inside a parent cell.
impl CellSerialize for Cell {
    type Args = ();

    #[inline]
    fn store(&self, builder: &mut CellBuilder, _: Self::Args) -> Result<(), CellBuilderError> {
        builder.pack(self.data.as_bitslice(), ())?;
        for r in &self.references {
            builder.store_reference(r.clone())?;
        }
        Ok(())
    }
}

pub trait CellSerializeExt: CellSerialize {
    /// Serialize the value into a fresh [`Cell`]
    #[inline]
    fn to_cell(&self, args: Self::Args) -> Result<Cell, CellBuilderError> {
        let mut builder = Cell::builder();
        self.store(&mut builder, args)?;
        Ok(builder.into_cell())
    }
}
impl<T> CellSerializeExt for T where T: CellSerialize {}
