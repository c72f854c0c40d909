use core::fmt::Debug;

use crate::{
    de::r#as::CellDeserializeAs,
    ser::{CellSerializeExt, r#as::{CellSerializeAs, CellSerializeWrapAsExt}},
};

#[track_caller]
pub fn assert_store_parse_as_eq<T, As>(value: T, args: <As as CellSerializeAs<T>>::Args)
where
    As: CellSerializeAs<T>
        + for<'de> CellDeserializeAs<'de, T, Args = <As as CellSerializeAs<T>>::Args>,
    <As as CellSerializeAs<T>>::Args: Clone,
    T: PartialEq + Debug,
{
    assert_eq!(
        value
            .wrap_as::<As>()
            .to_cell(args.clone())
            .unwrap()
            .parse_fully_as::<T, As>(args)
            .unwrap(),
        value
    )
}
