use core::fmt::Debug;

use bitvec::{order::Msb0, vec::BitVec};

use crate::{
    de::{BitUnpack, BitUnpackAs, unpack_fully, unpack_fully_as},
    ser::{BitPack, BitPackAs, pack, pack_as},
};

/// Packs `value`, checks that it unpacks back to itself and returns the
/// packed bits
#[track_caller]
pub fn assert_pack_unpack_eq<T>(value: T, args: <T as BitPack>::Args) -> BitVec<u8, Msb0>
where
    T: BitPack + PartialEq + Debug,
    <T as BitPack>::Args: Clone,
    for<'de> T: BitUnpack<'de, Args = <T as BitPack>::Args>,
{
    let packed = pack(&value, args.clone()).unwrap();
    assert_eq!(unpack_fully::<T>(&packed, args).unwrap(), value);
    packed
}

/// Same as [`assert_pack_unpack_eq`] through the `As` adapter
#[track_caller]
pub fn assert_pack_unpack_as_eq<T, As>(
    value: T,
    args: <As as BitPackAs<T>>::Args,
) -> BitVec<u8, Msb0>
where
    As: BitPackAs<T>,
    <As as BitPackAs<T>>::Args: Clone,
    T: PartialEq + Debug,
    for<'de> As: BitUnpackAs<'de, T, Args = <As as BitPackAs<T>>::Args>,
{
    let packed = pack_as::<_, &As>(&value, args.clone()).unwrap();
    assert_eq!(unpack_fully_as::<T, As>(&packed, args).unwrap(), value);
    packed
}
