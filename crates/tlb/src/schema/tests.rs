use std::collections::BTreeMap;

use bitvec::{bits, order::Msb0, vec::BitVec};
use num_bigint::BigInt;
use rand::{Rng, SeedableRng, rngs::StdRng};
use rstest::rstest;

use crate::{
    Cell,
    r#as::{
        Data, Same,
        hashmap::{HashmapAugE as AugDict, HashmapE as Dict},
    },
    bits::ser::BitWriterExt,
    de::CellParser,
    ser::CellBuilder,
};

use super::*;

fn key(n: u32, k: u64) -> BitVec<u8, Msb0> {
    (0..n).rev().map(|i| (k >> i) & 1 == 1).collect()
}

fn dict_cell<T>(n: u32, entries: impl IntoIterator<Item = (BitVec<u8, Msb0>, T)>) -> Cell
where
    T: crate::bits::ser::BitPack<Args = ()>,
{
    let dict = Dict::from_entries(n, entries).unwrap();
    let mut b = Cell::builder();
    b.store_as::<_, &Dict<Data, Same>>(&dict, (n, (), ()))
        .unwrap();
    b.into_cell()
}

fn uint_of(cs: &CellParser<'_>, bits: u32) -> Option<BigInt> {
    UInt(bits).as_integer(cs)
}

#[test]
fn two_leaf_dictionary() {
    let cell = dict_cell(8, [(key(8, 0x00), 5u8), (key(8, 0xff), 7u8)]);
    let root = cell.references[0].as_ref();
    let t = Hashmap::new(8, UInt(8));

    assert!(t.validate_cell(root, false));
    let cs = root.parser();
    assert_eq!(
        t.lookup(&cs, &key(8, 0x00)).and_then(|v| uint_of(&v, 8)),
        Some(5.into())
    );
    assert_eq!(
        t.lookup(&cs, &key(8, 0xff)).and_then(|v| uint_of(&v, 8)),
        Some(7.into())
    );
    assert!(t.lookup(&cs, &key(8, 0x80)).is_none());
    assert!(t.lookup(&cs, &key(7, 0x00)).is_none());

    let te = HashmapE::new(8, UInt(8));
    assert!(te.validate_cell(&cell, false));
    assert_eq!(
        te.lookup(&cell.parser(), &key(8, 0xff))
            .and_then(|v| uint_of(&v, 8)),
        Some(7.into())
    );
}

#[test]
fn label_tags() {
    let t = HmLabel::new(8);
    let short = {
        let mut b = Cell::builder();
        b.pack(bits![u8, Msb0; 0, 1, 0, 1], ()).unwrap();
        b.into_cell()
    };
    // hml_long$10 n=2 in 4 bits s=01
    let long = {
        let mut b = Cell::builder();
        b.pack(bits![u8, Msb0; 1, 0, 0, 0, 1, 0, 0, 1], ()).unwrap();
        b.into_cell()
    };
    // hml_same$11 v=1 n=3 in 4 bits
    let same = {
        let mut b = Cell::builder();
        b.pack(bits![u8, Msb0; 1, 1, 1, 0, 0, 1, 1], ()).unwrap();
        b.into_cell()
    };
    assert_eq!(t.get_tag(&short.parser()), Some(HmLabel::SHORT));
    assert_eq!(t.get_tag(&long.parser()), Some(HmLabel::LONG));
    assert_eq!(t.get_tag(&same.parser()), Some(HmLabel::SAME));
    assert_eq!(t.fetch(&mut short.parser()), Some(bits![u8, Msb0; 1].to_bitvec()));
    assert_eq!(t.fetch(&mut long.parser()), Some(bits![u8, Msb0; 0, 1].to_bitvec()));
    assert_eq!(t.fetch(&mut same.parser()), Some(bits![u8, Msb0; 1; 3].to_bitvec()));
    for cell in [&short, &long, &same] {
        assert!(t.validate_exact(&mut Ops::default(), &cell.parser(), false));
    }
    // hml_short with n = 3 exceeds m = 2
    let too_long = {
        let mut b = Cell::builder();
        b.pack(bits![u8, Msb0; 0, 1, 1, 1, 0, 1, 0, 1], ()).unwrap();
        b.into_cell()
    };
    assert!(HmLabel::new(3).validate_exact(&mut Ops::default(), &too_long.parser(), false));
    assert!(!HmLabel::new(2).validate(&mut Ops::default(), &too_long.parser(), false));
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(7)]
#[case(8)]
#[case(32)]
#[case(63)]
#[case(64)]
fn random_keys(#[case] n: u32) {
    let mut rng = StdRng::seed_from_u64(u64::from(n));
    let mask = if n == 64 { u64::MAX } else { (1u64 << n) - 1 };
    let mut expected = BTreeMap::new();
    for i in 0..40u16 {
        expected.insert(key(n, rng.r#gen::<u64>() & mask), i);
    }
    let cell = dict_cell(n, expected.clone());
    let t = HashmapE::new(n, UInt(16));
    assert!(t.validate_cell(&cell, false));

    let got: Vec<_> = t
        .collect(&mut cell.parser())
        .unwrap()
        .into_iter()
        .map(|(k, v)| (k, uint_of(&v, 16).unwrap()))
        .collect();
    let want: Vec<_> = expected
        .iter()
        .map(|(k, v)| (k.clone(), BigInt::from(*v)))
        .collect();
    assert_eq!(got, want);
    for (k, v) in &expected {
        assert_eq!(
            t.lookup(&cell.parser(), k).and_then(|v| uint_of(&v, 16)),
            Some(BigInt::from(*v))
        );
    }
}

#[test]
fn wrong_key_length_fails_validation() {
    let cell = dict_cell(8, [(key(8, 1), 1u8), (key(8, 2), 2u8)]);
    assert!(HashmapE::new(8, UInt(8)).validate_cell(&cell, false));
    assert!(!HashmapE::new(9, UInt(8)).validate_cell(&cell, false));
    assert!(!HashmapE::new(8, UInt(16)).validate_cell(&cell, false));
}

/// Extra of a leaf is its `uint8` value widened to 16 bits, forks sum
struct Sum16;

impl Augmentation for Sum16 {
    fn value_type(&self) -> &dyn TlbType {
        &UInt(8)
    }

    fn extra_type(&self) -> &dyn TlbType {
        &UInt(16)
    }

    fn eval_leaf(&self, cb: &mut CellBuilder, value: &mut CellParser<'_>) -> Option<()> {
        let v = UInt(8).as_integer_skip(value)?;
        UInt(16).store_integer_value(cb, &v)
    }
}

fn aug_cell(entries: &[(u64, u8)], extra_delta: u16) -> Cell {
    let m = Dict::from_entries_aug(
        8,
        entries.iter().map(|(k, v)| (key(8, *k), *v)),
        |v| u16::from(*v),
        |l, r| l + r,
    )
    .unwrap();
    let sum: u16 = entries.iter().map(|(_, v)| u16::from(*v)).sum();
    let aug = AugDict {
        m,
        extra: sum + extra_delta,
    };
    let mut b = Cell::builder();
    b.store_as::<_, &AugDict<Data, Data>>(&aug, (8, (), ()))
        .unwrap();
    b.into_cell()
}

#[test]
fn augmentation_consistency() {
    let t = HashmapAugE::new(8, Sum16);
    let entries = [(1, 10), (2, 20), (200, 30), (201, 40)];
    let cell = aug_cell(&entries, 0);
    assert!(t.validate_cell(&cell, false));

    let mut extra = cell.parser();
    t.extract_extra(&mut extra).unwrap();
    assert_eq!(UInt(16).as_integer(&extra), Some(100.into()));

    let mut leaves = Vec::new();
    t.for_each_leaf(&cell.parser(), &mut |k, extra, value| {
        leaves.push((k.clone(), uint_of(&extra, 16)?, uint_of(&value, 8)?));
        Some(())
    })
    .unwrap();
    assert_eq!(leaves.len(), 4);
    assert!(leaves.iter().all(|(_, e, v)| e == v));

    let empty = aug_cell(&[], 0);
    assert!(t.validate_cell(&empty, false));
}

#[test]
fn outer_extra_mismatch() {
    let t = HashmapAugE::new(8, Sum16);
    let cell = aug_cell(&[(1, 10), (2, 20)], 1);
    assert!(!t.validate_cell(&cell, false));
    // skipping trusts the extras
    assert!(t.get_size(&cell.parser()).is_some());
    let empty = aug_cell(&[], 1);
    assert!(!t.validate_cell(&empty, false));
}

#[test]
fn corrupted_fork_extra() {
    let t = HashmapAugE::new(8, Sum16);
    let cell = aug_cell(&[(1, 10), (2, 20), (200, 30)], 0);
    let root = cell.references[0].clone();

    // the root is a fork: label, two refs, then the 16-bit extra at the end
    let mut data = root.data.clone();
    let last = data.len() - 1;
    let bit = data[last];
    data.set(last, !bit);
    let corrupted_root = Cell {
        data,
        references: root.references.clone(),
        exotic: false,
    };
    assert!(!t.root_type().validate_cell(&corrupted_root, false));
    assert!(t.root_type().validate_cell(&root, false));
}

#[test]
fn add_then_sub_recovers() {
    let t = HashmapE::new(8, Grams);
    let a = grams_dict(&[(1, 100), (2, 5), (3, 7)]);
    let b = grams_dict(&[(2, 10), (9, 1)]);

    let mut cb = Cell::builder();
    t.add_values(&mut cb, &mut a.parser(), &mut b.parser())
        .unwrap();
    let sum = cb.into_cell();
    assert!(t.validate_cell(&sum, false));
    assert_eq!(
        t.lookup(&sum.parser(), &key(8, 2))
            .and_then(|v| Grams.as_integer(&v)),
        Some(15.into())
    );

    let mut cb = Cell::builder();
    assert_eq!(
        t.sub_values(&mut cb, &mut sum.parser(), &mut b.parser()),
        Subtraction::NonZero
    );
    assert_eq!(cb.into_cell(), a);

    let mut cb = Cell::builder();
    assert_eq!(
        t.sub_values(&mut cb, &mut a.parser(), &mut a.parser()),
        Subtraction::Zero
    );
    assert_eq!(cb.into_cell(), t.null_cell().unwrap());
}

#[test]
fn sub_rejects_missing_minuend_key() {
    let t = HashmapE::new(8, Grams);
    let a = grams_dict(&[(1, 100)]);
    let b = grams_dict(&[(1, 10), (2, 1)]);
    let mut cb = Cell::builder();
    assert_eq!(
        t.combine_sub(&mut cb, &mut a.parser(), &mut b.parser()),
        Err(CombineError::Subtrahend(key(8, 2)))
    );
    let mut cb = Cell::builder();
    assert_eq!(
        t.sub_values(&mut cb, &mut b.parser(), &mut a.parser()),
        Subtraction::Invalid
    );
}

fn grams_dict(entries: &[(u64, u64)]) -> Cell {
    let values: Vec<_> = entries
        .iter()
        .map(|(k, v)| (key(8, *k), Grams.integer_cell(&BigInt::from(*v)).unwrap()))
        .collect();
    let dict = Dict::<Cell>::from_entries(8, values).unwrap();
    let mut b = Cell::builder();
    b.store_as::<_, &Dict<Same, Same>>(&dict, (8, (), ()))
        .unwrap();
    b.into_cell()
}

#[test]
fn print_dictionary() {
    let cell = dict_cell(8, [(key(8, 0x00), 5u8), (key(8, 0xff), 7u8)]);
    let out = HashmapE::new(8, UInt(8)).print_cell(&cell).unwrap();
    assert!(out.starts_with("(hme_root"));
    assert!(out.contains("x{00} => 5"));
    assert!(out.contains("x{FF} => 7"));
}
