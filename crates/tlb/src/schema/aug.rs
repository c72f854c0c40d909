use impl_tools::autoimpl;
use log::debug;

use bitvec::{order::Msb0, vec::BitVec};

use crate::{de::CellParser, ser::CellBuilder};

use super::{
    HmLabel, Ops, PrettyPrinter, TlbType, built_equals, print_ref_with, validate_ref_with,
};

/// Pairs a value type with the extra stored next to it in augmented
/// dictionaries and defines how extras are derived.
///
/// By default a fork's extra is the sum of its children's extras and an
/// empty dictionary carries the null extra.
#[autoimpl(for<T: trait + ?Sized> &T, Box<T>)]
pub trait Augmentation {
    fn value_type(&self) -> &dyn TlbType;

    fn extra_type(&self) -> &dyn TlbType;

    /// Stores the extra of a leaf holding `value`
    fn eval_leaf(&self, cb: &mut CellBuilder, value: &mut CellParser<'_>) -> Option<()>;

    /// Stores the extra of a fork with given children extras
    #[inline]
    fn eval_fork(
        &self,
        cb: &mut CellBuilder,
        left: &mut CellParser<'_>,
        right: &mut CellParser<'_>,
    ) -> Option<()> {
        self.extra_type().add_values(cb, left, right)
    }

    /// Stores the extra of an empty dictionary
    #[inline]
    fn eval_empty(&self, cb: &mut CellBuilder) -> Option<()> {
        self.extra_type().null_value(cb)
    }

    #[inline]
    fn check_leaf(&self, extra: &CellParser<'_>, value: &CellParser<'_>) -> bool {
        built_equals(extra, |cb| self.eval_leaf(cb, &mut value.clone()))
    }

    #[inline]
    fn check_fork(
        &self,
        extra: &CellParser<'_>,
        left: &CellParser<'_>,
        right: &CellParser<'_>,
    ) -> bool {
        built_equals(extra, |cb| {
            self.eval_fork(cb, &mut left.clone(), &mut right.clone())
        })
    }

    #[inline]
    fn check_empty(&self, extra: &CellParser<'_>) -> bool {
        built_equals(extra, |cb| self.eval_empty(cb))
    }
}

fn extra_mismatch(at: &str) -> Option<()> {
    debug!(target: "tlb", "augmentation mismatch at {at}");
    None
}

/// ```tlb
/// ahm_edge#_ {n:#} {X:Type} {Y:Type} {l:#} {m:#}
///   label:(HmLabel ~l n) {n = (~m) + l}
///   node:(HashmapAugNode m X Y) = HashmapAug n X Y;
/// ahmn_leaf#_ {X:Type} {Y:Type} extra:Y value:X = HashmapAugNode 0 X Y;
/// ahmn_fork#_ {n:#} {X:Type} {Y:Type} left:^(HashmapAug n X Y)
///   right:^(HashmapAug n X Y) extra:Y = HashmapAugNode (n + 1) X Y;
/// ```
///
/// Validation checks every extra against the [`Augmentation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashmapAug<A> {
    n: u32,
    aug: A,
}

impl<A> HashmapAug<A> {
    #[inline]
    pub const fn new(n: u32, aug: A) -> Self {
        Self { n, aug }
    }

    #[inline]
    pub const fn key_bits(&self) -> u32 {
        self.n
    }

    #[inline]
    pub const fn augmentation(&self) -> &A {
        &self.aug
    }
}

impl<A> HashmapAug<A>
where
    A: Augmentation,
{
    fn validate_at(&self, n: u32, ops: &mut Ops, cs: &mut CellParser<'_>, weak: bool) -> Option<()> {
        let l = HmLabel::new(n).skip_get(cs)?;
        let m = n - l;
        let extra_type = self.aug.extra_type();
        if m == 0 {
            // ahmn_leaf
            let extra = extra_type.validate_fetch(ops, cs, weak)?;
            let value = self.aug.value_type().validate_fetch(ops, cs, weak)?;
            return self
                .aug
                .check_leaf(&extra, &value)
                .then_some(())
                .or_else(|| extra_mismatch("leaf"));
        }
        // ahmn_fork
        let left = cs.fetch_reference()?;
        let right = cs.fetch_reference()?;
        for child in [left, right] {
            validate_ref_with(ops, child, weak, |ops, cs| {
                self.validate_at(m - 1, ops, cs, weak)
            })
            .then_some(())?;
        }
        let extra = extra_type.validate_fetch(ops, cs, weak)?;
        if left.exotic || right.exotic {
            // only reachable when weak
            return Some(());
        }
        let mut left = left.parser();
        let mut right = right.parser();
        self.extract_extra_at(m - 1, &mut left)?;
        self.extract_extra_at(m - 1, &mut right)?;
        self.aug
            .check_fork(&extra, &left, &right)
            .then_some(())
            .or_else(|| extra_mismatch("fork"))
    }

    fn skip_at(&self, n: u32, cs: &mut CellParser<'_>) -> Option<()> {
        let l = HmLabel::new(n).skip_get(cs)?;
        if l == n {
            self.aug.extra_type().skip(cs)?;
            self.aug.value_type().skip(cs)
        } else {
            cs.advance_refs(2)?;
            self.aug.extra_type().skip(cs)
        }
    }

    /// Keeps only the extra of the root at the cursor
    fn extract_extra_at(&self, n: u32, cs: &mut CellParser<'_>) -> Option<()> {
        let l = HmLabel::new(n).skip_get(cs)?;
        if l != n {
            cs.advance_refs(2)?;
        }
        self.aug.extra_type().extract(cs)
    }

    /// Keeps only the extra of the root at the cursor
    #[inline]
    pub fn extract_extra(&self, cs: &mut CellParser<'_>) -> Option<()> {
        self.extract_extra_at(self.n, cs)
    }

    /// Visits leaves in key order with their extra and value slices
    pub fn for_each_leaf<'de>(
        &self,
        cs: CellParser<'de>,
        f: &mut dyn FnMut(&BitVec<u8, Msb0>, CellParser<'de>, CellParser<'de>) -> Option<()>,
    ) -> Option<()> {
        self.for_each_leaf_at(self.n, BitVec::new(), cs, f)
    }

    fn for_each_leaf_at<'de>(
        &self,
        n: u32,
        mut prefix: BitVec<u8, Msb0>,
        mut cs: CellParser<'de>,
        f: &mut dyn FnMut(&BitVec<u8, Msb0>, CellParser<'de>, CellParser<'de>) -> Option<()>,
    ) -> Option<()> {
        let label = HmLabel::new(n).fetch(&mut cs)?;
        prefix.extend_from_bitslice(&label);
        let m = n - label.len() as u32;
        if m == 0 {
            let extra = self.aug.extra_type().fetch(&mut cs)?;
            return f(&prefix, extra, cs);
        }
        for bit in [false, true] {
            let child = cs.fetch_reference()?;
            if child.exotic {
                return None;
            }
            let mut key = prefix.clone();
            key.push(bit);
            self.for_each_leaf_at(m - 1, key, child.parser(), f)?;
        }
        Some(())
    }

    fn print_at(
        &self,
        n: u32,
        mut prefix: BitVec<u8, Msb0>,
        pp: &mut PrettyPrinter,
        cs: &mut CellParser<'_>,
    ) -> Option<()> {
        let label = HmLabel::new(n).fetch(cs)?;
        prefix.extend_from_bitslice(&label);
        let m = n - label.len() as u32;
        if m == 0 {
            pp.nl()?;
            pp.out(format_args!("{:?} => ", CellParser::new(&prefix, &[])))?;
            pp.open("leaf")?;
            pp.field("extra")?;
            self.aug.extra_type().print_skip(pp, cs)?;
            pp.field("value")?;
            self.aug.value_type().print_skip(pp, cs)?;
            return pp.close();
        }
        for bit in [false, true] {
            let child = cs.fetch_reference()?;
            let mut key = prefix.clone();
            key.push(bit);
            print_ref_with(pp, child, |pp, cs| self.print_at(m - 1, key, pp, cs))?;
        }
        self.aug.extra_type().skip(cs)
    }
}

impl<A> TlbType for HashmapAug<A>
where
    A: Augmentation,
{
    #[inline]
    fn validate_skip(&self, ops: &mut Ops, cs: &mut CellParser<'_>, weak: bool) -> Option<()> {
        self.validate_at(self.n, ops, cs, weak)
    }

    #[inline]
    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        self.skip_at(self.n, cs)
    }

    fn print_skip(&self, pp: &mut PrettyPrinter, cs: &mut CellParser<'_>) -> Option<()> {
        pp.open("ahm_edge")?;
        self.print_at(self.n, BitVec::new(), pp, cs)?;
        pp.close()
    }
}

/// ```tlb
/// ahme_empty$0 {n:#} {X:Type} {Y:Type} extra:Y = HashmapAugE n X Y;
/// ahme_root$1 {n:#} {X:Type} {Y:Type} root:^(HashmapAug n X Y)
///   extra:Y = HashmapAugE n X Y;
/// ```
///
/// The outer extra must equal the root's extra, or the null extra when
/// empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashmapAugE<A> {
    root: HashmapAug<A>,
}

impl<A> HashmapAugE<A> {
    #[inline]
    pub const fn new(n: u32, aug: A) -> Self {
        Self {
            root: HashmapAug::new(n, aug),
        }
    }

    #[inline]
    pub const fn root_type(&self) -> &HashmapAug<A> {
        &self.root
    }
}

impl<A> HashmapAugE<A>
where
    A: Augmentation,
{
    /// Keeps only the outer extra
    pub fn extract_extra(&self, cs: &mut CellParser<'_>) -> Option<()> {
        let tag = cs.fetch_uint(1)?;
        cs.advance_refs(tag as usize)?;
        self.root.aug.extra_type().extract(cs)
    }

    /// Visits leaves in key order with their extra and value slices
    pub fn for_each_leaf<'de>(
        &self,
        cs: &CellParser<'de>,
        f: &mut dyn FnMut(&BitVec<u8, Msb0>, CellParser<'de>, CellParser<'de>) -> Option<()>,
    ) -> Option<()> {
        let mut cs = cs.clone();
        if cs.fetch_uint(1)? == 0 {
            return Some(());
        }
        let root = cs.fetch_reference()?;
        if root.exotic {
            return None;
        }
        self.root.for_each_leaf(root.parser(), f)
    }
}

impl<A> TlbType for HashmapAugE<A>
where
    A: Augmentation,
{
    fn validate_skip(&self, ops: &mut Ops, cs: &mut CellParser<'_>, weak: bool) -> Option<()> {
        let extra_type = self.root.aug.extra_type();
        if cs.fetch_uint(1)? == 0 {
            // ahme_empty
            let extra = extra_type.validate_fetch(ops, cs, weak)?;
            return self
                .root
                .aug
                .check_empty(&extra)
                .then_some(())
                .or_else(|| extra_mismatch("empty dictionary"));
        }
        // ahme_root
        let root = cs.fetch_reference()?;
        self.root.validate_ref(ops, root, weak).then_some(())?;
        let extra = extra_type.validate_fetch(ops, cs, weak)?;
        if root.exotic {
            return Some(());
        }
        let mut root_extra = root.parser();
        self.root.extract_extra(&mut root_extra)?;
        extra
            .contents_equal(&root_extra)
            .then_some(())
            .or_else(|| extra_mismatch("root"))
    }

    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        let tag = cs.fetch_uint(1)?;
        cs.advance_refs(tag as usize)?;
        self.root.aug.extra_type().skip(cs)
    }

    #[inline]
    fn get_tag(&self, cs: &CellParser<'_>) -> Option<u32> {
        cs.prefetch_uint(1).map(|b| b as u32)
    }

    fn print_skip(&self, pp: &mut PrettyPrinter, cs: &mut CellParser<'_>) -> Option<()> {
        let extra_type = self.root.aug.extra_type();
        if cs.fetch_uint(1)? == 0 {
            pp.open("ahme_empty")?;
        } else {
            pp.open("ahme_root")?;
            pp.field("root")?;
            pp.out("^")?;
            let root = cs.fetch_reference()?;
            self.root.print_ref(pp, root)?;
        }
        pp.field("extra")?;
        extra_type.print_skip(pp, cs)?;
        pp.close()
    }
}
