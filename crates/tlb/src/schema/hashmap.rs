use std::collections::BTreeMap;

use bitvec::{order::Msb0, slice::BitSlice, vec::BitVec};
use log::debug;

use crate::{
    Cell,
    r#as::{Same, hashmap::HashmapE as Dict},
    de::CellParser,
    ser::CellBuilder,
};

use super::{
    CombineError, Ops, PrettyPrinter, Subtraction, TlbType, basic::store_zeros, print_ref_with,
    slice_to_cell, validate_ref_with,
};

/// ```tlb
/// hml_short$0 {m:#} {n:#} len:(Unary ~n) {n <= m} s:(n * Bit) = HmLabel ~n m;
/// hml_long$10 {m:#} n:(#<= m) s:(n * Bit) = HmLabel ~n m;
/// hml_same$11 {m:#} v:Bit n:(#<= m) = HmLabel ~n m;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HmLabel {
    m: u32,
}

impl HmLabel {
    pub const SHORT: u32 = 0;
    pub const LONG: u32 = 2;
    pub const SAME: u32 = 3;

    #[inline]
    pub const fn new(m: u32) -> Self {
        Self { m }
    }

    /// Skips the label and returns its length
    pub fn skip_get(&self, cs: &mut CellParser<'_>) -> Option<u32> {
        let m = u64::from(self.m);
        if cs.fetch_uint(1)? == 0 {
            // hml_short$0
            let n = cs.count_leading(true);
            cs.advance(n + 1)?;
            if n as u64 > m {
                return None;
            }
            cs.advance(n)?;
            return Some(n as u32);
        }
        match cs.fetch_uint(1)? {
            // hml_long$10
            0 => {
                let n = cs.fetch_uint_leq(m)?;
                cs.advance(n as usize)?;
                Some(n as u32)
            }
            // hml_same$11
            _ => {
                cs.advance(1)?;
                cs.fetch_uint_leq(m).map(|n| n as u32)
            }
        }
    }

    /// Reads the label bits
    pub fn fetch(&self, cs: &mut CellParser<'_>) -> Option<BitVec<u8, Msb0>> {
        let m = u64::from(self.m);
        if cs.fetch_uint(1)? == 0 {
            let n = cs.count_leading(true);
            cs.advance(n + 1)?;
            if n as u64 > m {
                return None;
            }
            return cs.fetch_bits(n).map(|b| b.to_bitvec());
        }
        match cs.fetch_uint(1)? {
            0 => {
                let n = cs.fetch_uint_leq(m)?;
                cs.fetch_bits(n as usize).map(|b| b.to_bitvec())
            }
            _ => {
                let v = cs.fetch_uint(1)? != 0;
                let n = cs.fetch_uint_leq(m)?;
                Some(BitVec::repeat(v, n as usize))
            }
        }
    }
}

impl TlbType for HmLabel {
    #[inline]
    fn validate_skip(&self, _: &mut Ops, cs: &mut CellParser<'_>, _: bool) -> Option<()> {
        self.skip_get(cs).map(|_| ())
    }

    fn get_tag(&self, cs: &CellParser<'_>) -> Option<u32> {
        match cs.prefetch_uint(1)? {
            0 => Some(Self::SHORT),
            _ => cs.prefetch_uint(2).map(|t| t as u32),
        }
    }

    fn print_skip(&self, pp: &mut PrettyPrinter, cs: &mut CellParser<'_>) -> Option<()> {
        let label = self.fetch(cs)?;
        pp.out(format_args!("{:?}", CellParser::new(&label, &[])))
    }
}

/// ```tlb
/// hm_edge#_ {n:#} {X:Type} {l:#} {m:#} label:(HmLabel ~l n)
///           {n = (~m) + l} node:(HashmapNode m X) = Hashmap n X;
/// hmn_leaf#_ {X:Type} value:X = HashmapNode 0 X;
/// hmn_fork#_ {n:#} {X:Type} left:^(Hashmap n X)
///            right:^(Hashmap n X) = HashmapNode (n + 1) X;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hashmap<V> {
    n: u32,
    value: V,
}

impl<V> Hashmap<V> {
    #[inline]
    pub const fn new(n: u32, value: V) -> Self {
        Self { n, value }
    }

    #[inline]
    pub const fn key_bits(&self) -> u32 {
        self.n
    }
}

impl<V> Hashmap<V> {
    /// Value slice stored under `key`. It spans the rest of the leaf cell.
    pub fn lookup<'de>(
        &self,
        cs: &CellParser<'de>,
        key: &BitSlice<u8, Msb0>,
    ) -> Option<CellParser<'de>> {
        if key.len() != self.n as usize {
            return None;
        }
        let mut cs = cs.clone();
        let mut key = key;
        let mut n = self.n;
        loop {
            let label = HmLabel::new(n).fetch(&mut cs)?;
            if !key.starts_with(label.as_bitslice()) {
                return None;
            }
            key = &key[label.len()..];
            n -= label.len() as u32;
            if n == 0 {
                return Some(cs);
            }
            let child = cs.references().get(usize::from(key[0]))?;
            if child.exotic {
                return None;
            }
            cs = child.parser();
            key = &key[1..];
            n -= 1;
        }
    }
}

impl<V> Hashmap<V>
where
    V: TlbType,
{
    fn validate_at(&self, n: u32, ops: &mut Ops, cs: &mut CellParser<'_>, weak: bool) -> Option<()> {
        let l = HmLabel::new(n).skip_get(cs)?;
        self.validate_node_at(n - l, ops, cs, weak)
    }

    fn validate_node_at(
        &self,
        m: u32,
        ops: &mut Ops,
        cs: &mut CellParser<'_>,
        weak: bool,
    ) -> Option<()> {
        if m == 0 {
            return self.value.validate_skip(ops, cs, weak);
        }
        for _ in 0..2 {
            let child = cs.fetch_reference()?;
            validate_ref_with(ops, child, weak, |ops, cs| {
                self.validate_at(m - 1, ops, cs, weak)
            })
            .then_some(())?;
        }
        Some(())
    }

    fn skip_at(&self, n: u32, cs: &mut CellParser<'_>) -> Option<()> {
        let l = HmLabel::new(n).skip_get(cs)?;
        if l == n {
            self.value.skip(cs)
        } else {
            cs.advance_refs(2)
        }
    }

    /// Collects leaf values under `prefix`. A leaf value spans the rest of
    /// its cell.
    pub(crate) fn collect_at<'de>(
        &self,
        n: u32,
        mut prefix: BitVec<u8, Msb0>,
        mut cs: CellParser<'de>,
        out: &mut BTreeMap<BitVec<u8, Msb0>, CellParser<'de>>,
    ) -> Option<()> {
        let label = HmLabel::new(n).fetch(&mut cs)?;
        prefix.extend_from_bitslice(&label);
        let m = n - label.len() as u32;
        if m == 0 {
            out.insert(prefix, cs);
            return Some(());
        }
        for bit in [false, true] {
            let child = cs.fetch_reference()?;
            if child.exotic {
                return None;
            }
            let mut key = prefix.clone();
            key.push(bit);
            self.collect_at(m - 1, key, child.parser(), out)?;
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
            return self.value.print_skip(pp, cs);
        }
        for bit in [false, true] {
            let child = cs.fetch_reference()?;
            let mut key = prefix.clone();
            key.push(bit);
            print_ref_with(pp, child, |pp, cs| self.print_at(m - 1, key, pp, cs))?;
        }
        Some(())
    }
}

impl<V> TlbType for Hashmap<V>
where
    V: TlbType,
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
        pp.open("hm_edge")?;
        self.print_at(self.n, BitVec::new(), pp, cs)?;
        pp.close()
    }
}

/// ```tlb
/// hme_empty$0 {n:#} {X:Type} = HashmapE n X;
/// hme_root$1 {n:#} {X:Type} root:^(Hashmap n X) = HashmapE n X;
/// ```
///
/// Arithmetic on dictionaries works per key: values present in both
/// operands are combined with the value type, values present in one are
/// kept as is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashmapE<V> {
    root: Hashmap<V>,
}

impl<V> HashmapE<V> {
    #[inline]
    pub const fn new(n: u32, value: V) -> Self {
        Self {
            root: Hashmap::new(n, value),
        }
    }

    #[inline]
    pub const fn key_bits(&self) -> u32 {
        self.root.n
    }
}

impl<V> HashmapE<V> {
    /// Value slice stored under `key`
    pub fn lookup<'de>(
        &self,
        cs: &CellParser<'de>,
        key: &BitSlice<u8, Msb0>,
    ) -> Option<CellParser<'de>> {
        let mut cs = cs.clone();
        if cs.fetch_uint(1)? == 0 {
            return None;
        }
        let root = cs.fetch_reference()?;
        if root.exotic {
            return None;
        }
        self.root.lookup(&root.parser(), key)
    }
}

impl<V> HashmapE<V>
where
    V: TlbType,
{
    /// Reads the dictionary at the cursor into a map from keys to value
    /// slices
    pub fn collect<'de>(
        &self,
        cs: &mut CellParser<'de>,
    ) -> Option<BTreeMap<BitVec<u8, Msb0>, CellParser<'de>>> {
        let mut out = BTreeMap::new();
        if cs.fetch_uint(1)? != 0 {
            let root = cs.fetch_reference()?;
            if root.exotic {
                return None;
            }
            self.root
                .collect_at(self.root.n, BitVec::new(), root.parser(), &mut out)?;
        }
        Some(out)
    }

    fn store_entries(
        &self,
        cb: &mut CellBuilder,
        entries: Vec<(BitVec<u8, Msb0>, Cell)>,
    ) -> Result<(), CombineError> {
        let n = self.root.n;
        let dict = Dict::<Cell>::from_entries(n, entries)
            .map_err(|e| CombineError::Rebuild(e.to_string()))?;
        cb.store_as::<_, &Dict<Same, Same>>(&dict, (n, (), ()))
            .map_err(|e| CombineError::Rebuild(e.to_string()))?;
        Ok(())
    }

    /// Stores the per-key sum of two dictionaries
    pub fn combine_add(
        &self,
        cb: &mut CellBuilder,
        cs1: &mut CellParser<'_>,
        cs2: &mut CellParser<'_>,
    ) -> Result<(), CombineError> {
        let a = self.collect(cs1).ok_or(CombineError::Malformed)?;
        let mut b = self.collect(cs2).ok_or(CombineError::Malformed)?;
        let mut entries = Vec::with_capacity(a.len() + b.len());
        for (key, mut x) in a {
            let value = match b.remove(&key) {
                None => slice_to_cell(&x).ok_or(CombineError::Malformed)?,
                Some(mut y) => {
                    let mut vb = Cell::builder();
                    self.root
                        .value
                        .add_values(&mut vb, &mut x, &mut y)
                        .ok_or_else(|| CombineError::Values(key.clone()))?;
                    vb.into_cell()
                }
            };
            entries.push((key, value));
        }
        for (key, y) in b {
            entries.push((key, slice_to_cell(&y).ok_or(CombineError::Malformed)?));
        }
        self.store_entries(cb, entries)
    }

    /// Stores the per-key difference of two dictionaries. Keys whose
    /// difference is zero are dropped.
    pub fn combine_sub(
        &self,
        cb: &mut CellBuilder,
        cs1: &mut CellParser<'_>,
        cs2: &mut CellParser<'_>,
    ) -> Result<Subtraction, CombineError> {
        let a = self.collect(cs1).ok_or(CombineError::Malformed)?;
        let mut b = self.collect(cs2).ok_or(CombineError::Malformed)?;
        let mut entries = Vec::with_capacity(a.len());
        for (key, mut x) in a {
            let value = match b.remove(&key) {
                None => slice_to_cell(&x).ok_or(CombineError::Malformed)?,
                Some(mut y) => {
                    let mut vb = Cell::builder();
                    match self.root.value.sub_values(&mut vb, &mut x, &mut y) {
                        Subtraction::Invalid => return Err(CombineError::Values(key)),
                        Subtraction::Zero => continue,
                        Subtraction::NonZero => vb.into_cell(),
                    }
                }
            };
            entries.push((key, value));
        }
        if let Some((key, _)) = b.into_iter().next() {
            return Err(CombineError::Subtrahend(key));
        }
        let result = if entries.is_empty() {
            Subtraction::Zero
        } else {
            Subtraction::NonZero
        };
        self.store_entries(cb, entries)?;
        Ok(result)
    }
}

impl<V> TlbType for HashmapE<V>
where
    V: TlbType,
{
    fn validate_skip(&self, ops: &mut Ops, cs: &mut CellParser<'_>, weak: bool) -> Option<()> {
        match cs.fetch_uint(1)? {
            0 => Some(()),
            _ => self.root.validate_skip_ref(ops, cs, weak),
        }
    }

    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        let tag = cs.fetch_uint(1)?;
        cs.advance_refs(tag as usize)
    }

    #[inline]
    fn get_tag(&self, cs: &CellParser<'_>) -> Option<u32> {
        cs.prefetch_uint(1).map(|b| b as u32)
    }

    #[inline]
    fn null_value(&self, cb: &mut CellBuilder) -> Option<()> {
        store_zeros(cb, 1)
    }

    fn add_values(
        &self,
        cb: &mut CellBuilder,
        cs1: &mut CellParser<'_>,
        cs2: &mut CellParser<'_>,
    ) -> Option<()> {
        self.combine_add(cb, cs1, cs2)
            .inspect_err(|err| debug!(target: "tlb", "cannot add dictionaries: {err}"))
            .ok()
    }

    fn sub_values(
        &self,
        cb: &mut CellBuilder,
        cs1: &mut CellParser<'_>,
        cs2: &mut CellParser<'_>,
    ) -> Subtraction {
        self.combine_sub(cb, cs1, cs2)
            .inspect_err(|err| debug!(target: "tlb", "cannot subtract dictionaries: {err}"))
            .unwrap_or(Subtraction::Invalid)
    }

    fn print_skip(&self, pp: &mut PrettyPrinter, cs: &mut CellParser<'_>) -> Option<()> {
        match cs.fetch_uint(1)? {
            0 => pp.out("(hme_empty)"),
            _ => {
                pp.open("hme_root")?;
                pp.field("root")?;
                pp.out("^")?;
                let root = cs.fetch_reference()?;
                self.root.print_ref(pp, root)?;
                pp.close()
            }
        }
    }
}
