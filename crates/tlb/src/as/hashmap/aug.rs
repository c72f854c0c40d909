use std::collections::BTreeMap;

use impl_tools::autoimpl;

use crate::{
    Context, Error, StringError,
    bits::{
        bitvec::{order::Msb0, slice::BitSlice, vec::BitVec},
        de::BitReaderExt,
        ser::BitWriterExt,
    },
    de::{CellParser, CellParserError, r#as::CellDeserializeAs},
    r#as::Ref,
    ser::{CellBuilder, CellBuilderError, r#as::CellSerializeAs},
};

use super::HmLabel;

/// ```tlb
/// ahme_empty$0 {n:#} {X:Type} {Y:Type} extra:Y = HashmapAugE n X Y;
/// ahme_root$1 {n:#} {X:Type} {Y:Type} root:^(HashmapAug n X Y)
/// extra:Y = HashmapAugE n X Y;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[autoimpl(Deref using self.m)]
#[autoimpl(DerefMut using self.m)]
#[autoimpl(Default where E: Default)]
pub struct HashmapAugE<T, E = ()> {
    pub m: HashmapE<T, E>,
    pub extra: E,
}

impl<T, AsT, E, AsE> CellSerializeAs<HashmapAugE<T, E>> for HashmapAugE<AsT, AsE>
where
    AsT: CellSerializeAs<T>,
    AsT::Args: Clone,
    AsE: CellSerializeAs<E>,
    AsE::Args: Clone,
{
    /// (n, AsT::Args, AsE::Args)
    type Args = (u32, AsT::Args, AsE::Args);

    #[inline]
    fn store_as(
        source: &HashmapAugE<T, E>,
        builder: &mut CellBuilder,
        (n, node_args, extra_args): Self::Args,
    ) -> Result<(), CellBuilderError> {
        builder
            .store_as::<_, &HashmapE<AsT, AsE>>(&source.m, (n, node_args, extra_args.clone()))?
            // extra:Y
            .store_as::<_, &AsE>(&source.extra, extra_args)
            .context("extra")?;
        Ok(())
    }
}

impl<'de, T, AsT, E, AsE> CellDeserializeAs<'de, HashmapAugE<T, E>> for HashmapAugE<AsT, AsE>
where
    AsT: CellDeserializeAs<'de, T>,
    AsT::Args: Clone,
    AsE: CellDeserializeAs<'de, E>,
    AsE::Args: Clone,
{
    /// (n, AsT::Args, AsE::Args)
    type Args = (u32, AsT::Args, AsE::Args);

    #[inline]
    fn parse_as(
        parser: &mut CellParser<'de>,
        (n, node_args, extra_args): Self::Args,
    ) -> Result<HashmapAugE<T, E>, CellParserError<'de>> {
        Ok(HashmapAugE {
            m: parser.parse_as::<_, HashmapE<AsT, AsE>>((n, node_args, extra_args.clone()))?,
            // extra:Y
            extra: parser.parse_as::<_, AsE>(extra_args).context("extra")?,
        })
    }
}

/// ```tlb
/// hme_empty$0 {n:#} {X:Type} = HashmapE n X;
/// hme_root$1 {n:#} {X:Type} root:^(Hashmap n X) = HashmapE n X;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashmapE<T, E = ()> {
    Empty,
    Root(Hashmap<T, E>),
}

impl<T, E> Default for HashmapE<T, E> {
    #[inline]
    fn default() -> Self {
        Self::Empty
    }
}

impl<T, E> HashmapE<T, E> {
    #[inline]
    pub const fn new() -> Self {
        Self::Empty
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    #[inline]
    pub fn len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Root(root) => root.len(),
        }
    }

    #[inline]
    pub fn contains_key(&self, key: impl AsRef<BitSlice<u8, Msb0>>) -> bool {
        match self {
            Self::Empty => false,
            Self::Root(root) => root.contains_key(key),
        }
    }

    #[inline]
    pub fn get(&self, key: impl AsRef<BitSlice<u8, Msb0>>) -> Option<&T> {
        match self {
            Self::Empty => None,
            Self::Root(root) => root.get(key),
        }
    }

    #[inline]
    pub fn get_mut(&mut self, key: impl AsRef<BitSlice<u8, Msb0>>) -> Option<&mut T> {
        match self {
            Self::Empty => None,
            Self::Root(root) => root.get_mut(key),
        }
    }

    /// Key/value pairs in ascending key order
    #[inline]
    pub fn iter(&self) -> Iter<'_, T, E> {
        Iter {
            stack: match self {
                Self::Empty => Vec::new(),
                Self::Root(root) => vec![(BitVec::new(), root)],
            },
        }
    }

    /// Builds a dictionary with `n`-bit keys and minimal labels, computing
    /// extras bottom-up. Later duplicates of a key replace earlier ones.
    pub fn from_entries_aug<K>(
        n: u32,
        entries: impl IntoIterator<Item = (K, T)>,
        leaf: impl Fn(&T) -> E + Copy,
        fork: impl Fn(&E, &E) -> E + Copy,
    ) -> Result<Self, StringError>
    where
        K: Into<BitVec<u8, Msb0>>,
    {
        let mut sorted = BTreeMap::new();
        for (k, v) in entries {
            let k: BitVec<u8, Msb0> = k.into();
            if k.len() != n as usize {
                return Err(Error::custom(format!(
                    "key of {} bits in dictionary with {n}-bit keys",
                    k.len()
                )));
            }
            sorted.insert(k, v);
        }
        if sorted.is_empty() {
            return Ok(Self::Empty);
        }
        Ok(Self::Root(Hashmap::build(
            sorted.into_iter().collect(),
            0,
            leaf,
            fork,
        )))
    }
}

impl<T> HashmapE<T> {
    /// Builds a dictionary with `n`-bit keys and minimal labels.
    #[inline]
    pub fn from_entries<K>(
        n: u32,
        entries: impl IntoIterator<Item = (K, T)>,
    ) -> Result<Self, StringError>
    where
        K: Into<BitVec<u8, Msb0>>,
    {
        Self::from_entries_aug(n, entries, |_| (), |_, _| ())
    }
}

impl<T, AsT, E, AsE> CellSerializeAs<HashmapE<T, E>> for HashmapE<AsT, AsE>
where
    AsT: CellSerializeAs<T>,
    AsT::Args: Clone,
    AsE: CellSerializeAs<E>,
    AsE::Args: Clone,
{
    /// (n, AsT::Args, AsE::Args)
    type Args = (u32, AsT::Args, AsE::Args);

    #[inline]
    fn store_as(
        source: &HashmapE<T, E>,
        builder: &mut CellBuilder,
        args: Self::Args,
    ) -> Result<(), CellBuilderError> {
        match source {
            HashmapE::Empty => builder
                // hme_empty$0
                .pack(false, ())?,
            HashmapE::Root(root) => builder
                // hme_root$1
                .pack(true, ())?
                // root:^(Hashmap n X)
                .store_as::<_, Ref<&Hashmap<AsT, AsE>>>(root, args)?,
        };
        Ok(())
    }
}

impl<'de, T, AsT, E, AsE> CellDeserializeAs<'de, HashmapE<T, E>> for HashmapE<AsT, AsE>
where
    AsT: CellDeserializeAs<'de, T>,
    AsT::Args: Clone,
    AsE: CellDeserializeAs<'de, E>,
    AsE::Args: Clone,
{
    /// (n, AsT::Args, AsE::Args)
    type Args = (u32, AsT::Args, AsE::Args);

    #[inline]
    fn parse_as(
        parser: &mut CellParser<'de>,
        args: Self::Args,
    ) -> Result<HashmapE<T, E>, CellParserError<'de>> {
        Ok(match parser.unpack(())? {
            // hme_empty$0
            false => HashmapE::Empty,
            // hme_root$1
            true => parser
                // root:^(Hashmap n X)
                .parse_as::<_, Ref<Hashmap<AsT, AsE>>>(args)
                .map(HashmapE::Root)?,
        })
    }
}

/// ```tlb
/// ahm_edge#_ {n:#} {X:Type} {Y:Type} {l:#} {m:#}
/// label:(HmLabel ~l n) {n = (~m) + l}
/// node:(HashmapAugNode m X Y) = HashmapAug n X Y;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hashmap<T, E = ()> {
    label: BitVec<u8, Msb0>,
    node: AugNode<T, E>,
}

impl<T, E> Hashmap<T, E> {
    #[inline]
    pub fn new(label: impl Into<BitVec<u8, Msb0>>, node: AugNode<T, E>) -> Self {
        Self {
            label: label.into(),
            node,
        }
    }

    #[inline]
    pub fn label(&self) -> &BitSlice<u8, Msb0> {
        &self.label
    }

    #[inline]
    pub fn node(&self) -> &AugNode<T, E> {
        &self.node
    }

    /// Extra of the root node
    #[inline]
    pub fn extra(&self) -> &E {
        &self.node.extra
    }

    #[inline]
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.node.len()
    }

    #[inline]
    pub fn contains_key(&self, key: impl AsRef<BitSlice<u8, Msb0>>) -> bool {
        key.as_ref()
            .strip_prefix(&self.label)
            .is_some_and(|key| self.node.contains_key(key))
    }

    #[inline]
    pub fn get(&self, key: impl AsRef<BitSlice<u8, Msb0>>) -> Option<&T> {
        self.node.get(key.as_ref().strip_prefix(&self.label)?)
    }

    #[inline]
    pub fn get_mut(&mut self, key: impl AsRef<BitSlice<u8, Msb0>>) -> Option<&mut T> {
        self.node.get_mut(key.as_ref().strip_prefix(&self.label)?)
    }

    /// `entries` are non-empty, sorted, unique and share the first `pos` bits
    fn build(
        mut entries: Vec<(BitVec<u8, Msb0>, T)>,
        pos: usize,
        leaf: impl Fn(&T) -> E + Copy,
        fork: impl Fn(&E, &E) -> E + Copy,
    ) -> Self {
        let (first, last) = (&entries[0].0, &entries[entries.len() - 1].0);
        let common = first[pos..]
            .iter()
            .by_vals()
            .zip(last[pos..].iter().by_vals())
            .take_while(|(a, b)| a == b)
            .count();
        let label = first[pos..pos + common].to_bitvec();
        let pos = pos + common;

        if pos == first.len() {
            // single key is left
            let (_, value) = entries.swap_remove(0);
            let extra = leaf(&value);
            return Self::new(label, AugNode::new(Node::Leaf(value), extra));
        }

        let split = entries.partition_point(|(k, _)| !k[pos]);
        let right = entries.split_off(split);
        let left = Self::build(entries, pos + 1, leaf, fork);
        let right = Self::build(right, pos + 1, leaf, fork);
        let extra = fork(left.extra(), right.extra());
        Self::new(
            label,
            AugNode::new(Node::Fork([Box::new(left), Box::new(right)]), extra),
        )
    }
}

impl<T, AsT, E, AsE> CellSerializeAs<Hashmap<T, E>> for Hashmap<AsT, AsE>
where
    AsT: CellSerializeAs<T>,
    AsT::Args: Clone,
    AsE: CellSerializeAs<E>,
    AsE::Args: Clone,
{
    /// (n, AsT::Args, AsE::Args)
    type Args = (u32, AsT::Args, AsE::Args);

    fn store_as(
        source: &Hashmap<T, E>,
        builder: &mut CellBuilder,
        (n, node_args, extra_args): Self::Args,
    ) -> Result<(), CellBuilderError> {
        builder
            // label:(HmLabel ~l n)
            .pack_as::<_, &HmLabel>(source.label.as_bitslice(), n)
            .context("label")?
            // node:(HashmapAugNode m X Y)
            .store_as::<_, &AugNode<AsT, AsE>>(
                &source.node,
                (
                    // {n = (~m) + l}
                    n - source.label.len() as u32,
                    node_args,
                    extra_args,
                ),
            )
            .context("node")?;
        Ok(())
    }
}

impl<'de, T, AsT, E, AsE> CellDeserializeAs<'de, Hashmap<T, E>> for Hashmap<AsT, AsE>
where
    AsT: CellDeserializeAs<'de, T>,
    AsT::Args: Clone,
    AsE: CellDeserializeAs<'de, E>,
    AsE::Args: Clone,
{
    /// (n, AsT::Args, AsE::Args)
    type Args = (u32, AsT::Args, AsE::Args);

    #[inline]
    fn parse_as(
        parser: &mut CellParser<'de>,
        (n, node_args, extra_args): Self::Args,
    ) -> Result<Hashmap<T, E>, CellParserError<'de>> {
        // label:(HmLabel ~l n)
        let label: BitVec<u8, Msb0> = parser.unpack_as::<_, HmLabel>(n).context("label")?;
        // {n = (~m) + l}
        let m = n - label.len() as u32;
        Ok(Hashmap {
            label,
            // node:(HashmapAugNode m X Y)
            node: parser
                .parse_as::<_, AugNode<AsT, AsE>>((m, node_args, extra_args))
                .context("node")?,
        })
    }
}

/// ```tlb
/// hmn_leaf#_ {X:Type} value:X = HashmapNode 0 X;
/// hmn_fork#_ {n:#} {X:Type} left:^(Hashmap n X)
///            right:^(Hashmap n X) = HashmapNode (n + 1) X;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node<T, E = ()> {
    Leaf(T),
    /// [left, right]
    Fork([Box<Hashmap<T, E>>; 2]),
}

impl<T, E> Node<T, E> {
    #[inline]
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::Fork([l, r]) => l.len() + r.len(),
        }
    }

    #[inline]
    pub fn contains_key(&self, key: impl AsRef<BitSlice<u8, Msb0>>) -> bool {
        self.get(key).is_some()
    }

    #[inline]
    pub fn get(&self, key: impl AsRef<BitSlice<u8, Msb0>>) -> Option<&T> {
        let key = key.as_ref();
        match self {
            Self::Leaf(v) if key.is_empty() => Some(v),
            Self::Fork([left, right]) => {
                let (is_right, key) = key.split_first()?;
                if *is_right { right } else { left }.get(key)
            }
            _ => None,
        }
    }

    #[inline]
    pub fn get_mut(&mut self, key: impl AsRef<BitSlice<u8, Msb0>>) -> Option<&mut T> {
        let key = key.as_ref();
        match self {
            Self::Leaf(v) if key.is_empty() => Some(v),
            Self::Fork([left, right]) => {
                let (is_right, key) = key.split_first()?;
                if *is_right { right } else { left }.get_mut(key)
            }
            _ => None,
        }
    }
}

impl<T, AsT, E, AsE> CellSerializeAs<Node<T, E>> for Node<AsT, AsE>
where
    AsT: CellSerializeAs<T>,
    AsT::Args: Clone,
    AsE: CellSerializeAs<E>,
    AsE::Args: Clone,
{
    /// (n, AsT::Args, AsE::Args)
    type Args = (u32, AsT::Args, AsE::Args);

    fn store_as(
        source: &Node<T, E>,
        builder: &mut CellBuilder,
        (n, node_args, extra_args): Self::Args,
    ) -> Result<(), CellBuilderError> {
        match source {
            Node::Leaf(value) => {
                if n != 0 {
                    return Err(Error::custom(format!(
                        "key is too small, {n} more bits required"
                    )));
                }
                // hmn_leaf#_ {X:Type} value:X = HashmapNode 0 X;
                builder.store_as::<_, &AsT>(value, node_args)?
            }
            Node::Fork(fork) => {
                if n == 0 {
                    return Err(Error::custom("key is too long"));
                }
                // hmn_fork#_ {n:#} {X:Type} left:^(Hashmap n X)
                // right:^(Hashmap n X) = HashmapNode (n + 1) X;
                builder.store_as::<_, &[Box<Ref<Hashmap<AsT, AsE>>>; 2]>(
                    fork,
                    (n - 1, node_args, extra_args),
                )?
            }
        };
        Ok(())
    }
}

impl<'de, T, AsT, E, AsE> CellDeserializeAs<'de, Node<T, E>> for Node<AsT, AsE>
where
    AsT: CellDeserializeAs<'de, T>,
    AsT::Args: Clone,
    AsE: CellDeserializeAs<'de, E>,
    AsE::Args: Clone,
{
    /// (n, AsT::Args, AsE::Args)
    type Args = (u32, AsT::Args, AsE::Args);

    #[inline]
    fn parse_as(
        parser: &mut CellParser<'de>,
        (n, node_args, extra_args): Self::Args,
    ) -> Result<Node<T, E>, CellParserError<'de>> {
        if n == 0 {
            // hmn_leaf#_ {X:Type} value:X = HashmapNode 0 X;
            return parser.parse_as::<_, AsT>(node_args).map(Node::Leaf);
        }

        Ok(Node::Fork(
            parser
                // left:^(Hashmap n X) right:^(Hashmap n X)
                .parse_as::<_, [Box<Ref<Hashmap<AsT, AsE>>>; 2]>((n - 1, node_args, extra_args))?,
        ))
    }
}

/// ```tlb
/// ahmn_leaf#_ {X:Type} {Y:Type} extra:Y value:X = HashmapAugNode 0 X Y;
/// ahmn_fork#_ {n:#} {X:Type} {Y:Type} left:^(HashmapAug n X Y)
/// right:^(HashmapAug n X Y) extra:Y = HashmapAugNode (n + 1) X Y;
/// ```
///
/// Plain dictionaries use `E = ()`, which occupies no bits.
#[derive(Debug, Clone, PartialEq, Eq)]
#[autoimpl(Deref using self.node)]
#[autoimpl(DerefMut using self.node)]
pub struct AugNode<T, E = ()> {
    pub node: Node<T, E>,
    pub extra: E,
}

impl<T, E> AugNode<T, E> {
    #[inline]
    pub fn new(node: Node<T, E>, extra: E) -> Self {
        Self { node, extra }
    }
}

impl<T, AsT, E, AsE> CellSerializeAs<AugNode<T, E>> for AugNode<AsT, AsE>
where
    AsT: CellSerializeAs<T>,
    AsT::Args: Clone,
    AsE: CellSerializeAs<E>,
    AsE::Args: Clone,
{
    /// (n, AsT::Args, AsE::Args)
    type Args = (u32, AsT::Args, AsE::Args);

    fn store_as(
        source: &AugNode<T, E>,
        builder: &mut CellBuilder,
        (n, node_args, extra_args): Self::Args,
    ) -> Result<(), CellBuilderError> {
        match &source.node {
            // ahmn_leaf#_ extra:Y value:X
            Node::Leaf(_) => builder
                .store_as::<_, &AsE>(&source.extra, extra_args.clone())?
                .store_as::<_, &Node<AsT, AsE>>(&source.node, (n, node_args, extra_args))?,
            // ahmn_fork#_ left:^ right:^ extra:Y
            Node::Fork(_) => builder
                .store_as::<_, &Node<AsT, AsE>>(&source.node, (n, node_args, extra_args.clone()))?
                .store_as::<_, &AsE>(&source.extra, extra_args)?,
        };
        Ok(())
    }
}

impl<'de, T, AsT, E, AsE> CellDeserializeAs<'de, AugNode<T, E>> for AugNode<AsT, AsE>
where
    AsT: CellDeserializeAs<'de, T>,
    AsT::Args: Clone,
    AsE: CellDeserializeAs<'de, E>,
    AsE::Args: Clone,
{
    /// (n, AsT::Args, AsE::Args)
    type Args = (u32, AsT::Args, AsE::Args);

    fn parse_as(
        parser: &mut CellParser<'de>,
        (n, node_args, extra_args): Self::Args,
    ) -> Result<AugNode<T, E>, CellParserError<'de>> {
        if n == 0 {
            // ahmn_leaf#_ extra:Y value:X
            let extra = parser.parse_as::<_, AsE>(extra_args.clone()).context("extra")?;
            let node = parser.parse_as::<_, Node<AsT, AsE>>((n, node_args, extra_args))?;
            return Ok(AugNode { node, extra });
        }
        // ahmn_fork#_ left:^ right:^ extra:Y
        let node = parser.parse_as::<_, Node<AsT, AsE>>((n, node_args, extra_args.clone()))?;
        let extra = parser.parse_as::<_, AsE>(extra_args).context("extra")?;
        Ok(AugNode { node, extra })
    }
}

/// Iterator over entries of [`HashmapE`] created by [`HashmapE::iter()`]
pub struct Iter<'a, T, E> {
    stack: Vec<(BitVec<u8, Msb0>, &'a Hashmap<T, E>)>,
}

impl<'a, T, E> Iterator for Iter<'a, T, E> {
    type Item = (BitVec<u8, Msb0>, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (mut key, hm) = self.stack.pop()?;
            key.extend_from_bitslice(&hm.label);
            match &hm.node.node {
                Node::Leaf(v) => return Some((key, v)),
                Node::Fork([left, right]) => {
                    let mut rkey = key.clone();
                    rkey.push(true);
                    key.push(false);
                    // left is popped first
                    self.stack.push((rkey, &**right));
                    self.stack.push((key, &**left));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        Cell,
        bits::bitvec::{bits, view::AsBits},
        r#as::{Data, Same},
        ser::{CellSerializeExt, r#as::CellSerializeWrapAsExt},
    };

    use super::*;

    fn key(k: u8) -> BitVec<u8, Msb0> {
        k.to_be_bytes().as_bits::<Msb0>().to_bitvec()
    }

    /// See <https://docs.ton.org/develop/data-formats/tl-b-types#hashmap-parsing-example>
    fn example() -> Cell {
        (
            bits![u8, Msb0; 1].wrap_as::<Data>(),
            (
                bits![u8, Msb0; 0,0].wrap_as::<Data>(),
                (
                    // hml_short$0 is shorter than hml_long$10 here
                    bits![u8, Msb0; 0,1,1,0,0,0].wrap_as::<Data>(),
                    bits![u8, Msb0; 1,0,1,0,0,0,0,0,1,0,0,0,0,0,0,1,1,0,0,0,0,1,0,0,1]
                        .wrap_as::<Ref<Data>>(),
                    bits![u8, Msb0; 1,0,1,0,0,0,0,0,1,0,0,0,0,0,0,0,0,0,1,1,0,1,1,1,1]
                        .wrap_as::<Ref<Data>>(),
                )
                    .wrap_as::<Ref>(),
                // hml_same$11 is shorter than hml_long$10 here
                bits![u8, Msb0; 1,1,0,1,1,1,0,0,0,0,0,0,1,1,0,0,0,0,1,0,0,1].wrap_as::<Ref<Data>>(),
            )
                .wrap_as::<Ref>(),
        )
            .to_cell(((), ((), ((), (), ()), ())))
            .unwrap()
    }

    #[test]
    fn parse() {
        let cell = example();
        let hm: HashmapE<u16> = cell
            .parse_fully_as::<_, HashmapE<Data, Same>>((8, (), ()))
            .unwrap();

        assert_eq!(hm.len(), 3);
        assert_eq!(hm.get(key(1)), Some(&777));
        assert_eq!(hm.get(key(17)), Some(&111));
        assert_eq!(hm.get(key(128)), Some(&777));
        assert!(!hm.contains_key(key(0x80 | 17)));

        let mut builder = Cell::builder();
        builder
            .store_as::<_, HashmapE<Data, Same>>(hm, (8, (), ()))
            .unwrap();
        assert_eq!(builder.into_cell(), cell);
    }

    #[test]
    fn from_entries_matches_example() {
        let hm = HashmapE::from_entries(8, [(key(128), 777u16), (key(1), 777), (key(17), 111)])
            .unwrap();
        let mut builder = Cell::builder();
        builder
            .store_as::<_, &HashmapE<Data, Same>>(&hm, (8, (), ()))
            .unwrap();
        assert_eq!(builder.into_cell(), example());
    }

    #[test]
    fn iter_in_key_order() {
        let hm = HashmapE::from_entries(8, [(key(200), 2u8), (key(3), 0), (key(100), 1)]).unwrap();
        let got: Vec<_> = hm.iter().map(|(k, v)| (k, *v)).collect();
        assert_eq!(got, vec![(key(3), 0), (key(100), 1), (key(200), 2)]);
    }

    #[test]
    fn from_entries_rejects_key_length() {
        assert!(HashmapE::<u8>::from_entries(8, [(bits![u8, Msb0; 1].to_bitvec(), 0)]).is_err());
    }

    #[test]
    fn aug_extras_are_sums() {
        let hm = HashmapE::from_entries_aug(
            8,
            [(key(1), 10u32), (key(2), 20), (key(250), 30)],
            |v| *v,
            |l, r| l + r,
        )
        .unwrap();
        let HashmapE::Root(root) = &hm else {
            panic!("empty")
        };
        assert_eq!(*root.extra(), 60);

        let aug = HashmapAugE { m: hm, extra: 60u32 };
        let mut builder = Cell::builder();
        builder
            .store_as::<_, &HashmapAugE<Data, Data>>(&aug, (8, (), ()))
            .unwrap();
        let cell = builder.into_cell();
        let got: HashmapAugE<u32, u32> = cell
            .parse_fully_as::<_, HashmapAugE<Data, Data>>((8, (), ()))
            .unwrap();
        assert_eq!(got, aug);
    }
}
