//! Runtime type descriptors for TL-B.
//!
//! Unlike [`CellSerialize`](crate::ser::CellSerialize) and
//! [`CellDeserialize`](crate::de::CellDeserialize), which convert between
//! cells and Rust values, a [`TlbType`] works directly on a
//! [`CellParser`] cursor: it skips, measures, validates, copies and
//! pretty-prints values of a TL-B type without materializing them.
//! Descriptors are plain values, so parametrized types such as
//! `HashmapE 32 (VarUInteger 32)` are built by composing them at runtime.
//!
//! Every cursor operation returns [`None`] (or `false`) on malformed input
//! instead of panicking.
mod aug;
mod basic;
mod combinators;
mod hashmap;
mod print;
mod var_int;

pub use self::{aug::*, basic::*, combinators::*, hashmap::*, print::*, var_int::*};

use core::ops::{Add, Sub};
use std::sync::Arc;

use bitvec::{order::Msb0, vec::BitVec};
use impl_tools::autoimpl;
use log::debug;
use num_bigint::BigInt;
use num_traits::Zero;
use thiserror::Error;

use crate::{
    Cell,
    de::CellParser,
    ser::{CellBuilder, CellSerializeExt},
};

/// Amount of data in a cell slice: bits and references
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SizeExt {
    bits: usize,
    refs: usize,
}

impl SizeExt {
    #[inline]
    pub const fn new(bits: usize, refs: usize) -> Self {
        Self { bits, refs }
    }

    /// Only data bits
    #[inline]
    pub const fn bits_only(bits: usize) -> Self {
        Self::new(bits, 0)
    }

    #[inline]
    pub const fn bits(&self) -> usize {
        self.bits
    }

    #[inline]
    pub const fn refs(&self) -> usize {
        self.refs
    }

    /// Packed form: bits in the low 16 bits, references above
    #[inline]
    pub const fn raw(&self) -> u32 {
        self.bits as u32 + ((self.refs as u32) << 16)
    }

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self::new((raw & 0xffff) as usize, (raw >> 16) as usize)
    }

    #[inline]
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        Some(Self::new(
            self.bits.checked_sub(rhs.bits)?,
            self.refs.checked_sub(rhs.refs)?,
        ))
    }
}

impl Add for SizeExt {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.bits + rhs.bits, self.refs + rhs.refs)
    }
}

impl Sub for SizeExt {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.bits - rhs.bits, self.refs - rhs.refs)
    }
}

/// Budget of cells that a single validation may visit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ops {
    left: u32,
}

impl Ops {
    pub const DEFAULT_MAX_CELLS: u32 = 1024;

    #[inline]
    pub const fn new(max_cells: u32) -> Self {
        Self { left: max_cells }
    }

    #[inline]
    pub const fn unlimited() -> Self {
        Self::new(u32::MAX)
    }

    #[inline]
    pub const fn left(&self) -> u32 {
        self.left
    }

    /// Accounts for one more visited cell
    #[inline]
    pub fn consume(&mut self) -> Option<()> {
        match self.left.checked_sub(1) {
            Some(left) => {
                self.left = left;
                Some(())
            }
            None => {
                debug!(target: "tlb", "cell visit budget exhausted");
                None
            }
        }
    }
}

impl Default for Ops {
    #[inline]
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_CELLS)
    }
}

/// Outcome of [`TlbType::sub_values`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subtraction {
    /// The difference is not representable, nothing meaningful was stored
    Invalid,
    /// The difference was stored and is zero
    Zero,
    /// The difference was stored and is non-zero
    NonZero,
}

impl Subtraction {
    #[inline]
    pub const fn is_valid(self) -> bool {
        !matches!(self, Self::Invalid)
    }
}

impl From<Subtraction> for i32 {
    #[inline]
    fn from(value: Subtraction) -> Self {
        match value {
            Subtraction::Invalid => -1,
            Subtraction::Zero => 0,
            Subtraction::NonZero => 1,
        }
    }
}

impl From<i32> for Subtraction {
    #[inline]
    fn from(value: i32) -> Self {
        match value {
            ..0 => Self::Invalid,
            0 => Self::Zero,
            1.. => Self::NonZero,
        }
    }
}

/// Failure of a per-key dictionary combination
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CombineError {
    #[error("malformed dictionary")]
    Malformed,
    #[error("values at key {0:?} cannot be combined")]
    Values(BitVec<u8, Msb0>),
    #[error("key {0:?} is present only in the subtrahend")]
    Subtrahend(BitVec<u8, Msb0>),
    #[error("dictionary rebuild failed: {0}")]
    Rebuild(String),
}

/// Runtime descriptor of a TL-B type.
///
/// Only [`validate_skip`](TlbType::validate_skip) is required. Simple
/// types override [`skip`](TlbType::skip) and
/// [`get_size`](TlbType::get_size) with plain cursor arithmetic, while
/// composite ones rely on the defaults derived from validation.
///
/// All methods taking `&CellParser` work on a copy and leave the caller's
/// cursor untouched. Methods taking `&mut CellParser` advance it on
/// success and leave it unspecified on failure.
#[autoimpl(for<T: trait + ?Sized> &T, Box<T>, Arc<T>)]
pub trait TlbType {
    /// Advances past one value while checking every invariant the type
    /// can check locally. Referenced cells are validated too, spending
    /// `ops`. With `weak`, exotic cells are accepted where a reference is
    /// expected.
    fn validate_skip(&self, ops: &mut Ops, cs: &mut CellParser<'_>, weak: bool) -> Option<()>;

    /// Advances past one value without checking more than needed to find
    /// its end
    #[inline]
    fn skip(&self, cs: &mut CellParser<'_>) -> Option<()> {
        self.validate_skip(&mut Ops::unlimited(), cs, false)
    }

    /// Bits and references occupied by the value at the cursor
    #[inline]
    fn get_size(&self, cs: &CellParser<'_>) -> Option<SizeExt> {
        let mut tail = cs.clone();
        self.skip(&mut tail)?;
        cs.size_ext().checked_sub(tail.size_ext())
    }

    /// Constructor index of the value at the cursor, if the type has
    /// several constructors
    #[inline]
    fn get_tag(&self, _cs: &CellParser<'_>) -> Option<u32> {
        None
    }

    #[inline]
    fn validate(&self, ops: &mut Ops, cs: &CellParser<'_>, weak: bool) -> bool {
        self.validate_skip(ops, &mut cs.clone(), weak).is_some()
    }

    /// Like [`validate`](TlbType::validate), but also requires the value to
    /// span the whole slice
    #[inline]
    fn validate_exact(&self, ops: &mut Ops, cs: &CellParser<'_>, weak: bool) -> bool {
        let mut cs = cs.clone();
        self.validate_skip(ops, &mut cs, weak).is_some() && cs.is_empty()
    }

    /// [`validate`](TlbType::validate) with a fresh budget of `max_ops`
    /// cells
    #[inline]
    fn validate_upto(&self, max_ops: u32, cs: &CellParser<'_>, weak: bool) -> bool {
        self.validate(&mut Ops::new(max_ops), cs, weak)
    }

    /// Validates the value at the cursor and keeps only it
    #[inline]
    fn validate_extract(&self, ops: &mut Ops, cs: &mut CellParser<'_>, weak: bool) -> Option<()> {
        let mut tail = cs.clone();
        self.validate_skip(ops, &mut tail, weak)?;
        cs.cut_tail(&tail)
    }

    /// Validates the value at the cursor, advances past it and returns it
    /// as a separate slice
    #[inline]
    fn validate_fetch<'de>(
        &self,
        ops: &mut Ops,
        cs: &mut CellParser<'de>,
        weak: bool,
    ) -> Option<CellParser<'de>> {
        let mut head = cs.clone();
        self.validate_skip(ops, cs, weak)?;
        head.cut_tail(cs)?;
        Some(head)
    }

    /// Keeps only the value at the cursor
    #[inline]
    fn extract(&self, cs: &mut CellParser<'_>) -> Option<()> {
        let mut tail = cs.clone();
        self.skip(&mut tail)?;
        cs.cut_tail(&tail)
    }

    /// Advances past the value and returns it as a separate slice
    #[inline]
    fn fetch<'de>(&self, cs: &mut CellParser<'de>) -> Option<CellParser<'de>> {
        let mut head = cs.clone();
        self.skip(cs)?;
        head.cut_tail(cs)?;
        Some(head)
    }

    /// Returns the value at the cursor as a separate slice without
    /// advancing
    #[inline]
    fn prefetch<'de>(&self, cs: &CellParser<'de>) -> Option<CellParser<'de>> {
        self.fetch(&mut cs.clone())
    }

    /// Advances past the value and appends it to `cb`
    #[inline]
    fn skip_copy(&self, cb: &mut CellBuilder, cs: &mut CellParser<'_>) -> Option<()> {
        let value = self.fetch(cs)?;
        cb.store(&value, ()).ok()?;
        Some(())
    }

    /// Appends the value at the cursor to `cb`
    #[inline]
    fn copy(&self, cb: &mut CellBuilder, cs: &CellParser<'_>) -> Option<()> {
        self.skip_copy(cb, &mut cs.clone())
    }

    /// Integer view of the value, for types that have one
    #[inline]
    fn as_integer_skip(&self, _cs: &mut CellParser<'_>) -> Option<BigInt> {
        None
    }

    /// Integer view of a slice holding exactly one value
    #[inline]
    fn as_integer(&self, cs: &CellParser<'_>) -> Option<BigInt> {
        let mut cs = cs.clone();
        let v = self.as_integer_skip(&mut cs)?;
        cs.is_empty().then_some(v)
    }

    /// Stores the neutral value of the type
    #[inline]
    fn null_value(&self, _cb: &mut CellBuilder) -> Option<()> {
        None
    }

    /// Stores `value` if the type has an integer view that can hold it
    #[inline]
    fn store_integer_value(&self, _cb: &mut CellBuilder, _value: &BigInt) -> Option<()> {
        None
    }

    /// Reads one value from each slice and stores their sum
    #[inline]
    fn add_values(
        &self,
        cb: &mut CellBuilder,
        cs1: &mut CellParser<'_>,
        cs2: &mut CellParser<'_>,
    ) -> Option<()> {
        let x = self.as_integer_skip(cs1)?;
        let y = self.as_integer_skip(cs2)?;
        self.store_integer_value(cb, &(x + y))
    }

    /// Reads one value from each slice and stores `cs1 - cs2`
    #[inline]
    fn sub_values(
        &self,
        cb: &mut CellBuilder,
        cs1: &mut CellParser<'_>,
        cs2: &mut CellParser<'_>,
    ) -> Subtraction {
        let (Some(x), Some(y)) = (self.as_integer_skip(cs1), self.as_integer_skip(cs2)) else {
            return Subtraction::Invalid;
        };
        let d = x - y;
        if self.store_integer_value(cb, &d).is_none() {
            return Subtraction::Invalid;
        }
        if d.is_zero() {
            Subtraction::Zero
        } else {
            Subtraction::NonZero
        }
    }

    /// Validates a referenced cell holding exactly one value, spending one
    /// unit of `ops`
    #[inline]
    fn validate_ref(&self, ops: &mut Ops, cell: &Cell, weak: bool) -> bool {
        validate_ref_with(ops, cell, weak, |ops, cs| self.validate_skip(ops, cs, weak))
    }

    /// Fetches a reference and validates it with
    /// [`validate_ref`](TlbType::validate_ref)
    #[inline]
    fn validate_skip_ref(&self, ops: &mut Ops, cs: &mut CellParser<'_>, weak: bool) -> Option<()> {
        let cell = cs.fetch_reference()?;
        self.validate_ref(ops, cell, weak).then_some(())
    }

    /// Prints one value and advances past it
    fn print_skip(&self, pp: &mut PrettyPrinter, cs: &mut CellParser<'_>) -> Option<()> {
        pp.open("raw@")?;
        let value = self.fetch(cs)?;
        pp.out(format_args!("{value:?}"))?;
        pp.close()
    }

    #[inline]
    fn print(&self, pp: &mut PrettyPrinter, cs: &CellParser<'_>) -> bool {
        self.print_skip(pp, &mut cs.clone()).is_some()
    }

    /// Prints a referenced cell holding exactly one value
    #[inline]
    fn print_ref(&self, pp: &mut PrettyPrinter, cell: &Cell) -> Option<()> {
        print_ref_with(pp, cell, |pp, cs| self.print_skip(pp, cs))
    }
}

/// Shortcuts for [`TlbType`]
pub trait TlbTypeExt: TlbType {
    /// Validates a whole cell as one value with the default budget
    #[inline]
    fn validate_cell(&self, cell: &Cell, weak: bool) -> bool {
        self.validate_ref(&mut Ops::default(), cell, weak)
    }

    /// Pretty-prints a whole cell as one value
    fn print_cell(&self, cell: &Cell) -> Result<String, String> {
        let mut pp = PrettyPrinter::default();
        let printed = self.print_ref(&mut pp, cell).is_some();
        if printed && pp.ok() {
            Ok(pp.into_string())
        } else {
            Err(pp.into_string())
        }
    }

    /// Null value in a fresh cell
    #[inline]
    fn null_cell(&self) -> Option<Cell> {
        let mut cb = Cell::builder();
        self.null_value(&mut cb)?;
        Some(cb.into_cell())
    }

    /// Integer value in a fresh cell
    #[inline]
    fn integer_cell(&self, value: &BigInt) -> Option<Cell> {
        let mut cb = Cell::builder();
        self.store_integer_value(&mut cb, value)?;
        Some(cb.into_cell())
    }
}
impl<T> TlbTypeExt for T where T: TlbType + ?Sized {}

/// Spends one unit of `ops` on `cell` and checks that `f` consumes it
/// exactly. Exotic cells pass only when `weak`.
pub fn validate_ref_with(
    ops: &mut Ops,
    cell: &Cell,
    weak: bool,
    f: impl FnOnce(&mut Ops, &mut CellParser<'_>) -> Option<()>,
) -> bool {
    if ops.consume().is_none() {
        return false;
    }
    if cell.exotic {
        return weak;
    }
    let mut cs = cell.parser();
    f(ops, &mut cs).is_some() && cs.is_empty()
}

/// Prints `cell` with `f`, which must consume it exactly
pub fn print_ref_with(
    pp: &mut PrettyPrinter,
    cell: &Cell,
    f: impl FnOnce(&mut PrettyPrinter, &mut CellParser<'_>) -> Option<()>,
) -> Option<()> {
    pp.enter()?;
    if cell.exotic {
        return pp.special(cell);
    }
    let mut cs = cell.parser();
    f(pp, &mut cs)?;
    if !cs.is_empty() {
        return pp.fail("extra data in cell");
    }
    Some(())
}

/// Builds a cell with `f` and compares its contents with `cs`
pub fn built_equals(
    cs: &CellParser<'_>,
    f: impl FnOnce(&mut CellBuilder) -> Option<()>,
) -> bool {
    let mut cb = Cell::builder();
    if f(&mut cb).is_none() {
        return false;
    }
    let cell = cb.into_cell();
    cell.parser().contents_equal(cs)
}

/// Copies a whole slice into a fresh cell
pub fn slice_to_cell(cs: &CellParser<'_>) -> Option<Cell> {
    cs.to_cell(()).ok()
}

#[cfg(test)]
mod tests;
