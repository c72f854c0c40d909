//! Runtime descriptors of TON block types.
//!
//! Everything from [`tlb::schema`] is re-exported, so generic descriptors
//! ([`Maybe`], [`HashmapE`], [`Grams`], ...) and block ones can be combined
//! from a single import. Block descriptors are unit structs (or carry a
//! single flag) and can be used in `const` contexts.
//!
//! ```
//! use tlb_block::schema::{CurrencyCollection, TlbTypeExt};
//!
//! let zero = CurrencyCollection.null_cell().unwrap();
//! assert!(CurrencyCollection.validate_cell(&zero, false));
//! ```

/// Logs an unknown constructor tag of a block type
macro_rules! invalid_tag {
    ($ty:literal, $cs:expr) => {
        ::log::debug!(
            target: "block",
            "invalid {} tag at {:?}",
            $ty,
            $cs.prefetch_bits(8usize.min($cs.bits_left()))
        )
    };
}

/// Declares a unit struct that names a parameterized descriptor
macro_rules! named_type {
    ($(#[$attr:meta])* pub struct $name:ident: $inner:ty = $init:expr;) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name;

        impl $name {
            const INNER: $inner = $init;

            /// The underlying descriptor
            #[inline]
            pub fn inner(&self) -> &'static $inner {
                &Self::INNER
            }
        }

        impl $crate::schema::TlbType for $name {
            #[inline]
            fn validate_skip(
                &self,
                ops: &mut $crate::schema::Ops,
                cs: &mut ::tlb::de::CellParser<'_>,
                weak: bool,
            ) -> Option<()> {
                Self::INNER.validate_skip(ops, cs, weak)
            }

            #[inline]
            fn skip(&self, cs: &mut ::tlb::de::CellParser<'_>) -> Option<()> {
                Self::INNER.skip(cs)
            }

            #[inline]
            fn get_size(&self, cs: &::tlb::de::CellParser<'_>) -> Option<$crate::schema::SizeExt> {
                Self::INNER.get_size(cs)
            }

            #[inline]
            fn get_tag(&self, cs: &::tlb::de::CellParser<'_>) -> Option<u32> {
                Self::INNER.get_tag(cs)
            }

            #[inline]
            fn null_value(&self, cb: &mut ::tlb::ser::CellBuilder) -> Option<()> {
                Self::INNER.null_value(cb)
            }

            #[inline]
            fn add_values(
                &self,
                cb: &mut ::tlb::ser::CellBuilder,
                cs1: &mut ::tlb::de::CellParser<'_>,
                cs2: &mut ::tlb::de::CellParser<'_>,
            ) -> Option<()> {
                Self::INNER.add_values(cb, cs1, cs2)
            }

            #[inline]
            fn sub_values(
                &self,
                cb: &mut ::tlb::ser::CellBuilder,
                cs1: &mut ::tlb::de::CellParser<'_>,
                cs2: &mut ::tlb::de::CellParser<'_>,
            ) -> $crate::schema::Subtraction {
                Self::INNER.sub_values(cb, cs1, cs2)
            }

            #[inline]
            fn print_skip(
                &self,
                pp: &mut $crate::schema::PrettyPrinter,
                cs: &mut ::tlb::de::CellParser<'_>,
            ) -> Option<()> {
                Self::INNER.print_skip(pp, cs)
            }
        }
    };
}

mod account;
mod address;
mod currency;
mod message;
mod msg_descr;
mod state;
mod transaction;

pub use tlb::schema::*;

pub use self::{
    account::*, address::*, currency::*, message::*, msg_descr::*, state::*, transaction::*,
};

#[cfg(test)]
mod tests;
