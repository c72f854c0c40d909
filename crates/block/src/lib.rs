//! TON block structures in [TL-B](https://docs.ton.org/develop/data-formats/tl-b-language).
//!
//! Two views of the same data are provided:
//! * typed records ([`message::Message`], [`currency::CurrencyCollection`],
//!   [`ShardIdent`], ...) implementing
//!   [`CellSerialize`](tlb::ser::CellSerialize)/[`CellDeserialize`](tlb::de::CellDeserialize)
//!   or [`BitPack`](tlb::bits::ser::BitPack)/[`BitUnpack`](tlb::bits::de::BitUnpack);
//! * runtime descriptors in [`schema`] that skip, validate, measure and
//!   combine values in place, without materializing them.
mod account;
mod address;
pub mod currency;
pub mod message;
pub mod schema;
mod shard;
pub mod state_init;
mod transaction;

pub use self::{account::*, address::*, shard::*, transaction::*};
