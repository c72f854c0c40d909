//! Bit-level **de**/**ser**ialization for
//! [TL-B](https://docs.ton.org/develop/data-formats/tl-b-language)
pub mod adapters;
pub mod r#as;
pub mod de;
mod error;
mod integer;
pub mod ser;

pub use self::error::*;

pub use bitvec;
pub use either::Either;

#[cfg(test)]
mod tests;
