//! [TL-B](https://docs.ton.org/develop/data-formats/tl-b-language) cells,
//! typed **de**/**ser**ialization and schema descriptors
pub mod r#as;
mod cell;
pub mod de;
pub mod schema;
pub mod ser;

pub use self::{cell::*, de::*, ser::*};

pub use tlbits::{self as bits, Context, Either, Error, StringError};

#[cfg(test)]
mod tests;
