//! Typed dictionaries
mod aug;
mod hm_label;

pub use self::{aug::*, hm_label::*};
