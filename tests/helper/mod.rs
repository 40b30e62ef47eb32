#![allow(dead_code)]

mod source;
mod store;

pub use source::*;
pub use store::*;
