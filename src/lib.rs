#![cfg_attr(not(test), no_std)]
#![cfg_attr(feature = "strict", deny(warnings))]

extern crate alloc;

pub mod adapter;
pub(crate) mod commands;
pub(crate) mod responses;
pub mod session;
pub mod stack;
pub mod transport;
pub mod urc;
pub mod wifi;

#[cfg(feature = "examples")]
pub mod example;

#[cfg(test)]
mod tests;
