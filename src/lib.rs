pub mod alias;
pub mod archive;
pub mod artifact;
pub mod checkout;
pub mod cli;
pub mod config;
pub mod git;
pub mod validator;
pub mod vcs;

mod api;
#[cfg(test)]
mod testing;

pub use api::{TcCheckout, TcCheckoutBuilder};
