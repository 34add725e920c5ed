//! saysome: post, like, dislike and comment on short messages stored by a
//! smart contract, through a connected wallet.

pub mod app;
pub mod config;
pub mod contract;
pub mod error;
pub mod feeds;
pub mod tweet;
pub mod ui;
pub mod wallet;

pub use error::{Result, SaysError};
pub use tweet::{Comment, Tweet};
