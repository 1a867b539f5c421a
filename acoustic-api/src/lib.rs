//! A barebones client for the acoustic player backend's HTTP API.
#![deny(missing_docs)]

mod client;
pub use client::*;

mod track;
pub use track::*;

mod status;
pub use status::*;

mod album;
pub use album::*;

mod library;
pub use library::*;

mod playlist;
pub use playlist::*;

mod lyrics;
pub use lyrics::*;

mod request;
