// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control-channel protocol shared by the dispatcher and runners.
//!
//! Wire format: a single `COMMAND[:ARG]*` line of UTF-8 text per TCP
//! connection. The sender half-closes its write side when done; the
//! receiver reads to EOF under a bounded buffer. `results` carries a
//! length-prefixed raw payload that may extend past the initial
//! 1024-byte read.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod frame;
mod reply;
mod request;

pub use client::communicate;
pub use frame::{read_reply, read_request, write_reply, write_request, ProtocolError};
pub use frame::{MAX_HEADER, MAX_PAYLOAD};
pub use reply::Reply;
pub use request::Request;
