// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! relay-core: shared vocabulary types for the relay CI coordinator.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod clock;
pub mod commit;
pub mod runner;

pub use clock::{Clock, FakeClock, SystemClock};
pub use commit::CommitId;
pub use runner::{RunnerAddrError, RunnerRef};
