// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! hopper-protocol: the wire message family and its newline-delimited
//! JSON framing. Nothing here holds a socket or any coordinator state.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod framing;
pub mod message;

pub use framing::{read_message, write_line, FramingError, MAX_LINE_BYTES};
pub use message::{ClientMessage, ServerMessage, TmuxLocation};
