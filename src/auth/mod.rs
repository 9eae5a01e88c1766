// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client-side authentication.

pub mod gate;

pub use gate::AuthGate;
