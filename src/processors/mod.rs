// Copyright © Celerfi
// SPDX-License-Identifier: Apache-2.0

//! Ledger processing pipeline.
//!
//! `ledger_stream` owns the cursor and the fetch/retry policy,
//! `dispatcher` routes each operation to the right decoder under `events`.

pub mod dispatcher;
pub mod events;
pub mod ledger_stream;
