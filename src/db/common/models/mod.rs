// Copyright © Celerfi
// SPDX-License-Identifier: Apache-2.0

/// Normalized DEX trade records and their nested order matches
pub mod trade_models;

/// Oracle price tick records
pub mod price_tick_models;

/// Token metadata records and supply breakdowns
pub mod token_models;

/// Liquidity pool placeholder records
pub mod pool_models;
