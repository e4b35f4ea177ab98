// Copyright © Celerfi
// SPDX-License-Identifier: Apache-2.0

pub const AMM_DEX_NAME: &str = "aquarius";

/// Topic-0 symbol identifying a swap event.
pub const TRADE_EVENT_SYMBOL: &str = "trade";

/// `trade` event data vec layout: [amount_sold, amount_bought, fee].
pub const TRADE_DATA_MIN_LEN: usize = 3;
