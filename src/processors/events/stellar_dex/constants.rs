// Copyright © Celerfi
// SPDX-License-Identifier: Apache-2.0

pub const STELLAR_DEX_NAME: &str = "stellar_dex";

pub const STATUS_POSTED: &str = "POSTED";
pub const STATUS_MATCHED: &str = "MATCHED";
pub const STATUS_PARTIALLY_MATCHED: &str = "PARTIALLY_MATCHED";

pub const ORDER_TYPE_COUNTER_OFFER: &str = "counter_offer";
