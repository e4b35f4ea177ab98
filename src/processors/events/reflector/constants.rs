// Copyright © Celerfi
// SPDX-License-Identifier: Apache-2.0

/// The three Reflector oracle deployments (external CEX/DEX feed, Stellar
/// pubnet feed, FX feed).
pub const REFLECTOR_CONTRACTS: &[&str] = &[
    "CAFJZQWSED6YAWZU3GWRTOCNPPCGBN32L7QV43XX5LZLFTK6JLN34DLN",
    "CALI2BYU2JE6WVRUFYTS6MSBNEHGJ35P4AVCZYF3B6QOE3QKOB2PLE6M",
    "CBKGPWGKSKZF52CFHMTRR23TBWTPMRDIYZ4O2P5VS65BMHYH4DXMCJZC",
];

pub const SET_PRICE_FUNCTION: &str = "set_price";

/// Reflector publishes prices at 14 decimals.
pub const REFLECTOR_SCALE: u32 = 14;

pub const REFLECTOR_SOURCE_ID: &str = "reflector";
pub const SOURCE_TYPE_ORACLE: &str = "oracle_onchain";
