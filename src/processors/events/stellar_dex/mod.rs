// Copyright © Celerfi
// SPDX-License-Identifier: Apache-2.0

pub mod constants;
pub mod processor;
