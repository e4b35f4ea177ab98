// Copyright © Celerfi
// SPDX-License-Identifier: Apache-2.0

/// Common database models and shared record structures
pub mod models;
