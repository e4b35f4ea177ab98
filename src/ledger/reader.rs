// Copyright © Celerfi
// SPDX-License-Identifier: Apache-2.0

//! In-order transaction iteration over one ledger, plus the success filter.
//!
//! Only successful transactions produce authoritative state changes, so
//! everything else is dropped before dispatch. The per-operation bounds check
//! guards against result encodings the node could not expand.

use crate::ledger::types::{
    LedgerMeta, LedgerTransaction, OperationResult, TransactionResultCode,
};

/// Yields a ledger's transactions in ledger order.
pub struct LedgerTransactionReader<'a> {
    transactions: std::slice::Iter<'a, LedgerTransaction>,
}

impl<'a> LedgerTransactionReader<'a> {
    pub fn new(meta: &'a LedgerMeta) -> Self {
        Self {
            transactions: meta.transactions.iter(),
        }
    }
}

impl<'a> Iterator for LedgerTransactionReader<'a> {
    type Item = &'a LedgerTransaction;

    fn next(&mut self) -> Option<Self::Item> {
        self.transactions.next()
    }
}

/// Ledger-level outcome filter: only successful transactions pass.
pub fn is_successful(tx: &LedgerTransaction) -> bool {
    tx.result_code == TransactionResultCode::TxSuccess
}

/// Fetch the typed result for operation `op_index`, skipping the operation
/// when the result list is absent or shorter than the index. A short list
/// signals a malformed or unsupported result encoding, not an error.
pub fn operation_result(tx: &LedgerTransaction, op_index: usize) -> Option<&OperationResult> {
    tx.operation_results.as_ref()?.get(op_index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::types::*;

    fn tx(result_code: TransactionResultCode) -> LedgerTransaction {
        LedgerTransaction {
            hash: "abc123".to_string(),
            source_account: "GSOURCE".to_string(),
            result_code,
            operations: vec![
                Operation {
                    source_account: None,
                    body: OperationBody::Other,
                },
                Operation {
                    source_account: None,
                    body: OperationBody::Other,
                },
            ],
            operation_results: Some(vec![OperationResult::Other]),
            events: vec![],
        }
    }

    #[test]
    fn failed_transactions_are_filtered() {
        assert!(is_successful(&tx(TransactionResultCode::TxSuccess)));
        assert!(!is_successful(&tx(TransactionResultCode::TxFailed)));
    }

    #[test]
    fn short_result_list_skips_operation() {
        let tx = tx(TransactionResultCode::TxSuccess);
        assert!(operation_result(&tx, 0).is_some());
        // Second operation has no matching result entry
        assert!(operation_result(&tx, 1).is_none());

        let mut no_results = tx.clone();
        no_results.operation_results = None;
        assert!(operation_result(&no_results, 0).is_none());
    }

    #[test]
    fn reader_preserves_ledger_order() {
        let meta = LedgerMeta {
            sequence: 7,
            close_time: 0,
            transactions: vec![
                tx(TransactionResultCode::TxSuccess),
                tx(TransactionResultCode::TxFailed),
            ],
        };
        let hashes: Vec<_> = LedgerTransactionReader::new(&meta).map(|t| &t.hash).collect();
        assert_eq!(hashes.len(), 2);
    }
}
