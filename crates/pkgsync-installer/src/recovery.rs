use std::collections::BTreeMap;

use pkgsync_core::{ManualConfirmation, TransactionInfo};
use tracing::{debug, warn};

/// Rebuilds the confirmation set from the installer's open transactions.
///
/// Only committed and sealed transactions are parked on a prompt. When a
/// package shows up more than once the newest transaction wins.
pub fn reconstruct_confirmations(
    transactions: &[TransactionInfo],
) -> BTreeMap<String, ManualConfirmation> {
    let mut confirmations: BTreeMap<String, ManualConfirmation> = BTreeMap::new();
    for transaction in transactions {
        debug!(
            transaction_id = %transaction.id,
            package = transaction.package.as_deref().unwrap_or("<unknown>"),
            committed = transaction.committed,
            sealed = transaction.sealed,
            "inspecting live transaction"
        );
        if !transaction.awaits_confirmation() {
            continue;
        }
        let Some(package) = transaction.package.as_deref() else {
            warn!(
                transaction_id = %transaction.id,
                "skipping sealed transaction without a package name"
            );
            continue;
        };

        match confirmations.get(package) {
            Some(existing) if existing.transaction_id >= transaction.id => {}
            _ => {
                confirmations.insert(
                    package.to_string(),
                    ManualConfirmation::from_transaction(package.to_string(), transaction.id),
                );
            }
        }
    }
    confirmations
}
