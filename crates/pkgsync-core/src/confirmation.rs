use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::model::VersionCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransactionId(pub u64);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A transaction the installer still holds open, as reported by enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionInfo {
    pub id: TransactionId,
    pub package: Option<String>,
    pub committed: bool,
    pub sealed: bool,
}

impl TransactionInfo {
    /// Committed and sealed transactions are the ones parked on a user prompt.
    pub fn awaits_confirmation(&self) -> bool {
        self.committed && self.sealed
    }
}

/// Opaque reference a presenter turns into an install-approval prompt.
///
/// The updater never looks inside. Installers attach whatever the platform
/// needs through [`ConfirmationHandle::new`]; presenters get it back with
/// [`ConfirmationHandle::downcast_ref`].
#[derive(Clone)]
pub struct ConfirmationHandle {
    transaction_id: TransactionId,
    inner: Option<Arc<dyn Any + Send + Sync>>,
}

impl ConfirmationHandle {
    pub fn new(transaction_id: TransactionId, inner: Arc<dyn Any + Send + Sync>) -> Self {
        Self {
            transaction_id,
            inner: Some(inner),
        }
    }

    /// Handle rebuilt from a live transaction after the original was lost.
    pub fn regenerated(transaction_id: TransactionId) -> Self {
        Self {
            transaction_id,
            inner: None,
        }
    }

    pub fn transaction_id(&self) -> TransactionId {
        self.transaction_id
    }

    pub fn is_regenerated(&self) -> bool {
        self.inner.is_none()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.as_deref().and_then(|inner| inner.downcast_ref::<T>())
    }
}

impl fmt::Debug for ConfirmationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfirmationHandle")
            .field("transaction_id", &self.transaction_id)
            .field("regenerated", &self.is_regenerated())
            .finish()
    }
}

impl PartialEq for ConfirmationHandle {
    fn eq(&self, other: &Self) -> bool {
        self.transaction_id == other.transaction_id
            && match (&self.inner, &other.inner) {
                (Some(left), Some(right)) => Arc::ptr_eq(left, right),
                (None, None) => true,
                _ => false,
            }
    }
}

impl Eq for ConfirmationHandle {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualConfirmation {
    pub package: String,
    /// Unknown when rebuilt from the installer's live transactions.
    pub version: Option<VersionCode>,
    pub transaction_id: TransactionId,
    pub handle: ConfirmationHandle,
}

impl ManualConfirmation {
    pub fn from_transaction(package: String, transaction_id: TransactionId) -> Self {
        Self {
            package,
            version: None,
            transaction_id,
            handle: ConfirmationHandle::regenerated(transaction_id),
        }
    }
}
