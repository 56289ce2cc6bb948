use std::fmt;

use crate::confirmation::TransactionId;
use crate::model::VersionCode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Success,
    /// Rejected for a reason a retry of the same version will not fix.
    PermanentFailure(String),
    /// Download or I/O trouble; worth another attempt.
    TransientFailure(String),
    /// Parked until a user confirms; tracked as a manual confirmation.
    ConfirmationPending(TransactionId),
    /// Prompt handed straight to a foreground presenter.
    PromptShown(TransactionId),
}

impl InstallOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn awaits_user(&self) -> bool {
        matches!(self, Self::ConfirmationPending(_) | Self::PromptShown(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::PermanentFailure(_) => "permanent-failure",
            Self::TransientFailure(_) => "transient-failure",
            Self::ConfirmationPending(_) => "confirmation-pending",
            Self::PromptShown(_) => "prompt-shown",
        }
    }
}

impl fmt::Display for InstallOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("installed"),
            Self::PermanentFailure(reason) => write!(f, "rejected: {reason}"),
            Self::TransientFailure(reason) => write!(f, "failed: {reason}"),
            Self::ConfirmationPending(id) => write!(f, "waiting for confirmation (tx {id})"),
            Self::PromptShown(id) => write!(f, "confirmation prompt shown (tx {id})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallAttempt {
    pub package: String,
    pub version_code: VersionCode,
    pub outcome: InstallOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockReason {
    /// The library could not be brought up to the required version this cycle.
    DependencyUnmet(String),
    DependencyFailed(InstallOutcome),
    DependencyAwaitingUser,
    /// Reading the library's installed version failed.
    InspectionFailed(String),
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DependencyUnmet(reason) => write!(f, "dependency unmet: {reason}"),
            Self::DependencyFailed(outcome) => write!(f, "dependency {outcome}"),
            Self::DependencyAwaitingUser => f.write_str("dependency waits for user confirmation"),
            Self::InspectionFailed(reason) => write!(f, "library inspection failed: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockedPackage {
    pub package: String,
    pub version_code: VersionCode,
    pub library: String,
    pub reason: BlockReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleResult {
    pub retry: bool,
    pub needs_user_attention: bool,
    pub cancelled: bool,
    /// Install attempts in invocation order, libraries included.
    pub attempts: Vec<InstallAttempt>,
    pub blocked: Vec<BlockedPackage>,
}

impl CycleResult {
    pub fn attempt(&self, package: &str) -> Option<&InstallAttempt> {
        self.attempts.iter().find(|attempt| attempt.package == package)
    }

    pub fn attempted_packages(&self) -> Vec<&str> {
        self.attempts
            .iter()
            .map(|attempt| attempt.package.as_str())
            .collect()
    }
}
