mod collaborators;
mod confirmation;
mod model;
mod outcome;

pub use collaborators::{
    AttentionNotifier, CatalogProvider, ConfirmationPresenter, InstallOptions, Installer,
    InstallerResponse, LibraryInspector, PayloadFetcher, UpdateSelector,
};
pub use confirmation::{ConfirmationHandle, ManualConfirmation, TransactionId, TransactionInfo};
pub use model::{Catalog, PackageRecord, PackageVersion, PayloadDescriptor, VersionCode};
pub use outcome::{BlockReason, BlockedPackage, CycleResult, InstallAttempt, InstallOutcome};
