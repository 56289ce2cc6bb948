mod policy;
mod select;

pub use policy::{DependencyConstraint, DependencyPolicy};
pub use select::{select_highest_compatible, DeviceProfile, HighestCompatibleSelector};

#[cfg(test)]
mod tests;
