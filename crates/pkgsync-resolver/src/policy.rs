use std::collections::{BTreeMap, BTreeSet};

use anyhow::{anyhow, Result};
use pkgsync_core::PackageVersion;
use serde::{Deserialize, Serialize};

/// `dependent` may only move to version code V once `library` is at V or above.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyConstraint {
    pub dependent: String,
    pub library: String,
}

impl DependencyConstraint {
    pub fn new(dependent: impl Into<String>, library: impl Into<String>) -> Self {
        Self {
            dependent: dependent.into(),
            library: library.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyPolicy {
    libraries_by_dependent: BTreeMap<String, String>,
}

impl DependencyPolicy {
    pub fn from_constraints(constraints: &[DependencyConstraint]) -> Result<Self> {
        let mut libraries_by_dependent = BTreeMap::new();
        for constraint in constraints {
            if constraint.dependent.trim().is_empty() || constraint.library.trim().is_empty() {
                return Err(anyhow!(
                    "dependency constraint must name both dependent and library"
                ));
            }
            if constraint.dependent == constraint.library {
                return Err(anyhow!(
                    "package '{}' cannot depend on itself",
                    constraint.dependent
                ));
            }
            match libraries_by_dependent.get(&constraint.dependent) {
                Some(existing) if existing != &constraint.library => {
                    return Err(anyhow!(
                        "package '{}' declares two libraries: '{}' and '{}'",
                        constraint.dependent,
                        existing,
                        constraint.library
                    ));
                }
                _ => {
                    libraries_by_dependent
                        .insert(constraint.dependent.clone(), constraint.library.clone());
                }
            }
        }

        let libraries: BTreeSet<&String> = libraries_by_dependent.values().collect();
        if let Some(chained) = libraries_by_dependent
            .keys()
            .find(|dependent| libraries.contains(dependent))
        {
            return Err(anyhow!(
                "library '{chained}' must not itself depend on another library"
            ));
        }

        Ok(Self {
            libraries_by_dependent,
        })
    }

    /// Library `package` must wait for before installing `version`, if any.
    ///
    /// Declared pairs win over a `shared_library` named by the catalog version.
    pub fn library_for<'a>(
        &'a self,
        package: &str,
        version: &'a PackageVersion,
    ) -> Option<&'a str> {
        if let Some(library) = self.libraries_by_dependent.get(package) {
            return Some(library.as_str());
        }
        version
            .shared_library
            .as_deref()
            .filter(|library| *library != package)
    }

    pub fn dependents_of(&self, library: &str) -> Vec<&str> {
        self.libraries_by_dependent
            .iter()
            .filter(|(_, candidate)| candidate.as_str() == library)
            .map(|(dependent, _)| dependent.as_str())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.libraries_by_dependent.is_empty()
    }
}
