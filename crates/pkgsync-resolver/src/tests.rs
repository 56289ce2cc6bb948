use pkgsync_core::{PackageVersion, PayloadDescriptor, UpdateSelector, VersionCode};

use super::*;

fn version(code: u64) -> PackageVersion {
    PackageVersion {
        version_code: VersionCode(code),
        version_name: None,
        payload: PayloadDescriptor {
            name: format!("pkg-{code}.bin"),
            sha256: None,
            size: None,
        },
        shared_library: None,
        min_platform: None,
        max_platform: None,
        abis: Vec::new(),
    }
}

#[test]
fn selects_highest_version_above_installed() {
    let versions = vec![version(10), version(30), version(20)];
    let selector = HighestCompatibleSelector::default();

    let suggested = selector
        .suggest(Some(VersionCode(10)), &versions)
        .expect("must suggest an update");

    assert_eq!(suggested.version_code, VersionCode(30));
}

#[test]
fn suggests_nothing_when_installed_is_current() {
    let versions = vec![version(10), version(30)];
    let selector = HighestCompatibleSelector::default();

    assert!(selector.suggest(Some(VersionCode(30)), &versions).is_none());
    assert!(selector.suggest(Some(VersionCode(31)), &versions).is_none());
    assert!(selector.suggest(Some(VersionCode(1)), &[]).is_none());
}

#[test]
fn suggests_best_version_without_installed_state() {
    let versions = vec![version(3), version(5)];
    let selector = HighestCompatibleSelector::default();

    let suggested = selector.suggest(None, &versions).expect("must suggest");
    assert_eq!(suggested.version_code, VersionCode(5));
}

#[test]
fn skips_versions_outside_platform_range() {
    let mut too_new = version(40);
    too_new.min_platform = Some(34);
    let mut too_old = version(35);
    too_old.max_platform = Some(28);
    let mut fits = version(30);
    fits.min_platform = Some(29);
    fits.max_platform = Some(33);
    let versions = vec![too_new, too_old, fits];

    let selector = HighestCompatibleSelector::new(DeviceProfile::new(31, &["arm64-v8a"]));
    let suggested = selector
        .suggest(Some(VersionCode(1)), &versions)
        .expect("must suggest");

    assert_eq!(suggested.version_code, VersionCode(30));
}

#[test]
fn skips_versions_without_supported_abi() {
    let mut x86 = version(50);
    x86.abis = vec!["x86_64".to_string()];
    let mut arm = version(40);
    arm.abis = vec!["armeabi-v7a".to_string(), "arm64-v8a".to_string()];
    let versions = vec![x86, arm];

    let profile = DeviceProfile::new(33, &["arm64-v8a"]);
    let suggested =
        select_highest_compatible(&versions, &profile, None).expect("must pick arm build");

    assert_eq!(suggested.version_code, VersionCode(40));
}

#[test]
fn empty_profile_accepts_every_version() {
    let mut native = version(9);
    native.abis = vec!["riscv64".to_string()];
    native.min_platform = Some(99);

    let profile = DeviceProfile::default();
    assert!(profile.is_compatible(&native));
}

#[test]
fn policy_maps_dependents_to_library() {
    let policy = DependencyPolicy::from_constraints(&[
        DependencyConstraint::new("org.example.browser", "org.example.sharedlib"),
        DependencyConstraint::new("org.example.webview", "org.example.sharedlib"),
    ])
    .expect("policy must build");

    let v = version(7);
    assert_eq!(
        policy.library_for("org.example.browser", &v),
        Some("org.example.sharedlib")
    );
    assert_eq!(policy.library_for("org.example.other", &v), None);
    assert_eq!(
        policy.dependents_of("org.example.sharedlib"),
        vec!["org.example.browser", "org.example.webview"]
    );
}

#[test]
fn policy_honours_catalog_declared_library() {
    let policy = DependencyPolicy::default();
    let mut declared = version(7);
    declared.shared_library = Some("org.example.runtime".to_string());

    assert_eq!(
        policy.library_for("org.example.app", &declared),
        Some("org.example.runtime")
    );

    let mut self_reference = version(7);
    self_reference.shared_library = Some("org.example.app".to_string());
    assert_eq!(policy.library_for("org.example.app", &self_reference), None);
}

#[test]
fn declared_pair_wins_over_catalog_library() {
    let policy =
        DependencyPolicy::from_constraints(&[DependencyConstraint::new("app", "configured-lib")])
            .expect("policy must build");
    let mut declared = version(2);
    declared.shared_library = Some("catalog-lib".to_string());

    assert_eq!(policy.library_for("app", &declared), Some("configured-lib"));
}

#[test]
fn policy_rejects_invalid_constraints() {
    let self_dep = DependencyPolicy::from_constraints(&[DependencyConstraint::new("a", "a")])
        .expect_err("self dependency must fail");
    assert!(self_dep.to_string().contains("cannot depend on itself"));

    let conflicting = DependencyPolicy::from_constraints(&[
        DependencyConstraint::new("a", "lib1"),
        DependencyConstraint::new("a", "lib2"),
    ])
    .expect_err("two libraries must fail");
    assert!(conflicting.to_string().contains("declares two libraries"));

    let chained = DependencyPolicy::from_constraints(&[
        DependencyConstraint::new("app", "lib"),
        DependencyConstraint::new("lib", "base"),
    ])
    .expect_err("chained libraries must fail");
    assert!(chained.to_string().contains("must not itself depend"));

    let empty = DependencyPolicy::from_constraints(&[DependencyConstraint::new("", "lib")])
        .expect_err("empty names must fail");
    assert!(empty.to_string().contains("must name both"));
}

#[test]
fn duplicate_identical_constraint_is_accepted() {
    let policy = DependencyPolicy::from_constraints(&[
        DependencyConstraint::new("app", "lib"),
        DependencyConstraint::new("app", "lib"),
    ])
    .expect("duplicates must collapse");

    assert_eq!(policy.dependents_of("lib"), vec!["app"]);
    assert!(!policy.is_empty());
}
