use semver::Version;

use crate::version::{VersionError, VersionRange, api_version, is_api_compatible, parse_version};

#[test]
fn test_parse_version_trims_and_rejects_garbage() {
    assert_eq!(parse_version(" 1.2.3 ").unwrap(), Version::new(1, 2, 3));
    assert!(matches!(
        parse_version("one"),
        Err(VersionError::InvalidVersion { input, .. }) if input == "one"
    ));
}

#[test]
fn test_api_version_matches_constant() {
    assert_eq!(api_version().unwrap().to_string(), crate::constants::API_VERSION);
}

#[test]
fn test_range_includes() {
    let range: VersionRange = ">=0.1, <0.3".parse().unwrap();
    assert!(range.includes(&Version::new(0, 2, 9)));
    assert!(!range.includes(&Version::new(0, 3, 0)));
    assert_eq!(range.to_string(), ">=0.1, <0.3");
    assert_eq!(range.constraint_string(), ">=0.1, <0.3");
}

#[test]
fn test_invalid_constraint() {
    let err = VersionRange::from_constraint("~>banana").unwrap_err();
    assert!(matches!(err, VersionError::InvalidConstraint { .. }));
}

#[test]
fn test_api_compatibility() {
    let api = Version::new(0, 1, 0);
    let old = VersionRange::from_constraint("^0.0.5").unwrap();
    let current = VersionRange::from_constraint("^0.1").unwrap();

    assert!(is_api_compatible(&[], &api));
    assert!(is_api_compatible(&[old.clone(), current], &api));
    assert!(!is_api_compatible(&[old], &api));
}
