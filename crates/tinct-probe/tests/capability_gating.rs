use tinct_probe::{
    Capabilities, Capability, LibraryProbe, ProbeError, StaticProbe, describe_environment, describe_environment_with,
    is_littlecms_installed, is_opencolorio_installed, is_openexr_installed, is_openimageio_installed, required,
};

/// A feature gated on OpenColorIO, taking the resolved capabilities explicitly.
fn bake_display_lut(capabilities: &Capabilities) -> Result<usize, ProbeError> {
    required(capabilities, Capability::OpenColorIo, || 33 * 33 * 33)
}

#[test]
fn test_gated_feature_runs_when_capability_is_present() {
    let caps = Capabilities::detect_with(&StaticProbe::new([Capability::OpenColorIo]));
    assert_eq!(bake_display_lut(&caps), Ok(35_937));
}

#[test]
fn test_gated_feature_fails_fast_when_capability_is_missing() {
    let caps = Capabilities::detect_with(&StaticProbe::none());
    let err = bake_display_lut(&caps).unwrap_err();
    assert!(matches!(
        err,
        ProbeError::MissingOptionalDependency {
            capability: Capability::OpenColorIo,
            ..
        }
    ));
    assert!(err.to_string().contains("OpenColorIO"));
}

#[test]
fn test_detection_never_panics_without_libraries() {
    let caps = Capabilities::detect_with(&LibraryProbe::in_directories(["/definitely/not/here"]));
    assert_eq!(caps.available().count(), 0);

    // System probes may find anything; they only have to answer.
    let _ = (
        is_opencolorio_installed(),
        is_openimageio_installed(),
        is_littlecms_installed(),
        is_openexr_installed(),
    );
    assert_eq!(Capabilities::global(), Capabilities::global());
}

#[test]
fn test_global_report_matches_global_capabilities() {
    let report = describe_environment();
    for capability in Capability::all() {
        assert_eq!(
            report.capabilities.get(capability.label()).copied(),
            Some(Capabilities::global().is_available(*capability)),
            "{capability} mismatch"
        );
    }
    assert_eq!(report, describe_environment_with(Capabilities::global()));
    assert!(report.to_json().unwrap().contains("\"domain_range_scale\""));
}
