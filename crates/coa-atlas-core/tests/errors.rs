use coa_atlas_core::prelude::*;

#[test]
fn empty_input_is_rejected() {
    let sources: Vec<TexturedMesh> = Vec::new();
    assert!(matches!(
        pack(&sources, &AtlasConfig::default()),
        Err(AtlasError::Empty)
    ));
    assert!(matches!(
        pack_items(Vec::<Item>::new(), &AtlasConfig::default()),
        Err(AtlasError::Empty)
    ));
}

#[test]
fn invalid_config_is_rejected_before_packing() {
    let sources = vec![TexturedMesh::full_image("a".to_string(), 8, 8)];
    let cfg = AtlasConfig::builder().with_max_dimensions(0, 0).build();
    assert!(matches!(
        pack(&sources, &cfg),
        Err(AtlasError::InvalidDimensions { .. })
    ));
}

#[test]
fn missing_uvs_surface_with_the_key() {
    let sources = vec![
        TexturedMesh::full_image("ok".to_string(), 8, 8),
        TexturedMesh::new("hollow".to_string(), vec![], (8, 8)),
    ];
    match pack(&sources, &AtlasConfig::default()) {
        Err(AtlasError::MissingUvs { key }) => assert_eq!(key, "hollow"),
        other => panic!("expected MissingUvs, got {other:?}"),
    }
}

#[test]
fn restart_ceiling_stops_non_convergent_packing() {
    let sources = vec![TexturedMesh::full_image("huge".to_string(), 3000, 3000)];
    let cfg = AtlasConfig::builder()
        .with_dimensions(256, 256)
        .with_max_dimensions(2048, 2048)
        .max_restarts(Some(5))
        .build();
    match pack(&sources, &cfg) {
        Err(AtlasError::RestartLimit {
            restarts,
            width,
            height,
            output_scale,
        }) => {
            assert_eq!(restarts, 5);
            // five doublings from 256x256
            assert_eq!((width, height), (1024, 2048));
            assert_eq!(output_scale, 1.0);
        }
        other => panic!("expected RestartLimit, got {other:?}"),
    }
}

#[test]
fn zero_restarts_allows_only_the_first_attempt() {
    let sources = vec![
        TexturedMesh::full_image("a".to_string(), 100, 100),
        TexturedMesh::full_image("b".to_string(), 100, 100),
    ];
    let cfg = AtlasConfig::builder()
        .with_dimensions(128, 128)
        .max_restarts(Some(0))
        .build();
    assert!(matches!(
        pack(&sources, &cfg),
        Err(AtlasError::RestartLimit { restarts: 0, .. })
    ));
}

#[test]
fn pack_items_reports_out_of_space() {
    let items = extract_all(
        &[TexturedMesh::full_image("wide".to_string(), 600, 10)],
        1.0,
    )
    .expect("extract");
    let cfg = AtlasConfig::builder()
        .with_dimensions(128, 128)
        .with_max_dimensions(512, 512)
        .build();
    match pack_items(items, &cfg) {
        Err(AtlasError::OutOfSpace { width, height }) => assert_eq!((width, height), (512, 512)),
        other => panic!("expected OutOfSpace, got {other:?}"),
    }
}
