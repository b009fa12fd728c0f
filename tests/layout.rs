//! Public-API tests that need no external tools: layout decisions,
//! citation source precedence, output naming and the JSON report shape.

use photocite::{
    default_citation_path, default_composite_path, plan_layout, select_citation_source,
    AnnotateOutput, AppendDirection, CitationConfig, CitationRequest, CitationSource, ImageInfo,
    LayoutMode, PhotociteError, RunStats,
};
use std::path::{Path, PathBuf};

fn photo(width: u32, height: u32) -> ImageInfo {
    ImageInfo {
        width,
        height,
        dpi: 240,
        quality: 88,
        format: "JPEG".into(),
    }
}

// ── Layout ───────────────────────────────────────────────────────────────────

#[test]
fn camera_shapes_get_stacked_captions() {
    let config = CitationConfig::default();

    let landscape = plan_layout(&photo(6000, 4000), &config);
    assert_eq!(landscape.mode, LayoutMode::Stacked);
    assert_eq!(landscape.citation_width, 3000);
    assert_eq!(landscape.extent(), "6000x");
    assert_eq!(landscape.direction, AppendDirection::Vertical);

    let portrait = plan_layout(&photo(4000, 6000), &config);
    assert_eq!(portrait.mode, LayoutMode::Stacked);
    assert_eq!(portrait.citation_width, 3200);
    assert_eq!(portrait.extent(), "4000x");
}

#[test]
fn photo_dpi_and_quality_carry_through() {
    let plan = plan_layout(&photo(800, 600), &CitationConfig::default());
    assert_eq!(plan.dpi, 240);
    assert_eq!(plan.quality, 88);

    let forced = CitationConfig::builder().dpi(150).build().unwrap();
    assert_eq!(plan_layout(&photo(800, 600), &forced).dpi, 150);
}

#[test]
fn threshold_controls_auto_side_by_side() {
    let config = CitationConfig::default();
    assert_eq!(plan_layout(&photo(1000, 1999), &config).mode, LayoutMode::Stacked);

    let strip = plan_layout(&photo(1000, 2000), &config);
    assert_eq!(strip.mode, LayoutMode::SideBySide);
    assert_eq!(strip.extent(), "800x2000");
    assert_eq!(strip.direction.magick_flag(), "+append");

    let eager = CitationConfig::builder()
        .side_by_side_threshold(1.2)
        .build()
        .unwrap();
    assert_eq!(plan_layout(&photo(1000, 1300), &eager).mode, LayoutMode::SideBySide);
}

#[test]
fn forced_stacked_ignores_strip_shape() {
    let config = CitationConfig::builder()
        .layout(LayoutMode::Stacked)
        .build()
        .unwrap();
    let plan = plan_layout(&photo(200, 2000), &config);
    assert_eq!(plan.mode, LayoutMode::Stacked);
    assert_eq!(plan.citation_width, 160);
}

#[test]
fn custom_width_factors() {
    let config = CitationConfig::builder()
        .landscape_width_factor(0.25)
        .portrait_width_factor(1.0)
        .build()
        .unwrap();
    assert_eq!(plan_layout(&photo(1000, 500), &config).citation_width, 250);
    assert_eq!(plan_layout(&photo(500, 1000), &config).citation_width, 500);
}

#[test]
fn invalid_factors_are_rejected() {
    for f in [0.0, -0.5, 1.5, f64::NAN] {
        let err = CitationConfig::builder()
            .landscape_width_factor(f)
            .build()
            .unwrap_err();
        assert!(matches!(err, PhotociteError::InvalidConfig(_)), "factor {f}");
    }
}

// ── Citation source ──────────────────────────────────────────────────────────

#[test]
fn cite_file_beats_everything() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("ref.md");
    std::fs::write(&file, "Doe").unwrap();

    let src = select_citation_source(&CitationRequest {
        cite_file: Some(&file),
        first: Some("photo.jpg"),
        second: Some("inline"),
        stdin_piped: true,
        ..Default::default()
    })
    .unwrap();
    assert_eq!(src, CitationSource::File(file));
}

#[test]
fn missing_cite_file_is_reported_with_its_path() {
    let err = select_citation_source(&CitationRequest {
        cite_file: Some(Path::new("/no/such/ref.md")),
        second: Some("inline"),
        ..Default::default()
    })
    .unwrap_err();
    assert_eq!(err.to_string(), "Citation file '/no/such/ref.md' does not exist.");
}

#[test]
fn standard_mode_prefers_argument_over_stdin() {
    let src = select_citation_source(&CitationRequest {
        first: Some("photo.jpg"),
        second: Some("*Doe*, 2020"),
        stdin_piped: true,
        ..Default::default()
    })
    .unwrap();
    assert_eq!(src, CitationSource::Text("*Doe*, 2020".into()));
    assert_eq!(src.to_string(), "command line argument");
}

#[test]
fn citation_only_reads_file_or_text() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("note.md");
    std::fs::write(&file, "Doe").unwrap();
    let file_arg = file.to_str().unwrap();

    let src = select_citation_source(&CitationRequest {
        citation_only: true,
        first: Some(file_arg),
        ..Default::default()
    })
    .unwrap();
    assert_eq!(src, CitationSource::File(file.clone()));

    let src = select_citation_source(&CitationRequest {
        citation_only: true,
        first: Some("Just some text"),
        ..Default::default()
    })
    .unwrap();
    assert_eq!(src, CitationSource::Text("Just some text".into()));
}

#[test]
fn piped_stdin_then_nothing() {
    let src = select_citation_source(&CitationRequest {
        first: Some("photo.jpg"),
        stdin_piped: true,
        ..Default::default()
    })
    .unwrap();
    assert_eq!(src, CitationSource::Stdin);

    let err = select_citation_source(&CitationRequest {
        first: Some("photo.jpg"),
        ..Default::default()
    })
    .unwrap_err();
    assert!(matches!(err, PhotociteError::NoCitationText));
}

// ── Naming and reporting ─────────────────────────────────────────────────────

#[test]
fn default_names() {
    assert_eq!(
        default_composite_path(Path::new("trip/beach.jpeg")),
        PathBuf::from("trip/beach with citation.jpeg")
    );
    assert_eq!(
        default_citation_path(Some(Path::new("trip/beach.md"))),
        PathBuf::from("trip/beach citation.png")
    );
}

#[test]
fn report_serialises_to_json() {
    let config = CitationConfig::default();
    let info = photo(1000, 2500);
    let report = AnnotateOutput {
        output: PathBuf::from("out.jpg"),
        citation_source: "command line argument".into(),
        layout: Some(plan_layout(&info, &config)),
        image: Some(info),
        intermediates: None,
        stats: RunStats::default(),
    };

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["output"], "out.jpg");
    assert_eq!(json["layout"]["mode"], "side-by-side");
    assert_eq!(json["layout"]["citation_width"], 800);
    assert_eq!(json["image"]["quality"], 88);
    assert!(json["intermediates"].is_null());
}
