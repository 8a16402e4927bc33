use paystub_core::*;

fn assert_covers(pages: &[PageDescriptor], source_height: u32) {
    let mut expected_offset = 0;
    for (index, page) in pages.iter().enumerate() {
        assert_eq!(page.page_index, index);
        assert_eq!(page.source_offset, expected_offset, "gap or overlap at page {index}");
        assert!(page.slice_height >= 1);
        expected_offset = page.source_end();
    }
    assert_eq!(expected_offset, source_height);
}

#[test]
fn test_boundary_is_not_fast_path() {
    // 1400 × 600 / 1000 = 840 > 800
    let pages = paginate(1000, 1400, 600.0, 800.0).unwrap();
    assert!(pages.len() > 1);

    // 600 × 600 / 1000 = 360 <= 800
    let pages = paginate(1000, 600, 600.0, 800.0).unwrap();
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].source_offset, 0);
    assert_eq!(pages[0].slice_height, 600);
}

#[test]
fn test_coverage_and_page_count_across_inputs() {
    let page_sizes = [(595.28_f32, 841.89_f32), (612.0, 792.0), (100.0, 37.5), (1.0, 1.0)];
    let sources = [(1, 1), (1, 5000), (1190, 1684), (1190, 9999), (3000, 200), (7, 123_457)];

    for &(page_width, page_height) in &page_sizes {
        for &(source_width, source_height) in &sources {
            let pages = paginate(source_width, source_height, page_width, page_height).unwrap();
            let stats =
                pagination_statistics(source_width, source_height, page_width, page_height).unwrap();

            assert_covers(&pages, source_height);
            assert_eq!(pages.len(), stats.page_count);
            assert_eq!(
                stats.page_count,
                source_height.div_ceil(stats.slice_height_px) as usize
            );
            assert_eq!(pages.last().unwrap().slice_height, stats.last_slice_height);
        }
    }
}

#[test]
fn test_offsets_strictly_increase() {
    let pages = paginate(1190, 20_000, 595.28, 841.89).unwrap();
    assert!(pages.windows(2).all(|w| w[0].source_offset < w[1].source_offset));
}

#[test]
fn test_scale_is_uniform_across_pages() {
    let pages = paginate(1190, 5000, 595.28, 841.89).unwrap();
    let scale = 595.28_f64 / 1190.0;

    for page in &pages {
        assert_eq!(page.target_width, 595.28);
        let expected = page.slice_height as f64 * scale;
        assert!((page.target_height as f64 - expected).abs() < 1e-3);
        assert!(page.target_height <= 841.89 + 1e-3);
    }
}

#[test]
fn test_page_shorter_than_one_row_terminates() {
    // Scale 100: one source row is 100pt tall, the page only 50pt
    let pages = paginate(10, 1000, 1000.0, 50.0).unwrap();
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].slice_height, 1000);

    let stats = pagination_statistics(10, 1000, 1000.0, 50.0).unwrap();
    assert!(stats.single_page);
}

#[test]
fn test_each_dimension_is_validated() {
    let cases = [
        (0, 100, 600.0, 800.0),
        (100, 0, 600.0, 800.0),
        (100, 100, 0.0, 800.0),
        (100, 100, 600.0, 0.0),
        (100, 100, -600.0, 800.0),
        (100, 100, 600.0, -1.0),
        (100, 100, f32::NAN, 800.0),
        (100, 100, 600.0, f32::INFINITY),
    ];

    for (sw, sh, pw, ph) in cases {
        assert!(
            matches!(paginate(sw, sh, pw, ph), Err(StubError::InvalidDimensions { .. })),
            "expected InvalidDimensions for {sw}x{sh} on {pw}x{ph}"
        );
        assert!(pagination_statistics(sw, sh, pw, ph).is_err());
    }
}

#[test]
fn test_pagination_is_replayable() {
    let first = paginate(1190, 4321, 595.28, 841.89).unwrap();
    let second = paginate(1190, 4321, 595.28, 841.89).unwrap();
    assert_eq!(first, second);
}
