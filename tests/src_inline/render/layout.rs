use super::*;

fn point(x: &str, hue: Option<&str>) -> Point {
    Point {
        x: x.to_string(),
        y: 0.5,
        hue: hue.map(str::to_string),
        size: None,
        offset: None,
    }
}

fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_axis_data_order_without_request() {
    let points = vec![point("b", None), point("a", None), point("b", None)];
    assert_eq!(x_axis(&points, None).categories, names(&["b", "a"]));
}

#[test]
fn test_axis_request_first_then_unlisted() {
    let points = vec![point("b", None), point("c", None), point("a", None)];
    let axis = x_axis(&points, Some(&names(&["a", "missing", "b"])));
    assert_eq!(axis.categories, names(&["a", "b", "c"]));
    assert_eq!(axis.index_of("c"), Some(2));
    assert_eq!(axis.index_of("missing"), None);
}

#[test]
fn test_hue_axis_skips_points_without_hue() {
    let points = vec![point("a", Some("gpt")), point("a", None), point("b", Some("llama-3"))];
    let axis = hue_axis(&points, Some(&names(&["llama-3"])));
    assert_eq!(axis.categories, names(&["llama-3", "gpt"]));
    assert!(size_axis(&points, None).is_empty());
}

#[test]
fn test_dodge_offsets_are_symmetric() {
    assert_eq!(dodge_offset(0, 1), 0.0);
    assert!((dodge_offset(0, 2) + 0.2).abs() < 1e-12);
    assert!((dodge_offset(1, 2) - 0.2).abs() < 1e-12);
    let sum = (0..4).map(|s| dodge_offset(s, 4)).sum::<f64>();
    assert!(sum.abs() < 1e-12);
    assert!((slot_width(4) - 0.2).abs() < 1e-12);
}

#[test]
fn test_jitter_is_deterministic_and_bounded() {
    let a = jitter("gpt-4|4-bit", 0.2);
    assert_eq!(a, jitter("gpt-4|4-bit", 0.2));
    assert_ne!(a, jitter("gpt-4|8-bit", 0.2));
    for i in 0..100 {
        let j = jitter(&format!("key{i}"), 0.2);
        assert!((-0.2..=0.2).contains(&j));
    }
    assert_eq!(jitter("any", 0.0), 0.0);
}

#[test]
fn test_marker_radius_shrinks_along_size_order() {
    let radii = (0..5).map(|s| marker_radius(Some(s), 5)).collect::<Vec<_>>();
    assert_eq!(radii[0], 10);
    assert_eq!(radii[4], 2);
    assert!(radii.windows(2).all(|w| w[0] >= w[1]));
    assert_eq!(marker_radius(None, 5), 4);
}
