use super::*;

fn point(x: &str, y: f64, hue: Option<&str>) -> Point {
    Point {
        x: x.to_string(),
        y,
        hue: hue.map(str::to_string),
        size: None,
        offset: None,
    }
}

#[test]
fn test_layout_dodges_hue_slots() {
    let points = vec![
        point("t1", 0.1, Some("gpt")),
        point("t1", 0.3, Some("llama-3")),
        point("t2", 0.5, Some("gpt")),
    ];
    let spec = ChartSpec::new("c", ChartKind::Box, "task", "accuracy").hue("family");
    let layout = Layout::new(&spec, &points);
    assert_eq!(layout.slots(), 2);
    assert_eq!(layout.slot(&points[1]), 1);
    assert!((layout.center(0, 0) + 0.2).abs() < 1e-12);
    assert!((layout.center(1, 1) - 1.2).abs() < 1e-12);
}

#[test]
fn test_layout_without_dodge_uses_one_slot() {
    let points = vec![point("a", 0.1, Some("a")), point("b", 0.3, Some("b"))];
    let spec = ChartSpec::new("c", ChartKind::Box, "task", "accuracy").hue("task");
    let layout = Layout::new(&spec, &points);
    assert_eq!(layout.slots(), 1);
    assert_eq!(layout.slot(&points[1]), 0);
    assert_eq!(layout.center(1, 0), 1.0);
}

#[test]
fn test_groups_follow_axis_and_slot() {
    let points = vec![
        point("t2", 0.5, Some("gpt")),
        point("t1", 0.1, Some("gpt")),
        point("t1", 0.3, Some("gpt")),
    ];
    let spec = ChartSpec::new("c", ChartKind::Box, "task", "accuracy")
        .hue("family")
        .x_order(vec!["t1".to_string(), "t2".to_string()]);
    let layout = Layout::new(&spec, &points);
    let g = groups(&layout, &points);
    let keys = g.keys().copied().collect::<Vec<_>>();
    assert_eq!(keys, vec![(0, 0), (1, 0)]);
    assert_eq!(g[&(0, 0)].1, vec![0.1, 0.3]);
}

#[test]
fn test_category_means_in_axis_order() {
    let points = vec![
        point("b", 1.0, None),
        point("a", 0.2, None),
        point("a", 0.4, None),
    ];
    let spec = ChartSpec::new("c", ChartKind::Line, "x", "y").x_order(vec!["a".to_string()]);
    let layout = Layout::new(&spec, &points);
    let means = category_means(&layout, &points);
    assert_eq!(means.len(), 2);
    assert_eq!(means[0].0, 0.0);
    assert!((means[0].1 - 0.3).abs() < 1e-12);
    assert_eq!(means[1], (1.0, 1.0));
}
