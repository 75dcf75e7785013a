use super::*;

#[test]
fn test_box_stats_with_outlier() {
    let values = [1.0, 2.0, 3.0, 4.0, 5.0, 100.0];
    let stats = box_stats(&values).unwrap();
    assert_eq!(stats.median, 3.5);
    assert_eq!(stats.q1, 2.25);
    assert_eq!(stats.q3, 4.75);
    assert_eq!(stats.whisker_low, 1.0);
    assert_eq!(stats.whisker_high, 5.0);
    assert_eq!(stats.outliers, vec![100.0]);
}

#[test]
fn test_box_stats_single_value() {
    let stats = box_stats(&[0.4]).unwrap();
    assert_eq!(stats.q1, 0.4);
    assert_eq!(stats.whisker_high, 0.4);
    assert!(stats.outliers.is_empty());
    assert!(box_stats(&[]).is_none());
}

#[test]
fn test_kde_integrates_to_about_one() {
    let values = [0.2, 0.3, 0.35, 0.5, 0.8];
    let density = kde(&values, 200);
    assert_eq!(density.len(), 200);
    let step = density[1].0 - density[0].0;
    let area = density.iter().map(|(_, d)| d * step).sum::<f64>();
    assert!((area - 1.0).abs() < 0.1, "area {area}");
    assert!(density.iter().all(|(_, d)| *d >= 0.0));
}

#[test]
fn test_kde_constant_values() {
    let density = kde(&[0.5, 0.5, 0.5], 11);
    assert_eq!(density.len(), 11);
    let peak = density
        .iter()
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(y, _)| *y)
        .unwrap();
    assert!((peak - 0.5).abs() < 1e-9);
}

#[test]
fn test_histogram_bins() {
    let edges = (1..=11).map(f64::from).collect::<Vec<_>>();
    let counts = histogram(&[1.0, 1.0, 5.0, 10.0, 11.0, 12.0, 0.0], &edges);
    assert_eq!(counts.len(), 10);
    assert_eq!(counts[0], 2);
    assert_eq!(counts[4], 1);
    // 10 and the closing edge 11 share the last bin
    assert_eq!(counts[9], 2);
    assert_eq!(counts.iter().sum::<u64>(), 5);
}

#[test]
fn test_padded_range() {
    let (lo, hi) = padded_range([0.0, 1.0]);
    assert!((lo + 0.05).abs() < 1e-12);
    assert!((hi - 1.05).abs() < 1e-12);
    assert_eq!(padded_range([2.0, 2.0]), (1.5, 2.5));
    assert_eq!(padded_range(std::iter::empty()), (0.0, 1.0));
}
