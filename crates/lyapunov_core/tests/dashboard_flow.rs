use lyapunov_core::poincare::{CrossingDirection, SectionConfig};
use lyapunov_core::regime::Regime;
use lyapunov_core::simulate::{Lorenz, SimulatedSource};
use lyapunov_core::{AnalysisSettings, Axes, LiveBuffer};
use serde_json::json;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn sine_batch(range: std::ops::Range<usize>) -> String {
    let samples: Vec<_> = range
        .map(|i| json!({ "ch1": 30.0 * (i as f64 / 10.0).sin(), "ch2": i as f64 }))
        .collect();
    json!({ "samples": samples }).to_string()
}

#[test]
fn sine_stream_yields_alternating_half_period_crossings() {
    init_logging();
    let settings = AnalysisSettings {
        section: SectionConfig {
            channel: "ch1".into(),
            value: 0.0,
            direction: CrossingDirection::Both,
            transient: 0,
        },
        lyapunov_channel: "ch1".into(),
        anomaly_channel: "ch1".into(),
        ..AnalysisSettings::default()
    };
    let mut live = LiveBuffer::new(settings, Axes::new("ch1", "ch2", "ch3"));

    // Delivered in uneven batches, as a socket would.
    for chunk in [0..7, 7..50, 50..51, 51..150] {
        let expected = chunk.len();
        assert_eq!(live.ingest_json(&sine_batch(chunk)), expected);
    }
    assert_eq!(live.len(), 150);

    let crossings = live.section();
    let indices: Vec<usize> = crossings.iter().map(|c| c.index).collect();
    assert_eq!(indices, vec![32, 63, 95, 126]);
    for pair in crossings.windows(2) {
        assert_ne!(pair[0].direction, pair[1].direction);
    }
    assert_eq!(crossings[0].direction, CrossingDirection::Negative);

    // Half a period of sin(i/10) is 10*pi samples.
    for (k, crossing) in crossings.iter().enumerate() {
        let expected = (k + 1) as f64 * 10.0 * std::f64::consts::PI;
        assert!((crossing.index as f64 - expected).abs() <= 1.0);
        assert!(crossing.sample.get("ch1").abs() < 3.0);
    }

    let snapshot = live.analyze();
    assert_eq!(snapshot.sample_count, 150);
    assert!(snapshot.lyapunov.is_some());
    assert_ne!(snapshot.classification.regime, Regime::Unknown);
}

#[test]
fn simulated_lorenz_drives_the_whole_pipeline() {
    init_logging();
    let mut settings = AnalysisSettings::default();
    settings.buffer_capacity = 500;
    let mut live = LiveBuffer::new(settings, Axes::default());
    let mut source = SimulatedSource::new(Lorenz::default(), [1.0, 1.0, 1.0], 0.01, 5)
        .expect("source")
        .limited(3000);

    assert_eq!(live.drain(&mut source), 3000);
    assert_eq!(live.render_window().len(), 500);

    let points = live.normalized_window();
    assert!(points
        .iter()
        .all(|p| p.iter().all(|v| (0.0..=1.0).contains(v))));

    let resampled = live.resampled_window([true; 3]);
    assert_eq!(resampled.points.len(), 499 * 4 + 1);
    assert!(resampled.index_map.iter().all(|&i| (2500..3000).contains(&i)));

    // The default section plane z = 27 cuts the attractor repeatedly.
    assert!(live.section().len() > 10);

    let snapshot = live.analyze();
    assert!(snapshot.lyapunov.is_some());
    assert!(live.history().len() > 100);

    live.reset();
    assert!(live.is_empty());
    assert!(live.analyze().generation > snapshot.generation);
}
