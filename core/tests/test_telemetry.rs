#[cfg(test)]
mod telemetry_snapshot_tests {
    use std::time::Duration;

    use aes128_core::executor::{Backend, Direction};
    use aes128_core::telemetry::{Stage, StageTimes, TelemetryCounters, TelemetrySnapshot, TelemetryTimer};

    fn make_timer() -> TelemetryTimer {
        let mut timer = TelemetryTimer::new();
        std::thread::sleep(Duration::from_millis(20)); // ensure elapsed > stage times
        timer.add_stage_time(Stage::Segment, Duration::from_millis(2));
        timer.add_stage_time(Stage::Encrypt, Duration::from_millis(5));
        timer.finish();
        timer
    }

    #[test]
    fn stage_times_accumulate() {
        let mut times = StageTimes::default();
        times.add(Stage::Encrypt, Duration::from_millis(3));
        times.add(Stage::Encrypt, Duration::from_millis(4));
        assert_eq!(times.get(Stage::Encrypt), Duration::from_millis(7));
        assert_eq!(times.get(Stage::Decrypt), Duration::ZERO);
        assert!(!times.contains(Stage::Decrypt));
    }

    #[test]
    fn merge_and_total() {
        let mut a = StageTimes::default();
        a.add(Stage::Upload, Duration::from_millis(1));
        let mut b = StageTimes::default();
        b.add(Stage::Upload, Duration::from_millis(2));
        b.add(Stage::Readback, Duration::from_millis(3));
        a.merge(&b);
        assert_eq!(a.get(Stage::Upload), Duration::from_millis(3));
        assert_eq!(a.total(), Duration::from_millis(6));
        assert!(a.summary().starts_with("readback="));
    }

    #[test]
    fn counters_track_padding() {
        let enc = TelemetryCounters::for_encrypt(20, 2, 32);
        assert_eq!(enc.bytes_padding, 12);
        let dec = TelemetryCounters::for_decrypt(32, 2, 20);
        assert_eq!(dec.bytes_padding, 12);
    }

    #[test]
    fn snapshot_reports_throughput_and_passes_sanity() {
        let counters = TelemetryCounters::for_encrypt(1000, 63, 1008);
        let snap = TelemetrySnapshot::new(Backend::Sequential, Direction::Encrypt, 1, counters, &make_timer());
        assert!(snap.elapsed >= Duration::from_millis(20));
        assert!(snap.throughput_bytes_per_sec > 0.0);
        assert!(snap.sanity_check());
        assert!(snap.has_all_stages(&[Stage::Segment, Stage::Encrypt]));
        assert_eq!(snap.transform_time(), Duration::from_millis(5));
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let counters = TelemetryCounters::for_decrypt(48, 3, 40);
        let snap = TelemetrySnapshot::new(Backend::Accelerator, Direction::Decrypt, 1, counters, &make_timer());
        let json = snap.to_json().unwrap();
        assert!(json.contains("\"Accelerator\""));
        let back: TelemetrySnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.counters, snap.counters);
        assert_eq!(back.stage_times, snap.stage_times);
    }
}
