use std::path::PathBuf;
use std::time::{Duration, Instant};

use scanplot::config::ScanPolicy;
use scanplot::data::sample::{Sample, ScanLine};
use scanplot::data::scan_state::*;
use scanplot::persistence::LoadedScan;

fn line(x: i32, y: i32, z: f64) -> ScanLine {
    ScanLine {
        sample: Sample::new(x, y, z),
        name: None,
    }
}

fn named(x: i32, y: i32, z: f64, name: &str) -> ScanLine {
    ScanLine {
        sample: Sample::new(x, y, z),
        name: Some(name.to_string()),
    }
}

/// Row-by-row sweep of a `size`×`size` scan in `step` increments, without
/// the start and end corners.
fn raster(size: i32, step: i32) -> Vec<ScanLine> {
    let mut out = Vec::new();
    for y in (0..=size).step_by(step as usize) {
        for x in (0..=size).step_by(step as usize) {
            if (x, y) != (0, 0) && (x, y) != (size, size) {
                out.push(line(x, y, f64::from(x + y) * 1e-3));
            }
        }
    }
    out
}

fn feed(c: &mut ScanStateController, lines: Vec<ScanLine>, now: Instant) {
    for l in lines {
        c.on_line(l, now);
    }
}

/// Start marker plus a full sweep, stopping short of the end corner.
fn scan_until_corner(c: &mut ScanStateController, size: i32, step: i32, now: Instant) -> usize {
    c.on_line(line(0, 0, 0.0), now);
    let body = raster(size, step);
    let n = body.len();
    feed(c, body, now);
    n
}

fn loaded_scan() -> LoadedScan {
    LoadedScan::from_samples(
        "plate_3".to_string(),
        PathBuf::from("raw_plate_3.csv"),
        vec![Sample::new(0, 0, 0.1), Sample::new(50, 50, 0.2)],
        5,
    )
}

#[test]
fn start_marker_activates_and_disables_controls() {
    let mut c = ScanStateController::new(ScanPolicy::default());
    assert_eq!(c.state(), ScanState::Idle);
    assert!(c.availability().load_raw && c.availability().resume_live);

    c.on_line(named(0, 0, 0.0, "plate_1"), Instant::now());
    assert_eq!(c.state(), ScanState::Active);
    assert_eq!(c.availability(), ButtonAvailability { load_raw: false, resume_live: false });
    assert_eq!(c.scan_name(), Some("plate_1"));
    assert!(c.buffer().is_empty());
    assert_eq!(
        c.take_outcomes(),
        vec![ScanOutcome::Started { name: "plate_1".to_string() }]
    );
}

#[test]
fn start_marker_without_name_gets_timestamp_name() {
    let mut c = ScanStateController::new(ScanPolicy::default());
    c.on_line(line(0, 0, 0.0), Instant::now());
    let name = c.scan_name().unwrap();
    assert_eq!(name.len(), "20240101_120000".len());
    assert_eq!(name.as_bytes()[8], b'_');
    assert!(name.chars().filter(|ch| *ch != '_').all(|ch| ch.is_ascii_digit()));
}

#[test]
fn back_to_back_scans_get_distinct_names() {
    let mut c = ScanStateController::new(ScanPolicy::default());
    let t = Instant::now();
    c.on_line(line(0, 0, 0.0), t);
    let first = c.scan_name().unwrap().to_string();
    c.on_line(line(0, 0, 0.0), t);
    let second = c.scan_name().unwrap().to_string();
    c.on_line(line(0, 0, 0.0), t);
    let third = c.scan_name().unwrap().to_string();
    assert_ne!(first, second);
    assert_ne!(second, third);
    assert_ne!(first, third);
}

#[test]
fn later_scanner_name_replaces_timestamp_name() {
    let mut c = ScanStateController::new(ScanPolicy::default());
    let t = Instant::now();
    c.on_line(line(0, 0, 0.0), t);
    c.on_line(named(1, 0, 0.0, "plate_9"), t);
    assert_eq!(c.scan_name(), Some("plate_9"));
    c.on_line(named(2, 0, 0.0, "other"), t);
    assert_eq!(c.scan_name(), Some("plate_9"));
}

#[test]
fn end_marker_completes_scan_and_enables_controls() {
    let mut c = ScanStateController::new(ScanPolicy::default());
    let t = Instant::now();
    c.on_line(named(0, 0, 0.0, "s1"), t);
    let body = raster(100, 10);
    let n = body.len();
    feed(&mut c, body, t);
    // Diagonal points crossed mid-sweep are not the end corner.
    assert_eq!(c.state(), ScanState::Active);
    c.on_line(line(100, 100, 0.03), t);

    assert_eq!(c.state(), ScanState::Idle);
    assert!(c.availability().load_raw && c.availability().resume_live);
    let outcomes = c.take_outcomes();
    let Some(ScanOutcome::Completed(scan)) = outcomes.last() else {
        panic!("expected completion, got {outcomes:?}");
    };
    assert_eq!(scan.name, "s1");
    assert_eq!(scan.samples.len(), n + 1);
    assert_eq!(scan.samples.last(), Some(&Sample::new(100, 100, 0.03)));
    // The finished scan stays on screen.
    assert_eq!(c.buffer().len(), n + 1);
    assert_eq!(c.extent(), 100);
}

#[test]
fn smallest_scan_completes_and_sets_extent() {
    let mut c = ScanStateController::new(ScanPolicy::default());
    let t = Instant::now();
    scan_until_corner(&mut c, 50, 5, t);
    assert_eq!(c.state(), ScanState::Active);
    c.on_line(line(50, 50, 0.0), t);

    assert_eq!(c.state(), ScanState::Idle);
    assert!(c.availability().load_raw);
    assert_eq!(c.extent(), 50);
    assert!(matches!(c.take_outcomes().last(), Some(ScanOutcome::Completed(_))));
}

#[test]
fn end_marker_tolerates_rounding() {
    let mut c = ScanStateController::new(ScanPolicy::default());
    let t = Instant::now();
    scan_until_corner(&mut c, 100, 10, t);
    c.on_line(line(99, 100, 0.0), t);
    assert_eq!(c.state(), ScanState::Idle);
    assert_eq!(c.extent(), 99);
}

#[test]
fn large_scan_ends_at_its_own_corner() {
    let mut c = ScanStateController::new(ScanPolicy::default());
    let t = Instant::now();
    scan_until_corner(&mut c, 150, 15, t);
    c.on_line(line(100, 100, 0.0), t);
    assert_eq!(c.state(), ScanState::Active);
    c.on_line(line(150, 150, 0.0), t);
    assert_eq!(c.state(), ScanState::Idle);
    assert_eq!(c.extent(), 150);
}

#[test]
fn early_diagonal_point_does_not_end_scan() {
    let mut c = ScanStateController::new(ScanPolicy::default());
    let t = Instant::now();
    c.on_line(line(0, 0, 0.0), t);
    c.on_line(line(50, 50, 0.0), t);
    assert_eq!(c.state(), ScanState::Active);
}

#[test]
fn corner_outside_accepted_sizes_does_not_end_scan() {
    let mut c = ScanStateController::new(ScanPolicy::default());
    let t = Instant::now();
    scan_until_corner(&mut c, 40, 2, t);
    c.on_line(line(40, 40, 0.0), t);
    assert_eq!(c.state(), ScanState::Active);
}

#[test]
fn samples_after_completion_are_ignored() {
    let mut c = ScanStateController::new(ScanPolicy::default());
    let t = Instant::now();
    c.on_line(named(0, 0, 0.0, "done"), t);
    feed(&mut c, raster(100, 10), t);
    c.on_line(line(100, 100, 0.0), t);
    let finished = c.buffer().len();
    c.take_outcomes();

    // A repeated corner reading and a stray sample after the scan ended.
    c.on_line(line(99, 100, 0.0), t);
    c.on_line(line(5, 5, 0.0), t);

    assert_eq!(c.state(), ScanState::Idle);
    assert!(c.availability().load_raw && c.availability().resume_live);
    assert_eq!(c.scan_name(), Some("done"));
    assert_eq!(c.buffer().len(), finished);
    assert!(c.take_outcomes().is_empty());

    c.check_timeout(t + Duration::from_secs(60));
    assert!(c.take_outcomes().is_empty());
}

#[test]
fn samples_before_any_start_marker_are_ignored() {
    let mut c = ScanStateController::new(ScanPolicy::default());
    c.on_line(named(3, 4, 0.2, "late"), Instant::now());
    assert_eq!(c.state(), ScanState::Idle);
    assert_eq!(c.scan_name(), None);
    assert!(c.buffer().is_empty());
    assert!(c.take_outcomes().is_empty());
}

#[test]
fn finished_scan_is_reported_until_outcomes_are_taken() {
    let mut c = ScanStateController::new(ScanPolicy::default());
    let t = Instant::now();
    scan_until_corner(&mut c, 50, 5, t);
    assert!(!c.has_finished_scan());
    c.on_line(line(50, 50, 0.0), t);
    assert!(c.has_finished_scan());
    c.take_outcomes();
    assert!(!c.has_finished_scan());
}

#[test]
fn link_error_during_scan_aborts_and_enables_controls() {
    let mut c = ScanStateController::new(ScanPolicy::default());
    let t = Instant::now();
    c.on_line(named(0, 0, 0.0, "s2"), t);
    c.on_line(line(5, 5, 0.1), t);
    c.take_outcomes();

    c.on_link_error("port vanished");
    assert_eq!(c.state(), ScanState::Idle);
    assert!(c.availability().load_raw);
    match c.take_outcomes().as_slice() {
        [ScanOutcome::Aborted { scan, reason }] => {
            assert_eq!(scan.name, "s2");
            assert_eq!(scan.samples.len(), 1);
            assert_eq!(reason, "port vanished");
        }
        other => panic!("unexpected outcomes {other:?}"),
    }
}

#[test]
fn link_error_while_idle_is_ignored() {
    let mut c = ScanStateController::new(ScanPolicy::default());
    c.on_link_error("no port");
    assert_eq!(c.state(), ScanState::Idle);
    assert!(c.take_outcomes().is_empty());
}

#[test]
fn silence_longer_than_timeout_aborts() {
    let mut c = ScanStateController::new(ScanPolicy::default());
    let t0 = Instant::now();
    c.on_line(line(0, 0, 0.0), t0);
    c.on_line(line(1, 2, 0.0), t0);

    c.check_timeout(t0 + Duration::from_millis(4_999));
    assert_eq!(c.state(), ScanState::Active);

    c.check_timeout(t0 + Duration::from_secs(5));
    assert_eq!(c.state(), ScanState::Idle);
    assert!(matches!(c.take_outcomes().last(), Some(ScanOutcome::Aborted { .. })));
}

#[test]
fn new_start_marker_aborts_running_scan() {
    let mut c = ScanStateController::new(ScanPolicy::default());
    let t = Instant::now();
    c.on_line(named(0, 0, 0.0, "first"), t);
    c.on_line(line(3, 4, 0.0), t);
    c.on_line(named(0, 0, 0.0, "second"), t);

    assert_eq!(c.state(), ScanState::Active);
    assert_eq!(c.scan_name(), Some("second"));
    assert!(c.buffer().is_empty());
    let outcomes = c.take_outcomes();
    assert!(matches!(&outcomes[1], ScanOutcome::Aborted { scan, .. } if scan.name == "first"));
    assert!(matches!(&outcomes[2], ScanOutcome::Started { name } if name == "second"));
}

#[test]
fn resume_live_clears_everything() {
    let mut c = ScanStateController::new(ScanPolicy::default());
    let t = Instant::now();
    scan_until_corner(&mut c, 150, 15, t);
    c.on_line(line(150, 150, 0.0), t);
    assert_eq!(c.state(), ScanState::Idle);
    c.take_outcomes();

    c.resume_live();
    assert_eq!(c.state(), ScanState::Idle);
    assert!(c.buffer().is_empty());
    assert_eq!(c.scan_name(), None);
    assert_eq!(c.extent(), 100);
    assert_eq!(c.take_outcomes(), vec![ScanOutcome::ResumedLive]);
    assert!(c.take_redraw());
    assert!(!c.take_redraw());
}

#[test]
fn load_raw_pauses_live_view() {
    let mut c = ScanStateController::new(ScanPolicy::default());
    assert!(c.load_raw(loaded_scan()));
    assert_eq!(c.state(), ScanState::Paused);
    assert!(c.is_live_paused());
    assert!(c.availability().resume_live);
    match c.display_source() {
        DisplaySource::Loaded(scan) => assert_eq!(scan.name, "plate_3"),
        DisplaySource::Live { .. } => panic!("expected loaded scan on display"),
    }
}

#[test]
fn load_raw_is_refused_during_scan() {
    let mut c = ScanStateController::new(ScanPolicy::default());
    c.on_line(line(0, 0, 0.0), Instant::now());
    assert!(!c.load_raw(loaded_scan()));
    assert_eq!(c.state(), ScanState::Active);
    assert!(c.loaded().is_none());
}

#[test]
fn stray_sample_while_paused_keeps_loaded_scan() {
    let mut c = ScanStateController::new(ScanPolicy::default());
    c.load_raw(loaded_scan());
    c.take_outcomes();

    c.on_line(line(7, 8, 0.0), Instant::now());
    assert_eq!(c.state(), ScanState::Paused);
    assert!(c.loaded().is_some());
    assert!(c.take_outcomes().is_empty());
}

#[test]
fn start_marker_while_paused_resumes_live() {
    let mut c = ScanStateController::new(ScanPolicy::default());
    c.load_raw(loaded_scan());
    c.take_outcomes();

    c.on_line(line(0, 0, 0.0), Instant::now());
    assert_eq!(c.state(), ScanState::Active);
    assert!(c.loaded().is_none());
    let outcomes = c.take_outcomes();
    assert_eq!(outcomes[0], ScanOutcome::ResumedLive);
    assert!(matches!(outcomes[1], ScanOutcome::Started { .. }));
    assert!(matches!(c.display_source(), DisplaySource::Live { extent: 100, .. }));
}
