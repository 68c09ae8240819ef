//! Integration tests for the writer lifecycle across rotations.
//!
//! Time is driven through a [`ManualClock`], so each test steps across
//! boundaries instantly and deterministically.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, TimeDelta, TimeZone};
use rotalog::Clock;
use rotalog::clock::ManualClock;
use rotalog::{RotateInterval, RotatingWriter, StartupPolicy, WriterConfig};
use tempfile::tempdir;

fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Local> {
    Local.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
}

/// Lists archives of `path`, sorted by name (and therefore by time).
fn archives(path: &Path) -> Vec<PathBuf> {
    let prefix = format!("{}.", path.file_name().unwrap().to_string_lossy());
    let mut found: Vec<PathBuf> = fs::read_dir(path.parent().unwrap())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|p| {
            p.file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with(&prefix)
        })
        .collect();
    found.sort();
    found
}

#[test]
fn test_minute_rotation_scenario() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("logs").join("day.log");

    let start = local(2024, 1, 1, 12, 0, 0);
    let clock = ManualClock::new(start);
    let writer = RotatingWriter::with_clock(
        WriterConfig::new(&path, RotateInterval::PerMinute),
        clock.clone(),
    )
    .unwrap();

    // 130 writes, one per second, starting at 12:00:00.
    let mut expected = Vec::new();
    for i in 0..130 {
        let line = format!("{i}: {}\n", clock.now().format("%H:%M:%S"));
        writer.write(line.as_bytes()).unwrap();
        expected.extend_from_slice(line.as_bytes());
        clock.advance(TimeDelta::seconds(1));
    }

    // 12:01:00 and 12:02:00 are not "after" their boundaries; the writes at
    // 12:01:01 and 12:02:01 trigger the rotations.
    let found = archives(&path);
    let names: Vec<_> = found
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["day.log.20240101120101", "day.log.20240101120201"]);

    let first = fs::read_to_string(&found[0]).unwrap();
    assert_eq!(first.lines().count(), 61);
    assert!(first.starts_with("0: 12:00:00\n"));
    assert!(first.ends_with("60: 12:01:00\n"));

    let current = fs::read_to_string(&path).unwrap();
    assert!(current.starts_with("121: 12:02:01\n"));
    assert!(current.ends_with("129: 12:02:09\n"));

    // No bytes lost or reordered across rotations.
    let mut all = Vec::new();
    for archive in &found {
        all.extend(fs::read(archive).unwrap());
    }
    all.extend(fs::read(&path).unwrap());
    assert_eq!(all, expected);
}

#[test]
fn test_archive_suffix_falls_within_trigger_window() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("hourly.log");

    let clock = ManualClock::new(local(2024, 5, 10, 23, 59, 58));
    let writer = RotatingWriter::with_clock(
        WriterConfig::new(&path, RotateInterval::PerHour),
        clock.clone(),
    )
    .unwrap();
    writer.write(b"late\n").unwrap();

    let boundary = writer.next_rotation().unwrap();
    assert_eq!(boundary, local(2024, 5, 11, 0, 0, 0));

    clock.set(boundary + TimeDelta::milliseconds(400));
    writer.write(b"early\n").unwrap();

    let found = archives(&path);
    assert_eq!(found.len(), 1);
    let suffix = found[0].extension().unwrap().to_string_lossy().into_owned();
    assert_eq!(suffix.len(), 14);
    assert_eq!(suffix, boundary.format("%Y%m%d%H%M%S").to_string());
    assert_eq!(fs::read(&found[0]).unwrap(), b"late\n");
}

#[test]
fn test_daily_rotation_over_several_days() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("daily.log");

    let clock = ManualClock::new(local(2024, 2, 27, 10, 0, 0));
    let mut writer = RotatingWriter::with_clock(
        WriterConfig::new(&path, RotateInterval::PerDay),
        clock.clone(),
    )
    .unwrap();

    for day in 0..4 {
        writeln!(writer, "day {day} morning").unwrap();
        clock.advance(TimeDelta::hours(8));
        writeln!(writer, "day {day} evening").unwrap();
        clock.advance(TimeDelta::hours(16));
    }

    let names: Vec<_> = archives(&path)
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec![
            "daily.log.20240228100000",
            "daily.log.20240229100000",
            "daily.log.20240301100000",
        ]
    );
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "day 3 morning\nday 3 evening\n"
    );
}

#[test]
fn test_restart_with_lazy_policy_keeps_appending() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("app.log");

    let clock = ManualClock::new(local(2024, 1, 1, 12, 0, 0));
    {
        let writer = RotatingWriter::with_clock(
            WriterConfig::new(&path, RotateInterval::PerMinute),
            clock.clone(),
        )
        .unwrap();
        writer.write(b"run 1\n").unwrap();
        writer.close().unwrap();
    }

    // Restart well past the old boundary; the stale file is kept.
    clock.set(local(2024, 1, 1, 15, 0, 0));
    let writer = RotatingWriter::with_clock(
        WriterConfig::new(&path, RotateInterval::PerMinute),
        clock.clone(),
    )
    .unwrap();
    writer.write(b"run 2\n").unwrap();

    assert!(archives(&path).is_empty());
    assert_eq!(fs::read(&path).unwrap(), b"run 1\nrun 2\n");
}

#[test]
fn test_restart_with_catch_up_policy_archives_stale_file() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("app.log");
    fs::write(&path, b"run 1\n").unwrap();
    let modified: DateTime<Local> = fs::metadata(&path).unwrap().modified().unwrap().into();

    let clock = ManualClock::new(modified + TimeDelta::hours(3));
    let config =
        WriterConfig::new(&path, RotateInterval::PerMinute).with_startup(StartupPolicy::CatchUp);
    let writer = RotatingWriter::with_clock(config, clock).unwrap();
    writer.write(b"run 2\n").unwrap();

    let found = archives(&path);
    assert_eq!(found.len(), 1);
    assert_eq!(fs::read(&found[0]).unwrap(), b"run 1\n");
    assert_eq!(fs::read(&path).unwrap(), b"run 2\n");
}

#[test]
fn test_config_from_json() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("svc").join("out.log");

    let json = format!(
        r#"{{ "path": {}, "interval": "second" }}"#,
        serde_json::to_string(&path).unwrap()
    );
    let config: WriterConfig = serde_json::from_str(&json).unwrap();

    let writer = RotatingWriter::from_config(config).unwrap();
    assert_eq!(writer.interval(), RotateInterval::PerSecond);
    assert_eq!(writer.path(), path);

    writer.write(b"configured\n").unwrap();
    writer.flush().unwrap();
    assert_eq!(fs::read(&path).unwrap(), b"configured\n");
}

#[test]
fn test_system_clock_writer_smoke() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("smoke.log");

    let writer = RotatingWriter::open(&path, RotateInterval::PerDay).unwrap();
    for i in 0..10 {
        writer.write(format!("{i}\n").as_bytes()).unwrap();
    }
    let next = writer.next_rotation().unwrap();
    assert!(next > Local::now());

    let total: usize = archives(&path)
        .iter()
        .chain(std::iter::once(&path))
        .map(|p| fs::read(p).unwrap().len())
        .sum();
    assert_eq!(total, 20);
}
