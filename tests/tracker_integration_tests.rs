//! Integration tests for OutputTracker
//!
//! These tests verify:
//! - Subscription reconciliation against the host's outputs
//! - File set accumulation from `file_changed` signals
//! - Stop and replay-saved signals queue renames onto the UI thread
//! - Hook context updates from capture sources
//! - Concurrent signals from several output threads

mod common;

use camino::Utf8PathBuf;
use common::{FakeHost, IdentityExpander, ScriptedPrompt, file_names, touch, utf8_dir};
use record_rename::host::{
    ChannelUiQueue, Host, NamePrompt, OutputEvents, OutputKind, OutputSignal, UiQueue,
    UiTaskReceiver,
};
use record_rename::metrics::Metrics;
use record_rename::models::{HookContext, RenameConfig};
use record_rename::services::{OutputTracker, PatternFormatter, RenameOrchestrator};
use record_rename::state::StateManager;
use std::fs;
use std::sync::{Arc, Barrier};
use std::thread;
use tempfile::TempDir;

struct Fixture {
    _temp: TempDir,
    dir: Utf8PathBuf,
    host: Arc<FakeHost>,
    state: StateManager,
    tracker: Arc<OutputTracker>,
    ui: UiTaskReceiver,
}

fn fixture(config: RenameConfig) -> Fixture {
    let temp = TempDir::new().unwrap();
    let dir = utf8_dir(&temp);
    let host = FakeHost::new();
    let state = StateManager::new();
    state.load_from_config(&config);
    let (ui_queue, ui) = ChannelUiQueue::new();

    let orchestrator = Arc::new(RenameOrchestrator::new(
        state.clone(),
        Arc::clone(&host) as Arc<dyn Host>,
        PatternFormatter::new(Arc::new(IdentityExpander)),
        ScriptedPrompt::new(&[]) as Arc<dyn NamePrompt>,
        None,
        Arc::new(Metrics::new()),
    ));

    let tracker = Arc::new(OutputTracker::new(
        Arc::clone(&host) as Arc<dyn Host>,
        state.clone(),
        Arc::new(ui_queue) as Arc<dyn UiQueue>,
        orchestrator,
    ));

    Fixture {
        _temp: temp,
        dir,
        host,
        state,
        tracker,
        ui,
    }
}

fn renaming_to(format: &str) -> RenameConfig {
    RenameConfig {
        prompt_user: false,
        filename_format: format.to_string(),
        ..RenameConfig::default()
    }
}

#[test]
fn test_refresh_subscribes_by_output_kind() {
    let f = fixture(renaming_to("X"));
    let rec = f.host.add_output(1, OutputKind::Recording);
    let replay = f.host.add_output(2, OutputKind::ReplayBuffer);

    assert_eq!(f.tracker.refresh(), 2);

    assert!(f.host.is_connected(rec, OutputSignal::Stop));
    assert!(f.host.is_connected(rec, OutputSignal::FileChanged));
    assert!(!f.host.is_connected(rec, OutputSignal::Saved));
    assert!(f.host.is_connected(replay, OutputSignal::Saved));
    assert!(!f.host.is_connected(replay, OutputSignal::Stop));
}

#[test]
fn test_refresh_is_idempotent() {
    let f = fixture(renaming_to("X"));
    f.host.add_output(1, OutputKind::Recording);

    assert_eq!(f.tracker.refresh(), 1);
    assert_eq!(f.tracker.refresh(), 0);
    assert_eq!(f.tracker.subscribed_count(), 1);
    assert_eq!(f.host.connection_count(), 2);
}

#[test]
fn test_refresh_picks_up_new_and_drops_vanished_outputs() {
    let f = fixture(renaming_to("X"));
    let first = f.host.add_output(1, OutputKind::Recording);
    f.tracker.refresh();

    let second = f.host.add_output(2, OutputKind::ReplayBuffer);
    f.host.remove_output(first);
    assert_eq!(f.tracker.refresh(), 1);

    assert!(!f.tracker.is_subscribed(first));
    assert!(f.tracker.is_subscribed(second));
    assert!(!f.host.is_connected(first, OutputSignal::Stop));
}

#[test]
fn test_refused_output_is_not_tracked() {
    let f = fixture(renaming_to("X"));
    let out = f.host.add_output(1, OutputKind::Recording);
    f.host.refuse(out);

    assert_eq!(f.tracker.refresh(), 0);
    assert!(!f.tracker.is_subscribed(out));
    assert_eq!(f.host.connection_count(), 0);
}

#[test]
fn test_teardown_disconnects_everything() {
    let f = fixture(renaming_to("X"));
    f.host.add_output(1, OutputKind::Recording);
    f.host.add_output(2, OutputKind::ReplayBuffer);
    f.tracker.refresh();

    f.tracker.teardown();

    assert_eq!(f.tracker.subscribed_count(), 0);
    assert_eq!(f.host.connection_count(), 0);
}

#[test]
fn test_refresh_after_teardown_connects_nothing() {
    let f = fixture(renaming_to("X"));
    f.host.add_output(1, OutputKind::Recording);
    f.tracker.refresh();
    f.tracker.teardown();

    f.host.add_output(2, OutputKind::ReplayBuffer);

    assert_eq!(f.tracker.refresh(), 0);
    assert!(f.tracker.is_torn_down());
    assert_eq!(f.tracker.subscribed_count(), 0);
    assert_eq!(f.host.connection_count(), 0);
}

#[test]
fn test_split_recording_scenario() {
    let mut f = fixture(renaming_to("Run"));
    let out = f.host.add_output(1, OutputKind::Recording);
    let initial = touch(&f.dir, "initial.mkv");
    let seg1 = touch(&f.dir, "seg1.mkv");
    let seg2 = touch(&f.dir, "seg2.mkv");
    f.host.set_setting(out, "path", initial.as_str());
    f.tracker.refresh();

    f.host.fire_file_changed(out, &seg1);
    assert_eq!(f.tracker.pending_files(out), vec![initial.clone(), seg1.clone()]);

    f.host.fire_file_changed(out, &seg2);
    assert_eq!(
        f.tracker.pending_files(out),
        vec![initial.clone(), seg1.clone(), seg2.clone()]
    );

    f.host.fire_stop(out);
    assert!(f.tracker.pending_files(out).is_empty());
    assert_eq!(
        file_names(&f.dir),
        vec!["initial.mkv", "seg1.mkv", "seg2.mkv"],
        "nothing is renamed before the UI thread runs"
    );

    assert_eq!(f.ui.run_pending(), 1);
    assert_eq!(
        file_names(&f.dir),
        vec!["Run (1).mkv", "Run (2).mkv", "Run (3).mkv"]
    );
    assert_eq!(
        std::fs::read_to_string(f.dir.join("Run (1).mkv")).unwrap(),
        "initial.mkv"
    );
}

#[test]
fn test_missing_configured_path_is_not_seeded() {
    let f = fixture(renaming_to("Run"));
    let out = f.host.add_output(1, OutputKind::Recording);
    f.host
        .set_setting(out, "path", f.dir.join("never-written.mkv").as_str());
    let seg1 = touch(&f.dir, "seg1.mkv");

    f.tracker.record_segment(out, seg1.as_str());

    assert_eq!(f.tracker.pending_files(out), vec![seg1]);
}

#[test]
fn test_url_used_when_path_empty() {
    let f = fixture(renaming_to("Run"));
    let out = f.host.add_output(1, OutputKind::Recording);
    let initial = touch(&f.dir, "stream.flv");
    f.host.set_setting(out, "path", "");
    f.host.set_setting(out, "url", initial.as_str());
    let seg1 = touch(&f.dir, "seg1.flv");

    f.tracker.record_segment(out, seg1.as_str());

    assert_eq!(f.tracker.pending_files(out), vec![initial, seg1]);
}

#[test]
fn test_empty_and_duplicate_segments_ignored() {
    let f = fixture(renaming_to("Run"));
    let out = f.host.add_output(1, OutputKind::Recording);
    let seg1 = touch(&f.dir, "seg1.mkv");

    f.tracker.record_segment(out, seg1.as_str());
    f.tracker.record_segment(out, "");
    f.tracker.record_segment(out, seg1.as_str());

    assert_eq!(f.tracker.pending_files(out), vec![seg1]);
}

#[test]
fn test_stop_without_segments_renames_configured_path() {
    let mut f = fixture(renaming_to("Clip"));
    let out = f.host.add_output(1, OutputKind::Recording);
    let rec = touch(&f.dir, "rec.mkv");
    f.host.set_setting(out, "path", rec.as_str());
    f.tracker.refresh();

    f.host.fire_stop(out);
    f.ui.run_pending();

    assert_eq!(file_names(&f.dir), vec!["Clip.mkv"]);
}

#[test]
fn test_record_rename_off_ignores_signals() {
    let mut f = fixture(RenameConfig {
        rename_on_record_stop: false,
        ..renaming_to("Clip")
    });
    let out = f.host.add_output(1, OutputKind::Recording);
    let rec = touch(&f.dir, "rec.mkv");
    let seg1 = touch(&f.dir, "seg1.mkv");
    f.host.set_setting(out, "path", rec.as_str());
    f.tracker.refresh();

    f.host.fire_file_changed(out, &seg1);
    assert!(f.tracker.pending_files(out).is_empty());

    f.host.fire_stop(out);
    assert_eq!(f.ui.run_pending(), 0);
    assert_eq!(file_names(&f.dir), vec!["rec.mkv", "seg1.mkv"]);
}

#[test]
fn test_disabling_record_rename_drops_pending_set() {
    let mut f = fixture(renaming_to("Clip"));
    let out = f.host.add_output(1, OutputKind::Recording);
    let seg1 = touch(&f.dir, "seg1.mkv");
    f.tracker.refresh();

    f.host.fire_file_changed(out, &seg1);
    f.state
        .update_settings(|c| c.rename_on_record_stop = false);
    f.host.fire_stop(out);

    assert!(f.tracker.pending_files(out).is_empty());
    assert_eq!(f.ui.run_pending(), 0);
}

#[test]
fn test_replay_saved_renames_last_replay() {
    let mut f = fixture(renaming_to("Replay %TITLE"));
    let out = f.host.add_output(7, OutputKind::ReplayBuffer);
    let clip = touch(&f.dir, "Replay 2024-03-09.mkv");
    f.host.set_last_replay(out, &clip);
    f.state.set_hook_context(HookContext {
        title: "Celeste".to_string(),
        ..HookContext::default()
    });
    f.tracker.refresh();

    f.host.fire_saved(out);
    f.ui.run_pending();

    assert_eq!(file_names(&f.dir), vec!["Replay Celeste.mkv"]);
}

#[test]
fn test_replay_rename_off_ignores_saves() {
    let mut f = fixture(RenameConfig {
        rename_on_replay_save: false,
        ..renaming_to("Clip")
    });
    let out = f.host.add_output(7, OutputKind::ReplayBuffer);
    let clip = touch(&f.dir, "replay.mkv");
    f.host.set_last_replay(out, &clip);
    f.tracker.refresh();

    f.host.fire_saved(out);

    assert_eq!(f.ui.run_pending(), 0);
    assert_eq!(file_names(&f.dir), vec!["replay.mkv"]);
}

#[test]
fn test_hook_from_capture_sources_only() {
    let f = fixture(renaming_to("X"));
    let hook = HookContext {
        source: "Game Capture".to_string(),
        title: "Hades".to_string(),
        class: "Hades".to_string(),
        executable: "Hades.exe".to_string(),
    };

    f.tracker
        .on_source_hooked("monitor_capture", hook.clone());
    assert_eq!(f.state.read(|s| s.hook.clone()), HookContext::default());

    f.tracker.on_source_hooked("game_capture", hook.clone());
    assert_eq!(f.state.read(|s| s.hook.clone()), hook);

    let window = HookContext {
        title: "Editor".to_string(),
        ..hook
    };
    f.tracker.on_source_hooked("window_capture", window.clone());
    assert_eq!(f.state.read(|s| s.hook.clone()), window);
}

#[test]
fn test_concurrent_outputs_keep_separate_file_sets() {
    const OUTPUTS: u64 = 8;
    const SEGMENTS: usize = 5;

    let mut f = fixture(renaming_to("Run"));
    let mut dirs = Vec::new();
    for n in 1..=OUTPUTS {
        let out = f.host.add_output(n, OutputKind::Recording);
        let dir = f.dir.join(format!("out{n}"));
        fs::create_dir_all(&dir).unwrap();
        let initial = touch(&dir, &format!("o{n}-initial.mkv"));
        f.host.set_setting(out, "path", initial.as_str());
        dirs.push((out, dir));
    }
    f.tracker.refresh();

    let barrier = Arc::new(Barrier::new(dirs.len()));
    let handles: Vec<_> = dirs
        .iter()
        .cloned()
        .map(|(out, dir)| {
            let host = Arc::clone(&f.host);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let segments: Vec<Utf8PathBuf> = (1..=SEGMENTS)
                    .map(|i| touch(&dir, &format!("o{}-seg{i}.mkv", out.0)))
                    .collect();
                barrier.wait();
                for segment in &segments {
                    host.fire_file_changed(out, segment);
                }
                host.fire_stop(out);
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(f.ui.run_pending(), dirs.len());

    for (out, dir) in &dirs {
        assert!(f.tracker.pending_files(*out).is_empty());

        let expected: Vec<String> = (1..=SEGMENTS + 1)
            .map(|i| format!("Run ({i}).mkv"))
            .collect();
        assert_eq!(file_names(dir), expected, "files of {out}");

        let mut originals = vec![format!("o{}-initial.mkv", out.0)];
        originals.extend((1..=SEGMENTS).map(|i| format!("o{}-seg{i}.mkv", out.0)));
        for (i, original) in originals.iter().enumerate() {
            let renamed = dir.join(format!("Run ({}).mkv", i + 1));
            assert_eq!(fs::read_to_string(&renamed).unwrap(), *original);
        }
    }
}
