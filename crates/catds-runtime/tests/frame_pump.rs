mod common;

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use anyhow::Result;
use catds_core::screen::{FRAME_BYTES, SCREEN_HEIGHT, SCREEN_WIDTH};
use catds_runtime::{PresentationScheduler, RunState, RuntimeConfig, RuntimeEvent, ScreenScale};
use common::{Harness, wait_for};

#[test]
fn core_fault_pauses_and_pump_survives() -> Result<()> {
    let h = Harness::loaded()?;
    h.handle.run()?;
    assert!(wait_for(Duration::from_secs(2), || h.handle.frame_counter() > 2));

    h.tap.fault.store(true, Ordering::Release);
    assert!(wait_for(Duration::from_secs(2), || {
        h.handle.run_state() == RunState::Paused
    }));
    let session = h.handle.session().expect("session survives a fault");
    assert!(
        session
            .last_error
            .as_deref()
            .is_some_and(|e| e.contains("injected"))
    );
    assert!(h.handle.paused());
    assert!(h.handle.pump_alive());

    let faulted_at = h.handle.frame_counter();
    thread::sleep(Duration::from_millis(60));
    assert_eq!(h.handle.frame_counter(), faulted_at);

    h.tap.fault.store(false, Ordering::Release);
    h.handle.run()?;
    assert!(wait_for(Duration::from_secs(2), || {
        h.handle.frame_counter() > faulted_at + 2
    }));
    assert_eq!(h.handle.session().and_then(|s| s.last_error), None);

    let faults = std::iter::from_fn(|| h.handle.try_recv_event())
        .filter(|e| matches!(e, RuntimeEvent::CoreFault { .. }))
        .count();
    assert_eq!(faults, 1);
    Ok(())
}

#[test]
fn run_racing_a_fault_keeps_pause_flag_and_run_state_in_step() -> Result<()> {
    let h = Harness::loaded()?;
    for _ in 0..25 {
        h.tap.fault.store(true, Ordering::Release);
        let spammer = {
            let handle = h.handle.clone();
            thread::spawn(move || {
                let deadline = Instant::now() + Duration::from_millis(40);
                while Instant::now() < deadline {
                    let _ = handle.run();
                }
            })
        };
        spammer.join().expect("run spammer");
        h.tap.fault.store(false, Ordering::Release);
        thread::sleep(Duration::from_millis(40));

        let run_state = h.handle.run_state();
        let paused = h.handle.paused();
        assert_eq!(
            run_state == RunState::Running,
            !paused,
            "{run_state:?} with paused={paused}"
        );
        h.handle.pause()?;
    }
    Ok(())
}

#[test]
fn step_fault_is_reported_and_leaves_counter() -> Result<()> {
    let h = Harness::loaded()?;
    h.handle.step()?;
    h.tap.fault.store(true, Ordering::Release);
    assert!(h.handle.step().is_err());
    assert_eq!(h.handle.frame_counter(), 1);
    assert_eq!(h.handle.run_state(), RunState::Paused);
    assert!(h.handle.session().and_then(|s| s.last_error).is_some());
    Ok(())
}

#[test]
fn presenter_never_sees_torn_or_short_frames() -> Result<()> {
    let h = Harness::loaded()?;
    let done = Arc::new(AtomicBool::new(false));

    let stepper = {
        let handle = h.handle.clone();
        let done = Arc::clone(&done);
        thread::spawn(move || {
            for _ in 0..500 {
                if handle.step().is_err() {
                    break;
                }
            }
            done.store(true, Ordering::Release);
        })
    };

    let mut presenter = PresentationScheduler::new(h.handle.clone(), ScreenScale::X1);
    let mut redraws = 0;
    while !done.load(Ordering::Acquire) {
        let tick = presenter.tick(Instant::now());
        if !tick.redraw {
            continue;
        }
        redraws += 1;
        let screens = presenter.screens();
        assert_eq!(screens.top.len(), FRAME_BYTES / 2);
        assert_eq!(screens.bottom.len(), FRAME_BYTES / 2);
        let first = screens.top[0];
        assert!(screens.top.iter().all(|&b| b == first));
        assert!(screens.bottom.iter().all(|&b| b == first));
    }
    stepper.join().expect("stepper thread");
    assert!(redraws > 0);
    Ok(())
}

#[test]
fn presenter_skips_unchanged_frames_and_rescales() -> Result<()> {
    let h = Harness::loaded()?;
    let mut presenter = PresentationScheduler::new(h.handle.clone(), ScreenScale::X1);

    assert!(presenter.tick(Instant::now()).redraw);
    assert!(!presenter.tick(Instant::now()).redraw);

    h.handle.step()?;
    let tick = presenter.tick(Instant::now());
    assert!(tick.redraw);
    assert_eq!(tick.frame_counter, 1);

    presenter.set_scale(ScreenScale::X3);
    assert!(presenter.tick(Instant::now()).redraw);
    let screens = presenter.screens();
    assert_eq!((screens.width, screens.height), (SCREEN_WIDTH * 3, SCREEN_HEIGHT * 3));
    assert_eq!(screens.top.len(), FRAME_BYTES / 2 * 9);
    Ok(())
}

#[test]
fn presenter_logs_render_failures_and_keeps_ticking() -> Result<()> {
    let h = Harness::loaded()?;
    let mut presenter = PresentationScheduler::new(h.handle.clone(), ScreenScale::X2);

    let tick = presenter.present(Instant::now(), |_| Err("device lost"));
    assert!(tick.redraw);
    assert!(tick.next_tick.is_some());

    h.handle.step()?;
    let mut rendered = false;
    presenter.present(Instant::now(), |_| {
        rendered = true;
        Ok::<_, String>(())
    });
    assert!(rendered);
    Ok(())
}

#[test]
fn cancelled_presenter_stops_rearming() -> Result<()> {
    let h = Harness::loaded()?;
    let mut presenter = PresentationScheduler::new(h.handle.clone(), ScreenScale::X2);
    let token = presenter.cancel_token();
    assert_eq!(
        presenter.tick(Instant::now()).next_tick,
        Some(Duration::from_millis(16))
    );

    token.store(true, Ordering::Release);
    let tick = presenter.tick(Instant::now());
    assert_eq!(tick.next_tick, None);
    assert!(!tick.redraw);
    Ok(())
}

#[test]
fn slow_core_lowers_rate_without_catch_up() -> Result<()> {
    // A 40 ms period stands in for a core that overruns a 60 Hz frame.
    let h = Harness::with_config(RuntimeConfig {
        frame_duration: Duration::from_millis(40),
        ..RuntimeConfig::default()
    })?;
    h.handle.load_rom(&h.rom)?;
    h.handle.run()?;
    thread::sleep(Duration::from_millis(500));
    h.handle.pause()?;

    let frames = h.handle.frame_counter();
    assert!((8..=14).contains(&frames), "{frames} frames");
    Ok(())
}

#[test]
fn pause_is_observed_within_an_idle_interval() -> Result<()> {
    let h = Harness::loaded()?;
    h.handle.run()?;
    assert!(wait_for(Duration::from_secs(2), || h.handle.frame_counter() > 1));

    h.handle.pause()?;
    let paused_at = Instant::now();
    let settled = h.handle.frame_counter();
    thread::sleep(Duration::from_millis(40));
    assert!(h.handle.frame_counter() <= settled + 1);
    assert!(paused_at.elapsed() < Duration::from_secs(1));
    Ok(())
}
