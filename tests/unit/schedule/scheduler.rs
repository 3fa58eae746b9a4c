use super::*;
use std::sync::mpsc;
use std::time::Duration;

use crate::foundation::error::PressError;

/// Scheduler whose handler records each request and blocks until released once per request.
fn gated() -> (
    RenderScheduler<u32>,
    Arc<Mutex<Vec<u32>>>,
    mpsc::Sender<()>,
    mpsc::Receiver<u32>,
) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let (started_tx, started_rx) = mpsc::channel::<u32>();
    let release_rx = Mutex::new(release_rx);
    let started_tx = Mutex::new(started_tx);

    let log = Arc::clone(&seen);
    let scheduler = RenderScheduler::new("test", move |req: u32| {
        let _ = started_tx.lock().send(req);
        let _ = release_rx.lock().recv_timeout(Duration::from_secs(5));
        log.lock().push(req);
        Ok(())
    });
    (scheduler, seen, release_tx, started_rx)
}

#[test]
fn burst_while_busy_renders_in_flight_plus_last() {
    let (scheduler, seen, release, started) = gated();

    assert_eq!(scheduler.submit(0).unwrap(), SubmitOutcome::Started);
    assert_eq!(started.recv_timeout(Duration::from_secs(5)).unwrap(), 0);

    for k in 1..=7 {
        assert_eq!(scheduler.submit(k).unwrap(), SubmitOutcome::Coalesced);
    }
    release.send(()).unwrap();
    assert_eq!(started.recv_timeout(Duration::from_secs(5)).unwrap(), 7);
    release.send(()).unwrap();
    scheduler.wait_idle();

    assert_eq!(*seen.lock(), vec![0, 7]);
    let stats = scheduler.stats();
    assert_eq!(stats.submitted, 8);
    assert_eq!(stats.rendered, 2);
    assert_eq!(stats.dropped, 6);
    assert!(!scheduler.is_rendering());
}

#[test]
fn idle_scheduler_starts_a_new_drain_each_time() {
    let (scheduler, seen, release, _started) = gated();
    for k in 0..3 {
        release.send(()).unwrap();
        assert_eq!(scheduler.submit(k).unwrap(), SubmitOutcome::Started);
        scheduler.wait_idle();
    }
    assert_eq!(*seen.lock(), vec![0, 1, 2]);
}

#[test]
fn failed_render_does_not_stall_the_gate() {
    let scheduler = RenderScheduler::new("failing", |req: u32| {
        if req % 2 == 0 {
            Err(PressError::rasterization("boom"))
        } else {
            Ok(())
        }
    });
    for k in 0..4 {
        scheduler.submit(k).unwrap();
        scheduler.wait_idle();
    }
    let stats = scheduler.stats();
    assert_eq!(stats.failed, 2);
    assert_eq!(stats.rendered, 2);
}

#[test]
fn panicking_handler_releases_the_gate() {
    let scheduler = RenderScheduler::new("panicky", |req: u32| {
        if req == 0 {
            panic!("handler panic");
        }
        Ok(())
    });
    scheduler.submit(0).unwrap();
    scheduler.wait_idle();
    assert_eq!(scheduler.submit(1).unwrap(), SubmitOutcome::Started);
    scheduler.wait_idle();
    assert_eq!(scheduler.stats().rendered, 1);
}
