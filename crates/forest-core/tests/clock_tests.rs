// Host-side tests for the frame clock.

use forest_core::FrameClock;
use std::thread;
use std::time::Duration;

#[test]
fn elapsed_is_monotone_and_deltas_are_clamped() {
    let mut clock = FrameClock::new();
    let (e0, d0) = clock.tick();
    assert!((0.0..=0.25).contains(&d0));
    thread::sleep(Duration::from_millis(5));
    let (e1, d1) = clock.tick();
    assert!(e1 > e0);
    assert!(d1 > 0.0 && d1 <= 0.25);
    thread::sleep(Duration::from_millis(300));
    let (_, d2) = clock.tick();
    assert_eq!(d2, 0.25);
}
