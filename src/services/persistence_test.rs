use super::*;

fn recording() -> (Arc<Mutex<Vec<u32>>>, impl Fn(u32) + Send + Sync + 'static) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink_seen = Arc::clone(&seen);
    (seen, move |v| sink_seen.lock().unwrap().push(v))
}

#[tokio::test(start_paused = true)]
async fn burst_collapses_to_last_value() {
    let (seen, sink) = recording();
    let debouncer = Debouncer::new(Duration::from_millis(DEFAULT_DEBOUNCE_MS), sink);

    for v in 1..=5 {
        debouncer.schedule(v);
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
    assert!(seen.lock().unwrap().is_empty());

    tokio::time::sleep(Duration::from_millis(1001)).await;
    assert_eq!(*seen.lock().unwrap(), vec![5]);
    assert!(!debouncer.is_pending());
}

#[tokio::test(start_paused = true)]
async fn window_resets_on_each_call() {
    let (seen, sink) = recording();
    let debouncer = Debouncer::new(Duration::from_millis(1000), sink);

    debouncer.schedule(1);
    tokio::time::sleep(Duration::from_millis(900)).await;
    debouncer.schedule(2);
    tokio::time::sleep(Duration::from_millis(900)).await;
    // 1800ms since the first call, but only 900ms since the last.
    assert!(seen.lock().unwrap().is_empty());

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(*seen.lock().unwrap(), vec![2]);
}

#[tokio::test(start_paused = true)]
async fn separate_windows_write_separately() {
    let (seen, sink) = recording();
    let debouncer = Debouncer::new(Duration::from_millis(1000), sink);

    debouncer.schedule(1);
    tokio::time::sleep(Duration::from_millis(1500)).await;
    debouncer.schedule(2);
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
}

#[tokio::test(start_paused = true)]
async fn flush_writes_immediately_once() {
    let (seen, sink) = recording();
    let debouncer = Debouncer::new(Duration::from_millis(1000), sink);

    debouncer.schedule(7);
    assert!(debouncer.flush());
    assert_eq!(*seen.lock().unwrap(), vec![7]);

    // The aborted timer must not write a second time.
    tokio::time::sleep(Duration::from_millis(2000)).await;
    assert_eq!(*seen.lock().unwrap(), vec![7]);
    assert!(!debouncer.flush());
}

#[tokio::test(start_paused = true)]
async fn cancel_drops_pending_value() {
    let (seen, sink) = recording();
    let debouncer = Debouncer::new(Duration::from_millis(1000), sink);

    debouncer.schedule(3);
    assert!(debouncer.is_pending());
    debouncer.cancel();
    assert!(!debouncer.is_pending());

    tokio::time::sleep(Duration::from_millis(2000)).await;
    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn schedule_without_runtime_writes_through() {
    let (seen, sink) = recording();
    let debouncer = Debouncer::new(Duration::from_millis(1000), sink);
    debouncer.schedule(9);
    assert_eq!(*seen.lock().unwrap(), vec![9]);
    assert!(!debouncer.is_pending());
}
