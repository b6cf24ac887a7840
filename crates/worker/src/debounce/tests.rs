use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Notify;

use super::*;

fn counting(name: &'static str, delay: Duration) -> (Debouncer, Arc<AtomicUsize>) {
	let fired = Arc::new(AtomicUsize::new(0));
	let counter = Arc::clone(&fired);
	let debouncer = Debouncer::new(name, delay, move || {
		let counter = Arc::clone(&counter);
		async move {
			counter.fetch_add(1, Ordering::SeqCst);
		}
	});
	(debouncer, fired)
}

async fn settle() {
	for _ in 0..8 {
		tokio::task::yield_now().await;
	}
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn burst_of_signals_fires_once() {
	let (debouncer, fired) = counting("test.burst", Duration::from_millis(250));

	assert!(debouncer.schedule());
	tokio::time::advance(Duration::from_millis(50)).await;
	assert!(!debouncer.schedule());
	tokio::time::advance(Duration::from_millis(50)).await;
	assert!(!debouncer.schedule());

	tokio::time::advance(Duration::from_millis(250)).await;
	settle().await;

	assert_eq!(fired.load(Ordering::SeqCst), 1);
	assert!(!debouncer.is_pending());
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn signal_during_firing_rearms() {
	let entered = Arc::new(Notify::new());
	let release = Arc::new(Notify::new());
	let fired = Arc::new(AtomicUsize::new(0));

	let debouncer = {
		let entered = Arc::clone(&entered);
		let release = Arc::clone(&release);
		let fired = Arc::clone(&fired);
		Debouncer::new("test.rearm", Duration::from_millis(10), move || {
			let entered = Arc::clone(&entered);
			let release = Arc::clone(&release);
			let fired = Arc::clone(&fired);
			async move {
				let count = fired.fetch_add(1, Ordering::SeqCst);
				if count == 0 {
					entered.notify_one();
					release.notified().await;
				}
			}
		})
	};

	debouncer.schedule();
	tokio::time::advance(Duration::from_millis(10)).await;
	entered.notified().await;

	// Work arriving mid-firing must not start a second concurrent timer.
	assert!(!debouncer.schedule());
	release.notify_one();
	settle().await;
	assert!(debouncer.is_pending());

	tokio::time::advance(Duration::from_millis(15)).await;
	settle().await;

	assert_eq!(fired.load(Ordering::SeqCst), 2);
	assert!(!debouncer.is_pending());
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn cancelled_debouncer_never_fires() {
	let (debouncer, fired) = counting("test.cancel", Duration::from_millis(100));

	debouncer.schedule();
	debouncer.cancel();
	tokio::time::advance(Duration::from_millis(200)).await;
	settle().await;

	assert_eq!(fired.load(Ordering::SeqCst), 0);
	assert!(!debouncer.schedule());
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn panicking_action_leaves_the_timer_usable() {
	let fired = Arc::new(AtomicUsize::new(0));
	let debouncer = {
		let fired = Arc::clone(&fired);
		Debouncer::new("test.panic", Duration::from_millis(10), move || {
			let fired = Arc::clone(&fired);
			async move {
				if fired.fetch_add(1, Ordering::SeqCst) == 0 {
					panic!("first firing fails");
				}
			}
		})
	};

	assert!(debouncer.schedule());
	tokio::time::advance(Duration::from_millis(15)).await;
	settle().await;
	assert_eq!(fired.load(Ordering::SeqCst), 1);
	assert!(!debouncer.is_pending());

	assert!(debouncer.schedule());
	tokio::time::advance(Duration::from_millis(15)).await;
	settle().await;
	assert_eq!(fired.load(Ordering::SeqCst), 2);
	assert!(!debouncer.is_pending());
}
