//! Backtraces recorded where a handler panicked.
//!
//! By the time `catch_unwind` returns the stack has already unwound, so a
//! backtrace taken there only shows the isolator. A panic hook records the
//! trace on the panicking thread instead. The isolator collects it right
//! after `catch_unwind` returns, which happens on that same thread.

use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::panic;
use std::sync::Once;

thread_local! {
    static LAST_PANIC: RefCell<Option<Backtrace>> = const { RefCell::new(None) };
}

static HOOK: Once = Once::new();

/// Install the recording hook once per process, chained in front of the
/// hook that was active before.
pub(crate) fn install_hook() {
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let backtrace = Backtrace::capture();
            // Thread-local storage may already be gone during thread teardown.
            let _stored = LAST_PANIC.try_with(|slot| {
                if let Ok(mut slot) = slot.try_borrow_mut() {
                    *slot = Some(backtrace);
                }
            });
            previous(info);
        }));
    });
}

/// Forget any trace left over from a panic caught elsewhere on this thread.
pub(crate) fn clear() {
    drop(take());
}

/// Take the trace of the most recent panic on this thread.
pub(crate) fn take() -> Option<Backtrace> {
    LAST_PANIC
        .try_with(|slot| slot.try_borrow_mut().ok().and_then(|mut slot| slot.take()))
        .ok()
        .flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_records_trace_on_this_thread() {
        install_hook();
        clear();

        let caught = panic::catch_unwind(|| panic!("recorded"));
        assert!(caught.is_err());
        assert!(take().is_some());
        assert!(take().is_none());
    }

    #[test]
    fn test_trace_stays_on_panicking_thread() {
        install_hook();
        clear();

        let worker = std::thread::spawn(|| {
            let caught = panic::catch_unwind(|| panic!("elsewhere"));
            assert!(caught.is_err());
        });
        worker.join().unwrap();
        assert!(take().is_none());
    }
}
