//! Descriptor stability over a long sequence of init/term cycles.
//!
//! Kept in its own test binary so no sibling test opens descriptors while
//! the counts are taken.

#![cfg(target_os = "linux")]

use std::time::Duration;

use hostlock::LockHandle;

fn open_descriptor_count() -> usize {
    std::fs::read_dir("/proc/self/fd")
        .expect("read /proc/self/fd")
        .count()
}

#[test]
fn init_term_cycles_do_not_leak_descriptors() {
    let name = format!("hostlock-fd-{}", std::process::id());

    // Warm up once so one-time allocations do not skew the counts.
    {
        let mut handle = LockHandle::init(&name).expect("init");
        handle.lock(Duration::ZERO).expect("lock");
        handle.unlock().expect("unlock");
        handle.term().expect("term");
    }

    let before = open_descriptor_count();
    for _ in 0..100 {
        let mut handle = LockHandle::init(&name).expect("init");
        handle.lock(Duration::ZERO).expect("lock");
        handle.unlock().expect("unlock");
        handle.term().expect("term");
    }
    let after = open_descriptor_count();

    assert_eq!(before, after, "descriptor count drifted across cycles");
}
