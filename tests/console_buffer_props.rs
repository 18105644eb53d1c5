// tests/console_buffer_props.rs

use gamectl::console::ConsoleBuffer;
use proptest::prelude::*;

fn chunks() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec(".{0,64}", 0..40)
}

proptest! {
    /// After any sequence of appends the buffer never exceeds its capacity
    /// and holds exactly the tail of everything written.
    #[test]
    fn bounded_and_tail_correct(capacity in 1usize..200, writes in chunks()) {
        let buffer = ConsoleBuffer::new(capacity);
        let mut all = String::new();

        for chunk in &writes {
            buffer.append(chunk);
            all.push_str(chunk);
            prop_assert!(buffer.len() <= capacity);
        }

        let total = all.chars().count();
        let expected: String = all.chars().skip(total.saturating_sub(capacity)).collect();
        prop_assert_eq!(buffer.snapshot(), expected);
    }

    /// Trimming an already-bounded buffer never changes it.
    #[test]
    fn trim_is_a_noop_under_the_structural_bound(capacity in 1usize..100, writes in chunks()) {
        let buffer = ConsoleBuffer::new(capacity);
        for chunk in &writes {
            buffer.append(chunk);
        }
        let before = buffer.snapshot();
        prop_assert_eq!(buffer.trim(), 0);
        prop_assert_eq!(buffer.snapshot(), before);
    }
}

#[test]
fn placeholder_only_when_empty() {
    let buffer = ConsoleBuffer::new(16);
    assert_eq!(buffer.snapshot_or_placeholder(), "[No logs yet]");
    buffer.append_line("Done");
    assert_eq!(buffer.snapshot_or_placeholder(), "Done\n");
}

#[test]
fn concurrent_appends_do_not_interleave() {
    let buffer = ConsoleBuffer::new(100_000);
    let threads: Vec<_> = (0..8)
        .map(|i| {
            let buffer = buffer.clone();
            std::thread::spawn(move || {
                let line = format!("{}\n", i.to_string().repeat(50));
                for _ in 0..100 {
                    buffer.append(&line);
                }
            })
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }

    let snapshot = buffer.snapshot();
    assert_eq!(snapshot.lines().count(), 800);
    for line in snapshot.lines() {
        let first = line.chars().next().unwrap();
        assert!(line.chars().all(|c| c == first), "interleaved line: {line}");
        assert_eq!(line.len(), 50);
    }
}
