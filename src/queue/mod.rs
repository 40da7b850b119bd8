use crate::record::Record;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Shared accumulation buffer for pending records. The only shared mutable
/// state in the shipper: producers append concurrently with each other and
/// with drains, so every access goes through the internal mutex.
///
/// `drain_all` swaps the whole backing vector out under the lock, so a
/// record enqueued before the swap lands in exactly one drain and a record
/// enqueued after it is untouched.
pub struct RecordQueue {
    pending: Mutex<VecDeque<Record>>,
    max_pending: usize,
}

impl RecordQueue {
    /// `max_pending == 0` means unbounded.
    pub fn new(max_pending: usize) -> Self {
        Self {
            pending: Mutex::new(VecDeque::new()),
            max_pending,
        }
    }

    /// Append a record. Never performs I/O; blocks only on the internal
    /// mutex. When a capacity bound is configured and reached, the oldest
    /// pending record is dropped to make room.
    pub fn enqueue(&self, record: Record) {
        let mut pending = self.pending.lock().unwrap();

        if self.max_pending > 0 && pending.len() >= self.max_pending {
            if let Some(dropped) = pending.pop_front() {
                tracing::warn!(
                    level = %dropped.level,
                    module = %dropped.bindings.module,
                    max_pending = self.max_pending,
                    "Dropping oldest pending record, queue at capacity"
                );
            }
        }

        pending.push_back(record);
    }

    /// Atomically capture and reset the queue. Safe to call concurrently
    /// with `enqueue` and with itself; a racing drain observes either the
    /// full previous contents or an empty queue, never a partial overlap.
    pub fn drain_all(&self) -> Vec<Record> {
        let mut pending = self.pending.lock().unwrap();
        Vec::from(std::mem::take(&mut *pending))
    }

    pub fn len(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Bindings, Severity};
    use std::collections::HashSet;
    use std::sync::Arc;

    fn make_record(message: &str) -> Record {
        Record::new(
            Bindings {
                node_id: "n1".to_string(),
                namespace: "v1".to_string(),
                service: None,
                version: None,
                module: "test".to_string(),
            },
            Severity::Info,
            message,
        )
    }

    #[test]
    fn test_drain_preserves_enqueue_order() {
        let queue = RecordQueue::new(0);
        queue.enqueue(make_record("a"));
        queue.enqueue(make_record("b"));
        queue.enqueue(make_record("c"));

        let drained = queue.drain_all();
        let messages: Vec<&str> = drained.iter().map(|r| r.message.as_str()).collect();
        assert_eq!(messages, vec!["a", "b", "c"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_drain_empty_queue_yields_empty() {
        let queue = RecordQueue::new(0);
        assert!(queue.drain_all().is_empty());
    }

    #[test]
    fn test_records_enqueued_after_drain_are_absent_from_it() {
        let queue = RecordQueue::new(0);
        queue.enqueue(make_record("before"));

        let drained = queue.drain_all();
        queue.enqueue(make_record("after"));

        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].message, "before");
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_bounded_queue_drops_oldest() {
        let queue = RecordQueue::new(2);
        queue.enqueue(make_record("a"));
        queue.enqueue(make_record("b"));
        queue.enqueue(make_record("c"));

        let drained = queue.drain_all();
        let messages: Vec<&str> = drained.iter().map(|r| r.message.as_str()).collect();
        assert_eq!(messages, vec!["b", "c"]);
    }

    #[test]
    fn test_concurrent_enqueue_and_drain_loses_nothing() {
        let queue = Arc::new(RecordQueue::new(0));
        let producers = 8;
        let per_producer = 200;

        let mut handles = Vec::new();
        for producer in 0..producers {
            let queue = Arc::clone(&queue);
            handles.push(std::thread::spawn(move || {
                for i in 0..per_producer {
                    queue.enqueue(make_record(&format!("{}-{}", producer, i)));
                }
            }));
        }

        // Drain repeatedly while producers are running.
        let drainer = {
            let queue = Arc::clone(&queue);
            std::thread::spawn(move || {
                let mut seen = Vec::new();
                for _ in 0..50 {
                    seen.extend(queue.drain_all());
                    std::thread::yield_now();
                }
                seen
            })
        };

        for handle in handles {
            handle.join().unwrap();
        }
        let mut seen = drainer.join().unwrap();
        seen.extend(queue.drain_all());

        // Union of all drains plus the residue equals the enqueued set,
        // with no duplicates.
        let messages: HashSet<String> = seen.iter().map(|r| r.message.clone()).collect();
        assert_eq!(seen.len(), producers * per_producer);
        assert_eq!(messages.len(), producers * per_producer);
    }
}
