// Work Queue - FIFO of pending job ids

use crate::domain::JobId;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::Notify;

/// Ordered queue of pending job ids.
///
/// Safe for any number of producers. Designed for exactly one consumer:
/// `dequeue` parks on a `Notify` permit while the queue is empty.
#[derive(Default)]
pub struct WorkQueue {
    items: Mutex<VecDeque<JobId>>,
    notify: Notify,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the tail. Never blocks on the consumer.
    pub fn enqueue(&self, id: JobId) {
        self.lock().push_back(id);
        self.notify.notify_one();
    }

    /// Pop from the head, waiting while the queue is empty
    pub async fn dequeue(&self) -> JobId {
        loop {
            if let Some(id) = self.try_dequeue() {
                return id;
            }
            self.notify.notified().await;
        }
    }

    /// Pop from the head without waiting
    pub fn try_dequeue(&self) -> Option<JobId> {
        self.lock().pop_front()
    }

    /// Pending count snapshot (status reporting only)
    pub fn size(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<JobId>> {
        // A poisoned queue still holds valid ids; keep serving them
        self.items.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_fifo_order() {
        let queue = WorkQueue::new();
        queue.enqueue("a".to_string());
        queue.enqueue("b".to_string());
        queue.enqueue("c".to_string());

        assert_eq!(queue.size(), 3);
        assert_eq!(queue.dequeue().await, "a");
        assert_eq!(queue.dequeue().await, "b");
        assert_eq!(queue.dequeue().await, "c");
        assert_eq!(queue.size(), 0);
    }

    #[tokio::test]
    async fn test_dequeue_waits_for_enqueue() {
        let queue = Arc::new(WorkQueue::new());

        let consumer = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.dequeue().await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!consumer.is_finished(), "consumer should park on empty queue");

        queue.enqueue("late".to_string());
        let id = tokio::time::timeout(Duration::from_secs(1), consumer)
            .await
            .expect("consumer woke up")
            .unwrap();
        assert_eq!(id, "late");
    }

    #[tokio::test]
    async fn test_concurrent_producers() {
        let queue = Arc::new(WorkQueue::new());
        let mut handles = vec![];
        for p in 0..4 {
            let queue = Arc::clone(&queue);
            handles.push(tokio::spawn(async move {
                for i in 0..25 {
                    queue.enqueue(format!("{}-{}", p, i));
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(queue.size(), 100);
        let mut drained = 0;
        while queue.try_dequeue().is_some() {
            drained += 1;
        }
        assert_eq!(drained, 100);
    }
}
