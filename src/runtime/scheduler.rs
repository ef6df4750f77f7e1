//! Cost-ordered scheduler for functional tests.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::path::PathBuf;
use std::sync::Arc;

use super::functional::{FunctionalTest, TestOutcome};
use crate::sample::SampleBuilderRegistry;
use crate::simulation::SimulationRegistry;

/// A functional test waiting in the scheduler queue.
#[derive(Clone, Debug)]
pub struct WorkItem {
    pub test: FunctionalTest,
    /// Estimated cost (detector pixels × particle species).
    pub cost: usize,
    /// Priority modifier (higher = more priority).
    pub priority_boost: i32,
}

impl WorkItem {
    pub fn new(test: FunctionalTest, cost: usize) -> Self {
        Self {
            test,
            cost,
            priority_boost: 0,
        }
    }

    pub fn with_priority(mut self, boost: i32) -> Self {
        self.priority_boost = boost;
        self
    }
}

// Cheaper items pop first; ties go to the larger boost, then to name order.
impl Eq for WorkItem {}

impl PartialEq for WorkItem {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Ord for WorkItem {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| self.priority_boost.cmp(&other.priority_boost))
            .then_with(|| other.test.name.cmp(&self.test.name))
    }
}

impl PartialOrd for WorkItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Priority scheduler over a binary heap.
pub struct PriorityScheduler {
    queue: BinaryHeap<WorkItem>,
    builders: Arc<SampleBuilderRegistry>,
    simulations: Arc<SimulationRegistry>,
    reference_dir: PathBuf,
    total_enqueued: usize,
    total_processed: usize,
}

impl PriorityScheduler {
    pub fn new(
        builders: Arc<SampleBuilderRegistry>,
        simulations: Arc<SimulationRegistry>,
        reference_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            queue: BinaryHeap::new(),
            builders,
            simulations,
            reference_dir: reference_dir.into(),
            total_enqueued: 0,
            total_processed: 0,
        }
    }

    /// Enqueue a test, estimating its cost. Tests whose cost cannot be
    /// estimated go last and report their error when processed.
    pub fn enqueue_test(&mut self, test: FunctionalTest) {
        let cost = test
            .estimated_cost(&self.builders, &self.simulations)
            .unwrap_or(usize::MAX);
        self.enqueue(WorkItem::new(test, cost));
    }

    pub fn enqueue(&mut self, item: WorkItem) {
        self.queue.push(item);
        self.total_enqueued += 1;
    }

    pub fn enqueue_all(&mut self, items: impl IntoIterator<Item = WorkItem>) {
        for item in items {
            self.enqueue(item);
        }
    }

    pub fn peek(&self) -> Option<&WorkItem> {
        self.queue.peek()
    }

    pub fn pop(&mut self) -> Option<WorkItem> {
        self.queue.pop()
    }

    /// Drain the queue in scheduled order.
    pub fn drain_ordered(&mut self) -> Vec<WorkItem> {
        let mut items = Vec::with_capacity(self.queue.len());
        while let Some(item) = self.queue.pop() {
            items.push(item);
        }
        items
    }

    /// Run the next test. Returns `None` if the queue is empty.
    pub fn process_next(&mut self) -> Option<TestOutcome> {
        let item = self.queue.pop()?;
        let outcome = item
            .test
            .execute(&self.builders, &self.simulations, &self.reference_dir);
        self.total_processed += 1;
        Some(outcome)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn total_processed(&self) -> usize {
        self.total_processed
    }

    pub fn total_enqueued(&self) -> usize {
        self.total_enqueued
    }

    pub(crate) fn mark_processed(&mut self, count: usize) {
        self.total_processed += count;
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }

    pub fn reset_stats(&mut self) {
        self.total_enqueued = 0;
        self.total_processed = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, cost: usize) -> WorkItem {
        WorkItem::new(FunctionalTest::new(name, "", "CylindersInBA", "MiniGISAS", 2e-10), cost)
    }

    #[test]
    fn test_priority_ordering() {
        let cheap = item("a", 10);
        let mid = item("b", 100);
        let boosted = item("c", 100).with_priority(3);

        assert!(cheap > mid);
        assert!(boosted > mid);
        assert!(cheap > boosted);
    }

    #[test]
    fn test_scheduler_ordering() {
        let mut scheduler = PriorityScheduler::new(
            Arc::new(SampleBuilderRegistry::new_with_defaults()),
            Arc::new(SimulationRegistry::new_with_defaults()),
            "unused",
        );
        scheduler.enqueue_all([item("x", 500), item("y", 20), item("z", 20), item("w", 1000)]);
        assert_eq!(scheduler.total_enqueued(), 4);

        let names: Vec<_> = scheduler
            .drain_ordered()
            .into_iter()
            .map(|i| i.test.name)
            .collect();
        assert_eq!(names, ["y", "z", "x", "w"]);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_estimated_cost_orders_unknown_last() {
        let mut scheduler = PriorityScheduler::new(
            Arc::new(SampleBuilderRegistry::new_with_defaults()),
            Arc::new(SimulationRegistry::new_with_defaults()),
            "unused",
        );
        scheduler.enqueue_test(FunctionalTest::new("broken", "", "Missing", "MiniGISAS", 2e-10));
        scheduler.enqueue_test(FunctionalTest::new("ok", "", "CylindersInBA", "MiniGISAS", 2e-10));
        assert_eq!(scheduler.peek().unwrap().test.name, "ok");
        assert_eq!(scheduler.peek().unwrap().cost, 625);
    }
}
