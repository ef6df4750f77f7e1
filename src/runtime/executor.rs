//! Batch runtime for functional tests.

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rayon::prelude::*;
use tokio::runtime::Runtime as TokioRuntime;
use tokio::task::{JoinError, JoinHandle};

use super::functional::{FunctionalTest, FunctionalTestRegistry, TestOutcome, TestStatus};
use super::scheduler::PriorityScheduler;
use super::RuntimeError;
use crate::ffi::types::GisasStatus;
use crate::sample::SampleBuilderRegistry;
use crate::simulation::SimulationRegistry;

/// Configuration for the runtime.
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    /// Number of worker threads.
    pub worker_count: usize,
    /// Directory holding `<test>.int` reference files.
    pub reference_dir: PathBuf,
    /// Stop scheduling new tests after the first failure.
    pub fail_fast: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            worker_count: num_cpus::get(),
            reference_dir: PathBuf::from("tests/references"),
            fail_fast: false,
        }
    }
}

/// Counts over the collected outcomes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RuntimeSummary {
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub missing_reference: usize,
    pub elapsed: Duration,
}

impl RuntimeSummary {
    pub fn total(&self) -> usize {
        self.passed + self.failed + self.errors + self.missing_reference
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0 && self.errors == 0
    }
}

impl fmt::Display for RuntimeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} tests: {} passed, {} failed, {} errors, {} without reference ({:.2}s)",
            self.total(),
            self.passed,
            self.failed,
            self.errors,
            self.missing_reference,
            self.elapsed.as_secs_f64()
        )
    }
}

/// Runs functional tests in cost order, synchronously on a rayon pool or
/// asynchronously on tokio workers.
pub struct Runtime {
    config: RuntimeConfig,
    builders: Arc<SampleBuilderRegistry>,
    simulations: Arc<SimulationRegistry>,
    /// Tests waiting to be scheduled.
    pending: Vec<FunctionalTest>,
    scheduler: Arc<Mutex<PriorityScheduler>>,
    results: Arc<Mutex<Vec<TestOutcome>>>,
    tokio_runtime: TokioRuntime,
    cancelled: Arc<AtomicBool>,
    /// Detached asynchronous run.
    background: Option<JoinHandle<()>>,
}

/// State shared by the workers of one asynchronous run.
struct AsyncShared {
    scheduler: Arc<Mutex<PriorityScheduler>>,
    results: Arc<Mutex<Vec<TestOutcome>>>,
    cancelled: Arc<AtomicBool>,
    builders: Arc<SampleBuilderRegistry>,
    simulations: Arc<SimulationRegistry>,
    reference_dir: PathBuf,
    fail_fast: bool,
    completed: AtomicUsize,
    total: usize,
}

impl AsyncShared {
    /// Pop the next test under the lock and run it on the blocking pool.
    /// `Ok(None)` once the queue is empty or the run was cancelled.
    async fn run_next(self: &Arc<Self>) -> Result<Option<TestOutcome>, JoinError> {
        if self.cancelled.load(Ordering::SeqCst) {
            return Ok(None);
        }
        let item = self
            .scheduler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();
        let Some(item) = item else {
            return Ok(None);
        };

        let shared = Arc::clone(self);
        let outcome = tokio::task::spawn_blocking(move || {
            item.test
                .execute(&shared.builders, &shared.simulations, &shared.reference_dir)
        })
        .await?;

        self.scheduler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .mark_processed(1);
        if self.fail_fast && outcome.status.is_failure() {
            self.cancelled.store(true, Ordering::SeqCst);
        }
        Ok(Some(outcome))
    }
}

impl Runtime {
    pub fn new(config: RuntimeConfig) -> Result<Self, RuntimeError> {
        Self::with_registries(
            config,
            SampleBuilderRegistry::new_with_defaults(),
            SimulationRegistry::new_with_defaults(),
        )
    }

    pub fn with_registries(
        config: RuntimeConfig,
        builders: SampleBuilderRegistry,
        simulations: SimulationRegistry,
    ) -> Result<Self, RuntimeError> {
        let builders = Arc::new(builders);
        let simulations = Arc::new(simulations);
        let scheduler = PriorityScheduler::new(
            builders.clone(),
            simulations.clone(),
            config.reference_dir.clone(),
        );
        let tokio_runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(config.worker_count.max(1))
            .enable_all()
            .build()?;

        Ok(Self {
            config,
            builders,
            simulations,
            pending: Vec::new(),
            scheduler: Arc::new(Mutex::new(scheduler)),
            results: Arc::new(Mutex::new(Vec::new())),
            tokio_runtime,
            cancelled: Arc::new(AtomicBool::new(false)),
            background: None,
        })
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn add_test(&mut self, test: FunctionalTest) {
        self.pending.push(test);
    }

    pub fn add_tests(&mut self, tests: impl IntoIterator<Item = FunctionalTest>) {
        self.pending.extend(tests);
    }

    /// Queue a test from the standard functional test registry.
    pub fn add_test_by_name(&mut self, name: &str) -> Result<(), RuntimeError> {
        let test = FunctionalTestRegistry::new_with_defaults().get(name)?.clone();
        self.add_test(test);
        Ok(())
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len() + self.lock_scheduler().len()
    }

    pub fn completed_count(&self) -> usize {
        self.lock_results().len()
    }

    pub fn failed_count(&self) -> usize {
        self.lock_results()
            .iter()
            .filter(|o| o.status.is_failure())
            .count()
    }

    pub fn results(&self) -> Vec<TestOutcome> {
        self.lock_results().clone()
    }

    pub fn summary(&self) -> RuntimeSummary {
        let mut summary = RuntimeSummary::default();
        for outcome in self.lock_results().iter() {
            match outcome.status {
                TestStatus::Success(_) => summary.passed += 1,
                TestStatus::Failed(_) => summary.failed += 1,
                TestStatus::Error(_) => summary.errors += 1,
                TestStatus::NoReference => summary.missing_reference += 1,
            }
            summary.elapsed += outcome.elapsed;
        }
        summary
    }

    /// Run all pending tests, blocking until done.
    pub fn run_sync(&mut self) -> Result<RuntimeSummary, RuntimeError> {
        self.cancelled.store(false, Ordering::SeqCst);
        let pending = std::mem::take(&mut self.pending);
        let items = {
            let mut scheduler = self.lock_scheduler();
            for test in pending {
                scheduler.enqueue_test(test);
            }
            scheduler.drain_ordered()
        };
        tracing::info!(tests = items.len(), workers = self.config.worker_count, "running functional tests");

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.worker_count)
            .build()
            .map_err(|e| RuntimeError::ThreadPool(e.to_string()))?;

        let builders = &self.builders;
        let simulations = &self.simulations;
        let reference_dir = &self.config.reference_dir;
        let cancelled = &self.cancelled;
        let fail_fast = self.config.fail_fast;

        let outcomes: Vec<TestOutcome> = pool.install(|| {
            items
                .par_iter()
                .filter_map(|item| {
                    if cancelled.load(Ordering::SeqCst) {
                        return None;
                    }
                    let outcome = item.test.execute(builders, simulations, reference_dir);
                    if fail_fast && outcome.status.is_failure() {
                        cancelled.store(true, Ordering::SeqCst);
                    }
                    Some(outcome)
                })
                .collect()
        });

        self.lock_scheduler().mark_processed(outcomes.len());
        self.lock_results().extend(outcomes);
        let summary = self.summary();
        tracing::info!("{summary}");
        Ok(summary)
    }

    /// Run all pending tests on the tokio workers and return immediately.
    ///
    /// `worker_count` workers pull tests from the shared queue; each test
    /// runs on the blocking pool with the queue unlocked. `on_result` fires
    /// per finished test, `on_progress` with `(completed, total)`, and
    /// `on_complete` once after every worker has stopped.
    pub fn run_async<F, P, R>(&mut self, on_complete: F, on_progress: P, on_result: R) -> JoinHandle<()>
    where
        F: FnOnce(GisasStatus) + Send + 'static,
        P: Fn(usize, usize) + Send + Sync + 'static,
        R: Fn(&TestOutcome) + Send + Sync + 'static,
    {
        self.cancelled.store(false, Ordering::SeqCst);
        let pending = std::mem::take(&mut self.pending);
        let total = {
            let mut scheduler = self.lock_scheduler();
            for test in pending {
                scheduler.enqueue_test(test);
            }
            scheduler.len()
        };

        let workers = self.config.worker_count.max(1).min(total.max(1));
        tracing::info!(tests = total, workers, "running functional tests asynchronously");

        let shared = Arc::new(AsyncShared {
            scheduler: self.scheduler.clone(),
            results: self.results.clone(),
            cancelled: self.cancelled.clone(),
            builders: self.builders.clone(),
            simulations: self.simulations.clone(),
            reference_dir: self.config.reference_dir.clone(),
            fail_fast: self.config.fail_fast,
            completed: AtomicUsize::new(0),
            total,
        });
        let on_progress = Arc::new(on_progress);
        let on_result = Arc::new(on_result);

        self.tokio_runtime.spawn(async move {
            let handles: Vec<JoinHandle<Result<(), JoinError>>> = (0..workers)
                .map(|_| {
                    let shared = shared.clone();
                    let on_progress = on_progress.clone();
                    let on_result = on_result.clone();
                    tokio::spawn(async move {
                        while let Some(outcome) = shared.run_next().await? {
                            let completed = shared.completed.fetch_add(1, Ordering::SeqCst) + 1;
                            (*on_result)(&outcome);
                            (*on_progress)(completed, shared.total);
                            shared
                                .results
                                .lock()
                                .unwrap_or_else(PoisonError::into_inner)
                                .push(outcome);
                        }
                        Ok(())
                    })
                })
                .collect();

            let mut panicked = false;
            for handle in handles {
                match handle.await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) | Err(e) => {
                        tracing::error!(error = %e, "functional test worker panicked");
                        panicked = true;
                    }
                }
            }

            if panicked {
                on_complete(GisasStatus::RuntimeError);
            } else if shared.cancelled.load(Ordering::SeqCst) {
                on_complete(GisasStatus::Cancelled);
            } else {
                on_complete(GisasStatus::Ok);
            }
        })
    }

    /// Keep the handle of a run nobody awaits, so a panic in it surfaces in
    /// [`Runtime::wait_background`]. A handle still held is joined in the
    /// background and its failure logged.
    pub fn detach(&mut self, handle: JoinHandle<()>) {
        if let Some(previous) = self.background.replace(handle) {
            self.tokio_runtime.spawn(async move {
                if let Err(e) = previous.await {
                    tracing::error!(error = %e, "asynchronous functional test run panicked");
                }
            });
        }
    }

    /// Join the run stored by [`Runtime::detach`], if any.
    pub fn wait_background(&mut self) -> Result<(), RuntimeError> {
        match self.background.take() {
            Some(handle) => self.wait(handle),
            None => Ok(()),
        }
    }

    /// Block until an asynchronous run has finished.
    pub fn wait(&self, handle: JoinHandle<()>) -> Result<(), RuntimeError> {
        self.tokio_runtime
            .block_on(handle)
            .map_err(|e| RuntimeError::ThreadPool(e.to_string()))
    }

    /// Stop scheduling new tests. Tests already running finish.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Reset the runtime for reuse.
    pub fn reset(&mut self) {
        self.pending.clear();
        {
            let mut scheduler = self.lock_scheduler();
            scheduler.clear();
            scheduler.reset_stats();
        }
        self.lock_results().clear();
        self.cancelled.store(false, Ordering::SeqCst);
    }

    fn lock_scheduler(&self) -> std::sync::MutexGuard<'_, PriorityScheduler> {
        self.scheduler.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_results(&self) -> std::sync::MutexGuard<'_, Vec<TestOutcome>> {
        self.results.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(dir: &std::path::Path) -> RuntimeConfig {
        RuntimeConfig {
            worker_count: 2,
            reference_dir: dir.to_path_buf(),
            fail_fast: false,
        }
    }

    fn write_references(dir: &std::path::Path, tests: &[FunctionalTest]) {
        let builders = SampleBuilderRegistry::new_with_defaults();
        let simulations = SimulationRegistry::new_with_defaults();
        for test in tests {
            test.update_reference(&builders, &simulations, dir).unwrap();
        }
    }

    fn tests() -> Vec<FunctionalTest> {
        vec![
            FunctionalTest::new("CylindersInBA", "", "CylindersInBA", "MiniGISAS", 2e-10),
            FunctionalTest::new("SpheresInBA", "", "SpheresInBA", "MiniGISAS", 2e-10),
        ]
    }

    #[test]
    fn test_run_sync_passes_against_fresh_references() {
        let dir = tempfile::tempdir().unwrap();
        write_references(dir.path(), &tests());

        let mut runtime = Runtime::new(config(dir.path())).unwrap();
        runtime.add_tests(tests());
        runtime.add_test(FunctionalTest::new("Missing", "", "CylindersInBA", "MiniGISAS", 2e-10));
        let summary = runtime.run_sync().unwrap();

        assert_eq!(summary.passed, 2);
        assert_eq!(summary.missing_reference, 1);
        assert!(summary.all_passed());
        assert_eq!(runtime.completed_count(), 3);
        assert_eq!(runtime.pending_count(), 0);

        runtime.reset();
        assert_eq!(runtime.completed_count(), 0);
    }

    #[test]
    fn test_unknown_test_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut runtime = Runtime::new(config(dir.path())).unwrap();
        assert!(matches!(
            runtime.add_test_by_name("NoSuchTest"),
            Err(RuntimeError::UnknownTest(_))
        ));
        runtime.add_test_by_name("CylindersInBA").unwrap();
        assert_eq!(runtime.pending_count(), 1);
    }

    #[test]
    fn test_run_async_reports_progress() {
        let dir = tempfile::tempdir().unwrap();
        write_references(dir.path(), &tests());

        let mut runtime = Runtime::new(config(dir.path())).unwrap();
        runtime.add_tests(tests());

        let progress = Arc::new(AtomicUsize::new(0));
        let status = Arc::new(Mutex::new(None));
        let p = progress.clone();
        let s = status.clone();
        let handle = runtime.run_async(
            move |st| *s.lock().unwrap() = Some(st),
            move |done, total| {
                assert!(done <= total);
                p.store(done, Ordering::SeqCst);
            },
            |outcome| assert!(outcome.status.is_success(), "{outcome:?}"),
        );
        runtime.wait(handle).unwrap();

        assert_eq!(progress.load(Ordering::SeqCst), 2);
        assert_eq!(*status.lock().unwrap(), Some(GisasStatus::Ok));
        assert_eq!(runtime.failed_count(), 0);
    }

    #[test]
    fn test_run_async_runs_tests_concurrently() {
        let dir = tempfile::tempdir().unwrap();
        let mut runtime = Runtime::new(config(dir.path())).unwrap();
        runtime.add_tests(tests());

        // Each result callback waits for the other; a serial run never
        // delivers the second result while the first callback blocks.
        let arrived = Arc::new((Mutex::new(0usize), std::sync::Condvar::new()));
        let met = Arc::new(AtomicBool::new(false));
        let (a, m) = (arrived.clone(), met.clone());
        let handle = runtime.run_async(
            |_| {},
            |_, _| {},
            move |_| {
                let (count, ready) = &*a;
                let mut n = count.lock().unwrap();
                *n += 1;
                ready.notify_all();
                let (n, _) = ready
                    .wait_timeout_while(n, Duration::from_secs(10), |n| *n < 2)
                    .unwrap();
                if *n >= 2 {
                    m.store(true, Ordering::SeqCst);
                }
            },
        );
        runtime.wait(handle).unwrap();
        assert!(met.load(Ordering::SeqCst));
        assert_eq!(runtime.completed_count(), 2);
        assert_eq!(runtime.lock_scheduler().total_processed(), 2);
    }

    #[test]
    fn test_detached_panic_surfaces_on_wait() {
        let dir = tempfile::tempdir().unwrap();
        let mut runtime = Runtime::new(config(dir.path())).unwrap();
        let handle = runtime.run_async(|_| panic!("completion callback"), |_, _| {}, |_| {});
        runtime.detach(handle);
        assert!(matches!(runtime.wait_background(), Err(RuntimeError::ThreadPool(_))));
        assert!(runtime.wait_background().is_ok());
    }

    #[test]
    fn test_fail_fast_stops_after_failure() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Broken.int"), "").unwrap();

        let mut cfg = config(dir.path());
        cfg.worker_count = 1;
        cfg.fail_fast = true;
        let mut runtime = Runtime::new(cfg).unwrap();
        // The cheaper test runs first and fails on its unreadable reference.
        runtime.add_test(FunctionalTest::new("Broken", "", "CylindersInBA", "MiniGISAS", 2e-10));
        runtime.add_test(FunctionalTest::new("Later", "", "CylindersInDWBA", "BasicGISAS", 2e-10));
        let summary = runtime.run_sync().unwrap();

        assert_eq!(summary.errors, 1);
        assert_eq!(summary.total(), 1);
        assert!(!summary.all_passed());
    }
}
