/*

    Fixed worker pool draining a shared FIFO job queue under one
    mutex and one condition variable. Workers sleep between jobs,
    never spin, and execute jobs outside the lock.

    Contracts the renderer relies on:
    - shutdown() always joins every worker, even after job panics
    - a worker only exits once termination is signaled AND the
      queue has drained, so submitted work always runs to completion

*/

use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};

use tracing::{debug, error};

type Job = Box<dyn FnOnce() + Send + 'static>;

struct PoolState {
    jobs: VecDeque<Job>,
    should_terminate: bool,
}

struct PoolShared {
    state: Mutex<PoolState>,
    condvar: Condvar,
}

pub struct ThreadPool {
    shared: Arc<PoolShared>,
    workers: Vec<JoinHandle<()>>,
}

impl ThreadPool {

    /// Spawn a pool with an explicit worker count. Use 1 for a
    /// deterministic single-threaded run.
    pub fn start(num_threads: usize) -> Self {
        let num_threads = num_threads.max(1);
        let shared = Arc::new(PoolShared {
            state: Mutex::new(PoolState {
                jobs: VecDeque::new(),
                should_terminate: false,
            }),
            condvar: Condvar::new(),
        });

        let workers = (0..num_threads)
            .map(|_| {
                let shared = Arc::clone(&shared);
                thread::spawn(move || worker_loop(shared))
            })
            .collect();

        debug!("started worker pool with {num_threads} threads");
        Self { shared, workers }
    }

    /// One worker per hardware thread
    pub fn start_with_hardware_threads() -> Self {
        Self::start(hardware_parallelism())
    }

    pub fn thread_count(&self) -> usize {
        self.workers.len()
    }

    /// Enqueue a unit of work. Jobs must not submit to this pool and then
    /// block on the nested job, that can deadlock a fully busy pool.
    pub fn submit<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        {
            let mut state = self.shared.state.lock().expect("worker pool mutex poisoned");
            state.jobs.push_back(Box::new(job));
        }
        self.shared.condvar.notify_one();
    }

    /// Snapshot of the queue depth, only meaningful for progress reporting
    pub fn pending_count(&self) -> usize {
        let state = self.shared.state.lock().expect("worker pool mutex poisoned");
        state.jobs.len()
    }

    /// Signal termination, wake everyone and block until all workers exited.
    /// Queued jobs still run before the workers go down.
    pub fn shutdown(&mut self) {
        {
            let mut state = self.shared.state.lock().expect("worker pool mutex poisoned");
            state.should_terminate = true;
        }
        self.shared.condvar.notify_all();

        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                // Job panics are caught in the loop, this would be a bug
                error!("worker thread terminated abnormally");
            }
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        // Unconditional join, dropping a pool never leaks threads
        self.shutdown();
    }
}

fn worker_loop(shared: Arc<PoolShared>) {
    loop {
        let job = {
            let mut state = shared.state.lock().expect("worker pool mutex poisoned");
            while state.jobs.is_empty() && !state.should_terminate {
                state = shared
                    .condvar
                    .wait(state)
                    .expect("worker pool mutex poisoned");
            }
            match state.jobs.pop_front() {
                Some(job) => job,
                None => return, // terminating and drained
            }
        };

        // Run outside the lock, and keep a failing job from taking the
        // whole worker down with it, that would quietly starve the pool.
        if catch_unwind(AssertUnwindSafe(job)).is_err() {
            error!("a render job panicked, worker keeps running");
        }
    }
}

pub fn hardware_parallelism() -> usize {
    thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}
