//! Asynchronous pipeline submission.
//!
//! A single worker thread owns the pipeline and serves requests in the order
//! they were submitted. Callers get either a future or a completion callback;
//! neither path blocks the submitting thread.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::task::{Context, Poll};
use std::thread;

use futures::channel::oneshot;

use crate::clock::SimulationClock;
use crate::dispatch::Dispatcher;
use crate::error::{OceanError, Result};
use crate::params::SpectrumParameters;
use crate::pipeline::{DisplacementField, OceanPipeline};

type Callback = Box<dyn FnOnce(Result<DisplacementField>) + Send + 'static>;

enum Reply {
    Channel(oneshot::Sender<Result<DisplacementField>>),
    Callback(Callback),
}

struct Job {
    params: SpectrumParameters,
    time_s: f32,
    reply: Reply,
}

/// Displacement field that will be ready once the worker reaches the request
pub struct PendingDisplacement {
    receiver: oneshot::Receiver<Result<DisplacementField>>,
}

impl PendingDisplacement {
    /// Block the current thread until the result arrives
    pub fn wait(self) -> Result<DisplacementField> {
        pollster::block_on(self)
    }
}

impl Future for PendingDisplacement {
    type Output = Result<DisplacementField>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            // sender dropped without replying: the worker is gone
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Err(OceanError::WorkerClosed)),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Single ordered execution stream for pipeline runs
pub struct PipelineWorker {
    sender: Option<mpsc::Sender<Job>>,
    handle: Option<thread::JoinHandle<()>>,
    queued: Arc<AtomicUsize>,
}

impl PipelineWorker {
    /// Move `pipeline` onto a dedicated worker thread
    pub fn spawn<D: Dispatcher + 'static>(mut pipeline: OceanPipeline<D>) -> Result<Self> {
        let (sender, receiver) = mpsc::channel::<Job>();
        let queued = Arc::new(AtomicUsize::new(0));
        let worker_queued = Arc::clone(&queued);

        let handle = thread::Builder::new()
            .name("ocean-pipeline".into())
            .spawn(move || {
                log::debug!("pipeline worker started");
                for job in receiver {
                    let result = pipeline.compute_displacement(&job.params, job.time_s);
                    worker_queued.fetch_sub(1, Ordering::AcqRel);
                    match job.reply {
                        Reply::Channel(tx) => {
                            // receiver may have been dropped; nothing to notify
                            let _ = tx.send(result);
                        }
                        Reply::Callback(callback) => callback(result),
                    }
                }
                log::debug!("pipeline worker stopped");
            })?;

        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
            queued,
        })
    }

    /// Requests submitted but not yet finished
    pub fn queued(&self) -> usize {
        self.queued.load(Ordering::Acquire)
    }

    /// Run `frames` consecutive frames, handing each to `on_frame` in order
    ///
    /// At most `in_flight` requests are outstanding at once, so finished
    /// fields never pile up faster than `on_frame` consumes them.
    pub fn run_frames<F>(
        &self,
        params: &SpectrumParameters,
        clock: &mut SimulationClock,
        frames: usize,
        in_flight: usize,
        mut on_frame: F,
    ) -> Result<()>
    where
        F: FnMut(usize, DisplacementField) -> Result<()>,
    {
        let window = in_flight.max(1);
        let mut pending = VecDeque::with_capacity(window);
        let mut submitted = 0;

        while submitted < frames.min(window) {
            pending.push_back(self.submit(params.clone(), clock.tick()));
            submitted += 1;
        }

        let mut frame = 0;
        while let Some(request) = pending.pop_front() {
            let field = request.wait()?;
            if submitted < frames {
                pending.push_back(self.submit(params.clone(), clock.tick()));
                submitted += 1;
            }
            on_frame(frame, field)?;
            frame += 1;
        }
        Ok(())
    }

    /// Queue a run; the returned future resolves once it completes
    pub fn submit(&self, params: SpectrumParameters, time_s: f32) -> PendingDisplacement {
        let (tx, receiver) = oneshot::channel();
        // On failure the job (and `tx`) is dropped, so the future yields WorkerClosed
        let _ = self.send(Job {
            params,
            time_s,
            reply: Reply::Channel(tx),
        });
        PendingDisplacement { receiver }
    }

    /// Queue a run and invoke `callback` on the worker thread when it completes
    pub fn submit_with<F>(&self, params: SpectrumParameters, time_s: f32, callback: F) -> Result<()>
    where
        F: FnOnce(Result<DisplacementField>) + Send + 'static,
    {
        self.send(Job {
            params,
            time_s,
            reply: Reply::Callback(Box::new(callback)),
        })
    }

    fn send(&self, job: Job) -> Result<()> {
        let sender = self.sender.as_ref().ok_or(OceanError::WorkerClosed)?;
        self.queued.fetch_add(1, Ordering::AcqRel);
        sender.send(job).map_err(|_| {
            self.queued.fetch_sub(1, Ordering::AcqRel);
            OceanError::WorkerClosed
        })
    }
}

impl Drop for PipelineWorker {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain queued jobs and exit
        drop(self.sender.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("pipeline worker panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::SpectrumCache;
    use crate::dispatch::SerialDispatcher;
    use std::sync::{Arc, Mutex};

    fn worker() -> PipelineWorker {
        let cache = Arc::new(SpectrumCache::new(SerialDispatcher));
        PipelineWorker::spawn(OceanPipeline::new(cache)).unwrap()
    }

    fn params(n: usize) -> SpectrumParameters {
        SpectrumParameters {
            resolution: n,
            patch_length_m: 100.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_submit_resolves() {
        let worker = worker();
        let field = worker.submit(params(8), 0.0).wait().unwrap();
        assert_eq!(field.resolution.n(), 8);
        assert!(field.is_finite());
    }

    #[test]
    fn test_errors_travel_through_future() {
        let worker = worker();
        let result = worker.submit(params(6), 0.0).wait();
        assert!(matches!(result, Err(OceanError::InvalidResolution(6))));
    }

    #[test]
    fn test_requests_complete_in_order() {
        let worker = worker();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for i in 0..4 {
            let seen = Arc::clone(&seen);
            worker
                .submit_with(params(4), i as f32, move |result| {
                    seen.lock().unwrap().push(result.unwrap().time_s);
                })
                .unwrap();
        }
        // dropping joins the worker after it drains the queue
        drop(worker);
        assert_eq!(*seen.lock().unwrap(), vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_run_frames_bounds_outstanding_requests() {
        let worker = worker();
        let mut clock = SimulationClock::new(0.25);
        let mut times = Vec::new();
        worker
            .run_frames(&params(4), &mut clock, 10, 2, |frame, field| {
                assert_eq!(frame, times.len());
                assert!(worker.queued() <= 2, "queued {}", worker.queued());
                times.push(field.time_s);
                Ok(())
            })
            .unwrap();

        let expected: Vec<f32> = (0..10).map(|i| i as f32 * 0.25).collect();
        assert_eq!(times, expected);
        assert_eq!(worker.queued(), 0);
        assert_eq!(clock.frame(), 10);
    }

    #[test]
    fn test_run_frames_stops_on_first_error() {
        let worker = worker();
        let mut clock = SimulationClock::default();
        let mut calls = 0;
        let result = worker.run_frames(&params(5), &mut clock, 3, 2, |_, _| {
            calls += 1;
            Ok(())
        });
        assert!(matches!(result, Err(OceanError::InvalidResolution(5))));
        assert_eq!(calls, 0);
    }
}
