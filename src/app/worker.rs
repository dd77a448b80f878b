// worker.rs
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, SendError, Sender, SyncSender};
use std::thread;

use tracing::{info, warn};

use crate::app::image_processing::{self, ConversionResult};

/// Pending batches beyond this block the submitting thread.
pub const QUEUE_CAPACITY: usize = 16;

/// Files from one drop, with the output directory as it was when they were dropped.
#[derive(Clone, Debug)]
pub struct Batch {
    pub files: Vec<PathBuf>,
    pub output_dir: PathBuf,
}

/// Single background thread that runs dropped batches one at a time, in drop order.
pub struct ConversionWorker {
    jobs: SyncSender<Batch>,
}

impl ConversionWorker {
    /// Starts the worker. Each finished batch is sent on the returned receiver,
    /// then `notify` is called so the UI can wake up and pick it up.
    pub fn spawn<F>(notify: F) -> std::io::Result<(Self, Receiver<ConversionResult>)>
    where
        F: Fn() + Send + 'static,
    {
        let (jobs, job_receiver) = mpsc::sync_channel::<Batch>(QUEUE_CAPACITY);
        let (results, result_receiver) = mpsc::channel();

        thread::Builder::new()
            .name("conversion-worker".to_string())
            .spawn(move || run(job_receiver, results, notify))?;

        Ok((Self { jobs }, result_receiver))
    }

    pub fn submit(&self, batch: Batch) -> Result<(), SendError<Batch>> {
        self.jobs.send(batch)
    }
}

/// Where a dropped batch ended up.
#[derive(Debug)]
pub enum Dispatched {
    Queued,
    /// Ran on the calling thread because no worker could take it.
    Finished {
        result: ConversionResult,
        worker_lost: bool,
    },
}

/// Queues `batch` on `worker`, or converts it in place when the worker is missing or gone,
/// so every drop still ends with a result.
pub fn dispatch(worker: Option<&ConversionWorker>, batch: Batch) -> Dispatched {
    let (batch, worker_lost) = match worker {
        Some(worker) => match worker.submit(batch) {
            Ok(()) => return Dispatched::Queued,
            Err(SendError(batch)) => {
                warn!("Conversion worker stopped, converting on the UI thread");
                (batch, true)
            }
        },
        None => (batch, false),
    };
    Dispatched::Finished {
        result: image_processing::process(&batch.files, &batch.output_dir),
        worker_lost,
    }
}

fn run<F>(jobs: Receiver<Batch>, results: Sender<ConversionResult>, notify: F)
where
    F: Fn(),
{
    for batch in jobs {
        let result = image_processing::process(&batch.files, &batch.output_dir);
        if results.send(result).is_err() {
            warn!("Result receiver dropped, stopping conversion worker");
            return;
        }
        notify();
    }
    info!("Conversion worker shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::image_processing::tests::write_webp;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    const TIMEOUT: Duration = Duration::from_secs(30);

    #[test]
    fn batches_complete_in_submission_order() {
        let input_dir = tempfile::tempdir().unwrap();
        let output_dir = tempfile::tempdir().unwrap();
        let notified = Arc::new(AtomicUsize::new(0));
        let counter = notified.clone();
        let (worker, results) = ConversionWorker::spawn(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        let mut expected = Vec::new();
        for size in 1..=3 {
            let files: Vec<PathBuf> = (0..size)
                .map(|i| {
                    let path = input_dir.path().join(format!("b{size}_{i}.webp"));
                    write_webp(&path, 4, 4);
                    path
                })
                .collect();
            worker
                .submit(Batch {
                    files,
                    output_dir: output_dir.path().to_path_buf(),
                })
                .unwrap();
            expected.push(size);
        }

        let successes: Vec<usize> = (0..3)
            .map(|_| results.recv_timeout(TIMEOUT).unwrap().successful)
            .collect();
        assert_eq!(successes, expected);

        drop(worker);
        assert!(results.recv_timeout(TIMEOUT).is_err());
        assert_eq!(notified.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn empty_batch_still_reports() {
        let output_dir = tempfile::tempdir().unwrap();
        let notified = Arc::new(AtomicUsize::new(0));
        let counter = notified.clone();
        let (worker, results) = ConversionWorker::spawn(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        worker
            .submit(Batch {
                files: Vec::new(),
                output_dir: output_dir.path().to_path_buf(),
            })
            .unwrap();

        let result = results.recv_timeout(TIMEOUT).unwrap();
        assert_eq!(result, ConversionResult::default());

        drop(worker);
        assert!(results.recv_timeout(TIMEOUT).is_err());
        assert_eq!(notified.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dispatch_without_worker_converts_in_place() {
        let input_dir = tempfile::tempdir().unwrap();
        let output_dir = tempfile::tempdir().unwrap();
        let source = input_dir.path().join("inline.webp");
        write_webp(&source, 2, 2);

        let dispatched = dispatch(
            None,
            Batch {
                files: vec![source.clone()],
                output_dir: output_dir.path().to_path_buf(),
            },
        );

        match dispatched {
            Dispatched::Finished { result, worker_lost } => {
                assert_eq!(result.successful, 1);
                assert!(!worker_lost);
            }
            Dispatched::Queued => panic!("batch should not be queued without a worker"),
        }
        assert!(!source.exists());
    }

    #[test]
    fn dispatch_without_worker_reports_empty_batch() {
        let output_dir = tempfile::tempdir().unwrap();

        let dispatched = dispatch(
            None,
            Batch {
                files: Vec::new(),
                output_dir: output_dir.path().to_path_buf(),
            },
        );

        assert!(matches!(
            dispatched,
            Dispatched::Finished { result, .. } if result == ConversionResult::default()
        ));
    }

    #[test]
    fn dispatch_to_stopped_worker_converts_in_place() {
        let output_dir = tempfile::tempdir().unwrap();
        let (worker, results) = ConversionWorker::spawn(|| {}).unwrap();
        drop(results);

        // The worker exits once it finds nobody listening for results.
        worker
            .submit(Batch {
                files: Vec::new(),
                output_dir: output_dir.path().to_path_buf(),
            })
            .unwrap();
        let deadline = std::time::Instant::now() + TIMEOUT;
        let dispatched = loop {
            let batch = Batch {
                files: Vec::new(),
                output_dir: output_dir.path().to_path_buf(),
            };
            match dispatch(Some(&worker), batch) {
                Dispatched::Queued if std::time::Instant::now() < deadline => {
                    std::thread::sleep(Duration::from_millis(10))
                }
                other => break other,
            }
        };

        assert!(matches!(
            dispatched,
            Dispatched::Finished {
                worker_lost: true,
                ..
            }
        ));
    }

    #[test]
    fn dispatch_to_running_worker_queues() {
        let output_dir = tempfile::tempdir().unwrap();
        let (worker, results) = ConversionWorker::spawn(|| {}).unwrap();

        let dispatched = dispatch(
            Some(&worker),
            Batch {
                files: Vec::new(),
                output_dir: output_dir.path().to_path_buf(),
            },
        );

        assert!(matches!(dispatched, Dispatched::Queued));
        assert_eq!(results.recv_timeout(TIMEOUT).unwrap(), ConversionResult::default());
    }

    #[test]
    fn batch_uses_its_own_output_dir() {
        let input_dir = tempfile::tempdir().unwrap();
        let first_out = tempfile::tempdir().unwrap();
        let second_out = tempfile::tempdir().unwrap();
        let (worker, results) = ConversionWorker::spawn(|| {}).unwrap();

        for (name, out) in [("a.webp", &first_out), ("b.webp", &second_out)] {
            let path = input_dir.path().join(name);
            write_webp(&path, 2, 2);
            worker
                .submit(Batch {
                    files: vec![path],
                    output_dir: out.path().to_path_buf(),
                })
                .unwrap();
        }
        for _ in 0..2 {
            assert_eq!(results.recv_timeout(TIMEOUT).unwrap().successful, 1);
        }

        assert_eq!(std::fs::read_dir(first_out.path()).unwrap().count(), 1);
        assert_eq!(std::fs::read_dir(second_out.path()).unwrap().count(), 1);
    }
}
