//! The batch processing pipeline - framing, parallel dispatch, ordered
//! reassembly
//!
//! One producer runs the framer (PCM streams are inherently ordered), a
//! bounded worker pool transforms batches in parallel, and the writer
//! drains results strictly in submission order: each submitted batch gets
//! its own single-slot result channel, and the *receivers* are queued in
//! submission order. The writer blocks on the next unconsumed batch
//! specifically, never on "whichever finishes first", so the output can
//! never be reordered even though completion order is nondeterministic.
//!
//! Buffers move with single ownership: the framer gives a batch to a
//! worker, the worker's output moves to the writer, and the batch is
//! dropped right after its bytes are written.

mod framer;

pub use framer::BatchFramer;

use crate::batch::SampleBatch;
use crate::modifier::SampleModifier;
use crate::stream::{EngineError, PcmSink, PcmSource};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::thread;
use tracing::{debug, info};

type BatchResult = Result<(Vec<i16>, Vec<i16>), EngineError>;

/// One unit of work: a batch and the slot its result must land in
struct Job {
    batch: SampleBatch,
    result_tx: Sender<BatchResult>,
}

/// Counters reported after a completed run
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineStats {
    /// Batches transformed and written
    pub batches: u64,
    /// Frames consumed from the source
    pub frames_read: u64,
    /// Frames delivered to the sink
    pub frames_written: u64,
}

/// The batch scheduler and ordered reassembler
pub struct Pipeline {
    workers: usize,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    /// Pool sized for the machine: one worker per core plus slack for the
    /// I/O-bound codec work elsewhere in the process
    pub fn new() -> Self {
        let cores = thread::available_parallelism().map(|n| n.get()).unwrap_or(4);
        Self::with_workers(cores + 2)
    }

    /// Pool with an explicit worker count
    pub fn with_workers(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// Run `modifier` over every batch of `source`, writing ordered stereo
    /// output to `sink`.
    ///
    /// Any stream error or invariant violation aborts the run with nothing
    /// written beyond the batches already completed in order; the sink is
    /// finished on every exit path.
    pub fn run<S>(
        &self,
        source: S,
        sink: &mut dyn PcmSink,
        modifier: &dyn SampleModifier,
    ) -> Result<PipelineStats, EngineError>
    where
        S: PcmSource + Send,
    {
        let framer = BatchFramer::new(source, modifier.requested_time_ms())?;
        info!(
            modifier = %modifier.describe(),
            workers = self.workers,
            frames_per_batch = framer.frames_per_batch(),
            "starting pipeline"
        );

        let mut stats = PipelineStats::default();
        let run_result = self.run_scoped(framer, sink, modifier, &mut stats);
        let finish_result = sink.finish();
        run_result?;
        finish_result?;

        info!(
            batches = stats.batches,
            frames_read = stats.frames_read,
            frames_written = stats.frames_written,
            "pipeline complete"
        );
        Ok(stats)
    }

    fn run_scoped<S>(
        &self,
        mut framer: BatchFramer<S>,
        sink: &mut dyn PcmSink,
        modifier: &dyn SampleModifier,
        stats: &mut PipelineStats,
    ) -> Result<(), EngineError>
    where
        S: PcmSource + Send,
    {
        let (job_tx, job_rx) = bounded::<Job>(self.workers * 2);
        // Bounded reordering buffer: the producer stalls rather than racing
        // arbitrarily far ahead of the writer.
        let (pending_tx, pending_rx) = bounded::<Receiver<BatchResult>>(self.workers * 4);

        thread::scope(|scope| {
            for _ in 0..self.workers {
                let job_rx = job_rx.clone();
                scope.spawn(move || worker_loop(job_rx, modifier));
            }
            drop(job_rx);

            let producer = scope.spawn(move || -> Result<u64, EngineError> {
                let mut frames_read = 0u64;
                while let Some(batch) = framer.next_batch()? {
                    frames_read += batch.len() as u64;
                    let (result_tx, result_rx) = bounded::<BatchResult>(1);
                    let submitted = job_tx.send(Job { batch, result_tx }).is_ok()
                        && pending_tx.send(result_rx).is_ok();
                    if !submitted {
                        // the writer aborted and dropped its end
                        break;
                    }
                }
                Ok(frames_read)
            });

            // Ordered reassembly on the calling thread: always the oldest
            // unconsumed batch, in submission order.
            let mut write_error: Option<EngineError> = None;
            while let Ok(result_rx) = pending_rx.recv() {
                match result_rx.recv() {
                    Ok(Ok((left, right))) => match write_frames(sink, &left, &right) {
                        Ok(()) => {
                            stats.batches += 1;
                            stats.frames_written += left.len() as u64;
                            debug!(batch = stats.batches - 1, frames = left.len(), "batch written");
                        }
                        Err(e) => write_error = Some(e),
                    },
                    Ok(Err(e)) => write_error = Some(e),
                    Err(_) => write_error = Some(EngineError::WorkerGone),
                }
                if write_error.is_some() {
                    break;
                }
            }
            drop(pending_rx);

            let frames_read = producer.join().expect("framer thread panicked");
            if let Some(e) = write_error {
                return Err(e);
            }
            stats.frames_read = frames_read?;
            Ok(())
        })
    }
}

fn write_frames(sink: &mut dyn PcmSink, left: &[i16], right: &[i16]) -> Result<(), EngineError> {
    for (&l, &r) in left.iter().zip(right) {
        sink.write_frame(l, r)?;
    }
    Ok(())
}

fn worker_loop(jobs: Receiver<Job>, modifier: &dyn SampleModifier) {
    for job in jobs.iter() {
        let result = transform(job.batch, modifier);
        // the writer is gone if the run aborted; nothing left to deliver
        let _ = job.result_tx.send(result);
    }
}

/// Transform both channels of one batch, enforcing the cross-channel
/// length invariant
fn transform(batch: SampleBatch, modifier: &dyn SampleModifier) -> BatchResult {
    let SampleBatch { index, left, right } = batch;
    let left = modifier
        .modify(&left, index)
        .map_err(|source| EngineError::Modify { batch: index, source })?;
    let right = modifier
        .modify(&right, index)
        .map_err(|source| EngineError::Modify { batch: index, source })?;
    if left.len() != right.len() {
        return Err(EngineError::ChannelMismatch {
            batch: index,
            left: left.len(),
            right: right.len(),
        });
    }
    Ok((left, right))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifier::{ModifyError, SampleModifier};
    use crate::modifiers::{Identity, PatternBeatDropper};
    use crate::stream::{MemorySink, MemorySource};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Interleave a run of batches where every frame carries its batch index
    fn indexed_stream(batches: u64, frames_per_batch: usize) -> Vec<i16> {
        let mut samples = Vec::new();
        for index in 0..batches {
            for _ in 0..frames_per_batch {
                samples.push(index as i16);
                samples.push(-(index as i16));
            }
        }
        samples
    }

    #[test]
    fn test_identity_round_trip() {
        let input = indexed_stream(3, 4);
        let source = MemorySource::new(input.clone(), 1000, 2);
        let mut sink = MemorySink::new();
        // Identity requests 8192 ms -> 8192 frames at 1 kHz; one big batch
        let stats = Pipeline::with_workers(2)
            .run(source, &mut sink, &Identity::new())
            .unwrap();

        let interleaved: Vec<i16> = sink
            .frames()
            .iter()
            .flat_map(|&(l, r)| [l, r])
            .collect();
        assert_eq!(interleaved, input);
        assert!(sink.is_finished());
        assert_eq!(stats.frames_read, 12);
        assert_eq!(stats.frames_written, 12);
    }

    /// Finishes late batches first to prove the reassembler still writes in
    /// submission order
    struct ReverseLatency {
        batches: u64,
    }

    impl SampleModifier for ReverseLatency {
        fn describe(&self) -> String {
            "ReverseLatency".into()
        }

        fn requested_time_ms(&self) -> i64 {
            4
        }

        fn modify(&self, samples: &[i16], batch_index: u64) -> Result<Vec<i16>, ModifyError> {
            let remaining = self.batches.saturating_sub(batch_index);
            std::thread::sleep(Duration::from_millis(remaining * 3));
            Ok(samples.to_vec())
        }
    }

    #[test]
    fn test_output_stays_in_submission_order_under_reversed_completion() {
        let batches = 8;
        let source = MemorySource::new(indexed_stream(batches, 4), 1000, 2);
        let mut sink = MemorySink::new();
        Pipeline::with_workers(4)
            .run(source, &mut sink, &ReverseLatency { batches })
            .unwrap();

        let order: Vec<i16> = sink.frames().iter().map(|&(l, _)| l).collect();
        let expected: Vec<i16> = (0..batches as i16)
            .flat_map(|index| std::iter::repeat(index).take(4))
            .collect();
        assert_eq!(order, expected);
    }

    #[test]
    fn test_pattern_dropper_end_to_end() {
        // 4 batches of 4 frames; '1' keeps batches 0 and 2
        let source = MemorySource::new(indexed_stream(4, 4), 1000, 2);
        let mut sink = MemorySink::new();
        let dropper = PatternBeatDropper::new(15_000, "10").unwrap(); // 4 ms beats
        Pipeline::with_workers(3)
            .run(source, &mut sink, &dropper)
            .unwrap();

        let kept: Vec<i16> = sink.frames().iter().map(|&(l, _)| l).collect();
        assert_eq!(kept, vec![0, 0, 0, 0, 2, 2, 2, 2]);
    }

    #[test]
    fn test_mono_input_becomes_stereo_output() {
        let source = MemorySource::new(vec![5, 6, 7], 1000, 1);
        let mut sink = MemorySink::new();
        Pipeline::with_workers(1)
            .run(source, &mut sink, &Identity::new())
            .unwrap();
        assert_eq!(sink.frames(), &[(5, 5), (6, 6), (7, 7)]);
    }

    /// Deliberately desynchronized per-call state, to trip the
    /// cross-channel invariant
    struct Lopsided {
        calls: AtomicUsize,
    }

    impl SampleModifier for Lopsided {
        fn describe(&self) -> String {
            "Lopsided".into()
        }

        fn requested_time_ms(&self) -> i64 {
            4
        }

        fn modify(&self, samples: &[i16], _batch_index: u64) -> Result<Vec<i16>, ModifyError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let mut out = samples.to_vec();
            if call % 2 == 1 {
                out.push(0);
            }
            Ok(out)
        }
    }

    #[test]
    fn test_channel_length_mismatch_is_fatal() {
        let source = MemorySource::new(indexed_stream(2, 4), 1000, 2);
        let mut sink = MemorySink::new();
        let err = Pipeline::with_workers(1)
            .run(
                source,
                &mut sink,
                &Lopsided {
                    calls: AtomicUsize::new(0),
                },
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::ChannelMismatch { .. }));
        // the sink is still closed on abort
        assert!(sink.is_finished());
    }

    /// Fails on one specific batch
    struct FailOn {
        target: u64,
    }

    impl SampleModifier for FailOn {
        fn describe(&self) -> String {
            "FailOn".into()
        }

        fn requested_time_ms(&self) -> i64 {
            4
        }

        fn modify(&self, samples: &[i16], batch_index: u64) -> Result<Vec<i16>, ModifyError> {
            if batch_index == self.target {
                return Err(ModifyError::SelectionOutOfBounds {
                    low: 0,
                    high: 1,
                    len: 0,
                });
            }
            Ok(samples.to_vec())
        }
    }

    #[test]
    fn test_failed_batch_aborts_after_prior_batches() {
        let source = MemorySource::new(indexed_stream(6, 4), 1000, 2);
        let mut sink = MemorySink::new();
        let err = Pipeline::with_workers(2)
            .run(source, &mut sink, &FailOn { target: 2 })
            .unwrap_err();
        assert!(matches!(err, EngineError::Modify { batch: 2, .. }));
        // batches 0 and 1 were committed in order; nothing after the failure
        let written: Vec<i16> = sink.frames().iter().map(|&(l, _)| l).collect();
        assert_eq!(written, vec![0, 0, 0, 0, 1, 1, 1, 1]);
        assert!(sink.is_finished());
    }
}
