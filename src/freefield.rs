//! Free-field driver: schedules every source through every receiver.

use super::buffer::Buffer;
use super::directivity::DirectivityOps;
use super::point::distance;
use super::propagation::PropagationLine;
use super::receiver::Receiver;
use super::source::Source;
use super::{AttenuationType, InterpolationType, Sample, Time};

/// Walks simulated time sample by sample, routing each source through
/// one propagation line per receiver and accumulating the received
/// waves into per-receiver output buffers.
///
/// All `M x N` lines are sized at construction from the pairwise
/// distances; the steady-state loop does not allocate. Input blocks
/// shorter than the output are padded with zeros.
pub struct FreeFieldSim {
    // lines[source][receiver]
    lines: Vec<Vec<PropagationLine>>,
    sampling_frequency: Time,
}

impl FreeFieldSim {
    pub fn new<D: DirectivityOps>(
        sources: &[Source],
        receivers: &[Receiver<D>],
        sampling_frequency: Time,
    ) -> Self {
        assert!(!sources.is_empty(), "the simulation needs at least one source");
        assert!(
            !receivers.is_empty(),
            "the simulation needs at least one receiver"
        );
        assert!(
            sampling_frequency > 0.0,
            "the sampling frequency must be positive"
        );
        let mut max_distance: Sample = 0.0;
        for source in sources {
            for receiver in receivers {
                let d = distance(&source.position(), &receiver.position());
                max_distance = max_distance.max(d);
            }
        }
        let lines = sources
            .iter()
            .map(|source| {
                receivers
                    .iter()
                    .map(|receiver| {
                        PropagationLine::with_config(
                            distance(&source.position(), &receiver.position()),
                            sampling_frequency,
                            max_distance,
                            InterpolationType::Rounding,
                            AttenuationType::InverseSquareLaw,
                        )
                    })
                    .collect()
            })
            .collect();
        Self {
            lines,
            sampling_frequency,
        }
    }

    #[inline]
    pub fn sampling_frequency(&self) -> Time {
        self.sampling_frequency
    }

    /// The propagation line between `source` and `receiver`.
    pub fn line_mut(&mut self, source: usize, receiver: usize) -> &mut PropagationLine {
        &mut self.lines[source][receiver]
    }

    /// Retargets every line to the current pairwise distances, ramping
    /// over `ramp_time` seconds.
    pub fn update_distances<D: DirectivityOps>(
        &mut self,
        sources: &[Source],
        receivers: &[Receiver<D>],
        ramp_time: Time,
    ) {
        debug_assert_eq!(sources.len(), self.lines.len());
        for (source, lines) in sources.iter().zip(self.lines.iter_mut()) {
            debug_assert_eq!(receivers.len(), lines.len());
            for (receiver, line) in receivers.iter().zip(lines.iter_mut()) {
                line.set_distance(distance(&source.position(), &receiver.position()), ramp_time);
            }
        }
    }

    /// Runs the simulation over one output block. `inputs` holds one
    /// signal per source (shorter signals are zero padded); `outputs`
    /// one buffer per receiver, all of the same length, accumulated
    /// into. Wave ids equal source indices.
    pub fn process_block<D: DirectivityOps>(
        &mut self,
        inputs: &[&[Sample]],
        sources: &[Source],
        receivers: &mut [Receiver<D>],
        outputs: &mut [Buffer],
    ) {
        assert_eq!(inputs.len(), sources.len(), "one input signal per source");
        assert_eq!(sources.len(), self.lines.len());
        assert_eq!(receivers.len(), outputs.len(), "one output buffer per receiver");
        assert_eq!(receivers.len(), self.lines[0].len());
        let num_samples = outputs
            .iter()
            .map(|output| output.num_samples())
            .min()
            .unwrap_or(0);
        for k in 0..num_samples {
            for (i, source) in sources.iter().enumerate() {
                let x = if k < inputs[i].len() { inputs[i][k] } else { 0.0 };
                for (j, receiver) in receivers.iter_mut().enumerate() {
                    let line = &mut self.lines[i][j];
                    line.write(x);
                    let y = line.read();
                    let num_channels = outputs[j].num_channels();
                    let mut view = outputs[j].view_mut(0, num_channels, k, 1);
                    receiver.receive_and_add(&[y], source.position(), i, &mut view);
                }
            }
            for lines in self.lines.iter_mut() {
                for line in lines.iter_mut() {
                    line.tick();
                }
            }
        }
    }

    /// Zeroes the stored samples of every propagation line.
    pub fn reset_state(&mut self) {
        for lines in self.lines.iter_mut() {
            for line in lines.iter_mut() {
                line.reset_state();
            }
        }
    }
}
