//! Audio buffers with channel-major storage and borrowed sub-views.

use super::Sample;
use std::ops::{Deref, DerefMut};

/// Owns `num_channels x num_samples` samples in channel-major layout.
///
/// Read-only and mutable views of single channels are plain slices;
/// [`Buffer::view_mut`] hands out a sub-buffer sharing the storage, so
/// writes through the view are visible to the parent. The borrow
/// checker enforces that a view never outlives its buffer.
#[derive(Clone, Debug, Default)]
pub struct Buffer {
    data: Vec<Sample>,
    num_channels: usize,
    num_samples: usize,
}

impl Buffer {
    /// Creates a zero-initialised buffer.
    pub fn new(num_channels: usize, num_samples: usize) -> Self {
        assert!(num_channels > 0, "a buffer needs at least one channel");
        Self {
            data: vec![0.0; num_channels * num_samples],
            num_channels,
            num_samples,
        }
    }

    #[inline]
    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    #[inline]
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    #[inline]
    pub fn get_sample(&self, channel: usize, sample: usize) -> Sample {
        debug_assert!(channel < self.num_channels && sample < self.num_samples);
        self.data[channel * self.num_samples + sample]
    }

    #[inline]
    pub fn set_sample(&mut self, channel: usize, sample: usize, value: Sample) {
        debug_assert!(channel < self.num_channels && sample < self.num_samples);
        self.data[channel * self.num_samples + sample] = value;
    }

    #[inline]
    pub fn add_sample(&mut self, channel: usize, sample: usize, value: Sample) {
        debug_assert!(channel < self.num_channels && sample < self.num_samples);
        self.data[channel * self.num_samples + sample] += value;
    }

    /// Immutable slice over one channel.
    #[inline]
    pub fn get_read_view(&self, channel: usize) -> &[Sample] {
        let start = channel * self.num_samples;
        &self.data[start..start + self.num_samples]
    }

    /// Mutable slice over one channel.
    #[inline]
    pub fn get_write_view(&mut self, channel: usize) -> &mut [Sample] {
        let start = channel * self.num_samples;
        &mut self.data[start..start + self.num_samples]
    }

    /// Adds `other` into this buffer elementwise over the overlapping
    /// channel and sample range.
    pub fn add_buffer(&mut self, other: &Buffer) {
        debug_assert!(
            other.num_channels == self.num_channels && other.num_samples == self.num_samples,
            "buffer dimensions do not match"
        );
        if other.num_channels != self.num_channels || other.num_samples != self.num_samples {
            log::error!(
                "adding a {}x{} buffer into a {}x{} buffer; truncating",
                other.num_channels,
                other.num_samples,
                self.num_channels,
                self.num_samples
            );
        }
        for channel in 0..self.num_channels.min(other.num_channels) {
            for sample in 0..self.num_samples.min(other.num_samples) {
                self.add_sample(channel, sample, other.get_sample(channel, sample));
            }
        }
    }

    /// Zeroes every sample.
    pub fn reset(&mut self) {
        self.data.fill(0.0);
    }

    /// Mutable sub-buffer over the given channel and sample window.
    /// Writes through the view land in this buffer.
    pub fn view_mut(
        &mut self,
        first_channel: usize,
        num_channels: usize,
        first_sample: usize,
        num_samples: usize,
    ) -> BufferViewMut<'_> {
        assert!(first_channel + num_channels <= self.num_channels);
        assert!(first_sample + num_samples <= self.num_samples);
        let stride = self.num_samples;
        let start = first_channel * stride + first_sample;
        let end = start + (num_channels - 1) * stride + num_samples;
        BufferViewMut {
            data: &mut self.data[start..end],
            stride,
            num_channels,
            num_samples,
        }
    }

    /// Mutable view over the whole buffer.
    pub fn as_view_mut(&mut self) -> BufferViewMut<'_> {
        self.view_mut(0, self.num_channels, 0, self.num_samples)
    }

    /// Read-only sub-buffer over the given channel and sample window.
    pub fn view(
        &self,
        first_channel: usize,
        num_channels: usize,
        first_sample: usize,
        num_samples: usize,
    ) -> BufferView<'_> {
        assert!(first_channel + num_channels <= self.num_channels);
        assert!(first_sample + num_samples <= self.num_samples);
        let stride = self.num_samples;
        let start = first_channel * stride + first_sample;
        let end = start + (num_channels - 1) * stride + num_samples;
        BufferView {
            data: &self.data[start..end],
            stride,
            num_channels,
            num_samples,
        }
    }
}

/// Read-only window into a [`Buffer`].
#[derive(Debug)]
pub struct BufferView<'a> {
    data: &'a [Sample],
    stride: usize,
    num_channels: usize,
    num_samples: usize,
}

impl BufferView<'_> {
    #[inline]
    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    #[inline]
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    #[inline]
    pub fn get_sample(&self, channel: usize, sample: usize) -> Sample {
        debug_assert!(channel < self.num_channels && sample < self.num_samples);
        self.data[channel * self.stride + sample]
    }

    /// Immutable slice over one channel of the window.
    #[inline]
    pub fn channel(&self, channel: usize) -> &[Sample] {
        let start = channel * self.stride;
        &self.data[start..start + self.num_samples]
    }
}

/// Mutable window into a [`Buffer`]; the write target of receivers.
#[derive(Debug)]
pub struct BufferViewMut<'a> {
    data: &'a mut [Sample],
    stride: usize,
    num_channels: usize,
    num_samples: usize,
}

impl BufferViewMut<'_> {
    #[inline]
    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    #[inline]
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    #[inline]
    pub fn get_sample(&self, channel: usize, sample: usize) -> Sample {
        debug_assert!(channel < self.num_channels && sample < self.num_samples);
        self.data[channel * self.stride + sample]
    }

    #[inline]
    pub fn set_sample(&mut self, channel: usize, sample: usize, value: Sample) {
        debug_assert!(channel < self.num_channels && sample < self.num_samples);
        self.data[channel * self.stride + sample] = value;
    }

    #[inline]
    pub fn add_sample(&mut self, channel: usize, sample: usize, value: Sample) {
        debug_assert!(channel < self.num_channels && sample < self.num_samples);
        self.data[channel * self.stride + sample] += value;
    }

    /// Immutable slice over one channel of the window.
    #[inline]
    pub fn channel(&self, channel: usize) -> &[Sample] {
        let start = channel * self.stride;
        &self.data[start..start + self.num_samples]
    }

    /// Mutable slice over one channel of the window.
    #[inline]
    pub fn channel_mut(&mut self, channel: usize) -> &mut [Sample] {
        let start = channel * self.stride;
        &mut self.data[start..start + self.num_samples]
    }

    /// Narrows the view to a further sub-window.
    pub fn view_mut(
        &mut self,
        first_channel: usize,
        num_channels: usize,
        first_sample: usize,
        num_samples: usize,
    ) -> BufferViewMut<'_> {
        assert!(first_channel + num_channels <= self.num_channels);
        assert!(first_sample + num_samples <= self.num_samples);
        let stride = self.stride;
        let start = first_channel * stride + first_sample;
        let end = start + (num_channels - 1) * stride + num_samples;
        BufferViewMut {
            data: &mut self.data[start..end],
            stride,
            num_channels,
            num_samples,
        }
    }
}

/// A one-channel [`Buffer`].
#[derive(Clone, Debug, Default)]
pub struct MonoBuffer {
    buffer: Buffer,
}

impl MonoBuffer {
    pub fn new(num_samples: usize) -> Self {
        Self {
            buffer: Buffer::new(1, num_samples),
        }
    }

    /// Takes ownership of existing samples.
    pub fn from_samples(samples: Vec<Sample>) -> Self {
        let num_samples = samples.len();
        Self {
            buffer: Buffer {
                data: samples,
                num_channels: 1,
                num_samples,
            },
        }
    }

    #[inline]
    pub fn sample(&self, sample: usize) -> Sample {
        self.buffer.get_sample(0, sample)
    }

    #[inline]
    pub fn set(&mut self, sample: usize, value: Sample) {
        self.buffer.set_sample(0, sample, value);
    }

    #[inline]
    pub fn read_view(&self) -> &[Sample] {
        self.buffer.get_read_view(0)
    }

    #[inline]
    pub fn write_view(&mut self) -> &mut [Sample] {
        self.buffer.get_write_view(0)
    }
}

impl Deref for MonoBuffer {
    type Target = Buffer;
    fn deref(&self) -> &Buffer {
        &self.buffer
    }
}

impl DerefMut for MonoBuffer {
    fn deref_mut(&mut self) -> &mut Buffer {
        &mut self.buffer
    }
}

/// A two-channel [`Buffer`]; channel 0 is left, channel 1 is right.
#[derive(Clone, Debug, Default)]
pub struct StereoBuffer {
    buffer: Buffer,
}

impl StereoBuffer {
    pub fn new(num_samples: usize) -> Self {
        Self {
            buffer: Buffer::new(2, num_samples),
        }
    }

    #[inline]
    pub fn left_read_view(&self) -> &[Sample] {
        self.buffer.get_read_view(0)
    }

    #[inline]
    pub fn right_read_view(&self) -> &[Sample] {
        self.buffer.get_read_view(1)
    }

    #[inline]
    pub fn left_write_view(&mut self) -> &mut [Sample] {
        self.buffer.get_write_view(0)
    }

    #[inline]
    pub fn right_write_view(&mut self) -> &mut [Sample] {
        self.buffer.get_write_view(1)
    }
}

impl Deref for StereoBuffer {
    type Target = Buffer;
    fn deref(&self) -> &Buffer {
        &self.buffer
    }
}

impl DerefMut for StereoBuffer {
    fn deref_mut(&mut self) -> &mut Buffer {
        &mut self.buffer
    }
}
