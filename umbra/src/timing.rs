use std::mem;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use log::{debug, warn};

/// Exponential moving average; the first sample initializes it.
#[derive(Clone, Copy, Debug)]
pub struct RollingAverage {
    value: Option<f32>,
    alpha: f32,
}

impl RollingAverage {
    pub const ALPHA: f32 = 0.99;

    pub fn new(alpha: f32) -> Self {
        Self { value: None, alpha }
    }

    pub fn add(&mut self, sample: f32) {
        self.value = Some(match self.value {
            Some(value) => self.alpha * value + (1.0 - self.alpha) * sample,
            None => sample,
        });
    }

    pub fn get(&self) -> f32 {
        self.value.unwrap_or_default()
    }
}

impl Default for RollingAverage {
    fn default() -> Self {
        Self::new(Self::ALPHA)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ProbeState {
    /// Readback buffer is free; the next frame copies its timestamps there
    Idle,

    /// Copy into the readback buffer has been recorded, but not mapped yet
    Recorded,

    /// Readback buffer is being mapped
    Mapping,
}

const MAP_PENDING: u8 = 0;
const MAP_DONE: u8 = 1;
const MAP_FAILED: u8 = 2;

/// Measures how long the GPU spends on ambient occlusion, using timestamp
/// queries read back asynchronously.
#[derive(Debug)]
pub struct TimingProbe {
    query_set: wgpu::QuerySet,
    resolve_buffer: wgpu::Buffer,
    readback_buffer: wgpu::Buffer,
    period: f32,
    state: ProbeState,
    map_status: Arc<AtomicU8>,
    average: RollingAverage,
}

impl TimingProbe {
    const QUERIES: u32 = 2;
    const SIZE: u64 = (Self::QUERIES as u64) * mem::size_of::<u64>() as u64;

    /// Returns `None` when the device doesn't support timestamp queries.
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Option<Self> {
        if !device.features().contains(wgpu::Features::TIMESTAMP_QUERY) {
            warn!(
                "Device doesn't support timestamp queries; debug mode won't \
                 be available"
            );

            return None;
        }

        debug!("Initializing timing probe");

        let query_set = device.create_query_set(&wgpu::QuerySetDescriptor {
            label: Some("umbra_timing_queries"),
            ty: wgpu::QueryType::Timestamp,
            count: Self::QUERIES,
        });

        let resolve_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("umbra_timing_resolve"),
            size: Self::SIZE,
            usage: wgpu::BufferUsages::QUERY_RESOLVE
                | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let readback_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("umbra_timing_readback"),
            size: Self::SIZE,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        Some(Self {
            query_set,
            resolve_buffer,
            readback_buffer,
            period: queue.get_timestamp_period(),
            state: ProbeState::Idle,
            map_status: Arc::new(AtomicU8::new(MAP_PENDING)),
            average: Default::default(),
        })
    }

    /// Timestamp writes for a compute pass starting the measurement.
    pub fn compute_begin(&self) -> wgpu::ComputePassTimestampWrites<'_> {
        wgpu::ComputePassTimestampWrites {
            query_set: &self.query_set,
            beginning_of_pass_write_index: Some(0),
            end_of_pass_write_index: None,
        }
    }

    /// Timestamp writes for the render pass ending the measurement; when
    /// `begin` is set, the same pass starts it as well.
    pub fn render_end(&self, begin: bool) -> wgpu::RenderPassTimestampWrites<'_> {
        wgpu::RenderPassTimestampWrites {
            query_set: &self.query_set,
            beginning_of_pass_write_index: begin.then_some(0),
            end_of_pass_write_index: Some(1),
        }
    }

    /// Records copying this frame's timestamps into the readback buffer, if
    /// it's not still busy with the previous ones.
    pub fn resolve(&mut self, encoder: &mut wgpu::CommandEncoder) {
        encoder.resolve_query_set(
            &self.query_set,
            0..Self::QUERIES,
            &self.resolve_buffer,
            0,
        );

        if self.state == ProbeState::Idle {
            encoder.copy_buffer_to_buffer(
                &self.resolve_buffer,
                0,
                &self.readback_buffer,
                0,
                Self::SIZE,
            );

            self.state = ProbeState::Recorded;
        }
    }

    /// Advances the readback; must be called after the encoder passed to
    /// [`Self::resolve()`] has been submitted.
    ///
    /// Never blocks: if the data isn't there yet, the next call retries.
    pub fn poll(&mut self, device: &wgpu::Device) {
        if self.state == ProbeState::Recorded {
            let map_status = Arc::clone(&self.map_status);

            map_status.store(MAP_PENDING, Ordering::SeqCst);

            self.readback_buffer.slice(..).map_async(
                wgpu::MapMode::Read,
                move |result| {
                    let status = if result.is_ok() {
                        MAP_DONE
                    } else {
                        MAP_FAILED
                    };

                    map_status.store(status, Ordering::SeqCst);
                },
            );

            self.state = ProbeState::Mapping;
        }

        if self.state != ProbeState::Mapping {
            return;
        }

        device.poll(wgpu::Maintain::Poll);

        match self.map_status.load(Ordering::SeqCst) {
            MAP_DONE => {
                let ticks = {
                    let data = self.readback_buffer.slice(..).get_mapped_range();
                    let timestamps: &[u64] = bytemuck::cast_slice(&data);

                    timestamps[1].saturating_sub(timestamps[0])
                };

                self.readback_buffer.unmap();
                self.state = ProbeState::Idle;

                if ticks > 0 {
                    self.add_sample(ticks as f32 * self.period / 1_000_000.0);
                }
            }

            MAP_FAILED => {
                self.state = ProbeState::Idle;
            }

            _ => (),
        }
    }

    fn add_sample(&mut self, ms: f32) {
        self.average.add(ms);

        #[cfg(feature = "metrics")]
        log::trace!(
            "ao time: {} (avg: {})",
            humantime::format_duration(std::time::Duration::from_secs_f32(
                ms / 1000.0
            )),
            humantime::format_duration(std::time::Duration::from_secs_f32(
                self.average.get() / 1000.0
            )),
        );
    }

    /// Returns smoothed time spent on ambient occlusion, in milliseconds.
    pub fn last_time(&self) -> f32 {
        self.average.get()
    }
}
