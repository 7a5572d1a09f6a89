//! executor/accelerator.rs
//! AES-128 on a GPU-class device through a wgpu compute pipeline.
//!
//! Lifecycle per run:
//! `Uninitialized -> BuffersStaged -> KernelEncoded -> Executed -> Retrieved`.
//! Any other order is rejected with `InvalidState`. Device buffers live only
//! between `stage` and `retrieve`; `release` (and `Drop`) frees them on every
//! other exit path.

use std::sync::Arc;
use std::time::Instant;

use byteorder::{LittleEndian, WriteBytesExt};
use crossbeam::channel::bounded;
use tracing::{debug, error, info, warn};
use wgpu::util::DeviceExt;
use wgpu::wgt::PollType;

use crate::cipher::tables::{INV_S_BOX, S_BOX};
use crate::cipher::RoundKeySchedule;
use crate::constants::{BLOCK_SIZE, KERNEL_WORKGROUP_SIZE, NUM_ROUNDS};
use crate::executor::types::{Backend, Direction, Executor};
use crate::segmenting::{BlockSequence, OutputBuffer};
use crate::telemetry::{Stage, StageTimes};
use crate::types::CipherError;

/// rounds, block_count, row_stride, padding
const PARAMS_HEADER_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceleratorState {
    Uninitialized,
    BuffersStaged,
    KernelEncoded,
    Executed,
    Retrieved,
}

impl AcceleratorState {
    pub fn name(self) -> &'static str {
        match self {
            AcceleratorState::Uninitialized => "Uninitialized",
            AcceleratorState::BuffersStaged => "BuffersStaged",
            AcceleratorState::KernelEncoded => "KernelEncoded",
            AcceleratorState::Executed      => "Executed",
            AcceleratorState::Retrieved     => "Retrieved",
        }
    }
}

/// Workgroup grid covering `block_count` invocations.
///
/// Returns `(x, y)` workgroup counts. Folds into a second dimension once the
/// first exceeds `max_per_dim`; `None` if even that does not fit.
pub fn dispatch_grid(block_count: u32, max_per_dim: u32) -> Option<(u32, u32)> {
    let groups = block_count.div_ceil(KERNEL_WORKGROUP_SIZE);
    if groups <= max_per_dim {
        return Some((groups, 1));
    }
    let rows = groups.div_ceil(max_per_dim);
    (rows <= max_per_dim).then_some((max_per_dim, rows))
}

/// Parameter record read by the kernel: four little-endian u32 header words
/// followed by the 176 round-key bytes.
pub fn params_record(
    schedule: &RoundKeySchedule,
    block_count: u32,
    row_stride: u32,
) -> Result<Vec<u8>, CipherError> {
    let keys = schedule.as_bytes();
    let mut record = Vec::with_capacity(PARAMS_HEADER_LEN + keys.len());
    record.write_u32::<LittleEndian>(NUM_ROUNDS as u32)?;
    record.write_u32::<LittleEndian>(block_count)?;
    record.write_u32::<LittleEndian>(row_stride)?;
    record.write_u32::<LittleEndian>(0)?;
    record.extend_from_slice(keys);
    Ok(record)
}

/// Run `f` under out-of-memory, validation and internal error scopes.
///
/// The first error the device captured while `f` ran is returned through
/// `into_error`; otherwise `f`'s result.
fn capture_device_errors<T>(
    device: &wgpu::Device,
    into_error: fn(String) -> CipherError,
    f: impl FnOnce() -> T,
) -> Result<T, CipherError> {
    let oom = device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    let validation = device.push_error_scope(wgpu::ErrorFilter::Validation);
    let internal = device.push_error_scope(wgpu::ErrorFilter::Internal);

    let out = f();

    // Innermost scope first.
    let internal = pollster::block_on(internal.pop());
    let validation = pollster::block_on(validation.pop());
    let oom = pollster::block_on(oom.pop());

    match oom.or(validation).or(internal) {
        Some(e) => Err(into_error(e.to_string())),
        None => Ok(out),
    }
}

struct StagedBuffers {
    params: wgpu::Buffer,
    tables: wgpu::Buffer,
    input: wgpu::Buffer,
    output: wgpu::Buffer,
    readback: wgpu::Buffer,
    block_count: usize,
    grid: (u32, u32),
}

impl StagedBuffers {
    fn destroy(&self) {
        self.params.destroy();
        self.tables.destroy();
        self.input.destroy();
        self.output.destroy();
        self.readback.destroy();
    }
}

pub struct AcceleratorExecutor {
    device: wgpu::Device,
    queue: wgpu::Queue,
    encrypt_pipeline: wgpu::ComputePipeline,
    decrypt_pipeline: wgpu::ComputePipeline,
    limits: wgpu::Limits,
    adapter_name: String,
    state: AcceleratorState,
    staged: Option<StagedBuffers>,
    encoded: Option<wgpu::CommandBuffer>,
}

impl AcceleratorExecutor {
    /// Acquire an adapter and device and build both kernels.
    pub fn new(power_preference: wgpu::PowerPreference) -> Result<Self, CipherError> {
        pollster::block_on(Self::request(power_preference))
    }

    async fn request(power_preference: wgpu::PowerPreference) -> Result<Self, CipherError> {
        let instance = wgpu::Instance::default();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| CipherError::DeviceUnavailable(format!("adapter request failed: {e}")))?;

        let info = adapter.get_info();
        debug!(adapter = %info.name, backend = ?info.backend, "compute adapter selected");

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("aes128-device"),
                required_features: wgpu::Features::empty(),
                required_limits: adapter.limits(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
                experimental_features: wgpu::ExperimentalFeatures::default(),
            })
            .await
            .map_err(|e| CipherError::DeviceUnavailable(format!("device request failed: {e}")))?;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("aes128-kernel"),
            source: wgpu::ShaderSource::Wgsl(include_str!("aes_kernel.wgsl").into()),
        });

        let pipeline = |entry_point: &str| {
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(entry_point),
                layout: None,
                module: &shader,
                entry_point: Some(entry_point),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                cache: None,
            })
        };
        let encrypt_pipeline = pipeline("encrypt_main");
        let decrypt_pipeline = pipeline("decrypt_main");

        // Errors outside a scope are logged, never panicked on.
        device.on_uncaptured_error(Arc::new(|e: wgpu::Error| {
            error!(error = %e, "uncaptured device error");
        }));

        let limits = device.limits();

        Ok(Self {
            device,
            queue,
            encrypt_pipeline,
            decrypt_pipeline,
            limits,
            adapter_name: info.name,
            state: AcceleratorState::Uninitialized,
            staged: None,
            encoded: None,
        })
    }

    pub fn state(&self) -> AcceleratorState {
        self.state
    }

    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    /// True while device buffers are held.
    pub fn is_staged(&self) -> bool {
        self.staged.is_some()
    }

    fn expect_state(&self, expected: AcceleratorState) -> Result<(), CipherError> {
        if self.state != expected {
            return Err(CipherError::InvalidState {
                expected: expected.name(),
                found: self.state.name(),
            });
        }
        Ok(())
    }

    /// Copy the parameter record, S-box tables and blocks into device buffers
    /// and allocate the output and readback buffers.
    pub fn stage(
        &mut self,
        schedule: &RoundKeySchedule,
        blocks: &BlockSequence,
    ) -> Result<(), CipherError> {
        if !matches!(
            self.state,
            AcceleratorState::Uninitialized | AcceleratorState::Retrieved
        ) {
            return Err(CipherError::InvalidState {
                expected: "Uninitialized or Retrieved",
                found: self.state.name(),
            });
        }

        let block_count = u32::try_from(blocks.len()).map_err(|_| {
            CipherError::AllocationFailure(format!("{} blocks exceed a 32-bit index", blocks.len()))
        })?;

        let max_per_dim = self.limits.max_compute_workgroups_per_dimension;
        let grid = dispatch_grid(block_count, max_per_dim).ok_or_else(|| {
            CipherError::AllocationFailure(format!(
                "{block_count} blocks exceed the dispatch grid ({max_per_dim} per dimension)"
            ))
        })?;

        // Zero-sized bindings are invalid; an empty run still stages one block.
        let data_len = blocks.byte_len().max(BLOCK_SIZE) as u64;
        let binding_limit = u64::from(self.limits.max_storage_buffer_binding_size);
        if data_len > binding_limit || data_len > self.limits.max_buffer_size {
            return Err(CipherError::AllocationFailure(format!(
                "{data_len} bytes exceed device limits (binding {binding_limit}, buffer {})",
                self.limits.max_buffer_size
            )));
        }

        let row_stride = grid.0 * KERNEL_WORKGROUP_SIZE;
        let params = params_record(schedule, block_count, row_stride)?;

        let mut tables = Vec::with_capacity(S_BOX.len() + INV_S_BOX.len());
        tables.extend_from_slice(&S_BOX);
        tables.extend_from_slice(&INV_S_BOX);

        let input_bytes: Vec<u8> = if blocks.is_empty() {
            vec![0u8; BLOCK_SIZE]
        } else {
            blocks.as_bytes().to_vec()
        };

        let device = &self.device;
        let (params, tables, input, output, readback) =
            capture_device_errors(device, CipherError::AllocationFailure, || {
                let init = |label: &str, contents: &[u8]| {
                    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some(label),
                        contents,
                        usage: wgpu::BufferUsages::STORAGE,
                    })
                };
                let empty = |label: &str, usage: wgpu::BufferUsages| {
                    device.create_buffer(&wgpu::BufferDescriptor {
                        label: Some(label),
                        size: data_len,
                        usage,
                        mapped_at_creation: false,
                    })
                };
                (
                    init("aes128-params", &params),
                    init("aes128-tables", &tables),
                    init("aes128-input", &input_bytes),
                    empty("aes128-output", wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC),
                    empty("aes128-readback", wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST),
                )
            })?;

        debug!(blocks = blocks.len(), grid_x = grid.0, grid_y = grid.1, "buffers staged");

        self.staged = Some(StagedBuffers {
            params,
            tables,
            input,
            output,
            readback,
            block_count: blocks.len(),
            grid,
        });
        self.encoded = None;
        self.state = AcceleratorState::BuffersStaged;
        Ok(())
    }

    /// Record one dispatch of the kernel for `direction` plus the copy into
    /// the readback buffer.
    pub fn encode(&mut self, direction: Direction) -> Result<(), CipherError> {
        self.expect_state(AcceleratorState::BuffersStaged)?;
        let staged = self.staged.as_ref().ok_or(CipherError::InvalidState {
            expected: AcceleratorState::BuffersStaged.name(),
            found: self.state.name(),
        })?;

        let pipeline = match direction {
            Direction::Encrypt => &self.encrypt_pipeline,
            Direction::Decrypt => &self.decrypt_pipeline,
        };

        let device = &self.device;
        let commands = capture_device_errors(device, CipherError::AcceleratorExecutionFailure, || {
            let layout = pipeline.get_bind_group_layout(0);
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("aes128-bind-group"),
                layout: &layout,
                entries: &[
                    wgpu::BindGroupEntry { binding: 0, resource: staged.params.as_entire_binding() },
                    wgpu::BindGroupEntry { binding: 1, resource: staged.tables.as_entire_binding() },
                    wgpu::BindGroupEntry { binding: 2, resource: staged.input.as_entire_binding() },
                    wgpu::BindGroupEntry { binding: 3, resource: staged.output.as_entire_binding() },
                ],
            });

            let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("aes128-encoder"),
            });

            let (groups_x, groups_y) = staged.grid;
            if groups_x > 0 {
                let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                    label: Some("aes128-pass"),
                    timestamp_writes: None,
                });
                pass.set_pipeline(pipeline);
                pass.set_bind_group(0, &bind_group, &[]);
                pass.dispatch_workgroups(groups_x, groups_y, 1);
            }

            let copy_len = (staged.block_count * BLOCK_SIZE) as u64;
            if copy_len > 0 {
                encoder.copy_buffer_to_buffer(&staged.output, 0, &staged.readback, 0, copy_len);
            }

            encoder.finish()
        })?;

        self.encoded = Some(commands);
        self.state = AcceleratorState::KernelEncoded;
        Ok(())
    }

    /// Submit the recorded work and block until the device is idle.
    pub fn execute(&mut self) -> Result<(), CipherError> {
        self.expect_state(AcceleratorState::KernelEncoded)?;
        let commands = self.encoded.take().ok_or(CipherError::InvalidState {
            expected: AcceleratorState::KernelEncoded.name(),
            found: self.state.name(),
        })?;

        let queue = &self.queue;
        capture_device_errors(&self.device, CipherError::AcceleratorExecutionFailure, || {
            queue.submit(Some(commands));
        })?;
        self.wait()?;

        self.state = AcceleratorState::Executed;
        Ok(())
    }

    /// Map the readback buffer and copy it into a host output buffer.
    /// Device buffers are released afterwards.
    pub fn retrieve(&mut self) -> Result<OutputBuffer, CipherError> {
        self.expect_state(AcceleratorState::Executed)?;
        let staged = self.staged.as_ref().ok_or(CipherError::InvalidState {
            expected: AcceleratorState::Executed.name(),
            found: self.state.name(),
        })?;

        let block_count = staged.block_count;
        let len = (block_count * BLOCK_SIZE) as u64;
        let bytes = if len == 0 {
            Vec::new()
        } else {
            let slice = staged.readback.slice(..len);
            let (tx, rx) = bounded(1);
            slice.map_async(wgpu::MapMode::Read, move |result| {
                let _ = tx.send(result);
            });
            self.wait()?;

            rx.recv()
                .map_err(|_| {
                    CipherError::AcceleratorExecutionFailure("map callback never fired".into())
                })?
                .map_err(|e| {
                    CipherError::AcceleratorExecutionFailure(format!("readback map failed: {e}"))
                })?;

            let mapped = slice.get_mapped_range();
            let bytes = mapped.to_vec();
            drop(mapped);
            staged.readback.unmap();
            bytes
        };

        let out = OutputBuffer::from_bytes(bytes, block_count)?;
        self.release_buffers();
        self.state = AcceleratorState::Retrieved;
        Ok(out)
    }

    /// Free device buffers and return to `Uninitialized`.
    pub fn release(&mut self) {
        self.release_buffers();
        self.state = AcceleratorState::Uninitialized;
    }

    fn release_buffers(&mut self) {
        self.encoded = None;
        if let Some(staged) = self.staged.take() {
            staged.destroy();
        }
    }

    fn wait(&self) -> Result<(), CipherError> {
        self.device
            .poll(PollType::Wait {
                submission_index: None,
                timeout: None,
            })
            .map(|_| ())
            .map_err(|e| CipherError::AcceleratorExecutionFailure(format!("device poll failed: {e:?}")))
    }

    fn run_stages(
        &mut self,
        blocks: &BlockSequence,
        schedule: &RoundKeySchedule,
        direction: Direction,
        times: &mut StageTimes,
    ) -> Result<OutputBuffer, CipherError> {
        let start = Instant::now();
        self.stage(schedule, blocks)?;
        times.add(Stage::Upload, start.elapsed());

        let start = Instant::now();
        self.encode(direction)?;
        times.add(Stage::Encode, start.elapsed());

        let start = Instant::now();
        self.execute()?;
        times.add(direction.stage(), start.elapsed());

        let start = Instant::now();
        let out = self.retrieve()?;
        times.add(Stage::Readback, start.elapsed());
        Ok(out)
    }
}

impl Executor for AcceleratorExecutor {
    fn run(
        &mut self,
        blocks: &BlockSequence,
        schedule: &RoundKeySchedule,
        direction: Direction,
        times: &mut StageTimes,
    ) -> Result<OutputBuffer, CipherError> {
        if blocks.is_empty() {
            return Ok(OutputBuffer::zeroed(0));
        }

        info!(adapter = %self.adapter_name, blocks = blocks.len(), %direction, "accelerator run");
        let result = self.run_stages(blocks, schedule, direction, times);
        if let Err(e) = &result {
            warn!(error = %e, "accelerator run failed, releasing device buffers");
            self.release();
        }
        result
    }

    fn backend(&self) -> Backend {
        Backend::Accelerator
    }
}

impl Drop for AcceleratorExecutor {
    fn drop(&mut self) {
        self.release_buffers();
    }
}
