//! Synthetic capture pipeline.
//!
//! Generates patterned frames on a dedicated thread at a fixed interval,
//! honoring the begin/commit configuration bracket and the input/output
//! binding model. Interruptions and binding rejections are injectable so
//! harnesses can drive the lifecycle manager through its recovery paths.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use video_capture_core::{
    CaptureError, CapturePipeline, FrameCallback, InputBinding, OutputBinding, OutputSettings,
    PixelFormat, VideoDevice, VideoFrame, VideoOrientation,
};

struct OutputState {
    binding: OutputBinding,
    settings: OutputSettings,
    callback: FrameCallback,
    orientation: VideoOrientation,
    mirrored: bool,
}

#[derive(Default)]
struct PipelineState {
    next_binding: u64,
    config_depth: u32,
    inputs: Vec<(InputBinding, Arc<dyn VideoDevice>)>,
    output: Option<OutputState>,
    reject_input: bool,
    reject_output: bool,
}

/// Software stand-in for a hardware capture pipeline.
pub struct LoopbackPipeline {
    width: u32,
    height: u32,
    frame_interval: Duration,
    state: Arc<Mutex<PipelineState>>,
    running: Arc<AtomicBool>,
    interrupted: Arc<AtomicBool>,
    /// Bumped on every start/stop so a stale frame thread exits.
    generation: Arc<AtomicU64>,
    start_count: AtomicUsize,
    stop_count: AtomicUsize,
    frames_delivered: Arc<AtomicU64>,
}

impl LoopbackPipeline {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frame_interval: Duration::from_millis(1000 / 30),
            state: Arc::new(Mutex::new(PipelineState::default())),
            running: Arc::new(AtomicBool::new(false)),
            interrupted: Arc::new(AtomicBool::new(false)),
            generation: Arc::new(AtomicU64::new(0)),
            start_count: AtomicUsize::new(0),
            stop_count: AtomicUsize::new(0),
            frames_delivered: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Override the frame period (defaults to the 30 fps tick).
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    // --- injection controls ---

    /// Mark the pipeline preempted: `is_interrupted` reports true and
    /// frame delivery pauses until the interruption ends or the
    /// pipeline is restarted.
    pub fn begin_interruption(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
    }

    pub fn end_interruption(&self) {
        self.interrupted.store(false, Ordering::SeqCst);
    }

    pub fn set_reject_input(&self, reject: bool) {
        self.state.lock().reject_input = reject;
    }

    pub fn set_reject_output(&self, reject: bool) {
        self.state.lock().reject_output = reject;
    }

    // --- inspection ---

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn input_count(&self) -> usize {
        self.state.lock().inputs.len()
    }

    pub fn has_output(&self) -> bool {
        self.state.lock().output.is_some()
    }

    pub fn output_settings(&self) -> Option<OutputSettings> {
        self.state.lock().output.as_ref().map(|o| o.settings)
    }

    /// Orientation and mirroring last applied to the output connection.
    pub fn connection_settings(&self) -> Option<(VideoOrientation, bool)> {
        self.state
            .lock()
            .output
            .as_ref()
            .map(|o| (o.orientation, o.mirrored))
    }

    pub fn start_count(&self) -> usize {
        self.start_count.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.stop_count.load(Ordering::SeqCst)
    }

    pub fn frames_delivered(&self) -> u64 {
        self.frames_delivered.load(Ordering::SeqCst)
    }

    /// Open configuration brackets; zero when every begin has been
    /// committed.
    pub fn configuration_depth(&self) -> u32 {
        self.state.lock().config_depth
    }

    fn issue_binding(state: &mut PipelineState) -> u64 {
        state.next_binding += 1;
        state.next_binding
    }
}

impl CapturePipeline for LoopbackPipeline {
    fn begin_configuration(&self) {
        self.state.lock().config_depth += 1;
    }

    fn commit_configuration(&self) {
        let mut state = self.state.lock();
        state.config_depth = state.config_depth.saturating_sub(1);
    }

    fn add_input(&self, device: Arc<dyn VideoDevice>) -> Result<InputBinding, CaptureError> {
        let mut state = self.state.lock();
        if state.reject_input {
            return Err(CaptureError::ConfigurationFailed(
                "pipeline rejected input binding".into(),
            ));
        }
        let binding = InputBinding(Self::issue_binding(&mut state));
        log::debug!("input {} bound to device {}", binding.0, device.id());
        state.inputs.push((binding, device));
        Ok(binding)
    }

    fn remove_input(&self, binding: &InputBinding) {
        self.state.lock().inputs.retain(|(b, _)| b != binding);
    }

    fn add_output(
        &self,
        settings: OutputSettings,
        callback: FrameCallback,
    ) -> Result<OutputBinding, CaptureError> {
        let mut state = self.state.lock();
        if state.reject_output {
            return Err(CaptureError::ConfigurationFailed(
                "pipeline rejected output sink".into(),
            ));
        }
        let binding = OutputBinding(Self::issue_binding(&mut state));
        state.output = Some(OutputState {
            binding,
            settings,
            callback,
            orientation: VideoOrientation::Portrait,
            mirrored: false,
        });
        Ok(binding)
    }

    fn remove_output(&self, binding: &OutputBinding) {
        let mut state = self.state.lock();
        if state.output.as_ref().map(|o| o.binding) == Some(*binding) {
            state.output = None;
        }
    }

    fn configure_connection(
        &self,
        binding: &OutputBinding,
        orientation: VideoOrientation,
        mirrored: bool,
    ) {
        let mut state = self.state.lock();
        if let Some(output) = state.output.as_mut() {
            if output.binding == *binding {
                output.orientation = orientation;
                output.mirrored = mirrored;
            }
        }
    }

    fn start_running(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        // A freshly started session is no longer preempted.
        self.interrupted.store(false, Ordering::SeqCst);
        self.start_count.fetch_add(1, Ordering::SeqCst);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let running = Arc::clone(&self.running);
        let current_generation = Arc::clone(&self.generation);
        let interrupted = Arc::clone(&self.interrupted);
        let state = Arc::clone(&self.state);
        let frames = Arc::clone(&self.frames_delivered);
        let interval = self.frame_interval;
        let (width, height) = (self.width, self.height);

        let spawned = thread::Builder::new()
            .name("loopback-frames".into())
            .spawn(move || {
                let started = Instant::now();
                let mut sequence = 0u64;
                loop {
                    thread::sleep(interval);
                    if !running.load(Ordering::SeqCst)
                        || current_generation.load(Ordering::SeqCst) != generation
                    {
                        break;
                    }
                    if interrupted.load(Ordering::SeqCst) {
                        continue;
                    }
                    // Snapshot the callback outside the lock so a slow
                    // observer cannot block pipeline mutation.
                    let delivery = {
                        let st = state.lock();
                        if st.inputs.is_empty() {
                            None
                        } else {
                            st.output
                                .as_ref()
                                .map(|o| (Arc::clone(&o.callback), o.settings.pixel_format))
                        }
                    };
                    let Some((callback, pixel_format)) = delivery else {
                        continue;
                    };

                    sequence += 1;
                    let frame =
                        synthesize_frame(sequence, width, height, pixel_format, started.elapsed());
                    callback(&frame);
                    frames.fetch_add(1, Ordering::SeqCst);
                }
            });

        if let Err(err) = spawned {
            log::error!("failed to spawn frame thread: {}", err);
            self.running.store(false, Ordering::SeqCst);
        }
    }

    fn stop_running(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        self.stop_count.fetch_add(1, Ordering::SeqCst);
        // The frame thread exits on its next tick; no join, so callers
        // holding unrelated locks cannot deadlock against delivery.
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }
}

/// Fill a frame with a sequence-derived byte pattern.
fn synthesize_frame(
    sequence: u64,
    width: u32,
    height: u32,
    pixel_format: PixelFormat,
    timestamp: Duration,
) -> VideoFrame {
    let len = pixel_format.frame_len(width, height);
    let mut data = vec![0u8; len];
    for (i, byte) in data.iter_mut().enumerate() {
        *byte = (sequence as usize).wrapping_add(i) as u8;
    }
    VideoFrame {
        sequence,
        width,
        height,
        pixel_format,
        timestamp,
        data: data.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::LoopbackDevice;
    use video_capture_core::DevicePosition;

    fn fast_pipeline() -> LoopbackPipeline {
        LoopbackPipeline::new(8, 8).with_frame_interval(Duration::from_millis(2))
    }

    fn attach_io(pipeline: &LoopbackPipeline) -> (InputBinding, OutputBinding, Arc<AtomicU64>) {
        let device = LoopbackDevice::new("cam", DevicePosition::Front);
        let input = pipeline.add_input(device).unwrap();

        let seen = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&seen);
        let output = pipeline
            .add_output(
                OutputSettings {
                    pixel_format: PixelFormat::Bgra32,
                    discard_late_frames: true,
                },
                Arc::new(move |frame: &VideoFrame| {
                    assert_eq!(frame.data.len(), frame.pixel_format.frame_len(8, 8));
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .unwrap();
        (input, output, seen)
    }

    #[test]
    fn delivers_frames_while_running() {
        let pipeline = fast_pipeline();
        let (_input, _output, seen) = attach_io(&pipeline);

        pipeline.start_running();
        thread::sleep(Duration::from_millis(60));
        pipeline.stop_running();

        assert!(seen.load(Ordering::SeqCst) > 0);
        assert_eq!(pipeline.start_count(), 1);
        assert_eq!(pipeline.stop_count(), 1);
    }

    #[test]
    fn interruption_pauses_delivery() {
        let pipeline = fast_pipeline();
        let (_input, _output, seen) = attach_io(&pipeline);

        pipeline.start_running();
        thread::sleep(Duration::from_millis(40));
        pipeline.begin_interruption();
        assert!(pipeline.is_interrupted());
        thread::sleep(Duration::from_millis(20));

        let during = seen.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(40));
        assert_eq!(seen.load(Ordering::SeqCst), during);

        pipeline.end_interruption();
        thread::sleep(Duration::from_millis(40));
        assert!(seen.load(Ordering::SeqCst) > during);
        pipeline.stop_running();
    }

    #[test]
    fn restart_clears_interruption() {
        let pipeline = fast_pipeline();
        pipeline.begin_interruption();
        pipeline.start_running();
        assert!(!pipeline.is_interrupted());
        pipeline.stop_running();
    }

    #[test]
    fn rejection_flags_surface_errors() {
        let pipeline = fast_pipeline();
        pipeline.set_reject_input(true);
        let device = LoopbackDevice::new("cam", DevicePosition::Front);
        assert!(pipeline.add_input(device).is_err());

        pipeline.set_reject_output(true);
        let result = pipeline.add_output(
            OutputSettings {
                pixel_format: PixelFormat::Bgra32,
                discard_late_frames: true,
            },
            Arc::new(|_frame: &VideoFrame| {}),
        );
        assert!(result.is_err());
    }

    #[test]
    fn configuration_bracket_nests() {
        let pipeline = fast_pipeline();
        pipeline.begin_configuration();
        pipeline.begin_configuration();
        assert_eq!(pipeline.configuration_depth(), 2);
        pipeline.commit_configuration();
        pipeline.commit_configuration();
        assert_eq!(pipeline.configuration_depth(), 0);
    }

    #[test]
    fn removing_bindings_stops_delivery() {
        let pipeline = fast_pipeline();
        let (input, output, seen) = attach_io(&pipeline);

        pipeline.start_running();
        thread::sleep(Duration::from_millis(30));
        pipeline.remove_output(&output);
        pipeline.remove_input(&input);
        thread::sleep(Duration::from_millis(10));

        let after_removal = seen.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(seen.load(Ordering::SeqCst), after_removal);
        assert_eq!(pipeline.input_count(), 0);
        assert!(!pipeline.has_output());
        pipeline.stop_running();
    }
}
