use std::sync::{Arc, Weak};
use std::thread;

use parking_lot::Mutex;

use crate::models::config::CaptureConfig;
use crate::models::error::CaptureError;
use crate::models::state::CaptureState;
use crate::models::video_models::{InterruptionReason, MediaKind, VideoFrame, VideoOrientation};
use crate::traits::capture_observer::CaptureObserver;
use crate::traits::capture_pipeline::{
    CapturePipeline, FrameCallback, InputBinding, OutputBinding, OutputSettings,
};
use crate::traits::device_provider::DeviceProvider;
use crate::traits::event_source::{
    AppStateProvider, CaptureEvent, EventHandler, EventKind, EventSource, Subscription,
};
use crate::traits::permission_provider::PermissionProvider;

/// Internal mutable lifecycle state, protected by `parking_lot::Mutex`.
struct LifecycleState {
    state: CaptureState,
    permission_granted: bool,
    /// True exactly when the pipeline has been told to run and has not
    /// been told to stop. Independent of `state`: suspend pauses the
    /// hardware without clearing it.
    is_running: bool,
    /// Single-flight guard for delayed recovery.
    is_reconfiguring: bool,
    /// Whether an output sink is currently attached.
    video_available: bool,
    orientation: VideoOrientation,
    mirrored: bool,
    input: Option<InputBinding>,
    output: Option<OutputBinding>,
    subscriptions: Vec<Subscription>,
}

impl LifecycleState {
    fn new(config: &CaptureConfig) -> Self {
        Self {
            state: CaptureState::NotInitialized,
            permission_granted: false,
            is_running: false,
            is_reconfiguring: false,
            video_available: false,
            orientation: config.orientation,
            mirrored: config.mirror_output,
            input: None,
            output: None,
            subscriptions: Vec::new(),
        }
    }
}

struct ManagerInner {
    pipeline: Arc<dyn CapturePipeline>,
    devices: Arc<dyn DeviceProvider>,
    permissions: Arc<dyn PermissionProvider>,
    app_state: Arc<dyn AppStateProvider>,
    events: Arc<dyn EventSource>,
    state: Mutex<LifecycleState>,
    /// Weak single-slot observer, checked before every invocation.
    observer: Mutex<Option<Weak<dyn CaptureObserver>>>,
    config: CaptureConfig,
}

/// Owns the lifecycle of a hardware video-capture pipeline.
///
/// Handles permission acquisition, device selection, pipeline
/// configuration, start/stop/suspend/resume, and automatic recovery from
/// interruption or runtime error, while delivering captured frames to a
/// registered observer.
///
/// Construction requests video permission asynchronously; on grant the
/// manager configures itself and starts capturing without further caller
/// involvement. Callers are expected to serialize configuration-affecting
/// calls (start/suspend/resume/stop) onto a single context; the manager
/// does not order concurrent callers against each other.
pub struct CaptureLifecycleManager {
    inner: Arc<ManagerInner>,
}

impl CaptureLifecycleManager {
    /// Build a manager over the given collaborators and request video
    /// permission.
    ///
    /// Fails with `ConfigurationFailed` when the config is invalid.
    pub fn new(
        pipeline: Arc<dyn CapturePipeline>,
        devices: Arc<dyn DeviceProvider>,
        permissions: Arc<dyn PermissionProvider>,
        app_state: Arc<dyn AppStateProvider>,
        events: Arc<dyn EventSource>,
        config: CaptureConfig,
    ) -> Result<Self, CaptureError> {
        config.validate().map_err(CaptureError::ConfigurationFailed)?;

        let inner = Arc::new(ManagerInner {
            pipeline,
            devices,
            permissions,
            app_state,
            events,
            state: Mutex::new(LifecycleState::new(&config)),
            observer: Mutex::new(None),
            config,
        });

        let manager = Self { inner };
        if let Err(err) = manager.request_permissions() {
            log::warn!("initial permission request rejected: {}", err);
        }
        Ok(manager)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> CaptureState {
        self.inner.state.lock().state.clone()
    }

    pub fn permission_granted(&self) -> bool {
        self.inner.state.lock().permission_granted
    }

    /// Whether the pipeline has been told to run and not told to stop.
    /// Stays set across a suspend, which only pauses the hardware.
    pub fn is_running(&self) -> bool {
        self.inner.state.lock().is_running
    }

    /// Whether a delayed recovery is currently scheduled or executing.
    pub fn is_recovering(&self) -> bool {
        self.inner.state.lock().is_reconfiguring
    }

    /// Whether an output sink is attached and frames can flow.
    pub fn is_video_available(&self) -> bool {
        self.inner.state.lock().video_available
    }

    /// Register the observer. The manager keeps only a weak reference;
    /// dropping the observer silently stops delivery.
    pub fn set_observer<O: CaptureObserver + 'static>(&self, observer: &Arc<O>) {
        let dyn_observer: Arc<dyn CaptureObserver> = Arc::clone(observer) as Arc<dyn CaptureObserver>;
        let weak: Weak<dyn CaptureObserver> = Arc::downgrade(&dyn_observer);
        *self.inner.observer.lock() = Some(weak);
    }

    pub fn clear_observer(&self) {
        *self.inner.observer.lock() = None;
    }

    /// Ask the platform for video capture access.
    ///
    /// Legal only once, from `NotInitialized`; any later call fails with
    /// `AlreadyInitialized`. The grant decision arrives asynchronously:
    /// on grant the manager transitions to `Initialized`, notifies the
    /// observer and attempts an automatic start (failures of which are
    /// logged, not propagated, since no caller is waiting).
    pub fn request_permissions(&self) -> Result<(), CaptureError> {
        {
            let mut s = self.inner.state.lock();
            if !s.state.is_not_initialized() {
                return Err(CaptureError::AlreadyInitialized);
            }
            s.state = CaptureState::Initializing;
        }

        // The provider may invoke the completion inline on this thread;
        // the state lock must not be held here.
        let weak = Arc::downgrade(&self.inner);
        self.inner.permissions.request_access(
            MediaKind::Video,
            Box::new(move |granted| {
                if let Some(inner) = weak.upgrade() {
                    ManagerInner::permission_resolved(&inner, granted);
                }
            }),
        );
        Ok(())
    }

    /// Begin capturing.
    ///
    /// Configures the pipeline first when coming from `Initialized`;
    /// from `Configured` it (re)starts execution and sets the running
    /// flag. Fails with `NotInitialized` before the permission request,
    /// `PermissionDenied` without a grant, and surfaces
    /// `NoDeviceFound`/`ConfigurationFailed` from configuration, leaving
    /// the state at `Initialized` in that case.
    pub fn start_capturing(&self) -> Result<(), CaptureError> {
        ManagerInner::start_capturing(&self.inner)
    }

    /// Pause pipeline execution without releasing the configuration.
    ///
    /// The running flag stays set: only the underlying hardware session
    /// is halted. Fails with `NotRunning` unless the manager is
    /// `Configured` and running.
    pub fn suspend_capturing(&self) -> Result<(), CaptureError> {
        let s = self.inner.state.lock();
        if !(s.state.is_configured() && s.is_running) {
            return Err(CaptureError::NotRunning);
        }
        self.inner.pipeline.stop_running();
        Ok(())
    }

    /// Resume after a suspend. Fails with `NotRunning` unless the
    /// manager is `Configured`; otherwise equivalent to
    /// `start_capturing`.
    pub fn resume_capturing(&self) -> Result<(), CaptureError> {
        {
            let s = self.inner.state.lock();
            if !s.state.is_configured() {
                return Err(CaptureError::NotRunning);
            }
        }
        ManagerInner::start_capturing(&self.inner)
    }

    /// Halt pipeline execution and clear the running flag.
    /// Unconditional and idempotent; never fails.
    pub fn stop_capturing(&self) {
        let mut s = self.inner.state.lock();
        self.inner.pipeline.stop_running();
        s.is_running = false;
    }

    /// Change the output orientation, re-applying the connection
    /// settings inside a configuration bracket when a sink is attached.
    pub fn set_orientation(&self, orientation: VideoOrientation) {
        let mut s = self.inner.state.lock();
        s.orientation = orientation;
        self.inner.apply_connection_settings(&s);
    }

    /// Change output mirroring, usually on when previewing the front
    /// camera.
    pub fn set_mirroring(&self, mirrored: bool) {
        let mut s = self.inner.state.lock();
        s.mirrored = mirrored;
        self.inner.apply_connection_settings(&s);
    }
}

impl Drop for CaptureLifecycleManager {
    fn drop(&mut self) {
        let mut s = self.inner.state.lock();
        self.inner.pipeline.stop_running();
        s.is_running = false;
        // Releasing the handles unsubscribes from every event source.
        s.subscriptions.clear();
    }
}

impl ManagerInner {
    fn permission_resolved(inner: &Arc<Self>, granted: bool) {
        {
            let mut s = inner.state.lock();
            s.permission_granted = granted;
            if granted && matches!(s.state, CaptureState::Initializing) {
                s.state = CaptureState::Initialized;
            }
        }
        inner.notify_permission(granted);

        if granted {
            if let Err(err) = Self::start_capturing(inner) {
                log::warn!("auto-start after permission grant failed: {}", err);
            }
        } else {
            log::info!("video capture permission denied");
        }
    }

    fn start_capturing(inner: &Arc<Self>) -> Result<(), CaptureError> {
        let mut s = inner.state.lock();
        Self::start_locked(inner, &mut s)
    }

    fn start_locked(inner: &Arc<Self>, s: &mut LifecycleState) -> Result<(), CaptureError> {
        if s.state.is_not_initialized() {
            return Err(CaptureError::NotInitialized);
        }
        if !s.permission_granted {
            return Err(CaptureError::PermissionDenied);
        }
        if s.state.is_initialized() {
            Self::configure_pipeline(inner, s)?;
        }
        if s.state.is_configured() {
            inner.pipeline.start_running();
            s.is_running = true;
        }
        Ok(())
    }

    /// The configuration procedure, run inside a single begin/commit
    /// bracket on the pipeline: select a device, replace the input
    /// binding while pinning the frame rate under the device lock,
    /// attach the output sink, apply connection settings, subscribe to
    /// the interruption events, and transition to `Configured`.
    fn configure_pipeline(inner: &Arc<Self>, s: &mut LifecycleState) -> Result<(), CaptureError> {
        let _scope = ConfigurationScope::begin(inner.pipeline.as_ref());

        let device = inner
            .devices
            .video_device(inner.config.preferred_position)
            .or_else(|| inner.devices.default_video_device())
            .ok_or(CaptureError::NoDeviceFound)?;
        log::debug!("configuring capture pipeline with device {}", device.id());

        // Replace any existing input binding wholesale.
        if let Some(input) = s.input.take() {
            inner.pipeline.remove_input(&input);
        }

        let fps = inner.config.frame_rate;
        let input = {
            let mut lock = device.lock_for_configuration()?;
            let input = inner.pipeline.add_input(Arc::clone(&device))?;
            if let Err(err) = lock.set_frame_duration_bounds(fps, fps) {
                drop(lock);
                inner.pipeline.remove_input(&input);
                return Err(err);
            }
            input
        };
        s.input = Some(input);

        let settings = OutputSettings {
            pixel_format: inner.config.pixel_format,
            discard_late_frames: inner.config.discard_late_frames,
        };
        let callback = Self::frame_callback(Arc::downgrade(inner));
        let output = match inner.pipeline.add_output(settings, callback) {
            Ok(output) => output,
            Err(err) => {
                // A pipeline without a sink is useless: roll back the
                // input and surface the failure.
                if let Some(input) = s.input.take() {
                    inner.pipeline.remove_input(&input);
                }
                s.video_available = false;
                return Err(err);
            }
        };
        inner
            .pipeline
            .configure_connection(&output, s.orientation, s.mirrored);
        s.output = Some(output);

        // Subscribe exactly once; clearing the configuration releases
        // the handles, so recovery cannot stack duplicates.
        s.subscriptions = Self::subscribe_events(inner);

        s.video_available = true;
        s.state = CaptureState::Configured;
        log::info!("capture pipeline configured");
        Ok(())
    }

    fn subscribe_events(inner: &Arc<Self>) -> Vec<Subscription> {
        let weak = Arc::downgrade(inner);
        let handler: EventHandler = Arc::new(move |event| {
            if let Some(inner) = weak.upgrade() {
                ManagerInner::handle_event(&inner, event);
            }
        });
        EventKind::ALL
            .into_iter()
            .map(|kind| inner.events.subscribe(kind, Arc::clone(&handler)))
            .collect()
    }

    fn frame_callback(weak: Weak<Self>) -> FrameCallback {
        Arc::new(move |frame: &VideoFrame| {
            let Some(inner) = weak.upgrade() else { return };
            let observer = inner.observer.lock().as_ref().and_then(|w| w.upgrade());
            if let Some(observer) = observer {
                observer.frame_captured(frame);
            }
        })
    }

    fn notify_permission(&self, granted: bool) {
        let observer = self.observer.lock().as_ref().and_then(|w| w.upgrade());
        if let Some(observer) = observer {
            observer.permission_changed(granted);
        }
    }

    fn apply_connection_settings(&self, s: &LifecycleState) {
        let Some(output) = &s.output else { return };
        let _scope = ConfigurationScope::begin(self.pipeline.as_ref());
        self.pipeline
            .configure_connection(output, s.orientation, s.mirrored);
    }

    /// Decide whether an out-of-band event qualifies for recovery.
    ///
    /// Interruptions recover only for the audio-device-claimed reason;
    /// every path additionally requires a running pipeline and no
    /// recovery already in flight.
    fn handle_event(inner: &Arc<Self>, event: &CaptureEvent) {
        let qualifies = {
            let s = inner.state.lock();
            if s.is_reconfiguring {
                false
            } else {
                match event {
                    CaptureEvent::RuntimeError { description } => {
                        log::error!("capture pipeline runtime error: {}", description);
                        inner.app_state.is_foreground() && s.is_running
                    }
                    CaptureEvent::Interrupted { reason } => {
                        *reason == InterruptionReason::AudioDeviceInUseByAnotherClient
                            && inner.app_state.is_foreground()
                            && inner.pipeline.is_interrupted()
                            && s.is_running
                    }
                    CaptureEvent::InterruptionEnded => {
                        inner.app_state.is_foreground()
                            && inner.pipeline.is_interrupted()
                            && s.is_running
                    }
                    CaptureEvent::DidBecomeActive => {
                        s.permission_granted && inner.pipeline.is_interrupted() && s.is_running
                    }
                }
            }
        };

        if qualifies {
            Self::schedule_delayed_recovery(inner);
        }
    }

    /// Arm the one-shot delayed recovery. Bursts of qualifying events
    /// collapse into at most one pending recovery via the
    /// `is_reconfiguring` guard.
    fn schedule_delayed_recovery(inner: &Arc<Self>) {
        {
            let mut s = inner.state.lock();
            if s.is_reconfiguring {
                return;
            }
            s.is_reconfiguring = true;
        }

        let delay = inner.config.recovery_delay;
        let weak = Arc::downgrade(inner);
        let spawned = thread::Builder::new()
            .name("capture-recovery".into())
            .spawn(move || {
                thread::sleep(delay);
                let Some(inner) = weak.upgrade() else { return };
                ManagerInner::run_recovery(&inner);
            });

        if let Err(err) = spawned {
            log::error!("failed to spawn recovery thread: {}", err);
            inner.state.lock().is_reconfiguring = false;
        }
    }

    /// Fires after the recovery cooldown. When the pipeline is still
    /// marked running, performs the full rebuild (stop, clear
    /// configuration, reconfigure, restart); otherwise only clears the
    /// guard. Failures are logged and leave the manager in a queryable
    /// `Error` state.
    fn run_recovery(inner: &Arc<Self>) {
        let mut s = inner.state.lock();
        if !s.is_running {
            s.is_reconfiguring = false;
            return;
        }

        log::info!("capture pipeline recovery started");
        s.is_running = false;
        if s.video_available {
            s.state = CaptureState::Initialized;
        }
        inner.pipeline.stop_running();
        Self::clear_configuration(inner, &mut s);

        match Self::start_locked(inner, &mut s) {
            Ok(()) => log::info!("capture pipeline recovery finished"),
            Err(err) => {
                log::error!("capture recovery failed after interruption: {}", err);
                s.state = CaptureState::Error(err);
            }
        }
        s.is_reconfiguring = false;
    }

    /// Tear down the pipeline configuration inside a bracket, releasing
    /// both bindings and every event subscription.
    fn clear_configuration(inner: &Arc<Self>, s: &mut LifecycleState) {
        let _scope = ConfigurationScope::begin(inner.pipeline.as_ref());
        if let Some(output) = s.output.take() {
            inner.pipeline.remove_output(&output);
        }
        if let Some(input) = s.input.take() {
            inner.pipeline.remove_input(&input);
        }
        s.subscriptions.clear();
        s.video_available = false;
    }
}

/// Scoped begin/commit configuration bracket: committed on drop, so
/// every exit path (including errors) closes the transaction.
struct ConfigurationScope<'a> {
    pipeline: &'a dyn CapturePipeline,
}

impl<'a> ConfigurationScope<'a> {
    fn begin(pipeline: &'a dyn CapturePipeline) -> Self {
        pipeline.begin_configuration();
        Self { pipeline }
    }
}

impl Drop for ConfigurationScope<'_> {
    fn drop(&mut self) {
        self.pipeline.commit_configuration();
    }
}
