use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use orrery_common::RenderHandle;
use orrery_kernel::OrbitalSystem;

use crate::camera::Camera;
use crate::service::{RenderError, RenderService};
use crate::viewport::{DisplaySurface, check_resize};

/// Asks the host to run one more step at its next display refresh.
pub trait Scheduler {
    fn request_frame(&mut self);
}

/// Headless scheduler: remembers whether a frame is pending.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameQueue {
    pending: bool,
    requested: u64,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the pending request, if any.
    pub fn take(&mut self) -> bool {
        std::mem::replace(&mut self.pending, false)
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Total number of frame requests received.
    pub fn requested(&self) -> u64 {
        self.requested
    }
}

impl Scheduler for FrameQueue {
    fn request_frame(&mut self) {
        self.pending = true;
        self.requested += 1;
    }
}

/// Shared stop flag. Clones observe the same flag, so another thread or a
/// signal handler can end the loop.
#[derive(Debug, Default, Clone)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    Stopped,
}

/// What a single [`RenderLoop::step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// A frame was drawn for `tick` and the next one was requested.
    Drawn { tick: u64, resized: bool },
    /// Cancellation was observed; nothing was drawn or rescheduled.
    Stopped,
    /// The loop was not running.
    NotRunning,
}

/// Everything one scene needs per frame, owned in one place.
#[derive(Debug)]
pub struct SceneContext<R, C, S> {
    pub system: OrbitalSystem,
    pub camera: C,
    pub renderer: R,
    pub surface: S,
}

/// Self-rescheduling frame driver.
///
/// Every step checks the surface size, advances the kinematics by one tick,
/// pushes placements into the rendering service, draws, and asks the
/// scheduler for the next frame.
#[derive(Debug)]
pub struct RenderLoop<R, C, S> {
    ctx: SceneContext<R, C, S>,
    state: LoopState,
    token: CancelToken,
    handles: Vec<RenderHandle>,
    frames: u64,
}

impl<R, C, S> RenderLoop<R, C, S>
where
    R: RenderService,
    C: Camera,
    S: DisplaySurface,
{
    pub fn new(mut ctx: SceneContext<R, C, S>) -> Self {
        let size = ctx.surface.backing_size();
        ctx.camera.set_aspect(size.aspect());
        ctx.camera.recompute_projection();
        let handles = ctx.system.placements().map(|p| p.handle).collect();
        Self {
            ctx,
            state: LoopState::Idle,
            token: CancelToken::new(),
            handles,
            frames: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn context(&self) -> &SceneContext<R, C, S> {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut SceneContext<R, C, S> {
        &mut self.ctx
    }

    pub fn into_context(self) -> SceneContext<R, C, S> {
        self.ctx
    }

    /// A clone of the loop's stop flag.
    pub fn cancel_token(&self) -> CancelToken {
        self.token.clone()
    }

    /// Frames drawn since construction.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Move from `Idle` to `Running` and request the first frame.
    /// Returns `false` in any other state.
    pub fn start(&mut self, scheduler: &mut impl Scheduler) -> bool {
        if self.state != LoopState::Idle {
            return false;
        }
        if self.token.is_cancelled() {
            self.state = LoopState::Stopped;
            return false;
        }
        self.state = LoopState::Running;
        tracing::info!(
            handles = self.handles.len(),
            tick = self.ctx.system.tick(),
            "render loop started"
        );
        scheduler.request_frame();
        true
    }

    /// Request teardown. A running loop stops at the top of its next step.
    pub fn stop(&mut self) {
        self.token.cancel();
        if self.state == LoopState::Idle {
            self.state = LoopState::Stopped;
            tracing::info!(frames = self.frames, "render loop stopped before start");
        }
    }

    pub fn step(&mut self, scheduler: &mut impl Scheduler) -> Result<StepOutcome, RenderError> {
        if self.state != LoopState::Running {
            return Ok(StepOutcome::NotRunning);
        }
        if self.token.is_cancelled() {
            self.state = LoopState::Stopped;
            tracing::info!(
                frames = self.frames,
                tick = self.ctx.system.tick(),
                "render loop stopped"
            );
            return Ok(StepOutcome::Stopped);
        }

        let _span = tracing::trace_span!("frame", n = self.frames).entered();
        match self.draw_frame() {
            Ok(outcome) => {
                self.frames += 1;
                scheduler.request_frame();
                Ok(outcome)
            }
            Err(e) => {
                self.state = LoopState::Stopped;
                tracing::error!(error = %e, "render loop stopped by rendering service");
                Err(e)
            }
        }
    }

    fn draw_frame(&mut self) -> Result<StepOutcome, RenderError> {
        let ctx = &mut self.ctx;

        let resized = check_resize(&mut ctx.surface);
        if resized {
            let size = ctx.surface.backing_size();
            ctx.camera.set_aspect(size.aspect());
            ctx.camera.recompute_projection();
            ctx.renderer.resize(size)?;
        }

        ctx.system.step();
        for placement in ctx.system.placements() {
            ctx.renderer
                .set_position(placement.handle, placement.position.as_vec3());
            ctx.renderer
                .set_rotation(placement.handle, placement.rotation.as_vec3());
        }
        ctx.renderer.draw(&self.handles, &ctx.camera.state())?;

        let tick = ctx.system.tick();
        tracing::trace!(tick, resized, "frame drawn");
        Ok(StepOutcome::Drawn { tick, resized })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{CameraState, PerspectiveCamera};
    use crate::renderer::DebugTextRenderer;
    use crate::viewport::OffscreenSurface;
    use glam::{Mat4, Vec3};
    use orrery_common::{Light, Material, Shape, SurfaceSize};
    use orrery_kernel::{Attachment, Body, BodyRegistry};

    type TestLoop = RenderLoop<DebugTextRenderer, PerspectiveCamera, OffscreenSurface>;

    fn make_loop(size: SurfaceSize) -> TestLoop {
        let mut renderer = DebugTextRenderer::new();
        let sphere = Shape::Sphere { radius: 1.0 };
        let material = Material::default();
        let sun = renderer.create_handle(&sphere, &material).unwrap();
        let earth = renderer.create_handle(&sphere, &material).unwrap();
        let clouds = renderer.create_handle(&sphere, &material).unwrap();

        let mut registry = BodyRegistry::new();
        registry.register(Body::root("sun").with_handle(sun)).unwrap();
        registry
            .register(
                Body::orbiting("earth", "sun", 10.0)
                    .with_period(100.0)
                    .with_handle(earth),
            )
            .unwrap();
        registry
            .attach(Attachment::new("clouds", "earth").with_handle(clouds))
            .unwrap();

        RenderLoop::new(SceneContext {
            system: OrbitalSystem::new(registry).unwrap(),
            camera: PerspectiveCamera::default(),
            renderer,
            surface: OffscreenSurface::new(size),
        })
    }

    #[test]
    fn construction_syncs_camera_aspect() {
        let lp = make_loop(SurfaceSize::new(800, 600));
        let cam = &lp.context().camera;
        assert_eq!(cam.aspect, 800.0 / 600.0);
        assert_eq!(
            cam.projection_matrix(),
            Mat4::perspective_rh(cam.fov, 800.0 / 600.0, cam.near, cam.far)
        );
        assert_eq!(lp.state(), LoopState::Idle);
    }

    #[test]
    fn step_before_start_does_nothing() {
        let mut lp = make_loop(SurfaceSize::new(800, 600));
        let mut queue = FrameQueue::new();
        assert_eq!(lp.step(&mut queue).unwrap(), StepOutcome::NotRunning);
        assert_eq!(lp.context().system.tick(), 0);
        assert!(!queue.is_pending());
    }

    #[test]
    fn start_requests_first_frame_once() {
        let mut lp = make_loop(SurfaceSize::new(800, 600));
        let mut queue = FrameQueue::new();
        assert!(lp.start(&mut queue));
        assert!(queue.take());
        assert!(!lp.start(&mut queue));
        assert!(!queue.is_pending());
    }

    #[test]
    fn each_step_advances_one_tick_and_reschedules() {
        let mut lp = make_loop(SurfaceSize::new(800, 600));
        let mut queue = FrameQueue::new();
        lp.start(&mut queue);

        for expected in 1..=5 {
            assert!(queue.take());
            let outcome = lp.step(&mut queue).unwrap();
            assert_eq!(
                outcome,
                StepOutcome::Drawn {
                    tick: expected,
                    resized: false
                }
            );
        }
        assert_eq!(lp.context().system.tick(), 5);
        assert_eq!(lp.context().renderer.frames(), 5);
        assert_eq!(lp.frames(), 5);
        assert_eq!(queue.requested(), 6);
    }

    #[test]
    fn placements_reach_the_renderer() {
        let mut lp = make_loop(SurfaceSize::new(800, 600));
        let mut queue = FrameQueue::new();
        lp.start(&mut queue);
        lp.step(&mut queue).unwrap();

        let ctx = lp.context();
        let earth = ctx.system.body(&"earth".into()).unwrap();
        let clouds = ctx.system.attachment(&"clouds".into()).unwrap();
        let drawn_earth = ctx
            .renderer
            .object(earth.render_handle.unwrap())
            .unwrap()
            .position;
        let drawn_clouds = ctx
            .renderer
            .object(clouds.render_handle.unwrap())
            .unwrap()
            .position;
        assert_eq!(drawn_earth, earth.position().as_vec3());
        assert_eq!(drawn_clouds, drawn_earth);
        assert!(ctx.renderer.last_frame().contains("Objects: 3"));
    }

    #[test]
    fn resize_is_applied_before_the_same_frame_draws() {
        let mut lp = make_loop(SurfaceSize::new(800, 600));
        let mut queue = FrameQueue::new();
        lp.start(&mut queue);
        lp.step(&mut queue).unwrap();

        lp.context_mut()
            .surface
            .set_layout(SurfaceSize::new(1024, 768));
        let outcome = lp.step(&mut queue).unwrap();
        assert_eq!(
            outcome,
            StepOutcome::Drawn {
                tick: 2,
                resized: true
            }
        );

        let ctx = lp.context();
        let cam = &ctx.camera;
        let expected = Mat4::perspective_rh(cam.fov, 1024.0 / 768.0, cam.near, cam.far);
        assert_eq!(ctx.renderer.resizes(), [SurfaceSize::new(1024, 768)]);
        assert_eq!(ctx.renderer.last_camera().unwrap().projection, expected);
        assert!(ctx.renderer.last_frame().contains("1024x768"));

        let outcome = lp.step(&mut queue).unwrap();
        assert_eq!(
            outcome,
            StepOutcome::Drawn {
                tick: 3,
                resized: false
            }
        );
        assert_eq!(lp.context().renderer.resizes().len(), 1);
    }

    #[test]
    fn cancellation_stops_without_rescheduling() {
        let mut lp = make_loop(SurfaceSize::new(800, 600));
        let mut queue = FrameQueue::new();
        lp.start(&mut queue);
        queue.take();
        lp.step(&mut queue).unwrap();
        queue.take();

        let token = lp.cancel_token();
        token.cancel();
        assert_eq!(lp.step(&mut queue).unwrap(), StepOutcome::Stopped);
        assert_eq!(lp.state(), LoopState::Stopped);
        assert!(!queue.is_pending());
        assert_eq!(lp.context().system.tick(), 1);

        assert_eq!(lp.step(&mut queue).unwrap(), StepOutcome::NotRunning);
        assert!(!lp.start(&mut queue));
    }

    #[test]
    fn stopping_idle_loop_prevents_start() {
        let mut lp = make_loop(SurfaceSize::new(800, 600));
        let mut queue = FrameQueue::new();
        lp.stop();
        assert_eq!(lp.state(), LoopState::Stopped);
        assert!(!lp.start(&mut queue));
        assert!(!queue.is_pending());
    }

    #[derive(Debug, Default)]
    struct FailingRenderer {
        draws: u32,
    }

    impl RenderService for FailingRenderer {
        fn create_handle(
            &mut self,
            _shape: &Shape,
            _material: &Material,
        ) -> Result<RenderHandle, RenderError> {
            Ok(RenderHandle(1))
        }
        fn set_position(&mut self, _handle: RenderHandle, _position: Vec3) {}
        fn set_rotation(&mut self, _handle: RenderHandle, _rotation: Vec3) {}
        fn set_lights(&mut self, _lights: &[Light]) {}
        fn resize(&mut self, _size: SurfaceSize) -> Result<(), RenderError> {
            Ok(())
        }
        fn draw(
            &mut self,
            _handles: &[RenderHandle],
            _camera: &CameraState,
        ) -> Result<(), RenderError> {
            self.draws += 1;
            Err(RenderError::Surface("lost".into()))
        }
    }

    #[test]
    fn renderer_failure_stops_the_loop() {
        let mut registry = BodyRegistry::new();
        registry
            .register(Body::root("cube").with_handle(RenderHandle(1)))
            .unwrap();
        let mut lp = RenderLoop::new(SceneContext {
            system: OrbitalSystem::new(registry).unwrap(),
            camera: PerspectiveCamera::default(),
            renderer: FailingRenderer::default(),
            surface: OffscreenSurface::new(SurfaceSize::new(320, 240)),
        });
        let mut queue = FrameQueue::new();
        lp.start(&mut queue);
        queue.take();

        let err = lp.step(&mut queue).unwrap_err();
        assert!(matches!(err, RenderError::Surface(_)));
        assert_eq!(lp.state(), LoopState::Stopped);
        assert!(!queue.is_pending());
        assert_eq!(lp.step(&mut queue).unwrap(), StepOutcome::NotRunning);
        assert_eq!(lp.context().renderer.draws, 1);
    }

    #[test]
    fn token_clones_share_the_flag() {
        let token = CancelToken::new();
        let remote = token.clone();
        let handle = std::thread::spawn(move || remote.cancel());
        handle.join().unwrap();
        assert!(token.is_cancelled());
    }
}
