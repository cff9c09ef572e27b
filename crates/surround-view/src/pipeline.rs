use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationStore;
use crate::camera::{CameraId, PerCamera};
use crate::compositor::{compose_grid, compose_panorama, compose_radial};
use crate::config::SurroundConfig;
use crate::crop::crop;
use crate::error::SurroundError;
use crate::frame::{preprocess, Frame};
use crate::projection::{project, Projection};
use crate::undistort::undistort;
use surround_image::ImageError;
use surround_imgproc::rotate::{rotate_180, rotate_90_clockwise, rotate_90_counterclockwise};

/// The composition strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositionMode {
    /// cameras tiled around a vehicle placeholder
    Grid,
    /// ground plane projection, then radial blending
    GroundPlane,
    /// side correction, then radial blending
    SeamlessRadial,
    /// cylindrical projection, then an angular ring
    CylindricalPanoramic,
}

impl CompositionMode {
    /// Every mode.
    pub const ALL: [CompositionMode; 4] = [
        CompositionMode::Grid,
        CompositionMode::GroundPlane,
        CompositionMode::SeamlessRadial,
        CompositionMode::CylindricalPanoramic,
    ];

    /// The name used in configuration files and on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            CompositionMode::Grid => "grid",
            CompositionMode::GroundPlane => "ground_plane",
            CompositionMode::SeamlessRadial => "seamless_radial",
            CompositionMode::CylindricalPanoramic => "cylindrical_panoramic",
        }
    }
}

impl fmt::Display for CompositionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CompositionMode {
    type Err = SurroundError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().replace('-', "_").as_str() {
            "grid" => Ok(CompositionMode::Grid),
            "ground_plane" | "ground" => Ok(CompositionMode::GroundPlane),
            "seamless_radial" | "radial" => Ok(CompositionMode::SeamlessRadial),
            "cylindrical_panoramic" | "panoramic" | "panorama" => {
                Ok(CompositionMode::CylindricalPanoramic)
            }
            other => Err(SurroundError::Config(format!(
                "unknown composition mode: {other}"
            ))),
        }
    }
}

/// A step of the per camera pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stage {
    /// [`undistort`]
    Undistort,
    /// [`project`], the input is kept if the projection fails
    Project(Projection),
    /// [`crop`]
    Crop,
    /// [`orient`]
    Orient,
}

/// The stages run on every camera for a mode, in order.
///
/// Each mode keeps its own rotation convention: the panoramic ring samples
/// the frames as captured, the other modes rotate them into canvas
/// orientation.
pub fn stages(mode: CompositionMode) -> &'static [Stage] {
    match mode {
        CompositionMode::Grid => &[Stage::Undistort, Stage::Crop, Stage::Orient],
        CompositionMode::GroundPlane => &[
            Stage::Undistort,
            Stage::Project(Projection::GroundPlane),
            Stage::Crop,
            Stage::Orient,
        ],
        CompositionMode::SeamlessRadial => &[
            Stage::Undistort,
            Stage::Project(Projection::SideCorrection),
            Stage::Crop,
            Stage::Orient,
        ],
        CompositionMode::CylindricalPanoramic => &[
            Stage::Undistort,
            Stage::Project(Projection::Cylindrical),
            Stage::Crop,
        ],
    }
}

/// Rotate a frame from camera orientation into canvas orientation.
///
/// The left camera is turned 90 degrees counterclockwise, the right camera
/// 90 degrees clockwise and the back camera by 180 degrees, so the ground
/// near the vehicle faces the canvas centre.
pub fn orient(frame: &Frame, camera: CameraId) -> Result<Frame, ImageError> {
    match camera {
        CameraId::Front => Ok(frame.clone()),
        CameraId::Left => rotate_90_counterclockwise(frame),
        CameraId::Right => rotate_90_clockwise(frame),
        CameraId::Back => rotate_180(frame),
    }
}

/// What a camera pipeline sees besides its frame.
#[derive(Debug, Clone, Copy)]
pub struct PipelineContext<'a> {
    /// the composition the frame is prepared for
    pub mode: CompositionMode,
    /// calibration of the cameras
    pub calibration: &'a CalibrationStore,
    /// constants of the stages
    pub config: &'a SurroundConfig,
}

/// Turns the raw frame of one camera into the frame handed to the compositor.
///
/// Implementations run concurrently, one call per camera.
pub trait CameraPipeline: Send + Sync {
    /// Process the frame of `camera`.
    fn process(
        &self,
        camera: CameraId,
        frame: &Frame,
        ctx: &PipelineContext<'_>,
    ) -> Result<Frame, SurroundError>;
}

/// Runs the [`stages`] of the mode after [`preprocess`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardPipeline;

impl CameraPipeline for StandardPipeline {
    fn process(
        &self,
        camera: CameraId,
        frame: &Frame,
        ctx: &PipelineContext<'_>,
    ) -> Result<Frame, SurroundError> {
        let mut current = preprocess(frame)?;

        for stage in stages(ctx.mode) {
            let start = Instant::now();
            current = match stage {
                Stage::Undistort => {
                    undistort(&current, camera, ctx.calibration, &ctx.config.undistort)
                }
                Stage::Project(projection) => {
                    match project(&current, camera, *projection, &ctx.config.projection) {
                        Ok(projected) => projected,
                        Err(e) => {
                            log::warn!("{projection:?} projection of the {camera} frame failed: {e}");
                            current
                        }
                    }
                }
                Stage::Crop => crop(&current, camera, &ctx.config.crop),
                Stage::Orient => orient(&current, camera)?,
            };
            log::debug!(
                "{camera}: {stage:?} -> {} in {:?}",
                current.size(),
                start.elapsed()
            );
        }

        Ok(current)
    }
}

/// What happened to a camera during a composition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraStatus {
    /// the camera contributed to the output
    Composed,
    /// the pipeline failed, the camera contributed nothing
    Failed(String),
    /// the composition stopped before running the pipelines
    NotDispatched,
}

/// The composed frame and the fate of each camera.
#[derive(Debug, Clone)]
pub struct CompositionResult {
    /// the composed frame, empty when nothing could be composed
    pub frame: Frame,
    /// status of every camera
    pub status: PerCamera<CameraStatus>,
}

impl CompositionResult {
    fn empty(status: PerCamera<CameraStatus>) -> Self {
        Self {
            frame: Frame::empty(),
            status,
        }
    }

    /// Whether the composition produced nothing.
    pub fn is_empty(&self) -> bool {
        self.frame.is_empty()
    }

    /// Number of cameras that contributed.
    pub fn composed_count(&self) -> usize {
        self.status
            .iter()
            .filter(|(_, s)| **s == CameraStatus::Composed)
            .count()
    }
}

#[derive(Debug)]
enum Phase {
    Idle,
    Dispatched(usize),
    Joined,
    Composed,
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Builder of [`SurroundView`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use surround_view::{CalibrationStore, SurroundView};
///
/// let view = SurroundView::builder()
///     .num_threads(2)
///     .calibration(Arc::new(CalibrationStore::default()))
///     .build()
///     .unwrap();
///
/// assert_eq!(view.num_threads(), 2);
/// ```
#[derive(Default)]
pub struct SurroundViewBuilder {
    num_threads: usize,
    calibration: Option<Arc<CalibrationStore>>,
    config: SurroundConfig,
    pipeline: Option<Arc<dyn CameraPipeline>>,
}

impl SurroundViewBuilder {
    /// Size of the worker pool, 0 uses one thread per core.
    pub fn num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    /// The shared calibration. Without it no camera is calibrated.
    pub fn calibration(mut self, calibration: Arc<CalibrationStore>) -> Self {
        self.calibration = Some(calibration);
        self
    }

    /// The constants of the stages and layouts.
    pub fn config(mut self, config: SurroundConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the [`StandardPipeline`] of every camera.
    pub fn pipeline(mut self, pipeline: Arc<dyn CameraPipeline>) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    /// Validate the configuration and start the worker pool.
    pub fn build(self) -> Result<SurroundView, SurroundError> {
        self.config.validate()?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.num_threads)
            .thread_name(|i| format!("surround-view-{i}"))
            .build()?;
        log::info!(
            "surround view pool started with {} threads",
            pool.current_num_threads()
        );

        Ok(SurroundView {
            pool,
            calibration: self.calibration.unwrap_or_default(),
            config: self.config,
            pipeline: self.pipeline.unwrap_or_else(|| Arc::new(StandardPipeline)),
        })
    }
}

/// Runs the four camera pipelines concurrently and composes their results.
///
/// A composition goes through `Idle -> Dispatched(4) -> Joined -> Composed`.
/// Each camera runs in its own task on a fixed pool; an error or a panic in
/// a task only removes that camera from the output. All results are joined
/// in [`CameraId::ALL`] order before compositing, so the output does not
/// depend on which task finishes first.
pub struct SurroundView {
    pool: rayon::ThreadPool,
    calibration: Arc<CalibrationStore>,
    config: SurroundConfig,
    pipeline: Arc<dyn CameraPipeline>,
}

impl SurroundView {
    /// Start building a [`SurroundView`].
    pub fn builder() -> SurroundViewBuilder {
        SurroundViewBuilder::default()
    }

    /// A view with the default configuration and pool size.
    pub fn new(calibration: Arc<CalibrationStore>) -> Result<Self, SurroundError> {
        Self::builder().calibration(calibration).build()
    }

    /// Number of worker threads.
    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// The calibration shared by the tasks.
    pub fn calibration(&self) -> &CalibrationStore {
        &self.calibration
    }

    /// The configuration of the stages and layouts.
    pub fn config(&self) -> &SurroundConfig {
        &self.config
    }

    /// Run the pipeline of a single camera, without compositing.
    pub fn process_camera(
        &self,
        mode: CompositionMode,
        camera: CameraId,
        frame: &Frame,
    ) -> Result<Frame, SurroundError> {
        let ctx = self.context(mode);
        self.pool.install(|| self.pipeline.process(camera, frame, &ctx))
    }

    /// Compose the four frames with the given mode.
    pub fn compose(
        &self,
        mode: CompositionMode,
        frames: &PerCamera<Frame>,
    ) -> Result<CompositionResult, SurroundError> {
        self.compose_with(self.pipeline.as_ref(), mode, frames)
    }

    /// Compose in [`CompositionMode::Grid`].
    pub fn compose_grid(&self, frames: &PerCamera<Frame>) -> Result<CompositionResult, SurroundError> {
        self.compose(CompositionMode::Grid, frames)
    }

    /// Compose in [`CompositionMode::GroundPlane`].
    pub fn compose_ground_plane(
        &self,
        frames: &PerCamera<Frame>,
    ) -> Result<CompositionResult, SurroundError> {
        self.compose(CompositionMode::GroundPlane, frames)
    }

    /// Compose in [`CompositionMode::SeamlessRadial`].
    pub fn compose_radial(
        &self,
        frames: &PerCamera<Frame>,
    ) -> Result<CompositionResult, SurroundError> {
        self.compose(CompositionMode::SeamlessRadial, frames)
    }

    /// Compose in [`CompositionMode::CylindricalPanoramic`].
    pub fn compose_panoramic(
        &self,
        frames: &PerCamera<Frame>,
    ) -> Result<CompositionResult, SurroundError> {
        self.compose(CompositionMode::CylindricalPanoramic, frames)
    }

    /// Compose the four frames, running `pipeline` on every camera.
    ///
    /// Returns an empty result without running anything if one of the
    /// frames is empty, and an empty result if every pipeline fails.
    ///
    /// # Errors
    ///
    /// Only the final compositing step can fail.
    pub fn compose_with(
        &self,
        pipeline: &dyn CameraPipeline,
        mode: CompositionMode,
        frames: &PerCamera<Frame>,
    ) -> Result<CompositionResult, SurroundError> {
        log::debug!("{mode}: {:?}", Phase::Idle);

        if let Some((camera, _)) = frames.iter().find(|(_, f)| f.is_empty()) {
            log::warn!("{mode}: the {camera} frame is empty, nothing to compose");
            return Ok(CompositionResult::empty(PerCamera::from_fn(|_| {
                CameraStatus::NotDispatched
            })));
        }

        let ctx = self.context(mode);
        let start = Instant::now();

        log::debug!("{mode}: {:?}", Phase::Dispatched(CameraId::ALL.len()));
        let outputs: Vec<(CameraId, Result<Frame, SurroundError>)> = self.pool.install(|| {
            CameraId::ALL
                .into_par_iter()
                .map(|camera| {
                    let result = panic::catch_unwind(AssertUnwindSafe(|| {
                        pipeline.process(camera, &frames[camera], &ctx)
                    }))
                    .unwrap_or_else(|payload| {
                        Err(SurroundError::TaskPanicked(camera, panic_message(payload)))
                    });
                    (camera, result)
                })
                .collect()
        });
        log::debug!("{mode}: {:?} after {:?}", Phase::Joined, start.elapsed());

        let mut processed: PerCamera<Option<Frame>> = PerCamera::default();
        let mut status = PerCamera::from_fn(|_| CameraStatus::NotDispatched);
        for (camera, result) in outputs {
            match result {
                Ok(frame) => {
                    processed[camera] = Some(frame);
                    status[camera] = CameraStatus::Composed;
                }
                Err(e) => {
                    log::warn!("{mode}: the {camera} camera is left out: {e}");
                    status[camera] = CameraStatus::Failed(e.to_string());
                }
            }
        }

        if processed.iter().all(|(_, f)| f.is_none()) {
            log::warn!("{mode}: every camera failed");
            return Ok(CompositionResult::empty(status));
        }

        let compose_start = Instant::now();
        let frame = self.pool.install(|| self.composite(mode, &processed))?;
        log::debug!(
            "{mode}: {:?} {} in {:?}, total {:?}",
            Phase::Composed,
            frame.size(),
            compose_start.elapsed(),
            start.elapsed()
        );

        Ok(CompositionResult { frame, status })
    }

    fn context(&self, mode: CompositionMode) -> PipelineContext<'_> {
        PipelineContext {
            mode,
            calibration: &self.calibration,
            config: &self.config,
        }
    }

    fn composite(
        &self,
        mode: CompositionMode,
        frames: &PerCamera<Option<Frame>>,
    ) -> Result<Frame, ImageError> {
        let config = &self.config;
        match mode {
            CompositionMode::Grid => compose_grid(frames, &config.grid),
            CompositionMode::GroundPlane | CompositionMode::SeamlessRadial => {
                compose_radial(frames, &config.radial, &config.compositor)
            }
            CompositionMode::CylindricalPanoramic => {
                compose_panorama(frames, &config.panorama, &config.compositor)
            }
        }
    }
}
