use argh::FromArgs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use surround::view::{
    frame::{preprocess, to_rgb},
    pattern, CalibrationStore, CameraId, CompositionMode, Frame, PerCamera, SurroundConfig,
    SurroundView,
};

#[derive(FromArgs)]
/// Compose the four camera images of a vehicle into one surround view
struct Args {
    /// image of the front camera, a test pattern if missing
    #[argh(option)]
    front: Option<PathBuf>,

    /// image of the left camera, a test pattern if missing
    #[argh(option)]
    left: Option<PathBuf>,

    /// image of the right camera, a test pattern if missing
    #[argh(option)]
    right: Option<PathBuf>,

    /// image of the back camera, a test pattern if missing
    #[argh(option)]
    back: Option<PathBuf>,

    /// composition mode: grid, ground_plane, seamless_radial or cylindrical_panoramic
    #[argh(option, short = 'm', default = "CompositionMode::Grid")]
    mode: CompositionMode,

    /// JSON configuration of the pipeline
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// directory holding camera_intrinsics.yml (or .json) and camera_extrinsics.csv
    #[argh(option)]
    calibration_dir: Option<PathBuf>,

    /// number of worker threads, 0 for one per core
    #[argh(option, default = "0")]
    threads: usize,

    /// where to write the composed image
    #[argh(option, short = 'o', default = "PathBuf::from(\"surround_view.png\")")]
    output: PathBuf,
}

/// Read an image file as a BGR frame.
fn read_frame(path: &Path) -> Result<Frame, Box<dyn std::error::Error>> {
    let rgb = image::open(path)?.to_rgb8();
    let (width, height) = rgb.dimensions();
    let frame = Frame::new([width as usize, height as usize].into(), rgb.into_raw())?;
    // swapping the channels turns RGB into BGR as well
    Ok(preprocess(&to_rgb(&frame)?)?)
}

fn write_frame(path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
    let [width, height]: [u32; 2] = frame.size().into();
    let rgb = to_rgb(frame)?;
    let buffer = image::RgbImage::from_raw(width, height, rgb.into_vec())
        .ok_or("the composed frame does not fit its size")?;
    buffer.save(path)?;
    Ok(())
}

fn synthetic(camera: CameraId) -> Result<Frame, Box<dyn std::error::Error>> {
    let size = [800, 600].into();
    let frame = match camera {
        CameraId::Front => pattern::test_grid(size)?,
        CameraId::Left => pattern::checkerboard(size, 50)?,
        CameraId::Right => pattern::checkerboard(size, 80)?,
        CameraId::Back => pattern::solid(size, [180, 180, 180])?,
    };
    Ok(frame)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let config = match &args.config {
        Some(path) => SurroundConfig::from_json_file(path)?,
        None => SurroundConfig::default(),
    };

    let mut calibration = match &args.calibration_dir {
        Some(dir) => CalibrationStore::with_search_dirs([dir]),
        None => CalibrationStore::default(),
    };
    let calibrated = calibration.load_all_intrinsics();
    calibration.load_extrinsics();
    log::info!("{calibrated} of 4 cameras calibrated");

    let paths = PerCamera {
        front: args.front.clone(),
        left: args.left.clone(),
        right: args.right.clone(),
        back: args.back.clone(),
    };
    let mut frames = PerCamera::from_fn(|_| Frame::empty());
    for (camera, path) in paths.iter() {
        frames[camera] = match path {
            Some(path) => read_frame(path)?,
            None => synthetic(camera)?,
        };
    }

    let view = SurroundView::builder()
        .num_threads(args.threads)
        .calibration(Arc::new(calibration))
        .config(config)
        .build()?;

    let start = Instant::now();
    let result = view.compose(args.mode, &frames)?;
    println!(
        "composed {} in {:?} from {} cameras",
        args.mode,
        start.elapsed(),
        result.composed_count()
    );
    for (camera, status) in result.status.iter() {
        println!("  {camera}: {status:?}");
    }

    if result.is_empty() {
        return Err("nothing could be composed".into());
    }

    write_frame(&args.output, &result.frame)?;
    println!("wrote {}", args.output.display());

    Ok(())
}
