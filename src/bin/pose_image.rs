use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::{DynamicImage, RgbaImage};
use pose_circle_game::{
    pipeline::{
        KeypointSource, PoseEstimatorConfig,
        overlay::{Annotation, dim_background, render_annotations},
        pose::OrtPoseEstimator,
    },
    types::{Frame, PoseJoint, Skeleton},
};

const BACKGROUND_DIM: f32 = 0.6;

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let input_image = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("images/1.jpg"));
    let output_image = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("output_pose.jpg"));

    let mut frame = load_frame(&input_image)?;
    let mut estimator = OrtPoseEstimator::open(PoseEstimatorConfig::static_image())
        .context("failed to load pose estimator")?;

    let Some(skeleton) = estimator
        .estimate(&frame)
        .with_context(|| format!("pose estimation failed on {}", input_image.display()))?
    else {
        println!("no pose detected in {}", input_image.display());
        return Ok(());
    };

    println!(
        "Pose detected with confidence {:.3}",
        skeleton.confidence()
    );
    print_landmarks(&skeleton);

    if let Some(mask) = skeleton.segmentation() {
        dim_background(&mut frame, mask, BACKGROUND_DIM);
    }
    let points = skeleton.projected(frame.width, frame.height);
    render_annotations(&mut frame, &[Annotation::Pose { points }],
    );
    save_frame(frame, &output_image)?;

    println!("Wrote {}", output_image.display());
    Ok(())
}

fn load_frame(path: &Path) -> Result<Frame> {
    let image = image::open(path)
        .with_context(|| format!("failed to open image {}", path.display()))?
        .to_rgba8();
    let (width, height) = image.dimensions();
    Ok(Frame::new(image.into_raw(), width, height))
}

fn save_frame(frame: Frame, path: &Path) -> Result<()> {
    let image = RgbaImage::from_raw(frame.width, frame.height, frame.rgba)
        .context("annotated frame has the wrong buffer size")?;
    // JPEG has no alpha channel.
    DynamicImage::ImageRgba8(image)
        .to_rgb8()
        .save(path)
        .with_context(|| format!("failed to save {}", path.display()))
}

fn print_landmarks(skeleton: &Skeleton) {
    for joint in PoseJoint::ALL {
        let Some(lm) = skeleton.joint(joint) else {
            continue;
        };
        println!(
            "{:>2} {:<18} x={:.3} y={:.3} z={:.3} visibility={:.3}",
            joint.index(),
            joint.name(),
            lm.x,
            lm.y,
            lm.z,
            lm.visibility
        );
    }
}
