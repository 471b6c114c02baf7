use anyhow::{Result, anyhow};
use nokhwa::{
    Camera,
    pixel_format::RgbFormat,
    query,
    utils::{
        ApiBackend, CameraIndex, CameraInfo, FrameFormat, RequestedFormat, RequestedFormatType,
    },
};

use super::{FrameSource, rgba_converter};
use crate::{error::CaptureError, types::Frame};

// Prefer pixel formats that are widely supported on macOS (the built-in cameras
// often reject YUYV even though Nokhwa reports it).
const PREFERRED_PIXEL_FORMATS: &[FrameFormat] = &[
    FrameFormat::RAWRGB,
    FrameFormat::RAWBGR,
    FrameFormat::GRAY,
    FrameFormat::YUYV,
    FrameFormat::NV12,
    FrameFormat::MJPEG,
];

/// Consecutive undecodable frames tolerated before giving up on the device.
const MAX_DECODE_FAILURES: u32 = 5;

fn requested_formats() -> [RequestedFormat<'static>; 4] {
    [
        RequestedFormat::with_formats(
            RequestedFormatType::AbsoluteHighestFrameRate,
            PREFERRED_PIXEL_FORMATS,
        ),
        RequestedFormat::with_formats(
            RequestedFormatType::AbsoluteHighestResolution,
            PREFERRED_PIXEL_FORMATS,
        ),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::None),
    ]
}

#[derive(Clone, Debug)]
pub struct CameraDevice {
    pub index: CameraIndex,
    pub label: String,
}

pub fn available_cameras() -> Result<Vec<CameraDevice>> {
    let cameras = query(ApiBackend::Auto)?;
    Ok(cameras
        .into_iter()
        .map(|info| CameraDevice {
            index: info.index().clone(),
            label: format_camera_label(&info),
        })
        .collect())
}

fn format_camera_label(info: &CameraInfo) -> String {
    info.human_name()
}

/// Webcam read synchronously by the game loop. The stream is stopped on drop.
pub struct CameraCapture {
    camera: Camera,
    resolution: (u32, u32),
}

impl CameraCapture {
    pub fn open(index: CameraIndex) -> Result<Self> {
        let mut last_err = None;

        for requested in requested_formats() {
            match Camera::new(index.clone(), requested) {
                Ok(mut camera) => match camera.open_stream() {
                    Ok(()) => {
                        let resolution = camera.resolution();
                        let resolution = (resolution.width_x, resolution.height_y);
                        log::info!(
                            "camera {} streaming at {}x{} ({:?})",
                            camera.info().human_name(),
                            resolution.0,
                            resolution.1,
                            camera.frame_format()
                        );
                        return Ok(Self { camera, resolution });
                    }
                    Err(err) => last_err = Some(err.into()),
                },
                Err(err) => last_err = Some(err.into()),
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow!("failed to open camera with any supported format")))
    }
}

impl FrameSource for CameraCapture {
    fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    fn read(&mut self) -> Result<Frame, CaptureError> {
        if !self.camera.is_stream_open() {
            return Err(CaptureError::Closed);
        }

        let mut failures = 0;
        loop {
            let buffer = self
                .camera
                .frame()
                .map_err(|err| CaptureError::Read(err.to_string()))?;

            match rgba_converter::convert_camera_frame(&buffer) {
                Ok(converted) => {
                    self.resolution = (converted.width, converted.height);
                    return Ok(Frame::new(converted.rgba, converted.width, converted.height));
                }
                Err(err) => {
                    failures += 1;
                    log::warn!("failed to decode camera frame ({failures}): {err:?}");
                    if failures > MAX_DECODE_FAILURES {
                        return Err(CaptureError::Decode {
                            attempts: failures,
                            reason: err.to_string(),
                        });
                    }
                }
            }
        }
    }
}

impl Drop for CameraCapture {
    fn drop(&mut self) {
        match self.camera.stop_stream() {
            Ok(()) => log::info!("camera released"),
            Err(err) => log::warn!("failed to stop camera stream: {err:?}"),
        }
    }
}
