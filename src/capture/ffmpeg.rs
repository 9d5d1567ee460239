use std::{
    io::{ErrorKind, Read as _},
    path::PathBuf,
    process::{Child, ChildStdout, Command, Stdio},
    sync::{Arc, Mutex, PoisonError},
};

use crate::{
    capture::device::{CaptureDevice, CaptureRequest, CaptureStream, Facing, StreamInterrupt},
    foundation::{
        core::{FrameRGBA, premultiply_rgba8_in_place},
        error::{TryOnError, TryOnResult},
    },
};

pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Reads raw RGBA frames from a camera through the system `ffmpeg` binary.
#[derive(Clone, Debug)]
pub struct FfmpegCaptureDevice {
    /// ffmpeg input format, e.g. `v4l2` or `avfoundation`.
    pub input_format: String,
    /// Device for the front camera.
    pub user_device: PathBuf,
    /// Device for the rear camera, when there is one.
    pub environment_device: Option<PathBuf>,
}

impl Default for FfmpegCaptureDevice {
    fn default() -> Self {
        Self {
            input_format: "v4l2".to_string(),
            user_device: PathBuf::from("/dev/video0"),
            environment_device: None,
        }
    }
}

impl FfmpegCaptureDevice {
    fn device_for(&self, facing: Facing) -> TryOnResult<&PathBuf> {
        match facing {
            Facing::User => Ok(&self.user_device),
            Facing::Environment => self.environment_device.as_ref().ok_or_else(|| {
                TryOnError::camera_access("no environment-facing camera configured")
            }),
        }
    }
}

impl CaptureDevice for FfmpegCaptureDevice {
    fn open(&self, request: &CaptureRequest) -> TryOnResult<Box<dyn CaptureStream>> {
        let device = self.device_for(request.facing)?;
        if !device.exists() {
            return Err(TryOnError::camera_access(format!(
                "camera device '{}' does not exist",
                device.display()
            )));
        }
        if !is_ffmpeg_on_path() {
            return Err(TryOnError::camera_access(
                "ffmpeg is required for camera capture, but was not found on PATH",
            ));
        }
        if request.audio {
            tracing::warn!("audio capture is not supported; opening video only");
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());
        cmd.args([
            "-loglevel",
            "error",
            "-f",
            &self.input_format,
            "-framerate",
            &request.fps.to_string(),
            "-video_size",
            &format!("{}x{}", request.width, request.height),
            "-i",
        ])
        .arg(device)
        .args([
            "-an",
            "-vf",
            &format!("scale={}:{}", request.width, request.height),
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "pipe:1",
        ]);

        let mut child = cmd.spawn().map_err(|e| {
            TryOnError::camera_access(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TryOnError::camera_access("failed to open ffmpeg stdout"))?;

        tracing::info!(device = %device.display(), width = request.width, height = request.height, "ffmpeg capture started");
        Ok(Box::new(FfmpegStream {
            width: request.width,
            height: request.height,
            child: Arc::new(Mutex::new(Some(child))),
            stdout: Some(stdout),
        }))
    }
}

struct FfmpegStream {
    width: u32,
    height: u32,
    child: Arc<Mutex<Option<Child>>>,
    stdout: Option<ChildStdout>,
}

/// Kills the ffmpeg process so a read blocked on its stdout sees end of file.
struct KillFfmpeg(Arc<Mutex<Option<Child>>>);

impl StreamInterrupt for KillFfmpeg {
    fn interrupt(&self) {
        if let Some(child) = self.0.lock().unwrap_or_else(PoisonError::into_inner).as_mut()
            && let Err(e) = child.kill()
        {
            tracing::debug!("ffmpeg already exited: {e}");
        }
    }
}

impl CaptureStream for FfmpegStream {
    fn read_frame(&mut self) -> TryOnResult<Option<FrameRGBA>> {
        let Some(stdout) = self.stdout.as_mut() else {
            return Ok(None);
        };
        let mut data = vec![0u8; (self.width as usize) * (self.height as usize) * 4];
        match stdout.read_exact(&mut data) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                self.stop();
                return Err(TryOnError::camera_access("camera stream ended"));
            }
            Err(e) => {
                return Err(TryOnError::camera_access(format!(
                    "failed to read frame from ffmpeg: {e}"
                )));
            }
        }
        premultiply_rgba8_in_place(&mut data);
        FrameRGBA::from_premul(self.width, self.height, data).map(Some)
    }

    fn interrupt_handle(&self) -> Option<Arc<dyn StreamInterrupt>> {
        Some(Arc::new(KillFfmpeg(Arc::clone(&self.child))))
    }

    fn active_tracks(&self) -> usize {
        usize::from(
            self.child
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .is_some(),
        )
    }

    fn stop(&mut self) {
        drop(self.stdout.take());
        let child = self
            .child
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(mut child) = child {
            if let Err(e) = child.kill() {
                tracing::debug!("ffmpeg already exited: {e}");
            }
            let _ = child.wait();
        }
    }
}

impl Drop for FfmpegStream {
    fn drop(&mut self) {
        self.stop();
    }
}
