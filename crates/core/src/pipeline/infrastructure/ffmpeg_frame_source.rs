use log::debug;

use crate::pipeline::domain::frame_source::FrameSource;
use crate::shared::constants::{DEFAULT_CAMERA_FPS, DEFAULT_CAMERA_HEIGHT, DEFAULT_CAMERA_WIDTH};
use crate::shared::frame::Frame;

/// Where frames come from and at what nominal geometry.
///
/// `input` is anything libavformat can open: a V4L2 device path, an
/// AVFoundation device, or a plain video file (useful in tests and for
/// replaying recorded sessions).
#[derive(Clone, Debug)]
pub struct CameraConfig {
    pub input: String,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            input: "/dev/video0".to_string(),
            width: DEFAULT_CAMERA_WIDTH,
            height: DEFAULT_CAMERA_HEIGHT,
            fps: DEFAULT_CAMERA_FPS,
        }
    }
}

/// Decodes frames via ffmpeg-next (libavformat + libavcodec).
///
/// Converts each decoded frame to RGB24 and wraps it in a [`Frame`].
pub struct FfmpegFrameSource {
    config: CameraConfig,
    input_ctx: Option<ffmpeg_next::format::context::Input>,
    decoder: Option<ffmpeg_next::decoder::Video>,
    scaler: Option<ffmpeg_next::software::scaling::Context>,
    video_stream_index: usize,
    frame_index: usize,
    flushing: bool,
}

// Safety: FfmpegFrameSource is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegFrameSource {}

impl FfmpegFrameSource {
    pub fn new(config: CameraConfig) -> Self {
        Self {
            config,
            input_ctx: None,
            decoder: None,
            scaler: None,
            video_stream_index: 0,
            frame_index: 0,
            flushing: false,
        }
    }

    /// Pull one decoded frame out of the decoder, if it has one ready.
    fn try_receive(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        let (Some(decoder), Some(scaler)) = (self.decoder.as_mut(), self.scaler.as_mut()) else {
            return Ok(None);
        };

        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if decoder.receive_frame(&mut decoded).is_err() {
            return Ok(None);
        }

        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
        scaler.run(&decoded, &mut rgb_frame)?;

        let width = decoder.width();
        let height = decoder.height();
        let pixels = extract_rgb_pixels(&rgb_frame, width, height);
        let frame = Frame::new(pixels, width, height, 3, self.frame_index);
        self.frame_index += 1;
        Ok(Some(frame))
    }
}

impl FrameSource for FfmpegFrameSource {
    fn open(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        // Camera demuxers honor these; file demuxers ignore them.
        let mut options = ffmpeg_next::Dictionary::new();
        options.set(
            "video_size",
            &format!("{}x{}", self.config.width, self.config.height),
        );
        options.set("framerate", &self.config.fps.to_string());

        let ictx = ffmpeg_next::format::input_with_dictionary(&self.config.input, options)?;

        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("No video stream found")?;
        let video_stream_index = stream.index();

        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;

        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            ffmpeg_next::format::Pixel::RGB24,
            decoder.width(),
            decoder.height(),
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        debug!(
            "opened source '{}' at {}x{}",
            self.config.input,
            decoder.width(),
            decoder.height()
        );

        self.video_stream_index = video_stream_index;
        self.decoder = Some(decoder);
        self.scaler = Some(scaler);
        self.input_ctx = Some(ictx);
        self.frame_index = 0;
        self.flushing = false;
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        if self.input_ctx.is_none() {
            return Err("frame source not opened".into());
        }

        if let Some(frame) = self.try_receive()? {
            return Ok(Some(frame));
        }
        if self.flushing {
            return Ok(None);
        }

        loop {
            let packet = {
                let ictx = self
                    .input_ctx
                    .as_mut()
                    .ok_or("frame source not opened")?;
                let index = self.video_stream_index;
                ictx.packets()
                    .find(|(stream, _)| stream.index() == index)
                    .map(|(_, packet)| packet)
            };

            let Some(packet) = packet else {
                // Demuxer is drained: flush the decoder for its last frames
                if let Some(decoder) = self.decoder.as_mut() {
                    let _ = decoder.send_eof();
                }
                self.flushing = true;
                return self.try_receive();
            };

            let decoder = self.decoder.as_mut().ok_or("frame source not opened")?;
            if decoder.send_packet(&packet).is_err() {
                continue;
            }
            if let Some(frame) = self.try_receive()? {
                return Ok(Some(frame));
            }
        }
    }

    fn release(&mut self) {
        self.input_ctx = None;
        self.decoder = None;
        self.scaler = None;
        self.flushing = false;
    }
}

/// Copies pixel data from an ffmpeg frame into a contiguous RGB buffer.
///
/// ffmpeg frames may have padding bytes at the end of each row
/// (stride > width*3); this strips that padding.
fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let w = width as usize;
    let h = height as usize;

    let mut pixels = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + w * 3]);
    }
    pixels
}
