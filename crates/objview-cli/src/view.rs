//! View sinks for the demo binary: tev streaming and PNG snapshots.

use std::path::PathBuf;

use anyhow::{Context, Result};
use image::buffer::ConvertBuffer;
use objview::view::{NullSink, ViewSink};
use objview::{Dimensions, FrameBuffer};
use rand::{distributions::Alphanumeric, Rng};
use tev_client::{PacketCreateImage, PacketUpdateImage, TevClient};

/// Channels streamed per pixel: color plus the two auxiliary planes.
const CHANNELS_PER_PIXEL: usize = 9;

/// Streams every fresh frame to a tev instance, spawning one if needed.
pub struct TevView {
    client: TevClient,
    image_name: String,
    opened: bool,
    dimensions: Dimensions,
}

impl TevView {
    pub fn new(
        dimensions: Dimensions,
        tev_path: Option<String>,
        tev_hostname: Option<String>,
    ) -> Result<Self> {
        let tev_hostname: String = tev_hostname.unwrap_or("127.0.0.1:14158".into());
        let tev_path: String = tev_path.unwrap_or("./tev".into());

        let try_spawn = |path: PathBuf| -> Result<()> {
            let mut command = std::process::Command::new(path);
            command.arg(format!("--hostname={:?}", tev_hostname));
            command
                .stdout(std::process::Stdio::null())
                .stdin(std::process::Stdio::null())
                .spawn()?;

            // Wait for exe to be up
            // May not work
            std::thread::sleep(std::time::Duration::from_secs(2));
            Ok(())
        };
        let try_connect = || -> Result<TevClient> {
            Ok(TevClient::wrap(std::net::TcpStream::connect(
                &tev_hostname,
            )?))
        };

        log::debug!("Trying tev direct connection");
        let client = match try_connect() {
            Ok(client) => client,
            Err(_) => {
                log::warn!("Can't find tev client, trying to spawn tev");
                try_spawn(tev_path.into())?;
                try_connect()?
            }
        };
        log::info!("Successfully connected to tev");

        fn get_id() -> String {
            rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(7)
                .map(char::from)
                .collect()
        }
        let image_name = format!("objview-{}", get_id());

        Ok(Self {
            client,
            image_name,
            opened: false,
            dimensions,
        })
    }
}

impl ViewSink for TevView {
    fn frame_ready(&mut self, frame: &FrameBuffer) -> Result<()> {
        anyhow::ensure!(
            frame.dimensions() == self.dimensions,
            "frame is {} but the tev image was sized {}",
            frame.dimensions(),
            self.dimensions
        );
        let Dimensions { width, height } = self.dimensions;

        let mut channel_names: Vec<String> = vec!["R".into(), "G".into(), "B".into()];
        for aux in ["normal", "albedo"] {
            for axis in ["X", "Y", "Z"] {
                channel_names.push(format!("{aux}.{axis}"));
            }
        }
        let channel_offsets: Vec<u64> = (0..CHANNELS_PER_PIXEL as u64).collect();
        let channel_strides = vec![CHANNELS_PER_PIXEL as u64; CHANNELS_PER_PIXEL];

        let mut data = Vec::with_capacity((width * height) as usize * CHANNELS_PER_PIXEL);
        for y in 0..height {
            for x in 0..width {
                data.extend(frame.color.get_pixel(x, y).0);
                data.extend(frame.normal.get_pixel(x, y).0);
                data.extend(frame.albedo.get_pixel(x, y).0);
            }
        }

        if !self.opened {
            self.client.send(PacketCreateImage {
                image_name: &self.image_name,
                grab_focus: true,
                channel_names: &channel_names,
                width,
                height,
            })?;
            self.opened = true;
        }

        self.client
            .send(PacketUpdateImage {
                image_name: &self.image_name,
                grab_focus: false,
                channel_names: &channel_names,
                channel_offsets: &channel_offsets,
                channel_strides: &channel_strides,
                x: 0,
                y: 0,
                width,
                height,
                data: &data,
            })
            .context("Can't send Packet to tev client. It may be closed")
    }
}

/// Fans a notification out to several views. A view that errors is dropped
/// from the rotation instead of taking the session down.
pub struct MultiView {
    views: Vec<Box<dyn ViewSink>>,
}

impl MultiView {
    pub fn new(views: Vec<Box<dyn ViewSink>>) -> Self {
        Self { views }
    }
}

impl ViewSink for MultiView {
    fn frame_ready(&mut self, frame: &FrameBuffer) -> Result<()> {
        for view in &mut self.views {
            if let Err(err) = view.frame_ready(frame) {
                log::error!("view errored, it will not be updated anymore: {err:#}");
                *view = Box::new(NullSink);
            }
        }
        Ok(())
    }
}

/// Writes the final frame as PNGs when the session ends.
pub struct PngSnapshot {
    pub outdir: PathBuf,
}

impl PngSnapshot {
    pub fn commit(&self, frame: &FrameBuffer) -> Result<()> {
        std::fs::create_dir_all(&self.outdir)?;

        frame.to_ldr().save(self.outdir.join("color.png"))?;
        let convert = |img: &image::Rgb32FImage| -> image::RgbImage { img.convert() };
        convert(&frame.normal).save(self.outdir.join("normal.png"))?;
        convert(&frame.albedo).save(self.outdir.join("albedo.png"))?;

        log::info!("snapshot written to {}", self.outdir.display());
        Ok(())
    }
}
