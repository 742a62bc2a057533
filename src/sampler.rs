//! Grid sampling of uploaded images.
//!
//! [`sample_grid`] downsamples an RGBA buffer into `grid_size × grid_size`
//! averaged colors, one [`CellRecord`] per cell in row-major order.
//! [`SamplerWorker`] runs the decode and the sampling on a background thread
//! and hands the finished grid back in a single message.
//!
//! # Cell geometry
//!
//! ```text
//! cell_w = width  / grid_size        cell_h = height / grid_size
//! first pixel of cell (x, y) = (floor(x * cell_w), floor(y * cell_h))
//! rest position              = (x * 100 / grid_size, y * 100 / grid_size)   (percent)
//! ```
//!
//! Width and height are handled independently, so non-square buffers work.
//! Reads past the right or bottom edge of the buffer are skipped, and a cell
//! with no readable pixels is left out of the result instead of being filled
//! with black.
//!
//! # Supersession
//!
//! Every [`SamplerWorker::submit`] gets a fresh generation number and a fresh
//! one-shot channel. Submitting again raises the cancel flag of the previous
//! job and drops its channel, so a late answer from an old upload can never
//! overwrite a newer one.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

use crate::error::ImageLoadError;
use crate::image_field::{CellColor, ImageParticle};

/// Default cells per side.
pub const DEFAULT_GRID_SIZE: u32 = 50;

/// Pixels handed to the sampler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridRequest {
    /// Tightly packed RGBA8 rows.
    pub image_data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub grid_size: u32,
}

/// One sampled cell, in the shape the image field consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellRecord {
    pub color: CellColor,
    pub x: f32,
    pub y: f32,
    pub original_x: f32,
    pub original_y: f32,
    pub vx: f32,
    pub vy: f32,
}

impl From<CellRecord> for ImageParticle {
    fn from(r: CellRecord) -> Self {
        ImageParticle::new(
            Vec2::new(r.x, r.y),
            Vec2::new(r.vx, r.vy),
            Vec2::new(r.original_x, r.original_y),
            r.color,
        )
    }
}

impl From<&ImageParticle> for CellRecord {
    fn from(p: &ImageParticle) -> Self {
        Self {
            color: p.color(),
            x: p.position.x,
            y: p.position.y,
            original_x: p.origin().x,
            original_y: p.origin().y,
            vx: p.velocity.x,
            vy: p.velocity.y,
        }
    }
}

/// Average every cell of the grid.
pub fn sample_grid(request: &GridRequest) -> Vec<CellRecord> {
    let never = AtomicBool::new(false);
    sample_grid_until(request, &never).unwrap_or_default()
}

/// [`sample_grid`], giving up between rows once `cancel` is raised.
///
/// Returns `None` if cancelled. There are no partial results.
pub fn sample_grid_until(request: &GridRequest, cancel: &AtomicBool) -> Option<Vec<CellRecord>> {
    let GridRequest {
        image_data,
        width,
        height,
        grid_size,
    } = request;
    let (width, height, grid) = (*width as usize, *height as usize, *grid_size as usize);
    if grid == 0 || width == 0 || height == 0 {
        return Some(Vec::new());
    }

    let cell_w = width as f64 / grid as f64;
    let cell_h = height as f64 / grid as f64;
    let span_w = cell_w.ceil() as usize;
    let span_h = cell_h.ceil() as usize;
    let step = 100.0 / grid as f32;

    // Every cell reads at least one pixel, so the grid never holds more
    // cells than the buffer while the requested size may be absurd.
    let capacity = grid.saturating_mul(grid).min(width.saturating_mul(height));
    let mut cells = Vec::with_capacity(capacity);
    for y in 0..grid {
        if cancel.load(Ordering::Relaxed) {
            return None;
        }
        let top = (y as f64 * cell_h).floor() as usize;

        for x in 0..grid {
            let left = (x as f64 * cell_w).floor() as usize;
            let mut sum = [0u64; 3];
            let mut count = 0u64;

            for row in top..(top + span_h).min(height) {
                for col in left..(left + span_w).min(width) {
                    let i = (row * width + col) * 4;
                    if let Some(px) = image_data.get(i..i + 3) {
                        sum[0] += px[0] as u64;
                        sum[1] += px[1] as u64;
                        sum[2] += px[2] as u64;
                        count += 1;
                    }
                }
            }

            if count == 0 {
                continue;
            }

            let avg = |channel: u64| (channel as f64 / count as f64).round() as u8;
            let pos = Vec2::new(x as f32 * step, y as f32 * step);
            cells.push(CellRecord {
                color: CellColor::new(avg(sum[0]), avg(sum[1]), avg(sum[2])),
                x: pos.x,
                y: pos.y,
                original_x: pos.x,
                original_y: pos.y,
                vx: 0.0,
                vy: 0.0,
            });
        }
    }
    Some(cells)
}

/// Decode PNG/JPEG bytes and center-crop them to a square.
pub fn decode_image(bytes: &[u8], grid_size: u32) -> Result<GridRequest, ImageLoadError> {
    let image = image::load_from_memory(bytes)?;
    let (width, height) = (image.width(), image.height());
    let side = width.min(height);
    if side == 0 {
        return Err(ImageLoadError::Empty);
    }

    let cropped = image
        .crop_imm((width - side) / 2, (height - side) / 2, side, side)
        .to_rgba8();

    Ok(GridRequest {
        image_data: cropped.into_raw(),
        width: side,
        height: side,
        grid_size,
    })
}

/// Read and decode an image file. See [`decode_image`].
pub fn load_image(path: impl AsRef<Path>, grid_size: u32) -> Result<GridRequest, ImageLoadError> {
    let bytes = std::fs::read(path)?;
    decode_image(&bytes, grid_size)
}

/// A finished grid, tagged with the job that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleResponse {
    pub generation: u64,
    pub grid_size: u32,
    pub cells: Vec<CellRecord>,
}

impl SampleResponse {
    pub fn into_particles(self) -> Vec<ImageParticle> {
        self.cells.into_iter().map(ImageParticle::from).collect()
    }
}

enum Job {
    Pixels(GridRequest),
    File { path: PathBuf, grid_size: u32 },
}

struct PendingJob {
    generation: u64,
    cancel: Arc<AtomicBool>,
    response: Receiver<SampleResponse>,
}

/// Background sampler. At most one job is in flight.
#[derive(Default)]
pub struct SamplerWorker {
    generation: u64,
    pending: Option<PendingJob>,
}

impl SamplerWorker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sample an already decoded buffer in the background.
    ///
    /// Returns the job's generation, or `None` if no thread could be started.
    pub fn submit(&mut self, request: GridRequest) -> Option<u64> {
        self.spawn(Job::Pixels(request))
    }

    /// Decode `path` and sample it in the background.
    ///
    /// An undecodable file is logged and never answered.
    pub fn submit_file(&mut self, path: impl Into<PathBuf>, grid_size: u32) -> Option<u64> {
        self.spawn(Job::File {
            path: path.into(),
            grid_size,
        })
    }

    fn spawn(&mut self, job: Job) -> Option<u64> {
        self.cancel();
        self.generation += 1;
        let generation = self.generation;

        let cancel = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::sync_channel(1);
        let thread_cancel = Arc::clone(&cancel);

        let spawned = std::thread::Builder::new()
            .name(format!("grid-sampler-{}", generation))
            .spawn(move || {
                let request = match job {
                    Job::Pixels(request) => request,
                    Job::File { path, grid_size } => match load_image(&path, grid_size) {
                        Ok(request) => request,
                        Err(e) => {
                            log::warn!("could not load {}: {}", path.display(), e);
                            return;
                        }
                    },
                };
                let Some(cells) = sample_grid_until(&request, &thread_cancel) else {
                    return;
                };
                // The receiver is gone if a newer job replaced this one.
                let _ = tx.send(SampleResponse {
                    generation,
                    grid_size: request.grid_size,
                    cells,
                });
            });

        match spawned {
            Ok(_) => {
                self.pending = Some(PendingJob {
                    generation,
                    cancel,
                    response: rx,
                });
                Some(generation)
            }
            Err(e) => {
                log::error!("failed to start grid sampler: {}", e);
                None
            }
        }
    }

    /// Take the finished grid of the current job, if it is ready.
    pub fn poll(&mut self) -> Option<SampleResponse> {
        let pending = self.pending.as_ref()?;
        match pending.response.try_recv() {
            Ok(response) => self.accept(response),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                // The job ended without answering (decode failure).
                self.pending = None;
                None
            }
        }
    }

    /// Block up to `timeout` for the current job.
    pub fn wait(&mut self, timeout: Duration) -> Option<SampleResponse> {
        let pending = self.pending.as_ref()?;
        match pending.response.recv_timeout(timeout) {
            Ok(response) => self.accept(response),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                self.pending = None;
                None
            }
        }
    }

    fn accept(&mut self, response: SampleResponse) -> Option<SampleResponse> {
        self.pending = None;
        if response.generation != self.generation {
            log::debug!(
                "discarding stale grid {} (current {})",
                response.generation,
                self.generation
            );
            return None;
        }
        log::info!(
            "grid {} ready: {} cells at {}x{}",
            response.generation,
            response.cells.len(),
            response.grid_size,
            response.grid_size
        );
        Some(response)
    }

    /// Abandon the in-flight job, if any.
    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.cancel.store(true, Ordering::Relaxed);
        }
    }

    /// Whether a job is still expected to answer.
    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// Generation of the most recent job.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Generation of the job still in flight.
    pub fn pending_generation(&self) -> Option<u64> {
        self.pending.as_ref().map(|p| p.generation)
    }
}

impl Drop for SamplerWorker {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
        rgba.repeat((width * height) as usize)
    }

    #[test]
    fn test_checkerboard_halves() {
        // Left half black, right half white, 4x2 grid cells of 2x2 pixels.
        let (w, h) = (4u32, 4u32);
        let mut data = Vec::new();
        for _ in 0..h {
            for x in 0..w {
                let v = if x < 2 { 0 } else { 255 };
                data.extend_from_slice(&[v, v, v, 255]);
            }
        }
        let cells = sample_grid(&GridRequest {
            image_data: data,
            width: w,
            height: h,
            grid_size: 2,
        });
        assert_eq!(cells.len(), 4);
        assert_eq!(cells[0].color, CellColor::new(0, 0, 0));
        assert_eq!(cells[1].color, CellColor::new(255, 255, 255));
        assert_eq!((cells[1].x, cells[1].y), (50.0, 0.0));
        assert_eq!((cells[2].x, cells[2].y), (0.0, 50.0));
    }

    #[test]
    fn test_average_is_rounded() {
        // One cell covering a 2x1 image of values 0 and 1 averages to 0.5 -> 1.
        let cells = sample_grid(&GridRequest {
            image_data: vec![0, 0, 0, 255, 1, 1, 1, 255],
            width: 2,
            height: 1,
            grid_size: 1,
        });
        assert_eq!(cells[0].color, CellColor::new(1, 1, 1));
    }

    #[test]
    fn test_non_square_source() {
        let cells = sample_grid(&GridRequest {
            image_data: solid(30, 10, [0, 0, 200, 255]),
            width: 30,
            height: 10,
            grid_size: 5,
        });
        assert_eq!(cells.len(), 25);
        assert!(cells.iter().all(|c| c.color == CellColor::new(0, 0, 200)));
    }

    #[test]
    fn test_truncated_buffer_omits_cells() {
        // Only the first row of pixels exists; the lower cells have nothing to read.
        let cells = sample_grid(&GridRequest {
            image_data: solid(4, 1, [9, 9, 9, 255]),
            width: 4,
            height: 4,
            grid_size: 2,
        });
        assert_eq!(cells.len(), 2);
        assert!(cells.iter().all(|c| c.y == 0.0));
    }

    #[test]
    fn test_grid_larger_than_image() {
        let cells = sample_grid(&GridRequest {
            image_data: solid(3, 3, [1, 2, 3, 255]),
            width: 3,
            height: 3,
            grid_size: 6,
        });
        assert_eq!(cells.len(), 36);
        assert!(cells.iter().all(|c| c.color == CellColor::new(1, 2, 3)));
    }

    #[test]
    fn test_zero_grid_is_empty() {
        let cells = sample_grid(&GridRequest {
            image_data: solid(2, 2, [0; 4]),
            width: 2,
            height: 2,
            grid_size: 0,
        });
        assert!(cells.is_empty());
    }

    #[test]
    fn test_huge_grid_does_not_overflow() {
        let request = GridRequest {
            image_data: solid(2, 2, [5; 4]),
            width: 2,
            height: 2,
            grid_size: u32::MAX,
        };
        // Cancelled before the first row: only the setup runs.
        let cancel = AtomicBool::new(true);
        assert_eq!(sample_grid_until(&request, &cancel), None);
    }

    #[test]
    fn test_cancelled_sample_has_no_result() {
        let request = GridRequest {
            image_data: solid(8, 8, [0; 4]),
            width: 8,
            height: 8,
            grid_size: 4,
        };
        let cancel = AtomicBool::new(true);
        assert_eq!(sample_grid_until(&request, &cancel), None);
    }

    #[test]
    fn test_record_wire_shape() {
        let record = CellRecord {
            color: CellColor::new(255, 0, 0),
            x: 10.0,
            y: 20.0,
            original_x: 10.0,
            original_y: 20.0,
            vx: 0.0,
            vy: 0.0,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["color"], "rgb(255,0,0)");
        assert_eq!(json["originalX"], 10.0);
        assert_eq!(json["originalY"], 20.0);

        let particle = ImageParticle::from(record.clone());
        assert_eq!(particle.origin(), Vec2::new(10.0, 20.0));
        assert_eq!(CellRecord::from(&particle), record);
    }

    #[test]
    fn test_decode_center_crops() {
        let mut img = image::RgbaImage::from_pixel(6, 2, image::Rgba([0, 0, 0, 255]));
        // Columns 2 and 3 are the center square; paint them red.
        for y in 0..2 {
            for x in 2..4 {
                img.put_pixel(x, y, image::Rgba([255, 0, 0, 255]));
            }
        }
        let mut png = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let request = decode_image(&png, 1).unwrap();
        assert_eq!((request.width, request.height), (2, 2));
        let cells = sample_grid(&request);
        assert_eq!(cells[0].color, CellColor::new(255, 0, 0));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode_image(b"definitely not a png", 10).unwrap_err();
        assert!(matches!(err, ImageLoadError::Decode(_)));
    }

    #[test]
    fn test_worker_answers_once() {
        let mut worker = SamplerWorker::new();
        let generation = worker
            .submit(GridRequest {
                image_data: solid(10, 10, [0, 255, 0, 255]),
                width: 10,
                height: 10,
                grid_size: 5,
            })
            .unwrap();

        let response = worker.wait(Duration::from_secs(10)).unwrap();
        assert_eq!(response.generation, generation);
        assert_eq!(response.cells.len(), 25);
        assert!(!worker.is_busy());
        assert!(worker.poll().is_none());
    }

    #[test]
    fn test_new_job_supersedes_old() {
        let mut worker = SamplerWorker::new();
        let first = worker
            .submit(GridRequest {
                image_data: solid(64, 64, [1, 1, 1, 255]),
                width: 64,
                height: 64,
                grid_size: 8,
            })
            .unwrap();
        let second = worker
            .submit(GridRequest {
                image_data: solid(4, 4, [2, 2, 2, 255]),
                width: 4,
                height: 4,
                grid_size: 2,
            })
            .unwrap();
        assert!(second > first);

        let response = worker.wait(Duration::from_secs(10)).unwrap();
        assert_eq!(response.generation, second);
        assert_eq!(response.cells[0].color, CellColor::new(2, 2, 2));
    }

    #[test]
    fn test_missing_file_never_answers() {
        let mut worker = SamplerWorker::new();
        worker.submit_file("/no/such/image.png", 10).unwrap();
        assert!(worker.wait(Duration::from_secs(10)).is_none());
        assert!(!worker.is_busy());
    }
}
