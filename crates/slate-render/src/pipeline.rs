use std::io::Write;

use slate_core::hash::{self, ContentHash, SnapshotHasher};
use slate_core::{FrameSnapshot, SlateError, SlateResult};
use slate_ir::{FinalizedScene, Stage, TIME_EPSILON};

/// Result of a complete playback.
#[derive(Debug, Clone)]
pub struct PlaybackResult {
    /// All sampled frames in order.
    pub frames: Vec<FrameSnapshot>,
    /// Output frame rate.
    pub fps: f64,
    /// Playback-speed multiplier the frames were sampled with.
    pub speed: f64,
    /// Scene duration in seconds.
    pub duration: f64,
}

impl PlaybackResult {
    pub fn frame_count(&self) -> u64 {
        self.frames.len() as u64
    }

    pub fn frame(&self, index: usize) -> Option<&FrameSnapshot> {
        self.frames.get(index)
    }

    pub fn last_frame(&self) -> Option<&FrameSnapshot> {
        self.frames.last()
    }

    /// Compute the content hash of the entire playback.
    ///
    /// The same finalized scene played at the same rate always produces the same hash.
    pub fn content_hash(&self) -> SlateResult<ContentHash> {
        hash::hash_snapshots(&self.frames)
    }

    /// Compute the content hash of a single frame by index.
    pub fn frame_hash(&self, index: usize) -> Option<SlateResult<ContentHash>> {
        self.frames.get(index).map(hash::hash_snapshot)
    }

    /// Write one JSON snapshot per line, for an external rasterizer.
    pub fn write_jsonl<W: Write>(&self, mut writer: W) -> SlateResult<()> {
        for frame in &self.frames {
            serde_json::to_writer(&mut writer, frame)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Plays a finalized scene back as a sequence of frame snapshots.
///
/// Frame `k` samples scene time `min(k * speed / fps, total)`; the last frame always
/// lands on the end of the timeline and shows the fully committed state.
#[derive(Debug, Clone, Copy)]
pub struct Player<'a> {
    scene: &'a FinalizedScene,
    fps: f64,
    speed: f64,
}

impl<'a> Player<'a> {
    /// A player using the scene's own render configuration.
    pub fn new(scene: &'a FinalizedScene) -> Self {
        Self {
            scene,
            fps: scene.config.render.effective_fps(),
            speed: scene.config.render.playback_speed,
        }
    }

    pub fn with_fps(mut self, fps: f64) -> SlateResult<Self> {
        if !(fps.is_finite() && fps > 0.0) {
            return Err(SlateError::invalid_argument(format!(
                "fps must be positive, got {fps}"
            )));
        }
        self.fps = fps;
        Ok(self)
    }

    /// Scale scene time per output frame; 2.0 plays twice as fast with half the frames.
    pub fn with_speed(mut self, speed: f64) -> SlateResult<Self> {
        if !(speed.is_finite() && speed > 0.0) {
            return Err(SlateError::invalid_argument(format!(
                "playback speed must be positive, got {speed}"
            )));
        }
        self.speed = speed;
        Ok(self)
    }

    pub fn scene(&self) -> &'a FinalizedScene {
        self.scene
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Number of frames a full playback produces, counting both end points.
    pub fn frame_count(&self) -> u64 {
        (self.scene.total_duration() / self.speed)
            .frame_count(self.fps)
            .saturating_add(1)
    }

    /// Scene time sampled by frame `index`.
    pub fn frame_time(&self, index: u64) -> f64 {
        let total = self.scene.total_duration().as_seconds();
        (index as f64 * self.speed / self.fps).min(total)
    }

    /// Lazily play the scene, one snapshot per call to `next`.
    pub fn stream(&self) -> Playback<'a> {
        Playback {
            scene: self.scene,
            stage: Stage::new(self.scene.frame_bounds()),
            fps: self.fps,
            speed: self.speed,
            frames: self.frame_count(),
            next_frame: 0,
            next_entry: 0,
            current: None,
            failed: false,
        }
    }

    /// Play the whole scene and collect every frame.
    pub fn render(&self) -> SlateResult<PlaybackResult> {
        let duration = self.scene.total_duration().as_seconds();
        tracing::info!(
            "Playing scene '{}': {} frames at {} fps (speed {}x, {:.2}s)",
            self.scene.name,
            self.frame_count(),
            self.fps,
            self.speed,
            duration
        );

        let frames = self.stream().collect::<SlateResult<Vec<_>>>()?;

        tracing::info!("Playback of '{}' complete: {} frames", self.scene.name, frames.len());
        Ok(PlaybackResult {
            frames,
            fps: self.fps,
            speed: self.speed,
            duration,
        })
    }

    /// Play the scene and hash the frames without keeping them.
    pub fn content_hash(&self) -> SlateResult<ContentHash> {
        let mut hasher = SnapshotHasher::new();
        for frame in self.stream() {
            hasher.update(&frame?)?;
        }
        Ok(hasher.finalize())
    }

    /// The snapshot at an arbitrary scene time, clamped to the timeline.
    ///
    /// Replays every entry up to `time`, so the result matches what a full
    /// playback shows at that instant.
    pub fn sample_at(&self, time: f64) -> SlateResult<FrameSnapshot> {
        if time.is_nan() {
            return Err(SlateError::invalid_argument("sample time is NaN"));
        }
        let time = time.clamp(0.0, self.scene.total_duration().as_seconds());
        let index = (time / self.speed * self.fps + TIME_EPSILON).floor() as u64;
        let mut playback = self.stream();
        let entry = playback.advance_to(time)?;
        playback.stage.snapshot(index, time, entry)
    }
}

/// An in-progress playback. Yields one snapshot per frame, then `None`.
///
/// After an error the iterator is exhausted.
pub struct Playback<'a> {
    scene: &'a FinalizedScene,
    stage: Stage,
    fps: f64,
    speed: f64,
    frames: u64,
    next_frame: u64,
    next_entry: usize,
    current: Option<usize>,
    failed: bool,
}

impl Playback<'_> {
    /// Frames left to produce.
    pub fn remaining(&self) -> u64 {
        if self.failed {
            0
        } else {
            self.frames - self.next_frame
        }
    }

    /// Move the stage to scene time `time`, which must not go backwards.
    ///
    /// Entries are opened in order and closed once `time` reaches their end. Returns the
    /// entry in flight, or `None` once the timeline has ended.
    fn advance_to(&mut self, time: f64) -> SlateResult<Option<usize>> {
        let entries = self.scene.entries();
        let spans = self.scene.spans();
        let config = &self.scene.config.animation;
        loop {
            let index = match self.current {
                Some(index) => index,
                None => {
                    let index = self.next_entry;
                    let Some(entry) = entries.get(index) else {
                        return Ok(None);
                    };
                    self.stage
                        .open_entry(entry, config)
                        .map_err(|e| e.at_entry(index))?;
                    tracing::debug!(entry = index, start = spans[index].start, "entry opened");
                    self.next_entry += 1;
                    self.current = Some(index);
                    index
                }
            };

            let span = spans[index];
            if span.finished_by(time) {
                self.stage.close_entry().map_err(|e| e.at_entry(index))?;
                tracing::debug!(entry = index, end = span.end, "entry closed");
                self.current = None;
                continue;
            }
            self.stage.sample(time - span.start);
            return Ok(Some(index));
        }
    }

    fn frame(&mut self, index: u64) -> SlateResult<FrameSnapshot> {
        let total = self.scene.total_duration().as_seconds();
        let time = (index as f64 * self.speed / self.fps).min(total);
        let entry = self.advance_to(time)?;
        self.stage.snapshot(index, time, entry)
    }
}

impl Iterator for Playback<'_> {
    type Item = SlateResult<FrameSnapshot>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.next_frame >= self.frames {
            return None;
        }
        let index = self.next_frame;
        self.next_frame += 1;
        let frame = self.frame(index);
        if frame.is_err() {
            self.failed = true;
        }
        Some(frame)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining() as usize;
        (0, Some(remaining))
    }
}
