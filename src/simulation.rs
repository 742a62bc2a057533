//! Simulation builder and runner

use glam::Vec2;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, TouchPhase, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode as WinitKeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::config::Config;
use crate::error::SimulationError;
use crate::gpu::Presenter;
use crate::image_field::ImageField;
use crate::input::{InputContext, KeyCode, PointerSpace, PointerTracker, PullGesture};
use crate::layout::Rect;
use crate::render::{self, Canvas, IMAGE_MAX_SIDE};
use crate::sampler::SamplerWorker;
use crate::text_field::TextField;
use crate::time::{Debounce, FrameLoop};
use crate::visibility::VisibilityGate;

/// Which field is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldMode {
    #[default]
    Text,
    Image,
}

impl FieldMode {
    fn toggled(self) -> Self {
        match self {
            FieldMode::Text => FieldMode::Image,
            FieldMode::Image => FieldMode::Text,
        }
    }

    fn pointer_space(self) -> PointerSpace {
        match self {
            FieldMode::Text => PointerSpace::Pixels,
            FieldMode::Image => PointerSpace::Percent,
        }
    }
}

/// The editable word shown by the letter field.
///
/// Input is uppercased and capped at `max_len` characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordInput {
    text: String,
    max_len: usize,
}

impl WordInput {
    pub fn new(initial: &str, max_len: usize) -> Self {
        let mut input = Self {
            text: String::new(),
            max_len,
        };
        input.set(initial);
        input
    }

    /// Replace the whole word.
    pub fn set(&mut self, text: &str) {
        self.text = text.to_uppercase().chars().take(self.max_len).collect();
    }

    /// Append a character. Returns `false` if the word is full or `ch` is a
    /// control character.
    pub fn push(&mut self, ch: char) -> bool {
        // Some characters uppercase to more than one (ß -> SS).
        let upper = ch.to_uppercase();
        if ch.is_control() || self.len() + upper.len() > self.max_len {
            return false;
        }
        self.text.extend(upper);
        true
    }

    /// Remove the last character. Returns `false` if the word was empty.
    pub fn backspace(&mut self) -> bool {
        self.text.pop().is_some()
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// An interactive particle window.
///
/// Use method chaining to configure, then call `.run()` to start.
///
/// ```ignore
/// Simulation::new()
///     .with_word("HELLO")
///     .run()?;
/// ```
pub struct Simulation {
    config: Config,
    word: String,
    image: Option<PathBuf>,
}

impl Simulation {
    /// Create a new simulation with default settings.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            word: "HELLO".into(),
            image: None,
        }
    }

    /// Replace every tunable at once.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Set the initial word of the letter field.
    pub fn with_word(mut self, word: impl Into<String>) -> Self {
        self.word = word.into();
        self
    }

    /// Load an image at startup and open on the image field.
    pub fn with_image(mut self, path: impl Into<PathBuf>) -> Self {
        self.image = Some(path.into());
        self
    }

    /// Run the simulation. This blocks until the window is closed.
    pub fn run(self) -> Result<(), SimulationError> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Wait);

        let mut app = App::new(self);
        event_loop.run_app(&mut app)?;

        match app.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

/// What the last presented frame showed.
#[derive(Debug, Clone, Copy, PartialEq)]
struct FrameKey {
    mode: FieldMode,
    revision: u64,
    offset: f32,
    focused: bool,
    loading: bool,
}

struct App {
    config: Config,
    window: Option<Arc<Window>>,
    presenter: Option<Presenter>,
    canvas: Canvas,
    error: Option<SimulationError>,

    mode: FieldMode,
    word: WordInput,
    focused: bool,
    text: TextField,
    image: ImageField,
    sampler: SamplerWorker,

    tracker: PointerTracker,
    pull: PullGesture,
    visibility: VisibilityGate,
    frames: FrameLoop,
    resize: Debounce<Vec2>,
    /// `None` forces the next redraw to present.
    presented: Option<FrameKey>,
}

impl App {
    fn new(sim: Simulation) -> Self {
        let config = sim.config;
        let size = Vec2::new(config.window.width as f32, config.window.height as f32);

        let mut text = TextField::new(config.text.clone(), size);
        let word = WordInput::new(&sim.word, config.text.max_word_len);
        text.set_word(word.as_str());

        let mut sampler = SamplerWorker::new();
        let mode = match sim.image {
            Some(path) => {
                sampler.submit_file(path, config.image.grid_size);
                FieldMode::Image
            }
            None => FieldMode::Text,
        };

        Self {
            window: None,
            presenter: None,
            canvas: Canvas::new(config.window.width, config.window.height),
            error: None,
            mode,
            word,
            focused: false,
            text,
            image: ImageField::new(config.image.clone()),
            sampler,
            tracker: PointerTracker::new(mode.pointer_space(), &config.input),
            pull: PullGesture::new(config.input.pull_threshold),
            visibility: VisibilityGate::new(),
            frames: FrameLoop::new(),
            resize: Debounce::new(Duration::from_millis(config.input.resize_debounce_ms)),
            presented: None,
            config,
        }
    }

    fn window_rect(&self) -> Rect {
        Rect::from_size(self.canvas.size())
    }

    fn image_rect(&self) -> Rect {
        Rect::centered_square(self.window_rect(), IMAGE_MAX_SIDE)
    }

    fn field_rect(&self) -> Rect {
        match self.mode {
            FieldMode::Text => self.window_rect(),
            FieldMode::Image => self.image_rect(),
        }
    }

    fn set_mode(&mut self, mode: FieldMode) {
        if self.mode == mode {
            return;
        }
        self.mode = mode;
        self.focused = false;
        self.tracker.set_space(mode.pointer_space());
        self.tracker.set_container(self.field_rect());
        self.presented = None;
    }

    fn resized(&mut self, width: u32, height: u32) {
        if let Some(presenter) = &mut self.presenter {
            presenter.resize(winit::dpi::PhysicalSize::new(width, height));
        }
        if width == 0 || height == 0 {
            return;
        }
        let size = Vec2::new(width as f32, height as f32);
        self.canvas.resize(width, height);
        self.text.set_container(size);
        self.resize.trigger(size, Instant::now());
        self.tracker.set_container(self.field_rect());
        self.presented = None;
    }

    fn visibility_changed(&mut self, visible: bool) {
        self.frames.follow_visibility(visible);
        if visible {
            self.presented = None;
            if let Some(window) = &self.window {
                window.request_redraw();
            }
        }
    }

    fn load_image(&mut self, path: PathBuf) {
        log::info!("loading {}", path.display());
        self.set_mode(FieldMode::Image);
        self.image.clear();
        self.sampler.submit_file(path, self.config.image.grid_size);
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn key_pressed(&mut self, event: &KeyEvent) {
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        if code == WinitKeyCode::Tab {
            self.set_mode(self.mode.toggled());
            return;
        }
        if self.mode != FieldMode::Text {
            return;
        }

        match KeyCode::from(code) {
            KeyCode::Enter => self.focused = !self.focused,
            KeyCode::Escape => self.focused = false,
            KeyCode::Backspace if self.focused => {
                if self.word.backspace() {
                    self.text.set_word(self.word.as_str());
                }
            }
            _ if self.focused => {
                let Some(text) = &event.text else {
                    return;
                };
                let mut edited = false;
                for ch in text.chars() {
                    edited |= self.word.push(ch);
                }
                if edited {
                    self.text.set_word(self.word.as_str());
                }
            }
            _ => {}
        }
    }

    fn touch(&mut self, phase: TouchPhase, y: f32) {
        if self.mode != FieldMode::Text {
            return;
        }
        match phase {
            TouchPhase::Started => self.pull.begin(y),
            TouchPhase::Moved => self.pull.update(y),
            TouchPhase::Ended | TouchPhase::Cancelled => {
                if self.pull.end() {
                    self.text.reseed();
                }
            }
        }
    }

    fn frame_key(&self) -> FrameKey {
        let revision = match self.mode {
            FieldMode::Text => self.text.revision(),
            FieldMode::Image => self.image.revision(),
        };
        FrameKey {
            mode: self.mode,
            revision,
            offset: self.pull.offset(),
            focused: self.focused,
            loading: self.sampler.is_busy(),
        }
    }

    /// One animation frame: apply settled work, step the visible field.
    fn update(&mut self) {
        if let Some(size) = self.resize.poll(Instant::now()) {
            log::debug!("relayout for {}x{}", size.x, size.y);
            self.text.set_container(size);
            self.text.relayout();
        }

        if let Some(response) = self.sampler.poll() {
            let grid_size = response.grid_size;
            self.image.load(grid_size, response.into_particles());
        }

        if self.frames.begin_frame().is_none() {
            return;
        }
        let ctx = InputContext::new(self.tracker.state(), self.visibility.is_visible());
        match self.mode {
            FieldMode::Text => {
                self.text.step(&ctx, self.focused);
            }
            FieldMode::Image => {
                self.image.step(&ctx);
            }
        }
    }

    fn draw(&mut self, key: FrameKey) {
        self.canvas.clear(self.config.window.background);
        match self.mode {
            FieldMode::Text => {
                render::draw_text_field(&mut self.canvas, &self.text, key.offset);
                let caption = if self.focused {
                    format!("> {}_", self.word.as_str())
                } else {
                    "ENTER: EDIT  TAB: IMAGE".to_string()
                };
                render::draw_str(&mut self.canvas, 16, 16, &caption, 2, render::TILE_COLOR);
            }
            FieldMode::Image => {
                let rect = self.image_rect();
                render::draw_image_field(&mut self.canvas, &self.image, rect);
                if self.image.particles().is_empty() {
                    let caption = if key.loading { "LOADING..." } else { "DROP AN IMAGE" };
                    render::draw_str(&mut self.canvas, 16, 16, caption, 2, render::TILE_COLOR);
                }
            }
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        self.update();

        let key = self.frame_key();
        if self.presented != Some(key) {
            self.draw(key);
            if let Some(presenter) = &mut self.presenter {
                match presenter.render(&self.canvas) {
                    Ok(()) => self.presented = Some(key),
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        presenter.reconfigure()
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("surface out of memory");
                        event_loop.exit();
                    }
                    Err(e) => log::error!("render error: {:?}", e),
                }
            }
        }

        if self.frames.is_running() || self.sampler.is_busy() {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title(self.config.window.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("failed to create window: {}", e);
                self.error = Some(e.into());
                event_loop.exit();
                return;
            }
        };

        match pollster::block_on(Presenter::new(window.clone())) {
            Ok(presenter) => self.presenter = Some(presenter),
            Err(e) => {
                log::error!("failed to initialize GPU: {}", e);
                self.error = Some(e.into());
                event_loop.exit();
                return;
            }
        }

        let size = window.inner_size();
        self.window = Some(window.clone());
        self.resized(size.width, size.height);
        // The first layout is applied immediately.
        self.resize.cancel();
        self.text.resize(self.canvas.size());

        self.frames.start();
        window.request_redraw();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let Some(visible) = self.visibility.handle_event(&event) {
            self.visibility_changed(visible);
        }
        self.tracker.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                self.frames.cancel();
                self.sampler.cancel();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => self.resized(size.width, size.height),
            WindowEvent::DroppedFile(path) => self.load_image(path),
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed {
                    self.key_pressed(&event);
                }
            }
            WindowEvent::Touch(touch) => self.touch(touch.phase, touch.location.y as f32),
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        match self.resize.deadline() {
            Some(deadline) if deadline <= Instant::now() => {
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            Some(deadline) => event_loop.set_control_flow(ControlFlow::WaitUntil(deadline)),
            None => event_loop.set_control_flow(ControlFlow::Wait),
        }
    }
}
