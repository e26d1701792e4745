//! Painter: the device-independent drawing façade
//!
//! A `Painter` is the single entry point for all drawing. It owns the state
//! stack, decides per draw call whether the bound engine can render the
//! current state natively, and either forwards the primitive (after
//! flushing dirty state) or routes it through the emulation machinery in
//! [`crate::paint::emulation`].
//!
//! # Lifecycle
//!
//! ```
//! use easelkit::paint::engines::RasterEngine;
//! use easelkit::{Color, Painter, Pen, Pixmap, Rect};
//!
//! let mut pm = Pixmap::new(64, 64).unwrap();
//! let mut engine = RasterEngine::new(&mut pm);
//! let mut painter = Painter::new();
//! assert!(painter.begin(&mut engine));
//! painter.set_pen(Pen::new(Color::BLACK, 2.0));
//! painter.draw_rect(Rect::from_xywh(8.0, 8.0, 48.0, 48.0));
//! assert!(painter.end());
//! ```
//!
//! Every mutator and draw call on an inactive painter warns and does
//! nothing; getters on an inactive painter serve a process-wide dummy state
//! so callers that ignored a failed `begin()` don't crash.
//!
//! # Failure model
//!
//! Nothing here returns `Result`: backend limitations are emulated,
//! contract violations (unbalanced `restore`, drawing while inactive)
//! degrade to warned no-ops, and degenerate geometry is a legitimate empty
//! draw that returns silently.

use crate::geometry::{Line, Point, Rect, Size};
use crate::paint::brush::Brush;
use crate::paint::color::Color;
use crate::paint::emulation::{DrawOp, EmulationSpecifier};
use crate::paint::engine::{EngineFeatures, EngineType, PaintEngine, PolygonMode};
use crate::paint::path::{FillRule, PainterPath};
use crate::paint::pen::Pen;
use crate::paint::pixmap::Pixmap;
use crate::paint::state::{
  BackgroundMode, ClipEntry, ClipOperation, ClipShape, CompositionMode, DirtyFlags, PainterState,
  RenderHints,
};
use crate::paint::text::{FontEngine, TextItem};
use crate::transform::Transform;
use log::warn;
use std::sync::Arc;

/// The drawing façade
pub struct Painter<'a> {
  pub(crate) engine: Option<&'a mut dyn PaintEngine>,
  pub(crate) states: Vec<PainterState>,
  /// Redirection frame markers: `restore()` never pops past the last one
  frame_bases: Vec<usize>,
  pub(crate) emulation: EmulationSpecifier,
  pub(crate) engine_features: EngineFeatures,
  pub(crate) engine_kind: Option<EngineType>,
  pub(crate) device_size: Size,
  owner_thread: Option<std::thread::ThreadId>,
  thread_warned: bool,
}

impl<'a> Painter<'a> {
  /// Creates an inactive painter
  pub fn new() -> Self {
    Self {
      engine: None,
      states: Vec::new(),
      frame_bases: Vec::new(),
      emulation: EmulationSpecifier::default(),
      engine_features: EngineFeatures::empty(),
      engine_kind: None,
      device_size: Size::ZERO,
      owner_thread: None,
      thread_warned: false,
    }
  }

  /// Binds the painter to an engine and starts painting
  ///
  /// Returns false — leaving the painter inert — when the painter is
  /// already active or the engine rejects its device. Callers that ignore
  /// the result get warned no-ops instead of crashes.
  pub fn begin(&mut self, engine: &'a mut dyn PaintEngine) -> bool {
    if self.is_active() {
      warn!("Painter::begin: painter is already active");
      return false;
    }
    if !engine.begin() {
      warn!("Painter::begin: engine could not begin painting on its device");
      return false;
    }
    self.engine_features = engine.core().features();
    self.engine_kind = Some(engine.engine_type());
    self.device_size = engine.device_size();
    self.engine = Some(engine);
    self.states = vec![PainterState::new()];
    self.frame_bases.clear();
    self.owner_thread = Some(std::thread::current().id());
    self.thread_warned = false;

    // Full initial synchronization.
    self.states[0].dirty = DirtyFlags::all();
    self.flush();
    self.update_emulation_specifier();
    true
  }

  /// Ends painting and releases the engine
  pub fn end(&mut self) -> bool {
    if !self.is_active() {
      warn!("Painter::end: painter is not active");
      return false;
    }
    let engine = self.engine.take().expect("active painter has an engine");
    let ok = engine.end();
    self.states.clear();
    self.frame_bases.clear();
    self.engine_kind = None;
    self.device_size = Size::ZERO;
    ok
  }

  /// True between a successful `begin()` and the matching `end()`
  pub fn is_active(&self) -> bool {
    self.engine.is_some() && !self.states.is_empty()
  }

  /// The bound device's extent at the origin
  pub fn device_rect(&self) -> Rect {
    Rect::new(Point::ZERO, self.device_size)
  }

  // ------------------------------------------------------------------
  // State access
  // ------------------------------------------------------------------

  /// The current state, or the shared dummy when inactive
  pub fn state(&self) -> &PainterState {
    match self.states.last() {
      Some(state) => state,
      None => PainterState::shared_dummy(),
    }
  }

  pub(crate) fn state_mut(&mut self) -> &mut PainterState {
    self.states.last_mut().expect("painter is active")
  }

  fn ensure_active(&mut self, what: &str) -> bool {
    if !self.is_active() {
      warn!("Painter::{what}: painter not active");
      return false;
    }
    #[cfg(debug_assertions)]
    self.check_thread(what);
    true
  }

  /// Warns once when a window-system painter crosses threads
  ///
  /// Offscreen targets (raster, picture) are safe to paint from any
  /// thread; window-system surfaces are not.
  #[cfg(debug_assertions)]
  fn check_thread(&mut self, what: &str) {
    if self.thread_warned || self.engine_kind != Some(EngineType::Windowing) {
      return;
    }
    if self.owner_thread != Some(std::thread::current().id()) {
      warn!("Painter::{what}: window-system painting outside the owning thread");
      self.thread_warned = true;
    }
  }

  /// Pushes the accumulated dirty state to the engine
  pub(crate) fn flush(&mut self) {
    let state = self.states.last().expect("painter is active");
    let flags = state.dirty;
    if flags.is_empty() {
      return;
    }
    let mut snapshot = state.clone();
    snapshot.dirty = DirtyFlags::empty();
    let engine = self.engine.as_deref_mut().expect("painter is active");
    engine.core_mut().state = snapshot;
    engine.core_mut().dirty = flags;
    engine.update_state(flags);
    self.states.last_mut().expect("painter is active").dirty = DirtyFlags::empty();
  }

  pub(crate) fn engine_mut(&mut self) -> &mut dyn PaintEngine {
    self.engine.as_deref_mut().expect("painter is active")
  }

  fn mark_dirty(&mut self, flags: DirtyFlags) {
    self.state_mut().dirty |= flags;
  }

  // ------------------------------------------------------------------
  // Save / restore and redirection frames
  // ------------------------------------------------------------------

  /// Index below which `restore()` may not pop
  fn frame_base(&self) -> usize {
    self.frame_bases.last().copied().unwrap_or(0)
  }

  /// Pushes a copy of the current state
  pub fn save(&mut self) {
    if !self.ensure_active("save") {
      return;
    }
    let copy = self.states.last().expect("active").clone();
    self.states.push(copy);
  }

  /// Pops to the previously saved state
  ///
  /// The clip history cannot be diffed — clip operations are not
  /// commutative — so the engine is told to rebuild its clip from the
  /// restored state's full chronological history (each entry still tagged
  /// with the transform it was applied under). Restoring past the bottom
  /// of the stack (or past a redirection frame) is a contract violation:
  /// warned and ignored.
  pub fn restore(&mut self) {
    if !self.ensure_active("restore") {
      return;
    }
    if self.states.len() <= self.frame_base() + 1 {
      warn!("Painter::restore: unbalanced restore, ignoring");
      return;
    }
    let popped = self.states.pop().expect("checked depth");
    let current = self.states.last_mut().expect("checked depth");

    // Everything potentially changed; have the engine re-read all of it.
    // The clip bits force the chronological clip replay.
    let mut flags = DirtyFlags::all();
    if popped.clip_stack == current.clip_stack && popped.clip_enabled == current.clip_enabled {
      flags.remove(DirtyFlags::CLIP);
    }
    current.dirty |= flags;
    self.update_emulation_specifier();
  }

  /// Opens a redirection frame with a fresh default state
  ///
  /// Used when a painter is temporarily redirected to paint on another
  /// consumer's behalf: the new frame is independently save/restore-able
  /// and `restore()` cannot pop past it. Must be balanced with
  /// [`Painter::pop_frame`].
  pub fn push_frame(&mut self) {
    if !self.ensure_active("push_frame") {
      return;
    }
    self.frame_bases.push(self.states.len());
    let mut state = PainterState::new();
    state.dirty = DirtyFlags::all();
    self.states.push(state);
    self.update_emulation_specifier();
  }

  /// Closes the current redirection frame
  ///
  /// Splices the frame's states back out; unbalanced saves inside the
  /// frame are discarded with a warning.
  pub fn pop_frame(&mut self) {
    if !self.ensure_active("pop_frame") {
      return;
    }
    let Some(base) = self.frame_bases.pop() else {
      warn!("Painter::pop_frame: no open frame");
      return;
    };
    if self.states.len() > base + 1 {
      warn!("Painter::pop_frame: discarding unbalanced saves inside frame");
    }
    self.states.truncate(base);
    self
      .states
      .last_mut()
      .expect("frame base above stack bottom")
      .dirty = DirtyFlags::all();
    self.update_emulation_specifier();
  }

  /// Current save-stack depth (including the initial state)
  pub fn depth(&self) -> usize {
    self.states.len()
  }

  // ------------------------------------------------------------------
  // Mutators and getters
  // ------------------------------------------------------------------

  pub fn pen(&self) -> &Pen {
    &self.state().pen
  }

  pub fn set_pen(&mut self, pen: Pen) {
    if !self.ensure_active("set_pen") {
      return;
    }
    self.state_mut().pen = pen;
    self.mark_dirty(DirtyFlags::PEN);
    self.update_emulation_specifier();
  }

  pub fn brush(&self) -> &Brush {
    &self.state().brush
  }

  pub fn set_brush(&mut self, brush: Brush) {
    if !self.ensure_active("set_brush") {
      return;
    }
    self.state_mut().brush = brush;
    self.mark_dirty(DirtyFlags::BRUSH);
    self.update_emulation_specifier();
  }

  pub fn brush_origin(&self) -> Point {
    self.state().brush_origin
  }

  pub fn set_brush_origin(&mut self, origin: Point) {
    if !self.ensure_active("set_brush_origin") {
      return;
    }
    self.state_mut().brush_origin = origin;
    self.mark_dirty(DirtyFlags::BRUSH_ORIGIN);
  }

  pub fn background(&self) -> &Brush {
    &self.state().background
  }

  pub fn set_background(&mut self, background: Brush) {
    if !self.ensure_active("set_background") {
      return;
    }
    self.state_mut().background = background;
    self.mark_dirty(DirtyFlags::BACKGROUND);
  }

  pub fn background_mode(&self) -> BackgroundMode {
    self.state().background_mode
  }

  pub fn set_background_mode(&mut self, mode: BackgroundMode) {
    if !self.ensure_active("set_background_mode") {
      return;
    }
    self.state_mut().background_mode = mode;
    self.mark_dirty(DirtyFlags::BACKGROUND_MODE);
    self.update_emulation_specifier();
  }

  pub fn font(&self) -> &Arc<dyn FontEngine> {
    &self.state().font
  }

  pub fn set_font(&mut self, font: Arc<dyn FontEngine>) {
    if !self.ensure_active("set_font") {
      return;
    }
    self.state_mut().font = font;
    self.mark_dirty(DirtyFlags::FONT);
  }

  pub fn opacity(&self) -> f32 {
    self.state().opacity
  }

  pub fn set_opacity(&mut self, opacity: f32) {
    if !self.ensure_active("set_opacity") {
      return;
    }
    self.state_mut().opacity = opacity.clamp(0.0, 1.0);
    self.mark_dirty(DirtyFlags::OPACITY);
    self.update_emulation_specifier();
  }

  pub fn composition_mode(&self) -> CompositionMode {
    self.state().composition_mode
  }

  /// Sets the composition mode, silently degrading unsupported modes
  pub fn set_composition_mode(&mut self, mode: CompositionMode) {
    if !self.ensure_active("set_composition_mode") {
      return;
    }
    let effective = mode.degrade_for(self.engine_features);
    self.state_mut().composition_mode = effective;
    self.mark_dirty(DirtyFlags::COMPOSITION_MODE);
  }

  pub fn render_hints(&self) -> RenderHints {
    self.state().render_hints
  }

  pub fn set_render_hints(&mut self, hints: RenderHints) {
    if !self.ensure_active("set_render_hints") {
      return;
    }
    self.state_mut().render_hints = hints;
    self.mark_dirty(DirtyFlags::HINTS);
  }

  /// Toggles one render hint
  pub fn set_render_hint(&mut self, hint: RenderHints, on: bool) {
    if !self.ensure_active("set_render_hint") {
      return;
    }
    let mut hints = self.state().render_hints;
    hints.set(hint, on);
    self.state_mut().render_hints = hints;
    self.mark_dirty(DirtyFlags::HINTS);
  }

  // ------------------------------------------------------------------
  // Transforms
  // ------------------------------------------------------------------

  /// The world transform
  pub fn transform(&self) -> Transform {
    self.state().world_transform
  }

  /// The full logical-to-device transform (world then view)
  pub fn combined_transform(&self) -> Transform {
    self.state().combined_transform()
  }

  pub fn set_transform(&mut self, transform: Transform) {
    if !self.ensure_active("set_transform") {
      return;
    }
    self.state_mut().world_transform = transform;
    self.mark_dirty(DirtyFlags::TRANSFORM);
    self.update_emulation_specifier();
  }

  pub fn reset_transform(&mut self) {
    self.set_transform(Transform::identity());
  }

  pub fn translate(&mut self, dx: f32, dy: f32) {
    if !self.ensure_active("translate") {
      return;
    }
    let t = self.state().world_transform.pre_translate(dx, dy);
    self.set_transform(t);
  }

  pub fn scale(&mut self, sx: f32, sy: f32) {
    if !self.ensure_active("scale") {
      return;
    }
    let t = self.state().world_transform.pre_scale(sx, sy);
    self.set_transform(t);
  }

  pub fn rotate(&mut self, degrees: f32) {
    if !self.ensure_active("rotate") {
      return;
    }
    let t = self.state().world_transform.pre_rotate_deg(degrees);
    self.set_transform(t);
  }

  pub fn shear(&mut self, sh: f32, sv: f32) {
    if !self.ensure_active("shear") {
      return;
    }
    let t = self.state().world_transform.pre_shear(sh, sv);
    self.set_transform(t);
  }

  /// Sets the logical window rect of the window/viewport mapping
  pub fn set_window(&mut self, window: Rect) {
    if !self.ensure_active("set_window") {
      return;
    }
    self.state_mut().window = window;
    self.rebuild_view_transform();
  }

  /// Sets the device viewport rect of the window/viewport mapping
  pub fn set_viewport(&mut self, viewport: Rect) {
    if !self.ensure_active("set_viewport") {
      return;
    }
    self.state_mut().viewport = viewport;
    self.rebuild_view_transform();
  }

  pub fn window(&self) -> Rect {
    let w = self.state().window;
    if w.is_empty() {
      self.device_rect()
    } else {
      w
    }
  }

  pub fn viewport(&self) -> Rect {
    let v = self.state().viewport;
    if v.is_empty() {
      self.device_rect()
    } else {
      v
    }
  }

  fn rebuild_view_transform(&mut self) {
    let window = self.window();
    let viewport = self.viewport();
    let view = if window == viewport || window.is_empty() {
      Transform::identity()
    } else {
      Transform::from_translate(-window.left(), -window.top())
        .then(&Transform::from_scale(
          viewport.width() / window.width(),
          viewport.height() / window.height(),
        ))
        .then(&Transform::from_translate(viewport.left(), viewport.top()))
    };
    self.state_mut().view_transform = view;
    self.mark_dirty(DirtyFlags::TRANSFORM);
    self.update_emulation_specifier();
  }

  // ------------------------------------------------------------------
  // Clipping
  // ------------------------------------------------------------------

  pub fn has_clip(&self) -> bool {
    self.state().has_clip()
  }

  /// Applies a rectangular clip
  pub fn set_clip_rect(&mut self, rect: Rect, op: ClipOperation) {
    if !self.ensure_active("set_clip_rect") {
      return;
    }
    self.apply_clip(ClipShape::Rect(rect), op, DirtyFlags::CLIP_REGION);
  }

  /// Applies a path clip
  pub fn set_clip_path(&mut self, path: PainterPath, op: ClipOperation) {
    if !self.ensure_active("set_clip_path") {
      return;
    }
    self.apply_clip(ClipShape::Path(path), op, DirtyFlags::CLIP_PATH);
  }

  /// Enables or disables clipping without touching the clip history
  pub fn set_clip_enabled(&mut self, enabled: bool) {
    if !self.ensure_active("set_clip_enabled") {
      return;
    }
    self.state_mut().clip_enabled = enabled;
    self.mark_dirty(DirtyFlags::CLIP_ENABLED);
  }

  fn apply_clip(&mut self, shape: ClipShape, op: ClipOperation, bit: DirtyFlags) {
    let transform = self.state().combined_transform();
    let state = self.state_mut();
    match op {
      ClipOperation::NoClip => {
        state.clip_stack.clear();
        state.clip_enabled = false;
      }
      ClipOperation::Replace => {
        state.clip_stack.clear();
        state.clip_stack.push(ClipEntry {
          op,
          shape,
          transform,
        });
        state.clip_enabled = true;
      }
      ClipOperation::Intersect | ClipOperation::Unite => {
        state.clip_stack.push(ClipEntry {
          op,
          shape,
          transform,
        });
        state.clip_enabled = true;
      }
    }
    self.mark_dirty(bit | DirtyFlags::CLIP_ENABLED);
  }

  /// Replaces the whole clip history (picture replay)
  pub fn replay_clip(&mut self, entries: &[ClipEntry], enabled: bool) {
    if !self.ensure_active("replay_clip") {
      return;
    }
    let state = self.state_mut();
    state.clip_stack = entries.to_vec();
    state.clip_enabled = enabled;
    self.mark_dirty(DirtyFlags::CLIP);
  }

  // ------------------------------------------------------------------
  // Draw operations
  // ------------------------------------------------------------------

  pub fn draw_point(&mut self, p: Point) {
    self.draw_points(&[p]);
  }

  pub fn draw_points(&mut self, points: &[Point]) {
    if !self.ensure_active("draw_points") || points.is_empty() {
      return;
    }
    if self.state().pen.is_none() {
      return;
    }
    if self.needs_emulation(DrawOp::STROKE) {
      // Points render as pen-width fills of the pen's brush.
      let mut path = PainterPath::new();
      let size = self.emulated_point_size();
      let round = self.state().pen.cap == crate::paint::pen::CapStyle::Round;
      for p in points {
        let rect = Rect::from_xywh(p.x - size / 2.0, p.y - size / 2.0, size, size);
        if round {
          path.add_ellipse(rect);
        } else {
          path.add_rect(rect);
        }
      }
      let brush = self.state().pen.brush.clone();
      self.fill_path(&path, &brush);
      return;
    }
    self.flush();
    self.engine_mut().draw_points(points);
  }

  fn emulated_point_size(&self) -> f32 {
    let pen = &self.state().pen;
    if pen.is_cosmetic() {
      let det = self.state().combined_transform().determinant().abs();
      if det <= f32::EPSILON {
        1.0
      } else {
        1.0 / det.sqrt()
      }
    } else {
      pen.width
    }
  }

  pub fn draw_line(&mut self, line: Line) {
    self.draw_lines(&[line]);
  }

  pub fn draw_lines(&mut self, lines: &[Line]) {
    if !self.ensure_active("draw_lines") || lines.is_empty() {
      return;
    }
    if self.state().pen.is_none() {
      return;
    }
    if self.needs_emulation(DrawOp::STROKE) {
      let mut path = PainterPath::new();
      for line in lines {
        if line.is_degenerate() {
          continue;
        }
        path.move_to(line.p1);
        path.line_to(line.p2);
      }
      let degenerate: Vec<Point> = lines
        .iter()
        .filter(|l| l.is_degenerate())
        .map(|l| l.p1)
        .collect();
      if !path.is_empty() {
        self.draw_helper(&path, DrawOp::STROKE);
      }
      if !degenerate.is_empty() && self.state().pen.cap != crate::paint::pen::CapStyle::Flat {
        self.draw_points(&degenerate);
      }
      return;
    }
    self.flush();
    self.engine_mut().draw_lines(lines);
  }

  pub fn draw_polyline(&mut self, points: &[Point]) {
    if !self.ensure_active("draw_polyline") || points.len() < 2 {
      return;
    }
    if self.needs_emulation(DrawOp::STROKE) {
      let mut path = PainterPath::new();
      path.move_to(points[0]);
      for p in &points[1..] {
        path.line_to(*p);
      }
      self.draw_helper(&path, DrawOp::STROKE);
      return;
    }
    self.flush();
    self.engine_mut().draw_polygon(points, PolygonMode::Polyline);
  }

  pub fn draw_polygon(&mut self, points: &[Point], fill_rule: FillRule) {
    if !self.ensure_active("draw_polygon") || points.len() < 2 {
      return;
    }
    if self.needs_emulation(DrawOp::STROKE_AND_FILL) {
      let mut path = PainterPath::from_polygon(points);
      path.set_fill_rule(fill_rule);
      self.dispatch_emulated_path(&path, DrawOp::STROKE_AND_FILL);
      return;
    }
    let mode = match fill_rule {
      FillRule::Winding => PolygonMode::Winding,
      FillRule::EvenOdd => PolygonMode::OddEven,
    };
    self.flush();
    self.engine_mut().draw_polygon(points, mode);
  }

  pub fn draw_rect(&mut self, rect: Rect) {
    self.draw_rects(&[rect]);
  }

  pub fn draw_rects(&mut self, rects: &[Rect]) {
    if !self.ensure_active("draw_rects") || rects.is_empty() {
      return;
    }
    if self.needs_emulation(DrawOp::STROKE_AND_FILL) {
      // One path per rect so object-bounding brushes resolve per shape.
      for rect in rects {
        if rect.is_empty() {
          continue;
        }
        self.dispatch_emulated_path(&PainterPath::from_rect(*rect), DrawOp::STROKE_AND_FILL);
      }
      return;
    }
    self.flush();
    self.engine_mut().draw_rects(rects);
  }

  /// Fills a rect with a color, ignoring the current pen and brush
  pub fn fill_rect(&mut self, rect: Rect, color: Color) {
    if !self.ensure_active("fill_rect") || rect.is_empty() {
      return;
    }
    self.fill_path(&PainterPath::from_rect(rect), &Brush::solid(color));
  }

  pub fn draw_ellipse(&mut self, rect: Rect) {
    if !self.ensure_active("draw_ellipse") || rect.is_empty() {
      return;
    }
    if self.needs_emulation(DrawOp::STROKE_AND_FILL) {
      self.dispatch_emulated_path(&PainterPath::from_ellipse(rect), DrawOp::STROKE_AND_FILL);
      return;
    }
    self.flush();
    self.engine_mut().draw_ellipse(rect);
  }

  /// Draws a rounded rect through the path pipeline
  pub fn draw_round_rect(&mut self, rect: Rect, radius: f32) {
    if !self.ensure_active("draw_round_rect") || rect.is_empty() {
      return;
    }
    let mut path = PainterPath::new();
    path.add_round_rect(rect, radius);
    self.draw_path(&path);
  }

  pub fn draw_path(&mut self, path: &PainterPath) {
    if !self.ensure_active("draw_path") || path.is_empty() {
      return;
    }
    if self.needs_emulation(DrawOp::STROKE_AND_FILL) {
      self.dispatch_emulated_path(path, DrawOp::STROKE_AND_FILL);
      return;
    }
    self.flush();
    self.engine_mut().draw_path(path);
  }

  /// Fills a path with an explicit brush, ignoring the current pen
  pub fn fill_path(&mut self, path: &PainterPath, brush: &Brush) {
    if !self.ensure_active("fill_path") || path.is_empty() {
      return;
    }
    let old_pen = std::mem::replace(&mut self.state_mut().pen, Pen::none());
    let old_brush = std::mem::replace(&mut self.state_mut().brush, brush.clone());
    self.mark_dirty(DirtyFlags::PEN | DirtyFlags::BRUSH);
    self.update_emulation_specifier();
    self.draw_path(path);
    self.state_mut().pen = old_pen;
    self.state_mut().brush = old_brush;
    self.mark_dirty(DirtyFlags::PEN | DirtyFlags::BRUSH);
    self.update_emulation_specifier();
  }

  /// Strokes a path with an explicit pen, ignoring the current brush
  pub fn stroke_path(&mut self, path: &PainterPath, pen: &Pen) {
    if !self.ensure_active("stroke_path") || path.is_empty() {
      return;
    }
    let old_pen = std::mem::replace(&mut self.state_mut().pen, pen.clone());
    let old_brush = std::mem::replace(&mut self.state_mut().brush, Brush::none());
    self.mark_dirty(DirtyFlags::PEN | DirtyFlags::BRUSH);
    self.update_emulation_specifier();
    self.draw_path(path);
    self.state_mut().pen = old_pen;
    self.state_mut().brush = old_brush;
    self.mark_dirty(DirtyFlags::PEN | DirtyFlags::BRUSH);
    self.update_emulation_specifier();
  }

  // ------------------------------------------------------------------
  // Pixmap / image / text operations
  // ------------------------------------------------------------------

  /// Draws a pixmap at its natural size
  pub fn draw_pixmap(&mut self, pos: Point, pixmap: &Pixmap) {
    let target = Rect::new(pos, Size::new(pixmap.width() as f32, pixmap.height() as f32));
    self.draw_pixmap_rect(target, pixmap, pixmap.rect());
  }

  /// Draws `source` within `pixmap` scaled onto `target`
  pub fn draw_pixmap_rect(&mut self, target: Rect, pixmap: &Pixmap, source: Rect) {
    if !self.ensure_active("draw_pixmap_rect") || target.is_empty() || pixmap.is_empty() {
      return;
    }
    // Opaque background mode pre-fills the destination for translucent
    // sources (the 1-bit-source rule generalized to the alpha channel).
    if self.state().background_mode == BackgroundMode::Opaque && pixmap.has_alpha() {
      let background = self.state().background.clone();
      if !background.is_none() {
        self.fill_path(&PainterPath::from_rect(target), &background);
      }
    }
    if self.pixmap_needs_fallback() {
      self.draw_pixmap_as_texture(target, pixmap, source);
      return;
    }
    self.flush();
    self.engine_mut().draw_pixmap(target, pixmap, source);
  }

  /// Draws a sub-rect of an image (crop-then-blit contract)
  pub fn draw_image(&mut self, target: Rect, image: &Pixmap, source: Rect) {
    if !self.ensure_active("draw_image") || target.is_empty() || image.is_empty() {
      return;
    }
    if self.pixmap_needs_fallback() {
      self.draw_pixmap_as_texture(target, image, source);
      return;
    }
    self.flush();
    self.engine_mut().draw_image(target, image, source);
  }

  /// Tiles a pixmap over a rect starting at `offset` within the source
  pub fn draw_tiled_pixmap(&mut self, rect: Rect, pixmap: &Pixmap, offset: Point) {
    if !self.ensure_active("draw_tiled_pixmap") || rect.is_empty() || pixmap.is_empty() {
      return;
    }
    if self.pixmap_needs_fallback() {
      // A texture brush is exactly a tiled pixmap.
      let brush = Brush::texture(pixmap.clone())
        .with_transform(Transform::from_translate(rect.left() - offset.x, rect.top() - offset.y));
      self.fill_path(&PainterPath::from_rect(rect), &brush);
      return;
    }
    self.flush();
    self.engine_mut().draw_tiled_pixmap(rect, pixmap, offset);
  }

  /// True when pixmap drawing must fall back to the textured-brush path
  fn pixmap_needs_fallback(&self) -> bool {
    let state = self.state();
    let t = state.combined_transform();
    let features = self.engine_features;
    if !t.is_affine() && !features.contains(EngineFeatures::PERSPECTIVE_TRANSFORM) {
      return true;
    }
    if t.ty() > crate::transform::TransformType::Translate
      && !features.contains(EngineFeatures::PIXMAP_TRANSFORM)
    {
      return true;
    }
    if state.opacity < 1.0 && !features.contains(EngineFeatures::CONSTANT_OPACITY) {
      return true;
    }
    false
  }

  /// Paints a pixmap as a textured-brush-filled rectangle
  ///
  /// Reuses the rect/brush pipeline — and therefore its emulation path —
  /// instead of a dedicated image compositor.
  fn draw_pixmap_as_texture(&mut self, target: Rect, pixmap: &Pixmap, source: Rect) {
    let cropped;
    let src = if source == pixmap.rect() {
      pixmap
    } else {
      match pixmap.sub_pixmap(source) {
        Some(c) => {
          cropped = c;
          &cropped
        }
        None => return,
      }
    };
    let sx = target.width() / src.width() as f32;
    let sy = target.height() / src.height() as f32;
    let brush = Brush::texture(src.clone()).with_transform(
      Transform::from_scale(sx, sy)
        .then(&Transform::from_translate(target.left(), target.top())),
    );
    self.fill_path(&PainterPath::from_rect(target), &brush);
  }

  /// Draws a shaped glyph run with its baseline origin at `pos`
  pub fn draw_text_item(&mut self, pos: Point, item: &TextItem) {
    if !self.ensure_active("draw_text_item") || item.is_empty() {
      return;
    }
    if self.needs_emulation(DrawOp::STROKE) && item.font.has_outlines() {
      // Text fills with the pen's brush; lower to outlines and reuse the
      // path pipeline's emulation.
      let mut path = PainterPath::new();
      path.set_fill_rule(FillRule::Winding);
      for glyph in &item.glyphs {
        if let Some(outline) = item.font.glyph_outline(glyph.id) {
          path.append(&outline.translated(pos.x + glyph.position.x, pos.y + glyph.position.y));
        }
      }
      if !path.is_empty() {
        let brush = self.state().pen.brush.clone();
        self.fill_path(&path, &brush);
      }
      return;
    }
    self.flush();
    self.engine_mut().draw_text_item(pos, item);
  }
}

impl Default for Painter<'_> {
  fn default() -> Self {
    Self::new()
  }
}
