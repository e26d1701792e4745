//! Picture: the vector recording engine
//!
//! A `PictureEngine` records every primitive and state update into a flat,
//! ordered command list instead of touching pixels — the same shape as a
//! display list sitting between layout and rasterization. The recorded
//! [`Picture`] can be replayed onto any painter later, which re-runs
//! capability arbitration against the replay target's engine.
//!
//! The engine advertises every feature: recording can represent anything,
//! so the painter never emulates on the way in. Fidelity is resolved at
//! replay time.

use crate::geometry::{Line, Point, Rect, Size};
use crate::paint::engine::{EngineCore, EngineFeatures, EngineType, PaintEngine, PolygonMode};
use crate::paint::painter::Painter;
use crate::paint::path::PainterPath;
use crate::paint::pixmap::Pixmap;
use crate::paint::state::{DirtyFlags, PainterState};
use crate::paint::text::TextItem;

/// One recorded paint command
#[derive(Debug, Clone)]
pub enum PictureCommand {
  /// Snapshot of the state fields that changed, with the changed bits
  UpdateState {
    state: Box<PainterState>,
    flags: DirtyFlags,
  },
  DrawPolygon {
    points: Vec<Point>,
    mode: PolygonMode,
  },
  DrawPixmap {
    target: Rect,
    pixmap: Pixmap,
    source: Rect,
  },
  DrawTiledPixmap {
    rect: Rect,
    pixmap: Pixmap,
    offset: Point,
  },
  DrawImage {
    target: Rect,
    image: Pixmap,
    source: Rect,
  },
  DrawPath(PainterPath),
  DrawPoints(Vec<Point>),
  DrawLines(Vec<Line>),
  DrawRects(Vec<Rect>),
  DrawEllipse(Rect),
  DrawTextItem {
    pos: Point,
    item: TextItem,
  },
}

/// A recorded command stream with its bounding rect
///
/// # Examples
///
/// ```
/// use easelkit::paint::engines::{PictureEngine, RasterEngine};
/// use easelkit::{Color, Painter, Pixmap, Rect};
///
/// let mut recorder = PictureEngine::new();
/// let mut painter = Painter::new();
/// painter.begin(&mut recorder);
/// painter.fill_rect(Rect::from_xywh(0.0, 0.0, 10.0, 10.0), Color::RED);
/// painter.end();
/// let picture = recorder.take_picture();
/// assert!(!picture.is_empty());
///
/// // Replay onto a raster target.
/// let mut pm = Pixmap::new(16, 16).unwrap();
/// let mut raster = RasterEngine::new(&mut pm);
/// let mut painter = Painter::new();
/// painter.begin(&mut raster);
/// picture.play(&mut painter);
/// painter.end();
/// ```
#[derive(Debug, Clone, Default)]
pub struct Picture {
  commands: Vec<PictureCommand>,
  bounds: Rect,
}

impl Picture {
  /// Number of recorded commands (state updates included)
  pub fn len(&self) -> usize {
    self.commands.len()
  }

  /// True when nothing was recorded
  pub fn is_empty(&self) -> bool {
    self.commands.is_empty()
  }

  /// Device-space bounding rect of everything drawn
  pub fn bounding_rect(&self) -> Rect {
    self.bounds
  }

  /// The raw command stream
  pub fn commands(&self) -> &[PictureCommand] {
    &self.commands
  }

  /// Replays the recorded commands onto an active painter
  ///
  /// State updates are re-applied through the painter's mutators so the
  /// replay target's own capability arbitration (and emulation) runs for
  /// every primitive. Replaying onto an inactive painter is a no-op chain
  /// of warnings, matching every other inactive-painter call.
  pub fn play(&self, painter: &mut Painter<'_>) {
    for command in &self.commands {
      match command {
        PictureCommand::UpdateState { state, flags } => {
          Self::apply_state(painter, state, *flags);
        }
        PictureCommand::DrawPolygon { points, mode } => match mode {
          PolygonMode::Polyline => painter.draw_polyline(points),
          PolygonMode::OddEven => {
            painter.draw_polygon(points, crate::paint::path::FillRule::EvenOdd)
          }
          PolygonMode::Winding | PolygonMode::Convex => {
            painter.draw_polygon(points, crate::paint::path::FillRule::Winding)
          }
        },
        PictureCommand::DrawPixmap {
          target,
          pixmap,
          source,
        } => painter.draw_pixmap_rect(*target, pixmap, *source),
        PictureCommand::DrawTiledPixmap {
          rect,
          pixmap,
          offset,
        } => painter.draw_tiled_pixmap(*rect, pixmap, *offset),
        PictureCommand::DrawImage {
          target,
          image,
          source,
        } => painter.draw_image(*target, image, *source),
        PictureCommand::DrawPath(path) => painter.draw_path(path),
        PictureCommand::DrawPoints(points) => painter.draw_points(points),
        PictureCommand::DrawLines(lines) => painter.draw_lines(lines),
        PictureCommand::DrawRects(rects) => painter.draw_rects(rects),
        PictureCommand::DrawEllipse(rect) => painter.draw_ellipse(*rect),
        PictureCommand::DrawTextItem { pos, item } => painter.draw_text_item(*pos, item),
      }
    }
  }

  fn apply_state(painter: &mut Painter<'_>, state: &PainterState, flags: DirtyFlags) {
    if flags.contains(DirtyFlags::PEN) {
      painter.set_pen(state.pen.clone());
    }
    if flags.contains(DirtyFlags::BRUSH) {
      painter.set_brush(state.brush.clone());
    }
    if flags.contains(DirtyFlags::BRUSH_ORIGIN) {
      painter.set_brush_origin(state.brush_origin);
    }
    if flags.contains(DirtyFlags::FONT) {
      painter.set_font(state.font.clone());
    }
    if flags.contains(DirtyFlags::BACKGROUND) {
      painter.set_background(state.background.clone());
    }
    if flags.contains(DirtyFlags::BACKGROUND_MODE) {
      painter.set_background_mode(state.background_mode);
    }
    if flags.contains(DirtyFlags::TRANSFORM) {
      painter.set_transform(state.world_transform);
    }
    if flags.contains(DirtyFlags::HINTS) {
      painter.set_render_hints(state.render_hints);
    }
    if flags.contains(DirtyFlags::COMPOSITION_MODE) {
      painter.set_composition_mode(state.composition_mode);
    }
    if flags.contains(DirtyFlags::OPACITY) {
      painter.set_opacity(state.opacity);
    }
    if flags.intersects(DirtyFlags::CLIP) {
      painter.replay_clip(&state.clip_stack, state.clip_enabled);
    }
  }
}

/// The recording engine
pub struct PictureEngine {
  core: EngineCore,
  picture: Picture,
}

impl PictureEngine {
  /// Creates an empty recorder
  pub fn new() -> Self {
    Self {
      core: EngineCore::new(EngineFeatures::ALL_FEATURES),
      picture: Picture::default(),
    }
  }

  /// Takes the recorded picture, leaving the recorder empty
  pub fn take_picture(&mut self) -> Picture {
    std::mem::take(&mut self.picture)
  }

  /// Read access to the recording so far
  pub fn picture(&self) -> &Picture {
    &self.picture
  }

  fn grow_bounds(&mut self, logical: Rect) {
    let device = self
      .core
      .state
      .combined_transform()
      .map_rect(logical);
    self.picture.bounds = self.picture.bounds.union(&device);
  }

  fn record(&mut self, command: PictureCommand) {
    self.picture.commands.push(command);
  }
}

impl Default for PictureEngine {
  fn default() -> Self {
    Self::new()
  }
}

impl PaintEngine for PictureEngine {
  fn core(&self) -> &EngineCore {
    &self.core
  }

  fn core_mut(&mut self) -> &mut EngineCore {
    &mut self.core
  }

  fn engine_type(&self) -> EngineType {
    EngineType::Picture
  }

  fn device_size(&self) -> Size {
    // A recording has no fixed extent; report the recorded bounds so far.
    Size::new(
      self.picture.bounds.right().max(0.0),
      self.picture.bounds.bottom().max(0.0),
    )
  }

  fn begin(&mut self) -> bool {
    if self.core.active {
      return false;
    }
    self.core.active = true;
    self.picture = Picture::default();
    true
  }

  fn end(&mut self) -> bool {
    self.core.active = false;
    true
  }

  fn update_state(&mut self, flags: DirtyFlags) {
    let state = Box::new(self.core.state.clone());
    self.record(PictureCommand::UpdateState { state, flags });
    self.core.dirty.remove(flags);
  }

  fn draw_polygon(&mut self, points: &[Point], mode: PolygonMode) {
    if points.is_empty() {
      return;
    }
    self.grow_bounds(PainterPath::from_polygon(points).bounding_rect());
    self.record(PictureCommand::DrawPolygon {
      points: points.to_vec(),
      mode,
    });
  }

  fn draw_pixmap(&mut self, target: Rect, pixmap: &Pixmap, source: Rect) {
    if target.is_empty() {
      return;
    }
    self.grow_bounds(target);
    self.record(PictureCommand::DrawPixmap {
      target,
      pixmap: pixmap.clone(),
      source,
    });
  }

  fn draw_path(&mut self, path: &PainterPath) {
    if path.is_empty() {
      return;
    }
    self.grow_bounds(path.bounding_rect());
    self.record(PictureCommand::DrawPath(path.clone()));
  }

  fn draw_points(&mut self, points: &[Point]) {
    if points.is_empty() {
      return;
    }
    self.grow_bounds(PainterPath::from_polygon(points).bounding_rect());
    self.record(PictureCommand::DrawPoints(points.to_vec()));
  }

  fn draw_lines(&mut self, lines: &[Line]) {
    if lines.is_empty() {
      return;
    }
    for line in lines {
      self.grow_bounds(Rect::from_ltrb(
        line.p1.x.min(line.p2.x),
        line.p1.y.min(line.p2.y),
        line.p1.x.max(line.p2.x),
        line.p1.y.max(line.p2.y),
      ));
    }
    self.record(PictureCommand::DrawLines(lines.to_vec()));
  }

  fn draw_rects(&mut self, rects: &[Rect]) {
    if rects.is_empty() {
      return;
    }
    for rect in rects {
      self.grow_bounds(*rect);
    }
    self.record(PictureCommand::DrawRects(rects.to_vec()));
  }

  fn draw_ellipse(&mut self, rect: Rect) {
    if rect.is_empty() {
      return;
    }
    self.grow_bounds(rect);
    self.record(PictureCommand::DrawEllipse(rect));
  }

  fn draw_tiled_pixmap(&mut self, rect: Rect, pixmap: &Pixmap, offset: Point) {
    if rect.is_empty() {
      return;
    }
    self.grow_bounds(rect);
    self.record(PictureCommand::DrawTiledPixmap {
      rect,
      pixmap: pixmap.clone(),
      offset,
    });
  }

  fn draw_image(&mut self, target: Rect, image: &Pixmap, source: Rect) {
    if target.is_empty() {
      return;
    }
    self.grow_bounds(target);
    self.record(PictureCommand::DrawImage {
      target,
      image: image.clone(),
      source,
    });
  }

  fn draw_text_item(&mut self, pos: Point, item: &TextItem) {
    if item.is_empty() {
      return;
    }
    let metrics = item.font.metrics();
    let width: f32 = item
      .glyphs
      .iter()
      .map(|g| item.font.glyph_advance(g.id))
      .sum();
    self.grow_bounds(Rect::from_xywh(
      pos.x,
      pos.y - metrics.ascent,
      width.max(1.0),
      metrics.ascent + metrics.descent,
    ));
    self.record(PictureCommand::DrawTextItem {
      pos,
      item: item.clone(),
    });
  }
}
