use std::path::PathBuf;
use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use crate::session::GameSession;

use super::hud::{draw_alerts, draw_context_menu, draw_debug_overlay, draw_ui, DebugOverlay};
use super::raster::Canvas;
use super::scene_view::draw_scene;
use super::sprites::SpriteCache;

pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    width: u32,
    height: u32,
    sprites: SpriteCache,
}

impl Renderer {
    /// `content_root` is the directory sprite paths in the game files are
    /// relative to.
    pub fn new(window: Arc<Window>, content_root: PathBuf) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            width: size.width,
            height: size.height,
            sprites: SpriteCache::new(content_root),
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn sprites_loaded(&self) -> usize {
        self.sprites.loaded_count()
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.width = width;
        self.height = height;
        Ok(())
    }

    fn build_pixels(window: Arc<Window>, width: u32, height: u32) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width.max(1), height.max(1), window);
        Pixels::new(width.max(1), height.max(1), surface)
    }

    /// Scene, then HUD or UI, then menu and alerts, then the debug overlay.
    pub(crate) fn render(
        &mut self,
        session: &GameSession,
        debug: Option<&DebugOverlay>,
    ) -> Result<(), Error> {
        let (width, height) = (self.width.max(1), self.height.max(1));
        {
            let mut canvas = Canvas::new(self.pixels.frame_mut(), width, height);
            draw_scene(&mut canvas, session, &mut self.sprites, debug.is_some());
            draw_ui(&mut canvas, session, &mut self.sprites);
            if let Some(menu) = session.context_menu() {
                draw_context_menu(&mut canvas, menu, session.cursor());
            }
            draw_alerts(&mut canvas, session.alerts().iter());
            if let Some(overlay) = debug {
                draw_debug_overlay(&mut canvas, session, overlay);
            }
        }
        self.pixels.render()
    }
}
