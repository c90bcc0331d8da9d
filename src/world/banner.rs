use crate::config::Config;
use crate::render::Canvas;
use macroquad::prelude::*;
use std::time::Instant;

const FILL: Color = Color::new(248.0 / 255.0, 248.0 / 255.0, 1.0, 1.0);
const OUTER_BORDER: Color = Color::new(176.0 / 255.0, 196.0 / 255.0, 222.0 / 255.0, 1.0);
const INNER_BORDER: Color = Color::new(119.0 / 255.0, 136.0 / 255.0, 153.0 / 255.0, 1.0);
const LEFT: f32 = 10.0;

/// Where the map-name banner is in its slide sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerPhase {
    SlideIn,
    Hold,
    SlideOut,
    Hidden,
}

impl BannerPhase {
    pub fn of(counter: i32, band: i32) -> Self {
        if band <= 0 || counter < 0 || counter >= 4 * band {
            BannerPhase::Hidden
        } else if counter < band {
            BannerPhase::SlideIn
        } else if counter < 3 * band {
            BannerPhase::Hold
        } else {
            BannerPhase::SlideOut
        }
    }
}

/// Vertical offset of the banner for `counter`, `None` once it is gone.
pub fn offset(counter: i32, band: i32) -> Option<i32> {
    match BannerPhase::of(counter, band) {
        BannerPhase::SlideIn => Some(counter - band),
        BannerPhase::Hold => Some(0),
        BannerPhase::SlideOut => Some(-(counter % band)),
        BannerPhase::Hidden => None,
    }
}

/// Wall-clock driven counter of the map-name banner.
#[derive(Debug, Clone)]
pub struct Banner {
    started: Option<Instant>,
    speed: f32,
}

impl Banner {
    /// `speed` is counter units per second.
    pub fn new(speed: f32) -> Self {
        Self {
            started: None,
            speed,
        }
    }

    /// Restart the sequence; the clock starts again on the next draw.
    pub fn reset(&mut self) {
        self.started = None;
    }

    pub fn counter(&mut self, now: Instant) -> i32 {
        let started = *self.started.get_or_insert(now);
        (now.saturating_duration_since(started).as_secs_f32() * self.speed) as i32
    }

    /// Draw `name` on its panel. Returns `false` when the banner is hidden and
    /// nothing was drawn.
    pub fn draw(&mut self, canvas: &mut dyn Canvas, config: &Config, name: &str, now: Instant) -> bool {
        let band = config.banner_height();
        let Some(dy) = offset(self.counter(now), band) else {
            return false;
        };

        let w = (config.screen_width / 3) as f32;
        let h = band as f32;
        let panel = Rect::new(LEFT, dy as f32, w, h);
        canvas.fill_rect(panel, FILL);
        canvas.stroke_rect(panel, 12.0, OUTER_BORDER);
        canvas.stroke_rect(panel, 8.0, INNER_BORDER);

        let size = canvas.measure_text(name, config.banner_font_size);
        let x = panel.x + (w + 10.0) / 2.0 - size.x / 2.0;
        let top = panel.y + (h - 6.0) / 2.0 - size.y / 2.0;
        canvas.draw_text(name, vec2(x, top + size.y), config.banner_font_size, BLACK);
        true
    }
}
