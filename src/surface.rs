use glam::Vec2;
use log::debug;

use crate::particle::Rgba;

/// Drawing operations the field paints with
pub trait Canvas {
    fn resize_buffer(&mut self, width: u32, height: u32);
    fn clear(&mut self);
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba);
    /// Called once the frame's circles are all filled
    fn present(&mut self) {}
}

/// Source of the current viewport size in physical pixels
pub trait Viewport {
    fn inner_size(&self) -> (u32, u32);
}

pub struct Surface<C> {
    width: u32,
    height: u32,
    canvas: C,
}

impl<C: Canvas> Surface<C> {
    pub fn new(canvas: C) -> Self {
        Self {
            width: 0,
            height: 0,
            canvas,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[cfg(test)]
    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut C {
        &mut self.canvas
    }

    /// Matches the pixel buffer to the viewport exactly, no scale factor.
    pub fn resize<V: Viewport + ?Sized>(&mut self, viewport: &V) {
        let (width, height) = viewport.inner_size();
        if (width, height) != (self.width, self.height) {
            debug!(
                "Surface resized {}x{} -> {}x{}",
                self.width, self.height, width, height
            );
        }

        self.width = width;
        self.height = height;
        self.canvas.resize_buffer(width, height);
    }

    pub fn clear(&mut self) {
        self.canvas.clear();
    }

    pub fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        self.canvas.fill_circle(center, radius, color);
    }

    pub fn present(&mut self) {
        self.canvas.present();
    }
}
