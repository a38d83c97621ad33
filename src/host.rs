use std::sync::Arc;

use log::trace;
use winit::window::Window;

use crate::{
    simulation::{FrameHandle, Host, Listener},
    surface::Viewport,
};

/// Frame scheduling for a winit window.
///
/// A requested frame becomes a `request_redraw`; when `RedrawRequested`
/// arrives the pending handle is taken and handed to the field. Cancelling
/// forgets the handle, so a redraw the platform still delivers runs nothing.
///
/// winit delivers window events unconditionally, so the field's own
/// listener flags decide whether an event is acted on.
pub struct WindowHost {
    window: Arc<Window>,
    next_frame: u64,
    pending: Option<FrameHandle>,
}

impl WindowHost {
    pub fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            next_frame: 0,
            pending: None,
        }
    }

    pub fn take_frame(&mut self) -> Option<FrameHandle> {
        self.pending.take()
    }
}

impl Viewport for WindowHost {
    fn inner_size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }
}

impl Host for WindowHost {
    fn request_frame(&mut self) -> FrameHandle {
        self.next_frame += 1;
        let handle = FrameHandle(self.next_frame);
        self.pending = Some(handle);
        self.window.request_redraw();
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
        }
    }

    fn add_listener(&mut self, listener: Listener) {
        trace!("Listening for {:?}", listener);
    }

    fn remove_listener(&mut self, listener: Listener) {
        trace!("Stopped listening for {:?}", listener);
    }
}
