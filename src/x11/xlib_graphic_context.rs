use crate::x11::X11Display;
use x11::xlib::{Drawable, GC, XCreateGC, XFreeGC};

/// An Xlib graphics context for plain fills and blits.
#[derive(Debug)]
pub struct XLibGC {
    gc: GC,
    display: X11Display,
}

impl XLibGC {
    pub fn new(mut display: X11Display, drawable: Drawable) -> XLibGC {
        let gc = unsafe { XCreateGC(display.as_mut(), drawable, 0, std::ptr::null_mut()) };
        unsafe {
            x11::xlib::XSetLineAttributes(
                display.as_mut(),
                gc,
                1,
                x11::xlib::LineSolid,
                x11::xlib::CapButt,
                x11::xlib::JoinMiter,
            );
        }
        XLibGC { gc, display }
    }

    pub fn set_foreground(&mut self, color: u32) {
        unsafe { x11::xlib::XSetForeground(self.display.as_mut(), self.gc, color as u64) };
    }

    pub fn fill_rectangle(&mut self, drawable: Drawable, x: i32, y: i32, width: i32, height: i32) {
        if width <= 0 || height <= 0 {
            return;
        }
        unsafe {
            x11::xlib::XFillRectangle(
                self.display.as_mut(),
                drawable,
                self.gc,
                x,
                y,
                width as u32,
                height as u32,
            )
        };
    }

    pub fn draw_rectangle(&mut self, drawable: Drawable, x: i32, y: i32, width: i32, height: i32) {
        if width <= 0 || height <= 0 {
            return;
        }
        unsafe {
            x11::xlib::XDrawRectangle(
                self.display.as_mut(),
                drawable,
                self.gc,
                x,
                y,
                width as u32,
                height as u32,
            )
        };
    }

    pub fn copy_area(
        &mut self,
        source: Drawable,
        destination: Drawable,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) {
        unsafe {
            x11::xlib::XCopyArea(
                self.display.as_mut(),
                source,
                destination,
                self.gc,
                x,
                y,
                width.max(1) as u32,
                height.max(1) as u32,
                x,
                y,
            )
        };
    }
}

impl Drop for XLibGC {
    fn drop(&mut self) {
        unsafe { XFreeGC(self.display.as_mut(), self.gc) };
    }
}
