use std::ffi::CString;

use x11::xft::{XftColor, XftDraw, XftDrawStringUtf8, XftFont, XftFontOpenName};
use x11::xlib::{Colormap, Drawable, Visual};
use x11::xrender::XRenderColor;
use x11rb::protocol::xproto::Window;

use super::Renderer;
use crate::ColorScheme;
use crate::errors::{WmResult, X11Error};
use crate::x11::xlib_graphic_context::XLibGC;
use crate::x11::{X11Display, XVisual};

pub struct Font {
    xft_font: *mut XftFont,
    display: X11Display,
}

impl Font {
    pub fn new(mut display: X11Display, screen: i32, font_name: &str) -> Result<Self, X11Error> {
        let font_name_cstr =
            CString::new(font_name).map_err(|_| X11Error::FontLoadFailed(font_name.to_string()))?;

        let xft_font =
            unsafe { XftFontOpenName(display.as_mut(), screen, font_name_cstr.as_ptr()) };

        if xft_font.is_null() {
            return Err(X11Error::FontLoadFailed(font_name.to_string()));
        }

        Ok(Font { xft_font, display })
    }

    pub fn height(&self) -> i32 {
        unsafe {
            let font = &*self.xft_font;
            font.ascent + font.descent
        }
    }

    pub fn ascent(&self) -> i32 {
        unsafe {
            let font = &*self.xft_font;
            font.ascent
        }
    }

    pub fn text_width(&self, text: &str) -> i32 {
        let mut display = self.display;
        unsafe {
            let mut extents = std::mem::zeroed();
            x11::xft::XftTextExtentsUtf8(
                display.as_mut(),
                self.xft_font,
                text.as_ptr(),
                text.len() as i32,
                &mut extents,
            );
            extents.xOff as i32
        }
    }

    /// Longest prefix of `text` that fits in `width` pixels.
    pub fn fit<'t>(&self, text: &'t str, width: i32) -> &'t str {
        if self.text_width(text) <= width {
            return text;
        }
        let mut end = text.len();
        while end > 0 {
            end = text[..end]
                .char_indices()
                .next_back()
                .map_or(0, |(index, _)| index);
            if self.text_width(&text[..end]) <= width {
                break;
            }
        }
        &text[..end]
    }
}

impl Drop for Font {
    fn drop(&mut self) {
        unsafe {
            if !self.xft_font.is_null() {
                x11::xft::XftFontClose(self.display.as_mut(), self.xft_font);
            }
        }
    }
}

pub struct FontDraw {
    xft_draw: *mut XftDraw,
}

impl FontDraw {
    pub fn new(
        mut display: X11Display,
        drawable: Drawable,
        visual: *mut Visual,
        colormap: Colormap,
    ) -> Result<Self, X11Error> {
        let xft_draw =
            unsafe { x11::xft::XftDrawCreate(display.as_mut(), drawable, visual, colormap) };

        if xft_draw.is_null() {
            return Err(X11Error::DrawCreateFailed);
        }

        Ok(FontDraw { xft_draw })
    }

    pub fn draw_text(&self, font: &Font, color: u32, x: i32, y: i32, text: &str) {
        let red = ((color >> 16) & 0xFF) as u16;
        let green = ((color >> 8) & 0xFF) as u16;
        let blue = (color & 0xFF) as u16;

        let render_color = XRenderColor {
            red: red << 8 | red,
            green: green << 8 | green,
            blue: blue << 8 | blue,
            alpha: 0xFFFF,
        };

        let mut xft_color: XftColor = unsafe { std::mem::zeroed() };

        unsafe {
            x11::xft::XftColorAllocValue(
                x11::xft::XftDrawDisplay(self.xft_draw),
                x11::xft::XftDrawVisual(self.xft_draw),
                x11::xft::XftDrawColormap(self.xft_draw),
                &render_color,
                &mut xft_color,
            );

            XftDrawStringUtf8(
                self.xft_draw,
                &xft_color,
                font.xft_font,
                x,
                y,
                text.as_ptr(),
                text.len() as i32,
            );

            x11::xft::XftColorFree(
                x11::xft::XftDrawDisplay(self.xft_draw),
                x11::xft::XftDrawVisual(self.xft_draw),
                x11::xft::XftDrawColormap(self.xft_draw),
                &mut xft_color,
            );
        }
    }
}

impl Drop for FontDraw {
    fn drop(&mut self) {
        unsafe {
            if !self.xft_draw.is_null() {
                x11::xft::XftDrawDestroy(self.xft_draw);
            }
        }
    }
}

/// Pixmap the bars are composed on before being copied to their window.
pub struct DrawingSurface {
    font_draw: FontDraw,
    pixmap: x11::xlib::Pixmap,
    display: X11Display,
}

impl DrawingSurface {
    pub fn new(
        mut display: X11Display,
        root: Drawable,
        screen: i32,
        width: i32,
        height: i32,
    ) -> Result<Self, X11Error> {
        let (depth, visual, colormap) = unsafe {
            (
                x11::xlib::XDefaultDepth(display.as_mut(), screen),
                x11::xlib::XDefaultVisual(display.as_mut(), screen),
                x11::xlib::XDefaultColormap(display.as_mut(), screen),
            )
        };
        let visual = XVisual::from_raw(visual).ok_or(X11Error::DrawCreateFailed)?;

        let pixmap = unsafe {
            x11::xlib::XCreatePixmap(
                display.as_mut(),
                root,
                width.max(1) as u32,
                height.max(1) as u32,
                depth as u32,
            )
        };

        let font_draw = FontDraw::new(display, pixmap, visual.as_ptr(), colormap)?;

        Ok(Self {
            font_draw,
            pixmap,
            display,
        })
    }

    pub fn pixmap(&self) -> x11::xlib::Pixmap {
        self.pixmap
    }

    pub fn font_draw(&self) -> &FontDraw {
        &self.font_draw
    }
}

impl Drop for DrawingSurface {
    fn drop(&mut self) {
        unsafe {
            x11::xft::XftDrawDestroy(self.font_draw.xft_draw);
            self.font_draw.xft_draw = std::ptr::null_mut();
            x11::xlib::XFreePixmap(self.display.as_mut(), self.pixmap);
        }
    }
}

/// [`Renderer`] backed by Xlib and Xft on a connection of its own. The
/// drawing surface is one bar tall: the font height plus two pixels.
pub struct XftRenderer {
    display: X11Display,
    screen: i32,
    root: Drawable,
    font: Font,
    surface: DrawingSurface,
    gc: XLibGC,
    scheme: ColorScheme,
}

impl XftRenderer {
    pub fn new(font_name: &str, width: i32) -> Result<Self, X11Error> {
        let display_ptr = unsafe { x11::xlib::XOpenDisplay(std::ptr::null()) };
        let mut display =
            unsafe { X11Display::from_raw(display_ptr) }.ok_or(X11Error::DisplayOpenFailed)?;

        let (screen, root) = unsafe {
            let screen = x11::xlib::XDefaultScreen(display.as_mut());
            (screen, x11::xlib::XRootWindow(display.as_mut(), screen))
        };

        let font = Font::new(display, screen, font_name)?;
        let surface = DrawingSurface::new(display, root, screen, width, font.height() + 2)?;
        let gc = XLibGC::new(display, root);

        Ok(Self {
            display,
            screen,
            root,
            font,
            surface,
            gc,
            scheme: ColorScheme {
                foreground: 0xffffff,
                background: 0,
                border: 0,
            },
        })
    }
}

impl Renderer for XftRenderer {
    fn font_height(&self) -> i32 {
        self.font.height()
    }

    fn text_width(&self, text: &str) -> i32 {
        self.font.text_width(text)
    }

    fn set_scheme(&mut self, scheme: ColorScheme) {
        self.scheme = scheme;
    }

    fn draw_rect(&mut self, x: i32, y: i32, width: i32, height: i32, filled: bool, invert: bool) {
        let color = if invert {
            self.scheme.background
        } else {
            self.scheme.foreground
        };
        let drawable = self.surface.pixmap();
        self.gc.set_foreground(color);
        if filled {
            self.gc.fill_rectangle(drawable, x, y, width, height);
        } else {
            self.gc.draw_rectangle(drawable, x, y, width - 1, height - 1);
        }
    }

    fn draw_text(
        &mut self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        left_pad: i32,
        text: &str,
        invert: bool,
    ) -> i32 {
        if text.is_empty() {
            return 0;
        }

        let (background, foreground) = if invert {
            (self.scheme.foreground, self.scheme.background)
        } else {
            (self.scheme.background, self.scheme.foreground)
        };
        let drawable = self.surface.pixmap();
        self.gc.set_foreground(background);
        self.gc.fill_rectangle(drawable, x, y, width, height);

        let visible = self.font.fit(text, width - left_pad);
        if !visible.is_empty() {
            let text_y = y + (height - self.font.height()) / 2 + self.font.ascent();
            self.surface
                .font_draw()
                .draw_text(&self.font, foreground, x + left_pad, text_y, visible);
        }

        x + width
    }

    fn map(&mut self, window: Window, x: i32, y: i32, width: i32, height: i32) -> WmResult<()> {
        self.gc.copy_area(
            self.surface.pixmap(),
            window as Drawable,
            x,
            y,
            width,
            height,
        );
        unsafe {
            x11::xlib::XSync(self.display.as_mut(), 0);
        }
        Ok(())
    }

    fn resize(&mut self, width: i32, height: i32) {
        match DrawingSurface::new(self.display, self.root, self.screen, width, height) {
            Ok(surface) => self.surface = surface,
            Err(error) => tracing::warn!(%error, "could not resize bar surface"),
        }
    }
}
