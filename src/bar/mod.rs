pub mod bar;
pub mod font;

use x11rb::protocol::xproto::Window;

pub use bar::{BarContent, BarStyle, BarTitle, ClickTarget, classify_click, draw_bar};
pub use font::XftRenderer;

use crate::ColorScheme;
use crate::errors::WmResult;

/// Off-screen drawing for the bars, blitted to a bar window with [`map`].
///
/// [`map`]: Renderer::map
pub trait Renderer {
    fn font_height(&self) -> i32;
    fn text_width(&self, text: &str) -> i32;
    fn set_scheme(&mut self, scheme: ColorScheme);
    /// Outlined unless `filled`; `invert` paints in the background color.
    fn draw_rect(&mut self, x: i32, y: i32, width: i32, height: i32, filled: bool, invert: bool);
    /// Fills the box and draws `text` vertically centered, `left_pad` from
    /// the left edge, clipped to the box. Returns the x just past the box,
    /// or 0 when `text` is empty and nothing was drawn.
    fn draw_text(
        &mut self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        left_pad: i32,
        text: &str,
        invert: bool,
    ) -> i32;
    fn map(&mut self, window: Window, x: i32, y: i32, width: i32, height: i32) -> WmResult<()>;
    fn resize(&mut self, width: i32, height: i32);
}

#[cfg(test)]
pub mod mock {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Op {
        Scheme(ColorScheme),
        Rect {
            x: i32,
            y: i32,
            width: i32,
            height: i32,
            filled: bool,
            invert: bool,
        },
        Text {
            x: i32,
            width: i32,
            text: String,
            invert: bool,
        },
        Map(Window, i32),
    }

    /// Every glyph is `CHAR_WIDTH` pixels wide.
    #[derive(Debug, Default)]
    pub struct MockRenderer {
        pub ops: Vec<Op>,
    }

    pub const CHAR_WIDTH: i32 = 10;
    pub const FONT_HEIGHT: i32 = 18;

    impl MockRenderer {
        pub fn texts(&self) -> Vec<&str> {
            self.ops
                .iter()
                .filter_map(|op| match op {
                    Op::Text { text, .. } => Some(text.as_str()),
                    _ => None,
                })
                .collect()
        }

        pub fn maps(&self) -> Vec<Window> {
            self.ops
                .iter()
                .filter_map(|op| match op {
                    Op::Map(window, _) => Some(*window),
                    _ => None,
                })
                .collect()
        }
    }

    impl Renderer for MockRenderer {
        fn font_height(&self) -> i32 {
            FONT_HEIGHT
        }

        fn text_width(&self, text: &str) -> i32 {
            text.chars().count() as i32 * CHAR_WIDTH
        }

        fn set_scheme(&mut self, scheme: ColorScheme) {
            self.ops.push(Op::Scheme(scheme));
        }

        fn draw_rect(&mut self, x: i32, y: i32, width: i32, height: i32, filled: bool, invert: bool) {
            self.ops.push(Op::Rect {
                x,
                y,
                width,
                height,
                filled,
                invert,
            });
        }

        fn draw_text(
            &mut self,
            x: i32,
            _y: i32,
            width: i32,
            _height: i32,
            _left_pad: i32,
            text: &str,
            invert: bool,
        ) -> i32 {
            if text.is_empty() {
                return 0;
            }
            self.ops.push(Op::Text {
                x,
                width,
                text: text.to_string(),
                invert,
            });
            x + width
        }

        fn map(&mut self, window: Window, _x: i32, _y: i32, width: i32, _height: i32) -> WmResult<()> {
            self.ops.push(Op::Map(window, width));
            Ok(())
        }

        fn resize(&mut self, _width: i32, _height: i32) {}
    }
}
