use x11rb::protocol::xproto::Window;

use super::Renderer;
use crate::ColorScheme;
use crate::errors::WmResult;
use crate::tags::TagMask;

#[derive(Debug, Clone, Copy)]
pub struct BarTitle<'a> {
    pub name: &'a str,
    pub is_floating: bool,
    pub is_fixed: bool,
}

/// What one monitor's bar shows.
#[derive(Debug, Clone, Copy)]
pub struct BarContent<'a> {
    pub tags: &'a [String],
    pub active_tags: TagMask,
    pub occupied: TagMask,
    pub urgent: TagMask,
    /// Tags of the focused client; empty on every bar but the selected
    /// monitor's.
    pub focused_tags: TagMask,
    pub layout_symbol: &'a str,
    /// Only the selected monitor shows the status text.
    pub status: Option<&'a str>,
    pub title: Option<BarTitle<'a>>,
    pub is_selected_monitor: bool,
    pub width: i32,
}

#[derive(Debug, Clone, Copy)]
pub struct BarStyle {
    pub height: i32,
    /// Sum of left and right padding around a label.
    pub padding: i32,
    pub normal: ColorScheme,
    pub selected: ColorScheme,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    Tag(usize),
    LayoutSymbol,
    StatusText,
    WindowTitle,
}

pub fn draw_bar<R: Renderer + ?Sized>(
    renderer: &mut R,
    window: Window,
    content: &BarContent,
    style: &BarStyle,
) -> WmResult<()> {
    let height = style.height;
    let font_height = renderer.font_height();
    let box_offset = font_height / 9;
    let box_width = font_height / 6 + 2;

    // status goes first so the tags can overdraw it on a narrow bar
    let mut status_width = 0;
    if let Some(status) = content.status {
        renderer.set_scheme(style.normal);
        status_width = renderer.text_width(status) + 2;
        renderer.draw_text(
            content.width - status_width,
            0,
            status_width,
            height,
            0,
            status,
            false,
        );
    }

    let mut x = 0;
    for (index, tag) in content.tags.iter().enumerate() {
        let width = renderer.text_width(tag) + style.padding;
        let is_urgent = content.urgent.contains(index);
        renderer.set_scheme(if content.active_tags.contains(index) {
            style.selected
        } else {
            style.normal
        });
        renderer.draw_text(x, 0, width, height, style.padding / 2, tag, is_urgent);
        if content.occupied.contains(index) {
            renderer.draw_rect(
                x + box_offset,
                box_offset,
                box_width,
                box_width,
                content.focused_tags.contains(index),
                is_urgent,
            );
        }
        x += width;
    }

    let symbol_width = renderer.text_width(content.layout_symbol) + style.padding;
    renderer.set_scheme(style.normal);
    x = renderer.draw_text(
        x,
        0,
        symbol_width,
        height,
        style.padding / 2,
        content.layout_symbol,
        false,
    );

    let title_width = content.width - status_width - x;
    if title_width > height {
        match content.title {
            Some(title) => {
                renderer.set_scheme(if content.is_selected_monitor {
                    style.selected
                } else {
                    style.normal
                });
                renderer.draw_text(x, 0, title_width, height, style.padding / 2, title.name, false);
                if title.is_floating {
                    renderer.draw_rect(
                        x + box_offset,
                        box_offset,
                        box_width,
                        box_width,
                        title.is_fixed,
                        false,
                    );
                }
            }
            None => {
                renderer.set_scheme(style.normal);
                renderer.draw_rect(x, 0, title_width, height, true, true);
            }
        }
    }

    renderer.map(window, 0, 0, content.width, height)
}

/// Which part of a bar `click_x` falls in.
pub fn classify_click<R: Renderer + ?Sized>(
    renderer: &R,
    tags: &[String],
    layout_symbol: &str,
    status: &str,
    bar_width: i32,
    padding: i32,
    click_x: i32,
) -> ClickTarget {
    let mut x = 0;
    for (index, tag) in tags.iter().enumerate() {
        x += renderer.text_width(tag) + padding;
        if click_x < x {
            return ClickTarget::Tag(index);
        }
    }

    if click_x < x + renderer.text_width(layout_symbol) + padding {
        ClickTarget::LayoutSymbol
    } else if click_x > bar_width - (renderer.text_width(status) + padding) {
        ClickTarget::StatusText
    } else {
        ClickTarget::WindowTitle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bar::mock::{FONT_HEIGHT, MockRenderer, Op};

    const NORMAL: ColorScheme = ColorScheme {
        foreground: 0xbbbbbb,
        background: 0x222222,
        border: 0x444444,
    };
    const SELECTED: ColorScheme = ColorScheme {
        foreground: 0xeeeeee,
        background: 0x005577,
        border: 0x005577,
    };

    fn style() -> BarStyle {
        BarStyle {
            height: FONT_HEIGHT + 2,
            padding: FONT_HEIGHT,
            normal: NORMAL,
            selected: SELECTED,
        }
    }

    fn tags() -> Vec<String> {
        (1..=9).map(|t| t.to_string()).collect()
    }

    fn content<'a>(tags: &'a [String]) -> BarContent<'a> {
        BarContent {
            tags,
            active_tags: TagMask::tag(0),
            occupied: TagMask::tag(0) | TagMask::tag(2),
            urgent: TagMask::tag(2),
            focused_tags: TagMask::tag(0),
            layout_symbol: "[]=",
            status: Some("hello"),
            title: Some(BarTitle {
                name: "term",
                is_floating: false,
                is_fixed: false,
            }),
            is_selected_monitor: true,
            width: 1000,
        }
    }

    #[test]
    fn draws_status_tags_symbol_and_title() {
        let tags = tags();
        let mut renderer = MockRenderer::default();
        draw_bar(&mut renderer, 7, &content(&tags), &style()).unwrap();

        let texts = renderer.texts();
        assert_eq!(texts.first(), Some(&"hello"));
        assert_eq!(&texts[1..10], &["1", "2", "3", "4", "5", "6", "7", "8", "9"]);
        assert_eq!(&texts[10..], &["[]=", "term"]);
        assert_eq!(renderer.maps(), vec![7]);

        // status is right aligned with 2px of padding
        assert!(renderer.ops.contains(&Op::Text {
            x: 1000 - 52,
            width: 52,
            text: "hello".into(),
            invert: false,
        }));
        // urgent tag is drawn inverted
        assert!(renderer.ops.contains(&Op::Text {
            x: 56,
            width: 28,
            text: "3".into(),
            invert: true,
        }));
    }

    #[test]
    fn occupied_box_filled_only_for_focused_tags() {
        let tags = tags();
        let mut renderer = MockRenderer::default();
        draw_bar(&mut renderer, 7, &content(&tags), &style()).unwrap();

        let boxes: Vec<_> = renderer
            .ops
            .iter()
            .filter_map(|op| match op {
                Op::Rect { x, filled, invert, .. } => Some((*x, *filled, *invert)),
                _ => None,
            })
            .collect();
        assert_eq!(boxes, vec![(2, true, false), (58, false, true)]);
    }

    #[test]
    fn empty_monitor_gets_inverted_title_area() {
        let tags = tags();
        let mut bar = content(&tags);
        bar.title = None;
        bar.status = None;
        let mut renderer = MockRenderer::default();
        draw_bar(&mut renderer, 7, &bar, &style()).unwrap();

        // 9 tags * 28 + "[]=" (30 + 18)
        assert_eq!(
            renderer.ops.iter().rev().nth(1),
            Some(&Op::Rect {
                x: 300,
                y: 0,
                width: 700,
                height: 20,
                filled: true,
                invert: true,
            })
        );
    }

    #[test]
    fn clicks_map_to_regions() {
        let tags = tags();
        let renderer = MockRenderer::default();
        let click = |x| classify_click(&renderer, &tags, "[]=", "hello", 1000, FONT_HEIGHT, x);

        assert_eq!(click(0), ClickTarget::Tag(0));
        assert_eq!(click(27), ClickTarget::Tag(0));
        assert_eq!(click(28), ClickTarget::Tag(1));
        assert_eq!(click(251), ClickTarget::Tag(8));
        assert_eq!(click(252), ClickTarget::LayoutSymbol);
        assert_eq!(click(299), ClickTarget::LayoutSymbol);
        assert_eq!(click(500), ClickTarget::WindowTitle);
        // status occupies the last 50 + 18 pixels
        assert_eq!(click(932), ClickTarget::WindowTitle);
        assert_eq!(click(933), ClickTarget::StatusText);
    }
}
