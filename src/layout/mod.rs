pub mod floating;
pub mod monocle;
pub mod tiling;

use std::str::FromStr;

use x11rb::protocol::xproto::Window;

use crate::geometry::Rect;

pub type LayoutBox = Box<dyn Layout>;

/// Places one client and reports the geometry it actually got after size
/// hints were applied.
pub type Placer<'p> = dyn FnMut(Window, Rect) -> Rect + 'p;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TiledClient {
    pub window: Window,
    pub border_width: i32,
}

/// Snapshot of a monitor handed to a layout.
#[derive(Debug, Clone, Copy)]
pub struct Arrangement<'a> {
    pub work_area: Rect,
    pub gap: i32,
    pub master_factor: f32,
    pub num_master: i32,
    /// Visible clients, floating ones included.
    pub visible_count: usize,
    /// Visible, non-floating clients in attach order.
    pub tiled: &'a [TiledClient],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutType {
    Tiling,
    Floating,
    Monocle,
}

impl LayoutType {
    pub fn to_boxed_layout(&self) -> LayoutBox {
        match self {
            Self::Tiling => Box::new(tiling::TilingLayout),
            Self::Floating => Box::new(floating::FloatingLayout),
            Self::Monocle => Box::new(monocle::MonocleLayout),
        }
    }
}

impl FromStr for LayoutType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "tiling" | "tile" => Ok(Self::Tiling),
            "floating" | "normie" => Ok(Self::Floating),
            "monocle" => Ok(Self::Monocle),
            _ => Err(format!("Invalid Layout Type: {}", s)),
        }
    }
}

/// `[]=` tile, `><>` floating, `[M]` monocle.
pub fn default_layouts() -> Vec<LayoutType> {
    vec![LayoutType::Tiling, LayoutType::Floating, LayoutType::Monocle]
}

pub trait Layout {
    fn symbol(&self) -> &'static str;

    /// `false` for layouts that leave every client where it is.
    fn arranges(&self) -> bool {
        true
    }

    /// Positions the tiled clients through `place`. A returned string
    /// replaces the monitor's layout symbol.
    fn arrange(&self, arrangement: &Arrangement, place: &mut Placer) -> Option<String>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_names_parse() {
        assert_eq!("tile".parse::<LayoutType>(), Ok(LayoutType::Tiling));
        assert_eq!("Monocle".parse::<LayoutType>(), Ok(LayoutType::Monocle));
        assert!("spiral".parse::<LayoutType>().is_err());
    }

    #[test]
    fn default_table_symbols() {
        let symbols: Vec<_> = default_layouts()
            .iter()
            .map(|layout| layout.to_boxed_layout().symbol())
            .collect();
        assert_eq!(symbols, vec!["[]=", "><>", "[M]"]);
        assert!(!LayoutType::Floating.to_boxed_layout().arranges());
    }
}
