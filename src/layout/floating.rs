use super::{Arrangement, Layout, Placer};

pub struct FloatingLayout;

impl Layout for FloatingLayout {
    fn symbol(&self) -> &'static str {
        "><>"
    }

    fn arranges(&self) -> bool {
        false
    }

    fn arrange(&self, _arrangement: &Arrangement, _place: &mut Placer) -> Option<String> {
        None
    }
}
