//! ICCCM `WM_NORMAL_HINTS` and `WM_HINTS` decoding.

pub mod flags {
    pub const US_POSITION: u32 = 1 << 0;
    pub const US_SIZE: u32 = 1 << 1;
    pub const P_POSITION: u32 = 1 << 2;
    pub const P_SIZE: u32 = 1 << 3;
    pub const P_MIN_SIZE: u32 = 1 << 4;
    pub const P_MAX_SIZE: u32 = 1 << 5;
    pub const P_RESIZE_INC: u32 = 1 << 6;
    pub const P_ASPECT: u32 = 1 << 7;
    pub const P_BASE_SIZE: u32 = 1 << 8;
    pub const P_WIN_GRAVITY: u32 = 1 << 9;

    pub const INPUT_HINT: u32 = 1 << 0;
    pub const URGENCY_HINT: u32 = 1 << 8;
}

/// Word offsets into the `WM_SIZE_HINTS` property.
pub mod offset {
    pub const FLAGS: usize = 0;
    pub const MIN_WIDTH: usize = 5;
    pub const MIN_HEIGHT: usize = 6;
    pub const MAX_WIDTH: usize = 7;
    pub const MAX_HEIGHT: usize = 8;
    pub const WIDTH_INC: usize = 9;
    pub const HEIGHT_INC: usize = 10;
    pub const MIN_ASPECT_X: usize = 11;
    pub const MIN_ASPECT_Y: usize = 12;
    pub const MAX_ASPECT_X: usize = 13;
    pub const MAX_ASPECT_Y: usize = 14;
    pub const BASE_WIDTH: usize = 15;
    pub const BASE_HEIGHT: usize = 16;

    pub const WORD_COUNT: usize = 18;
}

/// `WM_SIZE_HINTS` as stored on the window, before any fallbacks.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WmSizeHints {
    pub flags: u32,
    pub min: (i32, i32),
    pub max: (i32, i32),
    pub increment: (i32, i32),
    pub min_aspect: (i32, i32),
    pub max_aspect: (i32, i32),
    pub base: (i32, i32),
}

impl WmSizeHints {
    /// Decodes the raw 32-bit words of the property. Properties written by
    /// pre-ICCCM clients are shorter than 18 words; missing fields read as 0.
    pub fn from_words(words: &[u32]) -> Option<Self> {
        use offset::*;

        if words.is_empty() {
            return None;
        }
        let read = |index: usize| words.get(index).copied().unwrap_or(0) as i32;

        Some(Self {
            flags: words[FLAGS],
            min: (read(MIN_WIDTH), read(MIN_HEIGHT)),
            max: (read(MAX_WIDTH), read(MAX_HEIGHT)),
            increment: (read(WIDTH_INC), read(HEIGHT_INC)),
            min_aspect: (read(MIN_ASPECT_X), read(MIN_ASPECT_Y)),
            max_aspect: (read(MAX_ASPECT_X), read(MAX_ASPECT_Y)),
            base: (read(BASE_WIDTH), read(BASE_HEIGHT)),
        })
    }

    fn has(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }
}

/// Effective size constraints of a client.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SizeHints {
    pub base_width: i32,
    pub base_height: i32,
    pub increment_width: i32,
    pub increment_height: i32,
    pub max_width: i32,
    pub max_height: i32,
    pub min_width: i32,
    pub min_height: i32,
    pub min_aspect: f32,
    pub max_aspect: f32,
}

impl SizeHints {
    /// Base falls back to min and min falls back to base, as ICCCM 4.1.2.3
    /// asks. Absent hints yield all zeros.
    pub fn from_normal_hints(hints: Option<&WmSizeHints>) -> Self {
        use flags::*;

        let Some(hints) = hints else {
            return Self::default();
        };

        let (base_width, base_height) = if hints.has(P_BASE_SIZE) {
            hints.base
        } else if hints.has(P_MIN_SIZE) {
            hints.min
        } else {
            (0, 0)
        };

        let (increment_width, increment_height) = if hints.has(P_RESIZE_INC) {
            hints.increment
        } else {
            (0, 0)
        };

        let (max_width, max_height) = if hints.has(P_MAX_SIZE) {
            hints.max
        } else {
            (0, 0)
        };

        let (min_width, min_height) = if hints.has(P_MIN_SIZE) {
            hints.min
        } else if hints.has(P_BASE_SIZE) {
            hints.base
        } else {
            (0, 0)
        };

        let (min_aspect, max_aspect) = if hints.has(P_ASPECT) {
            (
                ratio(hints.min_aspect.1, hints.min_aspect.0),
                ratio(hints.max_aspect.0, hints.max_aspect.1),
            )
        } else {
            (0.0, 0.0)
        };

        Self {
            base_width,
            base_height,
            increment_width,
            increment_height,
            max_width,
            max_height,
            min_width,
            min_height,
            min_aspect,
            max_aspect,
        }
    }

    pub fn is_fixed(&self) -> bool {
        self.max_width > 0
            && self.max_height > 0
            && self.max_width == self.min_width
            && self.max_height == self.min_height
    }
}

fn ratio(numerator: i32, denominator: i32) -> f32 {
    if denominator == 0 {
        return 0.0;
    }
    numerator as f32 / denominator as f32
}

/// The parts of `WM_HINTS` the manager acts on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WmHints {
    pub urgent: bool,
    /// `Some` only when the client set the input hint flag.
    pub input: Option<bool>,
}

impl WmHints {
    pub fn from_words(words: &[u32]) -> Option<Self> {
        let flags = *words.first()?;
        let input = if flags & flags::INPUT_HINT != 0 {
            words.get(1).map(|&input| input != 0)
        } else {
            None
        };
        Some(Self {
            urgent: flags & flags::URGENCY_HINT != 0,
            input,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(pairs: &[(usize, u32)]) -> Vec<u32> {
        let mut words = vec![0; offset::WORD_COUNT];
        for &(index, value) in pairs {
            words[index] = value;
        }
        words
    }

    #[test]
    fn base_falls_back_to_min_and_min_to_base() {
        let only_min = WmSizeHints::from_words(&words(&[
            (offset::FLAGS, flags::P_MIN_SIZE),
            (offset::MIN_WIDTH, 100),
            (offset::MIN_HEIGHT, 50),
        ]));
        let hints = SizeHints::from_normal_hints(only_min.as_ref());
        assert_eq!((hints.base_width, hints.base_height), (100, 50));
        assert_eq!((hints.min_width, hints.min_height), (100, 50));

        let only_base = WmSizeHints::from_words(&words(&[
            (offset::FLAGS, flags::P_BASE_SIZE),
            (offset::BASE_WIDTH, 20),
            (offset::BASE_HEIGHT, 10),
        ]));
        let hints = SizeHints::from_normal_hints(only_base.as_ref());
        assert_eq!((hints.min_width, hints.min_height), (20, 10));
    }

    #[test]
    fn equal_min_and_max_marks_fixed() {
        let fixed = WmSizeHints::from_words(&words(&[
            (offset::FLAGS, flags::P_MIN_SIZE | flags::P_MAX_SIZE),
            (offset::MIN_WIDTH, 300),
            (offset::MIN_HEIGHT, 200),
            (offset::MAX_WIDTH, 300),
            (offset::MAX_HEIGHT, 200),
        ]));
        assert!(SizeHints::from_normal_hints(fixed.as_ref()).is_fixed());

        let no_max = WmSizeHints::from_words(&words(&[
            (offset::FLAGS, flags::P_MIN_SIZE),
            (offset::MIN_WIDTH, 300),
            (offset::MIN_HEIGHT, 200),
        ]));
        assert!(!SizeHints::from_normal_hints(no_max.as_ref()).is_fixed());
    }

    #[test]
    fn aspect_ratios_are_height_over_width_for_min() {
        let aspect = WmSizeHints::from_words(&words(&[
            (offset::FLAGS, flags::P_ASPECT),
            (offset::MIN_ASPECT_X, 4),
            (offset::MIN_ASPECT_Y, 3),
            (offset::MAX_ASPECT_X, 16),
            (offset::MAX_ASPECT_Y, 9),
        ]));
        let hints = SizeHints::from_normal_hints(aspect.as_ref());
        assert!((hints.min_aspect - 0.75).abs() < f32::EPSILON);
        assert!((hints.max_aspect - 16.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn missing_hints_are_all_zero() {
        assert_eq!(SizeHints::from_normal_hints(None), SizeHints::default());
        assert_eq!(WmSizeHints::from_words(&[]), None);
    }

    #[test]
    fn wm_hints_input_only_when_flagged() {
        let hints = WmHints::from_words(&[flags::INPUT_HINT, 0]).unwrap();
        assert_eq!(hints.input, Some(false));
        assert!(!hints.urgent);

        let hints = WmHints::from_words(&[flags::URGENCY_HINT, 0]).unwrap();
        assert_eq!(hints.input, None);
        assert!(hints.urgent);
    }
}
