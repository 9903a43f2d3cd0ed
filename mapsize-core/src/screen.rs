use crate::phase::{DisplayState, Phase};

/// Everything the presentation surface can be asked to show.
///
/// This is the cross-product of [`Phase`] and [`DisplayState`] restricted to the
/// combinations that can actually occur:
///
/// | phase          | display          | screen                         |
/// |----------------|------------------|--------------------------------|
/// | `Intro`        | none             | `Intro`                        |
/// | `Instructions` | none             | `Instructions`                 |
/// | `Trial`        | `WhiteFlash`     | `WhiteFlash`                   |
/// | `Trial`        | `ReferenceMap`   | `Map { height_px: reference }` |
/// | `Trial`        | `AlteredMap`     | `Map { height_px: presented }` |
/// | `Done`         | none             | `Done`                         |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Intro,
    Instructions,
    WhiteFlash,
    Map { height_px: u32 },
    Done,
}

impl Screen {
    /// Resolves a (phase, display) pair. Returns `None` for combinations outside the table.
    pub fn resolve(
        phase: Phase,
        display: Option<DisplayState>,
        reference_px: u32,
        presented_px: u32,
    ) -> Option<Self> {
        Some(match (phase, display) {
            (Phase::Intro, None) => Screen::Intro,
            (Phase::Instructions, None) => Screen::Instructions,
            (Phase::Trial, Some(DisplayState::WhiteFlash)) => Screen::WhiteFlash,
            (Phase::Trial, Some(DisplayState::ReferenceMap)) => Screen::Map {
                height_px: reference_px,
            },
            (Phase::Trial, Some(DisplayState::AlteredMap)) => Screen::Map {
                height_px: presented_px,
            },
            (Phase::Done, None) => Screen::Done,
            _ => return None,
        })
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Screen::Intro | Screen::Instructions | Screen::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trial_displays_resolve_to_map_heights() {
        assert_eq!(
            Screen::resolve(Phase::Trial, Some(DisplayState::ReferenceMap), 300, 275),
            Some(Screen::Map { height_px: 300 })
        );
        assert_eq!(
            Screen::resolve(Phase::Trial, Some(DisplayState::AlteredMap), 300, 275),
            Some(Screen::Map { height_px: 275 })
        );
        assert_eq!(
            Screen::resolve(Phase::Trial, Some(DisplayState::WhiteFlash), 300, 275),
            Some(Screen::WhiteFlash)
        );
    }

    #[test]
    fn invalid_combinations_are_rejected() {
        assert_eq!(Screen::resolve(Phase::Trial, None, 300, 300), None);
        assert_eq!(
            Screen::resolve(Phase::Intro, Some(DisplayState::AlteredMap), 300, 300),
            None
        );
        assert_eq!(
            Screen::resolve(Phase::Done, Some(DisplayState::WhiteFlash), 300, 300),
            None
        );
    }

    #[test]
    fn text_screens() {
        assert!(Screen::Intro.is_text());
        assert!(Screen::Done.is_text());
        assert!(!Screen::WhiteFlash.is_text());
        assert!(!Screen::Map { height_px: 300 }.is_text());
    }
}
