/// Top-level experiment phases. Strictly forward: `Intro` -> `Instructions` -> `Trial` -> `Done`.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Intro,
    Instructions,
    Trial,
    Done,
}

impl Phase {
    pub fn next(&self) -> Option<Self> {
        use Phase::*;
        Some(match self {
            Intro => Instructions,
            Instructions => Trial,
            Trial => Done,
            Done => return None,
        })
    }

    /// Text screens advance on any key press.
    pub fn advances_on_any_key(&self) -> bool {
        matches!(self, Phase::Intro | Phase::Instructions)
    }

    pub fn is_trial(&self) -> bool {
        matches!(self, Phase::Trial)
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Phase::Done)
    }
}

/// What the surface shows inside a trial. Only meaningful while the phase is [`Phase::Trial`].
#[derive(Copy, Debug, Clone, PartialEq, Eq)]
pub enum DisplayState {
    WhiteFlash,
    ReferenceMap,
    AlteredMap,
}

impl DisplayState {
    /// Timed successor within one trial. `AlteredMap` waits for a response instead.
    pub fn next(&self) -> Option<Self> {
        match self {
            DisplayState::WhiteFlash => Some(DisplayState::ReferenceMap),
            DisplayState::ReferenceMap => Some(DisplayState::AlteredMap),
            DisplayState::AlteredMap => None,
        }
    }

    pub fn accepts_response(&self) -> bool {
        matches!(self, DisplayState::AlteredMap)
    }
}
