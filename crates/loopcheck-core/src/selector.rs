/// Discrete state of the two user buttons, packed the way the board wiring
/// reads them: both lines are active-low, the first button sits at bit 1 of
/// the port and the second at bit 4. A set bit therefore means "released".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectorState {
    BothPressed,
    OnlyFirstPressed,
    OnlySecondPressed,
    NeitherPressed,
}

impl SelectorState {
    pub const ALL: [SelectorState; 4] = [
        SelectorState::BothPressed,
        SelectorState::OnlyFirstPressed,
        SelectorState::OnlySecondPressed,
        SelectorState::NeitherPressed,
    ];

    /// Derives the state from raw line levels (high = released).
    pub fn from_levels(first_high: bool, second_high: bool) -> Self {
        match (first_high, second_high) {
            (false, false) => Self::BothPressed,
            (false, true) => Self::OnlyFirstPressed,
            (true, false) => Self::OnlySecondPressed,
            (true, true) => Self::NeitherPressed,
        }
    }

    /// The packed port code for this state.
    pub fn code(self) -> u8 {
        match self {
            Self::BothPressed => 0x00,
            Self::OnlyFirstPressed => 0x10,
            Self::OnlySecondPressed => 0x02,
            Self::NeitherPressed => 0x12,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x00 => Some(Self::BothPressed),
            0x10 => Some(Self::OnlyFirstPressed),
            0x02 => Some(Self::OnlySecondPressed),
            0x12 => Some(Self::NeitherPressed),
            _ => None,
        }
    }
}

/// Reads the current button state. A read is a pure sample of the line
/// levels with no side effects. No debouncing is performed; callers that
/// sample across a bounce window may observe transient states.
pub trait InputSelector {
    fn read(&self) -> SelectorState;
}

/// Selector pinned to one state, for hosts without physical buttons.
#[derive(Debug, Clone, Copy)]
pub struct FixedSelector(SelectorState);

impl FixedSelector {
    pub fn new(state: SelectorState) -> Self {
        Self(state)
    }

    pub fn from_pressed(first: bool, second: bool) -> Self {
        Self(match (first, second) {
            (true, true) => SelectorState::BothPressed,
            (true, false) => SelectorState::OnlyFirstPressed,
            (false, true) => SelectorState::OnlySecondPressed,
            (false, false) => SelectorState::NeitherPressed,
        })
    }
}

impl InputSelector for FixedSelector {
    fn read(&self) -> SelectorState {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_map_to_states() {
        assert_eq!(SelectorState::from_levels(false, false), SelectorState::BothPressed);
        assert_eq!(SelectorState::from_levels(false, true), SelectorState::OnlyFirstPressed);
        assert_eq!(SelectorState::from_levels(true, false), SelectorState::OnlySecondPressed);
        assert_eq!(SelectorState::from_levels(true, true), SelectorState::NeitherPressed);
    }

    #[test]
    fn codes_match_the_port_packing() {
        assert_eq!(SelectorState::BothPressed.code(), 0x00);
        assert_eq!(SelectorState::OnlyFirstPressed.code(), 0x10);
        assert_eq!(SelectorState::OnlySecondPressed.code(), 0x02);
        assert_eq!(SelectorState::NeitherPressed.code(), 0x12);
    }

    #[test]
    fn code_round_trips() {
        for state in SelectorState::ALL {
            assert_eq!(SelectorState::from_code(state.code()), Some(state));
        }
        assert_eq!(SelectorState::from_code(0xFF), None);
    }

    #[test]
    fn read_is_idempotent() {
        let selector = FixedSelector::from_pressed(true, false);
        let first = selector.read();
        let second = selector.read();
        assert_eq!(first, second);
        assert_eq!(first, SelectorState::OnlyFirstPressed);
    }
}
