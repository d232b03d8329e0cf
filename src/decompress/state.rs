//! The 12-state symbol automaton.
//!
//! States `0..=6` follow a literal, `7..=11` follow a match or rep. The
//! state selects probability contexts and whether the next literal is
//! decoded against the byte at `rep0`.

/// Number of automaton states.
pub const NUM_STATES: usize = 12;

/// Automaton state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum State {
    #[default]
    LitLit = 0,
    MatchLitLit = 1,
    RepLitLit = 2,
    ShortRepLitLit = 3,
    MatchLit = 4,
    RepLit = 5,
    ShortRepLit = 6,
    LitMatch = 7,
    LitLongRep = 8,
    LitShortRep = 9,
    NonLitMatch = 10,
    NonLitRep = 11,
}

const ALL: [State; NUM_STATES] = [
    State::LitLit,
    State::MatchLitLit,
    State::RepLitLit,
    State::ShortRepLitLit,
    State::MatchLit,
    State::RepLit,
    State::ShortRepLit,
    State::LitMatch,
    State::LitLongRep,
    State::LitShortRep,
    State::NonLitMatch,
    State::NonLitRep,
];

const AFTER_LITERAL: [u8; NUM_STATES] = [0, 0, 0, 0, 1, 2, 3, 4, 5, 6, 4, 5];
const AFTER_MATCH: [u8; NUM_STATES] = [7, 7, 7, 7, 7, 7, 7, 10, 10, 10, 10, 10];
const AFTER_REP: [u8; NUM_STATES] = [8, 8, 8, 8, 8, 8, 8, 11, 11, 11, 11, 11];
const AFTER_SHORT_REP: [u8; NUM_STATES] = [9, 9, 9, 9, 9, 9, 9, 11, 11, 11, 11, 11];

impl State {
    /// Table index of this state.
    #[inline(always)]
    pub fn index(self) -> usize {
        self as usize
    }

    /// State for a raw index, if it is one of the twelve.
    pub fn from_index(index: usize) -> Option<Self> {
        ALL.get(index).copied()
    }

    /// Whether the previous symbol was a literal.
    #[inline(always)]
    pub fn is_char_state(self) -> bool {
        (self as u8) < 7
    }

    #[inline(always)]
    pub fn after_literal(self) -> Self {
        ALL[AFTER_LITERAL[self.index()] as usize]
    }

    #[inline(always)]
    pub fn after_match(self) -> Self {
        ALL[AFTER_MATCH[self.index()] as usize]
    }

    #[inline(always)]
    pub fn after_rep(self) -> Self {
        ALL[AFTER_REP[self.index()] as usize]
    }

    #[inline(always)]
    pub fn after_short_rep(self) -> Self {
        ALL[AFTER_SHORT_REP[self.index()] as usize]
    }
}
