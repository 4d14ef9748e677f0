//! Static hardware tables.
//!
//! Personality ids identify either the droid body or the personality chip
//! plugged into it. Audio clip counts, affiliations and shutdown tracks are
//! fixed per personality and never change at runtime.

/// A droid's affiliation, used by beacon interactions and audio selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Affiliation {
    /// Scoundrel (the default).
    #[default]
    Scoundrel = 1,
    /// Resistance.
    Resistance = 5,
    /// First Order.
    FirstOrder = 9,
}

impl Affiliation {
    /// Look up an affiliation by its id.
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Affiliation::Scoundrel),
            5 => Some(Affiliation::Resistance),
            9 => Some(Affiliation::FirstOrder),
            _ => None,
        }
    }

    /// Numeric id.
    pub fn id(self) -> u8 {
        self as u8
    }
}

impl std::fmt::Display for Affiliation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Affiliation::Scoundrel => write!(f, "Scoundrel"),
            Affiliation::Resistance => write!(f, "Resistance"),
            Affiliation::FirstOrder => write!(f, "First Order"),
        }
    }
}

/// Personality identifiers for droid bodies and personality chips.
pub mod personality {
    /// B-unit (BD) droid.
    pub const BUNIT: u8 = 1;
    /// R-unit droid. Default when nothing else is known.
    pub const RUNIT: u8 = 2;
    /// Blue chip.
    pub const BLUE: u8 = 3;
    /// Gray chip.
    pub const GRAY: u8 = 4;
    /// Red chip.
    pub const RED: u8 = 5;
    /// Orange chip.
    pub const ORANGE: u8 = 6;
    /// Purple chip.
    pub const PURPLE: u8 = 7;
    /// Black chip.
    pub const BLACK: u8 = 8;
    /// CB-23 droid.
    pub const CB23: u8 = 9;
    /// Yellow chip.
    pub const YELLOW: u8 = 10;
    /// C1-10P droid. The Red 2 chip reports the same id.
    pub const C110P: u8 = 11;
    /// DO droid.
    pub const DO: u8 = 12;
    /// Dark blue chip.
    pub const DARK_BLUE: u8 = 13;
    /// BB-unit droid.
    pub const BBUNIT: u8 = 14;
}

/// Sound bank identifiers.
pub mod audio_bank {
    /// General use.
    pub const GENERAL: u8 = 1;
    /// Droid Depot.
    pub const DROID_DEPOT: u8 = 2;
    /// Resistance.
    pub const RESISTANCE: u8 = 3;
    /// Unknown purpose.
    pub const UNKNOWN: u8 = 4;
    /// Droid detector.
    pub const DROID_DETECTOR: u8 = 5;
    /// Dok-Ondar's.
    pub const DOK_ONDARS: u8 = 6;
    /// First Order.
    pub const FIRST_ORDER: u8 = 7;
    /// Initial activation.
    pub const INITIAL_ACTIVATION: u8 = 8;
    /// Motor sounds.
    pub const MOTOR_SOUND: u8 = 9;
    /// Empty.
    pub const EMPTY: u8 = 10;
    /// Blaster accessory.
    pub const BLASTER_ACCESSORY: u8 = 11;
    /// Thruster accessory.
    pub const THRUSTER_ACCESSORY: u8 = 12;

    /// Banks holding speech-like clips.
    pub const TALKING: [u8; 5] = [DROID_DEPOT, RESISTANCE, UNKNOWN, DOK_ONDARS, FIRST_ORDER];
}

use personality::*;

/// Column order of [`AUDIO_CLIP_COUNTS`].
const AUDIO_COLUMNS: [u8; 13] = [
    BLUE, GRAY, RED, ORANGE, PURPLE, BLACK, CB23, YELLOW, C110P, DARK_BLUE, BUNIT, RUNIT, BBUNIT,
];

/// Clip counts per bank (row = bank id - 1), columns as [`AUDIO_COLUMNS`].
static AUDIO_CLIP_COUNTS: [[u8; 13]; 12] = [
    [5, 4, 5, 5, 4, 3, 5, 4, 6, 4, 5, 4, 5],
    [5, 5, 5, 5, 4, 6, 5, 5, 13, 4, 6, 4, 3],
    [5, 5, 5, 5, 5, 5, 5, 5, 5, 4, 6, 3, 3],
    [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
    [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
    [5, 3, 3, 3, 4, 5, 5, 5, 6, 4, 5, 4, 5],
    [3, 5, 3, 3, 5, 3, 5, 5, 6, 5, 5, 5, 5],
    [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
    [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 0, 1, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
    [2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 0, 2, 0],
    [2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 0, 2, 0],
];

static PERSONALITY_AFFILIATIONS: [(u8, Affiliation); 13] = [
    (BLUE, Affiliation::Resistance),
    (GRAY, Affiliation::Scoundrel),
    (RED, Affiliation::FirstOrder),
    (ORANGE, Affiliation::Resistance),
    (PURPLE, Affiliation::Scoundrel),
    (BLACK, Affiliation::FirstOrder),
    (YELLOW, Affiliation::Resistance),
    (CB23, Affiliation::Scoundrel),
    (DO, Affiliation::Resistance),
    (C110P, Affiliation::Resistance),
    (RUNIT, Affiliation::Scoundrel),
    (BUNIT, Affiliation::Resistance),
    (BBUNIT, Affiliation::Scoundrel),
];

/// Shutdown clip (within the First Order bank) per personality.
static SHUTDOWN_CLIPS: [(u8, u8); 13] = [
    (BLUE, 2),
    (GRAY, 4),
    (RED, 2),
    (ORANGE, 3),
    (PURPLE, 1),
    (BLACK, 1),
    (YELLOW, 1),
    (CB23, 1),
    (DO, 1),
    (C110P, 1),
    (RUNIT, 2),
    (BUNIT, 1),
    (BBUNIT, 3),
];

/// Resolve the personality used for audio lookups: the chip wins over the body.
pub fn personality_id(droid_id: u8, chip_id: Option<u8>) -> u8 {
    chip_id.unwrap_or(droid_id)
}

/// Number of clips available in `bank_id` for `personality_id`. Unknown banks
/// or personalities have none.
pub fn audio_clip_count(bank_id: u8, personality_id: u8) -> u8 {
    let Some(row) = bank_id
        .checked_sub(1)
        .and_then(|i| AUDIO_CLIP_COUNTS.get(i as usize))
    else {
        return 0;
    };
    AUDIO_COLUMNS
        .iter()
        .position(|&p| p == personality_id)
        .map(|col| row[col])
        .unwrap_or(0)
}

/// Affiliation of a personality, Scoundrel when unknown.
pub fn personality_affiliation(personality_id: u8) -> Affiliation {
    PERSONALITY_AFFILIATIONS
        .iter()
        .find(|(p, _)| *p == personality_id)
        .map(|(_, a)| *a)
        .unwrap_or_default()
}

/// `(bank, clip)` played when a droid with this personality shuts down.
pub fn shutdown_track(personality_id: u8) -> (u8, u8) {
    let clip = SHUTDOWN_CLIPS
        .iter()
        .find(|(p, _)| *p == personality_id)
        .map(|(_, clip)| *clip)
        .unwrap_or(1);
    (audio_bank::FIRST_ORDER, clip)
}
