//! Answer alphabets.
//!
//! Every mini-game answers from a small closed alphabet. The engine is
//! generic over the alphabet; the common ones used across the story scenes
//! are defined here.

use std::fmt::Debug;
use std::hash::Hash;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// A value from a mini-game's closed answer alphabet.
pub trait Answer:
    Copy + Eq + Hash + Debug + Send + Sync + Serialize + DeserializeOwned + 'static
{
    /// Every value of the alphabet, in display order.
    fn alphabet() -> &'static [Self];

    /// Stable label used in logs and reports.
    fn label(&self) -> &'static str;

    /// Looks up a value by its label, ignoring ASCII case.
    fn from_label(label: &str) -> Option<Self> {
        Self::alphabet()
            .iter()
            .copied()
            .find(|answer| answer.label().eq_ignore_ascii_case(label))
    }
}

/// Yes/no quizzes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YesNo {
    /// Yes.
    Yes,
    /// No.
    No,
}

impl Answer for YesNo {
    fn alphabet() -> &'static [Self] {
        &[Self::Yes, Self::No]
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
        }
    }
}

/// Private/public classification games.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Keep it to yourself.
    Private,
    /// Fine to share.
    Public,
}

impl Answer for Visibility {
    fn alphabet() -> &'static [Self] {
        &[Self::Private, Self::Public]
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Public => "public",
        }
    }
}

/// Thumbs-up/thumbs-down judgement games.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Thumb {
    /// Thumbs up.
    Up,
    /// Thumbs down.
    Down,
}

impl Answer for Thumb {
    fn alphabet() -> &'static [Self] {
        &[Self::Up, Self::Down]
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

/// Safe/unsafe sorting games (drag-and-drop bins, chest puzzles).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Safety {
    /// Safe.
    Safe,
    /// Not safe.
    Unsafe,
}

impl Answer for Safety {
    fn alphabet() -> &'static [Self] {
        &[Self::Safe, Self::Unsafe]
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Unsafe => "unsafe",
        }
    }
}
