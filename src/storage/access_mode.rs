//! Store access modes.

use thiserror::Error;

/// A persistence mode literal.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AccessModeLiteral {
    /// `r`: read only, the store must already exist.
    R,
    /// `r+`: read and write, the store must already exist.
    RPlus,
    /// `w`: create the store, clearing any existing contents on open.
    W,
    /// `w-`: create the store, failing to open if it is not empty.
    WMinus,
    /// `a`: read and write, creating the store if it does not exist.
    A,
}

impl AccessModeLiteral {
    /// Return the mode literal as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::R => "r",
            Self::RPlus => "r+",
            Self::W => "w",
            Self::WMinus => "w-",
            Self::A => "a",
        }
    }
}

impl std::fmt::Display for AccessModeLiteral {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccessModeLiteral {
    type Err = InvalidAccessModeError;

    fn from_str(mode: &str) -> Result<Self, Self::Err> {
        match mode {
            "r" => Ok(Self::R),
            "r+" => Ok(Self::RPlus),
            "w" => Ok(Self::W),
            "w-" => Ok(Self::WMinus),
            "a" => Ok(Self::A),
            _ => Err(InvalidAccessModeError(mode.to_string())),
        }
    }
}

/// A store access mode: a mode literal and its derived capability flags.
///
/// | literal | readonly | overwrite | create | update |
/// |---------|----------|-----------|--------|--------|
/// | `r`     | yes      |           |        |        |
/// | `r+`    |          |           |        | yes    |
/// | `w`     |          | yes       | yes    |        |
/// | `w-`    |          |           | yes    |        |
/// | `a`     |          |           | yes    | yes    |
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct AccessMode {
    literal: AccessModeLiteral,
    readonly: bool,
    overwrite: bool,
    create: bool,
    update: bool,
}

impl AccessMode {
    /// Create a new access mode from a mode literal.
    #[must_use]
    pub const fn new(literal: AccessModeLiteral) -> Self {
        Self {
            literal,
            readonly: matches!(literal, AccessModeLiteral::R),
            overwrite: matches!(literal, AccessModeLiteral::W),
            create: matches!(
                literal,
                AccessModeLiteral::W | AccessModeLiteral::WMinus | AccessModeLiteral::A
            ),
            update: matches!(literal, AccessModeLiteral::RPlus | AccessModeLiteral::A),
        }
    }

    /// Create a new access mode from a mode literal string.
    ///
    /// # Errors
    /// Returns [`InvalidAccessModeError`] if `mode` is not one of `r`, `r+`, `w`, `w-`, or `a`.
    pub fn from_literal(mode: &str) -> Result<Self, InvalidAccessModeError> {
        mode.parse().map(Self::new)
    }

    /// Return the mode literal.
    #[must_use]
    pub const fn literal(&self) -> AccessModeLiteral {
        self.literal
    }

    /// Return `true` if writes are forbidden.
    #[must_use]
    pub const fn readonly(&self) -> bool {
        self.readonly
    }

    /// Return `true` if opening discards existing contents.
    #[must_use]
    pub const fn overwrite(&self) -> bool {
        self.overwrite
    }

    /// Return `true` if the mode may create the store.
    #[must_use]
    pub const fn create(&self) -> bool {
        self.create
    }

    /// Return `true` if the mode may update existing contents.
    #[must_use]
    pub const fn update(&self) -> bool {
        self.update
    }
}

impl std::fmt::Display for AccessMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.literal.fmt(f)
    }
}

/// An invalid access mode literal error.
#[derive(Clone, Debug, Error)]
#[error("invalid access mode literal {0}, expected one of r, r+, w, w-, a")]
pub struct InvalidAccessModeError(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_mode_flags() {
        let mode = AccessMode::from_literal("r").unwrap();
        assert!(mode.readonly() && !mode.overwrite() && !mode.create() && !mode.update());

        let mode = AccessMode::from_literal("r+").unwrap();
        assert!(!mode.readonly() && !mode.overwrite() && !mode.create() && mode.update());

        let mode = AccessMode::from_literal("w").unwrap();
        assert!(!mode.readonly() && mode.overwrite() && mode.create() && !mode.update());

        let mode = AccessMode::from_literal("w-").unwrap();
        assert!(!mode.readonly() && !mode.overwrite() && mode.create() && !mode.update());

        let mode = AccessMode::from_literal("a").unwrap();
        assert!(!mode.readonly() && !mode.overwrite() && mode.create() && mode.update());
        assert_eq!(mode.to_string(), "a");
    }

    #[test]
    fn access_mode_invalid() {
        assert!(AccessMode::from_literal("rw").is_err());
    }
}
