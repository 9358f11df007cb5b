//! Theme variant and build type shared across the toolkit.

use std::fmt;

/// The user's theme preference.
///
/// `UseSystem` defers to the operating system's dark/light setting; the
/// application layer resolves it to [`Light`](ThemeVariant::Light) or
/// [`Dark`](ThemeVariant::Dark) through the platform services, defaulting to
/// light when the OS has no opinion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ThemeVariant {
    /// Light appearance (dark text on light background).
    Light,
    /// Dark appearance (light text on dark background).
    Dark,
    /// Follow the operating system preference.
    #[default]
    UseSystem,
}

impl ThemeVariant {
    /// Returns true if this is the dark variant.
    pub fn is_dark(&self) -> bool {
        matches!(self, ThemeVariant::Dark)
    }

    /// Returns true if this is the light variant.
    pub fn is_light(&self) -> bool {
        matches!(self, ThemeVariant::Light)
    }
}

impl fmt::Display for ThemeVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThemeVariant::Light => write!(f, "light"),
            ThemeVariant::Dark => write!(f, "dark"),
            ThemeVariant::UseSystem => write!(f, "system"),
        }
    }
}

/// How the running binary was built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildType {
    /// Built with debug assertions.
    Debug,
    /// An optimized release build.
    Release,
}

impl BuildType {
    /// The build type of the current binary.
    pub fn current() -> Self {
        if cfg!(debug_assertions) {
            BuildType::Debug
        } else {
            BuildType::Release
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildType::Debug => write!(f, "debug"),
            BuildType::Release => write!(f, "release"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_default_follows_system() {
        assert_eq!(ThemeVariant::default(), ThemeVariant::UseSystem);
    }

    #[test]
    fn variant_is_dark_light() {
        assert!(ThemeVariant::Dark.is_dark());
        assert!(!ThemeVariant::Dark.is_light());
        assert!(ThemeVariant::Light.is_light());
        assert!(!ThemeVariant::Light.is_dark());
        assert!(!ThemeVariant::UseSystem.is_dark());
        assert!(!ThemeVariant::UseSystem.is_light());
    }

    #[test]
    fn variant_display() {
        assert_eq!(ThemeVariant::Light.to_string(), "light");
        assert_eq!(ThemeVariant::Dark.to_string(), "dark");
        assert_eq!(ThemeVariant::UseSystem.to_string(), "system");
    }

    #[test]
    fn build_type_matches_compilation() {
        let build = BuildType::current();
        if cfg!(debug_assertions) {
            assert_eq!(build, BuildType::Debug);
        } else {
            assert_eq!(build, BuildType::Release);
        }
    }
}
