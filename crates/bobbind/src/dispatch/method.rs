//! Compound method parsing.
//!
//! Editor calls routed to a plugin carry a method of the form
//! `<filename>:<callType>:<procedure...>`. Any further `:` separated tokens
//! belong to the procedure name and are rejoined with single spaces.

use std::iter;

/// Host platform, which decides whether Windows drive letters are repaired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Windows, where plugin paths start with a drive letter such as `C:`.
    Windows,
    /// Every other platform.
    Posix,
}

impl Platform {
    /// Returns the platform this binary was compiled for.
    #[must_use]
    pub const fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Posix
        }
    }
}

/// A method string decoded into its three parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundMethod {
    filename: String,
    call_type: String,
    procedure: String,
}

impl CompoundMethod {
    /// Parses `method`. Missing parts become empty strings; parsing never
    /// fails, so an unusable filename surfaces later when the plugin cannot be
    /// loaded.
    ///
    /// # Examples
    ///
    /// ```
    /// use bobbind::dispatch::{CompoundMethod, Platform};
    ///
    /// let method = CompoundMethod::parse("/plugins/a.js:function:Say:Hello", Platform::Posix);
    /// assert_eq!(method.filename(), "/plugins/a.js");
    /// assert_eq!(method.call_type(), "function");
    /// assert_eq!(method.procedure(), "Say Hello");
    /// ```
    #[must_use]
    pub fn parse(method: &str, platform: Platform) -> Self {
        let tokens = correct_drive_letter(method.split(':').map(str::to_owned).collect(), platform);
        let mut tokens = tokens.into_iter();
        let filename = tokens.next().unwrap_or_default();
        let call_type = tokens.next().unwrap_or_default();
        let procedure = tokens.collect::<Vec<_>>().join(" ");
        Self {
            filename,
            call_type,
            procedure,
        }
    }

    /// Returns the plugin filename.
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Returns the call type, such as `function` or `command`.
    #[must_use]
    pub fn call_type(&self) -> &str {
        &self.call_type
    }

    /// Returns the procedure name.
    #[must_use]
    pub fn procedure(&self) -> &str {
        &self.procedure
    }
}

/// Rejoins a Windows drive letter that splitting on `:` separated from the
/// rest of its path.
///
/// Applies only on [`Platform::Windows`] when the first token is a single
/// character and at least one more token follows.
#[must_use]
pub fn correct_drive_letter(tokens: Vec<String>, platform: Platform) -> Vec<String> {
    if platform != Platform::Windows {
        return tokens;
    }
    let mut tokens = tokens.into_iter();
    match (tokens.next(), tokens.next()) {
        (Some(drive), Some(path)) if drive.chars().count() == 1 => {
            iter::once(format!("{drive}:{path}")).chain(tokens).collect()
        }
        (first, second) => first.into_iter().chain(second).chain(tokens).collect(),
    }
}
