//! Collaborator capabilities consumed by screens built on secure forms.
//!
//! Authentication and notifications live outside this crate. Screens only
//! see them through these two traits, so any session layer or toast system
//! can be plugged in, and tests can record what was asked of them.

use std::fmt;

/// Session capability: whether a user is signed in, and a way to sign out.
pub trait Authentication {
    /// Returns whether a user is currently signed in.
    fn is_authenticated(&self) -> bool;

    /// Ends the current session.
    fn sign_out(&self);
}

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoticeLevel {
    /// A confirmation or neutral message.
    #[default]
    Info,
    /// Something went wrong.
    Error,
}

/// A short message for the user, shown by a [`Notifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Headline
    pub title: String,
    /// Supporting text
    pub description: String,
    /// Severity
    pub level: NoticeLevel,
}

impl Notice {
    /// Creates an informational notice.
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            level: NoticeLevel::Info,
        }
    }

    /// Creates an error notice.
    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            level: NoticeLevel::Error,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.description)
    }
}

/// Fire-and-forget message display.
pub trait Notifier {
    /// Shows `notice` to the user.
    fn notify(&self, notice: Notice);
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn notify(&self, notice: Notice) {
        (**self).notify(notice);
    }
}

impl<N: Notifier + ?Sized> Notifier for std::rc::Rc<N> {
    fn notify(&self, notice: Notice) {
        (**self).notify(notice);
    }
}
