//! Constrained value types used by the configuration sections.
//!
//! - `locale`: `Locale`, the `general.language` tag
//! - `schedule`: `ClockTime`, the `sync.schedule.specific_time` value
//! - `logging`: `LogLevel`, the `logs.level` enum
//! - `gui`: `Theme`, the `gui.theme` enum
//!
//! Each type parses from its document string through `FromStr`, returning the
//! [`FieldErrorKind`](crate::FieldErrorKind) the loader attaches to the field.

pub mod gui;
pub mod locale;
pub mod logging;
pub mod schedule;

pub use gui::Theme;
pub use locale::Locale;
pub use logging::LogLevel;
pub use schedule::ClockTime;
