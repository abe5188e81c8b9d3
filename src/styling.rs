//! Emoji prefixes for terminal diagnostics.
//!
//! Messages are styled with `color-print` tags in the format string:
//!
//! ```rust,ignore
//! use color_print::cformat;
//! use subcon::styling::ERROR_EMOJI;
//!
//! cformat!("{ERROR_EMOJI} <red>Error creating process: <bold>{call}</> failed</>")
//! ```
//!
//! | Semantic | color-print tag | emoji |
//! |----------|-----------------|-------|
//! | Error | `<red>` | `ERROR_EMOJI` |
//! | Warning | `<yellow>` | `WARNING_EMOJI` |
//! | Info | `<dim>` | `INFO_EMOJI` |

/// Error emoji: `cwrite!(f, "{ERROR_EMOJI} <red>message</>")`
pub const ERROR_EMOJI: &str = "❌";

/// Warning emoji: `cformat!("{WARNING_EMOJI} <yellow>message</>")`
pub const WARNING_EMOJI: &str = "🟡";

/// Info emoji - secondary detail attached to another message, usually dimmed
pub const INFO_EMOJI: &str = "⚪";
