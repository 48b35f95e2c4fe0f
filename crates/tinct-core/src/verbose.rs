//! Categorized warnings with scoped filtering, and message-box formatting.
//!
//! Warnings are emitted through `tracing` at `WARN` level under the
//! `tinct::warning` target. The filter is process-wide: a suppressed category
//! is dropped before it reaches the subscriber.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::TinctError;
use crate::mapping::validate_method;

/// Category attached to every emitted warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WarningCategory {
    /// General colour-science warnings (e.g. out-of-domain inputs).
    Colour,
    /// API misuse or unsupported configuration.
    Usage,
    /// Numerical issues found while computing.
    Runtime,
}

impl WarningCategory {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Colour => "Colour",
            Self::Usage => "Usage",
            Self::Runtime => "Runtime",
        }
    }

    pub fn all() -> &'static [Self] {
        const ALL: [WarningCategory; 3] = [
            WarningCategory::Colour,
            WarningCategory::Usage,
            WarningCategory::Runtime,
        ];
        &ALL
    }

    const fn bit(self) -> u8 {
        match self {
            Self::Colour => 0b001,
            Self::Usage => 0b010,
            Self::Runtime => 0b100,
        }
    }
}

impl fmt::Display for WarningCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for WarningCategory {
    type Err = TinctError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match validate_method(s, &["Colour", "Usage", "Runtime"])? {
            "Colour" => Ok(Self::Colour),
            "Usage" => Ok(Self::Usage),
            _ => Ok(Self::Runtime),
        }
    }
}

/// Which warning categories are currently suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WarningFilter {
    pub colour: bool,
    pub usage: bool,
    pub runtime: bool,
}

impl WarningFilter {
    /// Nothing suppressed.
    pub const NONE: Self = Self {
        colour: false,
        usage: false,
        runtime: false,
    };

    /// Everything suppressed.
    pub const ALL: Self = Self {
        colour: true,
        usage: true,
        runtime: true,
    };

    pub const fn suppresses(&self, category: WarningCategory) -> bool {
        match category {
            WarningCategory::Colour => self.colour,
            WarningCategory::Usage => self.usage,
            WarningCategory::Runtime => self.runtime,
        }
    }

    #[must_use]
    pub fn with(mut self, category: WarningCategory) -> Self {
        match category {
            WarningCategory::Colour => self.colour = true,
            WarningCategory::Usage => self.usage = true,
            WarningCategory::Runtime => self.runtime = true,
        }
        self
    }

    fn to_bits(self) -> u8 {
        WarningCategory::all()
            .iter()
            .filter(|category| self.suppresses(**category))
            .fold(0, |bits, category| bits | category.bit())
    }

    fn from_bits(bits: u8) -> Self {
        WarningCategory::all()
            .iter()
            .filter(|category| bits & category.bit() != 0)
            .fold(Self::NONE, |filter, category| filter.with(*category))
    }
}

static FILTER: AtomicU8 = AtomicU8::new(0);

/// The filter currently in effect.
pub fn warning_filter() -> WarningFilter {
    WarningFilter::from_bits(FILTER.load(Ordering::Acquire))
}

/// Replace the warning filter, returning the previous one.
pub fn filter_warnings(filter: WarningFilter) -> WarningFilter {
    WarningFilter::from_bits(FILTER.swap(filter.to_bits(), Ordering::AcqRel))
}

/// Scope guard returned by [`suppress_warnings`].
///
/// Restores the filter that was active when the guard was created.
#[must_use = "warnings are only suppressed while the guard is alive"]
pub struct WarningGuard {
    previous: WarningFilter,
}

impl Drop for WarningGuard {
    fn drop(&mut self) {
        filter_warnings(self.previous);
    }
}

/// Suppress `categories` in addition to whatever is already filtered, until
/// the returned guard is dropped.
pub fn suppress_warnings(categories: &[WarningCategory]) -> WarningGuard {
    let current = warning_filter();
    let filter = categories
        .iter()
        .fold(current, |filter, category| filter.with(*category));
    let previous = filter_warnings(filter);
    WarningGuard { previous }
}

/// Emit `message` under `category` unless filtered. Returns whether the
/// warning was emitted.
pub fn warn(category: WarningCategory, message: impl fmt::Display) -> bool {
    if warning_filter().suppresses(category) {
        return false;
    }
    tracing::warn!(target: "tinct::warning", category = category.label(), "{message}");
    true
}

pub fn colour_warning(message: impl fmt::Display) -> bool {
    warn(WarningCategory::Colour, message)
}

pub fn usage_warning(message: impl fmt::Display) -> bool {
    warn(WarningCategory::Usage, message)
}

pub fn runtime_warning(message: impl fmt::Display) -> bool {
    warn(WarningCategory::Runtime, message)
}

/// Frame `message` in a box of `width` columns with `padding` spaces on
/// either side of the text.
///
/// Lines are word-wrapped; words longer than the available width are kept
/// whole and overflow the frame. Leading indentation of each line is kept on
/// its first wrapped line.
///
/// ```text
/// ===============================================================================
/// *                                                                             *
/// *   Lorem ipsum dolor sit amet, consectetur adipiscing elit.                  *
/// *                                                                             *
/// ===============================================================================
/// ```
pub fn message_box(message: &str, width: usize, padding: usize) -> String {
    let ideal_width = width.saturating_sub(padding * 2 + 2).max(1);
    let inner = |text: &str| {
        let fill = width.saturating_sub(text.chars().count() + padding * 2 + 2);
        format!(
            "*{pad}{text}{fill}{pad}*",
            pad = " ".repeat(padding),
            fill = " ".repeat(fill)
        )
    };

    let mut lines = vec!["=".repeat(width), inner("")];
    for paragraph in message.split('\n') {
        let wrapped = wrap(&paragraph.replace('\t', "        "), ideal_width);
        if wrapped.is_empty() {
            lines.push(inner(""));
        }
        lines.extend(wrapped.iter().map(|line| inner(line)));
    }
    lines.push(inner(""));
    lines.push("=".repeat(width));
    lines.join("\n")
}

fn wrap(text: &str, width: usize) -> Vec<String> {
    let indent = &text[..text.len() - text.trim_start().len()];
    let mut lines = Vec::new();
    let mut current = indent.to_string();
    let mut words = 0;
    for word in text.split_whitespace() {
        let needed = current.chars().count() + usize::from(words > 0) + word.chars().count();
        if needed > width && words > 0 {
            lines.push(std::mem::take(&mut current));
            words = 0;
        }
        if words > 0 {
            current.push(' ');
        }
        current.push_str(word);
        words += 1;
    }
    if words > 0 {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::global_state_lock;

    #[test]
    fn test_suppress_warnings_restores_previous_filter() {
        let _lock = global_state_lock();
        let before = filter_warnings(WarningFilter::NONE);

        assert!(usage_warning("emitted"));
        {
            let _guard = suppress_warnings(&[WarningCategory::Usage]);
            assert!(!usage_warning("suppressed"));
            assert!(runtime_warning("still emitted"));
            {
                let _inner = suppress_warnings(&[WarningCategory::Runtime]);
                assert!(!usage_warning("suppressed"));
                assert!(!runtime_warning("suppressed"));
            }
            assert!(runtime_warning("emitted again"));
        }
        assert_eq!(warning_filter(), WarningFilter::NONE);
        assert!(usage_warning("emitted"));

        filter_warnings(before);
    }

    #[test]
    fn test_filter_warnings_returns_previous() {
        let _lock = global_state_lock();
        let before = filter_warnings(WarningFilter::ALL);
        assert!(!colour_warning("suppressed"));
        let previous = filter_warnings(WarningFilter::NONE.with(WarningCategory::Colour));
        assert_eq!(previous, WarningFilter::ALL);
        assert!(!colour_warning("suppressed"));
        assert!(usage_warning("emitted"));
        filter_warnings(before);
    }

    #[test]
    fn test_filter_bits_cover_every_category() {
        for category in WarningCategory::all() {
            let filter = WarningFilter::NONE.with(*category);
            assert_eq!(WarningFilter::from_bits(filter.to_bits()), filter);
        }
        assert_eq!(WarningFilter::from_bits(WarningFilter::ALL.to_bits()), WarningFilter::ALL);
    }

    #[test]
    fn test_category_parses_case_insensitively() {
        assert_eq!("usage".parse::<WarningCategory>(), Ok(WarningCategory::Usage));
        assert_eq!("RUNTIME".parse::<WarningCategory>(), Ok(WarningCategory::Runtime));
        assert!("python".parse::<WarningCategory>().is_err());
    }

    #[test]
    fn test_message_box_frames_and_wraps() {
        let boxed = message_box("Hello World!", 20, 2);
        let lines: Vec<&str> = boxed.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "=".repeat(20));
        assert_eq!(lines[2], "*  Hello World!    *");
        assert!(lines.iter().all(|line| line.chars().count() == 20));

        let wrapped = message_box("aaaa bbbb cccc", 12, 1);
        let body: Vec<&str> = wrapped.lines().skip(2).take(3).collect();
        assert_eq!(body, vec!["* aaaa     *", "* bbbb     *", "* cccc     *"]);
    }

    #[test]
    fn test_message_box_keeps_indentation() {
        let boxed = message_box("Section:\n  item", 20, 1);
        let lines: Vec<&str> = boxed.lines().collect();
        assert_eq!(lines[2], "* Section:         *");
        assert_eq!(lines[3], "*   item           *");
    }

    #[test]
    fn test_message_box_keeps_blank_paragraphs() {
        let boxed = message_box("one\n\ntwo", 15, 1);
        assert_eq!(boxed.lines().count(), 7);
    }
}
