//! The registered transform set and the buffer it operates on.
//!
//! Lambdas in a layout description name transforms from a closed set; an
//! unknown name is a load-time error. A pipeline step is either a
//! string-to-string transform or a string-to-sequence transform, and the
//! [`Buffer`] tracks which shape the value currently has. Range delimiters
//! always fold a sequence back into a single string before applying.

/// A value flowing through a transform chain: one string or a sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Buffer {
    /// A single string.
    Text(String),
    /// An ordered sequence of strings (rows or whitespace tokens).
    Lines(Vec<String>),
}

impl Buffer {
    /// Folds the buffer into a single string, joining sequences with LF.
    pub fn fold(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Lines(lines) => lines.join("\n"),
        }
    }

    /// True when the buffer holds no non-whitespace characters.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::Lines(lines) => lines.iter().all(|line| line.trim().is_empty()),
        }
    }
}

/// A primitive string transform from the registered set.
///
/// The full closed set: `strip`, `upcase`, `downcase`, `split`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Trim surrounding whitespace (each element, for sequences).
    Strip,
    /// Uppercase (each element, for sequences).
    Upcase,
    /// Lowercase (each element, for sequences).
    Downcase,
    /// Tokenise on whitespace, producing (or flattening into) a sequence.
    Split,
}

impl Transform {
    /// Looks up a transform by its registered name.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "strip" => Some(Self::Strip),
            "upcase" => Some(Self::Upcase),
            "downcase" => Some(Self::Downcase),
            "split" => Some(Self::Split),
            _ => None,
        }
    }

    /// Applies the transform to a buffer.
    pub fn apply(self, buffer: Buffer) -> Buffer {
        match (self, buffer) {
            (Self::Strip, Buffer::Text(text)) => Buffer::Text(text.trim().to_string()),
            (Self::Strip, Buffer::Lines(lines)) => {
                Buffer::Lines(lines.iter().map(|line| line.trim().to_string()).collect())
            }
            (Self::Upcase, Buffer::Text(text)) => Buffer::Text(text.to_uppercase()),
            (Self::Upcase, Buffer::Lines(lines)) => {
                Buffer::Lines(lines.iter().map(|line| line.to_uppercase()).collect())
            }
            (Self::Downcase, Buffer::Text(text)) => Buffer::Text(text.to_lowercase()),
            (Self::Downcase, Buffer::Lines(lines)) => {
                Buffer::Lines(lines.iter().map(|line| line.to_lowercase()).collect())
            }
            (Self::Split, Buffer::Text(text)) => {
                Buffer::Lines(text.split_whitespace().map(str::to_string).collect())
            }
            (Self::Split, Buffer::Lines(lines)) => Buffer::Lines(
                lines
                    .iter()
                    .flat_map(|line| line.split_whitespace())
                    .map(str::to_string)
                    .collect(),
            ),
        }
    }
}

/// Applies a transform chain in declaration order.
pub fn apply_chain(transforms: &[Transform], buffer: Buffer) -> Buffer {
    transforms
        .iter()
        .fold(buffer, |buffer, transform| transform.apply(buffer))
}
