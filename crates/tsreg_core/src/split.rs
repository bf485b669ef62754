//! Data split tags for train/validation/test streams.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The role a window stream plays during fitting.
///
/// Loaders carry a split so warnings and logs name the stream.
///
/// ```rust
/// use tsreg_core::Split;
///
/// assert_eq!(Split::Valid.to_string(), "valid");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Split {
    /// Training split.
    #[default]
    Train,
    /// Validation split, monitored for early stopping.
    Valid,
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Split::Train => "train",
            Split::Valid => "valid",
        };
        f.write_str(name)
    }
}
