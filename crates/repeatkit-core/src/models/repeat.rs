use std::fmt;

use serde::{Deserialize, Serialize};

/// Per-event repeat behavior of a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatClass {
    /// At most once per record in the event; no instance dimension.
    Singleton,
    /// The form repeats on its own within the event.
    RepeatingInstrument,
    /// The whole event repeats and carries the form along.
    RepeatingEvent,
}

impl RepeatClass {
    /// Both repeating variants share the instance-keyed data shape.
    pub fn is_repeating(self) -> bool {
        match self {
            RepeatClass::Singleton => false,
            RepeatClass::RepeatingInstrument | RepeatClass::RepeatingEvent => true,
        }
    }
}

impl fmt::Display for RepeatClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RepeatClass::Singleton => "singleton",
            RepeatClass::RepeatingInstrument => "repeating instrument",
            RepeatClass::RepeatingEvent => "repeating event",
        };
        f.write_str(label)
    }
}
