//! Interactive input port for `make`
//!
//! The interpreter never talks to a terminal. It asks an [`InputSource`] for
//! a raw string and validates it itself.

use std::collections::VecDeque;

/// Supplies raw values for `make ( id );`
///
/// Programs run on their own thread, so sources must be `Send`.
pub trait InputSource: Send {
    /// Ask for a value for `name`. `None` means the user cancelled.
    fn read(&mut self, name: &str) -> Option<String>;
}

/// Replays a fixed list of answers, then cancels.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    answers: VecDeque<String>,
    /// Names requested so far, in order
    pub requests: Vec<String>,
}

impl ScriptedInput {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScriptedInput {
            answers: answers.into_iter().map(Into::into).collect(),
            requests: Vec::new(),
        }
    }

    /// An input source that cancels every request
    pub fn empty() -> Self {
        Self::default()
    }
}

impl InputSource for ScriptedInput {
    fn read(&mut self, name: &str) -> Option<String> {
        self.requests.push(name.to_string());
        self.answers.pop_front()
    }
}

impl<F> InputSource for F
where
    F: FnMut(&str) -> Option<String> + Send,
{
    fn read(&mut self, name: &str) -> Option<String> {
        self(name)
    }
}
