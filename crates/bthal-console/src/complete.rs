//! Name completion.

/// Candidate names matching a prefix, in table order.
///
/// A fresh value from [`Dispatcher::complete`](crate::Dispatcher::complete)
/// starts from the beginning. A clone resumes where the original is.
#[derive(Debug, Clone, Default)]
pub struct Candidates {
    names: Vec<&'static str>,
    prefix: String,
    next: usize,
}

impl Candidates {
    pub fn new(names: Vec<&'static str>, prefix: &str) -> Self {
        Self {
            names,
            prefix: prefix.to_string(),
            next: 0,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// The partial token being completed.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Iterator for Candidates {
    type Item = &'static str;

    fn next(&mut self) -> Option<&'static str> {
        while let Some(name) = self.names.get(self.next) {
            self.next += 1;
            if name.starts_with(self.prefix.as_str()) {
                return Some(name);
            }
        }
        None
    }
}
