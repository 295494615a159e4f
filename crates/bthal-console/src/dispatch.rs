//! Line resolution: interface method, interface listing, or command.

use std::io::Write;

use tracing::{debug, warn};

use crate::builtins::print_interface;
use crate::complete::Candidates;
use crate::error::{DispatchError, HandlerError, Result};
use crate::registry::Registry;
use crate::session::Session;

/// Split a line on runs of spaces, tabs, CR and LF.
pub fn tokenize(line: &str) -> Vec<&str> {
    line.split([' ', '\t', '\r', '\n'])
        .filter(|token| !token.is_empty())
        .collect()
}

/// What the console loop does after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Resolves console lines against a [`Registry`].
#[derive(Debug)]
pub struct Dispatcher {
    registry: Registry,
}

impl Dispatcher {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    pub fn standard() -> Self {
        Self::new(Registry::standard())
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Resolve and run one line.
    pub fn dispatch(&self, session: &mut Session, line: &str) -> Result<Flow> {
        let args = tokenize(line);
        let Some(&first) = args.first() else {
            return Ok(Flow::Continue);
        };

        let method = match self.registry.find_interface(first) {
            Some(interface) => match args.get(1) {
                None | Some(&"?") => {
                    print_interface(session.out(), interface).map_err(HandlerError::from)?;
                    return Ok(Flow::Continue);
                }
                Some(name) => {
                    interface
                        .find_method(name)
                        .ok_or_else(|| DispatchError::NoSuchMethod {
                            interface: first.to_string(),
                            method: name.to_string(),
                        })?
                }
            },
            None => self
                .registry
                .find_command(first)
                .ok_or_else(|| DispatchError::NoSuchCommand(first.to_string()))?,
        };

        debug!(line = %args.join(" "), "dispatching");
        (method.handler)(&self.registry, session, &args)?;

        if session.quit_requested() {
            Ok(Flow::Quit)
        } else {
            Ok(Flow::Continue)
        }
    }

    /// Run one line and print any diagnostic, then queued events.
    ///
    /// Errors never end the session; only `quit` and `exit` do.
    pub fn process_line(&self, session: &mut Session, line: &str) -> Flow {
        let flow = match self.dispatch(session, line) {
            Ok(flow) => flow,
            Err(err) => {
                if let DispatchError::Handler(handler_err) = &err {
                    if handler_err.is_connection_lost() {
                        warn!(error = %handler_err, "HAL connection lost");
                        session.disconnect();
                    }
                }
                if let Err(io) = writeln!(session.out(), "{err}") {
                    warn!(error = %io, "failed to print diagnostic");
                }
                Flow::Continue
            }
        };
        if let Err(io) = session.print_events() {
            warn!(error = %io, "failed to print events");
        }
        flow
    }

    /// Candidates for the last token of `line`, which ends at the cursor.
    ///
    /// Token 0 completes to commands then interfaces. Token 1 completes to
    /// the interface's methods or the command's own candidates. Nothing is
    /// offered further right.
    pub fn complete(&self, line: &str) -> Candidates {
        let tokens = tokenize(line);
        let at_boundary = line.is_empty() || line.ends_with([' ', '\t', '\r', '\n']);
        let (position, prefix) = if at_boundary {
            (tokens.len(), "")
        } else {
            (tokens.len() - 1, tokens[tokens.len() - 1])
        };

        match position {
            0 => {
                let mut names: Vec<&'static str> =
                    self.registry.commands().iter().map(|m| m.name).collect();
                names.extend(self.registry.interface_names());
                Candidates::new(names, prefix)
            }
            1 => {
                let first = tokens[0];
                if let Some(interface) = self.registry.find_interface(first) {
                    let names = interface.methods.iter().map(|m| m.name).collect();
                    Candidates::new(names, prefix)
                } else if let Some(complete) =
                    self.registry.find_command(first).and_then(|m| m.complete)
                {
                    Candidates::new(complete(&self.registry), prefix)
                } else {
                    Candidates::empty()
                }
            }
            _ => Candidates::empty(),
        }
    }
}
