//! Static interface and method tables.
//!
//! Tables are ordered slices; order matters for help and completion output
//! only. Lookup is by exact name.

use std::collections::HashMap;

use crate::error::HandlerResult;
use crate::session::Session;

/// Executes a method. `args` holds every token of the line, including the
/// interface and method names.
pub type Handler = fn(&Registry, &mut Session, &[&str]) -> HandlerResult;

/// Enumerates argument candidates for a command.
pub type Completer = fn(&Registry) -> Vec<&'static str>;

/// A named operation bound to a handler.
#[derive(Clone, Copy)]
pub struct Method {
    pub name: &'static str,
    pub handler: Handler,
    pub complete: Option<Completer>,
    pub help: Option<&'static str>,
}

impl Method {
    pub const fn new(name: &'static str, handler: Handler) -> Self {
        Self {
            name,
            handler,
            complete: None,
            help: None,
        }
    }

    pub const fn help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }

    pub const fn complete(mut self, complete: Completer) -> Self {
        self.complete = Some(complete);
        self
    }
}

impl std::fmt::Debug for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Method")
            .field("name", &self.name)
            .field("help", &self.help)
            .finish_non_exhaustive()
    }
}

/// Ordered, bounded method table.
pub type MethodTable = &'static [Method];

/// First method named `name`, scanning in table order.
///
/// The empty name never matches.
pub fn find_method<'t>(table: &'t [Method], name: &str) -> Option<&'t Method> {
    if name.is_empty() {
        return None;
    }
    table.iter().find(|method| method.name == name)
}

/// Operator-facing group of methods.
#[derive(Debug)]
pub struct Interface {
    pub name: &'static str,
    pub methods: MethodTable,
}

impl Interface {
    pub fn find_method(&self, name: &str) -> Option<&'static Method> {
        find_method(self.methods, name)
    }
}

/// Every interface plus the interface-less command table.
#[derive(Debug)]
pub struct Registry {
    interfaces: &'static [Interface],
    index: HashMap<&'static str, usize>,
    commands: MethodTable,
}

impl Registry {
    /// Build the registry and its name index.
    ///
    /// When two interfaces share a name the first one wins.
    pub fn new(interfaces: &'static [Interface], commands: MethodTable) -> Self {
        let mut index = HashMap::with_capacity(interfaces.len());
        for (position, interface) in interfaces.iter().enumerate() {
            debug_assert!(!interface.name.is_empty());
            debug_assert!(interface.methods.iter().all(|m| !m.name.is_empty()));
            index.entry(interface.name).or_insert(position);
        }
        debug_assert!(commands.iter().all(|m| !m.name.is_empty()));

        Self {
            interfaces,
            index,
            commands,
        }
    }

    /// Registry with the built-in commands and every bundled interface.
    pub fn standard() -> Self {
        Self::new(crate::interfaces::ALL, crate::builtins::COMMANDS)
    }

    pub fn find_interface(&self, name: &str) -> Option<&'static Interface> {
        let interfaces = self.interfaces;
        self.index.get(name).map(|&position| &interfaces[position])
    }

    pub fn find_command(&self, name: &str) -> Option<&'static Method> {
        find_method(self.commands, name)
    }

    /// Interfaces in display order.
    pub fn interfaces(&self) -> &'static [Interface] {
        self.interfaces
    }

    /// Commands in display order.
    pub fn commands(&self) -> MethodTable {
        self.commands
    }

    pub fn interface_names(&self) -> Vec<&'static str> {
        self.interfaces.iter().map(|i| i.name).collect()
    }
}
