// cvar.rs — dynamic variable tracking
//
// Console variables are the configuration surface of the client: every
// tunable (cl_hightrack, cl_chasecam, m_accel_*) is a named string with a
// cached float value. The context is owned by the client session.

use crate::common::{com_dprintf, com_printf};
use crate::q_shared::CVAR_NOSET;

use std::collections::HashMap;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CvarError {
    #[error("{0} is write protected.")]
    WriteProtected(String),
}

/// A console variable.
#[derive(Debug, Clone)]
pub struct Cvar {
    pub name: String,
    pub string: String,
    pub default_string: String,
    pub flags: i32,
    pub modified: bool,
    pub value: f32,
}

impl Cvar {
    pub fn integer(&self) -> i32 {
        self.value as i32
    }
}

/// The full cvar system context.
#[derive(Default)]
pub struct CvarContext {
    pub cvar_vars: Vec<Cvar>,
    /// O(1) cvar lookup by name -> index in cvar_vars
    cvar_index: HashMap<String, usize>,
}

fn parse_value(s: &str) -> f32 {
    s.trim().parse::<f32>().unwrap_or(0.0)
}

impl CvarContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find a cvar by name, returning its index.
    pub fn find_var_index(&self, name: &str) -> Option<usize> {
        self.cvar_index.get(name).copied()
    }

    pub fn find_var(&self, name: &str) -> Option<&Cvar> {
        self.cvar_index.get(name).map(|&idx| &self.cvar_vars[idx])
    }

    /// Get the floating-point value of a cvar. Returns 0 if not found.
    pub fn variable_value(&self, name: &str) -> f32 {
        self.find_var(name).map_or(0.0, |v| v.value)
    }

    /// Integer view of a cvar, truncating like the engine does.
    pub fn variable_integer(&self, name: &str) -> i32 {
        self.variable_value(name) as i32
    }

    /// Get the string value of a cvar. Returns "" if not found.
    pub fn variable_string(&self, name: &str) -> &str {
        self.find_var(name).map_or("", |v| v.string.as_str())
    }

    /// Get or create a cvar. If it already exists, the value is not changed
    /// but flags are OR'd in.
    pub fn get(&mut self, name: &str, value: &str, flags: i32) -> Result<usize, CvarError> {
        if let Some(&idx) = self.cvar_index.get(name) {
            self.cvar_vars[idx].flags |= flags;
            return Ok(idx);
        }

        let idx = self.cvar_vars.len();
        self.cvar_vars.push(Cvar {
            name: name.to_string(),
            string: value.to_string(),
            default_string: value.to_string(),
            flags,
            modified: true,
            value: parse_value(value),
        });
        self.cvar_index.insert(name.to_string(), idx);

        Ok(idx)
    }

    /// Set a cvar value, creating it when unknown. NOSET cvars refuse.
    pub fn set(&mut self, name: &str, value: &str) -> Result<usize, CvarError> {
        let idx = match self.find_var_index(name) {
            Some(idx) => idx,
            None => return self.get(name, value, 0),
        };

        let var = &mut self.cvar_vars[idx];
        if var.flags & CVAR_NOSET != 0 {
            return Err(CvarError::WriteProtected(var.name.clone()));
        }

        if value == var.string {
            return Ok(idx); // not changed
        }

        var.modified = true;
        var.string = value.to_string();
        var.value = parse_value(value);
        com_dprintf(&format!("cvar {} = \"{}\"\n", var.name, var.string));

        Ok(idx)
    }

    /// Returns and clears the modified bit.
    pub fn take_modified(&mut self, name: &str) -> bool {
        match self.find_var_index(name) {
            Some(idx) => std::mem::replace(&mut self.cvar_vars[idx].modified, false),
            None => false,
        }
    }

    /// Handle variable inspection/changing from the console.
    /// Returns true if the command was a cvar reference.
    pub fn command(&mut self, argv: &[&str]) -> bool {
        let Some(&name) = argv.first() else {
            return false;
        };
        let Some(idx) = self.find_var_index(name) else {
            return false;
        };

        if argv.len() == 1 {
            let var = &self.cvar_vars[idx];
            com_printf(&format!(
                "\"{}\" is \"{}\" default: \"{}\"\n",
                var.name, var.string, var.default_string
            ));
            return true;
        }

        let name = self.cvar_vars[idx].name.clone();
        if let Err(e) = self.set(&name, argv[1]) {
            com_printf(&format!("{}\n", e));
        }
        true
    }

    /// Console command handler for "set <variable> <value>".
    pub fn set_f(&mut self, argv: &[&str]) {
        if argv.len() != 2 {
            com_printf("usage: set <variable> <value>\n");
            return;
        }
        if let Err(e) = self.set(argv[0], argv[1]) {
            com_printf(&format!("{}\n", e));
        }
    }

    /// List cvars whose name starts with `prefix`.
    pub fn list(&self, prefix: Option<&str>) -> (usize, usize) {
        let prefix = prefix.unwrap_or("");
        let mut matching = 0;

        for var in &self.cvar_vars {
            if var.name.starts_with(prefix) {
                matching += 1;
                let noset = if var.flags & CVAR_NOSET != 0 { '-' } else { ' ' };
                com_printf(&format!("{} {} \"{}\"\n", noset, var.name, var.string));
            }
        }

        com_printf(&format!("{} cvars, {} matching\n", self.cvar_vars.len(), matching));
        (self.cvar_vars.len(), matching)
    }
}

// ============================================================
// Tests
// ============================================================
