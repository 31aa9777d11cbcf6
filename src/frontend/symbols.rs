use std::{collections::HashMap, fmt::Display};

use crate::Segment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageClass {
    Static,
    Field,
    Argument,
    Local,
}

impl StorageClass {
    pub const ALL: [StorageClass; 4] = [
        StorageClass::Static,
        StorageClass::Field,
        StorageClass::Argument,
        StorageClass::Local,
    ];

    pub fn segment(&self) -> Segment {
        match self {
            StorageClass::Static => Segment::Static,
            StorageClass::Field => Segment::This,
            StorageClass::Argument => Segment::Argument,
            StorageClass::Local => Segment::Local,
        }
    }

    pub fn is_class_level(&self) -> bool {
        matches!(self, StorageClass::Static | StorageClass::Field)
    }

    fn slot(&self) -> usize {
        match self {
            StorageClass::Static => 0,
            StorageClass::Field => 1,
            StorageClass::Argument => 2,
            StorageClass::Local => 3,
        }
    }
}

impl Display for StorageClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            StorageClass::Static => "static",
            StorageClass::Field => "field",
            StorageClass::Argument => "argument",
            StorageClass::Local => "local",
        };
        write!(f, "{text}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub type_name: String,
    pub kind: StorageClass,
    pub index: usize,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SymbolError {
    #[error("'{name}' is already defined as {kind} in this scope")]
    Duplicate { name: String, kind: StorageClass },
    #[error("{kind} slots are not contiguous: expected {expected} entries, found indices {found:?}")]
    Layout {
        kind: StorageClass,
        expected: usize,
        found: Vec<usize>,
    },
}

/// Class scope (static, field) and subroutine scope (argument, local).
#[derive(Default)]
pub struct SymbolTable {
    class_scope: HashMap<String, Symbol>,
    subroutine_scope: HashMap<String, Symbol>,
    counts: [usize; 4],
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_subroutine(&mut self) {
        self.subroutine_scope.clear();
        self.counts[StorageClass::Argument.slot()] = 0;
        self.counts[StorageClass::Local.slot()] = 0;
    }

    /// Defines `name` in the scope owning `kind` and returns its slot index.
    /// A name already present in that scope is rejected and the first
    /// definition stays in place.
    pub fn define(
        &mut self,
        name: &str,
        type_name: &str,
        kind: StorageClass,
    ) -> Result<usize, SymbolError> {
        let scope = if kind.is_class_level() {
            &mut self.class_scope
        } else {
            &mut self.subroutine_scope
        };
        if let Some(existing) = scope.get(name) {
            return Err(SymbolError::Duplicate {
                name: name.to_string(),
                kind: existing.kind,
            });
        }
        let index = self.counts[kind.slot()];
        let symbol = Symbol {
            type_name: type_name.to_string(),
            kind,
            index,
        };
        scope.insert(name.to_string(), symbol);
        self.counts[kind.slot()] += 1;
        Ok(index)
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.subroutine_scope
            .get(name)
            .or_else(|| self.class_scope.get(name))
    }

    pub fn kind_of(&self, name: &str) -> Option<StorageClass> {
        self.lookup(name).map(|s| s.kind)
    }

    pub fn type_of(&self, name: &str) -> Option<&str> {
        self.lookup(name).map(|s| s.type_name.as_str())
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.lookup(name).map(|s| s.index)
    }

    pub fn count(&self, kind: StorageClass) -> usize {
        self.counts[kind.slot()]
    }

    /// Checks that every storage class occupies exactly the slots `0..count`.
    pub fn verify_layout(&self) -> Result<(), SymbolError> {
        for kind in StorageClass::ALL {
            let scope = if kind.is_class_level() {
                &self.class_scope
            } else {
                &self.subroutine_scope
            };
            let mut found = scope
                .values()
                .filter(|s| s.kind == kind)
                .map(|s| s.index)
                .collect::<Vec<_>>();
            found.sort_unstable();
            let expected = self.count(kind);
            let contiguous =
                found.len() == expected && found.iter().enumerate().all(|(i, &x)| i == x);
            if !contiguous {
                return Err(SymbolError::Layout {
                    kind,
                    expected,
                    found,
                });
            }
        }
        Ok(())
    }
}
