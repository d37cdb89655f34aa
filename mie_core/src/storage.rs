//! Substrate wrapper around the embedded CozoDB instance.
//!
//! One [`Substrate`] handle is shared per engine instance; CozoDB mediates
//! concurrent access and guarantees per-statement atomicity. Scripts are
//! CozoScript with string values escaped through [`escape_datalog`] before
//! inlining.

use cozo::{DataValue, DbInstance, NamedRows, Num, ScriptMutability};

use crate::error::{MemoryError, Result};

/// Handle to the embedded datalog store.
pub struct Substrate {
    db: DbInstance,
}

impl Substrate {
    /// Open (or create) a database with the given engine: `mem`, `sqlite`,
    /// or `rocksdb`. The path is ignored by the `mem` engine.
    pub fn open(engine: &str, path: &str) -> Result<Self> {
        let db = DbInstance::new(engine, path, Default::default()).map_err(|e| {
            MemoryError::substrate(format!("cannot open {engine} database at {path:?}: {e}"))
        })?;
        Ok(Self { db })
    }

    /// Run a read-only script and return the resulting rows.
    pub fn query(&self, script: &str) -> Result<NamedRows> {
        self.db
            .run_script(script, Default::default(), ScriptMutability::Immutable)
            .map_err(|e| MemoryError::substrate(format!("{e}")))
    }

    /// Run a mutating script, discarding the result rows.
    pub fn execute(&self, script: &str) -> Result<()> {
        self.db
            .run_script(script, Default::default(), ScriptMutability::Mutable)
            .map(|_| ())
            .map_err(|e| MemoryError::substrate(format!("{e}")))
    }

    /// Run an arbitrary script with full mutability. Used by the debugging CLI.
    pub fn run_raw(&self, script: &str) -> Result<NamedRows> {
        self.db
            .run_script(script, Default::default(), ScriptMutability::Mutable)
            .map_err(|e| MemoryError::substrate(format!("{e}")))
    }
}

/// Escape a string for inlining into a single-quoted CozoScript literal.
pub fn escape_datalog(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out
}

/// Quote a string as a CozoScript literal.
pub fn str_lit(s: &str) -> String {
    format!("'{}'", escape_datalog(s))
}

/// Format a float so it always parses back as a Float, never an Int.
pub fn float_lit(v: f64) -> String {
    format!("{v:?}")
}

/// Format an embedding vector as a CozoScript list literal.
pub fn vector_lit(v: &[f32]) -> String {
    let mut out = String::with_capacity(v.len() * 10 + 2);
    out.push('[');
    for (i, x) in v.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&format!("{x:?}"));
    }
    out.push(']');
    out
}

// --- Row value conversions ---

pub fn value_str(v: &DataValue) -> String {
    match v {
        DataValue::Str(s) => s.to_string(),
        DataValue::Null => String::new(),
        other => format!("{other:?}"),
    }
}

pub fn value_i64(v: &DataValue) -> i64 {
    match v {
        DataValue::Num(Num::Int(i)) => *i,
        DataValue::Num(Num::Float(f)) => *f as i64,
        _ => 0,
    }
}

pub fn value_f64(v: &DataValue) -> f64 {
    match v {
        DataValue::Num(Num::Float(f)) => *f,
        DataValue::Num(Num::Int(i)) => *i as f64,
        _ => 0.0,
    }
}

pub fn value_bool(v: &DataValue) -> bool {
    matches!(v, DataValue::Bool(true))
}

pub fn value_usize(v: &DataValue) -> usize {
    value_i64(v).max(0) as usize
}
