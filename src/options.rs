//! Compiler options consumed by the down-leveler.

use serde::{Deserialize, Serialize};

/// Target language level. `ES2015` disables the ES6 transform entirely;
/// lower targets enable it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ScriptTarget {
    ES3,
    ES5,
    ES2015,
}

impl Default for ScriptTarget {
    fn default() -> Self {
        ScriptTarget::ES5
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct CompilerOptions {
    pub target: ScriptTarget,
}

impl CompilerOptions {
    pub fn es5() -> CompilerOptions {
        CompilerOptions {
            target: ScriptTarget::ES5,
        }
    }
}
