//! Configuration source identity and precedence ordering.

use std::path::PathBuf;

/// One layer in the 8-tier precedence chain, ordered lowest to highest.
/// `Ord` on this type *is* the precedence order: a higher-ranked kind wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SourceKind {
    Default,
    Builtin,
    User,
    ProjectExternal,
    Dropin,
    ProjectInline,
    Local,
    Worktree,
}

#[derive(Debug, Clone)]
pub struct ConfigSource {
    pub kind: SourceKind,
    pub path: Option<PathBuf>,
    pub exists: bool,
}
