/// Configuration for compiled graph functions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmConfig {
    /// Maximum nesting of graph function calls, `recur` included. Default: 256.
    ///
    /// Each nested call uses native stack, so the limit also caps terminating
    /// recursion: the default rejects `sum(300)`. Raise it only together with
    /// the stack size of the calling thread.
    pub max_call_depth: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        VmConfig { max_call_depth: 256 }
    }
}
