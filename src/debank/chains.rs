//! DeBank chain constants.
//!
//! Contains the default chain allow-list and the chains that support
//! transaction pre-execution.

// ============================================================================
// Chain Allow-List
// ============================================================================

/// DeBank chain identifiers accepted when no allow-list is configured.
pub const DEFAULT_SUPPORTED_CHAINS: &[&str] = &[
    "eth", "bsc", "xdai", "matic", "ftm", "okt", "heco", "avax", "op", "arb", "celo", "movr",
    "cro", "boba", "metis", "btt", "aurora", "mobm", "sbch", "fuse", "hmy", "klay", "astar",
    "sdn", "palm", "iotx", "rsk", "wan", "kcc", "sgb", "evmos", "dfk", "tlos", "swm", "nova",
    "canto", "doge", "step", "mada", "cfx", "brise", "ckb", "tomb", "pls", "ron", "era",
    "base", "linea", "mnt", "scrl", "blast", "zora", "manta", "mode", "taiko", "sonic",
    "bera", "abs", "uni", "ink", "hyper",
];

// ============================================================================
// Pre-Execution Support
// ============================================================================

/// Chains on which DeBank can pre-execute transactions, with their EVM chain IDs.
pub const PRE_EXEC_CHAINS: &[(&str, u64)] = &[
    ("eth", 1),
    ("op", 10),
    ("cro", 25),
    ("bsc", 56),
    ("xdai", 100),
    ("matic", 137),
    ("ftm", 250),
    ("boba", 288),
    ("sdn", 336),
    ("astar", 592),
    ("metis", 1088),
    ("mobm", 1284),
    ("movr", 1285),
    ("nova", 42170),
    ("avax", 43114),
    ("hmy", 1666600000),
];

/// Look up the EVM chain ID of a chain that supports pre-execution.
pub fn pre_exec_chain_id(chain: &str) -> Option<u64> {
    PRE_EXEC_CHAINS.iter().find(|(id, _)| *id == chain).map(|(_, evm_id)| *evm_id)
}

/// DeBank IDs of all chains that support pre-execution, sorted.
pub fn pre_exec_chain_names() -> Vec<&'static str> {
    let mut names: Vec<_> = PRE_EXEC_CHAINS.iter().map(|(id, _)| *id).collect();
    names.sort_unstable();
    names
}
