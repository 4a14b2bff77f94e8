use std::io;
use std::path::PathBuf;

/// A type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// The ways a Motion Tree run can fail.
///
/// Errors are tagged values surfaced at API boundaries; nothing in this crate
/// uses panics for control flow. `NoCandidatePair` is special in that partial
/// results are retained: the engine reports it through
/// [`Termination`](crate::Termination) so that callers can still consume the
/// dendrogram rows and effective nodes emitted before the stall, and this
/// variant exists for shells that want to turn the condition into a hard
/// failure afterwards.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required structure file is absent.
    #[error("structure file not found: {path}")]
    InputMissing {
        /// The path that was probed.
        path: PathBuf,
    },
    /// The requested chain identifier does not occur in the structure.
    #[error("chain '{chain}' does not exist in {structure}")]
    ChainNotFound {
        /// Name of the structure that was searched.
        structure: String,
        /// The chain identifier that was requested.
        chain: char,
    },
    /// A selected residue has no α-carbon to represent its position.
    #[error("residue {name} {seq_num} lacks an α-carbon")]
    MissingBackbone {
        /// Three-letter residue name.
        name: String,
        /// Residue number within its chain.
        seq_num: i32,
    },
    /// The two sequences are too dissimilar to be conformations of the same
    /// protein.
    #[error("sequence identity {identity:.2} is below the threshold {threshold:.2}")]
    SeqIdentityLow {
        /// Fraction of matched positions in the shorter sequence.
        identity: f64,
        /// The configured minimum.
        threshold: f64,
    },
    /// Advisory: the whole-chain RMSD is so small that the motion is likely
    /// noise. Never raised by the engine itself; shells may surface it as a
    /// warning.
    #[error("whole-chain rmsd {rmsd:.2} Å is below {threshold:.1} Å; little motion to explain")]
    LowMotion {
        /// RMSD after superposing the two chains.
        rmsd: f64,
        /// The advisory cut-off.
        threshold: f64,
    },
    /// Clustering stalled: every remaining cluster pair fails the spatial
    /// proximity measure in at least one conformation.
    #[error("no spatially adjacent cluster pair left after {merges} merges")]
    NoCandidatePair {
        /// Number of merges completed before the stall.
        merges: usize,
    },
    /// A parameter lies outside its documented bounds.
    #[error("parameter {name} = {value} is outside {min}..={max}")]
    ParamOutOfRange {
        /// Parameter name as written in the parameter file.
        name: &'static str,
        /// The offending value.
        value: f64,
        /// Lower bound, inclusive.
        min: f64,
        /// Upper bound, inclusive.
        max: f64,
    },
    /// The two conformations' distance matrices disagree in order, so they
    /// cannot describe the same aligned residue set.
    #[error("conformation matrices differ in order: {order_1} vs {order_2}")]
    DimensionMismatch {
        /// Order of conformation 1's matrix.
        order_1: usize,
        /// Order of conformation 2's matrix.
        order_2: usize,
    },
    /// The working matrix held a non-finite entry for an active pair. This
    /// indicates a bookkeeping bug and should be impossible.
    #[error("working matrix entry for active pair ({a}, {b}) is not finite")]
    InvariantViolation {
        /// Row cluster id.
        a: usize,
        /// Column cluster id.
        b: usize,
    },
    /// An output artefact could not be written.
    #[error("failed to write {path}")]
    Io {
        /// The artefact path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}
