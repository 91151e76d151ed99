//! Common interface of the pose estimators.

use crate::error::Result;
use crate::spider::PartLists;

/// Iterative pose estimator driven by `init` / `update` / `estimate`.
///
/// Every call reports the current hypotheses in the same per-part layout
/// so callers never need to know which algorithm is running.
pub trait Estimator: Send {
    /// Short algorithm tag reported to clients (e.g. `"pf"`).
    fn name(&self) -> &'static str;

    /// Start over with `num_particles` hypotheses.
    ///
    /// With `informed`, hypotheses are drawn around annotated priors when
    /// available.
    fn init(&mut self, num_particles: usize, informed: bool) -> Result<PartLists>;

    /// Run one iteration and report all hypotheses.
    fn update(&mut self) -> Result<PartLists>;

    /// Report the single best hypothesis per part.
    fn estimate(&self) -> Result<PartLists>;
}
