//! Graph algorithms behind the pipeline stages

pub mod dagify;
pub mod partition;
pub mod superbubble;
pub mod tarjan;

pub use dagify::dagify;
pub use partition::partition;
pub use superbubble::{detect, DagBubbles, SbAlgorithm, SuperBubble};
pub use tarjan::{find_sccs, SccForest};
