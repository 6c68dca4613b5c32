pub mod artifacts;
pub mod auto_merge;
pub mod fixup;
pub mod label;
pub mod specification;

pub use artifacts::ArtifactsCheck;
pub use auto_merge::{AutoMergeAction, AutoMergeHandler, RejectReason};
pub use fixup::FixupCheck;
pub use label::LabelCheck;
pub use specification::SpecificationCheck;
