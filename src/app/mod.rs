// Application layer - Use case interactors

pub mod artifacts;
pub mod clip_interactor;
pub mod container;
pub mod media_interactor;
pub mod workspace;

// Re-export interactors
pub use artifacts::{ArtifactRegistry, StoredArtifact};
pub use clip_interactor::{ClipInteractor, ClipSettings};
pub use container::{AppContainer, DefaultAppContainer};
pub use media_interactor::MediaInteractor;
pub use workspace::{PublishedArtifact, RunWorkspace};
