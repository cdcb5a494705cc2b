//! Repository traits, one per concern.

pub mod access_tokens;
pub mod bookmarks;
pub mod engagement;
pub mod profiles;
pub mod sessions;

pub use access_tokens::AccessTokenRepo;
pub use bookmarks::BookmarkRepo;
pub use engagement::{EngagementRepo, LikeToggle};
pub use profiles::ProfileRepo;
pub use sessions::SessionRepo;
