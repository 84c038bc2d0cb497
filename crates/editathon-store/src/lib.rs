//! Page storage and user metadata behind small traits, with file-backed
//! implementations.

mod dir;
mod error;
mod users;

pub use dir::DirPageStore;
pub use error::StoreError;
pub use users::JsonUserDirectory;

use editathon_core::UserInfo;

/// Where wiki pages are read from and written to.
pub trait PageStore {
    /// Current text of `title`, or [`StoreError::PageNotFound`].
    fn read(&self, title: &str) -> Result<String, StoreError>;

    /// Replace the text of `title`, recording `summary` as the edit summary.
    fn write(&self, title: &str, text: &str, summary: &str) -> Result<(), StoreError>;

    /// Titles starting with `prefix`, sorted.
    fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}

/// Account metadata lookup.
pub trait UserDirectory {
    /// One record per requested name, in request order.
    fn lookup(&self, names: &[String]) -> Result<Vec<UserInfo>, StoreError>;
}
