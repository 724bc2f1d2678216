pub mod db;
pub mod notify;
pub mod storage;

pub use db::DbAdapter;
pub use notify::TracingNotifier;
pub use storage::FsFileStore;
