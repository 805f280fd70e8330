pub mod db;
pub mod media;

pub use db::DbAdapter;
pub use media::HostedMediaAdapter;
