//! レジストリカタログクライアント
//!
//! レジストリHTTP API v2でプライベートレジストリのリポジトリとタグを一覧する。
//! サーバーが `link` ヘッダーを返さなくなるまでページングをたどる。

pub mod client;
pub mod cursor;
pub mod error;

pub use client::RegistryClient;
pub use cursor::PaginationCursor;
pub use error::{RegistryError, Result};
