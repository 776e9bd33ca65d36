pub mod auth;
pub mod cache;
pub mod collage;
pub mod config;
pub mod db;
pub mod forum;
pub mod label;
pub mod metrics;
pub mod notify;
pub mod query;
pub mod sandbox;
pub mod site_log;
pub mod testing;
pub mod tgroup;
pub mod user;

pub use auth::{
    create_authenticator, ApiKeyAuthenticator, AuthError, AuthRequest, Authenticator, Identity,
    NoneAuthenticator,
};
pub use cache::{Cache, MemoryCache};
pub use collage::{
    AutocompleteEntry, Collage, CollageCategory, CollageError, CollageManager, CollageName,
    CollageRef, NewCollage, SubscribedCollage,
};
pub use config::{
    load_config, load_config_from_str, validate_config, AuthConfig, AuthMethod, Config,
    ConfigError, DatabaseConfig, IrcConfig, SanitizedConfig, ServerConfig, SiteConfig,
};
pub use db::{Database, StoreError};
pub use forum::{
    CreatedThread, Forum, ForumError, ForumManager, NewThread, Poll, Thread, ThreadCreator,
};
pub use label::{LeechType, TorrentAttributes, TorrentLabel};
pub use notify::{create_relay_system, NotifyHandle, RelayWriter};
pub use query::{Filter, Membership, Predicate};
pub use sandbox::{QueryResult, Sandbox, SandboxError, SandboxInput, SandboxOutcome};
pub use site_log::{SiteLog, SiteLogEntry};
pub use tgroup::{
    ArtistRef, GroupDetails, Torrent, TorrentGroup, TorrentGroupError, TorrentGroupManager,
};
pub use user::{UserManager, Viewer};
