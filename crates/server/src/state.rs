use std::sync::Arc;

use orpheum_core::{
    Authenticator, Cache, CollageManager, Config, Database, ForumManager, NotifyHandle,
    SanitizedConfig, Sandbox, SiteLog, ThreadCreator, TorrentGroupManager, UserManager,
};

/// Shared application state
pub struct AppState {
    config: Config,
    authenticator: Arc<dyn Authenticator>,
    users: UserManager,
    collages: CollageManager,
    forums: ForumManager,
    threads: ThreadCreator,
    groups: TorrentGroupManager,
    sandbox: Sandbox,
    site_log: SiteLog,
}

impl AppState {
    pub fn new(
        config: Config,
        authenticator: Arc<dyn Authenticator>,
        db: Database,
        cache: Arc<dyn Cache>,
        notify: NotifyHandle,
    ) -> Self {
        let threads = ThreadCreator::new(db.clone(), notify, &config.site, &config.irc);
        Self {
            authenticator,
            users: UserManager::new(db.clone()),
            collages: CollageManager::new(db.clone(), cache),
            forums: ForumManager::new(db.clone()),
            threads,
            groups: TorrentGroupManager::new(db.clone()),
            sandbox: Sandbox::new(db.clone()),
            site_log: SiteLog::new(db),
            config,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn users(&self) -> &UserManager {
        &self.users
    }

    pub fn collages(&self) -> &CollageManager {
        &self.collages
    }

    pub fn forums(&self) -> &ForumManager {
        &self.forums
    }

    pub fn threads(&self) -> &ThreadCreator {
        &self.threads
    }

    pub fn groups(&self) -> &TorrentGroupManager {
        &self.groups
    }

    pub fn sandbox(&self) -> &Sandbox {
        &self.sandbox
    }

    pub fn site_log(&self) -> &SiteLog {
        &self.site_log
    }
}
