//! Per-tenant pool registry: one bounded SQLite pool per tenant database file, with LRU and idle eviction.

use crate::catalog::SchemaCatalog;
use crate::config::{PoolSettings, TenantId};
use crate::error::AppError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::SqliteConnection;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

/// Pool and cached schema catalog for one tenant. Cheap to clone.
#[derive(Clone)]
pub struct TenantHandle {
    pub tenant: TenantId,
    pub pool: SqlitePool,
    catalog: Arc<RwLock<Option<Arc<SchemaCatalog>>>>,
}

impl TenantHandle {
    /// Cached catalog, loading it through `conn` when absent or when `refresh` is set.
    pub async fn catalog(
        &self,
        conn: &mut SqliteConnection,
        refresh: bool,
    ) -> Result<Arc<SchemaCatalog>, sqlx::Error> {
        if !refresh {
            let cached = self
                .catalog
                .read()
                .unwrap_or_else(|e| e.into_inner())
                .clone();
            if let Some(c) = cached {
                return Ok(c);
            }
        }
        let loaded = Arc::new(SchemaCatalog::load(conn).await?);
        *self.catalog.write().unwrap_or_else(|e| e.into_inner()) = Some(loaded.clone());
        Ok(loaded)
    }
}

struct TenantEntry {
    handle: TenantHandle,
    last_used: Instant,
}

pub struct TenantPools {
    data_dir: PathBuf,
    settings: PoolSettings,
    entries: Mutex<HashMap<TenantId, TenantEntry>>,
}

impl TenantPools {
    pub fn new(data_dir: impl Into<PathBuf>, settings: PoolSettings) -> Self {
        TenantPools {
            data_dir: data_dir.into(),
            settings,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn idle_timeout(&self) -> Duration {
        self.settings.idle_timeout
    }

    /// Number of open tenant pools.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<TenantId, TenantEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Canonical path of the tenant's database file. The file must already exist.
    pub async fn resolve_path(&self, tenant: &TenantId) -> Result<PathBuf, AppError> {
        if !tenant.is_file_safe() {
            return Err(AppError::Tenant(format!("invalid tenant id '{}'", tenant)));
        }
        let candidate = self.data_dir.join(format!("{}.db", tenant));
        tokio::fs::canonicalize(&candidate).await.map_err(|e| {
            AppError::Tenant(format!(
                "database for tenant {} not available at {}: {}",
                tenant,
                candidate.display(),
                e
            ))
        })
    }

    /// Pool for `tenant`, opening one if needed. Opening never creates the database file.
    pub async fn get(&self, tenant: &TenantId) -> Result<TenantHandle, AppError> {
        let open = {
            let mut entries = self.lock();
            entries.get_mut(tenant).map(|entry| {
                entry.last_used = Instant::now();
                entry.handle.clone()
            })
        };
        if let Some(handle) = open {
            return Ok(handle);
        }

        let path = self.resolve_path(tenant).await?;
        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(false)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(self.settings.max_connections)
            .min_connections(0)
            .idle_timeout(Some(self.settings.idle_timeout))
            .connect_lazy_with(options);

        let mut entries = self.lock();
        if let Some(entry) = entries.get_mut(tenant) {
            // another request opened it while we resolved the path; ours has no connections yet
            entry.last_used = Instant::now();
            return Ok(entry.handle.clone());
        }
        if entries.len() >= self.settings.max_tenants {
            let lru = entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(id, _)| id.clone());
            if let Some(id) = lru {
                if let Some(evicted) = entries.remove(&id) {
                    tracing::info!(tenant = %id, "tenant pool limit reached, closing least recently used pool");
                    close_in_background(evicted.handle.pool);
                }
            }
        }
        let handle = TenantHandle {
            tenant: tenant.clone(),
            pool,
            catalog: Arc::new(RwLock::new(None)),
        };
        entries.insert(
            tenant.clone(),
            TenantEntry {
                handle: handle.clone(),
                last_used: Instant::now(),
            },
        );
        tracing::debug!(tenant = %tenant, path = %path.display(), "opened tenant pool");
        Ok(handle)
    }

    /// Close pools unused for longer than the idle timeout. Returns how many were closed.
    pub fn evict_idle(&self) -> usize {
        let idle = self.settings.idle_timeout;
        let mut entries = self.lock();
        let stale: Vec<TenantId> = entries
            .iter()
            .filter(|(_, e)| e.last_used.elapsed() >= idle)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &stale {
            if let Some(entry) = entries.remove(id) {
                tracing::debug!(tenant = %id, "closing idle tenant pool");
                close_in_background(entry.handle.pool);
            }
        }
        stale.len()
    }
}

fn close_in_background(pool: SqlitePool) {
    tokio::spawn(async move { pool.close().await });
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn touch_db(dir: &Path, name: &str) {
        let path = dir.join(format!("{}.db", name));
        let opts = SqliteConnectOptions::new().filename(&path).create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(opts).await.unwrap();
        pool.close().await;
    }

    fn settings(max_tenants: usize, idle: Duration) -> PoolSettings {
        PoolSettings {
            max_connections: 2,
            max_tenants,
            idle_timeout: idle,
        }
    }

    #[tokio::test]
    async fn rejects_unsafe_and_missing_tenants() {
        let dir = tempfile::tempdir().unwrap();
        let pools = TenantPools::new(dir.path(), PoolSettings::default());
        assert!(matches!(
            pools.get(&TenantId::from("../x")).await,
            Err(AppError::Tenant(_))
        ));
        assert!(matches!(pools.get(&TenantId::from(9)).await, Err(AppError::Tenant(_))));
        assert!(pools.is_empty());
        assert!(!dir.path().join("9.db").exists());
    }

    #[tokio::test]
    async fn reuses_pool_per_tenant() {
        let dir = tempfile::tempdir().unwrap();
        touch_db(dir.path(), "1").await;
        let pools = TenantPools::new(dir.path(), PoolSettings::default());
        let a = pools.get(&TenantId::from(1)).await.unwrap();
        let b = pools.get(&TenantId::from(1)).await.unwrap();
        assert!(Arc::ptr_eq(&a.catalog, &b.catalog));
        assert_eq!(pools.len(), 1);
    }

    #[tokio::test]
    async fn evicts_least_recently_used_when_full() {
        let dir = tempfile::tempdir().unwrap();
        for t in ["a", "b", "c"] {
            touch_db(dir.path(), t).await;
        }
        let pools = TenantPools::new(dir.path(), settings(2, Duration::from_secs(300)));
        pools.get(&TenantId::from("a")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        pools.get(&TenantId::from("b")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        pools.get(&TenantId::from("a")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        pools.get(&TenantId::from("c")).await.unwrap();
        assert_eq!(pools.len(), 2);
        let open: Vec<String> = pools.lock().keys().map(|k| k.to_string()).collect();
        assert!(open.contains(&"a".to_string()));
        assert!(open.contains(&"c".to_string()));
    }

    #[tokio::test]
    async fn idle_pools_are_closed() {
        let dir = tempfile::tempdir().unwrap();
        touch_db(dir.path(), "a").await;
        let pools = TenantPools::new(dir.path(), settings(8, Duration::from_millis(10)));
        pools.get(&TenantId::from("a")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(pools.evict_idle(), 1);
        assert!(pools.is_empty());
    }
}
