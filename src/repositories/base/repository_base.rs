use crate::database::{Connector, PersistenceGateway, SharedGateway};
use tokio::sync::MutexGuard;

// 仓储共用的网关句柄；语句执行期间（含重试与重连）独占网关
pub struct RepositoryBase<C: Connector> {
    gateway: SharedGateway<C>,
}

impl<C: Connector> Clone for RepositoryBase<C> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
        }
    }
}

impl<C: Connector> RepositoryBase<C> {
    pub fn new(gateway: SharedGateway<C>) -> Self {
        Self { gateway }
    }

    pub async fn gateway(&self) -> MutexGuard<'_, PersistenceGateway<C>> {
        self.gateway.lock().await
    }
}
