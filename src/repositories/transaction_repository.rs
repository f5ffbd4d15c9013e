use crate::database::{Connector, SharedGateway, Written};
use crate::errors::error::AppError;
use crate::models::{Record, TransactionInsert, TransactionRow};
use crate::repositories::base::RepositoryBase;
use crate::repositories::traits::TransactionStore;
use async_trait::async_trait;

pub struct TransactionRepository<C: Connector> {
    base: RepositoryBase<C>,
}

impl<C: Connector> TransactionRepository<C> {
    pub fn new(gateway: SharedGateway<C>) -> Self {
        Self {
            base: RepositoryBase::new(gateway),
        }
    }
}

#[async_trait]
impl<C: Connector> TransactionStore for TransactionRepository<C> {
    async fn save(&self, tx: TransactionInsert) -> Written {
        self.base.gateway().await.upsert(&Record::Transaction(tx)).await
    }

    async fn find_by_block(&self, block_hash: &str) -> Result<Vec<TransactionRow>, AppError> {
        self.base.gateway().await.query_by_parent(block_hash).await
    }
}
