use crate::database::{Connector, SharedGateway, Written};
use crate::errors::error::AppError;
use crate::models::{BlockInsert, BlockRow, Record};
use crate::repositories::base::RepositoryBase;
use crate::repositories::traits::BlockStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub struct BlockRepository<C: Connector> {
    base: RepositoryBase<C>,
}

impl<C: Connector> BlockRepository<C> {
    pub fn new(gateway: SharedGateway<C>) -> Self {
        Self {
            base: RepositoryBase::new(gateway),
        }
    }
}

#[async_trait]
impl<C: Connector> BlockStore for BlockRepository<C> {
    async fn save(&self, block: BlockInsert) -> Written {
        self.base.gateway().await.upsert(&Record::Block(block)).await
    }

    async fn find_committed_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<BlockRow>, AppError> {
        self.base.gateway().await.query_window(from, to).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::MemoryDatabase;
    use crate::database::{PersistenceGateway, RetrySettings};
    use crate::testing::block_insert;
    use chrono::TimeZone;

    #[tokio::test(start_paused = true)]
    async fn saved_blocks_are_found_in_their_window() {
        let db = MemoryDatabase::new();
        let gateway = PersistenceGateway::connect(db.clone(), RetrySettings::default())
            .await
            .unwrap()
            .into_shared();
        let repo = BlockRepository::new(gateway);
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        db.set_now(at);

        let written = repo.save(block_insert("0xaa", 7)).await;
        assert!(written.is_stored());
        assert_eq!(written.key, "0xaa");

        let rows = repo
            .find_committed_between(at, at + chrono::Duration::seconds(1))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].number, 7);
        assert_eq!(rows[0].created_at, at);
    }
}
