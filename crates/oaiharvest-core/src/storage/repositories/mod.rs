mod group_repository;
mod record_repository;

pub use group_repository::{GroupRepository, SqliteGroupRepository};
pub use record_repository::{RecordQuery, RecordRepository, SqliteRecordRepository};

use crate::error::Result;

pub trait Repository {
    type Entity;
    type Id: ?Sized;

    fn find_by_id(&self, id: &Self::Id) -> Result<Option<Self::Entity>>;
    fn save(&self, entity: &Self::Entity) -> Result<()>;
    fn delete(&self, id: &Self::Id) -> Result<bool>;
}
