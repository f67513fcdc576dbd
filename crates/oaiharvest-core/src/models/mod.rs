mod catalog;
mod record;

pub use catalog::{Group, RecordState, StoredRecord};
pub use record::{
    Agent, AgentRole, Contact, DATASET_TYPE, Event, GENERAL_RELATION, LangMap, Pid, PidType,
    UnifiedRecord, availability,
};
