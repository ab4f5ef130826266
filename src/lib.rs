pub mod aggregator;
pub mod buffer_pool;
pub mod catalog;
pub mod config;
pub mod error;
pub mod field;
pub mod heap_file;
pub mod heap_page;
pub mod logging;
pub mod operator;
pub mod page_id;
pub mod permissions;
pub mod transaction;
pub mod tuple;
pub mod util;

pub use buffer_pool::BufferPool;
pub use catalog::Catalog;
pub use error::{DbError, DbResult};
pub use field::{Field, Type, TupleDesc, TupleDescItem};
pub use heap_file::HeapFile;
pub use heap_page::HeapPage;
pub use page_id::PageId;
pub use permissions::Permission;
pub use transaction::{Transaction, TransactionId};
pub use tuple::{RecordId, Tuple};
