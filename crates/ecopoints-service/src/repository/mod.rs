//! 数据仓储层
//!
//! 提供用户、账本、待审核内容的数据访问接口，封装 SQL 操作细节。
//!
//! ## 设计原则
//!
//! - 仓储只负责数据持久化，不包含业务规则
//! - 积分发放、审核迁移这类复合写入在仓储内部以单个事务完成
//! - 定义 trait 接口以支持 mock 测试和内存实现

mod content_repo;
mod ledger_repo;
mod memory;
mod traits;
mod user_repo;

pub use content_repo::ContentRepository;
pub use ledger_repo::PointsLedgerRepository;
pub use memory::MemoryStore;
pub use traits::*;
pub use user_repo::UserRepository;
