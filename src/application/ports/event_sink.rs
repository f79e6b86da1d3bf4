//! Domain Event Sink Port - 领域事件出口
//!
//! 命令处理器在持久化成功后，把聚合中取出的事件交给此端口

use crate::domain::library::DomainEvent;

pub trait DomainEventSinkPort: Send + Sync {
    fn dispatch(&self, events: Vec<DomainEvent>);
}
