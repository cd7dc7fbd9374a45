use std::sync::Arc;

use wiring::prelude::*;

pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        0
    }
}

interface!(Clock = [SystemClock]);

pub struct Store;

pub struct Scheduler {
    pub clock: Arc<dyn Clock>,
    pub store: Arc<Store>,
    pub backup: Arc<Store>,
    pub workers: usize,
    pub label: String,
}

#[component(name = "scheduler")]
impl Scheduler {
    #[inject]
    pub fn new(
        #[default(Arc::new(SystemClock))] clock: Arc<dyn Clock>,
        store: Arc<Store>,
        #[abstraction("BackupStore")] backup: Arc<Store>,
        #[default(4)] workers: usize,
        #[scalar] label: String,
    ) -> Self {
        Self {
            clock,
            store,
            backup,
            workers,
            label,
        }
    }
}

fn main() {
    assert_eq!(<Scheduler as Constructible>::NAME, "scheduler");

    let parameters = <Scheduler as Constructible>::parameters();
    let names: Vec<_> = parameters.iter().map(Parameter::name).collect();
    assert_eq!(names, ["clock", "store", "backup", "workers", "label"]);
    assert!(parameters[0].default().is_some());
    assert!(parameters[2].default().is_none());
}
