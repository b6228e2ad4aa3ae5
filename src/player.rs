use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, info};
use uuid::Uuid;

use crate::command::CommandSender;
use crate::util::color::Color;

#[derive(Debug, Clone)]
pub struct Player {
    uuid: Uuid,
    name: String,
    operator: bool,
    inbox: Rc<RefCell<Vec<String>>>,
}

impl Player {
    pub fn new(name: impl Into<String>) -> Self {
        Player {
            uuid: Uuid::new_v4(),
            name: name.into(),
            operator: false,
            inbox: Rc::default(),
        }
    }

    pub fn operator(mut self, operator: bool) -> Self {
        self.operator = operator;
        self
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn is_operator(&self) -> bool {
        self.operator
    }

    /// Drains every message sent so far, color codes removed.
    pub fn take_messages(&self) -> Vec<String> {
        self.inbox.borrow_mut().drain(..).map(|m| m.stripped()).collect()
    }
}

impl CommandSender for Player {
    fn get_name(&self) -> &str {
        &self.name
    }

    fn send_message(&self, message: &str) {
        debug!("-> {}: {}", self.name, message.stripped());
        self.inbox.borrow_mut().push(message.to_owned());
    }

    fn has_permission(&self, _node: &str) -> bool {
        self.operator
    }
}

pub struct ConsoleSender;

impl CommandSender for ConsoleSender {
    fn get_name(&self) -> &str {
        "Console"
    }

    fn send_message(&self, message: &str) {
        info!("{}", message.stripped())
    }

    fn has_permission(&self, _node: &str) -> bool {
        true
    }
}
