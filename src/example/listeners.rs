use std::rc::Rc;

use crate::command::CommandSender;
use crate::event::{HandlerList, Listener, PlayerJoinEvent, PlayerQuitEvent};
use crate::example::{tell, ExampleState};

pub struct JoinListener {
    state: Rc<ExampleState>,
}

impl JoinListener {
    pub fn new(state: Rc<ExampleState>) -> Self {
        JoinListener { state }
    }

    fn on_player_join(&self, event: &PlayerJoinEvent) -> anyhow::Result<()> {
        let player = event.player();
        let welcome = self.state.config().welcome_message.replace("{player}", player.get_name());

        tell(player, &welcome);
        self.state.logger().info(format!("{} joined", player.get_name()));
        Ok(())
    }
}

impl Listener for JoinListener {
    fn subscribe(self: Rc<Self>, handlers: &mut HandlerList) {
        handlers.on(move |event: &PlayerJoinEvent| self.on_player_join(event));
    }
}

pub struct QuitListener {
    state: Rc<ExampleState>,
}

impl QuitListener {
    pub fn new(state: Rc<ExampleState>) -> Self {
        QuitListener { state }
    }

    fn on_player_quit(&self, event: &PlayerQuitEvent) -> anyhow::Result<()> {
        if self.state.config().announce_quits {
            self.state.logger().info(format!("{} left", event.player().get_name()));
        }
        Ok(())
    }
}

impl Listener for QuitListener {
    fn subscribe(self: Rc<Self>, handlers: &mut HandlerList) {
        handlers.on(move |event: &PlayerQuitEvent| self.on_player_quit(event));
    }
}
