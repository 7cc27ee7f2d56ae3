//! Command execution
//!
//! Translates AppCommand into method calls on App.

use super::{App, InputMode};
use crate::cloud::CloudApi;
use crate::constants::PAGE_SCROLL_LINES;
use crate::input::AppCommand;
use crate::transport::Dialer;

impl<A: CloudApi, D: Dialer> App<A, D> {
    /// Execute an application command. Returns true if app should quit.
    pub fn execute_command(&mut self, cmd: AppCommand) -> bool {
        match cmd {
            AppCommand::Quit => {
                self.quit();
                return true;
            }
            AppCommand::ToggleConnection => self.driver.toggle_connection(),
            AppCommand::RefreshSites => {
                self.driver.refresh_sites();
                self.set_status("Refreshing sites");
            }
            AppCommand::NextSite => self.driver.cycle_site(true),
            AppCommand::PrevSite => self.driver.cycle_site(false),
            AppCommand::NextEnvironment => self.driver.cycle_environment(true),
            AppCommand::PrevEnvironment => self.driver.cycle_environment(false),
            AppCommand::ToggleOnlyMine => {
                self.driver.toggle_only_mine();
                let label = if self.driver.session().only_mine() {
                    "Only mine: on"
                } else {
                    "Only mine: off"
                };
                self.set_status(label);
            }
            AppCommand::EditFilter => {
                let current = self.driver.session().filter_text().to_string();
                self.input_mode = InputMode::EditFilter(current);
            }
            AppCommand::ToggleDebug => {
                let on = self.driver.toggle_debug();
                self.set_status(if on { "Debug: shown" } else { "Debug: hidden" });
            }
            AppCommand::ToggleCategory(index) => {
                if self.toggle_category(index) {
                    self.category_cursor = index;
                }
            }
            AppCommand::NextCategory => self.move_category_cursor(true),
            AppCommand::PrevCategory => self.move_category_cursor(false),
            AppCommand::ToggleSelectedCategory => {
                self.toggle_category(self.category_cursor);
            }
            AppCommand::ScrollUp => self.scroll_up(),
            AppCommand::ScrollDown => self.scroll_down(),
            AppCommand::ScrollPageUp => {
                for _ in 0..PAGE_SCROLL_LINES {
                    self.scroll_up();
                }
            }
            AppCommand::ScrollPageDown => {
                for _ in 0..PAGE_SCROLL_LINES {
                    self.scroll_down();
                }
            }
            AppCommand::ScrollToTop => self.scroll = 0,
            AppCommand::ScrollToBottom => self.scroll = self.max_scroll(),
            AppCommand::ClearLogs => {
                self.driver.clear();
                self.scroll = 0;
                self.set_status("Logs cleared");
            }
            AppCommand::None => {}
        }
        false
    }

    /// Toggle the n-th numbered category. Returns false if there is none.
    fn toggle_category(&mut self, index: usize) -> bool {
        let Some(key) = self
            .registry()
            .numbered()
            .nth(index)
            .map(|c| c.key.clone())
        else {
            return false;
        };
        if let Some(enabled) = self.driver.toggle_category(&key) {
            let name = self
                .registry()
                .get(&key)
                .map(|c| c.display_name.clone())
                .unwrap_or(key);
            let verb = if enabled { "shown" } else { "hidden" };
            self.set_status(format!("{}: {}", name, verb));
        }
        true
    }

    fn move_category_cursor(&mut self, forward: bool) {
        let count = self.registry().numbered().count();
        if count == 0 {
            return;
        }
        let current = self.category_cursor.min(count - 1);
        self.category_cursor = if forward {
            (current + 1) % count
        } else {
            (current + count - 1) % count
        };
        let status = self.registry().numbered().nth(self.category_cursor).map(|cat| {
            let verb = if cat.enabled { "shown" } else { "hidden" };
            format!("› {} ({}), Space toggles", cat.display_name, verb)
        });
        if let Some(status) = status {
            self.set_status(status);
        }
    }
}
