use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::collections::VecDeque;
use std::io;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Operator command issued from the keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    NextCamera,
    PreviousCamera,
    /// Select a discovered camera by position (digit keys)
    SelectCamera(usize),
}

/// Map a key to a command: `q`/Esc quit, `d`/Right next camera, `a`/Left
/// previous camera, digits select a camera directly
pub fn map_key(code: KeyCode) -> Option<Command> {
    match code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(Command::Quit),
        KeyCode::Char('d') | KeyCode::Char('D') | KeyCode::Right => Some(Command::NextCamera),
        KeyCode::Char('a') | KeyCode::Char('A') | KeyCode::Left => Some(Command::PreviousCamera),
        KeyCode::Char(c) => c
            .to_digit(10)
            .map(|digit| Command::SelectCamera(digit as usize)),
        _ => None,
    }
}

/// Non-blocking source of operator commands, polled once per frame
pub trait CommandSource: Send {
    fn poll(&mut self) -> Option<Command>;
}

/// Reads keys from the terminal in raw mode. Raw mode is restored on drop.
pub struct KeyboardInput {
    raw_mode: bool,
}

impl KeyboardInput {
    pub fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        info!("Keyboard input active - q/Esc quits, a/d or arrows switch camera");
        Ok(Self { raw_mode: true })
    }
}

impl CommandSource for KeyboardInput {
    fn poll(&mut self) -> Option<Command> {
        loop {
            match event::poll(Duration::ZERO) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key_event)) if key_event.kind == KeyEventKind::Press => {
                        // Raw mode swallows SIGINT, so treat Ctrl+C as quit
                        if key_event.modifiers.contains(KeyModifiers::CONTROL)
                            && key_event.code == KeyCode::Char('c')
                        {
                            return Some(Command::Quit);
                        }
                        match map_key(key_event.code) {
                            Some(command) => return Some(command),
                            None => debug!("Key pressed: {:?}", key_event.code),
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Error reading keyboard event: {}", e);
                        return None;
                    }
                },
                Ok(false) => return None,
                Err(e) => {
                    warn!("Error polling for keyboard events: {}", e);
                    return None;
                }
            }
        }
    }
}

impl Drop for KeyboardInput {
    fn drop(&mut self) {
        if self.raw_mode {
            if let Err(e) = disable_raw_mode() {
                error!("Failed to disable raw mode: {}", e);
            } else {
                debug!("Raw mode disabled");
            }
        }
    }
}

/// Commands queued up front, for tests and unattended runs
#[derive(Debug, Default)]
pub struct ScriptedCommands {
    script: VecDeque<Option<Command>>,
}

impl ScriptedCommands {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `command` on the next poll
    pub fn push(&mut self, command: Command) -> &mut Self {
        self.script.push_back(Some(command));
        self
    }

    /// Let `polls` polls pass without a command
    pub fn idle(&mut self, polls: usize) -> &mut Self {
        self.script.extend(std::iter::repeat(None).take(polls));
        self
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl CommandSource for ScriptedCommands {
    fn poll(&mut self) -> Option<Command> {
        self.script.pop_front().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_mapping() {
        assert_eq!(map_key(KeyCode::Char('q')), Some(Command::Quit));
        assert_eq!(map_key(KeyCode::Esc), Some(Command::Quit));
        assert_eq!(map_key(KeyCode::Char('d')), Some(Command::NextCamera));
        assert_eq!(map_key(KeyCode::Right), Some(Command::NextCamera));
        assert_eq!(map_key(KeyCode::Char('a')), Some(Command::PreviousCamera));
        assert_eq!(map_key(KeyCode::Left), Some(Command::PreviousCamera));
        assert_eq!(map_key(KeyCode::Char('0')), Some(Command::SelectCamera(0)));
        assert_eq!(map_key(KeyCode::Char('7')), Some(Command::SelectCamera(7)));
        assert_eq!(map_key(KeyCode::Char('x')), None);
        assert_eq!(map_key(KeyCode::Enter), None);
    }

    #[test]
    fn test_scripted_commands() {
        let mut commands = ScriptedCommands::new();
        commands
            .idle(2)
            .push(Command::NextCamera)
            .push(Command::Quit);

        assert_eq!(commands.poll(), None);
        assert_eq!(commands.poll(), None);
        assert_eq!(commands.poll(), Some(Command::NextCamera));
        assert_eq!(commands.poll(), Some(Command::Quit));
        assert_eq!(commands.poll(), None);
        assert_eq!(commands.remaining(), 0);
    }
}
