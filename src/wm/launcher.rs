//! Launches commands from key bindings through `/bin/sh -c`.

use anyhow::{Context, Result};
use std::process::{Child, Command, Stdio};
use tracing::{debug, info, trace};

/// Spawned children, kept so they can be reaped
#[derive(Debug, Default)]
pub struct Launcher {
    children: Vec<Child>,
}

impl Launcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, command: &str) -> Result<()> {
        self.reap();
        let child = Command::new("/bin/sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to spawn {:?}", command))?;
        info!("Launched {:?} (pid {})", command, child.id());
        self.children.push(child);
        Ok(())
    }

    /// Collects exited children so they do not linger as zombies.
    pub fn reap(&mut self) {
        self.children.retain_mut(|child| match child.try_wait() {
            Ok(Some(status)) => {
                debug!("Child {} exited: {}", child.id(), status);
                false
            }
            Ok(None) => true,
            Err(_) => false,
        });
        trace!("{} launched programs still running", self.running());
    }

    pub fn running(&self) -> usize {
        self.children.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_and_reap() {
        let mut launcher = Launcher::new();
        launcher.spawn("exit 0").unwrap();
        assert_eq!(launcher.running(), 1);
        for _ in 0..200 {
            launcher.reap();
            if launcher.running() == 0 {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        assert_eq!(launcher.running(), 0);
    }
}
