//! Launching user programs outside the manager's process group.

use std::os::unix::process::CommandExt;
use std::process::{Child, Command, Stdio};

use tracing::{debug, warn};

pub fn spawn_detached(cmd: &str) {
    let mut command = Command::new("sh");
    command.arg("-c").arg(cmd);
    launch(command, cmd);
}

pub fn spawn_detached_with_args(program: &str, args: &[&str]) {
    let mut command = Command::new(program);
    command.args(args);
    launch(command, program);
}

fn launch(mut command: Command, label: &str) {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .process_group(0);

    match command.spawn() {
        Ok(child) => {
            debug!(pid = child.id(), command = label, "spawned");
            reap(child);
        }
        Err(error) => warn!(command = label, %error, "failed to spawn"),
    }
}

/// Waits on the child off the event loop so it never lingers as a zombie.
fn reap(mut child: Child) {
    let spawned = std::thread::Builder::new()
        .name("reaper".into())
        .spawn(move || {
            if let Err(error) = child.wait() {
                debug!(%error, "wait on child failed");
            }
        });
    if let Err(error) = spawned {
        warn!(%error, "could not start reaper thread");
    }
}
